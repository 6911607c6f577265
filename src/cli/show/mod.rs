//! Show command - prints the persisted visitor state

use std::path::PathBuf;

use serde_json::{json, Value};

use crate::context::ExperimentContext;

/// Run the show command
pub fn run(config: Option<&PathBuf>) -> anyhow::Result<()> {
    let context = super::bootstrap(config)?;

    println!("{}", serde_json::to_string_pretty(&summary(&context))?);
    Ok(())
}

fn summary(context: &ExperimentContext) -> Value {
    json!({
        "userId": context.visitor_id(),
        "assignments": context.assignments(),
        "experiments": context.experiments(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::domain::ExperimentConfig;
    use crate::infrastructure::services::DEFAULT_STORAGE_KEY;
    use crate::infrastructure::storage::InMemoryKeyValueStore;
    use crate::infrastructure::telemetry::NoopEventSink;

    #[test]
    fn test_summary_layout() {
        let store = Arc::new(InMemoryKeyValueStore::new().with_entry(
            DEFAULT_STORAGE_KEY,
            r#"{"userId":"visitor-1","assignments":{"post-layout":"B"}}"#,
        ));
        let context = ExperimentContext::builder()
            .with_store(store)
            .with_sink(Arc::new(NoopEventSink))
            .with_experiment(ExperimentConfig::ab("signup-cta").unwrap())
            .build();

        let value = summary(&context);

        assert_eq!(value["userId"], "visitor-1");
        assert_eq!(value["assignments"]["post-layout"], "B");
        assert_eq!(value["experiments"][0]["name"], "signup-cta");
        assert_eq!(value["experiments"][0]["variants"], json!(["A", "B"]));
    }
}
