//! Telemetry infrastructure - Event sink implementations

mod factory;
mod jsonl;
mod log_sink;
mod recording;

pub use factory::{SinkConfig, SinkFactory, SinkType};
pub use jsonl::JsonLinesEventSink;
pub use log_sink::LogEventSink;
pub use recording::{NoopEventSink, RecordingEventSink};
