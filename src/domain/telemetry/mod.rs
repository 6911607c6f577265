//! Telemetry domain - events and the sink they are delivered to

mod event;
mod sink;

pub use event::{
    Event, EventProperties, PageContext, EXPERIMENT_ASSIGNED, EXPERIMENT_EXPOSURE,
    PROP_EXPERIMENT, PROP_USER_ID, PROP_VARIANT,
};
pub use sink::EventSink;

#[cfg(test)]
pub use sink::MockEventSink;
