//! Infrastructure layer - Storage, telemetry and service implementations

pub mod experiment;
pub mod logging;
pub mod services;
pub mod storage;
pub mod telemetry;
