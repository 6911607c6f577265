//! Pluggable sources of randomness used by the engine

mod generator;
mod random;

pub use generator::VisitorIdGenerator;
pub use random::RandomSource;

#[cfg(test)]
pub use generator::MockVisitorIdGenerator;
#[cfg(test)]
pub use random::MockRandomSource;
