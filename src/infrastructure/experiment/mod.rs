//! Infrastructure layer for experiment A/B testing
//!
//! Provides the variant selection algorithms and the random sources they
//! draw from.

mod consistent_hashing;
mod random;
mod weighted;

pub use consistent_hashing::ConsistentHasher;
pub use random::{
    SeededRandomSource, SequenceRandomSource, ThreadRandomSource, UuidVisitorIdGenerator,
};
pub use weighted::WeightedSelector;
