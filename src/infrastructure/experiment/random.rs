//! Random sources for weighted assignment and visitor id generation

use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

use crate::domain::assignment::VisitorId;
use crate::domain::traits::{RandomSource, VisitorIdGenerator};

/// Draws from the thread-local generator
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomSource;

impl RandomSource for ThreadRandomSource {
    fn next_f64(&self) -> f64 {
        rand::thread_rng().gen_range(0.0..1.0)
    }
}

/// Reproducible draws from a seeded generator
#[derive(Debug)]
pub struct SeededRandomSource {
    rng: Mutex<StdRng>,
}

impl SeededRandomSource {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }
}

impl RandomSource for SeededRandomSource {
    fn next_f64(&self) -> f64 {
        match self.rng.lock() {
            Ok(mut rng) => rng.gen_range(0.0..1.0),
            Err(poisoned) => poisoned.into_inner().gen_range(0.0..1.0),
        }
    }
}

/// Replays a fixed sequence of draws, cycling when exhausted
///
/// Values are clamped into `[0, 1)`; an empty sequence always yields `0.0`.
#[derive(Debug)]
pub struct SequenceRandomSource {
    values: Vec<f64>,
    position: Mutex<usize>,
}

impl SequenceRandomSource {
    pub fn new(values: impl Into<Vec<f64>>) -> Self {
        let values = values
            .into()
            .into_iter()
            .map(|v| if v.is_finite() { v.clamp(0.0, 1.0 - f64::EPSILON) } else { 0.0 })
            .collect();

        Self {
            values,
            position: Mutex::new(0),
        }
    }
}

impl RandomSource for SequenceRandomSource {
    fn next_f64(&self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }

        let mut position = match self.position.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let value = self.values[*position % self.values.len()];
        *position += 1;
        value
    }
}

/// Generates random (v4) UUID visitor ids
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidVisitorIdGenerator;

impl VisitorIdGenerator for UuidVisitorIdGenerator {
    fn generate(&self) -> VisitorId {
        VisitorId::from_uuid(Uuid::new_v4())
    }
}
