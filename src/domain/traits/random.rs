#[cfg(test)]
use mockall::automock;

/// Uniform random draws for weighted assignment
///
/// Implementations must return values in `[0, 1)`. Tests inject a fixed
/// sequence to pin down which weighted branch is taken.
#[cfg_attr(test, automock)]
pub trait RandomSource: Send + Sync {
    /// Next uniform draw in `[0, 1)`
    fn next_f64(&self) -> f64;
}
