use crate::domain::assignment::VisitorId;

#[cfg(test)]
use mockall::automock;

/// Produces new visitor identifiers
#[cfg_attr(test, automock)]
pub trait VisitorIdGenerator: Send + Sync {
    /// Generate a fresh, collision-resistant identifier
    fn generate(&self) -> VisitorId;
}
