//! Errors reported by the placement sampler

use thiserror::Error;

/// Raised when the placement sampler exhausts its whole-layout budget
///
/// Recoverable: callers may retry with a fresh draw, lower the entity
/// density, or abort the episode. The sampler never retries past its budgets
/// on its own.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "failed to sample a layout after {layout_attempts} attempts \
     ({entity_attempts} draws per entity, last stuck on '{stuck_on}')"
)]
pub struct ResamplingError {
    /// Whole-layout attempts that were made
    pub layout_attempts: usize,
    /// Per-entity draw budget used within each attempt
    pub entity_attempts: usize,
    /// Entity whose budget ran out on the final attempt
    pub stuck_on: String,
}
