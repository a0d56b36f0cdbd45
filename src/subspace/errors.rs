//! The error taxonomy of the pipeline.
//!
//! Each kind is a distinct type, so callers identify them through
//! `failure::Error::downcast_ref`. Filesystem errors come from
//! `asgrid_fs_util::Error`.

pub use asgrid_sparse_grid::{ConfigurationError, DimensionMismatchError, InsufficientDataError};

/// The symmetric eigensolver failed, or produced vectors that are not orthonormal.
#[derive(Debug, Fail)]
#[fail(display = "eigendecomposition failed: {}", _0)]
pub struct EigendecompositionError(pub String);

/// The reduced domain is degenerate, or the surrogate is undefined on part of it.
#[derive(Debug, Fail)]
#[fail(display = "integration failed: {}", _0)]
pub struct IntegrationFailureError(pub String);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_survive_boxing() {
        let err = failure::Error::from(IntegrationFailureError("empty interval".into()));
        assert!(err.downcast_ref::<IntegrationFailureError>().is_some());
        assert!(err.downcast_ref::<EigendecompositionError>().is_none());
        assert_eq!(err.to_string(), "integration failed: empty interval");
    }
}
