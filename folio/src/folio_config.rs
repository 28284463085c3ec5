//! Database configuration.

use crate::common::DEFAULT_PLAN_CACHE_SIZE;
use crate::errors::{ErrorKind, FolioError, FolioResult};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

/// Largest accepted plan cache, per collection.
pub const MAX_PLAN_CACHE_SIZE: usize = 100_000;

/// Settings shared by a database and all of its collections.
///
/// Cheap to clone; every clone sees the same values. Settings can change
/// until the database opens and are fixed from then on.
#[derive(Clone)]
pub struct FolioConfig {
    inner: Arc<FolioConfigInner>,
}

impl Default for FolioConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl FolioConfig {
    pub fn new() -> Self {
        FolioConfig {
            inner: Arc::new(FolioConfigInner {
                plan_cache_size: AtomicUsize::new(DEFAULT_PLAN_CACHE_SIZE),
                optimize_pipelines: AtomicBool::new(false),
                sealed: AtomicBool::new(false),
            }),
        }
    }

    /// Plans cached per collection; 0 disables caching.
    pub fn plan_cache_size(&self) -> usize {
        self.inner.plan_cache_size.load(Ordering::Acquire)
    }

    pub fn set_plan_cache_size(&self, size: usize) -> FolioResult<()> {
        self.inner.check_mutable()?;
        if size > MAX_PLAN_CACHE_SIZE {
            log::error!("Plan cache size {} exceeds {}", size, MAX_PLAN_CACHE_SIZE);
            return Err(FolioError::new(
                &format!("Plan cache size must be at most {}", MAX_PLAN_CACHE_SIZE),
                ErrorKind::ValidationError,
            ));
        }
        self.inner.plan_cache_size.store(size, Ordering::Release);
        Ok(())
    }

    /// Whether `$match` stages may move ahead of independent `$addFields`.
    pub fn optimize_pipelines(&self) -> bool {
        self.inner.optimize_pipelines.load(Ordering::Acquire)
    }

    pub fn set_optimize_pipelines(&self, enabled: bool) -> FolioResult<()> {
        self.inner.check_mutable()?;
        self.inner.optimize_pipelines.store(enabled, Ordering::Release);
        Ok(())
    }

    pub(crate) fn seal(&self) {
        self.inner.sealed.store(true, Ordering::Release);
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.sealed.load(Ordering::Acquire)
    }
}

struct FolioConfigInner {
    plan_cache_size: AtomicUsize,
    optimize_pipelines: AtomicBool,
    sealed: AtomicBool,
}

impl FolioConfigInner {
    fn check_mutable(&self) -> FolioResult<()> {
        if self.sealed.load(Ordering::Acquire) {
            log::error!("Attempt to change configuration after the database opened");
            return Err(FolioError::new(
                "Configuration cannot change after the database is opened",
                ErrorKind::InvalidOperation,
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FolioConfig::new();
        assert_eq!(config.plan_cache_size(), DEFAULT_PLAN_CACHE_SIZE);
        assert!(!config.optimize_pipelines());
        assert!(!config.is_sealed());
    }

    #[test]
    fn clones_share_settings() {
        let config = FolioConfig::new();
        let clone = config.clone();
        config.set_plan_cache_size(5).unwrap();
        assert_eq!(clone.plan_cache_size(), 5);
    }

    #[test]
    fn oversized_cache_is_rejected() {
        let config = FolioConfig::new();
        let err = config.set_plan_cache_size(MAX_PLAN_CACHE_SIZE + 1).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::ValidationError);
    }

    #[test]
    fn sealed_config_is_immutable() {
        let config = FolioConfig::new();
        config.seal();
        assert_eq!(
            config.set_optimize_pipelines(true).unwrap_err().kind(),
            &ErrorKind::InvalidOperation
        );
        assert!(!config.optimize_pipelines());
    }
}
