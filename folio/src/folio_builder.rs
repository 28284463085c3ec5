use crate::errors::{FolioError, FolioResult};
use crate::folio::Folio;
use crate::folio_config::FolioConfig;

/// Builds a [Folio] database. The first invalid setting is remembered and
/// reported by [FolioBuilder::open].
///
/// ```rust,ignore
/// let db = Folio::builder()
///     .plan_cache_size(256)
///     .optimize_pipelines(true)
///     .open()?;
/// ```
#[derive(Default)]
pub struct FolioBuilder {
    error: Option<FolioError>,
    config: FolioConfig,
}

impl FolioBuilder {
    pub fn new() -> Self {
        FolioBuilder {
            error: None,
            config: FolioConfig::new(),
        }
    }

    pub fn plan_cache_size(mut self, size: usize) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_plan_cache_size(size) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn optimize_pipelines(mut self, enabled: bool) -> Self {
        if self.error.is_none() {
            if let Err(e) = self.config.set_optimize_pipelines(enabled) {
                self.error = Some(e);
            }
        }
        self
    }

    pub fn open(self) -> FolioResult<Folio> {
        if let Some(error) = self.error {
            return Err(error);
        }
        self.config.seal();
        log::info!(
            "Opening database (plan cache {}, pipeline optimization {})",
            self.config.plan_cache_size(),
            self.config.optimize_pipelines()
        );
        Ok(Folio::new(self.config))
    }
}
