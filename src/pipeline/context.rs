//! The application context built once at startup.

use std::sync::Arc;

use crate::collect::InputCollector;
use crate::config::AppConfig;
use crate::model::{ArtifactError, ArtifactPaths, ArtifactStore};

use super::predictor::CropPredictor;

/// Read-only artifacts shared by the inference pipeline and the form.
///
/// Cloning is an `Arc` clone.
#[derive(Debug, Clone)]
pub struct AppContext {
    artifacts: Arc<ArtifactStore>,
}

impl AppContext {
    pub fn new(artifacts: ArtifactStore) -> Self {
        Self {
            artifacts: Arc::new(artifacts),
        }
    }

    /// Load the artifact set named by `config`.
    pub fn load(config: &AppConfig) -> Result<Self, ArtifactError> {
        let dir = config.artifacts.resolve_dir();
        log::info!("loading artifacts from {}", dir.display());
        let paths = ArtifactPaths::from_config(&dir, &config.artifacts);
        ArtifactStore::load(&paths).map(Self::new)
    }

    pub fn artifacts(&self) -> &Arc<ArtifactStore> {
        &self.artifacts
    }

    pub fn predictor(&self) -> CropPredictor {
        CropPredictor::new(Arc::clone(&self.artifacts))
    }

    /// A fresh form for one interaction.
    pub fn collector(&self) -> InputCollector {
        InputCollector::new(Arc::clone(&self.artifacts))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::sample_store;

    #[test]
    fn predictor_and_collector_share_artifacts() {
        let ctx = AppContext::new(sample_store());
        let collector = ctx.collector();
        let crop = ctx.predictor().predict_fields(collector.fields()).unwrap();
        assert!(!crop.is_empty());
        // context + collector; the temporary predictor is gone.
        assert_eq!(Arc::strong_count(ctx.artifacts()), 2);
    }

    #[test]
    fn load_uses_configured_directory() {
        let mut config = AppConfig::default();
        config.artifacts.dir = Some(std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts"));
        let ctx = AppContext::load(&config).expect("bundled artifacts");
        let crop = ctx
            .predictor()
            .predict("Clay", "Summer", "Drip", 120.0)
            .unwrap();
        assert_eq!(crop, "Tomato");
    }

    #[test]
    fn load_reports_missing_directory() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut config = AppConfig::default();
        config.artifacts.dir = Some(dir.path().join("absent"));
        assert!(matches!(
            AppContext::load(&config),
            Err(ArtifactError::Io { .. })
        ));
    }
}
