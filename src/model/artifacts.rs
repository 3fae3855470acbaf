//! Loading the three trained artifacts from disk.
//!
//! ```text
//! <artifact dir>/
//! ├── label_encoders.json   {"Soil_Type": ["Clay", ...], "Season": [...], ...}
//! ├── scaler.json           {"kind": "standard", "mean": ..., "scale": ...}
//! └── crop_model.json       {"kind": "forest", "classes": [...], "trees": [...]}
//! ```
//!
//! Everything is loaded once at startup and never mutated afterwards.

use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use thiserror::Error;

use super::classifier::{Classifier, ModelArtifact, ModelError};
use super::encoder::{CategoryEncoder, EncoderError};
use super::field::Field;
use super::scaler::Scaler;
use crate::config::ArtifactConfig;

// ---------------------------------------------------------------------------
// ArtifactError
// ---------------------------------------------------------------------------

/// Errors raised while loading the artifact set.  All of them are fatal for
/// the session: the form cannot be built without the encoders.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("label_encoders has no entry for {0}")]
    MissingEncoder(&'static str),

    #[error("encoder for {field} is invalid: {source}")]
    InvalidEncoder {
        field: &'static str,
        #[source]
        source: EncoderError,
    },

    #[error("scaler parameters are not finite")]
    InvalidScaler,

    #[error("model is invalid: {0}")]
    InvalidModel(#[from] ModelError),
}

// ---------------------------------------------------------------------------
// ArtifactPaths
// ---------------------------------------------------------------------------

/// Resolved locations of the three artifact files.
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactPaths {
    pub encoders: PathBuf,
    pub scaler: PathBuf,
    pub model: PathBuf,
}

impl ArtifactPaths {
    /// Default file names inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref();
        Self {
            encoders: dir.join("label_encoders.json"),
            scaler: dir.join("scaler.json"),
            model: dir.join("crop_model.json"),
        }
    }

    /// File names from config inside `dir`.
    pub fn from_config(dir: impl AsRef<Path>, config: &ArtifactConfig) -> Self {
        let dir = dir.as_ref();
        Self {
            encoders: dir.join(&config.encoders_file),
            scaler: dir.join(&config.scaler_file),
            model: dir.join(&config.model_file),
        }
    }
}

// ---------------------------------------------------------------------------
// Encoders
// ---------------------------------------------------------------------------

/// One encoder per [`Field`], resolved at load time.
#[derive(Debug, Clone)]
pub struct Encoders {
    soil: CategoryEncoder,
    season: CategoryEncoder,
    irrigation: CategoryEncoder,
    crop: CategoryEncoder,
}

impl Encoders {
    pub fn new(
        soil: CategoryEncoder,
        season: CategoryEncoder,
        irrigation: CategoryEncoder,
        crop: CategoryEncoder,
    ) -> Self {
        Self {
            soil,
            season,
            irrigation,
            crop,
        }
    }

    /// Build from the raw `label_encoders.json` map.  Extra keys are ignored.
    pub fn from_map(mut raw: HashMap<String, Vec<String>>) -> Result<Self, ArtifactError> {
        let mut take = |field: Field| -> Result<CategoryEncoder, ArtifactError> {
            let key = field.artifact_key();
            let labels = raw.remove(key).ok_or(ArtifactError::MissingEncoder(key))?;
            CategoryEncoder::new(labels)
                .map_err(|source| ArtifactError::InvalidEncoder { field: key, source })
        };
        Ok(Self {
            soil: take(Field::SoilType)?,
            season: take(Field::Season)?,
            irrigation: take(Field::IrrigationType)?,
            crop: take(Field::CropType)?,
        })
    }

    pub fn get(&self, field: Field) -> &CategoryEncoder {
        match field {
            Field::SoilType => &self.soil,
            Field::Season => &self.season,
            Field::IrrigationType => &self.irrigation,
            Field::CropType => &self.crop,
        }
    }
}

// ---------------------------------------------------------------------------
// ArtifactStore
// ---------------------------------------------------------------------------

/// The read-only trained artifacts: encoders, scaler and classifier.
pub struct ArtifactStore {
    encoders: Encoders,
    scaler: Scaler,
    classifier: Box<dyn Classifier>,
}

impl fmt::Debug for ArtifactStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArtifactStore")
            .field("encoders", &self.encoders)
            .field("scaler", &self.scaler)
            .field("classifier", &self.classifier.describe())
            .finish()
    }
}

impl ArtifactStore {
    /// Assemble a store from already-built parts.
    pub fn from_parts(encoders: Encoders, scaler: Scaler, classifier: Box<dyn Classifier>) -> Self {
        Self {
            encoders,
            scaler,
            classifier,
        }
    }

    /// Load and validate all three artifact files.
    pub fn load(paths: &ArtifactPaths) -> Result<Self, ArtifactError> {
        let raw: HashMap<String, Vec<String>> = read_json(&paths.encoders)?;
        let encoders = Encoders::from_map(raw)?;

        let scaler: Scaler = read_json(&paths.scaler)?;
        if !scaler.is_finite() {
            return Err(ArtifactError::InvalidScaler);
        }

        let model: ModelArtifact = read_json(&paths.model)?;
        let classifier = model.into_classifier()?;

        let crops = encoders.get(Field::CropType);
        let unknown: Vec<i64> = classifier
            .classes()
            .iter()
            .copied()
            .filter(|&c| c < 0 || crops.decode(c as usize).is_none())
            .collect();
        if !unknown.is_empty() {
            // Predictions landing on these codes will be rejected.
            log::warn!(
                "model classes {unknown:?} have no Crop_Type label; artifacts may be out of sync"
            );
        }

        log::info!(
            "artifacts loaded: {} soil, {} season, {} irrigation, {} crop labels; {} scaler; {}",
            encoders.get(Field::SoilType).len(),
            encoders.get(Field::Season).len(),
            encoders.get(Field::IrrigationType).len(),
            crops.len(),
            scaler.kind(),
            classifier.describe(),
        );

        Ok(Self {
            encoders,
            scaler,
            classifier,
        })
    }

    pub fn encoder(&self, field: Field) -> &CategoryEncoder {
        self.encoders.get(field)
    }

    pub fn scaler(&self) -> &Scaler {
        &self.scaler
    }

    pub fn classifier(&self) -> &dyn Classifier {
        self.classifier.as_ref()
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ArtifactError> {
    let content = std::fs::read_to_string(path).map_err(|source| ArtifactError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ArtifactError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const ENCODERS: &str = r#"{
        "Soil_Type": ["Clay", "Loamy", "Sandy"],
        "Season": ["Kharif", "Rabi", "Summer"],
        "Irrigation_Type": ["Canal", "Drip", "Sprinkler"],
        "Crop_Type": ["Maize", "Rice", "Wheat"]
    }"#;

    const SCALER: &str = r#"{"kind": "standard", "mean": 100.0, "scale": 50.0}"#;

    const MODEL: &str = r#"{
        "kind": "forest",
        "n_features": 4,
        "classes": [0, 1, 2],
        "trees": [{
            "children_left": [1, -1, -1],
            "children_right": [2, -1, -1],
            "feature": [2, -2, -2],
            "threshold": [0.0, -2.0, -2.0],
            "value": [[1.0, 1.0, 1.0], [3.0, 0.0, 1.0], [0.0, 4.0, 0.0]]
        }]
    }"#;

    fn write_set(dir: &Path, encoders: &str, scaler: &str, model: &str) -> ArtifactPaths {
        let paths = ArtifactPaths::in_dir(dir);
        std::fs::write(&paths.encoders, encoders).unwrap();
        std::fs::write(&paths.scaler, scaler).unwrap();
        std::fs::write(&paths.model, model).unwrap();
        paths
    }

    #[test]
    fn loads_valid_set() {
        let dir = tempdir().expect("temp dir");
        let paths = write_set(dir.path(), ENCODERS, SCALER, MODEL);
        let store = ArtifactStore::load(&paths).expect("load");
        assert_eq!(store.encoder(Field::Season).labels()[2], "Summer");
        assert_eq!(store.scaler().kind(), "standard");
        assert_eq!(store.classifier().classes(), &[0, 1, 2]);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempdir().expect("temp dir");
        let err = ArtifactStore::load(&ArtifactPaths::in_dir(dir.path())).unwrap_err();
        assert!(matches!(err, ArtifactError::Io { .. }));
    }

    #[test]
    fn missing_encoder_is_reported_by_key() {
        let dir = tempdir().expect("temp dir");
        let encoders = r#"{"Soil_Type": ["Clay"], "Season": ["Rabi"], "Crop_Type": ["Rice"]}"#;
        let paths = write_set(dir.path(), encoders, SCALER, MODEL);
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::MissingEncoder("Irrigation_Type")));
    }

    #[test]
    fn malformed_scaler_is_parse_error() {
        let dir = tempdir().expect("temp dir");
        let paths = write_set(dir.path(), ENCODERS, r#"{"kind": "robust"}"#, MODEL);
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::Parse { .. }));
    }

    #[test]
    fn structurally_broken_model_is_rejected() {
        let dir = tempdir().expect("temp dir");
        let model = MODEL.replace(r#""n_features": 4"#, r#""n_features": 5"#);
        let paths = write_set(dir.path(), ENCODERS, SCALER, &model);
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(err, ArtifactError::InvalidModel(_)));
    }

    #[test]
    fn duplicate_labels_are_rejected() {
        let dir = tempdir().expect("temp dir");
        let encoders = ENCODERS.replace(r#"["Canal", "Drip", "Sprinkler"]"#, r#"["Drip", "Drip"]"#);
        let paths = write_set(dir.path(), &encoders, SCALER, MODEL);
        let err = ArtifactStore::load(&paths).unwrap_err();
        assert!(matches!(
            err,
            ArtifactError::InvalidEncoder {
                field: "Irrigation_Type",
                ..
            }
        ));
    }

    #[test]
    fn bundled_artifacts_load() {
        let dir = Path::new(env!("CARGO_MANIFEST_DIR")).join("artifacts");
        let store = ArtifactStore::load(&ArtifactPaths::in_dir(dir)).expect("bundled set");
        for field in Field::ALL {
            assert!(!store.encoder(field).is_empty());
        }
    }
}
