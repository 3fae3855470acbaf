//! Trained artifacts: category encoders, water-usage scaler and classifier.
//!
//! Everything here is loaded once by [`ArtifactStore::load`] and treated as
//! read-only for the rest of the process.

pub mod artifacts;
pub mod classifier;
pub mod encoder;
pub mod field;
pub mod scaler;

pub use artifacts::{ArtifactError, ArtifactPaths, ArtifactStore, Encoders};
pub use classifier::{
    Classifier, DecisionTree, FeatureVector, LinearModel, ModelArtifact, ModelError,
    TreeEnsemble, N_FEATURES,
};
pub use encoder::{CategoryEncoder, EncoderError};
pub use field::Field;
pub use scaler::Scaler;
