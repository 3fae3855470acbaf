//! Shared fixtures for unit tests.

use crate::model::{ArtifactStore, CategoryEncoder, Encoders, ModelArtifact, Scaler};

/// Three labels per field, sorted the way a fitted encoder exports them.
pub fn sample_encoders() -> Encoders {
    let enc = |labels: [&str; 3]| CategoryEncoder::new(labels).expect("valid labels");
    Encoders::new(
        enc(["Clay", "Loamy", "Sandy"]),
        enc(["Kharif", "Rabi", "Summer"]),
        enc(["Canal", "Drip", "Sprinkler"]),
        enc(["Maize", "Rice", "Wheat"]),
    )
}

/// Water split at the mean: dry → mostly Maize, wet → Rice.
const SAMPLE_MODEL: &str = r#"{
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

/// Encoders above, `(x - 100) / 50` scaling, one-stump forest.
pub fn sample_store() -> ArtifactStore {
    let model: ModelArtifact = serde_json::from_str(SAMPLE_MODEL).expect("valid model json");
    ArtifactStore::from_parts(
        sample_encoders(),
        Scaler::Standard {
            mean: 100.0,
            scale: 50.0,
        },
        model.into_classifier().expect("valid model"),
    )
}
