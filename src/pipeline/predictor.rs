//! The inference pipeline: encode → scale → classify → decode.

use std::sync::Arc;

use thiserror::Error;

use crate::collect::RequestFields;
use crate::model::{ArtifactStore, FeatureVector, Field};

// ---------------------------------------------------------------------------
// PredictError
// ---------------------------------------------------------------------------

/// Errors from a single prediction.
///
/// The computation is pure, so retrying with the same input always fails
/// the same way.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PredictError {
    /// A value has no code in its field's encoder.
    ///
    /// For input fields this means the form let through an unvalidated value.
    /// For [`Field::CropType`] it means the classifier produced a code the
    /// crop encoder does not know: the artifacts are out of sync.
    #[error("{value:?} has no code in the {field} encoder")]
    UnknownCategory { field: Field, value: String },

    /// Water usage was negative or not a number.
    #[error("water usage must be a non-negative number, got {0}")]
    InvalidWaterUsage(f64),
}

impl PredictError {
    /// `true` when the loaded artifacts disagree with each other.
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            PredictError::UnknownCategory {
                field: Field::CropType,
                ..
            }
        )
    }

    /// Message shown to the user.
    pub fn user_message(&self) -> &'static str {
        if self.is_configuration_defect() {
            "Prediction failed. The model files may be out of date."
        } else {
            "Prediction failed. Please check your inputs and try again."
        }
    }
}

// ---------------------------------------------------------------------------
// CropPredictor
// ---------------------------------------------------------------------------

/// Runs one crop prediction against the shared artifacts.
#[derive(Debug, Clone)]
pub struct CropPredictor {
    artifacts: Arc<ArtifactStore>,
}

impl CropPredictor {
    pub fn new(artifacts: Arc<ArtifactStore>) -> Self {
        Self { artifacts }
    }

    /// Recommend a crop for the given inputs.
    pub fn predict(
        &self,
        soil: &str,
        season: &str,
        irrigation: &str,
        water_usage: f64,
    ) -> Result<String, PredictError> {
        let features = self.features(soil, season, irrigation, water_usage)?;
        let code = self.artifacts.classifier().predict(&features);

        let crop = usize::try_from(code)
            .ok()
            .and_then(|c| self.artifacts.encoder(Field::CropType).decode(c))
            .ok_or_else(|| PredictError::UnknownCategory {
                field: Field::CropType,
                value: code.to_string(),
            })?;

        log::debug!("predict: features={features:?} code={code} crop={crop}");
        Ok(crop.to_string())
    }

    /// [`predict`](Self::predict) over a collected form.
    pub fn predict_fields(&self, fields: &RequestFields) -> Result<String, PredictError> {
        self.predict(
            &fields.soil_type,
            &fields.season,
            &fields.irrigation_type,
            fields.water_usage,
        )
    }

    /// Build the model input row `[soil, season, water, irrigation]`.
    pub fn features(
        &self,
        soil: &str,
        season: &str,
        irrigation: &str,
        water_usage: f64,
    ) -> Result<FeatureVector, PredictError> {
        let soil = self.encode(Field::SoilType, soil)?;
        let season = self.encode(Field::Season, season)?;
        let irrigation = self.encode(Field::IrrigationType, irrigation)?;

        if !water_usage.is_finite() || water_usage < 0.0 {
            return Err(PredictError::InvalidWaterUsage(water_usage));
        }
        let water = self.artifacts.scaler().transform(water_usage);

        Ok([soil, season, water, irrigation])
    }

    fn encode(&self, field: Field, value: &str) -> Result<f64, PredictError> {
        self.artifacts
            .encoder(field)
            .encode(value)
            .map(|code| code as f64)
            .ok_or_else(|| PredictError::UnknownCategory {
                field,
                value: value.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Classifier, FeatureVector};
    use crate::test_support::{sample_encoders, sample_store};
    use crate::model::Scaler;

    fn predictor() -> CropPredictor {
        CropPredictor::new(Arc::new(sample_store()))
    }

    /// Classifier that always answers with a fixed code.
    struct Fixed(i64, Vec<i64>);

    impl Classifier for Fixed {
        fn predict(&self, _features: &FeatureVector) -> i64 {
            self.0
        }
        fn classes(&self) -> &[i64] {
            &self.1
        }
        fn describe(&self) -> String {
            "fixed".into()
        }
    }

    fn with_fixed(code: i64) -> CropPredictor {
        let store = ArtifactStore::from_parts(
            sample_encoders(),
            Scaler::Standard {
                mean: 0.0,
                scale: 1.0,
            },
            Box::new(Fixed(code, vec![code])),
        );
        CropPredictor::new(Arc::new(store))
    }

    #[test]
    fn clay_summer_drip_scenario_returns_known_crop() {
        let p = predictor();
        let crop = p.predict("Clay", "Summer", "Drip", 120.0).unwrap();
        let crops = sample_encoders();
        let code = crops.get(Field::CropType).encode(&crop).expect("known crop");
        assert_eq!(crops.get(Field::CropType).decode(code), Some(crop.as_str()));
    }

    #[test]
    fn feature_order_is_soil_season_water_irrigation() {
        let p = predictor();
        // sample scaler: (x - 100) / 50
        let f = p.features("Sandy", "Rabi", "Sprinkler", 150.0).unwrap();
        assert_eq!(f, [2.0, 1.0, 1.0, 2.0]);
    }

    #[test]
    fn every_valid_input_yields_a_crop_label() {
        let p = predictor();
        let enc = sample_encoders();
        for soil in enc.get(Field::SoilType).labels() {
            for season in enc.get(Field::Season).labels() {
                for irrigation in enc.get(Field::IrrigationType).labels() {
                    for water in [0.0, 50.0, 100.0, 100.1, 5000.0] {
                        let crop = p.predict(soil, season, irrigation, water).unwrap();
                        assert!(enc.get(Field::CropType).contains(&crop));
                    }
                }
            }
        }
    }

    #[test]
    fn prediction_is_deterministic() {
        let p = predictor();
        let a = p.predict("Loamy", "Kharif", "Canal", 80.0).unwrap();
        for _ in 0..10 {
            assert_eq!(p.predict("Loamy", "Kharif", "Canal", 80.0).unwrap(), a);
        }
    }

    #[test]
    fn unknown_input_category_is_rejected() {
        let err = predictor()
            .predict("Gravel", "Summer", "Drip", 1.0)
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCategory {
                field: Field::SoilType,
                value: "Gravel".into()
            }
        );
        assert!(!err.is_configuration_defect());
    }

    #[test]
    fn classifier_code_without_label_is_unknown_category() {
        let err = with_fixed(99)
            .predict("Clay", "Summer", "Drip", 120.0)
            .unwrap_err();
        assert_eq!(
            err,
            PredictError::UnknownCategory {
                field: Field::CropType,
                value: "99".into()
            }
        );
        assert!(err.is_configuration_defect());
    }

    #[test]
    fn negative_classifier_code_is_unknown_category() {
        let err = with_fixed(-1)
            .predict("Clay", "Summer", "Drip", 120.0)
            .unwrap_err();
        assert!(err.is_configuration_defect());
    }

    #[test]
    fn fixed_code_decodes_through_crop_encoder() {
        assert_eq!(
            with_fixed(2).predict("Clay", "Summer", "Drip", 1.0).unwrap(),
            "Wheat"
        );
    }

    #[test]
    fn negative_water_usage_is_rejected() {
        let err = predictor()
            .predict("Clay", "Summer", "Drip", -3.0)
            .unwrap_err();
        assert_eq!(err, PredictError::InvalidWaterUsage(-3.0));
    }
}
