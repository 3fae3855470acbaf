//! Categorical field identifiers.
//!
//! Every categorical column the model knows about is a [`Field`].  The
//! artifact file keys its encoders by [`Field::artifact_key`]; everywhere else
//! in the crate the enum is used directly so there are no stringly-typed
//! lookups.

use std::fmt;

/// A categorical field with its own fitted [`CategoryEncoder`].
///
/// [`CategoryEncoder`]: crate::model::CategoryEncoder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    SoilType,
    Season,
    IrrigationType,
    /// The model output.  Never entered by the user.
    CropType,
}

impl Field {
    /// All fields, in artifact order.
    pub const ALL: [Field; 4] = [
        Field::SoilType,
        Field::Season,
        Field::IrrigationType,
        Field::CropType,
    ];

    /// The three fields the user fills in.
    pub const INPUTS: [Field; 3] = [Field::SoilType, Field::Season, Field::IrrigationType];

    /// Key of this field's encoder inside `label_encoders.json`.
    pub fn artifact_key(self) -> &'static str {
        match self {
            Field::SoilType => "Soil_Type",
            Field::Season => "Season",
            Field::IrrigationType => "Irrigation_Type",
            Field::CropType => "Crop_Type",
        }
    }

    /// Human-readable name used in the form and in messages.
    pub fn label(self) -> &'static str {
        match self {
            Field::SoilType => "Soil Type",
            Field::Season => "Season",
            Field::IrrigationType => "Irrigation Type",
            Field::CropType => "Crop Type",
        }
    }

    /// Sentence spoken (and shown) before recording a voice answer.
    pub fn voice_prompt(self) -> &'static str {
        match self {
            Field::SoilType => "Please say the soil type.",
            Field::Season => "Please say the season.",
            Field::IrrigationType => "Please say the irrigation type.",
            Field::CropType => "Please say the crop type.",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
