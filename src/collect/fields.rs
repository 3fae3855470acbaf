//! Per-interaction form values and their validation rules.
//!
//! [`InputCollector`] owns the current [`RequestFields`] and is the only way
//! to change them.  Manual selections and voice transcripts go through
//! separate entry points because they fail differently: a manual selection
//! outside the label set is a programming error in the form, a voice
//! transcript outside it is ordinary user input that gets rejected.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{ArtifactStore, Field};
use crate::voice::VoiceError;

// ---------------------------------------------------------------------------
// FormField
// ---------------------------------------------------------------------------

/// One of the four inputs on the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormField {
    /// A categorical input backed by an encoder.
    Category(Field),
    /// Water usage in cubic meters.
    WaterUsage,
}

impl FormField {
    /// All form inputs, top to bottom.
    pub const ALL: [FormField; 4] = [
        FormField::Category(Field::SoilType),
        FormField::Category(Field::Season),
        FormField::Category(Field::IrrigationType),
        FormField::WaterUsage,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::Category(field) => field.label(),
            FormField::WaterUsage => "Water Usage",
        }
    }

    pub fn voice_prompt(self) -> &'static str {
        match self {
            FormField::Category(field) => field.voice_prompt(),
            FormField::WaterUsage => "Please say the water usage in cubic meters.",
        }
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// RequestFields
// ---------------------------------------------------------------------------

/// The four values one prediction is made from.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestFields {
    pub soil_type: String,
    pub season: String,
    pub irrigation_type: String,
    /// Cubic meters, always finite and non-negative.
    pub water_usage: f64,
}

impl RequestFields {
    pub fn category(&self, field: Field) -> Option<&str> {
        match field {
            Field::SoilType => Some(&self.soil_type),
            Field::Season => Some(&self.season),
            Field::IrrigationType => Some(&self.irrigation_type),
            Field::CropType => None,
        }
    }

    fn category_mut(&mut self, field: Field) -> Option<&mut String> {
        match field {
            Field::SoilType => Some(&mut self.soil_type),
            Field::Season => Some(&mut self.season),
            Field::IrrigationType => Some(&mut self.irrigation_type),
            Field::CropType => None,
        }
    }
}

// ---------------------------------------------------------------------------
// CollectError
// ---------------------------------------------------------------------------

/// Rejections from the manual entry points.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CollectError {
    #[error("{value:?} is not a known {field}")]
    UnknownCategory { field: Field, value: String },

    #[error("{0} is not an input field")]
    NotAnInput(Field),

    #[error("water usage must be a non-negative number, got {0}")]
    InvalidWaterUsage(f64),
}

// ---------------------------------------------------------------------------
// InputCollector
// ---------------------------------------------------------------------------

/// Unit phrases accepted after a spoken water-usage number.
const WATER_UNITS: [&str; 4] = ["cubic meters", "cubic metres", "cubic meter", "m3"];

/// Holds and validates the current form values.
#[derive(Debug, Clone)]
pub struct InputCollector {
    artifacts: Arc<ArtifactStore>,
    fields: RequestFields,
}

impl InputCollector {
    /// Start a form with the first label of every encoder and no water usage.
    pub fn new(artifacts: Arc<ArtifactStore>) -> Self {
        let first = |field: Field| {
            artifacts
                .encoder(field)
                .labels()
                .first()
                .cloned()
                .unwrap_or_default()
        };
        let fields = RequestFields {
            soil_type: first(Field::SoilType),
            season: first(Field::Season),
            irrigation_type: first(Field::IrrigationType),
            water_usage: 0.0,
        };
        Self { artifacts, fields }
    }

    pub fn fields(&self) -> &RequestFields {
        &self.fields
    }

    /// The fixed options offered for `field`.
    pub fn options(&self, field: Field) -> &[String] {
        self.artifacts.encoder(field).labels()
    }

    /// Manual selection from the dropdown.
    pub fn select(&mut self, field: Field, label: &str) -> Result<(), CollectError> {
        if !self.artifacts.encoder(field).contains(label) {
            return Err(CollectError::UnknownCategory {
                field,
                value: label.to_string(),
            });
        }
        let slot = self
            .fields
            .category_mut(field)
            .ok_or(CollectError::NotAnInput(field))?;
        *slot = label.to_string();
        Ok(())
    }

    /// Manual numeric entry.
    pub fn set_water_usage(&mut self, value: f64) -> Result<(), CollectError> {
        if !value.is_finite() || value < 0.0 {
            return Err(CollectError::InvalidWaterUsage(value));
        }
        self.fields.water_usage = value;
        Ok(())
    }

    /// Accept a transcript for a categorical field.
    ///
    /// Matching is case-insensitive and the canonical label is stored.
    /// On rejection the field keeps its previous value.
    pub fn accept_voice(&mut self, field: Field, transcript: &str) -> Result<&str, VoiceError> {
        let invalid = || VoiceError::InvalidVoiceInput {
            field: FormField::Category(field),
            heard: transcript.trim().to_string(),
        };
        let label = self
            .artifacts
            .encoder(field)
            .find(&normalize_case(transcript))
            .ok_or_else(invalid)?
            .to_string();
        let slot = self.fields.category_mut(field).ok_or_else(invalid)?;
        *slot = label;
        Ok(slot.as_str())
    }

    /// Accept a transcript for water usage.
    ///
    /// On rejection the field keeps its previous value.
    pub fn accept_voice_water(&mut self, transcript: &str) -> Result<f64, VoiceError> {
        let value = parse_spoken_number(transcript).ok_or_else(|| VoiceError::InvalidVoiceInput {
            field: FormField::WaterUsage,
            heard: transcript.trim().to_string(),
        })?;
        self.fields.water_usage = value;
        Ok(value)
    }

    /// Dispatch a transcript to the right entry point.  Returns the value as
    /// it will be displayed.
    pub fn accept_transcript(
        &mut self,
        field: FormField,
        transcript: &str,
    ) -> Result<String, VoiceError> {
        match field {
            FormField::Category(f) => self.accept_voice(f, transcript).map(str::to_string),
            FormField::WaterUsage => self.accept_voice_water(transcript).map(|v| v.to_string()),
        }
    }
}

/// Trim and capitalize: first letter upper case, the rest lower case.
pub fn normalize_case(transcript: &str) -> String {
    let lower = transcript.trim().to_lowercase();
    let mut chars = lower.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Parse a spoken quantity such as `"120"`, `"120.5 cubic meters"`.
///
/// Returns `None` for anything that is not a finite, non-negative number.
fn parse_spoken_number(transcript: &str) -> Option<f64> {
    let mut text = transcript.trim().to_lowercase();
    for unit in WATER_UNITS {
        if let Some(stripped) = text.strip_suffix(unit) {
            text = stripped.trim_end().to_string();
            break;
        }
    }
    let value: f64 = text.replace(',', "").parse().ok()?;
    (value.is_finite() && value >= 0.0).then_some(value)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
