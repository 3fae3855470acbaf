//! Errors raised by a single voice-entry attempt.

use thiserror::Error;

use crate::collect::FormField;

/// Everything that can go wrong while capturing one spoken answer.
///
/// Every variant is recoverable: the form shows [`user_message`] inline and
/// the user may retry the same field.  None of them ever touches the value
/// already held by the field.
///
/// [`user_message`]: VoiceError::user_message
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VoiceError {
    /// Nobody started speaking before the listen window closed.
    #[error("no speech detected before the listen timeout")]
    ListenTimeout,

    /// The recognition backend could not be reached or refused the request.
    #[error("speech recognition unavailable: {0}")]
    TranscriptionUnavailable(String),

    /// Audio was captured but the backend could not make sense of it.
    #[error("speech was not understood")]
    TranscriptionFailed,

    /// The transcript is not an acceptable value for the field.
    #[error("{heard:?} is not a valid {field}")]
    InvalidVoiceInput { field: FormField, heard: String },

    /// The microphone could not be opened or stopped delivering audio.
    #[error("microphone error: {0}")]
    Microphone(String),
}

impl VoiceError {
    /// Inline message shown next to the form.
    pub fn user_message(&self) -> String {
        match self {
            VoiceError::ListenTimeout => "No speech detected. Please try again.".into(),
            VoiceError::TranscriptionUnavailable(_) => {
                "Speech service unavailable. Check your internet connection.".into()
            }
            VoiceError::TranscriptionFailed => {
                "Sorry, I couldn't understand. Please try again.".into()
            }
            VoiceError::InvalidVoiceInput {
                field: FormField::WaterUsage,
                ..
            } => "Invalid number. Please try again.".into(),
            VoiceError::InvalidVoiceInput { .. } => {
                "Invalid input. Please select from the options.".into()
            }
            VoiceError::Microphone(e) => format!("Microphone unavailable: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn invalid_number_message_differs_from_invalid_option() {
        let water = VoiceError::InvalidVoiceInput {
            field: FormField::WaterUsage,
            heard: "lots".into(),
        };
        let soil = VoiceError::InvalidVoiceInput {
            field: FormField::Category(Field::SoilType),
            heard: "gravel".into(),
        };
        assert!(water.user_message().contains("number"));
        assert!(soil.user_message().contains("options"));
    }

    #[test]
    fn display_includes_heard_text() {
        let e = VoiceError::InvalidVoiceInput {
            field: FormField::Category(Field::Season),
            heard: "monsoon".into(),
        };
        assert!(e.to_string().contains("monsoon"));
        assert!(e.to_string().contains("Season"));
    }

    #[test]
    fn unavailable_and_failed_are_distinct() {
        assert_ne!(
            VoiceError::TranscriptionUnavailable("offline".into()).user_message(),
            VoiceError::TranscriptionFailed.user_message()
        );
    }
}
