//! Label <-> code tables fitted at training time.

use thiserror::Error;

/// Why an encoder table was rejected at load time.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EncoderError {
    #[error("encoder has no labels")]
    Empty,

    #[error("encoder contains an empty label at code {0}")]
    EmptyLabel(usize),

    #[error("label {label:?} appears more than once (codes {first} and {second})")]
    Duplicate {
        label: String,
        first: usize,
        second: usize,
    },
}

/// Bidirectional mapping between a fixed label set and the codes `0..n`.
///
/// The label stored at index `i` encodes to `i`, which is the order the
/// fitted encoder exported its classes in.  The table is immutable once
/// built, so [`encode`](Self::encode) and [`decode`](Self::decode) are exact
/// inverses over it.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryEncoder {
    labels: Vec<String>,
}

impl CategoryEncoder {
    /// Build an encoder, rejecting empty tables, empty labels and duplicates.
    pub fn new<I, S>(labels: I) -> Result<Self, EncoderError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(Into::into).collect();
        if labels.is_empty() {
            return Err(EncoderError::Empty);
        }
        for (i, label) in labels.iter().enumerate() {
            if label.trim().is_empty() {
                return Err(EncoderError::EmptyLabel(i));
            }
            if let Some(j) = labels[..i].iter().position(|l| l == label) {
                return Err(EncoderError::Duplicate {
                    label: label.clone(),
                    first: j,
                    second: i,
                });
            }
        }
        Ok(Self { labels })
    }

    /// Code of `label`, if it belongs to the fitted set (exact match).
    pub fn encode(&self, label: &str) -> Option<usize> {
        self.labels.iter().position(|l| l == label)
    }

    /// Label for `code`, if the code is in range.
    pub fn decode(&self, code: usize) -> Option<&str> {
        self.labels.get(code).map(String::as_str)
    }

    /// Canonical label matching `candidate` case-insensitively.
    ///
    /// Surrounding whitespace in `candidate` is ignored.
    pub fn find(&self, candidate: &str) -> Option<&str> {
        let candidate = candidate.trim();
        self.labels
            .iter()
            .find(|l| l.to_lowercase() == candidate.to_lowercase())
            .map(String::as_str)
    }

    pub fn contains(&self, label: &str) -> bool {
        self.encode(label).is_some()
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    /// Always `false`: construction rejects empty tables.
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn soils() -> CategoryEncoder {
        CategoryEncoder::new(["Clay", "Loamy", "Sandy"]).unwrap()
    }

    #[test]
    fn encode_then_decode_is_identity() {
        let enc = soils();
        for label in enc.labels() {
            let code = enc.encode(label).unwrap();
            assert_eq!(enc.decode(code), Some(label.as_str()));
        }
    }

    #[test]
    fn codes_follow_label_order() {
        let enc = soils();
        assert_eq!(enc.encode("Clay"), Some(0));
        assert_eq!(enc.encode("Sandy"), Some(2));
    }

    #[test]
    fn encode_is_case_sensitive() {
        assert_eq!(soils().encode("clay"), None);
    }

    #[test]
    fn find_ignores_case_and_whitespace() {
        let enc = soils();
        assert_eq!(enc.find("  lOaMy "), Some("Loamy"));
        assert_eq!(enc.find("Peaty"), None);
    }

    #[test]
    fn decode_out_of_range_is_none() {
        assert_eq!(soils().decode(3), None);
    }

    #[test]
    fn rejects_empty_table() {
        let labels: Vec<String> = Vec::new();
        assert_eq!(CategoryEncoder::new(labels), Err(EncoderError::Empty));
    }

    #[test]
    fn rejects_duplicates() {
        let err = CategoryEncoder::new(["Rabi", "Kharif", "Rabi"]).unwrap_err();
        assert_eq!(
            err,
            EncoderError::Duplicate {
                label: "Rabi".into(),
                first: 0,
                second: 2
            }
        );
    }

    #[test]
    fn rejects_blank_label() {
        let err = CategoryEncoder::new(["Drip", " "]).unwrap_err();
        assert_eq!(err, EncoderError::EmptyLabel(1));
    }
}
