//! Character-by-character reveal of the recommendation text.
//!
//! Purely cosmetic: the full message is known up front and the reveal is
//! computed from elapsed time, so a slow frame never drops characters.

use std::time::Duration;

/// Time-driven prefix of a message.
#[derive(Debug, Clone, PartialEq)]
pub struct TypingReveal {
    message: String,
    per_char: Duration,
    total_chars: usize,
}

impl TypingReveal {
    /// A zero `per_char` delay reveals everything at once.
    pub fn new(message: impl Into<String>, per_char: Duration) -> Self {
        let message = message.into();
        let total_chars = message.chars().count();
        Self {
            message,
            per_char,
            total_chars,
        }
    }

    /// Characters visible after `elapsed`.
    pub fn visible_chars(&self, elapsed: Duration) -> usize {
        if self.per_char.is_zero() {
            return self.total_chars;
        }
        let shown = elapsed.as_nanos() / self.per_char.as_nanos();
        (shown as usize).min(self.total_chars)
    }

    /// Visible prefix after `elapsed`.
    pub fn visible(&self, elapsed: Duration) -> &str {
        let n = self.visible_chars(elapsed);
        match self.message.char_indices().nth(n) {
            Some((byte, _)) => &self.message[..byte],
            None => &self.message,
        }
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        self.visible_chars(elapsed) >= self.total_chars
    }

    /// How long the whole reveal takes.
    pub fn duration(&self) -> Duration {
        self.per_char * self.total_chars as u32
    }
}

/// The message revealed after a successful prediction.
pub fn recommendation_message(crop: &str) -> String {
    format!("Based on your inputs, the recommended crop is *{crop}*.")
}

/// The sentence spoken after a successful prediction.
pub fn spoken_recommendation(crop: &str) -> String {
    format!("The recommended crop is {crop}.")
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS: Duration = Duration::from_millis(1);

    #[test]
    fn reveals_one_char_per_delay() {
        let r = TypingReveal::new("Rice", 50 * MS);
        assert_eq!(r.visible(Duration::ZERO), "");
        assert_eq!(r.visible(50 * MS), "R");
        assert_eq!(r.visible(149 * MS), "Ri");
        assert_eq!(r.visible(200 * MS), "Rice");
        assert!(r.is_complete(200 * MS));
        assert!(!r.is_complete(199 * MS));
    }

    #[test]
    fn never_overshoots() {
        let r = TypingReveal::new("Maize", 10 * MS);
        assert_eq!(r.visible(Duration::from_secs(60)), "Maize");
        assert_eq!(r.duration(), 50 * MS);
    }

    #[test]
    fn zero_delay_is_instant() {
        let r = TypingReveal::new("Wheat", Duration::ZERO);
        assert_eq!(r.visible(Duration::ZERO), "Wheat");
        assert!(r.is_complete(Duration::ZERO));
    }

    #[test]
    fn respects_multibyte_boundaries() {
        let r = TypingReveal::new("🌱 Rice", 10 * MS);
        assert_eq!(r.visible(10 * MS), "🌱");
        assert_eq!(r.visible(20 * MS), "🌱 ");
    }

    #[test]
    fn messages_name_the_crop() {
        assert_eq!(
            recommendation_message("Rice"),
            "Based on your inputs, the recommended crop is *Rice*."
        );
        assert_eq!(spoken_recommendation("Rice"), "The recommended crop is Rice.");
    }
}
