//! Surface features of a video title

/// Pictographic block treated as emoji
const EMOJI_RANGE: std::ops::RangeInclusive<char> = '\u{1F300}'..='\u{1F9FF}';

/// Counts and flags derived from a title
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TitleFeatures {
    /// Length in characters
    pub length: usize,
    pub word_count: usize,
    pub has_emoji: bool,
    pub has_question: bool,
    pub has_exclamation: bool,
    /// Uppercase characters over all characters, 0 for an empty title
    pub caps_ratio: f64,
}

impl TitleFeatures {
    pub fn from_title(title: &str) -> Self {
        let mut length = 0usize;
        let mut uppercase = 0usize;
        let mut has_emoji = false;

        for c in title.chars() {
            length += 1;
            if c.is_uppercase() {
                uppercase += 1;
            }
            if EMOJI_RANGE.contains(&c) {
                has_emoji = true;
            }
        }

        Self {
            length,
            word_count: title.split_whitespace().count(),
            has_emoji,
            has_question: title.contains('?'),
            has_exclamation: title.contains('!'),
            caps_ratio: uppercase as f64 / length.max(1) as f64,
        }
    }
}
