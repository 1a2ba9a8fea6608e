//! ISO 8601 duration parsing for the `contentDetails.duration` field

use regex::Regex;
use std::sync::LazyLock;

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^PT(?:(\d+)H)?(?:(\d+)M)?(?:(\d+)S)?$").expect("Invalid duration regex")
});

/// Parse a `PT#H#M#S` duration into whole seconds
///
/// Day components, fractional seconds and values overflowing `u32` are
/// rejected.
///
/// # Examples
///
/// ```
/// use strata::parser::duration::parse_duration;
///
/// assert_eq!(parse_duration("PT45S"), Some(45));
/// assert_eq!(parse_duration("PT1M5S"), Some(65));
/// assert_eq!(parse_duration("P1D"), None);
/// ```
pub fn parse_duration(value: &str) -> Option<u32> {
    let caps = DURATION_RE.captures(value.trim())?;

    let component = |index: usize| -> Option<u32> {
        match caps.get(index) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(0),
        }
    };

    let hours = component(1)?;
    let minutes = component(2)?;
    let seconds = component(3)?;

    hours
        .checked_mul(3600)?
        .checked_add(minutes.checked_mul(60)?)?
        .checked_add(seconds)
}
