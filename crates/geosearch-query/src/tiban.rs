//! Parcel-number (tiban) fuzzy regex building.
//!
//! Parcel numbers are hyphen-separated (`12-3`, `12-3-1`). The search
//! tolerates off-by-two mistakes in the main number and open-ended tails,
//! so `12-3` also finds `11-3` and `12-3-1`.

/// Fuzzy radius applied to the first numeric segment.
pub const FUZZY_RADIUS: i64 = 2;

/// Builds the anchored `regexp_match` predicate for a parcel-number value.
///
/// The value splits on `-` into segments:
/// - a numeric first segment becomes the alternation
///   `(n-2|n-1|n|n+1|n+2)`;
/// - later non-empty segments become `(value)([^-]*)?`;
/// - empty segments become `([^-]*)?`;
/// - once only empty segments remain, the tail collapses into `(-[^-]*)*`
///   and composition stops.
///
/// Returns `None` when every segment is empty.
pub fn tiban_predicate(field: &str, value: &str) -> Option<String> {
    let segments: Vec<&str> = value.split('-').collect();
    if segments.iter().all(|segment| segment.is_empty()) {
        return None;
    }

    let mut regex = String::new();
    for (index, segment) in segments.iter().enumerate() {
        if index == 0 && is_digits(segment) {
            regex.push_str(&fuzzy_alternation(segment));
        } else if !segment.is_empty() {
            regex.push_str(&format!("({segment})([^-]*)?"));
        } else {
            regex.push_str("([^-]*)?");
        }

        if index == segments.len() - 1 {
            continue;
        }
        if segments[index + 1..]
            .iter()
            .all(|remaining| remaining.is_empty())
        {
            regex.push_str("(-[^-]*)*");
            break;
        }
        regex.push('-');
    }

    Some(format!("regexp_match(\"{field}\", '^{regex}$')"))
}

/// True for a non-empty run of ASCII digits.
fn is_digits(segment: &str) -> bool {
    !segment.is_empty() && segment.chars().all(|ch| ch.is_ascii_digit())
}

/// `(n-2|n-1|n|n+1|n+2)` for a digit segment.
fn fuzzy_alternation(segment: &str) -> String {
    let center: i64 = segment.parse().unwrap_or(0);
    let window: Vec<String> = (center - FUZZY_RADIUS..=center + FUZZY_RADIUS)
        .map(|candidate| candidate.to_string())
        .collect();
    format!("({})", window.join("|"))
}
