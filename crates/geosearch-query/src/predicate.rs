//! Plain-text predicate building.

/// Operator joining per-field comparisons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Join {
    /// Every comparison must match.
    And,
    /// Any comparison may match.
    #[default]
    Or,
}

impl Join {
    /// The uppercased expression form, with surrounding spaces.
    pub fn separator(self) -> &'static str {
        match self {
            Self::And => " AND ",
            Self::Or => " OR ",
        }
    }
}

/// Builds the substring-match predicate: one `"field" LIKE '%value%'` per
/// field, joined with the operator. Numeric-looking input on text fields
/// still goes through LIKE. Returns `None` when there is nothing to search.
pub fn like_predicate(value: &str, fields: &[String], join: Join) -> Option<String> {
    if value.is_empty() || fields.is_empty() {
        return None;
    }
    let comparisons: Vec<String> = fields
        .iter()
        .map(|field| format!("\"{field}\" LIKE '%{value}%'"))
        .collect();
    Some(comparisons.join(join.separator()))
}

/// Builds the comparison used for non-tiban fields of the parcel tab:
/// an `in (v-k, …, v+k)` window for digit values when fuzzy matching is
/// allowed, otherwise an exact `=` comparison.
pub fn eq_or_fuzzy_predicate(field: &str, value: &str, fuzzy: u32, exact: bool) -> String {
    if fuzzy > 0
        && !exact
        && !value.is_empty()
        && value.chars().all(|ch| ch.is_ascii_digit())
        && let Ok(center) = value.parse::<i64>()
    {
        let radius = i64::from(fuzzy);
        let window: Vec<String> = (center - radius..=center + radius)
            .map(|candidate| candidate.to_string())
            .collect();
        return format!("\"{field}\" in ({})", window.join(","));
    }
    format!("\"{field}\" = '{value}'")
}
