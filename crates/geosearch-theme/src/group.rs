//! Theme grouping by bracketed label convention.
//!
//! A theme named `道路【道路種別】_昼` belongs to group `道路種別`: the
//! group is the text between the configured brackets. The bracket pair
//! comes from `THEME_BRACKET_OPEN` / `THEME_BRACKET_CLOSE` and defaults to
//! `【` / `】`.

/// Environment variable overriding the opening bracket.
pub const BRACKET_OPEN_KEY: &str = "THEME_BRACKET_OPEN";

/// Environment variable overriding the closing bracket.
pub const BRACKET_CLOSE_KEY: &str = "THEME_BRACKET_CLOSE";

/// Default opening bracket.
pub const DEFAULT_BRACKET_OPEN: &str = "【";

/// Default closing bracket.
pub const DEFAULT_BRACKET_CLOSE: &str = "】";

/// The configured bracket pair.
pub fn theme_brackets() -> (String, String) {
    let open = std::env::var(BRACKET_OPEN_KEY)
        .ok()
        .filter(|bracket| !bracket.is_empty())
        .unwrap_or_else(|| DEFAULT_BRACKET_OPEN.to_string());
    let close = std::env::var(BRACKET_CLOSE_KEY)
        .ok()
        .filter(|bracket| !bracket.is_empty())
        .unwrap_or_else(|| DEFAULT_BRACKET_CLOSE.to_string());
    (open, close)
}

/// Extracts the group name between an explicit bracket pair: the first
/// opening bracket and the first closing bracket after it.
pub fn parse_theme_group_with(name: &str, open: &str, close: &str) -> Option<String> {
    let start = name.find(open)? + open.len();
    let rest = &name[start..];
    let end = rest.find(close)?;
    Some(rest[..end].to_string())
}

/// Extracts the group name using the configured brackets.
pub fn parse_theme_group(name: &str) -> Option<String> {
    let (open, close) = theme_brackets();
    parse_theme_group_with(name, &open, &close)
}

/// Theme names partitioned into bracket groups plus an ungrouped bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThemeGroups {
    /// Named groups sorted by group name, each preserving theme order.
    pub grouped: Vec<(String, Vec<String>)>,
    /// Themes with no bracket group, in input order.
    pub ungrouped: Vec<String>,
}

impl ThemeGroups {
    /// Partitions theme names using the configured brackets.
    pub fn build(names: &[String]) -> Self {
        let (open, close) = theme_brackets();
        Self::build_with(names, &open, &close)
    }

    /// Partitions theme names with an explicit bracket pair.
    pub fn build_with(names: &[String], open: &str, close: &str) -> Self {
        let mut groups = Self::default();
        for name in names {
            match parse_theme_group_with(name, open, close) {
                Some(group) => match groups
                    .grouped
                    .iter_mut()
                    .find(|(existing, _)| *existing == group)
                {
                    Some((_, themes)) => themes.push(name.clone()),
                    None => groups.grouped.push((group, vec![name.clone()])),
                },
                None => groups.ungrouped.push(name.clone()),
            }
        }
        groups.grouped.sort_by(|left, right| left.0.cmp(&right.0));
        groups
    }

    /// Group names, sorted.
    pub fn group_names(&self) -> Vec<&str> {
        self.grouped.iter().map(|(name, _)| name.as_str()).collect()
    }

    /// The themes of one group, or every theme when `group` is `None`.
    pub fn themes_for(&self, group: Option<&str>) -> Vec<String> {
        match group {
            Some(name) => self
                .grouped
                .iter()
                .find(|(existing, _)| existing == name)
                .map(|(_, themes)| themes.clone())
                .unwrap_or_default(),
            None => self.flatten(),
        }
    }

    /// All themes: group order first, then the ungrouped bucket.
    pub fn flatten(&self) -> Vec<String> {
        self.grouped
            .iter()
            .flat_map(|(_, themes)| themes.clone())
            .chain(self.ungrouped.iter().cloned())
            .collect()
    }
}

/// Selection state of the toolbar theme chooser: which group filter is
/// active and which themes it exposes. Survives combobox rebuilds so the
/// user's group pick is restored after the theme collection changes.
#[derive(Debug, Clone, Default)]
pub struct ThemeSelector {
    /// Current partition of the theme collection.
    groups: ThemeGroups,
    /// Active group filter; `None` shows every theme.
    current_group: Option<String>,
}

impl ThemeSelector {
    /// Creates an empty selector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the partition from fresh theme names, keeping the current
    /// group selection when that group still exists.
    pub fn update(&mut self, names: &[String]) {
        self.groups = ThemeGroups::build(names);
        if let Some(current) = &self.current_group
            && !self.groups.grouped.iter().any(|(name, _)| name == current)
        {
            self.current_group = None;
        }
    }

    /// Sets the group filter (`None` = show all).
    pub fn set_group(&mut self, group: Option<&str>) {
        self.current_group = group.map(str::to_string);
    }

    /// The active group filter.
    pub fn current_group(&self) -> Option<&str> {
        self.current_group.as_deref()
    }

    /// Group names for the group combobox.
    pub fn group_names(&self) -> Vec<&str> {
        self.groups.group_names()
    }

    /// The themes the theme combobox should show under the active filter.
    pub fn visible_themes(&self) -> Vec<String> {
        self.groups.themes_for(self.current_group())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_group() {
        assert_eq!(
            parse_theme_group_with("道路【道路種別】_昼", "【", "】").unwrap(),
            "道路種別"
        );
        assert_eq!(parse_theme_group_with("基本表示", "【", "】"), None);
        assert_eq!(parse_theme_group_with("空【】", "【", "】").unwrap(), "");
    }

    #[test]
    fn test_parse_group_custom_brackets() {
        assert_eq!(
            parse_theme_group_with("roads[kind]day", "[", "]").unwrap(),
            "kind"
        );
    }

    #[test]
    fn test_group_themes_partition() {
        let names = vec![
            "道路【道路】昼".to_string(),
            "基本".to_string(),
            "道路【道路】夜".to_string(),
            "地番【台帳】".to_string(),
        ];
        let groups = ThemeGroups::build_with(&names, "【", "】");
        assert_eq!(groups.group_names(), vec!["台帳", "道路"]);
        assert_eq!(
            groups.themes_for(Some("道路")),
            vec!["道路【道路】昼", "道路【道路】夜"]
        );
        assert_eq!(groups.ungrouped, vec!["基本"]);
    }

    #[test]
    fn test_flatten_preserves_every_theme() {
        let names = vec![
            "b【g2】".to_string(),
            "plain".to_string(),
            "a【g1】".to_string(),
        ];
        let groups = ThemeGroups::build_with(&names, "【", "】");
        let mut flattened = groups.flatten();
        let mut original = names.clone();
        flattened.sort();
        original.sort();
        assert_eq!(flattened, original);
    }

    #[test]
    fn test_selector_keeps_group_across_updates() {
        let mut selector = ThemeSelector::new();
        selector.update(&["a【g1】".to_string(), "b【g2】".to_string()]);
        selector.set_group(Some("g1"));
        selector.update(&[
            "a【g1】".to_string(),
            "b【g2】".to_string(),
            "c【g1】".to_string(),
        ]);
        assert_eq!(selector.current_group(), Some("g1"));
        assert_eq!(selector.visible_themes(), vec!["a【g1】", "c【g1】"]);

        // The group disappears: the filter falls back to showing all.
        selector.update(&["b【g2】".to_string()]);
        assert_eq!(selector.current_group(), None);
        assert_eq!(selector.visible_themes(), vec!["b【g2】"]);
    }
}
