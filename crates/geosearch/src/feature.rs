//! The live search feature behind one tab.

use geosearch_config::{LayerRef, LoadedTab, TabConfig};
use geosearch_engine::{ResultModel, layer_source_for_tab, resolve_layer, run_search};
use geosearch_host::{AttrValue, FeatureId, FieldDef, Host, LayerHandle};
use geosearch_query::{
    Join, eq_or_fuzzy_predicate, like_predicate, owner_predicate, resolve_specs, tiban_predicate,
};
use geosearch_text::{fold_small_kana, normalize};
use geosearch_theme::ThemeManager;
use geosearch_view::{
    NavigationOptions, NavigationOutcome, PanMode, drive_animation, navigate,
};
use tracing::{debug, warn};

/// Tab title selecting the parcel-number search style.
pub const TIBAN_TAB_TITLE: &str = "地番検索";

/// Tab title selecting the owner-name search style.
pub const OWNER_TAB_TITLE: &str = "所有者検索";

/// Which predicate style a tab uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    /// Substring search over configured or all fields.
    Text,
    /// Parcel-number search with the fuzzy segment regex.
    Tiban,
    /// Owner-name search with kana folding.
    Owner,
}

impl SearchKind {
    /// Picks the style from the tab title.
    pub fn for_title(title: &str) -> Self {
        match title {
            TIBAN_TAB_TITLE => Self::Tiban,
            OWNER_TAB_TITLE => Self::Owner,
            _ => Self::Text,
        }
    }
}

/// The input-widget values read at search time.
#[derive(Debug, Clone, Default)]
pub struct SearchInputs {
    /// One value per configured field widget.
    pub values: Vec<String>,
    /// Parcel tab: the exact-match toggle (disables fuzzy windows).
    pub exact_match: bool,
    /// Owner tab: substring match (`%v%`) instead of prefix (`v%`).
    pub substring_match: bool,
    /// Owner tab: which field checkboxes are on; missing entries count as
    /// on.
    pub checked_fields: Vec<bool>,
}

impl SearchInputs {
    /// Inputs with just the field values.
    pub fn with_values(values: &[&str]) -> Self {
        Self {
            values: values.iter().map(|value| value.to_string()).collect(),
            ..Self::default()
        }
    }

    /// The first non-empty value, normalized.
    fn primary_value(&self) -> Option<String> {
        self.values
            .iter()
            .find(|value| !value.is_empty())
            .map(|value| normalize(value))
    }

    /// Whether the owner checkbox at `index` is on.
    fn is_checked(&self, index: usize) -> bool {
        self.checked_fields.get(index).copied().unwrap_or(true)
    }
}

/// Suggestion values for one input widget.
#[derive(Debug, Clone, PartialEq)]
pub struct Suggestion {
    /// The field the widget searches.
    pub field: String,
    /// Distinct values for the completer.
    pub values: Vec<String>,
}

/// One tab's runtime state: its configuration, result model, and the
/// toolbar settings pushed down from the controller.
#[derive(Debug)]
pub struct SearchFeature {
    /// The tab this feature runs, with provenance for edit routing.
    tab: LoadedTab,
    /// Predicate style, from the title.
    kind: SearchKind,
    /// Join operator between per-field comparisons.
    join: Join,
    /// Results of the last search.
    results: ResultModel,
    /// Current pan mode.
    pan_mode: PanMode,
    /// Toolbar fixed scale.
    fixed_scale: Option<f64>,
    /// Whether theme application merges instead of overwriting.
    theme_additive: bool,
    /// Whether navigation forces the target layer visible.
    show_layer_name: bool,
    /// Whether the database format script already ran.
    format_sql_done: bool,
    /// Whether the tab is the active one.
    loaded: bool,
}

impl SearchFeature {
    /// Creates the feature for a loaded tab.
    pub fn new(tab: LoadedTab, page_limit: u32) -> Self {
        let kind = SearchKind::for_title(&tab.config.title);
        let join = match kind {
            SearchKind::Tiban => Join::And,
            _ => Join::Or,
        };
        Self {
            kind,
            join,
            results: ResultModel::new(page_limit as usize),
            pan_mode: PanMode::default(),
            fixed_scale: None,
            theme_additive: false,
            show_layer_name: false,
            format_sql_done: false,
            loaded: false,
            tab,
        }
    }

    /// The tab with its provenance.
    pub fn tab(&self) -> &LoadedTab {
        &self.tab
    }

    /// The tab configuration.
    pub fn config(&self) -> &TabConfig {
        &self.tab.config
    }

    /// The predicate style.
    pub fn kind(&self) -> SearchKind {
        self.kind
    }

    /// The tab's help message.
    pub fn message(&self) -> Option<&str> {
        self.tab.config.message.as_deref()
    }

    /// The result model of the last search.
    pub fn results(&self) -> &ResultModel {
        &self.results
    }

    /// Mutable access to the result model (tab/page/selection state).
    pub fn results_mut(&mut self) -> &mut ResultModel {
        &mut self.results
    }

    /// Sets the pan mode.
    pub fn set_pan_mode(&mut self, mode: PanMode) {
        self.pan_mode = mode;
    }

    /// Sets the toolbar fixed scale.
    pub fn set_fixed_scale(&mut self, scale: Option<f64>) {
        self.fixed_scale = scale;
    }

    /// Sets additive theme application.
    pub fn set_theme_additive(&mut self, additive: bool) {
        self.theme_additive = additive;
    }

    /// Sets forced layer visibility after navigation.
    pub fn set_show_layer_name(&mut self, show: bool) {
        self.show_layer_name = show;
    }

    /// The tab's target layer. Resolved fresh on every call: without a
    /// configured reference this follows the host's active layer.
    pub fn layer(&mut self, host: &dyn Host) -> Option<LayerHandle> {
        let run_format = !self.format_sql_done;
        let resolved = resolve_layer(host, self.tab.config.layer.as_ref(), run_format);
        if resolved.is_some()
            && run_format
            && matches!(self.tab.config.layer, Some(LayerRef::Database { .. }))
        {
            self.format_sql_done = true;
        }
        resolved
    }

    /// Activates the tab. Returns completer suggestions when the tab asks
    /// for them.
    pub fn load(&mut self, host: &dyn Host) -> Vec<Suggestion> {
        self.loaded = true;
        if !self.tab.config.suggest {
            return Vec::new();
        }
        let Some(layer) = self.layer(host) else {
            return Vec::new();
        };
        self.tab
            .config
            .field_specs()
            .iter()
            .filter_map(|spec| spec.field.clone())
            .map(|field| Suggestion {
                values: host
                    .unique_values(&layer.id, &field)
                    .iter()
                    .filter_map(AttrValue::render)
                    .collect(),
                field,
            })
            .collect()
    }

    /// Deactivates the tab.
    pub fn unload(&mut self) {
        self.loaded = false;
    }

    /// Whether the tab is active.
    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    /// Runs the search: saves the pre-search theme, applies the tab's
    /// configured theme, executes the predicate over the tab's layer set
    /// and fills the result model. Returns the total hit count.
    pub fn search(
        &mut self,
        host: &dyn Host,
        themes: &mut ThemeManager,
        inputs: &SearchInputs,
    ) -> usize {
        themes.save_pre_search(host);
        themes.apply_search_theme(
            host,
            self.tab.config.select_theme.as_deref(),
            self.theme_additive,
        );

        let resolved = self.layer(host);
        let Some(source) = layer_source_for_tab(host, &self.tab.config, resolved.as_ref()) else {
            warn!(tab = %self.tab.config.title, "no target layer; search yields nothing");
            self.results.clear();
            return 0;
        };

        let groups = run_search(host, &source, &self.tab.config.view_fields, &|fields| {
            self.build_predicate(fields, inputs)
        });
        self.results.set_groups(groups);
        let total = self.results.total_count();
        debug!(tab = %self.tab.config.title, total, "search finished");
        total
    }

    /// Runs the search through the host task manager; results land in the
    /// model from the completion callback.
    pub fn search_deferred(
        &mut self,
        host: &dyn Host,
        themes: &mut ThemeManager,
        inputs: &SearchInputs,
    ) {
        host.add_task(
            "地図検索",
            Box::new(|| {
                let total = self.search(host, themes, inputs);
                debug!(total, "deferred search delivered");
            }),
        );
    }

    /// Builds the predicate for one target layer, per the tab's style.
    pub fn build_predicate(&self, layer_fields: &[FieldDef], inputs: &SearchInputs) -> Option<String> {
        match self.kind {
            SearchKind::Text => self.build_text(layer_fields, inputs),
            SearchKind::Tiban => self.build_tiban(inputs),
            SearchKind::Owner => self.build_owner(inputs),
        }
    }

    /// Substring search over the resolved fields.
    fn build_text(&self, layer_fields: &[FieldDef], inputs: &SearchInputs) -> Option<String> {
        let value = inputs.primary_value()?;
        let fields = resolve_specs(layer_fields, &self.tab.config.field_specs(), &value);
        like_predicate(&value, &fields, self.join)
    }

    /// Parcel-number search: the designated field gets the segment regex,
    /// every other widget an exact or fuzzy-window comparison.
    fn build_tiban(&self, inputs: &SearchInputs) -> Option<String> {
        let tiban_field = self.tab.config.tiban_field.as_deref().unwrap_or_default();
        let specs = self.tab.config.field_specs();

        let mut comparisons = Vec::new();
        let mut segments: Vec<String> = Vec::new();
        for (spec, raw) in specs.iter().zip(&inputs.values) {
            let Some(field) = spec.field.as_deref() else {
                continue;
            };
            if field == tiban_field {
                segments.push(normalize(raw));
                continue;
            }
            if raw.is_empty() {
                continue;
            }
            let value = normalize(raw);
            comparisons.push(eq_or_fuzzy_predicate(
                field,
                &value,
                spec.fuzzy.unwrap_or(0),
                inputs.exact_match,
            ));
        }
        if !segments.is_empty()
            && let Some(regex) = tiban_predicate(tiban_field, &segments.join("-"))
        {
            comparisons.push(regex);
        }
        if comparisons.is_empty() {
            return None;
        }
        Some(comparisons.join(self.join.separator()))
    }

    /// Owner-name search over the checked fields.
    fn build_owner(&self, inputs: &SearchInputs) -> Option<String> {
        let raw = inputs.values.first()?;
        if raw.is_empty() {
            return None;
        }
        let specs = self.tab.config.field_specs();
        let mut comparisons = Vec::new();
        for (index, spec) in specs.iter().enumerate() {
            if !inputs.is_checked(index) {
                continue;
            }
            let Some(field) = spec.field.as_deref() else {
                continue;
            };
            let hankaku = spec.kana_hankaku.unwrap_or(false);
            let value = fold_small_kana(&normalize(raw), hankaku);
            comparisons.push(owner_predicate(
                field,
                &value,
                hankaku,
                inputs.substring_match,
            ));
        }
        if comparisons.is_empty() {
            return None;
        }
        Some(comparisons.join(self.join.separator()))
    }

    /// Navigation settings from the tab configuration plus the toolbar
    /// state.
    fn navigation_options(&self) -> NavigationOptions {
        NavigationOptions {
            pan_mode: self.pan_mode,
            fixed_scale: self.fixed_scale,
            tab_scale: self.tab.config.scale,
            angle: self.tab.config.angle,
            show_layer: self.show_layer_name,
        }
    }

    /// Navigates to the rows currently selected in the result model (the
    /// selection-changed path from the result table).
    pub fn zoom_selection(&mut self, host: &dyn Host) {
        let Some(tab_layer) = self.results.current_tab().map(|tab| tab.layer.clone()) else {
            return;
        };
        let ids = self.results.selected_ids().to_vec();
        self.zoom_features(host, &tab_layer, &ids);
    }

    /// Navigates to one pressed result item.
    pub fn press_item(&mut self, host: &dyn Host, feature_id: FeatureId) {
        let Some(tab_layer) = self.results.current_tab().map(|tab| tab.layer.clone()) else {
            return;
        };
        self.zoom_features(host, &tab_layer, &[feature_id]);
    }

    /// Selects and navigates; animated pans are driven to completion.
    fn zoom_features(&self, host: &dyn Host, layer: &LayerHandle, ids: &[FeatureId]) {
        let options = self.navigation_options();
        match navigate(host, layer, ids, &options) {
            NavigationOutcome::Animated(animation) => {
                drive_animation(host, &layer.id, animation, &options);
            }
            NavigationOutcome::NoOp => debug!("nothing selected to zoom to"),
            NavigationOutcome::SelectionOnly | NavigationOutcome::Viewed => {}
        }
    }

    /// Opens the host attribute form for a result item.
    pub fn open_feature_form(&mut self, host: &dyn Host, feature_id: FeatureId) {
        let layer = self
            .results
            .current_tab()
            .map(|tab| tab.layer.clone())
            .or_else(|| self.layer(host));
        if let Some(layer) = layer
            && !host.open_feature_form(&layer.id, feature_id)
        {
            warn!(layer = %layer.name, "could not open the attribute form");
        }
    }
}

#[cfg(test)]
mod tests {
    use geosearch_config::{Provenance, SourceKind};
    use geosearch_host::{Feature, FieldType, LayerBuilder, MemoryHost, Rect};

    use super::*;

    /// Wraps a tab JSON into a loaded tab with project provenance.
    fn loaded(json: &str) -> LoadedTab {
        LoadedTab {
            config: serde_json::from_str(json).unwrap(),
            provenance: Provenance {
                source: SourceKind::Project,
                source_index: 0,
                load_sequence: 0,
            },
        }
    }

    /// Host with a parcels layer of text+numeric fields.
    fn parcel_host() -> MemoryHost {
        let host = MemoryHost::new();
        let layer = host.add_layer(
            LayerBuilder::new("parcels")
                .field(FieldDef::new("note", FieldType::Text))
                .field(FieldDef::new("code", FieldType::Integer))
                .feature(Feature::new(
                    1,
                    vec![AttrValue::Text("ab123cd".into()), AttrValue::Integer(9)],
                    Some(Rect::new(0.0, 0.0, 1.0, 1.0)),
                ))
                .feature(Feature::new(
                    2,
                    vec![AttrValue::Text("xyz".into()), AttrValue::Integer(123)],
                    Some(Rect::new(5.0, 5.0, 6.0, 6.0)),
                )),
        );
        host.set_active_layer(&layer);
        host
    }

    #[test]
    fn test_kind_from_title() {
        assert_eq!(SearchKind::for_title("地番検索"), SearchKind::Tiban);
        assert_eq!(SearchKind::for_title("所有者検索"), SearchKind::Owner);
        assert_eq!(SearchKind::for_title("anything"), SearchKind::Text);
    }

    #[test]
    fn test_all_fields_search_with_fullwidth_numeric() {
        let feature = SearchFeature::new(
            loaded(r#"{"Title":"parcels","SearchField":{}}"#),
            100,
        );
        let fields = vec![
            FieldDef::new("note", FieldType::Text),
            FieldDef::new("code", FieldType::Integer),
        ];
        let inputs = SearchInputs::with_values(&["１２３"]);
        // Fullwidth digits normalize, so the numeric field joins in.
        assert_eq!(
            feature.build_predicate(&fields, &inputs).unwrap(),
            "\"note\" LIKE '%123%' OR \"code\" LIKE '%123%'"
        );
    }

    #[test]
    fn test_search_fills_result_model() {
        let host = parcel_host();
        let mut themes = ThemeManager::new();
        let mut feature = SearchFeature::new(
            loaded(r#"{"Title":"parcels","SearchField":{}}"#),
            100,
        );
        let total = feature.search(&host, &mut themes, &SearchInputs::with_values(&["123"]));
        assert_eq!(total, 2);
        assert_eq!(feature.results().tabs().len(), 1);
        assert_eq!(feature.results().tabs()[0].label, "parcels");
    }

    #[test]
    fn test_empty_input_yields_no_results() {
        let host = parcel_host();
        let mut themes = ThemeManager::new();
        let mut feature = SearchFeature::new(
            loaded(r#"{"Title":"parcels","SearchField":{}}"#),
            100,
        );
        let total = feature.search(&host, &mut themes, &SearchInputs::default());
        assert_eq!(total, 0);
        assert!(feature.results().tabs().is_empty());
    }

    #[test]
    fn test_tiban_predicate_with_segments_and_fuzzy_widget() {
        let feature = SearchFeature::new(
            loaded(
                r#"{
                    "Title": "地番検索",
                    "TibanField": "chiban",
                    "SearchFields": [
                        {"Field": "chiban", "ViewName": "地番"},
                        {"Field": "eda", "ViewName": "枝番", "Fuzzy": 2}
                    ]
                }"#,
            ),
            100,
        );
        let inputs = SearchInputs::with_values(&["12-3", "5"]);
        assert_eq!(
            feature.build_predicate(&[], &inputs).unwrap(),
            "\"eda\" in (3,4,5,6,7) AND regexp_match(\"chiban\", '^(10|11|12|13|14)-(3)([^-]*)?$')"
        );
    }

    #[test]
    fn test_tiban_exact_toggle_disables_fuzzy() {
        let feature = SearchFeature::new(
            loaded(
                r#"{
                    "Title": "地番検索",
                    "TibanField": "chiban",
                    "SearchFields": [
                        {"Field": "chiban"},
                        {"Field": "eda", "Fuzzy": 2}
                    ]
                }"#,
            ),
            100,
        );
        let inputs = SearchInputs {
            values: vec!["12".into(), "5".into()],
            exact_match: true,
            ..SearchInputs::default()
        };
        assert_eq!(
            feature.build_predicate(&[], &inputs).unwrap(),
            "\"eda\" = '5' AND regexp_match(\"chiban\", '^(10|11|12|13|14)$')"
        );
    }

    #[test]
    fn test_owner_predicate_folds_kana() {
        let feature = SearchFeature::new(
            loaded(
                r#"{
                    "Title": "所有者検索",
                    "SearchFields": [{"Field": "owner", "KanaHankaku": true}]
                }"#,
            ),
            100,
        );
        let inputs = SearchInputs {
            values: vec!["ｻﾄｩ".into()],
            substring_match: true,
            ..SearchInputs::default()
        };
        let predicate = feature.build_predicate(&[], &inputs).unwrap();
        // Small kana folded in the query value; substring pattern.
        assert!(predicate.starts_with("replace(\"owner\", array("));
        assert!(predicate.ends_with("LIKE '%ｻﾄｳ%'"));
    }

    #[test]
    fn test_owner_unchecked_field_is_skipped() {
        let feature = SearchFeature::new(
            loaded(
                r#"{
                    "Title": "所有者検索",
                    "SearchFields": [
                        {"Field": "owner_kana", "KanaHankaku": true},
                        {"Field": "owner"}
                    ]
                }"#,
            ),
            100,
        );
        let inputs = SearchInputs {
            values: vec!["サトウ".into()],
            checked_fields: vec![false, true],
            substring_match: true,
            ..SearchInputs::default()
        };
        let predicate = feature.build_predicate(&[], &inputs).unwrap();
        assert!(predicate.contains("\"owner\""));
        assert!(!predicate.contains("owner_kana"));
    }

    #[test]
    fn test_layer_follows_active_layer() {
        let host = parcel_host();
        let other = host.add_layer(LayerBuilder::new("roads"));
        let mut feature =
            SearchFeature::new(loaded(r#"{"Title":"follow"}"#), 100);
        assert_eq!(feature.layer(&host).unwrap().name, "parcels");
        host.set_active_layer(&other);
        assert_eq!(feature.layer(&host).unwrap().name, "roads");
    }

    #[test]
    fn test_load_returns_suggestions() {
        let host = parcel_host();
        let mut feature = SearchFeature::new(
            loaded(r#"{"Title":"parcels","Suggest":true,"SearchFields":[{"Field":"note"}]}"#),
            100,
        );
        let suggestions = feature.load(&host);
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].field, "note");
        assert_eq!(suggestions[0].values, vec!["ab123cd", "xyz"]);
        assert!(feature.is_loaded());
        feature.unload();
        assert!(!feature.is_loaded());
    }

    #[test]
    fn test_search_saves_pre_search_theme() {
        let host = parcel_host();
        let mut themes = ThemeManager::new();
        let mut feature = SearchFeature::new(
            loaded(r#"{"Title":"parcels","SearchField":{}}"#),
            100,
        );
        feature.search(&host, &mut themes, &SearchInputs::with_values(&["123"]));
        assert!(geosearch_host::ThemeApi::has_theme(
            &host,
            geosearch_theme::PRE_SEARCH_THEME
        ));
    }
}
