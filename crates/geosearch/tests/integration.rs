//! End-to-end tests over the in-memory host.
//!
//! Each test drives the full stack the way the host application would:
//! configuration load -> dialog build -> search -> result selection ->
//! view navigation, with themes applied around the search.

// Integration tests live outside cfg(test) by design
#![allow(clippy::tests_outside_test_module)]

use std::fs;
use std::path::{Path, PathBuf};

use geosearch::{SearchController, SearchInputs};
use geosearch_config::{ConfigStore, PROJECT_VARIABLE_KEY, SourceKind};
use geosearch_host::{
    AttrValue, CanvasApi, Feature, FeatureId, FieldDef, FieldType, LayerApi, LayerBuilder,
    LayerTreeApi, MemoryHost, ProjectApi, Rect, ThemeApi, VariableApi,
};

/// Temporary project directory with a bundled config file.
struct TestEnv {
    root: tempfile::TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            root: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self) -> &Path {
        self.root.path()
    }

    /// Writes the bundled `setting.json` and returns its path.
    fn write_bundled(&self, content: &str) -> PathBuf {
        let path = self.root.path().join("setting.json");
        fs::write(&path, content).unwrap();
        path
    }

    /// A host whose project file lives in this directory.
    fn host(&self) -> MemoryHost {
        let host = MemoryHost::new();
        host.set_project_file(self.path().join("town.qgz"));
        host
    }
}

/// A parcels layer with text, numeric, parcel-number and owner fields.
fn add_parcels(host: &MemoryHost) -> geosearch_host::LayerId {
    let layer = host.add_layer(
        LayerBuilder::new("parcels")
            .field(FieldDef::new("note", FieldType::Text))
            .field(FieldDef::new("code", FieldType::Integer))
            .field(FieldDef::new("chiban", FieldType::Text))
            .field(FieldDef::new("owner", FieldType::Text))
            .feature(Feature::new(
                1,
                vec![
                    AttrValue::Text("メモ123".into()),
                    AttrValue::Integer(9),
                    AttrValue::Text("11-3".into()),
                    AttrValue::Text("ｻﾄｳﾀﾛｳ".into()),
                ],
                Some(Rect::new(0.0, 0.0, 10.0, 10.0)),
            ))
            .feature(Feature::new(
                2,
                vec![
                    AttrValue::Text("xyz".into()),
                    AttrValue::Integer(123),
                    AttrValue::Text("20-1".into()),
                    AttrValue::Text("ｽｽﾞｷｼﾞﾛｳ".into()),
                ],
                Some(Rect::new(100.0, 100.0, 110.0, 110.0)),
            )),
    );
    host.set_active_layer(&layer);
    layer
}

#[test]
fn test_add_current_layer_then_reload_shows_the_tab() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(r#"{"SearchTabs":[]}"#);
    let host = env.host();
    add_parcels(&host);

    let store = ConfigStore::new(&bundled);
    store
        .add_active_layer(&host, Some(SourceKind::Project))
        .unwrap();

    // The project variable now holds exactly the standard one-entry list.
    let raw = host.read_variable(PROJECT_VARIABLE_KEY).unwrap();
    let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(value[0]["Title"], "parcels");
    assert_eq!(value[0]["Layer"]["LayerType"], "Name");
    assert_eq!(value[0]["group"], "ﾌﾟﾛｼﾞｪｸﾄ検索");

    // A rebuilt dialog picks the tab up with project provenance.
    let mut controller = SearchController::new(store);
    controller.build(&host).unwrap();
    let feature = controller
        .features()
        .iter()
        .find(|feature| feature.config().title == "parcels")
        .unwrap();
    assert_eq!(feature.tab().provenance.source, SourceKind::Project);
}

#[test]
fn test_all_fields_search_finds_text_and_numeric_hits() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"parcels","SearchField":{}}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();

    // Fullwidth input normalizes to digits, which match the text field of
    // feature 1 and the numeric field of feature 2.
    let total = controller.search(&host, &SearchInputs::with_values(&["１２３"]));
    assert_eq!(total, 2);
}

#[test]
fn test_tiban_search_matches_fuzzy_neighbours() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "地番検索",
                "TibanField": "chiban",
                "SearchFields": [{"Field": "chiban", "ViewName": "地番"}]
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();

    // 12-3 with radius 2 matches the stored 11-3 but not 20-1.
    let total = controller.search(&host, &SearchInputs::with_values(&["12-3"]));
    assert_eq!(total, 1);
    let results = controller.current_feature().unwrap().results();
    assert_eq!(results.tabs()[0].features[0].id, FeatureId(1));
}

#[test]
fn test_owner_search_with_halfwidth_kana() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "所有者検索",
                "SearchFields": [{"Field": "owner", "KanaHankaku": true}]
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();

    // Fullwidth input against a halfwidth-stored name: the replace()
    // folding makes them comparable.
    let inputs = SearchInputs {
        values: vec!["ｻﾄｳ".into()],
        substring_match: true,
        ..SearchInputs::default()
    };
    let total = controller.search(&host, &inputs);
    assert_eq!(total, 1);
    let results = controller.current_feature().unwrap().results();
    assert_eq!(results.tabs()[0].features[0].id, FeatureId(1));
}

#[test]
fn test_additive_theme_apply_preserves_union() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(r#"{"SearchTabs":[]}"#);
    let host = env.host();
    let layer_a = host.add_layer(LayerBuilder::new("A"));
    let layer_b = host.add_layer(LayerBuilder::new("B"));
    let layer_c = host.add_layer(LayerBuilder::new("C"));

    // Theme T1 shows {B, C}; the current view shows {A, B}.
    host.set_layer_visible(&layer_a, false);
    host.insert_theme_from_current_state("T1");
    host.set_layer_visible(&layer_a, true);
    host.set_layer_visible(&layer_c, false);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    controller.on_additive_toggled(true);
    assert!(controller.apply_selected_theme(&host, "T1"));

    let visible: Vec<_> = host
        .layer_nodes()
        .into_iter()
        .filter(|node| node.visible)
        .map(|node| node.layer)
        .collect();
    assert_eq!(visible, vec![layer_a, layer_b, layer_c]);
    // No temporary theme is left behind.
    assert_eq!(host.theme_names(), vec!["T1"]);
}

#[test]
fn test_search_applies_configured_theme_and_saves_pre_search() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "parcels",
                "SearchField": {},
                "selectTheme": "T1"
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);
    let roads = host.add_layer(LayerBuilder::new("roads").visible(false));
    host.set_layer_visible(&roads, true);
    host.insert_theme_from_current_state("T1");
    host.set_layer_visible(&roads, false);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    controller.search(&host, &SearchInputs::with_values(&["123"]));

    // The configured theme made the roads layer visible again.
    assert!(
        host.layer_nodes()
            .iter()
            .any(|node| node.layer == roads && node.visible)
    );
    // The pre-search restore theme exists afterwards.
    assert!(host.has_theme(geosearch_theme::PRE_SEARCH_THEME));
}

#[test]
fn test_animated_pan_after_result_press() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"parcels","SearchField":{}}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);
    host.set_extent(Rect::new(-50.0, -50.0, 50.0, 50.0));

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    // UI index 3 maps to the animated-pan mode.
    controller.on_pan_mode_index(3);

    controller.search(&host, &SearchInputs::with_values(&["xyz"]));
    let refreshes_before = host.refresh_count();
    let feature = controller.current_feature_mut().unwrap();
    feature.press_item(&host, FeatureId(2));

    // 20 animation steps plus the final buffered extent.
    assert_eq!(host.refresh_count() - refreshes_before, 21);
    assert_eq!(host.extent(), Rect::new(99.5, 99.5, 110.5, 110.5));
    // The pressed feature is selected on the layer.
    let layer = host.layers_by_name("parcels")[0].id.clone();
    assert_eq!(host.selected_ids(&layer), vec![FeatureId(2)]);
}

#[test]
fn test_selection_only_mode_keeps_view() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"parcels","SearchField":{}}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    // UI index 4 maps to the selection-only mode.
    controller.on_pan_mode_index(4);

    controller.search(&host, &SearchInputs::with_values(&["xyz"]));
    let before = host.extent();
    let feature = controller.current_feature_mut().unwrap();
    feature.press_item(&host, FeatureId(2));

    assert_eq!(host.extent(), before);
    let layer = host.layers_by_name("parcels")[0].id.clone();
    assert_eq!(host.selected_ids(&layer), vec![FeatureId(2)]);
}

#[test]
fn test_fixed_scale_and_rotation_follow_navigation() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "parcels",
                "SearchField": {},
                "angle": 30,
                "scale": 2500
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    // The toolbar scale would say 5000, but the tab's own value wins.
    controller.on_scale_text("1:5,000");
    controller.on_pan_mode_index(2);

    controller.search(&host, &SearchInputs::with_values(&["xyz"]));
    let feature = controller.current_feature_mut().unwrap();
    feature.press_item(&host, FeatureId(2));

    assert_eq!(host.scale(), 2500.0);
    assert_eq!(host.rotation(), 30.0);
}

#[test]
fn test_same_name_layers_produce_one_tab_each() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "parcels",
                "Layer": {"LayerType": "Name", "Name": "parcels"},
                "SearchField": {}
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);
    // A second layer with the same name and one matching feature.
    host.add_layer(
        LayerBuilder::new("parcels")
            .id("copy2_parcels")
            .field(FieldDef::new("note", FieldType::Text))
            .feature(Feature::new(
                7,
                vec![AttrValue::Text("xyz789".into())],
                None,
            )),
    );

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    let total = controller.search(&host, &SearchInputs::with_values(&["xyz"]));
    assert_eq!(total, 2);

    let results = controller.current_feature().unwrap().results();
    assert_eq!(results.tabs().len(), 2);
    // Labels carry the id prefix so the duplicate names stay apart.
    assert!(results.tabs()[0].label.starts_with("parcels ("));
    assert_ne!(results.tabs()[0].label, results.tabs()[1].label);
}

#[test]
fn test_visible_layers_tab_searches_only_visible() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"表示レイヤ","SearchField":{}}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);
    let hidden = host.add_layer(
        LayerBuilder::new("hidden")
            .visible(false)
            .field(FieldDef::new("note", FieldType::Text))
            .feature(Feature::new(9, vec![AttrValue::Text("xyz".into())], None)),
    );

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    let total = controller.search(&host, &SearchInputs::with_values(&["xyz"]));

    // Only the visible parcels layer contributes.
    assert_eq!(total, 1);
    let results = controller.current_feature().unwrap().results();
    assert!(results.tabs().iter().all(|tab| tab.layer.id != hidden));
}

#[test]
fn test_or_list_search_spans_both_fields() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{
            "SearchTabs": [{
                "Title": "parcels",
                "SearchField": {"ViewName": "OR検索:地番・所有者", "Field": "chiban, owner"}
            }],
            "PageLimit": 100
        }"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();

    // "11" hits the chiban of feature 1 only; the owner column of neither.
    let total = controller.search(&host, &SearchInputs::with_values(&["11"]));
    assert_eq!(total, 1);
}

#[test]
fn test_edit_tab_then_scheduled_rebuild_picks_it_up() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"parcels","SearchField":{}}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(&bundled));
    controller.build(&host).unwrap();

    // Edit the loaded tab through the store, routed by its provenance.
    let original = controller.features()[0].tab().clone();
    let mut updated = original.config.clone();
    updated.angle = Some(15.0);
    controller.store().update(&host, &original, &updated).unwrap();

    // The rebuild fires only after the settle delay.
    let start = std::time::Instant::now();
    controller.on_project_saved(&host, start);
    assert!(controller.poll_rebuild(&host, start).unwrap().is_none());
    let rebuilt = controller
        .poll_rebuild(&host, start + std::time::Duration::from_secs(1))
        .unwrap();
    assert!(rebuilt.is_some());
    assert_eq!(controller.features()[0].config().angle, Some(15.0));
}

#[test]
fn test_form_mode_detail_for_selected_feature() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"parcels","SearchField":{},"ViewFields":["chiban"]}],"PageLimit":100}"#,
    );
    let host = env.host();
    add_parcels(&host);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    controller.search(&host, &SearchInputs::with_values(&["xyz"]));

    let results = controller.current_feature_mut().unwrap().results_mut();
    results.set_display_mode(geosearch_engine::DisplayMode::Form);
    let list = results.form_list();
    assert_eq!(list.len(), 1);
    assert_eq!(list[0].text, "20-1");

    // The detail pane shows the full attribute list, not just the view
    // columns.
    let detail = results.form_detail(list[0].feature_id);
    assert_eq!(detail.len(), 4);
    assert!(detail.contains(&("owner".to_string(), "ｽｽﾞｷｼﾞﾛｳ".to_string())));
}

#[test]
fn test_theme_chooser_groups_and_filters() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(r#"{"SearchTabs":[]}"#);
    let host = env.host();
    host.add_layer(LayerBuilder::new("A"));
    host.insert_theme_from_current_state("道路【道路】昼");
    host.insert_theme_from_current_state("道路【道路】夜");
    host.insert_theme_from_current_state("基本");

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.set_gui_ready();
    assert!(controller.update_theme_selector(&host));

    assert_eq!(controller.selector().group_names(), vec!["道路"]);
    controller.set_theme_group(Some("道路"));
    assert_eq!(
        controller.selector().visible_themes(),
        vec!["道路【道路】昼", "道路【道路】夜"]
    );
    controller.set_theme_group(None);
    assert_eq!(controller.selector().visible_themes().len(), 3);
}

#[test]
fn test_pagination_over_many_results() {
    let env = TestEnv::new();
    let bundled = env.write_bundled(
        r#"{"SearchTabs":[{"Title":"many","SearchField":{}}],"PageLimit":3}"#,
    );
    let host = env.host();
    let mut builder = LayerBuilder::new("many").field(FieldDef::new("note", FieldType::Text));
    for seq in 1..=8 {
        builder = builder.feature(Feature::new(
            seq,
            vec![AttrValue::Text(format!("hit-{seq}"))],
            None,
        ));
    }
    let layer = host.add_layer(builder);
    host.set_active_layer(&layer);

    let mut controller = SearchController::new(ConfigStore::new(bundled));
    controller.build(&host).unwrap();
    controller.search(&host, &SearchInputs::with_values(&["hit"]));

    let results = controller.current_feature_mut().unwrap().results_mut();
    assert_eq!(results.page_count(), 3);
    assert_eq!(results.page_rows().len(), 3);
    results.set_page(3);
    assert_eq!(results.page_rows().len(), 2);
    assert_eq!(results.row_labels(), vec![7, 8]);
}
