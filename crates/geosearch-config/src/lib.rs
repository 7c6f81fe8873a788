//! Configuration system for geosearch.
//!
//! Search tabs are assembled from three sources, in order: the bundled
//! `setting.json` shipped with the package, the `GEO-search-plugin` project
//! variable (inline JSON or a path to a JSON file), and an external file
//! named by the `geo_search_json` environment or project variable. Each
//! loaded tab carries provenance so an edit or deletion is written back to
//! the source it came from. File writes are atomic with a timestamped
//! backup.

#![warn(missing_docs)]

mod error;
mod merge;
mod model;
mod persist;
mod source;

use std::path::{Path, PathBuf};

use geosearch_host::{Host, set_project_variable};
use tracing::{info, warn};

pub use error::ConfigError;
pub use merge::{DEFAULT_PAGE_LIMIT, SearchSpec};
pub use model::{
    FieldSpec, LayerRef, OR_SEARCH_PREFIX, OTHER_GROUP_NAME, SearchDocument, TabConfig,
};
pub use source::{
    EXTERNAL_PATH_KEY, LoadedTab, PROJECT_VARIABLE_KEY, Provenance, SourceKind,
};

/// Group assigned to tabs created from the active layer.
pub const PROJECT_SEARCH_GROUP: &str = "ﾌﾟﾛｼﾞｪｸﾄ検索";

/// A mutation applied to one tab inside a source.
enum Mutation<'a> {
    /// Replace the tab with a new configuration.
    Replace(&'a TabConfig),
    /// Remove the tab.
    Remove,
}

/// Loads, merges, edits and persists the search-tab configuration.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    /// Path of the bundled `setting.json`.
    bundled_path: PathBuf,
}

impl ConfigStore {
    /// Creates a store reading bundled defaults from `bundled_path`.
    pub fn new(bundled_path: impl Into<PathBuf>) -> Self {
        Self {
            bundled_path: bundled_path.into(),
        }
    }

    /// The bundled `setting.json` path.
    pub fn bundled_path(&self) -> &Path {
        &self.bundled_path
    }

    /// Loads and merges all three sources.
    pub fn load(&self, host: &dyn Host) -> Result<SearchSpec, ConfigError> {
        merge::load_merged(&self.bundled_path, host)
    }

    /// Appends a tab to the chosen source.
    pub fn append(
        &self,
        host: &dyn Host,
        target: SourceKind,
        tab: &TabConfig,
    ) -> Result<(), ConfigError> {
        match target {
            SourceKind::SettingJson => {
                let mut document = source::read_document_file(&self.bundled_path)?;
                document.search_tabs.push(tab.clone());
                self.write_document(&self.bundled_path, &document)
            }
            SourceKind::Project => {
                let (mut tabs, _) = source::read_project_variable(host)?;
                tabs.push(tab.clone());
                write_project_tabs(host, &tabs)
            }
            SourceKind::GeoSearchJson => {
                let path = self.external_path_for_write(host)?;
                let mut document = source::read_document_file(&path)?;
                document.search_tabs.push(tab.clone());
                self.write_document(&path, &document)
            }
        }
    }

    /// Replaces a loaded tab with an updated configuration, writing back to
    /// the source the tab was loaded from.
    pub fn update(
        &self,
        host: &dyn Host,
        original: &LoadedTab,
        updated: &TabConfig,
    ) -> Result<(), ConfigError> {
        self.modify(host, original, Mutation::Replace(updated))
    }

    /// Deletes a loaded tab from its source. Removing the last entry of the
    /// project variable clears the variable.
    pub fn delete(&self, host: &dyn Host, tab: &LoadedTab) -> Result<(), ConfigError> {
        self.modify(host, tab, Mutation::Remove)
    }

    /// Builds the standard tab for the host's active layer and appends it
    /// to `target`. With no target (the user cancelled the chooser) the
    /// operation aborts with a diagnostic bundle.
    pub fn add_active_layer(
        &self,
        host: &dyn Host,
        target: Option<SourceKind>,
    ) -> Result<TabConfig, ConfigError> {
        let active = host.active_layer().ok_or(ConfigError::NoActiveLayer)?;
        let Some(target) = target else {
            let details = self.save_diagnostics(host);
            warn!("save aborted; diagnostics:\n{details}");
            return Err(ConfigError::RouteUnresolved { details });
        };

        let tab = TabConfig {
            title: active.name.clone(),
            group: PROJECT_SEARCH_GROUP.to_string(),
            layer: Some(LayerRef::Name {
                name: active.name.clone(),
            }),
            search_field: Some(FieldSpec::default()),
            ..TabConfig::default()
        };
        self.append(host, target, &tab)?;
        info!(layer = %active.name, target = target.token(), "active layer added");
        Ok(tab)
    }

    /// Applies a mutation to the tab's source, located by provenance with a
    /// Title+group fallback.
    fn modify(
        &self,
        host: &dyn Host,
        tab: &LoadedTab,
        mutation: Mutation<'_>,
    ) -> Result<(), ConfigError> {
        let not_found = || ConfigError::TabNotFound {
            title: tab.config.title.clone(),
            group: tab.config.group_name().to_string(),
            origin: tab.provenance.source.token().to_string(),
        };
        match tab.provenance.source {
            SourceKind::SettingJson => {
                let mut document = source::read_document_file(&self.bundled_path)?;
                let index =
                    locate(&document.search_tabs, tab).ok_or_else(not_found)?;
                apply_mutation(&mut document.search_tabs, index, mutation);
                self.write_document(&self.bundled_path, &document)
            }
            SourceKind::Project => {
                let (mut tabs, _) = source::read_project_variable(host)?;
                let index = locate(&tabs, tab).ok_or_else(not_found)?;
                apply_mutation(&mut tabs, index, mutation);
                write_project_tabs(host, &tabs)
            }
            SourceKind::GeoSearchJson => {
                let path = source::resolve_external_path(host)
                    .ok_or(ConfigError::ExternalPathUnresolved)?;
                let mut document = source::read_document_file(&path)?;
                let index =
                    locate(&document.search_tabs, tab).ok_or_else(not_found)?;
                apply_mutation(&mut document.search_tabs, index, mutation);
                self.write_document(&path, &document)
            }
        }
    }

    /// Serializes and atomically writes a document.
    fn write_document(&self, path: &Path, document: &SearchDocument) -> Result<(), ConfigError> {
        let value = serde_json::to_value(document).map_err(|source| ConfigError::Parse {
            context: path.display().to_string(),
            source,
        })?;
        persist::write_json_atomic(path, &value)
    }

    /// The external file path for a write: the configured one, else the
    /// default `<project_basename>_search.json`, which is then persisted
    /// into the project variable for the next time.
    fn external_path_for_write(&self, host: &dyn Host) -> Result<PathBuf, ConfigError> {
        if let Some(path) = source::resolve_external_path(host) {
            return Ok(path);
        }
        let project_file = host
            .project_file()
            .ok_or(ConfigError::ExternalPathUnresolved)?;
        let path = source::default_external_path(&project_file)
            .ok_or(ConfigError::ExternalPathUnresolved)?;
        if !set_project_variable(host, EXTERNAL_PATH_KEY, &path.display().to_string()) {
            warn!(path = %path.display(), "could not persist geo_search_json path");
        }
        Ok(path)
    }

    /// The resolution-step report attached to a cancelled save.
    fn save_diagnostics(&self, host: &dyn Host) -> String {
        let mut details = vec!["save target: none (cancelled or chooser failed)".to_string()];
        details.push(format!(
            "env {EXTERNAL_PATH_KEY}={:?}",
            std::env::var(EXTERNAL_PATH_KEY).ok()
        ));
        details.push(format!(
            "project {EXTERNAL_PATH_KEY}={:?}",
            host.read_variable(EXTERNAL_PATH_KEY)
        ));
        details.push(format!("project file={:?}", host.project_file()));
        details.push(format!(
            "bundled setting.json path={} exists={}",
            self.bundled_path.display(),
            self.bundled_path.exists()
        ));
        match host.active_layer() {
            Some(layer) => details.push(format!(
                "active layer name={} fields={}",
                layer.name,
                host.fields(&layer.id).len()
            )),
            None => details.push("active layer: none".to_string()),
        }
        details.join("\n")
    }
}

/// The save target to preselect in the chooser: the external file when a
/// `geo_search_json` path is configured anywhere, otherwise the project
/// variable.
pub fn suggested_save_target(host: &dyn Host) -> SourceKind {
    let configured = host
        .read_variable(EXTERNAL_PATH_KEY)
        .filter(|value| !value.trim().is_empty())
        .is_some()
        || std::env::var(EXTERNAL_PATH_KEY)
            .is_ok_and(|value| !value.trim().is_empty());
    if configured {
        SourceKind::GeoSearchJson
    } else {
        SourceKind::Project
    }
}

/// Finds the tab inside its source list: the provenance index when it still
/// points at the same Title+group, else a Title+group scan, else the raw
/// index when it is at least in range.
fn locate(tabs: &[TabConfig], tab: &LoadedTab) -> Option<usize> {
    let index = tab.provenance.source_index;
    let same_identity = |candidate: &TabConfig| {
        candidate.title == tab.config.title && candidate.group_name() == tab.config.group_name()
    };
    if tabs.get(index).is_some_and(same_identity) {
        return Some(index);
    }
    if let Some(found) = tabs.iter().position(same_identity) {
        return Some(found);
    }
    (index < tabs.len()).then_some(index)
}

/// Applies a mutation at an index.
fn apply_mutation(tabs: &mut Vec<TabConfig>, index: usize, mutation: Mutation<'_>) {
    match mutation {
        Mutation::Replace(updated) => tabs[index] = updated.clone(),
        Mutation::Remove => {
            tabs.remove(index);
        }
    }
}

/// Writes the project-variable tab list; an empty list clears the variable.
fn write_project_tabs(host: &dyn Host, tabs: &[TabConfig]) -> Result<(), ConfigError> {
    let value = if tabs.is_empty() {
        String::new()
    } else {
        serde_json::to_string(tabs).map_err(|source| ConfigError::Parse {
            context: PROJECT_VARIABLE_KEY.to_string(),
            source,
        })?
    };
    if set_project_variable(host, PROJECT_VARIABLE_KEY, &value) {
        Ok(())
    } else {
        Err(ConfigError::VariableWrite {
            key: PROJECT_VARIABLE_KEY.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use geosearch_host::{LayerBuilder, MemoryHost, VarSetter, VariableApi};
    use serde_json::Value;

    use super::*;

    /// A store over a temp bundled file plus a host with a saved project.
    fn fixture() -> (tempfile::TempDir, ConfigStore, MemoryHost) {
        let dir = tempfile::tempdir().unwrap();
        let bundled = dir.path().join("setting.json");
        fs::write(
            &bundled,
            r#"{"SearchTabs":[{"Title":"地番検索"}],"PageLimit":1000}"#,
        )
        .unwrap();
        let host = MemoryHost::new();
        host.set_project_file(dir.path().join("town.qgz"));
        (dir, ConfigStore::new(bundled), host)
    }

    #[test]
    fn test_add_active_layer_project_route() {
        let (_dir, store, host) = fixture();
        let layer = host.add_layer(LayerBuilder::new("parcels"));
        host.set_active_layer(&layer);

        let tab = store
            .add_active_layer(&host, Some(SourceKind::Project))
            .unwrap();
        assert_eq!(tab.title, "parcels");

        // The variable value parses to exactly the expected one-entry list.
        let raw = host.read_variable(PROJECT_VARIABLE_KEY).unwrap();
        let value: Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(
            value,
            serde_json::json!([{
                "group": "ﾌﾟﾛｼﾞｪｸﾄ検索",
                "Title": "parcels",
                "Layer": {"LayerType": "Name", "Name": "parcels"},
                "SearchField": {},
            }])
        );
    }

    #[test]
    fn test_add_active_layer_without_target_reports_diagnostics() {
        let (_dir, store, host) = fixture();
        let layer = host.add_layer(LayerBuilder::new("parcels"));
        host.set_active_layer(&layer);

        let error = store.add_active_layer(&host, None).unwrap_err();
        let ConfigError::RouteUnresolved { details } = error else {
            panic!("expected RouteUnresolved, got {error:?}");
        };
        assert!(details.contains("project file="));
        assert!(details.contains("active layer name=parcels"));
    }

    #[test]
    fn test_add_active_layer_requires_active_layer() {
        let (_dir, store, host) = fixture();
        assert!(matches!(
            store.add_active_layer(&host, Some(SourceKind::Project)),
            Err(ConfigError::NoActiveLayer)
        ));
    }

    #[test]
    fn test_update_routes_to_external_file() {
        let (dir, store, host) = fixture();
        let external = dir.path().join("town_search.json");
        fs::write(
            &external,
            r#"{"SearchTabs":[{"Title":"roads"},{"Title":"rivers"}]}"#,
        )
        .unwrap();
        host.set_variable_scope(EXTERNAL_PATH_KEY, "town_search.json");

        let spec = store.load(&host).unwrap();
        let rivers = spec
            .tabs
            .iter()
            .find(|tab| tab.config.title == "rivers")
            .unwrap();
        let mut updated = rivers.config.clone();
        updated.scale = Some(2500.0);
        store.update(&host, rivers, &updated).unwrap();

        let text = fs::read_to_string(&external).unwrap();
        let value: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(value["SearchTabs"][1]["scale"], 2500.0);
        // Provenance fields never reach disk.
        assert!(text.find("_source").is_none());
        assert!(text.find("_load_sequence").is_none());
    }

    #[test]
    fn test_delete_last_project_tab_clears_variable() {
        let (_dir, store, host) = fixture();
        host.set_variable_scope(PROJECT_VARIABLE_KEY, r#"[{"Title":"parcels"}]"#);

        let spec = store.load(&host).unwrap();
        let parcels = spec
            .tabs
            .iter()
            .find(|tab| tab.provenance.source == SourceKind::Project)
            .unwrap();
        store.delete(&host, parcels).unwrap();
        assert_eq!(
            host.read_variable(PROJECT_VARIABLE_KEY).as_deref(),
            Some("")
        );
    }

    #[test]
    fn test_delete_from_bundled_leaves_backup() {
        let (dir, store, host) = fixture();
        let spec = store.load(&host).unwrap();
        store.delete(&host, &spec.tabs[0]).unwrap();

        let document = fs::read_to_string(store.bundled_path()).unwrap();
        let value: Value = serde_json::from_str(&document).unwrap();
        assert!(value["SearchTabs"].as_array().unwrap().is_empty());
        // The page limit survives the rewrite.
        assert_eq!(value["PageLimit"], 1000);

        let backups = fs::read_dir(dir.path())
            .unwrap()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_name().to_string_lossy().ends_with(".bak"))
            .count();
        assert_eq!(backups, 1);
    }

    #[test]
    fn test_project_write_failure_surfaces() {
        let (_dir, store, host) = fixture();
        let layer = host.add_layer(LayerBuilder::new("parcels"));
        host.set_active_layer(&layer);
        host.disable_setters(&[
            VarSetter::Class,
            VarSetter::Scope,
            VarSetter::Entry,
            VarSetter::CustomProperty,
        ]);
        assert!(matches!(
            store.add_active_layer(&host, Some(SourceKind::Project)),
            Err(ConfigError::VariableWrite { .. })
        ));
    }

    #[test]
    fn test_append_external_derives_default_path() {
        let (dir, store, host) = fixture();
        let tab = TabConfig {
            title: "roads".into(),
            ..TabConfig::default()
        };
        store
            .append(&host, SourceKind::GeoSearchJson, &tab)
            .unwrap();

        let expected = dir.path().join("town_search.json");
        assert!(expected.is_file());
        // The derived path is remembered in the project variable.
        assert_eq!(
            host.read_variable(EXTERNAL_PATH_KEY).as_deref(),
            Some(expected.display().to_string().as_str())
        );
    }

    #[test]
    fn test_suggested_save_target_prefers_configured_external() {
        let (_dir, _store, host) = fixture();
        assert_eq!(suggested_save_target(&host), SourceKind::Project);
        host.set_variable_scope(EXTERNAL_PATH_KEY, "town_search.json");
        assert_eq!(suggested_save_target(&host), SourceKind::GeoSearchJson);
    }

    #[test]
    fn test_load_noop_save_load_is_identical() {
        let (dir, store, host) = fixture();
        let external = dir.path().join("town_search.json");
        fs::write(
            &external,
            r#"{"SearchTabs":[{"Title":"roads","ViewFields":["name"],"Custom":1}]}"#,
        )
        .unwrap();
        host.set_variable_scope(EXTERNAL_PATH_KEY, "town_search.json");
        host.set_variable_scope(PROJECT_VARIABLE_KEY, r#"[{"Title":"parcels"}]"#);

        let before = store.load(&host).unwrap();
        // A no-op save: rewrite a tab with its own configuration.
        let roads = before
            .tabs
            .iter()
            .find(|tab| tab.config.title == "roads")
            .unwrap();
        store.update(&host, roads, &roads.config.clone()).unwrap();

        let after = store.load(&host).unwrap();
        assert_eq!(before, after);
    }
}
