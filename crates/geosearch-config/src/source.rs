//! The three configuration sources and their provenance tokens.
//!
//! Tabs are loaded from, and written back to, three places: the bundled
//! `setting.json`, the `GEO-search-plugin` project variable, and the
//! external file named by `geo_search_json`. Each loaded tab remembers
//! where it came from so edits and deletions route to the right origin.

use std::{
    fs,
    path::{Path, PathBuf},
};

use geosearch_host::Host;
use serde_json::Value;
use tracing::debug;

use crate::{
    error::ConfigError,
    model::{SearchDocument, TabConfig},
};

/// Project-variable key holding inline configuration (or a path to it).
pub const PROJECT_VARIABLE_KEY: &str = "GEO-search-plugin";

/// Environment/project-variable key naming the external configuration file.
pub const EXTERNAL_PATH_KEY: &str = "geo_search_json";

/// One of the three configuration sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The bundled `setting.json`.
    SettingJson,
    /// The `GEO-search-plugin` project variable.
    Project,
    /// The external file named by `geo_search_json`.
    GeoSearchJson,
}

impl SourceKind {
    /// The canonical provenance token.
    pub fn token(self) -> &'static str {
        match self {
            Self::SettingJson => "setting.json",
            Self::Project => "project",
            Self::GeoSearchJson => "geo_search_json",
        }
    }

    /// Normalizes historically-varied source tokens (`"Geo Search JSON"`,
    /// `"project_variable"`, …) to a canonical kind.
    pub fn normalize(raw: &str) -> Option<Self> {
        let lowered = raw.trim().to_lowercase().replace('_', " ");
        if lowered.contains("geo") && lowered.contains("search") {
            return Some(Self::GeoSearchJson);
        }
        if lowered.contains("setting") && lowered.contains("json") {
            return Some(Self::SettingJson);
        }
        if lowered.contains("project") {
            return Some(Self::Project);
        }
        None
    }
}

/// Origin of a loaded tab.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Provenance {
    /// Which source the tab came from.
    pub source: SourceKind,
    /// Index within that source's own tab list.
    pub source_index: usize,
    /// Global position in load order, monotone within one load.
    pub load_sequence: usize,
}

/// A tab together with its origin. The provenance never reaches disk: it
/// is attached at load time and consulted when routing writes.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadedTab {
    /// The tab configuration.
    pub config: TabConfig,
    /// Where it was loaded from.
    pub provenance: Provenance,
}

/// Tabs plus the optional page limit a source declared.
pub(crate) type SourceTabs = (Vec<TabConfig>, Option<u32>);

/// Parses configuration text that may be a full document, a bare array, a
/// single tab object, or concatenated tab objects (legacy bundled form).
pub(crate) fn parse_flexible(text: &str, context: &str) -> Result<SourceTabs, ConfigError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Ok((Vec::new(), None));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(value) => tabs_from_value(value, context),
        Err(first_error) => {
            // Legacy bundled files hold comma-separated top-level objects;
            // wrapping in brackets turns them into a parseable array.
            let wrapped = format!("[{trimmed}]");
            match serde_json::from_str::<Vec<TabConfig>>(&wrapped) {
                Ok(tabs) => Ok((tabs, None)),
                Err(_) => Err(ConfigError::Parse {
                    context: context.to_string(),
                    source: first_error,
                }),
            }
        }
    }
}

/// Extracts tabs from an already-parsed JSON value.
pub(crate) fn tabs_from_value(value: Value, context: &str) -> Result<SourceTabs, ConfigError> {
    fn parse<T: serde::de::DeserializeOwned>(
        value: Value,
        context: &str,
    ) -> Result<T, ConfigError> {
        serde_json::from_value(value).map_err(|source| ConfigError::Parse {
            context: context.to_string(),
            source,
        })
    }
    match value {
        Value::Array(_) => Ok((parse(value, context)?, None)),
        Value::Object(ref map) if map.contains_key("SearchTabs") => {
            let document: SearchDocument = parse(value, context)?;
            Ok((document.search_tabs, document.page_limit))
        }
        Value::Object(_) => {
            let tab: TabConfig = parse(value, context)?;
            Ok((vec![tab], None))
        }
        other => Err(ConfigError::Parse {
            context: context.to_string(),
            source: serde::de::Error::custom(format!(
                "expected an array or object, found {other}"
            )),
        }),
    }
}

/// Reads a configuration file as a full document for a write-back cycle,
/// tolerating the same legacy forms as [`parse_flexible`] and keeping
/// top-level extra keys when the file already is a document.
pub(crate) fn read_document_file(path: &Path) -> Result<SearchDocument, ConfigError> {
    if !path.is_file() {
        return Ok(SearchDocument::default());
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    let context = path.display().to_string();
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(text.trim())
        && map.contains_key("SearchTabs")
    {
        return serde_json::from_value(Value::Object(map)).map_err(|source| ConfigError::Parse {
            context,
            source,
        });
    }
    let (search_tabs, page_limit) = parse_flexible(&text, &context)?;
    Ok(SearchDocument {
        search_tabs,
        page_limit,
        extra: serde_json::Map::new(),
    })
}

/// Reads the bundled `setting.json`. A missing file yields no tabs.
pub(crate) fn read_bundled(path: &Path) -> Result<SourceTabs, ConfigError> {
    if !path.is_file() {
        return Ok((Vec::new(), None));
    }
    let text = fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source,
    })?;
    parse_flexible(&text, &path.display().to_string())
}

/// Resolves and reads the `GEO-search-plugin` project variable.
///
/// The value may be inline JSON (array, object, or a JSON-encoded string of
/// either) or a filesystem path to a JSON file. A path that exists but does
/// not parse is surfaced as a parse error rather than ignored, so a later
/// write cannot silently clobber the file.
pub(crate) fn read_project_variable(host: &dyn Host) -> Result<SourceTabs, ConfigError> {
    let Some(raw) = host.read_variable(PROJECT_VARIABLE_KEY) else {
        return Ok((Vec::new(), None));
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok((Vec::new(), None));
    }
    match serde_json::from_str::<Value>(trimmed) {
        Ok(Value::String(inner)) => {
            // A JSON string wrapping the real payload.
            parse_flexible(&inner, PROJECT_VARIABLE_KEY)
        }
        Ok(value) => tabs_from_value(value, PROJECT_VARIABLE_KEY),
        Err(_) => {
            let path = resolve_against_project(Path::new(trimmed), host);
            if path.is_file() {
                let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
                    path: path.clone(),
                    source,
                })?;
                parse_flexible(&text, &path.display().to_string())
            } else {
                Err(ConfigError::VariableNotJson {
                    key: PROJECT_VARIABLE_KEY.to_string(),
                })
            }
        }
    }
}

/// Makes a possibly-relative path absolute against the project directory.
pub(crate) fn resolve_against_project(path: &Path, host: &dyn Host) -> PathBuf {
    if path.is_absolute() {
        return path.to_path_buf();
    }
    match host.project_file().and_then(|file| {
        file.parent().map(Path::to_path_buf)
    }) {
        Some(directory) => directory.join(path),
        None => path.to_path_buf(),
    }
}

/// Resolves the external configuration file path from the environment and
/// project variables. The project variable wins when both are set.
pub(crate) fn resolve_external_path(host: &dyn Host) -> Option<PathBuf> {
    let project_value = host
        .read_variable(EXTERNAL_PATH_KEY)
        .filter(|value| !value.trim().is_empty());
    let env_value = std::env::var(EXTERNAL_PATH_KEY)
        .ok()
        .filter(|value| !value.trim().is_empty());
    let raw = project_value.or(env_value)?;
    Some(resolve_against_project(Path::new(raw.trim()), host))
}

/// The default external path beside a saved project:
/// `<project_basename>_search.json`.
pub(crate) fn default_external_path(project_file: &Path) -> Option<PathBuf> {
    let directory = project_file.parent()?;
    let base = project_file.file_stem()?.to_string_lossy();
    Some(directory.join(format!("{base}_search.json")))
}

/// Reads the external file when one is configured and exists.
pub(crate) fn read_external(host: &dyn Host) -> Result<(Option<PathBuf>, SourceTabs), ConfigError> {
    let Some(path) = resolve_external_path(host) else {
        return Ok((None, (Vec::new(), None)));
    };
    if !path.is_file() {
        debug!(path = %path.display(), "external config file not present");
        return Ok((Some(path), (Vec::new(), None)));
    }
    let text = fs::read_to_string(&path).map_err(|source| ConfigError::ReadFile {
        path: path.clone(),
        source,
    })?;
    let tabs = parse_flexible(&text, &path.display().to_string())?;
    Ok((Some(path), tabs))
}
