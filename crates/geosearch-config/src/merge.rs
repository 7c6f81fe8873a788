//! Merging the three configuration sources into one ordered spec.

use std::path::Path;

use geosearch_host::Host;
use tracing::info;

use crate::{
    error::ConfigError,
    source::{self, LoadedTab, Provenance, SourceKind},
};

/// Default result page size when no source declares one.
pub const DEFAULT_PAGE_LIMIT: u32 = 10_000;

/// The merged configuration: every tab from every source, in load order,
/// each carrying its provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSpec {
    /// Tabs in order: bundled defaults, then project entries, then
    /// external-file entries.
    pub tabs: Vec<LoadedTab>,
    /// Result page size.
    pub page_limit: u32,
}

impl SearchSpec {
    /// Groups tab indices by group name, preserving first-seen group order.
    pub fn group_order(&self) -> Vec<(String, Vec<usize>)> {
        let mut groups: Vec<(String, Vec<usize>)> = Vec::new();
        for (index, tab) in self.tabs.iter().enumerate() {
            let name = tab.config.group_name();
            match groups.iter_mut().find(|(group, _)| group == name) {
                Some((_, indices)) => indices.push(index),
                None => groups.push((name.to_string(), vec![index])),
            }
        }
        groups
    }
}

/// Loads and concatenates the three sources, annotating provenance.
pub(crate) fn load_merged(bundled_path: &Path, host: &dyn Host) -> Result<SearchSpec, ConfigError> {
    let (bundled_tabs, bundled_limit) = source::read_bundled(bundled_path)?;
    let (project_tabs, project_limit) = source::read_project_variable(host)?;
    let (_, (external_tabs, external_limit)) = source::read_external(host)?;

    let mut tabs = Vec::new();
    let mut load_sequence = 0;
    let mut extend = |source: SourceKind, configs: Vec<crate::model::TabConfig>| {
        for (source_index, config) in configs.into_iter().enumerate() {
            tabs.push(LoadedTab {
                config,
                provenance: Provenance {
                    source,
                    source_index,
                    load_sequence,
                },
            });
            load_sequence += 1;
        }
    };
    extend(SourceKind::SettingJson, bundled_tabs);
    extend(SourceKind::Project, project_tabs);
    extend(SourceKind::GeoSearchJson, external_tabs);

    let page_limit = external_limit
        .or(project_limit)
        .or(bundled_limit)
        .unwrap_or(DEFAULT_PAGE_LIMIT);

    info!(tabs = tabs.len(), page_limit, "configuration loaded");
    Ok(SearchSpec { tabs, page_limit })
}
