//! Layer-set selection for a search tab.

use geosearch_config::{LayerRef, TabConfig};
use geosearch_host::{Host, LayerHandle};
use tracing::{debug, warn};

/// Tab title that searches the layers currently visible in the tree.
pub const VISIBLE_LAYERS_TITLE: &str = "表示レイヤ";

/// Tab title that searches every vector layer of the project.
pub const ALL_LAYERS_TITLE: &str = "全レイヤ";

/// The set of layers one search runs over.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSource {
    /// Layers currently visible in the layer tree.
    Visible,
    /// Every vector layer of the project.
    All,
    /// All layers sharing one display name.
    SameName(String),
    /// A single resolved layer.
    Single(LayerHandle),
}

impl LayerSource {
    /// The concrete layers to search, in stable order.
    pub fn layers(&self, host: &dyn Host) -> Vec<LayerHandle> {
        match self {
            Self::Visible => host
                .layer_nodes()
                .into_iter()
                .filter(|node| node.visible)
                .filter_map(|node| host.layer_by_id(&node.layer))
                .collect(),
            Self::All => host.vector_layers(),
            Self::SameName(name) => host.layers_by_name(name),
            Self::Single(handle) => vec![handle.clone()],
        }
    }
}

/// Resolves a tab's layer reference to a concrete layer.
///
/// No reference means the host's currently active layer, resolved fresh on
/// every call, so the tab follows the user's layer selection. File and
/// database references are opened through the host; a database reference
/// with a format script runs it first when `run_format_sql` is set.
pub fn resolve_layer(
    host: &dyn Host,
    layer_ref: Option<&LayerRef>,
    run_format_sql: bool,
) -> Option<LayerHandle> {
    match layer_ref {
        None => host.active_layer(),
        Some(LayerRef::Name { name }) => host.layers_by_name(name).into_iter().next(),
        Some(LayerRef::File { path, encoding: _ }) => {
            let resolved = resolve_project_relative(host, path);
            let name = std::path::Path::new(&resolved)
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_else(|| resolved.clone());
            host.open_layer(&resolved, &name, "ogr")
        }
        Some(LayerRef::Database {
            host: db_host,
            port,
            database,
            user,
            password,
            schema,
            table,
            geometry,
            key,
            data_type,
            format_sql,
        }) => {
            let conn_uri = format!(
                "host={} port={} dbname={} user={} password={}",
                db_host.as_deref().unwrap_or(""),
                port.as_deref().unwrap_or(""),
                database.as_deref().unwrap_or(""),
                user.as_deref().unwrap_or(""),
                password.as_deref().unwrap_or(""),
            );
            if run_format_sql
                && data_type.as_deref() == Some("postgres")
                && let Some(sql) = format_sql
                && !host.run_format_sql(&conn_uri, sql)
            {
                warn!(table = table.as_deref().unwrap_or(""), "format script failed");
                return None;
            }
            let uri = format!(
                "{conn_uri} schema={} table={} geometry={} key={}",
                schema.as_deref().unwrap_or(""),
                table.as_deref().unwrap_or(""),
                geometry.as_deref().unwrap_or(""),
                key.as_deref().unwrap_or(""),
            );
            let name = table.as_deref().unwrap_or("layer");
            host.open_layer(&uri, name, data_type.as_deref().unwrap_or("postgres"))
        }
    }
}

/// Makes a possibly-relative path absolute against the project directory.
fn resolve_project_relative(host: &dyn Host, path: &str) -> String {
    let as_path = std::path::Path::new(path);
    if as_path.is_absolute() {
        return path.to_string();
    }
    match host
        .project_file()
        .and_then(|file| file.parent().map(std::path::Path::to_path_buf))
    {
        Some(directory) => directory.join(as_path).display().to_string(),
        None => path.to_string(),
    }
}

/// Picks the layer set for a tab: the two special titles fan out over
/// visible or all layers, a name reference matching several layers becomes
/// a same-name group, anything else searches the single resolved layer.
pub fn layer_source_for_tab(
    host: &dyn Host,
    tab: &TabConfig,
    resolved: Option<&LayerHandle>,
) -> Option<LayerSource> {
    if tab.title == VISIBLE_LAYERS_TITLE {
        return Some(LayerSource::Visible);
    }
    if tab.title == ALL_LAYERS_TITLE {
        return Some(LayerSource::All);
    }
    if let Some(LayerRef::Name { name }) = &tab.layer {
        let same_name = host.layers_by_name(name);
        if same_name.len() > 1 {
            debug!(%name, count = same_name.len(), "same-name layer group");
            return Some(LayerSource::SameName(name.clone()));
        }
    }
    resolved.cloned().map(LayerSource::Single)
}

#[cfg(test)]
mod tests {
    use geosearch_host::{LayerBuilder, MemoryHost};

    use super::*;

    #[test]
    fn test_visible_source_skips_hidden() {
        let host = MemoryHost::new();
        let shown = host.add_layer(LayerBuilder::new("a"));
        let _hidden = host.add_layer(LayerBuilder::new("b").visible(false));
        let layers = LayerSource::Visible.layers(&host);
        assert_eq!(layers.len(), 1);
        assert_eq!(layers[0].id, shown);
    }

    #[test]
    fn test_same_name_group_detection() {
        let host = MemoryHost::new();
        host.add_layer(LayerBuilder::new("parcels"));
        host.add_layer(LayerBuilder::new("parcels"));
        let tab: TabConfig = serde_json::from_str(
            r#"{"Title":"parcels","Layer":{"LayerType":"Name","Name":"parcels"}}"#,
        )
        .unwrap();
        let source = layer_source_for_tab(&host, &tab, None).unwrap();
        assert_eq!(source, LayerSource::SameName("parcels".into()));
        assert_eq!(source.layers(&host).len(), 2);
    }

    #[test]
    fn test_single_layer_for_unique_name() {
        let host = MemoryHost::new();
        let id = host.add_layer(LayerBuilder::new("parcels"));
        let tab: TabConfig = serde_json::from_str(
            r#"{"Title":"parcels","Layer":{"LayerType":"Name","Name":"parcels"}}"#,
        )
        .unwrap();
        let resolved = resolve_layer(&host, tab.layer.as_ref(), false).unwrap();
        assert_eq!(resolved.id, id);
        let source = layer_source_for_tab(&host, &tab, Some(&resolved)).unwrap();
        assert!(matches!(source, LayerSource::Single(_)));
    }

    #[test]
    fn test_special_titles() {
        let host = MemoryHost::new();
        let all_tab: TabConfig = serde_json::from_str(r#"{"Title":"全レイヤ"}"#).unwrap();
        assert_eq!(
            layer_source_for_tab(&host, &all_tab, None),
            Some(LayerSource::All)
        );
        let visible_tab: TabConfig = serde_json::from_str(r#"{"Title":"表示レイヤ"}"#).unwrap();
        assert_eq!(
            layer_source_for_tab(&host, &visible_tab, None),
            Some(LayerSource::Visible)
        );
    }

    #[test]
    fn test_resolve_absent_ref_follows_active_layer() {
        let host = MemoryHost::new();
        let first = host.add_layer(LayerBuilder::new("a"));
        let second = host.add_layer(LayerBuilder::new("b"));
        host.set_active_layer(&first);
        assert_eq!(resolve_layer(&host, None, false).unwrap().id, first);
        host.set_active_layer(&second);
        assert_eq!(resolve_layer(&host, None, false).unwrap().id, second);
    }

    #[test]
    fn test_resolve_file_ref_relative_to_project() {
        let host = MemoryHost::new();
        host.set_project_file("/maps/town.qgz");
        host.register_loadable("/maps/data/extra.shp", LayerBuilder::new("extra"));
        let layer_ref: LayerRef = serde_json::from_str(
            r#"{"LayerType":"File","Path":"data/extra.shp"}"#,
        )
        .unwrap();
        let handle = resolve_layer(&host, Some(&layer_ref), false).unwrap();
        assert_eq!(handle.name, "extra");
    }
}
