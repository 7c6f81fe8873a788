//! Typed snapshots of visible-layer and legend state.
//!
//! A snapshot records which layers are visible together with each layer's
//! style name and legend check state, plus the visible group paths. Layer
//! entries are weak: a layer that has left the project by restore time is
//! skipped, never recreated.

use std::{collections::HashMap, fs, path::Path};

use geosearch_host::{Host, LayerId, LegendState};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Errors from the optional user-theme file round-trip.
#[derive(Debug, Error)]
pub enum ThemeFileError {
    /// File could not be read or written.
    #[error("failed to access theme file {path}: {source}")]
    Io {
        /// The file path.
        path: std::path::PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// File content is not a valid snapshot document.
    #[error("failed to parse theme file {path}: {source}")]
    Parse {
        /// The file path.
        path: std::path::PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },
}

/// Captured state of one visible layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerSnapshot {
    /// Position in the layer tree at capture time.
    pub order: usize,
    /// The layer id.
    pub layer_id: LayerId,
    /// The layer display name, for diagnostics when the id is gone.
    pub layer_name: String,
    /// Style name at capture time.
    pub style: Option<String>,
    /// Legend check state at capture time; `None` when the host reported
    /// nothing.
    pub legend: Option<LegendState>,
}

/// Visible-state snapshot: layers plus visible group paths.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThemeSnapshot {
    /// The visible layers in tree order.
    pub layers: Vec<LayerSnapshot>,
    /// Group paths that were checked visible (kept even when they contain
    /// no visible layer).
    pub groups: Vec<Vec<String>>,
}

/// Captures the currently visible layers, styles and legends.
pub fn capture_snapshot(host: &dyn Host) -> ThemeSnapshot {
    let mut layers = Vec::new();
    for (order, node) in host.layer_nodes().into_iter().enumerate() {
        if !node.visible {
            continue;
        }
        let name = host
            .layer_by_id(&node.layer)
            .map(|handle| handle.name)
            .unwrap_or_default();
        let legend = host.legend_state(&node.layer);
        layers.push(LayerSnapshot {
            order,
            layer_name: name,
            style: host.style_name(&node.layer),
            legend: (!legend.is_empty()).then_some(legend),
            layer_id: node.layer,
        });
    }
    ThemeSnapshot {
        layers,
        groups: host.visible_group_paths(),
    }
}

/// Applies a snapshot additively: every recorded layer is made visible
/// (ancestor groups included) and gets its saved style and legend state
/// back. A node that is already visible only has legend items switched on,
/// never off; a hidden node may have items overwritten either way.
/// Recorded group paths are restored as visible. Missing layers are
/// skipped with a warning.
pub fn apply_snapshot(host: &dyn Host, snapshot: &ThemeSnapshot) {
    let nodes = host.layer_nodes();
    for entry in &snapshot.layers {
        let Some(node) = nodes.iter().find(|node| node.layer == entry.layer_id) else {
            warn!(layer = %entry.layer_name, "snapshot layer no longer present");
            continue;
        };
        let was_visible = node.visible;
        host.set_layer_visible(&entry.layer_id, true);
        for depth in 1..=node.groups.len() {
            host.set_group_visible(&node.groups[..depth], true);
        }
        if let Some(style) = &entry.style
            && !host.set_style(&entry.layer_id, style)
        {
            warn!(layer = %entry.layer_name, %style, "could not restore style");
        }
        if let Some(legend) = &entry.legend {
            host.apply_legend(&entry.layer_id, legend, was_visible);
        }
    }
    for path in &snapshot.groups {
        host.set_group_visible(path, true);
    }
}

/// In-memory snapshot store keyed by generated tokens.
#[derive(Debug, Default)]
pub struct SnapshotStore {
    /// Token sequence.
    next: u64,
    /// Stored snapshots.
    snapshots: HashMap<String, ThemeSnapshot>,
}

impl SnapshotStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Captures the current state and stores it under a fresh token.
    pub fn capture(&mut self, host: &dyn Host) -> String {
        self.next += 1;
        let token = format!("snapshot-{}", self.next);
        let snapshot = capture_snapshot(host);
        debug!(%token, layers = snapshot.layers.len(), "state snapshot taken");
        self.snapshots.insert(token.clone(), snapshot);
        token
    }

    /// Looks up a stored snapshot.
    pub fn get(&self, token: &str) -> Option<&ThemeSnapshot> {
        self.snapshots.get(token)
    }

    /// Applies and removes a stored snapshot. Returns false (with a
    /// warning) when the token is unknown.
    pub fn restore(&mut self, host: &dyn Host, token: &str) -> bool {
        let Some(snapshot) = self.snapshots.remove(token) else {
            warn!(token, "no snapshot to restore");
            return false;
        };
        apply_snapshot(host, &snapshot);
        true
    }

    /// Drops a stored snapshot without applying it.
    pub fn discard(&mut self, token: &str) -> bool {
        self.snapshots.remove(token).is_some()
    }
}

/// Writes a snapshot to a user-theme JSON file.
pub fn save_theme_file(path: &Path, snapshot: &ThemeSnapshot) -> Result<(), ThemeFileError> {
    let text = serde_json::to_string_pretty(snapshot).map_err(|source| ThemeFileError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| ThemeFileError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads a snapshot back from a user-theme JSON file.
pub fn load_theme_file(path: &Path) -> Result<ThemeSnapshot, ThemeFileError> {
    let text = fs::read_to_string(path).map_err(|source| ThemeFileError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ThemeFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}
