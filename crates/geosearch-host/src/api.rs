//! Capability traits of the host GIS application.
//!
//! The host is modelled as small operation groups rather than one wide
//! interface: each core component names only the capabilities it touches,
//! and a test can stub a single group. [`Host`] is the sum trait a full
//! adapter implements; [`crate::MemoryHost`] is the bundled in-memory one.

use std::path::PathBuf;

use crate::{
    expr::ExprError,
    geometry::{Crs, Point, Rect},
    types::{AttrValue, Feature, FeatureId, FieldDef, LayerHandle, LayerId, LayerNode, LegendState},
};

/// Project-level layer lookup and loading.
pub trait ProjectApi {
    /// Absolute path of the project file, `None` for an unsaved project.
    fn project_file(&self) -> Option<PathBuf>;

    /// All layers with the given display name, in project order.
    fn layers_by_name(&self, name: &str) -> Vec<LayerHandle>;

    /// The layer with the given id, when it is managed by the project.
    fn layer_by_id(&self, id: &LayerId) -> Option<LayerHandle>;

    /// All vector layers of the project, in project order.
    fn vector_layers(&self) -> Vec<LayerHandle>;

    /// The layer currently active in the host UI.
    fn active_layer(&self) -> Option<LayerHandle>;

    /// Opens a layer from a provider URI (file path or database source
    /// string). Returns `None` when the source cannot be loaded.
    fn open_layer(&self, uri: &str, name: &str, provider: &str) -> Option<LayerHandle>;

    /// Runs a one-time format script against a database connection.
    /// Best-effort; returns false when the connection or script failed.
    fn run_format_sql(&self, conn_uri: &str, sql: &str) -> bool;
}

/// Project-scoped variable storage.
///
/// The host exposes several historically-grown ways to store a project
/// variable; [`crate::set_project_variable`] tries them in sequence and
/// succeeds when any of them does.
pub trait VariableApi {
    /// Reads a project variable, falling back to the legacy entry and the
    /// custom property when the scope variable is absent.
    fn read_variable(&self, key: &str) -> Option<String>;

    /// Class-level setter.
    fn set_variable_class(&self, key: &str, value: &str) -> bool;

    /// Project-scope setter.
    fn set_variable_scope(&self, key: &str, value: &str) -> bool;

    /// Legacy grouped entry write.
    fn write_entry(&self, group: &str, key: &str, value: &str) -> bool;

    /// Custom-property setter.
    fn set_custom_property(&self, key: &str, value: &str) -> bool;
}

/// Per-layer attribute and selection operations.
pub trait LayerApi {
    /// The layer's attribute fields, in provider order.
    fn fields(&self, layer: &LayerId) -> Vec<FieldDef>;

    /// The layer CRS.
    fn layer_crs(&self, layer: &LayerId) -> Option<Crs>;

    /// Evaluates an expression string against the layer and returns the
    /// matching features.
    fn get_features(&self, layer: &LayerId, expression: &str) -> Result<Vec<Feature>, ExprError>;

    /// Fetches concrete features by id, skipping unknown ids.
    fn features_by_ids(&self, layer: &LayerId, ids: &[FeatureId]) -> Vec<Feature>;

    /// Replaces the layer selection.
    fn select_by_ids(&self, layer: &LayerId, ids: &[FeatureId]) -> bool;

    /// The currently selected feature ids.
    fn selected_ids(&self, layer: &LayerId) -> Vec<FeatureId>;

    /// Distinct non-NULL values of a field, for input suggestions.
    fn unique_values(&self, layer: &LayerId, field: &str) -> Vec<AttrValue>;

    /// Opens the host attribute form for a feature. Best-effort.
    fn open_feature_form(&self, layer: &LayerId, id: FeatureId) -> bool;
}

/// Map canvas view state.
pub trait CanvasApi {
    /// Current visible extent in the canvas CRS.
    fn extent(&self) -> Rect;

    /// Sets the visible extent.
    fn set_extent(&self, rect: Rect);

    /// Centers the view on a point, keeping the current zoom.
    fn set_center(&self, point: Point);

    /// Current map scale denominator.
    fn scale(&self) -> f64;

    /// Zooms to a fixed scale denominator.
    fn zoom_scale(&self, scale: f64);

    /// Current rotation in degrees.
    fn rotation(&self) -> f64;

    /// Sets the rotation in degrees.
    fn set_rotation(&self, degrees: f64);

    /// The canvas destination CRS.
    fn destination_crs(&self) -> Crs;

    /// Zooms the canvas to the layer's current selection.
    fn zoom_to_selected(&self, layer: &LayerId) -> bool;

    /// Requests a repaint.
    fn refresh(&self);

    /// Transforms a point between CRSes; `None` when no transform exists.
    fn transform_point(&self, from: &Crs, to: &Crs, point: Point) -> Option<Point>;

    /// Transforms a rectangle between CRSes; `None` when no transform
    /// exists.
    fn transform_rect(&self, from: &Crs, to: &Crs, rect: Rect) -> Option<Rect>;
}

/// Layer-tree structure and visibility.
pub trait LayerTreeApi {
    /// All layer nodes of the tree, in tree order. The same layer may
    /// appear under several nodes.
    fn layer_nodes(&self) -> Vec<LayerNode>;

    /// Sets the checked visibility of a layer node.
    fn set_layer_visible(&self, layer: &LayerId, visible: bool) -> bool;

    /// Sets the checked visibility of a group node addressed by its path.
    fn set_group_visible(&self, path: &[String], visible: bool) -> bool;

    /// Paths of all groups currently checked visible.
    fn visible_group_paths(&self) -> Vec<Vec<String>>;
}

/// Map-theme collection operations.
pub trait ThemeApi {
    /// Names of all themes, in collection order.
    fn theme_names(&self) -> Vec<String>;

    /// Whether a theme with this name exists.
    fn has_theme(&self, name: &str) -> bool {
        self.theme_names().iter().any(|theme| theme == name)
    }

    /// Applies a theme to the layer tree.
    fn apply_theme(&self, name: &str) -> bool;

    /// Captures the current layer-tree state as a theme, replacing any
    /// existing theme of that name.
    fn insert_theme_from_current_state(&self, name: &str) -> bool;

    /// Removes a theme from the collection.
    fn remove_theme(&self, name: &str) -> bool;
}

/// Renderer style and legend operations.
pub trait StyleApi {
    /// The name of the layer's current style.
    fn style_name(&self, layer: &LayerId) -> Option<String>;

    /// Switches the layer to a named style. Best-effort.
    fn set_style(&self, layer: &LayerId, name: &str) -> bool;

    /// Captures the per-item visibility of the layer's renderer legend.
    fn legend_state(&self, layer: &LayerId) -> LegendState;

    /// Applies legend item visibility. With `enable_only` set, items are
    /// only switched on, never off.
    fn apply_legend(&self, layer: &LayerId, state: &LegendState, enable_only: bool) -> bool;
}

/// Deferred execution through the host task manager.
pub trait TaskApi {
    /// Schedules a job; the completion callback chain is baked into the
    /// job itself. Implementations deliver it on the UI thread; the
    /// in-memory host runs it before returning.
    fn add_task<'a>(&'a self, name: &str, job: Box<dyn FnOnce() + 'a>);
}

/// The full host surface, as implemented by a production adapter or by
/// [`crate::MemoryHost`].
pub trait Host:
    ProjectApi + VariableApi + LayerApi + CanvasApi + LayerTreeApi + ThemeApi + StyleApi + TaskApi
{
}

impl<T> Host for T where
    T: ProjectApi
        + VariableApi
        + LayerApi
        + CanvasApi
        + LayerTreeApi
        + ThemeApi
        + StyleApi
        + TaskApi
{
}
