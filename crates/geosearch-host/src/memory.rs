//! In-memory host adapter.
//!
//! Implements the whole [`Host`](crate::api::Host) surface against plain
//! data structures so the search core can run headless. Everything lives in
//! a single [`RefCell`]: the host is shared single-threaded state, mutated
//! only from the UI thread, exactly like the real application.

use std::{
    cell::RefCell,
    collections::{BTreeMap, BTreeSet, HashMap},
    path::PathBuf,
};

use crate::{
    api::{CanvasApi, LayerApi, LayerTreeApi, ProjectApi, StyleApi, TaskApi, ThemeApi, VariableApi},
    expr::{ExprError, Predicate},
    geometry::{Crs, Point, Rect},
    types::{AttrValue, Feature, FeatureId, FieldDef, LayerHandle, LayerId, LayerNode, LegendState},
};

/// One of the host's project-variable setter APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum VarSetter {
    /// Class-level setter.
    Class,
    /// Project-scope setter.
    Scope,
    /// Legacy grouped entry write.
    Entry,
    /// Custom-property setter.
    CustomProperty,
}

/// Builder for registering a layer on the [`MemoryHost`].
#[derive(Debug, Clone)]
pub struct LayerBuilder {
    /// Explicit layer id; generated from the name when absent.
    id: Option<String>,
    /// Display name.
    name: String,
    /// Layer CRS.
    crs: Crs,
    /// Attribute fields.
    fields: Vec<FieldDef>,
    /// Features.
    features: Vec<Feature>,
    /// Ancestor group names in the layer tree, outermost first.
    groups: Vec<String>,
    /// Initial checked visibility of the layer node.
    visible: bool,
}

impl LayerBuilder {
    /// Starts a builder for a layer with the given display name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            crs: Crs::new("EPSG:4326"),
            fields: Vec::new(),
            features: Vec::new(),
            groups: Vec::new(),
            visible: true,
        }
    }

    /// Overrides the generated layer id.
    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the layer CRS.
    pub fn crs(mut self, authid: &str) -> Self {
        self.crs = Crs::new(authid);
        self
    }

    /// Adds an attribute field.
    pub fn field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a feature.
    pub fn feature(mut self, feature: Feature) -> Self {
        self.features.push(feature);
        self
    }

    /// Places the layer node under the given group chain.
    pub fn groups(mut self, groups: &[&str]) -> Self {
        self.groups = groups.iter().map(|&group| group.to_string()).collect();
        self
    }

    /// Sets the initial checked visibility (default: visible).
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }
}

/// A registered layer.
#[derive(Debug, Clone)]
struct LayerRecord {
    /// Id + name handle.
    handle: LayerHandle,
    /// Layer CRS.
    crs: Crs,
    /// Attribute fields.
    fields: Vec<FieldDef>,
    /// Features keyed implicitly by position.
    features: Vec<Feature>,
    /// Current selection.
    selected: Vec<FeatureId>,
    /// Current style name.
    style: Option<String>,
    /// Current legend state.
    legend: LegendState,
    /// Whether the layer is managed by the project (false for layers
    /// opened ad hoc through `open_layer`).
    in_project: bool,
}

/// A layer node of the layer tree.
#[derive(Debug, Clone)]
struct NodeRecord {
    /// Referenced layer.
    layer: LayerId,
    /// Checked state of the node itself.
    checked: bool,
    /// Ancestor groups, outermost first.
    groups: Vec<String>,
}

/// A stored map theme.
#[derive(Debug, Clone, Default)]
struct ThemeRecord {
    /// Layers checked visible in the theme.
    visible_layers: BTreeSet<LayerId>,
    /// Group paths checked visible in the theme.
    visible_groups: Vec<Vec<String>>,
    /// Style per layer.
    styles: BTreeMap<LayerId, String>,
    /// Legend state per layer.
    legends: BTreeMap<LayerId, LegendState>,
}

/// Canvas view state.
#[derive(Debug, Clone)]
struct CanvasState {
    /// Visible extent.
    extent: Rect,
    /// Scale denominator.
    scale: f64,
    /// Rotation in degrees.
    rotation: f64,
    /// Destination CRS.
    crs: Crs,
    /// Number of refresh requests, for tests.
    refreshes: usize,
}

/// The whole mutable host state.
#[derive(Debug)]
struct State {
    /// Project file path.
    project_file: Option<PathBuf>,
    /// Scope variables.
    variables: BTreeMap<String, String>,
    /// Legacy entries keyed by (group, key).
    entries: BTreeMap<(String, String), String>,
    /// Custom properties.
    custom_properties: BTreeMap<String, String>,
    /// Setters configured to fail.
    disabled_setters: BTreeSet<VarSetter>,
    /// Registered layers in project order.
    layers: Vec<LayerRecord>,
    /// Active layer.
    active: Option<LayerId>,
    /// Layer nodes in tree order.
    nodes: Vec<NodeRecord>,
    /// Group paths with their checked state.
    groups: Vec<(Vec<String>, bool)>,
    /// Themes in collection order.
    themes: Vec<(String, ThemeRecord)>,
    /// Canvas state.
    canvas: CanvasState,
    /// Registered CRS translations keyed by (from, to): (dx, dy).
    transforms: HashMap<(String, String), (f64, f64)>,
    /// Sources loadable through `open_layer`, keyed by URI.
    loadable: HashMap<String, LayerBuilder>,
    /// Format-SQL invocations, for tests.
    format_sql_calls: Vec<(String, String)>,
    /// Attribute forms opened, for tests.
    opened_forms: Vec<(LayerId, FeatureId)>,
    /// Sequence for generated layer ids.
    next_layer_seq: u32,
}

/// In-memory implementation of every host capability trait.
#[derive(Debug)]
pub struct MemoryHost {
    /// Shared mutable state.
    state: RefCell<State>,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// Creates an empty host with a default canvas.
    pub fn new() -> Self {
        Self {
            state: RefCell::new(State {
                project_file: None,
                variables: BTreeMap::new(),
                entries: BTreeMap::new(),
                custom_properties: BTreeMap::new(),
                disabled_setters: BTreeSet::new(),
                layers: Vec::new(),
                active: None,
                nodes: Vec::new(),
                groups: Vec::new(),
                themes: Vec::new(),
                canvas: CanvasState {
                    extent: Rect::new(0.0, 0.0, 100.0, 100.0),
                    scale: 10_000.0,
                    rotation: 0.0,
                    crs: Crs::new("EPSG:4326"),
                    refreshes: 0,
                },
                transforms: HashMap::new(),
                loadable: HashMap::new(),
                format_sql_calls: Vec::new(),
                opened_forms: Vec::new(),
                next_layer_seq: 0,
            }),
        }
    }

    /// Sets the project file path.
    pub fn set_project_file(&self, path: impl Into<PathBuf>) {
        self.state.borrow_mut().project_file = Some(path.into());
    }

    /// Registers a layer in the project and its node in the layer tree.
    pub fn add_layer(&self, builder: LayerBuilder) -> LayerId {
        let mut state = self.state.borrow_mut();
        state.next_layer_seq += 1;
        let id = LayerId::new(
            builder
                .id
                .unwrap_or_else(|| format!("{}_{:08x}", builder.name, state.next_layer_seq)),
        );
        for group_len in 1..=builder.groups.len() {
            let path = builder.groups[..group_len].to_vec();
            if !state.groups.iter().any(|(existing, _)| *existing == path) {
                state.groups.push((path, true));
            }
        }
        state.nodes.push(NodeRecord {
            layer: id.clone(),
            checked: builder.visible,
            groups: builder.groups,
        });
        state.layers.push(LayerRecord {
            handle: LayerHandle {
                id: id.clone(),
                name: builder.name,
            },
            crs: builder.crs,
            fields: builder.fields,
            features: builder.features,
            selected: Vec::new(),
            style: None,
            legend: LegendState::default(),
            in_project: true,
        });
        id
    }

    /// Makes a layer the active one.
    pub fn set_active_layer(&self, layer: &LayerId) {
        self.state.borrow_mut().active = Some(layer.clone());
    }

    /// Registers a source that `open_layer` can load.
    pub fn register_loadable(&self, uri: impl Into<String>, builder: LayerBuilder) {
        self.state.borrow_mut().loadable.insert(uri.into(), builder);
    }

    /// Registers a pure-translation CRS transform and its inverse.
    pub fn register_transform(&self, from: &str, to: &str, dx: f64, dy: f64) {
        let mut state = self.state.borrow_mut();
        state
            .transforms
            .insert((from.to_string(), to.to_string()), (dx, dy));
        state
            .transforms
            .insert((to.to_string(), from.to_string()), (-dx, -dy));
    }

    /// Sets the canvas destination CRS.
    pub fn set_canvas_crs(&self, authid: &str) {
        self.state.borrow_mut().canvas.crs = Crs::new(authid);
    }

    /// Sets a layer's current style name.
    pub fn set_layer_style(&self, layer: &LayerId, style: &str) {
        let mut state = self.state.borrow_mut();
        if let Some(record) = state.layers.iter_mut().find(|record| record.handle.id == *layer) {
            record.style = Some(style.to_string());
        }
    }

    /// Seeds a layer's legend state.
    pub fn set_layer_legend(&self, layer: &LayerId, legend: LegendState) {
        let mut state = self.state.borrow_mut();
        if let Some(record) = state.layers.iter_mut().find(|record| record.handle.id == *layer) {
            record.legend = legend;
        }
    }

    /// Makes the listed variable setters report failure.
    pub fn disable_setters(&self, setters: &[VarSetter]) {
        self.state
            .borrow_mut()
            .disabled_setters
            .extend(setters.iter().copied());
    }

    /// Number of canvas refreshes so far.
    pub fn refresh_count(&self) -> usize {
        self.state.borrow().canvas.refreshes
    }

    /// Attribute forms opened so far.
    pub fn opened_forms(&self) -> Vec<(LayerId, FeatureId)> {
        self.state.borrow().opened_forms.clone()
    }

    /// Format-SQL scripts run so far.
    pub fn format_sql_calls(&self) -> Vec<(String, String)> {
        self.state.borrow().format_sql_calls.clone()
    }

    /// True when the layer's node (and all its ancestor groups) are
    /// checked visible.
    fn node_effective_visible(state: &State, node: &NodeRecord) -> bool {
        if !node.checked {
            return false;
        }
        (1..=node.groups.len()).all(|group_len| {
            let prefix = &node.groups[..group_len];
            state
                .groups
                .iter()
                .find(|(path, _)| path == prefix)
                .is_none_or(|(_, checked)| *checked)
        })
    }

    /// Captures the current tree/style/legend state as a theme record.
    fn capture_theme(state: &State) -> ThemeRecord {
        let mut record = ThemeRecord::default();
        for node in &state.nodes {
            if Self::node_effective_visible(state, node) {
                record.visible_layers.insert(node.layer.clone());
            }
        }
        for (path, checked) in &state.groups {
            if *checked {
                record.visible_groups.push(path.clone());
            }
        }
        for layer in &state.layers {
            if !layer.in_project {
                continue;
            }
            if let Some(style) = &layer.style {
                record.styles.insert(layer.handle.id.clone(), style.clone());
            }
            if !layer.legend.is_empty() {
                record
                    .legends
                    .insert(layer.handle.id.clone(), layer.legend.clone());
            }
        }
        record
    }
}

impl ProjectApi for MemoryHost {
    fn project_file(&self) -> Option<PathBuf> {
        self.state.borrow().project_file.clone()
    }

    fn layers_by_name(&self, name: &str) -> Vec<LayerHandle> {
        self.state
            .borrow()
            .layers
            .iter()
            .filter(|record| record.in_project && record.handle.name == name)
            .map(|record| record.handle.clone())
            .collect()
    }

    fn layer_by_id(&self, id: &LayerId) -> Option<LayerHandle> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.in_project && record.handle.id == *id)
            .map(|record| record.handle.clone())
    }

    fn vector_layers(&self) -> Vec<LayerHandle> {
        self.state
            .borrow()
            .layers
            .iter()
            .filter(|record| record.in_project)
            .map(|record| record.handle.clone())
            .collect()
    }

    fn active_layer(&self) -> Option<LayerHandle> {
        let state = self.state.borrow();
        let active = state.active.as_ref()?;
        state
            .layers
            .iter()
            .find(|record| record.handle.id == *active)
            .map(|record| record.handle.clone())
    }

    fn open_layer(&self, uri: &str, name: &str, _provider: &str) -> Option<LayerHandle> {
        let builder = self.state.borrow().loadable.get(uri).cloned()?;
        let mut state = self.state.borrow_mut();
        state.next_layer_seq += 1;
        let id = LayerId::new(format!("{name}_{:08x}", state.next_layer_seq));
        let handle = LayerHandle {
            id: id.clone(),
            name: name.to_string(),
        };
        state.layers.push(LayerRecord {
            handle: handle.clone(),
            crs: builder.crs,
            fields: builder.fields,
            features: builder.features,
            selected: Vec::new(),
            style: None,
            legend: LegendState::default(),
            in_project: false,
        });
        Some(handle)
    }

    fn run_format_sql(&self, conn_uri: &str, sql: &str) -> bool {
        self.state
            .borrow_mut()
            .format_sql_calls
            .push((conn_uri.to_string(), sql.to_string()));
        true
    }
}

impl VariableApi for MemoryHost {
    fn read_variable(&self, key: &str) -> Option<String> {
        let state = self.state.borrow();
        if let Some(value) = state.variables.get(key) {
            return Some(value.clone());
        }
        if let Some(value) = state
            .entries
            .iter()
            .find(|((_, entry_key), _)| entry_key == key)
            .map(|(_, value)| value.clone())
        {
            return Some(value);
        }
        state.custom_properties.get(key).cloned()
    }

    fn set_variable_class(&self, key: &str, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disabled_setters.contains(&VarSetter::Class) {
            return false;
        }
        state.variables.insert(key.to_string(), value.to_string());
        true
    }

    fn set_variable_scope(&self, key: &str, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disabled_setters.contains(&VarSetter::Scope) {
            return false;
        }
        state.variables.insert(key.to_string(), value.to_string());
        true
    }

    fn write_entry(&self, group: &str, key: &str, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disabled_setters.contains(&VarSetter::Entry) {
            return false;
        }
        state
            .entries
            .insert((group.to_string(), key.to_string()), value.to_string());
        true
    }

    fn set_custom_property(&self, key: &str, value: &str) -> bool {
        let mut state = self.state.borrow_mut();
        if state.disabled_setters.contains(&VarSetter::CustomProperty) {
            return false;
        }
        state
            .custom_properties
            .insert(key.to_string(), value.to_string());
        true
    }
}

impl LayerApi for MemoryHost {
    fn fields(&self, layer: &LayerId) -> Vec<FieldDef> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.handle.id == *layer)
            .map(|record| record.fields.clone())
            .unwrap_or_default()
    }

    fn layer_crs(&self, layer: &LayerId) -> Option<Crs> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.handle.id == *layer)
            .map(|record| record.crs.clone())
    }

    fn get_features(&self, layer: &LayerId, expression: &str) -> Result<Vec<Feature>, ExprError> {
        let predicate = Predicate::parse(expression)?;
        let state = self.state.borrow();
        let Some(record) = state.layers.iter().find(|record| record.handle.id == *layer) else {
            return Ok(Vec::new());
        };
        let mut matched = Vec::new();
        for feature in &record.features {
            if predicate.matches(&record.fields, feature)? {
                matched.push(feature.clone());
            }
        }
        Ok(matched)
    }

    fn features_by_ids(&self, layer: &LayerId, ids: &[FeatureId]) -> Vec<Feature> {
        let state = self.state.borrow();
        let Some(record) = state.layers.iter().find(|record| record.handle.id == *layer) else {
            return Vec::new();
        };
        ids.iter()
            .filter_map(|id| record.features.iter().find(|feature| feature.id == *id))
            .cloned()
            .collect()
    }

    fn select_by_ids(&self, layer: &LayerId, ids: &[FeatureId]) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(record) = state
            .layers
            .iter_mut()
            .find(|record| record.handle.id == *layer)
        else {
            return false;
        };
        record.selected = ids.to_vec();
        true
    }

    fn selected_ids(&self, layer: &LayerId) -> Vec<FeatureId> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.handle.id == *layer)
            .map(|record| record.selected.clone())
            .unwrap_or_default()
    }

    fn unique_values(&self, layer: &LayerId, field: &str) -> Vec<AttrValue> {
        let state = self.state.borrow();
        let Some(record) = state.layers.iter().find(|record| record.handle.id == *layer) else {
            return Vec::new();
        };
        let Some(index) = record.fields.iter().position(|def| def.name == field) else {
            return Vec::new();
        };
        let mut seen = BTreeSet::new();
        let mut values = Vec::new();
        for feature in &record.features {
            let Some(value) = feature.attrs.get(index) else {
                continue;
            };
            if let Some(rendered) = value.render()
                && seen.insert(rendered)
            {
                values.push(value.clone());
            }
        }
        values
    }

    fn open_feature_form(&self, layer: &LayerId, id: FeatureId) -> bool {
        self.state
            .borrow_mut()
            .opened_forms
            .push((layer.clone(), id));
        true
    }
}

impl CanvasApi for MemoryHost {
    fn extent(&self) -> Rect {
        self.state.borrow().canvas.extent
    }

    fn set_extent(&self, rect: Rect) {
        self.state.borrow_mut().canvas.extent = rect;
    }

    fn set_center(&self, point: Point) {
        let mut state = self.state.borrow_mut();
        let extent = state.canvas.extent;
        let half_width = extent.width() / 2.0;
        let half_height = extent.height() / 2.0;
        state.canvas.extent = Rect::new(
            point.x - half_width,
            point.y - half_height,
            point.x + half_width,
            point.y + half_height,
        );
    }

    fn scale(&self) -> f64 {
        self.state.borrow().canvas.scale
    }

    fn zoom_scale(&self, scale: f64) {
        self.state.borrow_mut().canvas.scale = scale;
    }

    fn rotation(&self) -> f64 {
        self.state.borrow().canvas.rotation
    }

    fn set_rotation(&self, degrees: f64) {
        self.state.borrow_mut().canvas.rotation = degrees;
    }

    fn destination_crs(&self) -> Crs {
        self.state.borrow().canvas.crs.clone()
    }

    fn zoom_to_selected(&self, layer: &LayerId) -> bool {
        let (bbox, layer_crs) = {
            let state = self.state.borrow();
            let Some(record) = state.layers.iter().find(|record| record.handle.id == *layer)
            else {
                return false;
            };
            let mut bbox: Option<Rect> = None;
            for id in &record.selected {
                let Some(feature) = record.features.iter().find(|feature| feature.id == *id)
                else {
                    continue;
                };
                if let Some(feature_bbox) = feature.bbox {
                    bbox = Some(match bbox {
                        Some(current) => current.combined(&feature_bbox),
                        None => feature_bbox,
                    });
                }
            }
            (bbox, record.crs.clone())
        };
        let Some(bbox) = bbox else {
            return false;
        };
        let canvas_crs = self.destination_crs();
        let target = self
            .transform_rect(&layer_crs, &canvas_crs, bbox)
            .unwrap_or(bbox);
        self.set_extent(target);
        self.refresh();
        true
    }

    fn refresh(&self) {
        self.state.borrow_mut().canvas.refreshes += 1;
    }

    fn transform_point(&self, from: &Crs, to: &Crs, point: Point) -> Option<Point> {
        if from == to {
            return Some(point);
        }
        let state = self.state.borrow();
        let (dx, dy) = state.transforms.get(&(from.0.clone(), to.0.clone()))?;
        Some(Point::new(point.x + dx, point.y + dy))
    }

    fn transform_rect(&self, from: &Crs, to: &Crs, rect: Rect) -> Option<Rect> {
        if from == to {
            return Some(rect);
        }
        let min = self.transform_point(from, to, Point::new(rect.x_min, rect.y_min))?;
        let max = self.transform_point(from, to, Point::new(rect.x_max, rect.y_max))?;
        Some(Rect::new(min.x, min.y, max.x, max.y))
    }
}

impl LayerTreeApi for MemoryHost {
    fn layer_nodes(&self) -> Vec<LayerNode> {
        let state = self.state.borrow();
        state
            .nodes
            .iter()
            .map(|node| LayerNode {
                layer: node.layer.clone(),
                visible: Self::node_effective_visible(&state, node),
                groups: node.groups.clone(),
            })
            .collect()
    }

    fn set_layer_visible(&self, layer: &LayerId, visible: bool) -> bool {
        let mut state = self.state.borrow_mut();
        let mut found = false;
        for node in &mut state.nodes {
            if node.layer == *layer {
                node.checked = visible;
                found = true;
            }
        }
        found
    }

    fn set_group_visible(&self, path: &[String], visible: bool) -> bool {
        let mut state = self.state.borrow_mut();
        if let Some(entry) = state.groups.iter_mut().find(|(existing, _)| existing == path) {
            entry.1 = visible;
            true
        } else {
            false
        }
    }

    fn visible_group_paths(&self) -> Vec<Vec<String>> {
        self.state
            .borrow()
            .groups
            .iter()
            .filter(|(_, checked)| *checked)
            .map(|(path, _)| path.clone())
            .collect()
    }
}

impl ThemeApi for MemoryHost {
    fn theme_names(&self) -> Vec<String> {
        self.state
            .borrow()
            .themes
            .iter()
            .map(|(name, _)| name.clone())
            .collect()
    }

    fn apply_theme(&self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(record) = state
            .themes
            .iter()
            .find(|(theme_name, _)| theme_name == name)
            .map(|(_, record)| record.clone())
        else {
            return false;
        };
        for node in &mut state.nodes {
            node.checked = record.visible_layers.contains(&node.layer);
        }
        for (path, checked) in &mut state.groups {
            *checked = record.visible_groups.contains(path);
        }
        for layer in &mut state.layers {
            if let Some(style) = record.styles.get(&layer.handle.id) {
                layer.style = Some(style.clone());
            }
            if let Some(legend) = record.legends.get(&layer.handle.id) {
                layer.legend = legend.clone();
            }
        }
        true
    }

    fn insert_theme_from_current_state(&self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let record = Self::capture_theme(&state);
        if let Some(entry) = state
            .themes
            .iter_mut()
            .find(|(theme_name, _)| theme_name == name)
        {
            entry.1 = record;
        } else {
            state.themes.push((name.to_string(), record));
        }
        true
    }

    fn remove_theme(&self, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.themes.len();
        state.themes.retain(|(theme_name, _)| theme_name != name);
        state.themes.len() != before
    }
}

impl StyleApi for MemoryHost {
    fn style_name(&self, layer: &LayerId) -> Option<String> {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.handle.id == *layer)
            .and_then(|record| record.style.clone())
    }

    fn set_style(&self, layer: &LayerId, name: &str) -> bool {
        let mut state = self.state.borrow_mut();
        let Some(record) = state
            .layers
            .iter_mut()
            .find(|record| record.handle.id == *layer)
        else {
            return false;
        };
        record.style = Some(name.to_string());
        true
    }

    fn legend_state(&self, layer: &LayerId) -> LegendState {
        self.state
            .borrow()
            .layers
            .iter()
            .find(|record| record.handle.id == *layer)
            .map(|record| record.legend.clone())
            .unwrap_or_default()
    }

    fn apply_legend(&self, layer: &LayerId, state: &LegendState, enable_only: bool) -> bool {
        let mut inner = self.state.borrow_mut();
        let Some(record) = inner
            .layers
            .iter_mut()
            .find(|record| record.handle.id == *layer)
        else {
            return false;
        };
        for item in &state.items {
            let Some(visible) = item.visible else {
                continue;
            };
            let Some(target) = record
                .legend
                .items
                .iter_mut()
                .find(|existing| existing.index == item.index && existing.kind == item.kind)
            else {
                continue;
            };
            if enable_only {
                if visible {
                    target.visible = Some(true);
                }
            } else {
                target.visible = Some(visible);
            }
        }
        true
    }
}

impl TaskApi for MemoryHost {
    fn add_task<'a>(&'a self, _name: &str, job: Box<dyn FnOnce() + 'a>) {
        job();
    }
}
