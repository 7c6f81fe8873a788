//! Result navigation: selecting found features and moving the map view.
//!
//! [`navigate`] selects the features on the target layer and executes the
//! configured pan mode. Host calls are best-effort throughout; a view
//! change that fails falls back to plain zoom-to-selected, and nothing
//! here ever propagates a host failure to the search flow.

#![warn(missing_docs)]

mod animate;

use geosearch_host::{FeatureId, Host, LayerHandle, LayerId, Rect};
use tracing::{debug, warn};

pub use animate::PanAnimation;

/// The view-change policy applied after a result selection.
///
/// The numeric codes are part of the configuration surface; 2 and 3 are
/// reserved historical modes that no longer exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PanMode {
    /// Zoom the canvas to the selected features.
    #[default]
    ZoomToSelected,
    /// Center on the selection, keeping the current zoom.
    CenterPan,
    /// Center on the selection and apply a fixed scale.
    FixedScale,
    /// Pan to the selection in animated steps.
    AnimatedPan,
    /// Select only; leave the view untouched.
    SelectionOnly,
}

impl PanMode {
    /// Decodes a configured mode value; unknown codes fall back to
    /// zoom-to-selected.
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::CenterPan,
            4 => Self::FixedScale,
            5 => Self::AnimatedPan,
            6 => Self::SelectionOnly,
            _ => Self::ZoomToSelected,
        }
    }

    /// The stable numeric code.
    pub fn code(self) -> i32 {
        match self {
            Self::ZoomToSelected => 0,
            Self::CenterPan => 1,
            Self::FixedScale => 4,
            Self::AnimatedPan => 5,
            Self::SelectionOnly => 6,
        }
    }
}

/// Scale, rotation and visibility settings applied after a view change.
#[derive(Debug, Clone, Default)]
pub struct NavigationOptions {
    /// The pan mode to execute.
    pub pan_mode: PanMode,
    /// Fixed scale from the toolbar combo; the tab scale wins over it.
    pub fixed_scale: Option<f64>,
    /// Fixed scale configured on the tab.
    pub tab_scale: Option<f64>,
    /// Rotation configured on the tab, degrees in [-360, 360].
    pub angle: Option<f64>,
    /// Force the target layer (and its ancestor groups) visible.
    pub show_layer: bool,
}

impl NavigationOptions {
    /// The effective fixed scale: the tab's value wins over the toolbar's.
    fn effective_scale(&self) -> Option<f64> {
        self.tab_scale.or(self.fixed_scale).filter(|scale| *scale > 0.0)
    }
}

/// What a navigation did.
#[derive(Debug)]
pub enum NavigationOutcome {
    /// There was nothing to navigate to.
    NoOp,
    /// Features were selected; the view was intentionally left alone.
    SelectionOnly,
    /// The view changed and the after-view settings were applied.
    Viewed,
    /// An animated pan is in flight; drive it with
    /// [`drive_animation`] (or manually) to completion.
    Animated(PanAnimation),
}

/// Selects `ids` on `layer` and executes the configured pan mode.
///
/// Ids are deduplicated first and the layer is remapped to its
/// project-managed instance when possible. Selection always happens before
/// any view change; scale, rotation and forced visibility apply after the
/// view settles.
pub fn navigate(
    host: &dyn Host,
    layer: &LayerHandle,
    ids: &[FeatureId],
    options: &NavigationOptions,
) -> NavigationOutcome {
    let mut unique: Vec<FeatureId> = Vec::new();
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    if unique.is_empty() {
        debug!("no feature ids to navigate to");
        return NavigationOutcome::NoOp;
    }

    // Prefer the project-managed instance over a detached handle.
    let target = host.layer_by_id(&layer.id).unwrap_or_else(|| layer.clone());
    if !host.select_by_ids(&target.id, &unique) {
        warn!(layer = %target.name, "selection failed");
    }

    if options.pan_mode == PanMode::SelectionOnly {
        debug!(layer = %target.name, "selection-only mode, view unchanged");
        return NavigationOutcome::SelectionOnly;
    }

    let bbox = combined_bbox(host, &target.id, &unique);
    let (center, view_bbox) = match bbox {
        Some(bbox) => {
            let layer_crs = host.layer_crs(&target.id);
            let canvas_crs = host.destination_crs();
            match layer_crs.filter(|crs| *crs != canvas_crs) {
                Some(layer_crs) => {
                    let trans_bbox = host.transform_rect(&layer_crs, &canvas_crs, bbox);
                    let trans_center =
                        host.transform_point(&layer_crs, &canvas_crs, bbox.center());
                    (
                        trans_center.unwrap_or_else(|| bbox.center()),
                        trans_bbox.unwrap_or(bbox),
                    )
                }
                None => (bbox.center(), bbox),
            }
        }
        None => {
            // Without geometry only zoom-to-selected can do anything.
            debug!(layer = %target.name, "no geometry; falling back to zoom-to-selected");
            host.zoom_to_selected(&target.id);
            apply_after_view(host, &target.id, options);
            return NavigationOutcome::Viewed;
        }
    };

    match options.pan_mode {
        PanMode::SelectionOnly => return NavigationOutcome::SelectionOnly,
        PanMode::ZoomToSelected => {
            if !host.zoom_to_selected(&target.id) {
                warn!(layer = %target.name, "zoom-to-selected failed");
            }
        }
        PanMode::CenterPan | PanMode::FixedScale => {
            host.set_center(center);
            host.refresh();
        }
        PanMode::AnimatedPan => {
            let animation = PanAnimation::new(host.extent().center(), view_bbox);
            return NavigationOutcome::Animated(animation);
        }
    }

    apply_after_view(host, &target.id, options);
    NavigationOutcome::Viewed
}

/// Runs an animated pan to completion in one go (headless driving): every
/// step centers and refreshes the canvas, then the buffered extent and the
/// after-view settings are applied.
pub fn drive_animation(
    host: &dyn Host,
    layer: &LayerId,
    mut animation: PanAnimation,
    options: &NavigationOptions,
) {
    while let Some(step) = animation.tick() {
        host.set_center(step);
        host.refresh();
    }
    host.set_extent(animation.final_extent());
    host.refresh();
    apply_after_view(host, layer, options);
}

/// Applies the after-view settings in order: fixed scale, rotation, forced
/// layer visibility.
pub fn apply_after_view(host: &dyn Host, layer: &LayerId, options: &NavigationOptions) {
    if let Some(scale) = options.effective_scale() {
        host.zoom_scale(scale);
        debug!(scale, "fixed scale applied");
    }
    if let Some(angle) = options.angle {
        host.set_rotation(angle);
        debug!(angle, "rotation applied");
    }
    if options.show_layer {
        ensure_layer_visible(host, layer);
    }
}

/// Makes the layer's tree node visible, together with every ancestor
/// group.
pub fn ensure_layer_visible(host: &dyn Host, layer: &LayerId) {
    let nodes = host.layer_nodes();
    let mut found = false;
    for node in nodes.iter().filter(|node| node.layer == *layer) {
        found = true;
        if !host.set_layer_visible(layer, true) {
            warn!(%layer, "could not set layer node visible");
        }
        for depth in 1..=node.groups.len() {
            if !host.set_group_visible(&node.groups[..depth], true) {
                warn!(group = ?&node.groups[..depth], "could not set group visible");
            }
        }
    }
    if !found {
        warn!(%layer, "layer has no tree node to show");
    }
}

/// The combined bounding box of the features, in the layer CRS.
fn combined_bbox(host: &dyn Host, layer: &LayerId, ids: &[FeatureId]) -> Option<Rect> {
    let mut bbox: Option<Rect> = None;
    for feature in host.features_by_ids(layer, ids) {
        if let Some(feature_bbox) = feature.bbox {
            bbox = Some(match bbox {
                Some(current) => current.combined(&feature_bbox),
                None => feature_bbox,
            });
        }
    }
    bbox
}
