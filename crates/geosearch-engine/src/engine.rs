//! Per-layer search execution and result grouping.

use geosearch_host::{Feature, FieldDef, Host, LayerHandle};
use tracing::{debug, warn};

use crate::source::LayerSource;

/// Length of the layer-id prefix in disambiguation labels.
const LABEL_ID_CHARS: usize = 8;

/// Results found on one layer.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultGroup {
    /// The layer the features belong to.
    pub layer: LayerHandle,
    /// Tab label; same-named layers are told apart by an id prefix.
    pub label: String,
    /// The columns to display, a subset of `layer_fields`.
    pub fields: Vec<FieldDef>,
    /// The layer's full field list; `Feature::attrs` is parallel to this.
    pub layer_fields: Vec<FieldDef>,
    /// Matching features.
    pub features: Vec<Feature>,
}

/// The display columns for a layer: the configured view fields resolved
/// against the layer, every field when none are configured, and an empty
/// column set (with a warning) when none of the configured names exist.
pub fn view_fields_for_layer(layer_fields: &[FieldDef], configured: &[String]) -> Vec<FieldDef> {
    if configured.is_empty() {
        return layer_fields.to_vec();
    }
    let resolved: Vec<FieldDef> = configured
        .iter()
        .filter_map(|name| layer_fields.iter().find(|field| field.name == *name))
        .cloned()
        .collect();
    if resolved.is_empty() {
        warn!(?configured, "no configured view field exists on the layer");
    }
    resolved
}

/// Runs one search across a layer set.
///
/// For each target layer the predicate is built against that layer's own
/// fields and evaluated by the host; layers with no hits are dropped.
/// Evaluation errors are logged and count as no hits. Groups from a
/// multi-layer source carry a `"name (id-prefix)"` label so same-named
/// layers stay distinguishable.
pub fn run_search(
    host: &dyn Host,
    source: &LayerSource,
    view_fields: &[String],
    build_predicate: &dyn Fn(&[FieldDef]) -> Option<String>,
) -> Vec<ResultGroup> {
    let multi = !matches!(source, LayerSource::Single(_));
    let mut groups = Vec::new();

    for layer in source.layers(host) {
        let layer_fields = host.fields(&layer.id);
        let Some(expression) = build_predicate(&layer_fields) else {
            debug!(layer = %layer.name, "nothing to search on this layer");
            continue;
        };
        debug!(layer = %layer.name, %expression, "running search");
        let features = match host.get_features(&layer.id, &expression) {
            Ok(features) => features,
            Err(error) => {
                warn!(layer = %layer.name, %error, "expression evaluation failed");
                continue;
            }
        };
        if features.is_empty() {
            continue;
        }

        let label = if multi {
            format!("{} ({})", layer.name, layer.id.short(LABEL_ID_CHARS))
        } else {
            layer.name.clone()
        };
        groups.push(ResultGroup {
            fields: view_fields_for_layer(&layer_fields, view_fields),
            layer_fields,
            features,
            label,
            layer,
        });
    }
    groups
}
