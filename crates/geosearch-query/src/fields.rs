//! Resolving configured field descriptors to concrete layer fields.

use geosearch_config::FieldSpec;
use geosearch_host::FieldDef;
use geosearch_text::looks_numeric;
use tracing::warn;

/// Resolves a configured name against a layer's fields: an exact field-name
/// match first, then a display-alias match. Unresolvable names are skipped
/// with a warning.
pub fn resolve_field_name(fields: &[FieldDef], name: &str) -> Option<String> {
    if name.is_empty() {
        return None;
    }
    if fields.iter().any(|field| field.name == name) {
        return Some(name.to_string());
    }
    if let Some(field) = fields
        .iter()
        .find(|field| field.alias.as_deref() == Some(name))
    {
        return Some(field.name.clone());
    }
    warn!(name, "field name did not resolve");
    None
}

/// Expands a tab's field specs into the concrete field names to search.
///
/// - The all-fields spec selects every text field, plus the numeric fields
///   when the (already normalized) input value reads as a number. It
///   swallows any remaining specs, like the widget it backs.
/// - An OR-list spec expands its comma-separated names.
/// - A plain spec resolves its `Field` (or `ViewName`), which may itself
///   be comma-separated.
pub fn resolve_specs(fields: &[FieldDef], specs: &[FieldSpec], value: &str) -> Vec<String> {
    let mut resolved = Vec::new();
    for spec in specs {
        if spec.is_all() {
            if !value.is_empty() {
                resolved.extend(
                    fields
                        .iter()
                        .filter(|field| !field.field_type.is_numeric())
                        .map(|field| field.name.clone()),
                );
                if looks_numeric(value) {
                    resolved.extend(
                        fields
                            .iter()
                            .filter(|field| field.field_type.is_numeric())
                            .map(|field| field.name.clone()),
                    );
                }
            }
            break;
        }

        if let Some(names) = spec.or_list() {
            resolved.extend(
                names
                    .iter()
                    .filter_map(|name| resolve_field_name(fields, name)),
            );
            continue;
        }

        let Some(configured) = spec.field.as_deref().or(spec.view_name.as_deref()) else {
            continue;
        };
        if configured.contains(',') {
            resolved.extend(
                configured
                    .split(',')
                    .map(str::trim)
                    .filter(|name| !name.is_empty())
                    .filter_map(|name| resolve_field_name(fields, name)),
            );
        } else if let Some(name) = resolve_field_name(fields, configured) {
            resolved.push(name);
        }
    }
    resolved
}
