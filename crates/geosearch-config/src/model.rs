//! Serde model of the search-tab configuration documents.
//!
//! The on-disk schema is JSON with capitalized keys (`Title`, `Layer`,
//! `SearchField`, …). All structs default every field and carry a flattened
//! extra map so unknown keys survive an edit round-trip untouched.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use serde_with::{OneOrMany, serde_as};

/// Group assigned to tabs that declare none.
pub const OTHER_GROUP_NAME: &str = "その他";

/// View-name prefix marking an OR-list field spec.
pub const OR_SEARCH_PREFIX: &str = "OR検索:";

/// Top-level configuration document: `{"SearchTabs": […], "PageLimit": n}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchDocument {
    /// The tab list.
    #[serde(rename = "SearchTabs")]
    pub search_tabs: Vec<TabConfig>,
    /// Result page size.
    #[serde(rename = "PageLimit", skip_serializing_if = "Option::is_none")]
    pub page_limit: Option<u32>,
    /// Unknown top-level keys, preserved round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One search tab.
#[serde_as]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TabConfig {
    /// Tab title, unique within its group.
    #[serde(rename = "Title")]
    pub title: String,
    /// Tab group; tabs without one land in [`OTHER_GROUP_NAME`].
    #[serde(rename = "group", skip_serializing_if = "String::is_empty")]
    pub group: String,
    /// Target layer; absent means the host's active layer.
    #[serde(rename = "Layer", skip_serializing_if = "Option::is_none")]
    pub layer: Option<LayerRef>,
    /// Single search-field spec.
    #[serde(rename = "SearchField", skip_serializing_if = "Option::is_none")]
    pub search_field: Option<FieldSpec>,
    /// Multi-widget search-field specs (tiban / owner tabs).
    #[serde(rename = "SearchFields", skip_serializing_if = "Option::is_none")]
    pub search_fields: Option<Vec<FieldSpec>>,
    /// Result columns; empty means every field of the target layer.
    #[serde(rename = "ViewFields", skip_serializing_if = "Vec::is_empty")]
    #[serde_as(as = "OneOrMany<_>")]
    pub view_fields: Vec<String>,
    /// Theme applied before searching on this tab.
    #[serde(rename = "selectTheme", skip_serializing_if = "Option::is_none")]
    pub select_theme: Option<String>,
    /// Canvas rotation applied after navigation, clamped to [-360, 360].
    #[serde(
        rename = "angle",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_angle"
    )]
    pub angle: Option<f64>,
    /// Fixed scale denominator applied after navigation.
    #[serde(
        rename = "scale",
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_scale"
    )]
    pub scale: Option<f64>,
    /// Help message shown on request.
    #[serde(rename = "Message", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Whether to offer input suggestions from layer values.
    #[serde(rename = "Suggest", skip_serializing_if = "is_false")]
    pub suggest: bool,
    /// Field holding the parcel number, searched with the fuzzy regex.
    #[serde(rename = "TibanField", skip_serializing_if = "Option::is_none")]
    pub tiban_field: Option<String>,
    /// Opaque aza-code table configuration (row-source parameters).
    #[serde(rename = "AzaTable", skip_serializing_if = "Option::is_none")]
    pub aza_table: Option<Value>,
    /// Unknown keys, preserved round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl TabConfig {
    /// The tab group, defaulted.
    pub fn group_name(&self) -> &str {
        if self.group.is_empty() {
            OTHER_GROUP_NAME
        } else {
            &self.group
        }
    }

    /// The per-widget field specs: `SearchFields` when present, else the
    /// single `SearchField` (which may itself be the empty all-fields
    /// spec).
    pub fn field_specs(&self) -> Vec<FieldSpec> {
        if let Some(specs) = &self.search_fields {
            return specs.clone();
        }
        vec![self.search_field.clone().unwrap_or_default()]
    }
}

/// `skip_serializing_if` helper for defaulted booleans.
fn is_false(flag: &bool) -> bool {
    !*flag
}

/// Accepts a number or a numeric string; anything else becomes `None`.
/// The result is clamped to [-360, 360].
fn lenient_angle<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .map(|angle| angle.clamp(-360.0, 360.0)))
}

/// Accepts a positive number or numeric string; anything else is `None`.
fn lenient_scale<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(lenient_number)
        .filter(|scale| *scale > 0.0))
}

/// Reads a JSON number or a string that parses as one.
fn lenient_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

/// Reference to the layer a tab searches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "LayerType")]
pub enum LayerRef {
    /// A layer looked up by display name; several layers may share it.
    Name {
        /// The display name.
        #[serde(rename = "Name")]
        name: String,
    },
    /// A layer loaded from a file, resolved relative to the project.
    File {
        /// File path (absolute or project-relative).
        #[serde(rename = "Path")]
        path: String,
        /// Optional provider encoding.
        #[serde(rename = "Encoding", skip_serializing_if = "Option::is_none")]
        encoding: Option<String>,
    },
    /// A layer loaded from a database connection.
    Database {
        /// Server host.
        #[serde(rename = "Host", skip_serializing_if = "Option::is_none")]
        host: Option<String>,
        /// Server port.
        #[serde(rename = "Port", skip_serializing_if = "Option::is_none")]
        port: Option<String>,
        /// Database name.
        #[serde(rename = "Database", skip_serializing_if = "Option::is_none")]
        database: Option<String>,
        /// Login user.
        #[serde(rename = "User", skip_serializing_if = "Option::is_none")]
        user: Option<String>,
        /// Login password.
        #[serde(rename = "Password", skip_serializing_if = "Option::is_none")]
        password: Option<String>,
        /// Schema of the table.
        #[serde(rename = "Schema", skip_serializing_if = "Option::is_none")]
        schema: Option<String>,
        /// Table name.
        #[serde(rename = "Table", skip_serializing_if = "Option::is_none")]
        table: Option<String>,
        /// Geometry column.
        #[serde(rename = "Geometry", skip_serializing_if = "Option::is_none")]
        geometry: Option<String>,
        /// Key column.
        #[serde(rename = "Key", skip_serializing_if = "Option::is_none")]
        key: Option<String>,
        /// Provider kind (e.g. `postgres`).
        #[serde(rename = "DataType", skip_serializing_if = "Option::is_none")]
        data_type: Option<String>,
        /// Script run once against the connection before first use.
        #[serde(rename = "FormatSQL", skip_serializing_if = "Option::is_none")]
        format_sql: Option<String>,
    },
}

/// One search-field descriptor of a tab.
///
/// The empty spec (`{}`) and the `all: true` spec both mean "search every
/// field". A `ViewName` starting with [`OR_SEARCH_PREFIX`] marks an OR-list
/// whose `Field` holds comma-separated names.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    /// Concrete field name (or comma-separated names for an OR-list).
    #[serde(rename = "Field", skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// Label shown on the input widget.
    #[serde(rename = "ViewName", skip_serializing_if = "Option::is_none")]
    pub view_name: Option<String>,
    /// Declared field type, informational.
    #[serde(rename = "FieldType", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,
    /// Explicit all-fields marker.
    #[serde(rename = "all", skip_serializing_if = "Option::is_none")]
    pub all: Option<bool>,
    /// Fuzzy radius for numeric matching in the tiban tab.
    #[serde(rename = "Fuzzy", skip_serializing_if = "Option::is_none")]
    pub fuzzy: Option<u32>,
    /// Whether the owner search folds the halfwidth kana table.
    #[serde(rename = "KanaHankaku", skip_serializing_if = "Option::is_none")]
    pub kana_hankaku: Option<bool>,
    /// Unknown keys, preserved round-trip.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl FieldSpec {
    /// True when the spec requests an all-fields search: either the empty
    /// spec or an explicit `all: true`.
    pub fn is_all(&self) -> bool {
        if self.all == Some(true) {
            return true;
        }
        self.all.is_none()
            && self.field.is_none()
            && self.view_name.is_none()
            && self.field_type.is_none()
            && self.fuzzy.is_none()
            && self.kana_hankaku.is_none()
            && self.extra.is_empty()
    }

    /// The member field names of an OR-list spec, when this spec is one.
    ///
    /// The current form keeps comma-separated names in `Field`; the legacy
    /// form carried the member names as bare object keys instead.
    pub fn or_list(&self) -> Option<Vec<String>> {
        let view_name = self.view_name.as_deref()?;
        if !view_name.starts_with(OR_SEARCH_PREFIX) {
            return None;
        }
        if let Some(field) = self.field.as_deref() {
            let names: Vec<String> = field
                .split(',')
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string)
                .collect();
            if !names.is_empty() {
                return Some(names);
            }
        }
        Some(self.extra.keys().cloned().collect())
    }
}
