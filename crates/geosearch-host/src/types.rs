//! Host-side value types shared across the search core.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geometry::Rect;

/// Opaque identifier of a map layer, unique within a project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LayerId(pub String);

impl LayerId {
    /// Creates a layer id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The first `len` characters of the id, used to disambiguate
    /// same-named layers in result labels.
    pub fn short(&self, len: usize) -> &str {
        let end = self
            .0
            .char_indices()
            .nth(len)
            .map_or(self.0.len(), |(idx, _)| idx);
        &self.0[..end]
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A resolved layer reference: id plus display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerHandle {
    /// Project-wide layer id.
    pub id: LayerId,
    /// Layer display name (not unique).
    pub name: String,
}

/// Feature identifier within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub i64);

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Coarse attribute field type.
///
/// The search core only distinguishes text from numeric fields; everything
/// finer-grained stays on the host side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldType {
    /// String attribute.
    Text,
    /// Whole-number attribute.
    Integer,
    /// Floating-point attribute.
    Real,
}

impl FieldType {
    /// True for the non-text types.
    pub fn is_numeric(self) -> bool {
        !matches!(self, Self::Text)
    }
}

/// Definition of one attribute field of a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Provider field name.
    pub name: String,
    /// Optional display alias.
    pub alias: Option<String>,
    /// Coarse type.
    pub field_type: FieldType,
}

impl FieldDef {
    /// Creates a field definition without an alias.
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            alias: None,
            field_type,
        }
    }

    /// Sets the display alias.
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// The name shown to users: the alias when present, else the name.
    pub fn display_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }
}

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum AttrValue {
    /// Missing / NULL.
    Null,
    /// Text value.
    Text(String),
    /// Integer value.
    Integer(i64),
    /// Floating-point value.
    Real(f64),
}

impl AttrValue {
    /// The value rendered for display and for LIKE matching; `None` for
    /// NULL.
    pub fn render(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Text(text) => Some(text.clone()),
            Self::Integer(number) => Some(number.to_string()),
            Self::Real(number) => Some(number.to_string()),
        }
    }

    /// The value as a float when it is numeric.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Integer(number) => Some(*number as f64),
            Self::Real(number) => Some(*number),
            _ => None,
        }
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.render() {
            Some(text) => f.write_str(&text),
            None => f.write_str(""),
        }
    }
}

/// One feature of a vector layer: id, attributes in field order, and an
/// optional bounding box (features without geometry carry `None`).
#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    /// Feature id.
    pub id: FeatureId,
    /// Attribute values, parallel to the layer's field list.
    pub attrs: Vec<AttrValue>,
    /// Bounding box of the feature geometry in the layer CRS.
    pub bbox: Option<Rect>,
}

impl Feature {
    /// Creates a feature.
    pub fn new(id: i64, attrs: Vec<AttrValue>, bbox: Option<Rect>) -> Self {
        Self {
            id: FeatureId(id),
            attrs,
            bbox,
        }
    }
}

/// Path of a layer-tree node: the chain of group names from the root down
/// to (but excluding) the node itself.
pub type NodePath = Vec<String>;

/// A layer node in the layer tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerNode {
    /// The layer this node references.
    pub layer: LayerId,
    /// Checked visibility of the node itself.
    pub visible: bool,
    /// Ancestor group names, outermost first.
    pub groups: NodePath,
}

/// Kind of a legend entry, matching the host renderer families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LegendItemKind {
    /// Entry of a categorized renderer.
    Category,
    /// Class of a graduated renderer.
    Range,
    /// Rule of a rule-based renderer.
    Rule,
    /// The single entry of a single-symbol renderer.
    Single,
}

/// One checkable legend entry of a layer renderer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LegendItem {
    /// Position within the renderer.
    pub index: usize,
    /// Entry kind.
    pub kind: LegendItemKind,
    /// Display label.
    pub label: String,
    /// Render/check state; `None` when the host could not report it.
    pub visible: Option<bool>,
}

/// Structured per-item visibility of a layer's renderer legend.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LegendState {
    /// Renderer family name as reported by the host.
    pub renderer: Option<String>,
    /// Checkable entries in renderer order.
    pub items: Vec<LegendItem>,
}

impl LegendState {
    /// True when no renderer information was captured.
    pub fn is_empty(&self) -> bool {
        self.renderer.is_none() && self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_id_short() {
        let id = LayerId::new("parcels_20240101_abcdef");
        assert_eq!(id.short(8), "parcels_");
        assert_eq!(LayerId::new("ab").short(8), "ab");
    }

    #[test]
    fn test_field_display_name() {
        let plain = FieldDef::new("owner", FieldType::Text);
        assert_eq!(plain.display_name(), "owner");
        let aliased = plain.with_alias("所有者");
        assert_eq!(aliased.display_name(), "所有者");
    }

    #[test]
    fn test_attr_value_render() {
        assert_eq!(AttrValue::Null.render(), None);
        assert_eq!(AttrValue::Text("12-3".into()).render().unwrap(), "12-3");
        assert_eq!(AttrValue::Integer(42).render().unwrap(), "42");
    }

    #[test]
    fn test_attr_value_as_number() {
        assert_eq!(AttrValue::Integer(7).as_number(), Some(7.0));
        assert_eq!(AttrValue::Real(1.5).as_number(), Some(1.5));
        assert_eq!(AttrValue::Text("7".into()).as_number(), None);
    }
}
