//! The result model behind the search-result dialog.
//!
//! Holds one tab per searched layer and exposes a paginated cell view. The
//! widget layer renders whatever this model reports; row selection and item
//! presses are forwarded back in as plain method calls.

use geosearch_host::{AttrValue, Feature, FeatureId, FieldDef, LayerHandle};

use crate::engine::ResultGroup;

/// How results are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DisplayMode {
    /// One row per feature, one column per view field.
    #[default]
    Table,
    /// A list of first-field values with a detail pane for the selection.
    Form,
}

/// One rendered cell: the display text plus the feature it belongs to, so
/// a click can be mapped back to the feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Rendered attribute value.
    pub text: String,
    /// Owning feature.
    pub feature_id: FeatureId,
}

/// One result tab: the features found on one layer.
#[derive(Debug, Clone)]
pub struct ResultTab {
    /// The layer searched.
    pub layer: LayerHandle,
    /// Tab label.
    pub label: String,
    /// Display columns, a subset of `layer_fields`.
    pub fields: Vec<FieldDef>,
    /// The layer's full field list; feature attributes are parallel to it.
    pub layer_fields: Vec<FieldDef>,
    /// All matching features, unpaginated.
    pub features: Vec<Feature>,
}

impl ResultTab {
    /// Renders one display field of one feature.
    fn render(&self, feature: &Feature, field: &FieldDef) -> String {
        self.layer_fields
            .iter()
            .position(|layer_field| layer_field.name == field.name)
            .and_then(|index| feature.attrs.get(index))
            .and_then(AttrValue::render)
            .unwrap_or_default()
    }
}

/// Paginated, tabbed search results.
#[derive(Debug)]
pub struct ResultModel {
    /// Rows per page; constant for the model's lifetime.
    page_limit: usize,
    /// One tab per layer with hits.
    tabs: Vec<ResultTab>,
    /// Index of the visible tab.
    current: usize,
    /// Current page, 1-based.
    page: usize,
    /// Rendering mode.
    mode: DisplayMode,
    /// Selected features on the visible tab.
    selected: Vec<FeatureId>,
}

impl ResultModel {
    /// Creates an empty model with the given page size.
    pub fn new(page_limit: usize) -> Self {
        Self {
            page_limit: page_limit.max(1),
            tabs: Vec::new(),
            current: 0,
            page: 1,
            mode: DisplayMode::default(),
            selected: Vec::new(),
        }
    }

    /// The configured page size.
    pub fn page_limit(&self) -> usize {
        self.page_limit
    }

    /// Replaces the tabs with fresh search results and resets tab, page
    /// and selection.
    pub fn set_groups(&mut self, groups: Vec<ResultGroup>) {
        self.tabs = groups
            .into_iter()
            .map(|group| ResultTab {
                layer: group.layer,
                label: group.label,
                fields: group.fields,
                layer_fields: group.layer_fields,
                features: group.features,
            })
            .collect();
        self.current = 0;
        self.page = 1;
        self.selected.clear();
    }

    /// Clears all results.
    pub fn clear(&mut self) {
        self.tabs.clear();
        self.current = 0;
        self.page = 1;
        self.selected.clear();
    }

    /// All tabs.
    pub fn tabs(&self) -> &[ResultTab] {
        &self.tabs
    }

    /// Total number of features across every tab (the dialog title count).
    pub fn total_count(&self) -> usize {
        self.tabs.iter().map(|tab| tab.features.len()).sum()
    }

    /// The visible tab.
    pub fn current_tab(&self) -> Option<&ResultTab> {
        self.tabs.get(self.current)
    }

    /// Switches tabs; the page resets to 1 and the selection clears.
    pub fn set_current_tab(&mut self, index: usize) {
        if index < self.tabs.len() {
            self.current = index;
            self.page = 1;
            self.selected.clear();
        }
    }

    /// The current page, 1-based.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Number of pages on the visible tab, at least 1.
    pub fn page_count(&self) -> usize {
        let features = self.current_tab().map_or(0, |tab| tab.features.len());
        features.div_ceil(self.page_limit).max(1)
    }

    /// Moves to a page, clamped into `[1, page_count]`.
    pub fn set_page(&mut self, page: usize) {
        self.page = page.clamp(1, self.page_count());
    }

    /// The rendering mode.
    pub fn display_mode(&self) -> DisplayMode {
        self.mode
    }

    /// Switches between table and form rendering; the underlying tabs are
    /// unchanged.
    pub fn set_display_mode(&mut self, mode: DisplayMode) {
        self.mode = mode;
    }

    /// The features of the visible tab's current page window
    /// `[(page-1)·limit, page·limit)`.
    fn page_features(&self) -> &[Feature] {
        let Some(tab) = self.current_tab() else {
            return &[];
        };
        let start = (self.page - 1) * self.page_limit;
        if start >= tab.features.len() {
            return &[];
        }
        let end = (start + self.page_limit).min(tab.features.len());
        &tab.features[start..end]
    }

    /// The table rows of the current page: one row per feature, one cell
    /// per view field, each cell carrying its feature id. The row count is
    /// `min(remaining, page_limit)`.
    pub fn page_rows(&self) -> Vec<Vec<Cell>> {
        let Some(tab) = self.current_tab() else {
            return Vec::new();
        };
        self.page_features()
            .iter()
            .map(|feature| {
                tab.fields
                    .iter()
                    .map(|field| Cell {
                        text: tab.render(feature, field),
                        feature_id: feature.id,
                    })
                    .collect()
            })
            .collect()
    }

    /// Absolute 1-based feature indices of the current page, used as
    /// vertical header labels.
    pub fn row_labels(&self) -> Vec<usize> {
        let start = (self.page - 1) * self.page_limit;
        (0..self.page_features().len())
            .map(|offset| start + offset + 1)
            .collect()
    }

    /// Form-mode left list: the first view field's value per feature of
    /// the current page.
    pub fn form_list(&self) -> Vec<Cell> {
        self.page_rows()
            .into_iter()
            .filter_map(|row| row.into_iter().next())
            .collect()
    }

    /// Form-mode detail pane: every (display name, value) pair of one
    /// feature, over the layer's full field list.
    pub fn form_detail(&self, feature_id: FeatureId) -> Vec<(String, String)> {
        let Some(tab) = self.current_tab() else {
            return Vec::new();
        };
        let Some(feature) = tab.features.iter().find(|feature| feature.id == feature_id)
        else {
            return Vec::new();
        };
        tab.layer_fields
            .iter()
            .zip(&feature.attrs)
            .map(|(field, value)| {
                (
                    field.display_name().to_string(),
                    value.render().unwrap_or_default(),
                )
            })
            .collect()
    }

    /// The feature id behind a page-relative row.
    pub fn feature_id_at(&self, row: usize) -> Option<FeatureId> {
        self.page_features().get(row).map(|feature| feature.id)
    }

    /// Records a row selection (rows are page-relative) and returns the
    /// selected feature ids.
    pub fn select_rows(&mut self, rows: &[usize]) -> Vec<FeatureId> {
        let ids: Vec<FeatureId> = rows
            .iter()
            .filter_map(|&row| self.feature_id_at(row))
            .collect();
        self.selected = ids.clone();
        ids
    }

    /// The selection on the visible tab.
    pub fn selected_ids(&self) -> &[FeatureId] {
        &self.selected
    }
}

#[cfg(test)]
mod tests {
    use geosearch_host::{FieldType, LayerId};

    use super::*;

    /// A group with `count` numbered features over an id + name schema.
    fn group(label: &str, count: i64) -> ResultGroup {
        let layer_fields = vec![
            FieldDef::new("id", FieldType::Integer),
            FieldDef::new("name", FieldType::Text).with_alias("名称"),
        ];
        ResultGroup {
            layer: LayerHandle {
                id: LayerId::new(format!("{label}_layer")),
                name: label.to_string(),
            },
            label: label.to_string(),
            fields: layer_fields.clone(),
            layer_fields,
            features: (1..=count)
                .map(|seq| {
                    Feature::new(
                        seq,
                        vec![
                            AttrValue::Integer(seq),
                            AttrValue::Text(format!("feature-{seq}")),
                        ],
                        None,
                    )
                })
                .collect(),
        }
    }

    #[test]
    fn test_pagination_window() {
        let mut model = ResultModel::new(3);
        model.set_groups(vec![group("a", 8)]);

        assert_eq!(model.page_count(), 3);
        assert_eq!(model.page_rows().len(), 3);
        assert_eq!(model.row_labels(), vec![1, 2, 3]);

        model.set_page(3);
        // Last page holds the remainder.
        assert_eq!(model.page_rows().len(), 2);
        assert_eq!(model.row_labels(), vec![7, 8]);
        assert_eq!(model.page_rows()[0][1].text, "feature-7");
    }

    #[test]
    fn test_page_clamped() {
        let mut model = ResultModel::new(3);
        model.set_groups(vec![group("a", 8)]);
        model.set_page(99);
        assert_eq!(model.page(), 3);
        model.set_page(0);
        assert_eq!(model.page(), 1);
    }

    #[test]
    fn test_page_limit_larger_than_results() {
        let mut model = ResultModel::new(100);
        model.set_groups(vec![group("a", 8)]);
        assert_eq!(model.page_count(), 1);
        assert_eq!(model.page_rows().len(), 8);
    }

    #[test]
    fn test_tab_change_resets_page() {
        let mut model = ResultModel::new(3);
        model.set_groups(vec![group("a", 8), group("b", 4)]);
        model.set_page(2);
        model.set_current_tab(1);
        assert_eq!(model.page(), 1);
        assert_eq!(model.current_tab().unwrap().label, "b");
    }

    #[test]
    fn test_cells_carry_feature_ids() {
        let mut model = ResultModel::new(10);
        model.set_groups(vec![group("a", 2)]);
        let rows = model.page_rows();
        assert_eq!(rows[1][0].feature_id, FeatureId(2));
        assert_eq!(model.feature_id_at(1), Some(FeatureId(2)));
    }

    #[test]
    fn test_select_rows() {
        let mut model = ResultModel::new(10);
        model.set_groups(vec![group("a", 3)]);
        let ids = model.select_rows(&[0, 2, 99]);
        assert_eq!(ids, vec![FeatureId(1), FeatureId(3)]);
        assert_eq!(model.selected_ids(), &[FeatureId(1), FeatureId(3)]);
    }

    #[test]
    fn test_total_count_and_title() {
        let mut model = ResultModel::new(10);
        model.set_groups(vec![group("a", 3), group("b", 4)]);
        assert_eq!(model.total_count(), 7);
    }

    #[test]
    fn test_form_mode_views() {
        let mut model = ResultModel::new(10);
        model.set_groups(vec![group("a", 2)]);
        model.set_display_mode(DisplayMode::Form);

        let list = model.form_list();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].text, "1");

        let detail = model.form_detail(FeatureId(2));
        assert_eq!(
            detail,
            vec![
                ("id".to_string(), "2".to_string()),
                ("名称".to_string(), "feature-2".to_string()),
            ]
        );
    }

    #[test]
    fn test_display_subset_renders_correct_columns() {
        let mut wide = group("a", 1);
        // Display only the second layer field.
        wide.fields = vec![wide.layer_fields[1].clone()];
        let mut model = ResultModel::new(10);
        model.set_groups(vec![wide]);
        let rows = model.page_rows();
        assert_eq!(rows[0].len(), 1);
        assert_eq!(rows[0][0].text, "feature-1");
    }
}
