//! The aza-code lookup table of the parcel-number tab.
//!
//! Aza codes come from an external table (historically a database); here
//! the origin is an opaque [`RowSource`]. The table renders rows for the
//! picker widget and hands the picked code back so it can be placed into
//! the first search input.

use geosearch_host::AttrValue;

/// Width integer codes are zero-padded to.
const CODE_WIDTH: usize = 5;

/// An opaque source of code-table rows.
pub trait RowSource {
    /// Column headers, in display order.
    fn columns(&self) -> Vec<String>;

    /// The table rows; cells are parallel to `columns`.
    fn rows(&self) -> Vec<Vec<AttrValue>>;
}

/// A fixed in-memory row source.
#[derive(Debug, Clone, Default)]
pub struct StaticRows {
    /// Column headers.
    pub columns: Vec<String>,
    /// Row data.
    pub rows: Vec<Vec<AttrValue>>,
}

impl RowSource for StaticRows {
    fn columns(&self) -> Vec<String> {
        self.columns.clone()
    }

    fn rows(&self) -> Vec<Vec<AttrValue>> {
        self.rows.clone()
    }
}

/// The rendered code table: headers plus display strings, with integer
/// codes zero-padded to five digits.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AzaCodeTable {
    /// Column headers.
    columns: Vec<String>,
    /// Rendered rows.
    rows: Vec<Vec<String>>,
}

impl AzaCodeTable {
    /// Renders a row source into display strings.
    pub fn from_source(source: &dyn RowSource) -> Self {
        let rows = source
            .rows()
            .into_iter()
            .map(|row| row.iter().map(render_cell).collect())
            .collect();
        Self {
            columns: source.columns(),
            rows,
        }
    }

    /// Column headers.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rendered rows.
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// The code a row selection feeds into the first search input: the
    /// row's first cell.
    pub fn code_for_row(&self, row: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|cells| cells.first())
            .map(String::as_str)
    }
}

/// Renders one cell; integers are zero-padded codes.
fn render_cell(value: &AttrValue) -> String {
    match value {
        AttrValue::Integer(code) => format!("{code:0width$}", width = CODE_WIDTH),
        other => other.render().unwrap_or_default(),
    }
}
