//! Data tables: a typed model of `table.data-table` rows, sorting and filtering.
//!
//! The model is built once when the table is bound, from the header labels and the rendered
//! cells. Badge and avatar cells get their own variants so that actions can read and update them
//! without re-parsing the markup.

use std::cmp::Ordering;

use anyhow::Result;
use chrono::NaiveDate;
use ego_tree::NodeId;
use itertools::Itertools;
use log::debug;

use crate::dom::{escape_html, Document};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortType {
    Number,
    Date,
    Text,
}

impl SortType {
    pub fn parse(value: &str) -> SortType {
        match value {
            "number" => SortType::Number,
            "date" => SortType::Date,
            _ => SortType::Text,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CellValue {
    Text(String),
    /// A status badge, with its variant (the `badge-<kind>` class)
    Badge { label: String, kind: String },
    /// A person or company shown with an avatar
    Avatar { name: String },
    /// The row action buttons
    Actions,
}

impl CellValue {
    /// Text shown for the cell in detail views.
    pub fn display(&self) -> &str {
        match self {
            CellValue::Text(text) => text,
            CellValue::Badge { label, .. } => label,
            CellValue::Avatar { name } => name,
            CellValue::Actions => "",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Cell {
    pub node: NodeId,
    pub value: CellValue,
}

#[derive(Debug, Clone)]
pub struct Row {
    pub node: NodeId,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone)]
pub struct Column {
    pub header: NodeId,
    pub label: String,
    pub sort: Option<SortType>,
}

#[derive(Debug)]
pub struct DataTable {
    pub node: NodeId,
    /// The table's `id` attribute, used by search and filter inputs
    pub id: Option<String>,
    pub sortable: bool,
    tbody: Option<NodeId>,
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
}

impl DataTable {
    pub fn bind_all(doc: &mut Document) -> Result<Vec<DataTable>> {
        let mut tables = Vec::new();
        for node in doc.select_all("table.data-table")? {
            tables.push(DataTable::bind(doc, node)?);
        }
        Ok(tables)
    }

    pub fn bind(doc: &mut Document, node: NodeId) -> Result<DataTable> {
        let sortable = doc.has_attr(node, "data-sortable");

        let mut columns = Vec::new();
        for th in doc.select_within(node, "thead th")? {
            let sort = doc.attr(th, "data-sort").map(SortType::parse).filter(|_| sortable);
            if sort.is_some() {
                doc.set_style(th, "cursor", "pointer");
            }
            columns.push(Column { header: th, label: doc.clean_text(th), sort });
        }

        let tbody = doc.select_first_within(node, "tbody")?;
        let mut rows = Vec::new();
        if let Some(tbody) = tbody {
            for tr in doc.children(tbody) {
                rows.push(parse_row(doc, tr)?);
            }
        }

        debug!("Bound table {:?} with {} columns and {} rows", doc.attr(node, "id"), columns.len(), rows.len());
        Ok(DataTable {
            node,
            id: doc.attr(node, "id").map(str::to_string),
            sortable,
            tbody,
            columns,
            rows,
        })
    }

    pub fn row_index(&self, node: NodeId) -> Option<usize> {
        self.rows.iter().position(|r| r.node == node)
    }

    pub fn column_of(&self, header: NodeId) -> Option<usize> {
        self.columns.iter().position(|c| c.header == header)
    }

    /// Header label / cell value pairs, skipping the actions column.
    pub fn record(&self, row: usize) -> Vec<(String, String)> {
        let row = match self.rows.get(row) {
            Some(row) => row,
            None => return Vec::new(),
        };
        row.cells.iter().enumerate()
            .filter(|(_, cell)| cell.value != CellValue::Actions)
            .map(|(i, cell)| {
                let label = self.columns.get(i)
                    .map(|c| c.label.clone())
                    .unwrap_or_else(|| format!("Column {}", i + 1));
                (label, cell.value.display().to_string())
            })
            .collect()
    }

    /// The status badge of a row: the badge under a "Status" header, or else the first badge.
    pub fn status_cell(&self, row: usize) -> Option<usize> {
        let cells = &self.rows.get(row)?.cells;
        let is_badge = |i: &usize| matches!(cells[*i].value, CellValue::Badge { .. });

        let by_header = self.columns.iter()
            .position(|c| c.label.eq_ignore_ascii_case("status"))
            .filter(|i| *i < cells.len() && is_badge(i));
        by_header.or_else(|| (0..cells.len()).find(is_badge))
    }

    /// Replaces a badge cell's label and variant, re-rendering it.
    pub fn set_badge(&mut self, doc: &mut Document, row: usize, cell: usize, label: &str, kind: &str) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.cells.get_mut(cell)) {
            cell.value = CellValue::Badge { label: label.to_string(), kind: kind.to_string() };
            doc.set_inner_html(cell.node, &format!(
                r#"<span class="badge badge-{}">{}</span>"#, escape_html(kind), escape_html(label)
            ));
        }
    }

    pub fn remove_row(&mut self, doc: &mut Document, node: NodeId) -> bool {
        match self.row_index(node) {
            Some(i) => {
                self.rows.remove(i);
                doc.detach(node);
                true
            }
            None => false,
        }
    }

    //----- Sorting

    pub fn sort_order(&self, doc: &Document, column: usize) -> Option<SortOrder> {
        let header = self.columns.get(column)?.header;
        if doc.has_class(header, "sort-asc") {
            Some(SortOrder::Asc)
        } else if doc.has_class(header, "sort-desc") {
            Some(SortOrder::Desc)
        } else {
            None
        }
    }

    /// Header click: sorts ascending, or descending if the column is already sorted ascending.
    pub fn toggle_sort(&mut self, doc: &mut Document, column: usize) -> Option<SortOrder> {
        let sort_type = self.columns.get(column)?.sort?;
        let order = match self.sort_order(doc, column) {
            Some(SortOrder::Asc) => SortOrder::Desc,
            _ => SortOrder::Asc,
        };
        self.sort(doc, column, sort_type, order);
        Some(order)
    }

    /// Reorders the rows. Descending order is the exact reverse of ascending order, and cells
    /// are left untouched.
    pub fn sort(&mut self, doc: &mut Document, column: usize, sort_type: SortType, order: SortOrder) {
        for c in &self.columns {
            doc.remove_class(c.header, "sort-asc");
            doc.remove_class(c.header, "sort-desc");
        }
        if let Some(c) = self.columns.get(column) {
            doc.add_class(c.header, match order {
                SortOrder::Asc => "sort-asc",
                SortOrder::Desc => "sort-desc",
            });
        }

        let keys = self.rows.iter()
            .map(|row| {
                let text = row.cells.get(column).map(|c| doc.clean_text(c.node)).unwrap_or_default();
                SortKey::new(sort_type, &text)
            })
            .collect::<Vec<_>>();

        let mut order_idx = (0..self.rows.len())
            .sorted_by(|a, b| keys[*a].cmp(&keys[*b]))
            .collect::<Vec<_>>();
        if order == SortOrder::Desc {
            order_idx.reverse();
        }

        let mut rows = std::mem::take(&mut self.rows).into_iter().map(Some).collect::<Vec<_>>();
        self.rows = order_idx.into_iter().filter_map(|i| rows[i].take()).collect();

        if let Some(tbody) = self.tbody {
            for row in &self.rows {
                doc.append_child(tbody, row.node);
            }
        }
    }

    //----- Filtering

    /// Hides rows whose text doesn't contain `term`. An empty term or "all" shows every row.
    pub fn filter(&self, doc: &mut Document, term: &str) -> usize {
        let term = term.trim().to_lowercase();
        let show_all = term.is_empty() || term == "all";
        let mut visible = 0;
        for row in &self.rows {
            let matches = show_all || doc.text(row.node).to_lowercase().contains(&term);
            if matches {
                doc.remove_style(row.node, "display");
                visible += 1;
            } else {
                doc.set_style(row.node, "display", "none");
            }
        }
        visible
    }

    pub fn visible_rows(&self, doc: &Document) -> Vec<NodeId> {
        self.rows.iter()
            .filter(|r| doc.style(r.node, "display").as_deref() != Some("none"))
            .map(|r| r.node)
            .collect()
    }
}

fn parse_row(doc: &Document, tr: NodeId) -> Result<Row> {
    let mut cells = Vec::new();
    for td in doc.children(tr) {
        cells.push(Cell { node: td, value: parse_cell(doc, td)? });
    }
    Ok(Row { node: tr, cells })
}

fn parse_cell(doc: &Document, td: NodeId) -> Result<CellValue> {
    if doc.select_first_within(td, "[data-action]")?.is_some() {
        return Ok(CellValue::Actions);
    }

    if let Some(badge) = doc.select_first_within(td, ".badge")? {
        let kind = doc.classes(badge).into_iter()
            .find_map(|c| c.strip_prefix("badge-"))
            .unwrap_or("default")
            .to_string();
        return Ok(CellValue::Badge { label: doc.clean_text(badge), kind });
    }

    if let Some(avatar) = doc.select_first_within(td, ".user-avatar, .avatar, img")? {
        // The name is whatever text isn't part of the avatar (initials)
        let avatar_text = doc.clean_text(avatar);
        let full = doc.clean_text(td);
        let name = full.strip_prefix(&avatar_text).unwrap_or(&full).trim().to_string();
        return Ok(CellValue::Avatar { name });
    }

    Ok(CellValue::Text(doc.clean_text(td)))
}

/// Comparable form of a cell. Values that can't be parsed sort first.
#[derive(Debug, Clone, PartialEq)]
enum SortKey {
    Number(Option<f64>),
    Date(Option<NaiveDate>),
    Text(String),
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%b %d, %Y", "%B %d, %Y", "%m/%d/%Y", "%d %b %Y"];

impl SortKey {
    fn new(sort_type: SortType, text: &str) -> SortKey {
        match sort_type {
            SortType::Number => SortKey::Number(parse_number(text)),
            SortType::Date => SortKey::Date(parse_date(text)),
            SortType::Text => SortKey::Text(text.to_lowercase()),
        }
    }

    fn cmp(&self, other: &SortKey) -> Ordering {
        match (self, other) {
            (SortKey::Number(a), SortKey::Number(b)) => match (a, b) {
                (Some(a), Some(b)) => a.partial_cmp(b).unwrap_or(Ordering::Equal),
                (a, b) => a.is_some().cmp(&b.is_some()),
            },
            (SortKey::Date(a), SortKey::Date(b)) => a.cmp(b),
            (SortKey::Text(a), SortKey::Text(b)) => a.cmp(b),
            _ => Ordering::Equal,
        }
    }
}

/// Parses numbers as displayed, e.g. "$12,500.00" or "98%".
pub fn parse_number(text: &str) -> Option<f64> {
    let cleaned = text.chars()
        .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
        .collect::<String>();
    cleaned.parse::<f64>().ok()
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    DATE_FORMATS.iter().find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
}

#[cfg(test)]
mod test {
    use super::*;

    const TABLE: &str = r#"<html><body>
        <table class="data-table" id="orders" data-sortable>
          <thead><tr>
            <th data-sort="text">Client</th><th data-sort="number">Amount</th>
            <th data-sort="date">Date</th><th>Status</th><th>Actions</th>
          </tr></thead>
          <tbody>
            <tr id="r1"><td><div class="user-avatar">GC</div><span>Gulf Coast Energy</span></td><td>$12,500</td>
                <td>Jan 15, 2026</td><td><span class="badge badge-warning">Pending</span></td>
                <td><button data-action="view">View</button></td></tr>
            <tr id="r2"><td>apex Pipelines</td><td>$9,800</td><td>Dec 02, 2025</td>
                <td><span class="badge badge-success">Completed</span></td><td><button data-action="view">View</button></td></tr>
            <tr id="r3"><td>Midwest Gas</td><td>$31,000</td><td>Feb 20, 2026</td>
                <td><span class="badge badge-info">In Progress</span></td><td><button data-action="view">View</button></td></tr>
          </tbody>
        </table></body></html>"#;

    fn ids(doc: &Document, table: &DataTable) -> Vec<String> {
        let tbody = table.tbody.unwrap();
        let dom_order = doc.children(tbody).into_iter()
            .map(|r| doc.attr(r, "id").unwrap().to_string())
            .collect::<Vec<_>>();
        let model_order = table.rows.iter()
            .map(|r| doc.attr(r.node, "id").unwrap().to_string())
            .collect::<Vec<_>>();
        assert_eq!(dom_order, model_order);
        dom_order
    }

    #[test]
    fn test_typed_rows() -> Result<()> {
        let mut doc = Document::parse(TABLE);
        let tables = DataTable::bind_all(&mut doc)?;
        let table = &tables[0];

        assert_eq!(Some("orders".to_string()), table.id);
        assert_eq!(CellValue::Avatar { name: "Gulf Coast Energy".to_string() }, table.rows[0].cells[0].value);
        assert_eq!(CellValue::Badge { label: "Pending".to_string(), kind: "warning".to_string() }, table.rows[0].cells[3].value);
        assert_eq!(CellValue::Actions, table.rows[0].cells[4].value);
        assert_eq!(Some(3), table.status_cell(0));

        assert_eq!(vec![
            ("Client".to_string(), "Gulf Coast Energy".to_string()),
            ("Amount".to_string(), "$12,500".to_string()),
            ("Date".to_string(), "Jan 15, 2026".to_string()),
            ("Status".to_string(), "Pending".to_string()),
        ], table.record(0));
        Ok(())
    }

    #[test]
    fn test_sort_by_type() -> Result<()> {
        let mut doc = Document::parse(TABLE);
        let mut table = DataTable::bind_all(&mut doc)?.remove(0);

        assert_eq!(Some(SortOrder::Asc), table.toggle_sort(&mut doc, 1));
        assert_eq!(vec!["r2", "r1", "r3"], ids(&doc, &table));

        table.toggle_sort(&mut doc, 2);
        assert_eq!(vec!["r2", "r1", "r3"], ids(&doc, &table));
        assert_eq!(None, table.sort_order(&doc, 1));

        // Text is case-insensitive
        table.toggle_sort(&mut doc, 0);
        assert_eq!(vec!["r2", "r1", "r3"], ids(&doc, &table));

        // Unsortable column
        assert_eq!(None, table.toggle_sort(&mut doc, 3));
        Ok(())
    }

    #[test]
    fn test_filter() -> Result<()> {
        let mut doc = Document::parse(TABLE);
        let table = DataTable::bind_all(&mut doc)?.remove(0);

        assert_eq!(1, table.filter(&mut doc, "MIDWEST"));
        assert_eq!(1, table.visible_rows(&doc).len());
        assert_eq!(3, table.filter(&mut doc, "all"));
        assert_eq!(3, table.filter(&mut doc, ""));
        Ok(())
    }

    #[test]
    fn test_parsers() {
        assert_eq!(Some(12500.0), parse_number("$12,500"));
        assert_eq!(Some(98.5), parse_number("98.5%"));
        assert_eq!(None, parse_number("n/a"));
        assert_eq!(NaiveDate::from_ymd_opt(2026, 1, 15), parse_date("2026-01-15"));
        assert_eq!(NaiveDate::from_ymd_opt(2026, 1, 15), parse_date("January 15, 2026"));
        assert_eq!(NaiveDate::from_ymd_opt(2026, 1, 15), parse_date("01/15/2026"));
    }
}
