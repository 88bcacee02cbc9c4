//! Paginated, sortable tables.
//!
//! A [`TableWidget`] owns one result set; the [`TableRegistry`] keeps at most
//! one widget per [`TableId`] and has to be told to destroy the old one before
//! a new one is created under the same id.

use std::{cmp::Ordering, collections::HashMap, ops::Range};

use derive_builder::Builder;
use serde_json::Value;

use crate::{
    data::{cell_text, ColumnDef, TablePayload},
    error::ClientError,
};

static NULL: Value = Value::Null;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TableId {
    Restnames,
    Menu,
}

impl TableId {
    pub fn as_str(&self) -> &'static str {
        match self {
            TableId::Restnames => "restnames",
            TableId::Menu => "menu",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "restnames" => Some(TableId::Restnames),
            "menu" => Some(TableId::Menu),
            _ => None,
        }
    }

    /// Element id of the table in the rendered page.
    pub fn container(&self) -> String {
        format!("table-{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "asc" => Some(SortDirection::Ascending),
            "desc" => Some(SortDirection::Descending),
            _ => None,
        }
    }
}

/// Presentation settings of a table. The pager is always the simple
/// previous/next kind.
#[derive(Debug, Clone, PartialEq, Eq, Builder)]
#[builder(default)]
pub struct TableOptions {
    pub order_column: usize,
    pub order_direction: SortDirection,
    pub paging: bool,
    pub page_length: usize,
    /// Free text filter box.
    pub filter: bool,
    /// "Showing x to y of z" summary.
    pub info: bool,
    #[builder(setter(into))]
    pub hidden_columns: Vec<usize>,
    /// Class applied to the highlighted row.
    #[builder(setter(into))]
    pub selected_class: String,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            order_column: 0,
            order_direction: SortDirection::Descending,
            paging: true,
            page_length: 10,
            filter: false,
            info: false,
            hidden_columns: vec![0],
            selected_class: "table-active".to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableWidget {
    id: TableId,
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<Value>>,
    options: TableOptions,
    // data indices in display order
    order: Vec<usize>,
    sort: (usize, SortDirection),
    page: usize,
    selected: Option<usize>,
}

impl TableWidget {
    pub fn new(id: TableId, payload: TablePayload, options: TableOptions) -> Self {
        let sort = (options.order_column, options.order_direction);
        let mut widget = Self {
            id,
            columns: payload.coldefs,
            order: (0..payload.data.len()).collect(),
            rows: payload.data,
            options,
            sort,
            page: 0,
            selected: None,
        };
        widget.sort_by(sort.0, sort.1);
        widget
    }

    pub fn id(&self) -> TableId {
        self.id
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn options(&self) -> &TableOptions {
        &self.options
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn sort(&self) -> (usize, SortDirection) {
        self.sort
    }

    pub fn sort_by(&mut self, column: usize, direction: SortDirection) {
        let rows = &self.rows;
        self.order.sort_by(|&a, &b| {
            let ordering = compare_cells(cell(&rows[a], column), cell(&rows[b], column));
            match direction {
                SortDirection::Ascending => ordering,
                SortDirection::Descending => ordering.reverse(),
            }
        });
        self.sort = (column, direction);
        self.page = 0;
    }

    pub fn is_hidden(&self, column: usize) -> bool {
        self.options.hidden_columns.contains(&column)
    }

    /// Columns that are displayed, with their index into the row data.
    pub fn visible_columns(&self) -> Vec<(usize, &ColumnDef)> {
        self.columns
            .iter()
            .enumerate()
            .filter(|(i, _)| !self.is_hidden(*i))
            .collect()
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn page_count(&self) -> usize {
        if !self.options.paging || self.rows.is_empty() {
            return 1;
        }
        let length = self.options.page_length.max(1);
        self.rows.len().div_ceil(length)
    }

    pub fn next_page(&mut self) -> bool {
        if self.page + 1 < self.page_count() {
            self.page += 1;
            true
        } else {
            false
        }
    }

    pub fn previous_page(&mut self) -> bool {
        if self.page > 0 {
            self.page -= 1;
            true
        } else {
            false
        }
    }

    fn page_range(&self) -> Range<usize> {
        if !self.options.paging {
            return 0..self.order.len();
        }
        let length = self.options.page_length.max(1);
        let start = self.page.saturating_mul(length).min(self.order.len());
        start..start.saturating_add(length).min(self.order.len())
    }

    /// Rows of the current page in display order, with their data index.
    pub fn page_rows(&self) -> impl Iterator<Item = (usize, &[Value])> + '_ {
        self.order[self.page_range()]
            .iter()
            .map(move |&i| (i, self.rows[i].as_slice()))
    }

    /// Every row in display order, ignoring pagination.
    pub fn ordered_rows(&self) -> impl Iterator<Item = &[Value]> + '_ {
        self.order.iter().map(move |&i| self.rows[i].as_slice())
    }

    /// Row at `position` (0-based) on the current page.
    pub fn row_at(&self, position: usize) -> Option<(usize, &[Value])> {
        self.page_rows().nth(position)
    }

    /// Highlights the row at `position` on the current page, dropping any
    /// previous highlight, and returns its full data.
    pub fn select(&mut self, position: usize) -> Result<&[Value], ClientError> {
        let (index, _) = self
            .row_at(position)
            .ok_or(ClientError::RowOutOfRange(position))?;
        self.selected = Some(index);
        Ok(&self.rows[index])
    }

    /// Data index of the highlighted row.
    pub fn selected(&self) -> Option<usize> {
        self.selected
    }
}

fn cell(row: &[Value], column: usize) -> &Value {
    row.get(column).unwrap_or(&NULL)
}

/// Display text of a cell; null shows as empty.
pub fn cell_display(value: &Value) -> String {
    match value {
        Value::Array(_) | Value::Object(_) => value.to_string(),
        _ => cell_text(value).unwrap_or_default(),
    }
}

fn compare_cells(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Null, _) => Ordering::Less,
        (_, Value::Null) => Ordering::Greater,
        (Value::Number(x), Value::Number(y)) => {
            let x = x.as_f64().unwrap_or_default();
            let y = y.as_f64().unwrap_or_default();
            x.total_cmp(&y)
        }
        _ => cell_display(a).cmp(&cell_display(b)),
    }
}

#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: HashMap<TableId, TableWidget>,
}

impl TableRegistry {
    pub fn contains(&self, id: TableId) -> bool {
        self.tables.contains_key(&id)
    }

    pub fn create(
        &mut self,
        id: TableId,
        payload: TablePayload,
        options: TableOptions,
    ) -> Result<&mut TableWidget, ClientError> {
        if self.contains(id) {
            return Err(ClientError::TableExists(id.as_str()));
        }
        Ok(self
            .tables
            .entry(id)
            .or_insert_with(|| TableWidget::new(id, payload, options)))
    }

    pub fn destroy(&mut self, id: TableId) -> Result<TableWidget, ClientError> {
        self.tables
            .remove(&id)
            .ok_or(ClientError::TableNotFound(id.as_str()))
    }

    pub fn get(&self, id: TableId) -> Option<&TableWidget> {
        self.tables.get(&id)
    }

    pub fn get_mut(&mut self, id: TableId) -> Option<&mut TableWidget> {
        self.tables.get_mut(&id)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(rows: Vec<Vec<Value>>) -> TablePayload {
        TablePayload {
            data: rows,
            coldefs: ["business_id", "name", "rating"].map(ColumnDef::new).to_vec(),
        }
    }

    fn names(widget: &TableWidget) -> Vec<String> {
        widget
            .page_rows()
            .map(|(_, row)| cell_display(&row[1]))
            .collect()
    }

    #[test]
    fn builder_fills_the_rest_from_defaults() {
        let options = TableOptionsBuilder::default()
            .order_column(2usize)
            .page_length(5usize)
            .build()
            .unwrap();

        assert_eq!(options.order_column, 2);
        assert_eq!(options.order_direction, SortDirection::Descending);
        assert_eq!(options.hidden_columns, vec![0]);
        assert!(options.paging);
        assert!(!options.filter);
        assert!(!options.info);
    }

    #[test]
    fn initial_order_is_descending_with_nulls_last() {
        let widget = TableWidget::new(
            TableId::Restnames,
            payload(vec![
                vec![json!("a"), json!("Low"), json!(2.5)],
                vec![json!("b"), json!("Unknown"), Value::Null],
                vec![json!("c"), json!("High"), json!(4.75)],
            ]),
            TableOptionsBuilder::default().order_column(2usize).build().unwrap(),
        );

        assert_eq!(names(&widget), vec!["High", "Low", "Unknown"]);
    }

    #[test]
    fn numbers_sort_numerically_and_text_lexically() {
        let mut widget = TableWidget::new(
            TableId::Menu,
            payload(vec![
                vec![json!(0), json!("b"), json!(9)],
                vec![json!(0), json!("c"), json!(10)],
                vec![json!(0), json!("a"), json!(100)],
            ]),
            TableOptions::default(),
        );

        widget.sort_by(2, SortDirection::Ascending);
        assert_eq!(names(&widget), vec!["b", "c", "a"]);

        widget.sort_by(1, SortDirection::Ascending);
        assert_eq!(names(&widget), vec!["a", "b", "c"]);
    }

    #[test]
    fn first_column_is_hidden() {
        let widget = TableWidget::new(TableId::Restnames, payload(vec![]), TableOptions::default());
        let titles: Vec<_> = widget
            .visible_columns()
            .into_iter()
            .map(|(i, c)| (i, c.title.as_str()))
            .collect();
        assert_eq!(titles, vec![(1, "name"), (2, "rating")]);
        assert_eq!(widget.page_count(), 1);
    }

    #[test]
    fn simple_pager_walks_pages() {
        let rows = (0..5)
            .map(|i| vec![json!(i), json!(format!("r{i}")), json!(i)])
            .collect();
        let mut widget = TableWidget::new(
            TableId::Restnames,
            payload(rows),
            TableOptionsBuilder::default()
                .order_column(2usize)
                .page_length(2usize)
                .build()
                .unwrap(),
        );

        assert_eq!(widget.page_count(), 3);
        assert_eq!(names(&widget), vec!["r4", "r3"]);
        assert!(!widget.previous_page());
        assert!(widget.next_page());
        assert!(widget.next_page());
        assert_eq!(names(&widget), vec!["r0"]);
        assert!(!widget.next_page());

        widget.sort_by(2, SortDirection::Ascending);
        assert_eq!(widget.page(), 0);
    }

    #[test]
    fn huge_page_length_shows_everything_on_one_page() {
        let mut widget = TableWidget::new(
            TableId::Restnames,
            payload(vec![
                vec![json!("a"), json!("A"), json!(1)],
                vec![json!("b"), json!("B"), json!(2)],
            ]),
            TableOptionsBuilder::default()
                .order_column(2usize)
                .page_length(usize::MAX)
                .build()
                .unwrap(),
        );

        assert_eq!(widget.page_count(), 1);
        assert_eq!(names(&widget), vec!["B", "A"]);
        assert!(!widget.next_page());
        assert_eq!(widget.row_at(1).unwrap().0, 0);
    }

    #[test]
    fn selecting_moves_the_highlight() {
        let mut widget = TableWidget::new(
            TableId::Restnames,
            payload(vec![
                vec![json!("a"), json!("A"), json!(1)],
                vec![json!("b"), json!("B"), json!(2)],
            ]),
            TableOptionsBuilder::default().order_column(2usize).build().unwrap(),
        );

        assert_eq!(widget.select(0).unwrap()[0], json!("b"));
        assert_eq!(widget.selected(), Some(1));
        assert_eq!(widget.select(1).unwrap()[0], json!("a"));
        assert_eq!(widget.selected(), Some(0));

        assert!(matches!(widget.select(2), Err(ClientError::RowOutOfRange(2))));
        assert_eq!(widget.selected(), Some(0));
    }

    #[test]
    fn registry_holds_one_widget_per_id() {
        let mut registry = TableRegistry::default();
        assert!(matches!(
            registry.destroy(TableId::Menu),
            Err(ClientError::TableNotFound("menu"))
        ));

        registry
            .create(TableId::Menu, payload(vec![]), TableOptions::default())
            .unwrap();
        assert!(matches!(
            registry.create(TableId::Menu, payload(vec![]), TableOptions::default()),
            Err(ClientError::TableExists("menu"))
        ));
        assert_eq!(registry.len(), 1);

        registry.destroy(TableId::Menu).unwrap();
        assert!(registry.is_empty());
    }
}
