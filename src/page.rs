use std::fmt::Write;

use crate::table::{cell_display, SortDirection, TableId, TableRegistry, TableWidget};

/// A dropdown whose options come from the server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    pub name: &'static str,
    pub placeholder: &'static str,
    options: Vec<String>,
    selected: Option<String>,
}

impl Selector {
    pub fn new(name: &'static str, placeholder: &'static str) -> Self {
        Self {
            name,
            placeholder,
            options: Vec::new(),
            selected: None,
        }
    }

    pub fn append(&mut self, option: impl Into<String>) {
        self.options.push(option.into());
    }

    /// Back to the placeholder with no options.
    pub fn reset(&mut self) {
        self.options.clear();
        self.selected = None;
    }

    pub fn select(&mut self, value: &str) -> bool {
        if self.contains(value) {
            self.selected = Some(value.to_string());
            true
        } else {
            false
        }
    }

    pub fn contains(&self, value: &str) -> bool {
        self.options.iter().any(|o| o == value)
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub message: String,
}

/// Everything on screen.
#[derive(Debug)]
pub struct Page {
    pub cities: Selector,
    pub zipcodes: Selector,
    pub tables: TableRegistry,
    pub banner: Option<Notice>,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            cities: Selector::new("citySelection", "Select a City"),
            zipcodes: Selector::new("zipcodeSelection", "Select a Zipcode"),
            tables: TableRegistry::default(),
            banner: None,
        }
    }
}

impl Page {
    pub fn render_html(&self) -> String {
        let mut out = String::new();
        if let Some(notice) = &self.banner {
            let _ = writeln!(
                out,
                "<div class=\"alert alert-danger\" role=\"alert\">{}</div>",
                escape(&notice.message)
            );
        }
        selector_html(&mut out, &self.cities);
        selector_html(&mut out, &self.zipcodes);
        for id in [TableId::Restnames, TableId::Menu] {
            match self.tables.get(id) {
                Some(widget) => table_html(&mut out, widget),
                None => {
                    let _ = writeln!(out, "<table id=\"{}\"></table>", id.container());
                }
            }
        }
        out
    }

    pub fn render_text(&self) -> String {
        let mut out = String::new();
        if let Some(notice) = &self.banner {
            let _ = writeln!(out, "!! {}", notice.message);
        }
        for selector in [&self.cities, &self.zipcodes] {
            let _ = writeln!(
                out,
                "{}: {} ({} options)",
                selector.placeholder,
                selector.selected().unwrap_or("-"),
                selector.options().len()
            );
        }
        for id in [TableId::Restnames, TableId::Menu] {
            if let Some(widget) = self.tables.get(id) {
                out.push('\n');
                table_text(&mut out, widget);
            }
        }
        out
    }
}

fn selector_html(out: &mut String, selector: &Selector) {
    let _ = writeln!(out, "<select id=\"{}\">", selector.name);
    let _ = writeln!(
        out,
        "  <option{} disabled>{}</option>",
        if selector.selected().is_none() { " selected" } else { "" },
        escape(selector.placeholder)
    );
    for option in selector.options() {
        let selected = if selector.selected() == Some(option.as_str()) {
            " selected"
        } else {
            ""
        };
        let option = escape(option);
        let _ = writeln!(out, "  <option value=\"{option}\"{selected}>{option}</option>");
    }
    out.push_str("</select>\n");
}

fn table_html(out: &mut String, widget: &TableWidget) {
    let (sort_column, direction) = widget.sort();
    let _ = writeln!(out, "<table id=\"{}\">", widget.id().container());
    out.push_str("  <thead><tr>");
    for (index, column) in widget.visible_columns() {
        let class = match (index == sort_column, direction) {
            (true, SortDirection::Ascending) => " class=\"sorting_asc\"",
            (true, SortDirection::Descending) => " class=\"sorting_desc\"",
            (false, _) => "",
        };
        let _ = write!(out, "<th{class}>{}</th>", escape(&column.title));
    }
    out.push_str("</tr></thead>\n  <tbody>\n");

    for (index, row) in widget.page_rows() {
        if widget.selected() == Some(index) {
            let _ = write!(out, "    <tr class=\"{}\">", widget.options().selected_class);
        } else {
            out.push_str("    <tr>");
        }
        for (column, _) in widget.visible_columns() {
            let text = row.get(column).map(cell_display).unwrap_or_default();
            let _ = write!(out, "<td>{}</td>", escape(&text));
        }
        out.push_str("</tr>\n");
    }
    out.push_str("  </tbody>\n</table>\n");

    if widget.options().paging {
        let _ = writeln!(
            out,
            "<div class=\"paginate\"><a class=\"previous{}\">Previous</a><a class=\"next{}\">Next</a></div>",
            if widget.page() == 0 { " disabled" } else { "" },
            if widget.page() + 1 >= widget.page_count() { " disabled" } else { "" },
        );
    }
}

fn table_text(out: &mut String, widget: &TableWidget) {
    let columns = widget.visible_columns();
    let rows: Vec<(usize, Vec<String>)> = widget
        .page_rows()
        .map(|(index, row)| {
            let cells = columns
                .iter()
                .map(|(column, _)| row.get(*column).map(cell_display).unwrap_or_default())
                .collect();
            (index, cells)
        })
        .collect();

    let mut widths: Vec<usize> = columns.iter().map(|(_, c)| c.title.chars().count()).collect();
    for (_, cells) in &rows {
        for (width, cell) in widths.iter_mut().zip(cells) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let (sort_column, direction) = widget.sort();
    let _ = writeln!(
        out,
        "[{}] page {}/{}, {} rows",
        widget.id().as_str(),
        widget.page() + 1,
        widget.page_count(),
        widget.len()
    );

    out.push_str("     ");
    for ((index, column), width) in columns.iter().zip(&widths) {
        let marker = match (*index == sort_column, direction) {
            (true, SortDirection::Ascending) => "^",
            (true, SortDirection::Descending) => "v",
            (false, _) => " ",
        };
        let _ = write!(out, "{:<width$}{marker} ", column.title, width = *width);
    }
    out.push('\n');

    for (position, (index, cells)) in rows.iter().enumerate() {
        let marker = if widget.selected() == Some(*index) { '>' } else { ' ' };
        let _ = write!(out, "{marker}{:>3} ", position + 1);
        for (cell, width) in cells.iter().zip(&widths) {
            let _ = write!(out, "{:<width$}  ", cell, width = *width);
        }
        out.push('\n');
    }
}

fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
