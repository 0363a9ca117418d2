use scraper::{ElementRef, Html};

/// One `<td>`/`<th>` of an extracted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    raw: String,
}

impl Cell {
    pub fn new(raw: impl Into<String>) -> Self {
        Self {
            raw: raw.into().trim().to_string(),
        }
    }

    /// Inner markup of the cell as serialized by the parser.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Visible text: tags dropped, entities decoded, whitespace trimmed.
    pub fn text(&self) -> String {
        unescape(&self.raw)
    }
}

pub type Row = Vec<Cell>;
pub type Table = Vec<Row>;

/// Splits a document into its tables.
///
/// Every `<table>` becomes one [`Table`], in document order. A table only owns
/// the rows of its own `<tr>` children, so a nested table shows up as a
/// separate entry after its ancestor instead of leaking rows into it.
pub fn extract_tables(html: &str) -> Vec<Table> {
    let document = Html::parse_document(html);

    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|element| element.value().name() == "table")
        .map(rows_of)
        .collect()
}

fn rows_of(table: ElementRef) -> Table {
    let mut rows = Vec::new();
    for child in table.children().filter_map(ElementRef::wrap) {
        match child.value().name() {
            "tr" => rows.push(cells_of(child)),
            "thead" | "tbody" | "tfoot" => rows.extend(
                child
                    .children()
                    .filter_map(ElementRef::wrap)
                    .filter(|e| e.value().name() == "tr")
                    .map(cells_of),
            ),
            _ => {}
        }
    }
    rows
}

fn cells_of(row: ElementRef) -> Row {
    row.children()
        .filter_map(ElementRef::wrap)
        .filter(|e| matches!(e.value().name(), "td" | "th"))
        .map(|cell| Cell::new(cell.inner_html()))
        .collect()
}

/// Decodes a markup fragment into plain text.
pub fn unescape(fragment: &str) -> String {
    Html::parse_fragment(fragment)
        .root_element()
        .text()
        .collect::<String>()
        .replace('\u{a0}', " ")
        .trim()
        .to_string()
}
