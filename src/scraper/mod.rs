mod page;
pub mod records;
pub mod rules;
pub mod table;

pub use page::{PageInfo, PageScraper};
pub use rules::{FieldRule, Fields, Locator, RuleSet, Source};
pub use table::{extract_tables, unescape, Cell, Row, Table};

/// A fetched page with its tables extracted once.
#[derive(Debug, Clone)]
pub struct Page {
    body: String,
    tables: Vec<Table>,
}

impl Page {
    pub fn new(body: impl Into<String>) -> Self {
        let body = body.into();
        let tables = extract_tables(&body);
        Self { body, tables }
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn tables(&self) -> &[Table] {
        &self.tables
    }

    pub fn source(&self) -> Source<'_> {
        Source::page(&self.body, &self.tables)
    }

    pub fn info(&self) -> PageInfo {
        PageScraper::new(&self.body).analyze()
    }
}
