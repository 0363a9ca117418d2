//! Declarative field extraction.
//!
//! Each entity owns a [`RuleSet`]: a list of [`FieldRule`]s telling where a
//! field lives on the page (a table cell, a column of the row being parsed,
//! or the whole document) and which pattern pulls it out. Keeping the rules as
//! data lets every field be checked against a markup fixture on its own.

use super::table::{unescape, Row, Table};
use crate::error::{Result, ScraperError};
use regex::Regex;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Absolute position on the page.
    Cell {
        table: usize,
        row: usize,
        column: usize,
    },
    /// Column of the row currently being parsed.
    Column(usize),
    /// Raw body of the whole page.
    Document,
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locator::Cell { table, row, column } => {
                write!(f, "table {} row {} column {}", table, row, column)
            }
            Locator::Column(column) => write!(f, "column {}", column),
            Locator::Document => write!(f, "document"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldRule {
    pub field: &'static str,
    pub locator: Locator,
    pub pattern: Regex,
    pub groups: usize,
    pub required: bool,
    pub many: bool,
}

impl FieldRule {
    /// A required single-match rule.
    pub fn new(field: &'static str, locator: Locator, pattern: &str, groups: usize) -> Self {
        Self {
            field,
            locator,
            pattern: Regex::new(pattern).expect("field patterns are static and valid"),
            groups,
            required: true,
            many: false,
        }
    }

    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Collects every match instead of the first; no match yields nothing.
    pub fn many(mut self) -> Self {
        self.many = true;
        self.required = false;
        self
    }
}

/// Where rules read from.
#[derive(Debug, Clone, Copy)]
pub struct Source<'a> {
    pub document: &'a str,
    pub tables: &'a [Table],
    pub row: Option<&'a Row>,
}

impl<'a> Source<'a> {
    pub fn page(document: &'a str, tables: &'a [Table]) -> Self {
        Self {
            document,
            tables,
            row: None,
        }
    }

    pub fn row(row: &'a Row) -> Self {
        Self {
            document: "",
            tables: &[],
            row: Some(row),
        }
    }

    fn resolve(&self, locator: Locator) -> Option<&'a str> {
        match locator {
            Locator::Cell { table, row, column } => self
                .tables
                .get(table)?
                .get(row)?
                .get(column)
                .map(|c| c.raw()),
            Locator::Column(column) => self.row?.get(column).map(|c| c.raw()),
            Locator::Document => Some(self.document),
        }
    }
}

/// Captured groups per field; one entry per match.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Fields {
    values: HashMap<&'static str, Vec<Vec<String>>>,
}

impl Fields {
    /// Groups of the first match of `field`.
    pub fn groups(&self, field: &str) -> &[String] {
        self.values
            .get(field)
            .and_then(|matches| matches.first())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// First group of the first match, empty when absent.
    pub fn text(&self, field: &str) -> String {
        self.group(field, 0)
    }

    pub fn group(&self, field: &str, index: usize) -> String {
        self.groups(field).get(index).cloned().unwrap_or_default()
    }

    /// First group of every match.
    pub fn all(&self, field: &str) -> Vec<String> {
        self.values
            .get(field)
            .map(|matches| {
                matches
                    .iter()
                    .filter_map(|groups| groups.first().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.values.contains_key(field)
    }
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    pub entity: &'static str,
    pub rules: Vec<FieldRule>,
}

impl RuleSet {
    pub fn new(entity: &'static str, rules: Vec<FieldRule>) -> Self {
        Self { entity, rules }
    }

    pub fn apply(&self, source: &Source) -> Result<Fields> {
        let mut fields = Fields::default();

        for rule in &self.rules {
            let captured = self.capture(rule, source)?;
            if !captured.is_empty() {
                fields.values.insert(rule.field, captured);
            }
        }

        Ok(fields)
    }

    fn capture(&self, rule: &FieldRule, source: &Source) -> Result<Vec<Vec<String>>> {
        // A pattern with the wrong arity can never satisfy its field.
        let arity_ok = rule.pattern.captures_len() == rule.groups + 1;

        let text = match source.resolve(rule.locator) {
            Some(text) if arity_ok => text,
            _ if rule.required || !arity_ok => return Err(self.error(rule)),
            _ => return Ok(Vec::new()),
        };

        let to_groups = |caps: regex::Captures| -> Vec<String> {
            (1..=rule.groups)
                .map(|i| caps.get(i).map(|m| unescape(m.as_str())).unwrap_or_default())
                .collect()
        };

        let captured: Vec<Vec<String>> = if rule.many {
            rule.pattern.captures_iter(text).map(to_groups).collect()
        } else {
            rule.pattern.captures(text).map(to_groups).into_iter().collect()
        };

        if captured.is_empty() && rule.required {
            return Err(self.error(rule));
        }

        Ok(captured)
    }

    fn error(&self, rule: &FieldRule) -> crate::error::AppError {
        ScraperError::Extraction {
            entity: self.entity,
            field: rule.field,
            locator: rule.locator.to_string(),
        }
        .into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scraper::table::{extract_tables, Cell};
    use crate::error::AppError;

    fn row(cells: &[&str]) -> Row {
        cells.iter().map(|c| Cell::new(*c)).collect()
    }

    #[test]
    fn reads_row_columns() {
        let rules = RuleSet::new(
            "student",
            vec![
                FieldRule::new("id", Locator::Column(0), r"student\.id=(\d+)", 1),
                FieldRule::new("phone", Locator::Column(1), r"(?s)^(.*)$", 1),
            ],
        );
        let row = row(&[r#"<a href="x?student.id=7&amp;a=1">Bob</a>"#, "139&nbsp;"]);

        let fields = rules.apply(&Source::row(&row)).unwrap();
        assert_eq!(fields.text("id"), "7");
        assert_eq!(fields.text("phone"), "139");
    }

    #[test]
    fn missing_required_field_names_the_locator() {
        let rules = RuleSet::new(
            "category",
            vec![FieldRule::new(
                "name",
                Locator::Cell {
                    table: 0,
                    row: 2,
                    column: 1,
                },
                r"(?s)^(.+)$",
                1,
            )],
        );
        let html = "<table><tr><td>only row</td></tr></table>";
        let tables = extract_tables(html);

        let err = rules.apply(&Source::page(html, &tables)).unwrap_err();
        match err {
            AppError::Scraper(ScraperError::Extraction {
                entity,
                field,
                locator,
            }) => {
                assert_eq!(entity, "category");
                assert_eq!(field, "name");
                assert_eq!(locator, "table 0 row 2 column 1");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn pattern_mismatch_is_an_error_but_optional_fields_are_skipped() {
        let rules = RuleSet::new(
            "class",
            vec![
                FieldRule::new("room", Locator::Column(0), r"^Room (\d+)$", 1).optional(),
                FieldRule::new("code", Locator::Column(1), r"^([A-Z]+-\d+)$", 1),
            ],
        );

        let good = row(&["Hall", "GQ-01"]);
        let fields = rules.apply(&Source::row(&good)).unwrap();
        assert!(!fields.contains("room"));
        assert_eq!(fields.text("code"), "GQ-01");

        let bad = row(&["Room 3", "lowercase"]);
        assert!(rules.apply(&Source::row(&bad)).is_err());
    }

    #[test]
    fn arity_mismatch_fails() {
        let rules = RuleSet::new(
            "student",
            vec![FieldRule::new("id", Locator::Document, r"id=(\d+)", 2)],
        );
        let source = Source::page("id=1", &[]);
        assert!(rules.apply(&source).is_err());
    }

    #[test]
    fn many_rules_collect_all_matches_in_order() {
        let rules = RuleSet::new(
            "class",
            vec![FieldRule::new(
                "teachers",
                Locator::Document,
                r#"<span class="teacher">(.*?)</span>"#,
                1,
            )
            .many()],
        );
        let html = r#"<span class="teacher">王老师</span><span class="teacher">Li&nbsp;Na</span>"#;
        let fields = rules.apply(&Source::page(html, &[])).unwrap();
        assert_eq!(fields.all("teachers"), vec!["王老师", "Li Na"]);

        let empty = rules.apply(&Source::page("<p></p>", &[])).unwrap();
        assert!(empty.all("teachers").is_empty());
    }

    #[test]
    fn unmatched_optional_groups_are_empty() {
        let rules = RuleSet::new(
            "event",
            vec![FieldRule::new(
                "dates",
                Locator::Document,
                r"(\d{4}-\d{2}-\d{2})(?: to (\d{4}-\d{2}-\d{2}))?",
                2,
            )],
        );
        let fields = rules.apply(&Source::page("2017-09-01", &[])).unwrap();
        assert_eq!(fields.groups("dates"), ["2017-09-01".to_string(), String::new()]);
    }
}
