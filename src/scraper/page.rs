use crate::log_debug;
use once_cell::sync::Lazy;
use regex::Regex;

static TOTAL_PAGES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"共\s*(\d+)\s*页").expect("total pages pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageInfo {
    /// Declared page count of a listing, `None` when the page has no marker.
    pub total_pages: Option<usize>,
}

pub struct PageScraper<'a> {
    body: &'a str,
}

impl<'a> PageScraper<'a> {
    pub(crate) fn new(body: &'a str) -> Self {
        Self { body }
    }

    pub fn analyze(&self) -> PageInfo {
        let total_pages = self.get_total_pages();

        log_debug!(
            "[scraper] Page Analysis - Total: {}",
            total_pages.map_or_else(|| "none".to_string(), |t| t.to_string())
        );

        PageInfo { total_pages }
    }

    /// Reads the localized "共N页" pager marker.
    fn get_total_pages(&self) -> Option<usize> {
        TOTAL_PAGES
            .captures(self.body)
            .and_then(|caps| caps.get(1))
            .and_then(|m| m.as_str().parse().ok())
    }
}
