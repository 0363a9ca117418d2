use super::{cancellable, PageCount};
use crate::error::{AppError, Result, ScraperError, WalkError};
use crate::log_debug;
use crate::scraper::{Page, Row, Table};
use crate::session::{Endpoint, Session};
use tokio_util::sync::CancellationToken;

/// Query parameter carrying the 1-based page index.
pub const PAGE_INDEX_PARAM: &str = "pageEntity.pageIndex";

/// Rows per page of every listing and search result.
pub const PAGE_SIZE: usize = 20;

/// A paginated listing: an endpoint, its fixed query and the table holding
/// the rows.
#[derive(Debug, Clone)]
pub struct Listing {
    pub endpoint: Endpoint,
    pub params: Vec<(String, String)>,
    pub table: usize,
}

impl Listing {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            params: Vec::new(),
            table: 0,
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    pub fn table(mut self, table: usize) -> Self {
        self.table = table;
        self
    }

    pub fn students_of_class(class_id: &str) -> Self {
        Self::new(Endpoint::ListStudentsOfClass).param("clazzInstance.id", class_id)
    }

    pub fn name(&self) -> &'static str {
        self.endpoint.path()
    }
}

/// Walks the pages of one listing in ascending order.
///
/// The page count is read from the pager marker of page 1; without a marker
/// the listing is a single page. [`PageCount::EveryPage`] re-reads the marker
/// on every page and follows it when it grows.
pub struct PaginationWalker<'a, T> {
    session: &'a Session,
    listing: Listing,
    parse_row: fn(&Row) -> Result<T>,
    policy: PageCount,
    cancel: CancellationToken,
    next: usize,
    total: usize,
}

impl<'a, T> PaginationWalker<'a, T> {
    pub fn new(session: &'a Session, listing: Listing, parse_row: fn(&Row) -> Result<T>) -> Self {
        Self {
            session,
            listing,
            parse_row,
            policy: PageCount::default(),
            cancel: CancellationToken::new(),
            next: 1,
            total: 1,
        }
    }

    pub fn with_policy(mut self, policy: PageCount) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Page count known so far.
    pub fn total_pages(&self) -> usize {
        self.total
    }

    /// Parsed rows of the next page, `None` once the listing is exhausted.
    pub async fn next_page(&mut self) -> Result<Option<Vec<T>>> {
        if self.next > 1 && self.next > self.total {
            return Ok(None);
        }
        let index = self.next;

        let page = self
            .fetch_page(index)
            .await
            .map_err(|e| self.page_error(index, e))?;

        if index == 1 || self.policy == PageCount::EveryPage {
            let declared = page.info().total_pages.unwrap_or(0);
            self.total = self.total.max(declared);
        }

        let table = page.tables().get(self.listing.table).ok_or_else(|| {
            self.page_error(
                index,
                ScraperError::Extraction {
                    entity: "listing",
                    field: "rows",
                    locator: format!("table {}", self.listing.table),
                }
                .into(),
            )
        })?;
        let rows = parse_rows(self.listing.name(), index, table, self.parse_row)?;

        log_debug!(
            "[walker] {} page {}/{}: {} rows",
            self.listing.name(),
            index,
            self.total,
            rows.len()
        );
        self.next += 1;
        Ok(Some(rows))
    }

    /// Rows of every page, in page-then-row order.
    pub async fn collect(mut self) -> Result<Vec<T>> {
        let mut all = Vec::new();
        while let Some(rows) = self.next_page().await? {
            all.extend(rows);
        }
        Ok(all)
    }

    async fn fetch_page(&self, index: usize) -> Result<Page> {
        let index = index.to_string();
        let mut query: Vec<(&str, &str)> = self
            .listing
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        query.push((PAGE_INDEX_PARAM, index.as_str()));

        let body = cancellable(
            &self.cancel,
            self.session.fetch(self.listing.endpoint, &query),
        )
        .await?;
        Ok(Page::new(body))
    }

    fn page_error(&self, page: usize, source: AppError) -> AppError {
        if source.is_cancelled() {
            return source;
        }
        WalkError::Page {
            listing: self.listing.name().to_string(),
            page,
            source: Box::new(source),
        }
        .into()
    }
}

/// Parses the rows of a listing table below its header row.
pub(crate) fn parse_rows<T>(
    listing: &str,
    page: usize,
    table: &Table,
    parse_row: fn(&Row) -> Result<T>,
) -> Result<Vec<T>> {
    table
        .iter()
        .enumerate()
        .skip(1)
        .map(|(row, cells)| {
            parse_row(cells).map_err(|e| {
                AppError::from(WalkError::Row {
                    listing: listing.to_string(),
                    page,
                    row,
                    source: Box::new(e),
                })
            })
        })
        .collect()
}
