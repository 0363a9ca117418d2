//! Traversal of the whole server: every class of the listing page, then
//! every student of each class.

pub mod detail;
pub mod pagination;

pub use detail::{DetailFetcher, DEFAULT_CONCURRENCY};
pub use pagination::{Listing, PaginationWalker, PAGE_INDEX_PARAM, PAGE_SIZE};

use crate::error::{AppError, Result, WalkError};
use crate::model::{Class, ClassSummary, Student};
use crate::scraper::records;
use crate::session::Session;
use crate::{log_debug, log_info};
use serde::Deserialize;
use std::future::Future;
use tokio_util::sync::CancellationToken;
use tracing::{info_span, Instrument};

/// Receives every class and student found by a [`Walker`]. Returning an error
/// stops the walk.
pub trait WalkHandler {
    fn on_class(&mut self, class: &Class) -> anyhow::Result<()>;

    fn on_student(&mut self, class: &Class, student: &Student) -> anyhow::Result<()>;
}

/// When the page count of a listing is read.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageCount {
    /// Page 1 only; records added mid-walk may be missed.
    #[default]
    FirstPage,
    /// Every page; costs a marker scan per page.
    EveryPage,
}

#[derive(Debug, Clone, Copy)]
pub struct WalkOptions {
    pub concurrency: usize,
    pub page_count: PageCount,
}

impl Default for WalkOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            page_count: PageCount::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub classes: usize,
    pub students: usize,
}

pub struct Walker<'a> {
    session: &'a Session,
    options: WalkOptions,
    cancel: CancellationToken,
}

impl<'a> Walker<'a> {
    pub fn new(session: &'a Session) -> Self {
        Self {
            session,
            options: WalkOptions::default(),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_options(mut self, options: WalkOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Visits every class of the listing page and every student of each
    /// class, in page order. The first error of any kind ends the walk.
    pub async fn walk<H: WalkHandler + ?Sized>(&self, handler: &mut H) -> Result<WalkSummary> {
        let mut summary = WalkSummary::default();

        let classes = cancellable(&self.cancel, self.session.list_classes()).await?;
        log_info!("[walker] {} classes to walk", classes.len());

        for listed in &classes {
            let span = info_span!("class", id = %listed.id, name = %listed.name);
            let students = self.walk_class(listed, handler).instrument(span).await?;

            summary.classes += 1;
            summary.students += students;
        }

        log_info!(
            "[walker] Walk finished: {} classes, {} students",
            summary.classes,
            summary.students
        );
        Ok(summary)
    }

    /// Every student of a class with full details, in listing order.
    pub async fn students_of_class(&self, class_id: &str) -> Result<Vec<Student>> {
        let mut pages = self.student_pages(class_id);
        let fetcher = self.detail_fetcher();

        let mut students = Vec::new();
        while let Some(rows) = pages.next_page().await? {
            students.extend(self.fetch_details(&fetcher, rows).await?);
        }
        Ok(students)
    }

    async fn walk_class<H: WalkHandler + ?Sized>(
        &self,
        listed: &ClassSummary,
        handler: &mut H,
    ) -> Result<usize> {
        let class = cancellable(&self.cancel, self.session.get_class(listed)).await?;

        log_debug!("[walker] Class {} ({} teachers)", class.name, class.teachers.len());
        handler
            .on_class(&class)
            .map_err(|source| callback_error("class", &class.id, source))?;

        self.walk_students(&class, handler).await
    }

    async fn walk_students<H: WalkHandler + ?Sized>(
        &self,
        class: &Class,
        handler: &mut H,
    ) -> Result<usize> {
        let mut pages = self.student_pages(&class.id);
        let fetcher = self.detail_fetcher();
        let mut count = 0;

        while let Some(rows) = pages.next_page().await? {
            for student in self.fetch_details(&fetcher, rows).await? {
                handler
                    .on_student(class, &student)
                    .map_err(|source| callback_error("student", &student.id, source))?;
                count += 1;
            }
        }

        Ok(count)
    }

    fn student_pages(&self, class_id: &str) -> PaginationWalker<'a, Student> {
        PaginationWalker::new(
            self.session,
            Listing::students_of_class(class_id),
            records::parse_student_row,
        )
        .with_policy(self.options.page_count)
        .with_cancel(self.cancel.clone())
    }

    fn detail_fetcher(&self) -> DetailFetcher {
        DetailFetcher::new(self.options.concurrency).with_cancel(self.cancel.clone())
    }

    async fn fetch_details(
        &self,
        fetcher: &DetailFetcher,
        rows: Vec<Student>,
    ) -> Result<Vec<Student>> {
        let session = self.session;
        fetcher
            .fetch_all(rows, move |row: Student| async move {
                session.get_student(&row.id).await
            })
            .await
    }
}

/// Runs `future` unless `cancel` fires first.
pub(crate) async fn cancellable<T>(
    cancel: &CancellationToken,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AppError::from(WalkError::Cancelled)),
        result = future => result,
    }
}

fn callback_error(stage: &'static str, id: &str, source: anyhow::Error) -> AppError {
    WalkError::Callback {
        stage,
        id: id.to_string(),
        source,
    }
    .into()
}
