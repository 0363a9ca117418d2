use crate::error::{AppError, Result, WalkError};
use crate::log_warn;
use futures::stream::{self, StreamExt};
use std::future::Future;
use tokio_util::sync::CancellationToken;

/// Reference cap on simultaneous detail requests.
pub const DEFAULT_CONCURRENCY: usize = 30;

/// Fetches the detail of every listing row with a bounded number of requests
/// in flight.
///
/// Results come back in input order. A failure does not stop the other rows:
/// every fetch runs to completion before the first failure is returned, so
/// none outlives the call. Cancelling the token aborts the fetches promptly.
#[derive(Debug, Clone)]
pub struct DetailFetcher {
    concurrency: usize,
    cancel: CancellationToken,
}

impl Default for DetailFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_CONCURRENCY)
    }
}

impl DetailFetcher {
    pub fn new(concurrency: usize) -> Self {
        Self {
            concurrency: concurrency.max(1),
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub async fn fetch_all<S, T, F, Fut>(&self, rows: Vec<S>, fetch: F) -> Result<Vec<T>>
    where
        F: Fn(S) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let total = rows.len();

        let mut outcomes = stream::iter(rows.into_iter().enumerate())
            .map(|(index, row)| {
                let cancel = self.cancel.clone();
                let request = fetch(row);
                async move {
                    let result = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => Err(AppError::from(WalkError::Cancelled)),
                        result = request => result,
                    };
                    (index, result)
                }
            })
            .buffer_unordered(self.concurrency);

        let mut slots: Vec<Option<T>> = (0..total).map(|_| None).collect();
        let mut first_error: Option<AppError> = None;

        while let Some((index, outcome)) = outcomes.next().await {
            match outcome {
                Ok(item) => slots[index] = Some(item),
                Err(e) if first_error.is_none() => {
                    log_warn!("[detail] Row {} failed, finishing the other fetches: {}", index, e);
                    first_error = Some(wrap(index, e));
                }
                Err(_) => {}
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }

        // Without a failure every slot is filled.
        Ok(slots.into_iter().flatten().collect())
    }
}

fn wrap(row: usize, source: AppError) -> AppError {
    if source.is_cancelled() {
        return source;
    }
    WalkError::Detail {
        row,
        source: Box::new(source),
    }
    .into()
}
