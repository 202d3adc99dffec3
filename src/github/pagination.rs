use std::future::Future;

use super::types::PageInfo;
use super::GithubError;

/// One page of a cursor-paginated GraphQL connection.
#[derive(Debug, Clone)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page_info: PageInfo,
}

/// Walks a cursor-paginated connection one page at a time.
///
/// The cursor is opaque and only threaded between calls. A paginator can be
/// resumed from any cursor it previously reported. Once the API reports no
/// further pages, or a page fails, it yields nothing more.
#[derive(Debug, Clone, Default)]
pub struct Paginator {
    cursor: Option<String>,
    done: bool,
}

impl Paginator {
    pub fn new() -> Self {
        Self::default()
    }

    #[allow(dead_code)] // for walks continued from a saved cursor
    pub fn resume_from(cursor: impl Into<String>) -> Self {
        Self {
            cursor: Some(cursor.into()),
            done: false,
        }
    }

    /// Cursor the next page will be requested after.
    pub fn cursor(&self) -> Option<&str> {
        self.cursor.as_deref()
    }

    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Fetch the next page with `fetch`, which receives the current cursor.
    /// Returns `None` when the connection is exhausted.
    pub async fn next_page<T, F, Fut>(&mut self, fetch: F) -> Option<Result<Page<T>, GithubError>>
    where
        F: FnOnce(Option<String>) -> Fut,
        Fut: Future<Output = Result<Page<T>, GithubError>>,
    {
        if self.done {
            return None;
        }

        let result = fetch(self.cursor.clone()).await;
        match &result {
            Ok(page) => match (&page.page_info.end_cursor, page.page_info.has_next_page) {
                (Some(end_cursor), true) => self.cursor = Some(end_cursor.clone()),
                _ => self.done = true,
            },
            Err(_) => self.done = true,
        }
        Some(result)
    }
}
