//! Cursor-paginated cast search.
//!
//! A search is sampled, not exhausted: at most `max_pages` pages are
//! requested, so counts derived from the result undercount once the real
//! result set is larger than `max_pages × page_size`.

use std::future::Future;

use futures::{Stream, StreamExt, pin_mut, stream};
use tipstats_core::AppError;

use crate::models::Cast;

/// One page of search results.
#[derive(Debug, Clone, Default)]
pub struct SearchPage {
    pub casts: Vec<Cast>,
    pub next_cursor: Option<String>,
}

/// Anything that can answer a paginated full-text cast search.
pub trait CastSource {
    fn search_page(
        &self,
        query: &str,
        limit: u32,
        cursor: Option<&str>,
    ) -> impl Future<Output = Result<SearchPage, AppError>> + Send;
}

struct PageState<'a, S> {
    source: &'a S,
    query: &'a str,
    limit: u32,
    cursor: Option<String>,
    fetched: u32,
    max_pages: u32,
    done: bool,
}

/// Lazily walk the search cursor, yielding each page's casts.
///
/// Ends when the API stops returning a cursor, after `max_pages` requests,
/// or right after the first failed request (which is yielded as `Err`).
pub fn cast_pages<'a, S>(
    source: &'a S,
    query: &'a str,
    page_size: u32,
    max_pages: u32,
) -> impl Stream<Item = Result<Vec<Cast>, AppError>> + Send + 'a
where
    S: CastSource + Sync,
{
    let state = PageState {
        source,
        query,
        limit: page_size,
        cursor: None,
        fetched: 0,
        max_pages,
        done: false,
    };

    stream::unfold(state, |mut st| async move {
        if st.done || st.fetched >= st.max_pages {
            return None;
        }

        let result = st
            .source
            .search_page(st.query, st.limit, st.cursor.as_deref())
            .await;
        st.fetched += 1;

        match result {
            Ok(page) => {
                st.cursor = page.next_cursor.filter(|c| !c.is_empty());
                st.done = st.cursor.is_none();
                Some((Ok(page.casts), st))
            }
            Err(e) => {
                st.done = true;
                Some((Err(e), st))
            }
        }
    })
}

/// Casts gathered from a bounded search.
#[derive(Debug, Default)]
pub struct Collected {
    pub casts: Vec<Cast>,
    /// Pages that returned successfully.
    pub pages: u32,
    /// The failure that cut pagination short, if any.
    pub error: Option<AppError>,
}

/// Drain [`cast_pages`] into one ordered list.
///
/// A failed page stops the walk; the casts gathered before it are kept.
pub async fn collect_casts<S>(
    source: &S,
    query: &str,
    page_size: u32,
    max_pages: u32,
) -> Collected
where
    S: CastSource + Sync,
{
    let pages = cast_pages(source, query, page_size, max_pages);
    pin_mut!(pages);

    let mut collected = Collected::default();
    while let Some(page) = pages.next().await {
        match page {
            Ok(casts) => {
                collected.pages += 1;
                collected.casts.extend(casts);
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    pages = collected.pages,
                    casts = collected.casts.len(),
                    "Cast search stopped early"
                );
                collected.error = Some(e);
                break;
            }
        }
    }

    tracing::debug!(
        pages = collected.pages,
        casts = collected.casts.len(),
        "Cast search complete"
    );
    collected
}
