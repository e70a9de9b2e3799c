// Cursor-following page collector.
//
// Drains a paginated listing into memory. The whole listing is materialized;
// a short page ends collection even when the server still hands back a cursor
// (some endpoints emit a stale cursor on the last page).

use std::future::Future;

use tracing::debug;

use crate::bluesky::graph::Page;
use crate::error::RaffleError;

/// Page size for getLikes and getRepostedBy (the API maximum).
pub const PAGE_SIZE: usize = 100;

/// Fetch pages until one comes back without a cursor or with fewer than
/// `page_size` items, and return every item in page order.
///
/// `fetch_page` gets `None` for the first page and the previous cursor after
/// that. The first error aborts collection; partial results are dropped.
pub async fn collect_pages<T, F, Fut>(
    what: &str,
    page_size: usize,
    mut fetch_page: F,
) -> Result<Vec<T>, RaffleError>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = Result<Page<T>, RaffleError>>,
{
    let mut items = Vec::new();
    let mut cursor: Option<String> = None;
    let mut pages = 0usize;

    loop {
        let page = fetch_page(cursor.take()).await?;
        pages += 1;

        let short_page = page.items.len() < page_size;
        items.extend(page.items);

        debug!(
            what = what,
            page = pages,
            total = items.len(),
            "Fetched page"
        );

        match page.cursor {
            Some(next) if !short_page => cursor = Some(next),
            _ => break,
        }
    }

    Ok(items)
}
