use crate::models::{SearchPage, Thread};
use crate::render::ThreadRenderer;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::io::Write;

/// The mail provider operations the search command needs.
#[async_trait]
pub trait MailSearch {
    async fn search_threads(
        &self,
        query: &str,
        max_results: u32,
        page_token: Option<String>,
    ) -> Result<SearchPage>;

    async fn get_thread(&self, id: &str) -> Result<Thread>;
}

#[derive(Debug, PartialEq, Eq)]
pub enum PageOutcome {
    Found(SearchPage),
    /// The results ran out before the requested page.
    Unavailable { available: u32 },
}

/// Walks forward from the first page until `page` (1-based) is reached.
/// The provider only hands out forward cursors, so every earlier page is
/// requested and discarded.
pub async fn locate_page<S>(search: &S, query: &str, limit: u32, page: u32) -> Result<PageOutcome>
where
    S: MailSearch + Sync,
{
    let mut page_token = None;
    let mut current_page = 1;

    while current_page < page {
        let skipped = search.search_threads(query, limit, page_token.take()).await?;
        match skipped.next_page_token {
            Some(token) => page_token = Some(token),
            None => {
                return Ok(PageOutcome::Unavailable {
                    available: current_page,
                });
            }
        }
        current_page += 1;
    }

    let found = search.search_threads(query, limit, page_token).await?;
    Ok(PageOutcome::Found(found))
}

/// Runs one search and renders every thread on the requested page, one at
/// a time in result order.
pub async fn run_search<S, W>(
    search: &S,
    renderer: &mut ThreadRenderer<W>,
    query: &str,
    limit: u32,
    page: u32,
) -> Result<()>
where
    S: MailSearch + Sync,
    W: Write,
{
    renderer.search_banner(query)?;

    let results = match locate_page(search, query, limit, page).await? {
        PageOutcome::Found(results) => results,
        PageOutcome::Unavailable { available } => {
            renderer.page_unavailable(page, available)?;
            return Ok(());
        }
    };

    if results.threads.is_empty() {
        renderer.no_results()?;
        return Ok(());
    }

    tracing::info!(
        count = results.threads.len(),
        estimate = ?results.result_size_estimate,
        "Found threads"
    );
    renderer.page_summary(page, results.threads.len(), results.next_page_token.is_some())?;

    for summary in &results.threads {
        tracing::debug!(id = %summary.id, snippet = ?summary.snippet, "Fetching thread details");
        let thread = search.get_thread(&summary.id).await?;
        renderer
            .render_thread(&thread)
            .with_context(|| format!("Failed to print thread {}", summary.id))?;
    }

    Ok(())
}
