//! Client search state.
//!
//! [`ClientSearch`] owns the query text and the last result set for the
//! client-search page. A successful response always replaces the whole result
//! set, so rows from an earlier query can never leak into a later one. A
//! failed search is its own view state instead of looking like "no matches".

use anyhow::Result;

use crate::api::{ApiError, Backend};
use crate::config::Config;
use crate::models::{ClientRecord, ClientSearchResponse};
use crate::render::{self, Palette};
use crate::request::{Request, RequestTicket, Settled, TriggerPolicy};

/// A submitted search awaiting its response.
#[derive(Debug, Clone)]
pub struct PendingSearch {
    pub ticket: RequestTicket,
    pub query: String,
}

/// What the page should show.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SearchView<'a> {
    /// No search has completed yet.
    Prompt,
    /// The last search succeeded with zero rows.
    NoMatches { query: &'a str },
    Results { query: &'a str, rows: &'a [ClientRecord] },
    Failed { query: &'a str, error: &'a str },
}

#[derive(Debug, Default)]
pub struct ClientSearch {
    input: String,
    request: Request<usize>,
    /// Query whose response is currently displayed.
    shown_query: String,
    results: Vec<ClientRecord>,
}

impl ClientSearch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `policy` for overlapping submissions instead of ignoring them.
    pub fn with_policy(policy: TriggerPolicy) -> Self {
        Self {
            request: Request::new(policy),
            ..Self::default()
        }
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    pub fn is_busy(&self) -> bool {
        self.request.is_pending()
    }

    pub fn can_submit(&self) -> bool {
        let blocked =
            self.is_busy() && self.request.policy() == TriggerPolicy::IgnoreWhilePending;
        !blocked && !self.input.trim().is_empty()
    }

    /// Label for the submit control.
    pub fn submit_label(&self) -> &'static str {
        if self.is_busy() {
            "Searching..."
        } else {
            "Search"
        }
    }

    /// Submit the current input. The input text is kept, as in a search box.
    pub fn submit(&mut self) -> Option<PendingSearch> {
        let query = self.input.trim();
        if query.is_empty() {
            return None;
        }
        let query = query.to_string();
        let ticket = self.request.trigger()?;
        tracing::debug!(seq = ticket.seq(), query = %query, "client search issued");
        Some(PendingSearch { ticket, query })
    }

    /// Apply a search response. Responses for superseded searches are dropped.
    pub fn resolve(
        &mut self,
        pending: &PendingSearch,
        result: Result<ClientSearchResponse, ApiError>,
    ) -> Settled {
        match result {
            Ok(resp) => {
                let count = resp.results.len();
                let settled = self.request.settle(pending.ticket, Ok::<_, ApiError>(count));
                if settled == Settled::Applied {
                    self.results = resp.results;
                    self.shown_query = pending.query.clone();
                }
                settled
            }
            Err(e) => {
                let settled = self.request.settle::<ApiError>(pending.ticket, Err(e));
                if settled == Settled::Applied {
                    self.results.clear();
                    self.shown_query = pending.query.clone();
                }
                settled
            }
        }
    }

    /// Submit and wait for the response in one step.
    pub async fn search(&mut self, backend: &dyn Backend) -> Option<Settled> {
        let pending = self.submit()?;
        let result = backend.search_clients(&pending.query).await;
        Some(self.resolve(&pending, result))
    }

    pub fn results(&self) -> &[ClientRecord] {
        &self.results
    }

    /// Current render state, derived from the last settled search.
    pub fn view(&self) -> SearchView<'_> {
        // The error is cleared by the next success, and a failure clears the rows.
        if let Some(error) = self.request.error() {
            return SearchView::Failed {
                query: &self.shown_query,
                error,
            };
        }
        if self.request.value().is_none() {
            return SearchView::Prompt;
        }
        if self.results.is_empty() {
            SearchView::NoMatches {
                query: &self.shown_query,
            }
        } else {
            SearchView::Results {
                query: &self.shown_query,
                rows: &self.results,
            }
        }
    }
}

/// `mdash clients <query>`: search once and print the table.
pub async fn run_client_search(
    config: &Config,
    backend: &dyn Backend,
    query: &str,
    json: bool,
) -> Result<()> {
    let mut page = ClientSearch::new();
    page.set_input(query);
    if page.search(backend).await.is_none() {
        println!("No results.");
        return Ok(());
    }

    if json {
        println!("{}", serde_json::to_string_pretty(page.results())?);
    } else {
        let palette = Palette::from_config(&config.ui);
        print!("{}", render::client_search(&page, &config.ui, &palette));
    }

    if let SearchView::Failed { error, .. } = page.view() {
        anyhow::bail!("client search failed: {}", error);
    }
    Ok(())
}
