//! Listing browser: pagination, free-text search and category filter.
//!
//! # Design
//! Every state change that needs data returns a [`FetchTicket`] naming the
//! query to run and a sequence number. The host executes the query (or
//! calls [`BrowsePage::refresh`]) and hands the result back to
//! [`BrowsePage::apply`]. Only the result for the most recently issued
//! ticket is applied; results for superseded tickets are dropped, so rapid
//! filter clicks can never leave an older response on screen.

use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::service::{ListingQuery, ListingService, SearchParams};
use crate::transport::Transport;
use crate::types::{Listing, Page};

pub const LOAD_FAILED: &str = "Failed to load listings";

/// A fetch the page is waiting for.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchTicket {
    pub seq: u64,
    pub query: ListingQuery,
}

/// Which spinner, if any, the host should draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadingView {
    /// Nothing to show yet: full-page spinner.
    FullPage,
    /// Stale items stay visible under an overlay spinner.
    Overlay,
    Idle,
}

#[derive(Debug, Clone)]
pub struct BrowsePage {
    listings: Vec<Listing>,
    current_page: u32,
    total_pages: u32,
    selected_category: Option<i64>,
    search_query: String,
    page_size: u32,
    loading: bool,
    error: Option<String>,
    issued: u64,
}

impl Default for BrowsePage {
    fn default() -> Self {
        Self::new(DEFAULT_PAGE_SIZE)
    }
}

impl BrowsePage {
    /// A fresh page. It starts in the loading state because the host is
    /// expected to run [`BrowsePage::load`] right away.
    pub fn new(page_size: u32) -> Self {
        Self {
            listings: Vec::new(),
            current_page: 0,
            total_pages: 0,
            selected_category: None,
            search_query: String::new(),
            page_size,
            loading: true,
            error: None,
            issued: 0,
        }
    }

    pub fn listings(&self) -> &[Listing] {
        &self.listings
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn selected_category(&self) -> Option<i64> {
        self.selected_category
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn loading_view(&self) -> LoadingView {
        match (self.loading, self.listings.is_empty()) {
            (true, true) => LoadingView::FullPage,
            (true, false) => LoadingView::Overlay,
            (false, _) => LoadingView::Idle,
        }
    }

    /// True when the "no listings found" panel should be shown.
    pub fn is_empty(&self) -> bool {
        self.listings.is_empty() && !self.loading
    }

    /// Pagination controls are only drawn for more than one page.
    pub fn shows_pagination(&self) -> bool {
        self.total_pages > 1
    }

    pub fn has_previous(&self) -> bool {
        self.current_page > 0
    }

    pub fn has_next(&self) -> bool {
        self.current_page + 1 < self.total_pages
    }

    /// Initial load of the first page.
    pub fn load(&mut self) -> FetchTicket {
        self.issue(0)
    }

    /// Edits the search box without fetching.
    pub fn set_search_query(&mut self, query: &str) {
        self.search_query = query.to_string();
    }

    pub fn submit_search(&mut self) -> FetchTicket {
        self.current_page = 0;
        self.issue(0)
    }

    /// `None` selects all categories.
    pub fn select_category(&mut self, category_id: Option<i64>) -> FetchTicket {
        self.selected_category = category_id;
        self.current_page = 0;
        self.issue(0)
    }

    /// `None` when `page` is outside the known page range.
    pub fn go_to_page(&mut self, page: u32) -> Option<FetchTicket> {
        if page >= self.total_pages {
            return None;
        }
        Some(self.issue(page))
    }

    pub fn next_page(&mut self) -> Option<FetchTicket> {
        self.go_to_page(self.current_page + 1)
    }

    pub fn previous_page(&mut self) -> Option<FetchTicket> {
        let page = self.current_page.checked_sub(1)?;
        self.go_to_page(page)
    }

    /// Applies the result of a fetch. Returns `false` when the ticket has
    /// been superseded and the result was dropped.
    pub fn apply(&mut self, seq: u64, result: Result<Page<Listing>, ApiError>) -> bool {
        if seq != self.issued {
            tracing::debug!(seq, latest = self.issued, "dropping stale listings response");
            return false;
        }
        self.loading = false;
        match result {
            Ok(page) => {
                self.listings = page.content;
                self.total_pages = page.total_pages;
                self.current_page = page.number;
                self.error = None;
            }
            Err(e) => {
                tracing::error!(error = %e, "error fetching listings");
                self.error = Some(LOAD_FAILED.to_string());
            }
        }
        true
    }

    /// Runs `ticket` through `service` and applies the result.
    pub fn refresh<T: Transport>(&mut self, service: &ListingService<T>, ticket: &FetchTicket) -> bool {
        let result = service.fetch(&ticket.query);
        self.apply(ticket.seq, result)
    }

    fn issue(&mut self, page: u32) -> FetchTicket {
        self.issued += 1;
        self.loading = true;
        FetchTicket {
            seq: self.issued,
            query: self.query_for(page),
        }
    }

    fn query_for(&self, page: u32) -> ListingQuery {
        let size = self.page_size;
        let query = self.search_query.trim();
        if !query.is_empty() {
            return ListingQuery::Search(SearchParams {
                category_id: self.selected_category,
                page,
                size,
                ..SearchParams::new(query)
            });
        }
        match self.selected_category {
            Some(category_id) => ListingQuery::ByCategory {
                category_id,
                page,
                size,
            },
            None => ListingQuery::All { page, size },
        }
    }
}
