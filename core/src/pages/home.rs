//! Landing page: featured listings and backend connectivity.

use crate::client::ResponseBody;
use crate::service::ListingService;
use crate::transport::Transport;
use crate::types::Listing;

pub const FEATURED_COUNT: u32 = 6;

#[derive(Debug, Clone, Default)]
pub struct HomePage {
    featured: Vec<Listing>,
    loaded: bool,
}

impl HomePage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn featured(&self) -> &[Listing] {
        &self.featured
    }

    pub fn is_loading(&self) -> bool {
        !self.loaded
    }

    /// Loads the first page of listings as the featured strip. Failures are
    /// logged and leave the strip empty.
    pub fn load<T: Transport>(&mut self, service: &ListingService<T>) {
        match service.get_listings(0, FEATURED_COUNT) {
            Ok(page) => self.featured = page.content,
            Err(e) => tracing::error!(error = %e, "error fetching featured listings"),
        }
        self.loaded = true;
    }
}

/// Result of probing `/api/health`.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendStatus {
    Connected(ResponseBody),
    Disconnected(String),
}

impl BackendStatus {
    pub fn check<T: Transport>(service: &ListingService<T>) -> Self {
        match service.health() {
            Ok(body) => BackendStatus::Connected(body),
            Err(e) => {
                tracing::error!(error = %e, "backend connection failed");
                BackendStatus::Disconnected(e.to_string())
            }
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BackendStatus::Connected(_) => "✅ Backend Connected",
            BackendStatus::Disconnected(_) => "❌ Backend Disconnected",
        }
    }
}
