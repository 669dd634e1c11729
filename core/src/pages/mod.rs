//! Headless page controllers.
//!
//! # Design
//! Each page owns its local state and talks to the backend only through
//! [`crate::service::ListingService`]. Rendering is left to the host; the
//! controllers expose what to show (items, banners, spinner mode) and where
//! to go next as a [`Navigation`].

pub mod browse;
pub mod home;
pub mod submit;

use std::time::Duration;

pub use browse::{BrowsePage, FetchTicket, LoadingView};
pub use home::{BackendStatus, HomePage};
pub use submit::{FormError, FormField, ListingDraft, ListingKind, SubmitListingPage, SubmitOutcome};

/// Client-side routes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Listings,
    Login,
    NewVehicle,
    NewBattery,
    About,
    Shop,
    Gallery,
    Feedback,
    News,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Listings => "/listings",
            Route::Login => "/login",
            Route::NewVehicle => "/listing/electric-car",
            Route::NewBattery => "/listing/battery",
            Route::About => "/gioi-thieu",
            Route::Shop => "/mua-sam",
            Route::Gallery => "/hinh-anh",
            Route::Feedback => "/feedback",
            Route::News => "/tin-tuc",
        }
    }
}

/// A navigation the host should perform, possibly after a delay.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Navigation {
    pub to: Route,
    pub after: Duration,
}

impl Navigation {
    pub fn now(to: Route) -> Self {
        Self {
            to,
            after: Duration::ZERO,
        }
    }
}
