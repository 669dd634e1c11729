//! Client core for the EV & battery marketplace.
//!
//! # Overview
//! Builds `HttpRequest` values for the marketplace backend, executes them
//! through a [`Transport`], and projects the results into headless page
//! controllers (browse, submit vehicle, submit battery, home) and the
//! navigation shell.
//!
//! # Design
//! - `ApiClient` is stateless apart from the base origin and a shared
//!   [`Session`]; it attaches the bearer token but never writes it.
//! - `ListingService` is the only layer that performs I/O, one attempt per
//!   call. Category and subscription-limit lookups fail soft to fixed
//!   defaults.
//! - Page controllers hold view state only. The browse page sequences its
//!   fetches so a superseded response is never applied.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod format;
pub mod http;
pub mod nav;
pub mod pages;
pub mod service;
pub mod session;
pub mod transport;
pub mod types;

#[cfg(test)]
mod testing;

pub use client::{ApiClient, ResponseBody};
pub use config::ClientConfig;
pub use error::ApiError;
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use service::{ListingQuery, ListingService, SearchParams};
pub use session::{FileStore, MemoryStore, Session, SessionError, SessionStore};
pub use transport::{Transport, UreqTransport};
pub use types::{
    Category, CreateListingRequest, Listing, ListingPermission, ListingStatus, Page, Seller,
    SubscriptionLimits, UpdateListingRequest,
};
