//! Typed operations over the listings, categories, users and auth
//! endpoints.
//!
//! # Design
//! `ListingService` pairs an [`ApiClient`] with a [`Transport`]. Each
//! operation builds one request, executes it once, and parses the result.
//! Two lookups are soft: `get_categories` and `check_subscription_limits`
//! never fail, substituting fixed defaults so dependent screens still
//! render when the backend is degraded. `can_user_create_listing` builds on
//! the soft limits lookup and therefore fails open.
//!
//! Endpoint paths and query strings are produced by [`ListingQuery`] and
//! [`SearchParams`], which are plain data so page controllers can decide
//! *what* to fetch without holding the service.

use crate::client::{parse_body, parse_empty, parse_json, segment, with_query, ApiClient, ResponseBody};
use crate::config::DEFAULT_PAGE_SIZE;
use crate::error::ApiError;
use crate::http::HttpResponse;
use crate::transport::Transport;
use crate::types::{
    AuthResponse, Category, CreateListingRequest, ImageUpload, Listing, ListingPermission,
    LoginRequest, Page, RegisterRequest, SubscriptionLimits, SubscriptionTier, UpdateListingRequest,
};

/// Free-text search with optional filters.
///
/// Filters are included in the query string exactly when they are `Some`,
/// so `Some(0)` is sent as a real bound.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchParams {
    pub query: String,
    pub category_id: Option<i64>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub page: u32,
    pub size: u32,
}

impl SearchParams {
    pub fn new(query: &str) -> Self {
        Self {
            query: query.to_string(),
            category_id: None,
            min_price: None,
            max_price: None,
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn path(&self) -> String {
        let mut pairs = vec![
            ("q", self.query.clone()),
            ("page", self.page.to_string()),
            ("size", self.size.to_string()),
        ];
        if let Some(category_id) = self.category_id {
            pairs.push(("categoryId", category_id.to_string()));
        }
        if let Some(min_price) = self.min_price {
            pairs.push(("minPrice", min_price.to_string()));
        }
        if let Some(max_price) = self.max_price {
            pairs.push(("maxPrice", max_price.to_string()));
        }
        with_query("/api/listings/search", pairs)
    }
}

/// Which paged listing endpoint to call.
#[derive(Debug, Clone, PartialEq)]
pub enum ListingQuery {
    All { page: u32, size: u32 },
    ByCategory { category_id: i64, page: u32, size: u32 },
    ByUser { user_id: String, page: u32, size: u32 },
    Search(SearchParams),
}

impl ListingQuery {
    pub fn page(&self) -> u32 {
        match self {
            ListingQuery::All { page, .. }
            | ListingQuery::ByCategory { page, .. }
            | ListingQuery::ByUser { page, .. } => *page,
            ListingQuery::Search(params) => params.page,
        }
    }

    pub fn path(&self) -> String {
        let paging = |page: &u32, size: &u32| [("page", page.to_string()), ("size", size.to_string())];
        match self {
            ListingQuery::All { page, size } => with_query("/api/listings", paging(page, size)),
            ListingQuery::ByCategory {
                category_id,
                page,
                size,
            } => with_query(&format!("/api/listings/category/{category_id}"), paging(page, size)),
            ListingQuery::ByUser { user_id, page, size } => {
                with_query(&format!("/api/listings/user/{}", segment(user_id)), paging(page, size))
            }
            ListingQuery::Search(params) => params.path(),
        }
    }
}

pub struct ListingService<T> {
    client: ApiClient,
    transport: T,
}

impl<T: Transport> ListingService<T> {
    pub fn new(client: ApiClient, transport: T) -> Self {
        Self { client, transport }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub fn fetch(&self, query: &ListingQuery) -> Result<Page<Listing>, ApiError> {
        let response = self.transport.execute(&self.client.get(&query.path()))?;
        parse_page(response)
    }

    pub fn get_listings(&self, page: u32, size: u32) -> Result<Page<Listing>, ApiError> {
        self.fetch(&ListingQuery::All { page, size })
    }

    pub fn get_listings_by_category(
        &self,
        category_id: i64,
        page: u32,
        size: u32,
    ) -> Result<Page<Listing>, ApiError> {
        self.fetch(&ListingQuery::ByCategory {
            category_id,
            page,
            size,
        })
    }

    pub fn search_listings(&self, params: &SearchParams) -> Result<Page<Listing>, ApiError> {
        self.fetch(&ListingQuery::Search(params.clone()))
    }

    pub fn get_user_listings(&self, user_id: &str, page: u32, size: u32) -> Result<Page<Listing>, ApiError> {
        self.fetch(&ListingQuery::ByUser {
            user_id: user_id.to_string(),
            page,
            size,
        })
    }

    pub fn get_listing_by_id(&self, listing_id: &str) -> Result<Listing, ApiError> {
        let req = self.client.get(&listing_path(listing_id));
        parse_json(self.transport.execute(&req)?)
    }

    pub fn create_listing(&self, input: &CreateListingRequest) -> Result<Listing, ApiError> {
        let req = self.client.post_json("/api/listings", input)?;
        let listing: Listing = parse_json(self.transport.execute(&req)?)?;
        tracing::info!(listing_id = %listing.listing_id, "listing created");
        Ok(listing)
    }

    pub fn update_listing(&self, listing_id: &str, input: &UpdateListingRequest) -> Result<Listing, ApiError> {
        let req = self.client.put_json(&listing_path(listing_id), input)?;
        parse_json(self.transport.execute(&req)?)
    }

    pub fn delete_listing(&self, listing_id: &str) -> Result<(), ApiError> {
        let req = self.client.delete(&listing_path(listing_id));
        parse_empty(self.transport.execute(&req)?)
    }

    /// Uploads images for a listing; returns the stored image URLs.
    pub fn upload_listing_images(&self, listing_id: &str, images: &[ImageUpload]) -> Result<Vec<String>, ApiError> {
        let req = self
            .client
            .post_multipart(&format!("{}/images", listing_path(listing_id)), "images", images);
        parse_json(self.transport.execute(&req)?)
    }

    /// Category enumeration, or the three built-in categories on any error.
    pub fn get_categories(&self) -> Vec<Category> {
        let result = self
            .transport
            .execute(&self.client.get("/api/categories"))
            .and_then(parse_json::<Vec<Category>>);
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "categories endpoint unavailable, using defaults");
            Category::defaults()
        })
    }

    /// Subscription limits, or free-tier limits on any error.
    pub fn check_subscription_limits(&self) -> SubscriptionLimits {
        let result = self
            .transport
            .execute(&self.client.get("/api/users/subscription-limits"))
            .and_then(parse_json::<SubscriptionLimits>);
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "subscription limits endpoint unavailable, using defaults");
            SubscriptionLimits::free_tier()
        })
    }

    pub fn get_current_user_subscription(&self) -> Option<SubscriptionTier> {
        let result = self
            .transport
            .execute(&self.client.get("/api/users/current/subscription"))
            .and_then(parse_json::<Option<SubscriptionTier>>);
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "user subscription endpoint unavailable");
            None
        })
    }

    pub fn can_user_create_listing(&self) -> ListingPermission {
        let limits = self.check_subscription_limits();
        if !limits.can_post && limits.current_listings >= limits.max_listings {
            return ListingPermission {
                can_create: false,
                reason: Some(format!(
                    "You have reached the maximum number of listings ({}) for your {} subscription.",
                    limits.max_listings, limits.subscription_type
                )),
                upgrade_needed: limits.subscription_type == "FREE",
            };
        }
        ListingPermission::allowed()
    }

    pub fn login(&self, email: &str, password: &str) -> Result<AuthResponse, ApiError> {
        let body = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let req = self.client.post_json("/api/auth/login", &body)?;
        parse_json(self.transport.execute(&req)?)
    }

    pub fn register(&self, input: &RegisterRequest) -> Result<AuthResponse, ApiError> {
        let req = self.client.post_json("/api/auth/register", input)?;
        parse_json(self.transport.execute(&req)?)
    }

    pub fn health(&self) -> Result<ResponseBody, ApiError> {
        parse_body(self.transport.execute(&self.client.get("/api/health"))?)
    }
}

fn listing_path(listing_id: &str) -> String {
    format!("/api/listings/{}", segment(listing_id))
}

fn parse_page(response: HttpResponse) -> Result<Page<Listing>, ApiError> {
    let page: Page<Listing> = parse_json(response)?;
    page.check().map_err(ApiError::MalformedPage)?;
    Ok(page)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::sync::Arc;

    use crate::http::HttpRequest;
    use crate::session::Session;

    /// Replies with a fixed response and records every request.
    struct Canned {
        status: u16,
        body: String,
        seen: RefCell<Vec<HttpRequest>>,
    }

    impl Canned {
        fn new(status: u16, body: &str) -> Self {
            Self {
                status,
                body: body.to_string(),
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl Transport for Canned {
        fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            self.seen.borrow_mut().push(request.clone());
            Ok(HttpResponse {
                status: self.status,
                headers: vec![("content-type".to_string(), "application/json".to_string())],
                body: self.body.clone(),
            })
        }
    }

    struct Unreachable;

    impl Transport for Unreachable {
        fn execute(&self, _request: &HttpRequest) -> Result<HttpResponse, ApiError> {
            Err(ApiError::Network("connection refused".to_string()))
        }
    }

    fn service<T: Transport>(transport: T) -> ListingService<T> {
        let client = ApiClient::new("http://localhost:8080", Arc::new(Session::with_token("tok")));
        ListingService::new(client, transport)
    }

    const EMPTY_PAGE: &str =
        r#"{"content":[],"number":0,"size":10,"totalPages":0,"totalElements":0,"first":true,"last":true}"#;

    #[test]
    fn listing_query_paths() {
        assert_eq!(ListingQuery::All { page: 2, size: 10 }.path(), "/api/listings?page=2&size=10");
        assert_eq!(
            ListingQuery::ByCategory { category_id: 3, page: 0, size: 10 }.path(),
            "/api/listings/category/3?page=0&size=10"
        );
        assert_eq!(
            ListingQuery::ByUser { user_id: "u-1".to_string(), page: 1, size: 5 }.path(),
            "/api/listings/user/u-1?page=1&size=5"
        );
    }

    #[test]
    fn search_omits_absent_filters() {
        assert_eq!(SearchParams::new("vinfast").path(), "/api/listings/search?q=vinfast&page=0&size=10");
    }

    #[test]
    fn search_sends_zero_valued_filters() {
        let params = SearchParams {
            category_id: Some(0),
            min_price: Some(0.0),
            max_price: Some(15000.5),
            ..SearchParams::new("pin")
        };
        assert_eq!(
            params.path(),
            "/api/listings/search?q=pin&page=0&size=10&categoryId=0&minPrice=0&maxPrice=15000.5"
        );
    }

    #[test]
    fn get_listings_hits_paged_endpoint() {
        let transport = Canned::new(200, EMPTY_PAGE);
        let page = service(&transport).get_listings(0, 10).unwrap();
        assert!(page.content.is_empty());
        let seen = transport.seen.borrow();
        assert_eq!(seen[0].url, "http://localhost:8080/api/listings?page=0&size=10");
        assert_eq!(seen[0].header("authorization"), Some("Bearer tok"));
    }

    #[test]
    fn envelope_breaking_invariant_is_rejected() {
        let transport = Canned::new(
            200,
            r#"{"content":[],"number":4,"size":10,"totalPages":2,"totalElements":12,"first":false,"last":true}"#,
        );
        let err = service(&transport).get_listings(4, 10).unwrap_err();
        assert!(matches!(err, ApiError::MalformedPage(_)));
    }

    #[test]
    fn categories_fall_back_on_http_error() {
        let categories = service(Canned::new(500, "")).get_categories();
        assert_eq!(categories, Category::defaults());
        assert_eq!(categories[1].category_name, "Motorbike");
    }

    #[test]
    fn categories_fall_back_on_network_error() {
        assert_eq!(service(Unreachable).get_categories(), Category::defaults());
    }

    #[test]
    fn subscription_limits_fall_back_to_free_tier() {
        let limits = service(Unreachable).check_subscription_limits();
        assert_eq!(limits, SubscriptionLimits::free_tier());
        assert_eq!(limits.max_listings, 1);
        assert_eq!(limits.current_listings, 0);
        assert!(limits.can_post);
        assert_eq!(limits.subscription_type, "FREE");
    }

    #[test]
    fn subscription_limits_pass_through_when_available() {
        let transport = Canned::new(
            200,
            r#"{"maxListings":10,"currentListings":3,"canPost":true,"subscriptionType":"PREMIUM"}"#,
        );
        let limits = service(&transport).check_subscription_limits();
        assert_eq!(limits.max_listings, 10);
        assert_eq!(limits.subscription_type, "PREMIUM");
    }

    #[test]
    fn creation_denied_at_free_tier_limit() {
        let transport = Canned::new(
            200,
            r#"{"maxListings":1,"currentListings":1,"canPost":false,"subscriptionType":"FREE"}"#,
        );
        let permission = service(&transport).can_user_create_listing();
        assert!(!permission.can_create);
        assert!(permission.upgrade_needed);
        assert_eq!(
            permission.reason.as_deref(),
            Some("You have reached the maximum number of listings (1) for your FREE subscription.")
        );
    }

    #[test]
    fn creation_denied_on_paid_tier_needs_no_upgrade() {
        let transport = Canned::new(
            200,
            r#"{"maxListings":20,"currentListings":20,"canPost":false,"subscriptionType":"PREMIUM"}"#,
        );
        let permission = service(&transport).can_user_create_listing();
        assert!(!permission.can_create);
        assert!(!permission.upgrade_needed);
    }

    #[test]
    fn cannot_post_below_limit_is_still_allowed() {
        let transport = Canned::new(
            200,
            r#"{"maxListings":5,"currentListings":2,"canPost":false,"subscriptionType":"FREE"}"#,
        );
        assert_eq!(service(&transport).can_user_create_listing(), ListingPermission::allowed());
    }

    #[test]
    fn creation_gate_fails_open() {
        assert_eq!(service(Unreachable).can_user_create_listing(), ListingPermission::allowed());
    }

    #[test]
    fn current_subscription_soft_fails_to_none() {
        assert!(service(Unreachable).get_current_user_subscription().is_none());
        assert!(service(Canned::new(200, "null")).get_current_user_subscription().is_none());
    }

    #[test]
    fn delete_accepts_no_content() {
        let transport = Canned::new(204, "");
        service(&transport).delete_listing("abc").unwrap();
        assert_eq!(transport.seen.borrow()[0].url, "http://localhost:8080/api/listings/abc");
    }

    #[test]
    fn network_errors_propagate_from_hard_operations() {
        let err = service(Unreachable).get_listing_by_id("abc").unwrap_err();
        assert!(matches!(err, ApiError::Network(_)));
    }
    #[test]
    fn listing_ids_are_encoded_as_one_segment() {
        let transport = Canned::new(204, "");
        let service = service(&transport);
        service.delete_listing("a/b?c#d").unwrap();
        let _ = service.get_listing_by_id("../categories");
        let _ = service.upload_listing_images("x y", &[]);
        let _ = service.get_user_listings("u/1", 0, 10);
        let seen: Vec<String> = transport.seen.borrow().iter().map(|r| r.url.clone()).collect();
        assert_eq!(
            seen,
            [
                "http://localhost:8080/api/listings/a%2Fb%3Fc%23d",
                "http://localhost:8080/api/listings/..%2Fcategories",
                "http://localhost:8080/api/listings/x%20y/images",
                "http://localhost:8080/api/listings/user/u%2F1?page=0&size=10",
            ]
        );
    }

    #[test]
    fn login_returns_token_and_user() {
        let transport = Canned::new(200, r#"{"token":"t-1","userId":"u1","userName":"An"}"#);
        let auth = service(&transport).login("an@example.com", "secret").unwrap();
        assert_eq!(auth.token, "t-1");
        assert_eq!(auth.user_id, "u1");
        assert_eq!(auth.user_name, "An");
        assert!(auth.message.is_none());
        assert_eq!(transport.seen.borrow()[0].url, "http://localhost:8080/api/auth/login");
    }

    #[test]
    fn auth_reply_without_token_is_a_deserialization_error() {
        let err = service(Canned::new(200, r#"{"userId":"u1","userName":"An","message":"ok"}"#))
            .register(&RegisterRequest {
                user_name: "An".to_string(),
                email: "an@example.com".to_string(),
                password: "secret".to_string(),
                phone: None,
            })
            .unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)), "got {err:?}");
    }
}
