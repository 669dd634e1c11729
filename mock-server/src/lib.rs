//! In-memory stand-in for the marketplace backend.
//!
//! Serves the `/api/...` endpoints the client consumes with Spring-style
//! paged envelopes. Users, tokens, listings and uploaded image names live in
//! a single `RwLock`-guarded store that is lost on exit.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::{net::TcpListener, sync::RwLock};
use uuid::Uuid;

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const FREE_TIER_LISTINGS: u32 = 1;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subscription {
    pub sub_id: i64,
    pub sub_name: String,
    pub sub_details: String,
    pub sub_price: String,
    pub duration: String,
    pub priority_level: u32,
    pub status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Seller {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userEmail")]
    pub user_email: String,
    pub dob: Option<String>,
    pub role: Role,
    pub phone: String,
    pub subid: Option<Subscription>,
    #[serde(rename = "userStatus")]
    pub user_status: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub listing_id: String,
    pub seller: Seller,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub warranty_info: Option<String>,
    pub seats: Option<u8>,
    pub vehicle_type: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub capacity: Option<f64>,
    pub voltage: Option<f64>,
    pub cycle_count: Option<u32>,
    pub battery_life_remaining: Option<f64>,
    pub price: f64,
    pub contract: String,
    pub status: String,
    pub created_at: String,
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListing {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    pub seats: Option<u8>,
    pub vehicle_type: Option<String>,
    pub color: Option<String>,
    pub mileage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub capacity: Option<f64>,
    pub voltage: Option<f64>,
    pub cycle_count: Option<u32>,
    pub battery_life_remaining: Option<f64>,
    pub price: f64,
    pub contract: String,
    pub warranty_info: Option<String>,
    pub category_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListing {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub contract: Option<String>,
    pub warranty_info: Option<String>,
    pub mileage: Option<f64>,
    pub battery_life_remaining: Option<f64>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub number: u32,
    pub size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    pub first: bool,
    pub last: bool,
    pub number_of_elements: u32,
    pub empty: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLimits {
    pub max_listings: u32,
    pub current_listings: u32,
    pub can_post: bool,
    pub subscription_type: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    pub phone: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
}

#[derive(Clone, Debug)]
struct User {
    seller: Seller,
    password: String,
}

#[derive(Debug, Default)]
pub struct Store {
    users: HashMap<String, User>,
    tokens: HashMap<String, String>,
    listings: Vec<Listing>,
    images: HashMap<String, Vec<String>>,
    categories: Vec<Category>,
}

impl Store {
    pub fn new() -> Self {
        Self {
            categories: vec![
                Category { category_id: 1, category_name: "Electric Car".to_string() },
                Category { category_id: 2, category_name: "Motorbike".to_string() },
                Category { category_id: 3, category_name: "Battery".to_string() },
            ],
            ..Self::default()
        }
    }

    fn user_listing_count(&self, user_id: &str) -> u32 {
        let count = self
            .listings
            .iter()
            .filter(|l| l.seller.user_id == user_id)
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}

pub type Db = Arc<RwLock<Store>>;

/// Error responses carry a JSON `message` the client can show verbatim.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("Authentication required")]
    Unauthorized,
    #[error("Invalid email or password")]
    BadCredentials,
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Conflict(String),
}

impl BackendError {
    fn status(&self) -> StatusCode {
        match self {
            BackendError::Unauthorized | BackendError::BadCredentials => StatusCode::UNAUTHORIZED,
            BackendError::Forbidden(_) => StatusCode::FORBIDDEN,
            BackendError::NotFound(_) => StatusCode::NOT_FOUND,
            BackendError::BadRequest(_) => StatusCode::BAD_REQUEST,
            BackendError::Conflict(_) => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for BackendError {
    fn into_response(self) -> Response {
        let status = self.status();
        tracing::debug!(%status, error = %self, "request rejected");
        (status, Json(json!({ "message": self.to_string() }))).into_response()
    }
}

type ApiResult<T> = Result<T, BackendError>;

pub fn app() -> Router {
    app_with(Arc::new(RwLock::new(Store::new())))
}

pub fn app_with(db: Db) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/categories", get(list_categories))
        .route("/api/listings", get(list_listings).post(create_listing))
        .route("/api/listings/search", get(search_listings))
        .route("/api/listings/category/{id}", get(listings_by_category))
        .route("/api/listings/user/{id}", get(listings_by_user))
        .route(
            "/api/listings/{id}",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .route("/api/listings/{id}/images", post(upload_images))
        .route("/api/users/subscription-limits", get(subscription_limits))
        .route("/api/users/current/subscription", get(current_subscription))
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

#[derive(Debug, Deserialize)]
pub struct Paging {
    page: Option<u32>,
    size: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
    category_id: Option<i64>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    page: Option<u32>,
    size: Option<u32>,
}

fn paginate(items: Vec<Listing>, page: Option<u32>, size: Option<u32>) -> Page<Listing> {
    let page = page.unwrap_or(0);
    let size = size.filter(|s| *s > 0).unwrap_or(DEFAULT_PAGE_SIZE);
    let total = items.len();
    let total_pages = u32::try_from(total.div_ceil(size as usize)).unwrap_or(u32::MAX);
    let content: Vec<Listing> = items
        .into_iter()
        .skip((page as usize).saturating_mul(size as usize))
        .take(size as usize)
        .collect();
    let count = u32::try_from(content.len()).unwrap_or(u32::MAX);
    Page {
        empty: content.is_empty(),
        content,
        number: page,
        size,
        total_pages,
        total_elements: total as u64,
        first: page == 0,
        last: page.saturating_add(1) >= total_pages,
        number_of_elements: count,
    }
}

/// Newest first.
fn newest_first<'a>(listings: impl Iterator<Item = &'a Listing>) -> Vec<Listing> {
    let mut items: Vec<Listing> = listings.cloned().collect();
    items.reverse();
    items
}

fn bearer(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn current_user<'a>(store: &'a Store, headers: &HeaderMap) -> ApiResult<&'a User> {
    let token = bearer(headers).ok_or(BackendError::Unauthorized)?;
    let user_id = store.tokens.get(token).ok_or(BackendError::Unauthorized)?;
    store.users.get(user_id).ok_or(BackendError::Unauthorized)
}

fn limits_for(store: &Store, user: &User) -> SubscriptionLimits {
    let current = store.user_listing_count(&user.seller.user_id);
    let (max, kind) = match &user.seller.subid {
        Some(sub) => (u32::MAX, sub.sub_name.to_uppercase()),
        None => (FREE_TIER_LISTINGS, "FREE".to_string()),
    };
    SubscriptionLimits {
        max_listings: max,
        current_listings: current,
        can_post: current < max,
        subscription_type: kind,
    }
}

fn now() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S")
        .to_string()
}

fn required(value: &str, field: &str) -> ApiResult<String> {
    let value = value.trim();
    if value.is_empty() {
        return Err(BackendError::BadRequest(format!("{field} is required")));
    }
    Ok(value.to_string())
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "UP" }))
}

fn issue_token(store: &mut Store, user_id: &str) -> String {
    let token = Uuid::new_v4().simple().to_string();
    store.tokens.insert(token.clone(), user_id.to_string());
    token
}

async fn register(
    State(db): State<Db>,
    Json(input): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let email = required(&input.email, "email")?.to_lowercase();
    let user_name = required(&input.user_name, "userName")?;
    required(&input.password, "password")?;

    let mut store = db.write().await;
    if store.users.values().any(|u| u.seller.user_email == email) {
        return Err(BackendError::Conflict("Email is already registered".to_string()));
    }
    let user_id = Uuid::new_v4().to_string();
    let seller = Seller {
        user_id: user_id.clone(),
        user_name: user_name.clone(),
        user_email: email,
        dob: None,
        role: Role { role_id: 2, role_name: "MEMBER".to_string() },
        phone: input.phone.unwrap_or_default(),
        subid: None,
        user_status: "ACTIVE".to_string(),
    };
    store.users.insert(user_id.clone(), User { seller, password: input.password });
    let token = issue_token(&mut store, &user_id);
    tracing::info!(%user_id, "user registered");
    Ok((StatusCode::CREATED, Json(AuthResponse { token, user_id, user_name })))
}

async fn login(State(db): State<Db>, Json(input): Json<LoginRequest>) -> ApiResult<Json<AuthResponse>> {
    let email = input.email.trim().to_lowercase();
    let mut store = db.write().await;
    let user = store
        .users
        .values()
        .find(|u| u.seller.user_email == email && u.password == input.password)
        .map(|u| u.seller.clone())
        .ok_or(BackendError::BadCredentials)?;
    let token = issue_token(&mut store, &user.user_id);
    Ok(Json(AuthResponse {
        token,
        user_id: user.user_id,
        user_name: user.user_name,
    }))
}

async fn list_categories(State(db): State<Db>) -> Json<Vec<Category>> {
    Json(db.read().await.categories.clone())
}

async fn list_listings(State(db): State<Db>, Query(paging): Query<Paging>) -> Json<Page<Listing>> {
    let store = db.read().await;
    Json(paginate(newest_first(store.listings.iter()), paging.page, paging.size))
}

async fn listings_by_category(
    State(db): State<Db>,
    Path(category_id): Path<i64>,
    Query(paging): Query<Paging>,
) -> Json<Page<Listing>> {
    let store = db.read().await;
    let items = newest_first(
        store
            .listings
            .iter()
            .filter(|l| l.category.category_id == category_id),
    );
    Json(paginate(items, paging.page, paging.size))
}

async fn listings_by_user(
    State(db): State<Db>,
    Path(user_id): Path<String>,
    Query(paging): Query<Paging>,
) -> Json<Page<Listing>> {
    let store = db.read().await;
    let items = newest_first(store.listings.iter().filter(|l| l.seller.user_id == user_id));
    Json(paginate(items, paging.page, paging.size))
}

async fn search_listings(State(db): State<Db>, Query(query): Query<SearchQuery>) -> Json<Page<Listing>> {
    let needle = query.q.trim().to_lowercase();
    let store = db.read().await;
    let items = newest_first(store.listings.iter().filter(|l| {
        let text_match = needle.is_empty()
            || [&l.title, &l.brand, &l.model, &l.description]
                .iter()
                .any(|field| field.to_lowercase().contains(&needle));
        text_match
            && query.category_id.is_none_or(|c| l.category.category_id == c)
            && query.min_price.is_none_or(|min| l.price >= min)
            && query.max_price.is_none_or(|max| l.price <= max)
    }));
    Json(paginate(items, query.page, query.size))
}

async fn get_listing(State(db): State<Db>, Path(id): Path<String>) -> ApiResult<Json<Listing>> {
    let store = db.read().await;
    store
        .listings
        .iter()
        .find(|l| l.listing_id == id)
        .cloned()
        .map(Json)
        .ok_or_else(|| BackendError::NotFound("Listing not found".to_string()))
}

async fn create_listing(
    State(db): State<Db>,
    headers: HeaderMap,
    Json(input): Json<CreateListing>,
) -> ApiResult<(StatusCode, Json<Listing>)> {
    let mut store = db.write().await;
    let user = current_user(&store, &headers)?.clone();

    let limits = limits_for(&store, &user);
    if !limits.can_post {
        return Err(BackendError::Forbidden(format!(
            "You have reached the maximum number of listings ({}) for your {} subscription.",
            limits.max_listings, limits.subscription_type
        )));
    }

    let category = store
        .categories
        .iter()
        .find(|c| c.category_id == input.category_id)
        .cloned()
        .ok_or_else(|| BackendError::BadRequest("Unknown category".to_string()))?;
    if input.price < 0.0 {
        return Err(BackendError::BadRequest("price must not be negative".to_string()));
    }

    let listing = Listing {
        listing_id: Uuid::new_v4().to_string(),
        seller: user.seller,
        category,
        title: required(&input.title, "title")?,
        description: input.description,
        brand: required(&input.brand, "brand")?,
        model: required(&input.model, "model")?,
        year: input.year,
        warranty_info: input.warranty_info,
        seats: input.seats,
        vehicle_type: input.vehicle_type,
        color: input.color,
        mileage: input.mileage,
        battery_capacity: input.battery_capacity,
        capacity: input.capacity,
        voltage: input.voltage,
        cycle_count: input.cycle_count,
        battery_life_remaining: input.battery_life_remaining,
        price: input.price,
        contract: required(&input.contract, "contract")?,
        status: "ACTIVE".to_string(),
        created_at: now(),
        updated_at: None,
    };
    store.listings.push(listing.clone());
    tracing::info!(listing_id = %listing.listing_id, "listing created");
    Ok((StatusCode::CREATED, Json(listing)))
}

fn owned_listing<'a>(store: &'a mut Store, id: &str, user_id: &str) -> ApiResult<&'a mut Listing> {
    let listing = store
        .listings
        .iter_mut()
        .find(|l| l.listing_id == id)
        .ok_or_else(|| BackendError::NotFound("Listing not found".to_string()))?;
    if listing.seller.user_id != user_id {
        return Err(BackendError::Forbidden("You do not own this listing".to_string()));
    }
    Ok(listing)
}

async fn update_listing(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    Json(input): Json<UpdateListing>,
) -> ApiResult<Json<Listing>> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?.seller.user_id.clone();
    let listing = owned_listing(&mut store, &id, &user_id)?;
    if let Some(title) = input.title {
        listing.title = required(&title, "title")?;
    }
    if let Some(description) = input.description {
        listing.description = description;
    }
    if let Some(price) = input.price {
        if price < 0.0 {
            return Err(BackendError::BadRequest("price must not be negative".to_string()));
        }
        listing.price = price;
    }
    if let Some(contract) = input.contract {
        listing.contract = required(&contract, "contract")?;
    }
    if let Some(warranty) = input.warranty_info {
        listing.warranty_info = Some(warranty);
    }
    if let Some(mileage) = input.mileage {
        listing.mileage = Some(mileage);
    }
    if let Some(life) = input.battery_life_remaining {
        listing.battery_life_remaining = Some(life);
    }
    listing.updated_at = Some(now());
    Ok(Json(listing.clone()))
}

async fn delete_listing(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let mut store = db.write().await;
    let user_id = current_user(&store, &headers)?.seller.user_id.clone();
    owned_listing(&mut store, &id, &user_id)?;
    store.listings.retain(|l| l.listing_id != id);
    store.images.remove(&id);
    Ok(StatusCode::NO_CONTENT)
}

async fn upload_images(
    State(db): State<Db>,
    Path(id): Path<String>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<String>>> {
    {
        let mut store = db.write().await;
        let user_id = current_user(&store, &headers)?.seller.user_id.clone();
        owned_listing(&mut store, &id, &user_id)?;
    }

    let mut names = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| BackendError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("images") {
            continue;
        }
        let file_name = field.file_name().unwrap_or("image").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| BackendError::BadRequest(e.to_string()))?;
        if bytes.is_empty() {
            return Err(BackendError::BadRequest(format!("{file_name} is empty")));
        }
        names.push(file_name);
    }
    if names.is_empty() {
        return Err(BackendError::BadRequest("No images provided".to_string()));
    }

    let mut store = db.write().await;
    let stored = store.images.entry(id.clone()).or_default();
    let urls: Vec<String> = names
        .into_iter()
        .map(|name| {
            let url = format!("/images/{id}/{}-{name}", stored.len());
            stored.push(url.clone());
            url
        })
        .collect();
    Ok(Json(urls))
}

async fn subscription_limits(State(db): State<Db>, headers: HeaderMap) -> ApiResult<Json<SubscriptionLimits>> {
    let store = db.read().await;
    let user = current_user(&store, &headers)?;
    Ok(Json(limits_for(&store, user)))
}

async fn current_subscription(
    State(db): State<Db>,
    headers: HeaderMap,
) -> ApiResult<Json<Option<Subscription>>> {
    let store = db.read().await;
    let user = current_user(&store, &headers)?;
    Ok(Json(user.seller.subid.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: &str, title: &str, category_id: i64, price: f64) -> Listing {
        Listing {
            listing_id: id.to_string(),
            seller: Seller {
                user_id: "u1".to_string(),
                user_name: "An".to_string(),
                user_email: "an@example.com".to_string(),
                dob: None,
                role: Role { role_id: 2, role_name: "MEMBER".to_string() },
                phone: String::new(),
                subid: None,
                user_status: "ACTIVE".to_string(),
            },
            category: Category { category_id, category_name: "Electric Car".to_string() },
            title: title.to_string(),
            description: String::new(),
            brand: "VinFast".to_string(),
            model: "VF8".to_string(),
            year: 2023,
            warranty_info: None,
            seats: None,
            vehicle_type: None,
            color: None,
            mileage: None,
            battery_capacity: None,
            capacity: None,
            voltage: None,
            cycle_count: None,
            battery_life_remaining: None,
            price,
            contract: "09".to_string(),
            status: "ACTIVE".to_string(),
            created_at: "2024-01-15T10:30:00".to_string(),
            updated_at: None,
        }
    }

    #[test]
    fn paginate_splits_and_flags() {
        let items: Vec<Listing> = (0..23).map(|i| listing(&i.to_string(), "x", 1, 1.0)).collect();
        let page = paginate(items.clone(), Some(2), Some(10));
        assert_eq!(page.content.len(), 3);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.total_elements, 23);
        assert!(page.last);
        assert!(!page.first);

        let page = paginate(items, None, None);
        assert_eq!(page.size, DEFAULT_PAGE_SIZE);
        assert!(page.first);
    }

    #[test]
    fn paginate_extreme_page_is_empty_and_last() {
        let items: Vec<Listing> = (0..3).map(|i| listing(&i.to_string(), "x", 1, 1.0)).collect();
        let page = paginate(items, Some(u32::MAX), Some(u32::MAX));
        assert!(page.empty);
        assert!(page.last);
        assert_eq!(page.number, u32::MAX);
        assert_eq!(page.total_elements, 3);
    }

    #[test]
    fn paginate_empty_store() {
        let page = paginate(Vec::new(), Some(0), Some(10));
        assert_eq!(page.total_pages, 0);
        assert!(page.empty);
        assert_eq!(page.number, 0);
    }

    #[test]
    fn listing_serializes_backend_field_names() {
        let json = serde_json::to_value(listing("l1", "VF8", 1, 30000.0)).unwrap();
        assert_eq!(json["listingId"], "l1");
        assert_eq!(json["seller"]["userID"], "u1");
        assert_eq!(json["category"]["categoryId"], 1);
        assert!(json["updatedAt"].is_null());
    }

    #[test]
    fn create_listing_rejects_missing_title() {
        let result: Result<CreateListing, _> =
            serde_json::from_str(r#"{"brand":"VinFast","model":"VF8","year":2023,"price":1,"contract":"09","categoryId":1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn bearer_requires_prefix_and_value() {
        let mut headers = HeaderMap::new();
        assert!(bearer(&headers).is_none());
        headers.insert(header::AUTHORIZATION, "Bearer abc".parse().unwrap());
        assert_eq!(bearer(&headers), Some("abc"));
        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer(&headers).is_none());
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer(&headers).is_none());
    }
}
