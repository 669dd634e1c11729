//! Domain DTOs for the marketplace API.
//!
//! # Design
//! Field names follow the backend's camelCase JSON. The mock-server crate
//! defines its own copies; integration tests catch schema drift.
//! Read-side types are tolerant (`#[serde(default)]` on fields the backend
//! may omit), write-side types skip unset optionals.

use serde::{Deserialize, Serialize};

/// Lifecycle status of a listing. Unrecognised values deserialize to
/// `Unknown` instead of failing the whole page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ListingStatus {
    Active,
    Pending,
    Rejected,
    Expired,
    #[serde(other)]
    Unknown,
}

impl ListingStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ListingStatus::Active => "ACTIVE",
            ListingStatus::Pending => "PENDING",
            ListingStatus::Rejected => "REJECTED",
            ListingStatus::Expired => "EXPIRED",
            ListingStatus::Unknown => "UNKNOWN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    pub role_id: i64,
    pub role_name: String,
}

/// Subscription tier attached to a seller (`subid` in the backend schema).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct SubscriptionTier {
    pub sub_id: i64,
    pub sub_name: String,
    pub sub_details: String,
    pub sub_price: String,
    pub duration: String,
    pub priority_level: Option<u32>,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Seller {
    #[serde(rename = "userID")]
    pub user_id: String,
    #[serde(rename = "userName")]
    pub user_name: String,
    #[serde(rename = "userEmail", default)]
    pub user_email: String,
    #[serde(default)]
    pub dob: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub subid: Option<SubscriptionTier>,
    #[serde(rename = "userStatus", default)]
    pub user_status: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub category_id: i64,
    pub category_name: String,
}

impl Category {
    pub fn new(category_id: i64, category_name: &str) -> Self {
        Self {
            category_id,
            category_name: category_name.to_string(),
        }
    }

    /// Categories used when the backend enumeration is unavailable.
    pub fn defaults() -> Vec<Category> {
        vec![
            Category::new(ELECTRIC_CAR_CATEGORY, "Electric Car"),
            Category::new(MOTORBIKE_CATEGORY, "Motorbike"),
            Category::new(BATTERY_CATEGORY, "Battery"),
        ]
    }
}

pub const ELECTRIC_CAR_CATEGORY: i64 = 1;
pub const MOTORBIKE_CATEGORY: i64 = 2;
pub const BATTERY_CATEGORY: i64 = 3;

/// A sellable vehicle or battery as returned by the backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub listing_id: String,
    pub seller: Seller,
    pub category: Category,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(default)]
    pub warranty_info: Option<String>,
    #[serde(default)]
    pub seats: Option<u8>,
    #[serde(default)]
    pub vehicle_type: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub mileage: Option<f64>,
    #[serde(default)]
    pub battery_capacity: Option<f64>,
    #[serde(default)]
    pub capacity: Option<f64>,
    #[serde(default)]
    pub voltage: Option<f64>,
    #[serde(default)]
    pub cycle_count: Option<u32>,
    #[serde(default)]
    pub battery_life_remaining: Option<f64>,
    pub price: f64,
    /// Contact string shown on the listing card.
    #[serde(default)]
    pub contract: String,
    pub status: ListingStatus,
    pub created_at: String,
    #[serde(default)]
    pub updated_at: Option<String>,
}

/// Paged envelope returned by every list endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    /// Zero-based page index.
    pub number: u32,
    pub size: u32,
    pub total_pages: u32,
    pub total_elements: u64,
    #[serde(default)]
    pub first: bool,
    #[serde(default)]
    pub last: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_elements: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub empty: Option<bool>,
}

impl<T> Page<T> {
    /// Checks `content.len() <= size` and `number < max(total_pages, 1)`.
    pub fn check(&self) -> Result<(), String> {
        if self.content.len() > self.size as usize {
            return Err(format!(
                "{} items exceed page size {}",
                self.content.len(),
                self.size
            ));
        }
        if self.number >= self.total_pages.max(1) {
            return Err(format!(
                "page index {} out of range for {} pages",
                self.number, self.total_pages
            ));
        }
        Ok(())
    }
}

/// Creation payload built by the submission forms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateListingRequest {
    pub title: String,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seats: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capacity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_count: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_life_remaining: Option<f64>,
    pub price: f64,
    pub contract: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_info: Option<String>,
    pub category_id: i64,
}

/// Partial update payload. Only the fields present in the JSON are applied;
/// omitted fields remain unchanged on the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct UpdateListingRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub contract: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub warranty_info: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mileage: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_life_remaining: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionLimits {
    pub max_listings: u32,
    pub current_listings: u32,
    pub can_post: bool,
    pub subscription_type: String,
}

impl SubscriptionLimits {
    /// Limits assumed when the lookup endpoint cannot be reached.
    pub fn free_tier() -> Self {
        Self {
            max_listings: 1,
            current_listings: 0,
            can_post: true,
            subscription_type: "FREE".to_string(),
        }
    }
}

/// Outcome of the listing-creation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPermission {
    pub can_create: bool,
    pub reason: Option<String>,
    pub upgrade_needed: bool,
}

impl ListingPermission {
    pub fn allowed() -> Self {
        Self {
            can_create: true,
            reason: None,
            upgrade_needed: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub user_name: String,
    pub email: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Login and registration reply. A reply without a token is a schema error,
/// not an anonymous success.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    #[serde(default)]
    pub message: Option<String>,
}

/// One image file for a multipart upload.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}
