//! Submission forms for vehicle and battery listings.
//!
//! # Design
//! Both flows share one controller parameterized by [`ListingKind`]: the
//! kind decides the default category, the accepted year range and which
//! attribute fields exist on the form. Text input is coerced field by
//! field; an empty numeric input means "unset", never zero.
//!
//! `submit` checks the session before anything else, so a signed-out user
//! never causes a network call.

use std::time::Duration;

use chrono::{Datelike, Local};
use thiserror::Error;

use super::{Navigation, Route};
use crate::error::ApiError;
use crate::service::ListingService;
use crate::session::Session;
use crate::transport::Transport;
use crate::types::{CreateListingRequest, Listing, BATTERY_CATEGORY, ELECTRIC_CAR_CATEGORY};

pub const LOGIN_REQUIRED: &str = "Please login to create a listing";
pub const CREATED: &str = "🎉 Listing created successfully!";
pub const CREATE_FAILED: &str = "Failed to create listing";
pub const REDIRECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListingKind {
    Vehicle,
    Battery,
}

impl ListingKind {
    pub fn default_category(self) -> i64 {
        match self {
            ListingKind::Vehicle => ELECTRIC_CAR_CATEGORY,
            ListingKind::Battery => BATTERY_CATEGORY,
        }
    }

    pub fn min_year(self) -> i32 {
        match self {
            ListingKind::Vehicle => 2000,
            ListingKind::Battery => 2010,
        }
    }

    pub fn heading(self) -> &'static str {
        match self {
            ListingKind::Vehicle => "Đăng tin bán xe điện",
            ListingKind::Battery => "Đăng tin bán pin xe điện",
        }
    }

    pub fn route(self) -> Route {
        match self {
            ListingKind::Vehicle => Route::NewVehicle,
            ListingKind::Battery => Route::NewBattery,
        }
    }

    pub fn has_field(self, field: FormField) -> bool {
        use FormField::*;
        match field {
            Seats | VehicleType | Color | Mileage => self == ListingKind::Vehicle,
            BatteryCapacity | Capacity | Voltage | CycleCount | BatteryLifeRemaining => {
                self == ListingKind::Battery
            }
            _ => true,
        }
    }
}

/// Form inputs, named after their HTML `name` attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Title,
    Description,
    Brand,
    Model,
    Year,
    Seats,
    VehicleType,
    Color,
    Mileage,
    BatteryCapacity,
    Capacity,
    Voltage,
    CycleCount,
    BatteryLifeRemaining,
    Price,
    Contract,
    WarrantyInfo,
    CategoryId,
    AgreeTerms,
}

impl FormField {
    pub const ALL: [FormField; 19] = [
        FormField::Title,
        FormField::Description,
        FormField::Brand,
        FormField::Model,
        FormField::Year,
        FormField::Seats,
        FormField::VehicleType,
        FormField::Color,
        FormField::Mileage,
        FormField::BatteryCapacity,
        FormField::Capacity,
        FormField::Voltage,
        FormField::CycleCount,
        FormField::BatteryLifeRemaining,
        FormField::Price,
        FormField::Contract,
        FormField::WarrantyInfo,
        FormField::CategoryId,
        FormField::AgreeTerms,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FormField::Title => "title",
            FormField::Description => "description",
            FormField::Brand => "brand",
            FormField::Model => "model",
            FormField::Year => "year",
            FormField::Seats => "seats",
            FormField::VehicleType => "vehicleType",
            FormField::Color => "color",
            FormField::Mileage => "mileage",
            FormField::BatteryCapacity => "batteryCapacity",
            FormField::Capacity => "capacity",
            FormField::Voltage => "voltage",
            FormField::CycleCount => "cycleCount",
            FormField::BatteryLifeRemaining => "batteryLifeRemaining",
            FormField::Price => "price",
            FormField::Contract => "contract",
            FormField::WarrantyInfo => "warrantyInfo",
            FormField::CategoryId => "categoryId",
            FormField::AgreeTerms => "agreeTerms",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum FormError {
    #[error("unknown form field `{0}`")]
    UnknownField(String),

    #[error("field `{0}` is not part of this form")]
    NotOnForm(&'static str),

    #[error("`{value}` is not a valid number for {field}")]
    NotANumber { field: &'static str, value: String },

    #[error("{0} is required")]
    Required(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: &'static str, min: f64, max: f64 },

    #[error("{field} must be at least {min}")]
    TooSmall { field: &'static str, min: f64 },

    #[error("you must accept the posting terms")]
    TermsNotAccepted,
}

/// Editable form state. Numeric fields stay `None` until filled.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingDraft {
    pub title: String,
    pub description: String,
    pub brand: String,
    pub model: String,
    pub year: Option<i32>,
    pub seats: Option<u8>,
    pub vehicle_type: String,
    pub color: String,
    pub mileage: Option<f64>,
    pub battery_capacity: Option<f64>,
    pub capacity: Option<f64>,
    pub voltage: Option<f64>,
    pub cycle_count: Option<u32>,
    pub battery_life_remaining: Option<f64>,
    pub price: Option<f64>,
    pub contract: String,
    pub warranty_info: String,
    pub category_id: Option<i64>,
    pub agree_terms: bool,
}

impl ListingDraft {
    pub fn blank(kind: ListingKind, current_year: i32) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            brand: String::new(),
            model: String::new(),
            year: Some(current_year),
            seats: None,
            vehicle_type: String::new(),
            color: String::new(),
            mileage: None,
            battery_capacity: None,
            capacity: None,
            voltage: None,
            cycle_count: None,
            battery_life_remaining: None,
            price: Some(0.0),
            contract: String::new(),
            warranty_info: String::new(),
            category_id: Some(kind.default_category()),
            agree_terms: false,
        }
    }
}

fn parse_num<N: std::str::FromStr>(field: FormField, raw: &str) -> Result<Option<N>, FormError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<N>().map(Some).map_err(|_| FormError::NotANumber {
        field: field.name(),
        value: raw.to_string(),
    })
}

fn parse_float(field: FormField, raw: &str) -> Result<Option<f64>, FormError> {
    match parse_num::<f64>(field, raw)? {
        Some(v) if !v.is_finite() => Err(FormError::NotANumber {
            field: field.name(),
            value: raw.trim().to_string(),
        }),
        other => Ok(other),
    }
}

fn parse_checkbox(raw: &str) -> bool {
    matches!(raw.trim().to_ascii_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

fn required_text(field: FormField, value: &str) -> Result<String, FormError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(FormError::Required(field.name()));
    }
    Ok(value.to_string())
}

fn optional_text(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}

fn check_range(field: FormField, value: Option<f64>, min: f64, max: f64) -> Result<(), FormError> {
    match value {
        Some(v) if v < min || v > max => Err(FormError::OutOfRange {
            field: field.name(),
            min,
            max,
        }),
        _ => Ok(()),
    }
}

/// What happened on submit.
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    Created(Listing),
    /// No session token; nothing was sent.
    NotSignedIn,
    /// Rejected by form validation; nothing was sent.
    Invalid(FormError),
    /// The backend or the network refused the request.
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct SubmitListingPage {
    kind: ListingKind,
    current_year: i32,
    draft: ListingDraft,
    error: Option<String>,
    success: Option<String>,
    navigation: Option<Navigation>,
}

impl SubmitListingPage {
    pub fn new(kind: ListingKind) -> Self {
        Self::for_year(kind, Local::now().year())
    }

    /// A form whose year defaults and bounds use `current_year`.
    pub fn for_year(kind: ListingKind, current_year: i32) -> Self {
        Self {
            kind,
            current_year,
            draft: ListingDraft::blank(kind, current_year),
            error: None,
            success: None,
            navigation: None,
        }
    }

    pub fn vehicle() -> Self {
        Self::new(ListingKind::Vehicle)
    }

    pub fn battery() -> Self {
        Self::new(ListingKind::Battery)
    }

    /// Entry guard: signed-out users are sent to the login page.
    pub fn guard(session: &Session) -> Option<Navigation> {
        if session.is_authenticated() {
            None
        } else {
            Some(Navigation::now(Route::Login))
        }
    }

    pub fn kind(&self) -> ListingKind {
        self.kind
    }

    pub fn draft(&self) -> &ListingDraft {
        &self.draft
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn success(&self) -> Option<&str> {
        self.success.as_deref()
    }

    /// Pending navigation, if any. Taking it clears it.
    pub fn take_navigation(&mut self) -> Option<Navigation> {
        self.navigation.take()
    }

    pub fn set_field_by_name(&mut self, name: &str, raw: &str) -> Result<(), FormError> {
        let field = FormField::from_name(name).ok_or_else(|| FormError::UnknownField(name.to_string()))?;
        self.set_field(field, raw)
    }

    /// Applies raw text input to one field.
    pub fn set_field(&mut self, field: FormField, raw: &str) -> Result<(), FormError> {
        if !self.kind.has_field(field) {
            return Err(FormError::NotOnForm(field.name()));
        }
        let d = &mut self.draft;
        match field {
            FormField::Title => d.title = raw.to_string(),
            FormField::Description => d.description = raw.to_string(),
            FormField::Brand => d.brand = raw.to_string(),
            FormField::Model => d.model = raw.to_string(),
            FormField::VehicleType => d.vehicle_type = raw.to_string(),
            FormField::Color => d.color = raw.to_string(),
            FormField::Contract => d.contract = raw.to_string(),
            FormField::WarrantyInfo => d.warranty_info = raw.to_string(),
            FormField::Year => d.year = parse_num(field, raw)?,
            FormField::Seats => d.seats = parse_num(field, raw)?,
            FormField::CycleCount => d.cycle_count = parse_num(field, raw)?,
            FormField::CategoryId => d.category_id = parse_num(field, raw)?,
            FormField::Mileage => d.mileage = parse_float(field, raw)?,
            FormField::BatteryCapacity => d.battery_capacity = parse_float(field, raw)?,
            FormField::Capacity => d.capacity = parse_float(field, raw)?,
            FormField::Voltage => d.voltage = parse_float(field, raw)?,
            FormField::BatteryLifeRemaining => d.battery_life_remaining = parse_float(field, raw)?,
            FormField::Price => d.price = parse_float(field, raw)?,
            FormField::AgreeTerms => d.agree_terms = parse_checkbox(raw),
        }
        Ok(())
    }

    /// Checks required fields and ranges and builds the creation payload.
    pub fn validate(&self) -> Result<CreateListingRequest, FormError> {
        let d = &self.draft;
        let kind = self.kind;

        let category_id = d.category_id.ok_or(FormError::Required(FormField::CategoryId.name()))?;
        let brand = required_text(FormField::Brand, &d.brand)?;
        let model = required_text(FormField::Model, &d.model)?;
        let year = d.year.ok_or(FormError::Required(FormField::Year.name()))?;
        let title = required_text(FormField::Title, &d.title)?;
        let price = d.price.ok_or(FormError::Required(FormField::Price.name()))?;
        let contract = required_text(FormField::Contract, &d.contract)?;

        check_range(
            FormField::Year,
            Some(f64::from(year)),
            f64::from(kind.min_year()),
            f64::from(self.current_year + 1),
        )?;
        if price < 0.0 {
            return Err(FormError::TooSmall {
                field: FormField::Price.name(),
                min: 0.0,
            });
        }
        check_range(FormField::Seats, d.seats.map(f64::from), 1.0, 8.0)?;
        check_range(FormField::BatteryLifeRemaining, d.battery_life_remaining, 0.0, 100.0)?;
        if !d.agree_terms {
            return Err(FormError::TermsNotAccepted);
        }

        Ok(CreateListingRequest {
            title,
            description: d.description.trim().to_string(),
            brand,
            model,
            year,
            seats: d.seats,
            vehicle_type: optional_text(&d.vehicle_type),
            color: optional_text(&d.color),
            mileage: d.mileage,
            battery_capacity: d.battery_capacity,
            capacity: d.capacity,
            voltage: d.voltage,
            cycle_count: d.cycle_count,
            battery_life_remaining: d.battery_life_remaining,
            price,
            contract,
            warranty_info: optional_text(&d.warranty_info),
            category_id,
        })
    }

    pub fn submit<T: Transport>(&mut self, service: &ListingService<T>) -> SubmitOutcome {
        self.error = None;
        self.success = None;

        if !service.client().session().is_authenticated() {
            self.error = Some(LOGIN_REQUIRED.to_string());
            return SubmitOutcome::NotSignedIn;
        }

        let request = match self.validate() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.to_string());
                return SubmitOutcome::Invalid(e);
            }
        };

        match service.create_listing(&request) {
            Ok(listing) => {
                self.success = Some(CREATED.to_string());
                self.draft = ListingDraft::blank(self.kind, self.current_year);
                self.navigation = Some(Navigation {
                    to: Route::Listings,
                    after: REDIRECT_DELAY,
                });
                SubmitOutcome::Created(listing)
            }
            Err(e) => {
                tracing::error!(error = %e, kind = ?self.kind, "listing creation failed");
                let message = failure_message(&e);
                self.error = Some(message.clone());
                SubmitOutcome::Failed(message)
            }
        }
    }
}

fn failure_message(err: &ApiError) -> String {
    match err {
        ApiError::Http { .. } => err.server_message().unwrap_or_else(|| CREATE_FAILED.to_string()),
        other => other.to_string(),
    }
}
