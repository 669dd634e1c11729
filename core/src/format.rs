//! Presentation helpers for listing cards.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};

use crate::types::{Listing, SubscriptionTier};

/// Whole-dollar USD amount with thousands grouping: `$1,234`.
pub fn format_price(price: f64) -> String {
    if price.is_nan() {
        return "$NaN".to_string();
    }
    if price.is_infinite() {
        return if price > 0.0 { "$∞" } else { "-$∞" }.to_string();
    }
    let rounded = price.round();
    let sign = if rounded < 0.0 { "-" } else { "" };
    format!("{sign}${}", group_thousands(&format!("{:.0}", rounded.abs())))
}

/// Number with thousands grouping and at most three fraction digits.
pub fn format_number(value: f64) -> String {
    let fixed = format!("{:.3}", value.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');
    let sign = if value < 0.0 && (int_part != "0" || !frac.is_empty()) { "-" } else { "" };
    if frac.is_empty() {
        format!("{sign}{}", group_thousands(int_part))
    } else {
        format!("{sign}{}.{frac}", group_thousands(int_part))
    }
}

fn group_thousands(digits: &str) -> String {
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}

/// Long calendar date in Vietnamese style, e.g. `15 tháng 1, 2024`.
///
/// Accepts RFC 3339 timestamps, offset-less timestamps and bare dates.
/// Anything else renders as `Invalid Date`.
pub fn format_date(value: &str) -> String {
    match parse_date(value.trim()) {
        Some(date) => format!("{} tháng {}, {}", date.day(), date.month(), date.year()),
        None => "Invalid Date".to_string(),
    }
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

/// Badge classes for a listing status; unknown values share the gray badge.
pub fn status_color(status: &str) -> &'static str {
    match status {
        "ACTIVE" => "bg-green-100 text-green-800",
        "PENDING" => "bg-yellow-100 text-yellow-800",
        "REJECTED" => "bg-red-100 text-red-800",
        "EXPIRED" => "bg-gray-100 text-gray-800",
        _ => "bg-gray-100 text-gray-800",
    }
}

pub fn is_user_listing(listing: &Listing, current_user_id: &str) -> bool {
    listing.seller.user_id == current_user_id
}

/// Priority of a subscription tier; free tier and unset levels are 1.
pub fn subscription_priority(subscription: Option<&SubscriptionTier>) -> u32 {
    subscription
        .and_then(|s| s.priority_level)
        .filter(|level| *level != 0)
        .unwrap_or(1)
}

/// Secondary lines of a listing card. Zero values are not shown.
pub fn listing_highlights(listing: &Listing) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(mileage) = listing.mileage.filter(|m| *m != 0.0) {
        lines.push(format!("Mileage: {} km", format_number(mileage)));
    }
    if let Some(capacity) = listing.battery_capacity.filter(|c| *c != 0.0) {
        lines.push(format!("Battery: {} kWh", format_number(capacity)));
    }
    if let Some(seats) = listing.seats.filter(|s| *s != 0) {
        lines.push(format!("Seats: {seats}"));
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_has_no_decimals() {
        assert_eq!(format_price(0.0), "$0");
        assert_eq!(format_price(1234.0), "$1,234");
        assert_eq!(format_price(999.5), "$1,000");
        assert_eq!(format_price(25_000_000.0), "$25,000,000");
        assert_eq!(format_price(-1234.4), "-$1,234");
        assert_eq!(format_price(-0.2), "$0");
    }

    #[test]
    fn number_grouping_keeps_fractions() {
        assert_eq!(format_number(12345.0), "12,345");
        assert_eq!(format_number(12345.6), "12,345.6");
        assert_eq!(format_number(75.125), "75.125");
        assert_eq!(format_number(100.0), "100");
    }

    #[test]
    fn dates_render_long_form() {
        assert_eq!(format_date("2024-01-15T10:30:00"), "15 tháng 1, 2024");
        assert_eq!(format_date("2024-01-15T10:30:00.123456"), "15 tháng 1, 2024");
        assert_eq!(format_date("2023-12-01T00:00:00Z"), "1 tháng 12, 2023");
        assert_eq!(format_date("2023-12-01"), "1 tháng 12, 2023");
    }

    #[test]
    fn garbage_date_is_invalid() {
        assert_eq!(format_date("yesterday"), "Invalid Date");
        assert_eq!(format_date(""), "Invalid Date");
    }

    #[test]
    fn known_statuses_have_distinct_colors() {
        let known = ["ACTIVE", "PENDING", "REJECTED", "EXPIRED"].map(status_color);
        for (i, a) in known.iter().enumerate() {
            for b in &known[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn unknown_status_uses_stable_fallback() {
        assert_eq!(status_color("ARCHIVED"), "bg-gray-100 text-gray-800");
        assert_eq!(status_color(""), status_color("whatever"));
        assert_eq!(status_color("active"), status_color("ARCHIVED"));
    }

    #[test]
    fn subscription_priority_defaults_to_one() {
        assert_eq!(subscription_priority(None), 1);
        let tier = SubscriptionTier {
            priority_level: Some(0),
            ..SubscriptionTier::default()
        };
        assert_eq!(subscription_priority(Some(&tier)), 1);
        let tier = SubscriptionTier {
            priority_level: Some(3),
            ..SubscriptionTier::default()
        };
        assert_eq!(subscription_priority(Some(&tier)), 3);
    }
}
