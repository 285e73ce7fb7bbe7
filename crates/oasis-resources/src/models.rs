use chrono::{DateTime, Utc};
use oasis_core::Model;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Cabin
// ---------------------------------------------------------------------------

/// A rentable cabin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cabin {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub max_capacity: u32,
    pub regular_price: f64,
    #[serde(default)]
    pub discount: f64,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Cabin {
    const COLLECTION: &'static str = "cabins";
}

// ---------------------------------------------------------------------------
// Guest
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Guest {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub full_name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nationality: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_flag: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Guest {
    const COLLECTION: &'static str = "guests";
}

// ---------------------------------------------------------------------------
// Booking
// ---------------------------------------------------------------------------

/// Lifecycle of a booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BookingStatus {
    #[default]
    Unconfirmed,
    CheckedIn,
    CheckedOut,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Booking {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub cabin_id: String,
    pub guest_id: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub num_nights: u32,
    pub num_guests: u32,
    pub cabin_price: f64,
    #[serde(default)]
    pub extras_price: f64,
    pub total_price: f64,
    #[serde(default)]
    pub status: BookingStatus,
    #[serde(default)]
    pub has_breakfast: bool,
    #[serde(default)]
    pub is_paid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub observations: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Booking {
    const COLLECTION: &'static str = "bookings";
}

// ---------------------------------------------------------------------------
// Review
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub cabin_id: String,
    pub user_id: String,
    pub rating: u8,
    pub review: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Review {
    const COLLECTION: &'static str = "reviews";
}

// ---------------------------------------------------------------------------
// Setting
// ---------------------------------------------------------------------------

/// Hotel-wide booking rules. The collection normally holds a single document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Setting {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub min_booking_length: u32,
    pub max_booking_length: u32,
    pub max_guests_per_booking: u32,
    pub breakfast_price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Setting {
    const COLLECTION: &'static str = "settings";
}

// ---------------------------------------------------------------------------
// Bookmark
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub user_id: String,
    pub cabin_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Model for Bookmark {
    const COLLECTION: &'static str = "bookmarks";
}

// ---------------------------------------------------------------------------
// User
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "String::is_empty")]
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

fn default_active() -> bool {
    true
}

impl Model for User {
    const COLLECTION: &'static str = "users";
}
