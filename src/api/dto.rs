//! JSON request and response bodies. Money is a JSON number on the wire.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;
use validator::Validate;

use crate::engine::PaymentQuote;
use crate::model::{Booking, BookingStatus, Hotel, RoomNumber, RoomType};

// ── Requests ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentRequest {
    /// Echo of the path parameter; ignored when absent.
    pub hotel_id: Option<String>,
    #[validate(range(min = 1, message = "must be at least 1"))]
    pub number_of_nights: Option<i64>,
    #[validate(length(min = 1, message = "is required"))]
    pub room_type: String,
    #[validate(length(min = 1, message = "is required"))]
    pub check_in: String,
    #[validate(length(min = 1, message = "is required"))]
    pub check_out: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub last_name: String,
    #[validate(email(message = "must be a valid email"))]
    pub email: String,
    #[validate(length(max = 64))]
    pub phone: Option<String>,
    #[serde(rename = "citizen_id")]
    #[validate(length(max = 64))]
    pub citizen_id: Option<String>,
    #[validate(length(min = 1, message = "is required"))]
    pub check_in: String,
    #[validate(length(min = 1, message = "is required"))]
    pub check_out: String,
    #[validate(length(min = 1, message = "is required"))]
    pub room_type: String,
    #[validate(length(min = 1, message = "is required"))]
    pub payment_intent_id: String,
    /// Client-side figures are accepted for compatibility but never trusted.
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub total_cost: Option<Decimal>,
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityQuery {
    pub check_in_date: Option<String>,
    pub check_out_date: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateHotelRequest {
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub name: String,
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub city: String,
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub country: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomTypeRequest {
    #[validate(length(min = 1, max = 256, message = "is required"))]
    pub room_type: String,
    #[serde(default)]
    #[validate(length(max = 4096))]
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    #[validate(range(min = 1, max = 20))]
    pub max_adult: u32,
    #[serde(default)]
    #[validate(range(max = 20))]
    pub max_child: u32,
    #[serde(default)]
    pub room_facilities: Vec<String>,
    #[serde(default)]
    pub image_urls: Vec<String>,
    #[serde(default)]
    pub room_numbers: Vec<String>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePriceRequest {
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddRoomNumberRequest {
    #[validate(length(min = 1, max = 64, message = "is required"))]
    pub room_number_name: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OutOfServiceRequest {
    pub is_out_of_service: bool,
}

// ── Responses ────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentIntentResponse {
    pub payment_intent_id: String,
    pub client_secret: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
}

impl From<PaymentQuote> for PaymentIntentResponse {
    fn from(q: PaymentQuote) -> Self {
        Self {
            payment_intent_id: q.payment_intent_id,
            client_secret: q.client_secret,
            total_cost: q.total_cost,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_number_id: Ulid,
    pub user_id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "citizen_id")]
    pub citizen_id: Option<String>,
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
    pub status: BookingStatus,
    pub cancelled_by: Option<String>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total_cost: Decimal,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            hotel_id: b.hotel_id,
            room_number_id: b.room_number_id,
            user_id: b.user_id,
            first_name: b.guest.first_name,
            last_name: b.guest.last_name,
            email: b.guest.email,
            phone: b.guest.phone,
            citizen_id: b.guest.citizen_id,
            check_in: b.window.check_in,
            check_out: b.window.check_out,
            status: b.status,
            cancelled_by: b.cancelled_by,
            total_cost: b.total_cost,
            payment_intent_id: b.payment_intent_id,
            created_at: b.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomNumberView {
    pub id: Ulid,
    pub room_number_name: String,
    pub is_out_of_service: bool,
}

impl From<RoomNumber> for RoomNumberView {
    fn from(rn: RoomNumber) -> Self {
        Self {
            id: rn.id,
            room_number_name: rn.label,
            is_out_of_service: rn.is_out_of_service,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomTypeView {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_type: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price_per_night: Decimal,
    pub max_adult: u32,
    pub max_child: u32,
    pub room_facilities: Vec<String>,
    pub image_urls: Vec<String>,
    pub room_numbers: Vec<RoomNumberView>,
}

impl From<RoomType> for RoomTypeView {
    fn from(rt: RoomType) -> Self {
        Self {
            id: rt.id,
            hotel_id: rt.hotel_id,
            room_type: rt.name,
            description: rt.description,
            price_per_night: rt.price_per_night,
            max_adult: rt.max_adults,
            max_child: rt.max_children,
            room_facilities: rt.facilities,
            image_urls: rt.image_urls,
            room_numbers: rt
                .room_numbers
                .into_iter()
                .filter(|rn| !rn.is_deleted())
                .map(RoomNumberView::from)
                .collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HotelView {
    pub id: Ulid,
    pub user_id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub room_types: Vec<RoomTypeView>,
}

impl HotelView {
    pub fn new(hotel: Hotel, room_types: Vec<RoomType>) -> Self {
        Self {
            id: hotel.id,
            user_id: hotel.owner_id,
            name: hotel.name,
            city: hotel.city,
            country: hotel.country,
            room_types: room_types.into_iter().map(RoomTypeView::from).collect(),
        }
    }
}
