use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Half-open stay `[check_in, check_out)` in calendar days.
///
/// The check-out day is not occupied, so a stay ending on day D and one
/// starting on day D never overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StayWindow {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayWindow {
    /// Returns `None` unless `check_in < check_out`.
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> Option<Self> {
        (check_in < check_out).then_some(Self { check_in, check_out })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    pub fn overlaps(&self, other: &StayWindow) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    pub fn contains_day(&self, day: NaiveDate) -> bool {
        self.check_in <= day && day < self.check_out
    }

    /// Returns true if `self` fully contains `other`.
    pub fn contains_window(&self, other: &StayWindow) -> bool {
        self.check_in <= other.check_in && other.check_out <= self.check_out
    }
}

/// A block on a room number, tagged with the booking that placed it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockedRange {
    pub booking_id: Ulid,
    pub window: StayWindow,
}

/// One physical, individually bookable unit of a room type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomNumber {
    pub id: Ulid,
    pub room_type_id: Ulid,
    pub label: String,
    pub is_out_of_service: bool,
    /// Sorted by `window.check_in`.
    pub unavailable: Vec<BlockedRange>,
    /// Every booking ever placed on this unit. Cancellation leaves entries here.
    pub booking_ids: Vec<Ulid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RoomNumber {
    pub fn new(id: Ulid, room_type_id: Ulid, label: String) -> Self {
        Self {
            id,
            room_type_id,
            label,
            is_out_of_service: false,
            unavailable: Vec::new(),
            booking_ids: Vec::new(),
            deleted_at: None,
        }
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    /// Blocks whose window overlaps `query`.
    /// Uses binary search to skip blocks starting at or after `query.check_out`.
    pub fn overlapping(&self, query: &StayWindow) -> impl Iterator<Item = &BlockedRange> {
        let right_bound = self
            .unavailable
            .partition_point(|b| b.window.check_in < query.check_out);
        self.unavailable[..right_bound]
            .iter()
            .filter(move |b| b.window.check_out > query.check_in)
    }
}

/// A bookable category within a hotel. Owns its room numbers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomType {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub name: String,
    pub description: String,
    #[serde(with = "rust_decimal::serde::str")]
    pub price_per_night: Decimal,
    pub max_adults: u32,
    pub max_children: u32,
    pub facilities: Vec<String>,
    pub image_urls: Vec<String>,
    pub room_numbers: Vec<RoomNumber>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl RoomType {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }

    pub fn room_number(&self, id: &Ulid) -> Option<&RoomNumber> {
        self.room_numbers.iter().find(|rn| rn.id == *id)
    }

    pub fn room_number_mut(&mut self, id: &Ulid) -> Option<&mut RoomNumber> {
        self.room_numbers.iter_mut().find(|rn| rn.id == *id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hotel {
    pub id: Ulid,
    pub owner_id: String,
    pub name: String,
    pub city: String,
    pub country: String,
    pub room_type_ids: Vec<Ulid>,
    pub booking_ids: Vec<Ulid>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl Hotel {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BookingStatus {
    /// Payment not yet confirmed. Never persisted: bookings are only
    /// written after the payment collaborator reports success.
    Pending,
    Paid,
    Cancelled,
}

impl BookingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "PENDING",
            BookingStatus::Paid => "PAID",
            BookingStatus::Cancelled => "CANCELLED",
        }
    }
}

/// Guest contact details copied into the booking at creation time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuestInfo {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub citizen_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Booking {
    pub id: Ulid,
    pub hotel_id: Ulid,
    pub room_number_id: Ulid,
    pub user_id: String,
    pub guest: GuestInfo,
    pub window: StayWindow,
    pub status: BookingStatus,
    pub cancelled_by: Option<String>,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_cost: Decimal,
    pub payment_intent_id: String,
    pub created_at: DateTime<Utc>,
}

/// The event types. This is the WAL record format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    HotelCreated {
        id: Ulid,
        owner_id: String,
        name: String,
        city: String,
        country: String,
    },
    HotelDeleted {
        id: Ulid,
        at: DateTime<Utc>,
    },
    RoomTypeCreated {
        id: Ulid,
        hotel_id: Ulid,
        name: String,
        description: String,
        #[serde(with = "rust_decimal::serde::str")]
        price_per_night: Decimal,
        max_adults: u32,
        max_children: u32,
        facilities: Vec<String>,
        image_urls: Vec<String>,
    },
    RoomTypeRepriced {
        id: Ulid,
        #[serde(with = "rust_decimal::serde::str")]
        price_per_night: Decimal,
    },
    RoomTypeDeleted {
        id: Ulid,
        at: DateTime<Utc>,
    },
    RoomNumberAdded {
        id: Ulid,
        room_type_id: Ulid,
        label: String,
    },
    RoomNumberServiceChanged {
        id: Ulid,
        room_type_id: Ulid,
        out_of_service: bool,
    },
    RoomNumberDeleted {
        id: Ulid,
        room_type_id: Ulid,
        at: DateTime<Utc>,
    },
    /// Blocks the room number, records the booking and links it to the hotel.
    BookingCreated {
        room_type_id: Ulid,
        booking: Booking,
    },
    BookingCancelled {
        id: Ulid,
        room_type_id: Ulid,
        cancelled_by: String,
    },
    /// Administrative hard delete: unblocks and unlinks everywhere.
    BookingDeleted {
        id: Ulid,
        room_type_id: Ulid,
    },
}

impl Event {
    /// The existing room type this event mutates. Its lock guards the event.
    pub fn target_room_type(&self) -> Option<Ulid> {
        match self {
            Event::RoomTypeRepriced { id, .. } | Event::RoomTypeDeleted { id, .. } => Some(*id),
            Event::RoomNumberAdded { room_type_id, .. }
            | Event::RoomNumberServiceChanged { room_type_id, .. }
            | Event::RoomNumberDeleted { room_type_id, .. }
            | Event::BookingCreated { room_type_id, .. }
            | Event::BookingCancelled { room_type_id, .. }
            | Event::BookingDeleted { room_type_id, .. } => Some(*room_type_id),
            Event::HotelCreated { .. }
            | Event::HotelDeleted { .. }
            | Event::RoomTypeCreated { .. } => None,
        }
    }
}
