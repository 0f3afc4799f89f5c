//! Owner-scoped hotel and room administration.
//!
//! Every lookup treats "not yours" the same as "not there".

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::OwnedRwLockWriteGuard;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;

use super::{Engine, EngineError};

#[derive(Debug, Clone)]
pub struct NewHotel {
    pub name: String,
    pub city: String,
    pub country: String,
}

#[derive(Debug, Clone)]
pub struct NewRoomType {
    pub name: String,
    pub description: String,
    pub price_per_night: Decimal,
    pub max_adults: u32,
    pub max_children: u32,
    pub facilities: Vec<String>,
    pub image_urls: Vec<String>,
    /// Labels of the room numbers to create with the room type.
    pub room_numbers: Vec<String>,
}

fn check_name(field: &'static str, value: &str, max: usize) -> Result<(), EngineError> {
    if value.trim().is_empty() {
        return Err(EngineError::invalid(field, "must not be empty"));
    }
    if value.len() > max {
        return Err(EngineError::invalid(field, format!("must be at most {max} bytes")));
    }
    Ok(())
}

fn check_price(price: Decimal) -> Result<(), EngineError> {
    if price.is_sign_negative() {
        return Err(EngineError::invalid("pricePerNight", "must not be negative"));
    }
    if price > max_price_per_night() {
        return Err(EngineError::LimitExceeded("price per night too high"));
    }
    Ok(())
}

fn check_label(rt: &RoomType, label: &str) -> Result<(), EngineError> {
    check_name("roomNumber", label, MAX_LABEL_LEN)?;
    if rt
        .room_numbers
        .iter()
        .any(|rn| !rn.is_deleted() && rn.label == label)
    {
        return Err(EngineError::invalid(
            "roomNumber",
            format!("{label} already exists in this room type"),
        ));
    }
    Ok(())
}

impl Engine {
    pub async fn create_hotel(&self, owner_id: &str, new: NewHotel) -> Result<Hotel, EngineError> {
        check_name("name", &new.name, MAX_NAME_LEN)?;
        check_name("city", &new.city, MAX_NAME_LEN)?;
        check_name("country", &new.country, MAX_NAME_LEN)?;

        let _permit = self.commit_gate.read().await;
        let id = Ulid::new();
        self.persist_catalog(&Event::HotelCreated {
            id,
            owner_id: owner_id.to_string(),
            name: new.name,
            city: new.city,
            country: new.country,
        })
        .await?;
        tracing::info!(hotel = %id, "hotel created by {owner_id}");
        self.live_hotel(id)
    }

    pub async fn delete_hotel(&self, owner_id: &str, hotel_id: Ulid) -> Result<(), EngineError> {
        let _permit = self.commit_gate.read().await;
        self.owned_hotel(owner_id, hotel_id)?;
        self.persist_catalog(&Event::HotelDeleted {
            id: hotel_id,
            at: Utc::now(),
        })
        .await
    }

    /// Create a room type together with its initial room numbers.
    pub async fn create_room_type(
        &self,
        owner_id: &str,
        hotel_id: Ulid,
        new: NewRoomType,
    ) -> Result<RoomType, EngineError> {
        check_name("name", &new.name, MAX_NAME_LEN)?;
        if new.description.len() > MAX_DESCRIPTION_LEN {
            return Err(EngineError::LimitExceeded("description too long"));
        }
        check_price(new.price_per_night)?;
        if new.facilities.len() > MAX_FACILITIES {
            return Err(EngineError::LimitExceeded("too many facilities"));
        }
        if new.image_urls.len() > MAX_IMAGES {
            return Err(EngineError::LimitExceeded("too many images"));
        }
        if new.room_numbers.len() > MAX_ROOM_NUMBERS_PER_ROOM_TYPE {
            return Err(EngineError::LimitExceeded("too many room numbers"));
        }
        // Every label is checked before anything is persisted.
        for (i, label) in new.room_numbers.iter().enumerate() {
            check_name("roomNumber", label, MAX_LABEL_LEN)?;
            if new.room_numbers[..i].contains(label) {
                return Err(EngineError::invalid(
                    "roomNumber",
                    format!("{label} already exists in this room type"),
                ));
            }
        }

        let _permit = self.commit_gate.read().await;
        self.owned_hotel(owner_id, hotel_id)?;
        let id = Ulid::new();
        self.persist_catalog(&Event::RoomTypeCreated {
            id,
            hotel_id,
            name: new.name,
            description: new.description,
            price_per_night: new.price_per_night,
            max_adults: new.max_adults,
            max_children: new.max_children,
            facilities: new.facilities,
            image_urls: new.image_urls,
        })
        .await?;

        let shared = self
            .get_room_type(&id)
            .ok_or(EngineError::not_found("room type", id))?;
        let mut rt = shared.write().await;
        for label in new.room_numbers {
            check_label(&rt, &label)?;
            let event = Event::RoomNumberAdded {
                id: Ulid::new(),
                room_type_id: id,
                label,
            };
            self.persist_and_apply(&mut rt, &event).await?;
        }
        tracing::info!(room_type = %id, hotel = %hotel_id, "room type created with {} units", rt.room_numbers.len());
        Ok(rt.clone())
    }

    pub async fn update_room_price(
        &self,
        owner_id: &str,
        room_type_id: Ulid,
        price_per_night: Decimal,
    ) -> Result<RoomType, EngineError> {
        check_price(price_per_night)?;
        let _permit = self.commit_gate.read().await;
        let mut rt = self.owned_room_type(owner_id, room_type_id).await?;
        let event = Event::RoomTypeRepriced {
            id: room_type_id,
            price_per_night,
        };
        self.persist_and_apply(&mut rt, &event).await?;
        Ok(rt.clone())
    }

    pub async fn delete_room_type(&self, owner_id: &str, room_type_id: Ulid) -> Result<(), EngineError> {
        let _permit = self.commit_gate.read().await;
        let mut rt = self.owned_room_type(owner_id, room_type_id).await?;
        let event = Event::RoomTypeDeleted {
            id: room_type_id,
            at: Utc::now(),
        };
        self.persist_and_apply(&mut rt, &event).await
    }

    pub async fn add_room_number(
        &self,
        owner_id: &str,
        room_type_id: Ulid,
        label: String,
    ) -> Result<RoomNumber, EngineError> {
        let _permit = self.commit_gate.read().await;
        let mut rt = self.owned_room_type(owner_id, room_type_id).await?;
        if rt.room_numbers.len() >= MAX_ROOM_NUMBERS_PER_ROOM_TYPE {
            return Err(EngineError::LimitExceeded("too many room numbers"));
        }
        check_label(&rt, &label)?;

        let id = Ulid::new();
        let event = Event::RoomNumberAdded {
            id,
            room_type_id,
            label,
        };
        self.persist_and_apply(&mut rt, &event).await?;
        rt.room_number(&id)
            .cloned()
            .ok_or(EngineError::not_found("room number", id))
    }

    pub async fn delete_room_number(
        &self,
        owner_id: &str,
        room_type_id: Ulid,
        room_number_id: Ulid,
    ) -> Result<(), EngineError> {
        let _permit = self.commit_gate.read().await;
        let mut rt = self.owned_room_type(owner_id, room_type_id).await?;
        live_room_number(&rt, room_number_id)?;
        let event = Event::RoomNumberDeleted {
            id: room_number_id,
            room_type_id,
            at: Utc::now(),
        };
        self.persist_and_apply(&mut rt, &event).await
    }

    /// Take a unit out of service or put it back. Existing bookings are untouched.
    pub async fn set_out_of_service(
        &self,
        owner_id: &str,
        room_type_id: Ulid,
        room_number_id: Ulid,
        out_of_service: bool,
    ) -> Result<RoomNumber, EngineError> {
        let _permit = self.commit_gate.read().await;
        let mut rt = self.owned_room_type(owner_id, room_type_id).await?;
        live_room_number(&rt, room_number_id)?;
        let event = Event::RoomNumberServiceChanged {
            id: room_number_id,
            room_type_id,
            out_of_service,
        };
        self.persist_and_apply(&mut rt, &event).await?;
        rt.room_number(&room_number_id)
            .cloned()
            .ok_or(EngineError::not_found("room number", room_number_id))
    }

    fn owned_hotel(&self, owner_id: &str, hotel_id: Ulid) -> Result<Hotel, EngineError> {
        self.hotels
            .get(&hotel_id)
            .filter(|h| !h.is_deleted() && h.owner_id == owner_id)
            .map(|h| h.value().clone())
            .ok_or(EngineError::not_found("hotel", hotel_id))
    }

    /// Write-lock a live room type whose hotel `owner_id` owns.
    async fn owned_room_type(
        &self,
        owner_id: &str,
        room_type_id: Ulid,
    ) -> Result<OwnedRwLockWriteGuard<RoomType>, EngineError> {
        let guard = self
            .get_room_type(&room_type_id)
            .ok_or(EngineError::not_found("room type", room_type_id))?
            .write_owned()
            .await;
        if guard.is_deleted() || self.owned_hotel(owner_id, guard.hotel_id).is_err() {
            return Err(EngineError::not_found("room type", room_type_id));
        }
        Ok(guard)
    }
}

fn live_room_number(rt: &RoomType, room_number_id: Ulid) -> Result<(), EngineError> {
    match rt.room_number(&room_number_id) {
        Some(rn) if !rn.is_deleted() => Ok(()),
        _ => Err(EngineError::not_found("room number", room_number_id)),
    }
}
