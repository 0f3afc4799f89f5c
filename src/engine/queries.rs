use ulid::Ulid;

use crate::model::*;

use super::finder::find_all_available;
use super::reconciler::validate_stay;
use super::{Engine, EngineError};

impl Engine {
    pub fn live_hotel(&self, hotel_id: Ulid) -> Result<Hotel, EngineError> {
        self.hotels
            .get(&hotel_id)
            .filter(|h| !h.is_deleted())
            .map(|h| h.value().clone())
            .ok_or(EngineError::not_found("hotel", hotel_id))
    }

    /// A live room type with its deleted room numbers left out.
    pub async fn room_type(&self, room_type_id: Ulid) -> Result<RoomType, EngineError> {
        let shared = self
            .get_room_type(&room_type_id)
            .ok_or(EngineError::not_found("room type", room_type_id))?;
        let mut rt = shared.read().await.clone();
        if rt.is_deleted() {
            return Err(EngineError::not_found("room type", room_type_id));
        }
        rt.room_numbers.retain(|rn| !rn.is_deleted());
        Ok(rt)
    }

    /// Live room types of a hotel, in the order they were added.
    pub async fn hotel_room_types(&self, hotel_id: Ulid) -> Result<Vec<RoomType>, EngineError> {
        let hotel = self.live_hotel(hotel_id)?;
        let mut out = Vec::with_capacity(hotel.room_type_ids.len());
        for id in &hotel.room_type_ids {
            match self.room_type(*id).await {
                Ok(rt) => out.push(rt),
                Err(EngineError::NotFound { .. }) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(out)
    }

    /// Room types of a hotel that can take the stay, each listing only the
    /// room numbers that are free for it.
    pub async fn available_rooms(
        &self,
        hotel_id: Ulid,
        window: StayWindow,
    ) -> Result<Vec<RoomType>, EngineError> {
        validate_stay(&window)?;
        let hotel = self.live_hotel(hotel_id)?;
        let mut snapshot = Vec::with_capacity(hotel.room_type_ids.len());
        for id in &hotel.room_type_ids {
            if let Some(shared) = self.get_room_type(id) {
                snapshot.push(shared.read().await.clone());
            }
        }
        Ok(find_all_available(snapshot, &window))
    }

    /// A user's bookings, newest first.
    pub fn bookings_for_user(&self, user_id: &str) -> Vec<Booking> {
        let mut out: Vec<Booking> = self
            .bookings
            .iter()
            .filter(|b| b.user_id == user_id)
            .map(|b| b.value().clone())
            .collect();
        out.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        out
    }

    /// Owners of a booking see it; admins see every booking.
    pub fn booking(&self, booking_id: Ulid, user_id: &str, is_admin: bool) -> Result<Booking, EngineError> {
        self.bookings
            .get(&booking_id)
            .filter(|b| is_admin || b.user_id == user_id)
            .map(|b| b.value().clone())
            .ok_or(EngineError::not_found("booking", booking_id))
    }
}
