use tokio::sync::oneshot;

use crate::model::*;
use crate::observability::WAL_COMPACTIONS_TOTAL;

use super::{Engine, EngineError, WalCommand};

impl Engine {
    /// Rewrite the WAL as the minimal event set that recreates current state.
    ///
    /// Holds the commit gate exclusively, so no mutation is in flight between
    /// reading state and swapping the file. Returns the number of events written.
    pub async fn compact_wal(&self) -> Result<usize, EngineError> {
        let _gate = self.commit_gate.write().await;
        let events = self.snapshot_events().await;
        let count = events.len();

        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Snapshot { events, response: tx })
            .await
            .map_err(|_| EngineError::Wal("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Wal("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::Wal(e.to_string()))?;

        metrics::counter!(WAL_COMPACTIONS_TOTAL).increment(1);
        tracing::info!("compacted WAL to {count} events");
        Ok(count)
    }

    /// Per hotel: the hotel, its room types in link order, then its bookings
    /// in link order. Link order is what replay rebuilds the id lists from.
    async fn snapshot_events(&self) -> Vec<Event> {
        let mut hotels: Vec<Hotel> = self.hotels.iter().map(|e| e.value().clone()).collect();
        hotels.sort_by_key(|h| h.id);

        let mut events = Vec::new();
        for hotel in hotels {
            events.push(Event::HotelCreated {
                id: hotel.id,
                owner_id: hotel.owner_id.clone(),
                name: hotel.name.clone(),
                city: hotel.city.clone(),
                country: hotel.country.clone(),
            });
            if let Some(at) = hotel.deleted_at {
                events.push(Event::HotelDeleted { id: hotel.id, at });
            }

            for room_type_id in &hotel.room_type_ids {
                let Some(shared) = self.get_room_type(room_type_id) else {
                    continue;
                };
                let rt = shared.read().await;
                emit_room_type(&rt, &mut events);
            }

            for booking_id in &hotel.booking_ids {
                let Some(booking) = self.bookings.get(booking_id).map(|b| b.value().clone()) else {
                    continue;
                };
                let Some(room_type_id) = self.room_type_for_room_number(&booking.room_number_id)
                else {
                    continue;
                };
                events.push(Event::BookingCreated { room_type_id, booking });
            }
        }
        events
    }

    pub async fn wal_appends_since_snapshot(&self) -> u64 {
        let (tx, rx) = oneshot::channel();
        if self
            .wal_tx
            .send(WalCommand::AppendsSinceSnapshot { response: tx })
            .await
            .is_err()
        {
            return 0;
        }
        rx.await.unwrap_or(0)
    }
}

fn emit_room_type(rt: &RoomType, events: &mut Vec<Event>) {
    events.push(Event::RoomTypeCreated {
        id: rt.id,
        hotel_id: rt.hotel_id,
        name: rt.name.clone(),
        description: rt.description.clone(),
        price_per_night: rt.price_per_night,
        max_adults: rt.max_adults,
        max_children: rt.max_children,
        facilities: rt.facilities.clone(),
        image_urls: rt.image_urls.clone(),
    });
    for rn in &rt.room_numbers {
        events.push(Event::RoomNumberAdded {
            id: rn.id,
            room_type_id: rt.id,
            label: rn.label.clone(),
        });
        if rn.is_out_of_service {
            events.push(Event::RoomNumberServiceChanged {
                id: rn.id,
                room_type_id: rt.id,
                out_of_service: true,
            });
        }
        if let Some(at) = rn.deleted_at {
            events.push(Event::RoomNumberDeleted {
                id: rn.id,
                room_type_id: rt.id,
                at,
            });
        }
    }
    if let Some(at) = rt.deleted_at {
        events.push(Event::RoomTypeDeleted { id: rt.id, at });
    }
}
