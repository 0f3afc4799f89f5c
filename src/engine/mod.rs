mod catalog;
mod error;
mod finder;
mod inventory;
mod queries;
mod reconciler;
mod snapshot;

pub use catalog::{NewHotel, NewRoomType};
pub use error::EngineError;
pub use finder::{find_all_available, find_available};
pub use inventory::{AuditTrail, block, is_free, set_out_of_service, unblock};
pub use reconciler::{NewBooking, PaymentQuote};

use std::io;
use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{RwLock, mpsc, oneshot};
use ulid::Ulid;

use crate::model::*;
use crate::notify::NotifyHub;
use crate::payment::PaymentGateway;
use crate::wal::Wal;

/// A room type and its room numbers are one unit of contention.
pub type SharedRoomType = Arc<RwLock<RoomType>>;

// ── Group-commit WAL channel ─────────────────────────────

pub(super) enum WalCommand {
    Append {
        event: Event,
        response: oneshot::Sender<io::Result<()>>,
    },
    Snapshot {
        events: Vec<Event>,
        response: oneshot::Sender<io::Result<()>>,
    },
    AppendsSinceSnapshot {
        response: oneshot::Sender<u64>,
    },
}

/// Background task that owns the WAL and batches appends for group commit:
/// take the first append, drain whatever else is already queued, then
/// flush + fsync once and answer every sender with the shared result.
async fn wal_writer_loop(mut wal: Wal, mut rx: mpsc::Receiver<WalCommand>) {
    while let Some(cmd) = rx.recv().await {
        let (event, response) = match cmd {
            WalCommand::Append { event, response } => (event, response),
            other => {
                handle_non_append(&mut wal, other);
                continue;
            }
        };
        let mut batch = vec![(event, response)];
        let mut deferred = None;
        while let Ok(next) = rx.try_recv() {
            match next {
                WalCommand::Append { event, response } => batch.push((event, response)),
                other => {
                    deferred = Some(other);
                    break;
                }
            }
        }

        metrics::histogram!(crate::observability::WAL_FLUSH_BATCH_SIZE).record(batch.len() as f64);
        let flush_start = std::time::Instant::now();
        let result = flush_batch(&mut wal, &batch);
        metrics::histogram!(crate::observability::WAL_FLUSH_DURATION_SECONDS)
            .record(flush_start.elapsed().as_secs_f64());
        if let Err(e) = &result {
            tracing::error!("WAL flush of {} events failed: {e}", batch.len());
        }
        for (_, tx) in batch {
            let _ = tx.send(
                result
                    .as_ref()
                    .map(|()| ())
                    .map_err(|e| io::Error::new(e.kind(), e.to_string())),
            );
        }

        if let Some(cmd) = deferred {
            handle_non_append(&mut wal, cmd);
        }
    }
}

fn flush_batch(wal: &mut Wal, batch: &[(Event, oneshot::Sender<io::Result<()>>)]) -> io::Result<()> {
    let appended = batch
        .iter()
        .try_for_each(|(event, _)| wal.append_buffered(event));
    // Flush even after a failed append so half-written bytes don't leak into the next batch.
    let flushed = wal.flush_sync();
    appended.and(flushed)
}

fn handle_non_append(wal: &mut Wal, cmd: WalCommand) {
    match cmd {
        WalCommand::Snapshot { events, response } => {
            let result =
                Wal::write_snapshot(wal.path(), &events).and_then(|()| wal.swap_snapshot());
            let _ = response.send(result);
        }
        WalCommand::AppendsSinceSnapshot { response } => {
            let _ = response.send(wal.appends_since_snapshot());
        }
        WalCommand::Append { event, response } => {
            let result = wal.append_buffered(&event).and_then(|()| wal.flush_sync());
            let _ = response.send(result);
        }
    }
}

/// The availability engine: hotels, room types, bookings, and the log behind them.
pub struct Engine {
    pub(super) hotels: DashMap<Ulid, Hotel>,
    pub(super) room_types: DashMap<Ulid, SharedRoomType>,
    pub(super) bookings: DashMap<Ulid, Booking>,
    /// Reverse lookup: room number id → owning room type id.
    pub(super) room_number_index: DashMap<Ulid, Ulid>,
    /// Payment intent id → the booking it paid for. An intent backs one booking.
    pub(super) payment_intents: DashMap<String, Ulid>,
    pub(super) wal_tx: mpsc::Sender<WalCommand>,
    /// Every mutation holds a shared permit for its whole critical section,
    /// taken before any room type lock. Compaction takes it exclusively.
    pub(super) commit_gate: RwLock<()>,
    pub(super) payments: Arc<dyn PaymentGateway>,
    pub(super) currency: String,
    pub notify: Arc<NotifyHub>,
}

impl Engine {
    pub fn new(
        wal_path: PathBuf,
        payments: Arc<dyn PaymentGateway>,
        notify: Arc<NotifyHub>,
    ) -> io::Result<Self> {
        let events = Wal::replay(&wal_path)?;
        let wal = Wal::open(&wal_path)?;
        let (wal_tx, wal_rx) = mpsc::channel(4096);
        tokio::spawn(wal_writer_loop(wal, wal_rx));

        let engine = Self {
            hotels: DashMap::new(),
            room_types: DashMap::new(),
            bookings: DashMap::new(),
            room_number_index: DashMap::new(),
            payment_intents: DashMap::new(),
            wal_tx,
            commit_gate: RwLock::new(()),
            payments,
            currency: "thb".into(),
            notify,
        };

        // We're the sole owner of every Arc during replay, so try_write never
        // contends. Never block here: this may run inside an async context.
        for event in &events {
            match event.target_room_type() {
                None => engine.apply_catalog(event),
                Some(room_type_id) => {
                    let Some(shared) = engine.get_room_type(&room_type_id) else {
                        tracing::warn!("replay: event for unknown room type {room_type_id}");
                        continue;
                    };
                    let mut guard = shared
                        .try_write()
                        .map_err(|_| io::Error::other("replay: room type lock contended"))?;
                    engine.apply_to_room_type(&mut guard, event);
                }
            }
        }
        if !events.is_empty() {
            tracing::info!(
                "replayed {} events: {} hotels, {} room types, {} bookings",
                events.len(),
                engine.hotels.len(),
                engine.room_types.len(),
                engine.bookings.len()
            );
        }

        Ok(engine)
    }

    /// Currency passed to the payment gateway for new intents.
    pub fn with_currency(mut self, currency: impl Into<String>) -> Self {
        self.currency = currency.into();
        self
    }

    pub fn get_room_type(&self, id: &Ulid) -> Option<SharedRoomType> {
        self.room_types.get(id).map(|e| e.value().clone())
    }

    pub fn room_type_for_room_number(&self, room_number_id: &Ulid) -> Option<Ulid> {
        self.room_number_index.get(room_number_id).map(|e| *e.value())
    }

    /// Write event to the WAL via the background group-commit writer.
    pub(super) async fn wal_append(&self, event: &Event) -> Result<(), EngineError> {
        let (tx, rx) = oneshot::channel();
        self.wal_tx
            .send(WalCommand::Append {
                event: event.clone(),
                response: tx,
            })
            .await
            .map_err(|_| EngineError::Wal("WAL writer shut down".into()))?;
        rx.await
            .map_err(|_| EngineError::Wal("WAL writer dropped response".into()))?
            .map_err(|e| EngineError::Wal(e.to_string()))
    }

    /// WAL-append then apply to a room type the caller holds write-locked.
    pub(super) async fn persist_and_apply(
        &self,
        rt: &mut RoomType,
        event: &Event,
    ) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.apply_to_room_type(rt, event);
        Ok(())
    }

    /// WAL-append then apply an event that creates or retires catalog entries.
    pub(super) async fn persist_catalog(&self, event: &Event) -> Result<(), EngineError> {
        self.wal_append(event).await?;
        self.apply_catalog(event);
        Ok(())
    }

    fn apply_catalog(&self, event: &Event) {
        match event {
            Event::HotelCreated {
                id,
                owner_id,
                name,
                city,
                country,
            } => {
                self.hotels.insert(
                    *id,
                    Hotel {
                        id: *id,
                        owner_id: owner_id.clone(),
                        name: name.clone(),
                        city: city.clone(),
                        country: country.clone(),
                        room_type_ids: Vec::new(),
                        booking_ids: Vec::new(),
                        deleted_at: None,
                    },
                );
            }
            Event::HotelDeleted { id, at } => {
                if let Some(mut hotel) = self.hotels.get_mut(id) {
                    hotel.deleted_at = Some(*at);
                }
            }
            Event::RoomTypeCreated {
                id,
                hotel_id,
                name,
                description,
                price_per_night,
                max_adults,
                max_children,
                facilities,
                image_urls,
            } => {
                let rt = RoomType {
                    id: *id,
                    hotel_id: *hotel_id,
                    name: name.clone(),
                    description: description.clone(),
                    price_per_night: *price_per_night,
                    max_adults: *max_adults,
                    max_children: *max_children,
                    facilities: facilities.clone(),
                    image_urls: image_urls.clone(),
                    room_numbers: Vec::new(),
                    deleted_at: None,
                };
                self.room_types.insert(*id, Arc::new(RwLock::new(rt)));
                if let Some(mut hotel) = self.hotels.get_mut(hotel_id) {
                    hotel.room_type_ids.push(*id);
                }
            }
            other => tracing::error!("catalog apply got room type event {other:?}"),
        }
    }

    /// Apply an event to a room type (no locking; the caller holds the write lock).
    fn apply_to_room_type(&self, rt: &mut RoomType, event: &Event) {
        match event {
            Event::RoomTypeRepriced {
                price_per_night, ..
            } => rt.price_per_night = *price_per_night,
            Event::RoomTypeDeleted { at, .. } => rt.deleted_at = Some(*at),
            Event::RoomNumberAdded { id, label, .. } => {
                rt.room_numbers.push(RoomNumber::new(*id, rt.id, label.clone()));
                self.room_number_index.insert(*id, rt.id);
            }
            Event::RoomNumberServiceChanged {
                id, out_of_service, ..
            } => {
                if let Some(rn) = rt.room_number_mut(id) {
                    set_out_of_service(rn, *out_of_service);
                }
            }
            Event::RoomNumberDeleted { id, at, .. } => {
                if let Some(rn) = rt.room_number_mut(id) {
                    rn.deleted_at = Some(*at);
                }
            }
            Event::BookingCreated { booking, .. } => {
                if let Some(rn) = rt.room_number_mut(&booking.room_number_id) {
                    if booking.status == BookingStatus::Cancelled {
                        // Restored from a snapshot: audit entry only.
                        rn.booking_ids.push(booking.id);
                    } else {
                        block(rn, booking.id, booking.window);
                    }
                }
                if let Some(mut hotel) = self.hotels.get_mut(&booking.hotel_id) {
                    hotel.booking_ids.push(booking.id);
                }
                self.payment_intents
                    .insert(booking.payment_intent_id.clone(), booking.id);
                self.bookings.insert(booking.id, booking.clone());
            }
            Event::BookingCancelled {
                id, cancelled_by, ..
            } => {
                let Some(mut booking) = self.bookings.get_mut(id) else {
                    return;
                };
                booking.status = BookingStatus::Cancelled;
                booking.cancelled_by = Some(cancelled_by.clone());
                let (room_number_id, window) = (booking.room_number_id, booking.window);
                drop(booking);
                if let Some(rn) = rt.room_number_mut(&room_number_id) {
                    unblock(rn, *id, window, AuditTrail::Keep);
                }
            }
            Event::BookingDeleted { id, .. } => {
                let Some((_, booking)) = self.bookings.remove(id) else {
                    return;
                };
                if let Some(mut hotel) = self.hotels.get_mut(&booking.hotel_id) {
                    hotel.booking_ids.retain(|b| b != id);
                }
                self.payment_intents
                    .remove_if(&booking.payment_intent_id, |_, owner| owner == id);
                if let Some(rn) = rt.room_number_mut(&booking.room_number_id) {
                    unblock(rn, *id, booking.window, AuditTrail::Prune);
                }
            }
            Event::HotelCreated { .. } | Event::HotelDeleted { .. } | Event::RoomTypeCreated { .. } => {
                tracing::error!("room type apply got catalog event {event:?}");
            }
        }
    }
}
