use chrono::Utc;
use rust_decimal::Decimal;
use ulid::Ulid;

use crate::limits::*;
use crate::model::*;
use crate::notify::BookingNotice;
use crate::observability::{
    BOOKINGS_CANCELLED_TOTAL, BOOKINGS_CREATED_TOTAL, BOOKINGS_DELETED_TOTAL,
    BOOKINGS_REJECTED_TOTAL,
};
use crate::payment::{IntentMetadata, PaymentError, PaymentStatus};

use super::finder::find_available;
use super::{Engine, EngineError, SharedRoomType};

/// A paid booking request.
#[derive(Debug, Clone)]
pub struct NewBooking {
    pub hotel_id: Ulid,
    pub room_type_id: Ulid,
    pub window: StayWindow,
    pub guest: GuestInfo,
    pub payment_intent_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentQuote {
    pub payment_intent_id: String,
    pub client_secret: String,
    pub total_cost: Decimal,
}

pub(super) fn validate_stay(window: &StayWindow) -> Result<(), EngineError> {
    if window.nights() > MAX_STAY_NIGHTS {
        return Err(EngineError::LimitExceeded("stay too long"));
    }
    Ok(())
}

fn total_cost(price_per_night: Decimal, window: &StayWindow) -> Decimal {
    price_per_night * Decimal::from(window.nights())
}

impl Engine {
    /// Resolve a room type that is live and belongs to a live hotel.
    fn bookable_room_type(
        &self,
        hotel_id: Ulid,
        room_type_id: Ulid,
    ) -> Result<SharedRoomType, EngineError> {
        let hotel_live = self
            .hotels
            .get(&hotel_id)
            .is_some_and(|h| !h.is_deleted());
        if !hotel_live {
            return Err(EngineError::not_found("hotel", hotel_id));
        }
        self.get_room_type(&room_type_id)
            .ok_or(EngineError::not_found("room type", room_type_id))
    }

    /// Quote a stay and open a payment intent for it.
    ///
    /// The quote does not reserve anything; availability is checked again
    /// when the paid booking arrives.
    pub async fn create_payment_intent(
        &self,
        user_id: &str,
        hotel_id: Ulid,
        room_type_id: Ulid,
        window: StayWindow,
        number_of_nights: Option<i64>,
    ) -> Result<PaymentQuote, EngineError> {
        validate_stay(&window)?;
        if let Some(n) = number_of_nights
            && n != window.nights()
        {
            return Err(EngineError::invalid(
                "numberOfNights",
                format!("expected {} nights for the selected dates", window.nights()),
            ));
        }

        let shared = self.bookable_room_type(hotel_id, room_type_id)?;
        let (amount, room_number_id) = {
            let rt = shared.read().await;
            if rt.hotel_id != hotel_id || rt.is_deleted() {
                return Err(EngineError::not_found("room type", room_type_id));
            }
            let rn = find_available(&rt, &window).ok_or(EngineError::NoAvailability)?;
            (total_cost(rt.price_per_night, &window), rn.id)
        };

        let intent = self
            .payments
            .create_intent(
                amount,
                &self.currency,
                IntentMetadata {
                    hotel_id,
                    room_type_id,
                    room_number_id,
                    user_id: user_id.to_string(),
                },
            )
            .await?;
        Ok(PaymentQuote {
            payment_intent_id: intent.id,
            client_secret: intent.client_secret,
            total_cost: intent.amount,
        })
    }

    /// Turn a paid intent into a booking on the first free room number.
    pub async fn create_booking(
        &self,
        user_id: &str,
        req: NewBooking,
    ) -> Result<Booking, EngineError> {
        let result = self.create_booking_inner(user_id, req).await;
        match &result {
            Ok(booking) => {
                metrics::counter!(BOOKINGS_CREATED_TOTAL).increment(1);
                self.notify.send(BookingNotice::Confirmed {
                    booking_id: booking.id,
                    hotel_id: booking.hotel_id,
                    email: booking.guest.email.clone(),
                    window: booking.window,
                });
            }
            Err(e) => {
                metrics::counter!(BOOKINGS_REJECTED_TOTAL, "reason" => e.kind()).increment(1);
            }
        }
        result
    }

    async fn create_booking_inner(
        &self,
        user_id: &str,
        req: NewBooking,
    ) -> Result<Booking, EngineError> {
        let intent = match self.payments.retrieve(&req.payment_intent_id).await {
            Ok(intent) if intent.status == PaymentStatus::Succeeded => intent,
            Ok(_) | Err(PaymentError::UnknownIntent(_)) => {
                return Err(EngineError::PaymentNotConfirmed(req.payment_intent_id));
            }
            Err(e) => return Err(e.into()),
        };
        validate_stay(&req.window)?;

        let _permit = self.commit_gate.read().await;
        let shared = self.bookable_room_type(req.hotel_id, req.room_type_id)?;
        let mut rt = shared.write().await;
        if rt.hotel_id != req.hotel_id || rt.is_deleted() {
            return Err(EngineError::not_found("room type", req.room_type_id));
        }

        let mismatch = |reason| EngineError::PaymentMismatch {
            intent: req.payment_intent_id.clone(),
            reason,
        };
        if intent.metadata.hotel_id != req.hotel_id
            || intent.metadata.room_type_id != req.room_type_id
        {
            return Err(mismatch("intent was issued for another room type"));
        }
        let cost = total_cost(rt.price_per_night, &req.window);
        if intent.amount != cost {
            return Err(mismatch("amount differs from the stay total"));
        }
        // Every use of an intent locks the same room type, so this check and
        // the insert in apply can't interleave with another booking.
        if let Some(existing) = self.payment_intents.get(&req.payment_intent_id) {
            tracing::warn!(
                payment_intent = %req.payment_intent_id,
                "intent already paid for booking {}",
                existing.value()
            );
            return Err(EngineError::PaymentNotConfirmed(req.payment_intent_id));
        }

        let Some(rn) = find_available(&rt, &req.window) else {
            tracing::warn!(
                payment_intent = %req.payment_intent_id,
                room_type = %req.room_type_id,
                "no room left after payment capture for {}..{}",
                req.window.check_in,
                req.window.check_out
            );
            return Err(EngineError::NoAvailability);
        };
        if rn.unavailable.len() >= MAX_BLOCKS_PER_ROOM_NUMBER {
            return Err(EngineError::LimitExceeded("too many bookings on room number"));
        }

        let booking = Booking {
            id: Ulid::new(),
            hotel_id: req.hotel_id,
            room_number_id: rn.id,
            user_id: user_id.to_string(),
            guest: req.guest,
            window: req.window,
            status: BookingStatus::Paid,
            cancelled_by: None,
            total_cost: cost,
            payment_intent_id: req.payment_intent_id,
            created_at: Utc::now(),
        };
        let event = Event::BookingCreated {
            room_type_id: rt.id,
            booking: booking.clone(),
        };
        self.persist_and_apply(&mut rt, &event).await?;
        tracing::info!(
            booking = %booking.id,
            room_number = %booking.room_number_id,
            "booked {}..{} for {}",
            booking.window.check_in,
            booking.window.check_out,
            booking.total_cost
        );
        Ok(booking)
    }

    /// Cancel one of `user_id`'s bookings. Someone else's booking reads as not found.
    pub async fn cancel_booking(
        &self,
        booking_id: Ulid,
        user_id: &str,
        actor_email: &str,
    ) -> Result<Booking, EngineError> {
        let _permit = self.commit_gate.read().await;
        let room_number_id = self
            .bookings
            .get(&booking_id)
            .filter(|b| b.user_id == user_id)
            .map(|b| b.room_number_id)
            .ok_or(EngineError::not_found("booking", booking_id))?;
        let (room_type_id, shared) = self.lock_target(room_number_id)?;
        let mut rt = shared.write().await;

        // Status is re-read under the lock so two cancels can't both pass.
        let status = self
            .bookings
            .get(&booking_id)
            .map(|b| b.status)
            .ok_or(EngineError::not_found("booking", booking_id))?;
        if status == BookingStatus::Cancelled {
            return Err(EngineError::AlreadyCancelled(booking_id));
        }

        let event = Event::BookingCancelled {
            id: booking_id,
            room_type_id,
            cancelled_by: actor_email.to_string(),
        };
        self.persist_and_apply(&mut rt, &event).await?;
        drop(rt);

        let booking = self
            .bookings
            .get(&booking_id)
            .map(|b| b.value().clone())
            .ok_or(EngineError::not_found("booking", booking_id))?;
        metrics::counter!(BOOKINGS_CANCELLED_TOTAL).increment(1);
        tracing::info!(booking = %booking_id, "cancelled by {actor_email}");
        self.notify.send(BookingNotice::Cancelled {
            booking_id,
            email: booking.guest.email.clone(),
            cancelled_by: actor_email.to_string(),
        });
        Ok(booking)
    }

    /// Administrative hard delete. Callers must check privileges first.
    pub async fn delete_booking(&self, booking_id: Ulid) -> Result<(), EngineError> {
        let _permit = self.commit_gate.read().await;
        let room_number_id = self
            .bookings
            .get(&booking_id)
            .map(|b| b.room_number_id)
            .ok_or(EngineError::not_found("booking", booking_id))?;
        let (room_type_id, shared) = self.lock_target(room_number_id)?;
        let mut rt = shared.write().await;

        let email = self
            .bookings
            .get(&booking_id)
            .map(|b| b.guest.email.clone())
            .ok_or(EngineError::not_found("booking", booking_id))?;
        let event = Event::BookingDeleted {
            id: booking_id,
            room_type_id,
        };
        self.persist_and_apply(&mut rt, &event).await?;
        drop(rt);

        metrics::counter!(BOOKINGS_DELETED_TOTAL).increment(1);
        tracing::info!(booking = %booking_id, "deleted");
        self.notify.send(BookingNotice::Deleted { booking_id, email });
        Ok(())
    }

    fn lock_target(&self, room_number_id: Ulid) -> Result<(Ulid, SharedRoomType), EngineError> {
        let room_type_id = self
            .room_type_for_room_number(&room_number_id)
            .ok_or(EngineError::not_found("room number", room_number_id))?;
        let shared = self
            .get_room_type(&room_type_id)
            .ok_or(EngineError::not_found("room type", room_type_id))?;
        Ok((room_type_id, shared))
    }
}
