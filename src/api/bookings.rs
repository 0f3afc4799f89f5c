use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;

use crate::engine::NewBooking;
use crate::model::GuestInfo;

use super::dto::*;
use super::extract::{AuthActor, ValidatedJson, parse_id, parse_stay, stay_window};
use super::{ApiError, AppState};

pub(super) async fn available_rooms(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<Vec<RoomTypeView>>, ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    let (Some(check_in), Some(check_out)) = (query.check_in_date, query.check_out_date) else {
        return Err(ApiError::bad_request("checkInDate and checkOutDate are required"));
    };
    let window = parse_stay("checkInDate", &check_in, "checkOutDate", &check_out)?;
    let rooms = state.engine.available_rooms(hotel_id, window).await?;
    Ok(Json(rooms.into_iter().map(RoomTypeView::from).collect()))
}

pub(super) async fn create_payment_intent(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(hotel_id): Path<String>,
    ValidatedJson(body): ValidatedJson<PaymentIntentRequest>,
) -> Result<Json<PaymentIntentResponse>, ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    if let Some(body_hotel) = body.hotel_id.as_deref()
        && parse_id("hotelId", body_hotel)? != hotel_id
    {
        return Err(ApiError::invalid_field("hotelId", "does not match the URL"));
    }
    let room_type_id = parse_id("roomType", &body.room_type)?;
    let window = stay_window(&body.check_in, &body.check_out)?;
    let quote = state
        .engine
        .create_payment_intent(&actor.user_id, hotel_id, room_type_id, window, body.number_of_nights)
        .await?;
    Ok(Json(quote.into()))
}

pub(super) async fn create_booking(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(hotel_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateBookingRequest>,
) -> Result<(StatusCode, Json<BookingView>), ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    let room_type_id = parse_id("roomType", &body.room_type)?;
    let window = stay_window(&body.check_in, &body.check_out)?;
    let booking = state
        .engine
        .create_booking(
            &actor.user_id,
            NewBooking {
                hotel_id,
                room_type_id,
                window,
                guest: GuestInfo {
                    first_name: body.first_name,
                    last_name: body.last_name,
                    email: body.email,
                    phone: body.phone,
                    citizen_id: body.citizen_id,
                },
                payment_intent_id: body.payment_intent_id,
            },
        )
        .await?;
    if let Some(claimed) = body.total_cost
        && claimed != booking.total_cost
    {
        tracing::debug!(booking = %booking.id, "client total {claimed} ignored, charged {}", booking.total_cost);
    }
    Ok((StatusCode::CREATED, Json(booking.into())))
}

pub(super) async fn my_bookings(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
) -> Json<Vec<BookingView>> {
    Json(
        state
            .engine
            .bookings_for_user(&actor.user_id)
            .into_iter()
            .map(BookingView::from)
            .collect(),
    )
}

pub(super) async fn get_booking(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingView>, ApiError> {
    let booking_id = parse_id("bookingId", &booking_id)?;
    let booking = state
        .engine
        .booking(booking_id, &actor.user_id, actor.is_admin)?;
    Ok(Json(booking.into()))
}

pub(super) async fn cancel_booking(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(booking_id): Path<String>,
) -> Result<Json<BookingView>, ApiError> {
    let booking_id = parse_id("bookingId", &booking_id)?;
    let booking = state
        .engine
        .cancel_booking(booking_id, &actor.user_id, &actor.email)
        .await?;
    Ok(Json(booking.into()))
}

/// Administrative hard delete.
pub(super) async fn delete_booking(
    State(state): State<AppState>,
    actor: AuthActor,
    Path(booking_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    actor.require_admin()?;
    let booking_id = parse_id("bookingId", &booking_id)?;
    state.engine.delete_booking(booking_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
