use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;

use crate::engine::{NewHotel, NewRoomType};

use super::dto::*;
use super::extract::{AuthActor, ValidatedJson, parse_id};
use super::{ApiError, AppState};

pub(super) async fn get_hotel(
    State(state): State<AppState>,
    Path(hotel_id): Path<String>,
) -> Result<Json<HotelView>, ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    let hotel = state.engine.live_hotel(hotel_id)?;
    let room_types = state.engine.hotel_room_types(hotel_id).await?;
    Ok(Json(HotelView::new(hotel, room_types)))
}

pub(super) async fn create_hotel(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    ValidatedJson(body): ValidatedJson<CreateHotelRequest>,
) -> Result<(StatusCode, Json<HotelView>), ApiError> {
    let hotel = state
        .engine
        .create_hotel(
            &actor.user_id,
            NewHotel {
                name: body.name,
                city: body.city,
                country: body.country,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(HotelView::new(hotel, Vec::new()))))
}

pub(super) async fn delete_hotel(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(hotel_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    state.engine.delete_hotel(&actor.user_id, hotel_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn create_room_type(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(hotel_id): Path<String>,
    ValidatedJson(body): ValidatedJson<CreateRoomTypeRequest>,
) -> Result<(StatusCode, Json<RoomTypeView>), ApiError> {
    let hotel_id = parse_id("hotelId", &hotel_id)?;
    let room_type = state
        .engine
        .create_room_type(
            &actor.user_id,
            hotel_id,
            NewRoomType {
                name: body.room_type,
                description: body.description,
                price_per_night: body.price_per_night,
                max_adults: body.max_adult,
                max_children: body.max_child,
                facilities: body.room_facilities,
                image_urls: body.image_urls,
                room_numbers: body.room_numbers,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(room_type.into())))
}

pub(super) async fn update_price(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<UpdatePriceRequest>,
) -> Result<Json<RoomTypeView>, ApiError> {
    let room_id = parse_id("roomId", &room_id)?;
    let room_type = state
        .engine
        .update_room_price(&actor.user_id, room_id, body.price_per_night)
        .await?;
    Ok(Json(room_type.into()))
}

pub(super) async fn delete_room_type(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(room_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let room_id = parse_id("roomId", &room_id)?;
    state.engine.delete_room_type(&actor.user_id, room_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn add_room_number(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path(room_id): Path<String>,
    ValidatedJson(body): ValidatedJson<AddRoomNumberRequest>,
) -> Result<(StatusCode, Json<RoomNumberView>), ApiError> {
    let room_id = parse_id("roomId", &room_id)?;
    let room_number = state
        .engine
        .add_room_number(&actor.user_id, room_id, body.room_number_name)
        .await?;
    Ok((StatusCode::CREATED, Json(room_number.into())))
}

pub(super) async fn delete_room_number(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path((room_id, room_number_id)): Path<(String, String)>,
) -> Result<StatusCode, ApiError> {
    let room_id = parse_id("roomId", &room_id)?;
    let room_number_id = parse_id("roomNumberId", &room_number_id)?;
    state
        .engine
        .delete_room_number(&actor.user_id, room_id, room_number_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub(super) async fn set_out_of_service(
    State(state): State<AppState>,
    AuthActor(actor): AuthActor,
    Path((room_id, room_number_id)): Path<(String, String)>,
    ValidatedJson(body): ValidatedJson<OutOfServiceRequest>,
) -> Result<Json<RoomNumberView>, ApiError> {
    let room_id = parse_id("roomId", &room_id)?;
    let room_number_id = parse_id("roomNumberId", &room_number_id)?;
    let room_number = state
        .engine
        .set_out_of_service(&actor.user_id, room_id, room_number_id, body.is_out_of_service)
        .await?;
    Ok(Json(room_number.into()))
}
