//! REST surface over the engine.

mod bookings;
mod catalog;
pub mod dto;
pub mod error;
pub mod extract;

use std::sync::Arc;

use axum::routing::{delete, get, post, put};
use axum::{Json, Router, middleware};
use serde_json::{Value, json};
use tower_http::trace::TraceLayer;

use crate::auth::SessionVerifier;
use crate::engine::Engine;

pub use error::ApiError;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<Engine>,
    pub verifier: Arc<dyn SessionVerifier>,
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/health", get(health))
        // Guest-facing booking flow
        .route("/hotels/{hotel_id}", get(catalog::get_hotel))
        .route("/hotels/{hotel_id}/available-rooms", get(bookings::available_rooms))
        .route(
            "/hotels/{hotel_id}/bookings/payment-intent",
            post(bookings::create_payment_intent),
        )
        .route("/hotels/{hotel_id}/bookings", post(bookings::create_booking))
        .route("/my-bookings", get(bookings::my_bookings))
        .route("/my-bookings/{booking_id}/cancel", put(bookings::cancel_booking))
        .route("/my-bookings/{booking_id}", delete(bookings::delete_booking))
        .route("/bookings/{booking_id}", get(bookings::get_booking))
        // Owner administration
        .route("/my-hotels", post(catalog::create_hotel))
        .route("/my-hotels/{hotel_id}", delete(catalog::delete_hotel))
        .route("/my-hotels/{hotel_id}/rooms", post(catalog::create_room_type))
        .route("/my-rooms/{room_id}", delete(catalog::delete_room_type))
        .route("/my-rooms/{room_id}/price", put(catalog::update_price))
        .route("/my-rooms/{room_id}/room-numbers", post(catalog::add_room_number))
        .route(
            "/my-rooms/{room_id}/room-numbers/{room_number_id}",
            delete(catalog::delete_room_number),
        )
        .route(
            "/my-rooms/{room_id}/room-numbers/{room_number_id}/out-of-service",
            put(catalog::set_out_of_service),
        )
        // Labels need the matched route.
        .route_layer(middleware::from_fn(crate::observability::http_metrics));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
