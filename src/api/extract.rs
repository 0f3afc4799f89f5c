//! Request extractors and input parsing shared by the handlers.

use axum::Json;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::header::{AUTHORIZATION, COOKIE};
use axum::http::request::Parts;
use chrono::{DateTime, NaiveDate};
use serde::de::DeserializeOwned;
use ulid::Ulid;
use validator::Validate;

use crate::auth::{Actor, AuthError, extract_token};
use crate::model::StayWindow;

use super::AppState;
use super::error::{ApiError, FieldError};

/// Like `axum::Json<T>`, but also runs `validator::Validate` and reports
/// field-level problems as a 400.
pub struct ValidatedJson<T>(pub T);

impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::bad_request(format!("Invalid JSON: {rejection}")))?;
        value.validate().map_err(validation_failed)?;
        Ok(ValidatedJson(value))
    }
}

fn validation_failed(errors: validator::ValidationErrors) -> ApiError {
    let mut errors: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| FieldError {
                field: field.to_string(),
                message: e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string()),
            })
        })
        .collect();
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    ApiError::BadRequest {
        message: "Validation failed".into(),
        errors,
    }
}

/// The signed-in caller. Rejects with 401 when the session is missing or invalid.
pub struct AuthActor(pub Actor);

impl AuthActor {
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.0.is_admin {
            Ok(())
        } else {
            Err(ApiError::Forbidden)
        }
    }
}

impl FromRequestParts<AppState> for AuthActor {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let header = |name: axum::http::HeaderName| parts.headers.get(name).and_then(|v| v.to_str().ok());
        let token = extract_token(header(AUTHORIZATION), header(COOKIE)).ok_or(AuthError::MissingToken)?;
        Ok(AuthActor(state.verifier.verify(token)?))
    }
}

/// A calendar day. Full timestamps are accepted and cut to their date.
pub fn parse_day(field: &str, raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| ApiError::invalid_field(field, "must be a date (YYYY-MM-DD)"))
}

pub fn stay_window(check_in: &str, check_out: &str) -> Result<StayWindow, ApiError> {
    parse_stay("checkIn", check_in, "checkOut", check_out)
}

pub fn parse_stay(
    in_field: &str,
    check_in: &str,
    out_field: &str,
    check_out: &str,
) -> Result<StayWindow, ApiError> {
    let check_in = parse_day(in_field, check_in)?;
    let check_out = parse_day(out_field, check_out)?;
    StayWindow::new(check_in, check_out)
        .ok_or_else(|| ApiError::invalid_field(out_field, format!("must be after {in_field}")))
}

pub fn parse_id(field: &str, raw: &str) -> Result<Ulid, ApiError> {
    Ulid::from_string(raw).map_err(|_| ApiError::invalid_field(field, "is not a valid id"))
}
