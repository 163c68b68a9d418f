//! Request extractors: caller identity, admin access, and body, path and
//! query extractors that fail with the API's error format.

use axum::{
    extract::{FromRequest, FromRequestParts, Request, rejection::JsonRejection},
    http::{HeaderMap, header::AUTHORIZATION, request::Parts},
    response::{IntoResponse, Response},
};
use mei_core::{NewUser, Plan, User};
use serde::Serialize;
use serde::de::DeserializeOwned;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::error::ApiError;
use crate::state::AppState;

fn header_value(
    headers: &HeaderMap,
    name: &str,
) -> Option<String> {
    headers
        .get(name.to_ascii_lowercase().as_str())
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// The caller, as identified by the upstream identity layer.
///
/// Users are provisioned on first sight with the FREE plan.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let id = header_value(&parts.headers, &state.auth.user_header).ok_or_else(|| {
            ApiError::unauthorized(format!(
                "Authentication required: missing '{}' header",
                state.auth.user_header
            ))
        })?;
        let email = header_value(&parts.headers, &state.auth.email_header);

        let user = state
            .repo
            .upsert_user(NewUser {
                id,
                email,
                plan: Plan::Free,
            })
            .await?;

        debug!(user_id = %user.id, plan = %user.plan, "identified user");
        Ok(CurrentUser(user))
    }
}

/// Requires `Authorization: Bearer <admin token>`.
#[derive(Debug, Clone, Copy)]
pub struct RequireAdmin;

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(expected) = state.auth.admin_token.as_deref() else {
            return Err(ApiError::unauthorized("Admin API is disabled"));
        };

        let provided = header_value(&parts.headers, AUTHORIZATION.as_str());
        let token = provided
            .as_deref()
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim);

        match token {
            Some(token) if token_matches(token, expected) => Ok(RequireAdmin),
            Some(_) => {
                warn!("rejected admin request with wrong token");
                Err(ApiError::unauthorized("Invalid admin token"))
            }
            None => Err(ApiError::unauthorized(
                "Admin access required: provide 'Authorization: Bearer <token>'",
            )),
        }
    }
}

/// Constant time in the token contents; only the length can leak.
fn token_matches(
    provided: &str,
    expected: &str,
) -> bool {
    bool::from(provided.as_bytes().ct_eq(expected.as_bytes()))
}

/// `axum::Json` with rejections mapped to a 400 [`ApiError`]. Also usable as
/// a response.
#[derive(Debug, Clone, Copy, Default)]
pub struct Json<T>(pub T);

impl<S, T> FromRequest<S> for Json<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(axum::Json(value)) => Ok(Json(value)),
            Err(rejection) => {
                Err(ApiError::bad_request(rejection_message(&rejection)).with_code("invalid_json"))
            }
        }
    }
}

impl<T> IntoResponse for Json<T>
where
    T: Serialize,
{
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// `axum::extract::Path` with rejections mapped to a 400 [`ApiError`].
#[derive(Debug, Clone, Copy)]
pub struct Path<T>(pub T);

impl<S, T> FromRequestParts<S> for Path<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        match axum::extract::Path::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Path(value)) => Ok(Path(value)),
            Err(rejection) => Err(ApiError::bad_request(format!(
                "Invalid path parameter: {}",
                rejection.body_text()
            ))
            .with_code("invalid_path")),
        }
    }
}

/// `axum::extract::Query` with rejections mapped to a 400 [`ApiError`].
#[derive(Debug, Clone, Copy, Default)]
pub struct Query<T>(pub T);

impl<S, T> FromRequestParts<S> for Query<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        match axum::extract::Query::<T>::from_request_parts(parts, state).await {
            Ok(axum::extract::Query(value)) => Ok(Query(value)),
            Err(rejection) => Err(ApiError::bad_request(format!(
                "Invalid query string: {}",
                rejection.body_text()
            ))
            .with_code("invalid_query")),
        }
    }
}

fn rejection_message(rejection: &JsonRejection) -> String {
    match rejection {
        JsonRejection::JsonDataError(err) => format!("Invalid JSON data: {}", err.body_text()),
        JsonRejection::JsonSyntaxError(err) => format!("Invalid JSON syntax: {}", err.body_text()),
        JsonRejection::MissingJsonContentType(_) => {
            "Missing Content-Type header. Expected 'application/json'.".to_string()
        }
        JsonRejection::BytesRejection(err) => {
            format!("Failed to read request body: {}", err.body_text())
        }
        _ => "Invalid JSON request".to_string(),
    }
}
