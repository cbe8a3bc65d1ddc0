// foodloop/server/src/web/extractors.rs

//! Caller identity. Sessions are handled upstream; by the time a request
//! reaches this service the gateway has put the profile ids in headers.

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use foodloop::OrderViewer;
use futures_util::future::{ready, Ready};
use tracing::warn;
use uuid::Uuid;

use crate::errors::AppError;

pub const USER_PROFILE_HEADER: &str = "X-User-Profile-Id";
pub const PROVIDER_PROFILE_HEADER: &str = "X-Provider-Profile-Id";

fn header_uuid(req: &HttpRequest, header: &'static str) -> Result<Uuid, AppError> {
  req
    .headers()
    .get(header)
    .and_then(|value| value.to_str().ok())
    .and_then(|raw| Uuid::parse_str(raw.trim()).ok())
    .ok_or_else(|| {
      warn!(header, "Missing or invalid identity header.");
      AppError::Auth(format!("Missing or invalid {} header.", header))
    })
}

/// A customer acting on their own orders.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedUser {
  pub user_profile_id: Uuid,
}

impl FromRequest for AuthenticatedUser {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(header_uuid(req, USER_PROFILE_HEADER).map(|user_profile_id| AuthenticatedUser { user_profile_id }))
  }
}

/// A provider acting on the orders placed with it.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedProvider {
  pub provider_id: Uuid,
}

impl FromRequest for AuthenticatedProvider {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    ready(header_uuid(req, PROVIDER_PROFILE_HEADER).map(|provider_id| AuthenticatedProvider { provider_id }))
  }
}

/// Either party to an order. The user header wins when both are sent.
#[derive(Debug, Clone, Copy)]
pub struct AuthenticatedViewer(pub OrderViewer);

impl FromRequest for AuthenticatedViewer {
  type Error = AppError;
  type Future = Ready<Result<Self, Self::Error>>;

  fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
    let viewer = if req.headers().contains_key(USER_PROFILE_HEADER) {
      header_uuid(req, USER_PROFILE_HEADER).map(OrderViewer::User)
    } else {
      header_uuid(req, PROVIDER_PROFILE_HEADER).map(OrderViewer::Provider)
    };
    ready(viewer.map(AuthenticatedViewer))
  }
}
