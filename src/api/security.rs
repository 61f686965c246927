//! Middlewares: correlación por `X-Request-Id` y autenticación por `X-API-Key`.

use std::sync::Arc;

use axum::extract::{Request, State};
use axum::http::HeaderValue;
use axum::middleware::Next;
use axum::response::Response;
use sha2::{Digest, Sha256};
use tracing::Instrument;
use uuid::Uuid;

use super::state::AppState;
use crate::errors::ApiError;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Id de correlación disponible para los handlers como extensión.
#[derive(Debug, Clone, Copy)]
pub struct RequestId(pub Uuid);

/// Compara digests de longitud fija para no filtrar la longitud ni el prefijo
/// de la clave por tiempo de respuesta.
fn keys_match(provided: &str, expected: &str) -> bool {
    let a = Sha256::digest(provided.as_bytes());
    let b = Sha256::digest(expected.as_bytes());
    a.iter().zip(b.iter()).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}

pub async fn request_id(mut request: Request, next: Next) -> Response {
    let id = Uuid::new_v4();
    request.extensions_mut().insert(RequestId(id));
    let span = tracing::info_span!("request",
                                   request_id = %id,
                                   method = %request.method(),
                                   path = %request.uri().path());
    let mut response = next.run(request).instrument(span).await;
    if let Ok(value) = HeaderValue::from_str(&id.to_string()) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

pub async fn require_api_key(State(state): State<Arc<AppState>>,
                             request: Request,
                             next: Next)
                             -> Result<Response, ApiError> {
    let Some(expected) = state.api_key.as_deref() else {
        return Err(ApiError::Misconfigured("API key not configured on server".into()));
    };
    let provided = request.headers().get(API_KEY_HEADER).and_then(|v| v.to_str().ok());
    match provided {
        Some(key) if keys_match(key, expected) => Ok(next.run(request).await),
        Some(_) => {
            tracing::warn!("rejected request: invalid API key");
            Err(ApiError::Unauthorized("Invalid API key".into()))
        }
        None => {
            tracing::warn!("rejected request: missing API key");
            Err(ApiError::Unauthorized("Missing API key".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_match_only_on_equality() {
        assert!(keys_match("secret", "secret"));
        assert!(!keys_match("secret ", "secret"));
        assert!(!keys_match("", "secret"));
        assert!(!keys_match("SECRET", "secret"));
    }
}
