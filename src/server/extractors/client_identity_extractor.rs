use std::collections::hash_map::DefaultHasher;
use std::convert::Infallible;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;

use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::header::USER_AGENT;
use axum::http::request::Parts;
use tracing::debug;

/// stable per-client identifier used when logging download attempts; derived
/// from IP + user-agent, never stored
pub struct ClientIdentity(pub String);

pub fn generate_client_id(ip: Option<&str>, user_agent: Option<&str>) -> String {
    let mut hasher = DefaultHasher::new();
    ip.unwrap_or("unknown").hash(&mut hasher);
    user_agent.unwrap_or("unknown").hash(&mut hasher);
    format!("{:x}", hasher.finish())
}

impl<S> FromRequestParts<S> for ClientIdentity
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|h| h.to_str().ok())
            .map(|s| s.to_string());

        // try X-Forwarded-For, X-Real-IP, then the raw connection info
        let client_ip = parts
            .headers
            .get("x-forwarded-for")
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .or_else(|| {
                parts
                    .headers
                    .get("x-real-ip")
                    .and_then(|h| h.to_str().ok())
                    .map(|s| s.to_string())
            })
            .or_else(|| {
                parts
                    .extensions
                    .get::<ConnectInfo<SocketAddr>>()
                    .map(|ci| ci.0.ip().to_string())
            });

        let client_id = generate_client_id(client_ip.as_deref(), user_agent.as_deref());
        debug!("resolved client_id {} from IP {:?}", client_id, client_ip);

        Ok(ClientIdentity(client_id))
    }
}
