//! Caller context carried in request headers
//!
//! Authentication happens upstream; the gateway forwards the resolved
//! identity as `x-actor-id`, `x-actor-role` and `x-tenant-id`.

use crate::error::ApiError;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use kpi_types::{Actor, Role, TenantId};

pub const ACTOR_ID_HEADER: &str = "x-actor-id";
pub const ACTOR_ROLE_HEADER: &str = "x-actor-role";
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

/// The authenticated actor making the request
#[derive(Clone, Debug)]
pub struct Caller(pub Actor);

#[async_trait]
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let id = header(parts, ACTOR_ID_HEADER)?;
        let role: Role = header(parts, ACTOR_ROLE_HEADER)?
            .parse()
            .map_err(ApiError::BadRequest)?;
        let tenant = header(parts, TENANT_ID_HEADER)?;
        Ok(Caller(Actor::new(id, role, TenantId::new(tenant))))
    }
}

fn header<'a>(parts: &'a Parts, name: &str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| ApiError::BadRequest(format!("missing or invalid {} header", name)))
}
