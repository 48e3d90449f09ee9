//! Explicit tenant context.
//!
//! Every core operation takes a `TenantId` value; there is no ambient tenant
//! state. The HTTP boundary derives it from the `X-Tenant-Id` header set by
//! the upstream gateway and rejects requests that lack a valid one.

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::errors::ServiceError;

pub const TENANT_HEADER: &str = "x-tenant-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for TenantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for TenantId {
    fn from(id: Uuid) -> Self {
        TenantId(id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for TenantId
where
    S: Send + Sync,
{
    type Rejection = ServiceError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = parts.headers.get(TENANT_HEADER).ok_or_else(|| {
            ServiceError::ValidationError(format!("Missing {} header", TENANT_HEADER))
        })?;

        let raw = header.to_str().map_err(|_| {
            ServiceError::ValidationError(format!("Invalid {} header", TENANT_HEADER))
        })?;

        let id = Uuid::parse_str(raw).map_err(|_| {
            ServiceError::ValidationError(format!(
                "{} header must be a UUID, got {:?}",
                TENANT_HEADER, raw
            ))
        })?;

        Ok(TenantId(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn extracts_uuid_from_header() {
        let id = Uuid::new_v4();
        let req = Request::builder()
            .header("X-Tenant-Id", id.to_string())
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        let tenant = TenantId::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(tenant.as_uuid(), id);
    }

    #[tokio::test]
    async fn rejects_missing_and_malformed_headers() {
        let req = Request::builder().body(()).unwrap();
        let (mut parts, _) = req.into_parts();
        assert!(TenantId::from_request_parts(&mut parts, &()).await.is_err());

        let req = Request::builder()
            .header("X-Tenant-Id", "not-a-uuid")
            .body(())
            .unwrap();
        let (mut parts, _) = req.into_parts();
        assert!(TenantId::from_request_parts(&mut parts, &()).await.is_err());
    }
}
