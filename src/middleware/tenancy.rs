// src/middleware/tenancy.rs

use axum::{extract::FromRequestParts, http::{request::Parts, HeaderMap}};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::models::organization::Membership;

// O nome do nosso cabeçalho HTTP customizado
pub const ORGANIZACAO_ID_HEADER: &str = "x-organizacao-id";

// Armazena o UUID da organização que o utilizador quer aceder.
#[derive(Debug, Clone, Copy)]
pub struct OrganizationContext(pub Uuid);

impl OrganizationContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        headers
            .get(ORGANIZACAO_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value.trim()).ok())
            .map(OrganizationContext)
            .ok_or(AppError::MissingOrganizationHeader)
    }
}

impl<S> FromRequestParts<S> for OrganizationContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // O tenant_guard já validou e guardou o contexto
        if let Some(ctx) = parts.extensions.get::<OrganizationContext>() {
            return Ok(*ctx);
        }
        OrganizationContext::from_headers(&parts.headers)
    }
}

// Associação do usuário com a organização atual (inserida pelo tenant_guard)
pub struct CurrentMembership(pub Membership);

impl<S> FromRequestParts<S> for CurrentMembership
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Membership>()
            .cloned()
            .map(CurrentMembership)
            .ok_or(AppError::NotAMember)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn reads_the_organization_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(ORGANIZACAO_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        let ctx = OrganizationContext::from_headers(&headers).unwrap();
        assert_eq!(ctx.0, id);
    }

    #[test]
    fn rejects_missing_or_malformed_header() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            OrganizationContext::from_headers(&headers),
            Err(AppError::MissingOrganizationHeader)
        ));

        headers.insert(ORGANIZACAO_ID_HEADER, HeaderValue::from_static("nao-e-uuid"));
        assert!(OrganizationContext::from_headers(&headers).is_err());
    }
}
