// src/handlers/safras.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
        validation::{validate_not_negative, validate_year_order},
    },
    config::AppState,
    db::safra_repo::SafraInput,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::safra::Safra,
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SafraPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "2024/25")]
    pub nome: String,

    #[validate(range(min = 1900, max = 2200, message = "Ano inválido."))]
    #[schema(example = 2024)]
    pub ano_inicio: i32,

    #[validate(range(min = 1900, max = 2200, message = "Ano inválido."))]
    #[schema(example = 2025)]
    pub ano_fim: i32,

    /// USD/BRL da safra (opcional)
    #[validate(custom(function = "validate_not_negative"))]
    #[schema(example = 5.45)]
    pub taxa_cambio_usd: Option<Decimal>,
}

impl SafraPayload {
    /// Validação padrão + ordem dos anos, no mesmo formato de resposta.
    fn validate_all(&self) -> Result<(), AppError> {
        self.validate()?;
        validate_year_order(self.ano_inicio, self.ano_fim).map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("anoFim", e);
            AppError::ValidationError(errors)
        })
    }

    fn as_input(&self) -> SafraInput<'_> {
        SafraInput {
            nome: self.nome.trim(),
            ano_inicio: self.ano_inicio,
            ano_fim: self.ano_fim,
            taxa_cambio_usd: self.taxa_cambio_usd,
        }
    }
}

// GET /api/safras
#[utoipa::path(
    get,
    path = "/api/safras",
    tag = "Safras",
    responses(
        (status = 200, description = "Safras em ordem cronológica", body = Vec<Safra>)
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_safras(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let safras = app_state
        .safra_repo
        .list(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(safras))
}

// GET /api/safras/{id}
#[utoipa::path(
    get,
    path = "/api/safras/{id}",
    tag = "Safras",
    responses(
        (status = 200, description = "Safra", body = Safra),
        (status = 404, description = "Safra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Safra"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_safra(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let safra = app_state
        .safra_repo
        .find(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Safra").to_api_error(&locale))?;

    Ok(Json(safra))
}

// POST /api/safras
#[utoipa::path(
    post,
    path = "/api/safras",
    tag = "Safras",
    request_body = SafraPayload,
    responses(
        (status = 201, description = "Safra criada", body = Safra),
        (status = 409, description = "Já existe safra com esse nome")
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_safra(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<SafraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_all().map_err(|e| e.to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let safra = app_state
        .safra_repo
        .create(&mut *rls_conn, org_ctx.0, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(safra)))
}

// PUT /api/safras/{id}
#[utoipa::path(
    put,
    path = "/api/safras/{id}",
    tag = "Safras",
    request_body = SafraPayload,
    responses(
        (status = 200, description = "Safra atualizada", body = Safra),
        (status = 404, description = "Safra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Safra"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_safra(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<SafraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_all().map_err(|e| e.to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let safra = app_state
        .safra_repo
        .update(&mut *rls_conn, org_ctx.0, id, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Safra").to_api_error(&locale))?;

    Ok(Json(safra))
}

// DELETE /api/safras/{id}
#[utoipa::path(
    delete,
    path = "/api/safras/{id}",
    tag = "Safras",
    responses(
        (status = 204, description = "Safra removida"),
        (status = 404, description = "Safra não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Safra"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_safra(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let removed = app_state
        .safra_repo
        .delete(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Safra").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload(ano_inicio: i32, ano_fim: i32) -> SafraPayload {
        SafraPayload {
            nome: " 2024/25 ".into(),
            ano_inicio,
            ano_fim,
            taxa_cambio_usd: Some(dec!(5.45)),
        }
    }

    #[test]
    fn end_year_before_start_is_rejected() {
        let err = payload(2025, 2024).validate_all().unwrap_err();
        match err {
            AppError::ValidationError(errors) => {
                assert!(errors.field_errors().contains_key("anoFim"));
            }
            other => panic!("erro inesperado: {other:?}"),
        }
    }

    #[test]
    fn valid_payload_is_trimmed_into_input() {
        let p = payload(2024, 2025);
        assert!(p.validate_all().is_ok());
        assert_eq!(p.as_input().nome, "2024/25");
    }

    #[test]
    fn negative_exchange_rate_is_rejected() {
        let mut p = payload(2024, 2025);
        p.taxa_cambio_usd = Some(dec!(-1));
        assert!(p.validate_all().is_err());
    }
}
