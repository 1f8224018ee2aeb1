// src/handlers/liquidity.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::Value;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
        safra_values::{empty_safra_map, strip_zero_entries},
        validation::validate_safra_map,
    },
    config::AppState,
    db::liquidity_repo::CaixaInput,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::{
        debts::Moeda,
        liquidity::{CaixaDisponibilidade, CategoriaCaixa},
    },
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaixaPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Conta movimento BB")]
    pub nome: String,

    #[schema(example = "CAIXA_BANCOS")]
    pub categoria: CategoriaCaixa,

    #[serde(default)]
    pub moeda: Moeda,

    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub valores_por_safra: Value,
}

// GET /api/liquidity
#[utoipa::path(
    get,
    path = "/api/liquidity",
    tag = "Liquidity",
    responses((status = 200, description = "Caixa e disponibilidades", body = Vec<CaixaDisponibilidade>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_liquidity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .liquidity_repo
        .list(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/liquidity/{id}
#[utoipa::path(
    get,
    path = "/api/liquidity/{id}",
    tag = "Liquidity",
    responses(
        (status = 200, description = "Item de caixa", body = CaixaDisponibilidade),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Item"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_liquidity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let row = app_state
        .liquidity_repo
        .find(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Caixa/disponibilidade").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_liquidity(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: CaixaPayload,
) -> Result<CaixaDisponibilidade, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let valores = strip_zero_entries(&payload.valores_por_safra);
    let input = CaixaInput {
        nome: payload.nome.trim(),
        categoria: payload.categoria,
        moeda: payload.moeda,
        valores_por_safra: &valores,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .liquidity_repo
        .save(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Caixa/disponibilidade").to_api_error(locale))
}

// POST /api/liquidity
#[utoipa::path(
    post,
    path = "/api/liquidity",
    tag = "Liquidity",
    request_body = CaixaPayload,
    responses((status = 201, description = "Item criado", body = CaixaDisponibilidade)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_liquidity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CaixaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_liquidity(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/liquidity/{id}
#[utoipa::path(
    put,
    path = "/api/liquidity/{id}",
    tag = "Liquidity",
    request_body = CaixaPayload,
    responses(
        (status = 200, description = "Item atualizado", body = CaixaDisponibilidade),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Item"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_liquidity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CaixaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_liquidity(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/liquidity/{id}
#[utoipa::path(
    delete,
    path = "/api/liquidity/{id}",
    tag = "Liquidity",
    responses(
        (status = 204, description = "Item removido"),
        (status = 404, description = "Item não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Item"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_liquidity(
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
        .liquidity_repo
        .delete(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Caixa/disponibilidade").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_category_and_rejects_unknown_ones() {
        let ok: CaixaPayload = serde_json::from_value(json!({
            "nome": "Estoque de soja",
            "categoria": "ESTOQUE_COMMODITIES",
            "valoresPorSafra": { "s1": "1500000.50" }
        }))
        .unwrap();
        assert_eq!(ok.categoria, CategoriaCaixa::EstoqueCommodities);
        assert!(ok.validate().is_ok());

        let err = serde_json::from_value::<CaixaPayload>(json!({
            "nome": "X",
            "categoria": "POUPANCA"
        }));
        assert!(err.is_err());
    }
}
