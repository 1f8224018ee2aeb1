// src/handlers/prices.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rust_decimal::Decimal;
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
        validation::{validate_not_negative, validate_safra_map},
    },
    config::AppState,
    db::price_repo::{CotacaoInput, PrecoInput},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::prices::{CotacaoCambio, PrecoCommodity, TipoCotacao},
};

// =============================================================================
//  1. PREÇOS DE COMMODITIES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrecoPayload {
    #[validate(length(min = 1, message = "O tipo de commodity é obrigatório."))]
    #[schema(example = "SOJA_SEQUEIRO")]
    pub commodity_type: String,

    pub cultura_id: Option<Uuid>,
    pub sistema_id: Option<Uuid>,

    /// Unidades em dólar ("US$/sc", "USD/@") são convertidas por safra
    #[validate(length(min = 1, message = "A unidade é obrigatória."))]
    #[schema(example = "R$/sc")]
    pub unit: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub current_price: Decimal,

    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub precos_por_safra: Value,
}

// GET /api/prices/commodities
#[utoipa::path(
    get,
    path = "/api/prices/commodities",
    tag = "Prices",
    responses((status = 200, description = "Projeções de preço", body = Vec<PrecoCommodity>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_commodity_prices(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .price_repo
        .list_precos(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/prices/commodities/{id}
#[utoipa::path(
    get,
    path = "/api/prices/commodities/{id}",
    tag = "Prices",
    responses(
        (status = 200, description = "Projeção de preço", body = PrecoCommodity),
        (status = 404, description = "Preço não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Preço"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_commodity_price(
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
        .price_repo
        .find_preco(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Preço de commodity").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_commodity_price(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: PrecoPayload,
) -> Result<PrecoCommodity, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let precos = strip_zero_entries(&payload.precos_por_safra);
    let commodity_type = payload.commodity_type.trim().to_uppercase();
    let input = PrecoInput {
        commodity_type: &commodity_type,
        cultura_id: payload.cultura_id,
        sistema_id: payload.sistema_id,
        unit: payload.unit.trim(),
        current_price: payload.current_price,
        precos_por_safra: &precos,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .price_repo
        .save_preco(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Preço de commodity").to_api_error(locale))
}

// POST /api/prices/commodities
#[utoipa::path(
    post,
    path = "/api/prices/commodities",
    tag = "Prices",
    request_body = PrecoPayload,
    responses(
        (status = 201, description = "Preço criado", body = PrecoCommodity),
        (status = 409, description = "Já existe projeção para essa commodity")
    ),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_commodity_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<PrecoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_commodity_price(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/prices/commodities/{id}
#[utoipa::path(
    put,
    path = "/api/prices/commodities/{id}",
    tag = "Prices",
    request_body = PrecoPayload,
    responses(
        (status = 200, description = "Preço atualizado", body = PrecoCommodity),
        (status = 404, description = "Preço não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Preço"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_commodity_price(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PrecoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_commodity_price(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/prices/commodities/{id}
#[utoipa::path(
    delete,
    path = "/api/prices/commodities/{id}",
    tag = "Prices",
    responses(
        (status = 204, description = "Preço removido"),
        (status = 404, description = "Preço não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Preço"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_commodity_price(
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
        .price_repo
        .delete_preco(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Preço de commodity").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. COTAÇÕES DE CÂMBIO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CotacaoPayload {
    /// DOLAR_FECHAMENTO alimenta a taxa das safras sem câmbio próprio
    #[schema(example = "DOLAR_FECHAMENTO")]
    pub tipo_moeda: TipoCotacao,

    #[serde(default = "default_unit")]
    #[schema(example = "R$")]
    pub unit: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub cotacao_atual: Decimal,

    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub cotacoes_por_safra: Value,
}

fn default_unit() -> String {
    "R$".to_string()
}

// GET /api/prices/exchange-rates
#[utoipa::path(
    get,
    path = "/api/prices/exchange-rates",
    tag = "Prices",
    responses((status = 200, description = "Cotações de câmbio", body = Vec<CotacaoCambio>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_exchange_rates(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .price_repo
        .list_cotacoes(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/prices/exchange-rates/{id}
#[utoipa::path(
    get,
    path = "/api/prices/exchange-rates/{id}",
    tag = "Prices",
    responses(
        (status = 200, description = "Cotação de câmbio", body = CotacaoCambio),
        (status = 404, description = "Cotação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Cotação"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_exchange_rate(
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
        .price_repo
        .find_cotacao(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Cotação de câmbio").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_exchange_rate(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: CotacaoPayload,
) -> Result<CotacaoCambio, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let cotacoes = strip_zero_entries(&payload.cotacoes_por_safra);
    let input = CotacaoInput {
        tipo_moeda: payload.tipo_moeda,
        unit: payload.unit.trim(),
        cotacao_atual: payload.cotacao_atual,
        cotacoes_por_safra: &cotacoes,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .price_repo
        .save_cotacao(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Cotação de câmbio").to_api_error(locale))
}

// POST /api/prices/exchange-rates
#[utoipa::path(
    post,
    path = "/api/prices/exchange-rates",
    tag = "Prices",
    request_body = CotacaoPayload,
    responses(
        (status = 201, description = "Cotação criada", body = CotacaoCambio),
        (status = 409, description = "Já existe cotação desse tipo")
    ),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_exchange_rate(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CotacaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_exchange_rate(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/prices/exchange-rates/{id}
#[utoipa::path(
    put,
    path = "/api/prices/exchange-rates/{id}",
    tag = "Prices",
    request_body = CotacaoPayload,
    responses(
        (status = 200, description = "Cotação atualizada", body = CotacaoCambio),
        (status = 404, description = "Cotação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Cotação"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_exchange_rate(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CotacaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_exchange_rate(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/prices/exchange-rates/{id}
#[utoipa::path(
    delete,
    path = "/api/prices/exchange-rates/{id}",
    tag = "Prices",
    responses(
        (status = 204, description = "Cotação removida"),
        (status = 404, description = "Cotação não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Cotação"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_exchange_rate(
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
        .price_repo
        .delete_cotacao(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Cotação de câmbio").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn exchange_rate_defaults_to_reais_unit() {
        let payload: CotacaoPayload = serde_json::from_value(json!({
            "tipoMoeda": "DOLAR_FECHAMENTO",
            "cotacaoAtual": 5.45,
            "cotacoesPorSafra": { "s1": 5.5, "s2": 0 }
        }))
        .unwrap();

        assert_eq!(payload.tipo_moeda, TipoCotacao::DolarFechamento);
        assert_eq!(payload.unit, "R$");
        assert!(payload.validate().is_ok());
        assert_eq!(strip_zero_entries(&payload.cotacoes_por_safra), json!({ "s1": 5.5 }));
    }

    #[test]
    fn negative_price_is_rejected() {
        let payload: PrecoPayload = serde_json::from_value(json!({
            "commodityType": "SOJA",
            "unit": "R$/sc",
            "currentPrice": -1
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }
}
