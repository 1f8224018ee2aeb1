// src/handlers/reports.rs
//
// Relatórios consolidados. Os dados são lidos da pool com filtro explícito
// pela organização do cabeçalho (o tenant_guard já validou o vínculo).

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, tenancy::OrganizationContext},
    models::reports::{
        BalancoLinha, CultureProjectionsResponse, DebtDetailsResponse, DebtPositionLinha, DreLinha,
        FluxoCaixaLinha, LiabilitiesResponse, RatingResult, ReportFilter,
    },
};

// GET /api/reports/liabilities
#[utoipa::path(
    get,
    path = "/api/reports/liabilities",
    tag = "Reports",
    responses(
        (status = 200, description = "Dívidas e liquidez por safra (falhas de leitura devolvem séries vazias)", body = LiabilitiesResponse)
    ),
    params(
        ReportFilter,
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn total_liabilities(
    State(app_state): State<AppState>,
    org_ctx: OrganizationContext,
    Query(filter): Query<ReportFilter>,
) -> impl IntoResponse {
    Json(app_state.liabilities_service.total_liabilities(org_ctx.0, &filter).await)
}

// GET /api/reports/debt-details
#[utoipa::path(
    get,
    path = "/api/reports/debt-details",
    tag = "Reports",
    responses((status = 200, description = "Detalhamento das dívidas por credor (falhas de leitura devolvem listas vazias)", body = DebtDetailsResponse)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn debt_details(
    State(app_state): State<AppState>,
    org_ctx: OrganizationContext,
) -> impl IntoResponse {
    Json(app_state.debt_details_service.debt_details(org_ctx.0).await)
}

// GET /api/reports/cultures
#[utoipa::path(
    get,
    path = "/api/reports/cultures",
    tag = "Reports",
    responses((status = 200, description = "Projeção por cultura e consolidado", body = CultureProjectionsResponse)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn culture_projections(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let projections = app_state
        .projection_service
        .projections(org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projections.culturas))
}

// GET /api/reports/dre
#[utoipa::path(
    get,
    path = "/api/reports/dre",
    tag = "Reports",
    responses((status = 200, description = "DRE projetada por safra", body = Vec<DreLinha>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn dre(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let projections = app_state
        .projection_service
        .projections(org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projections.dre))
}

// GET /api/reports/cash-flow
#[utoipa::path(
    get,
    path = "/api/reports/cash-flow",
    tag = "Reports",
    responses((status = 200, description = "Fluxo de caixa projetado", body = Vec<FluxoCaixaLinha>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn cash_flow(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let projections = app_state
        .projection_service
        .projections(org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projections.fluxo_caixa))
}

// GET /api/reports/balance-sheet
#[utoipa::path(
    get,
    path = "/api/reports/balance-sheet",
    tag = "Reports",
    responses((status = 200, description = "Balanço patrimonial projetado", body = Vec<BalancoLinha>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn balance_sheet(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let projections = app_state
        .projection_service
        .projections(org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projections.balanco))
}

// GET /api/reports/debt-position
#[utoipa::path(
    get,
    path = "/api/reports/debt-position",
    tag = "Reports",
    responses((status = 200, description = "Posição de dívida e indicadores", body = Vec<DebtPositionLinha>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn debt_position(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let projections = app_state
        .projection_service
        .projections(org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(projections.posicao_divida))
}

// GET /api/reports/rating/{safra_id}
#[utoipa::path(
    get,
    path = "/api/reports/rating/{safra_id}",
    tag = "Reports",
    responses(
        (status = 200, description = "Rating de crédito da safra", body = RatingResult),
        (status = 404, description = "Safra não encontrada")
    ),
    params(
        ("safra_id" = Uuid, Path, description = "ID da Safra"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn rating(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
    Path(safra_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = app_state
        .rating_service
        .rating(org_ctx.0, safra_id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(result))
}
