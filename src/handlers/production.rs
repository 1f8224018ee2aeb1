// src/handlers/production.rs

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
    db::production_repo::{AreaInput, CustoInput, ProdutividadeInput},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::production::{AreaPlantio, CustoProducao, ItemCadastro, Produtividade, TabelaCadastro},
};

// =============================================================================
//  1. CADASTROS (CULTURAS, SISTEMAS, CICLOS)
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CadastroPayload {
    #[validate(length(min = 1, max = 80, message = "O nome é obrigatório."))]
    #[schema(example = "SOJA")]
    pub nome: String,
}

async fn list_cadastro(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    tabela: TabelaCadastro,
) -> Result<Json<Vec<ItemCadastro>>, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let items = app_state
        .production_repo
        .list_cadastro(&mut *rls_conn, tabela, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(items))
}

async fn create_cadastro(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    tabela: TabelaCadastro,
    payload: CadastroPayload,
) -> Result<(StatusCode, Json<ItemCadastro>), ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let item = app_state
        .production_repo
        .create_cadastro(&mut *rls_conn, tabela, org_ctx.0, &payload.nome)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    tracing::info!("🌾 {} '{}' cadastrado(a) na organização {}", tabela.label(), item.nome, org_ctx.0);
    Ok((StatusCode::CREATED, Json(item)))
}

async fn delete_cadastro(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    tabela: TabelaCadastro,
    id: Uuid,
) -> Result<StatusCode, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let removed = app_state
        .production_repo
        .delete_cadastro(&mut *rls_conn, tabela, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound(tabela.label()).to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// --- Culturas ---

#[utoipa::path(
    get,
    path = "/api/production/cultures",
    tag = "Production",
    responses((status = 200, description = "Culturas", body = Vec<ItemCadastro>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_cultures(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    list_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Culturas).await
}

#[utoipa::path(
    post,
    path = "/api/production/cultures",
    tag = "Production",
    request_body = CadastroPayload,
    responses((status = 201, description = "Cultura criada", body = ItemCadastro)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_culture(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CadastroPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Culturas, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/production/cultures/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Cultura removida"),
        (status = 404, description = "Cultura não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Cultura"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_culture(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    delete_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Culturas, id).await
}

// --- Sistemas ---

#[utoipa::path(
    get,
    path = "/api/production/systems",
    tag = "Production",
    responses((status = 200, description = "Sistemas de cultivo", body = Vec<ItemCadastro>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_systems(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    list_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Sistemas).await
}

#[utoipa::path(
    post,
    path = "/api/production/systems",
    tag = "Production",
    request_body = CadastroPayload,
    responses((status = 201, description = "Sistema criado", body = ItemCadastro)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_system(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CadastroPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Sistemas, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/production/systems/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Sistema removido"),
        (status = 404, description = "Sistema não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Sistema"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_system(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    delete_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Sistemas, id).await
}

// --- Ciclos ---

#[utoipa::path(
    get,
    path = "/api/production/cycles",
    tag = "Production",
    responses((status = 200, description = "Ciclos", body = Vec<ItemCadastro>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_cycles(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    list_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Ciclos).await
}

#[utoipa::path(
    post,
    path = "/api/production/cycles",
    tag = "Production",
    request_body = CadastroPayload,
    responses((status = 201, description = "Ciclo criado", body = ItemCadastro)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_cycle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CadastroPayload>,
) -> Result<impl IntoResponse, ApiError> {
    create_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Ciclos, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/production/cycles/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Ciclo removido"),
        (status = 404, description = "Ciclo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Ciclo"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_cycle(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    delete_cadastro(app_state, locale, user, org_ctx, TabelaCadastro::Ciclos, id).await
}

// =============================================================================
//  2. ÁREAS DE PLANTIO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaPayload {
    pub propriedade_id: Uuid,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    pub ciclo_id: Uuid,

    /// `{ safraId: hectares }`
    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub areas_por_safra: Value,
}

#[utoipa::path(
    get,
    path = "/api/production/areas",
    tag = "Production",
    responses((status = 200, description = "Áreas de plantio", body = Vec<AreaPlantio>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_areas(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .production_repo
        .list_areas(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/production/areas",
    tag = "Production",
    request_body = AreaPayload,
    responses((status = 201, description = "Área registrada", body = AreaPlantio)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_area(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<AreaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let areas = strip_zero_entries(&payload.areas_por_safra);
    let input = AreaInput {
        propriedade_id: payload.propriedade_id,
        cultura_id: payload.cultura_id,
        sistema_id: payload.sistema_id,
        ciclo_id: payload.ciclo_id,
        areas_por_safra: &areas,
    };

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let row = app_state
        .production_repo
        .create_area(&mut *rls_conn, org_ctx.0, &input)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    delete,
    path = "/api/production/areas/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Área removida"),
        (status = 404, description = "Área não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Área"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_area(
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
        .production_repo
        .delete_area(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Área de plantio").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  3. PRODUTIVIDADES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProdutividadePayload {
    /// Sem propriedade, vale para todas
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,

    /// `{ safraId: sc/ha }`
    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub produtividades_por_safra: Value,
}

#[utoipa::path(
    get,
    path = "/api/production/productivities",
    tag = "Production",
    responses((status = 200, description = "Produtividades", body = Vec<Produtividade>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_productivities(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .production_repo
        .list_produtividades(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/production/productivities",
    tag = "Production",
    request_body = ProdutividadePayload,
    responses((status = 201, description = "Produtividade registrada", body = Produtividade)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_productivity(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<ProdutividadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let produtividades = strip_zero_entries(&payload.produtividades_por_safra);
    let input = ProdutividadeInput {
        propriedade_id: payload.propriedade_id,
        cultura_id: payload.cultura_id,
        sistema_id: payload.sistema_id,
        produtividades_por_safra: &produtividades,
    };

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let row = app_state
        .production_repo
        .create_produtividade(&mut *rls_conn, org_ctx.0, &input)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    delete,
    path = "/api/production/productivities/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Produtividade removida"),
        (status = 404, description = "Produtividade não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Produtividade"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_productivity(
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
        .production_repo
        .delete_produtividade(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Produtividade").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  4. CUSTOS DE PRODUÇÃO
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustoPayload {
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,

    #[validate(length(min = 1, message = "A categoria é obrigatória."))]
    #[schema(example = "FERTILIZANTES")]
    pub categoria: String,

    /// `{ safraId: R$/ha }`
    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub custos_por_safra: Value,
}

#[utoipa::path(
    get,
    path = "/api/production/costs",
    tag = "Production",
    responses((status = 200, description = "Custos de produção", body = Vec<CustoProducao>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_costs(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .production_repo
        .list_custos(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

#[utoipa::path(
    post,
    path = "/api/production/costs",
    tag = "Production",
    request_body = CustoPayload,
    responses((status = 201, description = "Custo registrado", body = CustoProducao)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_cost(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<CustoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let custos = strip_zero_entries(&payload.custos_por_safra);
    let categoria = payload.categoria.trim().to_uppercase();
    let input = CustoInput {
        propriedade_id: payload.propriedade_id,
        cultura_id: payload.cultura_id,
        sistema_id: payload.sistema_id,
        categoria: &categoria,
        custos_por_safra: &custos,
    };

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let row = app_state
        .production_repo
        .create_custo(&mut *rls_conn, org_ctx.0, &input)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(row)))
}

#[utoipa::path(
    delete,
    path = "/api/production/costs/{id}",
    tag = "Production",
    responses(
        (status = 204, description = "Custo removido"),
        (status = 404, description = "Custo não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Custo"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_cost(
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
        .production_repo
        .delete_custo(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Custo de produção").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}
