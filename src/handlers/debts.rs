// src/handlers/debts.rs

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
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
        safra_values::{empty_safra_map, strip_zero_entries},
        validation::{validate_not_negative, validate_safra_map},
    },
    config::AppState,
    db::debt_repo::{AquisicaoTerraInput, ArrendamentoInput, DividaBancariaInput, DividaFornecedorInput},
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::debts::{
        AquisicaoTerra, Arrendamento, DividaBancaria, DividaFornecedor, ModalidadeDivida, Moeda,
        TipoDivida,
    },
};

// =============================================================================
//  1. BANCOS / TRADINGS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DividaBancariaPayload {
    #[validate(length(min = 1, message = "A instituição é obrigatória."))]
    #[schema(example = "Banco do Brasil")]
    pub instituicao_bancaria: String,

    pub tipo: TipoDivida,
    pub modalidade: ModalidadeDivida,

    #[validate(range(min = 1900, max = 2200, message = "Ano inválido."))]
    pub ano_contratacao: Option<i32>,

    #[schema(example = "CDI")]
    pub indexador: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub taxa_real: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_principal: Option<Decimal>,

    #[serde(default)]
    pub moeda: Moeda,

    /// `{ safraId: valor }` a pagar em cada safra
    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub fluxo_pagamento_anual: Value,
}

// GET /api/debts/bank
#[utoipa::path(
    get,
    path = "/api/debts/bank",
    tag = "Debts",
    responses((status = 200, description = "Dívidas bancárias e de tradings", body = Vec<DividaBancaria>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_bank_debts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .debt_repo
        .list_bancarias(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/debts/bank/{id}
#[utoipa::path(
    get,
    path = "/api/debts/bank/{id}",
    tag = "Debts",
    responses(
        (status = 200, description = "Dívida bancária", body = DividaBancaria),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_bank_debt(
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
        .debt_repo
        .find_bancaria(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Dívida bancária").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_bank_debt(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: DividaBancariaPayload,
) -> Result<DividaBancaria, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let fluxo = strip_zero_entries(&payload.fluxo_pagamento_anual);
    let input = DividaBancariaInput {
        instituicao_bancaria: payload.instituicao_bancaria.trim(),
        tipo: payload.tipo,
        modalidade: payload.modalidade,
        ano_contratacao: payload.ano_contratacao,
        indexador: payload.indexador.as_deref(),
        taxa_real: payload.taxa_real,
        valor_principal: payload.valor_principal,
        moeda: payload.moeda,
        fluxo_pagamento_anual: &fluxo,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .debt_repo
        .save_bancaria(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Dívida bancária").to_api_error(locale))
}

// POST /api/debts/bank
#[utoipa::path(
    post,
    path = "/api/debts/bank",
    tag = "Debts",
    request_body = DividaBancariaPayload,
    responses((status = 201, description = "Dívida criada", body = DividaBancaria)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_bank_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<DividaBancariaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_bank_debt(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/debts/bank/{id}
#[utoipa::path(
    put,
    path = "/api/debts/bank/{id}",
    tag = "Debts",
    request_body = DividaBancariaPayload,
    responses(
        (status = 200, description = "Dívida atualizada", body = DividaBancaria),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_bank_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DividaBancariaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_bank_debt(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/debts/bank/{id}
#[utoipa::path(
    delete,
    path = "/api/debts/bank/{id}",
    tag = "Debts",
    responses(
        (status = 204, description = "Dívida removida"),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_bank_debt(
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
        .debt_repo
        .delete_bancaria(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Dívida bancária").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  2. FORNECEDORES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DividaFornecedorPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Agro Insumos Ltda")]
    pub nome: String,

    #[schema(example = "INSUMOS")]
    pub categoria: Option<String>,

    #[serde(default)]
    pub moeda: Moeda,

    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub valores_por_safra: Value,
}

// GET /api/debts/suppliers
#[utoipa::path(
    get,
    path = "/api/debts/suppliers",
    tag = "Debts",
    responses((status = 200, description = "Dívidas com fornecedores", body = Vec<DividaFornecedor>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_supplier_debts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .debt_repo
        .list_fornecedores(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/debts/suppliers/{id}
#[utoipa::path(
    get,
    path = "/api/debts/suppliers/{id}",
    tag = "Debts",
    responses(
        (status = 200, description = "Dívida com fornecedor", body = DividaFornecedor),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_supplier_debt(
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
        .debt_repo
        .find_fornecedor(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Dívida com fornecedor").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_supplier_debt(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: DividaFornecedorPayload,
) -> Result<DividaFornecedor, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let valores = strip_zero_entries(&payload.valores_por_safra);
    let input = DividaFornecedorInput {
        nome: payload.nome.trim(),
        categoria: payload.categoria.as_deref(),
        moeda: payload.moeda,
        valores_por_safra: &valores,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .debt_repo
        .save_fornecedor(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Dívida com fornecedor").to_api_error(locale))
}

// POST /api/debts/suppliers
#[utoipa::path(
    post,
    path = "/api/debts/suppliers",
    tag = "Debts",
    request_body = DividaFornecedorPayload,
    responses((status = 201, description = "Dívida criada", body = DividaFornecedor)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_supplier_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<DividaFornecedorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_supplier_debt(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/debts/suppliers/{id}
#[utoipa::path(
    put,
    path = "/api/debts/suppliers/{id}",
    tag = "Debts",
    request_body = DividaFornecedorPayload,
    responses(
        (status = 200, description = "Dívida atualizada", body = DividaFornecedor),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_supplier_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<DividaFornecedorPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_supplier_debt(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/debts/suppliers/{id}
#[utoipa::path(
    delete,
    path = "/api/debts/suppliers/{id}",
    tag = "Debts",
    responses(
        (status = 204, description = "Dívida removida"),
        (status = 404, description = "Dívida não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Dívida"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_supplier_debt(
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
        .debt_repo
        .delete_fornecedor(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Dívida com fornecedor").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  3. AQUISIÇÃO DE TERRAS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AquisicaoTerraPayload {
    #[validate(length(min = 1, message = "O nome da fazenda é obrigatório."))]
    pub nome_fazenda: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub hectares: Option<Decimal>,

    /// Safra do pagamento único (quando não há fluxo anual)
    pub safra_id: Option<Uuid>,

    #[validate(custom(function = "validate_not_negative"))]
    pub valor_total: Option<Decimal>,

    #[serde(default)]
    pub moeda: Moeda,

    #[validate(custom(function = "validate_safra_map"))]
    #[schema(value_type = Option<Object>)]
    pub fluxo_pagamento_anual: Option<Value>,
}

impl AquisicaoTerraPayload {
    // Sem fluxo anual, o valor total precisa de uma safra
    fn validate_consistency(&self) -> Result<(), ValidationError> {
        if self.fluxo_pagamento_anual.is_none() && self.valor_total.is_some() && self.safra_id.is_none() {
            let mut err = ValidationError::new("safra_id");
            err.message = Some("Informe a safra do pagamento ou o fluxo anual.".into());
            return Err(err);
        }
        Ok(())
    }

    fn validate_all(&self) -> Result<(), AppError> {
        self.validate()?;
        self.validate_consistency().map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("safraId", e);
            AppError::ValidationError(errors)
        })
    }
}

// GET /api/debts/land
#[utoipa::path(
    get,
    path = "/api/debts/land",
    tag = "Debts",
    responses((status = 200, description = "Aquisições de terras", body = Vec<AquisicaoTerra>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_land_debts(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .debt_repo
        .list_terras(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/debts/land/{id}
#[utoipa::path(
    get,
    path = "/api/debts/land/{id}",
    tag = "Debts",
    responses(
        (status = 200, description = "Aquisição de terra", body = AquisicaoTerra),
        (status = 404, description = "Registro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Aquisição"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_land_debt(
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
        .debt_repo
        .find_terra(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Aquisição de terra").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_land_debt(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: AquisicaoTerraPayload,
) -> Result<AquisicaoTerra, ApiError> {
    payload.validate_all().map_err(|e| e.to_api_error(locale))?;

    let fluxo = payload.fluxo_pagamento_anual.as_ref().map(strip_zero_entries);
    let input = AquisicaoTerraInput {
        nome_fazenda: payload.nome_fazenda.trim(),
        hectares: payload.hectares,
        safra_id: payload.safra_id,
        valor_total: payload.valor_total,
        moeda: payload.moeda,
        fluxo_pagamento_anual: fluxo.as_ref(),
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .debt_repo
        .save_terra(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Aquisição de terra").to_api_error(locale))
}

// POST /api/debts/land
#[utoipa::path(
    post,
    path = "/api/debts/land",
    tag = "Debts",
    request_body = AquisicaoTerraPayload,
    responses((status = 201, description = "Aquisição registrada", body = AquisicaoTerra)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_land_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<AquisicaoTerraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_land_debt(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/debts/land/{id}
#[utoipa::path(
    put,
    path = "/api/debts/land/{id}",
    tag = "Debts",
    request_body = AquisicaoTerraPayload,
    responses(
        (status = 200, description = "Aquisição atualizada", body = AquisicaoTerra),
        (status = 404, description = "Registro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Aquisição"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_land_debt(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AquisicaoTerraPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_land_debt(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/debts/land/{id}
#[utoipa::path(
    delete,
    path = "/api/debts/land/{id}",
    tag = "Debts",
    responses(
        (status = 204, description = "Aquisição removida"),
        (status = 404, description = "Registro não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Aquisição"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_land_debt(
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
        .debt_repo
        .delete_terra(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Aquisição de terra").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  4. ARRENDAMENTOS
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ArrendamentoPayload {
    pub propriedade_id: Option<Uuid>,

    #[validate(length(min = 1, message = "O nome da fazenda é obrigatório."))]
    pub nome_fazenda: String,

    #[validate(custom(function = "validate_not_negative"))]
    pub area_arrendada: Option<Decimal>,

    #[schema(example = "SACAS")]
    pub tipo_pagamento: Option<String>,

    /// `{ safraId: custo em R$ }`
    #[validate(custom(function = "validate_safra_map"))]
    #[serde(default = "empty_safra_map")]
    #[schema(value_type = Object)]
    pub custos_por_safra: Value,
}

// GET /api/debts/leases
#[utoipa::path(
    get,
    path = "/api/debts/leases",
    tag = "Debts",
    responses((status = 200, description = "Arrendamentos", body = Vec<Arrendamento>)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn list_leases(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let rows = app_state
        .debt_repo
        .list_arrendamentos(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(rows))
}

// GET /api/debts/leases/{id}
#[utoipa::path(
    get,
    path = "/api/debts/leases/{id}",
    tag = "Debts",
    responses(
        (status = 200, description = "Arrendamento", body = Arrendamento),
        (status = 404, description = "Arrendamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Arrendamento"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_lease(
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
        .debt_repo
        .find_arrendamento(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Arrendamento").to_api_error(&locale))?;

    Ok(Json(row))
}

async fn save_lease(
    app_state: &AppState,
    locale: &Locale,
    user: &AuthenticatedUser,
    org_ctx: &OrganizationContext,
    id: Option<Uuid>,
    payload: ArrendamentoPayload,
) -> Result<Arrendamento, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(locale))?;

    let custos = strip_zero_entries(&payload.custos_por_safra);
    let input = ArrendamentoInput {
        propriedade_id: payload.propriedade_id,
        nome_fazenda: payload.nome_fazenda.trim(),
        area_arrendada: payload.area_arrendada,
        tipo_pagamento: payload.tipo_pagamento.as_deref(),
        custos_por_safra: &custos,
    };

    let mut rls_conn = get_rls_connection(app_state, org_ctx, user)
        .await
        .map_err(|e| e.to_api_error(locale))?;

    app_state
        .debt_repo
        .save_arrendamento(&mut *rls_conn, org_ctx.0, id, &input)
        .await
        .map_err(|e| e.to_api_error(locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Arrendamento").to_api_error(locale))
}

// POST /api/debts/leases
#[utoipa::path(
    post,
    path = "/api/debts/leases",
    tag = "Debts",
    request_body = ArrendamentoPayload,
    responses((status = 201, description = "Arrendamento criado", body = Arrendamento)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn create_lease(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<ArrendamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_lease(&app_state, &locale, &user, &org_ctx, None, payload).await?;
    Ok((StatusCode::CREATED, Json(row)))
}

// PUT /api/debts/leases/{id}
#[utoipa::path(
    put,
    path = "/api/debts/leases/{id}",
    tag = "Debts",
    request_body = ArrendamentoPayload,
    responses(
        (status = 200, description = "Arrendamento atualizado", body = Arrendamento),
        (status = 404, description = "Arrendamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Arrendamento"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_lease(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ArrendamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let row = save_lease(&app_state, &locale, &user, &org_ctx, Some(id), payload).await?;
    Ok(Json(row))
}

// DELETE /api/debts/leases/{id}
#[utoipa::path(
    delete,
    path = "/api/debts/leases/{id}",
    tag = "Debts",
    responses(
        (status = 204, description = "Arrendamento removido"),
        (status = 404, description = "Arrendamento não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Arrendamento"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_lease(
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
        .debt_repo
        .delete_arrendamento(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Arrendamento").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bank_payload_defaults_currency_and_flow() {
        let payload: DividaBancariaPayload = serde_json::from_value(json!({
            "instituicaoBancaria": "Banco do Brasil",
            "tipo": "BANCO",
            "modalidade": "CUSTEIO"
        }))
        .unwrap();

        assert_eq!(payload.moeda, Moeda::Brl);
        assert_eq!(payload.fluxo_pagamento_anual, json!({}));
        assert!(payload.validate().is_ok());
    }

    #[test]
    fn negative_flow_values_are_rejected() {
        let payload: DividaFornecedorPayload = serde_json::from_value(json!({
            "nome": "Agro Insumos",
            "moeda": "USD",
            "valoresPorSafra": { "s1": 100, "s2": -5 }
        }))
        .unwrap();

        assert!(payload.validate().is_err());
    }

    #[test]
    fn land_value_needs_a_safra_or_a_flow() {
        let mut payload: AquisicaoTerraPayload = serde_json::from_value(json!({
            "nomeFazenda": "Fazenda Nova",
            "valorTotal": 1000000
        }))
        .unwrap();
        assert!(payload.validate_all().is_err());

        payload.safra_id = Some(Uuid::new_v4());
        assert!(payload.validate_all().is_ok());

        payload.safra_id = None;
        payload.fluxo_pagamento_anual = Some(json!({ "s1": 500000, "s2": 500000 }));
        assert!(payload.validate_all().is_ok());
    }
}
