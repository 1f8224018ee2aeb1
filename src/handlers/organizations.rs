// src/handlers/organizations.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
    },
    config::AppState,
    db::organization_repo::NovaOrganizacao,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::{CurrentMembership, OrganizationContext},
    },
    models::organization::{Convite, FuncaoMembro, Membership, MinhaOrganizacao, Organizacao},
};

// =============================================================================
//  1. ORGANIZAÇÕES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrganizationPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Fazenda Santa Rita")]
    pub nome: String,

    #[validate(length(min = 11, max = 18, message = "CPF/CNPJ inválido."))]
    pub cpf_cnpj: Option<String>,

    #[validate(email(message = "O e-mail fornecido é inválido."))]
    pub email: Option<String>,

    pub telefone: Option<String>,
    pub cidade: Option<String>,

    #[validate(length(equal = 2, message = "Use a sigla do estado (ex.: MT)."))]
    #[schema(example = "MT")]
    pub estado: Option<String>,
}

// POST /api/organizations
#[utoipa::path(
    post,
    path = "/api/organizations",
    tag = "Organizations",
    request_body = CreateOrganizationPayload,
    responses(
        (status = 201, description = "Organização criada (o criador vira proprietário)", body = Organizacao)
    ),
    security(("api_jwt" = []))
)]
pub async fn create_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<CreateOrganizationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let nova = NovaOrganizacao {
        nome: payload.nome.trim(),
        cpf_cnpj: payload.cpf_cnpj.as_deref(),
        email: payload.email.as_deref(),
        telefone: payload.telefone.as_deref(),
        cidade: payload.cidade.as_deref(),
        estado: payload.estado.as_deref(),
    };

    let org = app_state
        .organization_service
        .create_with_owner(&nova, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(org)))
}

// GET /api/organizations
#[utoipa::path(
    get,
    path = "/api/organizations",
    tag = "Organizations",
    responses(
        (status = 200, description = "Organizações do usuário, com a função de cada uma", body = Vec<MinhaOrganizacao>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_my_organizations(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let orgs = app_state
        .organization_service
        .list_for_user(user.id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(orgs))
}

// GET /api/organizations/current
#[utoipa::path(
    get,
    path = "/api/organizations/current",
    tag = "Organizations",
    responses(
        (status = 200, description = "Organização do cabeçalho", body = Organizacao)
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_current_organization(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let org = app_state
        .organization_service
        .get(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(org))
}

// =============================================================================
//  2. CONVITES
// =============================================================================

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateInvitationPayload {
    #[validate(email(message = "O e-mail fornecido é inválido."))]
    #[schema(example = "gerente@fazenda.com.br")]
    pub email: String,

    /// ADMINISTRADOR ou MEMBRO (PROPRIETARIO vira ADMINISTRADOR)
    #[schema(example = "MEMBRO")]
    pub funcao: FuncaoMembro,
}

// POST /api/organizations/invitations
#[utoipa::path(
    post,
    path = "/api/organizations/invitations",
    tag = "Organizations",
    request_body = CreateInvitationPayload,
    responses(
        (status = 201, description = "Convite criado (válido por 7 dias)", body = Convite),
        (status = 403, description = "Apenas proprietários e administradores convidam; administradores só pelo proprietário")
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_invitation(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    CurrentMembership(membership): CurrentMembership,
    Json(payload): Json<CreateInvitationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    // Só o proprietário promove alguém a administrador
    if payload.funcao == FuncaoMembro::Administrador && membership.funcao != FuncaoMembro::Proprietario {
        return Err(AppError::InsufficientRole.to_api_error(&locale));
    }

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let convite = app_state
        .organization_service
        .invite(&mut *rls_conn, org_ctx.0, &payload.email, payload.funcao)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(convite)))
}

// GET /api/organizations/invitations
#[utoipa::path(
    get,
    path = "/api/organizations/invitations",
    tag = "Organizations",
    responses(
        (status = 200, description = "Convites da organização", body = Vec<Convite>)
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_invitations(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let convites = app_state
        .organization_service
        .list_invitations(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(convites))
}

// DELETE /api/organizations/invitations/{id}
#[utoipa::path(
    delete,
    path = "/api/organizations/invitations/{id}",
    tag = "Organizations",
    responses(
        (status = 204, description = "Convite cancelado"),
        (status = 404, description = "Convite não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Convite"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn cancel_invitation(
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

    app_state
        .organization_service
        .cancel_invitation(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AcceptInvitationPayload {
    #[validate(length(min = 1, message = "O token é obrigatório."))]
    pub token: String,
}

// POST /api/invitations/accept
#[utoipa::path(
    post,
    path = "/api/invitations/accept",
    tag = "Organizations",
    request_body = AcceptInvitationPayload,
    responses(
        (status = 200, description = "Convite aceito", body = Membership),
        (status = 400, description = "Convite inválido ou expirado"),
        (status = 403, description = "Convite destinado a outro e-mail")
    ),
    security(("api_jwt" = []))
)]
pub async fn accept_invitation(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Json(payload): Json<AcceptInvitationPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let membership = app_state
        .organization_service
        .accept_invitation(&payload.token, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(membership))
}
