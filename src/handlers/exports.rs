// src/handlers/exports.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::exports::{EmailDeliveryReport, EmailReportPayload, ExportedFile},
    services::email_service::{excel_email, rating_email, Attachment},
};

async fn organization_name(app_state: &AppState, org_id: Uuid) -> Result<String, AppError> {
    let org = app_state.organization_service.get(&app_state.db_pool, org_id).await?;
    Ok(org.nome)
}

fn recipients(payload: &EmailReportPayload) -> Vec<String> {
    payload
        .recipients
        .iter()
        .map(|r| r.trim().to_lowercase())
        .collect()
}

// =============================================================================
//  1. ARQUIVOS
// =============================================================================

// GET /api/reports/excel
#[utoipa::path(
    get,
    path = "/api/reports/excel",
    tag = "Exports",
    responses((status = 200, description = "Planilha com todos os dados (base64)", body = ExportedFile)),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn export_excel(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let nome = organization_name(&app_state, org_ctx.0).await?;
        app_state.export_service.excel(org_ctx.0, &nome).await
    }
    .await;

    let file = result.map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(file))
}

// GET /api/reports/rating/{safra_id}/pdf
#[utoipa::path(
    get,
    path = "/api/reports/rating/{safra_id}/pdf",
    tag = "Exports",
    responses(
        (status = 200, description = "Relatório de rating em PDF (base64)", body = ExportedFile),
        (status = 404, description = "Safra não encontrada")
    ),
    params(
        ("safra_id" = Uuid, Path, description = "ID da Safra"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn export_rating_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
    Path(safra_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let result = async {
        let nome = organization_name(&app_state, org_ctx.0).await?;
        let rating = app_state.rating_service.rating(org_ctx.0, safra_id).await?;
        app_state.pdf_report_service.rating_pdf(&nome, &rating)
    }
    .await;

    let file = result.map_err(|e| e.to_api_error(&locale))?;
    Ok(Json(file))
}

// =============================================================================
//  2. ENVIO POR E-MAIL
// =============================================================================

// POST /api/reports/excel/email
#[utoipa::path(
    post,
    path = "/api/reports/excel/email",
    tag = "Exports",
    request_body = EmailReportPayload,
    responses(
        (status = 200, description = "Resultado por destinatário (lote, depois individual)", body = EmailDeliveryReport)
    ),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn email_excel(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<EmailReportPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let email = async {
        let nome = organization_name(&app_state, org_ctx.0).await?;
        let file = app_state.export_service.excel(org_ctx.0, &nome).await?;
        let attachment = Attachment::from_exported(&file)?;
        Ok::<_, AppError>(excel_email(
            &nome,
            payload.subject.as_deref(),
            payload.message.as_deref(),
            attachment,
        ))
    }
    .await
    .map_err(|e| e.to_api_error(&locale))?;

    let report = app_state
        .email_service
        .send_with_fallback(&recipients(&payload), &email)
        .await;

    Ok(Json(report))
}

// POST /api/reports/rating/email
#[utoipa::path(
    post,
    path = "/api/reports/rating/email",
    tag = "Exports",
    request_body = EmailReportPayload,
    responses(
        (status = 200, description = "Resultado por destinatário (lote, depois individual)", body = EmailDeliveryReport),
        (status = 400, description = "safraId ausente")
    ),
    params(("x-organizacao-id" = Uuid, Header, description = "ID da Organização")),
    security(("api_jwt" = []))
)]
pub async fn email_rating(
    State(app_state): State<AppState>,
    locale: Locale,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<EmailReportPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale))?;

    let safra_id = payload.safra_id.ok_or_else(|| {
        let mut err = ValidationError::new("required");
        err.message = Some("Informe a safra do rating.".into());
        let mut errors = validator::ValidationErrors::new();
        errors.add("safraId", err);
        AppError::ValidationError(errors).to_api_error(&locale)
    })?;

    let email = async {
        let nome = organization_name(&app_state, org_ctx.0).await?;
        let rating = app_state.rating_service.rating(org_ctx.0, safra_id).await?;
        let file = app_state.pdf_report_service.rating_pdf(&nome, &rating)?;
        let attachment = Attachment::from_exported(&file)?;
        Ok::<_, AppError>(rating_email(
            &nome,
            &rating,
            payload.subject.as_deref(),
            payload.message.as_deref(),
            attachment,
        ))
    }
    .await
    .map_err(|e| e.to_api_error(&locale))?;

    let report = app_state
        .email_service
        .send_with_fallback(&recipients(&payload), &email)
        .await;

    Ok(Json(report))
}
