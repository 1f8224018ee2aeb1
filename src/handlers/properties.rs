// src/handlers/properties.rs

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
use validator::{Validate, ValidationError};

use crate::{
    common::{
        db_utils::get_rls_connection,
        error::{ApiError, AppError},
        validation::validate_not_negative,
    },
    config::AppState,
    db::property_repo::PropriedadeInput,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{Gestor, RequireRole},
        tenancy::OrganizationContext,
    },
    models::property::{Propriedade, TipoPropriedade},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PropriedadePayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    #[schema(example = "Fazenda Boa Vista")]
    pub nome: String,

    #[schema(example = "PROPRIA")]
    pub tipo: TipoPropriedade,

    /// Hectares
    #[validate(custom(function = "validate_not_negative"))]
    pub area_total: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    pub area_cultivada: Option<Decimal>,

    /// Valor de mercado (R$)
    #[validate(custom(function = "validate_not_negative"))]
    pub valor_atual: Option<Decimal>,

    pub cidade: Option<String>,

    #[validate(length(equal = 2, message = "Use a sigla do estado (ex.: MT)."))]
    pub estado: Option<String>,
}

impl PropriedadePayload {
    // Área cultivada não passa da área total
    fn validate_consistency(&self) -> Result<(), ValidationError> {
        if let Some(cultivada) = self.area_cultivada {
            if cultivada > self.area_total {
                let mut err = ValidationError::new("area_cultivada");
                err.message = Some("A área cultivada não pode exceder a área total.".into());
                return Err(err);
            }
        }
        Ok(())
    }

    fn validate_all(&self) -> Result<(), AppError> {
        self.validate()?;
        self.validate_consistency().map_err(|e| {
            let mut errors = validator::ValidationErrors::new();
            errors.add("areaCultivada", e);
            AppError::ValidationError(errors)
        })
    }

    fn as_input(&self) -> PropriedadeInput<'_> {
        PropriedadeInput {
            nome: self.nome.trim(),
            tipo: self.tipo,
            area_total: self.area_total,
            area_cultivada: self.area_cultivada,
            valor_atual: self.valor_atual,
            cidade: self.cidade.as_deref(),
            estado: self.estado.as_deref(),
        }
    }
}

// GET /api/properties
#[utoipa::path(
    get,
    path = "/api/properties",
    tag = "Properties",
    responses(
        (status = 200, description = "Propriedades da organização", body = Vec<Propriedade>)
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_properties(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let props = app_state
        .property_repo
        .list(&mut *rls_conn, org_ctx.0)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok(Json(props))
}

// GET /api/properties/{id}
#[utoipa::path(
    get,
    path = "/api/properties/{id}",
    tag = "Properties",
    responses(
        (status = 200, description = "Propriedade", body = Propriedade),
        (status = 404, description = "Propriedade não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Propriedade"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_property(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let prop = app_state
        .property_repo
        .find(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Propriedade").to_api_error(&locale))?;

    Ok(Json(prop))
}

// POST /api/properties
#[utoipa::path(
    post,
    path = "/api/properties",
    tag = "Properties",
    request_body = PropriedadePayload,
    responses(
        (status = 201, description = "Propriedade criada", body = Propriedade)
    ),
    params(
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_property(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Json(payload): Json<PropriedadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_all().map_err(|e| e.to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let prop = app_state
        .property_repo
        .create(&mut *rls_conn, org_ctx.0, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    Ok((StatusCode::CREATED, Json(prop)))
}

// PUT /api/properties/{id}
#[utoipa::path(
    put,
    path = "/api/properties/{id}",
    tag = "Properties",
    request_body = PropriedadePayload,
    responses(
        (status = 200, description = "Propriedade atualizada", body = Propriedade),
        (status = 404, description = "Propriedade não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Propriedade"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_property(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    org_ctx: OrganizationContext,
    _guard: RequireRole<Gestor>,
    Path(id): Path<Uuid>,
    Json(payload): Json<PropriedadePayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload.validate_all().map_err(|e| e.to_api_error(&locale))?;

    let mut rls_conn = get_rls_connection(&app_state, &org_ctx, &user)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    let prop = app_state
        .property_repo
        .update(&mut *rls_conn, org_ctx.0, id, &payload.as_input())
        .await
        .map_err(|e| e.to_api_error(&locale))?
        .ok_or_else(|| AppError::ResourceNotFound("Propriedade").to_api_error(&locale))?;

    Ok(Json(prop))
}

// DELETE /api/properties/{id}
#[utoipa::path(
    delete,
    path = "/api/properties/{id}",
    tag = "Properties",
    responses(
        (status = 204, description = "Propriedade removida"),
        (status = 404, description = "Propriedade não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Propriedade"),
        ("x-organizacao-id" = Uuid, Header, description = "ID da Organização")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_property(
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
        .property_repo
        .delete(&mut *rls_conn, org_ctx.0, id)
        .await
        .map_err(|e| e.to_api_error(&locale))?;

    if !removed {
        return Err(AppError::ResourceNotFound("Propriedade").to_api_error(&locale));
    }
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payload() -> PropriedadePayload {
        PropriedadePayload {
            nome: "Fazenda Boa Vista".into(),
            tipo: TipoPropriedade::Propria,
            area_total: dec!(1000),
            area_cultivada: Some(dec!(800)),
            valor_atual: Some(dec!(25000000)),
            cidade: Some("Sorriso".into()),
            estado: Some("MT".into()),
        }
    }

    #[test]
    fn accepts_consistent_property() {
        assert!(payload().validate_all().is_ok());
    }

    #[test]
    fn cultivated_area_cannot_exceed_total() {
        let mut p = payload();
        p.area_cultivada = Some(dec!(1200));
        assert!(matches!(p.validate_all(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn negative_values_and_bad_state_are_rejected() {
        let mut p = payload();
        p.valor_atual = Some(dec!(-1));
        assert!(p.validate_all().is_err());

        let mut p = payload();
        p.estado = Some("Mato Grosso".into());
        assert!(p.validate_all().is_err());
    }
}
