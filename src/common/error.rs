// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::middleware::i18n::Locale;

// Nosso tipo de erro, agora com `thiserror` para melhor ergonomia.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Organização não encontrada")]
    OrganizationNotFound,

    #[error("Usuário não pertence à organização")]
    NotAMember,

    #[error("Função insuficiente para a operação")]
    InsufficientRole,

    #[error("Recurso não encontrado: {0}")]
    ResourceNotFound(&'static str),

    #[error("Registro já existe: {0}")]
    AlreadyExists(&'static str),

    #[error("Safra '{0}' já existe")]
    SafraNameAlreadyExists(String),

    #[error("Convite inválido ou expirado")]
    InvitationInvalid,

    #[error("Convite destinado a outro e-mail")]
    InvitationEmailMismatch,

    #[error("Usuário já é membro da organização")]
    AlreadyMember,

    #[error("Cabeçalho x-organizacao-id ausente ou inválido")]
    MissingOrganizationHeader,

    // Variante para erros de banco de dados
    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` é ótimo para capturar o contexto do erro.
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),

    #[error("Fonte não encontrada: {0}")]
    FontNotFound(String),

    #[error("Falha ao gerar arquivo: {0}")]
    ExportError(String),

    #[error("Falha no envio de e-mail: {0}")]
    EmailError(String),

    #[error("Falha no provedor externo: {0}")]
    UpstreamError(String),
}

impl From<reqwest::Error> for AppError {
    fn from(e: reqwest::Error) -> Self {
        AppError::UpstreamError(e.to_string())
    }
}

impl From<rust_xlsxwriter::XlsxError> for AppError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        AppError::ExportError(e.to_string())
    }
}

// ---
// ApiError: a resposta HTTP já traduzida
// ---
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::MissingOrganizationHeader
            | AppError::InvitationInvalid => StatusCode::BAD_REQUEST,
            AppError::EmailAlreadyExists
            | AppError::AlreadyExists(_)
            | AppError::SafraNameAlreadyExists(_)
            | AppError::AlreadyMember => StatusCode::CONFLICT,
            AppError::InvalidCredentials | AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::NotAMember
            | AppError::InsufficientRole
            | AppError::InvitationEmailMismatch => StatusCode::FORBIDDEN,
            AppError::UserNotFound
            | AppError::OrganizationNotFound
            | AppError::ResourceNotFound(_) => StatusCode::NOT_FOUND,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn message(&self, lang: &str) -> String {
        let en = lang == "en";
        let text = match self {
            AppError::ValidationError(_) => {
                if en { "One or more fields are invalid." } else { "Um ou mais campos são inválidos." }
            }
            AppError::EmailAlreadyExists => {
                if en { "This e-mail is already in use." } else { "Este e-mail já está em uso." }
            }
            AppError::InvalidCredentials => {
                if en { "Invalid e-mail or password." } else { "E-mail ou senha inválidos." }
            }
            AppError::InvalidToken => {
                if en { "Missing or invalid authentication token." } else { "Token de autenticação inválido ou ausente." }
            }
            AppError::UserNotFound => {
                if en { "User not found." } else { "Usuário não encontrado." }
            }
            AppError::OrganizationNotFound => {
                if en { "Organization not found." } else { "Organização não encontrada." }
            }
            AppError::NotAMember => {
                if en { "You do not have access to this organization." } else { "Você não tem acesso a esta organização." }
            }
            AppError::InsufficientRole => {
                if en { "Only owners and administrators can perform this action." } else { "Apenas proprietários e administradores podem realizar esta ação." }
            }
            AppError::ResourceNotFound(what) => {
                return if en { format!("{} not found.", what) } else { format!("{} não encontrado(a).", what) };
            }
            AppError::AlreadyExists(what) => {
                return if en { format!("{} already exists.", what) } else { format!("{} já cadastrado(a).", what) };
            }
            AppError::SafraNameAlreadyExists(nome) => {
                return if en { format!("Crop year '{}' already exists.", nome) } else { format!("A safra '{}' já existe.", nome) };
            }
            AppError::InvitationInvalid => {
                if en { "Invitation is invalid or has expired." } else { "Convite inválido ou expirado." }
            }
            AppError::InvitationEmailMismatch => {
                if en { "This invitation was sent to another e-mail." } else { "Este convite foi enviado para outro e-mail." }
            }
            AppError::AlreadyMember => {
                if en { "User is already a member of this organization." } else { "O usuário já é membro desta organização." }
            }
            AppError::MissingOrganizationHeader => {
                if en { "The x-organizacao-id header is missing or invalid." } else { "O cabeçalho x-organizacao-id é obrigatório e deve ser um UUID." }
            }
            AppError::UpstreamError(_) => {
                if en { "External service unavailable." } else { "Serviço externo indisponível." }
            }
            _ => {
                if en { "An unexpected error occurred." } else { "Ocorreu um erro inesperado." }
            }
        };
        text.to_string()
    }

    /// Converte o erro interno numa resposta traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale) -> ApiError {
        let status = self.status();
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O `tracing` loga a mensagem detalhada que `thiserror` nos deu.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            error: self.message(&locale.0),
            details,
        }
    }
}

fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| e.code.to_string())
            })
            .map(Value::String)
            .collect();
        details.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(details)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default()).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn validation_errors_become_400_with_field_details() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("length");
        err.message = Some("O nome é obrigatório.".into());
        errors.add("nome", err);

        let api = AppError::ValidationError(errors).to_api_error(&Locale("pt".into()));

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Um ou mais campos são inválidos.");
        assert_eq!(api.details, Some(json!({ "nome": ["O nome é obrigatório."] })));
    }

    #[test]
    fn messages_follow_the_locale() {
        let pt = AppError::NotAMember.to_api_error(&Locale("pt".into()));
        let en = AppError::NotAMember.to_api_error(&Locale("en".into()));

        assert_eq!(pt.status, StatusCode::FORBIDDEN);
        assert_ne!(pt.error, en.error);
        assert_eq!(en.error, "You do not have access to this organization.");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let err = AppError::InternalServerError(anyhow::anyhow!("segredo da conexão"));
        let api = err.to_api_error(&Locale::default());

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.error.contains("segredo"));
    }
}
