// src/models/exports.rs

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// Arquivo gerado, devolvido em base64
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ExportedFile {
    #[schema(example = "relatorio_2025-01-31.xlsx")]
    pub filename: String,
    pub content_type: String,
    /// Conteúdo em base64
    pub data: String,
}

// Pedido de envio de relatório por e-mail
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailReportPayload {
    #[validate(
        length(min = 1, message = "Informe ao menos um destinatário."),
        custom(function = "validate_recipients")
    )]
    pub recipients: Vec<String>,
    pub subject: Option<String>,
    pub message: Option<String>,
    /// Obrigatório para o relatório de rating
    pub safra_id: Option<Uuid>,
}

fn validate_recipients(recipients: &[String]) -> Result<(), validator::ValidationError> {
    use validator::ValidateEmail;

    if recipients.iter().all(|r| r.trim().validate_email()) {
        return Ok(());
    }
    let mut err = validator::ValidationError::new("email");
    err.message = Some("Um ou mais e-mails são inválidos.".into());
    Err(err)
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct EmailDeliveryResult {
    pub email: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailDeliveryReport {
    /// Verdadeiro se ao menos um envio deu certo
    pub success: bool,
    pub success_count: usize,
    pub failed_count: usize,
    pub results: Vec<EmailDeliveryResult>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(recipients: &[&str]) -> EmailReportPayload {
        EmailReportPayload {
            recipients: recipients.iter().map(|s| s.to_string()).collect(),
            subject: None,
            message: None,
            safra_id: None,
        }
    }

    #[test]
    fn accepts_valid_recipients() {
        assert!(payload(&["a@fazenda.com.br", "b@fazenda.com.br"]).validate().is_ok());
    }

    #[test]
    fn rejects_empty_or_invalid_recipients() {
        assert!(payload(&[]).validate().is_err());
        assert!(payload(&["a@fazenda.com.br", "nao-e-email"]).validate().is_err());
    }
}
