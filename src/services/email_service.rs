// src/services/email_service.rs
//
// Envio dos relatórios por e-mail. Primeiro tenta um único envio para todos
// os destinatários; se o lote falhar, manda um por um com uma pausa entre
// as tentativas e devolve o placar.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use lettre::{
    message::{header::ContentType, Attachment as MailAttachment, Mailbox, MultiPart, SinglePart},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::{
    common::error::AppError,
    models::{
        exports::{EmailDeliveryReport, EmailDeliveryResult, ExportedFile},
        reports::RatingResult,
    },
};

#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Attachment {
    /// Reaproveita o arquivo exportado (base64) como anexo.
    pub fn from_exported(file: &ExportedFile) -> Result<Self, AppError> {
        use base64::{engine::general_purpose::STANDARD, Engine};

        let bytes = STANDARD
            .decode(&file.data)
            .map_err(|e| AppError::ExportError(e.to_string()))?;
        Ok(Self {
            filename: file.filename.clone(),
            content_type: file.content_type.clone(),
            bytes,
        })
    }
}

#[derive(Debug, Clone)]
pub struct OutgoingEmail {
    pub subject: String,
    pub html: String,
    pub attachment: Option<Attachment>,
}

#[async_trait]
pub trait EmailTransport: Send + Sync {
    async fn send(&self, to: &[String], email: &OutgoingEmail) -> Result<(), AppError>;
}

// ---
// SMTP (lettre)
// ---

#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub username: Option<String>,
    pub password: Option<String>,
    pub from: String,
}

#[derive(Clone)]
pub struct SmtpMailer {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, AppError> {
        let from: Mailbox = config
            .from
            .parse()
            .map_err(|e| AppError::EmailError(format!("remetente inválido: {}", e)))?;

        let transport = match (&config.username, &config.password) {
            (Some(user), Some(pass)) => AsyncSmtpTransport::<Tokio1Executor>::relay(&config.host)
                .map_err(|e| AppError::EmailError(e.to_string()))?
                .port(config.port)
                .credentials(Credentials::new(user.clone(), pass.clone()))
                .build(),
            // Sem credenciais: servidor local de desenvolvimento, sem TLS
            _ => AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
                .port(config.port)
                .build(),
        };

        Ok(Self { transport, from })
    }

    fn build_message(&self, to: &[String], email: &OutgoingEmail) -> Result<Message, AppError> {
        let mut builder = Message::builder().from(self.from.clone()).subject(email.subject.clone());
        for recipient in to {
            let mailbox: Mailbox = recipient
                .trim()
                .parse()
                .map_err(|e| AppError::EmailError(format!("destinatário inválido {}: {}", recipient, e)))?;
            builder = builder.to(mailbox);
        }

        let mut body = MultiPart::mixed().singlepart(SinglePart::html(email.html.clone()));
        if let Some(anexo) = &email.attachment {
            let content_type = ContentType::parse(&anexo.content_type)
                .map_err(|e| AppError::EmailError(e.to_string()))?;
            body = body.singlepart(MailAttachment::new(anexo.filename.clone()).body(anexo.bytes.clone(), content_type));
        }

        builder.multipart(body).map_err(|e| AppError::EmailError(e.to_string()))
    }
}

#[async_trait]
impl EmailTransport for SmtpMailer {
    async fn send(&self, to: &[String], email: &OutgoingEmail) -> Result<(), AppError> {
        let message = self.build_message(to, email)?;
        self.transport
            .send(message)
            .await
            .map_err(|e| AppError::EmailError(e.to_string()))?;
        Ok(())
    }
}

// ---
// Corpo HTML
// ---

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

pub struct EmailContent<'a> {
    pub titulo: &'a str,
    pub organizacao: &'a str,
    pub data: NaiveDate,
    pub mensagem: String,
    pub formato: &'a str,
    pub conteudo: &'a [&'a str],
}

pub fn render_html(c: &EmailContent<'_>) -> String {
    let organizacao = escape_html(c.organizacao);
    let itens: String = c.conteudo.iter().map(|i| format!("&bull; {}<br>", i)).collect();

    format!(
        r#"<!DOCTYPE html>
<html>
<head><meta charset="UTF-8"></head>
<body style="margin:0;padding:20px;font-family:'Segoe UI',Tahoma,sans-serif;background-color:#f4f4f4;">
  <table width="600" align="center" cellpadding="0" cellspacing="0" style="background-color:#ffffff;border-radius:8px;">
    <tr><td style="background-color:#1e293b;padding:30px;text-align:center;">
      <p style="color:#cbd5e1;margin:0;font-size:16px;">{titulo}</p>
    </td></tr>
    <tr><td style="padding:40px 30px;">
      <h2 style="color:#1e293b;margin:0 0 20px 0;">{organizacao}</h2>
      <p style="color:#475569;line-height:1.6;">{mensagem}</p>
      <table width="100%" cellpadding="5" cellspacing="0" style="background-color:#f8fafc;border:1px solid #e2e8f0;">
        <tr><td><strong>Organização:</strong></td><td>{organizacao}</td></tr>
        <tr><td><strong>Data de Exportação:</strong></td><td>{data}</td></tr>
        <tr><td><strong>Formato:</strong></td><td>{formato}</td></tr>
        <tr><td valign="top"><strong>Conteúdo:</strong></td><td>{itens}</td></tr>
      </table>
    </td></tr>
    <tr><td style="padding:20px;text-align:center;color:#94a3b8;font-size:12px;">
      Este é um e-mail automático. O arquivo segue em anexo.
    </td></tr>
  </table>
</body>
</html>"#,
        titulo = c.titulo,
        organizacao = organizacao,
        mensagem = c.mensagem,
        data = c.data.format("%d/%m/%Y"),
        formato = c.formato,
        itens = itens,
    )
}

// Mensagem do usuário: escapada, quebras de linha viram <br>
fn custom_message(message: Option<&str>) -> Option<String> {
    message
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(|m| escape_html(m).replace('\n', "<br>"))
}

/// Assunto e corpo do e-mail da planilha.
pub fn excel_email(organizacao: &str, subject: Option<&str>, message: Option<&str>, attachment: Attachment) -> OutgoingEmail {
    let mensagem = custom_message(message).unwrap_or_else(|| {
        format!(
            "Prezado(a),<br><br>Segue em anexo a planilha Excel com todos os dados da organização {}, \
             incluindo informações detalhadas sobre propriedades, produção e análises financeiras.",
            escape_html(organizacao)
        )
    });

    let html = render_html(&EmailContent {
        titulo: "Exportação de Dados",
        organizacao,
        data: Utc::now().date_naive(),
        mensagem,
        formato: "Microsoft Excel (.xlsx)",
        conteudo: &[
            "Safras e Propriedades",
            "Dívidas Bancárias, Fornecedores e Terras",
            "Arrendamentos",
            "Caixa e Disponibilidades",
            "Passivos Totais",
        ],
    });

    OutgoingEmail {
        subject: subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Dados da Organização - {}", organizacao)),
        html,
        attachment: Some(attachment),
    }
}

/// Assunto e corpo do e-mail do rating.
pub fn rating_email(
    organizacao: &str,
    rating: &RatingResult,
    subject: Option<&str>,
    message: Option<&str>,
    attachment: Attachment,
) -> OutgoingEmail {
    let resumo = format!(
        "Segue em anexo o relatório de rating de crédito da <strong>{}</strong> para a safra {}: \
         classificação <strong>{}</strong> ({}/100).",
        escape_html(organizacao),
        escape_html(&rating.safra),
        rating.classificacao,
        rating.pontuacao_total.round_dp(1)
    );
    let mensagem = match custom_message(message) {
        Some(m) => format!("Prezado(a),<br><br>{}<br><br>{}", m, resumo),
        None => format!("Prezado(a),<br><br>{}", resumo),
    };

    let html = render_html(&EmailContent {
        titulo: "Relatório de Rating de Crédito",
        organizacao,
        data: Utc::now().date_naive(),
        mensagem,
        formato: "PDF",
        conteudo: &["Indicadores financeiros", "Pontuação por indicador", "Classificação final"],
    });

    OutgoingEmail {
        subject: subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| format!("Relatório de Rating - {}", organizacao)),
        html,
        attachment: Some(attachment),
    }
}

// ---
// Entrega com fallback
// ---

#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn EmailTransport>,
    fallback_delay: Duration,
}

impl EmailService {
    pub fn new(transport: Arc<dyn EmailTransport>, fallback_delay: Duration) -> Self {
        Self { transport, fallback_delay }
    }

    pub async fn send_with_fallback(&self, recipients: &[String], email: &OutgoingEmail) -> EmailDeliveryReport {
        // 1. Lote
        match self.transport.send(recipients, email).await {
            Ok(()) => {
                tracing::info!("📧 E-mail '{}' enviado para {} destinatário(s)", email.subject, recipients.len());
                return EmailDeliveryReport {
                    success: true,
                    success_count: recipients.len(),
                    failed_count: 0,
                    results: recipients
                        .iter()
                        .map(|r| EmailDeliveryResult { email: r.clone(), success: true, error: None })
                        .collect(),
                };
            }
            Err(e) => {
                tracing::warn!("⚠️ Envio em lote falhou ({}), tentando individualmente", e);
            }
        }

        // 2. Um por um, com pausa antes de cada tentativa
        let mut results = Vec::with_capacity(recipients.len());
        for recipient in recipients {
            tokio::time::sleep(self.fallback_delay).await;

            let result = match self.transport.send(std::slice::from_ref(recipient), email).await {
                Ok(()) => EmailDeliveryResult { email: recipient.clone(), success: true, error: None },
                Err(e) => {
                    tracing::error!("🔥 Falha ao enviar e-mail para {}: {}", recipient, e);
                    EmailDeliveryResult { email: recipient.clone(), success: false, error: Some(e.to_string()) }
                }
            };
            results.push(result);
        }

        let success_count = results.iter().filter(|r| r.success).count();
        EmailDeliveryReport {
            success: success_count > 0,
            success_count,
            failed_count: results.len() - success_count,
            results,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // Transporte em memória: falha o lote e/ou destinatários específicos
    struct FakeTransport {
        fail_batch: bool,
        fail_for: Vec<String>,
        calls: Mutex<Vec<Vec<String>>>,
    }

    impl FakeTransport {
        fn new(fail_batch: bool, fail_for: &[&str]) -> Arc<Self> {
            Arc::new(Self {
                fail_batch,
                fail_for: fail_for.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            })
        }

        fn calls(&self) -> Vec<Vec<String>> {
            self.calls.lock().map(|c| c.clone()).unwrap_or_default()
        }
    }

    #[async_trait]
    impl EmailTransport for FakeTransport {
        async fn send(&self, to: &[String], _email: &OutgoingEmail) -> Result<(), AppError> {
            if let Ok(mut calls) = self.calls.lock() {
                calls.push(to.to_vec());
            }
            if to.len() > 1 && self.fail_batch {
                return Err(AppError::EmailError("lote recusado".into()));
            }
            if to.iter().any(|r| self.fail_for.contains(r)) {
                return Err(AppError::EmailError("caixa inexistente".into()));
            }
            Ok(())
        }
    }

    fn email() -> OutgoingEmail {
        OutgoingEmail { subject: "Teste".into(), html: "<p>oi</p>".into(), attachment: None }
    }

    fn recipients() -> Vec<String> {
        vec!["a@fazenda.com.br".into(), "b@fazenda.com.br".into(), "c@fazenda.com.br".into()]
    }

    #[tokio::test]
    async fn batch_success_counts_everyone() {
        let transport = FakeTransport::new(false, &[]);
        let service = EmailService::new(transport.clone(), Duration::ZERO);

        let report = service.send_with_fallback(&recipients(), &email()).await;

        assert!(report.success);
        assert_eq!(report.success_count, 3);
        assert_eq!(report.failed_count, 0);
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn failed_batch_retries_each_recipient_once() {
        let transport = FakeTransport::new(true, &[]);
        let service = EmailService::new(transport.clone(), Duration::ZERO);

        let report = service.send_with_fallback(&recipients(), &email()).await;

        let individuais: Vec<_> = transport.calls().into_iter().skip(1).collect();
        assert_eq!(individuais.len(), 3);
        assert!(individuais.iter().all(|c| c.len() == 1));
        assert_eq!(report.success_count, 3);
        assert_eq!(report.failed_count, 0);
    }

    #[tokio::test]
    async fn partial_failures_are_reported_per_recipient() {
        let transport = FakeTransport::new(true, &["b@fazenda.com.br"]);
        let service = EmailService::new(transport, Duration::ZERO);

        let report = service.send_with_fallback(&recipients(), &email()).await;

        assert!(report.success);
        assert_eq!(report.success_count, 2);
        assert_eq!(report.failed_count, 1);
        let falha = report.results.iter().find(|r| !r.success).map(|r| r.email.as_str());
        assert_eq!(falha, Some("b@fazenda.com.br"));
    }

    #[tokio::test]
    async fn everything_failing_is_not_a_success() {
        let todos = ["a@fazenda.com.br", "b@fazenda.com.br", "c@fazenda.com.br"];
        let transport = FakeTransport::new(true, &todos);
        let service = EmailService::new(transport, Duration::ZERO);

        let report = service.send_with_fallback(&recipients(), &email()).await;

        assert!(!report.success);
        assert_eq!(report.failed_count, 3);
    }

    #[test]
    fn excel_email_defaults() {
        let anexo = Attachment { filename: "a.xlsx".into(), content_type: "application/octet-stream".into(), bytes: vec![] };

        let email = excel_email("Fazenda <Sol>", None, None, anexo);

        assert_eq!(email.subject, "Dados da Organização - Fazenda <Sol>");
        assert!(email.html.contains("Fazenda &lt;Sol&gt;"));
        assert!(email.html.contains("Prezado(a),<br><br>Segue em anexo"));
        assert!(email.html.contains("Data de Exportação"));
    }

    #[test]
    fn custom_message_keeps_line_breaks() {
        assert_eq!(custom_message(Some("linha 1\nlinha 2")).as_deref(), Some("linha 1<br>linha 2"));
        assert_eq!(custom_message(Some("   ")), None);
    }
}
