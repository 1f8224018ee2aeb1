// src/models/organization.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "funcao_membro", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FuncaoMembro {
    Proprietario,
    Administrador,
    Membro,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "status_convite", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StatusConvite {
    Pendente,
    Aceito,
    Cancelado,
    Expirado,
}

// ---
// Organização (o tenant)
// ---
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Organizacao {
    pub id: Uuid,
    pub nome: String,
    pub cpf_cnpj: Option<String>,
    pub email: Option<String>,
    pub telefone: Option<String>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub logo: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Organização vista pelo usuário, com a função dele
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MinhaOrganizacao {
    pub id: Uuid,
    pub nome: String,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub funcao: FuncaoMembro,
}

// Linha de `associacoes`
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub usuario_id: Uuid,
    pub organizacao_id: Uuid,
    pub funcao: FuncaoMembro,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Convite {
    pub id: Uuid,
    pub organizacao_id: Uuid,
    pub email: String,
    pub token: String,
    pub funcao: FuncaoMembro,
    pub status: StatusConvite,
    pub expira_em: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}
