// src/models/safra.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Safra: o eixo de tempo de todos os números ("2024/25")
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Safra {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    #[schema(example = "2024/25")]
    pub nome: String,
    pub ano_inicio: i32,
    pub ano_fim: i32,
    pub taxa_cambio_usd: Option<Decimal>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
