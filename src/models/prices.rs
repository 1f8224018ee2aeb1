// src/models/prices.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_cotacao", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoCotacao {
    DolarAlgodao,
    DolarSoja,
    DolarFechamento,
}

// Projeção de preço de commodity por safra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PrecoCommodity {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    #[schema(example = "SOJA_SEQUEIRO")]
    pub commodity_type: String,
    pub cultura_id: Option<Uuid>,
    pub sistema_id: Option<Uuid>,
    #[schema(example = "R$/sc")]
    pub unit: String,
    pub current_price: Decimal,
    #[schema(value_type = Object)]
    pub precos_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CotacaoCambio {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub tipo_moeda: TipoCotacao,
    pub unit: String,
    pub cotacao_atual: Decimal,
    #[schema(value_type = Object)]
    pub cotacoes_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
