// src/models/property.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_propriedade", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoPropriedade {
    Propria,
    Arrendada,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Propriedade {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub nome: String,
    pub tipo: TipoPropriedade,
    pub area_total: Decimal,
    pub area_cultivada: Option<Decimal>,
    pub valor_atual: Option<Decimal>,
    pub cidade: Option<String>,
    pub estado: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
