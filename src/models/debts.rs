// src/models/debts.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Enums (Mapeando o Postgres) ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "moeda", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum Moeda {
    #[default]
    Brl,
    Usd,
}

impl Moeda {
    pub fn label(&self) -> &'static str {
        match self {
            Moeda::Brl => "BRL",
            Moeda::Usd => "USD",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "tipo_divida", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TipoDivida {
    Banco,
    Trading,
    Outros,
}

impl TipoDivida {
    pub fn label(&self) -> &'static str {
        match self {
            TipoDivida::Banco => "Banco",
            TipoDivida::Trading => "Trading",
            TipoDivida::Outros => "Outros",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "modalidade_divida", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ModalidadeDivida {
    Custeio,
    Investimentos,
    Outros,
}

impl ModalidadeDivida {
    pub fn label(&self) -> &'static str {
        match self {
            ModalidadeDivida::Custeio => "Custeio",
            ModalidadeDivida::Investimentos => "Investimentos",
            ModalidadeDivida::Outros => "Outros",
        }
    }
}

// --- Structs ---

// Dívida bancária / trading, com o fluxo de pagamento por safra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DividaBancaria {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub instituicao_bancaria: String,
    pub tipo: TipoDivida,
    pub modalidade: ModalidadeDivida,
    pub ano_contratacao: Option<i32>,
    pub indexador: Option<String>,
    pub taxa_real: Option<Decimal>,
    pub valor_principal: Option<Decimal>,
    pub moeda: Moeda,
    #[schema(value_type = Object)]
    pub fluxo_pagamento_anual: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DividaFornecedor {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub nome: String,
    pub categoria: Option<String>,
    pub moeda: Moeda,
    #[schema(value_type = Object)]
    pub valores_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Aquisição de terras: valor único numa safra ou fluxo anual
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AquisicaoTerra {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub nome_fazenda: String,
    pub hectares: Option<Decimal>,
    pub safra_id: Option<Uuid>,
    pub valor_total: Option<Decimal>,
    pub moeda: Moeda,
    #[schema(value_type = Option<Object>)]
    pub fluxo_pagamento_anual: Option<Value>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Arrendamento {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub propriedade_id: Option<Uuid>,
    pub nome_fazenda: String,
    pub area_arrendada: Option<Decimal>,
    pub tipo_pagamento: Option<String>,
    #[schema(value_type = Object)]
    pub custos_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
