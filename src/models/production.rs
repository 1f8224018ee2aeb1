// src/models/production.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Culturas, sistemas e ciclos são apenas listas de nomes por organização
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ItemCadastro {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    #[schema(example = "SOJA")]
    pub nome: String,
    pub created_at: DateTime<Utc>,
}

/// Tabelas de cadastro simples da produção.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabelaCadastro {
    Culturas,
    Sistemas,
    Ciclos,
}

impl TabelaCadastro {
    pub fn table(&self) -> &'static str {
        match self {
            TabelaCadastro::Culturas => "culturas",
            TabelaCadastro::Sistemas => "sistemas",
            TabelaCadastro::Ciclos => "ciclos",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TabelaCadastro::Culturas => "Cultura",
            TabelaCadastro::Sistemas => "Sistema",
            TabelaCadastro::Ciclos => "Ciclo",
        }
    }
}

// Área plantada (ha) por safra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AreaPlantio {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub propriedade_id: Uuid,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    pub ciclo_id: Uuid,
    #[schema(value_type = Object)]
    pub areas_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Produtividade (sc/ha) por safra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Produtividade {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    #[schema(value_type = Object)]
    pub produtividades_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

// Custo de produção (R$/ha) por safra
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CustoProducao {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    #[schema(example = "FERTILIZANTES")]
    pub categoria: String,
    #[schema(value_type = Object)]
    pub custos_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
