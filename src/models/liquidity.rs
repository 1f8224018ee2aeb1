// src/models/liquidity.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::debts::Moeda;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "categoria_caixa", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CategoriaCaixa {
    CaixaBancos,
    Clientes,
    Adiantamentos,
    EmprestimosTerceiros,
    EstoqueDefensivos,
    EstoqueFertilizantes,
    EstoqueAlmoxarifado,
    EstoqueCommodities,
    Semoventes,
    AtivoBiologico,
}

impl CategoriaCaixa {
    pub fn label(&self) -> &'static str {
        match self {
            CategoriaCaixa::CaixaBancos => "Caixa e Bancos",
            CategoriaCaixa::Clientes => "Clientes",
            CategoriaCaixa::Adiantamentos => "Adiantamentos a Fornecedores",
            CategoriaCaixa::EmprestimosTerceiros => "Empréstimos a Terceiros",
            CategoriaCaixa::EstoqueDefensivos => "Estoque de Defensivos",
            CategoriaCaixa::EstoqueFertilizantes => "Estoque de Fertilizantes",
            CategoriaCaixa::EstoqueAlmoxarifado => "Estoque de Almoxarifado",
            CategoriaCaixa::EstoqueCommodities => "Estoque de Commodities",
            CategoriaCaixa::Semoventes => "Semoventes",
            CategoriaCaixa::AtivoBiologico => "Ativo Biológico",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CaixaDisponibilidade {
    pub id: Uuid,
    #[schema(ignore)]
    pub organizacao_id: Uuid,
    pub nome: String,
    pub categoria: CategoriaCaixa,
    pub moeda: Moeda,
    #[schema(value_type = Object)]
    pub valores_por_safra: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
