// src/db/liquidity_repo.rs

use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{delete_by_id, find_by_id, list_by_org},
        error::AppError,
    },
    models::{
        debts::Moeda,
        liquidity::{CaixaDisponibilidade, CategoriaCaixa},
    },
};

const CAIXA_DISPONIBILIDADES: &str = "caixa_disponibilidades";

#[derive(Clone, Default)]
pub struct LiquidityRepository;

pub struct CaixaInput<'a> {
    pub nome: &'a str,
    pub categoria: CategoriaCaixa,
    pub moeda: Moeda,
    pub valores_por_safra: &'a Value,
}

impl LiquidityRepository {
    pub async fn list<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<CaixaDisponibilidade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, CAIXA_DISPONIBILIDADES, "categoria, nome", org_id).await
    }

    pub async fn find<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<CaixaDisponibilidade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, CAIXA_DISPONIBILIDADES, org_id, id).await
    }

    pub async fn save<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &CaixaInput<'_>,
    ) -> Result<Option<CaixaDisponibilidade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO caixa_disponibilidades (id, organizacao_id, nome, categoria, moeda, valores_por_safra)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE caixa_disponibilidades
                SET nome = $3, categoria = $4, moeda = $5, valores_por_safra = $6, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, CaixaDisponibilidade>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.nome)
            .bind(input.categoria)
            .bind(input.moeda)
            .bind(input.valores_por_safra)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, CAIXA_DISPONIBILIDADES, org_id, id).await
    }
}
