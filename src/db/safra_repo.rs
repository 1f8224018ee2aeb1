// src/db/safra_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::safra::Safra,
};

// Sem pool própria: o chamador decide o executor (conexão RLS, transação ou pool)
#[derive(Clone, Default)]
pub struct SafraRepository;

pub struct SafraInput<'a> {
    pub nome: &'a str,
    pub ano_inicio: i32,
    pub ano_fim: i32,
    pub taxa_cambio_usd: Option<Decimal>,
}

impl SafraRepository {
    /// Safras da organização em ordem cronológica.
    pub async fn list<'e, E>(&self, executor: E, organizacao_id: Uuid) -> Result<Vec<Safra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let safras = sqlx::query_as::<_, Safra>(
            "SELECT * FROM safras WHERE organizacao_id = $1 ORDER BY ano_inicio, nome",
        )
        .bind(organizacao_id)
        .fetch_all(executor)
        .await?;
        Ok(safras)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        safra_id: Uuid,
    ) -> Result<Option<Safra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let safra = sqlx::query_as::<_, Safra>(
            "SELECT * FROM safras WHERE organizacao_id = $1 AND id = $2",
        )
        .bind(organizacao_id)
        .bind(safra_id)
        .fetch_optional(executor)
        .await?;
        Ok(safra)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        input: &SafraInput<'_>,
    ) -> Result<Safra, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Safra>(
            r#"
            INSERT INTO safras (organizacao_id, nome, ano_inicio, ano_fim, taxa_cambio_usd)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(organizacao_id)
        .bind(input.nome)
        .bind(input.ano_inicio)
        .bind(input.ano_fim)
        .bind(input.taxa_cambio_usd)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, AppError::SafraNameAlreadyExists(input.nome.to_string())))
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        safra_id: Uuid,
        input: &SafraInput<'_>,
    ) -> Result<Option<Safra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Safra>(
            r#"
            UPDATE safras
            SET nome = $3, ano_inicio = $4, ano_fim = $5, taxa_cambio_usd = $6, updated_at = NOW()
            WHERE organizacao_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(organizacao_id)
        .bind(safra_id)
        .bind(input.nome)
        .bind(input.ano_inicio)
        .bind(input.ano_fim)
        .bind(input.taxa_cambio_usd)
        .fetch_optional(executor)
        .await
        .map_err(|e| map_unique_violation(e, AppError::SafraNameAlreadyExists(input.nome.to_string())))
    }

    pub async fn delete<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        safra_id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM safras WHERE organizacao_id = $1 AND id = $2")
            .bind(organizacao_id)
            .bind(safra_id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
