// src/db/property_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::property::{Propriedade, TipoPropriedade},
};

#[derive(Clone, Default)]
pub struct PropertyRepository;

pub struct PropriedadeInput<'a> {
    pub nome: &'a str,
    pub tipo: TipoPropriedade,
    pub area_total: Decimal,
    pub area_cultivada: Option<Decimal>,
    pub valor_atual: Option<Decimal>,
    pub cidade: Option<&'a str>,
    pub estado: Option<&'a str>,
}

impl PropertyRepository {
    pub async fn list<'e, E>(&self, executor: E, organizacao_id: Uuid) -> Result<Vec<Propriedade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let props = sqlx::query_as::<_, Propriedade>(
            "SELECT * FROM propriedades WHERE organizacao_id = $1 ORDER BY nome",
        )
        .bind(organizacao_id)
        .fetch_all(executor)
        .await?;
        Ok(props)
    }

    pub async fn find<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Propriedade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prop = sqlx::query_as::<_, Propriedade>(
            "SELECT * FROM propriedades WHERE organizacao_id = $1 AND id = $2",
        )
        .bind(organizacao_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
        Ok(prop)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        input: &PropriedadeInput<'_>,
    ) -> Result<Propriedade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prop = sqlx::query_as::<_, Propriedade>(
            r#"
            INSERT INTO propriedades
                (organizacao_id, nome, tipo, area_total, area_cultivada, valor_atual, cidade, estado)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(organizacao_id)
        .bind(input.nome)
        .bind(input.tipo)
        .bind(input.area_total)
        .bind(input.area_cultivada)
        .bind(input.valor_atual)
        .bind(input.cidade)
        .bind(input.estado)
        .fetch_one(executor)
        .await?;
        Ok(prop)
    }

    pub async fn update<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        id: Uuid,
        input: &PropriedadeInput<'_>,
    ) -> Result<Option<Propriedade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let prop = sqlx::query_as::<_, Propriedade>(
            r#"
            UPDATE propriedades
            SET nome = $3, tipo = $4, area_total = $5, area_cultivada = $6,
                valor_atual = $7, cidade = $8, estado = $9, updated_at = NOW()
            WHERE organizacao_id = $1 AND id = $2
            RETURNING *
            "#,
        )
        .bind(organizacao_id)
        .bind(id)
        .bind(input.nome)
        .bind(input.tipo)
        .bind(input.area_total)
        .bind(input.area_cultivada)
        .bind(input.valor_atual)
        .bind(input.cidade)
        .bind(input.estado)
        .fetch_optional(executor)
        .await?;
        Ok(prop)
    }

    pub async fn delete<'e, E>(&self, executor: E, organizacao_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM propriedades WHERE organizacao_id = $1 AND id = $2")
            .bind(organizacao_id)
            .bind(id)
            .execute(executor)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
