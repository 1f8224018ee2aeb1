// src/db/price_repo.rs

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{delete_by_id, find_by_id, list_by_org, map_unique_violation},
        error::AppError,
    },
    models::prices::{CotacaoCambio, PrecoCommodity, TipoCotacao},
};

const PRECOS: &str = "commodity_price_projections";
const COTACOES: &str = "cotacoes_cambio";

#[derive(Clone, Default)]
pub struct PriceRepository;

pub struct PrecoInput<'a> {
    pub commodity_type: &'a str,
    pub cultura_id: Option<Uuid>,
    pub sistema_id: Option<Uuid>,
    pub unit: &'a str,
    pub current_price: Decimal,
    pub precos_por_safra: &'a Value,
}

pub struct CotacaoInput<'a> {
    pub tipo_moeda: TipoCotacao,
    pub unit: &'a str,
    pub cotacao_atual: Decimal,
    pub cotacoes_por_safra: &'a Value,
}

impl PriceRepository {
    // ---
    // Preços de commodities
    // ---

    pub async fn list_precos<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<PrecoCommodity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, PRECOS, "commodity_type", org_id).await
    }

    pub async fn find_preco<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<PrecoCommodity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, PRECOS, org_id, id).await
    }

    pub async fn save_preco<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &PrecoInput<'_>,
    ) -> Result<Option<PrecoCommodity>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO commodity_price_projections
                    (id, organizacao_id, commodity_type, cultura_id, sistema_id, unit, current_price, precos_por_safra)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6, $7, $8)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE commodity_price_projections
                SET commodity_type = $3, cultura_id = $4, sistema_id = $5, unit = $6,
                    current_price = $7, precos_por_safra = $8, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, PrecoCommodity>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.commodity_type)
            .bind(input.cultura_id)
            .bind(input.sistema_id)
            .bind(input.unit)
            .bind(input.current_price)
            .bind(input.precos_por_safra)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_preco<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, PRECOS, org_id, id).await
    }

    // ---
    // Cotações de câmbio (uma por tipo)
    // ---

    pub async fn list_cotacoes<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<CotacaoCambio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, COTACOES, "tipo_moeda", org_id).await
    }

    pub async fn find_cotacao<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<CotacaoCambio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, COTACOES, org_id, id).await
    }

    pub async fn save_cotacao<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &CotacaoInput<'_>,
    ) -> Result<Option<CotacaoCambio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO cotacoes_cambio
                    (id, organizacao_id, tipo_moeda, unit, cotacao_atual, cotacoes_por_safra)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE cotacoes_cambio
                SET tipo_moeda = $3, unit = $4, cotacao_atual = $5, cotacoes_por_safra = $6, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        sqlx::query_as::<_, CotacaoCambio>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.tipo_moeda)
            .bind(input.unit)
            .bind(input.cotacao_atual)
            .bind(input.cotacoes_por_safra)
            .fetch_optional(executor)
            .await
            .map_err(|e| map_unique_violation(e, AppError::AlreadyExists("Cotação deste tipo")))
    }

    pub async fn delete_cotacao<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, COTACOES, org_id, id).await
    }
}
