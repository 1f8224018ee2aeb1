// src/db/production_repo.rs

use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{delete_by_id, list_by_org},
        error::AppError,
    },
    models::production::{AreaPlantio, CustoProducao, ItemCadastro, Produtividade, TabelaCadastro},
};

const AREAS: &str = "areas_plantio";
const PRODUTIVIDADES: &str = "produtividades";
const CUSTOS: &str = "custos_producao";

#[derive(Clone, Default)]
pub struct ProductionRepository;

pub struct AreaInput<'a> {
    pub propriedade_id: Uuid,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    pub ciclo_id: Uuid,
    pub areas_por_safra: &'a Value,
}

pub struct ProdutividadeInput<'a> {
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    pub produtividades_por_safra: &'a Value,
}

pub struct CustoInput<'a> {
    pub propriedade_id: Option<Uuid>,
    pub cultura_id: Uuid,
    pub sistema_id: Uuid,
    pub categoria: &'a str,
    pub custos_por_safra: &'a Value,
}

impl ProductionRepository {
    // ---
    // Culturas / Sistemas / Ciclos
    // ---

    pub async fn list_cadastro<'e, E>(
        &self,
        executor: E,
        tabela: TabelaCadastro,
        org_id: Uuid,
    ) -> Result<Vec<ItemCadastro>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, tabela.table(), "nome", org_id).await
    }

    pub async fn create_cadastro<'e, E>(
        &self,
        executor: E,
        tabela: TabelaCadastro,
        org_id: Uuid,
        nome: &str,
    ) -> Result<ItemCadastro, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = format!(
            "INSERT INTO {} (organizacao_id, nome) VALUES ($1, $2) RETURNING *",
            tabela.table()
        );
        let item = sqlx::query_as::<_, ItemCadastro>(&sql)
            .bind(org_id)
            .bind(nome.trim().to_uppercase())
            .fetch_one(executor)
            .await?;
        Ok(item)
    }

    pub async fn delete_cadastro<'e, E>(
        &self,
        executor: E,
        tabela: TabelaCadastro,
        org_id: Uuid,
        id: Uuid,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, tabela.table(), org_id, id).await
    }

    // ---
    // Áreas de plantio
    // ---

    pub async fn list_areas<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<AreaPlantio>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, AREAS, "created_at", org_id).await
    }

    pub async fn create_area<'e, E>(&self, executor: E, org_id: Uuid, input: &AreaInput<'_>) -> Result<AreaPlantio, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, AreaPlantio>(
            r#"
            INSERT INTO areas_plantio
                (organizacao_id, propriedade_id, cultura_id, sistema_id, ciclo_id, areas_por_safra)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(input.propriedade_id)
        .bind(input.cultura_id)
        .bind(input.sistema_id)
        .bind(input.ciclo_id)
        .bind(input.areas_por_safra)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_area<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, AREAS, org_id, id).await
    }

    // ---
    // Produtividades
    // ---

    pub async fn list_produtividades<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<Produtividade>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, PRODUTIVIDADES, "created_at", org_id).await
    }

    pub async fn create_produtividade<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        input: &ProdutividadeInput<'_>,
    ) -> Result<Produtividade, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, Produtividade>(
            r#"
            INSERT INTO produtividades
                (organizacao_id, propriedade_id, cultura_id, sistema_id, produtividades_por_safra)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(input.propriedade_id)
        .bind(input.cultura_id)
        .bind(input.sistema_id)
        .bind(input.produtividades_por_safra)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_produtividade<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, PRODUTIVIDADES, org_id, id).await
    }

    // ---
    // Custos de produção
    // ---

    pub async fn list_custos<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<CustoProducao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, CUSTOS, "categoria, created_at", org_id).await
    }

    pub async fn create_custo<'e, E>(&self, executor: E, org_id: Uuid, input: &CustoInput<'_>) -> Result<CustoProducao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, CustoProducao>(
            r#"
            INSERT INTO custos_producao
                (organizacao_id, propriedade_id, cultura_id, sistema_id, categoria, custos_por_safra)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(org_id)
        .bind(input.propriedade_id)
        .bind(input.cultura_id)
        .bind(input.sistema_id)
        .bind(input.categoria)
        .bind(input.custos_por_safra)
        .fetch_one(executor)
        .await?;
        Ok(row)
    }

    pub async fn delete_custo<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, CUSTOS, org_id, id).await
    }
}
