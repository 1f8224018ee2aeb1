// src/db/debt_repo.rs
//
// As quatro tabelas de endividamento: bancos/tradings, fornecedores,
// aquisição de terras e arrendamentos.

use rust_decimal::Decimal;
use serde_json::Value;
use sqlx::{Executor, Postgres};
use uuid::Uuid;

use crate::{
    common::{
        db_utils::{delete_by_id, find_by_id, list_by_org},
        error::AppError,
    },
    models::debts::{
        AquisicaoTerra, Arrendamento, DividaBancaria, DividaFornecedor, ModalidadeDivida, Moeda,
        TipoDivida,
    },
};

pub const DIVIDAS_BANCARIAS: &str = "dividas_bancarias";
pub const DIVIDAS_FORNECEDORES: &str = "dividas_fornecedores";
pub const AQUISICAO_TERRAS: &str = "aquisicao_terras";
pub const ARRENDAMENTOS: &str = "arrendamentos";

#[derive(Clone, Default)]
pub struct DebtRepository;

pub struct DividaBancariaInput<'a> {
    pub instituicao_bancaria: &'a str,
    pub tipo: TipoDivida,
    pub modalidade: ModalidadeDivida,
    pub ano_contratacao: Option<i32>,
    pub indexador: Option<&'a str>,
    pub taxa_real: Option<Decimal>,
    pub valor_principal: Option<Decimal>,
    pub moeda: Moeda,
    pub fluxo_pagamento_anual: &'a Value,
}

pub struct DividaFornecedorInput<'a> {
    pub nome: &'a str,
    pub categoria: Option<&'a str>,
    pub moeda: Moeda,
    pub valores_por_safra: &'a Value,
}

pub struct AquisicaoTerraInput<'a> {
    pub nome_fazenda: &'a str,
    pub hectares: Option<Decimal>,
    pub safra_id: Option<Uuid>,
    pub valor_total: Option<Decimal>,
    pub moeda: Moeda,
    pub fluxo_pagamento_anual: Option<&'a Value>,
}

pub struct ArrendamentoInput<'a> {
    pub propriedade_id: Option<Uuid>,
    pub nome_fazenda: &'a str,
    pub area_arrendada: Option<Decimal>,
    pub tipo_pagamento: Option<&'a str>,
    pub custos_por_safra: &'a Value,
}

impl DebtRepository {
    // =========================================================================
    //  BANCOS / TRADINGS
    // =========================================================================

    pub async fn list_bancarias<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<DividaBancaria>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, DIVIDAS_BANCARIAS, "instituicao_bancaria, created_at", org_id).await
    }

    pub async fn find_bancaria<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<DividaBancaria>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, DIVIDAS_BANCARIAS, org_id, id).await
    }

    pub async fn save_bancaria<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &DividaBancariaInput<'_>,
    ) -> Result<Option<DividaBancaria>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Sem id: INSERT. Com id: UPDATE (None se não existir)
        let sql = match id {
            None => r#"
                INSERT INTO dividas_bancarias
                    (id, organizacao_id, instituicao_bancaria, tipo, modalidade, ano_contratacao,
                     indexador, taxa_real, valor_principal, moeda, fluxo_pagamento_anual)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6, $7, $8, $9, $10, $11)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE dividas_bancarias
                SET instituicao_bancaria = $3, tipo = $4, modalidade = $5, ano_contratacao = $6,
                    indexador = $7, taxa_real = $8, valor_principal = $9, moeda = $10,
                    fluxo_pagamento_anual = $11, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, DividaBancaria>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.instituicao_bancaria)
            .bind(input.tipo)
            .bind(input.modalidade)
            .bind(input.ano_contratacao)
            .bind(input.indexador)
            .bind(input.taxa_real)
            .bind(input.valor_principal)
            .bind(input.moeda)
            .bind(input.fluxo_pagamento_anual)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_bancaria<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, DIVIDAS_BANCARIAS, org_id, id).await
    }

    // =========================================================================
    //  FORNECEDORES
    // =========================================================================

    pub async fn list_fornecedores<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<DividaFornecedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, DIVIDAS_FORNECEDORES, "nome, created_at", org_id).await
    }

    pub async fn find_fornecedor<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<DividaFornecedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, DIVIDAS_FORNECEDORES, org_id, id).await
    }

    pub async fn save_fornecedor<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &DividaFornecedorInput<'_>,
    ) -> Result<Option<DividaFornecedor>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO dividas_fornecedores (id, organizacao_id, nome, categoria, moeda, valores_por_safra)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE dividas_fornecedores
                SET nome = $3, categoria = $4, moeda = $5, valores_por_safra = $6, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, DividaFornecedor>(sql)
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

    pub async fn delete_fornecedor<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, DIVIDAS_FORNECEDORES, org_id, id).await
    }

    // =========================================================================
    //  AQUISIÇÃO DE TERRAS
    // =========================================================================

    pub async fn list_terras<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<AquisicaoTerra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, AQUISICAO_TERRAS, "nome_fazenda, created_at", org_id).await
    }

    pub async fn find_terra<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<AquisicaoTerra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, AQUISICAO_TERRAS, org_id, id).await
    }

    pub async fn save_terra<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &AquisicaoTerraInput<'_>,
    ) -> Result<Option<AquisicaoTerra>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO aquisicao_terras
                    (id, organizacao_id, nome_fazenda, hectares, safra_id, valor_total, moeda, fluxo_pagamento_anual)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6, $7, $8)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE aquisicao_terras
                SET nome_fazenda = $3, hectares = $4, safra_id = $5, valor_total = $6, moeda = $7,
                    fluxo_pagamento_anual = $8, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, AquisicaoTerra>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.nome_fazenda)
            .bind(input.hectares)
            .bind(input.safra_id)
            .bind(input.valor_total)
            .bind(input.moeda)
            .bind(input.fluxo_pagamento_anual)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_terra<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, AQUISICAO_TERRAS, org_id, id).await
    }

    // =========================================================================
    //  ARRENDAMENTOS
    // =========================================================================

    pub async fn list_arrendamentos<'e, E>(&self, executor: E, org_id: Uuid) -> Result<Vec<Arrendamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        list_by_org(executor, ARRENDAMENTOS, "nome_fazenda, created_at", org_id).await
    }

    pub async fn find_arrendamento<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<Option<Arrendamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        find_by_id(executor, ARRENDAMENTOS, org_id, id).await
    }

    pub async fn save_arrendamento<'e, E>(
        &self,
        executor: E,
        org_id: Uuid,
        id: Option<Uuid>,
        input: &ArrendamentoInput<'_>,
    ) -> Result<Option<Arrendamento>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let sql = match id {
            None => r#"
                INSERT INTO arrendamentos
                    (id, organizacao_id, propriedade_id, nome_fazenda, area_arrendada, tipo_pagamento, custos_por_safra)
                VALUES (COALESCE($2, gen_random_uuid()), $1, $3, $4, $5, $6, $7)
                RETURNING *
            "#,
            Some(_) => r#"
                UPDATE arrendamentos
                SET propriedade_id = $3, nome_fazenda = $4, area_arrendada = $5, tipo_pagamento = $6,
                    custos_por_safra = $7, updated_at = NOW()
                WHERE organizacao_id = $1 AND id = $2
                RETURNING *
            "#,
        };

        let row = sqlx::query_as::<_, Arrendamento>(sql)
            .bind(org_id)
            .bind(id)
            .bind(input.propriedade_id)
            .bind(input.nome_fazenda)
            .bind(input.area_arrendada)
            .bind(input.tipo_pagamento)
            .bind(input.custos_por_safra)
            .fetch_optional(executor)
            .await?;
        Ok(row)
    }

    pub async fn delete_arrendamento<'e, E>(&self, executor: E, org_id: Uuid, id: Uuid) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        delete_by_id(executor, ARRENDAMENTOS, org_id, id).await
    }
}
