// src/db/organization_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{db_utils::map_unique_violation, error::AppError},
    models::organization::{
        Convite, FuncaoMembro, Membership, MinhaOrganizacao, Organizacao, StatusConvite,
    },
};

#[derive(Clone)]
pub struct OrganizationRepository {
    pool: PgPool,
}

// Campos de criação de organização
pub struct NovaOrganizacao<'a> {
    pub nome: &'a str,
    pub cpf_cnpj: Option<&'a str>,
    pub email: Option<&'a str>,
    pub telefone: Option<&'a str>,
    pub cidade: Option<&'a str>,
    pub estado: Option<&'a str>,
}

impl OrganizationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Verifica o vínculo do usuário com a organização.
    /// Esta é a verificação de autorização mais importante.
    pub async fn find_membership(
        &self,
        user_id: Uuid,
        organizacao_id: Uuid,
    ) -> Result<Option<Membership>, AppError> {
        let membership = sqlx::query_as::<_, Membership>(
            r#"
            SELECT usuario_id, organizacao_id, funcao
            FROM associacoes
            WHERE usuario_id = $1 AND organizacao_id = $2
            "#,
        )
        .bind(user_id)
        .bind(organizacao_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(membership)
    }

    pub async fn create_organization<'e, E>(
        &self,
        executor: E,
        nova: &NovaOrganizacao<'_>,
    ) -> Result<Organizacao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org = sqlx::query_as::<_, Organizacao>(
            r#"
            INSERT INTO organizacoes (nome, cpf_cnpj, email, telefone, cidade, estado)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(nova.nome)
        .bind(nova.cpf_cnpj)
        .bind(nova.email)
        .bind(nova.telefone)
        .bind(nova.cidade)
        .bind(nova.estado)
        .fetch_one(executor)
        .await?;
        Ok(org)
    }

    pub async fn add_member<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        usuario_id: Uuid,
        funcao: FuncaoMembro,
    ) -> Result<Membership, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO associacoes (organizacao_id, usuario_id, funcao)
            VALUES ($1, $2, $3)
            RETURNING usuario_id, organizacao_id, funcao
            "#,
        )
        .bind(organizacao_id)
        .bind(usuario_id)
        .bind(funcao)
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, AppError::AlreadyMember))
    }

    pub async fn list_for_user(&self, usuario_id: Uuid) -> Result<Vec<MinhaOrganizacao>, AppError> {
        let orgs = sqlx::query_as::<_, MinhaOrganizacao>(
            r#"
            SELECT o.id, o.nome, o.cidade, o.estado, a.funcao
            FROM organizacoes o
            JOIN associacoes a ON a.organizacao_id = o.id
            WHERE a.usuario_id = $1
            ORDER BY o.nome
            "#,
        )
        .bind(usuario_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(orgs)
    }

    pub async fn find_by_id<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
    ) -> Result<Option<Organizacao>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let org = sqlx::query_as::<_, Organizacao>("SELECT * FROM organizacoes WHERE id = $1")
            .bind(organizacao_id)
            .fetch_optional(executor)
            .await?;
        Ok(org)
    }

    // ---
    // Convites
    // ---

    pub async fn create_invitation<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        email: &str,
        token: &str,
        funcao: FuncaoMembro,
        expira_em: DateTime<Utc>,
    ) -> Result<Convite, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let convite = sqlx::query_as::<_, Convite>(
            r#"
            INSERT INTO convites (organizacao_id, email, token, funcao, status, expira_em)
            VALUES ($1, $2, $3, $4, 'PENDENTE', $5)
            RETURNING *
            "#,
        )
        .bind(organizacao_id)
        .bind(email)
        .bind(token)
        .bind(funcao)
        .bind(expira_em)
        .fetch_one(executor)
        .await?;
        Ok(convite)
    }

    pub async fn list_invitations<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
    ) -> Result<Vec<Convite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let convites = sqlx::query_as::<_, Convite>(
            "SELECT * FROM convites WHERE organizacao_id = $1 ORDER BY created_at DESC",
        )
        .bind(organizacao_id)
        .fetch_all(executor)
        .await?;
        Ok(convites)
    }

    pub async fn find_invitation_by_token<'e, E>(
        &self,
        executor: E,
        token: &str,
    ) -> Result<Option<Convite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let convite = sqlx::query_as::<_, Convite>("SELECT * FROM convites WHERE token = $1 FOR UPDATE")
            .bind(token)
            .fetch_optional(executor)
            .await?;
        Ok(convite)
    }

    pub async fn set_invitation_status<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        convite_id: Uuid,
        status: StatusConvite,
    ) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query(
            "UPDATE convites SET status = $3 WHERE id = $2 AND organizacao_id = $1",
        )
        .bind(organizacao_id)
        .bind(convite_id)
        .bind(status)
        .execute(executor)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}
