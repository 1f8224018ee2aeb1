use sqlx::{postgres::PgRow, Executor, FromRow, Postgres};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::config::AppState;
use crate::middleware::auth::AuthenticatedUser;
use crate::middleware::tenancy::OrganizationContext;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Adquire uma conexão da pool e define as variáveis RLS da sessão.
/// Toda aquisição sobrescreve os valores deixados pelo uso anterior da conexão.
pub(crate) async fn get_rls_connection(
    app_state: &AppState,
    org_ctx: &OrganizationContext,
    user: &AuthenticatedUser,
) -> Result<sqlx::pool::PoolConnection<sqlx::Postgres>, AppError> {

    // 1. Adquire conexão
    // O operador '?' converte automaticamente sqlx::Error -> AppError::DatabaseError
    let mut conn = app_state.db_pool.acquire().await?;

    // 2. Define a organização
    sqlx::query("SELECT set_config('app.organizacao_id', $1, false)")
        .bind(org_ctx.0.to_string())
        .execute(&mut *conn)
        .await?;

    // 3. Define o usuário
    sqlx::query("SELECT set_config('app.user_id', $1, false)")
        .bind(user.0.id.to_string())
        .execute(&mut *conn)
        .await?;

    Ok(conn)
}

/// Mapeia violação de unicidade para um erro de domínio, repassando os demais.
pub(crate) fn map_unique_violation(err: sqlx::Error, on_conflict: AppError) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.is_unique_violation() {
            return on_conflict;
        }
    }
    err.into()
}

// ---
// Consultas genéricas por organização (nomes de tabela são sempre constantes)
// ---

pub(crate) async fn list_by_org<'e, E, T>(
    executor: E,
    table: &'static str,
    order_by: &'static str,
    organizacao_id: Uuid,
) -> Result<Vec<T>, AppError>
where
    E: Executor<'e, Database = Postgres>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {table} WHERE organizacao_id = $1 ORDER BY {order_by}");
    let rows = sqlx::query_as::<_, T>(&sql)
        .bind(organizacao_id)
        .fetch_all(executor)
        .await?;
    Ok(rows)
}

pub(crate) async fn find_by_id<'e, E, T>(
    executor: E,
    table: &'static str,
    organizacao_id: Uuid,
    id: Uuid,
) -> Result<Option<T>, AppError>
where
    E: Executor<'e, Database = Postgres>,
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let sql = format!("SELECT * FROM {table} WHERE organizacao_id = $1 AND id = $2");
    let row = sqlx::query_as::<_, T>(&sql)
        .bind(organizacao_id)
        .bind(id)
        .fetch_optional(executor)
        .await?;
    Ok(row)
}

pub(crate) async fn delete_by_id<'e, E>(
    executor: E,
    table: &'static str,
    organizacao_id: Uuid,
    id: Uuid,
) -> Result<bool, AppError>
where
    E: Executor<'e, Database = Postgres>,
{
    let sql = format!("DELETE FROM {table} WHERE organizacao_id = $1 AND id = $2");
    let result = sqlx::query(&sql)
        .bind(organizacao_id)
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}
