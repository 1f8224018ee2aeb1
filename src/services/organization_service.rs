// src/services/organization_service.rs

use chrono::{DateTime, Duration, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{organization_repo::NovaOrganizacao, OrganizationRepository},
    models::{
        auth::User,
        organization::{
            Convite, FuncaoMembro, Membership, MinhaOrganizacao, Organizacao, StatusConvite,
        },
    },
};

// Convites valem uma semana
const CONVITE_TTL_DAYS: i64 = 7;

#[derive(Clone)]
pub struct OrganizationService {
    org_repo: OrganizationRepository,
    pool: PgPool, // Usamos a pool para iniciar transações
}

impl OrganizationService {
    pub fn new(org_repo: OrganizationRepository, pool: PgPool) -> Self {
        Self { org_repo, pool }
    }

    /// Cria a organização e, atomicamente, torna o criador PROPRIETARIO.
    pub async fn create_with_owner(
        &self,
        nova: &NovaOrganizacao<'_>,
        owner_id: Uuid,
    ) -> Result<Organizacao, AppError> {
        // 1. Inicia a transação
        let mut tx = self.pool.begin().await?;

        // 2. Cria a organização
        let org = self.org_repo.create_organization(&mut *tx, nova).await?;

        // 3. Vincula o criador como dono
        self.org_repo
            .add_member(&mut *tx, org.id, owner_id, FuncaoMembro::Proprietario)
            .await?;

        // 4. Commit
        tx.commit().await?;

        tracing::info!("🌱 Organização '{}' criada por {}", org.nome, owner_id);
        Ok(org)
    }

    pub async fn list_for_user(&self, usuario_id: Uuid) -> Result<Vec<MinhaOrganizacao>, AppError> {
        self.org_repo.list_for_user(usuario_id).await
    }

    pub async fn get<'e, E>(&self, executor: E, organizacao_id: Uuid) -> Result<Organizacao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.org_repo
            .find_by_id(executor, organizacao_id)
            .await?
            .ok_or(AppError::OrganizationNotFound)
    }

    // ---
    // Convites
    // ---

    pub async fn invite<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        email: &str,
        funcao: FuncaoMembro,
    ) -> Result<Convite, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        // Ninguém é convidado como dono
        let funcao = match funcao {
            FuncaoMembro::Proprietario => FuncaoMembro::Administrador,
            outra => outra,
        };

        let token = Uuid::new_v4().simple().to_string();
        let expira_em = Utc::now() + Duration::days(CONVITE_TTL_DAYS);

        self.org_repo
            .create_invitation(
                executor,
                organizacao_id,
                &email.trim().to_lowercase(),
                &token,
                funcao,
                expira_em,
            )
            .await
    }

    pub async fn list_invitations<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
    ) -> Result<Vec<Convite>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        self.org_repo.list_invitations(executor, organizacao_id).await
    }

    pub async fn cancel_invitation<'e, E>(
        &self,
        executor: E,
        organizacao_id: Uuid,
        convite_id: Uuid,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = self
            .org_repo
            .set_invitation_status(executor, organizacao_id, convite_id, StatusConvite::Cancelado)
            .await?;

        if !updated {
            return Err(AppError::ResourceNotFound("Convite"));
        }
        Ok(())
    }

    /// Aceita o convite: cria a associação e marca como ACEITO na mesma transação.
    pub async fn accept_invitation(&self, token: &str, user: &User) -> Result<Membership, AppError> {
        let mut tx = self.pool.begin().await?;

        let convite = self
            .org_repo
            .find_invitation_by_token(&mut *tx, token.trim())
            .await?
            .ok_or(AppError::InvitationInvalid)?;

        check_invitation(&convite, &user.email, Utc::now())?;

        let membership = self
            .org_repo
            .add_member(&mut *tx, convite.organizacao_id, user.id, convite.funcao)
            .await?;

        self.org_repo
            .set_invitation_status(&mut *tx, convite.organizacao_id, convite.id, StatusConvite::Aceito)
            .await?;

        tx.commit().await?;

        tracing::info!("🤝 Usuário {} entrou na organização {}", user.id, convite.organizacao_id);
        Ok(membership)
    }
}

fn check_invitation(convite: &Convite, email: &str, agora: DateTime<Utc>) -> Result<(), AppError> {
    if convite.status != StatusConvite::Pendente || convite.expira_em <= agora {
        return Err(AppError::InvitationInvalid);
    }
    if !convite.email.trim().eq_ignore_ascii_case(email.trim()) {
        return Err(AppError::InvitationEmailMismatch);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn convite(status: StatusConvite, expira_em: DateTime<Utc>) -> Convite {
        Convite {
            id: Uuid::new_v4(),
            organizacao_id: Uuid::new_v4(),
            email: "gerente@fazenda.com.br".into(),
            token: "abc".into(),
            funcao: FuncaoMembro::Membro,
            status,
            expira_em,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn pending_invitation_for_the_same_email_is_accepted() {
        let agora = Utc::now();
        let c = convite(StatusConvite::Pendente, agora + Duration::days(1));

        assert!(check_invitation(&c, "Gerente@Fazenda.com.br", agora).is_ok());
    }

    #[test]
    fn expired_or_used_invitations_are_rejected() {
        let agora = Utc::now();

        let vencido = convite(StatusConvite::Pendente, agora - Duration::minutes(1));
        assert!(matches!(
            check_invitation(&vencido, "gerente@fazenda.com.br", agora),
            Err(AppError::InvitationInvalid)
        ));

        let aceito = convite(StatusConvite::Aceito, agora + Duration::days(1));
        assert!(matches!(
            check_invitation(&aceito, "gerente@fazenda.com.br", agora),
            Err(AppError::InvitationInvalid)
        ));
    }

    #[test]
    fn invitation_for_another_email_is_forbidden() {
        let agora = Utc::now();
        let c = convite(StatusConvite::Pendente, agora + Duration::days(1));

        assert!(matches!(
            check_invitation(&c, "outro@fazenda.com.br", agora),
            Err(AppError::InvitationEmailMismatch)
        ));
    }
}
