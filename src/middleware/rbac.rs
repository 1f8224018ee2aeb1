// src/middleware/rbac.rs

use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

use crate::{common::error::AppError, models::organization::{FuncaoMembro, Membership}};

/// Define quais funções satisfazem uma exigência.
pub trait RoleDef: Send + Sync + 'static {
    fn allowed() -> &'static [FuncaoMembro];
}

/// Guardião: só deixa passar membros com uma das funções de `R`.
pub struct RequireRole<R>(pub PhantomData<R>);

impl<R, S> FromRequestParts<S> for RequireRole<R>
where
    R: RoleDef,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let membership = parts
            .extensions
            .get::<Membership>()
            .ok_or(AppError::NotAMember)?;

        if !R::allowed().contains(&membership.funcao) {
            return Err(AppError::InsufficientRole);
        }

        Ok(RequireRole(PhantomData))
    }
}

// ---
// DEFINIÇÃO DAS FUNÇÕES (TIPOS)
// ---

/// Proprietários e administradores: escrita em cadastros e envio de relatórios.
pub struct Gestor;
impl RoleDef for Gestor {
    fn allowed() -> &'static [FuncaoMembro] {
        &[FuncaoMembro::Proprietario, FuncaoMembro::Administrador]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;
    use uuid::Uuid;

    async fn check<R: RoleDef>(funcao: Option<FuncaoMembro>) -> Result<(), AppError> {
        let (mut parts, _) = Request::new(()).into_parts();
        if let Some(funcao) = funcao {
            parts.extensions.insert(Membership {
                usuario_id: Uuid::new_v4(),
                organizacao_id: Uuid::new_v4(),
                funcao,
            });
        }
        RequireRole::<R>::from_request_parts(&mut parts, &()).await.map(|_| ())
    }

    #[tokio::test]
    async fn gestor_accepts_owner_and_admin_only() {
        assert!(check::<Gestor>(Some(FuncaoMembro::Proprietario)).await.is_ok());
        assert!(check::<Gestor>(Some(FuncaoMembro::Administrador)).await.is_ok());
        assert!(matches!(
            check::<Gestor>(Some(FuncaoMembro::Membro)).await,
            Err(AppError::InsufficientRole)
        ));
    }

    #[tokio::test]
    async fn missing_membership_is_rejected() {
        assert!(matches!(check::<Gestor>(None).await, Err(AppError::NotAMember)));
    }
}
