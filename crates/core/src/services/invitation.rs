//! Invitation service.

use crate::services::mail::MailService;
use hearth_common::{AppError, AppResult, IdGenerator};
use hearth_db::{entities::invitation, repositories::InvitationRepository, tx};
use sea_orm::Set;
use serde::Deserialize;
use validator::Validate;

/// Invitation service for business logic.
#[derive(Clone)]
pub struct InvitationService {
    invitation_repo: InvitationRepository,
    mail: Option<MailService>,
    id_gen: IdGenerator,
}

/// Input for sending an invitation.
#[derive(Debug, Deserialize, Validate)]
pub struct InviteInput {
    #[validate(email)]
    pub email: String,
}

impl InvitationService {
    /// Create a new invitation service.
    #[must_use]
    pub const fn new(invitation_repo: InvitationRepository) -> Self {
        Self {
            invitation_repo,
            mail: None,
            id_gen: IdGenerator::new(),
        }
    }

    /// Create a new invitation service with mail delivery.
    #[must_use]
    pub const fn with_mail(invitation_repo: InvitationRepository, mail: MailService) -> Self {
        Self {
            invitation_repo,
            mail: Some(mail),
            id_gen: IdGenerator::new(),
        }
    }

    /// Invite an email address into the community.
    ///
    /// The invitation row is committed first; the email is spawned, not
    /// awaited, and a delivery failure only logs.
    pub async fn invite(
        &self,
        inviter_id: &str,
        inviter_name: &str,
        input: InviteInput,
    ) -> AppResult<invitation::Model> {
        input.validate()?;

        let email = input.email.to_lowercase();

        let invitation = tx::with_retry(self.invitation_repo.conn(), |txn| {
            let email = email.clone();
            let inviter_id = inviter_id.to_string();
            let id_gen = self.id_gen.clone();
            Box::pin(async move {
                let email = email.as_str();
                let inviter_id = inviter_id.as_str();
                if InvitationRepository::find_active_by_email_in(txn, email)
                    .await?
                    .is_some()
                {
                    return Err(AppError::Conflict(
                        "An invitation for this address is already pending".to_string(),
                    ));
                }

                let model = invitation::ActiveModel {
                    id: Set(id_gen.generate()),
                    inviter_id: Set(inviter_id.to_string()),
                    email: Set(email.to_string()),
                    token: Set(id_gen.generate_token()),
                    ..Default::default()
                };

                InvitationRepository::insert_in(txn, model).await
            })
        })
        .await?;

        if let Some(mail) = self.mail.clone() {
            let to = invitation.email.clone();
            let inviter_name = inviter_name.to_string();
            let token = invitation.token.clone();
            tokio::spawn(async move {
                if let Err(e) = mail.send_invitation(&to, &inviter_name, &token).await {
                    tracing::warn!(error = %e, to = %to, "Failed to send invitation email");
                }
            });
        }

        Ok(invitation)
    }

    /// Mark an invitation as accepted via its token.
    pub async fn accept(&self, token: &str) -> AppResult<invitation::Model> {
        tx::with_retry(self.invitation_repo.conn(), |txn| {
            let token = token.to_string();
            Box::pin(async move {
                let token = token.as_str();
                let invitation = InvitationRepository::find_active_by_token_in(txn, token)
                    .await?
                    .ok_or_else(|| {
                        AppError::NotFound("Invitation not found or already used".to_string())
                    })?;

                let mut active: invitation::ActiveModel = invitation.into();
                active.accepted_at = Set(Some(chrono::Utc::now().into()));
                InvitationRepository::update_in(txn, active).await
            })
        })
        .await
    }

    /// Revoke an invitation the caller sent (soft delete), verified by
    /// re-query.
    pub async fn revoke(&self, inviter_id: &str, invitation_id: &str) -> AppResult<()> {
        tx::with_retry(self.invitation_repo.conn(), |txn| {
            let invitation_id = invitation_id.to_string();
            let inviter_id = inviter_id.to_string();
            Box::pin(async move {
                let invitation_id = invitation_id.as_str();
                let inviter_id = inviter_id.as_str();
                let invitation = InvitationRepository::find_by_id_in(txn, invitation_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Invitation: {invitation_id}")))?;

                if invitation.inviter_id != inviter_id {
                    return Err(AppError::NotAuthor(
                        "You can only revoke your own invitations".to_string(),
                    ));
                }

                let mut active: invitation::ActiveModel = invitation.into();
                active.deleted_at = Set(Some(chrono::Utc::now().into()));
                InvitationRepository::update_in(txn, active).await?;
                Ok(())
            })
        })
        .await?;

        if self.invitation_repo.find_by_id(invitation_id).await?.is_some() {
            return Err(AppError::Database(
                "Invitation is still visible after revocation".to_string(),
            ));
        }

        Ok(())
    }

    /// Active invitations the caller sent, newest first.
    pub async fn list_sent(
        &self,
        inviter_id: &str,
        offset: u64,
        limit: u64,
    ) -> AppResult<Vec<invitation::Model>> {
        self.invitation_repo
            .list_by_inviter(inviter_id, offset, limit)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sea_orm::{DatabaseBackend, MockDatabase};
    use std::sync::Arc;

    fn create_test_invitation(id: &str, inviter_id: &str, email: &str) -> invitation::Model {
        invitation::Model {
            id: id.to_string(),
            inviter_id: inviter_id.to_string(),
            email: email.to_string(),
            token: format!("token-{id}"),
            accepted_at: None,
            created_at: Utc::now().into(),
            deleted_at: None,
        }
    }

    fn service_with(invitation_db: MockDatabase) -> InvitationService {
        InvitationService::new(InvitationRepository::new(Arc::new(
            invitation_db.into_connection(),
        )))
    }

    #[tokio::test]
    async fn test_invite_invalid_email_fails_validation() {
        let service = service_with(MockDatabase::new(DatabaseBackend::Postgres));

        let input = InviteInput {
            email: "not-an-email".to_string(),
        };
        let result = service.invite("u1", "Alice", input).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_invite_duplicate_address_conflicts() {
        let existing = create_test_invitation("i1", "u2", "friend@example.com");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let input = InviteInput {
            email: "friend@example.com".to_string(),
        };
        let result = service.invite("u1", "Alice", input).await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
    }

    #[tokio::test]
    async fn test_revoke_not_owner() {
        let existing = create_test_invitation("i1", "owner", "friend@example.com");

        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres).append_query_results([[existing]]),
        );

        let result = service.revoke("intruder", "i1").await;

        assert!(matches!(result, Err(AppError::NotAuthor(_))));
    }

    #[tokio::test]
    async fn test_accept_unknown_token() {
        let service = service_with(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([Vec::<invitation::Model>::new()]),
        );

        let result = service.accept("bogus").await;

        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
