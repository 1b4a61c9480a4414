use chrono::NaiveDateTime;
use futures_util::future;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, DbErr,
    EntityTrait, QueryFilter, TransactionTrait,
};
use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    models::user::Model as User,
    models::workspace_invitation::{
        self, Entity as WorkspaceInvitationEntity, InvitationStatus, Model as WorkspaceInvitation,
    },
    models::workspace_member::{self, Entity as WorkspaceMemberEntity, WorkspaceRole},
    repos::invitations::InvitationsRepo,
    repos::workspace_members::WorkspaceMembersRepo,
    repos::workspaces::WorkspacesRepo,
    services::access::{AccessControl, AccessError},
    services::notify::{templates, Notifier},
    utils::crypto::generate_uuid,
    utils::response::APIError,
};

#[derive(Debug, Error)]
pub enum InvitationError {
    #[error("Only workspace admins can manage invitations")]
    Unauthorized,

    #[error("{0} is already a member of this workspace")]
    AlreadyMember(String),

    #[error("A pending invitation already exists for {0}")]
    DuplicatePending(String),

    #[error("Invitation not found")]
    NotFound,

    #[error("This invitation has expired")]
    Expired,

    #[error("This invitation has already been used")]
    AlreadyUsed,

    #[error(transparent)]
    Db(#[from] DbErr),
}

impl From<AccessError> for InvitationError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::NotMember | AccessError::Forbidden => InvitationError::Unauthorized,
            AccessError::Db(e) => InvitationError::Db(e),
        }
    }
}

impl From<InvitationError> for APIError {
    fn from(err: InvitationError) -> Self {
        match err {
            InvitationError::Unauthorized => APIError::Forbidden(err.to_string()),
            InvitationError::AlreadyMember(_)
            | InvitationError::DuplicatePending(_)
            | InvitationError::AlreadyUsed => APIError::Conflict(err.to_string()),
            InvitationError::NotFound => APIError::NotFound(err.to_string()),
            InvitationError::Expired => APIError::Gone(err.to_string()),
            InvitationError::Db(e) => {
                error!("Invitation operation failed: {}", e);
                APIError::InternalServerError("Something went wrong".to_string())
            }
        }
    }
}

/// What a token lookup means to the caller.
pub enum InvitationResolution {
    Valid(WorkspaceInvitation),
    Expired,
    AlreadyUsed,
    NotFound,
}

pub fn build_invitation_link(base_url: &str, token: &str) -> String {
    format!("{}/invitations/{}/", base_url.trim_end_matches('/'), token)
}

/// Owns the invitation lifecycle: issue, resolve, accept, revoke, sweep.
/// Acceptance is the only transition racing with itself, so it runs as a
/// compare-and-swap inside a transaction.
pub struct InvitationService {
    db: DatabaseConnection,
    access: AccessControl,
    notifier: Notifier,
    base_url: String,
}

impl InvitationService {
    pub fn new(db: DatabaseConnection, notifier: Notifier, base_url: String) -> Self {
        Self {
            access: AccessControl::new(db.clone()),
            db,
            notifier,
            base_url,
        }
    }

    pub fn invitation_link(&self, token: &str) -> String {
        build_invitation_link(&self.base_url, token)
    }

    /// Issues a fresh invitation and notifies the recipient. The caller
    /// must be an admin of the workspace; duplicates against current
    /// members and still-pending invitations are rejected.
    pub async fn issue(
        &self,
        workspace_id: &str,
        inviter: &User,
        recipient_name: String,
        email: String,
        recipient_phone: Option<String>,
        role: WorkspaceRole,
    ) -> Result<WorkspaceInvitation, InvitationError> {
        self.access.require_admin(workspace_id, &inviter.id).await?;

        let workspace = WorkspacesRepo::new(self.db.clone())
            .get(workspace_id)
            .await?
            .ok_or(InvitationError::NotFound)?;

        let members_repo = WorkspaceMembersRepo::new(self.db.clone());
        if members_repo.is_email_member(workspace_id, &email).await? {
            return Err(InvitationError::AlreadyMember(email));
        }

        let invitations_repo = InvitationsRepo::new(self.db.clone());
        if invitations_repo
            .find_active_pending(workspace_id, &email)
            .await?
            .is_some()
        {
            return Err(InvitationError::DuplicatePending(email));
        }

        let recipient_phone = recipient_phone.filter(|phone| !phone.trim().is_empty());

        let invitation = invitations_repo
            .create(
                workspace_id.to_string(),
                inviter.id.clone(),
                recipient_name,
                email,
                recipient_phone,
                role,
            )
            .await?;

        info!(
            "Invitation {} issued for {} to workspace {}",
            invitation.id, invitation.email, workspace.name
        );

        self.dispatch_invitation(&invitation, &workspace.name, &inviter.username)
            .await;

        Ok(invitation)
    }

    pub async fn resolve(&self, token: &str) -> Result<InvitationResolution, DbErr> {
        let invitation = InvitationsRepo::new(self.db.clone())
            .find_by_token(token)
            .await?;

        Ok(match invitation {
            Some(invitation) => {
                Self::resolution_of(invitation, chrono::Utc::now().naive_utc())
            }
            None => InvitationResolution::NotFound,
        })
    }

    /// Consumes the token and grants membership, atomically. The guarded
    /// update only matches a pending, unexpired row, so two concurrent
    /// accepts cannot both succeed; the loser gets a precise error from
    /// re-resolving the token.
    pub async fn accept(
        &self,
        token: &str,
        actor: &User,
    ) -> Result<WorkspaceInvitation, InvitationError> {
        let now = chrono::Utc::now().naive_utc();
        let txn = self.db.begin().await?;

        let updated = WorkspaceInvitationEntity::update_many()
            .col_expr(
                workspace_invitation::Column::Status,
                Expr::value(InvitationStatus::Accepted),
            )
            .col_expr(
                workspace_invitation::Column::AcceptedBy,
                Expr::value(Some(actor.id.clone())),
            )
            .col_expr(
                workspace_invitation::Column::AcceptedAt,
                Expr::value(Some(now)),
            )
            .filter(workspace_invitation::Column::Token.eq(token))
            .filter(workspace_invitation::Column::Status.eq(InvitationStatus::Pending))
            .filter(workspace_invitation::Column::ExpiresAt.gte(now))
            .exec(&txn)
            .await?;

        if updated.rows_affected == 0 {
            txn.rollback().await?;

            return Err(match self.resolve(token).await? {
                InvitationResolution::Expired => InvitationError::Expired,
                InvitationResolution::NotFound => InvitationError::NotFound,
                // A pending row is consumed exactly once; losing the race
                // means someone else already used the token.
                InvitationResolution::AlreadyUsed | InvitationResolution::Valid(_) => {
                    InvitationError::AlreadyUsed
                }
            });
        }

        let invitation = WorkspaceInvitationEntity::find()
            .filter(workspace_invitation::Column::Token.eq(token))
            .one(&txn)
            .await?
            .ok_or(InvitationError::NotFound)?;

        let existing = WorkspaceMemberEntity::find()
            .filter(workspace_member::Column::WorkspaceId.eq(&invitation.workspace_id))
            .filter(workspace_member::Column::UserId.eq(&actor.id))
            .one(&txn)
            .await?;

        if existing.is_none() {
            workspace_member::ActiveModel {
                id: Set(generate_uuid()),
                workspace_id: Set(invitation.workspace_id.clone()),
                user_id: Set(actor.id.clone()),
                role: Set(invitation.role.clone()),
                joined_at: Set(now),
            }
            .insert(&txn)
            .await?;
        }

        txn.commit().await?;

        if invitation.email != actor.email {
            warn!(
                "Invitation {} was addressed to {} but accepted by {}",
                invitation.id, invitation.email, actor.email
            );
        }
        info!(
            "{} joined workspace {} via invitation {}",
            actor.username, invitation.workspace_id, invitation.id
        );

        Ok(invitation)
    }

    /// Withdraws a pending invitation. The row is kept with a terminal
    /// status so the audit trail survives; its token stops resolving.
    pub async fn revoke(
        &self,
        workspace_id: &str,
        invitation_id: &str,
        actor: &User,
    ) -> Result<WorkspaceInvitation, InvitationError> {
        self.access.require_admin(workspace_id, &actor.id).await?;

        let invitations_repo = InvitationsRepo::new(self.db.clone());
        let invitation = invitations_repo
            .find_by_id(invitation_id)
            .await?
            .ok_or(InvitationError::NotFound)?;

        if invitation.workspace_id != workspace_id {
            return Err(InvitationError::NotFound);
        }

        match Self::resolution_of(invitation, chrono::Utc::now().naive_utc()) {
            InvitationResolution::Valid(invitation) => {
                let revoked = invitations_repo.revoke(invitation).await?;
                info!(
                    "Invitation {} for {} revoked by {}",
                    revoked.id, revoked.email, actor.username
                );
                Ok(revoked)
            }
            InvitationResolution::Expired => Err(InvitationError::Expired),
            InvitationResolution::AlreadyUsed => Err(InvitationError::AlreadyUsed),
            InvitationResolution::NotFound => Err(InvitationError::NotFound),
        }
    }

    /// Marks every lapsed pending invitation of the workspace as expired.
    pub async fn sweep_expired(
        &self,
        workspace_id: &str,
        actor: &User,
    ) -> Result<u64, InvitationError> {
        self.access.require_admin(workspace_id, &actor.id).await?;

        let swept = InvitationsRepo::new(self.db.clone())
            .sweep_expired(workspace_id)
            .await?;

        if swept > 0 {
            info!(
                "Swept {} expired invitation(s) in workspace {}",
                swept, workspace_id
            );
        }

        Ok(swept)
    }

    fn resolution_of(invitation: WorkspaceInvitation, now: NaiveDateTime) -> InvitationResolution {
        match invitation.status {
            InvitationStatus::Accepted => InvitationResolution::AlreadyUsed,
            InvitationStatus::Revoked => InvitationResolution::NotFound,
            InvitationStatus::Expired => InvitationResolution::Expired,
            InvitationStatus::Pending if invitation.has_expired(now) => {
                InvitationResolution::Expired
            }
            InvitationStatus::Pending => InvitationResolution::Valid(invitation),
        }
    }

    async fn dispatch_invitation(
        &self,
        invitation: &WorkspaceInvitation,
        workspace_name: &str,
        inviter_name: &str,
    ) {
        let link = self.invitation_link(&invitation.token);

        let email_content = templates::invitation_email(
            &invitation.recipient_name,
            &invitation.email,
            inviter_name,
            workspace_name,
            &invitation.role,
            &link,
            &invitation.expires_at,
        );
        let email_send = self.notifier.send_email(
            &invitation.email,
            &email_content.subject,
            &email_content.body,
        );

        let sms_send = async {
            if let Some(phone) = &invitation.recipient_phone {
                let sms = templates::invitation_sms(
                    &invitation.recipient_name,
                    inviter_name,
                    workspace_name,
                    &invitation.role,
                    &link,
                    &invitation.expires_at,
                );
                self.notifier.send_sms(phone, &sms).await;
            }
        };

        future::join(email_send, sms_send).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn invitation_with(status: InvitationStatus, expires_at: NaiveDateTime) -> WorkspaceInvitation {
        WorkspaceInvitation {
            id: "inv-1".to_string(),
            workspace_id: "ws-1".to_string(),
            recipient_name: "Ama".to_string(),
            email: "ama@example.com".to_string(),
            recipient_phone: None,
            role: WorkspaceRole::Member,
            token: "tok-1".to_string(),
            status,
            created_by: "user-1".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
            expires_at,
            accepted_by: None,
            accepted_at: None,
            revoked_at: None,
        }
    }

    #[test]
    fn test_pending_unexpired_resolves_valid() {
        let now = chrono::Utc::now().naive_utc();
        let invitation = invitation_with(InvitationStatus::Pending, now + Duration::days(3));

        assert!(matches!(
            InvitationService::resolution_of(invitation, now),
            InvitationResolution::Valid(_)
        ));
    }

    #[test]
    fn test_pending_lapsed_resolves_expired() {
        let now = chrono::Utc::now().naive_utc();
        let invitation = invitation_with(InvitationStatus::Pending, now - Duration::minutes(1));

        assert!(matches!(
            InvitationService::resolution_of(invitation, now),
            InvitationResolution::Expired
        ));
    }

    #[test]
    fn test_accepted_resolves_already_used() {
        let now = chrono::Utc::now().naive_utc();
        let invitation = invitation_with(InvitationStatus::Accepted, now + Duration::days(3));

        assert!(matches!(
            InvitationService::resolution_of(invitation, now),
            InvitationResolution::AlreadyUsed
        ));
    }

    #[test]
    fn test_revoked_resolves_not_found() {
        let now = chrono::Utc::now().naive_utc();
        let invitation = invitation_with(InvitationStatus::Revoked, now + Duration::days(3));

        assert!(matches!(
            InvitationService::resolution_of(invitation, now),
            InvitationResolution::NotFound
        ));
    }

    #[test]
    fn test_swept_status_resolves_expired() {
        let now = chrono::Utc::now().naive_utc();
        let invitation = invitation_with(InvitationStatus::Expired, now + Duration::days(3));

        assert!(matches!(
            InvitationService::resolution_of(invitation, now),
            InvitationResolution::Expired
        ));
    }

    #[test]
    fn test_invitation_link_format() {
        assert_eq!(
            build_invitation_link("http://localhost:8000", "tok123"),
            "http://localhost:8000/invitations/tok123/"
        );
        assert_eq!(
            build_invitation_link("https://flowboard.app/", "tok123"),
            "https://flowboard.app/invitations/tok123/"
        );
    }
}
