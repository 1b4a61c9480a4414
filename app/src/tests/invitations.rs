use chrono::Duration;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, DatabaseConnection};

use crate::{
    models::workspace_invitation::{self, InvitationStatus, Model as WorkspaceInvitation},
    models::workspace_member::WorkspaceRole,
    repos::{invitations::InvitationsRepo, workspace_members::WorkspaceMembersRepo},
    services::invitations::{InvitationError, InvitationResolution, InvitationService},
    services::notify::Notifier,
    tests::common::{
        create_user, create_workspace, email_only_notifier, test_db, test_notifier,
        RecordingEmailSender,
    },
};

const BASE_URL: &str = "http://localhost:8000";

fn service(db: &DatabaseConnection, notifier: Notifier) -> InvitationService {
    InvitationService::new(db.clone(), notifier, BASE_URL.to_string())
}

async fn backdate_expiry(
    db: &DatabaseConnection,
    invitation: WorkspaceInvitation,
) -> WorkspaceInvitation {
    let mut active: workspace_invitation::ActiveModel = invitation.into();
    active.expires_at = Set(chrono::Utc::now().naive_utc() - Duration::days(1));

    active.update(db).await.expect("backdate invitation")
}

#[tokio::test]
async fn test_issue_creates_pending_invitation_and_notifies() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, email, sms) = test_notifier();

    let svc = service(&db, notifier);
    let invitation = svc
        .issue(
            &workspace.id,
            &admin,
            "Ama Mensah".to_string(),
            "ama@example.com".to_string(),
            Some("+233200000000".to_string()),
            WorkspaceRole::Pm,
        )
        .await
        .expect("issue invitation");

    assert_eq!(invitation.status, InvitationStatus::Pending);
    assert_eq!(invitation.role, WorkspaceRole::Pm);
    assert_eq!(invitation.token.len(), 43);
    assert_eq!(
        (invitation.expires_at - invitation.created_at).num_days(),
        7
    );

    let resolution = svc
        .resolve(&invitation.token)
        .await
        .expect("resolve fresh token");
    assert!(matches!(resolution, InvitationResolution::Valid(_)));

    let emails = email.sent.lock().unwrap();
    assert_eq!(emails.len(), 1);
    let (to, subject, body) = &emails[0];
    assert_eq!(to, "ama@example.com");
    assert!(subject.contains("Launch Team"));
    assert!(body.contains(&format!("/invitations/{}/", invitation.token)));

    let texts = sms.sent.lock().unwrap();
    assert_eq!(texts.len(), 1);
    assert_eq!(texts[0].0, "+233200000000");
}

#[tokio::test]
async fn test_issue_requires_admin() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let outsider = create_user(&db, "yaw", "yaw@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();

    let err = service(&db, notifier)
        .issue(
            &workspace.id,
            &outsider,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InvitationError::Unauthorized));
}

#[tokio::test]
async fn test_issue_rejects_existing_member() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, email, _) = test_notifier();

    let err = service(&db, notifier)
        .issue(
            &workspace.id,
            &admin,
            "Kwame".to_string(),
            "kwame@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InvitationError::AlreadyMember(_)));
    assert!(email.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_issue_rejects_duplicate_pending() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("first invitation");

    let err = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, InvitationError::DuplicatePending(_)));
}

#[tokio::test]
async fn test_lapsed_invitation_can_be_reissued() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let first = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("first invitation");
    backdate_expiry(&db, first).await;

    // The pending duplicate guard only counts invitations still in
    // their expiry window.
    service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("reissue after lapse");
}

#[tokio::test]
async fn test_accept_grants_membership_with_invited_role() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let invitee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Pm,
        )
        .await
        .expect("issue invitation");

    let accepted = service
        .accept(&invitation.token, &invitee)
        .await
        .expect("accept invitation");

    assert_eq!(accepted.status, InvitationStatus::Accepted);
    assert_eq!(accepted.accepted_by.as_deref(), Some(invitee.id.as_str()));
    assert!(accepted.accepted_at.is_some());

    let membership = WorkspaceMembersRepo::new(db.clone())
        .get(&workspace.id, &invitee.id)
        .await
        .expect("load membership")
        .expect("membership created");
    assert_eq!(membership.role, WorkspaceRole::Pm);

    let resolution = service
        .resolve(&invitation.token)
        .await
        .expect("resolve consumed token");
    assert!(matches!(resolution, InvitationResolution::AlreadyUsed));
}

#[tokio::test]
async fn test_accept_consumes_token_exactly_once() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let first = create_user(&db, "ama", "ama@example.com").await;
    let second = create_user(&db, "yaw", "yaw@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");

    service
        .accept(&invitation.token, &first)
        .await
        .expect("first accept");

    let err = service.accept(&invitation.token, &second).await.unwrap_err();
    assert!(matches!(err, InvitationError::AlreadyUsed));

    let membership = WorkspaceMembersRepo::new(db.clone())
        .get(&workspace.id, &second.id)
        .await
        .expect("load membership");
    assert!(membership.is_none());
}

#[tokio::test]
async fn test_accept_keeps_existing_membership() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let invitee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let members_repo = WorkspaceMembersRepo::new(db.clone());
    members_repo
        .add(workspace.id.clone(), invitee.id.clone(), WorkspaceRole::Admin)
        .await
        .expect("pre-existing membership");

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "other-ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");

    service
        .accept(&invitation.token, &invitee)
        .await
        .expect("accept despite existing membership");

    // The original membership survives untouched, no duplicate row.
    let membership = members_repo
        .get(&workspace.id, &invitee.id)
        .await
        .expect("load membership")
        .expect("membership present");
    assert_eq!(membership.role, WorkspaceRole::Admin);
    assert_eq!(
        members_repo
            .count_for_workspace(&workspace.id)
            .await
            .expect("count members"),
        2
    );
}

#[tokio::test]
async fn test_accept_expired_invitation_fails() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let invitee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");
    let invitation = backdate_expiry(&db, invitation).await;

    let err = service.accept(&invitation.token, &invitee).await.unwrap_err();
    assert!(matches!(err, InvitationError::Expired));

    let resolution = service
        .resolve(&invitation.token)
        .await
        .expect("resolve token");
    assert!(matches!(resolution, InvitationResolution::Expired));
}

#[tokio::test]
async fn test_revoked_token_stops_resolving() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let invitee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");

    let revoked = service
        .revoke(&workspace.id, &invitation.id, &admin)
        .await
        .expect("revoke invitation");
    assert_eq!(revoked.status, InvitationStatus::Revoked);
    assert!(revoked.revoked_at.is_some());

    // A revoked token reads as if it never existed.
    let resolution = service
        .resolve(&invitation.token)
        .await
        .expect("resolve token");
    assert!(matches!(resolution, InvitationResolution::NotFound));

    let err = service.accept(&invitation.token, &invitee).await.unwrap_err();
    assert!(matches!(err, InvitationError::NotFound));

    let err = service
        .revoke(&workspace.id, &invitation.id, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::NotFound));
}

#[tokio::test]
async fn test_revoke_accepted_invitation_fails() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let invitee = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");
    service
        .accept(&invitation.token, &invitee)
        .await
        .expect("accept invitation");

    let err = service
        .revoke(&workspace.id, &invitation.id, &admin)
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::AlreadyUsed));

    // Consumption is immutable; the row keeps its accepted state.
    let stored = InvitationsRepo::new(db.clone())
        .find_by_token(&invitation.token)
        .await
        .expect("load invitation")
        .expect("row kept");
    assert_eq!(stored.status, InvitationStatus::Accepted);
}

#[tokio::test]
async fn test_revoke_requires_admin() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let member = create_user(&db, "yaw", "yaw@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    WorkspaceMembersRepo::new(db.clone())
        .add(workspace.id.clone(), member.id.clone(), WorkspaceRole::Member)
        .await
        .expect("add member");

    let invitation = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");

    let err = service
        .revoke(&workspace.id, &invitation.id, &member)
        .await
        .unwrap_err();
    assert!(matches!(err, InvitationError::Unauthorized));
}

#[tokio::test]
async fn test_sweep_marks_only_lapsed_pending() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, _) = test_notifier();
    let service = service(&db, notifier);

    let lapsed = service
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("first invitation");
    let lapsed = backdate_expiry(&db, lapsed).await;

    let fresh = service
        .issue(
            &workspace.id,
            &admin,
            "Yaw".to_string(),
            "yaw@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("second invitation");

    let swept = service
        .sweep_expired(&workspace.id, &admin)
        .await
        .expect("sweep");
    assert_eq!(swept, 1);

    let invitations_repo = InvitationsRepo::new(db.clone());
    let lapsed = invitations_repo
        .find_by_id(&lapsed.id)
        .await
        .expect("load lapsed")
        .expect("lapsed exists");
    assert_eq!(lapsed.status, InvitationStatus::Expired);

    let fresh = invitations_repo
        .find_by_id(&fresh.id)
        .await
        .expect("load fresh")
        .expect("fresh exists");
    assert_eq!(fresh.status, InvitationStatus::Pending);

    // Nothing left to sweep on the second pass.
    let swept = service
        .sweep_expired(&workspace.id, &admin)
        .await
        .expect("second sweep");
    assert_eq!(swept, 0);
}

#[tokio::test]
async fn test_email_failure_does_not_block_issue() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;

    let failing = RecordingEmailSender {
        fail: true,
        ..Default::default()
    };
    let notifier = Notifier::new(std::sync::Arc::new(failing), None);

    let invitation = service(&db, notifier)
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            None,
            WorkspaceRole::Member,
        )
        .await
        .expect("issue survives email outage");

    let stored = InvitationsRepo::new(db.clone())
        .find_by_token(&invitation.token)
        .await
        .expect("load invitation");
    assert!(stored.is_some());
}

#[tokio::test]
async fn test_sms_skipped_without_provider() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, email) = email_only_notifier();

    service(&db, notifier)
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            Some("+233200000000".to_string()),
            WorkspaceRole::Member,
        )
        .await
        .expect("issue without sms provider");

    assert_eq!(email.sent.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_phone_is_treated_as_missing() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;
    let (notifier, _, sms) = test_notifier();

    let invitation = service(&db, notifier)
        .issue(
            &workspace.id,
            &admin,
            "Ama".to_string(),
            "ama@example.com".to_string(),
            Some("   ".to_string()),
            WorkspaceRole::Member,
        )
        .await
        .expect("issue invitation");

    assert_eq!(invitation.recipient_phone, None);
    assert!(sms.sent.lock().unwrap().is_empty());
}
