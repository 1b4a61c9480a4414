use crate::{
    models::workspace_member::WorkspaceRole,
    repos::{workspace_members::WorkspaceMembersRepo, workspaces::WorkspacesRepo},
    services::access::{AccessControl, AccessError},
    tests::common::{create_user, create_workspace, test_db},
};

#[tokio::test]
async fn test_create_makes_creator_admin() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;

    let (workspace, member) = WorkspacesRepo::new(db.clone())
        .create("Launch Team".to_string(), None, owner.id.clone())
        .await
        .expect("create workspace");

    assert_eq!(member.workspace_id, workspace.id);
    assert_eq!(member.user_id, owner.id);
    assert_eq!(member.role, WorkspaceRole::Admin);

    let listed = WorkspaceMembersRepo::new(db.clone())
        .list_with_workspaces(&owner.id)
        .await
        .expect("list memberships");
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].0.role, WorkspaceRole::Admin);
    assert_eq!(
        listed[0].1.as_ref().map(|w| w.id.as_str()),
        Some(workspace.id.as_str())
    );
}

#[tokio::test]
async fn test_membership_listing_spans_owned_and_joined() {
    let db = test_db().await;
    let user = create_user(&db, "kwame", "kwame@example.com").await;
    let other = create_user(&db, "ama", "ama@example.com").await;

    let owned = create_workspace(&db, &user, "Owned").await;
    let joined = create_workspace(&db, &other, "Joined").await;
    WorkspaceMembersRepo::new(db.clone())
        .add(joined.id.clone(), user.id.clone(), WorkspaceRole::Pm)
        .await
        .expect("add as pm");

    let mut listed: Vec<String> = WorkspaceMembersRepo::new(db.clone())
        .list_with_workspaces(&user.id)
        .await
        .expect("list memberships")
        .into_iter()
        .filter_map(|(_, workspace)| workspace.map(|w| w.id))
        .collect();
    listed.sort();
    let mut expected = vec![owned.id, joined.id];
    expected.sort();
    assert_eq!(listed, expected);

    let for_other = WorkspaceMembersRepo::new(db.clone())
        .list_with_workspaces(&other.id)
        .await
        .expect("list for other");
    assert_eq!(for_other.len(), 1);
}

#[tokio::test]
async fn test_access_control_role_checks() {
    let db = test_db().await;
    let admin = create_user(&db, "kwame", "kwame@example.com").await;
    let pm = create_user(&db, "ama", "ama@example.com").await;
    let member = create_user(&db, "yaw", "yaw@example.com").await;
    let outsider = create_user(&db, "efua", "efua@example.com").await;
    let workspace = create_workspace(&db, &admin, "Launch Team").await;

    let members_repo = WorkspaceMembersRepo::new(db.clone());
    members_repo
        .add(workspace.id.clone(), pm.id.clone(), WorkspaceRole::Pm)
        .await
        .expect("add pm");
    members_repo
        .add(workspace.id.clone(), member.id.clone(), WorkspaceRole::Member)
        .await
        .expect("add member");

    let access = AccessControl::new(db.clone());

    let err = access
        .require_member(&workspace.id, &outsider.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::NotMember));

    access
        .require_member(&workspace.id, &member.id)
        .await
        .expect("member passes membership check");

    let err = access
        .require_admin(&workspace.id, &pm.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Forbidden));

    access
        .require_admin(&workspace.id, &admin.id)
        .await
        .expect("admin passes admin check");

    access
        .require_manager(&workspace.id, &pm.id)
        .await
        .expect("pm passes manager check");

    let err = access
        .require_manager(&workspace.id, &member.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AccessError::Forbidden));
}

#[tokio::test]
async fn test_is_email_member_matches_by_email() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;

    let members_repo = WorkspaceMembersRepo::new(db.clone());

    assert!(members_repo
        .is_email_member(&workspace.id, "kwame@example.com")
        .await
        .expect("owner email check"));
    assert!(!members_repo
        .is_email_member(&workspace.id, "ama@example.com")
        .await
        .expect("non-member email check"));
}

#[tokio::test]
async fn test_admin_count_tracks_role_changes() {
    let db = test_db().await;
    let owner = create_user(&db, "kwame", "kwame@example.com").await;
    let second = create_user(&db, "ama", "ama@example.com").await;
    let workspace = create_workspace(&db, &owner, "Launch Team").await;

    let members_repo = WorkspaceMembersRepo::new(db.clone());
    let membership = members_repo
        .add(workspace.id.clone(), second.id.clone(), WorkspaceRole::Member)
        .await
        .expect("add member");

    assert_eq!(
        members_repo
            .count_admins(&workspace.id)
            .await
            .expect("count admins"),
        1
    );

    let membership = members_repo
        .change_role(membership, WorkspaceRole::Admin)
        .await
        .expect("promote member");
    assert_eq!(membership.role, WorkspaceRole::Admin);
    assert_eq!(
        members_repo
            .count_admins(&workspace.id)
            .await
            .expect("count admins"),
        2
    );

    members_repo.remove(&membership.id).await.expect("remove member");
    assert_eq!(
        members_repo
            .count_admins(&workspace.id)
            .await
            .expect("count admins"),
        1
    );
}
