use crate::{
    repos::users::UsersRepo,
    tests::common::{create_user, test_db},
    utils::password::{hash_password, verify_password},
};

#[tokio::test]
async fn test_user_lookup_roundtrip() {
    let db = test_db().await;
    let created = create_user(&db, "ama", "ama@example.com").await;
    let users_repo = UsersRepo::new(db.clone());

    let by_email = users_repo
        .get_by_email("ama@example.com")
        .await
        .expect("lookup by email");
    assert_eq!(by_email.id, created.id);

    let by_username = users_repo
        .find_by_username("ama")
        .await
        .expect("lookup by username")
        .expect("user exists");
    assert_eq!(by_username.id, created.id);

    let by_id = users_repo.get_by_id(&created.id).await.expect("lookup by id");
    assert_eq!(by_id.email, "ama@example.com");

    let missing = users_repo
        .find_by_email("nobody@example.com")
        .await
        .expect("lookup missing");
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let db = test_db().await;
    create_user(&db, "ama", "ama@example.com").await;

    let password_hash = hash_password("another password").expect("hash password");
    let result = UsersRepo::new(db.clone())
        .create(
            "ama2".to_string(),
            "ama@example.com".to_string(),
            password_hash,
            None,
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let db = test_db().await;
    create_user(&db, "ama", "ama@example.com").await;

    let password_hash = hash_password("another password").expect("hash password");
    let result = UsersRepo::new(db.clone())
        .create(
            "ama".to_string(),
            "other@example.com".to_string(),
            password_hash,
            None,
        )
        .await;

    assert!(result.is_err());
}

#[tokio::test]
async fn test_stored_hash_verifies_original_password() {
    let db = test_db().await;
    let user = create_user(&db, "ama", "ama@example.com").await;

    assert!(
        verify_password("correct horse battery staple", &user.password_hash)
            .expect("verify password")
    );
    assert!(!verify_password("wrong password", &user.password_hash).expect("verify password"));
}
