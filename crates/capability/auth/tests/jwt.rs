use bms_auth::{AuthError, SessionManager};
use domain::{Role, SessionContext};

#[test]
fn session_issue_and_decode() {
    let sessions = SessionManager::new("secret".to_string(), 3600);
    let ctx = SessionContext::new("ops", Role::Manager);

    let token = sessions.issue(&ctx).expect("token");
    let decoded = sessions.decode(&token.token).expect("decode");

    assert_eq!(decoded, ctx);
    assert_eq!(token.ttl_seconds, 3600);
}

#[test]
fn foreign_secret_is_rejected() {
    let issuer = SessionManager::new("secret-a".to_string(), 3600);
    let verifier = SessionManager::new("secret-b".to_string(), 3600);
    let token = issuer
        .issue(&SessionContext::new("ops", Role::Admin))
        .expect("token");

    assert!(matches!(
        verifier.decode(&token.token),
        Err(AuthError::TokenInvalid)
    ));
}
