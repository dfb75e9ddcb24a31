use bms_auth::{hash_password, verify_password_and_maybe_upgrade};

// sha256("abc")
const LEGACY_HASH: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

#[test]
fn argon2_hash_verifies() {
    let hash = hash_password("admin123").expect("hash");
    let check = verify_password_and_maybe_upgrade(&hash, "admin123").expect("check");
    assert!(check.verified);
    assert!(check.upgrade_hash.is_none());
}

#[test]
fn legacy_sha256_upgrades() {
    let stored = LEGACY_HASH.to_ascii_uppercase();
    let check = verify_password_and_maybe_upgrade(&stored, "abc").expect("check");
    assert!(check.verified);
    assert!(check.upgrade_hash.as_deref().unwrap_or_default().starts_with("$argon2"));
}

#[test]
fn wrong_password_rejected() {
    let check = verify_password_and_maybe_upgrade(LEGACY_HASH, "bad").expect("check");
    assert!(!check.verified);
    assert!(check.upgrade_hash.is_none());
}

#[test]
fn plaintext_is_not_accepted_as_legacy() {
    let check = verify_password_and_maybe_upgrade("admin123", "admin123").expect("check");
    assert!(!check.verified);
}
