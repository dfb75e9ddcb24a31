//! 口令哈希。
//!
//! 新写入的口令一律为 argon2id PHC 串。旧数据文件里的用户保存的是 SHA-256 十六进制串，
//! 登录校验通过后换成 argon2。

use crate::AuthError;
use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use rand_core::OsRng;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 校验结果；`upgrade_hash` 非空时调用方应替换存储中的哈希。
pub struct PasswordCheck {
    pub verified: bool,
    pub upgrade_hash: Option<String>,
}

impl PasswordCheck {
    fn rejected() -> Self {
        Self {
            verified: false,
            upgrade_hash: None,
        }
    }
}

/// 存储中口令哈希的格式。
enum StoredHash<'a> {
    Argon2(&'a str),
    LegacySha256(String),
    Unrecognized,
}

impl<'a> StoredHash<'a> {
    fn classify(stored: &'a str) -> Self {
        let stored = stored.trim();
        if stored.starts_with("$argon2") {
            return StoredHash::Argon2(stored);
        }
        if stored.len() == 64 && stored.bytes().all(|byte| byte.is_ascii_hexdigit()) {
            return StoredHash::LegacySha256(stored.to_ascii_lowercase());
        }
        StoredHash::Unrecognized
    }
}

pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| AuthError::Internal(err.to_string()))
}

/// 校验口令，旧格式校验通过时附带新的 argon2 哈希。
pub fn verify_password_and_maybe_upgrade(
    stored_password_hash: &str,
    password: &str,
) -> Result<PasswordCheck, AuthError> {
    match StoredHash::classify(stored_password_hash) {
        StoredHash::Argon2(phc) => {
            let parsed =
                PasswordHash::new(phc).map_err(|err| AuthError::Internal(err.to_string()))?;
            Ok(PasswordCheck {
                verified: Argon2::default()
                    .verify_password(password.as_bytes(), &parsed)
                    .is_ok(),
                upgrade_hash: None,
            })
        }
        StoredHash::LegacySha256(expected) => {
            let actual = sha256_hex(password);
            let matched: bool = expected.as_bytes().ct_eq(actual.as_bytes()).into();
            if !matched {
                return Ok(PasswordCheck::rejected());
            }
            Ok(PasswordCheck {
                verified: true,
                upgrade_hash: Some(hash_password(password)?),
            })
        }
        StoredHash::Unrecognized => Ok(PasswordCheck::rejected()),
    }
}

fn sha256_hex(password: &str) -> String {
    Sha256::digest(password.as_bytes())
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}
