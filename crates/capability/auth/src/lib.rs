//! 认证能力：登录、会话令牌签发与校验、默认账户初始化。

mod jwt;
mod password;

use async_trait::async_trait;
use bms_storage::{UserRecord, UserStore};
use domain::{Role, SessionContext};
use std::sync::Arc;
use tracing::info;

pub use jwt::{SessionManager, SessionToken};
pub use password::{PasswordCheck, hash_password, verify_password_and_maybe_upgrade};

/// 认证相关错误。
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("token expired")]
    TokenExpired,
    #[error("token invalid")]
    TokenInvalid,
    #[error("internal error: {0}")]
    Internal(String),
}

/// 首次启动时写入的默认账户（仅在用户不存在时创建）。
pub const DEFAULT_USERS: [(&str, &str, Role); 3] = [
    ("admin", "admin@ch.fanap", Role::Admin),
    ("manager", "manager@ch.fanap", Role::Manager),
    ("viewer", "viewer@ch.fanap", Role::Viewer),
];

/// 认证服务实现（基于 UserStore + 会话令牌）。
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    sessions: SessionManager,
}

impl AuthService {
    /// 创建认证服务实例。
    pub fn new(user_store: Arc<dyn UserStore>, sessions: SessionManager) -> Self {
        Self {
            user_store,
            sessions,
        }
    }

    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// 登录校验并签发会话令牌。
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, SessionToken), AuthError> {
        let user = self
            .user_store
            .find_by_username(username)
            .await
            .map_err(|err| AuthError::Internal(err.to_string()))?
            .ok_or(AuthError::InvalidCredentials)?;
        let check = verify_password_and_maybe_upgrade(&user.password_hash, password)?;
        if !check.verified {
            return Err(AuthError::InvalidCredentials);
        }
        if let Some(password_hash) = check.upgrade_hash {
            let updated = self
                .user_store
                .update_password_hash(&user.username, &password_hash)
                .await
                .map_err(|err| AuthError::Internal(err.to_string()))?;
            if !updated {
                return Err(AuthError::Internal("password migration update failed".to_string()));
            }
            info!(target: "bms.auth", username = %user.username, "password_hash_upgraded");
        }
        let ctx = SessionContext::new(user.username.clone(), user.role);
        let token = self.sessions.issue(&ctx)?;
        Ok((user, token))
    }

    /// 校验会话令牌并提取 SessionContext。
    pub fn verify_session(&self, token: &str) -> Result<SessionContext, AuthError> {
        self.sessions.decode(token)
    }

    /// 为缺失的默认账户写入 argon2 口令哈希，返回新建数量。
    pub async fn ensure_default_users(&self) -> Result<usize, AuthError> {
        let mut created = 0;
        for (username, password, role) in DEFAULT_USERS {
            let existing = self
                .user_store
                .find_by_username(username)
                .await
                .map_err(|err| AuthError::Internal(err.to_string()))?;
            if existing.is_some() {
                continue;
            }
            self.user_store
                .upsert_user(UserRecord {
                    username: username.to_string(),
                    password_hash: hash_password(password)?,
                    role,
                })
                .await
                .map_err(|err| AuthError::Internal(err.to_string()))?;
            info!(target: "bms.auth", username, role = %role, "default_user_created");
            created += 1;
        }
        Ok(created)
    }
}

/// 认证能力 trait，便于替换实现与测试。
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, SessionToken), AuthError>;
    fn verify_session(&self, token: &str) -> Result<SessionContext, AuthError>;
}

#[async_trait]
impl Authenticator for AuthService {
    async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(UserRecord, SessionToken), AuthError> {
        self.login(username, password).await
    }

    fn verify_session(&self, token: &str) -> Result<SessionContext, AuthError> {
        self.verify_session(token)
    }
}
