use crate::AuthError;
use domain::{Role, SessionContext};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Debug, Serialize, Deserialize)]
/// 会话令牌内部 claims。
struct Claims {
    sub: String,
    role: String,
    exp: usize,
}

/// 签发结果。
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    /// 过期时间（毫秒时间戳）。
    pub expires_at_ms: i64,
    pub ttl_seconds: u64,
}

/// 会话令牌（HS256）生成与校验。
pub struct SessionManager {
    secret: Vec<u8>,
    ttl_seconds: u64,
}

impl SessionManager {
    pub fn new(secret: String, ttl_seconds: u64) -> Self {
        Self {
            secret: secret.into_bytes(),
            ttl_seconds,
        }
    }

    pub fn issue(&self, ctx: &SessionContext) -> Result<SessionToken, AuthError> {
        self.issue_with_ttl(ctx, self.ttl_seconds)
    }

    fn issue_with_ttl(
        &self,
        ctx: &SessionContext,
        ttl_seconds: u64,
    ) -> Result<SessionToken, AuthError> {
        let expires_at = now_epoch_seconds() + ttl_seconds;
        let claims = Claims {
            sub: ctx.username.clone(),
            role: ctx.role.as_str().to_string(),
            exp: expires_at as usize,
        };
        let token = jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(&self.secret),
        )
        .map_err(|err| AuthError::Internal(err.to_string()))?;
        Ok(SessionToken {
            token,
            expires_at_ms: (expires_at as i64).saturating_mul(1000),
            ttl_seconds,
        })
    }

    pub fn decode(&self, token: &str) -> Result<SessionContext, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        // 过期判定不留宽限。
        validation.leeway = 0;
        let decoded = jsonwebtoken::decode::<Claims>(
            token,
            &DecodingKey::from_secret(&self.secret),
            &validation,
        )
        .map_err(map_jwt_error)?;
        let claims = decoded.claims;
        if claims.sub.is_empty() {
            return Err(AuthError::TokenInvalid);
        }
        Ok(SessionContext::new(claims.sub, Role::parse(&claims.role)))
    }
}

/// 当前时间戳（秒）。
fn now_epoch_seconds() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// 将 jwt 库错误映射为业务错误。
fn map_jwt_error(err: jsonwebtoken::errors::Error) -> AuthError {
    match err.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::TokenInvalid,
    }
}
