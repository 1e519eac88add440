use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, warn};

use crate::auth::dto::{LoginRequest, PublicUser, RegisterRequest};
use crate::auth::jwt::JwtKeys;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::repo::UserRepo;
use crate::auth::repo_types::NewUser;
use crate::db::StoreError;
use crate::error::{ApiError, ApiResult};

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Account registration, credential checks and token issuance.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepo>,
    keys: Arc<JwtKeys>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepo>, keys: JwtKeys) -> Self {
        Self {
            users,
            keys: Arc::new(keys),
        }
    }

    pub async fn register(&self, req: RegisterRequest) -> ApiResult<()> {
        let username = req.username.trim();
        let email = req.email.trim();

        if username.is_empty() || email.is_empty() || req.password.is_empty() {
            return Err(ApiError::BadRequest(
                "username, email and password are required".into(),
            ));
        }
        if !is_valid_email(email) {
            warn!(email, "invalid email");
            return Err(ApiError::BadRequest("Invalid email".into()));
        }

        if self.users.username_or_email_taken(username, email).await? {
            warn!(username, email, "username or email already registered");
            return Err(ApiError::Conflict("User already exists".into()));
        }

        let password_hash = hash_password(&req.password)?;
        let user = self
            .users
            .create(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
            })
            .await
            .map_err(|e| match e {
                // lost a race with a concurrent registration
                StoreError::UniqueViolation(_) => ApiError::Conflict("User already exists".into()),
                other => other.into(),
            })?;

        info!(user_id = user.id, username = %user.username, "user registered");
        Ok(())
    }

    /// Unknown usernames and wrong passwords are reported identically.
    pub async fn login(&self, req: LoginRequest) -> ApiResult<String> {
        let Some(user) = self.users.find_by_username(&req.username).await? else {
            warn!(username = %req.username, "login unknown username");
            return Err(ApiError::InvalidCredentials);
        };

        if !verify_password(&req.password, &user.password_hash)? {
            warn!(user_id = user.id, "login invalid password");
            return Err(ApiError::InvalidCredentials);
        }

        let token = self.keys.sign_access(user.id)?;
        info!(user_id = user.id, "user logged in");
        Ok(token)
    }

    pub fn resolve_identity(&self, token: &str) -> ApiResult<i64> {
        self.keys.verify(token).map(|claims| claims.sub).map_err(|e| {
            warn!(error = %e, "invalid or expired token");
            ApiError::Unauthenticated("Invalid or expired token".into())
        })
    }

    pub async fn profile(&self, user_id: i64) -> ApiResult<PublicUser> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| ApiError::not_found("User not found"))?;
        Ok(PublicUser {
            id: user.id,
            username: user.username,
            email: user.email,
        })
    }
}
