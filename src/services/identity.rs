use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    db::AccountStore,
    error::{AppError, AppResult},
    models::{Account, AccountSummary},
};

/// bcrypt work factor for stored password hashes
const BCRYPT_COST: u32 = 10;
const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SignupResponse {
    pub message: String,
    pub user: AccountSummary,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: AccountSummary,
}

/// Signed session token payload
#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    /// Account id
    sub: String,
    iat: i64,
    exp: i64,
}

/// Registers accounts, checks credentials and issues/verifies session tokens.
///
/// Tokens are HS256 JWTs signed with one configured secret. There is no
/// revocation: a token stays valid until it expires.
pub struct IdentityService {
    accounts: Arc<dyn AccountStore>,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    token_ttl_days: i64,
}

impl IdentityService {
    pub fn new(accounts: Arc<dyn AccountStore>, secret: &str, token_ttl_days: i64) -> Self {
        Self {
            accounts,
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            token_ttl_days,
        }
    }

    pub async fn signup(&self, request: SignupRequest) -> AppResult<AccountSummary> {
        let (Some(email), Some(password)) = (
            request.email.filter(|e| !e.trim().is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        };

        let name = request.name.unwrap_or_default().trim().to_string();
        if name.is_empty() {
            return Err(AppError::Validation("Name is required".to_string()));
        }

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::Validation(format!(
                "Password must be at least {} characters",
                MIN_PASSWORD_LEN
            )));
        }

        let email = normalize_email(&email);
        if self.accounts.find_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict(
                "User already exists. Please login.".to_string(),
            ));
        }

        let password_hash = hash_password(password).await?;
        let account = Account::new(name, email, password_hash);
        self.accounts.insert(&account).await?;

        tracing::info!(account_id = %account.id, "Account created");

        Ok(account.summary())
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<LoginResponse> {
        let (Some(email), Some(password)) = (
            request.email.filter(|e| !e.trim().is_empty()),
            request.password.filter(|p| !p.is_empty()),
        ) else {
            return Err(AppError::Validation(
                "Email and password are required".to_string(),
            ));
        };

        let account = self
            .accounts
            .find_by_email(&normalize_email(&email))
            .await?
            .ok_or_else(|| {
                AppError::AccountNotFound("User not found. Please sign up first.".to_string())
            })?;

        if !verify_password(password, account.password_hash.clone()).await? {
            tracing::info!(account_id = %account.id, "Login rejected: wrong password");
            return Err(AppError::Unauthorized("Invalid password".to_string()));
        }

        let token = self.issue_token(account.id)?;
        tracing::info!(account_id = %account.id, "Login succeeded");

        Ok(LoginResponse {
            token,
            user: account.summary(),
        })
    }

    /// Validates signature and expiry and returns the embedded account id
    pub fn verify(&self, token: &str) -> AppResult<Uuid> {
        let invalid = || AppError::Unauthorized("Invalid or expired token".to_string());

        if token.trim().is_empty() {
            return Err(AppError::Unauthorized("No token provided".to_string()));
        }

        let data = jsonwebtoken::decode::<Claims>(
            token,
            &self.decoding_key,
            &Validation::new(Algorithm::HS256),
        )
        .map_err(|e| {
            tracing::debug!(error = %e, "Token verification failed");
            invalid()
        })?;

        Uuid::parse_str(&data.claims.sub).map_err(|_| invalid())
    }

    fn issue_token(&self, account_id: Uuid) -> AppResult<String> {
        let now = Utc::now();
        let expires_at = Duration::try_days(self.token_ttl_days)
            .and_then(|ttl| now.checked_add_signed(ttl))
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "Token lifetime of {} days is out of range",
                    self.token_ttl_days
                ))
            })?;
        let claims = Claims {
            sub: account_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
        };

        jsonwebtoken::encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token signing failed: {}", e)))
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

async fn hash_password(password: String) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, BCRYPT_COST))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

async fn verify_password(password: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?
        .map_err(|e| AppError::Internal(format!("Password verification failed: {}", e)))
}
