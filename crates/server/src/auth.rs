//! Bearer-token authentication.
//!
//! Sign-in issues an HS256 JWT whose subject is the account id. Protected
//! routes decode the token, reload the account and expose it to handlers as
//! a [`CurrentUser`] extension.

use api_types::{
    Ack,
    auth::{Login, LoginStarted, LoginVerify, Register, TokenResponse},
};
use axum::{
    Json,
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use chrono::{DateTime, Duration, Utc};
use engine::{Account, Role};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{ServerError, server::ServerState, views};

#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: String,
    pub role: String,
    pub exp: usize,
    pub iat: usize,
}

/// Authenticated caller, inserted by the auth middleware.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: Uuid,
    pub role: Role,
}

impl AuthConfig {
    pub fn issue(
        &self,
        account: &Account,
        now: DateTime<Utc>,
    ) -> Result<(String, DateTime<Utc>), ServerError> {
        let expires_at = now + Duration::minutes(self.token_ttl_minutes);
        let claims = Claims {
            sub: account.id.to_string(),
            role: account.role.as_str().to_string(),
            exp: expires_at.timestamp() as usize,
            iat: now.timestamp() as usize,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )
        .map_err(|err| ServerError::Internal(format!("failed to sign token: {err}")))?;
        Ok((token, expires_at))
    }

    pub fn verify(&self, token: &str) -> Option<Claims> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .ok()
    }
}

async fn current_user(state: &ServerState, token: &str) -> Result<CurrentUser, StatusCode> {
    let claims = state.auth.verify(token).ok_or(StatusCode::UNAUTHORIZED)?;
    let id = Uuid::parse_str(&claims.sub).map_err(|_| StatusCode::UNAUTHORIZED)?;
    // The account may have been deleted or demoted since the token was issued.
    let account = state
        .engine
        .account(id)
        .await
        .map_err(|_| StatusCode::UNAUTHORIZED)?;
    Ok(CurrentUser {
        id: account.id,
        role: account.role,
    })
}

pub async fn auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let TypedHeader(bearer) = bearer.ok_or(StatusCode::UNAUTHORIZED)?;
    let user = current_user(&state, bearer.token()).await?;
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Same as [`auth`], but only lets administrators through.
pub async fn admin_auth(
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let TypedHeader(bearer) = bearer.ok_or(StatusCode::UNAUTHORIZED)?;
    let user = current_user(&state, bearer.token()).await?;
    if user.role != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

/// Open a customer account and sign it in.
pub async fn register(
    State(state): State<ServerState>,
    Json(payload): Json<Register>,
) -> Result<(StatusCode, Json<Ack<TokenResponse>>), ServerError> {
    let now = Utc::now();
    let account = state
        .engine
        .open_account(
            &payload.name,
            &payload.email,
            &payload.password,
            Role::Customer,
            now,
        )
        .await?;
    let (token, expires_at) = state.auth.issue(&account, now)?;
    Ok((
        StatusCode::CREATED,
        Json(Ack::new(TokenResponse {
            token,
            expires_at,
            account: views::account(account),
        })),
    ))
}

/// Check the password and mail a sign-in code. No token yet.
pub async fn login(
    State(state): State<ServerState>,
    Json(payload): Json<Login>,
) -> Result<Json<Ack<LoginStarted>>, ServerError> {
    let otp_expires_at = state
        .engine
        .initiate_login(&payload.email, &payload.password, Utc::now())
        .await?;
    Ok(Json(Ack::new(LoginStarted {
        message: "OTP sent".to_string(),
        otp_expires_at,
    })))
}

/// Exchange the sign-in code for a bearer token.
pub async fn verify_otp(
    State(state): State<ServerState>,
    Json(payload): Json<LoginVerify>,
) -> Result<Json<Ack<TokenResponse>>, ServerError> {
    let now = Utc::now();
    let account = state
        .engine
        .confirm_login(&payload.email, &payload.otp, now)
        .await?;
    let (token, expires_at) = state.auth.issue(&account, now)?;
    Ok(Json(Ack::new(TokenResponse {
        token,
        expires_at,
        account: views::account(account),
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AuthConfig {
        AuthConfig {
            jwt_secret: "test-secret".to_string(),
            token_ttl_minutes: 30,
        }
    }

    fn account(role: Role) -> Account {
        Account {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@example.com".to_string(),
            role,
            account_number: "1234567890".to_string(),
            account_type: engine::AccountType::Savings,
            status: engine::AccountStatus::Active,
            balance: 0,
            pin_set: false,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn issued_token_verifies() {
        let config = config();
        let account = account(Role::Admin);
        let (token, expires_at) = config.issue(&account, Utc::now()).unwrap();
        assert!(expires_at > Utc::now());

        let claims = config.verify(&token).unwrap();
        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn foreign_or_expired_tokens_are_rejected() {
        let config = config();
        let account = account(Role::Customer);
        let (token, _) = config.issue(&account, Utc::now()).unwrap();
        let other = AuthConfig {
            jwt_secret: "another-secret".to_string(),
            ..config.clone()
        };
        assert!(other.verify(&token).is_none());

        let (stale, _) = config
            .issue(&account, Utc::now() - Duration::hours(2))
            .unwrap();
        assert!(config.verify(&stale).is_none());
        assert!(config.verify("not-a-token").is_none());
    }
}
