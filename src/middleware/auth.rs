//! Bearer-token authentication against the identity provider
//!
//! Tokens are verified over HTTPS with the provider; on success the verified
//! profile is synced into the local users table and handed to the controller
//! as an `AuthUser`. Controllers call `authenticate` at the top of each
//! protected handler, the same inline style the rest of the API uses.

use actix_web::{HttpRequest, HttpResponse};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

use crate::controllers::ApiResponse;
use crate::db::Database;
use crate::models::User;

/// Authenticated user attached to a request after verification + sync
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: String,
    pub provider_id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
}

impl From<User> for AuthUser {
    fn from(user: User) -> Self {
        AuthUser {
            id: user.id,
            provider_id: user.provider_id,
            email: user.email,
            wallet_address: user.wallet_address,
        }
    }
}

/// Profile shape the identity provider returns for a verified token
#[derive(Debug, Deserialize)]
struct ProviderProfile {
    #[serde(rename = "userId")]
    user_id: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    wallet: Option<ProviderWallet>,
    #[serde(rename = "linkedAccounts", default)]
    linked_accounts: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct ProviderWallet {
    address: String,
}

pub struct AuthClient {
    client: Client,
    verify_url: String,
    app_id: String,
    app_secret: String,
}

impl AuthClient {
    pub fn new(base_url: &str, app_id: &str, app_secret: &str) -> Result<Self, String> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| format!("Failed to create HTTP client: {}", e))?;

        Ok(AuthClient {
            client,
            verify_url: format!("{}/sessions/verify", base_url.trim_end_matches('/')),
            app_id: app_id.to_string(),
            app_secret: app_secret.to_string(),
        })
    }

    /// Verify a bearer token with the provider; Ok(None) means the token is
    /// invalid or expired, Err means the provider itself failed.
    pub async fn verify_token(&self, token: &str) -> Result<Option<AuthUserProfile>, String> {
        let response = self
            .client
            .get(&self.verify_url)
            .bearer_auth(token)
            .header("x-app-id", &self.app_id)
            .header("x-app-secret", &self.app_secret)
            .send()
            .await
            .map_err(|e| format!("Identity provider request failed: {}", e))?;

        let status = response.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            return Ok(None);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Identity provider error: {} - {}", status, body));
        }

        let profile: ProviderProfile = response
            .json()
            .await
            .map_err(|e| format!("Failed to parse identity provider response: {}", e))?;

        // Wallet can live either on the top-level wallet object or inside
        // linked accounts, depending on how the user signed up
        let wallet_address = profile
            .wallet
            .map(|w| w.address)
            .or_else(|| wallet_from_linked_accounts(profile.linked_accounts.as_ref()));

        Ok(Some(AuthUserProfile {
            provider_id: profile.user_id,
            email: profile.email,
            wallet_address,
            linked_accounts: profile.linked_accounts,
        }))
    }
}

/// Verified provider profile before the local user sync
#[derive(Debug, Clone)]
pub struct AuthUserProfile {
    pub provider_id: String,
    pub email: Option<String>,
    pub wallet_address: Option<String>,
    pub linked_accounts: Option<Value>,
}

fn wallet_from_linked_accounts(linked: Option<&Value>) -> Option<String> {
    let accounts = linked?.as_array()?;
    accounts
        .iter()
        .find(|account| {
            matches!(
                account.get("type").and_then(|t| t.as_str()),
                Some("wallet") | Some("ethereum_wallet") | Some("smart_wallet")
            )
        })
        .and_then(|account| account.get("address"))
        .and_then(|a| a.as_str())
        .map(|a| a.to_string())
}

/// Pull the bearer token out of the Authorization header
pub fn bearer_token(req: &HttpRequest) -> Option<String> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Authenticate a request: verify the token, sync the user row, return the
/// AuthUser. On failure returns the ready-to-send error response.
pub async fn authenticate(
    req: &HttpRequest,
    auth: &AuthClient,
    db: &Arc<Database>,
) -> Result<AuthUser, HttpResponse> {
    let token = match bearer_token(req) {
        Some(t) => t,
        None => {
            return Err(HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Missing or invalid authorization header")));
        }
    };

    let profile = match auth.verify_token(&token).await {
        Ok(Some(profile)) => profile,
        Ok(None) => {
            return Err(HttpResponse::Unauthorized()
                .json(ApiResponse::<()>::error("Invalid or expired token")));
        }
        Err(e) => {
            log::error!("[AUTH] Token verification failed: {}", e);
            return Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Authentication failed")));
        }
    };

    let user = match db.sync_user(
        &profile.provider_id,
        profile.email.as_deref(),
        profile.wallet_address.as_deref(),
        profile.linked_accounts.as_ref(),
    ) {
        Ok(user) => user,
        Err(e) => {
            log::error!("[AUTH] User sync failed for {}: {}", profile.provider_id, e);
            return Err(HttpResponse::InternalServerError()
                .json(ApiResponse::<()>::error("Authentication failed")));
        }
    };

    Ok(AuthUser::from(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn wallet_is_found_in_linked_accounts() {
        let linked = json!([
            {"type": "email", "address": "a@b.io"},
            {"type": "smart_wallet", "address": "0xWallet"}
        ]);
        assert_eq!(
            wallet_from_linked_accounts(Some(&linked)).as_deref(),
            Some("0xWallet")
        );
        assert!(wallet_from_linked_accounts(Some(&json!([]))).is_none());
        assert!(wallet_from_linked_accounts(None).is_none());
    }
}
