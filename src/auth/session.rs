//! Sign-in, sign-out, identity and token refresh.

use super::*;

use async_trait::async_trait;
use time::OffsetDateTime;

use crate::model::CredentialBundle;

#[async_trait]
impl AuthBackend for AuthServiceClient {
    async fn login(&self, email: &str, password: &str) -> Result<AuthResponse, AuthError> {
        let data = self
            .post(
                "/login",
                serde_json::json!({"email": email, "password": password}),
                "login failed",
            )
            .await?;

        match data.grant() {
            Some(grant) => {
                let bundle = CredentialBundle::from_grant(&grant, OffsetDateTime::now_utc());
                self.store.write(&bundle);
                tracing::debug!("login stored a new session");
            }
            None => tracing::debug!("login response carried no complete token set"),
        }
        Ok(data)
    }

    async fn logout(&self) {
        match self.auth_fetch(Method::POST, "/logout", None).await {
            Ok(resp) if !resp.status().is_success() => {
                tracing::warn!(status = %resp.status(), "logout rejected; clearing local session anyway");
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "logout request failed; clearing local session anyway");
            }
        }
        self.store.clear();
    }

    async fn current_user(&self) -> Result<User, AuthError> {
        let resp = self.auth_fetch(Method::GET, "/me", None).await?;
        let data = expect_ok(resp, "not authenticated").await?;
        data.user.ok_or_else(|| AuthError::Rejected {
            status: 200,
            message: "response has no user".to_string(),
        })
    }

    async fn refresh(&self, refresh_token: &str) -> Result<TokenGrant, RefreshError> {
        let resp = self
            .auth_fetch(
                Method::POST,
                "/refresh",
                Some(serde_json::json!({"refresh_token": refresh_token})),
            )
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RefreshError::Status(status.as_u16()));
        }
        let body: serde_json::Value = resp
            .json()
            .await
            .map_err(|err| RefreshError::Malformed(err.to_string()))?;
        TokenGrant::from_json(&body).map_err(RefreshError::Malformed)
    }

    fn refresh_url(&self) -> String {
        self.url("/refresh")
    }
}
