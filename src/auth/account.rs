//! Account lifecycle calls that never create a session by themselves.

use super::*;

impl AuthServiceClient {
    /// Registers a user. The account needs email verification before login.
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        name: Option<&str>,
    ) -> Result<AuthResponse, AuthError> {
        self.post(
            "/register",
            serde_json::json!({"email": email, "password": password, "name": name}),
            "registration failed",
        )
        .await
    }

    pub async fn verify_email(&self, email: &str, code: &str) -> Result<AuthResponse, AuthError> {
        self.post(
            "/verify-email",
            serde_json::json!({"email": email, "code": code}),
            "email verification failed",
        )
        .await
    }

    pub async fn resend_verification(&self, email: &str) -> Result<AuthResponse, AuthError> {
        self.post(
            "/resend-verification",
            serde_json::json!({"email": email}),
            "could not resend verification code",
        )
        .await
    }

    pub async fn forgot_password(&self, email: &str) -> Result<AuthResponse, AuthError> {
        self.post(
            "/forgot-password",
            serde_json::json!({"email": email}),
            "password reset request failed",
        )
        .await
    }

    pub async fn reset_password(
        &self,
        email: &str,
        code: &str,
        new_password: &str,
    ) -> Result<AuthResponse, AuthError> {
        self.post(
            "/reset-password",
            serde_json::json!({"email": email, "code": code, "new_password": new_password}),
            "password reset failed",
        )
        .await
    }

    /// Requires a signed-in session; the stored access token is attached.
    pub async fn change_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<AuthResponse, AuthError> {
        self.post(
            "/change-password",
            serde_json::json!({
                "current_password": current_password,
                "new_password": new_password
            }),
            "password change failed",
        )
        .await
    }
}
