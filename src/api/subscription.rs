//! Premium subscription operations.

use super::*;

impl ApiClient {
    /// Creates a hosted checkout session and returns its URL.
    pub async fn create_checkout(&self, plan: CheckoutPlan) -> Result<CheckoutSession, ApiError> {
        let req = ApiRequest::post(self.url("/subscription/checkout"))
            .json(&CheckoutRequest { plan })?;
        let body = self
            .execute(&req, "could not create checkout session")
            .await?;
        decode(&body)
    }

    /// `None` when the user has never subscribed.
    pub async fn subscription_status(&self) -> Result<Option<Subscription>, ApiError> {
        let req = ApiRequest::get(self.url("/subscription/status"));
        let (status, body) = self.execute_raw(&req).await?;
        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            return Err(status_error(
                status,
                &body,
                "could not load subscription status",
            ));
        }
        decode(&body).map(Some)
    }

    pub async fn cancel_subscription(&self) -> Result<(), ApiError> {
        let req = ApiRequest::post(self.url("/subscription/cancel"));
        self.execute(&req, "could not cancel subscription").await?;
        Ok(())
    }
}
