//! Weekly menu (meal plan) operations.

use super::*;

impl ApiClient {
    /// All plans generated for the signed-in user, newest first as served.
    pub async fn menu_history(&self) -> Result<Vec<MenuHistoryItem>, ApiError> {
        let req = ApiRequest::get(self.url("/menu/history"));
        let body = self.execute(&req, "could not load plan history").await?;
        decode(&body)
    }

    pub async fn menu(&self, id: &str) -> Result<MenuDetail, ApiError> {
        let req = ApiRequest::get(self.url(&format!("/menu/{}", id)));
        let body = self.execute(&req, "could not load plan").await?;
        decode(&body)
    }

    /// Starts generating a new plan. The server answers 202 with a
    /// `processing` item; poll [`ApiClient::menu`] for the result.
    pub async fn create_menu(&self) -> Result<MenuHistoryItem, ApiError> {
        let req = ApiRequest::post(self.url("/menu"));
        let body = self.execute(&req, "could not generate a new plan").await?;
        decode(&body)
    }

    pub async fn regenerate_meal(
        &self,
        menu_id: &str,
        day_name: &str,
        meal_type: &str,
    ) -> Result<MenuDetail, ApiError> {
        let req = ApiRequest::post(self.url(&format!("/menu/{}/meals/regenerate", menu_id)))
            .json(&RegenerateMealRequest {
                day_name,
                meal_type,
            })?;
        let body = self.execute(&req, "could not regenerate meal").await?;
        decode(&body)
    }
}
