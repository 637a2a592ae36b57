//! DTOs for the backend REST API.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MenuStatus {
    Processing,
    Completed,
    Failed,
}

impl MenuStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            MenuStatus::Processing => "processing",
            MenuStatus::Completed => "completed",
            MenuStatus::Failed => "failed",
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuHistoryItem {
    pub id: String,

    #[serde(default)]
    pub user_id: String,

    /// `YYYY-MM-DD`.
    pub week_start_date: String,

    #[serde(default)]
    pub calories_total: f64,

    #[serde(default)]
    pub source: String,

    pub status: MenuStatus,
    pub created_at: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Meal {
    pub id: String,

    /// Breakfast, Lunch, Dinner or Snack.
    #[serde(rename = "type")]
    pub meal_type: String,

    pub name: String,

    #[serde(default)]
    pub calories: f64,

    #[serde(default)]
    pub ingredients: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Day {
    pub id: String,
    pub day_name: String,

    #[serde(default)]
    pub calories_day: f64,

    #[serde(default)]
    pub meals: Vec<Meal>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MenuDetail {
    pub id: String,

    #[serde(default)]
    pub profile_id: String,

    pub week_start_date: String,

    #[serde(default)]
    pub calories_total: f64,

    #[serde(default)]
    pub source: String,

    pub status: MenuStatus,

    #[serde(default)]
    pub error_message: Option<String>,

    #[serde(default)]
    pub days: Vec<Day>,

    pub created_at: String,
}

#[derive(Debug, Serialize)]
pub(super) struct RegenerateMealRequest<'a> {
    pub(super) day_name: &'a str,
    pub(super) meal_type: &'a str,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreateProfile {
    pub name: String,
    pub last_name: String,
    pub age: u32,
    pub weight: f64,
    pub height: f64,
    pub gender: String,
    pub country: String,
    pub goal: String,
    pub activity_level: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
}

/// Partial profile update; unset fields are left untouched by the server.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activity_level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dislikes: Option<Vec<String>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,

    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub calories: Option<f64>,
    #[serde(default)]
    pub dislikes: Option<Vec<String>>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub age: Option<u32>,
    #[serde(default)]
    pub weight: Option<f64>,
    #[serde(default)]
    pub height: Option<f64>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AvatarUpload {
    pub avatar_url: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckoutPlan {
    PremiumMonthly,
    PremiumYearly,
}

#[derive(Debug, Serialize)]
pub(super) struct CheckoutRequest {
    pub(super) plan: CheckoutPlan,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_url: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub user_id: String,

    #[serde(default)]
    pub tenant: String,

    #[serde(default)]
    pub stripe_customer_id: String,

    #[serde(default)]
    pub stripe_subscription_id: String,

    pub status: String,
    pub plan: String,

    #[serde(default)]
    pub current_period_start: Option<String>,

    #[serde(default)]
    pub current_period_end: Option<String>,

    #[serde(default)]
    pub cancel_at_period_end: bool,

    pub created_at: String,
    pub updated_at: String,
}
