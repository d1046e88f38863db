use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

// A customer kept on file after their last slot was removed, so history and
// pending deliveries stay reachable.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub created_at: NaiveDateTime,
}
