use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::config::AppConfig;
use crate::models::ValentineConfig;
use crate::services::capacity::CapacityLimits;
use crate::services::email::EmailProvider;
use crate::services::group::GroupConfig;

pub struct AppState {
    pub db: Arc<Mutex<Connection>>,
    pub config: AppConfig,
    pub email: Box<dyn EmailProvider>,
    pub capacity: CapacityLimits,
    pub group: GroupConfig,
    pub valentine: ValentineConfig,
}
