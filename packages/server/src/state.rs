use std::sync::Arc;

use crate::config::AppConfig;
use crate::services::{AssetService, GroupService, ReviewService, UserService};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub assets: AssetService,
    pub reviews: ReviewService,
    pub groups: GroupService,
    pub users: UserService,
}
