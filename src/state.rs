use std::sync::Arc;

use crate::auth::directory::UserDirectory;
use crate::auth::identity::IdentityProvider;
use crate::config::AppConfig;
use crate::database::Database;
use crate::email::Mailer;

/// Shared by every handler; cheap to clone
#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub identity: Arc<dyn IdentityProvider>,
    pub directory: Arc<dyn UserDirectory>,
    pub mailer: Arc<dyn Mailer>,
    pub config: Arc<AppConfig>,
}
