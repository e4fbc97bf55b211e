use doorsign_config::Settings;
use doorsign_services::{
    AuthService, QuotaGuard,
    dao::{
        invite::InviteDao, notification::NotificationDao, org::OrgDao, presence::PresenceDao,
        user::UserDao,
    },
};
use mongodb::Database;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: Database,
    pub settings: Settings,
    pub auth: Arc<AuthService>,
    pub users: Arc<UserDao>,
    pub orgs: Arc<OrgDao>,
    pub invites: Arc<InviteDao>,
    pub presence: Arc<PresenceDao>,
    pub notifications: Arc<NotificationDao>,
    pub quota: Arc<QuotaGuard>,
}

impl AppState {
    pub fn new(db: Database, settings: Settings) -> Self {
        let auth = Arc::new(AuthService::new(settings.jwt.clone()));
        let users = Arc::new(UserDao::new(&db));
        let orgs = Arc::new(OrgDao::new(&db, settings.invite.code_retry_max));
        let invites = Arc::new(InviteDao::new(&db, settings.invite.code_retry_max));
        let presence = Arc::new(PresenceDao::new(&db));
        let notifications = Arc::new(NotificationDao::new(&db, settings.notification.ttl_hours));
        let quota = Arc::new(QuotaGuard::new(&db, settings.quota.clone()));

        Self {
            db,
            settings,
            auth,
            users,
            orgs,
            invites,
            presence,
            notifications,
            quota,
        }
    }
}
