//! Application state shared across handlers and middleware.

use crate::auth::token::TokenService;
use crate::services::email::EmailService;
use noteloft_core::Config;
use noteloft_db::{
    MembershipRepository, ResourceRepository, TenantRepository, TokenRepository, UserRepository,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Config,
    pub tenants: TenantRepository,
    pub users: UserRepository,
    pub memberships: MembershipRepository,
    pub resources: ResourceRepository,
    pub tokens: TokenService,
    pub email: Option<EmailService>,
}

impl AppState {
    pub fn new(config: Config, pool: PgPool) -> Self {
        let tokens = TokenService::new(&config, TokenRepository::new(pool.clone()));
        let email = EmailService::from_config(&config);
        Self {
            tenants: TenantRepository::new(pool.clone()),
            users: UserRepository::new(pool.clone()),
            memberships: MembershipRepository::new(pool.clone()),
            resources: ResourceRepository::new(pool.clone()),
            tokens,
            email,
            pool,
            config,
        }
    }
}

fn _assert_app_state_send_sync() {
    fn assert_send<T: Send>() {}
    fn assert_sync<T: Sync>() {}
    assert_send::<AppState>();
    assert_sync::<AppState>();
}
