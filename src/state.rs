use std::sync::Arc;

use sqlx::PgPool;

use crate::config::Config;
use crate::web3::TicketChain;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub chain: Arc<dyn TicketChain>,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(pool: PgPool, chain: Arc<dyn TicketChain>, config: Config) -> Self {
        Self {
            pool,
            chain,
            config: Arc::new(config),
        }
    }
}
