use std::env;

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_PORT: u16 = 3001;

// Sepolia, where the ticket contract is deployed
const DEFAULT_CHAIN_ID: u64 = 11_155_111;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub jwt_secret: String,
    pub chain: ChainConfig,
}

#[derive(Clone)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    pub private_key: String,
    pub chain_id: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "postgres://localhost/mintgate".to_string()),
            port: env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_PORT),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            chain: ChainConfig::from_env(),
        }
    }
}

impl ChainConfig {
    pub fn from_env() -> Self {
        Self {
            rpc_url: env::var("SEPOLIA_RPC_URL").expect("SEPOLIA_RPC_URL must be set"),
            contract_address: env::var("CONTRACT_ADDRESS").expect("CONTRACT_ADDRESS must be set"),
            private_key: env::var("PRIVATE_KEY").expect("PRIVATE_KEY must be set"),
            chain_id: env::var("CHAIN_ID")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_CHAIN_ID),
        }
    }
}
