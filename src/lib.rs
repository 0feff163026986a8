pub mod auth;
pub mod config;
pub mod db;
pub mod handlers;
pub mod models;
pub mod reconcile;
pub mod routes;
pub mod state;
pub mod utils;
pub mod web3;
