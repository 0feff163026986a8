//! Query layer over the Postgres pool. One module per table, runtime-checked
//! queries throughout.

pub mod admins;
pub mod developers;
pub mod events;
pub mod tickets;
pub mod usage_logs;
pub mod users;
