pub mod admin;
pub mod developer;
pub mod event;
pub mod ticket;
pub mod usage_log;
pub mod user;

pub use admin::Admin;
pub use developer::{generate_api_key, Developer, DeveloperTier, API_KEY_PREFIX};
pub use event::Event;
pub use ticket::{Ticket, TicketStatus, TicketWithEvent};
pub use usage_log::{ApiUsageLog, ApiUsageLogWithDeveloper};
pub use user::User;
