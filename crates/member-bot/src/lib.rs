//! Telegram membership bot.
//!
//! Receives Telegram webhook updates, routes each message to exactly one
//! command handler (or the fallback chain), and exposes an admin API for
//! scanning member cards and adjusting points.

pub mod api;
pub mod commands;
pub mod config;
pub mod context;
pub mod delivery;
pub mod error;
pub mod members;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use api::{create_router, create_router_with_rate_limit, AppState, RateLimitState};
pub use commands::{
    CommandExtension, CommandHandler, CommandRegistry, CommandSet, Dispatcher,
    UnknownCommandObserver,
};
pub use config::Config;
pub use context::{AppContext, Extensions};
pub use delivery::{Delivery, DeliveryReceipt};
pub use error::{AppError, AppResult, DeliveryError};
pub use members::MemberDirectory;
