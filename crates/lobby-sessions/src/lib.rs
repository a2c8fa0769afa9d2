pub mod db;
pub mod error;
pub mod manager;
pub mod types;

pub use db::init_db;
pub use error::SessionError;
pub use manager::SessionManager;
pub use types::{HistoryTurn, PendingSlot, Preference, Qualification, Role, Session, MAX_HISTORY_TURNS};
