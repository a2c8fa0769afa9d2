pub mod clock;
pub mod config;
pub mod counters;
pub mod error;
pub mod types;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{LobbyConfig, TenantConfig};
pub use counters::{Counters, RecoveryContext};
pub use error::LobbyError;
pub use types::{Channel, ConvId, ConvKey, TenantId};
