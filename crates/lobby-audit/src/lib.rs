pub mod db;
pub mod error;
pub mod sink;
pub mod types;

pub use db::init_db;
pub use error::AuditError;
pub use sink::AuditSink;
pub use types::EventRecord;
