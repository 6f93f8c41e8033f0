//! Telegram host integration: init data and the session derived from it

pub mod init_data;
pub mod session;

pub use init_data::InitData;
pub use session::{AccessDenied, HostSession, IdentityOverrides, check_access};
