pub mod account;
pub mod config;
pub mod error;
pub mod testing;

pub use account::{NewSuperuser, PasswordPolicy, ProvisionError, SuperuserRequest, SuperuserStore};
pub use config::PortalConfig;
pub use error::{PortalError, Result};
