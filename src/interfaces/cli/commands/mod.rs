mod admin;
mod config_management;

pub use admin::{run_create_admin, run_reset_password};
pub use config_management::config_generate;
