//! CLI mode
//!
//! 管理员维护与配置生成，委托给 `interfaces::cli`。

use crate::cli::Commands;
use crate::interfaces::cli::CliError;

pub async fn run_cli(cmd: Commands) -> Result<(), CliError> {
    crate::interfaces::cli::run_cli_command(cmd).await
}
