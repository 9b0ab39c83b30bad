mod r#impl;
mod structs;

pub use r#impl::{DEFAULT_CONFIG_PATH, get_config, init_config, init_config_from, update_config};
pub use structs::*;

/// ts-rs 生成的 TypeScript 类型输出文件（相对 `TS_RS_EXPORT_DIR`）
pub const TS_EXPORT_PATH: &str = "surveyhub.generated.ts";
