pub const CONFIG_DIR_NAME: &str = "detparse";
pub const CONFIG_FILE_NAME: &str = "config.json";

pub const DEFAULT_NETWORK_WIDTH: u32 = 640;
pub const DEFAULT_NETWORK_HEIGHT: u32 = 640;

/// Precluster threshold used when no per-class table is configured.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Environment variable that turns on per-row decode logging.
pub const DEBUG_ENV_VAR: &str = "ENABLE_DEBUG";

/// Frames between progress log lines in the dump pipeline.
pub const PROGRESS_LOG_INTERVAL: usize = 100;
