// diff
/// per-file cap; admits normal diffs, rejects generated or binary-like blobs
pub const MAX_FILE_DIFF_CHARS: usize = 20_000 * 26;
pub const TOO_LARGE_MARKER: &str = "TOO LARGE TO SHOW";
pub const RENAME_THRESHOLD: u16 = 50;

// runner
pub const DISPLAY_LIMIT_CHARS: usize = 2_000;

// model
pub const MAX_RESPONSE_TOKENS: u32 = 1000;
pub const MODEL_TIMEOUT_SECS: u64 = 300;

// config
pub const CONFIG_DIR: &str = ".config/diffweave";
pub const CONFIG_FILE: &str = "config.yaml";

// browser login
pub const TOKEN_CACHE_FILE: &str = ".databricks/token-cache.json";
