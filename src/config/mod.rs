mod settings;

pub use settings::{
    ApiConfig, BatchConfig, FailurePolicy, Settings, CLOUDFLARE_API_BASE, DEFAULT_CONFIG_FILE,
};
