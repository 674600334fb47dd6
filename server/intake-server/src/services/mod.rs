pub mod config_cache;
pub mod form_config;

pub use config_cache::{Clock, ConfigCache, ManualClock, SystemClock};
pub use form_config::{FormConfig, FormConfigService, Mutation};
