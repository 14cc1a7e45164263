use config::Config;
use serde::Deserialize;
use tracing::warn;

pub const DEFAULT_BASE_URL: &str = "https://old.nasdaq.com";
pub const LAST_PAGE_ID: &str = "quotes_content_left_lb_LastPage";
pub const TABLE_CONTAINER_CLASS: &str = "OptionsChain-chart borderAll thin";
pub const OUTPUT_TIMESTAMP_FMT: &str = "%Y-%m-%dT%H-%M-%S-%6f";
pub const DEFAULT_BATCH_SIZE: usize = 100;

const ENV_PREFIX: &str = "OPTIONS_SCRAPER";

/// Settings that can be overridden from the environment (`OPTIONS_SCRAPER_*`).
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

impl Settings {
    pub fn load() -> Self {
        let built = Config::builder()
            .add_source(config::Environment::with_prefix(ENV_PREFIX))
            .build()
            .and_then(|c| c.try_deserialize::<Settings>());

        match built {
            Ok(mut s) => {
                s.base_url = s.base_url.trim_end_matches('/').to_string();
                s
            }
            Err(e) => {
                warn!("Ignoring unreadable {}_* settings: {}", ENV_PREFIX, e);
                Settings::default()
            }
        }
    }
}
