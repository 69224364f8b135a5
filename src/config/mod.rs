pub mod profiles;

use dotenvy::dotenv;
use profiles::{Profile, ProfileDefaults};
use serde::Deserialize;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server_port: u16,
    pub database_url: String,
    /// Public base URL of the site; callback and return URLs derive from it.
    pub site_base_url: String,
    pub paystack_base_url: String,
    pub paystack_public_key: Option<String>,
    pub paystack_secret_key: Option<String>,
    pub epaymently_base_url: Option<String>,
    pub epaymently_api_key: Option<String>,
    pub epaymently_merchant_id: Option<String>,
    pub cors_allowed_origins: Option<String>,
}

pub struct ConfigInfo {
    pub config: Config,
    pub profile: Profile,
    pub overrides: Vec<String>,
}

impl Config {
    /// Loads configuration from the environment on top of profile defaults.
    /// Provider credentials are optional: a missing key leaves the adapter
    /// constructible but failing its calls with a clear error, rather than
    /// crashing at startup.
    pub fn from_env() -> anyhow::Result<ConfigInfo> {
        dotenv().ok();

        let profile = Profile::from_env();
        let defaults = ProfileDefaults::for_profile(profile);
        let mut overrides = Vec::new();

        let server_port = env::var("SERVER_PORT")
            .ok()
            .and_then(|v| {
                overrides.push("SERVER_PORT".to_string());
                v.parse().ok()
            })
            .unwrap_or(defaults.server_port);

        let database_url = env::var("DATABASE_URL").or_else(|_| {
            defaults
                .database_url
                .ok_or_else(|| anyhow::anyhow!("DATABASE_URL must be set"))
        })?;
        if env::var("DATABASE_URL").is_ok() {
            overrides.push("DATABASE_URL".to_string());
        }

        let site_base_url = env::var("SITE_BASE_URL")
            .ok()
            .map(|v| {
                overrides.push("SITE_BASE_URL".to_string());
                v
            })
            .unwrap_or(defaults.site_base_url);

        let paystack_base_url = env::var("PAYSTACK_BASE_URL")
            .ok()
            .map(|v| {
                overrides.push("PAYSTACK_BASE_URL".to_string());
                v
            })
            .unwrap_or(defaults.paystack_base_url);

        let mut optional = |name: &str| {
            env::var(name).ok().map(|v| {
                overrides.push(name.to_string());
                v
            })
        };

        let paystack_public_key = optional("PAYSTACK_PUBLIC_KEY");
        let paystack_secret_key = optional("PAYSTACK_SECRET_KEY");
        let epaymently_base_url = optional("EPAYMENTLY_BASE_URL");
        let epaymently_api_key = optional("EPAYMENTLY_API_KEY");
        let epaymently_merchant_id = optional("EPAYMENTLY_MERCHANT_ID");

        let cors_allowed_origins = optional("CORS_ALLOWED_ORIGINS")
            .or(defaults.cors_allowed_origins);

        Ok(ConfigInfo {
            config: Config {
                server_port,
                database_url,
                site_base_url,
                paystack_base_url,
                paystack_public_key,
                paystack_secret_key,
                epaymently_base_url,
                epaymently_api_key,
                epaymently_merchant_id,
                cors_allowed_origins,
            },
            profile,
            overrides,
        })
    }
}
