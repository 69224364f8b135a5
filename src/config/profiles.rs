use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Profile {
    Development,
    Staging,
    Production,
}

impl Profile {
    pub fn from_env() -> Self {
        std::env::var("APP_PROFILE")
            .ok()
            .and_then(|s| match s.to_lowercase().as_str() {
                "development" | "dev" => Some(Self::Development),
                "staging" | "stage" => Some(Self::Staging),
                "production" | "prod" => Some(Self::Production),
                _ => None,
            })
            .unwrap_or(Self::Development)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfileDefaults {
    pub server_port: u16,
    pub database_url: Option<String>,
    pub site_base_url: String,
    pub paystack_base_url: String,
    pub cors_allowed_origins: Option<String>,
}

impl ProfileDefaults {
    pub fn for_profile(profile: Profile) -> Self {
        match profile {
            Profile::Development => Self {
                server_port: 3000,
                database_url: None,
                site_base_url: "http://localhost:3000".to_string(),
                paystack_base_url: "https://api.paystack.co".to_string(),
                cors_allowed_origins: None,
            },
            Profile::Staging => Self {
                server_port: 8080,
                database_url: None,
                site_base_url: "https://staging.donate.example.org".to_string(),
                paystack_base_url: "https://api.paystack.co".to_string(),
                cors_allowed_origins: Some("https://staging.donate.example.org".to_string()),
            },
            Profile::Production => Self {
                server_port: 8080,
                database_url: None,
                site_base_url: "https://donate.example.org".to_string(),
                paystack_base_url: "https://api.paystack.co".to_string(),
                cors_allowed_origins: Some("https://donate.example.org".to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_development_defaults() {
        let defaults = ProfileDefaults::for_profile(Profile::Development);
        assert_eq!(defaults.server_port, 3000);
        assert!(defaults.database_url.is_none());
        assert_eq!(defaults.paystack_base_url, "https://api.paystack.co");
    }

    #[test]
    fn test_production_locks_down_cors() {
        let defaults = ProfileDefaults::for_profile(Profile::Production);
        assert!(defaults.cors_allowed_origins.is_some());
    }
}
