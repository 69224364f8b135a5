use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    pub dependencies: HashMap<String, DependencyStatus>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DependencyStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[async_trait]
pub trait DependencyChecker: Send + Sync {
    async fn check(&self) -> DependencyStatus;
    fn name(&self) -> &'static str;
}

pub struct PostgresChecker {
    pool: sqlx::PgPool,
}

impl PostgresChecker {
    pub fn new(pool: sqlx::PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DependencyChecker for PostgresChecker {
    async fn check(&self) -> DependencyStatus {
        let start = Instant::now();
        match sqlx::query("SELECT 1").execute(&self.pool).await {
            Ok(_) => DependencyStatus {
                status: "healthy".to_string(),
                latency_ms: Some(start.elapsed().as_millis() as u64),
                error: None,
            },
            Err(e) => DependencyStatus {
                status: "unhealthy".to_string(),
                latency_ms: None,
                error: Some(e.to_string()),
            },
        }
    }

    fn name(&self) -> &'static str {
        "postgres"
    }
}

/// Reports whether a payment provider has credentials configured. No
/// network call is made; an unconfigured provider degrades its own calls
/// to errors, and this checker makes that visible.
pub struct ProviderConfigChecker {
    name: &'static str,
    configured: bool,
}

impl ProviderConfigChecker {
    pub fn new(name: &'static str, configured: bool) -> Self {
        Self { name, configured }
    }
}

#[async_trait]
impl DependencyChecker for ProviderConfigChecker {
    async fn check(&self) -> DependencyStatus {
        if self.configured {
            DependencyStatus {
                status: "healthy".to_string(),
                latency_ms: None,
                error: None,
            }
        } else {
            DependencyStatus {
                status: "unconfigured".to_string(),
                latency_ms: None,
                error: Some("missing provider credentials".to_string()),
            }
        }
    }

    fn name(&self) -> &'static str {
        self.name
    }
}

pub struct HealthChecker {
    checkers: Vec<Box<dyn DependencyChecker>>,
    start_time: Instant,
}

impl HealthChecker {
    pub fn new() -> Self {
        Self {
            checkers: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn add_checker(mut self, checker: Box<dyn DependencyChecker>) -> Self {
        self.checkers.push(checker);
        self
    }

    pub async fn check_all(&self) -> HealthResponse {
        let check_timeout = Duration::from_secs(5);
        let mut futures = Vec::new();

        for checker in &self.checkers {
            let name = checker.name().to_string();
            let future = timeout(check_timeout, checker.check());
            futures.push(async move {
                match future.await {
                    Ok(status) => (name, status),
                    Err(_) => (
                        name,
                        DependencyStatus {
                            status: "unhealthy".to_string(),
                            latency_ms: None,
                            error: Some("timeout".to_string()),
                        },
                    ),
                }
            });
        }

        let results = futures::future::join_all(futures).await;
        let mut dependencies = HashMap::new();
        let mut healthy_count = 0;
        let mut total_count = 0;

        for (name, status) in results {
            if status.status == "healthy" {
                healthy_count += 1;
            }
            total_count += 1;
            dependencies.insert(name, status);
        }

        let overall_status = if healthy_count == total_count {
            "healthy"
        } else if healthy_count > 0 {
            "degraded"
        } else {
            "unhealthy"
        };

        HealthResponse {
            status: overall_status.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: self.start_time.elapsed().as_secs(),
            dependencies,
        }
    }
}

impl Default for HealthChecker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unconfigured_provider_degrades_overall_status() {
        let checker = HealthChecker::new()
            .add_checker(Box::new(ProviderConfigChecker::new("paystack", true)))
            .add_checker(Box::new(ProviderConfigChecker::new("epaymently", false)));

        let response = checker.check_all().await;
        assert_eq!(response.status, "degraded");
        assert_eq!(
            response.dependencies["epaymently"].status,
            "unconfigured"
        );
    }

    #[tokio::test]
    async fn test_all_configured_is_healthy() {
        let checker = HealthChecker::new()
            .add_checker(Box::new(ProviderConfigChecker::new("paystack", true)));

        let response = checker.check_all().await;
        assert_eq!(response.status, "healthy");
        assert!(response.dependencies["paystack"].error.is_none());
    }
}
