use crate::error::ConfigError;
use std::env;
use std::str::FromStr;

/// Runtime configuration for the CloudWatch client.
///
/// Credentials and the default region come from the standard AWS provider
/// chain (environment, shared profiles, SSO, web identity, container and
/// instance roles); these settings only override or tune it.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub region: Option<String>,
    pub profile: Option<String>,
    pub endpoint: Option<String>,
    pub timeout_secs: u64,
    pub max_retries: u32,
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - ECR_LIMITS_REGION (default: resolved by the AWS provider chain)
    /// - ECR_LIMITS_PROFILE (default: AWS_PROFILE or "default")
    /// - ECR_LIMITS_CLOUDWATCH_ENDPOINT (default: the regional CloudWatch endpoint)
    /// - ECR_LIMITS_HTTP_TIMEOUT_SECS (default: 30)
    /// - ECR_LIMITS_MAX_RETRIES (default: 4)
    pub fn from_env() -> Result<Self, ConfigError> {
        let endpoint = env::var("ECR_LIMITS_CLOUDWATCH_ENDPOINT").ok();
        if let Some(ep) = &endpoint {
            url::Url::parse(ep).map_err(|_| ConfigError::InvalidEndpoint(ep.clone()))?;
        }

        Ok(Self {
            region: env::var("ECR_LIMITS_REGION").ok(),
            profile: env::var("ECR_LIMITS_PROFILE").ok(),
            endpoint,
            timeout_secs: parse_number("ECR_LIMITS_HTTP_TIMEOUT_SECS", "u64", 30)?,
            max_retries: parse_number("ECR_LIMITS_MAX_RETRIES", "u32", 4)?,
        })
    }
}

fn parse_number<T: FromStr>(
    var: &'static str,
    ty: &'static str,
    default: T,
) -> Result<T, ConfigError> {
    match env::var(var) {
        Ok(s) => s
            .trim()
            .parse::<T>()
            .map_err(|_| ConfigError::InvalidNumber { var, ty, value: s }),
        Err(_) => Ok(default),
    }
}
