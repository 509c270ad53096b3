use aws_credential_types::provider::error::CredentialsError;
use thiserror::Error;

/// Failures while connecting to or querying the metrics backend.
#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("missing AWS credentials: no credentials provider is configured")]
    MissingCredentials,

    #[error("failed to load AWS credentials")]
    Credentials(#[source] CredentialsError),

    #[error("no AWS region configured (set AWS_REGION or ECR_LIMITS_REGION)")]
    MissingRegion,

    #[error("metrics backend queried before connect()")]
    NotConnected,

    #[error("invalid metric query")]
    Build(#[from] aws_sdk_cloudwatch::error::BuildError),

    #[error("GetMetricData failed: {message}")]
    Query {
        code: Option<String>,
        message: String,
    },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum LimitError {
    #[error("{service} has no limit named {name:?}")]
    Unknown { service: String, name: String },
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a non-negative integer that fits in {ty}, got {value:?}")]
    InvalidNumber {
        var: &'static str,
        ty: &'static str,
        value: String,
    },

    #[error("invalid CloudWatch endpoint {0:?}")]
    InvalidEndpoint(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_error_message_includes_detail() {
        let err = MetricsError::Query {
            code: Some("InvalidParameterValue".into()),
            message: "InvalidParameterValue: bad dimension".into(),
        };
        assert_eq!(
            err.to_string(),
            "GetMetricData failed: InvalidParameterValue: bad dimension"
        );
    }
}
