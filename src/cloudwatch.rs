//! Metrics backend used by services to read current usage.
//!
//! [`MetricsBackend`] is the seam services depend on; [`CloudWatch`] is the
//! production implementation, calling `GetMetricData` against the
//! `AWS/Usage` namespace through the AWS SDK.

use crate::config::Config;
use crate::error::MetricsError;
use crate::types::{Dimension, Statistic};
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use aws_config::{BehaviorVersion, Region};
use aws_credential_types::provider::ProvideCredentials;
use aws_sdk_cloudwatch::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_cloudwatch::operation::get_metric_data::GetMetricDataOutput;
use aws_sdk_cloudwatch::primitives::DateTime;
use aws_sdk_cloudwatch::types::{
    Dimension as CwDimension, Metric, MetricDataQuery, MetricStat, ScanBy,
};
use aws_sdk_cloudwatch::Client;
use log::{debug, info};
use std::time::Duration;

pub const USAGE_NAMESPACE: &str = "AWS/Usage";
const PERIOD_SECS: i32 = 60;
const LOOKBACK_SECS: i64 = 3600;

/// A source of usage statistics.
///
/// `connect` must succeed before `latest_statistic` is called. It may be
/// called more than once; later calls reuse the established connection.
#[allow(async_fn_in_trait)]
pub trait MetricsBackend {
    async fn connect(&mut self) -> Result<(), MetricsError>;

    /// Latest value of `stat` for `metric_name` filtered by `dimensions`.
    /// Returns 0 when the metric has no datapoints in the lookback window.
    async fn latest_statistic(
        &self,
        dimensions: &[Dimension],
        metric_name: &str,
        stat: Statistic,
    ) -> Result<f64, MetricsError>;
}

fn format_dimensions(dimensions: &[Dimension]) -> String {
    let mut parts: Vec<String> = dimensions
        .iter()
        .map(|d| format!("{}={}", d.name, d.value))
        .collect();
    parts.sort();
    parts.join(", ")
}

fn usage_query(
    dimensions: &[Dimension],
    metric_name: &str,
    stat: Statistic,
) -> Result<MetricDataQuery, MetricsError> {
    let mut metric = Metric::builder()
        .namespace(USAGE_NAMESPACE)
        .metric_name(metric_name);
    for d in dimensions {
        let dimension = CwDimension::builder()
            .name(&d.name)
            .value(&d.value)
            .build();
        metric = metric.dimensions(dimension);
    }
    let metric_stat = MetricStat::builder()
        .metric(metric.build())
        .period(PERIOD_SECS)
        .stat(stat.as_str())
        .build();
    Ok(MetricDataQuery::builder()
        .id("id")
        .metric_stat(metric_stat)
        .return_data(true)
        .build())
}

/// Most recent datapoint of the first result, if any.
fn latest_value(output: &GetMetricDataOutput) -> Option<f64> {
    output
        .metric_data_results()
        .first()
        .and_then(|r| r.values().first())
        .copied()
}

pub struct CloudWatch {
    cfg: Config,
    client: Option<Client>,
}

impl CloudWatch {
    pub fn new(cfg: Config) -> Self {
        Self { cfg, client: None }
    }

    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }
}

impl MetricsBackend for CloudWatch {
    async fn connect(&mut self) -> Result<(), MetricsError> {
        if self.client.is_some() {
            return Ok(());
        }

        // max_retries counts retries; the SDK counts attempts
        let retry =
            RetryConfig::standard().with_max_attempts(self.cfg.max_retries.saturating_add(1));
        let timeout = TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(self.cfg.timeout_secs))
            .build();
        let mut loader = aws_config::defaults(BehaviorVersion::latest())
            .retry_config(retry)
            .timeout_config(timeout);
        if let Some(region) = &self.cfg.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(profile) = &self.cfg.profile {
            loader = loader.profile_name(profile);
        }
        if let Some(endpoint) = &self.cfg.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk = loader.load().await;

        // Resolve credentials now so a missing chain fails the pass before any query.
        let provider = sdk
            .credentials_provider()
            .ok_or(MetricsError::MissingCredentials)?;
        provider
            .provide_credentials()
            .await
            .map_err(MetricsError::Credentials)?;
        let region = sdk.region().ok_or(MetricsError::MissingRegion)?;

        info!(
            "Connected to CloudWatch in {} ({})",
            region,
            self.cfg.endpoint.as_deref().unwrap_or("default endpoint")
        );
        self.client = Some(Client::new(&sdk));
        Ok(())
    }

    async fn latest_statistic(
        &self,
        dimensions: &[Dimension],
        metric_name: &str,
        stat: Statistic,
    ) -> Result<f64, MetricsError> {
        let client = self.client.as_ref().ok_or(MetricsError::NotConnected)?;
        let query = usage_query(dimensions, metric_name, stat)?;

        let end_time = chrono::Utc::now().timestamp();
        let output = client
            .get_metric_data()
            .metric_data_queries(query)
            .start_time(DateTime::from_secs(end_time - LOOKBACK_SECS))
            .end_time(DateTime::from_secs(end_time))
            .scan_by(ScanBy::TimestampDescending)
            .max_datapoints(1)
            .send()
            .await
            .map_err(|err| MetricsError::Query {
                code: err.code().map(str::to_owned),
                message: DisplayErrorContext(&err).to_string(),
            })?;

        match latest_value(&output) {
            Some(value) => {
                debug!(
                    "CloudWatch {} {} with dims [{}] = {}",
                    metric_name,
                    stat.as_str(),
                    format_dimensions(dimensions),
                    value
                );
                Ok(value)
            }
            None => {
                debug!(
                    "No data for CloudWatch {} metric with dims: [{}]",
                    metric_name,
                    format_dimensions(dimensions)
                );
                Ok(0.0)
            }
        }
    }
}
