use crate::error::{LimitError, MetricsError};
use crate::limit::{Limit, ThresholdCheck};
use std::collections::BTreeMap;

/// Contract shared by every checked AWS service.
///
/// Implementors own their limit catalog and supply `find_usage`; overrides
/// and threshold checks are provided on top of `limits_mut`.
#[allow(async_fn_in_trait)]
pub trait Service {
    /// Display name, e.g. "ECR".
    const SERVICE_NAME: &'static str;
    /// AWS API name of the service.
    const API_NAME: &'static str;
    /// Service code in the Service Quotas API.
    const QUOTAS_SERVICE_CODE: &'static str;

    fn warning_threshold(&self) -> u32;

    fn critical_threshold(&self) -> u32;

    /// All known limits, keyed by name. Built on first use and cached.
    fn get_limits(&mut self) -> &BTreeMap<String, Limit>;

    fn limits_mut(&mut self) -> &mut BTreeMap<String, Limit>;

    /// Refresh the usage of every limit.
    async fn find_usage(&mut self) -> Result<(), MetricsError>;

    /// Whether a usage pass has completed.
    fn have_usage(&self) -> bool;

    fn required_iam_permissions(&self) -> Vec<&'static str>;

    fn set_limit_override(&mut self, name: &str, value: u64) -> Result<(), LimitError> {
        self.limit_mut(name)?.set_limit_override(value);
        Ok(())
    }

    fn set_threshold_override(
        &mut self,
        name: &str,
        warning: u32,
        critical: u32,
    ) -> Result<(), LimitError> {
        self.limit_mut(name)?.set_threshold_override(warning, critical);
        Ok(())
    }

    fn limit_mut(&mut self, name: &str) -> Result<&mut Limit, LimitError> {
        self.limits_mut()
            .get_mut(name)
            .ok_or_else(|| LimitError::Unknown {
                service: Self::SERVICE_NAME.to_string(),
                name: name.to_string(),
            })
    }

    /// Limits whose current usage crosses a threshold.
    fn check_thresholds(&mut self) -> BTreeMap<String, ThresholdCheck> {
        self.get_limits()
            .iter()
            .map(|(name, limit)| (name.clone(), limit.check_thresholds()))
            .filter(|(_, check)| !check.is_ok())
            .collect()
    }
}
