//! ECR API rate quotas, with usage read from the `AWS/Usage` CallCount metrics.

use crate::cloudwatch::MetricsBackend;
use crate::error::MetricsError;
use crate::limit::Limit;
use crate::service::Service;
use crate::types::{Dimension, Statistic};
use log::debug;
use std::collections::BTreeMap;

const LIMIT_TYPE: &str = "AWS::ECR::Repository";

struct RateQuota {
    name: &'static str,
    operation: &'static str,
    per_second: u64,
}

const RATE_QUOTAS: [RateQuota; 8] = [
    RateQuota {
        name: "Rate of BatchCheckLayerAvailability requests",
        operation: "BatchCheckLayerAvailability",
        per_second: 200,
    },
    RateQuota {
        name: "Rate of BatchGetImage requests",
        operation: "BatchGetImage",
        per_second: 2000,
    },
    RateQuota {
        name: "Rate of CompleteLayerUpload requests",
        operation: "CompleteLayerUpload",
        per_second: 10,
    },
    RateQuota {
        name: "Rate of GetAuthorizationToken requests",
        operation: "GetAuthorizationToken",
        per_second: 500,
    },
    RateQuota {
        name: "Rate of GetDownloadUrlForLayer requests",
        operation: "GetDownloadUrlForLayer",
        per_second: 3000,
    },
    RateQuota {
        name: "Rate of InitiateLayerUpload requests",
        operation: "InitiateLayerUpload",
        per_second: 10,
    },
    RateQuota {
        name: "Rate of PutImage requests",
        operation: "PutImage",
        per_second: 10,
    },
    RateQuota {
        name: "Rate of UploadLayerPart requests",
        operation: "UploadLayerPart",
        per_second: 260,
    },
];

fn call_count_dimensions(operation: &str) -> Vec<Dimension> {
    vec![
        Dimension::new("Type", "API"),
        Dimension::new("Resource", operation),
        Dimension::new("Service", "ECR"),
        Dimension::new("Class", "None"),
    ]
}

pub struct EcrService<B> {
    backend: B,
    warning_threshold: u32,
    critical_threshold: u32,
    limits: BTreeMap<String, Limit>,
    have_usage: bool,
}

impl<B: MetricsBackend> EcrService<B> {
    pub fn new(backend: B, warning_threshold: u32, critical_threshold: u32) -> Self {
        let mut svc = Self {
            backend,
            warning_threshold,
            critical_threshold,
            limits: BTreeMap::new(),
            have_usage: false,
        };
        svc.get_limits();
        svc
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Drop the cached catalog; the next access rebuilds it from defaults.
    pub fn clear_limits(&mut self) {
        self.limits.clear();
    }

    fn build_limits(&self) -> BTreeMap<String, Limit> {
        RATE_QUOTAS
            .iter()
            .map(|q| {
                let limit = Limit::new(
                    q.name,
                    Self::SERVICE_NAME,
                    q.per_second * 60,
                    self.warning_threshold,
                    self.critical_threshold,
                    LIMIT_TYPE,
                );
                (q.name.to_string(), limit)
            })
            .collect()
    }
}

impl<B: MetricsBackend> Service for EcrService<B> {
    const SERVICE_NAME: &'static str = "ECR";
    const API_NAME: &'static str = "ecr";
    const QUOTAS_SERVICE_CODE: &'static str = "ecr";

    fn warning_threshold(&self) -> u32 {
        self.warning_threshold
    }

    fn critical_threshold(&self) -> u32 {
        self.critical_threshold
    }

    fn get_limits(&mut self) -> &BTreeMap<String, Limit> {
        if self.limits.is_empty() {
            self.limits = self.build_limits();
        }
        &self.limits
    }

    fn limits_mut(&mut self) -> &mut BTreeMap<String, Limit> {
        self.get_limits();
        &mut self.limits
    }

    async fn find_usage(&mut self) -> Result<(), MetricsError> {
        debug!("Checking usage for service {}", Self::SERVICE_NAME);
        self.backend.connect().await?;
        for limit in self.limits_mut().values_mut() {
            limit.reset_usage();
        }
        for quota in &RATE_QUOTAS {
            let value = self
                .backend
                .latest_statistic(
                    &call_count_dimensions(quota.operation),
                    "CallCount",
                    Statistic::Sum,
                )
                .await?;
            if let Some(limit) = self.limits.get_mut(quota.name) {
                limit.add_current_usage(value, None, LIMIT_TYPE);
            }
        }
        self.have_usage = true;
        debug!("Done checking usage.");
        Ok(())
    }

    fn have_usage(&self) -> bool {
        self.have_usage
    }

    fn required_iam_permissions(&self) -> Vec<&'static str> {
        vec!["cloudwatch:GetMetricData"]
    }
}
