use serde::Serialize;

/// One observed usage value for a limit.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct UsageRecord {
    pub value: f64,
    pub resource_id: Option<String>,
    pub aws_type: String,
}

/// Usage records of one limit that crossed its thresholds.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct ThresholdCheck {
    pub warnings: Vec<UsageRecord>,
    pub criticals: Vec<UsageRecord>,
}

impl ThresholdCheck {
    pub fn is_ok(&self) -> bool {
        self.warnings.is_empty() && self.criticals.is_empty()
    }
}

/// Process exit code for a threshold report: 2 if any limit is critical,
/// 1 if any is at warning level, 0 otherwise.
pub fn exit_code<'a>(problems: impl IntoIterator<Item = &'a ThresholdCheck>) -> i32 {
    problems.into_iter().fold(0, |code, check| {
        if !check.criticals.is_empty() {
            2
        } else if !check.warnings.is_empty() {
            code.max(1)
        } else {
            code
        }
    })
}

/// A named service quota with its default ceiling, thresholds, and the usage
/// observed by the last usage pass.
#[derive(Debug, Clone, Serialize)]
pub struct Limit {
    name: String,
    service_name: &'static str,
    default_limit: u64,
    def_warning_threshold: u32,
    def_critical_threshold: u32,
    limit_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    limit_override: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    threshold_override: Option<(u32, u32)>,
    usage: Vec<UsageRecord>,
}

impl Limit {
    pub fn new(
        name: impl Into<String>,
        service_name: &'static str,
        default_limit: u64,
        def_warning_threshold: u32,
        def_critical_threshold: u32,
        limit_type: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            service_name,
            default_limit,
            def_warning_threshold,
            def_critical_threshold,
            limit_type: limit_type.into(),
            limit_override: None,
            threshold_override: None,
            usage: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn service_name(&self) -> &'static str {
        self.service_name
    }

    pub fn default_limit(&self) -> u64 {
        self.default_limit
    }

    pub fn def_warning_threshold(&self) -> u32 {
        self.def_warning_threshold
    }

    pub fn def_critical_threshold(&self) -> u32 {
        self.def_critical_threshold
    }

    pub fn limit_type(&self) -> &str {
        &self.limit_type
    }

    /// Effective limit: the override when one is set, else the default.
    pub fn get_limit(&self) -> u64 {
        self.limit_override.unwrap_or(self.default_limit)
    }

    pub fn set_limit_override(&mut self, value: u64) {
        self.limit_override = Some(value);
    }

    pub fn set_threshold_override(&mut self, warning: u32, critical: u32) {
        self.threshold_override = Some((warning, critical));
    }

    /// Effective (warning, critical) percentages.
    pub fn thresholds(&self) -> (u32, u32) {
        self.threshold_override
            .unwrap_or((self.def_warning_threshold, self.def_critical_threshold))
    }

    pub fn reset_usage(&mut self) {
        self.usage.clear();
    }

    pub fn add_current_usage(
        &mut self,
        value: f64,
        resource_id: Option<String>,
        aws_type: impl Into<String>,
    ) {
        self.usage.push(UsageRecord {
            value,
            resource_id,
            aws_type: aws_type.into(),
        });
    }

    pub fn get_current_usage(&self) -> &[UsageRecord] {
        &self.usage
    }

    pub fn check_thresholds(&self) -> ThresholdCheck {
        let mut check = ThresholdCheck::default();
        let limit = self.get_limit();
        if limit == 0 {
            return check;
        }
        let (warning, critical) = self.thresholds();
        for usage in &self.usage {
            let pct = usage.value / limit as f64 * 100.0;
            if pct >= f64::from(critical) {
                check.criticals.push(usage.clone());
            } else if pct >= f64::from(warning) {
                check.warnings.push(usage.clone());
            }
        }
        check
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn limit() -> Limit {
        Limit::new("Rate of PutImage requests", "ECR", 600, 80, 99, "AWS::ECR::Repository")
    }

    #[test]
    fn override_replaces_default() {
        let mut l = limit();
        assert_eq!(l.get_limit(), 600);
        l.set_limit_override(1200);
        assert_eq!(l.get_limit(), 1200);
        assert_eq!(l.default_limit(), 600);
    }

    #[test]
    fn reset_clears_usage() {
        let mut l = limit();
        l.add_current_usage(5.0, None, "AWS::ECR::Repository");
        assert_eq!(l.get_current_usage().len(), 1);
        l.reset_usage();
        assert!(l.get_current_usage().is_empty());
    }

    #[test]
    fn thresholds_classify_usage() {
        let mut l = limit();
        l.add_current_usage(100.0, None, "AWS::ECR::Repository");
        assert!(l.check_thresholds().is_ok());

        l.add_current_usage(480.0, None, "AWS::ECR::Repository");
        l.add_current_usage(594.0, Some("repo".into()), "AWS::ECR::Repository");
        let check = l.check_thresholds();
        assert_eq!(check.warnings.len(), 1);
        assert_eq!(check.warnings[0].value, 480.0);
        assert_eq!(check.criticals.len(), 1);
        assert_eq!(check.criticals[0].resource_id.as_deref(), Some("repo"));
    }

    #[test]
    fn threshold_override_applies() {
        let mut l = limit();
        l.add_current_usage(300.0, None, "AWS::ECR::Repository");
        assert!(l.check_thresholds().is_ok());
        l.set_threshold_override(40, 50);
        assert_eq!(l.check_thresholds().criticals.len(), 1);
    }

    #[test]
    fn zero_limit_is_never_flagged() {
        let mut l = limit();
        l.set_limit_override(0);
        l.add_current_usage(10.0, None, "AWS::ECR::Repository");
        assert!(l.check_thresholds().is_ok());
    }

    #[test]
    fn exit_code_reflects_worst_problem() {
        let record = UsageRecord {
            value: 500.0,
            resource_id: None,
            aws_type: "AWS::ECR::Repository".into(),
        };
        let warning = ThresholdCheck {
            warnings: vec![record.clone()],
            criticals: vec![],
        };
        let critical = ThresholdCheck {
            warnings: vec![],
            criticals: vec![record],
        };
        assert_eq!(exit_code(&[]), 0);
        assert_eq!(exit_code(&[ThresholdCheck::default()]), 0);
        assert_eq!(exit_code(&[warning.clone()]), 1);
        assert_eq!(exit_code(&[critical.clone(), warning.clone()]), 2);
        assert_eq!(exit_code(&[warning, critical]), 2);
    }
}
