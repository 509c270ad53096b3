mod cli;

use anyhow::Context;
use ecr_limits::cloudwatch::CloudWatch;
use ecr_limits::config::Config;
use ecr_limits::ecr::EcrService;
use ecr_limits::limit;
use ecr_limits::service::Service;
use log::{info, warn};
use serde_json::json;

#[tokio::main(flavor = "current_thread")] // usage queries run one after another
async fn main() -> anyhow::Result<()> {
    let cmd = cli::build_cli();
    let matches = cmd.get_matches();
    let log_level = matches.get_one::<String>("log-level").cloned();
    let version_flag = matches.get_flag("version");

    cli::init_logging(log_level.as_deref());

    if version_flag {
        println!("ecr-limits {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }

    let warning = matches.get_one::<u32>("warning-threshold").copied().unwrap_or(80);
    let critical = matches.get_one::<u32>("critical-threshold").copied().unwrap_or(99);

    let cfg = Config::from_env().context("invalid configuration")?;
    let mut svc = EcrService::new(CloudWatch::new(cfg), warning, critical);
    if let Some(overrides) = matches.get_many::<(String, u64)>("limit") {
        for (name, value) in overrides {
            svc.set_limit_override(name, *value)?;
        }
    }

    match matches.subcommand_name() {
        Some("list-limits") => {
            println!("{}", serde_json::to_string_pretty(svc.get_limits())?);
        }
        Some("iam-policy") => {
            println!(
                "{}",
                serde_json::to_string_pretty(&svc.required_iam_permissions())?
            );
        }
        Some("find-usage") => {
            svc.find_usage()
                .await
                .context("failed to collect ECR usage")?;
            let problems = svc.check_thresholds();
            let code = limit::exit_code(problems.values());
            for name in problems.keys() {
                warn!("{} is over its threshold", name);
            }
            let report = json!({
                "service": EcrService::<CloudWatch>::SERVICE_NAME,
                "limits": svc.get_limits(),
                "problems": problems,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
            info!("Usage check finished with exit code {}", code);
            if code != 0 {
                std::process::exit(code);
            }
        }
        _ => {
            cli::build_cli().print_help()?;
        }
    }
    Ok(())
}
