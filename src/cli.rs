use clap::{value_parser, Arg, ArgAction, Command};

pub fn build_cli() -> Command {
    Command::new("ecr-limits")
        .about("Check ECR service quotas against CloudWatch usage metrics")
        .disable_version_flag(true)
        .arg(
            Arg::new("log-level")
                .long("log-level")
                .num_args(1)
                .global(true)
                .help("Override RUST_LOG level (e.g., info, debug)"),
        )
        .arg(
            Arg::new("version")
                .long("version")
                .help("Print version and exit")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("warning-threshold")
                .short('W')
                .long("warning-threshold")
                .value_parser(value_parser!(u32))
                .default_value("80")
                .global(true)
                .help("Default warning threshold, percent of the limit"),
        )
        .arg(
            Arg::new("critical-threshold")
                .short('C')
                .long("critical-threshold")
                .value_parser(value_parser!(u32))
                .default_value("99")
                .global(true)
                .help("Default critical threshold, percent of the limit"),
        )
        .arg(
            Arg::new("limit")
                .short('L')
                .long("limit")
                .action(ArgAction::Append)
                .value_parser(parse_limit_override)
                .global(true)
                .help("Override a limit value, as NAME=VALUE (repeatable)"),
        )
        .subcommand(Command::new("list-limits").about("Print the known limits and their values"))
        .subcommand(
            Command::new("find-usage")
                .about("Collect current usage and report limits over their thresholds"),
        )
        .subcommand(Command::new("iam-policy").about("Print the required IAM permissions"))
}

fn parse_limit_override(raw: &str) -> Result<(String, u64), String> {
    let (name, value) = raw
        .rsplit_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got {:?}", raw))?;
    let value = value
        .trim()
        .parse::<u64>()
        .map_err(|_| format!("limit value must be a non-negative integer, got {:?}", value))?;
    Ok((name.trim().to_string(), value))
}

pub fn init_logging(level: Option<&str>) {
    // Respect explicit level, else default to info, allow env override via RUST_LOG
    if let Some(lvl) = level {
        std::env::set_var("RUST_LOG", lvl);
    } else if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();
}
