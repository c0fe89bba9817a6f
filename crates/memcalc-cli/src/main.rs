use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use memcalc_config::{
    init_tracing, json_schema, load_for_app_dir_with_diagnostics, ByteSize, ConfigDiagnostics,
    LoggingConfig, MemcalcConfig, DIAGNOSTICS_TARGET,
};
use memcalc_jre::{calculate, Calculation};
use memcalc_memory::{detect_memory_limit, format_byte_size, parse_byte_size, MemoryLimit};
use serde::Serialize;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(
    name = "memcalc",
    version,
    about = "Size JVM memory regions to fit a memory limit and print the matching flags",
    args_conflicts_with_subcommands = true
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[command(flatten)]
    calculate: CalculateArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Print the JSON schema for `memcalc.toml`
    Schema,
    /// Load and validate the configuration without calculating
    CheckConfig(ConfigArgs),
}

#[derive(Args)]
struct ConfigArgs {
    /// Config file to load instead of discovering one in the app directory
    #[arg(long)]
    config: Option<PathBuf>,
    /// Application directory searched for `memcalc.toml`
    #[arg(long, default_value = ".")]
    app_dir: PathBuf,
    /// Emit JSON suitable for CI
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct CalculateArgs {
    #[command(flatten)]
    config: ConfigArgs,
    /// Total memory for the JVM, e.g. `1G` (defaults to $MEMORY_LIMIT, the cgroup limit or the
    /// host memory)
    #[arg(long, value_name = "SIZE")]
    total_memory: Option<String>,
    /// Java runtime version, e.g. `1.7.0_80` or `17.0.2`
    #[arg(long, value_name = "VERSION")]
    jre_version: Option<String>,
    /// Region weight as a percentage of the total memory (repeatable)
    #[arg(long = "weight", value_name = "REGION=WEIGHT")]
    weights: Vec<String>,
    /// Region size range such as `permgen=64m..` (repeatable)
    #[arg(long = "size", value_name = "REGION=RANGE")]
    sizes: Vec<String>,
    /// Per-thread stack size for `-Xss`
    #[arg(long, value_name = "SIZE")]
    thread_stack_size: Option<String>,
    /// Append the calculation report to this file
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,
}

/// Split a `REGION=VALUE` declaration.
fn parse_assignment(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow!("expected REGION=VALUE, got `{raw}`"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow!("missing region name in `{raw}`"));
    }
    Ok((name, value.trim()))
}

impl CalculateArgs {
    /// Layer command-line values over the loaded config.
    fn apply_to(&self, config: &mut MemcalcConfig) -> Result<()> {
        if let Some(raw) = &self.total_memory {
            let bytes = parse_byte_size(raw).context("invalid --total-memory")?;
            config.total_memory = Some(ByteSize(bytes));
        }
        if let Some(version) = &self.jre_version {
            config.jre_version = Some(version.clone());
        }
        for raw in &self.weights {
            let (name, value) = parse_assignment(raw).context("invalid --weight")?;
            let weight = value
                .parse::<i64>()
                .with_context(|| format!("invalid --weight for region `{name}`: `{value}`"))?;
            config.weights.insert(name.to_string(), weight);
        }
        for raw in &self.sizes {
            let (name, range) = parse_assignment(raw).context("invalid --size")?;
            config.sizes.insert(name.to_string(), range.to_string());
        }
        if let Some(raw) = &self.thread_stack_size {
            let bytes = parse_byte_size(raw).context("invalid --thread-stack-size")?;
            config.thread_stack_size = ByteSize(bytes);
        }
        if let Some(path) = &self.log_file {
            config.logging.file = Some(path.clone());
        }
        Ok(())
    }
}

fn main() {
    let cli = Cli::parse();
    let exit_code = match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    };

    std::process::exit(exit_code);
}

fn run(cli: Cli) -> Result<i32> {
    match cli.command {
        Some(Command::Schema) => {
            print_json(&json_schema())?;
            Ok(0)
        }
        Some(Command::CheckConfig(args)) => check_config(&args),
        None => run_calculation(&cli.calculate),
    }
}

fn load_config(args: &ConfigArgs) -> Result<(MemcalcConfig, Option<PathBuf>, ConfigDiagnostics)> {
    match &args.config {
        Some(path) => {
            let (config, diagnostics) = MemcalcConfig::load_from_path_with_diagnostics(path)?;
            Ok((config, Some(path.clone()), diagnostics))
        }
        None => Ok(load_for_app_dir_with_diagnostics(&args.app_dir)?),
    }
}

fn run_calculation(args: &CalculateArgs) -> Result<i32> {
    let loaded = load_config(&args.config);

    // A config that fails to load still gets its error into the `--log-file` sink.
    let mut logging = loaded
        .as_ref()
        .map(|(config, ..)| config.logging.clone())
        .unwrap_or_else(|_| LoggingConfig::default());
    if let Some(path) = &args.log_file {
        logging.file = Some(path.clone());
    }
    init_tracing(&logging);

    match loaded.and_then(|loaded| calculate_with(args, loaded)) {
        Ok(code) => Ok(code),
        Err(err) => {
            tracing::error!(target: DIAGNOSTICS_TARGET, "{err:#}");
            if !logging.stderr {
                eprintln!("{err:#}");
            }
            Ok(1)
        }
    }
}

fn calculate_with(
    args: &CalculateArgs,
    (mut config, config_path, loaded): (MemcalcConfig, Option<PathBuf>, ConfigDiagnostics),
) -> Result<i32> {
    args.apply_to(&mut config)?;

    if let Some(path) = &config_path {
        tracing::debug!(target: "memcalc.cli", path = %path.display(), "loaded configuration");
    }
    for key in &loaded.unknown_keys {
        tracing::warn!(target: "memcalc.cli", key = %key, "unknown configuration key");
    }

    // Validate again: command-line overrides may have fixed or introduced problems.
    let validation = config.validate();
    for warning in &validation.warnings {
        tracing::warn!(target: "memcalc.cli", "{warning}");
    }
    if !validation.is_ok() {
        for error in &validation.errors {
            tracing::error!(target: DIAGNOSTICS_TARGET, "invalid configuration: {error}");
        }
        return Ok(1);
    }

    let limit = detect_memory_limit(config.total_memory.map(|size| size.0))?;
    let calculation = calculate(limit.bytes, &config.calculator_settings())?;
    report_calculation(&limit, &calculation);
    if args.config.json {
        print_json(&CalculationReport {
            memory_limit: limit,
            calculation: &calculation,
        })?;
    } else {
        println!("{}", calculation.options);
    }
    Ok(0)
}

fn report_calculation(limit: &MemoryLimit, calculation: &Calculation) {
    tracing::info!(
        target: DIAGNOSTICS_TARGET,
        "calculated JVM memory settings: {}",
        calculation.options
    );
    tracing::info!(
        target: DIAGNOSTICS_TARGET,
        "total memory: {} ({:?}), headroom: {}",
        format_byte_size(limit.bytes),
        limit.source,
        format_byte_size(calculation.plan.headroom_bytes())
    );
    for line in calculation.plan.summary_lines() {
        tracing::info!(target: DIAGNOSTICS_TARGET, "  {line}");
    }
}

#[derive(Serialize)]
struct CalculationReport<'a> {
    memory_limit: MemoryLimit,
    #[serde(flatten)]
    calculation: &'a Calculation,
}

#[derive(Serialize)]
struct CheckConfigReport<'a> {
    path: Option<&'a Path>,
    unknown_keys: &'a [String],
    warnings: Vec<String>,
    errors: Vec<String>,
}

fn check_config(args: &ConfigArgs) -> Result<i32> {
    let (config, path, diagnostics) = load_config(args)?;
    init_tracing(&config.logging);

    let report = CheckConfigReport {
        path: path.as_deref(),
        unknown_keys: &diagnostics.unknown_keys,
        warnings: diagnostics.warnings.iter().map(ToString::to_string).collect(),
        errors: diagnostics.errors.iter().map(ToString::to_string).collect(),
    };

    if args.json {
        print_json(&report)?;
    } else {
        match report.path {
            Some(path) => println!("config: {}", path.display()),
            None => println!("config: none found, using defaults"),
        }
        for key in report.unknown_keys {
            println!("unknown key: {key}");
        }
        for warning in &report.warnings {
            println!("warning: {warning}");
        }
        for error in &report.errors {
            println!("error: {error}");
        }
        println!(
            "summary: {} errors, {} warnings",
            report.errors.len(),
            report.warnings.len()
        );
    }

    Ok(if diagnostics.is_ok() { 0 } else { 1 })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value)?;
    println!("{out}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn assignments_split_on_the_first_equals_sign() {
        assert_eq!(
            parse_assignment("permgen = 64m..").unwrap(),
            ("permgen", "64m..")
        );
        assert!(parse_assignment("heap").is_err());
        assert!(parse_assignment("=75").is_err());
    }

    #[test]
    fn command_line_values_override_the_config() {
        let cli = Cli::try_parse_from([
            "memcalc",
            "--total-memory",
            "1G",
            "--jre-version",
            "1.7.0",
            "--weight",
            "heap=60",
            "--size",
            "permgen=64m..",
            "--thread-stack-size",
            "256k",
        ])
        .unwrap();

        let mut config = MemcalcConfig::default();
        config.weights.insert("heap".to_string(), 75);
        cli.calculate.apply_to(&mut config).unwrap();

        assert_eq!(config.total_memory, Some(ByteSize(memcalc_memory::GB)));
        assert_eq!(config.jre_version(), "1.7.0");
        assert_eq!(config.weights["heap"], 60);
        assert_eq!(config.sizes["permgen"], "64m..");
        assert_eq!(config.thread_stack_size, ByteSize(256 * memcalc_memory::KB));
    }

    #[test]
    fn malformed_weight_is_rejected() {
        let cli = Cli::try_parse_from(["memcalc", "--weight", "heap=lots"]).unwrap();
        let mut config = MemcalcConfig::default();
        assert!(cli.calculate.apply_to(&mut config).is_err());
    }

    #[test]
    fn declarations_without_a_value_fail_after_parsing() {
        let cli = Cli::try_parse_from(["memcalc", "--weight", "heap", "--size", "permgen"]).unwrap();
        let mut config = MemcalcConfig::default();
        let err = cli.calculate.apply_to(&mut config).unwrap_err();
        assert_eq!(
            format!("{err:#}"),
            "invalid --weight: expected REGION=VALUE, got `heap`"
        );
    }
}
