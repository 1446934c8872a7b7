//! Winprobe CLI: run Windows Calculator UI scenarios
//!
//! ## Usage
//!
//! ```bash
//! winprobe run --endpoint http://10.0.0.5:4723    # Endpoint without a config file
//! winprobe run -c winprobe.properties -f divide  # Filter scenarios
//! winprobe run --mock --endpoint http://x:4723   # Offline, simulated calculator
//! winprobe list                                  # Show the scenario catalogue
//! winprobe check-config -c winprobe.yaml         # Validate configuration
//! ```

use clap::Parser;
use serde_json::json;
use std::process::ExitCode;
use winprobe::{calculator_suite, ProbeConfig};
use winprobe_cli::{
    logging, resolve_probe_config, Backend, CheckConfigArgs, Cli, CliConfig, CliError, CliResult,
    Commands, ListArgs, LogFormat, OutputFormat, RunArgs, RunOptions, TestRunner, Verbosity,
};

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> CliResult<()> {
    let cli = Cli::parse();
    let config = build_config(&cli);
    logging::init(&config)?;

    match cli.command {
        Commands::Run(args) => run_scenarios(config, &args),
        Commands::List(args) => run_list(&args),
        Commands::CheckConfig(args) => run_check_config(&args),
    }
}

fn build_config(cli: &Cli) -> CliConfig {
    let log_format = if cli.log_json {
        LogFormat::Json
    } else {
        LogFormat::Text
    };
    CliConfig::new()
        .with_verbosity(Verbosity::from_flags(cli.quiet, cli.verbose))
        .with_color(cli.color.into())
        .with_log_format(log_format)
}

fn run_scenarios(config: CliConfig, args: &RunArgs) -> CliResult<()> {
    let probe = resolve_probe_config(&args.source)?;
    let format = OutputFormat::from(args.format);
    let options = RunOptions {
        filter: args.filter.clone(),
        fail_fast: args.fail_fast,
        backend: if args.mock {
            Backend::Mock
        } else {
            Backend::WinAppDriver
        },
        quiet: format == OutputFormat::Json,
    };

    let outcome = TestRunner::new(config).run(&probe, &calculator_suite(), &options)?;
    let results = &outcome.results;

    if format == OutputFormat::Json {
        let summary = results.reporter.run_summary();
        println!("{}", serde_json::to_string_pretty(&summary)?);
    }

    if results.all_passed() {
        return Ok(());
    }
    let message = match &results.session_error {
        Some(reason) => reason.clone(),
        None => format!(
            "{} of {} scenarios did not pass",
            results.failed_count() + results.skipped_count(),
            results.total()
        ),
    };
    Err(CliError::test_execution(message))
}

fn run_list(args: &ListArgs) -> CliResult<()> {
    let suite = calculator_suite();
    let scenarios = suite.select(args.filter.as_deref());

    match OutputFormat::from(args.format) {
        OutputFormat::Json => {
            let listing: Vec<_> = scenarios
                .iter()
                .map(|s| {
                    json!({
                        "priority": s.priority,
                        "name": s.name,
                        "description": s.description,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&listing)?);
        }
        OutputFormat::Text => {
            for s in scenarios {
                println!("{:>3}  {:<20} {}", s.priority, s.name, s.description);
            }
        }
    }
    Ok(())
}

fn run_check_config(args: &CheckConfigArgs) -> CliResult<()> {
    let probe = resolve_probe_config(&args.source)?;
    match OutputFormat::from(args.format) {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&describe(&probe))?),
        OutputFormat::Text => {
            let session = probe.session_config();
            println!("Configuration OK");
            println!("  endpoint:         {}", probe.endpoint);
            println!("  application:      {}", session.app);
            println!("  project:          {}", probe.project_name);
            println!("  element timeout:  {} ms", probe.element_timeout_ms);
            println!("  poll interval:    {} ms", probe.poll_interval_ms);
            println!("  settle timeout:   {} ms", probe.settle_timeout_ms);
            println!("  screenshot dir:   {}", probe.screenshot_dir.display());
            println!("  report dir:       {}", probe.report_dir.display());
            for (name, value) in &probe.capabilities {
                println!("  capability:       {name}={value}");
            }
        }
    }
    Ok(())
}

fn describe(probe: &ProbeConfig) -> serde_json::Value {
    json!({
        "endpoint": probe.endpoint,
        "projectName": probe.project_name,
        "elementTimeoutMs": probe.element_timeout_ms,
        "pollIntervalMs": probe.poll_interval_ms,
        "settleTimeoutMs": probe.settle_timeout_ms,
        "screenshotDir": probe.screenshot_dir,
        "reportDir": probe.report_dir,
        "desiredCapabilities": probe.session_config().capabilities(),
    })
}
