mod analyzer;
mod config;
mod error;

use analyzer::report::ReportGenerator;
use anyhow::Result;
use clap::{Arg, Command};
use config::Config;
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout carries only the report
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let matches = Command::new("dapp-analyzer")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Fetches contract, transaction and user data for a dApp and prints a JSON report")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Path to configuration file"),
        )
        .arg(
            Arg::new("contract")
                .long("contract")
                .value_name("ID")
                .help("Contract identifier to analyze"),
        )
        .arg(
            Arg::new("node-url")
                .short('n')
                .long("node-url")
                .value_name("URL")
                .help("Node base URL"),
        )
        .arg(
            Arg::new("explorer-url")
                .long("explorer-url")
                .value_name("URL")
                .help("Block explorer API URL"),
        )
        .arg(
            Arg::new("timeout")
                .long("timeout")
                .value_name("SECS")
                .value_parser(clap::value_parser!(u64).range(1..))
                .help("Request timeout in seconds"),
        )
        .arg(
            Arg::new("concurrent")
                .long("concurrent")
                .help("Issue the node and explorer requests concurrently")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("pretty")
                .long("pretty")
                .help("Pretty-print the JSON report")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("generate-config")
                .long("generate-config")
                .help("Generate a sample configuration file and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            Arg::new("config-path")
                .long("config-path")
                .help("Print the default configuration file path and exit")
                .action(clap::ArgAction::SetTrue),
        )
        .get_matches();

    if matches.get_flag("generate-config") {
        println!("{}", Config::generate_sample());
        return Ok(());
    }

    if matches.get_flag("config-path") {
        match Config::default_config_path() {
            Ok(path) => {
                println!("{}", path.display());
                return Ok(());
            }
            Err(e) => {
                error!("Could not determine default config path: {}", e);
                return Err(e);
            }
        }
    }

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str());
    let mut config = Config::load_or_default(config_path).await;

    // Command line arguments win over file and environment
    if let Some(contract) = matches.get_one::<String>("contract") {
        config.contract = contract.clone();
    }
    if let Some(node_url) = matches.get_one::<String>("node-url") {
        config.node_url = node_url.clone();
    }
    if let Some(explorer_url) = matches.get_one::<String>("explorer-url") {
        config.explorer.api_url = explorer_url.clone();
    }
    if let Some(timeout) = matches.get_one::<u64>("timeout") {
        config.http.timeout_secs = *timeout;
    }
    if matches.get_flag("concurrent") {
        config.report.concurrent = true;
    }
    if matches.get_flag("pretty") {
        config.report.pretty = true;
    }

    let mut generator =
        ReportGenerator::new(&config.contract, &config.node_url, config.client_config())?;

    info!("Analyzing contract {}", generator.contract());
    info!("Node: {}", config.node_url);

    let analysis = if config.report.concurrent {
        generator.analyze_all_concurrently().await
    } else {
        generator.analyze_all().await
    };

    if let Err(e) = analysis {
        error!("Analysis failed: {}", e);
        return Err(e.into());
    }

    let report = if config.report.pretty {
        generator.generate_report_pretty()?
    } else {
        generator.generate_report()?
    };
    println!("{}", report);

    Ok(())
}
