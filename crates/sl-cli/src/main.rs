//! `slgeo`: ingest service line inventories, geocode them, export the map feed

use anyhow::Context;
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use sl_pipeline::{CancellationToken, Pipeline, PipelineConfig, PipelineError, SourceFormat};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Exit status for an interrupted run
const EXIT_CANCELLED: i32 = 130;

fn cli() -> Command {
    Command::new("slgeo")
        .version(sl_pipeline::VERSION)
        .about("Service line inventory ingestion and geocoding")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("config")
                .long("config")
                .global(true)
                .env("SLGEO_CONFIG")
                .value_parser(value_parser!(PathBuf))
                .help("TOML configuration file"),
        )
        .arg(
            Arg::new("store")
                .long("store")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Canonical record store (default data/markers.json)"),
        )
        .arg(
            Arg::new("feed")
                .long("feed")
                .global(true)
                .value_parser(value_parser!(PathBuf))
                .help("Presentation feed copy (default public/data/markers.json)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Emit logs as JSON lines"),
        )
        .subcommand(
            Command::new("ingest")
                .about("Extract, validate and merge records from a source file")
                .arg(
                    Arg::new("source")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Decoded inventory text or CSV file"),
                )
                .arg(
                    Arg::new("format")
                        .long("format")
                        .value_parser(["text", "csv"])
                        .help("Source format (detected from the extension by default)"),
                ),
        )
        .subcommand(
            Command::new("geocode")
                .about("Resolve coordinates for every unresolved record")
                .arg(
                    Arg::new("delay-ms")
                        .long("delay-ms")
                        .value_parser(value_parser!(u64))
                        .help("Pause after every resolver call"),
                )
                .arg(
                    Arg::new("batch-size")
                        .long("batch-size")
                        .value_parser(value_parser!(usize))
                        .help("Records per checkpoint"),
                ),
        )
        .subcommand(
            Command::new("export-geojson")
                .about("Write positioned records as a GeoJSON FeatureCollection")
                .arg(
                    Arg::new("out")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Output file"),
                ),
        )
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// Config file and environment, then command-line overrides
fn load_config(
    matches: &ArgMatches,
    command: &ArgMatches,
) -> Result<PipelineConfig, PipelineError> {
    let config_path = matches.get_one::<PathBuf>("config").map(PathBuf::as_path);
    let mut config = PipelineConfig::load(config_path)?;

    if let Some(store) = matches.get_one::<PathBuf>("store") {
        config = config.with_store_path(store.clone());
    }
    if let Some(feed) = matches.get_one::<PathBuf>("feed") {
        config = config.with_feed_path(Some(feed.clone()));
    }
    if let Ok(Some(delay)) = command.try_get_one::<u64>("delay-ms") {
        config = config.with_delay_ms(*delay);
    }
    if let Ok(Some(size)) = command.try_get_one::<usize>("batch-size") {
        config = config.with_batch_size(*size);
    }
    Ok(config)
}

/// Flip `token` on the first Ctrl-C; work in progress stops at the next record
fn watch_interrupt(token: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("interrupt received, finishing current record");
            token.cancel();
        }
    });
}

async fn run(matches: ArgMatches) -> anyhow::Result<i32> {
    let Some((name, command)) = matches.subcommand() else {
        return Ok(0);
    };

    let config = load_config(&matches, command)?;
    let token = CancellationToken::new();
    watch_interrupt(token.clone());
    let pipeline = Pipeline::new(config)?.with_cancellation(token);

    match name {
        "ingest" => {
            let source = command
                .get_one::<PathBuf>("source")
                .context("missing source argument")?;
            let format = command
                .get_one::<String>("format")
                .map(|f| f.parse::<SourceFormat>())
                .transpose()?;
            let report = pipeline.ingest(source, format)?;
            println!("{report}");
            Ok(0)
        }
        "geocode" => {
            let report = pipeline.geocode().await?;
            println!("{report}");
            Ok(if report.cancelled { EXIT_CANCELLED } else { 0 })
        }
        "export-geojson" => {
            let out = command
                .get_one::<PathBuf>("out")
                .context("missing output argument")?;
            let features = pipeline.export_geojson(out)?;
            println!("Exported {features} features to {}", out.display());
            Ok(0)
        }
        other => anyhow::bail!("unknown command '{other}'"),
    }
}

#[tokio::main]
async fn main() {
    let matches = cli().get_matches();
    init_tracing(matches.get_flag("json"));

    let code = match run(matches).await {
        Ok(code) => code,
        Err(err) => {
            tracing::error!(error = %format!("{err:#}"), "slgeo failed");
            eprintln!("error: {err:#}");
            err.downcast_ref::<PipelineError>()
                .map_or(1, PipelineError::exit_code)
        }
    };
    std::process::exit(code);
}
