use std::io;
use std::path::PathBuf;
use std::pin::pin;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use futures::TryStreamExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use resolve::config::SystemConfig;
use resolve::input::NameSource;
use resolve::output::RowWriter;
use resolve::{QueryEngine, StubResolver, resolve_all};

#[derive(Parser)]
#[command(name = "resolve")]
#[command(about = "Resolve a list of DNS names to IP(v4/v6) addresses", long_about = None)]
struct Args {
    /// DNS name to resolve
    #[arg(value_name = "host_name")]
    host: Option<String>,

    /// File with DNS names that need to be resolved
    #[arg(long = "in", value_name = "input")]
    in_path: Option<PathBuf>,

    /// Output file path (defaults to stdout)
    #[arg(long = "out", value_name = "output")]
    out_path: Option<PathBuf>,

    /// Seconds to wait for one nameserver to answer
    #[arg(long)]
    timeout: Option<f64>,

    /// Seconds allowed for one query across all attempts
    #[arg(long)]
    lifetime: Option<f64>,

    /// Nameserver port
    #[arg(long)]
    port: Option<u16>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .without_time()
        .init();
}

async fn run(args: Args, source: NameSource) -> anyhow::Result<()> {
    let system = SystemConfig::load().context("loading local resolver configuration")?;

    let mut options = system.options;
    if let Some(secs) = args.timeout {
        options.timeout = Duration::try_from_secs_f64(secs).context("invalid --timeout")?;
    }
    if let Some(secs) = args.lifetime {
        options.lifetime = Duration::try_from_secs_f64(secs).context("invalid --lifetime")?;
    }
    if let Some(port) = args.port {
        options.port = port;
    }

    let mut engine = QueryEngine::with_public_resolvers(StubResolver::new(options), system.local);
    debug!("resolvers {engine}");

    let mut writer = RowWriter::create(args.out_path.as_deref()).context("creating output file")?;

    let names = source.names().context("opening input names")?;
    for name in names {
        let name = name.context("reading input names")?;
        let mut rows = pin!(resolve_all(&mut engine, &name));

        while let Some(row) = rows.try_next().await? {
            writer.write_row(&row)?;
        }
    }

    debug!(rows = writer.rows(), "done");
    Ok(())
}

fn main() -> anyhow::Result<ExitCode> {
    let mut args = Args::parse();
    init_tracing(args.verbose);

    let Some(source) = NameSource::select(args.host.take(), args.in_path.take()) else {
        Args::command().print_help()?;
        return Ok(ExitCode::from(1));
    };

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    rt.block_on(run(args, source))?;

    Ok(ExitCode::SUCCESS)
}
