use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser, Debug)]
#[command(name = "probe", version, about = "Exercise every operation of an OpenAPI/Swagger spec")]
struct Cli {
    /// Config file (.toml, .yaml or .yml). Falls back to $PROBE_CONFIG.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Call every operation of a spec and print the records as JSON.
    Run {
        /// Spec URL or file path.
        spec: String,

        #[command(flatten)]
        options: commands::RunOptions,

        /// Also print a method/url/status table to stderr.
        #[arg(long, default_value_t = false)]
        summary: bool,
    },

    /// Print the planned calls without sending anything.
    Plan {
        /// Spec URL or file path.
        spec: String,

        #[command(flatten)]
        options: commands::RunOptions,
    },

    /// Start the HTTP server.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Listen address, e.g. 127.0.0.1:9000. Overrides config and $PORT.
    #[arg(long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.config.as_deref();

    match cli.cmd {
        Command::Run {
            spec,
            options,
            summary,
        } => commands::run::run(&spec, config, &options, summary).await?,
        Command::Plan { spec, options } => commands::plan::run(&spec, config, &options).await?,
        Command::Serve(args) => commands::serve::run(config, args.bind.as_deref()).await?,
    }

    Ok(())
}
