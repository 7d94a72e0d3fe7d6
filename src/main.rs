mod app;
mod daemon;
mod error;
mod escape;
mod host_ipc;
mod trigger;

use std::{
    io::{self, Write},
    path::PathBuf,
};

use clap::{Args, Parser, Subcommand};
use escape::CustomEscape;
use trigger::{Trigger, CREATE_WINDOW, SHARED_SECRET};

#[derive(Parser)]
#[command(name = "esc-trigger")]
#[command(about = "Open a terminal window when a custom escape sequence arrives")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Listen for the trigger sequence until the host exits (default)
    Listen(ListenArgs),
    /// Print the trigger escape sequence to stdout
    Emit(TriggerArgs),
}

#[derive(Args, Default)]
struct ListenArgs {
    /// Host socket [default: <cache dir>/esc-trigger/host.sock]
    #[arg(long)]
    socket: Option<PathBuf>,
    #[command(flatten)]
    trigger: TriggerArgs,
}

#[derive(Args)]
struct TriggerArgs {
    /// Sender identity (shared secret) to accept
    #[arg(long, default_value = SHARED_SECRET)]
    identity: String,
    /// Payload that triggers window creation
    #[arg(long, default_value = CREATE_WINDOW)]
    payload: String,
}

impl Default for TriggerArgs {
    fn default() -> Self {
        Self {
            identity: SHARED_SECRET.to_string(),
            payload: CREATE_WINDOW.to_string(),
        }
    }
}

impl From<TriggerArgs> for Trigger {
    fn from(args: TriggerArgs) -> Self {
        Self {
            identity: args.identity,
            payload: args.payload,
        }
    }
}

fn emit(args: &TriggerArgs) -> error::Result<()> {
    let sequence = CustomEscape::new(&args.identity, &args.payload)?;
    let mut stdout = io::stdout().lock();
    write!(stdout, "{sequence}")?;
    stdout.flush()?;
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Commands::Listen(ListenArgs::default()));

    // Emit writes raw bytes to stdout; only the listener logs
    if matches!(command, Commands::Listen(_)) {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("esc_trigger=info")),
            )
            .with_writer(io::stderr)
            .with_target(false)
            .init();
    }

    let result = match command {
        Commands::Listen(args) => {
            let socket = args.socket.unwrap_or_else(host_ipc::socket_path);
            daemon::run(&socket, args.trigger.into()).await
        }
        Commands::Emit(args) => emit(&args),
    };

    if let Err(e) = result {
        if e.is_closed() {
            tracing::info!("Host shut down");
        }
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
