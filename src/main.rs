use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use modloc::error::error_chain;
use modloc::protocol::{self, Cli};

fn init_tracing() {
    let console_layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(console_layer)
        .init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match protocol::handle(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", error_chain(&e));
            ExitCode::FAILURE
        }
    }
}
