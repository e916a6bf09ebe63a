//! vigil: a batch monitoring agent
//!
//! Each invocation runs one pass over every configuration file named on the
//! command line: poll the items, process the triggers, save the updated
//! state back. Scheduling repeated passes is left to cron or a systemd
//! timer.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use futures::future::join_all;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use vigil_agent::exec::TokioProcessExecutor;
use vigil_agent::mail::SmtpMailTransport;
use vigil_agent::runner::{run_document, Collaborators};

const USAGE: &str = "A configuration file is required as argument.\n\
    See README.md for how the configuration file should look.";

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let wants_help = args.len() == 1 && ["help", "--help", "-h", "-?"].contains(&args[0].as_str());
    if args.is_empty() || wants_help {
        println!("{USAGE}");
        return Ok(());
    }

    let collab = Collaborators {
        executor: Arc::new(TokioProcessExecutor),
        mailer: Arc::new(SmtpMailTransport::gmail()),
    };

    // Configuration files are independent; run them concurrently and let
    // each failure stand on its own.
    let runs = args.iter().map(|arg| {
        let path = PathBuf::from(arg);
        let collab = &collab;
        async move { (arg, run_document(&path, collab).await) }
    });
    let mut failures = 0;
    for (arg, outcome) in join_all(runs).await {
        if let Err(err) = outcome {
            error!(config = %arg, error = %err, "run failed");
            failures += 1;
        }
    }
    if failures > 0 {
        bail!("{failures} of {} configuration runs failed", args.len());
    }
    Ok(())
}
