//! Subcommand dispatch and execution.
//!
//! The [`dispatch`] function routes the parsed CLI to the appropriate
//! subcommand handler: [`run`], [`init`], [`validate`], [`check`], or
//! [`health`]. Each handler lives in its own submodule.

pub mod check;
pub mod health;
pub mod init;
pub mod run;
pub mod validate;

use crate::cli::{Cli, Commands};
use crate::error::HostgateError;

pub async fn dispatch(cli: Cli) -> Result<(), HostgateError> {
    match cli.command {
        Some(Commands::Run(args)) => run::execute(*args).await,
        Some(Commands::Init(ref args)) => init::execute(args),
        Some(Commands::Validate(ref args)) => validate::execute(args),
        Some(Commands::Check(ref args)) => check::execute(args),
        Some(Commands::Health(args)) => health::execute(args).await,
        None => {
            print_welcome();
            Ok(())
        }
    }
}

fn print_welcome() {
    let version = env!("CARGO_PKG_VERSION");
    println!(
        "\n  hostgate v{version} \u{2014} canonical-host and HTTPS redirect gatekeeper\n\n  \
         No command provided. To get started:\n\n    \
         hostgate init                     Generate a starter config\n    \
         hostgate run                      Start the gate (auto-detects ./hostgate.yaml)\n    \
         hostgate check --host evil.net    Dry-run the decision engine\n    \
         hostgate --help                   See all commands and options\n"
    );
}
