//! Shell completions command

use crate::cli::{Cli, CompletionsArgs};
use clap::CommandFactory;

/// Print completions for the requested shell to stdout.
pub fn handle_completions(args: &CompletionsArgs) {
    let mut cmd = Cli::command();
    clap_complete::generate(args.shell, &mut cmd, "rudder", &mut std::io::stdout());
}
