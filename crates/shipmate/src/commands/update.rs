//! Update command.

use anyhow::Result;
use clap::Args;
use shipmate_config::ExecutionMode;
use shipmate_core::{Orchestrator, RemoteConnector, RunReport};

use super::Global;

/// Arguments for the update command.
#[derive(Debug, Args)]
pub struct UpdateArgs {
    /// Show what would be done without changing anything
    #[arg(long)]
    pub dry_run: bool,
}

/// Runs the update command.
pub fn run(global: &Global, args: &UpdateArgs) -> Result<()> {
    let mut ctx = global.context()?;
    let token = ctx.require_token()?.clone();
    let mode = ExecutionMode::from_dry_run(args.dry_run);

    let provider = ctx.provider()?;
    let connector = RemoteConnector::new(&ctx.config, &token)?;
    let report = Orchestrator::new(&ctx.config, provider.as_ref(), ctx.root.clone())
        .mode(mode)
        .connector(&connector)
        .run()?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RunReport) {
    println!("Current version: {}", report.decision.current);
    if report.decision.has_next {
        println!("Next version:    {} ({})", report.decision.next, report.decision.bump);
    }
    println!("Result:          {}", report.state);

    let mut changes = report.changes().peekable();
    if changes.peek().is_some() {
        println!();
        for outcome in changes {
            println!("  {outcome}");
        }
    }

    for warning in &report.warnings {
        println!("warning: {warning}");
    }
}
