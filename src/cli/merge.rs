//! Automerge command - merge head into base across the organization

use crate::cli::{CliProgress, OutputMode};
use crate::cli::context::CommandContext;
use crate::cli::style::{Stylize, check, spinner_style};
use anstream::println;
use dialoguer::Confirm;
use indicatif::ProgressBar;
use org_automerge::error::{Error, Result};
use org_automerge::merge::{
    AutoMergePlan, AutoMergeRequest, MergeOptions, auto_merge, plan_auto_merge,
};
use org_automerge::types::PhaseResult;
use std::io::Write;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Options for the automerge command
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    /// Dry run - show what would be merged without making changes
    pub dry_run: bool,
    /// Preview plan and prompt for confirmation before executing
    pub confirm: bool,
    /// Print each phase result as one JSON line instead of text reports
    pub json: bool,
}

/// Run the automerge command
pub async fn run_automerge(
    ctx: &CommandContext,
    request: &AutoMergeRequest,
    options: RunOptions,
    cancel: CancellationToken,
) -> Result<()> {
    let merge_options = MergeOptions {
        cancel: Some(cancel),
        ..ctx.config.merge_options()
    };

    if options.dry_run || options.confirm {
        let plan = gather_plan(ctx, request, &merge_options, options.json).await?;

        if options.dry_run {
            if options.json {
                print_json(&plan)?;
            } else {
                report_dry_run(&plan);
                println!("{}", "Run without --dry-run to execute.".muted());
            }
            return Ok(());
        }

        report_dry_run(&plan);
        if !Confirm::new()
            .with_prompt("Proceed with merge?")
            .default(true)
            .interact()
            .map_err(|e| Error::Internal(format!("Failed to read confirmation: {e}")))?
        {
            println!("{}", "Aborted".muted());
            return Ok(());
        }
        println!();
    }

    let mode = if options.json {
        OutputMode::Json
    } else {
        OutputMode::Text
    };
    let progress = CliProgress::stdout(mode);

    let results = execute(ctx, request, &merge_options, &progress).await?;
    if !options.json {
        print_summary(&results);
    }

    Ok(())
}

/// Run the merge phases, reporting each one as it completes
///
/// A cancelled phase is reported with what it finished before the error is
/// returned; earlier phases were already reported by `progress`.
pub(crate) async fn execute<W: Write + Send>(
    ctx: &CommandContext,
    request: &AutoMergeRequest,
    merge_options: &MergeOptions,
    progress: &CliProgress<W>,
) -> Result<Vec<PhaseResult>> {
    match auto_merge(request, ctx.service.as_ref(), merge_options, progress).await {
        Err(Error::Cancelled {
            base,
            head,
            partial,
        }) => {
            progress.report_phase(&partial, true);
            Err(Error::Cancelled {
                base,
                head,
                partial,
            })
        }
        other => other,
    }
}

/// List repositories and build the dry-run plan behind a spinner
async fn gather_plan(
    ctx: &CommandContext,
    request: &AutoMergeRequest,
    merge_options: &MergeOptions,
    quiet: bool,
) -> Result<AutoMergePlan> {
    let spinner = if quiet {
        ProgressBar::hidden()
    } else {
        ProgressBar::new_spinner()
    };
    spinner.set_style(spinner_style());
    spinner.set_message(format!(
        "Listing repositories in {}...",
        ctx.config.organization.emphasis()
    ));
    spinner.enable_steady_tick(Duration::from_millis(80));

    let plan = plan_auto_merge(request, ctx.service.as_ref(), merge_options).await;

    match &plan {
        Ok(plan) => spinner.finish_with_message(format!(
            "{} Found {} repositories to merge",
            check(),
            plan.candidates.len()
        )),
        Err(_) => spinner.finish_and_clear(),
    }
    plan
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|e| Error::Internal(format!("Failed to serialize results: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Report what would be merged (dry run)
fn report_dry_run(plan: &AutoMergePlan) {
    println!("{}:", "Merge plan".emphasis());
    println!();
    println!(
        "  {} {} ==>> {}",
        "Phase 1:".emphasis(),
        plan.head.accent(),
        plan.base.accent()
    );
    for repo in &plan.candidates {
        if plan.denied.contains(&repo.name) {
            println!(
                "    {} {} ({})",
                "✗ Would fail".warn(),
                repo.name,
                format!("permission {}", repo.permission).muted()
            );
        } else {
            println!("    {} {}", "✓ Would merge".success(), repo.name);
        }
    }

    if let Some(ref release) = plan.current_release {
        println!();
        println!(
            "  {} {} ==>> {}",
            "Phase 2:".emphasis(),
            plan.base.accent(),
            release.accent()
        );
        if plan.release_candidates.is_empty() {
            println!("    {}", "No repositories to cascade".muted());
        }
        for repo in &plan.release_candidates {
            println!("    {} {}", "✓ Would merge".success(), repo.name);
        }
        println!(
            "    {}",
            "(assumes every permitted phase 1 merge succeeds)".muted()
        );
    }

    println!();
}

/// Print a one-line summary per phase
fn print_summary(results: &[PhaseResult]) {
    for result in results {
        let line = format!(
            "{} ==>> {}: {} succeeded, {} unprocessed, {} failed",
            result.head,
            result.base,
            result.succeeded.len(),
            result.unprocessed.len(),
            result.failed.len()
        );
        if result.has_failures() {
            println!("{} {}", "⚠".warn(), line);
        } else {
            println!("{} {}", check(), line);
        }
    }
}
