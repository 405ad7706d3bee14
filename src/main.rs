//! automerge - merge one branch into another across a GitHub organization

mod cli;

use anstream::eprintln;
use clap::Parser;
use cli::{CommandContext, RunOptions, run_automerge};
use org_automerge::config::ConfigOverrides;
use org_automerge::merge::AutoMergeRequest;
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing::warn;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "automerge")]
#[command(about = "Auto-merge branches across every repository of a GitHub organization")]
#[command(version)]
struct Cli {
    /// Base branch for the merge (e.g. master)
    base_branch: String,

    /// Branch to be merged into the base (e.g. REL-2910)
    head_branch: String,

    /// Afterwards, merge the base branch into this current release branch
    #[arg(long = "current-rel-branch", alias = "current_rel_branch")]
    current_rel_branch: Option<String>,

    /// GitHub access token (overrides the config file)
    #[arg(long)]
    token: Option<String>,

    /// GitHub organization to merge across (overrides the config file)
    #[arg(long)]
    org: Option<String>,

    /// Config file to use instead of ./automerge.toml
    #[arg(long = "config", alias = "config_path")]
    config: Option<PathBuf>,

    /// Merge attempts in flight per phase
    #[arg(long)]
    concurrency: Option<usize>,

    /// Show what would be merged without merging anything
    #[arg(long)]
    dry_run: bool,

    /// Preview the plan and ask for confirmation before merging
    #[arg(long, conflicts_with_all = ["dry_run", "json"])]
    confirm: bool,

    /// Print each phase result as a line of JSON
    #[arg(long)]
    json: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "org_automerge=debug,automerge=debug"
    } else {
        "org_automerge=info,automerge=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Exit status after a second Ctrl-C (128 + SIGINT)
const INTERRUPTED_EXIT_CODE: i32 = 130;

/// Cancel on the first interrupt, then wait for a second one.
///
/// The first interrupt stops attempts that have not started; finished
/// merges stay. Returns `true` once a second interrupt arrives, `false` if
/// interrupts cannot be received.
async fn watch_interrupts<F, Fut>(mut next_interrupt: F, cancel: CancellationToken) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = io::Result<()>>,
{
    if next_interrupt().await.is_err() {
        return false;
    }
    warn!("interrupted, waiting for merges in flight (press Ctrl-C again to exit)");
    cancel.cancel();

    next_interrupt().await.is_ok()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if watch_interrupts(tokio::signal::ctrl_c, on_interrupt).await {
            eprintln!("error: interrupted again, exiting");
            std::process::exit(INTERRUPTED_EXIT_CODE);
        }
    });

    let overrides = ConfigOverrides {
        token: cli.token,
        organization: cli.org,
        concurrency: cli.concurrency,
    };

    let ctx = match CommandContext::new(cli.config.as_deref(), overrides) {
        Ok(ctx) => ctx,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut request = AutoMergeRequest::new(cli.base_branch, cli.head_branch);
    if let Some(release) = cli.current_rel_branch {
        request = request.with_current_release(release);
    }

    let options = RunOptions {
        dry_run: cli.dry_run,
        confirm: cli.confirm,
        json: cli.json,
    };

    match run_automerge(&ctx, &request, options, cancel).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::future::ready;

    type Interrupt = std::future::Ready<io::Result<()>>;

    fn interrupts(results: Vec<io::Result<()>>) -> impl FnMut() -> Interrupt {
        let mut results = VecDeque::from(results);
        move || ready(results.pop_front().unwrap_or_else(|| Ok(())))
    }

    #[tokio::test]
    async fn test_second_interrupt_requests_exit() {
        let cancel = CancellationToken::new();

        let exit = watch_interrupts(interrupts(vec![Ok(()), Ok(())]), cancel.clone()).await;

        assert!(exit);
        assert!(cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_interrupts_unavailable_never_cancel() {
        let cancel = CancellationToken::new();
        let unavailable = io::Error::other("no signal handler");

        let exit = watch_interrupts(interrupts(vec![Err(unavailable)]), cancel.clone()).await;

        assert!(!exit);
        assert!(!cancel.is_cancelled());
    }

    #[tokio::test]
    async fn test_lost_second_interrupt_keeps_running() {
        let cancel = CancellationToken::new();
        let lost = io::Error::other("signal stream closed");

        let exit = watch_interrupts(interrupts(vec![Ok(()), Err(lost)]), cancel.clone()).await;

        assert!(!exit);
        assert!(cancel.is_cancelled());
    }

    #[test]
    fn test_confirm_rejects_json() {
        let parsed = Cli::try_parse_from(["automerge", "master", "release", "--confirm", "--json"]);
        assert!(parsed.is_err());
    }
}
