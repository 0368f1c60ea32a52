//! implflow CLI - plan-driven implementation workflow

mod cli;
mod colors;
mod commands;
mod output;

use std::process::ExitCode;

use cli::Commands;
use commands::Invocation;
use output::OutputMode;

fn main() -> ExitCode {
    let cli = cli::parse();
    init_tracing(cli.verbose, cli.quiet);

    let inv = Invocation {
        output: OutputMode {
            json: cli.json,
            quiet: cli.quiet,
        },
        repo: cli.repo,
    };

    let result = match cli.command {
        Some(Commands::Init {
            id,
            plan_type,
            force,
        }) => commands::run_init(&inv, id, plan_type, force),
        Some(Commands::BranchName { plan_dir }) => commands::run_branch_name(&inv, plan_dir),
        Some(Commands::Status { plan_dir }) => commands::run_status(&inv, plan_dir),
        Some(Commands::Task(task_cmd)) => commands::run_task(&inv, task_cmd),
        Some(Commands::Context(context_cmd)) => commands::run_context(&inv, context_cmd),
        Some(Commands::Worktree(worktree_cmd)) => commands::run_worktree(&inv, worktree_cmd),
        Some(Commands::CheckClean { dir }) => commands::run_check_clean(&inv, dir),
        Some(Commands::CheckBranch { plan_dir, dir }) => {
            commands::run_check_branch(&inv, plan_dir, dir)
        }
        Some(Commands::CreateBranch {
            plan_dir,
            base,
            dir,
        }) => commands::run_create_branch(&inv, plan_dir, base, dir),
        Some(Commands::CommitPhase {
            plan_dir,
            phase,
            dir,
        }) => commands::run_commit_phase(&inv, plan_dir, phase, dir),
        Some(Commands::CommitPlan { plan_dir, dir }) => {
            commands::run_commit_plan(&inv, plan_dir, dir)
        }
        Some(Commands::Pr(args)) => commands::run_pr(&inv, args, false),
        Some(Commands::Publish(args)) => commands::run_pr(&inv, args, true),
        Some(Commands::PrTemplate { change_type }) => commands::run_pr_template(&inv, change_type),
        None => {
            // No subcommand - print version info
            if !cli.quiet {
                println!("implflow v{}", env!("CARGO_PKG_VERSION"));
                println!("Use --help for usage information");
            }
            Ok(0)
        }
    };

    match result {
        Ok(code) => ExitCode::from(code as u8),
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::from(1)
        }
    }
}

/// Log to stderr so stdout stays machine-readable.
///
/// `RUST_LOG` wins; otherwise `--verbose` is debug, `--quiet` is error,
/// and the default is warn.
fn init_tracing(verbose: bool, quiet: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let default = if verbose {
        "implflow=debug,implflow_core=debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}
