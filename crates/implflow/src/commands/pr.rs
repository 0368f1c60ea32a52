//! Pull request commands: pr, publish, pr-template

use std::path::PathBuf;

use clap::Args;
use owo_colors::OwoColorize;
use serde::Serialize;

use implflow_core::{ChangeType, PublishOptions, PullRequestPublisher, SystemRunner, WorkflowContext};

use super::{Invocation, setup_error};
use crate::colors::PALETTE;
use crate::output::JsonIssue;

/// Options shared by every command that opens a pull request
#[derive(Args, Debug, Clone)]
pub struct PrArgs {
    /// Plan directory to describe (generic template when omitted)
    #[arg(long)]
    pub plan: Option<PathBuf>,

    /// Template for PRs without a plan: feature, bugfix, docs, refactor, chore
    #[arg(long = "type", default_value = "feature")]
    pub change_type: ChangeType,

    /// Title override
    #[arg(long)]
    pub title: Option<String>,

    /// Open as a draft
    #[arg(long)]
    pub draft: bool,

    /// Base branch (default: from config)
    #[arg(long)]
    pub base: Option<String>,
}

impl PrArgs {
    pub fn options(&self, ctx: &WorkflowContext) -> PublishOptions {
        PublishOptions {
            plan_dir: ctx.plan_dir.clone(),
            change_type: self.change_type,
            title: self.title.clone(),
            draft: self.draft,
        }
    }
}

/// JSON output for pr-template
#[derive(Serialize)]
pub struct TemplateData {
    pub change_type: ChangeType,
    pub template: String,
}

/// Run `pr` (no push) or `publish` (push, then PR)
pub fn run_pr(inv: &Invocation, args: PrArgs, push: bool) -> Result<i32, String> {
    let ctx = inv
        .context(args.plan.as_deref(), args.base.clone())
        .map_err(setup_error)?;
    let options = args.options(&ctx);
    let publisher = PullRequestPublisher::new(&ctx, &SystemRunner);

    if !push {
        let result = publisher.create_pr(&ctx.repo_root, &options);
        return inv.output.finish("pr", result, vec![], |pr| {
            println!("{}", pr.url.style(PALETTE.done));
        });
    }

    let result = publisher.publish(&ctx.repo_root, &options);
    let issues = match &result {
        Ok(outcome) => outcome
            .pr_error
            .iter()
            .map(|e| JsonIssue::warning("W002", format!("pull request not created: {}", e)))
            .collect(),
        Err(_) => vec![],
    };
    inv.output.finish("publish", result, issues, |outcome| {
        println!("Pushed {}", outcome.branch.style(PALETTE.branch));
        if let Some(pr) = &outcome.pull_request {
            println!("Pull request: {}", pr.url.style(PALETTE.done));
        }
    })
}

/// Run the pr-template command
pub fn run_pr_template(inv: &Invocation, change_type: ChangeType) -> Result<i32, String> {
    let data = TemplateData {
        change_type,
        template: change_type.template().to_string(),
    };
    inv.output.finish("pr-template", Ok(data), vec![], |data| {
        print!("{}", data.template);
    })
}
