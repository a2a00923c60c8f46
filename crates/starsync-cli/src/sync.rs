use std::sync::Arc;

use nu_ansi_term::Color::{Blue, Cyan, Green, Red, Yellow};
use starsync_operations::{
    filter::RepoFilter,
    git::GitCli,
    list::github_client,
    mirror::{self, mirror_stars, prepare_plan},
    MirrorContext, MirrorError, MirrorPlan, MirrorReport, MirrorResult, SkipReason, TaskAction,
};
use starsync_utils::time::format_elapsed;
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};
use tracing::{info, warn};

use crate::utils::{icon_or, term_width, Colored, Icons};

pub async fn sync_stars(ctx: &MirrorContext, filter: RepoFilter, dry_run: bool) -> MirrorResult<()> {
    if ctx.config().token.is_none() {
        return Err(MirrorError::MissingToken);
    }

    if dry_run {
        let plan = prepare_plan(ctx, github_client(ctx.config()), &filter).await?;
        mirror::dry_run(&plan);
        display_plan(&plan);
        return Ok(());
    }

    let git = GitCli::from_config(ctx.config());
    git.check_available().await?;

    let report = mirror_stars(ctx, github_client(ctx.config()), Arc::new(git), &filter).await?;
    display_report(&report);

    Ok(())
}

fn display_plan(plan: &MirrorPlan) {
    let mut builder = Builder::new();
    builder.push_record([
        format!("{} Clone", Colored(Green, icon_or(Icons::CLONE, "+"))),
        plan.count(TaskAction::Clone).to_string(),
    ]);
    builder.push_record([
        format!("{} Pull", Colored(Blue, icon_or(Icons::PULL, "~"))),
        plan.count(TaskAction::Pull).to_string(),
    ]);
    builder.push_record([
        format!("{} Skip", Colored(Yellow, icon_or(Icons::SKIP, "-"))),
        plan.skipped.len().to_string(),
    ]);

    let table = builder
        .build()
        .with(Panel::header("Dry Run"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .to_string();

    info!("\n{table}");
}

fn display_report(report: &MirrorReport) {
    let mut builder = Builder::new();

    builder.push_record([
        format!("{} Cloned", Colored(Green, icon_or(Icons::CLONE, "+"))),
        report.cloned.len().to_string(),
    ]);
    builder.push_record([
        format!("{} Pulled", Colored(Blue, icon_or(Icons::PULL, "~"))),
        report.pulled.len().to_string(),
    ]);
    builder.push_record([
        format!("{} Up to date", Colored(Green, icon_or(Icons::CHECK, "="))),
        report.up_to_date.len().to_string(),
    ]);

    let failed = if report.failed.is_empty() {
        "0".to_string()
    } else {
        Colored(Red, report.failed.len()).to_string()
    };
    builder.push_record([
        format!("{} Failed", Colored(Red, icon_or(Icons::CROSS, "!"))),
        failed,
    ]);
    builder.push_record([
        format!("{} Skipped", Colored(Yellow, icon_or(Icons::SKIP, "-"))),
        report.skipped.len().to_string(),
    ]);

    let slowest = report
        .cloned
        .iter()
        .chain(report.pulled.iter())
        .max_by_key(|info| info.elapsed);
    if let Some(slowest) = slowest {
        builder.push_record([
            "Slowest".to_string(),
            format!(
                "{} ({})",
                Colored(Cyan, &slowest.full_name),
                format_elapsed(slowest.elapsed)
            ),
        ]);
    }

    let table = builder
        .build()
        .with(Panel::header("Mirror Summary"))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string();

    info!("\n{table}");

    if report.has_failures() {
        info!("\nFailed repositories:");
        for failed in &report.failed {
            info!(
                "  {} {} ({}): {}",
                Icons::ARROW,
                Colored(Cyan, &failed.full_name),
                failed.action.verb(),
                Colored(Red, &failed.error)
            );
        }
    }

    let conflicts: Vec<_> = report
        .skipped
        .iter()
        .filter(|s| s.reason != SkipReason::Filtered)
        .collect();
    if !conflicts.is_empty() {
        warn!("{} repositories were not mirrored:", conflicts.len());
        for skipped in conflicts {
            warn!(
                "  {} {}: {}",
                Icons::ARROW,
                Colored(Cyan, &skipped.full_name),
                skipped.reason
            );
        }
    }
}
