use nu_ansi_term::Color::{Blue, Cyan, Green, Yellow};
use starsync_operations::{
    list::{github_client, list_stars},
    MirrorContext, MirrorResult, StarEntry,
};
use tabled::{
    builder::Builder,
    settings::{peaker::PriorityMax, themes::BorderCorrection, Panel, Style, Width},
};
use tracing::info;

use crate::utils::{icon_or, term_width, Colored, Icons};

pub async fn list_starred(ctx: &MirrorContext) -> MirrorResult<()> {
    let entries = list_stars(ctx, github_client(ctx.config())).await?;

    if entries.is_empty() {
        info!("No starred repositories found");
        return Ok(());
    }

    let mirrored = entries.iter().filter(|e| e.exists).count();

    let mut builder = Builder::new();
    builder.push_record(["Repository", "Directory", "Status"]);
    for entry in &entries {
        builder.push_record([
            format_name(entry),
            entry
                .dir
                .as_ref()
                .map(|dir| dir.display().to_string())
                .unwrap_or_else(|| "-".to_string()),
            format_status(entry),
        ]);
    }

    let table = builder
        .build()
        .with(Panel::header(format!(
            "Starred Repositories ({}/{} mirrored)",
            mirrored,
            entries.len()
        )))
        .with(Style::rounded())
        .with(BorderCorrection {})
        .with(Width::wrap(term_width()).priority(PriorityMax::default()))
        .to_string();

    info!("\n{table}");

    Ok(())
}

fn format_name(entry: &StarEntry) -> String {
    let mut name = Colored(Blue, &entry.full_name).to_string();
    if entry.fork {
        name.push_str(" (fork)");
    }
    if entry.archived {
        name.push_str(&format!(" {}", Colored(Yellow, "[archived]")));
    }
    name
}

fn format_status(entry: &StarEntry) -> String {
    match (&entry.dir, entry.exists) {
        (None, _) => format!("{} invalid name", icon_or(Icons::WARNING, "!")),
        (Some(_), true) => {
            format!(
                "{} {}",
                Colored(Green, icon_or(Icons::CHECK, "+")),
                Colored(Green, "mirrored")
            )
        }
        (Some(_), false) => {
            format!(
                "{} {}",
                Colored(Cyan, icon_or(Icons::MISSING, "-")),
                "not cloned"
            )
        }
    }
}
