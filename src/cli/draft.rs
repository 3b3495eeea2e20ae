// Whole-document drafting: outline, expand each section, review, rewrite

use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;

use super::{BriefArgs, DraftArgs};
use crate::agent::{AgentConfig, AgentRole};
use crate::context::AppContext;
use crate::document::DocumentBrief;
use crate::session::EditingSession;

/// Progress display for a draft run; one tick per section step.
struct DraftProgress {
    bar: ProgressBar,
}

impl DraftProgress {
    fn spinner(message: &str) -> Self {
        let bar = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            bar.set_style(style);
        }
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    fn sections(&self, steps: u64) {
        self.bar.set_length(steps);
        self.bar.set_position(0);
        if let Ok(style) = ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        {
            self.bar.set_style(style.progress_chars("=>-"));
        }
    }

    fn step(&self, message: String) {
        self.bar.set_message(message);
    }

    fn done(&self) {
        self.bar.inc(1);
    }

    fn warn(&self, message: String) {
        self.bar.println(format!("warning: {}", message));
    }

    fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Agent by id or name, or the first agent with `role`.
pub(super) fn pick_agent(
    ctx: &AppContext,
    wanted: Option<&str>,
    role: AgentRole,
) -> Result<AgentConfig> {
    let agent = match wanted {
        Some(id_or_name) => ctx
            .agents()
            .find(id_or_name)
            .with_context(|| format!("No agent named '{}'", id_or_name))?,
        None => ctx
            .agents()
            .first_with_role(role)
            .with_context(|| format!("No {} agent defined", role))?,
    };
    if agent.role != role {
        bail!("Agent '{}' is a {}, not a {}", agent.name, agent.role, role);
    }
    Ok(agent)
}

pub(super) fn brief_from(args: &BriefArgs) -> DocumentBrief {
    DocumentBrief::new(&args.content_type, &args.idea, &args.audience)
}

/// Run the full pipeline and return the exported markdown.
pub(super) async fn run_draft(ctx: Arc<AppContext>, args: &DraftArgs) -> Result<String> {
    let writer = pick_agent(&ctx, args.brief.writer.as_deref(), AgentRole::ContentWriter)?;
    let reviewer = if args.no_review {
        None
    } else {
        Some(pick_agent(
            &ctx,
            args.reviewer.as_deref(),
            AgentRole::ContentReviewer,
        )?)
    };

    let session = EditingSession::new(ctx.clone(), brief_from(&args.brief));
    session.set_default_agents(Some(writer), reviewer);
    if let Some(title) = &args.title {
        session.set_title(title);
    }

    let progress = DraftProgress::spinner("Planning outline...");
    let count = session
        .generate_outline(args.brief.context.as_deref())
        .await
        .context("Outline generation failed")?;
    if count == 0 {
        progress.finish("No outline");
        bail!("The writer returned no readable outline sections");
    }

    let steps_per_section = if args.no_review { 1 } else { 3 };
    progress.sections((count * steps_per_section) as u64);

    for block in session.blocks() {
        progress.step(format!("Writing \"{}\"", block.title));
        session
            .generate_content(block.id)
            .await
            .with_context(|| format!("Writing section \"{}\" failed", block.title))?;
        progress.done();

        if args.no_review {
            continue;
        }

        progress.step(format!("Reviewing \"{}\"", block.title));
        let comment_id = match session.request_review(block.id, None).await {
            Ok(comment_id) => comment_id,
            Err(e) => {
                // Keep the unreviewed draft of this section
                progress.warn(format!("Review of \"{}\" failed: {}", block.title, e));
                progress.done();
                progress.done();
                continue;
            }
        };
        progress.done();

        progress.step(format!("Revising \"{}\"", block.title));
        if let Err(e) = session.apply_review(block.id, &comment_id).await {
            progress.warn(format!("Rewrite of \"{}\" failed: {}", block.title, e));
        }
        progress.done();
    }

    session.save().context("Failed to save editing session")?;
    progress.finish("Draft complete");
    Ok(session.to_markdown())
}
