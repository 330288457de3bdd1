//! Action reporting for humans and pipelines

use chrono::{DateTime, Utc};
use colored::{ColoredString, Colorize};
use serde::Serialize;

use crate::config::{OutputStyle, ReportFormat};
use crate::reconcile::{ActionType, ReconcileAction};

/// How actions should be rendered
#[derive(Debug, Clone, Copy)]
pub struct ReportOptions {
    pub format: ReportFormat,
    pub style: OutputStyle,
    /// Colorize text output
    pub color: bool,
    /// Print update diffs under their action line
    pub show_diff: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            format: ReportFormat::Text,
            style: OutputStyle::Pretty,
            color: true,
            show_diff: false,
        }
    }
}

/// Per-type action counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ActionSummary {
    pub create: usize,
    pub update: usize,
    pub noop: usize,
}

impl ActionSummary {
    pub fn from_actions(actions: &[ReconcileAction]) -> Self {
        let mut summary = Self::default();
        for action in actions {
            match action.action_type {
                ActionType::Create => summary.create += 1,
                ActionType::Update => summary.update += 1,
                ActionType::Noop => summary.noop += 1,
            }
        }
        summary
    }

    /// Whether the run changed (or would change) the registry
    pub fn has_changes(&self) -> bool {
        self.create + self.update > 0
    }
}

#[derive(Serialize)]
struct JsonReport<'a> {
    generated_at: DateTime<Utc>,
    dry_run: bool,
    actions: &'a [ReconcileAction],
    summary: ActionSummary,
}

/// Line announcing whether the run may change the registry
pub fn mode_banner(dry_run: bool) -> &'static str {
    if dry_run {
        "Executing Kafka-GitOps in dry-run mode, no changes will be made."
    } else {
        "Executing Kafka-GitOps in active mode, changes may be made."
    }
}

/// Render the action list
pub fn render(
    actions: &[ReconcileAction],
    dry_run: bool,
    options: &ReportOptions,
) -> Result<String, serde_json::Error> {
    match options.format {
        ReportFormat::Text => Ok(render_text(actions, dry_run, options)),
        ReportFormat::Json => render_json(actions, dry_run, options.style),
    }
}

fn render_text(actions: &[ReconcileAction], dry_run: bool, options: &ReportOptions) -> String {
    let mut out = String::new();
    out.push_str(if dry_run {
        "Would take the following actions on schemas:\n"
    } else {
        "Took the following actions on schemas:\n"
    });

    for action in actions {
        let line = format!("{} {}", action.action_type, action.subject);
        if options.color {
            out.push_str(&colorize(action.action_type, &line).to_string());
        } else {
            out.push_str(&line);
        }
        out.push('\n');

        if options.show_diff {
            if let Some(diff) = &action.diff {
                for diff_line in diff.lines() {
                    out.push_str("    ");
                    out.push_str(diff_line);
                    out.push('\n');
                }
            }
        }
    }

    let summary = ActionSummary::from_actions(actions);
    out.push_str(&format!(
        "{} to create, {} to update, {} unchanged\n",
        summary.create, summary.update, summary.noop
    ));
    out
}

fn colorize(action_type: ActionType, line: &str) -> ColoredString {
    match action_type {
        ActionType::Create => line.green(),
        ActionType::Update => line.blue(),
        ActionType::Noop => line.cyan(),
    }
}

fn render_json(
    actions: &[ReconcileAction],
    dry_run: bool,
    style: OutputStyle,
) -> Result<String, serde_json::Error> {
    let report = JsonReport {
        generated_at: Utc::now(),
        dry_run,
        actions,
        summary: ActionSummary::from_actions(actions),
    };
    match style {
        OutputStyle::Pretty => serde_json::to_string_pretty(&report),
        OutputStyle::Compact => serde_json::to_string(&report),
    }
}
