//! CLI presentation: text and json formatters per command family.

use crate::engine::{DispatchOutcome, ReplanReason};
use crate::goal::GoalReport;
use crate::store::FactSnapshot;
use crate::types::{fact_string, Goal, Plan};
use comfy_table::presets::UTF8_BORDERS_ONLY;
use comfy_table::Table;
use owo_colors::OwoColorize;
use serde_json::json;

pub fn format_section_heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

pub fn format_facts_text(facts: &FactSnapshot) -> String {
    let mut out = format!("{}\n\n", format_section_heading("Fact base"));
    if facts.is_empty() {
        out.push_str("No facts recorded.\n");
        return out;
    }
    let mut table = Table::new();
    table.load_preset(UTF8_BORDERS_ONLY);
    table.set_header(vec!["Predicate", "Value"]);
    for (predicate, value) in facts {
        table.add_row(vec![predicate.clone(), value.clone()]);
    }
    out.push_str(&format!("{}\n\nTotal: {} fact(s)\n", table, facts.len()));
    out
}

pub fn format_facts_json(facts: &FactSnapshot) -> String {
    let out = json!({ "facts": facts, "total": facts.len() });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

/// One row per desired predicate, with the stored value when it differs.
pub fn format_goal_report_text(goal: &Goal, report: &GoalReport) -> String {
    let mut out = format!(
        "{}\n\n",
        format_section_heading(&format!("Goal: {}", goal.name))
    );
    if goal.desired_state.is_empty() {
        out.push_str("Goal has no desired predicates.\n\n");
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_BORDERS_ONLY);
        table.set_header(vec!["Predicate", "Desired", "Actual", "Match"]);
        for (predicate, desired) in &goal.desired_state {
            let desired = fact_string(desired);
            let row = match report.mismatches.iter().find(|m| &m.predicate == predicate) {
                Some(mismatch) => vec![
                    predicate.clone(),
                    desired,
                    mismatch
                        .actual
                        .clone()
                        .unwrap_or_else(|| "(absent)".to_string()),
                    "no".to_string(),
                ],
                None => vec![predicate.clone(), desired.clone(), desired, "yes".to_string()],
            };
            table.add_row(row);
        }
        out.push_str(&format!("{}\n\n", table));
    }
    if report.is_satisfied() {
        out.push_str(&format!("{}\n", "Goal satisfied".green()));
    } else {
        out.push_str(&format!(
            "{} ({} of {} predicate(s) unmet)\n",
            "Goal not satisfied".red(),
            report.mismatches.len(),
            report.checked
        ));
    }
    out
}

pub fn format_goal_report_json(report: &GoalReport) -> String {
    let out = json!({
        "goal": report.goal_name,
        "satisfied": report.is_satisfied(),
        "checked": report.checked,
        "mismatches": report.mismatches,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}

fn reason_text(reason: ReplanReason) -> &'static str {
    match reason {
        ReplanReason::PlanFailed => "an action failed",
        ReplanReason::GoalUnsatisfied => "goal not satisfied after the plan",
        ReplanReason::GoalUnverifiable => "fact base unreadable after the plan",
    }
}

pub fn format_outcome_text(plan: &Plan, outcome: &DispatchOutcome) -> String {
    let header = format!(
        "Plan for goal '{}' ({} step(s), cost {})",
        plan.target_goal.name,
        plan.steps.len(),
        plan.total_cost
    );
    let status = match outcome {
        DispatchOutcome::Rejected => format!("{}", "Rejected: payload could not be decoded".red()),
        DispatchOutcome::GoalAchieved => format!("{}", "Goal achieved".green()),
        DispatchOutcome::Replanned { reason, published } => {
            let delivery = if *published {
                "replan requested"
            } else {
                "replan request could not be published"
            };
            format!(
                "{}: {}",
                format!("Replanning ({})", reason_text(*reason)).yellow(),
                delivery
            )
        }
    };
    format!("{}\n{}\n", header, status)
}

pub fn format_outcome_json(plan: &Plan, outcome: &DispatchOutcome) -> String {
    let out = json!({
        "goal": plan.target_goal.name,
        "steps": plan.steps.len(),
        "result": outcome,
    });
    serde_json::to_string_pretty(&out).unwrap_or_else(|_| "{}".to_string())
}
