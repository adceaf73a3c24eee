//! CLI domain: parse, route, output, and presentation only.
//! No domain orchestration; single route table dispatches to domain services.

mod output;
mod parse;
mod presentation;
mod route;

pub use output::map_error;
pub use parse::{Cli, Commands, ConfigCommands, FactsCommands};
pub use presentation::{
    format_facts_json, format_facts_text, format_goal_report_json, format_goal_report_text,
    format_outcome_json, format_outcome_text, format_section_heading,
};
pub use route::RunContext;
