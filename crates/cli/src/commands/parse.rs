use serde::Serialize;
use skyline_agent::{Provenance, QueryInterpreter};
use skyline_core::{ApplicationError, DomainError, FilterSet};

use crate::commands::CommandResult;

const COMMAND: &str = "parse";

#[derive(Debug, Serialize)]
struct ParseReport<'a> {
    command: &'static str,
    status: &'static str,
    provenance: Provenance,
    filter: Option<&'a FilterSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

/// Rule-based interpretation only; reads no configuration and no records.
pub fn run(text: &str) -> CommandResult {
    let text = text.trim();
    if text.is_empty() {
        return CommandResult::from_error(COMMAND, &DomainError::EmptyQuery.into());
    }

    let interpretation = QueryInterpreter::without_model().interpret_rules_only(text);
    let failure = interpretation
        .error
        .clone()
        .filter(|_| !interpretation.success)
        .map(ApplicationError::UnparseableQuery);
    let message = failure.as_ref().map(ToString::to_string);

    let report = ParseReport {
        command: COMMAND,
        status: if failure.is_some() { "error" } else { "ok" },
        provenance: interpretation.provenance,
        filter: interpretation.filter.as_ref(),
        error_class: failure.as_ref().map(ApplicationError::error_class),
        error: message.as_deref(),
    };
    let exit_code = failure.as_ref().map_or(0, ApplicationError::exit_code);
    CommandResult::report(COMMAND, exit_code, &report)
}
