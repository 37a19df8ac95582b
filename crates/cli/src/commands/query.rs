use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;
use serde::Serialize;
use skyline_agent::{HttpCompletionGateway, InterpretationResult, Provenance, QueryInterpreter};
use skyline_core::config::{AppConfig, LoadOptions};
use skyline_core::{
    ApplicationError, DomainError, FilterEvaluator, FilterSet, RecordId, RecordSnapshot,
};
use tracing::{info, warn};

use crate::commands::CommandResult;
use crate::init_logging;

const COMMAND: &str = "query";

#[derive(Debug, Clone, Default, Args)]
pub struct QueryArgs {
    #[arg(required = true, num_args = 1.., help = "Query text")]
    pub text: Vec<String>,
    #[arg(long, value_name = "PATH", help = "Records JSON file (overrides records.path)")]
    pub records: Option<PathBuf>,
    #[arg(long, help = "Skip the language model and use only the rule-based parser")]
    pub rules_only: bool,
}

#[derive(Debug, Serialize)]
struct QueryReport<'a> {
    command: &'static str,
    status: &'static str,
    provenance: Provenance,
    filter: Option<&'a FilterSet>,
    matching_ids: &'a [RecordId],
    count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    raw_model_output: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error_class: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

pub fn run(args: QueryArgs, options: LoadOptions) -> CommandResult {
    match execute(args, options) {
        Ok(result) => result,
        Err(error) => CommandResult::from_error(COMMAND, &error),
    }
}

fn execute(args: QueryArgs, mut options: LoadOptions) -> Result<CommandResult, ApplicationError> {
    let text = args.text.join(" ");
    let text = text.trim();
    if text.is_empty() {
        return Err(DomainError::EmptyQuery.into());
    }

    options.overrides.records_path = args.records;
    if args.rules_only {
        options.overrides.llm_enabled = Some(false);
    }
    let config = AppConfig::load(options)
        .map_err(|error| ApplicationError::Configuration(error.to_string()))?;
    init_logging(&config.logging);

    let snapshot = load_records(&config)?;
    let interpreter = build_interpreter(&config)?;
    let runtime =
        tokio::runtime::Builder::new_current_thread().enable_all().build().map_err(|error| {
            ApplicationError::Integration(format!("failed to initialize async runtime: {error}"))
        })?;

    let interpretation = runtime.block_on(interpreter.interpret(text));
    Ok(report(&interpretation, &snapshot))
}

fn load_records(config: &AppConfig) -> Result<RecordSnapshot, ApplicationError> {
    let path = config.records.path.as_deref().ok_or_else(|| {
        ApplicationError::RecordSource(
            "no records file configured; pass --records or set SKYLINE_RECORDS_PATH".to_string(),
        )
    })?;
    let snapshot = RecordSnapshot::load(path)
        .map_err(|error| ApplicationError::RecordSource(error.to_string()))?;

    if snapshot.is_empty() {
        warn!(
            event_name = "records.empty",
            path = %path.display(),
            "records snapshot has no records; every query will match nothing"
        );
    }
    info!(
        event_name = "records.loaded",
        path = %path.display(),
        records = snapshot.len(),
        "records snapshot loaded"
    );
    Ok(snapshot)
}

fn build_interpreter(config: &AppConfig) -> Result<QueryInterpreter, ApplicationError> {
    if !config.llm.enabled {
        return Ok(QueryInterpreter::without_model());
    }

    let gateway = HttpCompletionGateway::from_config(&config.llm)
        .map_err(|error| ApplicationError::Integration(error.to_string()))?;
    Ok(QueryInterpreter::new(Arc::new(gateway)))
}

fn report(interpretation: &InterpretationResult, snapshot: &RecordSnapshot) -> CommandResult {
    let raw_model_output = interpretation.raw_model_output.as_deref();

    let Some(filter) = interpretation.filter.as_ref() else {
        let error = ApplicationError::UnparseableQuery(
            interpretation.error.clone().unwrap_or_else(|| "query could not be parsed".to_string()),
        );
        let message = error.to_string();
        let report = QueryReport {
            command: COMMAND,
            status: "error",
            provenance: interpretation.provenance,
            filter: None,
            matching_ids: &[],
            count: 0,
            raw_model_output,
            error_class: Some(error.error_class()),
            error: Some(&message),
        };
        return CommandResult::report(COMMAND, error.exit_code(), &report);
    };

    let evaluation = FilterEvaluator::new().evaluate(snapshot.records(), filter);
    info!(
        event_name = "query.completed",
        provenance = %interpretation.provenance,
        matches = evaluation.count,
        "query evaluated"
    );

    let report = QueryReport {
        command: COMMAND,
        status: "ok",
        provenance: interpretation.provenance,
        filter: Some(filter),
        matching_ids: &evaluation.matching_ids,
        count: evaluation.count,
        raw_model_output,
        error_class: None,
        error: None,
    };
    CommandResult::report(COMMAND, 0, &report)
}
