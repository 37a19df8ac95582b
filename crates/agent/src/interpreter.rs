use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use skyline_core::{FilterSet, Predicate};
use tracing::{info, warn};

use crate::extract::ResponseExtractor;
use crate::llm::{CompletionGateway, GatewayError};
use crate::prompt::system_prompt;
use crate::rules::RuleBasedParser;

/// Which path produced the filter, and why the fallback ran if it did.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Provenance {
    Model,
    RuleBased,
    RuleBasedOnTransportError,
    RuleBasedOnParseError,
    RuleBasedOnUnexpectedError,
}

impl Provenance {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Model => "MODEL",
            Self::RuleBased => "RULE_BASED",
            Self::RuleBasedOnTransportError => "RULE_BASED_ON_TRANSPORT_ERROR",
            Self::RuleBasedOnParseError => "RULE_BASED_ON_PARSE_ERROR",
            Self::RuleBasedOnUnexpectedError => "RULE_BASED_ON_UNEXPECTED_ERROR",
        }
    }
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct InterpretationResult {
    pub success: bool,
    pub filter: Option<FilterSet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub raw_model_output: Option<String>,
    pub provenance: Provenance,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug)]
enum ModelPathError {
    Transport(String),
    Parse { raw: Option<String>, reason: &'static str },
    Unexpected(String),
}

impl ModelPathError {
    fn provenance(&self) -> Provenance {
        match self {
            Self::Transport(_) => Provenance::RuleBasedOnTransportError,
            Self::Parse { .. } => Provenance::RuleBasedOnParseError,
            Self::Unexpected(_) => Provenance::RuleBasedOnUnexpectedError,
        }
    }

    fn reason(&self) -> &str {
        match self {
            Self::Transport(reason) | Self::Unexpected(reason) => reason.as_str(),
            Self::Parse { reason, .. } => *reason,
        }
    }

    fn into_raw_output(self) -> Option<String> {
        match self {
            Self::Parse { raw, .. } => raw,
            Self::Transport(_) | Self::Unexpected(_) => None,
        }
    }
}

impl From<GatewayError> for ModelPathError {
    fn from(error: GatewayError) -> Self {
        match error {
            error if error.is_transport() => Self::Transport(error.to_string()),
            GatewayError::MalformedResponse(_) => {
                Self::Parse { raw: None, reason: "completion envelope carried no text" }
            }
            other => Self::Unexpected(other.to_string()),
        }
    }
}

/// Turns free text into a filter: one model attempt, then the rule-based
/// parser on the original text when the model path fails.
pub struct QueryInterpreter {
    gateway: Option<Arc<dyn CompletionGateway>>,
    parser: RuleBasedParser,
    extractor: ResponseExtractor,
    system_prompt: String,
}

impl QueryInterpreter {
    pub fn new(gateway: Arc<dyn CompletionGateway>) -> Self {
        Self {
            gateway: Some(gateway),
            parser: RuleBasedParser::new(),
            extractor: ResponseExtractor::new(),
            system_prompt: system_prompt(),
        }
    }

    /// An interpreter with the model path disabled; every result is tagged
    /// `RULE_BASED`.
    pub fn without_model() -> Self {
        Self {
            gateway: None,
            parser: RuleBasedParser::new(),
            extractor: ResponseExtractor::new(),
            system_prompt: String::new(),
        }
    }

    pub async fn interpret(&self, text: &str) -> InterpretationResult {
        let Some(gateway) = &self.gateway else {
            return self.interpret_rules_only(text);
        };

        match self.model_filter(gateway.as_ref(), text).await {
            Ok((filter, raw)) => {
                info!(
                    event_name = "interpreter.model.accepted",
                    predicates = filter.predicates().len(),
                    "model produced a filter"
                );
                InterpretationResult {
                    success: true,
                    filter: Some(filter),
                    raw_model_output: Some(raw),
                    provenance: Provenance::Model,
                    error: None,
                }
            }
            Err(error) => {
                let provenance = error.provenance();
                warn!(
                    event_name = "interpreter.fallback",
                    provenance = %provenance,
                    reason = error.reason(),
                    "model path failed; using rule-based parser"
                );
                self.rule_based(text, provenance, error.into_raw_output())
            }
        }
    }

    /// Skips the model entirely.
    pub fn interpret_rules_only(&self, text: &str) -> InterpretationResult {
        self.rule_based(text, Provenance::RuleBased, None)
    }

    async fn model_filter(
        &self,
        gateway: &dyn CompletionGateway,
        text: &str,
    ) -> Result<(FilterSet, String), ModelPathError> {
        let completion = gateway.complete(&self.system_prompt, text).await?;
        let raw = completion.text;

        let Some(document) = self.extractor.extract(&raw) else {
            return Err(ModelPathError::Parse {
                raw: Some(raw),
                reason: "no filter object in completion",
            });
        };

        match filter_from_document(&document) {
            Some(filter) => Ok((filter, raw)),
            None => Err(ModelPathError::Parse {
                raw: Some(raw),
                reason: "completion held no usable filters",
            }),
        }
    }

    fn rule_based(
        &self,
        text: &str,
        provenance: Provenance,
        raw_model_output: Option<String>,
    ) -> InterpretationResult {
        match self.parser.parse(text) {
            Ok(filter) => InterpretationResult {
                success: true,
                filter: Some(filter),
                raw_model_output,
                provenance,
                error: None,
            },
            Err(error) => {
                warn!(
                    event_name = "interpreter.unparseable",
                    provenance = %provenance,
                    "no interpretation found for query"
                );
                InterpretationResult {
                    success: false,
                    filter: None,
                    raw_model_output,
                    provenance,
                    error: Some(error.to_string()),
                }
            }
        }
    }
}

/// Entries that do not deserialize as a predicate are dropped; `None` when
/// nothing usable remains.
fn filter_from_document(document: &Value) -> Option<FilterSet> {
    let predicates = document
        .get("filters")?
        .as_array()?
        .iter()
        .filter_map(|entry| serde_json::from_value::<Predicate>(entry.clone()).ok())
        .collect::<Vec<_>>();
    FilterSet::new(predicates).ok()
}
