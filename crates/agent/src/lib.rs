//! Query interpretation for skyline.
//!
//! Natural-language property queries become a [`skyline_core::FilterSet`] in
//! one of two ways:
//!
//! 1. **Model path** (`interpreter`, `llm`, `http`, `prompt`, `extract`): a
//!    few-shot instruction plus the user text goes to a chat-completions
//!    service, and the JSON filter is pulled out of the reply.
//! 2. **Rule-based path** (`rules`): a fixed chain of keyword and pattern
//!    detectors, used whenever the model path fails or is disabled.
//!
//! Every result carries a [`Provenance`] tag naming the path that produced
//! it and the reason for any fallback.
//!
//! The model only translates. Filtering the records is deterministic and
//! lives in `skyline_core::evaluate`.

pub mod extract;
pub mod http;
pub mod interpreter;
pub mod llm;
pub mod prompt;
pub mod rules;

pub use extract::ResponseExtractor;
pub use http::HttpCompletionGateway;
pub use interpreter::{InterpretationResult, Provenance, QueryInterpreter};
pub use llm::{Completion, CompletionGateway, GatewayError};
pub use rules::{RuleBasedParser, Unparseable};
