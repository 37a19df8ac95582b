use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum DomainError {
    #[error("filter set must contain at least one predicate")]
    EmptyFilterSet,
    #[error("no query provided")]
    EmptyQuery,
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("record source failure: {0}")]
    RecordSource(String),
    #[error("integration failure: {0}")]
    Integration(String),
    #[error("configuration failure: {0}")]
    Configuration(String),
    #[error("{0}")]
    UnparseableQuery(String),
}

impl ApplicationError {
    /// Stable machine-readable class for command payloads.
    pub fn error_class(&self) -> &'static str {
        match self {
            Self::Domain(_) => "bad_input",
            Self::Configuration(_) => "config_validation",
            Self::RecordSource(_) => "record_source",
            Self::UnparseableQuery(_) => "unparseable_query",
            Self::Integration(_) => "integration",
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Domain(_) => 1,
            Self::Configuration(_) => 2,
            Self::RecordSource(_) => 3,
            Self::UnparseableQuery(_) => 4,
            Self::Integration(_) => 5,
        }
    }
}
