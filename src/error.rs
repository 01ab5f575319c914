use thiserror::Error;

/// Invalid compiled-in carrier configuration. Fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid selector expression `{expr}`: {reason}")]
    InvalidSelector { expr: String, reason: String },

    #[error("field {field} is used but has no locator")]
    MissingLocator { field: String },

    #[error("field {field} is used but has no coercion")]
    MissingCoercion { field: String },

    #[error("field {field} expects a {expected} value but is coerced as {coercion}")]
    CoercionMismatch {
        field: String,
        expected: &'static str,
        coercion: &'static str,
    },

    #[error("field {field} is not part of a {kind} policy")]
    FieldNotInKind { field: String, kind: &'static str },

    #[error("required field {field} is not in the used fields")]
    RequiredNotUsed { field: String },

    #[error("invalid address `{uri}`: {source}")]
    InvalidUri {
        uri: String,
        #[source]
        source: url::ParseError,
    },
}

/// A single field could not be produced. Absorbed into "field absent"
/// unless the field is required to build its record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExtractionError {
    #[error("{field}: index {index} out of bounds for {len} matches")]
    IndexOutOfBounds {
        field: String,
        index: usize,
        len: usize,
    },

    #[error("{field}: unknown value `{raw}`")]
    UnknownEnumValue { field: String, raw: String },

    #[error("{field}: cannot coerce `{raw}` to {target}")]
    TypeCoercionFailure {
        field: String,
        raw: String,
        target: &'static str,
    },

    #[error("required field {field} is absent")]
    MissingRequired { field: String },
}

#[derive(Debug, Error)]
pub enum PaginationError {
    #[error("malformed next link `{href}`: expected delimiter `{delimiter}`")]
    MalformedLink { href: String, delimiter: char },

    #[error("cannot resolve next link `{href}` against {base}: {source}")]
    InvalidUrl {
        href: String,
        base: String,
        #[source]
        source: url::ParseError,
    },

    #[error("next link loops back to already visited page {uri}")]
    Cycle { uri: String },
}

/// Raised by the fetch collaborator. Never retried here.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request to {uri} failed: {source}")]
    Request {
        uri: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{uri} answered with status {status}")]
    Status { uri: String, status: u16 },

    #[error("no document at {uri}")]
    NotFound { uri: String },
}

/// Anything that aborts one adapter's run.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error(transparent)]
    Extraction(#[from] ExtractionError),

    #[error(transparent)]
    Pagination(#[from] PaginationError),

    #[error(transparent)]
    Transport(#[from] TransportError),
}
