use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server answered with HTTP {0}")]
    Status(u16),

    #[error("{endpoint} answered with status {status:?}")]
    NotOk { endpoint: &'static str, status: String },

    #[error("malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0} returned an empty payload")]
    EmptyPayload(&'static str),

    #[error("no {0} selected")]
    MissingSelection(&'static str),

    #[error("{value:?} is not an option of the {selector} selector")]
    UnknownOption { selector: &'static str, value: String },

    #[error("unexpected row layout: {0}")]
    RowShape(String),

    #[error("table {0} not found")]
    TableNotFound(&'static str),

    #[error("table {0} already exists")]
    TableExists(&'static str),

    #[error("no row {0} on the current page")]
    RowOutOfRange(usize),

    #[error("invalid table options: {0}")]
    Options(String),

    #[error("invalid {key}: {reason}")]
    Config { key: &'static str, reason: String },
}
