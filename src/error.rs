use thiserror::Error;

/// Failure to obtain the raw feed text.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request failed at the transport level or came back with a non-success status.
    /// `status` is `None` when no response was received at all.
    #[error("Can't download the feed ({}): {reason}", status_label(.status))]
    Transport { status: Option<u16>, reason: String },

    #[error("The feed returned an empty response")]
    EmptyResponse,
}

fn status_label(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no status".to_string(),
    }
}

/// The feed text is not a well-formed rates document.
#[derive(Debug, Error)]
#[error("Can't parse the feed document: {0}")]
pub struct ParseError(#[from] pub quick_xml::DeError);

/// A single feed entry that can't be turned into a rate record.
#[derive(Debug, Error, PartialEq)]
pub enum NormalizeError {
    #[error("Malformed rate value {value:?} for {code}")]
    MalformedNumber { code: String, value: String },

    #[error("Invalid nominal {nominal:?} for {code}")]
    InvalidNominal { code: String, nominal: String },
}

/// Errors that abort a whole ingestion cycle.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error(transparent)]
    Fetch(#[from] FetchError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error("The feed contains no currencies")]
    NoEntries,
}
