use thiserror::Error;

pub type LoadResult<T> = Result<T, LoadError>;

/// Everything that can stop the medal table (or the country reference) from loading.
/// All of these are fatal for a run.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to fetch {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: reqwest::StatusCode },
    #[error("{source_name}: missing expected column \"{column}\"")]
    MissingColumn { source_name: String, column: String },
    #[error("{source_name}: malformed row at line {line}: {source}")]
    Csv {
        source_name: String,
        line: u64,
        #[source]
        source: csv::Error,
    },
    #[error(
        "{source_name}: line {line} ({noc} / {competition}) reports total {reported} but gold+silver+bronze is {computed}"
    )]
    TotalMismatch {
        source_name: String,
        line: u64,
        noc: String,
        competition: String,
        reported: u32,
        computed: u64,
    },
    #[error("no {0} configured for the selected data source mode")]
    Unconfigured(&'static str),
    #[error("country reference {source_name}: {message}")]
    Reference { source_name: String, message: String },
}

impl LoadError {
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub fn missing_column(source_name: impl Into<String>, column: impl Into<String>) -> Self {
        Self::MissingColumn {
            source_name: source_name.into(),
            column: column.into(),
        }
    }

    pub fn reference(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Reference {
            source_name: source_name.into(),
            message: message.into(),
        }
    }
}
