use thiserror::Error;

#[derive(Error, Debug)]
pub enum PvError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet read error: {0}")]
    XlsxRead(#[from] calamine::XlsxError),

    #[error("Spreadsheet write error: {0}")]
    XlsxWrite(#[from] rust_xlsxwriter::XlsxError),

    #[error("Missing column: {column}")]
    MissingColumn { column: String },

    #[error("Column {column} is not {expected}")]
    ColumnType {
        column: String,
        expected: &'static str,
    },

    #[error("Column {column} has {actual} rows, expected {expected}")]
    LengthMismatch {
        column: String,
        expected: usize,
        actual: usize,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("Empty selection: {0}")]
    EmptySelection(String),

    #[error("Invalid id list: {0}")]
    InvalidIdList(String),

    #[error("Experiment key without numeric suffix: {0}")]
    InvalidExperimentKey(String),

    #[error("Invalid spreadsheet: {0}")]
    InvalidSheet(String),
}

impl PvError {
    pub(crate) fn missing(column: impl Into<String>) -> Self {
        Self::MissingColumn {
            column: column.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PvError>;
