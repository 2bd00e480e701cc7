use std::fmt;

#[derive(Debug)]
pub enum IoError {
    /// File could not be read.
    Read { path: String, message: String },
    /// File could not be written.
    Write { path: String, message: String },
    /// Extraction payload is not one of the accepted shapes.
    Payload { source: String, message: String },
    /// xlsx generation failed.
    Xlsx(String),
    /// JSON (de)serialization failed outside payload decoding.
    Json(String),
}

impl fmt::Display for IoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read { path, message } => write!(f, "cannot read {path}: {message}"),
            Self::Write { path, message } => write!(f, "cannot write {path}: {message}"),
            Self::Payload { source, message } => write!(f, "{source}: invalid payload: {message}"),
            Self::Xlsx(msg) => write!(f, "xlsx error: {msg}"),
            Self::Json(msg) => write!(f, "JSON error: {msg}"),
        }
    }
}

impl std::error::Error for IoError {}

impl From<rust_xlsxwriter::XlsxError> for IoError {
    fn from(e: rust_xlsxwriter::XlsxError) -> Self {
        Self::Xlsx(e.to_string())
    }
}

pub(crate) fn read_to_string(path: &std::path::Path) -> Result<String, IoError> {
    std::fs::read_to_string(path).map_err(|e| IoError::Read {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}

pub(crate) fn write_bytes(path: &std::path::Path, bytes: &[u8]) -> Result<(), IoError> {
    std::fs::write(path, bytes).map_err(|e| IoError::Write {
        path: path.display().to_string(),
        message: e.to_string(),
    })
}
