//! Access to files a user uploaded into a session.
//!
//! ```rust
//! use psession::{filter_inline_files, image_format};
//!
//! let requested = vec!["chart.PNG".to_string(), "data.csv".to_string(), "old.jpg".to_string()];
//! let inlined = vec!["old.jpg".to_string()];
//!
//! assert_eq!(filter_inline_files(&requested, &inlined), vec!["chart.PNG"]);
//! assert_eq!(image_format("photo.jpg"), Some("jpeg"));
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use pchat::{ColumnSchema, TabularFormat};
use pcommon::{BoxFuture, SessionId, UserId};

use crate::error::SessionError;
use crate::types::InlineFile;

/// Rows read past the header when inferring column types.
pub const SCHEMA_SAMPLE_ROWS: usize = 100;

/// Image format accepted as inline model input, keyed by file extension.
pub fn image_format(file_name: &str) -> Option<&'static str> {
    let extension = Path::new(file_name)
        .extension()?
        .to_str()?
        .to_ascii_lowercase();
    match extension.as_str() {
        "png" => Some("png"),
        "jpg" | "jpeg" => Some("jpeg"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        _ => None,
    }
}

/// Requested files that should be sent inline and have not been yet, in
/// request order and without duplicates.
pub fn filter_inline_files(requested: &[String], already_inlined: &[String]) -> Vec<String> {
    let mut selected: Vec<String> = Vec::new();
    for file in requested {
        if image_format(file).is_none()
            || already_inlined.contains(file)
            || selected.contains(file)
        {
            continue;
        }
        selected.push(file.clone());
    }
    selected
}

pub trait FileService: Send + Sync {
    fn inline_file_data<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_names: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<InlineFile>, SessionError>>;

    fn tabular_schema<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_name: &'a str,
        format: TabularFormat,
    ) -> BoxFuture<'a, Result<Vec<ColumnSchema>, SessionError>>;
}

/// Reads uploads from `<root>/<user_id>/<session_id>/<file_name>`.
#[derive(Debug, Clone)]
pub struct FilesystemFileService {
    root: PathBuf,
}

impl FilesystemFileService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn file_path(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        file_name: &str,
    ) -> Result<PathBuf, SessionError> {
        for segment in [user_id.as_str(), session_id.as_str(), file_name] {
            if segment.is_empty()
                || segment.contains(['/', '\\'])
                || segment == "."
                || segment == ".."
            {
                return Err(SessionError::invalid_request(format!(
                    "invalid path segment: '{segment}'"
                )));
            }
        }
        Ok(self
            .root
            .join(user_id.as_str())
            .join(session_id.as_str())
            .join(file_name))
    }

    fn read(
        &self,
        user_id: &UserId,
        session_id: &SessionId,
        file_name: &str,
    ) -> Result<Vec<u8>, SessionError> {
        let path = self.file_path(user_id, session_id, file_name)?;
        fs::read(&path).map_err(|error| match error.kind() {
            std::io::ErrorKind::NotFound => {
                SessionError::not_found(format!("file '{file_name}' not found"))
            }
            _ => SessionError::storage(format!("failed to read '{file_name}': {error}")),
        })
    }
}

impl FileService for FilesystemFileService {
    fn inline_file_data<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_names: &'a [String],
    ) -> BoxFuture<'a, Result<Vec<InlineFile>, SessionError>> {
        Box::pin(async move {
            let mut files = Vec::with_capacity(file_names.len());
            for file_name in file_names {
                let Some(format) = image_format(file_name) else {
                    return Err(SessionError::invalid_request(format!(
                        "'{file_name}' is not an inline image"
                    )));
                };
                files.push(InlineFile {
                    file_name: file_name.clone(),
                    format: format.to_string(),
                    data: self.read(user_id, session_id, file_name)?,
                });
            }
            Ok(files)
        })
    }

    fn tabular_schema<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_name: &'a str,
        format: TabularFormat,
    ) -> BoxFuture<'a, Result<Vec<ColumnSchema>, SessionError>> {
        Box::pin(async move {
            match format {
                TabularFormat::Csv => {
                    let bytes = self.read(user_id, session_id, file_name)?;
                    let text = String::from_utf8_lossy(&bytes);
                    csv_schema(&text)
                }
                TabularFormat::Excel => Err(SessionError::invalid_request(format!(
                    "schema inference is not available for Excel file '{file_name}'"
                ))),
            }
        })
    }
}

/// Column names from the header row and dtypes inferred from sampled rows.
pub fn csv_schema(text: &str) -> Result<Vec<ColumnSchema>, SessionError> {
    let mut lines = text.lines().filter(|line| !line.trim().is_empty());
    let Some(header) = lines.next() else {
        return Err(SessionError::invalid_request("csv file has no header row"));
    };

    let names = split_csv_line(header);
    let mut dtypes = vec![ColumnType::Empty; names.len()];
    for line in lines.take(SCHEMA_SAMPLE_ROWS) {
        for (dtype, value) in dtypes.iter_mut().zip(split_csv_line(line)) {
            *dtype = dtype.widen(&value);
        }
    }

    Ok(names
        .into_iter()
        .zip(dtypes)
        .map(|(name, dtype)| ColumnSchema::new(name, dtype.label()))
        .collect())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ColumnType {
    Empty,
    Bool,
    Int,
    Float,
    Object,
}

impl ColumnType {
    fn widen(self, value: &str) -> Self {
        let value = value.trim();
        if value.is_empty() {
            return self;
        }

        let observed = if value.eq_ignore_ascii_case("true") || value.eq_ignore_ascii_case("false")
        {
            Self::Bool
        } else if value.parse::<i64>().is_ok() {
            Self::Int
        } else if value.parse::<f64>().is_ok() {
            Self::Float
        } else {
            Self::Object
        };

        match (self, observed) {
            (Self::Empty, next) => next,
            (current, next) if current == next => current,
            (Self::Int, Self::Float) | (Self::Float, Self::Int) => Self::Float,
            _ => Self::Object,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Int => "int64",
            Self::Float => "float64",
            Self::Empty | Self::Object => "object",
        }
    }
}

fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current).trim().to_string()),
            _ => current.push(ch),
        }
    }
    fields.push(current.trim().to_string());
    fields
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn csv_schema_infers_column_types() {
        let schema = csv_schema(
            "region,units,price,active,\"note, quoted\"\n\
             north,3,2.5,true,a\n\
             south,4,3,false,\"b, c\"\n",
        )
        .expect("schema should infer");

        assert_eq!(
            schema,
            vec![
                ColumnSchema::new("region", "object"),
                ColumnSchema::new("units", "int64"),
                ColumnSchema::new("price", "float64"),
                ColumnSchema::new("active", "bool"),
                ColumnSchema::new("note, quoted", "object"),
            ]
        );
    }

    #[test]
    fn empty_csv_is_rejected() {
        assert!(csv_schema("\n\n").is_err());
    }

    #[test]
    fn file_path_rejects_traversal() {
        let service = FilesystemFileService::new("/data");
        let user = UserId::from("u1");
        let session = SessionId::from("s1");

        assert!(service.file_path(&user, &session, "../secret").is_err());
        assert!(service.file_path(&user, &SessionId::from(".."), "a.png").is_err());
        assert_eq!(
            service
                .file_path(&user, &session, "a.png")
                .expect("path should resolve"),
            PathBuf::from("/data/u1/s1/a.png")
        );
    }

    #[test]
    fn only_new_images_are_inlined() {
        let requested = ["a.png", "a.png", "b.csv", "c.webp"]
            .map(String::from)
            .to_vec();
        assert_eq!(
            filter_inline_files(&requested, &["c.webp".to_string()]),
            vec!["a.png"]
        );
    }
}
