//! Conversation state persistence and uploaded-file access, with a pchat
//! schema-source adapter.

mod adapter;
mod backend;
mod error;
mod files;
mod types;

mod backends {
    pub mod filesystem;
}

pub mod prelude {
    pub use crate::{
        FileSchemaSource, FileService, FilesystemFileService, FilesystemSessionStore,
        InMemorySessionStore, InlineFile, LoadedSession, SessionError, SessionErrorKind,
        SessionRecord, SessionState, SessionStore, SessionStoreConfig, create_session_store,
    };
}

pub use adapter::FileSchemaSource;
pub use backend::{
    DEFAULT_SESSION_ROOT, FilesystemSessionStore, InMemorySessionStore, SessionStore,
    SessionStoreConfig, create_session_store,
};
pub use error::{SessionError, SessionErrorKind};
pub use files::{
    FileService, FilesystemFileService, SCHEMA_SAMPLE_ROWS, csv_schema, filter_inline_files,
    image_format,
};
pub use types::{
    DEFAULT_SESSION_TITLE, InlineFile, LoadedSession, SESSION_TITLE_MAX_CHARS, SessionRecord,
    SessionState, session_title,
};
