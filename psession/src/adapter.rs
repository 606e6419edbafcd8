//! Adapter that exposes a psession file service as a pchat schema source.

use std::sync::Arc;

use pchat::{ChatError, ChatFuture, ColumnSchema, SchemaSource, TabularFormat};
use pcommon::{SessionId, UserId};

use crate::error::SessionError;
use crate::files::FileService;

#[derive(Clone)]
pub struct FileSchemaSource {
    files: Arc<dyn FileService>,
}

impl FileSchemaSource {
    pub fn new(files: Arc<dyn FileService>) -> Self {
        Self { files }
    }

    pub fn files(&self) -> Arc<dyn FileService> {
        Arc::clone(&self.files)
    }
}

impl SchemaSource for FileSchemaSource {
    fn tabular_schema<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_name: &'a str,
        format: TabularFormat,
    ) -> ChatFuture<'a, Result<Vec<ColumnSchema>, ChatError>> {
        Box::pin(async move {
            self.files
                .tabular_schema(user_id, session_id, file_name, format)
                .await
                .map_err(session_error_to_chat_error)
        })
    }
}

fn session_error_to_chat_error(error: SessionError) -> ChatError {
    ChatError::store(error.to_string())
}
