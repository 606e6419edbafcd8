//! System prompt assembly: capability text, artifact authoring, file hints.
//!
//! ```rust
//! use pchat::{SystemPrompt, TabularFormat};
//!
//! let prompt = SystemPrompt::new().with_artifacts(true);
//! assert!(prompt.artifacts_enabled());
//! assert_eq!(TabularFormat::from_file_name("Sales.XLSX"), Some(TabularFormat::Excel));
//! assert_eq!(TabularFormat::from_file_name("notes.txt"), None);
//! ```

use pcommon::{SessionId, UserId};
use ptooling::ToolExecutionContext;
use serde::{Deserialize, Serialize};

use crate::{ChatError, ChatFuture};

pub const ASSISTANT_INSTRUCTIONS: &str = "
Use tools whenever they help answer the question.
Work in small, explicit steps:
- Split the task into clear steps.
- For each step, decide whether a tool is needed and call it.
- Tools may be called several times; feed each result into the next step.
- Finish one step before starting the next.

Do not display images from the tmp folder; generated images and plots are already shown to the user.
Run Python code with the code interpreter tool.
";

pub const ARTIFACT_INSTRUCTIONS: &str = r#"
You can build user interfaces, games, and other interactive content as artifacts.

<artifacts>
An artifact is a substantial, self-contained piece of code rendered in a separate window of the user interface.
Output artifact code directly, without Markdown fences or other markup around it.
Never create an artifact and call a tool in the same answer.
Wrap each artifact in an x-artifact tag with its type and name: <x-artifact type="react" name="...">...</x-artifact>
Always include the complete content of the artifact; never abbreviate unchanged parts.
Keep the same name when updating an existing artifact.
Only the "react" and "html" artifact types are supported; prefer "react" unless asked otherwise.

React artifacts:
- Export a default component with no required props, written in TypeScript.
- Build the interface with shadcn/ui components imported from "@/components/ui/<COMPONENT_NAME>".
- Style with Tailwind classes only, without arbitrary values such as h-[600px].
- Import hooks explicitly, e.g. import { useState } from "react".
- Add spacing and center the main content where possible.

HTML artifacts:
- Put HTML, JavaScript, and CSS in a single page.
- External scripts may only be loaded from cdnjs.cloudflare.com.

Use artifacts for substantial, reusable, interactive content. Do not use them for short snippets,
explanations, one-off answers, processing input files, or displaying images.
</artifacts>
"#;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabularFormat {
    Csv,
    Excel,
}

impl TabularFormat {
    pub fn from_file_name(file_name: &str) -> Option<Self> {
        let lower = file_name.to_ascii_lowercase();
        if lower.ends_with(".csv") {
            Some(Self::Csv)
        } else if lower.ends_with(".xlsx") {
            Some(Self::Excel)
        } else {
            None
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Csv => "CSV",
            Self::Excel => "Excel",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSchema {
    pub name: String,
    pub dtype: String,
}

impl ColumnSchema {
    pub fn new(name: impl Into<String>, dtype: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype: dtype.into(),
        }
    }
}

/// Resolves column names and types of an uploaded tabular file.
pub trait SchemaSource: Send + Sync {
    fn tabular_schema<'a>(
        &'a self,
        user_id: &'a UserId,
        session_id: &'a SessionId,
        file_name: &'a str,
        format: TabularFormat,
    ) -> ChatFuture<'a, Result<Vec<ColumnSchema>, ChatError>>;
}

#[derive(Debug, Clone, Default)]
pub struct SystemPrompt {
    artifacts_enabled: bool,
}

impl SystemPrompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_artifacts(mut self, enabled: bool) -> Self {
        self.artifacts_enabled = enabled;
        self
    }

    pub fn artifacts_enabled(&self) -> bool {
        self.artifacts_enabled
    }

    /// Renders the prompt for one request. Schema lookups that fail are
    /// logged and left out.
    pub async fn render(
        &self,
        context: &ToolExecutionContext,
        schemas: Option<&dyn SchemaSource>,
    ) -> String {
        let mut parts = vec![ASSISTANT_INSTRUCTIONS.to_string()];
        if self.artifacts_enabled {
            parts.push(ARTIFACT_INSTRUCTIONS.to_string());
        }

        if context.files.is_empty() {
            return parts.join("\n");
        }

        let names = context
            .files
            .iter()
            .map(|file| file.sanitized.as_str())
            .collect::<Vec<_>>();
        parts.push(format!(
            "The following files are available for the tools: {}",
            names.join(", ")
        ));

        let Some(schemas) = schemas else {
            return parts.join("\n");
        };

        for file in &context.files {
            let Some(format) = TabularFormat::from_file_name(&file.original) else {
                continue;
            };

            match schemas
                .tabular_schema(&context.user_id, &context.session_id, &file.original, format)
                .await
            {
                Ok(columns) => parts.push(schema_hint(&file.sanitized, format, &columns)),
                Err(err) => tracing::warn!(
                    file = %file.original,
                    session_id = %context.session_id,
                    error = %err,
                    "skipping schema hint"
                ),
            }
        }

        parts.join("\n")
    }
}

fn schema_hint(file_name: &str, format: TabularFormat, columns: &[ColumnSchema]) -> String {
    let rows = columns
        .iter()
        .map(|column| format!("{}: {}", column.name, column.dtype))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "\n\nSchema of the {} file {file_name}:\n<schema>{rows}</schema>",
        format.label()
    )
}

#[cfg(test)]
mod tests {
    use ptooling::ToolFile;

    use super::*;

    struct FixedSchemas;

    impl SchemaSource for FixedSchemas {
        fn tabular_schema<'a>(
            &'a self,
            _user_id: &'a UserId,
            _session_id: &'a SessionId,
            file_name: &'a str,
            _format: TabularFormat,
        ) -> ChatFuture<'a, Result<Vec<ColumnSchema>, ChatError>> {
            Box::pin(async move {
                if file_name == "broken.csv" {
                    return Err(ChatError::store("object missing"));
                }
                Ok(vec![
                    ColumnSchema::new("region", "object"),
                    ColumnSchema::new("revenue", "float64"),
                ])
            })
        }
    }

    fn context(paths: &[&str]) -> ToolExecutionContext {
        ToolExecutionContext::new("u1", "s1")
            .with_files(paths.iter().map(|path| ToolFile::from_path(path)).collect())
    }

    #[tokio::test]
    async fn prompt_without_files_has_only_instructions() {
        let prompt = SystemPrompt::new().render(&context(&[]), None).await;
        assert_eq!(prompt, ASSISTANT_INSTRUCTIONS);

        let with_artifacts = SystemPrompt::new()
            .with_artifacts(true)
            .render(&context(&[]), None)
            .await;
        assert!(with_artifacts.contains("<artifacts>"));
    }

    #[tokio::test]
    async fn files_and_schema_hints_are_listed() {
        let prompt = SystemPrompt::new()
            .render(
                &context(&["q3 sales.csv", "broken.csv", "photo.png"]),
                Some(&FixedSchemas),
            )
            .await;

        assert!(prompt.contains(
            "The following files are available for the tools: q3_sales.csv, broken.csv, photo.png"
        ));
        assert!(prompt.contains(
            "Schema of the CSV file q3_sales.csv:\n<schema>region: object\nrevenue: float64</schema>"
        ));
        assert!(!prompt.contains("Schema of the CSV file broken.csv"));
        assert!(!prompt.contains("photo.png:"));
    }
}
