//! Process configuration read once from the environment.
//!
//! ```rust
//! use parley::AppConfig;
//!
//! let config = AppConfig::from_lookup(|key| match key {
//!     "AWS_REGION" => Some("eu-west-1".to_string()),
//!     "INFERENCE_MODEL" => Some("claude-sonnet".to_string()),
//!     "TOOL_WEB_SEARCH" => Some("web-search".to_string()),
//!     _ => None,
//! })
//! .expect("config should load");
//!
//! assert_eq!(config.inference_region, "eu-west-1");
//! assert!(config.web_search.is_some());
//! assert!(config.code_interpreter.is_none());
//! ```

use std::path::PathBuf;

use pcommon::InferenceOptions;
use psession::DEFAULT_SESSION_ROOT;
use ptooling::RemoteFunctionId;

use crate::HandlerError;

pub const DEFAULT_SKILLS_DIR: &str = "skills";
pub const DEFAULT_FILES_ROOT: &str = "uploads";

#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Advisory: logged at startup. Sessions and uploads live on the local
    /// filesystem, so no client is bound to this region.
    pub storage_region: String,
    /// Advisory: logged at startup. The inference endpoint is chosen by
    /// `inference_endpoint` alone.
    pub inference_region: String,
    /// Base URL of the inference service; the provider default when absent.
    pub inference_endpoint: Option<String>,
    pub model_id: String,
    pub api_key: Option<String>,
    pub code_interpreter: Option<RemoteFunctionId>,
    pub web_search: Option<RemoteFunctionId>,
    /// Base URL joined with relative remote function ids.
    pub tool_endpoint: Option<String>,
    pub artifacts_enabled: bool,
    pub skills_dir: PathBuf,
    pub session_root: PathBuf,
    pub files_root: PathBuf,
    pub options: InferenceOptions,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, HandlerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from `lookup`; blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HandlerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let require = |key: &str| {
            get(key).ok_or_else(|| HandlerError::config(format!("{key} must be set")))
        };

        let storage_region = require("AWS_REGION")?;
        Ok(Self {
            inference_region: get("INFERENCE_REGION").unwrap_or_else(|| storage_region.clone()),
            storage_region,
            inference_endpoint: get("INFERENCE_ENDPOINT"),
            model_id: require("INFERENCE_MODEL")?,
            api_key: get("INFERENCE_API_KEY"),
            code_interpreter: get("TOOL_CODE_INTERPRETER").map(RemoteFunctionId::new),
            web_search: get("TOOL_WEB_SEARCH").map(RemoteFunctionId::new),
            tool_endpoint: get("TOOL_ENDPOINT"),
            artifacts_enabled: get("ARTIFACTS_ENABLED").as_deref() == Some("1"),
            skills_dir: get("SKILLS_DIR")
                .unwrap_or_else(|| DEFAULT_SKILLS_DIR.to_string())
                .into(),
            session_root: get("SESSION_ROOT")
                .unwrap_or_else(|| DEFAULT_SESSION_ROOT.to_string())
                .into(),
            files_root: get("FILES_ROOT")
                .unwrap_or_else(|| DEFAULT_FILES_ROOT.to_string())
                .into(),
            options: InferenceOptions::default(),
        })
    }
}
