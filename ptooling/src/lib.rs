//! Capability layer for resolving and executing tool-use requests.

mod args;
mod catalog;
mod dispatcher;
mod error;
mod hooks;
mod remote;
mod skills;
mod types;

pub type ToolFuture<'a, T> = pcommon::BoxFuture<'a, T>;

pub mod prelude {
    pub use crate::{
        NoopToolRuntimeHooks, RemoteFunctionId, RemoteInvoker, SkillLibrary, ToolCatalog,
        ToolDispatcher, ToolError, ToolErrorKind, ToolExecutionContext, ToolFile, ToolFuture,
        ToolInput, ToolKind, ToolRequest, ToolResultEnvelope, ToolRuntime, ToolRuntimeHooks,
    };

    #[cfg(feature = "remote-http")]
    pub use crate::HttpRemoteInvoker;
}

pub use args::{input_object, required_string};
pub use catalog::{
    CODE_INTERPRETER_TOOL, GET_SKILL_TOOL, RemoteFunctionId, ToolCatalog, ToolKind,
    WEB_SEARCH_TOOL, code_interpreter_spec, get_skill_spec, web_search_spec,
};
pub use dispatcher::{ToolDispatcher, ToolRuntime, remote_payload};
pub use error::{ToolError, ToolErrorKind};
pub use hooks::{NoopToolRuntimeHooks, ToolRuntimeHooks};
#[cfg(feature = "remote-http")]
pub use remote::HttpRemoteInvoker;
pub use remote::RemoteInvoker;
pub use skills::{SKILL_INSTRUCTIONS_FILE, SKILL_SCRIPT_FILE, SkillLibrary};
pub use types::{ToolExecutionContext, ToolFile, ToolInput, ToolRequest, ToolResultEnvelope};
