//! Enabled tool catalog, resolved once at configuration time.
//!
//! ```rust
//! use ptooling::{RemoteFunctionId, ToolCatalog, ToolKind, GET_SKILL_TOOL};
//!
//! let mut catalog = ToolCatalog::new();
//! catalog.register_skill_tool();
//! catalog.register_web_search(RemoteFunctionId::new("web-search-fn"));
//!
//! assert_eq!(catalog.resolve(GET_SKILL_TOOL), Some(&ToolKind::LocalSkill));
//! assert!(catalog.resolve("unknown").is_none());
//! assert_eq!(catalog.specs().len(), 2);
//! ```

use std::fmt::{Display, Formatter};

use pcommon::Registry;
use pprovider::ToolSpec;
use serde_json::json;

pub const GET_SKILL_TOOL: &str = "get_skill";
pub const CODE_INTERPRETER_TOOL: &str = "code_interpreter";
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// Identifier of a deployed remote function, such as a function name or URL.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RemoteFunctionId(String);

impl RemoteFunctionId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for RemoteFunctionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolKind {
    LocalSkill,
    Remote(RemoteFunctionId),
}

#[derive(Debug, Clone)]
struct CatalogEntry {
    spec: ToolSpec,
    kind: ToolKind,
}

#[derive(Debug, Default)]
pub struct ToolCatalog {
    order: Vec<String>,
    entries: Registry<String, CatalogEntry>,
}

impl ToolCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool; re-registering a name replaces it in place.
    pub fn register(&mut self, spec: ToolSpec, kind: ToolKind) {
        let name = spec.name.clone();
        if self
            .entries
            .insert(name.clone(), CatalogEntry { spec, kind })
            .is_none()
        {
            self.order.push(name);
        }
    }

    pub fn register_skill_tool(&mut self) {
        self.register(get_skill_spec(), ToolKind::LocalSkill);
    }

    pub fn register_code_interpreter(&mut self, function: RemoteFunctionId) {
        self.register(code_interpreter_spec(), ToolKind::Remote(function));
    }

    pub fn register_web_search(&mut self, function: RemoteFunctionId) {
        self.register(web_search_spec(), ToolKind::Remote(function));
    }

    pub fn resolve(&self, name: &str) -> Option<&ToolKind> {
        self.entries.get(name).map(|entry| &entry.kind)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    /// Tool specifications in registration order.
    pub fn specs(&self) -> Vec<ToolSpec> {
        self.order
            .iter()
            .filter_map(|name| self.entries.get(name))
            .map(|entry| entry.spec.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn get_skill_spec() -> ToolSpec {
    ToolSpec::new(
        GET_SKILL_TOOL,
        "Load the instructions (and companion script, when available) of a named skill \
         before working on a task that the skill covers.",
        json!({
            "type": "object",
            "properties": {
                "skill_name": {
                    "type": "string",
                    "description": "Name of the skill to load, for example 'xlsx'."
                }
            },
            "required": ["skill_name"]
        }),
    )
}

pub fn code_interpreter_spec() -> ToolSpec {
    ToolSpec::new(
        CODE_INTERPRETER_TOOL,
        "Execute Python code in a sandbox with access to the files shared in this session. \
         Returns stdout, stderr, and any generated files.",
        json!({
            "type": "object",
            "properties": {
                "code": {
                    "type": "string",
                    "description": "Python source code to execute."
                }
            },
            "required": ["code"]
        }),
    )
}

pub fn web_search_spec() -> ToolSpec {
    ToolSpec::new(
        WEB_SEARCH_TOOL,
        "Search the web and return the most relevant results with their source URLs.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "Search query."
                }
            },
            "required": ["query"]
        }),
    )
}
