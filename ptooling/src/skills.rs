//! Local skill bundles: `{root}/{name}/SKILL.md` plus an optional `recalc.py`.
//!
//! ```rust,no_run
//! use ptooling::SkillLibrary;
//!
//! let library = SkillLibrary::new("skills");
//! let envelope = library.load("xlsx");
//! println!("{:?}: {}", envelope.status, envelope.content);
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::{ToolResultEnvelope, input_object, required_string};

pub const SKILL_INSTRUCTIONS_FILE: &str = "SKILL.md";
pub const SKILL_SCRIPT_FILE: &str = "recalc.py";

#[derive(Debug, Clone)]
pub struct SkillLibrary {
    root: PathBuf,
}

impl SkillLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Loads the skill named by the `skill_name` argument of a `get_skill` call.
    pub fn load_from_input(&self, input: &Value) -> ToolResultEnvelope {
        let name = input_object(input).and_then(|args| required_string(args, "skill_name"));
        match name {
            Ok(name) => self.load(&name),
            Err(err) => loading_error(&err.message),
        }
    }

    pub fn load(&self, name: &str) -> ToolResultEnvelope {
        let Some(dir) = self.bundle_dir(name) else {
            return not_found(name);
        };

        let instructions = match fs::read_to_string(dir.join(SKILL_INSTRUCTIONS_FILE)) {
            Ok(text) => text,
            Err(err) if err.kind() == ErrorKind::NotFound => return not_found(name),
            Err(err) => return loading_error(&err.to_string()),
        };

        let mut text = format!(
            "# {} SKILL INSTRUCTIONS:\n\n{instructions}\n\n",
            name.to_uppercase()
        );

        match fs::read_to_string(dir.join(SKILL_SCRIPT_FILE)) {
            Ok(script) => {
                text.push_str(&format!(
                    "# COMPANION SCRIPT ({SKILL_SCRIPT_FILE}) for {name}:\n```python\n{script}\n```\n"
                ));
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(err) => return loading_error(&err.to_string()),
        }

        ToolResultEnvelope::success_text(text)
    }

    fn bundle_dir(&self, name: &str) -> Option<PathBuf> {
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return None;
        }

        Some(self.root.join(name))
    }
}

fn not_found(name: &str) -> ToolResultEnvelope {
    ToolResultEnvelope::error_text(format!("Skill '{name}' instructions not found."))
}

fn loading_error(reason: &str) -> ToolResultEnvelope {
    ToolResultEnvelope::error_text(format!("Error loading skill: {reason}"))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU64, Ordering};

    use pprovider::ToolStatus;
    use serde_json::json;

    use super::*;

    static NEXT_DIR: AtomicU64 = AtomicU64::new(0);

    fn temp_root() -> PathBuf {
        let root = std::env::temp_dir().join(format!(
            "ptooling-skills-{}-{}",
            std::process::id(),
            NEXT_DIR.fetch_add(1, Ordering::Relaxed)
        ));
        fs::create_dir_all(&root).expect("temp root should be created");
        root
    }

    fn text_of(envelope: &ToolResultEnvelope) -> &str {
        envelope.content["text"].as_str().expect("text content")
    }

    #[test]
    fn instructions_only_bundle_renders_header() {
        let root = temp_root();
        fs::create_dir_all(root.join("demo")).expect("bundle dir");
        fs::write(root.join("demo").join(SKILL_INSTRUCTIONS_FILE), "Use tables.").expect("write");

        let envelope = SkillLibrary::new(&root).load("demo");
        assert_eq!(envelope.status, ToolStatus::Success);
        assert_eq!(
            text_of(&envelope),
            "# DEMO SKILL INSTRUCTIONS:\n\nUse tables.\n\n"
        );

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn companion_script_is_wrapped_in_python_block() {
        let root = temp_root();
        fs::create_dir_all(root.join("xlsx")).expect("bundle dir");
        fs::write(root.join("xlsx").join(SKILL_INSTRUCTIONS_FILE), "Recalculate.").expect("write");
        fs::write(root.join("xlsx").join(SKILL_SCRIPT_FILE), "print('ok')").expect("write");

        let envelope = SkillLibrary::new(&root).load_from_input(&json!({"skill_name": "xlsx"}));
        assert_eq!(
            text_of(&envelope),
            "# XLSX SKILL INSTRUCTIONS:\n\nRecalculate.\n\n\
             # COMPANION SCRIPT (recalc.py) for xlsx:\n```python\nprint('ok')\n```\n"
        );

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn missing_instructions_is_not_found_envelope() {
        let root = temp_root();
        fs::create_dir_all(root.join("empty")).expect("bundle dir");
        fs::write(root.join("empty").join(SKILL_SCRIPT_FILE), "pass").expect("write");

        let envelope = SkillLibrary::new(&root).load("empty");
        assert_eq!(envelope.status, ToolStatus::Error);
        assert_eq!(text_of(&envelope), "Skill 'empty' instructions not found.");

        fs::remove_dir_all(root).ok();
    }

    #[test]
    fn path_like_names_are_rejected() {
        let library = SkillLibrary::new(temp_root());
        for name in ["", "../secrets", "a/b", "a\\b"] {
            let envelope = library.load(name);
            assert_eq!(envelope.status, ToolStatus::Error);
            assert_eq!(
                text_of(&envelope),
                format!("Skill '{name}' instructions not found.")
            );
        }
    }

    #[test]
    fn missing_skill_name_reports_loading_error() {
        let envelope = SkillLibrary::new(temp_root()).load_from_input(&json!({}));
        assert_eq!(envelope.status, ToolStatus::Error);
        assert_eq!(
            text_of(&envelope),
            "Error loading skill: missing required string: 'skill_name'"
        );
    }
}
