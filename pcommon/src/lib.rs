//! Shared utilities and strongly-typed common values for workspace crates.
//!
//! ```rust
//! use pcommon::{ExtraMap, InferenceOptions, SessionId, UserId};
//!
//! let session = SessionId::from("session-1");
//! let user = UserId::new("user-1");
//! let mut extra = ExtraMap::new();
//! extra.insert("status".to_string(), "running".into());
//!
//! let options = InferenceOptions::default().with_temperature(0.3);
//! assert_eq!(session.as_str(), "session-1");
//! assert_eq!(user.to_string(), "user-1");
//! assert_eq!(options.max_tokens, 5120);
//! ```

pub mod future {
    //! Shared async future aliases.
    //!
    //! ```rust
    //! use pcommon::BoxFuture;
    //!
    //! fn str_len<'a>(value: &'a str) -> BoxFuture<'a, usize> {
    //!     Box::pin(async move { value.len() })
    //! }
    //!
    //! let _future = str_len("hello");
    //! ```

    use std::future::Future;
    use std::pin::Pin;

    pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;
}

pub mod context {
    //! Identifier newtypes and the opaque metadata maps shared by tools and transports.
    //!
    //! ```rust
    //! use pcommon::{ExtraMap, SessionId, ToolExtraMap, UserId};
    //!
    //! let session = SessionId::new("session-42");
    //! let user = UserId::from("user-42");
    //! let mut extras = ToolExtraMap::new();
    //! extras.insert("tooluse_1".to_string(), ExtraMap::new());
    //!
    //! assert_eq!(session.to_string(), "session-42");
    //! assert_eq!(user.as_str(), "user-42");
    //! assert!(extras.contains_key("tooluse_1"));
    //! ```

    use std::collections::BTreeMap;
    use std::fmt::{Display, Formatter};

    use serde::{Deserialize, Serialize};

    /// Opaque key-value metadata attached to a tool result.
    pub type ExtraMap = serde_json::Map<String, serde_json::Value>;

    /// Turn-scoped extras keyed by tool-use id.
    pub type ToolExtraMap = BTreeMap<String, ExtraMap>;

    macro_rules! string_id {
        ($name:ident) => {
            #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
            #[serde(transparent)]
            pub struct $name(String);

            impl $name {
                pub fn new(value: impl Into<String>) -> Self {
                    Self(value.into())
                }

                pub fn as_str(&self) -> &str {
                    self.0.as_str()
                }
            }

            impl Display for $name {
                fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
                    f.write_str(&self.0)
                }
            }

            impl From<String> for $name {
                fn from(value: String) -> Self {
                    Self(value)
                }
            }

            impl From<&str> for $name {
                fn from(value: &str) -> Self {
                    Self(value.to_string())
                }
            }
        };
    }

    string_id!(SessionId);
    string_id!(UserId);
}

pub mod model {
    //! Inference settings shared by request types.
    //!
    //! ```rust
    //! use pcommon::InferenceOptions;
    //!
    //! let options = InferenceOptions::default()
    //!     .with_temperature(0.2)
    //!     .with_max_tokens(128);
    //!
    //! assert_eq!(options.temperature, 0.2);
    //! assert_eq!(options.max_tokens, 128);
    //! ```

    use serde::{Deserialize, Serialize};

    pub const DEFAULT_MAX_TOKENS: u32 = 5120;
    pub const DEFAULT_TEMPERATURE: f32 = 0.5;

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct InferenceOptions {
        pub max_tokens: u32,
        pub temperature: f32,
    }

    impl Default for InferenceOptions {
        fn default() -> Self {
            Self {
                max_tokens: DEFAULT_MAX_TOKENS,
                temperature: DEFAULT_TEMPERATURE,
            }
        }
    }

    impl InferenceOptions {
        pub fn with_temperature(mut self, temperature: f32) -> Self {
            self.temperature = temperature;
            self
        }

        pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
            self.max_tokens = max_tokens;
            self
        }
    }
}

pub mod registry {
    //! Generic registry map wrapper used by runtime registries.
    //!
    //! ```rust
    //! use pcommon::Registry;
    //!
    //! let mut registry = Registry::new();
    //! registry.insert("alpha".to_string(), 1_u32);
    //!
    //! assert_eq!(registry.get("alpha"), Some(&1));
    //! assert!(registry.contains_key("alpha"));
    //! ```

    use std::borrow::Borrow;
    use std::collections::HashMap;
    use std::hash::Hash;

    #[derive(Debug, Clone)]
    pub struct Registry<K, V> {
        items: HashMap<K, V>,
    }

    impl<K, V> Default for Registry<K, V>
    where
        K: Eq + Hash,
    {
        fn default() -> Self {
            Self {
                items: HashMap::new(),
            }
        }
    }

    impl<K, V> Registry<K, V>
    where
        K: Eq + Hash,
    {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn insert(&mut self, key: K, value: V) -> Option<V> {
            self.items.insert(key, value)
        }

        pub fn get<Q>(&self, key: &Q) -> Option<&V>
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.get(key)
        }

        pub fn contains_key<Q>(&self, key: &Q) -> bool
        where
            K: Borrow<Q>,
            Q: Eq + Hash + ?Sized,
        {
            self.items.contains_key(key)
        }

        pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
            self.items.iter()
        }

        pub fn len(&self) -> usize {
            self.items.len()
        }

        pub fn is_empty(&self) -> bool {
            self.items.is_empty()
        }
    }
}

pub use context::{ExtraMap, SessionId, ToolExtraMap, UserId};
pub use future::BoxFuture;
pub use model::{DEFAULT_MAX_TOKENS, DEFAULT_TEMPERATURE, InferenceOptions};
pub use registry::Registry;

#[cfg(test)]
mod tests {
    use super::{InferenceOptions, Registry, SessionId, UserId};

    #[test]
    fn id_newtypes_round_trip_strings() {
        let session = SessionId::new("session-1");
        let user = UserId::from("user-1");

        assert_eq!(session.as_str(), "session-1");
        assert_eq!(user.as_str(), "user-1");
        assert_eq!(session.to_string(), "session-1");
        assert_eq!(
            serde_json::to_string(&user).expect("user id should serialize"),
            "\"user-1\""
        );
    }

    #[test]
    fn inference_options_default_to_handler_constants() {
        let options = InferenceOptions::default();
        assert_eq!(options.max_tokens, 5120);
        assert_eq!(options.temperature, 0.5);

        let tuned = options.with_temperature(0.1).with_max_tokens(64);
        assert_eq!(tuned.temperature, 0.1);
        assert_eq!(tuned.max_tokens, 64);
    }

    #[test]
    fn generic_registry_basic_lifecycle() {
        let mut registry = Registry::new();
        assert!(registry.is_empty());

        registry.insert("alpha".to_string(), 1_u32);
        assert_eq!(registry.get("alpha"), Some(&1));
        assert!(registry.contains_key("alpha"));
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.iter().count(), 1);
    }
}
