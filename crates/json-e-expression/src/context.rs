//! Evaluation context: the name → value mapping expressions run against.

use crate::builtins;
use crate::error::Error;
use crate::value::{Function, Value};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Immutable chain of scopes. Cloning is cheap and yields an independent
/// snapshot, since no scope is ever mutated after construction.
#[derive(Clone)]
pub struct Context {
    scope: Arc<Scope>,
}

struct Scope {
    bindings: HashMap<String, Value>,
    parent: Option<Arc<Scope>>,
}

impl Context {
    /// A context with no bindings at all, not even builtins.
    pub fn empty() -> Self {
        Context {
            scope: Arc::new(Scope {
                bindings: HashMap::new(),
                parent: None,
            }),
        }
    }

    /// The shared builtin registry, built once per process.
    pub fn builtins() -> Context {
        static BUILTINS: OnceLock<Context> = OnceLock::new();
        BUILTINS
            .get_or_init(|| {
                let bindings = builtins::definitions()
                    .map(|def| (def.name.to_string(), Value::Function(Function::builtin(def))))
                    .collect();
                Context {
                    scope: Arc::new(Scope {
                        bindings,
                        parent: None,
                    }),
                }
            })
            .clone()
    }

    /// Builtins merged with the entries of a JSON object; user entries win.
    pub fn from_json(values: serde_json::Value) -> Result<Context, Error> {
        Ok(ContextBuilder::new().json(values)?.build())
    }

    /// Looks a name up, innermost scope first.
    pub fn get(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(&self.scope);
        while let Some(current) = scope {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            scope = current.parent.as_ref();
        }
        None
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns a new context extending this one with `bindings`.
    pub fn bind<I>(&self, bindings: I) -> Context
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        Context {
            scope: Arc::new(Scope {
                bindings: bindings.into_iter().collect(),
                parent: Some(Arc::clone(&self.scope)),
            }),
        }
    }
}

impl Default for Context {
    fn default() -> Self {
        ContextBuilder::new().build()
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut depth = 0;
        let mut scope = Some(&self.scope);
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent.as_ref();
        }
        f.debug_struct("Context")
            .field("names", &self.scope.bindings.keys().collect::<Vec<_>>())
            .field("depth", &depth)
            .finish()
    }
}

/// Assembles the context for one render.
pub struct ContextBuilder {
    builtins: bool,
    now: Option<String>,
    values: HashMap<String, Value>,
}

impl ContextBuilder {
    pub fn new() -> Self {
        ContextBuilder {
            builtins: true,
            now: None,
            values: HashMap::new(),
        }
    }

    /// Whether the builtin library is seeded (default: yes).
    pub fn builtins(mut self, enabled: bool) -> Self {
        self.builtins = enabled;
        self
    }

    /// Reference timestamp exposed as `now`; `fromNow` offsets from it.
    pub fn now(mut self, now: impl Into<String>) -> Self {
        self.now = Some(now.into());
        self
    }

    pub fn value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    /// Adds every entry of a JSON object.
    pub fn json(mut self, values: serde_json::Value) -> Result<Self, Error> {
        match values {
            serde_json::Value::Object(map) => {
                for (name, value) in map {
                    self.values.insert(name, Value::from(value));
                }
                Ok(self)
            }
            other => Err(Error::interpreter(format!(
                "context must be an object, found {}",
                Value::from(other).type_name()
            ))),
        }
    }

    pub fn build(self) -> Context {
        let base = if self.builtins {
            Context::builtins()
        } else {
            Context::empty()
        };
        let mut bindings = HashMap::with_capacity(self.values.len() + 1);
        if let Some(now) = self.now {
            bindings.insert("now".to_string(), Value::String(now));
        }
        bindings.extend(self.values);
        base.bind(bindings)
    }
}

impl Default for ContextBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_values_shadow_builtins() {
        let ctx = Context::from_json(json!({"max": 5})).unwrap();
        assert_eq!(ctx.get("max"), Some(&Value::Number(5.0)));
        assert!(matches!(ctx.get("min"), Some(Value::Function(_))));
    }

    #[test]
    fn test_without_builtins() {
        let ctx = ContextBuilder::new().builtins(false).value("a", 1i64).build();
        assert!(ctx.contains("a"));
        assert!(!ctx.contains("min"));
    }

    #[test]
    fn test_bind_does_not_affect_parent() {
        let ctx = Context::empty().bind(vec![("x".to_string(), Value::from(1i64))]);
        let child = ctx.bind(vec![("x".to_string(), Value::from(2i64))]);
        assert_eq!(ctx.get("x"), Some(&Value::Number(1.0)));
        assert_eq!(child.get("x"), Some(&Value::Number(2.0)));
    }

    #[test]
    fn test_now_and_non_object_context() {
        let ctx = ContextBuilder::new().now("2020-01-01T00:00:00.000Z").build();
        assert_eq!(ctx.get("now"), Some(&Value::from("2020-01-01T00:00:00.000Z")));
        assert!(Context::from_json(json!([1])).is_err());
    }

    #[test]
    fn test_builtins_are_shared() {
        let a = Context::builtins();
        let b = Context::builtins();
        assert_eq!(a.get("sqrt"), b.get("sqrt"));
    }
}
