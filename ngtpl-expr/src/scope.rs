use std::collections::HashMap;
use std::rc::Rc;

use crate::error::EvalError;
use crate::value::Value;

/// Variables visible to an expression.
///
/// A scope is never changed once built: [`Scope::with`] returns a new scope
/// and leaves every existing handle, and whatever captured it, untouched.
#[derive(Debug, Clone, Default)]
pub struct Scope {
    vars: Rc<HashMap<String, Value>>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.vars.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// A copy of this scope with `name` bound to `value`.
    pub fn with(&self, name: impl Into<String>, value: impl Into<Value>) -> Scope {
        let mut vars = (*self.vars).clone();
        vars.insert(name.into(), value.into());
        Scope {
            vars: Rc::new(vars),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.vars.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Build a scope from a JSON object; any other JSON value is rejected.
    pub fn from_json(json: serde_json::Value) -> Result<Scope, EvalError> {
        match json {
            serde_json::Value::Object(map) => {
                Ok(map.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
            serde_json::Value::Null => Ok(Scope::new()),
            other => Err(EvalError::Type(format!(
                "context must be an object, got {}",
                Value::from(other).type_name()
            ))),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Scope {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Scope {
            vars: Rc::new(
                iter.into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }
}
