//! Render-time contract of the rewritten templates.
//!
//! Rewritten output calls four reserved helpers. They are reachable only by
//! their `-`-prefixed names, which user templates cannot declare:
//!
//! - `-named-block-invocation name` builds an identity marker for `name`.
//! - `-is-named-block-invocation value name` tests a marker.
//! - `-has-block info name fallback` / `-has-block-params info name fallback`
//!   answer block queries from the invocation metadata.
//!
//! A marker owns its block name and compares by identity, so two markers for
//! the same name are distinct values that both test positive for that name.
//! Nothing outlives the values holding a marker.

use indexmap::IndexMap;
use std::fmt;
use std::rc::Rc;
use thiserror::Error;

use crate::classify::DEFAULT_BLOCK;

pub const NAMED_BLOCK_INVOCATION_HELPER: &str = "-named-block-invocation";
pub const IS_NAMED_BLOCK_INVOCATION_HELPER: &str = "-is-named-block-invocation";
pub const HAS_BLOCK_HELPER: &str = "-has-block";
pub const HAS_BLOCK_PARAMS_HELPER: &str = "-has-block-params";

/// Opaque identity of one marker.
#[derive(Debug, Clone)]
pub struct InvocationHandle(Rc<str>);

impl PartialEq for InvocationHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for InvocationHandle {}

/// Values flowing through helper calls at render time.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(String),
    Array(Vec<Value>),
    Hash(IndexMap<String, Value>),
    Invocation(InvocationHandle),
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => *n != 0.0 && !n.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(items) => !items.is_empty(),
            Value::Hash(_) | Value::Invocation(_) => true,
        }
    }

    fn type_name(&self) -> &'static str {
        match self {
            Value::Undefined => "undefined",
            Value::Null => "null",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Hash(_) => "hash",
            Value::Invocation(_) => "invocation",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Undefined | Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Number(n) => write!(f, "{}", n),
            Value::String(s) => f.write_str(s),
            Value::Array(items) => {
                let rendered: Vec<String> = items.iter().map(Value::to_string).collect();
                f.write_str(&rendered.join(","))
            }
            Value::Hash(_) => f.write_str("[object Object]"),
            Value::Invocation(handle) => write!(
                f,
                "{{{{yield to={}}}}}",
                serde_json::Value::from(handle.0.as_ref())
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RuntimeError {
    #[error("{helper} takes {expected}")]
    Arity {
        helper: &'static str,
        expected: &'static str,
    },
    #[error("{helper} does not take named arguments")]
    NamedArguments { helper: &'static str },
    #[error("{helper}: expected {expected} for argument {index}, got {actual}")]
    ArgumentType {
        helper: &'static str,
        index: usize,
        expected: &'static str,
        actual: &'static str,
    },
    #[error("unknown helper `{0}`")]
    UnknownHelper(String),
}

/// Serves the reserved helpers at render time.
#[derive(Debug, Default)]
pub struct Runtime;

impl Runtime {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh marker tagged with `block`.
    pub fn mark_invocation(&self, block: &str) -> Value {
        Value::Invocation(InvocationHandle(Rc::from(block)))
    }

    /// Whether `value` is a marker for `block`. Anything that is not a marker
    /// stands for the default block.
    pub fn is_invocation_of(&self, value: &Value, block: &str) -> bool {
        match self.tag_of(value) {
            Some(tag) => tag == block,
            None => block == DEFAULT_BLOCK,
        }
    }

    fn tag_of<'v>(&self, value: &'v Value) -> Option<&'v str> {
        match value {
            Value::Invocation(handle) => Some(&handle.0),
            _ => None,
        }
    }

    /// Calls one of the reserved helpers with positional `params` and named `hash`.
    pub fn call_helper(
        &self,
        name: &str,
        params: &[Value],
        hash: &IndexMap<String, Value>,
    ) -> Result<Value, RuntimeError> {
        match name {
            NAMED_BLOCK_INVOCATION_HELPER => {
                let helper = NAMED_BLOCK_INVOCATION_HELPER;
                if params.len() != 1 {
                    return Err(RuntimeError::Arity {
                        helper,
                        expected: "a single string argument",
                    });
                }
                no_named_arguments(helper, hash)?;
                let block = expect_string(helper, params, 0)?;
                Ok(self.mark_invocation(block))
            }
            IS_NAMED_BLOCK_INVOCATION_HELPER => {
                let helper = IS_NAMED_BLOCK_INVOCATION_HELPER;
                if params.len() != 2 {
                    return Err(RuntimeError::Arity {
                        helper,
                        expected: "exactly two arguments: the invocation value to check and the \
                                   name of the block",
                    });
                }
                no_named_arguments(helper, hash)?;
                let block = expect_string(helper, params, 1)?;
                Ok(Value::Bool(self.is_invocation_of(&params[0], block)))
            }
            HAS_BLOCK_HELPER | HAS_BLOCK_PARAMS_HELPER => {
                let (helper, with_params) = if name == HAS_BLOCK_HELPER {
                    (HAS_BLOCK_HELPER, false)
                } else {
                    (HAS_BLOCK_PARAMS_HELPER, true)
                };
                has_block(helper, params, hash, with_params).map(Value::Bool)
            }
            other => Err(RuntimeError::UnknownHelper(other.to_string())),
        }
    }
}

/// Whether `value` has the invocation-metadata shape: a hash whose values are
/// all numbers (the arity of each named block).
pub fn is_metadata_shape(value: &Value) -> bool {
    match value {
        Value::Hash(entries) => entries.values().all(|v| matches!(v, Value::Number(_))),
        _ => false,
    }
}

fn has_block(
    helper: &'static str,
    params: &[Value],
    hash: &IndexMap<String, Value>,
    with_params: bool,
) -> Result<bool, RuntimeError> {
    if params.len() != 3 {
        return Err(RuntimeError::Arity {
            helper,
            expected: "exactly three arguments: the blocks info hash, the name of the block \
                       and the fallback value",
        });
    }
    no_named_arguments(helper, hash)?;

    let info = &params[0];
    if !matches!(info, Value::Undefined) && !is_metadata_shape(info) {
        return Err(RuntimeError::ArgumentType {
            helper,
            index: 0,
            expected: "a blocks info hash",
            actual: info.type_name(),
        });
    }
    let block = expect_string(helper, params, 1)?;
    let fallback = match &params[2] {
        Value::Bool(b) => *b,
        other => {
            return Err(RuntimeError::ArgumentType {
                helper,
                index: 2,
                expected: "boolean",
                actual: other.type_name(),
            })
        }
    };

    let Value::Hash(entries) = info else {
        return Ok(fallback);
    };

    Ok(match entries.get(block) {
        Some(Value::Number(arity)) if with_params => *arity > 0.0,
        Some(_) => !with_params,
        None => false,
    })
}

fn no_named_arguments(
    helper: &'static str,
    hash: &IndexMap<String, Value>,
) -> Result<(), RuntimeError> {
    if hash.is_empty() {
        Ok(())
    } else {
        Err(RuntimeError::NamedArguments { helper })
    }
}

fn expect_string<'a>(
    helper: &'static str,
    params: &'a [Value],
    index: usize,
) -> Result<&'a str, RuntimeError> {
    match &params[index] {
        Value::String(s) => Ok(s),
        other => Err(RuntimeError::ArgumentType {
            helper,
            index,
            expected: "string",
            actual: other.type_name(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(entries: &[(&str, f64)]) -> Value {
        Value::Hash(
            entries
                .iter()
                .map(|(k, v)| (k.to_string(), Value::Number(*v)))
                .collect(),
        )
    }

    #[test]
    fn test_marker_matches_its_own_name_only() {
        let rt = Runtime::new();
        let x = rt.mark_invocation("x");
        assert!(rt.is_invocation_of(&x, "x"));
        assert!(!rt.is_invocation_of(&x, "y"));
        assert!(!rt.is_invocation_of(&x, DEFAULT_BLOCK));
    }

    #[test]
    fn test_untagged_values_are_default_invocations() {
        let rt = Runtime::new();
        for value in [
            Value::Undefined,
            Value::String("x".to_string()),
            Value::Number(1.0),
            metadata(&[]),
        ] {
            assert!(rt.is_invocation_of(&value, DEFAULT_BLOCK));
            assert!(!rt.is_invocation_of(&value, "x"));
        }
    }

    #[test]
    fn test_markers_are_distinct_by_identity() {
        let rt = Runtime::new();
        let a = rt.mark_invocation("main");
        let b = rt.mark_invocation("main");
        assert_ne!(a, b);
        assert!(rt.is_invocation_of(&a, "main"));
        assert!(rt.is_invocation_of(&b, "main"));
    }

    #[test]
    fn test_marker_owns_its_tag() {
        let marker = Runtime::new().mark_invocation("main");
        let Value::Invocation(handle) = &marker else {
            panic!("expected a marker");
        };
        assert_eq!(Rc::strong_count(&handle.0), 1);

        let copy = marker.clone();
        assert_eq!(copy, marker);
        assert!(Runtime::new().is_invocation_of(&copy, "main"));

        drop(copy);
        let Value::Invocation(handle) = &marker else {
            unreachable!();
        };
        assert_eq!(Rc::strong_count(&handle.0), 1);
    }

    #[test]
    fn test_marker_description() {
        let marker = Runtime::new().mark_invocation("main");
        assert_eq!(marker.to_string(), "{{yield to=\"main\"}}");
        assert_eq!(Value::Null.to_string(), "");
    }

    #[test]
    fn test_metadata_shape() {
        assert!(is_metadata_shape(&metadata(&[("default", 1.0), ("main", 0.0)])));
        assert!(is_metadata_shape(&metadata(&[])));

        let mut bad = IndexMap::new();
        bad.insert("main".to_string(), Value::String("0".to_string()));
        assert!(!is_metadata_shape(&Value::Hash(bad)));
        assert!(!is_metadata_shape(&Value::Undefined));
        assert!(!is_metadata_shape(&Value::Array(vec![Value::Number(1.0)])));
    }

    #[test]
    fn test_helper_arity_checks() {
        let rt = Runtime::new();
        let none = IndexMap::new();

        assert!(matches!(
            rt.call_helper(NAMED_BLOCK_INVOCATION_HELPER, &[], &none),
            Err(RuntimeError::Arity { .. })
        ));
        assert!(matches!(
            rt.call_helper(NAMED_BLOCK_INVOCATION_HELPER, &[Value::Number(1.0)], &none),
            Err(RuntimeError::ArgumentType { index: 0, .. })
        ));
        assert!(matches!(
            rt.call_helper(IS_NAMED_BLOCK_INVOCATION_HELPER, &[Value::Undefined], &none),
            Err(RuntimeError::Arity { .. })
        ));

        let mut named = IndexMap::new();
        named.insert("to".to_string(), Value::String("main".to_string()));
        assert!(matches!(
            rt.call_helper(
                NAMED_BLOCK_INVOCATION_HELPER,
                &[Value::String("main".to_string())],
                &named
            ),
            Err(RuntimeError::NamedArguments { .. })
        ));

        assert!(matches!(
            rt.call_helper("-nope", &[], &none),
            Err(RuntimeError::UnknownHelper(_))
        ));
    }

    #[test]
    fn test_helpers_round_trip_through_markers() {
        let rt = Runtime::new();
        let none = IndexMap::new();
        let marker = rt
            .call_helper(
                NAMED_BLOCK_INVOCATION_HELPER,
                &[Value::String("main".to_string())],
                &none,
            )
            .unwrap();

        let hit = rt
            .call_helper(
                IS_NAMED_BLOCK_INVOCATION_HELPER,
                &[marker.clone(), Value::String("main".to_string())],
                &none,
            )
            .unwrap();
        assert_eq!(hit, Value::Bool(true));

        let miss = rt
            .call_helper(
                IS_NAMED_BLOCK_INVOCATION_HELPER,
                &[marker, Value::String("default".to_string())],
                &none,
            )
            .unwrap();
        assert_eq!(miss, Value::Bool(false));
    }

    #[test]
    fn test_has_block_helpers() {
        let rt = Runtime::new();
        let none = IndexMap::new();
        let info = metadata(&[("default", 3.0), ("main", 0.0)]);

        let mut ask = |helper: &str, info: &Value, block: &str, fallback: bool| {
            rt.call_helper(
                helper,
                &[
                    info.clone(),
                    Value::String(block.to_string()),
                    Value::Bool(fallback),
                ],
                &none,
            )
            .unwrap()
        };

        assert_eq!(ask(HAS_BLOCK_HELPER, &info, "default", false), Value::Bool(true));
        assert_eq!(ask(HAS_BLOCK_HELPER, &info, "main", false), Value::Bool(true));
        assert_eq!(ask(HAS_BLOCK_HELPER, &info, "other", true), Value::Bool(false));
        assert_eq!(ask(HAS_BLOCK_PARAMS_HELPER, &info, "default", false), Value::Bool(true));
        assert_eq!(ask(HAS_BLOCK_PARAMS_HELPER, &info, "main", true), Value::Bool(false));

        assert_eq!(ask(HAS_BLOCK_HELPER, &Value::Undefined, "main", true), Value::Bool(true));
        assert_eq!(
            ask(HAS_BLOCK_PARAMS_HELPER, &Value::Undefined, "main", false),
            Value::Bool(false)
        );
    }

    #[test]
    fn test_has_block_rejects_bad_arguments() {
        let rt = Runtime::new();
        let none = IndexMap::new();
        let err = rt
            .call_helper(
                HAS_BLOCK_PARAMS_HELPER,
                &[
                    Value::Undefined,
                    Value::String("main".to_string()),
                    Value::String("no".to_string()),
                ],
                &none,
            )
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ArgumentType { index: 2, .. }));
        assert!(err.to_string().contains("-has-block-params"));

        let err = rt
            .call_helper(
                HAS_BLOCK_HELPER,
                &[Value::Number(1.0), Value::String("main".to_string()), Value::Bool(false)],
                &none,
            )
            .unwrap_err();
        assert!(matches!(err, RuntimeError::ArgumentType { index: 0, .. }));
    }
}
