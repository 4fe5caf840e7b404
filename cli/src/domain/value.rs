//! Property values and CloudFormation intrinsic functions.
//!
//! A [`Value`] is either plain data or a token the provisioning engine
//! resolves at deploy time (`Ref`, `Fn::GetAtt`, ...). Tokens that point at
//! other declarations are what make the template a graph; [`Value::references`]
//! walks them so the stack can reject forward references.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

/// Identifier of a resource, parameter or output inside one template.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct LogicalId(String);

impl LogicalId {
    /// Wrap an already-sanitized identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LogicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for LogicalId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Pseudo parameters supplied by the engine for every stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    Region,
    Partition,
}

impl Pseudo {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Pseudo::Region => "AWS::Region",
            Pseudo::Partition => "AWS::Partition",
        }
    }
}

/// A template property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Str(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
    /// `{"Ref": id}` to a resource or parameter declared in the same stack.
    Ref(LogicalId),
    /// `{"Fn::GetAtt": [id, attribute]}`.
    GetAtt(LogicalId, String),
    /// `{"Ref": "AWS::..."}`.
    Pseudo(Pseudo),
    /// `{"Fn::Join": [separator, [parts]]}`.
    Join(String, Vec<Value>),
    /// `{"Fn::Select": [index, list]}`.
    Select(usize, Box<Value>),
    /// `{"Fn::GetAZs": ""}`: the AZs of the deployment region.
    GetAzs,
    /// `{"Fn::Base64": value}`.
    Base64(Box<Value>),
}

impl Value {
    /// Build a map value from key/value pairs.
    pub fn map<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        Value::Map(entries.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Build a list value.
    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::List(items.into_iter().collect())
    }

    /// `Ref` to a declared resource or parameter.
    #[must_use]
    pub fn reference(id: &LogicalId) -> Self {
        Value::Ref(id.clone())
    }

    /// `Fn::GetAtt` on a declared resource.
    #[must_use]
    pub fn get_att(id: &LogicalId, attribute: &str) -> Self {
        Value::GetAtt(id.clone(), attribute.to_string())
    }

    /// `Fn::Join` with an empty separator.
    #[must_use]
    pub fn concat(parts: Vec<Value>) -> Self {
        Value::Join(String::new(), parts)
    }

    /// `arn:<partition>:<rest>` built with `Fn::Join`.
    #[must_use]
    pub fn partition_arn(rest: &str) -> Self {
        Value::concat(vec![
            "arn:".into(),
            Value::Pseudo(Pseudo::Partition),
            format!(":{rest}").into(),
        ])
    }

    /// Every logical ID this value points at, in traversal order.
    #[must_use]
    pub fn references(&self) -> Vec<&LogicalId> {
        let mut out = Vec::new();
        self.collect_references(&mut out);
        out
    }

    fn collect_references<'a>(&'a self, out: &mut Vec<&'a LogicalId>) {
        match self {
            Value::Ref(id) | Value::GetAtt(id, _) => out.push(id),
            Value::List(items) | Value::Join(_, items) => {
                for item in items {
                    item.collect_references(out);
                }
            }
            Value::Map(entries) => {
                for item in entries.values() {
                    item.collect_references(out);
                }
            }
            Value::Select(_, inner) | Value::Base64(inner) => inner.collect_references(out),
            Value::Str(_)
            | Value::Int(_)
            | Value::Bool(_)
            | Value::Pseudo(_)
            | Value::GetAzs => {}
        }
    }

    /// The literal string, if this value is one.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Look up a key, if this value is a map.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Insert or replace a key. No-op on non-map values.
    pub fn insert(&mut self, key: &str, value: Value) {
        if let Value::Map(entries) = self {
            entries.insert(key.to_string(), value);
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<u32> for Value {
    fn from(n: u32) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<u16> for Value {
    fn from(n: u16) -> Self {
        Value::Int(i64::from(n))
    }
}

impl From<Vec<Value>> for Value {
    fn from(items: Vec<Value>) -> Self {
        Value::List(items)
    }
}

impl From<Pseudo> for Value {
    fn from(p: Pseudo) -> Self {
        Value::Pseudo(p)
    }
}

/// Human-readable form, used by `ecsbase exports`.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Str(s) => f.write_str(s),
            Value::Int(n) => write!(f, "{n}"),
            Value::Bool(b) => write!(f, "{b}"),
            Value::List(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Map(entries) => write!(f, "{{{} keys}}", entries.len()),
            Value::Ref(id) => write!(f, "!Ref {id}"),
            Value::GetAtt(id, attr) => write!(f, "!GetAtt {id}.{attr}"),
            Value::Pseudo(p) => write!(f, "!Ref {}", p.as_str()),
            Value::Join(sep, parts) => {
                write!(f, "!Join [{sep:?}, ")?;
                fmt::Display::fmt(&Value::List(parts.clone()), f)?;
                f.write_str("]")
            }
            Value::Select(i, inner) => write!(f, "!Select [{i}, {inner}]"),
            Value::GetAzs => f.write_str("!GetAZs"),
            Value::Base64(inner) => write!(f, "!Base64 {inner}"),
        }
    }
}

struct Single<'a, V: Serialize>(&'static str, &'a V);

impl<V: Serialize> Serialize for Single<'_, V> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(self.0, self.1)?;
        map.end()
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Str(s) => serializer.serialize_str(s),
            Value::Int(n) => serializer.serialize_i64(*n),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(entries) => {
                let mut map = serializer.serialize_map(Some(entries.len()))?;
                for (k, v) in entries {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Value::Ref(id) => Single("Ref", id).serialize(serializer),
            Value::GetAtt(id, attr) => {
                Single("Fn::GetAtt", &(id, attr.as_str())).serialize(serializer)
            }
            Value::Pseudo(p) => Single("Ref", &p.as_str()).serialize(serializer),
            Value::Join(sep, parts) => {
                Single("Fn::Join", &(sep.as_str(), parts)).serialize(serializer)
            }
            Value::Select(i, inner) => {
                Single("Fn::Select", &(i, inner.as_ref())).serialize(serializer)
            }
            Value::GetAzs => Single("Fn::GetAZs", &"").serialize(serializer),
            Value::Base64(inner) => Single("Fn::Base64", inner.as_ref()).serialize(serializer),
        }
    }
}
