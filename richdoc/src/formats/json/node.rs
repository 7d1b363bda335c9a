//! Serde shape of the editor's JSON tree.
//!
//! Children are kept as raw [`Value`]s so that a child which is not a valid
//! node can be skipped on its own, and so that unknown nodes can be carried
//! through untouched.

use crate::formats::html::style::parse_px;
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WireNode {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub content: Vec<Value>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub marks: Vec<WireMark>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WireMark {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub attrs: Map<String, Value>,
}

impl WireMark {
    /// Reads one entry of a `marks` array. `None` when it has no string `type`.
    pub fn from_value(value: &Value) -> Option<Self> {
        let object = value.as_object()?;
        let kind = object.get("type")?.as_str()?;
        Some(Self {
            kind: kind.to_string(),
            attrs: object_field(object, kind, "attrs"),
        })
    }
}

/// `attrs` of a node or mark; anything but an object reads as empty.
fn object_field(object: &Map<String, Value>, kind: &str, key: &str) -> Map<String, Value> {
    match object.get(key) {
        Some(Value::Object(map)) => map.clone(),
        None | Some(Value::Null) => Map::new(),
        Some(other) => {
            log::warn!("{kind}: ignoring non-object {key}: {other}");
            Map::new()
        }
    }
}

impl WireNode {
    pub fn new(kind: &str) -> Self {
        Self {
            kind: kind.to_string(),
            ..Self::default()
        }
    }

    /// Reads a child value as a node. `None` when it is not node-shaped, that
    /// is not an object with a string `type`. Malformed fields inside a node
    /// are dropped on their own: a bad `attrs` reads as empty and a bad entry
    /// in `marks` is skipped.
    pub fn from_value(value: &Value) -> Option<Self> {
        let Some(object) = value.as_object() else {
            log::warn!("skipping non-object node: {value}");
            return None;
        };
        let Some(kind) = object.get("type").and_then(Value::as_str) else {
            log::warn!("skipping node without a type");
            return None;
        };
        let content = match object.get("content") {
            Some(Value::Array(children)) => children.clone(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                log::warn!("{kind}: ignoring non-array content: {other}");
                Vec::new()
            }
        };
        let marks = match object.get("marks") {
            Some(Value::Array(marks)) => marks
                .iter()
                .filter_map(|raw| {
                    let mark = WireMark::from_value(raw);
                    if mark.is_none() {
                        log::warn!("{kind}: skipping malformed mark: {raw}");
                    }
                    mark
                })
                .collect(),
            None | Some(Value::Null) => Vec::new(),
            Some(other) => {
                log::warn!("{kind}: ignoring non-array marks: {other}");
                Vec::new()
            }
        };
        let text = match object.get("text") {
            Some(Value::String(text)) => Some(text.clone()),
            None | Some(Value::Null) => None,
            Some(other) => {
                log::warn!("{kind}: ignoring non-string text: {other}");
                None
            }
        };
        Some(Self {
            kind: kind.to_string(),
            attrs: object_field(object, kind, "attrs"),
            content,
            marks,
            text,
        })
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.to_string(), value.into());
        self
    }

    pub fn with_content(mut self, content: Vec<Value>) -> Self {
        self.content = content;
        self
    }

    /// Child nodes, skipping entries that are not node-shaped.
    pub fn children(&self) -> impl Iterator<Item = (WireNode, &Value)> + '_ {
        self.content
            .iter()
            .filter_map(|raw| WireNode::from_value(raw).map(|node| (node, raw)))
    }

    pub fn attr_str(&self, key: &str) -> Option<&str> {
        attr_str(&self.attrs, key)
    }

    /// A string attribute, also accepting numbers (ids are sometimes numeric).
    pub fn attr_string(&self, key: &str) -> Option<String> {
        match self.attrs.get(key)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }

    pub fn attr_u32(&self, key: &str) -> Option<u32> {
        attr_u32(&self.attrs, key)
    }

    pub fn attr_bool(&self, key: &str) -> Option<bool> {
        match self.attrs.get(key)? {
            Value::Bool(b) => Some(*b),
            Value::String(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key).filter(|v| !v.is_null())
    }
}

pub fn attr_str<'a>(attrs: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
    attrs.get(key).and_then(Value::as_str)
}

/// A non-negative size, given as a number (`300`, `300.5`) or a CSS-ish string
/// (`"300"`, `"300px"`).
pub fn attr_u32(attrs: &Map<String, Value>, key: &str) -> Option<u32> {
    match attrs.get(key)? {
        Value::Number(n) => n
            .as_u64()
            .map(|v| v.min(u64::from(u32::MAX)) as u32)
            .or_else(|| n.as_f64().filter(|v| *v >= 0.0).map(|v| v.round() as u32)),
        Value::String(s) => parse_px(s),
        _ => None,
    }
}
