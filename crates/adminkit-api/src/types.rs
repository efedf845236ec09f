// ── Core record types ──
//
// Identifier and Record form the foundation of every provider call.
// Backends key records by strings or integers; consumers never care which.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

// ── Identifier ──────────────────────────────────────────────────────

/// Identifier of a single record: an integer or an opaque string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Num(i64),
    Str(String),
}

impl Identifier {
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Self::Num(n) => Some(*n),
            Self::Str(_) => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Num(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Num(n) => Value::from(*n),
            Self::Str(s) => Value::from(s.clone()),
        }
    }

    /// Read an identifier out of a JSON value. Only integers and strings qualify.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => n.as_i64().map(Self::Num),
            Value::String(s) => Some(Self::Str(s.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Num(n) => write!(f, "{n}"),
            Self::Str(s) => write!(f, "{s}"),
        }
    }
}

impl FromStr for Identifier {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(s))
    }
}

impl From<i64> for Identifier {
    fn from(n: i64) -> Self {
        Self::Num(n)
    }
}

impl From<i32> for Identifier {
    fn from(n: i32) -> Self {
        Self::Num(i64::from(n))
    }
}

/// Strings that parse as integers become `Num`, matching how ids typed on a
/// command line or in a URL address numerically keyed records.
impl From<String> for Identifier {
    fn from(s: String) -> Self {
        match s.parse::<i64>() {
            Ok(n) => Self::Num(n),
            Err(_) => Self::Str(s),
        }
    }
}

impl From<&str> for Identifier {
    fn from(s: &str) -> Self {
        Self::from(s.to_owned())
    }
}

// ── Record ──────────────────────────────────────────────────────────

/// A single record: a JSON object with a mandatory `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: Identifier,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Record {
    pub fn new(id: impl Into<Identifier>) -> Self {
        Self {
            id: id.into(),
            fields: Map::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Build a record from a JSON object. The `id` key is required.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut fields) = value else {
            return None;
        };
        let id = fields.remove("id").as_ref().and_then(Identifier::from_value)?;
        Some(Self { id, fields })
    }

    /// Field lookup that also answers for `id`.
    pub fn field(&self, name: &str) -> Option<Value> {
        if name == "id" {
            return Some(self.id.to_value());
        }
        self.fields.get(name).cloned()
    }

    /// Shallow-merge the keys of `patch` into this record. `id` is never
    /// overwritten; non-object patches are ignored.
    pub fn merge(&mut self, patch: &Value) {
        if let Value::Object(map) = patch {
            for (key, value) in map {
                if key != "id" {
                    self.fields.insert(key.clone(), value.clone());
                }
            }
        }
    }

    pub fn to_value(&self) -> Value {
        let mut map = Map::with_capacity(self.fields.len() + 1);
        map.insert("id".into(), self.id.to_value());
        for (key, value) in &self.fields {
            map.insert(key.clone(), value.clone());
        }
        Value::Object(map)
    }
}

// ── List query payloads ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationPayload {
    pub page: u32,
    pub per_page: u32,
}

impl PaginationPayload {
    pub fn new(page: u32, per_page: u32) -> Self {
        Self { page, per_page }
    }
}

impl Default for PaginationPayload {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortPayload {
    pub field: String,
    pub order: SortOrder,
}

impl SortPayload {
    pub fn new(field: impl Into<String>, order: SortOrder) -> Self {
        Self {
            field: field.into(),
            order,
        }
    }
}

impl Default for SortPayload {
    fn default() -> Self {
        Self::new("id", SortOrder::Asc)
    }
}

/// Free-form filter object, interpreted by the provider.
pub type FilterPayload = Map<String, Value>;
