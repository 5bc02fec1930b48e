use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Closed set of token type tags.
///
/// Upstream sources disagree on spelling (`COLOR` vs `color`, `FLOAT` vs
/// `number`); parsing normalizes the known spellings and keeps anything else
/// verbatim in [`ValueType::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ValueType {
    Color,
    Dimension,
    Number,
    String,
    Boolean,
    FontFamily,
    FontWeight,
    Duration,
    Shadow,
    Gradient,
    Other(String),
}

impl ValueType {
    /// Canonical tag used when serializing
    pub fn as_str(&self) -> &str {
        match self {
            ValueType::Color => "color",
            ValueType::Dimension => "dimension",
            ValueType::Number => "number",
            ValueType::String => "string",
            ValueType::Boolean => "boolean",
            ValueType::FontFamily => "fontFamily",
            ValueType::FontWeight => "fontWeight",
            ValueType::Duration => "duration",
            ValueType::Shadow => "shadow",
            ValueType::Gradient => "gradient",
            ValueType::Other(tag) => tag.as_str(),
        }
    }
}

impl From<String> for ValueType {
    fn from(tag: String) -> Self {
        match tag.to_ascii_lowercase().as_str() {
            "color" => ValueType::Color,
            "dimension" => ValueType::Dimension,
            "number" | "float" => ValueType::Number,
            "string" => ValueType::String,
            "boolean" | "bool" => ValueType::Boolean,
            "fontfamily" => ValueType::FontFamily,
            "fontweight" => ValueType::FontWeight,
            "duration" => ValueType::Duration,
            "shadow" => ValueType::Shadow,
            "gradient" => ValueType::Gradient,
            _ => ValueType::Other(tag),
        }
    }
}

impl From<&str> for ValueType {
    fn from(tag: &str) -> Self {
        ValueType::from(tag.to_string())
    }
}

impl From<ValueType> for String {
    fn from(value_type: ValueType) -> Self {
        match value_type {
            ValueType::Other(tag) => tag,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A token value: either a literal (opaque JSON) or an alias reference.
///
/// An alias is a string longer than two characters wrapped in `{` `}` whose
/// inner text names another entry's path.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenValue(pub Value);

impl TokenValue {
    /// Referenced path when the value is alias-shaped
    pub fn alias_target(&self) -> Option<&str> {
        match &self.0 {
            Value::String(s) if s.len() > 2 && s.starts_with('{') && s.ends_with('}') => {
                Some(&s[1..s.len() - 1])
            }
            _ => None,
        }
    }

    pub fn is_alias(&self) -> bool {
        self.alias_target().is_some()
    }

    pub fn as_json(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for TokenValue {
    fn from(value: Value) -> Self {
        TokenValue(value)
    }
}

impl From<&str> for TokenValue {
    fn from(value: &str) -> Self {
        TokenValue(Value::String(value.to_string()))
    }
}

impl fmt::Display for TokenValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Value::String(s) => f.write_str(s),
            other => write!(f, "{}", other),
        }
    }
}

/// One token at one collection/mode combination.
///
/// Within a snapshot `(path, collection_name, mode_name)` is unique; a
/// `stable_id` is shared by the per-mode entries of one logical variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_stable_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_stable_id: Option<String>,
    #[serde(rename = "collection", default)]
    pub collection_name: String,
    #[serde(rename = "mode", default)]
    pub mode_name: String,
    pub path: String,
    #[serde(default)]
    pub value: TokenValue,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub value_type: Option<ValueType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scopes: Option<BTreeSet<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code_syntax: Option<BTreeMap<String, String>>,
}

impl Entry {
    /// Create an entry with only a path and value; everything else unset.
    pub fn new(path: impl Into<String>, value: impl Into<TokenValue>) -> Self {
        Self {
            stable_id: None,
            collection_stable_id: None,
            mode_stable_id: None,
            collection_name: String::new(),
            mode_name: String::new(),
            path: path.into(),
            value: value.into(),
            value_type: None,
            description: None,
            scopes: None,
            code_syntax: None,
        }
    }

    pub fn with_stable_id(mut self, id: impl Into<String>) -> Self {
        self.stable_id = Some(id.into());
        self
    }

    pub fn with_collection(mut self, name: impl Into<String>) -> Self {
        self.collection_name = name.into();
        self
    }

    pub fn with_collection_stable_id(mut self, id: impl Into<String>) -> Self {
        self.collection_stable_id = Some(id.into());
        self
    }

    pub fn with_mode(mut self, name: impl Into<String>) -> Self {
        self.mode_name = name.into();
        self
    }

    pub fn with_mode_stable_id(mut self, id: impl Into<String>) -> Self {
        self.mode_stable_id = Some(id.into());
        self
    }

    pub fn with_type(mut self, value_type: impl Into<ValueType>) -> Self {
        self.value_type = Some(value_type.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Human-readable `collection/mode/path` address used in reports
    pub fn display_address(&self) -> String {
        match (self.collection_name.is_empty(), self.mode_name.is_empty()) {
            (true, true) => self.path.clone(),
            (false, true) => format!("{}/{}", self.collection_name, self.path),
            (true, false) => format!("{}/{}", self.mode_name, self.path),
            (false, false) => format!(
                "{}/{}/{}",
                self.collection_name, self.mode_name, self.path
            ),
        }
    }
}
