//! Request model: the inbound batch and its items.
//!
//! A batch is kept as raw JSON values until each item is shape-checked inside
//! its own pipeline, so that one malformed item can be rejected without
//! rejecting the batch.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::errors::{ActionError, BatchError, ItemError};

pub const ACTION_KEY: &str = "action";
pub const ARGS_KEY: &str = "args";

static NULL: Value = Value::Null;

/// BatchRequest is the ordered list of raw items submitted in one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchRequest {
    items: Vec<Value>,
}

impl BatchRequest {
    /// Accepts only a JSON array; anything else fails the whole call.
    pub fn from_value(payload: Value) -> Result<Self, BatchError> {
        match payload {
            Value::Array(items) => Ok(Self { items }),
            _ => Err(BatchError::NotAnArray),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// item を入力順に取り出す
    pub fn into_items(self) -> Vec<Value> {
        self.items
    }
}

impl FromIterator<RequestItem> for BatchRequest {
    fn from_iter<I: IntoIterator<Item = RequestItem>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().map(RequestItem::into_value).collect(),
        }
    }
}

/// What a handler receives: the request item without its `action` key.
///
/// `args` is always present once an item has passed the shape check; any
/// other caller-supplied fields are passed through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionInput(Map<String, Value>);

impl ActionInput {
    /// 任意のフィールドをそのまま input として扱う
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    /// Shorthand for an input carrying only `args`.
    pub fn from_args(args: Value) -> Self {
        let mut fields = Map::new();
        fields.insert(ARGS_KEY.to_string(), args);
        Self(fields)
    }

    /// The `args` value, or `null` when absent.
    pub fn args(&self) -> &Value {
        self.0.get(ARGS_KEY).unwrap_or(&NULL)
    }

    /// 任意のフィールドを参照
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserialize `args` into `T`.
    pub fn decode_args<T: DeserializeOwned>(&self) -> Result<T, ActionError> {
        T::deserialize(self.args()).map_err(|e| ActionError::new(format!("invalid args: {e}")))
    }

    pub fn into_map(self) -> Map<String, Value> {
        self.0
    }

    /// JSON オブジェクトとして取り出す
    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

/// A shape-checked item: `{action, args, ...}`.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestItem {
    action: String,
    input: ActionInput,
}

impl RequestItem {
    /// `action` と `args` だけを持つ item を作成
    pub fn new(action: impl Into<String>, args: Value) -> Self {
        Self {
            action: action.into(),
            input: ActionInput::from_args(args),
        }
    }

    /// Shape check. The item must be an object holding both `action` and
    /// `args`, and `action` must be a string.
    pub fn from_value(value: Value) -> Result<Self, ItemError> {
        let Value::Object(mut fields) = value else {
            return Err(ItemError::BadRequest);
        };
        if !fields.contains_key(ARGS_KEY) {
            return Err(ItemError::BadRequest);
        }
        let action = match fields.remove(ACTION_KEY) {
            Some(Value::String(action)) => action,
            _ => return Err(ItemError::BadRequest),
        };
        Ok(Self {
            action,
            input: ActionInput::new(fields),
        })
    }

    pub fn action(&self) -> &str {
        &self.action
    }

    pub fn input(&self) -> &ActionInput {
        &self.input
    }

    /// action 名と handler に渡す input に分解
    pub fn into_parts(self) -> (String, ActionInput) {
        (self.action, self.input)
    }

    pub fn into_value(self) -> Value {
        let mut fields = self.input.into_map();
        fields.insert(ACTION_KEY.to_string(), Value::String(self.action));
        Value::Object(fields)
    }
}
