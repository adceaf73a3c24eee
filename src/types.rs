//! Plan, goal and action value types as dispatched by the planner.
//!
//! Field names follow the planner's camelCase wire format. Fact values are kept as raw JSON
//! values until they are written to the fact base, where they are flattened to strings by
//! [`fact_string`].

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Predicate -> value mapping (effects, desired state, discovered facts).
pub type FactMap = BTreeMap<String, Value>;

/// Decode an explicit `null` the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Desired subset of predicate values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub desired_state: FactMap,
}

impl Goal {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            desired_state: FactMap::new(),
        }
    }

    pub fn with_desired(mut self, predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        self.desired_state.insert(predicate.into(), value.into());
        self
    }
}

/// Executor kind tag. Unrecognized tags are kept so the plan still decodes and the
/// action fails at invocation time instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExecutorKind {
    Http,
    Cli,
    Unknown(String),
}

impl From<String> for ExecutorKind {
    fn from(tag: String) -> Self {
        match tag.as_str() {
            "http" => ExecutorKind::Http,
            "cli" => ExecutorKind::Cli,
            _ => ExecutorKind::Unknown(tag),
        }
    }
}

impl From<ExecutorKind> for String {
    fn from(kind: ExecutorKind) -> Self {
        match kind {
            ExecutorKind::Http => "http".to_string(),
            ExecutorKind::Cli => "cli".to_string(),
            ExecutorKind::Unknown(tag) => tag,
        }
    }
}

impl fmt::Display for ExecutorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecutorKind::Http => write!(f, "http"),
            ExecutorKind::Cli => write!(f, "cli"),
            ExecutorKind::Unknown(tag) => write!(f, "{}", tag),
        }
    }
}

impl Serialize for ExecutorKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ExecutorKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(ExecutorKind::from)
    }
}

/// How an action's side effect is performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorSpec {
    #[serde(rename = "type")]
    pub kind: ExecutorKind,
    #[serde(default, deserialize_with = "null_as_default")]
    pub method: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub url: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub headers: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub body: String,
}

impl ExecutorSpec {
    pub fn http(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            kind: ExecutorKind::Http,
            method: method.into(),
            url: url.into(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }

    pub fn cli() -> Self {
        Self {
            kind: ExecutorKind::Cli,
            method: String::new(),
            url: String::new(),
            headers: HashMap::new(),
            body: String::new(),
        }
    }
}

/// One remediation step.
///
/// `preconditions` and `cost` are carried for the planner; the executor never reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub preconditions: FactMap,
    #[serde(default, deserialize_with = "null_as_default")]
    pub effects: FactMap,
    #[serde(default)]
    pub cost: i64,
    pub executor: ExecutorSpec,
}

impl Action {
    pub fn new(name: impl Into<String>, executor: ExecutorSpec) -> Self {
        Self {
            name: name.into(),
            preconditions: FactMap::new(),
            effects: FactMap::new(),
            cost: 1,
            executor,
        }
    }

    pub fn with_effect(mut self, predicate: impl Into<String>, value: impl Into<Value>) -> Self {
        self.effects.insert(predicate.into(), value.into());
        self
    }
}

/// Ordered list of actions targeting one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Plan {
    pub target_goal: Goal,
    #[serde(default, deserialize_with = "null_as_default")]
    pub steps: Vec<Action>,
    #[serde(default)]
    pub total_cost: i64,
}

impl Plan {
    pub fn new(target_goal: Goal, steps: Vec<Action>) -> Self {
        let total_cost = steps.iter().map(|a| a.cost).sum();
        Self {
            target_goal,
            steps,
            total_cost,
        }
    }
}

/// Flatten a fact value to the string stored in the fact base.
///
/// Strings are stored raw, everything else as compact JSON text, so `true` and `"true"`
/// are indistinguishable once stored. Numbers keep serde_json's rendering, which is lossy
/// as a format: `1.0` is stored as "1.0", not "1", and large floats are written out in full
/// rather than in exponent form.
pub fn fact_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}
