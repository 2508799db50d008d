use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::DomainError;

/// One managed resource in a Terraform root module.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// Full address, e.g. `azuread_application.test`.
    pub address: String,
    #[serde(rename = "type")]
    pub resource_type: String,
    pub name: String,
    /// Attribute values as reported by the provider.
    #[serde(default)]
    pub values: Map<String, Value>,
}

impl ResourceState {
    /// The primary ID (`values.id`), if the provider recorded one.
    pub fn id(&self) -> Option<&str> {
        self.values
            .get("id")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Look up an attribute using Terraform's flattened key syntax.
    ///
    /// `reply_urls.#` is the length of a list, `tags.%` the size of a map,
    /// `reply_urls.0` indexes into a list. Booleans and numbers are rendered
    /// as their literal text. Null or missing attributes return `None`.
    pub fn attribute(&self, key: &str) -> Option<String> {
        let mut segments = key.split('.').peekable();
        let first = segments.next()?;
        let mut current = self.values.get(first)?;

        while let Some(seg) = segments.next() {
            let is_last = segments.peek().is_none();
            if is_last && (seg == "#" || seg == "%") {
                return match current {
                    Value::Array(items) => Some(items.len().to_string()),
                    Value::Object(map) => Some(map.len().to_string()),
                    Value::Null => Some("0".to_string()),
                    _ => None,
                };
            }
            current = match current {
                Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
                Value::Object(map) => map.get(seg)?,
                _ => return None,
            };
        }

        scalar_text(current)
    }

    /// Every attribute flattened into `key -> text`, lists and maps expanded
    /// with their `.#` / `.%` counts.
    pub fn flat_attributes(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        for (k, v) in &self.values {
            flatten_into(k, v, &mut out);
        }
        out
    }
}

fn scalar_text(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

fn flatten_into(prefix: &str, v: &Value, out: &mut BTreeMap<String, String>) {
    match v {
        Value::Array(items) => {
            out.insert(format!("{}.#", prefix), items.len().to_string());
            for (i, item) in items.iter().enumerate() {
                flatten_into(&format!("{}.{}", prefix, i), item, out);
            }
        }
        Value::Object(map) => {
            out.insert(format!("{}.%", prefix), map.len().to_string());
            for (k, item) in map {
                flatten_into(&format!("{}.{}", prefix, k), item, out);
            }
        }
        other => {
            if let Some(text) = scalar_text(other) {
                out.insert(prefix.to_string(), text);
            }
        }
    }
}

/// The root module of a Terraform state, as seen after an apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateSnapshot {
    #[serde(default)]
    pub resources: Vec<ResourceState>,
}

impl StateSnapshot {
    pub fn new(resources: Vec<ResourceState>) -> Self {
        Self { resources }
    }

    /// Parse the output of `terraform show -json`.
    ///
    /// An empty state (no `values` key) yields an empty snapshot. Only the
    /// root module is read.
    pub fn from_show_json(raw: &str) -> Result<Self, DomainError> {
        let doc: Value = serde_json::from_str(raw)
            .map_err(|e| DomainError::InvalidSnapshot(format!("not JSON: {}", e)))?;

        let resources = match doc.pointer("/values/root_module/resources") {
            None | Some(Value::Null) => return Ok(Self::default()),
            Some(r) => r.clone(),
        };

        let resources: Vec<ResourceState> = serde_json::from_value(resources)
            .map_err(|e| DomainError::InvalidSnapshot(format!("root_module.resources: {}", e)))?;
        Ok(Self { resources })
    }

    pub fn resource(&self, address: &str) -> Option<&ResourceState> {
        self.resources.iter().find(|r| r.address == address)
    }

    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a ResourceState> + 'a {
        self.resources
            .iter()
            .filter(move |r| r.resource_type == resource_type)
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
