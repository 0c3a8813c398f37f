//! Conversions between store items and DynamoDB SDK types, and expression
//! assembly for conditions, updates and key conditions.

use std::collections::HashMap;

use aws_sdk_dynamodb::types::{AttributeValue as SdkValue, CancellationReason as SdkReason};

use crate::storage::item::{AttributeValue, Item};
use crate::storage::schema::ATTR_PK;
use crate::storage::{CancellationReason, Condition, Result, SortCondition, StoreError};

pub fn to_sdk(value: &AttributeValue) -> SdkValue {
    match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.clone()),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Ss(values) => SdkValue::Ss(values.iter().cloned().collect()),
        AttributeValue::Null => SdkValue::Null(true),
    }
}

pub fn from_sdk(name: &str, value: &SdkValue) -> Result<AttributeValue> {
    match value {
        SdkValue::S(s) => Ok(AttributeValue::S(s.clone())),
        SdkValue::N(n) => Ok(AttributeValue::N(n.clone())),
        SdkValue::Bool(b) => Ok(AttributeValue::Bool(*b)),
        SdkValue::Ss(values) => Ok(AttributeValue::Ss(values.iter().cloned().collect())),
        SdkValue::Null(_) => Ok(AttributeValue::Null),
        other => Err(StoreError::malformed(
            name,
            format!("unsupported attribute type {other:?}"),
        )),
    }
}

pub fn item_to_sdk(item: &Item) -> HashMap<String, SdkValue> {
    item.iter().map(|(k, v)| (k.clone(), to_sdk(v))).collect()
}

pub fn item_from_sdk(map: &HashMap<String, SdkValue>) -> Result<Item> {
    map.iter()
        .map(|(k, v)| from_sdk(k, v).map(|value| (k.clone(), value)))
        .collect()
}

pub fn reason_from_sdk(reason: &SdkReason) -> CancellationReason {
    let message = reason.message().unwrap_or_default().to_string();
    match reason.code() {
        None | Some("None") => CancellationReason::None,
        Some("ConditionalCheckFailed") => CancellationReason::ConditionalCheckFailed,
        Some("ValidationError") => CancellationReason::ValidationError(message),
        Some(code) => CancellationReason::Other {
            code: code.to_string(),
            message,
        },
    }
}

/// Expression text plus its placeholder maps.
///
/// Placeholders are allocated with a per-expression counter so several
/// clauses can share one request without colliding.
#[derive(Debug, Default)]
pub struct Expression {
    names: HashMap<String, String>,
    values: HashMap<String, SdkValue>,
    next: usize,
}

impl Expression {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(&mut self, attribute: &str) -> String {
        if let Some((placeholder, _)) = self.names.iter().find(|(_, a)| a.as_str() == attribute) {
            return placeholder.clone();
        }
        let placeholder = format!("#n{}", self.next);
        self.next += 1;
        self.names.insert(placeholder.clone(), attribute.to_string());
        placeholder
    }

    pub fn value(&mut self, value: SdkValue) -> String {
        let placeholder = format!(":v{}", self.next);
        self.next += 1;
        self.values.insert(placeholder.clone(), value);
        placeholder
    }

    pub fn condition(&mut self, condition: &Condition) -> String {
        let pk = self.name(ATTR_PK);
        match condition {
            Condition::NotExists => format!("attribute_not_exists({pk})"),
            Condition::Exists => format!("attribute_exists({pk})"),
            Condition::AttributeEquals { name, value } => {
                let attr = self.name(name);
                let val = self.value(to_sdk(value));
                format!("attribute_exists({pk}) AND {attr} = {val}")
            }
        }
    }

    pub fn key_condition(
        &mut self,
        partition_attr: &str,
        partition: &str,
        sort_attr: &str,
        sort: Option<&SortCondition>,
    ) -> String {
        let pk = self.name(partition_attr);
        let pv = self.value(SdkValue::S(partition.to_string()));
        let mut text = format!("{pk} = {pv}");
        if let Some(sort) = sort {
            let sk = self.name(sort_attr);
            let clause = match sort {
                SortCondition::Equals(v) => {
                    format!("{sk} = {}", self.value(SdkValue::S(v.clone())))
                }
                SortCondition::BeginsWith(prefix) => {
                    format!(
                        "begins_with({sk}, {})",
                        self.value(SdkValue::S(prefix.clone()))
                    )
                }
                SortCondition::Between(low, high) => {
                    let lo = self.value(SdkValue::S(low.clone()));
                    let hi = self.value(SdkValue::S(high.clone()));
                    format!("{sk} BETWEEN {lo} AND {hi}")
                }
            };
            text.push_str(" AND ");
            text.push_str(&clause);
        }
        text
    }

    /// Attribute name map, or `None` when empty (the API rejects empty maps).
    pub fn names(&self) -> Option<HashMap<String, String>> {
        (!self.names.is_empty()).then(|| self.names.clone())
    }

    pub fn values(&self) -> Option<HashMap<String, SdkValue>> {
        (!self.values.is_empty()).then(|| self.values.clone())
    }
}
