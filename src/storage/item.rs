//! Store item representation and typed attribute accessors.

use std::collections::{BTreeSet, HashMap};
use std::str::FromStr;

use chrono::{DateTime, Utc};

use super::schema::{ATTR_PK, ATTR_SK};
use super::{PrimaryKey, Result, StoreError};
use crate::model::timestamp;

/// A single attribute value.
///
/// Only the types this schema uses are modelled. String sets are never
/// empty; empty collections are represented by omitting the attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    S(String),
    /// Numbers travel as decimal strings, as in DynamoDB.
    N(String),
    Bool(bool),
    Ss(BTreeSet<String>),
    Null,
}

impl AttributeValue {
    pub fn as_s(&self) -> Option<&str> {
        match self {
            Self::S(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_n(&self) -> Option<&str> {
        match self {
            Self::N(n) => Some(n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::S(_) => "S",
            Self::N(_) => "N",
            Self::Bool(_) => "BOOL",
            Self::Ss(_) => "SS",
            Self::Null => "NULL",
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::S(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::S(value)
    }
}

impl From<bool> for AttributeValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

/// A stored item: attribute name to value.
pub type Item = HashMap<String, AttributeValue>;

/// Build the primary key attributes of an item.
pub fn key_item(key: &PrimaryKey) -> Item {
    let mut item = Item::new();
    item.insert(ATTR_PK.to_string(), AttributeValue::S(key.pk.clone()));
    item.insert(ATTR_SK.to_string(), AttributeValue::S(key.sk.clone()));
    item
}

/// Extract the primary key of an item.
pub fn primary_key_of(item: &Item) -> Result<PrimaryKey> {
    Ok(PrimaryKey {
        pk: required_string(item, ATTR_PK)?,
        sk: required_string(item, ATTR_SK)?,
    })
}

/// Copy the named attributes out of an item, skipping absent ones.
pub fn project(item: &Item, attributes: &[&str]) -> Item {
    attributes
        .iter()
        .filter_map(|name| item.get(*name).map(|v| (name.to_string(), v.clone())))
        .collect()
}

/// Incrementally assembles an item, dropping empty optional values.
#[derive(Debug, Default)]
pub struct ItemBuilder {
    item: Item,
}

impl ItemBuilder {
    pub fn new(key: &PrimaryKey) -> Self {
        Self {
            item: key_item(key),
        }
    }

    pub fn string(mut self, name: &str, value: impl Into<String>) -> Self {
        self.item
            .insert(name.to_string(), AttributeValue::S(value.into()));
        self
    }

    pub fn optional_string(self, name: &str, value: Option<&str>) -> Self {
        match value {
            Some(v) => self.string(name, v),
            None => self,
        }
    }

    pub fn number(mut self, name: &str, value: impl ToString) -> Self {
        self.item
            .insert(name.to_string(), AttributeValue::N(value.to_string()));
        self
    }

    pub fn boolean(mut self, name: &str, value: bool) -> Self {
        self.item.insert(name.to_string(), AttributeValue::Bool(value));
        self
    }

    /// Sets are written only when non-empty.
    pub fn string_set(mut self, name: &str, values: &BTreeSet<String>) -> Self {
        if !values.is_empty() {
            self.item
                .insert(name.to_string(), AttributeValue::Ss(values.clone()));
        }
        self
    }

    pub fn timestamp(self, name: &str, value: &DateTime<Utc>) -> Self {
        self.string(name, timestamp::format(value))
    }

    pub fn build(self) -> Item {
        self.item
    }
}

pub fn required_string(item: &Item, name: &str) -> Result<String> {
    optional_string(item, name)?.ok_or_else(|| StoreError::malformed(name, "missing"))
}

pub fn optional_string(item: &Item, name: &str) -> Result<Option<String>> {
    match item.get(name) {
        None | Some(AttributeValue::Null) => Ok(None),
        Some(AttributeValue::S(s)) => Ok(Some(s.clone())),
        Some(other) => Err(StoreError::malformed(
            name,
            format!("expected S, found {}", other.type_name()),
        )),
    }
}

pub fn required_number<T: FromStr>(item: &Item, name: &str) -> Result<T> {
    match item.get(name) {
        Some(AttributeValue::N(n)) => n
            .parse()
            .map_err(|_| StoreError::malformed(name, format!("'{n}' is not a valid number"))),
        Some(other) => Err(StoreError::malformed(
            name,
            format!("expected N, found {}", other.type_name()),
        )),
        None => Err(StoreError::malformed(name, "missing")),
    }
}

pub fn boolean_or(item: &Item, name: &str, default: bool) -> Result<bool> {
    match item.get(name) {
        None | Some(AttributeValue::Null) => Ok(default),
        Some(AttributeValue::Bool(b)) => Ok(*b),
        Some(other) => Err(StoreError::malformed(
            name,
            format!("expected BOOL, found {}", other.type_name()),
        )),
    }
}

/// An absent set attribute reads back as an empty set.
pub fn string_set(item: &Item, name: &str) -> Result<BTreeSet<String>> {
    match item.get(name) {
        None | Some(AttributeValue::Null) => Ok(BTreeSet::new()),
        Some(AttributeValue::Ss(values)) => Ok(values.clone()),
        Some(other) => Err(StoreError::malformed(
            name,
            format!("expected SS, found {}", other.type_name()),
        )),
    }
}

pub fn required_timestamp(item: &Item, name: &str) -> Result<DateTime<Utc>> {
    let raw = required_string(item, name)?;
    timestamp::parse(&raw)
        .ok_or_else(|| StoreError::malformed(name, format!("'{raw}' is not an ISO-8601 timestamp")))
}

/// Parse a string attribute through `FromStr`, reporting the attribute on failure.
pub fn required_parsed<T: FromStr>(item: &Item, name: &str) -> Result<T> {
    let raw = required_string(item, name)?;
    raw.parse()
        .map_err(|_| StoreError::malformed(name, format!("unrecognised value '{raw}'")))
}
