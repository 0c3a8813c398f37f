//! Paged listings and opaque continuation tokens.
//!
//! A token is the URL-safe base64 (unpadded) encoding of a JSON object
//! holding the key attributes of the last item returned. Callers treat it
//! as opaque.

use std::collections::BTreeMap;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;

use crate::error::{Error, Result};
use crate::storage::{AttributeValue, Item, StoreError};

/// Default page size.
pub const DEFAULT_LIMIT: u32 = 25;
/// Largest page size a caller may request.
pub const MAX_LIMIT: u32 = 100;

const FIELD_LIMIT: &str = "limit";
const FIELD_NEXT_TOKEN: &str = "next_token";

/// Page size and position of a listing call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PageRequest {
    /// `None` means [`DEFAULT_LIMIT`].
    pub limit: Option<u32>,
    /// Token from the previous page, `None` for the first page.
    pub next_token: Option<String>,
}

impl PageRequest {
    pub fn first(limit: u32) -> Self {
        Self {
            limit: Some(limit),
            next_token: None,
        }
    }

    /// Request the page that follows `previous`, keeping the same limit.
    pub fn after<T>(&self, previous: &Page<T>) -> Option<Self> {
        previous.next_token.as_ref().map(|token| Self {
            limit: self.limit,
            next_token: Some(token.clone()),
        })
    }

    /// Effective page size.
    pub fn resolved_limit(&self) -> Result<u32> {
        match self.limit {
            None => Ok(DEFAULT_LIMIT),
            Some(limit) if (1..=MAX_LIMIT).contains(&limit) => Ok(limit),
            Some(limit) => Err(Error::validation(
                FIELD_LIMIT,
                format!("must be between 1 and {MAX_LIMIT} (got: {limit})"),
            )),
        }
    }

    /// Decoded start position, if any.
    pub fn start_key(&self) -> Result<Option<Item>> {
        self.next_token.as_deref().map(decode_token).transpose()
    }
}

/// One page of a listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page<T> {
    pub items: Vec<T>,
    /// `None` exactly when no further items exist.
    pub next_token: Option<String>,
}

impl<T> Page<T> {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            next_token: None,
        }
    }

    pub fn has_more(&self) -> bool {
        self.next_token.is_some()
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            next_token: self.next_token,
        }
    }
}

/// Encode key attributes as a continuation token.
///
/// Key attributes are always strings; anything else is a store fault.
pub fn encode_token(key: &Item) -> Result<String> {
    let mut fields = BTreeMap::new();
    for (name, value) in key {
        match value {
            AttributeValue::S(s) => {
                fields.insert(name.as_str(), s.as_str());
            }
            other => {
                return Err(Error::Store(StoreError::malformed(
                    name.clone(),
                    format!("key attribute must be S, found {}", other.type_name()),
                )))
            }
        }
    }
    let json = serde_json::to_vec(&fields)
        .map_err(|e| Error::Store(StoreError::backend(format!("token encoding failed: {e}"))))?;
    Ok(URL_SAFE_NO_PAD.encode(json))
}

/// Decode a continuation token back into key attributes.
pub fn decode_token(token: &str) -> Result<Item> {
    let invalid = |reason: String| Error::validation(FIELD_NEXT_TOKEN, reason);

    let bytes = URL_SAFE_NO_PAD
        .decode(token)
        .map_err(|e| invalid(format!("not valid base64: {e}")))?;
    let fields: BTreeMap<String, String> =
        serde_json::from_slice(&bytes).map_err(|e| invalid(format!("not a valid token: {e}")))?;
    if fields.is_empty() {
        return Err(invalid("token is empty".to_string()));
    }
    Ok(fields
        .into_iter()
        .map(|(name, value)| (name, AttributeValue::S(value)))
        .collect())
}
