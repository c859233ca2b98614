//! Wikibase data values and property datatypes

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::fmt;

use crate::api::adapter::AdapterError;
use crate::graph::{Literal, Vocabulary};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyDatatype {
    WikibaseItem,
    String,
    MonolingualText,
    Url,
    ExternalId,
}

impl PropertyDatatype {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WikibaseItem => "wikibase-item",
            Self::String => "string",
            Self::MonolingualText => "monolingualtext",
            Self::Url => "url",
            Self::ExternalId => "external-id",
        }
    }

    pub fn from_api(name: &str) -> Option<Self> {
        match name {
            "wikibase-item" => Some(Self::WikibaseItem),
            "string" => Some(Self::String),
            "monolingualtext" => Some(Self::MonolingualText),
            "url" => Some(Self::Url),
            "external-id" => Some(Self::ExternalId),
            _ => None,
        }
    }

    /// Datatype of a property created from an `rdf:type` declaration
    pub fn for_declaration(marker: Vocabulary) -> Option<Self> {
        match marker {
            Vocabulary::OwlObjectProperty => Some(Self::WikibaseItem),
            Vocabulary::OwlDatatypeProperty
            | Vocabulary::OwlAnnotationProperty
            | Vocabulary::RdfProperty => Some(Self::String),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyDatatype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `value` payload for an item snak
pub fn item_value(id: &str) -> Result<Value, AdapterError> {
    let numeric = id
        .strip_prefix('Q')
        .and_then(|n| n.parse::<u64>().ok())
        .ok_or_else(|| AdapterError::malformed(format!("'{}' is not an item id", id)))?;

    Ok(json!({ "entity-type": "item", "numeric-id": numeric, "id": id }))
}

/// `value` payload for a literal under a property of `datatype`
pub fn literal_value(
    literal: &Literal,
    datatype: PropertyDatatype,
    default_language: &str,
) -> Result<Value, AdapterError> {
    match datatype {
        PropertyDatatype::String | PropertyDatatype::ExternalId => {
            if literal.value.is_empty() {
                return Err(AdapterError::malformed("empty strings cannot be stored"));
            }
            Ok(Value::String(literal.value.clone()))
        }
        PropertyDatatype::Url => {
            if !(literal.value.starts_with("http://") || literal.value.starts_with("https://")) {
                return Err(AdapterError::malformed(format!("'{}' is not a URL", literal.value)));
            }
            Ok(Value::String(literal.value.clone()))
        }
        PropertyDatatype::MonolingualText => Ok(json!({
            "text": literal.value,
            "language": literal.language.as_deref().unwrap_or(default_language),
        })),
        PropertyDatatype::WikibaseItem => Err(AdapterError::malformed(format!(
            "literal \"{}\" given for a property that expects an item",
            literal.value
        ))),
    }
}

/// Whether a claim returned by `wbgetclaims` carries `expected` as its main value
pub fn claim_has_value(claim: &Value, expected: &Value) -> bool {
    let Some(actual) = claim.pointer("/mainsnak/datavalue/value") else {
        return false;
    };

    match (actual.get("id"), expected.get("id")) {
        (Some(a), Some(b)) => a == b,
        _ => match (actual.get("numeric-id"), expected.get("numeric-id")) {
            (Some(a), Some(b)) => a == b,
            _ => actual == expected,
        },
    }
}

/// Ids of the claims in a `wbgetclaims` response for `property` whose value is `expected`
pub fn matching_claim_ids(response: &Value, property: &str, expected: &Value) -> Vec<String> {
    response
        .pointer(&format!("/claims/{}", property))
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|claim| claim_has_value(claim, expected))
        .filter_map(|claim| claim.get("id").and_then(Value::as_str).map(str::to_string))
        .collect()
}
