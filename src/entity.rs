//! Entity descriptors as returned by the ticker list, and the identity keys derived from them.

use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;

/// Nested score payload fetched for one entity.
pub type Payload = Value;

/// Output of a run: every successfully fetched entity keyed by identity.
pub type ScrapeResults = BTreeMap<EntityKey, FetchedEntity>;

/// A candidate entity, kept as the ordered set of fields the provider returned.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDescriptor(Map<String, Value>);

impl EntityDescriptor {
    /// The full ordered tuple of field values. Two descriptors are duplicates iff their keys match.
    pub fn key(&self) -> EntityKey {
        EntityKey::new(self.0.values().cloned())
    }

    /// Text of the named field, used as the lookup code for the score request.
    pub fn field(&self, name: &str) -> Option<String> {
        self.0.get(name).map(|value| match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

impl TryFrom<Value> for EntityDescriptor {
    type Error = anyhow::Error;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(fields) => Ok(EntityDescriptor(fields)),
            other => Err(anyhow::anyhow!(
                "Expected an object for entity descriptor, got {}",
                other
            )),
        }
    }
}

/// Identity of an entity: the JSON encoding of each field value, in provider order.
///
/// Encoding keeps the JSON type, so `1` and `"1"` (or `null` and `"null"`) stay distinct.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityKey(Vec<String>);

impl EntityKey {
    pub fn new<I>(values: I) -> Self
    where
        I: IntoIterator<Item = Value>,
    {
        EntityKey(values.into_iter().map(|value| value.to_string()).collect())
    }
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.0.join(", "))
    }
}

/// A stored result: the descriptor that was fetched and the payload it returned.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedEntity {
    pub descriptor: EntityDescriptor,
    pub payload: Payload,
}
