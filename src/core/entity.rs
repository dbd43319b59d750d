use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::fmt;

/// Server-assigned identifier. The wire form may be a number or a string
/// and is written back the way it was read.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Number(i64),
    Text(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Number(id) => write!(f, "{id}"),
            EntityId::Text(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Number(id)
    }
}

/// Numeric only when the text is the canonical form of the number, so
/// `"007"` stays text.
impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(number) if number.to_string() == id => EntityId::Number(number),
            _ => EntityId::Text(id.to_string()),
        }
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::from(id.as_str())
    }
}

/// A record managed by an entity slice.
pub trait Entity:
    Clone + Default + PartialEq + fmt::Debug + Serialize + DeserializeOwned + Send + Sync + 'static
{
    fn id(&self) -> Option<&EntityId>;
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Book {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl Book {
    pub fn new(name: impl Into<String>, price: f64) -> Self {
        Self {
            id: None,
            name: Some(name.into()),
            price: Some(price),
        }
    }

    pub fn with_id(mut self, id: impl Into<EntityId>) -> Self {
        self.id = Some(id.into());
        self
    }
}

impl Entity for Book {
    fn id(&self) -> Option<&EntityId> {
        self.id.as_ref()
    }
}

/// Serializes `entity` for a create/update request body.
///
/// Null fields are dropped so the server sees them as unset. Nested
/// relationship objects whose `id` is the empty placeholder (`""` or `-1`)
/// are dropped as well.
pub fn clean_entity<T: Serialize>(entity: &T) -> serde_json::Result<JsonValue> {
    let value = serde_json::to_value(entity)?;
    let JsonValue::Object(fields) = value else {
        return Ok(value);
    };

    let cleaned: JsonMap<String, JsonValue> = fields
        .into_iter()
        .filter(|(_, field)| !field.is_null() && !is_placeholder_relation(field))
        .collect();

    Ok(JsonValue::Object(cleaned))
}

fn is_placeholder_relation(field: &JsonValue) -> bool {
    match field.get("id") {
        Some(JsonValue::String(id)) => id.is_empty(),
        Some(JsonValue::Number(id)) => id.as_i64() == Some(-1),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entity_id_keeps_wire_form() {
        let numeric: EntityId = serde_json::from_value(json!(42)).unwrap();
        assert_eq!(numeric, EntityId::Number(42));
        assert_eq!(serde_json::to_value(&numeric).unwrap(), json!(42));

        let text: EntityId = serde_json::from_value(json!("a1b2")).unwrap();
        assert_eq!(text, EntityId::Text("a1b2".to_string()));
        assert_eq!(text.to_string(), "a1b2");
    }

    #[test]
    fn entity_id_from_str_prefers_numbers() {
        assert_eq!(EntityId::from("1001"), EntityId::Number(1001));
        assert_eq!(
            EntityId::from("9a4c"),
            EntityId::Text("9a4c".to_string())
        );
    }

    #[test]
    fn entity_id_from_str_keeps_non_canonical_numbers_as_text() {
        assert_eq!(EntityId::from("007"), EntityId::Text("007".to_string()));
        assert_eq!(EntityId::from("+5"), EntityId::Text("+5".to_string()));
        assert_eq!(EntityId::from("-12"), EntityId::Number(-12));
        assert_eq!(EntityId::from("007").to_string(), "007");
    }

    #[test]
    fn new_book_has_no_identifier() {
        let book = Book::new("infrastructures", 39916.0);
        assert!(book.id().is_none());
        assert!(book.with_id(7).id().is_some());
    }

    #[test]
    fn book_tolerates_missing_fields() {
        let book: Book = serde_json::from_value(json!({ "id": 3 })).unwrap();
        assert_eq!(book.id, Some(EntityId::Number(3)));
        assert_eq!(book.name, None);
        assert_eq!(book.price, None);
    }

    #[test]
    fn clean_entity_strips_null_fields() {
        let cleaned = clean_entity(&json!({
            "id": null,
            "name": "Oregon zero",
            "price": 47549,
            "isbn": null
        }))
        .unwrap();

        assert_eq!(cleaned, json!({ "name": "Oregon zero", "price": 47549 }));
    }

    #[test]
    fn clean_entity_strips_placeholder_relations() {
        let cleaned = clean_entity(&json!({
            "name": "x",
            "author": { "id": "" },
            "publisher": { "id": -1 },
            "shelf": { "id": 5 }
        }))
        .unwrap();

        assert_eq!(cleaned, json!({ "name": "x", "shelf": { "id": 5 } }));
    }

    #[test]
    fn clean_entity_on_book_omits_absent_id() {
        let cleaned = clean_entity(&Book::new("infrastructures", 39916.0)).unwrap();
        assert!(cleaned.get("id").is_none());
        assert_eq!(cleaned["name"], "infrastructures");
    }
}
