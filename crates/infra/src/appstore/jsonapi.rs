//! JSON:API envelope helpers
//!
//! App Store Connect wraps every resource in `{"data": {"type", "id",
//! "attributes", "relationships"}}`; collections carry `data` as an array.
//! These helpers build and pick apart those envelopes so the steps read as
//! flow logic.

use serde_json::{json, Map, Value};

/// Id of a single-resource response.
pub fn data_id(payload: &Value) -> Option<String> {
    payload["data"]["id"].as_str().map(str::to_string)
}

/// First resource of a collection response.
pub fn first_resource(payload: &Value) -> Option<&Value> {
    payload["data"].as_array()?.first()
}

/// Id of the first resource of a collection response.
pub fn first_id(payload: &Value) -> Option<String> {
    first_resource(payload)?["id"].as_str().map(str::to_string)
}

/// String attribute of a resource object.
pub fn attr_str<'a>(resource: &'a Value, name: &str) -> Option<&'a str> {
    resource["attributes"][name].as_str()
}

/// `{"data": {"type": ..., "id": ...}}` relationship linkage.
pub fn linkage(resource_type: &str, id: &str) -> Value {
    json!({ "data": { "type": resource_type, "id": id } })
}

/// Build a `{"data": {...}}` envelope for create/update requests.
///
/// `relationships` pairs are `(name, linkage)`; an empty slice omits the
/// member entirely.
pub fn envelope(
    resource_type: &str,
    attributes: Value,
    relationships: &[(&str, Value)],
) -> Value {
    let mut data = Map::new();
    data.insert("type".into(), Value::String(resource_type.into()));
    data.insert("attributes".into(), attributes);
    if !relationships.is_empty() {
        let rels: Map<String, Value> =
            relationships.iter().map(|(name, link)| ((*name).into(), link.clone())).collect();
        data.insert("relationships".into(), Value::Object(rels));
    }
    json!({ "data": data })
}

/// Envelope for updating an existing resource (type + id + attributes).
pub fn update_envelope(resource_type: &str, id: &str, attributes: Value) -> Value {
    json!({ "data": { "type": resource_type, "id": id, "attributes": attributes } })
}
