//! Server protocol descriptor assembly (SPEC_FULL.md §4.4, §6
//! "Server protocol descriptor").
//!
//! `AvroProtocol`/`AvroMessage` (`handshake.rs`) are plain JSON documents;
//! this module is what turns a registered route's request/response
//! [`Schema`]s into the `RequestField`/type-reference shapes that belong in
//! one, and the reverse: rebuilding a self-contained, parseable [`Schema`]
//! out of a wire-transmitted `AvroMessage`'s field-level type references.
//! There's no teacher counterpart for either direction — `serde_avro_fast`
//! only knows how to go from a schema to JSON text, never the other way
//! around — so the JSON text is round-tripped through `serde_json::Value` to
//! pull out (or splice back in) the pieces a protocol document needs.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use serde_avro_derive::BuildSchema;
use serde_avro_fast::Schema;
use serde_json::Value;

use crate::error::SchemaError;
use crate::handshake::{AvroMessage, RequestField};

/// The eight Avro primitive type names, which are never looked up in a
/// message's `types` list.
const PRIMITIVES: &[&str] = &[
	"null", "boolean", "int", "long", "float", "double", "bytes", "string",
];

/// Derive a route's `messageId` from its HTTP method and path.
///
/// e.g. `(POST, "/api/v1/thing")` becomes `"post_api_v1_thing__post"`.
pub fn message_id(method: &http::Method, path: &str) -> String {
	let slug = path.trim_matches('/').replace(['/', '-'], "_");
	let method = method.as_str().to_ascii_lowercase();
	format!("{method}_{slug}__{method}")
}

/// Parse a schema's canonical JSON text back into a [`serde_json::Value`].
///
/// `serde_avro_fast` always produces valid JSON for `Schema::json()`, so this
/// can't fail in practice; a failure would mean `serde_avro_fast` itself is
/// broken.
fn schema_json_value(schema: &Schema) -> serde_json::Value {
	serde_json::from_str(schema.json())
		.expect("serde_avro_fast::Schema::json() must always produce valid JSON")
}

/// The fully qualified name a schema would be referred to by elsewhere in a
/// protocol document, or `"null"` if the schema isn't a named type (only
/// relevant for the no-response case, which never calls this).
pub fn type_name(schema: &Schema) -> String {
	match schema_json_value(schema) {
		serde_json::Value::Object(map) => match map.get("name") {
			Some(serde_json::Value::String(name)) => name.clone(),
			_ => panic!("response/request schema must be a named record"),
		},
		other => panic!("response/request schema must be a named record, got {other}"),
	}
}

/// The full type definition, to be placed in an `AvroMessage::types` entry.
pub fn type_definition(schema: &Schema) -> serde_json::Value {
	schema_json_value(schema)
}

/// The fields of a request record, for `AvroMessage::request`.
pub fn request_fields(schema: &Schema) -> Vec<RequestField> {
	let serde_json::Value::Object(record) = schema_json_value(schema) else {
		panic!("request schema must be a record");
	};
	let fields = match record.get("fields") {
		Some(serde_json::Value::Array(fields)) => fields.clone(),
		_ => panic!("request schema must be a record with a \"fields\" array"),
	};
	fields
		.into_iter()
		.filter_map(|field| {
			let serde_json::Value::Object(mut field) = field else {
				return None;
			};
			let name = match field.remove("name") {
				Some(serde_json::Value::String(name)) => name,
				_ => return None,
			};
			let type_ = field.remove("type")?;
			Some(RequestField { name, type_ })
		})
		.collect()
}

/// Index a message's `types` list by name, for [`materialize`] lookups.
pub fn index_types_by_name(types: &[Value]) -> HashMap<String, Value> {
	types
		.iter()
		.filter_map(|def| match def {
			Value::Object(map) => match map.get("name") {
				Some(Value::String(name)) => Some((name.clone(), def.clone())),
				_ => None,
			},
			_ => None,
		})
		.collect()
}

/// Rebuild a self-contained schema fragment from a wire-transmitted type
/// reference, inlining each named type's full definition the first time it
/// is encountered and leaving later occurrences (including self-references
/// inside a recursive type's own definition) as bare name strings.
///
/// `serde_avro_fast`'s schema parser registers named types into one global
/// table as it walks the document (see `schema/safe/parsing`), resolving
/// forward references, so it doesn't matter that a second reference to an
/// already-inlined name is left dangling here — the first inlining is all
/// the parser needs to have seen the definition.
pub fn materialize(value: &Value, index: &HashMap<String, Value>, inlined: &mut HashSet<String>) -> Value {
	match value {
		Value::String(name) => {
			if PRIMITIVES.contains(&name.as_str()) || inlined.contains(name) {
				Value::String(name.clone())
			} else if let Some(def) = index.get(name) {
				inlined.insert(name.clone());
				materialize(def, index, inlined)
			} else {
				Value::String(name.clone())
			}
		}
		Value::Array(items) => Value::Array(items.iter().map(|v| materialize(v, index, inlined)).collect()),
		Value::Object(map) => {
			let mut out = serde_json::Map::with_capacity(map.len());
			for (key, value) in map {
				let value = match key.as_str() {
					"fields" => match value {
						Value::Array(fields) => Value::Array(
							fields
								.iter()
								.map(|field| match field {
									Value::Object(field) => {
										let mut out = serde_json::Map::with_capacity(field.len());
										for (fkey, fvalue) in field {
											let fvalue = if fkey == "type" {
												materialize(fvalue, index, inlined)
											} else {
												fvalue.clone()
											};
											out.insert(fkey.clone(), fvalue);
										}
										Value::Object(out)
									}
									other => other.clone(),
								})
								.collect(),
						),
						other => other.clone(),
					},
					"items" | "values" => materialize(value, index, inlined),
					_ => value.clone(),
				};
				out.insert(key.clone(), value);
			}
			Value::Object(out)
		}
		other => other.clone(),
	}
}

/// Walk a schema fragment, pulling every named (record/enum/fixed)
/// definition it contains out into `types` (first occurrence only, tracked
/// via `seen`) and replacing each occurrence — including the one that would
/// otherwise have carried the full definition — with a bare name reference.
///
/// This is the inverse of [`materialize`]: it is what turns a freshly
/// generated [`Schema`] into the outlined `{request, response, errors,
/// types}` shape an [`AvroMessage`] carries on the wire.
fn extract_named(value: Value, types: &mut Vec<Value>, seen: &mut HashSet<String>) -> Value {
	match value {
		Value::Array(items) => {
			Value::Array(items.into_iter().map(|v| extract_named(v, types, seen)).collect())
		}
		Value::Object(mut map) => {
			let kind = map.get("type").and_then(Value::as_str).map(str::to_owned);
			let name = map.get("name").and_then(Value::as_str).map(str::to_owned);
			if let (Some(kind), Some(name)) = (kind, name) {
				if matches!(kind.as_str(), "record" | "enum" | "fixed") {
					if seen.contains(&name) {
						return Value::String(name);
					}
					seen.insert(name.clone());
					if let Some(Value::Array(fields)) = map.remove("fields") {
						let fields = fields
							.into_iter()
							.map(|field| match field {
								Value::Object(mut field) => {
									if let Some(type_) = field.remove("type") {
										field.insert("type".to_owned(), extract_named(type_, types, seen));
									}
									Value::Object(field)
								}
								other => other,
							})
							.collect();
						map.insert("fields".to_owned(), Value::Array(fields));
					}
					if let Some(items) = map.remove("items") {
						map.insert("items".to_owned(), extract_named(items, types, seen));
					}
					if let Some(values) = map.remove("values") {
						map.insert("values".to_owned(), extract_named(values, types, seen));
					}
					types.push(Value::Object(map));
					return Value::String(name);
				}
			}
			if let Some(items) = map.remove("items") {
				map.insert("items".to_owned(), extract_named(items, types, seen));
			}
			if let Some(values) = map.remove("values") {
				map.insert("values".to_owned(), extract_named(values, types, seen));
			}
			Value::Object(map)
		}
		other => other,
	}
}

/// `{type: record, name: "<messageId>_request", fields: [...]}` built from a
/// route's declared request fields, or `None` for a no-body route.
pub fn build_request_schema(
	message_id: &str,
	message: &AvroMessage,
) -> Result<Option<Schema>, SchemaError> {
	if message.request.is_empty() {
		return Ok(None);
	}
	let index = index_types_by_name(&message.types);
	let mut inlined = HashSet::new();
	let fields: Vec<Value> = message
		.request
		.iter()
		.map(|field| {
			serde_json::json!({
				"name": field.name,
				"type": materialize(&field.type_, &index, &mut inlined),
			})
		})
		.collect();
	let record = serde_json::json!({
		"type": "record",
		"name": format!("{message_id}_request"),
		"fields": fields,
	});
	Schema::from_str(&record.to_string()).map(Some)
}

/// Rename a record schema's top-level `name` (and drop its `namespace`) to
/// the synthetic `"{message_id}_request"` name [`build_request_schema`]
/// gives the wire-transmitted client request record.
///
/// The client's request record has no stable name of its own — it's always
/// synthesized from the `messageId` — so comparing it against the server's
/// own request type (named after the user's Rust type, e.g. `"BRequest"`)
/// by reader/writer compatibility would spuriously fail on the name
/// mismatch alone. Renaming the server side to the same synthetic name
/// before the compatibility check makes the two comparable on structure.
pub fn request_schema_for_compat(message_id: &str, schema: &Schema) -> Result<Schema, SchemaError> {
	let mut value = schema_json_value(schema);
	if let Value::Object(map) = &mut value {
		map.insert("name".to_owned(), Value::String(format!("{message_id}_request")));
		map.remove("namespace");
	}
	Schema::from_str(&value.to_string())
}

/// The response schema declared by `message`, or `None` for a `oneWay`
/// message (which carries no response datum at all).
pub fn build_response_schema(message: &AvroMessage) -> Result<Option<Schema>, SchemaError> {
	if message.one_way {
		return Ok(None);
	}
	let index = index_types_by_name(&message.types);
	let mut inlined = HashSet::new();
	let materialized = materialize(&message.response, &index, &mut inlined);
	Schema::from_str(&materialized.to_string()).map(Some)
}

/// The `Error | ValidationError | ...custom | string` union a server builds
/// once at startup to encode every route's error responses.
///
/// `string` is kept as the last branch as a fallback for error values that
/// don't fit any declared record (mirroring a plain exception message).
pub fn build_server_errors_union_schema(custom: &[Schema]) -> Result<Schema, SchemaError> {
	let mut branches = vec![
		schema_json_value(&crate::handshake::Error::schema()?),
		schema_json_value(&crate::handshake::ValidationError::schema()?),
	];
	branches.extend(custom.iter().map(schema_json_value));
	branches.push(Value::String("string".to_owned()));
	Schema::from_str(&Value::Array(branches).to_string())
}

/// The error union a client gateway rebuilds from a server's declared
/// `AvroMessage::errors`, used as the reader schema when decoding an error
/// `CallResponse` after a CLIENT handshake.
pub fn build_message_errors_union_schema(message: &AvroMessage) -> Result<Schema, SchemaError> {
	let index = index_types_by_name(&message.types);
	let mut inlined = HashSet::new();
	let mut branches: Vec<Value> = message
		.errors
		.iter()
		.flatten()
		.map(|branch| materialize(branch, &index, &mut inlined))
		.collect();
	if !branches
		.iter()
		.any(|branch| branch.as_str() == Some("string"))
	{
		branches.push(Value::String("string".to_owned()));
	}
	Schema::from_str(&Value::Array(branches).to_string())
}

/// One registered endpoint's Avro-facing shape, as needed to assemble its
/// entry in an [`AvroProtocol`].
pub struct RouteDescriptor<'a> {
	pub message_id: String,
	pub doc: Option<String>,
	pub request: Option<&'a Schema>,
	pub response: Option<&'a Schema>,
	/// Non-built-in error record types this route may return, beyond the
	/// implicit `Error`/`ValidationError`/`string` branches every route
	/// carries.
	pub custom_errors: &'a [Schema],
}

/// Assemble the full server protocol document from every registered route.
pub fn assemble_protocol(
	namespace: &str,
	protocol_name: &str,
	routes: &[RouteDescriptor<'_>],
) -> Result<crate::handshake::AvroProtocol, SchemaError> {
	let mut messages = BTreeMap::new();
	for route in routes {
		let mut types = Vec::new();
		let mut seen = HashSet::new();

		let request = match route.request {
			Some(schema) => request_fields_outlined(schema, &mut types, &mut seen),
			None => Vec::new(),
		};

		let response = match route.response {
			Some(schema) => extract_named(schema_json_value(schema), &mut types, &mut seen),
			None => Value::String("null".to_owned()),
		};
		let one_way = matches!(&response, Value::String(s) if s == "null");

		let mut errors = vec![
			extract_named(
				schema_json_value(&crate::handshake::Error::schema()?),
				&mut types,
				&mut seen,
			),
			extract_named(
				schema_json_value(&crate::handshake::ValidationError::schema()?),
				&mut types,
				&mut seen,
			),
		];
		errors.extend(
			route
				.custom_errors
				.iter()
				.map(|schema| extract_named(schema_json_value(schema), &mut types, &mut seen)),
		);

		messages.insert(
			route.message_id.clone(),
			AvroMessage {
				doc: route.doc.clone(),
				types,
				request,
				response,
				errors: Some(errors),
				one_way,
			},
		);
	}
	Ok(crate::handshake::AvroProtocol {
		namespace: namespace.to_owned(),
		protocol: protocol_name.to_owned(),
		messages,
	})
}

fn request_fields_outlined(
	schema: &Schema,
	types: &mut Vec<Value>,
	seen: &mut HashSet<String>,
) -> Vec<RequestField> {
	let Value::Object(record) = schema_json_value(schema) else {
		panic!("request schema must be a record");
	};
	let fields = match record.get("fields") {
		Some(Value::Array(fields)) => fields.clone(),
		_ => panic!("request schema must be a record with a \"fields\" array"),
	};
	fields
		.into_iter()
		.filter_map(|field| {
			let Value::Object(mut field) = field else {
				return None;
			};
			let name = match field.remove("name") {
				Some(Value::String(name)) => name,
				_ => return None,
			};
			let type_ = field.remove("type")?;
			Some(RequestField {
				name,
				type_: extract_named(type_, types, seen),
			})
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn message_id_matches_the_documented_example() {
		assert_eq!(
			message_id(&http::Method::POST, "/api/v1/thing"),
			"post_api_v1_thing__post"
		);
	}

	#[test]
	fn message_id_strips_hyphens_and_slashes() {
		assert_eq!(
			message_id(&http::Method::GET, "/foo-bar/baz/"),
			"get_foo_bar_baz__get"
		);
	}

	#[test]
	fn extract_then_materialize_round_trips_a_shared_named_type() {
		use serde_avro_derive::BuildSchema;
		use serde_derive::Serialize;

		#[derive(Serialize, BuildSchema)]
		struct Inner {
			n: i32,
		}
		#[derive(Serialize, BuildSchema)]
		struct Outer {
			a: Inner,
			b: Inner,
		}

		let schema = Outer::schema().unwrap();
		let mut types = Vec::new();
		let mut seen = HashSet::new();
		let outlined = extract_named(schema_json_value(&schema), &mut types, &mut seen);

		// Both fields reference the same outlined name; the definition
		// itself appears exactly once in `types`.
		assert_eq!(types.len(), 1);
		let Value::Object(record) = &outlined else {
			panic!("expected a record");
		};
		let Some(Value::Array(fields)) = record.get("fields") else {
			panic!("expected fields");
		};
		let field_types: Vec<&Value> = fields
			.iter()
			.map(|f| f.as_object().unwrap().get("type").unwrap())
			.collect();
		assert_eq!(field_types[0], field_types[1]);
		assert!(field_types[0].is_string());

		let index = index_types_by_name(&types);
		let mut inlined = HashSet::new();
		let rebuilt = materialize(&outlined, &index, &mut inlined);
		Schema::from_str(&rebuilt.to_string()).unwrap();
	}

	#[test]
	fn build_request_schema_is_none_for_empty_request() {
		let message = AvroMessage {
			doc: None,
			types: vec![],
			request: vec![],
			response: Value::String("null".to_owned()),
			errors: None,
			one_way: true,
		};
		assert!(build_request_schema("x", &message).unwrap().is_none());
	}

	#[test]
	fn build_response_schema_materializes_a_shared_type() {
		let inner_def = serde_json::json!({
			"type": "record",
			"name": "Thing",
			"fields": [{"name": "n", "type": "int"}],
		});
		let message = AvroMessage {
			doc: None,
			types: vec![inner_def],
			request: vec![],
			response: Value::String("Thing".to_owned()),
			errors: None,
			one_way: false,
		};
		let schema = build_response_schema(&message).unwrap().unwrap();
		assert_eq!(type_name(&schema), "Thing");
	}

	#[test]
	fn build_server_errors_union_schema_includes_string_fallback() {
		let schema = build_server_errors_union_schema(&[]).unwrap();
		let value = schema_json_value(&schema);
		let Value::Array(branches) = value else {
			panic!("expected a union");
		};
		assert!(branches.iter().any(|b| b.as_str() == Some("string")));
	}
}
