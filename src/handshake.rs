//! Handshake types and protocol descriptor (SPEC_FULL.md §3, §6)
//!
//! `HandshakeRequest`/`HandshakeResponse`/`CallRequest`/`CallResponse` are
//! Avro-encoded per the canonical `org.apache.avro.ipc` schemas. `AvroProtocol`
//! and `AvroMessage` are never Avro-encoded themselves: per the reference
//! implementation, they are only ever JSON-stringified to become the
//! `clientProtocol`/`serverProtocol` payload carried *inside* a
//! `HandshakeRequest`/`HandshakeResponse`.

use std::collections::{BTreeMap, HashMap};
use std::sync::OnceLock;

use serde_avro_derive::{types::FixedBytes, BuildSchema};
use serde_avro_fast::Schema;
use serde_derive::{Deserialize, Serialize};

/// A 16-byte MD5 digest, as used for protocol fingerprints and error refids.
pub type Md5 = FixedBytes<16>;

/// Sentinel `serverHash` a client gateway sends on its very first call, before
/// it has learned the server's actual protocol hash.
pub const SENTINEL_SERVER_HASH: Md5 = FixedBytes([b'0'; 16]);

/// The MD5 fingerprint of a protocol JSON document's exact bytes (SPEC_FULL.md
/// §6: "clients must not rehash the parsed value, only hash the exact bytes
/// received").
pub fn md5_digest(bytes: &[u8]) -> Md5 {
	use md5::{Digest, Md5 as Md5Hasher};
	FixedBytes::new(Md5Hasher::digest(bytes).into())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BuildSchema)]
#[allow(non_snake_case)]
#[avro_schema(namespace = "org.apache.avro.ipc")]
pub struct HandshakeRequest {
	pub clientHash: Md5,
	pub clientProtocol: Option<String>,
	pub serverHash: Md5,
	pub meta: Option<HashMap<String, Vec<u8>>>,
}

/// Outcome of comparing a client's and a server's protocol fingerprints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, BuildSchema)]
#[avro_schema(namespace = "org.apache.avro.ipc")]
pub enum HandshakeMatch {
	BOTH,
	CLIENT,
	NONE,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BuildSchema)]
#[allow(non_snake_case)]
#[avro_schema(namespace = "org.apache.avro.ipc")]
pub struct HandshakeResponse {
	pub r#match: HandshakeMatch,
	pub serverProtocol: Option<String>,
	pub serverHash: Option<Md5>,
	pub meta: Option<HashMap<String, Vec<u8>>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BuildSchema)]
pub struct CallRequest {
	pub meta: Option<HashMap<String, Vec<u8>>>,
	pub message: String,
	#[serde(with = "serde_bytes")]
	pub request: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, BuildSchema)]
pub struct CallResponse {
	pub meta: Option<HashMap<String, Vec<u8>>>,
	pub error: bool,
	#[serde(with = "serde_bytes")]
	pub response: Vec<u8>,
}

/// One field of an [`AvroMessage`]'s `request`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestField {
	pub name: String,
	#[serde(rename = "type")]
	pub type_: serde_json::Value,
}

/// A single RPC operation inside an [`AvroProtocol`].
///
/// Never Avro-encoded; only ever appears JSON-stringified inside a
/// `clientProtocol`/`serverProtocol` string.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvroMessage {
	#[serde(skip_serializing_if = "Option::is_none")]
	pub doc: Option<String>,
	#[serde(default)]
	pub types: Vec<serde_json::Value>,
	#[serde(default)]
	pub request: Vec<RequestField>,
	pub response: serde_json::Value,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub errors: Option<Vec<serde_json::Value>>,
	/// `true` iff `response` is the literal `"null"`.
	pub one_way: bool,
}

/// The JSON document describing a router's full set of registered endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvroProtocol {
	pub namespace: String,
	pub protocol: String,
	/// `BTreeMap` rather than `HashMap`: canonicalization requires stable key
	/// order so the same protocol always serializes to the same JSON bytes
	/// (SPEC_FULL.md P2/P3).
	pub messages: BTreeMap<String, AvroMessage>,
}

/// Built-in error record every route implicitly declares.
#[derive(Debug, Clone, Serialize, Deserialize, BuildSchema)]
pub struct Error {
	pub refid: Option<Md5>,
	pub status: i32,
	pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, BuildSchema)]
pub struct ValidationErrorDetail {
	pub loc: Vec<String>,
	pub msg: String,
	#[serde(rename = "type")]
	pub r#type: String,
}

/// Built-in error record every route implicitly declares, mirroring
/// user-model constraint-validation failures.
#[derive(Debug, Clone, Serialize, Deserialize, BuildSchema)]
pub struct ValidationError {
	pub detail: Vec<ValidationErrorDetail>,
}

/// Build-once-reuse-forever wire schemas for the four Avro IPC envelope
/// records, shared by `router` and `gateway` so every dispatch/call doesn't
/// regenerate them. Schema generation for these types cannot fail (they
/// derive `BuildSchema` over a fixed, known-good shape), so a panic here
/// would mean `serde_avro_derive` itself is broken.
macro_rules! cached_schema {
	($name:ident, $ty:ty) => {
		pub(crate) fn $name() -> &'static Schema {
			static SCHEMA: OnceLock<Schema> = OnceLock::new();
			SCHEMA.get_or_init(|| <$ty>::schema().expect(concat!(stringify!($ty), " schema generation must not fail")))
		}
	};
}

cached_schema!(handshake_request_schema, HandshakeRequest);
cached_schema!(handshake_response_schema, HandshakeResponse);
cached_schema!(call_request_schema, CallRequest);
cached_schema!(call_response_schema, CallResponse);

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn handshake_request_schema_matches_canonical_field_order() {
		use serde_avro_fast::schema::RegularType;

		let schema_mut = HandshakeRequest::schema_mut();
		let RegularType::Record(record) = &schema_mut.root().type_ else {
			panic!("expected a record");
		};
		let field_names: Vec<&str> = record.fields.iter().map(|f| f.name.as_str()).collect();
		assert_eq!(
			field_names,
			["clientHash", "clientProtocol", "serverHash", "meta"]
		);
	}

	#[test]
	fn one_way_follows_response_nullness() {
		let null_response = AvroMessage {
			doc: None,
			types: vec![],
			request: vec![],
			response: serde_json::Value::String("null".to_owned()),
			errors: None,
			one_way: true,
		};
		assert!(null_response.one_way);
	}
}
