//! User-declared error types (SPEC_FULL.md §6 "Error response types", §7).
//!
//! Every route implicitly carries the built-in `Error`/`ValidationError`
//! records plus, optionally, a closed set of user-declared error records. The
//! wire representation for "one of several possible error records" is an
//! Avro union, and `serde_avro_fast`'s serializer resolves a union branch by
//! the Rust value's struct/variant *name* (see `ser::serializer::Serializer::
//! serialize_struct`/`serialize_struct_variant`, which both call
//! `serialize_union_named`) rather than by any discriminant tag —
//! `serialize_newtype_variant` is explicitly unsupported there, with the
//! serializer's own error message directing callers to serialize the inner
//! value directly against the matching branch instead. That is exactly what
//! `ErrorUnion::encode` below does: it never goes through serde's derived
//! enum serialization, it serializes whichever named record the error
//! actually is, straight against the union-rooted schema.

use serde_avro_fast::Schema;

use crate::framing;

/// A closed set of error record types a route may return in addition to the
/// built-in `Error`/`ValidationError`.
///
/// Implemented via `#[derive(Serialize)]` on an enum whose variants are all
/// newtype variants over record types, e.g.:
///
/// ```ignore
/// #[derive(Serialize)]
/// enum MyErrors {
///     OutOfStock(OutOfStockError),
///     PaymentDeclined(PaymentDeclinedError),
/// }
/// ```
///
/// `error_type_schemas` lists the schemas for exactly those inner record
/// types (not the enum itself, which is never Avro-encoded as such).
pub trait ErrorUnion {
	/// Schemas of every non-built-in error record this union can carry, used
	/// to build the route's declared `errors` union and protocol `types`.
	fn error_type_schemas() -> Vec<Schema>;

	/// Encode the inner record directly against `union_schema`, which is
	/// rooted at the full errors union (built-ins plus every type named by
	/// `error_type_schemas`, plus the `string` fallback branch).
	fn encode(&self, union_schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>;

	/// HTTP status code to report alongside this error. Defaults to 500;
	/// override per-variant for errors that should surface a different code.
	fn status_code(&self) -> http::StatusCode {
		http::StatusCode::INTERNAL_SERVER_ERROR
	}
}

/// The default `ErrorUnion` for routes with no user-declared error types:
/// every route still gets the built-in `Error`/`ValidationError` (and the
/// `string` fallback) branches, this type just never contributes any more.
///
/// Uninhabited: there is never a value of this type to encode, which is why
/// `encode`'s body can be an exhaustive empty match.
///
/// Derives `Serialize` (trivially, via an empty match) so it also satisfies
/// the `axum` adapter's `Err: Serialize` bound for the JSON fallback path —
/// `avro_route` needs this even though a value of this type can never
/// actually reach the serializer.
#[derive(serde_derive::Serialize)]
pub enum NoCustomErrors {}

impl ErrorUnion for NoCustomErrors {
	fn error_type_schemas() -> Vec<Schema> {
		Vec::new()
	}

	fn encode(&self, _union_schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		match *self {}
	}
}

/// Encode any named record value directly against a union-rooted schema.
///
/// This is the mechanism `ErrorUnion::encode` implementations use for their
/// own variants, and is also how the router encodes the built-in
/// `Error`/`ValidationError` records against the same union.
pub fn encode_branch<T>(value: &T, union_schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>
where
	T: serde::Serialize + ?Sized,
{
	framing::encode_datum(value, union_schema)
}
