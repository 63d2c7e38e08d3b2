//! Server-side handshake resolution and route dispatch (SPEC_FULL.md §4.3,
//! §4.4).
//!
//! Framework-agnostic by design (SPEC_FULL.md §6 "the dispatcher itself is
//! framework-agnostic... so that the axum adapter is a thin translation
//! layer"): [`BuiltRouter::dispatch`] takes raw request bytes in and returns
//! raw response bytes plus a status code, with no knowledge of `axum` or
//! `hyper` at all. `axum.rs` is the only place that knows how to get bytes
//! out of (and back into) an HTTP request/response.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_avro_derive::BuildSchema;
use serde_avro_fast::schema::SchemaMut;
use serde_avro_fast::Schema;

use crate::cache::{CacheEntry, CompatibilityCache};
use crate::compat;
use crate::config::RouterConfig;
use crate::error::{DecodeError, DispatchError};
use crate::error_union::{encode_branch, ErrorUnion};
use crate::framing;
use crate::handshake::{
	self, AvroProtocol, CallRequest, CallResponse, Error as BuiltinError, HandshakeMatch,
	HandshakeRequest, HandshakeResponse, Md5, ValidationError,
};
use crate::protocol::{self, RouteDescriptor};

/// A route with no request body, selected by registering `NoBody` as `Req`.
#[derive(Debug, Clone, Copy)]
pub struct NoBody;

/// A route with no response body (`oneWay`), selected by registering
/// `NoResponse` as `Resp`.
#[derive(Debug, Clone, Copy)]
pub struct NoResponse;

/// What a route handler may return instead of a successful response.
pub enum RouteError<Err> {
	/// The request decoded fine but failed an application-level constraint
	/// (e.g. a numeric field outside its documented range).
	Validation(ValidationError),
	/// One of the route's declared custom error records.
	Custom(Err),
	/// An unexpected failure; surfaced as `Error{status:500}` with a fresh
	/// UUID v4 reference id, also emitted via `tracing::error!`.
	Internal(String),
}

/// Request-body-or-not, abstracted so `Router::route` can be generic over
/// both shapes without the caller juggling `Option<Schema>` by hand.
///
/// Implemented for every `BuildSchema + DeserializeOwned` type (the normal
/// case) and, separately, for [`NoBody`] (which deliberately does *not*
/// implement `BuildSchema`, so the two impls never overlap).
pub trait RouteRequest: Send + 'static {
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError>;
	/// `writer_schema` is `None` only for [`NoBody`], which ignores it.
	fn decode(bytes: &[u8], writer_schema: Option<&Schema>) -> Result<Self, DecodeError>
	where
		Self: Sized;
}

impl<T> RouteRequest for T
where
	T: BuildSchema + DeserializeOwned + Send + 'static,
{
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError> {
		Ok(Some(T::schema()?))
	}
	fn decode(bytes: &[u8], writer_schema: Option<&Schema>) -> Result<Self, DecodeError> {
		let schema = writer_schema.ok_or_else(|| DecodeError::new("route expects a request body but no writer schema was available"))?;
		let (value, _consumed) = framing::decode_datum_prefix(bytes, schema)?;
		Ok(value)
	}
}

impl RouteRequest for NoBody {
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError> {
		Ok(None)
	}
	fn decode(_bytes: &[u8], _writer_schema: Option<&Schema>) -> Result<Self, DecodeError> {
		Ok(NoBody)
	}
}

/// Response-body-or-not, mirroring [`RouteRequest`].
pub trait RouteResponse: Send + 'static {
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError>;
	fn encode(&self, schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>;
}

impl<T> RouteResponse for T
where
	T: BuildSchema + Serialize + Send + 'static,
{
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError> {
		Ok(Some(T::schema()?))
	}
	fn encode(&self, schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		framing::encode_datum(self, schema)
	}
}

impl RouteResponse for NoResponse {
	fn schema() -> Result<Option<Schema>, crate::error::SchemaError> {
		Ok(None)
	}
	fn encode(&self, _schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		Ok(Vec::new())
	}
}

/// A route outcome, type-erased over the handler's own `Err` type so many
/// differently-typed routes can live behind one [`ErasedRoute`] vtable.
enum ErasedOutcome {
	Ok(Vec<u8>),
	Validation(ValidationError),
	Custom(Box<dyn EncodableError>),
	Internal(String),
}

/// A single error value ready to be encoded against the router-wide errors
/// union schema, with its handler's declared HTTP status for the JSON
/// fallback path.
trait EncodableError: Send {
	fn status_code(&self) -> http::StatusCode;
	fn encode(&self, union_schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>;
}

impl<E: ErrorUnion + Send + 'static> EncodableError for E {
	fn status_code(&self) -> http::StatusCode {
		ErrorUnion::status_code(self)
	}
	fn encode(&self, union_schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		ErrorUnion::encode(self, union_schema)
	}
}

/// Object-safe view of a registered route, invoked with already-resolved
/// request bytes and the writer schema to decode them with.
#[async_trait]
trait ErasedRoute: Send + Sync {
	fn message_id(&self) -> &str;
	fn path(&self) -> &str;
	fn method(&self) -> &http::Method;
	fn request_schema(&self) -> Option<&Schema>;
	fn response_schema(&self) -> Option<&Schema>;
	fn custom_error_schemas(&self) -> &[Schema];
	fn status_code(&self) -> http::StatusCode;

	async fn invoke(&self, request_bytes: &[u8], writer_schema: Option<&Schema>) -> ErasedOutcome;
}

struct RouteImpl<Req, Resp, Err, F> {
	message_id: String,
	path: String,
	method: http::Method,
	status_code: http::StatusCode,
	request_schema: Option<Schema>,
	response_schema: Option<Schema>,
	custom_error_schemas: Vec<Schema>,
	handler: F,
	_marker: std::marker::PhantomData<fn(Req) -> (Resp, Err)>,
}

#[async_trait]
impl<Req, Resp, Err, F, Fut> ErasedRoute for RouteImpl<Req, Resp, Err, F>
where
	Req: RouteRequest,
	Resp: RouteResponse,
	Err: ErrorUnion + Send + 'static,
	F: Fn(Req) -> Fut + Send + Sync + 'static,
	Fut: Future<Output = Result<Resp, RouteError<Err>>> + Send,
{
	fn message_id(&self) -> &str {
		&self.message_id
	}
	fn path(&self) -> &str {
		&self.path
	}
	fn method(&self) -> &http::Method {
		&self.method
	}
	fn request_schema(&self) -> Option<&Schema> {
		self.request_schema.as_ref()
	}
	fn response_schema(&self) -> Option<&Schema> {
		self.response_schema.as_ref()
	}
	fn custom_error_schemas(&self) -> &[Schema] {
		&self.custom_error_schemas
	}
	fn status_code(&self) -> http::StatusCode {
		self.status_code
	}

	async fn invoke(&self, request_bytes: &[u8], writer_schema: Option<&Schema>) -> ErasedOutcome {
		let schema = writer_schema.or(self.request_schema.as_ref());
		let request = match Req::decode(request_bytes, schema) {
			Ok(request) => request,
			Err(err) => return ErasedOutcome::Internal(err.to_string()),
		};
		match (self.handler)(request).await {
			Ok(response) => match self.response_schema.as_ref() {
				Some(schema) => match response.encode(schema) {
					Ok(bytes) => ErasedOutcome::Ok(bytes),
					Err(err) => ErasedOutcome::Internal(err.to_string()),
				},
				None => ErasedOutcome::Ok(Vec::new()),
			},
			Err(RouteError::Validation(validation)) => ErasedOutcome::Validation(validation),
			Err(RouteError::Custom(err)) => ErasedOutcome::Custom(Box::new(err)),
			Err(RouteError::Internal(message)) => ErasedOutcome::Internal(message),
		}
	}
}

/// Builds up a [`Router`]'s routes before [`Router::build`] freezes them.
pub struct Router {
	namespace: String,
	protocol_name: String,
	config: RouterConfig,
	routes: Vec<Box<dyn ErasedRoute>>,
	message_ids: std::collections::HashSet<String>,
}

impl Router {
	pub fn new(namespace: impl Into<String>, protocol_name: impl Into<String>, config: RouterConfig) -> Self {
		Self {
			namespace: namespace.into(),
			protocol_name: protocol_name.into(),
			config,
			routes: Vec::new(),
			message_ids: std::collections::HashSet::new(),
		}
	}

	/// Register one endpoint. Returns `self` for chaining, matching
	/// `axum::Router::route`'s fluent style.
	///
	/// Registering the same `(method, path)` twice is a no-op beyond a
	/// `tracing::warn!` (P6): the first registration wins.
	pub fn route<Req, Resp, Err, F, Fut>(
		mut self,
		method: http::Method,
		path: impl Into<String>,
		status_code: http::StatusCode,
		handler: F,
	) -> Result<Self, crate::error::SchemaError>
	where
		Req: RouteRequest,
		Resp: RouteResponse,
		Err: ErrorUnion + Send + 'static,
		F: Fn(Req) -> Fut + Send + Sync + 'static,
		Fut: Future<Output = Result<Resp, RouteError<Err>>> + Send,
	{
		let path = path.into();
		let message_id = protocol::message_id(&method, &path);
		if !self.message_ids.insert(message_id.clone()) {
			tracing::warn!(message_id, "route already registered; ignoring duplicate");
			return Ok(self);
		}
		let route = RouteImpl {
			message_id,
			path,
			method,
			status_code,
			request_schema: Req::schema()?,
			response_schema: Resp::schema()?,
			custom_error_schemas: Err::error_type_schemas(),
			handler,
			_marker: std::marker::PhantomData,
		};
		self.routes.push(Box::new(route));
		Ok(self)
	}

	/// Freeze the route set, compute the shared protocol document and errors
	/// union, and produce the dispatcher.
	///
	/// Consumes `self`, matching SPEC_FULL.md §9 "Router::build() consumes
	/// self to enforce this [no post-freeze mutation] at the type level".
	pub fn build(self) -> Result<Arc<BuiltRouter>, crate::error::SchemaError> {
		let descriptors: Vec<RouteDescriptor<'_>> = self
			.routes
			.iter()
			.map(|route| RouteDescriptor {
				message_id: route.message_id().to_owned(),
				doc: None,
				request: route.request_schema(),
				response: route.response_schema(),
				custom_errors: route.custom_error_schemas(),
			})
			.collect();
		let avro_protocol = protocol::assemble_protocol(&self.namespace, &self.protocol_name, &descriptors)?;
		let protocol_json = serde_json::to_string(&avro_protocol)
			.expect("AvroProtocol always serializes to JSON");
		let protocol_hash = handshake::md5_digest(protocol_json.as_bytes());

		let mut all_custom_errors: Vec<Schema> = Vec::new();
		let mut seen_error_names = std::collections::HashSet::new();
		for route in &self.routes {
			for schema in route.custom_error_schemas() {
				let name = protocol::type_name(schema);
				if seen_error_names.insert(name) {
					all_custom_errors.push(schema.clone());
				}
			}
		}
		let errors_union_schema = protocol::build_server_errors_union_schema(&all_custom_errors)?;

		let routes_by_message_id: HashMap<String, Box<dyn ErasedRoute>> = self
			.routes
			.into_iter()
			.map(|route| (route.message_id().to_owned(), route))
			.collect();

		Ok(Arc::new(BuiltRouter {
			avro_protocol,
			protocol_json,
			protocol_hash,
			errors_union_schema,
			routes_by_message_id,
			cache: CompatibilityCache::new(self.config.max_cache_entries),
			config: self.config,
		}))
	}
}

/// The frozen, immutable server state: protocol document, errors union,
/// compatibility cache, and the route table. Shared across requests behind
/// an `Arc` (SPEC_FULL.md §5 "the server protocol state is read-only after
/// startup and requires no synchronization").
pub struct BuiltRouter {
	avro_protocol: AvroProtocol,
	protocol_json: String,
	protocol_hash: Md5,
	errors_union_schema: Schema,
	routes_by_message_id: HashMap<String, Box<dyn ErasedRoute>>,
	cache: CompatibilityCache,
	config: RouterConfig,
}

/// Outcome of resolving one request's handshake (SPEC_FULL.md §4.3).
struct Resolved {
	response: HandshakeResponse,
	/// `None` when the handshake itself failed to decode or the protocols
	/// are irreconcilable: the call is not attempted at all (§9 "Possible
	/// source bug" fix).
	cache_entry: Option<Arc<CacheEntry>>,
}

impl BuiltRouter {
	pub fn protocol_json(&self) -> &str {
		&self.protocol_json
	}
	pub fn protocol_hash(&self) -> &Md5 {
		&self.protocol_hash
	}

	/// Resolve a handshake against the cache, computing and inserting a new
	/// [`CacheEntry`] on a cache miss (SPEC_FULL.md §4.3).
	fn resolve_handshake(&self, request: &HandshakeRequest) -> Resolved {
		let entry = match self.cache.get(&request.clientHash) {
			Some(entry) => Some(entry),
			None => match self.compute_entry(request) {
				Ok(entry) => Some(self.cache.insert(request.clientHash.clone(), entry)),
				Err(()) => None,
			},
		};

		let response = match &entry {
			None => HandshakeResponse {
				r#match: HandshakeMatch::NONE,
				serverProtocol: Some(self.protocol_json.clone()),
				serverHash: Some(self.protocol_hash.clone()),
				meta: None,
			},
			Some(entry) => {
				if request.serverHash == self.protocol_hash && entry.client_compatible {
					HandshakeResponse {
						r#match: HandshakeMatch::BOTH,
						serverProtocol: None,
						serverHash: None,
						meta: None,
					}
				} else {
					HandshakeResponse {
						r#match: HandshakeMatch::CLIENT,
						serverProtocol: Some(self.protocol_json.clone()),
						serverHash: Some(self.protocol_hash.clone()),
						meta: None,
					}
				}
			}
		};

		Resolved {
			response,
			cache_entry: entry,
		}
	}

	/// Compute a fresh [`CacheEntry`] for a client protocol not yet in the
	/// cache. `Err(())` means the client protocol could not be reconciled at
	/// all (absent, unparseable, or references an unknown route) — a NONE
	/// with no cache entry results.
	fn compute_entry(&self, request: &HandshakeRequest) -> Result<CacheEntry, ()> {
		let client_protocol_json = request.clientProtocol.as_deref().ok_or(())?;
		let client_protocol: AvroProtocol = serde_json::from_str(client_protocol_json).map_err(|_| ())?;

		let mut request_writer_schemas = HashMap::new();
		let mut client_compatible = true;

		for (message_id, client_message) in &client_protocol.messages {
			let route = self.routes_by_message_id.get(message_id).ok_or(())?;

			let client_has_body = !client_message.request.is_empty();
			let server_has_body = route.request_schema().is_some();
			if client_has_body != server_has_body {
				return Err(());
			}

			if server_has_body {
				let client_request_schema = protocol::build_request_schema(message_id, client_message)
					.map_err(|_| ())?
					.ok_or(())?;
				let server_schema = route.request_schema().expect("server_has_body");
				let server_schema_for_compat =
					protocol::request_schema_for_compat(message_id, server_schema).map_err(|_| ())?;
				let reader: SchemaMut = server_schema_for_compat.json().parse().map_err(|_| ())?;
				let writer: SchemaMut = client_request_schema.json().parse().map_err(|_| ())?;
				if !compat::compatible(&reader, &writer) {
					return Err(());
				}
				request_writer_schemas.insert(message_id.clone(), Arc::new(client_request_schema));
			}

			if let (Some(server_response), false) = (route.response_schema(), client_message.one_way) {
				match protocol::build_response_schema(client_message) {
					Ok(Some(client_response_schema)) => {
						let reader: SchemaMut = client_response_schema.json().parse().map_err(|_: crate::error::SchemaError| ())?;
						let writer: SchemaMut = server_response.json().parse().map_err(|_: crate::error::SchemaError| ())?;
						if !compat::compatible(&reader, &writer) {
							client_compatible = false;
						}
					}
					_ => client_compatible = false,
				}
			}
		}

		Ok(CacheEntry {
			request_writer_schemas,
			client_compatible,
		})
	}

	/// The response for a request whose bytes couldn't even be parsed as a
	/// `HandshakeRequest` (truncated framing, or a datum that doesn't decode
	/// against the canonical handshake schema at all).
	///
	/// The server always knows its own protocol hash, so it can still emit a
	/// full NONE `HandshakeResponse` frame followed by a framed
	/// `CallResponse{error:true}` carrying `Error{status:400}` — no call is
	/// dispatched (SPEC_FULL.md §4.3 step 3, §4.4 step 2, §8 scenario 2).
	fn handshake_decode_failure_response(&self) -> (Vec<u8>, HandshakeMatch) {
		let response = HandshakeResponse {
			r#match: HandshakeMatch::NONE,
			serverProtocol: Some(self.protocol_json.clone()),
			serverHash: Some(self.protocol_hash.clone()),
			meta: None,
		};
		let mut out = Vec::new();
		let handshake_bytes = framing::encode_datum(&response, handshake::handshake_response_schema())
			.expect("HandshakeResponse always encodes");
		framing::write_frame(&mut out, &handshake_bytes);

		let error = BuiltinError {
			refid: None,
			status: 400,
			error: "malformed handshake request".to_owned(),
		};
		let error_bytes = encode_branch(&error, &self.errors_union_schema)
			.expect("built-in Error always encodes against the errors union");
		let call_response = CallResponse {
			meta: None,
			error: true,
			response: error_bytes,
		};
		let call_bytes = framing::encode_datum(&call_response, handshake::call_response_schema())
			.expect("CallResponse always encodes");
		framing::write_frame(&mut out, &call_bytes);
		framing::write_terminator(&mut out);
		(out, HandshakeMatch::NONE)
	}

	/// Dispatch one full request body (SPEC_FULL.md §4.4).
	///
	/// Returns the framed Avro response body. The caller (the axum adapter)
	/// is responsible for wrapping it at HTTP status 200 with
	/// `content-type: avro/binary`, per §4.4 "the HTTP status code on Avro
	/// responses is always 200 unless the handshake could not be produced at
	/// all".
	pub async fn dispatch(&self, body: &[u8]) -> Result<Vec<u8>, DispatchError> {
		self.dispatch_with_short_circuit(body, false).await.map(|(bytes, _)| bytes)
	}

	/// Like [`dispatch`](Self::dispatch), but when `elide_handshake_frame` is
	/// set and the resolved match is `BOTH`, the leading handshake frame is
	/// omitted from the returned bytes (SPEC_FULL.md §9 "header
	/// short-circuit"). The handshake is still fully computed either way —
	/// this only changes what's written to the wire — so callers that never
	/// pass `true` see identical behavior to `dispatch`.
	///
	/// Returns the response bytes alongside the [`HandshakeMatch`] that was
	/// resolved, so the axum adapter can set `avro-handshake-match` without
	/// re-parsing the body it just produced.
	pub async fn dispatch_with_short_circuit(
		&self,
		body: &[u8],
		elide_handshake_frame: bool,
	) -> Result<(Vec<u8>, HandshakeMatch), DispatchError> {
		let message = match framing::read_message(body) {
			Ok(message) => message,
			Err(_) => return Ok(self.handshake_decode_failure_response()),
		};

		let (handshake_request, consumed) =
			match framing::decode_datum_prefix::<HandshakeRequest>(&message, handshake::handshake_request_schema()) {
				Ok(pair) => pair,
				Err(_) => return Ok(self.handshake_decode_failure_response()),
			};

		let resolved = self.resolve_handshake(&handshake_request);
		let handshake_match = resolved.response.r#match;

		let mut out = Vec::new();
		if !(elide_handshake_frame && handshake_match == HandshakeMatch::BOTH) {
			let handshake_bytes = framing::encode_datum(&resolved.response, handshake::handshake_response_schema())
				.expect("HandshakeResponse always encodes");
			framing::write_frame(&mut out, &handshake_bytes);
		}

		let Some(cache_entry) = resolved.cache_entry else {
			let error = BuiltinError {
				refid: None,
				status: 400,
				error: "protocol could not be reconciled".to_owned(),
			};
			let error_bytes = encode_branch(&error, &self.errors_union_schema)
				.expect("built-in Error always encodes against the errors union");
			let call_response = CallResponse {
				meta: None,
				error: true,
				response: error_bytes,
			};
			let call_bytes = framing::encode_datum(&call_response, handshake::call_response_schema())
				.expect("CallResponse always encodes");
			framing::write_frame(&mut out, &call_bytes);
			framing::write_terminator(&mut out);
			return Ok((out, handshake_match));
		};

		let remaining = &message[consumed..];
		if remaining.is_empty() {
			framing::write_terminator(&mut out);
			return Ok((out, handshake_match));
		}

		let (call_request, _) =
			framing::decode_datum_prefix::<CallRequest>(remaining, handshake::call_request_schema())
				.map_err(DispatchError::Decode)?;

		let route = self
			.routes_by_message_id
			.get(&call_request.message)
			.ok_or_else(|| DispatchError::UnknownMessage(call_request.message.clone()))?;

		// A missing per-client writer schema means either the client is a
		// same-schema (BOTH) caller, in which case `invoke` falls back to the
		// route's own schema, or the route genuinely expects no body.
		let writer_schema = cache_entry.request_writer_schemas.get(&call_request.message);

		let invocation = route.invoke(&call_request.request, writer_schema.map(std::sync::Arc::as_ref));
		let outcome = match self.config.call_timeout {
			Some(deadline) => match tokio::time::timeout(deadline, invocation).await {
				Ok(outcome) => outcome,
				Err(_) => ErasedOutcome::Internal(format!("endpoint timed out after {deadline:?}")),
			},
			None => invocation.await,
		};

		let (error, response_bytes) = match outcome {
			ErasedOutcome::Ok(bytes) => (false, bytes),
			ErasedOutcome::Validation(validation) => {
				let bytes = encode_branch(&validation, &self.errors_union_schema)
					.expect("built-in ValidationError always encodes against the errors union");
				(true, bytes)
			}
			ErasedOutcome::Custom(custom) => {
				let bytes = custom
					.encode(&self.errors_union_schema)
					.expect("declared custom error types always encode against the errors union");
				(true, bytes)
			}
			ErasedOutcome::Internal(message) => {
				let refid = uuid::Uuid::new_v4();
				tracing::error!(refid = %refid, message, "unhandled error in route handler");
				let error = BuiltinError {
					refid: Some(serde_avro_derive::types::FixedBytes::new(*refid.as_bytes())),
					status: 500,
					error: "Internal Server Error".to_owned(),
				};
				let bytes = encode_branch(&error, &self.errors_union_schema)
					.expect("built-in Error always encodes against the errors union");
				(true, bytes)
			}
		};

		let call_response = CallResponse {
			meta: None,
			error,
			response: response_bytes,
		};
		let call_bytes =
			framing::encode_datum(&call_response, handshake::call_response_schema()).expect("CallResponse always encodes");
		framing::write_frame(&mut out, &call_bytes);
		framing::write_terminator(&mut out);
		Ok((out, handshake_match))
	}

	/// The assembled protocol document, for introspection/testing.
	pub fn avro_protocol(&self) -> &AvroProtocol {
		&self.avro_protocol
	}

	/// `(method, path, success status code)` for every registered route, for
	/// an HTTP adapter to wire up its own router with.
	pub fn routes(&self) -> impl Iterator<Item = (&http::Method, &str, http::StatusCode)> {
		self.routes_by_message_id
			.values()
			.map(|route| (route.method(), route.path(), route.status_code()))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn config() -> RouterConfig {
		RouterConfig {
			max_cache_entries: 10,
			call_timeout: None,
		}
	}

	#[tokio::test]
	async fn unknown_message_id_is_a_dispatch_error() {
		let router = Router::new("test", "TestProtocol", config())
			.build()
			.unwrap();
		let mut body = Vec::new();
		let handshake = HandshakeRequest {
			clientHash: crate::handshake::SENTINEL_SERVER_HASH,
			clientProtocol: None,
			serverHash: crate::handshake::SENTINEL_SERVER_HASH,
			meta: None,
		};
		let bytes = framing::encode_datum(&handshake, handshake::handshake_request_schema()).unwrap();
		framing::write_frame(&mut body, &bytes);
		framing::write_terminator(&mut body);
		let response = router.dispatch(&body).await.unwrap();
		assert!(!response.is_empty());
	}
}
