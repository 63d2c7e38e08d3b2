//! Client-side handshake negotiation (SPEC_FULL.md §4.5).
//!
//! A [`Gateway`] targets a single endpoint (one `(method, path)`, hence one
//! `messageId`): it maintains the `(serverHash, clientProtocol, clientHash,
//! reader, writer, lastMatch)` state `avrofastapi/gateway.py` keeps per
//! target, and mirrors its call procedure — full `clientProtocol` on the
//! first call and after any `NONE`, handshake-response-driven reader
//! rebuilding on `CLIENT`, transport retries with `attempt²`-second backoff.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_avro_derive::BuildSchema;
use serde_avro_fast::Schema;
use serde_derive::{Deserialize as SerdeDeserialize, Serialize as SerdeSerialize};

use crate::config::GatewayConfig;
use crate::error::{DecodeError, GatewayError, IncompatibleProtocols, SchemaError};
use crate::framing;
use crate::handshake::{
	self, AvroMessage, AvroProtocol, CallRequest, CallResponse, HandshakeMatch, HandshakeRequest,
	Md5, SENTINEL_SERVER_HASH,
};
use crate::protocol::{self, RouteDescriptor};
use crate::router::{NoBody, NoResponse};

/// A request body a [`Gateway`] can send, mirroring [`crate::router::RouteRequest`]
/// but in the encode direction (the client writes; the server decodes).
pub trait ClientRequest: Send + 'static {
	fn schema() -> Result<Option<Schema>, SchemaError>;
	fn encode(&self, schema: Option<&Schema>) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>;
}

impl<T> ClientRequest for T
where
	T: BuildSchema + Serialize + Send + 'static,
{
	fn schema() -> Result<Option<Schema>, SchemaError> {
		Ok(Some(T::schema()?))
	}
	fn encode(&self, schema: Option<&Schema>) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		let schema = schema.expect("a ClientRequest impl other than NoBody always has a schema");
		framing::encode_datum(self, schema)
	}
}

impl ClientRequest for NoBody {
	fn schema() -> Result<Option<Schema>, SchemaError> {
		Ok(None)
	}
	fn encode(&self, _schema: Option<&Schema>) -> Result<Vec<u8>, serde_avro_fast::ser::SerError> {
		Ok(Vec::new())
	}
}

/// A response body a [`Gateway`] can decode, mirroring
/// [`crate::router::RouteResponse`] in the decode direction.
pub trait ClientResponse: Send + 'static {
	fn schema() -> Result<Option<Schema>, SchemaError>;
	fn decode(bytes: &[u8], schema: Option<&Schema>) -> Result<Self, DecodeError>
	where
		Self: Sized;
}

impl<T> ClientResponse for T
where
	T: BuildSchema + DeserializeOwned + Send + 'static,
{
	fn schema() -> Result<Option<Schema>, SchemaError> {
		Ok(Some(T::schema()?))
	}
	fn decode(bytes: &[u8], schema: Option<&Schema>) -> Result<Self, DecodeError> {
		let schema = schema.ok_or_else(|| DecodeError::new("no response schema available to decode with"))?;
		let (value, _consumed) = framing::decode_datum_prefix(bytes, schema)?;
		Ok(value)
	}
}

impl ClientResponse for NoResponse {
	fn schema() -> Result<Option<Schema>, SchemaError> {
		Ok(None)
	}
	fn decode(_bytes: &[u8], _schema: Option<&Schema>) -> Result<Self, DecodeError> {
		Ok(NoResponse)
	}
}

/// What a [`Gateway`] can decode out of an error `CallResponse`, the
/// client-side counterpart of [`crate::error_union::ErrorUnion`].
///
/// The default, [`DefaultError`], only knows the two built-in records plus
/// the `string` fallback; a caller whose endpoint declares additional error
/// record types supplies its own enum (one variant per record, matching the
/// record's Avro name, plus a `#[serde(rename = "string")] String` fallback
/// variant) and lists those types' schemas in `custom_error_schemas` so the
/// gateway's advertised `clientProtocol` accounts for them.
pub trait ErrorReader: DeserializeOwned + Send + 'static {
	fn custom_error_schemas() -> Vec<Schema> {
		Vec::new()
	}
}

/// The error reader used when an endpoint declares no custom error records.
#[derive(Debug, Clone, SerdeSerialize, SerdeDeserialize)]
pub enum DefaultError {
	Error(handshake::Error),
	ValidationError(handshake::ValidationError),
	#[serde(rename = "string")]
	Message(String),
}

impl ErrorReader for DefaultError {}

/// The outcome of a failed call: either a gateway-level failure (transport,
/// incompatible protocols, a response that didn't decode) or the error
/// record the endpoint itself returned.
#[derive(Debug)]
pub enum CallError<Err> {
	Gateway(GatewayError),
	Endpoint(Err),
}

impl<Err: std::fmt::Debug> std::fmt::Display for CallError<Err> {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			CallError::Gateway(e) => write!(f, "{e}"),
			CallError::Endpoint(e) => write!(f, "endpoint returned an error: {e:?}"),
		}
	}
}

impl<Err: std::fmt::Debug> std::error::Error for CallError<Err> {}

/// Per-call mutable state (SPEC_FULL.md §5: "mutated only between calls").
struct GatewayState {
	server_hash: Md5,
	last_match: Option<HandshakeMatch>,
	/// Schema currently used to decode a successful response. Reset to the
	/// gateway's own `Resp::schema()` whenever `lastMatch == BOTH` (hashes
	/// agree, so no resolution is needed); rebuilt from the server's
	/// advertised schema on `CLIENT`.
	///
	/// `Schema` isn't `Clone` (see `cache::CacheEntry`'s own
	/// `Arc<Schema>` for the same reason), hence the `Arc` here: the state
	/// is read out wholesale under the lock and used outside it.
	response_schema: Option<Arc<Schema>>,
	/// Mirrors `response_schema` for the errors union.
	errors_schema: Arc<Schema>,
}

/// A client targeting one endpoint of one Avro RPC server.
///
/// `Req`/`Resp` mirror [`crate::router::Router::route`]'s `Req`/`Resp` type
/// parameters; `Err` is the set of error records the endpoint may return
/// (see [`ErrorReader`]).
pub struct Gateway<Req, Resp, Err = DefaultError> {
	client: reqwest::Client,
	url: reqwest::Url,
	message_id: String,
	config: GatewayConfig,
	request_schema: Option<Schema>,
	default_response_schema: Option<Arc<Schema>>,
	default_errors_schema: Arc<Schema>,
	/// The `clientProtocol` this gateway advertises: a single-message
	/// `AvroProtocol` describing only the endpoint this `Gateway` targets.
	protocol_json: String,
	client_hash: Md5,
	state: tokio::sync::Mutex<GatewayState>,
	_marker: std::marker::PhantomData<fn() -> (Req, Resp, Err)>,
}

impl<Req, Resp, Err> Gateway<Req, Resp, Err>
where
	Req: ClientRequest,
	Resp: ClientResponse,
	Err: ErrorReader,
{
	pub fn new(
		base_url: &str,
		namespace: impl Into<String>,
		protocol_name: impl Into<String>,
		method: http::Method,
		path: impl Into<String>,
		config: GatewayConfig,
	) -> Result<Self, GatewayBuildError> {
		let path = path.into();
		let message_id = protocol::message_id(&method, &path);
		let request_schema = Req::schema().map_err(GatewayBuildError::Schema)?;
		let response_schema = Resp::schema().map_err(GatewayBuildError::Schema)?;
		let custom_error_schemas = Err::custom_error_schemas();

		let descriptor = RouteDescriptor {
			message_id: message_id.clone(),
			doc: None,
			request: request_schema.as_ref(),
			response: response_schema.as_ref(),
			custom_errors: &custom_error_schemas,
		};
		let avro_protocol =
			protocol::assemble_protocol(&namespace.into(), &protocol_name.into(), std::slice::from_ref(&descriptor))
				.map_err(GatewayBuildError::Schema)?;
		let protocol_json = serde_json::to_string(&avro_protocol).expect("AvroProtocol always serializes to JSON");
		let client_hash = handshake::md5_digest(protocol_json.as_bytes());
		let default_errors_schema =
			Arc::new(protocol::build_server_errors_union_schema(&custom_error_schemas).map_err(GatewayBuildError::Schema)?);
		let default_response_schema = response_schema.map(Arc::new);

		let client = reqwest::Client::builder()
			.timeout(config.timeout)
			.build()
			.map_err(GatewayBuildError::Client)?;
		let url = reqwest::Url::parse(base_url)
			.and_then(|base| base.join(path.trim_start_matches('/')))
			.map_err(GatewayBuildError::Url)?;

		Ok(Self {
			client,
			url,
			message_id,
			state: tokio::sync::Mutex::new(GatewayState {
				server_hash: SENTINEL_SERVER_HASH,
				last_match: None,
				response_schema: default_response_schema.clone(),
				errors_schema: default_errors_schema.clone(),
			}),
			config,
			request_schema,
			default_response_schema,
			default_errors_schema,
			protocol_json,
			client_hash,
			_marker: std::marker::PhantomData,
		})
	}

	/// Issue one call, retrying transport failures up to `config.attempts`
	/// times and, on a single protocol-drift `NONE`, once more with the full
	/// `clientProtocol` attached (SPEC_FULL.md §4.5 steps 1-6).
	pub async fn call(&self, request: Req) -> Result<Resp, CallError<Err>> {
		let request_bytes = request
			.encode(self.request_schema.as_ref())
			.map_err(|e| CallError::Gateway(GatewayError::Decode(DecodeError::new(e.to_string()))))?;

		for handshake_attempt in 0..2u8 {
			match self.send_with_transport_retries(&request_bytes, handshake_attempt == 1).await {
				Ok(Outcome::None) => {
					if handshake_attempt == 1 {
						return Err(CallError::Gateway(GatewayError::IncompatibleProtocols(
							IncompatibleProtocols,
						)));
					}
					// Drive `lastMatch` to `None` so the *next* send forces the
					// full `clientProtocol` even though we're about to anyway.
					self.state.lock().await.last_match = None;
					continue;
				}
				Ok(Outcome::Resolved(result)) => return result,
				Err(err) => return Err(CallError::Gateway(err)),
			}
		}
		unreachable!("the loop above always returns within two handshake attempts")
	}

	/// One handshake attempt, itself retried up to `config.attempts` times on
	/// transport failure.
	async fn send_with_transport_retries(
		&self,
		request_bytes: &[u8],
		force_full_protocol: bool,
	) -> Result<Outcome<Result<Resp, CallError<Err>>>, GatewayError> {
		let mut last_transport_error = None;
		for attempt in 1..=self.config.attempts {
			match self.send_once(request_bytes, force_full_protocol).await {
				Ok(outcome) => return Ok(outcome),
				Err(TransportFailure(err)) => {
					last_transport_error = Some(err);
					if attempt < self.config.attempts {
						tokio::time::sleep((self.config.backoff)(attempt)).await;
					}
				}
			}
		}
		Err(GatewayError::Transport {
			attempts: self.config.attempts,
			source: last_transport_error.expect("loop runs at least once"),
		})
	}

	/// A single HTTP round trip: build the framed request, send it, and
	/// interpret the framed response.
	async fn send_once(
		&self,
		request_bytes: &[u8],
		force_full_protocol: bool,
	) -> Result<Outcome<Result<Resp, CallError<Err>>>, TransportFailure> {
		let (server_hash, include_protocol) = {
			let state = self.state.lock().await;
			let include_protocol = force_full_protocol || state.last_match != Some(HandshakeMatch::BOTH);
			(state.server_hash.clone(), include_protocol)
		};

		let handshake_request = HandshakeRequest {
			clientHash: self.client_hash.clone(),
			clientProtocol: include_protocol.then(|| self.protocol_json.clone()),
			serverHash: server_hash,
			meta: None,
		};
		let call_request = CallRequest {
			meta: None,
			message: self.message_id.clone(),
			request: request_bytes.to_vec(),
		};

		let mut body = Vec::new();
		framing::write_frame(
			&mut body,
			&framing::encode_datum(&handshake_request, handshake::handshake_request_schema())
				.expect("HandshakeRequest always encodes"),
		);
		framing::write_frame(
			&mut body,
			&framing::encode_datum(&call_request, handshake::call_request_schema())
				.expect("CallRequest always encodes"),
		);
		framing::write_terminator(&mut body);

		let response = self
			.client
			.post(self.url.clone())
			.header("content-type", "avro/binary")
			.header("accept", "avro/binary, application/json")
			.body(body)
			.send()
			.await
			.map_err(TransportFailure)?;
		if response.status().is_server_error() {
			return match response.error_for_status() {
				Ok(_) => unreachable!("is_server_error() implies error_for_status() fails"),
				Err(err) => Err(TransportFailure(err)),
			};
		}
		let response_bytes = response.bytes().await.map_err(TransportFailure)?;

		let message = match framing::read_message(&response_bytes) {
			Ok(message) => message,
			Err(err) => {
				return Ok(Outcome::Resolved(Err(CallError::Gateway(GatewayError::Decode(err)))))
			}
		};
		let (handshake_response, consumed) =
			match framing::decode_datum_prefix::<crate::handshake::HandshakeResponse>(
				&message,
				handshake::handshake_response_schema(),
			) {
				Ok(pair) => pair,
				Err(err) => {
					return Ok(Outcome::Resolved(Err(CallError::Gateway(GatewayError::Decode(err)))))
				}
			};

		if handshake_response.r#match == HandshakeMatch::NONE {
			return Ok(Outcome::None);
		}

		if handshake_response.r#match == HandshakeMatch::CLIENT {
			if let Err(err) = self.adopt_server_protocol(&handshake_response).await {
				return Ok(Outcome::Resolved(Err(CallError::Gateway(GatewayError::Decode(err)))));
			}
		} else {
			let mut state = self.state.lock().await;
			state.response_schema = self.default_response_schema.clone();
			state.errors_schema = self.default_errors_schema.clone();
		}
		{
			let mut state = self.state.lock().await;
			state.last_match = Some(handshake_response.r#match);
			if let Some(hash) = handshake_response.serverHash {
				state.server_hash = hash;
			}
		}

		let remaining = &message[consumed..];
		if remaining.is_empty() {
			return Ok(Outcome::Resolved(Err(CallError::Gateway(GatewayError::Decode(
				DecodeError::new("server sent no CallResponse"),
			)))));
		}
		let (call_response, _) = match framing::decode_datum_prefix::<CallResponse>(remaining, handshake::call_response_schema()) {
			Ok(pair) => pair,
			Err(err) => return Ok(Outcome::Resolved(Err(CallError::Gateway(GatewayError::Decode(err))))),
		};

		let (response_schema, errors_schema) = {
			let state = self.state.lock().await;
			(state.response_schema.clone(), state.errors_schema.clone())
		};

		let result = if call_response.error {
			match framing::decode_datum_prefix::<Err>(&call_response.response, &errors_schema) {
				Ok((err, _)) => Err(CallError::Endpoint(err)),
				Err(decode_err) => Err(CallError::Gateway(GatewayError::Decode(decode_err))),
			}
		} else {
			Resp::decode(&call_response.response, response_schema.as_deref())
				.map_err(|e| CallError::Gateway(GatewayError::Decode(e)))
		};
		Ok(Outcome::Resolved(result))
	}

	/// Rebuild `response_schema`/`errors_schema` from the server's advertised
	/// protocol after a `CLIENT` handshake (SPEC_FULL.md §4.5 step 4): locate
	/// this endpoint's `AvroMessage` by `messageId` and materialize its
	/// `response`/`errors` type references into self-contained schemas.
	async fn adopt_server_protocol(&self, handshake_response: &crate::handshake::HandshakeResponse) -> Result<(), DecodeError> {
		let server_protocol_json = handshake_response
			.serverProtocol
			.as_deref()
			.ok_or_else(|| DecodeError::new("CLIENT handshake carried no serverProtocol"))?;
		let server_protocol: AvroProtocol = serde_json::from_str(server_protocol_json)
			.map_err(|e| DecodeError::new(format!("malformed serverProtocol: {e}")))?;
		let message: &AvroMessage = server_protocol
			.messages
			.get(&self.message_id)
			.ok_or_else(|| DecodeError::new("server protocol does not declare this endpoint"))?;

		let response_schema = protocol::build_response_schema(message)
			.map_err(|e| DecodeError::new(format!("failed to rebuild response schema: {e}")))?;
		let errors_schema = protocol::build_message_errors_union_schema(message)
			.map_err(|e| DecodeError::new(format!("failed to rebuild errors schema: {e}")))?;

		let mut state = self.state.lock().await;
		state.response_schema = response_schema.map(Arc::new);
		state.errors_schema = Arc::new(errors_schema);
		Ok(())
	}
}

/// A transport-level failure (connection error, timeout, 5xx), retried by
/// [`Gateway::send_with_transport_retries`].
struct TransportFailure(reqwest::Error);

enum Outcome<T> {
	/// The handshake came back `NONE`; no call was dispatched.
	None,
	/// The handshake resolved (`CLIENT` or `BOTH`) and the call completed.
	Resolved(T),
}

/// Failure constructing a [`Gateway`] (schema generation, URL parsing, or
/// the underlying `reqwest::Client`).
#[derive(Debug, thiserror::Error)]
pub enum GatewayBuildError {
	#[error(transparent)]
	Schema(#[from] SchemaError),
	#[error("invalid gateway URL: {0}")]
	Url(#[from] url::ParseError),
	#[error("failed to build the underlying reqwest client: {0}")]
	Client(reqwest::Error),
}
