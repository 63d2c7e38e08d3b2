//! Error taxonomy (SPEC_FULL.md §7)

use std::borrow::Cow;

pub use serde_avro_fast::schema::SchemaError;

/// Request bytes could not be parsed against any schema the router knows
/// about, or a protocol document was malformed.
///
/// Client-visible as a `NONE` handshake plus a framed `Error{status:400}`.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DecodeError {
	message: Cow<'static, str>,
}

impl DecodeError {
	pub fn new(message: impl Into<Cow<'static, str>>) -> Self {
		Self {
			message: message.into(),
		}
	}
}

/// The client and server protocols could not be reconciled even after a
/// full-protocol retry.
#[derive(Debug, thiserror::Error)]
#[error("protocols are incompatible")]
pub struct IncompatibleProtocols;

/// Errors arising while the dispatcher resolves a handshake or dispatches a
/// call.
#[derive(Debug, thiserror::Error)]
pub enum DispatchError {
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error("no route registered for messageId {0:?}")]
	UnknownMessage(String),
	#[error("route {0:?} expects a request body but none was sent (or vice versa)")]
	BodyPresenceMismatch(String),
}

/// Errors arising from the client gateway.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
	#[error(transparent)]
	IncompatibleProtocols(#[from] IncompatibleProtocols),
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error("transport error after {attempts} attempt(s): {source}")]
	Transport {
		attempts: u32,
		#[source]
		source: reqwest::Error,
	},
	#[error("endpoint returned an error response: status={status} error={error}")]
	Endpoint { status: i32, error: String },
}
