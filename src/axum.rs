//! Thin `axum` adapter (SPEC_FULL.md §6 "Axum integration").
//!
//! [`AvroRouter`] mirrors [`Router`](crate::router::Router)'s fluent
//! registration API (`avro_route` instead of `route`, `into_axum_router`
//! instead of `build`) but, for each endpoint, also keeps the typed
//! handler around so a non-Avro caller can be served directly with JSON
//! (SPEC_FULL.md §4.4 "If the incoming request's `content-type` is not
//! `avro/binary`, the Avro layer is bypassed entirely"). Everything Avro
//! stays inside [`BuiltRouter::dispatch_with_short_circuit`]; this module
//! only knows how to read bytes and headers out of an `axum` request and
//! put them back into a response.

use std::future::Future;
use std::sync::Arc;

use axum::body::Bytes;
use axum::http::header::CONTENT_TYPE;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::routing::MethodRouter;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::RouterConfig;
use crate::error::SchemaError;
use crate::error_union::ErrorUnion;
use crate::handshake::HandshakeMatch;
use crate::router::{NoBody, NoResponse, RouteError, RouteRequest, RouteResponse, Router};
use crate::BuiltRouter;

const AVRO_BINARY: &str = "avro/binary";

/// JSON-body counterpart to [`RouteRequest`], for the fallback path.
///
/// Mirrors `RouteRequest`'s blanket-impl-plus-`NoBody`-carve-out shape: a
/// missing body decodes to `null` before parsing, so endpoints with an
/// `Option<T>`-shaped request still accept an empty JSON body.
trait JsonRequest: Sized {
	fn from_json_body(bytes: &[u8]) -> Result<Self, serde_json::Error>;
}

impl<T: DeserializeOwned> JsonRequest for T {
	fn from_json_body(bytes: &[u8]) -> Result<Self, serde_json::Error> {
		if bytes.is_empty() {
			serde_json::from_slice(b"null")
		} else {
			serde_json::from_slice(bytes)
		}
	}
}

impl JsonRequest for NoBody {
	fn from_json_body(_bytes: &[u8]) -> Result<Self, serde_json::Error> {
		Ok(NoBody)
	}
}

/// JSON-body counterpart to [`RouteResponse`], for the fallback path.
trait JsonResponse {
	fn into_json_response(&self, status: http::StatusCode) -> Response;
}

impl<T: Serialize> JsonResponse for T {
	fn into_json_response(&self, status: http::StatusCode) -> Response {
		(status, axum::Json(self)).into_response()
	}
}

impl JsonResponse for NoResponse {
	fn into_json_response(&self, status: http::StatusCode) -> Response {
		status.into_response()
	}
}

/// One registered endpoint's JSON-fallback leg, deferred until
/// [`AvroRouter::into_axum_router`] has a built [`BuiltRouter`] to share
/// with the Avro leg.
type RouteMount = Box<dyn FnOnce(Arc<BuiltRouter>) -> axum::Router + Send>;

/// Builds up both the Avro dispatcher and its `axum` routing in lockstep.
///
/// `avro_route` registers an endpoint and returns `self` for chaining,
/// mirroring the fluent style of `axum::Router::route` (SPEC_FULL.md §6).
/// The dispatcher ([`Router`]) itself never learns about `axum`; this type
/// is the only place that does.
pub struct AvroRouter {
	router: Router,
	mounts: Vec<RouteMount>,
}

impl AvroRouter {
	pub fn new(namespace: impl Into<String>, protocol_name: impl Into<String>, config: RouterConfig) -> Self {
		Self {
			router: Router::new(namespace, protocol_name, config),
			mounts: Vec::new(),
		}
	}

	/// Register one endpoint against both the Avro dispatcher and the
	/// `axum` router's JSON fallback leg.
	pub fn avro_route<Req, Resp, Err, F, Fut>(
		mut self,
		method: http::Method,
		path: impl Into<String>,
		status_code: http::StatusCode,
		handler: F,
	) -> Result<Self, SchemaError>
	where
		Req: RouteRequest + JsonRequest,
		Resp: RouteResponse + JsonResponse,
		Err: ErrorUnion + Serialize + Send + Sync + 'static,
		F: Fn(Req) -> Fut + Clone + Send + Sync + 'static,
		Fut: Future<Output = Result<Resp, RouteError<Err>>> + Send,
	{
		let path = path.into();
		self.router = self.router.route(method.clone(), path.clone(), status_code, handler.clone())?;

		let mount: RouteMount = Box::new(move |built: Arc<BuiltRouter>| {
			let service = move |headers: HeaderMap, body: Bytes| {
				let built = built.clone();
				let handler = handler.clone();
				async move { handle_one(built, handler, status_code, headers, body).await }
			};
			axum::Router::new().route(&path, method_router_for(&method, service))
		});
		self.mounts.push(mount);
		Ok(self)
	}

	/// Freeze registration and produce a plain `axum::Router`, ready to
	/// `.merge()` into a larger application router or serve directly.
	pub fn into_axum_router(self) -> Result<axum::Router, SchemaError> {
		let built = self.router.build()?;
		let mut axum_router = axum::Router::new();
		for mount in self.mounts {
			axum_router = axum_router.merge(mount(built.clone()));
		}
		Ok(axum_router)
	}
}

/// Map a registered endpoint's `http::Method` onto the matching
/// `axum::routing` verb function. `axum::Router::route` wants a
/// `MethodRouter`, not a bare method+handler pair, so this is the glue
/// between `Router::route`'s generic `http::Method` and axum's
/// one-function-per-verb routing API.
fn method_router_for<H, T>(method: &http::Method, handler: H) -> MethodRouter
where
	H: axum::handler::Handler<T, ()> + Clone + Send + Sync + 'static,
	T: 'static,
{
	use axum::routing::{delete, get, head, options, patch, post, put};
	match *method {
		http::Method::GET => get(handler),
		http::Method::POST => post(handler),
		http::Method::PUT => put(handler),
		http::Method::DELETE => delete(handler),
		http::Method::PATCH => patch(handler),
		http::Method::HEAD => head(handler),
		http::Method::OPTIONS => options(handler),
		_ => panic!("unsupported HTTP method for an axum route: {method}"),
	}
}

/// One request's worth of content-type branching: Avro bytes through the
/// dispatcher, everything else through the typed handler as JSON.
async fn handle_one<Req, Resp, Err, F, Fut>(
	built: Arc<BuiltRouter>,
	handler: F,
	status_code: http::StatusCode,
	headers: HeaderMap,
	body: Bytes,
) -> Response
where
	Req: JsonRequest,
	Resp: JsonResponse,
	Err: Serialize,
	F: Fn(Req) -> Fut,
	Fut: Future<Output = Result<Resp, RouteError<Err>>>,
{
	if is_avro_binary(&headers) {
		return handle_avro(&built, &headers, &body).await;
	}

	let request = match Req::from_json_body(&body) {
		Ok(request) => request,
		Err(err) => return (http::StatusCode::BAD_REQUEST, format!("invalid JSON body: {err}")).into_response(),
	};
	match handler(request).await {
		Ok(response) => response.into_json_response(status_code),
		Err(RouteError::Validation(validation)) => {
			(http::StatusCode::UNPROCESSABLE_ENTITY, axum::Json(validation)).into_response()
		}
		Err(RouteError::Custom(err)) => err.into_json_response(http::StatusCode::BAD_REQUEST),
		Err(RouteError::Internal(message)) => {
			let refid = uuid::Uuid::new_v4();
			tracing::error!(refid = %refid, message, "unhandled error in route handler (JSON path)");
			(
				http::StatusCode::INTERNAL_SERVER_ERROR,
				"Internal Server Error".to_owned(),
			)
				.into_response()
		}
	}
}

fn is_avro_binary(headers: &HeaderMap) -> bool {
	headers
		.get(CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.is_some_and(|value| value.eq_ignore_ascii_case(AVRO_BINARY))
}

/// Whether the client asserted (via the optional short-circuit headers)
/// that it already observed a `BOTH` match and doesn't need the handshake
/// frame repeated. Purely an optimization hint: [`BuiltRouter`] always
/// computes the real handshake result regardless, so a client that omits
/// or lies about these headers just gets the handshake frame back
/// (SPEC_FULL.md §9 "Header short-circuit").
fn client_asserts_both(headers: &HeaderMap) -> bool {
	headers.get("avro-client-hash").is_some()
		&& headers.get("avro-server-hash").is_some()
		&& headers
			.get("avro-handshake")
			.and_then(|value| value.to_str().ok())
			== Some("BOTH")
}

async fn handle_avro(built: &BuiltRouter, headers: &HeaderMap, body: &[u8]) -> Response {
	let elide = client_asserts_both(headers);
	match built.dispatch_with_short_circuit(body, elide).await {
		Ok((bytes, handshake_match)) => {
			let mut response = bytes.into_response();
			response
				.headers_mut()
				.insert(CONTENT_TYPE, http::HeaderValue::from_static(AVRO_BINARY));
			response.headers_mut().insert(
				"avro-handshake-match",
				http::HeaderValue::from_static(handshake_match_str(handshake_match)),
			);
			response
		}
		Err(err) => {
			tracing::warn!(error = %err, "avro dispatch failed before any handshake could be produced");
			(
				http::StatusCode::BAD_REQUEST,
				axum::Json(serde_json::json!({ "error": err.to_string() })),
			)
				.into_response()
		}
	}
}

fn handshake_match_str(m: HandshakeMatch) -> &'static str {
	match m {
		HandshakeMatch::BOTH => "BOTH",
		HandshakeMatch::CLIENT => "CLIENT",
		HandshakeMatch::NONE => "NONE",
	}
}
