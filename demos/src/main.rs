//! Runnable walkthrough of SPEC_FULL.md §8's end-to-end scenarios: spins up
//! a real `avro_rpc` server on a loopback port and drives it both with raw
//! framed HTTP requests (to print the handshake match each one resolves to)
//! and with a [`Gateway`](avro_rpc::gateway::Gateway), the way an actual
//! client would.

use std::net::{SocketAddr, TcpListener};

use avro_rpc::axum::AvroRouter;
use avro_rpc::config::{GatewayConfig, RouterConfig};
use avro_rpc::error_union::NoCustomErrors;
use avro_rpc::framing;
use avro_rpc::gateway::{CallError, DefaultError, Gateway};
use avro_rpc::handshake::{
	self, CallRequest, CallResponse, HandshakeRequest, HandshakeResponse, ValidationError,
	ValidationErrorDetail, SENTINEL_SERVER_HASH,
};
use avro_rpc::protocol::{self, RouteDescriptor};
use avro_rpc::router::{NoBody, NoResponse, RouteError};
use avro_rpc::BuildSchema;
use serde_derive::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, BuildSchema)]
struct ResponseModel {
	result: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, BuildSchema)]
struct BRequest {
	b: i32,
}

async fn root_handler(_: NoBody) -> Result<ResponseModel, RouteError<NoCustomErrors>> {
	Ok(ResponseModel { result: true })
}

async fn b_handler(req: BRequest) -> Result<ResponseModel, RouteError<NoCustomErrors>> {
	if req.b <= 0 {
		return Err(RouteError::Validation(ValidationError {
			detail: vec![ValidationErrorDetail {
				loc: vec!["b".to_owned()],
				msg: "must be positive".to_owned(),
				r#type: "value_error".to_owned(),
			}],
		}));
	}
	Ok(ResponseModel { result: true })
}

async fn one_way_handler(_: NoBody) -> Result<NoResponse, RouteError<NoCustomErrors>> {
	Ok(NoResponse)
}

/// Split a dispatcher response into its handshake and call records, the way
/// a from-scratch client (rather than [`Gateway`]) would.
fn decode_response(bytes: &[u8]) -> (HandshakeResponse, CallResponse) {
	let message = framing::read_message(bytes).expect("well-formed frames");
	let handshake_schema = HandshakeResponse::schema().expect("fixed schema");
	let call_schema = CallResponse::schema().expect("fixed schema");
	let (handshake, consumed) =
		framing::decode_datum_prefix::<HandshakeResponse>(&message, &handshake_schema).expect("decodes");
	let (call, _) =
		framing::decode_datum_prefix::<CallResponse>(&message[consumed..], &call_schema).expect("decodes");
	(handshake, call)
}

/// A single-message `clientProtocol` JSON document, shaped exactly like the
/// matching route so the compatibility check always succeeds — what a
/// from-scratch client would hand-assemble before it has a `Gateway` to do
/// this for it.
fn client_protocol_for(
	message_id: &str,
	request: Option<&avro_rpc::Schema>,
	response: Option<&avro_rpc::Schema>,
) -> String {
	let descriptor = RouteDescriptor {
		message_id: message_id.to_owned(),
		doc: None,
		request,
		response,
		custom_errors: &[],
	};
	let protocol = protocol::assemble_protocol("com.example.demo", "DemoProtocol", &[descriptor])
		.expect("valid schemas");
	serde_json::to_string(&protocol).expect("AvroProtocol always serializes")
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	tracing_subscriber::fmt()
		.with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
		.init();

	let app = AvroRouter::new("com.example.demo", "DemoProtocol", RouterConfig::default())
		.avro_route(http::Method::POST, "/", http::StatusCode::OK, root_handler)?
		.avro_route(http::Method::POST, "/b", http::StatusCode::OK, b_handler)?
		.avro_route(
			http::Method::POST,
			"/oneway",
			http::StatusCode::NO_CONTENT,
			one_way_handler,
		)?
		.into_axum_router()?;

	let listener = TcpListener::bind(SocketAddr::from(([127, 0, 0, 1], 0)))?;
	listener.set_nonblocking(true)?;
	let addr = listener.local_addr()?;
	let _server = tokio::spawn(axum::Server::from_tcp(listener)?.serve(app.into_make_service()));
	let base_url = format!("http://{addr}");
	tracing::info!(%base_url, "demo server listening");

	scenario_1_json_fallback(&base_url).await?;
	scenario_2_invalid_handshake(&base_url).await?;
	scenario_3_client_handshake(&base_url).await?;
	scenario_4_cached_both(&base_url).await?;
	scenario_5_one_way(&base_url).await?;
	scenario_6_validation_failure(&base_url).await?;

	Ok(())
}

/// A plain POST with no `accept: avro/binary` header is served over the JSON
/// fallback path untouched by the Avro layer.
async fn scenario_1_json_fallback(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let response = reqwest::Client::new().post(base_url).send().await?;
	println!(
		"scenario 1 (json fallback): status={} body={}",
		response.status(),
		response.text().await?
	);
	Ok(())
}

/// A single frame of garbage can't decode as a `HandshakeRequest`: no call is
/// dispatched and the response is a NONE handshake plus a framed
/// `Error{status:400}`.
async fn scenario_2_invalid_handshake(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let mut body = Vec::new();
	framing::write_frame(&mut body, b"abc");
	framing::write_terminator(&mut body);

	let response = reqwest::Client::new()
		.post(base_url)
		.header("content-type", "avro/binary")
		.header("accept", "avro/binary, application/json")
		.body(body)
		.send()
		.await?;
	let bytes = response.bytes().await?;
	let (handshake, call) = decode_response(&bytes);
	println!(
		"scenario 2 (invalid handshake): match={:?} error={}",
		handshake.r#match, call.error
	);
	Ok(())
}

/// A never-seen client protocol gets a CLIENT handshake (the server's hash
/// doesn't match the client's bogus sentinel) and the call still completes
/// because the schemas are compatible.
async fn scenario_3_client_handshake(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let response_schema = ResponseModel::schema()?;
	let client_protocol = client_protocol_for("post___post", None, Some(&response_schema));
	let handshake = HandshakeRequest {
		clientHash: handshake::md5_digest(client_protocol.as_bytes()),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let call = CallRequest {
		meta: None,
		message: "post___post".to_owned(),
		request: Vec::new(),
	};
	let bytes = post_framed(base_url, &handshake, &call).await?;
	let (handshake_response, call_response) = decode_response(&bytes);
	println!(
		"scenario 3 (client handshake): match={:?} error={}",
		handshake_response.r#match, call_response.error
	);
	Ok(())
}

/// Once the cache holds an entry and the client presents the server's real
/// hash, the handshake collapses to BOTH and elides the protocol document —
/// exactly what [`Gateway`] does internally after its first call, shown here
/// once with hand-assembled frames (to see the match) and once through the
/// real [`Gateway`] API (which hides it, as a normal caller would see it).
async fn scenario_4_cached_both(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let response_schema = ResponseModel::schema()?;
	let client_protocol = client_protocol_for("post___post", None, Some(&response_schema));
	let client_hash = handshake::md5_digest(client_protocol.as_bytes());
	let call = CallRequest {
		meta: None,
		message: "post___post".to_owned(),
		request: Vec::new(),
	};

	// First call (as in scenario 3) populates the cache.
	let first = HandshakeRequest {
		clientHash: client_hash.clone(),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let first_bytes = post_framed(base_url, &first, &call).await?;
	let (first_response, _) = decode_response(&first_bytes);

	// Second call presents the server's real hash and omits clientProtocol.
	let second = HandshakeRequest {
		clientHash: client_hash,
		clientProtocol: None,
		serverHash: first_response
			.serverHash
			.expect("CLIENT handshake always carries serverHash"),
		meta: None,
	};
	let second_bytes = post_framed(base_url, &second, &call).await?;
	let (second_response, call_response) = decode_response(&second_bytes);
	println!(
		"scenario 4 (cached BOTH): match={:?} serverProtocol_present={} error={}",
		second_response.r#match,
		second_response.serverProtocol.is_some(),
		call_response.error
	);

	// The real client-facing API: a Gateway hides all of this bookkeeping.
	let gateway = Gateway::<NoBody, ResponseModel>::new(
		base_url,
		"com.example.demo",
		"DemoProtocol",
		http::Method::POST,
		"/",
		GatewayConfig::default(),
	)?;
	let first_call = gateway.call(NoBody).await?;
	let second_call = gateway.call(NoBody).await?;
	println!("scenario 4 (via Gateway): {first_call:?} then {second_call:?}");
	Ok(())
}

/// An endpoint with no response model reports `oneWay=true` in its protocol
/// entry and its `CallResponse` carries an empty payload.
async fn scenario_5_one_way(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let gateway = Gateway::<NoBody, NoResponse>::new(
		base_url,
		"com.example.demo",
		"DemoProtocol",
		http::Method::POST,
		"/oneway",
		GatewayConfig::default(),
	)?;
	let result = gateway.call(NoBody).await;
	println!("scenario 5 (one-way): {result:?}");
	Ok(())
}

/// A request that decodes fine but violates a field constraint comes back as
/// `CallResponse.error == true` carrying a `ValidationError`, which the
/// gateway surfaces as `CallError::Endpoint`.
async fn scenario_6_validation_failure(base_url: &str) -> Result<(), Box<dyn std::error::Error>> {
	let gateway = Gateway::<BRequest, ResponseModel>::new(
		base_url,
		"com.example.demo",
		"DemoProtocol",
		http::Method::POST,
		"/b",
		GatewayConfig::default(),
	)?;
	match gateway.call(BRequest { b: -2 }).await {
		Ok(response) => println!("scenario 6 (validation failure): unexpectedly succeeded: {response:?}"),
		Err(CallError::Endpoint(DefaultError::ValidationError(err))) => {
			println!("scenario 6 (validation failure): {err:?}")
		}
		Err(other) => println!("scenario 6 (validation failure): unexpected error: {other}"),
	}
	Ok(())
}

async fn post_framed(
	base_url: &str,
	handshake: &HandshakeRequest,
	call: &CallRequest,
) -> Result<Vec<u8>, Box<dyn std::error::Error>> {
	let handshake_schema = HandshakeRequest::schema()?;
	let call_schema = CallRequest::schema()?;

	let mut body = Vec::new();
	framing::write_frame(&mut body, &framing::encode_datum(handshake, &handshake_schema)?);
	framing::write_frame(&mut body, &framing::encode_datum(call, &call_schema)?);
	framing::write_terminator(&mut body);

	let response = reqwest::Client::new()
		.post(base_url)
		.header("content-type", "avro/binary")
		.header("accept", "avro/binary, application/json")
		.body(body)
		.send()
		.await?;
	Ok(response.bytes().await?.to_vec())
}
