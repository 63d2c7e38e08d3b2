//! End-to-end scenarios from SPEC_FULL.md §8, driving the dispatcher
//! in-process: no real HTTP listener is needed (`axum::Router` is exercised
//! through `tower::Service::oneshot`; the Avro wire format is exercised by
//! framing/decoding bytes directly against `BuiltRouter::dispatch`).

use std::sync::Arc;

use avro_rpc::axum::AvroRouter;
use avro_rpc::config::RouterConfig;
use avro_rpc::error_union::NoCustomErrors;
use avro_rpc::framing;
use avro_rpc::handshake::{
	CallRequest, CallResponse, HandshakeMatch, HandshakeRequest, HandshakeResponse,
	ValidationError, ValidationErrorDetail, SENTINEL_SERVER_HASH,
};
use avro_rpc::protocol::{self, RouteDescriptor};
use avro_rpc::router::{BuiltRouter, NoBody, NoResponse, RouteError, Router};
use avro_rpc::BuildSchema;
use serde_derive::{Deserialize, Serialize};
use tower::ServiceExt;

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

fn build_router() -> Arc<BuiltRouter> {
	Router::new("com.example.test", "TestProtocol", RouterConfig::default())
		.route(http::Method::POST, "/", http::StatusCode::OK, root_handler)
		.unwrap()
		.route(http::Method::POST, "/b", http::StatusCode::OK, b_handler)
		.unwrap()
		.route(
			http::Method::POST,
			"/oneway",
			http::StatusCode::NO_CONTENT,
			one_way_handler,
		)
		.unwrap()
		.build()
		.unwrap()
}

/// Split a dispatcher response into its handshake and call records.
fn decode_response(bytes: &[u8]) -> (HandshakeResponse, CallResponse) {
	let message = framing::read_message(bytes).unwrap();
	let handshake_schema = HandshakeResponse::schema().unwrap();
	let call_schema = CallResponse::schema().unwrap();
	let (handshake, consumed) =
		framing::decode_datum_prefix::<HandshakeResponse>(&message, &handshake_schema).unwrap();
	let (call, _) = framing::decode_datum_prefix::<CallResponse>(&message[consumed..], &call_schema).unwrap();
	(handshake, call)
}

/// Build a single-message `clientProtocol` JSON document for `message_id`,
/// shaped exactly like the matching route so the compatibility check always
/// succeeds, mirroring what a `Gateway` would advertise on its first call.
fn client_protocol_for(
	message_id: &str,
	request: Option<&serde_avro_fast::Schema>,
	response: Option<&serde_avro_fast::Schema>,
) -> String {
	let descriptor = RouteDescriptor {
		message_id: message_id.to_owned(),
		doc: None,
		request,
		response,
		custom_errors: &[],
	};
	let protocol = protocol::assemble_protocol("com.example.test", "TestProtocol", &[descriptor]).unwrap();
	serde_json::to_string(&protocol).unwrap()
}

fn frame_handshake_and_call(handshake: &HandshakeRequest, call: &CallRequest) -> Vec<u8> {
	let mut body = Vec::new();
	framing::write_frame(
		&mut body,
		&framing::encode_datum(handshake, &HandshakeRequest::schema().unwrap()).unwrap(),
	);
	framing::write_frame(
		&mut body,
		&framing::encode_datum(call, &CallRequest::schema().unwrap()).unwrap(),
	);
	framing::write_terminator(&mut body);
	body
}

/// Scenario 1: a plain (non-Avro) request is served over the JSON fallback
/// path, unaffected by the Avro dispatcher.
#[tokio::test]
async fn json_path_without_avro_header() {
	let app = AvroRouter::new("com.example.test", "TestProtocol", RouterConfig::default())
		.avro_route(http::Method::POST, "/", http::StatusCode::OK, root_handler)
		.unwrap()
		.into_axum_router()
		.unwrap();

	let request = http::Request::builder()
		.method(http::Method::POST)
		.uri("/")
		.body(axum::body::Body::empty())
		.unwrap();
	let response = app.oneshot(request).await.unwrap();
	assert_eq!(response.status(), http::StatusCode::OK);
	let content_type = response
		.headers()
		.get(http::header::CONTENT_TYPE)
		.and_then(|v| v.to_str().ok())
		.unwrap_or("");
	assert!(content_type.starts_with("application/json"));
}

/// Scenario 2: a single frame of garbage can't decode as a HandshakeRequest
/// at all, so no call is dispatched and a framed NONE + Error(400) comes
/// back instead of a bubbled error.
#[tokio::test]
async fn invalid_handshake_yields_none_and_error() {
	let router = build_router();
	let mut body = Vec::new();
	framing::write_frame(&mut body, b"abc");
	framing::write_terminator(&mut body);

	let response = router.dispatch(&body).await.unwrap();
	let (handshake_response, call_response) = decode_response(&response);
	assert_eq!(handshake_response.r#match, HandshakeMatch::NONE);
	assert_eq!(handshake_response.serverHash.as_ref(), Some(router.protocol_hash()));
	assert!(call_response.error);

	let errors_schema = protocol::build_server_errors_union_schema(&[]).unwrap();
	let (decoded, _) =
		framing::decode_datum_prefix::<avro_rpc::gateway::DefaultError>(&call_response.response, &errors_schema)
			.unwrap();
	match decoded {
		avro_rpc::gateway::DefaultError::Error(err) => assert_eq!(err.status, 400),
		other => panic!("expected Error, got {other:?}"),
	}
}

/// Scenario 3: a never-seen client protocol gets a CLIENT handshake (the
/// server's hash doesn't match the client's bogus sentinel) and the call
/// still completes because the schemas are compatible.
#[tokio::test]
async fn valid_client_handshake_with_empty_body() {
	let router = build_router();
	let response_schema = ResponseModel::schema().unwrap();
	let client_protocol = client_protocol_for("post___post", None, Some(&response_schema));

	let handshake = HandshakeRequest {
		clientHash: avro_rpc::handshake::md5_digest(client_protocol.as_bytes()),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let call = CallRequest {
		meta: None,
		message: "post___post".to_owned(),
		request: Vec::new(),
	};
	let body = frame_handshake_and_call(&handshake, &call);

	let response = router.dispatch(&body).await.unwrap();
	let (handshake_response, call_response) = decode_response(&response);
	assert_eq!(handshake_response.r#match, HandshakeMatch::CLIENT);
	assert!(handshake_response.serverProtocol.is_some());
	assert_eq!(handshake_response.serverHash.as_ref(), Some(router.protocol_hash()));
	assert!(!call_response.error);
	let (decoded, _) =
		framing::decode_datum_prefix::<ResponseModel>(&call_response.response, &response_schema).unwrap();
	assert_eq!(decoded, ResponseModel { result: true });
}

/// Scenario 4: once the cache holds an entry and the client presents the
/// server's real hash, the handshake collapses to BOTH and elides the
/// protocol document.
#[tokio::test]
async fn cached_both_elides_protocol() {
	let router = build_router();
	let response_schema = ResponseModel::schema().unwrap();
	let client_protocol = client_protocol_for("post___post", None, Some(&response_schema));
	let client_hash = avro_rpc::handshake::md5_digest(client_protocol.as_bytes());

	// First call populates the cache (same as scenario 3).
	let first_handshake = HandshakeRequest {
		clientHash: client_hash.clone(),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let call = CallRequest {
		meta: None,
		message: "post___post".to_owned(),
		request: Vec::new(),
	};
	router
		.dispatch(&frame_handshake_and_call(&first_handshake, &call))
		.await
		.unwrap();

	// Second call: same clientHash, now presenting the server's real hash and
	// omitting clientProtocol, exactly as a Gateway would once lastMatch==BOTH.
	let second_handshake = HandshakeRequest {
		clientHash: client_hash,
		clientProtocol: None,
		serverHash: router.protocol_hash().clone(),
		meta: None,
	};
	let response = router
		.dispatch(&frame_handshake_and_call(&second_handshake, &call))
		.await
		.unwrap();
	let (handshake_response, call_response) = decode_response(&response);
	assert_eq!(handshake_response.r#match, HandshakeMatch::BOTH);
	assert!(handshake_response.serverProtocol.is_none());
	assert!(handshake_response.serverHash.is_none());
	assert!(!call_response.error);
}

/// Scenario 5: a `oneWay` endpoint (no response model) reports `one_way` in
/// its protocol entry and its CallResponse carries an empty payload.
#[tokio::test]
async fn one_way_endpoint_has_empty_response_payload() {
	let router = build_router();
	let message = router.avro_protocol().messages.get("post_oneway__post").unwrap();
	assert!(message.one_way);

	let client_protocol = client_protocol_for("post_oneway__post", None, None);
	let handshake = HandshakeRequest {
		clientHash: avro_rpc::handshake::md5_digest(client_protocol.as_bytes()),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let call = CallRequest {
		meta: None,
		message: "post_oneway__post".to_owned(),
		request: Vec::new(),
	};
	let response = router.dispatch(&frame_handshake_and_call(&handshake, &call)).await.unwrap();
	let (_, call_response) = decode_response(&response);
	assert!(!call_response.error);
	assert!(call_response.response.is_empty());
}

/// Scenario 6: a request that decodes fine but violates a field constraint
/// comes back as `CallResponse.error == true` carrying a `ValidationError`.
#[tokio::test]
async fn validation_failure_is_reported_as_error_response() {
	let router = build_router();
	let request_schema = BRequest::schema().unwrap();
	let response_schema = ResponseModel::schema().unwrap();
	let client_protocol = client_protocol_for("post_b__post", Some(&request_schema), Some(&response_schema));

	let handshake = HandshakeRequest {
		clientHash: avro_rpc::handshake::md5_digest(client_protocol.as_bytes()),
		clientProtocol: Some(client_protocol),
		serverHash: SENTINEL_SERVER_HASH,
		meta: None,
	};
	let call = CallRequest {
		meta: None,
		message: "post_b__post".to_owned(),
		request: framing::encode_datum(&BRequest { b: -2 }, &request_schema).unwrap(),
	};
	let response = router.dispatch(&frame_handshake_and_call(&handshake, &call)).await.unwrap();
	let (_, call_response) = decode_response(&response);
	assert!(call_response.error);

	let errors_schema = protocol::build_server_errors_union_schema(&[]).unwrap();
	let (decoded, _) =
		framing::decode_datum_prefix::<avro_rpc::gateway::DefaultError>(&call_response.response, &errors_schema)
			.unwrap();
	match decoded {
		avro_rpc::gateway::DefaultError::ValidationError(err) => {
			assert_eq!(err.detail[0].loc, vec!["b".to_owned()]);
		}
		other => panic!("expected ValidationError, got {other:?}"),
	}
}
