//! An Avro-over-HTTP RPC layer: the Apache Avro IPC handshake and framed
//! binary wire format, grafted onto an HTTP request/response server and its
//! matching client.
//!
//! This crate is the protocol negotiation machine and schema-compatibility
//! cache that sits between raw HTTP transport and user-defined
//! request/response record types (SPEC_FULL.md §1). The underlying HTTP
//! server and router (path matching, middleware, JSON fallback) are out of
//! scope: this is a content-type plug-in, activated by
//! `content-type: avro/binary`, which the [`axum`](crate::axum) module wires
//! into an [`axum::Router`](::axum::Router) when the `axum` feature is
//! enabled.
//!
//! # Layout
//!
//! - [`handshake`] — the fixed Avro IPC envelope records
//!   (`HandshakeRequest`/`HandshakeResponse`/`CallRequest`/`CallResponse`)
//!   and the `AvroProtocol`/`AvroMessage` JSON protocol descriptor.
//! - [`framing`] — length-prefixed object-container-protocol frames and the
//!   datum-prefix decoder built on top of [`serde_avro_fast`].
//! - [`compat`] — reader/writer schema compatibility checking, the decision
//!   procedure the handshake needs that `serde_avro_fast` itself doesn't
//!   make.
//! - [`cache`] — the per-clientHash FIFO compatibility cache.
//! - [`protocol`] — assembling and parsing the wire `AvroProtocol` document
//!   from/into `serde_avro_fast` schemas.
//! - [`error_union`] — the `Error | ValidationError | ...custom | string`
//!   error-union encoding contract routes implement.
//! - [`router`] — server-side handshake resolution and dispatch, independent
//!   of any particular HTTP framework.
//! - [`gateway`] — the client-side counterpart: handshake retries, reader
//!   schema rebuilding on CLIENT match, transport-error backoff.
//! - [`axum`] (feature `axum`, default) — the thin `axum` adapter.
//! - [`config`] — `RouterConfig`/`GatewayConfig`.
//! - [`error`] — the crate's error taxonomy (SPEC_FULL.md §7).

pub mod cache;
pub mod compat;
pub mod config;
pub mod error;
pub mod error_union;
pub mod framing;
pub mod gateway;
pub mod handshake;
pub mod protocol;
pub mod router;

#[cfg(feature = "axum")]
pub mod axum;

pub use router::{BuiltRouter, NoBody, NoResponse, Router, RouteError};
pub use serde_avro_derive::BuildSchema;
pub use serde_avro_fast::Schema;
