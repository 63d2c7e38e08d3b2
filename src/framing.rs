//! Object-container-protocol framing: length-prefixed frames terminated by
//! a zero-length frame, and the resumable-accumulation datum reader built on
//! top of it.

use std::io::Cursor;

use serde_avro_fast::{de::DeserializerState, Schema};

use crate::error::DecodeError;

/// Prepend a 4-byte big-endian length to `payload` and append it to `out`.
pub fn write_frame(out: &mut Vec<u8>, payload: &[u8]) {
	out.extend_from_slice(&(payload.len() as u32).to_be_bytes());
	out.extend_from_slice(payload);
}

/// Append the zero-length terminating frame.
pub fn write_terminator(out: &mut Vec<u8>) {
	out.extend_from_slice(&0u32.to_be_bytes());
}

/// Split `body` into its constituent frames, stopping at (and consuming) the
/// terminating zero-length frame.
///
/// Returns the concatenation of all non-terminator frame payloads: this is
/// the "message" that one or more avro datums are read from.
pub fn read_message(body: &[u8]) -> Result<Vec<u8>, DecodeError> {
	let mut message = Vec::new();
	let mut rest = body;
	loop {
		let len_bytes: [u8; 4] = rest
			.get(..4)
			.and_then(|s| s.try_into().ok())
			.ok_or_else(|| DecodeError::new("truncated frame length"))?;
		let len = u32::from_be_bytes(len_bytes) as usize;
		rest = &rest[4..];
		if len == 0 {
			return Ok(message);
		}
		let payload = rest
			.get(..len)
			.ok_or_else(|| DecodeError::new("truncated frame payload"))?;
		message.extend_from_slice(payload);
		rest = &rest[len..];
	}
}

/// Decode one datum from the front of `buf` per `schema`, returning the value
/// and the number of bytes of `buf` it consumed.
///
/// The Avro IPC handshake/call framing places two datums back to back within
/// a single framed message (handshake then call) with no delimiter between
/// them other than what each datum's own schema implies, hence the need to
/// report how many bytes were consumed so the caller can keep decoding the
/// remainder.
pub fn decode_datum_prefix<T>(buf: &[u8], schema: &Schema) -> Result<(T, usize), DecodeError>
where
	T: serde::de::DeserializeOwned,
{
	let mut state = DeserializerState::from_reader(Cursor::new(buf), schema);
	let value = T::deserialize(state.deserializer())
		.map_err(|e| DecodeError::new(format!("failed to decode datum: {e}")))?;
	let consumed = state.into_reader().into_inner().position() as usize;
	Ok((value, consumed))
}

/// Encode `value` as a datum against `schema`.
///
/// This is the only way the Avro layer writes response/error bytes: the
/// schema is always the server's own (the client performs resolution on
/// read, not the other way around), so there's no "reader schema" concept on
/// this side.
pub fn encode_datum<T>(value: &T, schema: &Schema) -> Result<Vec<u8>, serde_avro_fast::ser::SerError>
where
	T: serde::Serialize + ?Sized,
{
	serde_avro_fast::to_datum_vec(value, &mut serde_avro_fast::ser::SerializerConfig::new(schema))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_message_is_just_terminator() {
		let mut body = Vec::new();
		write_terminator(&mut body);
		assert_eq!(read_message(&body).unwrap(), Vec::<u8>::new());
	}

	#[test]
	fn single_frame_message_round_trips() {
		let mut body = Vec::new();
		write_frame(&mut body, b"hello");
		write_terminator(&mut body);
		assert_eq!(read_message(&body).unwrap(), b"hello".to_vec());
	}

	#[test]
	fn two_frames_concatenate() {
		let mut body = Vec::new();
		write_frame(&mut body, b"hel");
		write_frame(&mut body, b"lo");
		write_terminator(&mut body);
		assert_eq!(read_message(&body).unwrap(), b"hello".to_vec());
	}

	#[test]
	fn truncated_body_is_a_decode_error() {
		assert!(read_message(b"abc").is_err());
	}
}
