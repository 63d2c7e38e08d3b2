//! Wrapper types for Avro shapes that don't have a single obvious Rust
//! representation: fixed-size byte strings and constrained decimals.

use std::ops::{Deref, DerefMut};

use serde_avro_fast::schema::{Fixed, LogicalType, Name, SchemaBuilder, SchemaKey};

use crate::BuildSchema;

/// A byte string that is always exactly `N` bytes long.
///
/// Maps to an Avro `fixed` type named `Bytes_{N}`, matching the naming
/// convention for constrained bytes fields (min_length == max_length == N).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde_derive::Serialize, serde_derive::Deserialize)]
#[serde(transparent)]
pub struct FixedBytes<const N: usize>(#[serde(with = "serde_bytes")] pub [u8; N]);

impl<const N: usize> FixedBytes<N> {
	pub fn new(bytes: [u8; N]) -> Self {
		Self(bytes)
	}
}

impl<const N: usize> Deref for FixedBytes<N> {
	type Target = [u8; N];
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<const N: usize> DerefMut for FixedBytes<N> {
	fn deref_mut(&mut self) -> &mut Self::Target {
		&mut self.0
	}
}

impl<const N: usize> BuildSchema for FixedBytes<N> {
	fn append_schema(builder: &mut SchemaBuilder) {
		builder.nodes.push(
			Fixed::new(Name::from_fully_qualified_name(format!("Bytes_{N}")), N).into(),
		);
	}
	type TypeLookup = Self;
}

/// A [`rust_decimal::Decimal`] constrained to a fixed `precision`/`scale`,
/// mapping to Avro's `bytes` type annotated with `logicalType: decimal`.
///
/// Avro requires both `precision` and `scale` to be known statically for a
/// decimal field; unconstrained decimals have no valid Avro schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Decimal<const PRECISION: u32, const SCALE: u32>(pub rust_decimal::Decimal);

impl<const PRECISION: u32, const SCALE: u32> Deref for Decimal<PRECISION, SCALE> {
	type Target = rust_decimal::Decimal;
	fn deref(&self) -> &Self::Target {
		&self.0
	}
}

impl<const PRECISION: u32, const SCALE: u32> serde::Serialize for Decimal<PRECISION, SCALE> {
	fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
		self.0.serialize(serializer)
	}
}

impl<'de, const PRECISION: u32, const SCALE: u32> serde::Deserialize<'de>
	for Decimal<PRECISION, SCALE>
{
	fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		rust_decimal::Decimal::deserialize(deserializer).map(Self)
	}
}

impl<const PRECISION: u32, const SCALE: u32> BuildSchema for Decimal<PRECISION, SCALE> {
	fn append_schema(builder: &mut SchemaBuilder) {
		let key = builder.build_logical_type(
			LogicalType::Decimal(serde_avro_fast::schema::Decimal::new(
				SCALE,
				PRECISION as usize,
			)),
			|builder| builder.build_duplicate::<Vec<u8>>(),
			|| unreachable!("bytes nodes are unnamed"),
		);
		let _: SchemaKey = key;
	}
	type TypeLookup = Self;
}
