//! Reader/writer schema compatibility checking (SPEC_FULL.md §4.2, §4.3)
//!
//! `serde_avro_fast` only *executes* schema resolution (it assumes the reader
//! and writer schemas are close enough that field/variant lookups by name
//! will succeed); nothing in the teacher crate decides, ahead of time,
//! whether two schemas *are* compatible. That decision is what the handshake
//! algorithm needs, so it lives here instead.
//!
//! Note: [`SchemaMut`] does not retain field `default` values (see its
//! `nodes_mut` documentation) — `serde_avro_fast` relies on serde's own
//! `#[serde(default)]`/`Option` handling for defaulting instead of modeling
//! Avro defaults explicitly. Consequently this checker approximates "reader
//! field has a default" as "the reader field's type is a nullable union"
//! (the overwhelmingly common case for optional fields), which is a known
//! simplification relative to the full Avro compatibility rules.

use serde_avro_fast::schema::{RegularType, SchemaKey, SchemaMut};

/// Decide whether data written with `writer` can be read with `reader`.
pub fn compatible(reader: &SchemaMut, writer: &SchemaMut) -> bool {
	compatible_at(reader, writer, SchemaKey::root(), SchemaKey::root())
}

fn compatible_at(reader: &SchemaMut, writer: &SchemaMut, r: SchemaKey, w: SchemaKey) -> bool {
	let (Some(r_node), Some(w_node)) = (reader.get(r), writer.get(w)) else {
		return false;
	};

	// A reader union is compatible if it can resolve at least one branch for
	// every writer type it might see; since we don't track which branch a
	// given value picks here, we require that the writer type is compatible
	// with *some* reader branch.
	if let RegularType::Union(r_union) = &r_node.type_ {
		return r_union
			.variants
			.iter()
			.any(|&r_variant| compatible_at(reader, writer, r_variant, w));
	}
	if let RegularType::Union(w_union) = &w_node.type_ {
		return w_union
			.variants
			.iter()
			.all(|&w_variant| compatible_at(reader, writer, r, w_variant));
	}

	match (&r_node.type_, &w_node.type_) {
		(RegularType::Null, RegularType::Null) => true,
		(RegularType::Boolean, RegularType::Boolean) => true,
		// Promotion: writer int/long/float/double may widen into a wider
		// reader numeric type (Avro's standard promotion table).
		(RegularType::Int, RegularType::Int) => true,
		(RegularType::Long, RegularType::Int | RegularType::Long) => true,
		(RegularType::Float, RegularType::Int | RegularType::Long | RegularType::Float) => true,
		(
			RegularType::Double,
			RegularType::Int | RegularType::Long | RegularType::Float | RegularType::Double,
		) => true,
		(RegularType::Bytes, RegularType::Bytes) => true,
		(RegularType::String, RegularType::String) => true,
		(RegularType::Bytes, RegularType::String) | (RegularType::String, RegularType::Bytes) => {
			true
		}
		(RegularType::Array(r_arr), RegularType::Array(w_arr)) => {
			compatible_at(reader, writer, r_arr.items, w_arr.items)
		}
		(RegularType::Map(r_map), RegularType::Map(w_map)) => {
			compatible_at(reader, writer, r_map.values, w_map.values)
		}
		(RegularType::Fixed(r_fixed), RegularType::Fixed(w_fixed)) => {
			r_fixed.name == w_fixed.name && r_fixed.size == w_fixed.size
		}
		(RegularType::Enum(r_enum), RegularType::Enum(w_enum)) => {
			// Every symbol the writer might send must be known to the reader.
			w_enum.symbols.iter().all(|s| r_enum.symbols.contains(s))
		}
		(RegularType::Record(r_rec), RegularType::Record(w_rec)) => {
			if r_rec.name != w_rec.name {
				return false;
			}
			// Every writer field the reader also declares must resolve.
			// Fields the writer has and the reader doesn't are just skipped.
			// Fields the reader has and the writer doesn't must be nullable
			// (our stand-in for "has a default", see module docs).
			for r_field in &r_rec.fields {
				match w_rec.fields.iter().find(|w_field| w_field.name == r_field.name) {
					Some(w_field) => {
						if !compatible_at(reader, writer, r_field.type_, w_field.type_) {
							return false;
						}
					}
					None => {
						let is_nullable = matches!(
							reader.get(r_field.type_).map(|n| &n.type_),
							Some(RegularType::Union(u))
								if u.variants.first().and_then(|&k| reader.get(k)).map(|n| matches!(n.type_, RegularType::Null)) == Some(true)
						);
						if !is_nullable {
							return false;
						}
					}
				}
			}
			true
		}
		_ => false,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	fn schema(json: &str) -> SchemaMut {
		serde_avro_fast::schema::SchemaMut::from_str(json).unwrap()
	}

	#[test]
	fn identical_records_are_compatible() {
		let s = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"int"}]}"#,
		);
		assert!(compatible(&s, &s));
	}

	#[test]
	fn widening_int_to_long_is_compatible() {
		let reader = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"long"}]}"#,
		);
		let writer = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"int"}]}"#,
		);
		assert!(compatible(&reader, &writer));
	}

	#[test]
	fn narrowing_long_to_int_is_incompatible() {
		let reader = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"int"}]}"#,
		);
		let writer = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"long"}]}"#,
		);
		assert!(!compatible(&reader, &writer));
	}

	#[test]
	fn missing_nullable_reader_field_is_compatible() {
		let reader = schema(
			r#"{"type":"record","name":"A","fields":[
				{"name":"x","type":"int"},
				{"name":"y","type":["null","string"]}
			]}"#,
		);
		let writer = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"int"}]}"#,
		);
		assert!(compatible(&reader, &writer));
	}

	#[test]
	fn missing_required_reader_field_is_incompatible() {
		let reader = schema(
			r#"{"type":"record","name":"A","fields":[
				{"name":"x","type":"int"},
				{"name":"y","type":"string"}
			]}"#,
		);
		let writer = schema(
			r#"{"type":"record","name":"A","fields":[{"name":"x","type":"int"}]}"#,
		);
		assert!(!compatible(&reader, &writer));
	}

	#[test]
	fn enum_writer_symbol_subset_is_compatible() {
		let reader = schema(r#"{"type":"enum","name":"E","symbols":["A","B","C"]}"#);
		let writer = schema(r#"{"type":"enum","name":"E","symbols":["A","B"]}"#);
		assert!(compatible(&reader, &writer));
	}

	#[test]
	fn enum_writer_with_unknown_symbol_is_incompatible() {
		let reader = schema(r#"{"type":"enum","name":"E","symbols":["A","B"]}"#);
		let writer = schema(r#"{"type":"enum","name":"E","symbols":["A","B","C"]}"#);
		assert!(!compatible(&reader, &writer));
	}
}
