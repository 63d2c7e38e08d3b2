//! Per-endpoint compatibility cache (SPEC_FULL.md §3 `CompatibilityCacheEntry`,
//! §4.3, §9 "LRU under concurrency", "Deserializer caching per (client, route)").
//!
//! Keyed by the client protocol's MD5 fingerprint. Eviction is FIFO rather
//! than strict LRU (see DESIGN.md's resolution of the spec's open question):
//! the source (`avrofastapi/routing.py`'s `_client_protocol_cache`, an
//! `OrderedDict` that is only ever appended to and truncated from the front)
//! never moves an entry to the back on a cache hit, so FIFO is both the
//! simpler model and the one the reference implementation actually exhibits.

use std::collections::HashMap;

use serde_avro_fast::Schema;

use crate::handshake::Md5;

/// What the handshake algorithm learned about one client protocol: for each
/// `messageId` the client declared, the writer schema to use when decoding
/// that route's request bytes, plus whether the client is compatible with
/// every response the server might send it.
#[derive(Debug)]
pub struct CacheEntry {
	/// `messageId -> writer schema`, built by substituting the client
	/// protocol's named types into its declared request record (SPEC_FULL.md
	/// §4.3 step 1). Absent for routes the client declared with no request
	/// body.
	pub request_writer_schemas: HashMap<String, std::sync::Arc<Schema>>,
	/// `true` iff every response the server might send back for a message in
	/// this client's protocol is decodable by the client's declared response
	/// schema. Drives `HandshakeMatch::BOTH` vs `CLIENT`.
	pub client_compatible: bool,
}

/// FIFO-evicting cache from client-protocol MD5 to what the handshake
/// resolved about that protocol (SPEC_FULL.md `CompatibilityCacheEntry`,
/// invariant I3: once inserted, an entry is never mutated, only evicted).
pub struct CompatibilityCache {
	max_entries: usize,
	// `insertion_order` tracks FIFO order separately from `entries` so a hit
	// never needs to touch ordering (no move-to-front), matching the FIFO
	// policy above.
	entries: std::sync::Mutex<CacheState>,
}

struct CacheState {
	map: HashMap<Md5, std::sync::Arc<CacheEntry>>,
	insertion_order: std::collections::VecDeque<Md5>,
}

impl CompatibilityCache {
	pub fn new(max_entries: usize) -> Self {
		Self {
			max_entries,
			entries: std::sync::Mutex::new(CacheState {
				map: HashMap::new(),
				insertion_order: std::collections::VecDeque::new(),
			}),
		}
	}

	/// Look up an already-resolved entry for `client_hash`, without taking
	/// the insertion lock (SPEC_FULL.md §5: "lookups use ... plain
	/// `RwLock`/`Mutex` read access that tolerates races with insertion
	/// because a present entry is immutable once inserted").
	pub fn get(&self, client_hash: &Md5) -> Option<std::sync::Arc<CacheEntry>> {
		self.entries.lock().unwrap().map.get(client_hash).cloned()
	}

	/// Insert a freshly computed entry for `client_hash`, evicting the
	/// oldest entry if this pushes the cache over `max_entries`.
	///
	/// If another caller raced us and already inserted an entry for this
	/// hash, that entry wins and is returned instead (SPEC_FULL.md §4.3 tie
	/// break: "only one final cache insertion is observed by subsequent
	/// requests").
	pub fn insert(
		&self,
		client_hash: Md5,
		entry: CacheEntry,
	) -> std::sync::Arc<CacheEntry> {
		let mut state = self.entries.lock().unwrap();
		if let Some(existing) = state.map.get(&client_hash) {
			return existing.clone();
		}
		let entry = std::sync::Arc::new(entry);
		state.map.insert(client_hash.clone(), entry.clone());
		state.insertion_order.push_back(client_hash);
		while state.map.len() > self.max_entries {
			if let Some(oldest) = state.insertion_order.pop_front() {
				state.map.remove(&oldest);
			} else {
				break;
			}
		}
		entry
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap().map.len()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn hash(byte: u8) -> Md5 {
		serde_avro_derive::types::FixedBytes([byte; 16])
	}

	fn entry() -> CacheEntry {
		CacheEntry {
			request_writer_schemas: HashMap::new(),
			client_compatible: true,
		}
	}

	#[test]
	fn evicts_oldest_first() {
		let cache = CompatibilityCache::new(2);
		cache.insert(hash(1), entry());
		cache.insert(hash(2), entry());
		cache.insert(hash(3), entry());
		assert_eq!(cache.len(), 2);
		assert!(cache.get(&hash(1)).is_none());
		assert!(cache.get(&hash(2)).is_some());
		assert!(cache.get(&hash(3)).is_some());
	}

	#[test]
	fn a_hit_does_not_change_eviction_order() {
		let cache = CompatibilityCache::new(2);
		cache.insert(hash(1), entry());
		cache.insert(hash(2), entry());
		// A lookup is not a "touch": hash(1) is still the oldest.
		assert!(cache.get(&hash(1)).is_some());
		cache.insert(hash(3), entry());
		assert!(cache.get(&hash(1)).is_none());
		assert!(cache.get(&hash(2)).is_some());
	}

	#[test]
	fn concurrent_insert_keeps_first_writer() {
		let cache = CompatibilityCache::new(10);
		let first = cache.insert(
			hash(9),
			CacheEntry {
				request_writer_schemas: HashMap::new(),
				client_compatible: true,
			},
		);
		let second = cache.insert(
			hash(9),
			CacheEntry {
				request_writer_schemas: HashMap::new(),
				client_compatible: false,
			},
		);
		assert!(std::sync::Arc::ptr_eq(&first, &second));
		assert!(cache.get(&hash(9)).unwrap().client_compatible);
	}
}
