// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

//! Derives `num_slices` key-dependent bit indices per slice.
//!
//! A salted cryptographic digest ladder (MD5 → SHA-1 → SHA-256 → SHA-384 →
//! SHA-512), picked wide enough to cover every slice, provides cheap bit
//! material. A handful of "salts" — pre-seeded, not yet finalized digest
//! states — are derived once per filter geometry; each `indices()` call
//! clones a salt, absorbs the key, and slices the digest into fixed-width
//! chunks mod `bits_per_slice`.
//!
//! Chunks are read little-endian so the output is byte-identical across
//! hosts and process runs, regardless of the host's native endianness.

use digest::Digest;
use md5::Md5;
use sha1::Sha1;
use sha2::Sha256;
use sha2::Sha384;
use sha2::Sha512;

/// A pre-seeded, not-yet-finalized digest state, one per "salt" in the
/// ladder. Cloning and finalizing with a key's bytes yields that salt's
/// digest of the key.
#[derive(Clone)]
enum Salt {
    Md5(Md5),
    Sha1(Sha1),
    Sha256(Sha256),
    Sha384(Sha384),
    Sha512(Sha512),
}

impl Salt {
    fn digest_key(&self, key_bytes: &[u8]) -> Vec<u8> {
        match self {
            Salt::Md5(h) => {
                let mut h = h.clone();
                h.update(key_bytes);
                h.finalize().to_vec()
            }
            Salt::Sha1(h) => {
                let mut h = h.clone();
                h.update(key_bytes);
                h.finalize().to_vec()
            }
            Salt::Sha256(h) => {
                let mut h = h.clone();
                h.update(key_bytes);
                h.finalize().to_vec()
            }
            Salt::Sha384(h) => {
                let mut h = h.clone();
                h.update(key_bytes);
                h.finalize().to_vec()
            }
            Salt::Sha512(h) => {
                let mut h = h.clone();
                h.update(key_bytes);
                h.finalize().to_vec()
            }
        }
    }
}

#[derive(Clone, Copy)]
enum Ladder {
    Md5,
    Sha1,
    Sha256,
    Sha384,
    Sha512,
}

impl Ladder {
    /// Picks the smallest ladder rung whose digest covers `total_hash_bits`.
    fn for_total_hash_bits(total_hash_bits: u64) -> Self {
        if total_hash_bits > 384 {
            Ladder::Sha512
        } else if total_hash_bits > 256 {
            Ladder::Sha384
        } else if total_hash_bits > 160 {
            Ladder::Sha256
        } else if total_hash_bits > 128 {
            Ladder::Sha1
        } else {
            Ladder::Md5
        }
    }

    fn digest_size_bytes(self) -> usize {
        match self {
            Ladder::Md5 => 16,
            Ladder::Sha1 => 20,
            Ladder::Sha256 => 32,
            Ladder::Sha384 => 48,
            Ladder::Sha512 => 64,
        }
    }

    /// Builds the i-th salt: `H(H(le_u32(i)))`, stopping one update short of
    /// finalized so each key only needs one more `update` + `finalize`.
    fn seeded_salt(self, i: u32) -> Salt {
        let inner = i.to_le_bytes();
        match self {
            Ladder::Md5 => {
                let seed = Md5::digest(inner);
                let mut h = Md5::new();
                h.update(seed);
                Salt::Md5(h)
            }
            Ladder::Sha1 => {
                let seed = Sha1::digest(inner);
                let mut h = Sha1::new();
                h.update(seed);
                Salt::Sha1(h)
            }
            Ladder::Sha256 => {
                let seed = Sha256::digest(inner);
                let mut h = Sha256::new();
                h.update(seed);
                Salt::Sha256(h)
            }
            Ladder::Sha384 => {
                let seed = Sha384::digest(inner);
                let mut h = Sha384::new();
                h.update(seed);
                Salt::Sha384(h)
            }
            Ladder::Sha512 => {
                let seed = Sha512::digest(inner);
                let mut h = Sha512::new();
                h.update(seed);
                Salt::Sha512(h)
            }
        }
    }
}

/// Width, in bytes, of each index chunk carved out of a digest.
fn chunk_size_for(bits_per_slice: u64) -> usize {
    if bits_per_slice >= (1u64 << 31) {
        8
    } else if bits_per_slice >= (1u64 << 15) {
        4
    } else {
        2
    }
}

fn read_chunk_le(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf[..bytes.len()].copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

/// Derives exactly `num_slices` indices, each in `[0, bits_per_slice)`, from
/// a key's canonical bytes. Reconstructible from `(num_slices,
/// bits_per_slice)` alone — no extra state needs to be serialized with a
/// filter.
#[derive(Clone)]
pub(crate) struct HashEngine {
    num_slices: u64,
    bits_per_slice: u64,
    chunk_size: usize,
    salts: Vec<Salt>,
}

impl HashEngine {
    pub fn new(num_slices: u64, bits_per_slice: u64) -> Self {
        let chunk_size = chunk_size_for(bits_per_slice);
        let total_hash_bits = 8 * num_slices * chunk_size as u64;
        let ladder = Ladder::for_total_hash_bits(total_hash_bits);

        let ints_per_digest = (ladder.digest_size_bytes() / chunk_size) as u64;
        let num_salts = num_slices.div_ceil(ints_per_digest);

        let salts = (0..num_salts)
            .map(|i| ladder.seeded_salt(i as u32))
            .collect();

        HashEngine {
            num_slices,
            bits_per_slice,
            chunk_size,
            salts,
        }
    }

    /// Yields `num_slices` indices, each `< bits_per_slice`, derived from the
    /// key's bytes.
    pub fn indices(&self, key_bytes: &[u8]) -> Vec<u64> {
        let mut out = Vec::with_capacity(self.num_slices as usize);
        'salts: for salt in &self.salts {
            let digest = salt.digest_key(key_bytes);
            for chunk in digest.chunks(self.chunk_size) {
                out.push(read_chunk_le(chunk) % self.bits_per_slice);
                if out.len() as u64 >= self.num_slices {
                    break 'salts;
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic_across_calls() {
        let engine = HashEngine::new(7, 1000);
        let a = engine.indices(b"hello");
        let b = engine.indices(b"hello");
        assert_eq!(a, b);
        assert_eq!(a.len(), 7);
    }

    #[test]
    fn indices_are_in_range() {
        let engine = HashEngine::new(11, 12345);
        for idx in engine.indices(b"some key") {
            assert!(idx < 12345);
        }
    }

    #[test]
    fn different_keys_usually_differ() {
        let engine = HashEngine::new(7, 1_000_000);
        let a = engine.indices(b"alpha");
        let b = engine.indices(b"beta");
        assert_ne!(a, b);
    }

    #[test]
    fn large_bits_per_slice_uses_wide_chunks() {
        // bits_per_slice >= 2^15 selects 4-byte chunks; just exercise the path.
        let engine = HashEngine::new(3, 1 << 20);
        let indices = engine.indices(b"wide");
        assert_eq!(indices.len(), 3);
        for idx in indices {
            assert!(idx < (1 << 20));
        }
    }
}
