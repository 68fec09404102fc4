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

use std::io;
use std::ops::BitAnd;
use std::ops::BitOr;

use crate::bitvec::BitVec;
use crate::codec::Reader;
use crate::codec::Writer;
use crate::error::Error;
use crate::hash::HashEngine;
use crate::key::Hashable;

/// Header length of the binary format in bytes: `error_rate` (f64) +
/// `num_slices` (u64) + `bits_per_slice` (u64) + `capacity` (u64) + `count`
/// (u64).
const HEADER_LEN: usize = 8 + 8 + 8 + 8 + 8;

/// A fixed-capacity, space-efficient probabilistic set.
///
/// Provides fast membership queries with:
/// - No false negatives (inserted items always test as present)
/// - A tunable false positive rate, fixed at construction
/// - Constant space usage, independent of what is inserted
///
/// The bit array is partitioned into `num_slices` equal-length slices, one
/// per hash function; index `i` of slice `s` lives at bit `s * bits_per_slice
/// + i`. This keeps `union`/`intersection` whole-vector operations and
/// matches the serialized bit order.
#[derive(Clone)]
pub struct BloomFilter {
    error_rate: f64,
    num_slices: u64,
    bits_per_slice: u64,
    capacity: u64,
    count: u64,
    bitarray: BitVec,
    hash_engine: HashEngine,
}

impl BloomFilter {
    /// Constructs a Bloom filter able to hold at least `capacity` elements
    /// while keeping the false positive rate at or below `error_rate`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument)
    /// if `error_rate` is not in `(0, 1)` or `capacity` is `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bloomfilter_rs::bloom::BloomFilter;
    ///
    /// let mut filter = BloomFilter::new(100_000, 0.001).unwrap();
    /// assert!(!filter.add("test").unwrap());
    /// assert!(filter.contains("test"));
    /// ```
    pub fn new(capacity: u64, error_rate: f64) -> Result<Self, Error> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::config("error_rate must be between 0 and 1"));
        }
        if capacity == 0 {
            return Err(Error::config("capacity must be > 0"));
        }

        // given M = num_bits, k = num_slices, P = error_rate, n = capacity
        //       k = log2(1/P)
        // solving for m = bits_per_slice
        // n ~= M * ((ln(2) ** 2) / abs(ln(P)))
        // n ~= (k * m) * ((ln(2) ** 2) / abs(ln(P)))
        // m ~= n * abs(ln(P)) / (k * (ln(2) ** 2))
        let num_slices = (1.0 / error_rate).log2().ceil() as u64;
        let ln2_squared = std::f64::consts::LN_2 * std::f64::consts::LN_2;
        let bits_per_slice =
            ((capacity as f64 * error_rate.ln().abs()) / (num_slices as f64 * ln2_squared)).ceil()
                as u64;

        Ok(Self::from_geometry(
            error_rate,
            num_slices,
            bits_per_slice,
            capacity,
            0,
            BitVec::zeroed(num_slices * bits_per_slice),
        ))
    }

    fn from_geometry(
        error_rate: f64,
        num_slices: u64,
        bits_per_slice: u64,
        capacity: u64,
        count: u64,
        bitarray: BitVec,
    ) -> Self {
        BloomFilter {
            error_rate,
            num_slices,
            bits_per_slice,
            capacity,
            count,
            bitarray,
            hash_engine: HashEngine::new(num_slices, bits_per_slice),
        }
    }

    // ========================================================================
    // Query operations
    // ========================================================================

    /// Tests whether `key` is possibly a member of this filter.
    ///
    /// Returns `false` only if `key` was definitely never added (or added
    /// only through a `union`/`intersection` that dropped it); returns `true`
    /// if it was added, or with probability up to `error_rate` if it wasn't.
    pub fn contains<K: Hashable>(&self, key: K) -> bool {
        let key_bytes = key.to_key_bytes();
        let indices = self.hash_engine.indices(&key_bytes);
        for (slice, offset) in indices.into_iter().enumerate() {
            let bit_index = slice as u64 * self.bits_per_slice + offset;
            if !self.bitarray.get(bit_index) {
                return false;
            }
        }
        true
    }

    // ========================================================================
    // Update operations
    // ========================================================================

    /// Adds `key` to the filter.
    ///
    /// Returns whether `key` was probably already present. When `skip_check`
    /// is `true`, the bits are set unconditionally and the return value is
    /// always `false` — callers use this when they have already established
    /// (e.g. via a `contains` check in a wrapping structure) that the key is
    /// novel, to avoid testing each bit twice.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Saturated`](crate::error::ErrorKind::Saturated) if
    /// `count` already exceeds `capacity`.
    pub fn add<K: Hashable>(&mut self, key: K, skip_check: bool) -> Result<bool, Error> {
        if self.count > self.capacity {
            return Err(Error::saturated(self.count, self.capacity));
        }

        let key_bytes = key.to_key_bytes();
        let indices = self.hash_engine.indices(&key_bytes);

        if skip_check {
            for (slice, offset) in indices.into_iter().enumerate() {
                let bit_index = slice as u64 * self.bits_per_slice + offset;
                self.bitarray.set(bit_index);
            }
            self.count += 1;
            return Ok(false);
        }

        let mut found_all_bits = true;
        for (slice, offset) in indices.into_iter().enumerate() {
            let bit_index = slice as u64 * self.bits_per_slice + offset;
            if !self.bitarray.set(bit_index) {
                found_all_bits = false;
            }
        }

        if found_all_bits {
            Ok(true)
        } else {
            self.count += 1;
            Ok(false)
        }
    }

    // ========================================================================
    // Set operations
    // ========================================================================

    /// Returns a new filter whose bit array is the bitwise OR of `self` and
    /// `other`. Both filters must share identical geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Incompatible`](crate::error::ErrorKind::Incompatible)
    /// if `capacity`, `error_rate`, `num_slices`, or `bits_per_slice` differ.
    pub fn union(&self, other: &BloomFilter) -> Result<BloomFilter, Error> {
        self.require_compatible(other, "union")?;
        let mut bitarray = self.bitarray.clone();
        bitarray.or_into(&other.bitarray);
        Ok(self.with_bitarray(bitarray))
    }

    /// Returns a new filter whose bit array is the bitwise AND of `self` and
    /// `other`. Both filters must share identical geometry.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Incompatible`](crate::error::ErrorKind::Incompatible)
    /// if `capacity`, `error_rate`, `num_slices`, or `bits_per_slice` differ.
    pub fn intersection(&self, other: &BloomFilter) -> Result<BloomFilter, Error> {
        self.require_compatible(other, "intersection")?;
        let mut bitarray = self.bitarray.clone();
        bitarray.and_into(&other.bitarray);
        Ok(self.with_bitarray(bitarray))
    }

    fn require_compatible(&self, other: &BloomFilter, op: &'static str) -> Result<(), Error> {
        if self.capacity != other.capacity || self.error_rate != other.error_rate {
            return Err(Error::incompatible(format!(
                "cannot {op} filters with differing capacity/error_rate \
                 ({}, {}) vs ({}, {})",
                self.capacity, self.error_rate, other.capacity, other.error_rate
            )));
        }
        debug_assert_eq!(self.num_slices, other.num_slices);
        debug_assert_eq!(self.bits_per_slice, other.bits_per_slice);
        Ok(())
    }

    /// `count` has no single correct value for a `union`/`intersection`
    /// result; this crate copies the LHS count, which callers should treat
    /// as approximate.
    fn with_bitarray(&self, bitarray: BitVec) -> BloomFilter {
        BloomFilter {
            bitarray,
            ..self.clone()
        }
    }

    /// Returns a deep copy of this filter.
    pub fn copy(&self) -> BloomFilter {
        self.clone()
    }

    // ========================================================================
    // Properties
    // ========================================================================

    /// Returns the number of elements added so far. Under `skip_check`,
    /// every `add` call increments this regardless of prior membership, so
    /// it counts calls rather than distinct elements in that mode.
    pub fn len(&self) -> u64 {
        self.count
    }

    /// Returns whether no elements have been added.
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub fn capacity(&self) -> u64 {
        self.capacity
    }

    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn num_slices(&self) -> u64 {
        self.num_slices
    }

    pub fn bits_per_slice(&self) -> u64 {
        self.bits_per_slice
    }

    pub fn num_bits(&self) -> u64 {
        self.num_slices * self.bits_per_slice
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serializes this filter to its compact binary form: a 40-byte header
    /// followed by the raw bit payload.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut w = Writer::with_capacity(HEADER_LEN + self.bitarray.byte_len());
        w.write_f64_le(self.error_rate);
        w.write_u64_le(self.num_slices);
        w.write_u64_le(self.bits_per_slice);
        w.write_u64_le(self.capacity);
        w.write_u64_le(self.count);
        w.write(self.bitarray.as_bytes());
        w.into_bytes()
    }

    /// Deserializes a filter from its compact binary form.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedDeserializeData`](crate::error::ErrorKind::MalformedDeserializeData)
    /// if the stream is truncated or the payload length doesn't match the
    /// stored geometry.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(bytes);
        let error_rate = r
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("error_rate"))?;
        let num_slices = r
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("num_slices"))?;
        let bits_per_slice = r
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("bits_per_slice"))?;
        let capacity = r
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("capacity"))?;
        let count = r
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("count"))?;

        let payload = r
            .read_to_end()
            .map_err(|_| Error::insufficient_data("bitarray"))?;

        let num_bits = num_slices * bits_per_slice;
        let expected_bytes = num_bits.div_ceil(8) as usize;
        if payload.len() != expected_bytes {
            return Err(Error::bit_length_mismatch(
                num_bits,
                payload.len() as u64 * 8,
            ));
        }

        Ok(Self::from_geometry(
            error_rate,
            num_slices,
            bits_per_slice,
            capacity,
            count,
            BitVec::from_bytes(payload, num_bits),
        ))
    }

    /// Writes this filter to `sink`, machine-value bits and all. Much more
    /// space-efficient than a generic serialization format.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`](crate::error::ErrorKind::Io) if the
    /// underlying writer fails; the filter itself is left unmodified.
    pub fn tofile<W: io::Write>(&self, sink: &mut W) -> Result<(), Error> {
        sink.write_all(&self.to_bytes()).map_err(Error::io)
    }

    /// Reads a filter from `source`, as serialized by [`tofile`](Self::tofile).
    ///
    /// If `n > 0`, only `n` total bytes (header included) are consumed from
    /// `source`; otherwise the stream is drained.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`](crate::error::ErrorKind::Io) on a stream
    /// failure, or [`ErrorKind::MalformedDeserializeData`](crate::error::ErrorKind::MalformedDeserializeData)
    /// if the payload length doesn't match the stored geometry.
    pub fn fromfile<R: io::Read>(source: &mut R, n: i64) -> Result<Self, Error> {
        if n > 0 && (n as usize) < HEADER_LEN {
            return Err(Error::config("n too small"));
        }

        let mut buf = vec![0u8; HEADER_LEN];
        source.read_exact(&mut buf).map_err(Error::io)?;

        if n > 0 {
            let want = n as usize - HEADER_LEN;
            let mut payload = vec![0u8; want];
            source.read_exact(&mut payload).map_err(Error::io)?;
            buf.extend(payload);
        } else {
            source.read_to_end(&mut buf).map_err(Error::io)?;
        }

        Self::from_bytes(&buf)
    }
}

impl BitOr for &BloomFilter {
    type Output = Result<BloomFilter, Error>;

    fn bitor(self, rhs: &BloomFilter) -> Self::Output {
        self.union(rhs)
    }
}

impl BitAnd for &BloomFilter {
    type Output = Result<BloomFilter, Error>;

    fn bitand(self, rhs: &BloomFilter) -> Self::Output {
        self.intersection(rhs)
    }
}

impl std::fmt::Debug for BloomFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BloomFilter")
            .field("error_rate", &self.error_rate)
            .field("num_slices", &self.num_slices)
            .field("bits_per_slice", &self.bits_per_slice)
            .field("capacity", &self.capacity)
            .field("count", &self.count)
            .finish()
    }
}

impl PartialEq for BloomFilter {
    fn eq(&self, other: &Self) -> bool {
        self.error_rate == other.error_rate
            && self.num_slices == other.num_slices
            && self.bits_per_slice == other.bits_per_slice
            && self.capacity == other.capacity
            && self.count == other.count
            && self.bitarray == other.bitarray
    }
}
