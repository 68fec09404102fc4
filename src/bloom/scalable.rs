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

use crate::bloom::filter::BloomFilter;
use crate::codec::Reader;
use crate::codec::Writer;
use crate::error::Error;
use crate::key::Hashable;

/// Per-generation tightening ratio applied to error rate. Fixed, not
/// configurable: letting callers tune it would break the compounded
/// false-positive bound the growth policy is built around.
const TIGHTENING_RATIO: f64 = 0.9;

/// Per-generation capacity growth factor.
///
/// `Small` is slower to grow but uses less memory, `Large` grows faster at
/// the cost of memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrowthMode {
    /// Capacity doubles each generation.
    Small = 2,
    /// Capacity quadruples each generation.
    Large = 4,
}

impl GrowthMode {
    fn factor(self) -> u64 {
        self as u64
    }

    fn from_raw(value: i32) -> Result<Self, Error> {
        match value {
            2 => Ok(GrowthMode::Small),
            4 => Ok(GrowthMode::Large),
            other => Err(Error::deserial(format!(
                "invalid scale: expected 2 or 4, got {other}"
            ))),
        }
    }
}

/// A probabilistic set that grows as more items are added, without giving up
/// on the overall target false positive rate.
///
/// Internally an ordered sequence of [`BloomFilter`] generations of
/// geometrically increasing capacity and geometrically tightening
/// per-generation error rate, chosen so the compounded false-positive rate
/// across all generations stays below the configured overall target; only
/// the last generation is ever written to, earlier ones are sealed.
pub struct ScalableBloomFilter {
    scale: GrowthMode,
    ratio: f64,
    initial_capacity: u64,
    error_rate: f64,
    filters: Vec<BloomFilter>,
}

impl ScalableBloomFilter {
    /// Constructs an empty scalable Bloom filter. The first generation isn't
    /// allocated until the first [`add`](Self::add).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`](crate::error::ErrorKind::InvalidArgument)
    /// if `error_rate` is not in `(0, 1)` or `initial_capacity` is `0`.
    ///
    /// # Examples
    ///
    /// ```
    /// use bloomfilter_rs::bloom::GrowthMode;
    /// use bloomfilter_rs::bloom::ScalableBloomFilter;
    ///
    /// let mut sbf = ScalableBloomFilter::new(100, 0.001, GrowthMode::Small).unwrap();
    /// assert!(!sbf.add("test"));
    /// assert!(sbf.contains("test"));
    /// ```
    pub fn new(initial_capacity: u64, error_rate: f64, mode: GrowthMode) -> Result<Self, Error> {
        if !(error_rate > 0.0 && error_rate < 1.0) {
            return Err(Error::config("error_rate must be between 0 and 1"));
        }
        if initial_capacity == 0 {
            return Err(Error::config("initial_capacity must be > 0"));
        }

        Ok(ScalableBloomFilter {
            scale: mode,
            ratio: TIGHTENING_RATIO,
            initial_capacity,
            error_rate,
            filters: Vec::new(),
        })
    }

    /// Tests whether `key` is possibly a member, scanning generations
    /// newest-first so recently added keys short-circuit quickly.
    ///
    /// `K: Copy` since `add` needs to reuse `key` across its own pre-check
    /// and the delegated insert.
    pub fn contains<K: Hashable + Copy>(&self, key: K) -> bool {
        self.filters.iter().rev().any(|f| f.contains(key))
    }

    /// Adds `key`, growing the active generation (or appending a new one) as
    /// needed. Returns whether `key` was probably already present.
    ///
    /// This never fails with `Saturated` — unlike a plain [`BloomFilter`], an
    /// `SBF` grows instead of rejecting the insert.
    pub fn add<K: Hashable + Copy>(&mut self, key: K) -> bool {
        if self.contains(key) {
            return true;
        }

        if self.filters.is_empty() {
            let filter = BloomFilter::new(
                self.initial_capacity,
                self.error_rate * (1.0 - self.ratio),
            )
            .expect("first generation parameters are always valid given a valid SBF");
            self.filters.push(filter);
        } else {
            let active = self.filters.last().expect("just checked non-empty");
            if active.len() >= active.capacity() {
                let next = BloomFilter::new(
                    active.capacity() * self.scale.factor(),
                    active.error_rate() * self.ratio,
                )
                .expect("derived generation parameters are always valid");
                self.filters.push(next);
            }
        }

        let active = self.filters.last_mut().expect("a generation always exists here");
        // Step 1 already established the key is absent from every generation,
        // so the active generation's own membership check would be redundant.
        active
            .add(key, true)
            .expect("active generation is never saturated: we grow before it would be");
        false
    }

    /// Total capacity summed over every generation.
    pub fn capacity(&self) -> u64 {
        self.filters.iter().map(BloomFilter::capacity).sum()
    }

    /// Total number of distinct elements added across every generation.
    pub fn len(&self) -> u64 {
        self.filters.iter().map(BloomFilter::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The overall target false positive rate this SBF was configured with.
    pub fn error_rate(&self) -> f64 {
        self.error_rate
    }

    pub fn mode(&self) -> GrowthMode {
        self.scale
    }

    /// Number of generations allocated so far.
    pub fn generation_count(&self) -> usize {
        self.filters.len()
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serializes this filter: a fixed header, a per-generation byte-length
    /// table, then each generation serialized as in
    /// [`BloomFilter::to_bytes`].
    pub fn to_bytes(&self) -> Vec<u8> {
        let encoded: Vec<Vec<u8>> = self.filters.iter().map(BloomFilter::to_bytes).collect();
        let payload_len: usize = encoded.iter().map(Vec::len).sum();

        let mut w = Writer::with_capacity(28 + 8 * encoded.len() + payload_len);
        w.write_i32_le(self.scale as i32);
        w.write_f64_le(self.ratio);
        w.write_u64_le(self.initial_capacity);
        w.write_f64_le(self.error_rate);
        w.write_i32_le(encoded.len() as i32);
        for f in &encoded {
            w.write_u64_le(f.len() as u64);
        }
        for f in &encoded {
            w.write(f);
        }
        w.into_bytes()
    }

    /// Deserializes a filter from its compact binary form.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::MalformedDeserializeData`](crate::error::ErrorKind::MalformedDeserializeData)
    /// if the stream is truncated, `nfilters` is negative, `scale` isn't `2`
    /// or `4`, or any embedded `BloomFilter` fails to deserialize.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let mut r = Reader::new(bytes);

        let scale_raw = r
            .read_i32_le()
            .map_err(|_| Error::insufficient_data("scale"))?;
        let scale = GrowthMode::from_raw(scale_raw)?;
        let ratio = r
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("ratio"))?;
        let initial_capacity = r
            .read_u64_le()
            .map_err(|_| Error::insufficient_data("initial_capacity"))?;
        let error_rate = r
            .read_f64_le()
            .map_err(|_| Error::insufficient_data("error_rate"))?;
        let nfilters = r
            .read_i32_le()
            .map_err(|_| Error::insufficient_data("nfilters"))?;
        if nfilters < 0 {
            return Err(Error::deserial(format!(
                "nfilters must be non-negative, got {nfilters}"
            )));
        }
        let nfilters = nfilters as usize;

        let mut lengths = Vec::with_capacity(nfilters);
        for _ in 0..nfilters {
            lengths.push(
                r.read_u64_le()
                    .map_err(|_| Error::insufficient_data("filter_length"))?,
            );
        }

        let mut filters = Vec::with_capacity(nfilters);
        for len in lengths {
            let raw = r
                .read_n(len as usize)
                .map_err(|_| Error::insufficient_data("filter_bytes"))?;
            filters.push(BloomFilter::from_bytes(&raw)?);
        }

        Ok(ScalableBloomFilter {
            scale,
            ratio,
            initial_capacity,
            error_rate,
            filters,
        })
    }

    /// Writes this filter to `sink`.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`](crate::error::ErrorKind::Io) if the
    /// underlying writer fails.
    pub fn tofile<W: io::Write>(&self, sink: &mut W) -> Result<(), Error> {
        sink.write_all(&self.to_bytes()).map_err(Error::io)
    }

    /// Reads a filter from `source`, as serialized by [`tofile`](Self::tofile).
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Io`](crate::error::ErrorKind::Io) on a stream
    /// failure, or [`ErrorKind::MalformedDeserializeData`](crate::error::ErrorKind::MalformedDeserializeData)
    /// on a malformed stream.
    pub fn fromfile<R: io::Read>(source: &mut R) -> Result<Self, Error> {
        let mut buf = Vec::new();
        source.read_to_end(&mut buf).map_err(Error::io)?;
        Self::from_bytes(&buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_construction() {
        assert_eq!(
            ScalableBloomFilter::new(0, 0.001, GrowthMode::Small)
                .unwrap_err()
                .kind(),
            crate::error::ErrorKind::InvalidArgument
        );
        assert_eq!(
            ScalableBloomFilter::new(100, 0.0, GrowthMode::Small)
                .unwrap_err()
                .kind(),
            crate::error::ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn add_then_contains() {
        let mut sbf = ScalableBloomFilter::new(100, 0.001, GrowthMode::Small).unwrap();
        assert!(!sbf.add("hello"));
        assert!(sbf.contains("hello"));
        assert!(sbf.add("hello"));
    }

    #[test]
    fn grows_past_initial_capacity() {
        let mut sbf = ScalableBloomFilter::new(10, 0.01, GrowthMode::Small).unwrap();
        for i in 0..1000u64 {
            sbf.add(i);
        }
        assert_eq!(sbf.len(), 1000);
        assert!(sbf.generation_count() > 1);
        for i in 0..1000u64 {
            assert!(sbf.contains(i));
        }
    }

    #[test]
    fn len_is_exact_distinct_count() {
        let mut sbf = ScalableBloomFilter::new(100, 0.001, GrowthMode::Small).unwrap();
        for i in 0..500u64 {
            sbf.add(i);
        }
        // Re-adding shouldn't change len.
        for i in 0..500u64 {
            sbf.add(i);
        }
        assert_eq!(sbf.len(), 500);
    }

    #[test]
    fn round_trips_through_bytes() {
        let mut sbf = ScalableBloomFilter::new(50, 0.01, GrowthMode::Large).unwrap();
        for i in 0..300u64 {
            sbf.add(i);
        }

        let bytes = sbf.to_bytes();
        let restored = ScalableBloomFilter::from_bytes(&bytes).unwrap();

        assert_eq!(restored.len(), sbf.len());
        assert_eq!(restored.generation_count(), sbf.generation_count());
        for i in 0..300u64 {
            assert!(restored.contains(i));
        }
    }

    #[test]
    fn round_trips_through_tofile_fromfile() {
        let mut sbf = ScalableBloomFilter::new(50, 0.01, GrowthMode::Small).unwrap();
        for i in 0..200u64 {
            sbf.add(i);
        }

        let mut buf = Vec::new();
        sbf.tofile(&mut buf).unwrap();

        let mut cursor = std::io::Cursor::new(buf);
        let restored = ScalableBloomFilter::fromfile(&mut cursor).unwrap();
        for i in 0..200u64 {
            assert!(restored.contains(i));
        }
    }

    #[test]
    fn from_bytes_rejects_invalid_scale() {
        let sbf = ScalableBloomFilter::new(50, 0.01, GrowthMode::Small).unwrap();
        let mut bytes = sbf.to_bytes();
        bytes[0] = 3; // scale must be 2 or 4
        let err = ScalableBloomFilter::from_bytes(&bytes).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::MalformedDeserializeData);
    }
}
