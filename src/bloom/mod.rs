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

//! Fixed-capacity and scalable Bloom filters for probabilistic set membership
//! testing.
//!
//! A [`BloomFilter`] is sized once at construction and rejects further
//! inserts past its configured `capacity`. A [`ScalableBloomFilter`] wraps an
//! ordered sequence of `BloomFilter` generations of geometrically increasing
//! capacity, appending a new generation whenever the active one saturates,
//! so it can absorb an unbounded number of inserts while holding its overall
//! target false positive rate.
//!
//! # Examples
//!
//! ```rust
//! use bloomfilter_rs::bloom::BloomFilter;
//! use bloomfilter_rs::bloom::GrowthMode;
//! use bloomfilter_rs::bloom::ScalableBloomFilter;
//!
//! let mut filter = BloomFilter::new(10_000, 0.001).unwrap();
//! filter.add("test", false).unwrap();
//! assert!(filter.contains("test"));
//!
//! let mut sbf = ScalableBloomFilter::new(100, 0.001, GrowthMode::Small).unwrap();
//! for i in 0..10_000u64 {
//!     sbf.add(i);
//! }
//! assert!(sbf.capacity() > 10_000);
//! ```

mod filter;
mod scalable;

pub use self::filter::BloomFilter;
pub use self::scalable::GrowthMode;
pub use self::scalable::ScalableBloomFilter;
