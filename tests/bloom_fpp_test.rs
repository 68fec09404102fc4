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

//! False-positive-rate bounds and core membership behavior of `BloomFilter`.

use bloomfilter_rs::bloom::BloomFilter;
use googletest::assert_that;
use googletest::prelude::le;

#[test]
fn duplicate_add_returns_true_without_incrementing_count() {
    let mut f = BloomFilter::new(100, 0.001).unwrap();
    assert!(!f.add("test", false).unwrap());
    assert!(f.contains("test"));
    assert!(f.add("test", false).unwrap());
    assert_eq!(f.len(), 1);
}

#[test]
fn no_false_negatives_and_fpp_bound() {
    let capacity = 100_000u64;
    let error_rate = 0.001;
    let mut f = BloomFilter::new(capacity, error_rate).unwrap();

    for i in 0..capacity {
        f.add(i, false).unwrap();
    }
    for i in 0..capacity {
        assert!(f.contains(i), "no false negatives: {i} must be contained");
    }

    let mut false_positives = 0u64;
    let query_count = capacity;
    for i in capacity..(capacity + query_count) {
        if f.contains(i) {
            false_positives += 1;
        }
    }
    let empirical_rate = false_positives as f64 / query_count as f64;
    // Empirical FP rate over a disjoint query set should stay close to the
    // configured error_rate (0.001), with some slack for sampling noise.
    assert_that!(empirical_rate, le(0.0015));
}

#[test]
fn monotonicity_bits_stay_set_across_further_inserts() {
    let mut f = BloomFilter::new(1000, 0.01).unwrap();
    f.add("alpha", false).unwrap();
    assert!(f.contains("alpha"));

    for i in 0..500u64 {
        f.add(i, false).unwrap();
    }
    assert!(f.contains("alpha"));
}

#[test]
fn union_contains_both_sides() {
    let mut a = BloomFilter::new(100, 0.001).unwrap();
    let mut b = BloomFilter::new(100, 0.001).unwrap();

    for c in 'a'..='m' {
        a.add(c.to_string().as_str(), false).unwrap();
    }
    for c in 'n'..='z' {
        b.add(c.to_string().as_str(), false).unwrap();
    }

    let u = a.union(&b).unwrap();
    for c in 'a'..='z' {
        assert!(u.contains(c.to_string().as_str()));
    }
}

#[test]
fn intersection_keeps_common_and_excludes_disjoint() {
    let mut a = BloomFilter::new(100, 0.001).unwrap();
    let mut b = BloomFilter::new(100, 0.001).unwrap();

    for c in 'a'..='z' {
        a.add(c.to_string().as_str(), false).unwrap();
    }
    for c in 'a'..='m' {
        b.add(c.to_string().as_str(), false).unwrap();
    }

    let i = a.intersection(&b).unwrap();
    for c in 'a'..='m' {
        assert!(i.contains(c.to_string().as_str()));
    }
    // n..z were never added to B, so the intersection should overwhelmingly
    // exclude them (both filters are far from capacity here).
    let mut unexpected = 0;
    for c in 'n'..='z' {
        if i.contains(c.to_string().as_str()) {
            unexpected += 1;
        }
    }
    assert_eq!(unexpected, 0);
}
