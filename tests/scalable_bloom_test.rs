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

//! Growth behavior and false-positive bounds for `ScalableBloomFilter`.

use bloomfilter_rs::bloom::GrowthMode;
use bloomfilter_rs::bloom::ScalableBloomFilter;
use googletest::assert_that;
use googletest::prelude::le;

#[test]
fn exact_distinct_count_and_contains_all_inserted() {
    let mut sbf = ScalableBloomFilter::new(100, 0.001, GrowthMode::Small).unwrap();
    for i in 0..10_000u64 {
        sbf.add(i);
    }

    // add() pre-checks containment, so len() is an exact distinct count.
    assert_eq!(sbf.len(), 10_000);
    for i in 0..10_000u64 {
        assert!(sbf.contains(i));
    }
}

#[test]
fn grows_across_many_generations_under_large_mode() {
    let mut sbf = ScalableBloomFilter::new(10, 0.01, GrowthMode::Large).unwrap();
    for i in 0..50_000u64 {
        sbf.add(i);
    }
    assert!(sbf.generation_count() > 2);
    assert_eq!(sbf.len(), 50_000);
}

#[test]
fn fpp_stays_within_overall_target_after_growth() {
    let error_rate = 0.01;
    let capacity = 1_000u64;
    let mut sbf = ScalableBloomFilter::new(100, error_rate, GrowthMode::Small).unwrap();

    for i in 0..capacity {
        sbf.add(i);
    }

    let mut false_positives = 0u64;
    let query_count = capacity;
    for i in capacity..(capacity + query_count) {
        if sbf.contains(i) {
            false_positives += 1;
        }
    }
    let empirical_rate = false_positives as f64 / query_count as f64;
    // Empirical FP rate should stay within a generous multiple of the
    // overall target; the multiple is loose here since query_count is modest.
    assert_that!(empirical_rate, le(error_rate * 3.0));
}

#[test]
fn duplicate_add_does_not_inflate_len() {
    let mut sbf = ScalableBloomFilter::new(50, 0.01, GrowthMode::Small).unwrap();
    assert!(!sbf.add("x"));
    assert!(sbf.add("x"));
    assert_eq!(sbf.len(), 1);
}
