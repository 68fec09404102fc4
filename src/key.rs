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

//! The keys-to-bytes contract for anything insertable into a filter.
//!
//! [`Hashable`] is a capability trait producing canonical bytes: built-in
//! impls cover strings/byte slices (direct bytes) and integer primitives
//! (decimal text). Callers with custom key types must implement `Hashable`
//! themselves and guarantee the bytes are stable across calls and hosts.

/// A value that can be hashed into a Bloom filter.
///
/// Implementors must produce the same bytes for equal logical values, every
/// time, on every host — the hash engine's determinism guarantee depends on
/// it.
pub trait Hashable {
    /// Returns the canonical byte encoding of this key.
    fn to_key_bytes(&self) -> Vec<u8>;
}

impl Hashable for str {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Hashable for String {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.as_bytes().to_vec()
    }
}

impl Hashable for [u8] {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.to_vec()
    }
}

impl Hashable for Vec<u8> {
    fn to_key_bytes(&self) -> Vec<u8> {
        self.clone()
    }
}

impl<T: Hashable + ?Sized> Hashable for &T {
    fn to_key_bytes(&self) -> Vec<u8> {
        (*self).to_key_bytes()
    }
}

macro_rules! impl_hashable_for_int {
    ($($t:ty),* $(,)?) => {
        $(
            impl Hashable for $t {
                fn to_key_bytes(&self) -> Vec<u8> {
                    self.to_string().into_bytes()
                }
            }
        )*
    };
}

impl_hashable_for_int!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);
