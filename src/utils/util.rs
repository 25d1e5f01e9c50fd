// This file is part of MIDNIGHT-ZK.
// Copyright (C) 2025 Midnight Foundation
// SPDX-License-Identifier: Apache-2.0
// Licensed under the Apache License, Version 2.0 (the "License");
// You may not use this file except in compliance with the License.
// You may obtain a copy of the License at
// http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Host-side conversions between field elements and big integers, and the
//! bit-slicing primitive that limb witnesses are computed with.

use ff::PrimeField;
use num_bigint::BigUint;
use num_traits::{Num, One, Zero};

/// The modulus of `F` as a big integer.
pub fn modulus<F: PrimeField>() -> BigUint {
    BigUint::from_str_radix(&F::MODULUS[2..], 16).unwrap()
}

/// Converts a big integer into a field element, reducing modulo the field
/// modulus.
pub fn big_to_fe<F: PrimeField>(e: BigUint) -> F {
    let modulus = modulus::<F>();
    let e = e % modulus;
    F::from_str_vartime(&e.to_str_radix(10)[..]).unwrap()
}

/// Converts a field element into its canonical integer representation.
pub fn fe_to_big<F: PrimeField>(fe: F) -> BigUint {
    BigUint::from_bytes_le(fe.to_repr().as_ref())
}

/// Extracts bits `[start, start + len)` of `x`, i.e. `(x >> start) mod 2^len`.
///
/// Pure and total: bits beyond the width of `x` are zero.
pub fn bit_slice(x: &BigUint, start: usize, len: usize) -> BigUint {
    (x >> start) % (BigUint::one() << len)
}

/// [`bit_slice`] lifted to field elements, via the canonical representation.
pub(crate) fn fe_bit_slice<F: PrimeField>(fe: F, start: usize, len: usize) -> F {
    big_to_fe(bit_slice(&fe_to_big(fe), start, len))
}

/// `2^n` as a field element.
pub(crate) fn pow2<F: PrimeField>(n: usize) -> F {
    big_to_fe(BigUint::one() << n)
}
