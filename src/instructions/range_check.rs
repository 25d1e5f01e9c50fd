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

//! Range-check instructions interface.
//!
//! Single-value range checks. The 16-bit truncation primitive is the native
//! granularity: widths that are a multiple of 16 are checked by truncating
//! and asserting equality, widths below a 16/64 boundary are checked by
//! scaling to the boundary first, and the 64-bit width has a dedicated
//! single-gate decomposition into crumbs and sublimbs.

use ff::PrimeField;
use num_traits::Zero;

use crate::{
    error::Error,
    instructions::{
        core_gates::{CRUMB_BITS, SUBLIMB_BITS},
        ArithInstructions, CoreGateInstructions,
    },
    types::{AssignedNative, NativeValue, Value},
    utils::util::{big_to_fe, bit_slice, fe_bit_slice, fe_to_big, pow2},
};

/// Panics unless `n` is a positive multiple of 16 that fits the field.
/// Misuse of a width is a programmer error, identical on both value paths.
fn validate_width<F: PrimeField>(n: usize, gadget: &'static str) {
    assert!(n > 0, "{gadget}: bit length must be positive, got {n}");
    assert!(
        n % 16 == 0,
        "{gadget}: bit length must be a multiple of 16, got {n}"
    );
    assert!(
        n as u32 <= F::NUM_BITS,
        "{gadget}: bit length must be at most {}, got {n}",
        F::NUM_BITS
    );
}

/// Checks that `x` fits in `n` bits, for `n` a multiple of 16.
///
/// Constants are compared directly. Assigned values are bound by truncating
/// to the low `n` bits and asserting equality with the original: a witness
/// outside the range cannot satisfy the equation, since the truncation
/// output is constrained below `2^n`.
pub(crate) fn assert_fits_via_truncation<F, B>(
    backend: &mut B,
    x: &NativeValue<F>,
    n: usize,
    gadget: &'static str,
) -> Result<(), Error>
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
    debug_assert!(n > 0 && n % 16 == 0);

    if let Some(c) = x.as_constant() {
        let value = fe_to_big(c);
        if !(&value >> n).is_zero() {
            return Err(Error::OutOfRange {
                gadget,
                bits: n,
                value,
            });
        }
        return Ok(());
    }

    let truncated = backend.truncate_to_bits16(n / 16, x)?;
    backend.assert_equal(x, &truncated.into())
}

/// Witnesses the eight 2-bit crumbs of `x` (bits 0 to 16), lowest first.
pub(crate) fn assign_crumbs<F, B>(
    backend: &mut B,
    x: &NativeValue<F>,
) -> Result<Vec<AssignedNative<F>>, Error>
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
    let values: Vec<Value<F>> = (0..8)
        .map(|i| x.value().map(move |v| fe_bit_slice(v, CRUMB_BITS * i, CRUMB_BITS)))
        .collect();
    backend.assign_many(&values)
}

/// Witnesses `count` 12-bit sublimbs of `x` starting at bit 16, lowest
/// first.
pub(crate) fn assign_sublimbs<F, B>(
    backend: &mut B,
    x: &NativeValue<F>,
    count: usize,
) -> Result<Vec<AssignedNative<F>>, Error>
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
    let values: Vec<Value<F>> = (0..count)
        .map(|i| {
            x.value()
                .map(move |v| fe_bit_slice(v, 16 + SUBLIMB_BITS * i, SUBLIMB_BITS))
        })
        .collect();
    backend.assign_many(&values)
}

/// The set of circuit instructions for single-value range checks.
pub trait RangeCheckInstructions<F>: ArithInstructions<F> + Sized
where
    F: PrimeField,
{
    /// Asserts that `x` is in the range `[0, 2^n)`.
    ///
    /// # Panics
    ///
    /// If `n` is not a positive multiple of 16 at most `F::NUM_BITS`.
    fn range_check_n(&mut self, x: &NativeValue<F>, n: usize) -> Result<(), Error> {
        validate_width::<F>(n, "range_check_n");
        assert_fits_via_truncation(self, x, n, "range_check_n")
    }

    /// Asserts that `x` is in the range `[0, 2^16)`.
    fn range_check16(&mut self, x: &NativeValue<F>) -> Result<(), Error> {
        assert_fits_via_truncation(self, x, 16, "range_check16")
    }

    /// Asserts that `x` is in the range `[0, 2^8)`.
    ///
    /// The truncation primitive works at 16-bit granularity, so the top
    /// byte is bounded with a second check on `x * 2^8`.
    fn range_check8(&mut self, x: &NativeValue<F>) -> Result<(), Error> {
        if let Some(c) = x.as_constant() {
            let value = fe_to_big(c);
            if !(&value >> 8usize).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "range_check8",
                    bits: 8,
                    value,
                });
            }
            return Ok(());
        }

        assert_fits_via_truncation(self, x, 16, "range_check8")?;
        let shifted = self.mul_by_constant(pow2::<F>(8), x)?;
        assert_fits_via_truncation(self, &shifted, 16, "range_check8")
    }

    /// Asserts that `x` is in the range `[0, 2^32)`.
    fn range_check32(&mut self, x: &NativeValue<F>) -> Result<(), Error> {
        assert_fits_via_truncation(self, x, 32, "range_check32")
    }

    /// Asserts that `x` is in the range `[0, 2^64)`.
    ///
    /// The assigned path decomposes `x` into eight crumbs (bits 0 to 16)
    /// and four 12-bit sublimbs (bits 16 to 64) bound by a single
    /// [`range_check0`](CoreGateInstructions::range_check0) call, with the
    /// two sublimb wires above bit 64 fixed to zero.
    ///
    /// Returns the four sublimbs highest first, `[x52, x40, x28, x16]`, for
    /// callers that reuse the decomposition. The constant path returns the
    /// same slices for consistency.
    fn range_check64(&mut self, x: &NativeValue<F>) -> Result<[NativeValue<F>; 4], Error> {
        if let Some(c) = x.as_constant() {
            let value = fe_to_big(c);
            if !(&value >> 64usize).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "range_check64",
                    bits: 64,
                    value,
                });
            }
            return Ok([52, 40, 28, 16].map(|offset| {
                NativeValue::Constant(big_to_fe(bit_slice(&value, offset, SUBLIMB_BITS)))
            }));
        }

        let crumbs = assign_crumbs(self, x)?;
        let sublimbs = assign_sublimbs(self, x, 4)?;

        let zero = NativeValue::Constant(F::ZERO);
        let high_sublimbs: [NativeValue<F>; 6] = [
            zero,
            zero,
            sublimbs[3].into(),
            sublimbs[2].into(),
            sublimbs[1].into(),
            sublimbs[0].into(),
        ];
        let crumb_wires: [NativeValue<F>; 8] = core::array::from_fn(|i| crumbs[7 - i].into());
        self.range_check0(x, &high_sublimbs, &crumb_wires, false)?;

        Ok([
            sublimbs[3].into(),
            sublimbs[2].into(),
            sublimbs[1].into(),
            sublimbs[0].into(),
        ])
    }

    /// Asserts that `x` is in the range `[0, 2^bits)` for `bits < 16`.
    ///
    /// `x < 2^bits` iff `x * 2^(16 - bits) < 2^16`, so both `x` and the
    /// scaled value are bounded to 16 bits.
    ///
    /// # Panics
    ///
    /// If `bits >= 16`.
    fn range_check_lower_than_16(
        &mut self,
        x: &NativeValue<F>,
        bits: usize,
    ) -> Result<(), Error> {
        assert!(
            bits < 16,
            "range_check_lower_than_16: bits must be less than 16, got {bits}"
        );

        if let Some(c) = x.as_constant() {
            let value = fe_to_big(c);
            if !(&value >> bits).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "range_check_lower_than_16",
                    bits,
                    value,
                });
            }
            return Ok(());
        }

        assert_fits_via_truncation(self, x, 16, "range_check_lower_than_16")?;
        let scaled = self.mul_by_constant(pow2::<F>(16 - bits), x)?;
        assert_fits_via_truncation(self, &scaled, 16, "range_check_lower_than_16")
    }

    /// Asserts that `x` is in the range `[0, 2^bits)` for `bits < 64`,
    /// by scaling to the 64-bit boundary.
    ///
    /// # Panics
    ///
    /// If `bits >= 64`.
    fn range_check_lower_than_64(
        &mut self,
        x: &NativeValue<F>,
        bits: usize,
    ) -> Result<(), Error> {
        assert!(
            bits < 64,
            "range_check_lower_than_64: bits must be less than 64, got {bits}"
        );

        if let Some(c) = x.as_constant() {
            let value = fe_to_big(c);
            if !(&value >> bits).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "range_check_lower_than_64",
                    bits,
                    value,
                });
            }
            return Ok(());
        }

        self.range_check64(x)?;
        let scaled = self.mul_by_constant(pow2::<F>(64 - bits), x)?;
        self.range_check64(&scaled)?;
        Ok(())
    }

    /// Returns a boolean which, being `1`, proves that `x` is in
    /// `[0, 2^n)`.
    ///
    /// This is a one-sided check: the output being `0` does *not* prove
    /// that `x` is out of range, and the circuit stays satisfiable either
    /// way. It is a helper for gadgets that need a weakened range check,
    /// not a standalone proof of the negative.
    ///
    /// # Panics
    ///
    /// If `n` is not a positive multiple of 16 at most `F::NUM_BITS`.
    fn is_definitely_in_range(
        &mut self,
        x: &NativeValue<F>,
        n: usize,
    ) -> Result<NativeValue<F>, Error> {
        validate_width::<F>(n, "is_definitely_in_range");

        if let Some(c) = x.as_constant() {
            let fits = (fe_to_big(c) >> n).is_zero();
            return Ok(NativeValue::Constant(if fits { F::ONE } else { F::ZERO }));
        }

        let truncated = self.truncate_to_bits16(n / 16, x)?;
        self.is_equal(x, &truncated.into())
    }
}

impl<F, B> RangeCheckInstructions<F> for B
where
    F: PrimeField,
    B: ArithInstructions<F>,
{
}
