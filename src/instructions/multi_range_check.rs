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

//! Multi-value range-check instructions interface.
//!
//! Bounds two or three 88-bit limbs with a single two-gate block: two
//! `range_check0` rows whose highest sublimb lookups are deferred, closed
//! by one `range_check1` call that fully decomposes the third value and
//! carries the deferred lookups. The compact variant additionally ties a
//! packed limb pair `xy = x + 2^88 * y` to its split through the
//! combined-product wire.

use ff::PrimeField;
use num_bigint::BigUint;
use num_traits::Zero;

use crate::{
    error::Error,
    instructions::{
        core_gates::{
            RANGE_CHECK1_FIRST_ROW, RANGE_CHECK1_SECOND_ROW_HEAD, RANGE_CHECK1_SECOND_ROW_TAIL,
        },
        range_check::{assign_crumbs, assign_sublimbs},
        CoreGateInstructions, RangeCheckInstructions,
    },
    types::{AssignedNative, NativeValue, Value},
    utils::util::{big_to_fe, bit_slice, fe_bit_slice, fe_to_big},
};

/// Default bigint limb size, in bits. Values checked by the multi-value
/// gadgets are bounded below `2^LIMB_BITS`.
pub const LIMB_BITS: usize = 88;

/// Splits a compactly packed limb pair into `(low, high)` with
/// `xy = low + 2^88 * high`.
pub(crate) fn split_compact_limb(xy: &BigUint) -> (BigUint, BigUint) {
    (bit_slice(xy, 0, LIMB_BITS), xy >> LIMB_BITS)
}

/// Runs the `range_check0` half of an 88-bit decomposition on `v`: eight
/// crumbs and six sublimbs in one gate call.
///
/// Returns the two highest sublimbs `(v64, v76)`, whose 12-bit lookups are
/// deferred to the `range_check1` row that closes the block.
pub(crate) fn range_check0_pass<F, B>(
    backend: &mut B,
    v: &AssignedNative<F>,
    compact: bool,
) -> Result<(AssignedNative<F>, AssignedNative<F>), Error>
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
    let wire: NativeValue<F> = (*v).into();
    let crumbs = assign_crumbs(backend, &wire)?;
    let sublimbs = assign_sublimbs(backend, &wire, 6)?;

    let high_sublimbs: [NativeValue<F>; 6] = core::array::from_fn(|i| sublimbs[5 - i].into());
    let crumb_wires: [NativeValue<F>; 8] = core::array::from_fn(|i| crumbs[7 - i].into());
    backend.range_check0(&wire, &high_sublimbs, &crumb_wires, compact)?;

    Ok((sublimbs[4], sublimbs[5]))
}

/// Issues the `range_check1` call closing an 88-bit block: fully decomposes
/// `z` across two rows and carries the four borrowed sublimbs
/// `[x76, x64, y76, y64]` plus the combined-product wire.
pub(crate) fn range_check1_pass<F, B>(
    backend: &mut B,
    z: &AssignedNative<F>,
    combined: &NativeValue<F>,
    x64: &AssignedNative<F>,
    x76: &AssignedNative<F>,
    y64: &AssignedNative<F>,
    y76: &AssignedNative<F>,
) -> Result<(), Error>
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
    let first_values: Vec<Value<F>> = RANGE_CHECK1_FIRST_ROW
        .iter()
        .map(|&(offset, width)| z.value().map(move |v| fe_bit_slice(v, offset, width)))
        .collect();
    let first = backend.assign_many(&first_values)?;

    let head_values: Vec<Value<F>> = RANGE_CHECK1_SECOND_ROW_HEAD
        .iter()
        .map(|&(offset, width)| z.value().map(move |v| fe_bit_slice(v, offset, width)))
        .collect();
    let head = backend.assign_many(&head_values)?;

    let tail_values: Vec<Value<F>> = RANGE_CHECK1_SECOND_ROW_TAIL
        .iter()
        .map(|&(offset, width)| z.value().map(move |v| fe_bit_slice(v, offset, width)))
        .collect();
    let tail = backend.assign_many(&tail_values)?;

    let first_row: [NativeValue<F>; 13] = core::array::from_fn(|i| first[i].into());
    let second_row: [NativeValue<F>; 15] = [
        head[0].into(),
        head[1].into(),
        head[2].into(),
        (*x76).into(),
        (*x64).into(),
        (*y76).into(),
        (*y64).into(),
        tail[0].into(),
        tail[1].into(),
        tail[2].into(),
        tail[3].into(),
        tail[4].into(),
        tail[5].into(),
        tail[6].into(),
        tail[7].into(),
    ];

    backend.range_check1(&(*z).into(), combined, &first_row, &second_row)
}

/// The set of circuit instructions for multi-value range checks.
pub trait MultiRangeCheckInstructions<F>: RangeCheckInstructions<F> + Sized
where
    F: PrimeField,
{
    /// Asserts that `x`, `y` and `z` are all in the range
    /// `[0, 2^{88})`.
    ///
    /// When all three inputs are constants the bounds are checked
    /// directly. Otherwise all three are canonicalized to assigned values
    /// and bound together in one two-gate block.
    fn multi_range_check(&mut self, values: &[NativeValue<F>; 3]) -> Result<(), Error> {
        let [x, y, z] = *values;

        if let (Some(a), Some(b), Some(c)) =
            (x.as_constant(), y.as_constant(), z.as_constant())
        {
            for value in [fe_to_big(a), fe_to_big(b), fe_to_big(c)] {
                if !(&value >> LIMB_BITS).is_zero() {
                    return Err(Error::OutOfRange {
                        gadget: "multi_range_check",
                        bits: LIMB_BITS,
                        value,
                    });
                }
            }
            return Ok(());
        }

        let x = x.to_assigned(self)?;
        let y = y.to_assigned(self)?;
        let z = z.to_assigned(self)?;
        let zero = self.assign_fixed(F::ZERO)?;

        let (x64, x76) = range_check0_pass(self, &x, false)?;
        let (y64, y76) = range_check0_pass(self, &y, false)?;
        range_check1_pass(self, &z, &zero.into(), &x64, &x76, &y64, &y76)
    }

    /// Compact multi-range check: given `xy` packing two 88-bit limbs as
    /// `x + 2^88 * y`, and a third value `z`, asserts that
    /// `x, y, z` are all in `[0, 2^88)` and returns `[x, y, z]`.
    ///
    /// The assigned path witnesses the `(x, y)` split unconstrained,
    /// decomposes `z` and `x` with two `range_check0` rows (the latter in
    /// compact mode) and closes the block with a `range_check1` call that
    /// decomposes `y` and carries `xy` on the combined-product wire. That
    /// single extra wire forces `xy = x + 2^88 * y` algebraically, with no
    /// separate equality assertion.
    fn compact_multi_range_check(
        &mut self,
        xy: &NativeValue<F>,
        z: &NativeValue<F>,
    ) -> Result<[NativeValue<F>; 3], Error> {
        if let (Some(xy_c), Some(z_c)) = (xy.as_constant(), z.as_constant()) {
            let xy_big = fe_to_big(xy_c);
            if !(&xy_big >> (2 * LIMB_BITS)).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "compact_multi_range_check",
                    bits: 2 * LIMB_BITS,
                    value: xy_big,
                });
            }
            let z_big = fe_to_big(z_c);
            if !(&z_big >> LIMB_BITS).is_zero() {
                return Err(Error::OutOfRange {
                    gadget: "compact_multi_range_check",
                    bits: LIMB_BITS,
                    value: z_big,
                });
            }
            let (low, high) = split_compact_limb(&xy_big);
            return Ok([
                NativeValue::Constant(big_to_fe(low)),
                NativeValue::Constant(big_to_fe(high)),
                NativeValue::Constant(z_c),
            ]);
        }

        let xy = xy.to_assigned(self)?;
        let z = z.to_assigned(self)?;

        let x = self
            .assign(xy.value().map(|v| big_to_fe(bit_slice(&fe_to_big(v), 0, LIMB_BITS))))?;
        let y = self
            .assign(xy.value().map(|v| big_to_fe(fe_to_big(v) >> LIMB_BITS)))?;

        let (z64, z76) = range_check0_pass(self, &z, false)?;
        let (x64, x76) = range_check0_pass(self, &x, true)?;
        range_check1_pass(self, &y, &xy.into(), &z64, &z76, &x64, &x76)?;

        Ok([x.into(), y.into(), z.into()])
    }
}

impl<F, B> MultiRangeCheckInstructions<F> for B
where
    F: PrimeField,
    B: RangeCheckInstructions<F>,
{
}

#[cfg(test)]
mod tests {
    use ff::Field;
    use num_bigint::BigUint;
    use num_traits::One;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::utils::mock_backend::MockBackend;

    type F = halo2curves::bn256::Fr;

    fn random_limb(rng: &mut ChaCha8Rng) -> BigUint {
        let mut bytes = [0u8; 11];
        rng.fill_bytes(&mut bytes);
        BigUint::from_bytes_le(&bytes)
    }

    fn assigned(backend: &mut MockBackend<F>, value: &BigUint) -> NativeValue<F> {
        backend
            .assign(Value::known(big_to_fe(value.clone())))
            .unwrap()
            .into()
    }

    #[test]
    fn constants_at_the_boundary() {
        let limb_max = (BigUint::one() << LIMB_BITS) - 1u8;
        let mut backend = MockBackend::<F>::new();

        let ok: [NativeValue<F>; 3] = [
            NativeValue::Constant(big_to_fe(limb_max.clone())),
            NativeValue::Constant(F::ZERO),
            NativeValue::Constant(big_to_fe(limb_max)),
        ];
        backend.multi_range_check(&ok).unwrap();

        // The first value sits exactly at the forbidden boundary.
        let bad: [NativeValue<F>; 3] = [
            NativeValue::Constant(big_to_fe::<F>(BigUint::one() << LIMB_BITS)),
            NativeValue::Constant(F::ZERO),
            NativeValue::Constant(F::ZERO),
        ];
        let err = backend.multi_range_check(&bad).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { bits: 88, .. }));
        assert_eq!(backend.num_gates(), 0);
    }

    #[test]
    fn assigned_values_within_bounds_are_satisfied() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x88);
        for _ in 0..5 {
            let mut backend = MockBackend::<F>::new();
            let values: [NativeValue<F>; 3] = [
                assigned(&mut backend, &random_limb(&mut rng)),
                assigned(&mut backend, &random_limb(&mut rng)),
                assigned(&mut backend, &random_limb(&mut rng)),
            ];
            backend.multi_range_check(&values).unwrap();
            backend.assert_satisfied();
        }
    }

    #[test]
    fn mixed_constant_and_assigned_is_bound_in_circuit() {
        // A constant out of range does not error on the mixed path; it is
        // canonicalized and caught by the constraints instead.
        let mut backend = MockBackend::<F>::new();
        let values: [NativeValue<F>; 3] = [
            NativeValue::Constant(big_to_fe::<F>(BigUint::one() << LIMB_BITS)),
            assigned(&mut backend, &BigUint::from(5u8)),
            assigned(&mut backend, &BigUint::from(7u8)),
        ];
        backend.multi_range_check(&values).unwrap();
        assert!(backend.verify().is_err());
    }

    #[test]
    fn rejects_out_of_range_witness_in_each_position() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x89);
        for bad_position in 0..3 {
            let mut backend = MockBackend::<F>::new();
            let mut limbs = [
                random_limb(&mut rng),
                random_limb(&mut rng),
                random_limb(&mut rng),
            ];
            limbs[bad_position] = BigUint::one() << LIMB_BITS;
            let values: [NativeValue<F>; 3] = [
                assigned(&mut backend, &limbs[0]),
                assigned(&mut backend, &limbs[1]),
                assigned(&mut backend, &limbs[2]),
            ];
            backend.multi_range_check(&values).unwrap();
            assert!(backend.verify().is_err(), "position {bad_position}");
        }
    }

    #[test]
    fn compact_split_on_both_paths() {
        let mut rng = ChaCha8Rng::seed_from_u64(0x8a);
        for _ in 0..5 {
            let x = random_limb(&mut rng);
            let y = random_limb(&mut rng);
            let z = random_limb(&mut rng);
            let xy = &x + (&y << LIMB_BITS);

            // Constant path.
            let mut backend = MockBackend::<F>::new();
            let [cx, cy, cz] = backend
                .compact_multi_range_check(
                    &NativeValue::Constant(big_to_fe(xy.clone())),
                    &NativeValue::Constant(big_to_fe(z.clone())),
                )
                .unwrap();
            assert_eq!(cx.as_constant(), Some(big_to_fe(x.clone())));
            assert_eq!(cy.as_constant(), Some(big_to_fe(y.clone())));
            assert_eq!(cz.as_constant(), Some(big_to_fe(z.clone())));
            assert_eq!(backend.num_gates(), 0);

            // Assigned path agrees.
            let xy_wire = assigned(&mut backend, &xy);
            let z_wire = assigned(&mut backend, &z);
            let [ax, ay, az] = backend
                .compact_multi_range_check(&xy_wire, &z_wire)
                .unwrap();
            assert_eq!(ax.value().into_option(), Some(big_to_fe(x.clone())));
            assert_eq!(ay.value().into_option(), Some(big_to_fe(y.clone())));
            assert_eq!(az.value().into_option(), Some(big_to_fe(z.clone())));
            backend.assert_satisfied();
        }
    }

    #[test]
    fn compact_constant_rejections() {
        let mut backend = MockBackend::<F>::new();
        let err = backend
            .compact_multi_range_check(
                &NativeValue::Constant(big_to_fe::<F>(BigUint::one() << (2 * LIMB_BITS))),
                &NativeValue::Constant(F::ZERO),
            )
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { bits: 176, .. }));

        let err = backend
            .compact_multi_range_check(
                &NativeValue::Constant(F::ZERO),
                &NativeValue::Constant(big_to_fe::<F>(BigUint::one() << LIMB_BITS)),
            )
            .unwrap_err();
        assert!(matches!(err, Error::OutOfRange { bits: 88, .. }));
        assert_eq!(backend.num_gates(), 0);
    }

    #[test]
    fn compact_rejects_oversized_pack() {
        // A packed value at 2^176 splits into y = 2^88, which cannot pass
        // the in-circuit decomposition.
        let mut backend = MockBackend::<F>::new();
        let xy = assigned(&mut backend, &(BigUint::one() << (2 * LIMB_BITS)));
        let z = assigned(&mut backend, &BigUint::from(3u8));
        backend.compact_multi_range_check(&xy, &z).unwrap();
        assert!(backend.verify().is_err());
    }

    #[test]
    fn compact_rejects_oversized_z() {
        let mut backend = MockBackend::<F>::new();
        let xy = assigned(&mut backend, &BigUint::from(1u8));
        let z = assigned(&mut backend, &(BigUint::one() << LIMB_BITS));
        backend.compact_multi_range_check(&xy, &z).unwrap();
        assert!(backend.verify().is_err());
    }
}
