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

//! Integer division and modular addition instructions interface.
//!
//! Division by a power of two for bounded integers that fit in the native
//! field. The quotient and remainder are witnessed unconstrained, bounded
//! by the range checks, and tied to the dividend by one recomposition
//! equation; the individual bounds alone do not rule out a mismatched
//! pair, so the equation is what makes the gadget sound.

use ff::PrimeField;
use num_bigint::BigUint;
use num_integer::Integer;
use num_traits::{One, Zero};

use crate::{
    error::Error,
    instructions::RangeCheckInstructions,
    types::NativeValue,
    utils::util::{big_to_fe, fe_to_big, pow2},
};

/// Shared body of [`DivisionInstructions::div_mod_32`] and
/// [`DivisionInstructions::div_mod_64`], with `w` the bit width of the
/// power-of-two modulus.
fn div_mod_power_of_two<F, B>(
    backend: &mut B,
    n: &NativeValue<F>,
    n_bits: usize,
    w: usize,
) -> Result<(NativeValue<F>, NativeValue<F>), Error>
where
    F: PrimeField,
    B: RangeCheckInstructions<F>,
{
    debug_assert!(w == 32 || w == 64);
    let gadget = if w == 32 { "div_mod_32" } else { "div_mod_64" };
    assert!(
        (n_bits as u32) < F::NUM_BITS,
        "{gadget}: n_bits must be lower than {}, got {n_bits}",
        F::NUM_BITS
    );
    let quotient_bits = n_bits.saturating_sub(w);

    if let Some(c) = n.as_constant() {
        let value = fe_to_big(c);
        if !(&value >> n_bits).is_zero() {
            return Err(Error::OutOfRange {
                gadget,
                bits: n_bits,
                value,
            });
        }
        let (q, r) = value.div_rem(&(BigUint::one() << w));
        return Ok((
            NativeValue::Constant(big_to_fe(q)),
            NativeValue::Constant(big_to_fe(r)),
        ));
    }

    let (q_value, r_value) = n
        .value()
        .map(|v| {
            let (q, r) = fe_to_big(v).div_rem(&(BigUint::one() << w));
            (big_to_fe::<F>(q), big_to_fe::<F>(r))
        })
        .unzip();
    let quotient = backend.assign(q_value)?;
    let remainder = backend.assign(r_value)?;

    match quotient_bits {
        1 => backend.assert_boolean(&quotient.into())?,
        64 => {
            backend.range_check64(&quotient.into())?;
        }
        bits => backend.range_check_n(&quotient.into(), bits)?,
    }
    if w == 32 {
        backend.range_check32(&remainder.into())?;
    } else {
        backend.range_check64(&remainder.into())?;
    }

    // The recomposition equation ties the pair to the dividend.
    let recomposed = backend.linear_combination(
        &[(pow2::<F>(w), quotient.into()), (F::ONE, remainder.into())],
        F::ZERO,
    )?;
    backend.assert_equal(n, &recomposed.into())?;

    Ok((quotient.into(), remainder.into()))
}

/// The set of circuit instructions for division by a power of two and
/// modular addition.
pub trait DivisionInstructions<F>: RangeCheckInstructions<F> + Sized
where
    F: PrimeField,
{
    /// Given `n` fitting in `n_bits` bits, returns
    /// `(quotient, remainder)` with `n = quotient * 2^32 + remainder`,
    /// the remainder bounded to 32 bits and the quotient bounded to
    /// `n_bits - 32` bits.
    ///
    /// On the constant path the bound on `n` is checked immediately.
    /// On the assigned path an out-of-range `n` is not detected here; it
    /// makes the emitted constraints unsatisfiable instead.
    ///
    /// # Panics
    ///
    /// If `n_bits` is not lower than `F::NUM_BITS`, or if the resulting
    /// quotient width is not 1, 64 or a positive multiple of 16.
    fn div_mod_32(
        &mut self,
        n: &NativeValue<F>,
        n_bits: usize,
    ) -> Result<(NativeValue<F>, NativeValue<F>), Error> {
        div_mod_power_of_two(self, n, n_bits, 32)
    }

    /// Given `n` fitting in `n_bits` bits, returns
    /// `(quotient, remainder)` with `n = quotient * 2^64 + remainder`,
    /// the remainder bounded to 64 bits and the quotient bounded to
    /// `n_bits - 64` bits.
    ///
    /// # Panics
    ///
    /// Same conditions as [`div_mod_32`](DivisionInstructions::div_mod_32).
    fn div_mod_64(
        &mut self,
        n: &NativeValue<F>,
        n_bits: usize,
    ) -> Result<(NativeValue<F>, NativeValue<F>), Error> {
        div_mod_power_of_two(self, n, n_bits, 64)
    }

    /// Addition modulo `2^32`.
    ///
    /// The caller guarantees that `x` and `y` fit in 32 bits, so that
    /// their sum fits in 33; the precondition is not re-verified here.
    fn add_mod_32(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        let sum = self.add(x, y)?;
        let (_, remainder) = self.div_mod_32(&sum, 33)?;
        Ok(remainder)
    }

    /// Addition modulo `2^64`.
    ///
    /// The caller guarantees that `x` and `y` fit in 64 bits.
    fn add_mod_64(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        let sum = self.add(x, y)?;
        let (_, remainder) = self.div_mod_64(&sum, 65)?;
        Ok(remainder)
    }
}

impl<F, B> DivisionInstructions<F> for B
where
    F: PrimeField,
    B: RangeCheckInstructions<F>,
{
}

#[cfg(test)]
mod test {
    use ff::Field;
    use rand::{RngCore, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    use super::*;
    use crate::instructions::core_gates::CoreGateInstructions;
    use crate::{types::Value, utils::mock_backend::MockBackend};

    type F = halo2curves::bn256::Fr;

    fn assigned(backend: &mut MockBackend<F>, value: &BigUint) -> NativeValue<F> {
        backend
            .assign(Value::known(big_to_fe(value.clone())))
            .unwrap()
            .into()
    }

    fn check_div_mod_32(n: &BigUint, n_bits: usize) {
        let expected_q = n >> 32usize;
        let expected_r = n - (&expected_q << 32usize);

        // Constant path.
        let mut backend = MockBackend::<F>::new();
        let (q, r) = backend
            .div_mod_32(&NativeValue::Constant(big_to_fe(n.clone())), n_bits)
            .unwrap();
        assert_eq!(q.as_constant(), Some(big_to_fe(expected_q.clone())));
        assert_eq!(r.as_constant(), Some(big_to_fe(expected_r.clone())));
        assert_eq!(backend.num_gates(), 0);

        // Assigned path.
        let wire = assigned(&mut backend, n);
        let (q, r) = backend.div_mod_32(&wire, n_bits).unwrap();
        assert_eq!(q.value().into_option(), Some(big_to_fe(expected_q)));
        assert_eq!(r.value().into_option(), Some(big_to_fe(expected_r)));
        backend.assert_satisfied();
    }

    #[test]
    fn div_mod_32_roundtrip_on_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xd1f);
        for _ in 0..20 {
            check_div_mod_32(&BigUint::from(rng.next_u64()), 64);
        }
        check_div_mod_32(&BigUint::zero(), 64);
        check_div_mod_32(&((BigUint::one() << 64) - 1u8), 64);
    }

    #[test]
    fn div_mod_64_roundtrip_on_random_inputs() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xd64);
        for _ in 0..20 {
            let n = BigUint::from(rng.next_u64()) | (BigUint::from(rng.next_u64()) << 64);
            let expected_q = &n >> 64;
            let expected_r = &n - (&expected_q << 64);

            let mut backend = MockBackend::<F>::new();
            let wire = assigned(&mut backend, &n);
            // n_bits = 128 exercises the 64-bit quotient check.
            let (q, r) = backend.div_mod_64(&wire, 128).unwrap();
            assert_eq!(q.value().into_option(), Some(big_to_fe(expected_q)));
            assert_eq!(r.value().into_option(), Some(big_to_fe(expected_r)));
            backend.assert_satisfied();
        }
    }

    #[test]
    fn boolean_quotient_when_one_bit_wide() {
        // n_bits = 33 leaves a single quotient bit.
        let n = (BigUint::one() << 32) + 1u8;
        let mut backend = MockBackend::<F>::new();
        let wire = assigned(&mut backend, &n);
        let (q, r) = backend.div_mod_32(&wire, 33).unwrap();
        assert_eq!(q.value().into_option(), Some(F::ONE));
        assert_eq!(r.value().into_option(), Some(F::ONE));
        backend.assert_satisfied();
    }

    #[test]
    fn constant_out_of_bound_is_rejected() {
        let mut backend = MockBackend::<F>::new();
        let n = NativeValue::Constant(big_to_fe::<F>(BigUint::one() << 40));
        let err = backend.div_mod_32(&n, 40).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { bits: 40, .. }));
        assert_eq!(backend.num_gates(), 0);
    }

    #[test]
    fn oversized_witness_makes_the_circuit_unsatisfiable() {
        // 2^48 does not fit the declared 33-bit bound: the quotient is no
        // longer boolean.
        let mut backend = MockBackend::<F>::new();
        let wire = assigned(&mut backend, &(BigUint::one() << 48));
        backend.div_mod_32(&wire, 33).unwrap();
        assert!(backend.verify().is_err());
    }

    #[test]
    #[should_panic(expected = "n_bits must be lower than")]
    fn n_bits_must_fit_the_field() {
        let mut backend = MockBackend::<F>::new();
        let x = NativeValue::Constant(F::ZERO);
        let _ = backend.div_mod_32(&x, F::NUM_BITS as usize);
    }

    #[test]
    fn add_mod_32_wraps() {
        // (2^32 - 1) + 2 = 1 mod 2^32.
        let x = NativeValue::Constant(F::from(u32::MAX as u64));
        let y = NativeValue::Constant(F::from(2));

        let mut backend = MockBackend::<F>::new();
        let r = backend.add_mod_32(&x, &y).unwrap();
        assert_eq!(r.as_constant(), Some(F::ONE));
        assert_eq!(backend.num_gates(), 0);

        let xw = assigned(&mut backend, &BigUint::from(u32::MAX));
        let yw = assigned(&mut backend, &BigUint::from(2u8));
        let r = backend.add_mod_32(&xw, &yw).unwrap();
        assert_eq!(r.value().into_option(), Some(F::ONE));
        backend.assert_satisfied();
    }

    #[test]
    fn add_mod_64_wraps() {
        let mut backend = MockBackend::<F>::new();
        let xw = assigned(&mut backend, &BigUint::from(u64::MAX));
        let yw = assigned(&mut backend, &BigUint::from(5u8));
        let r = backend.add_mod_64(&xw, &yw).unwrap();
        assert_eq!(r.value().into_option(), Some(F::from(4)));
        backend.assert_satisfied();
    }

    #[test]
    fn add_mod_matches_host_arithmetic() {
        let mut rng = ChaCha8Rng::seed_from_u64(0xadd);
        for _ in 0..20 {
            let a = rng.next_u64() as u32;
            let b = rng.next_u64() as u32;
            let expected = a.wrapping_add(b);

            let mut backend = MockBackend::<F>::new();
            let xw = assigned(&mut backend, &BigUint::from(a));
            let yw = assigned(&mut backend, &BigUint::from(b));
            let r = backend.add_mod_32(&xw, &yw).unwrap();
            assert_eq!(r.value().into_option(), Some(F::from(expected as u64)));
            backend.assert_satisfied();
        }
    }
}
