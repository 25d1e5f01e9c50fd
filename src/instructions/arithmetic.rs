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

//! Arithmetic instructions interface.
//!
//! Constant-folding arithmetic over [`NativeValue`]: operations between
//! constants run as host arithmetic and create no gates, operations
//! involving an assigned value materialize a fresh variable through the
//! backend.

use ff::PrimeField;

use crate::{
    error::Error,
    instructions::CoreGateInstructions,
    types::NativeValue,
};

/// The set of circuit instructions for native arithmetic.
pub trait ArithInstructions<F>: CoreGateInstructions<F>
where
    F: PrimeField,
{
    /// Addition.
    fn add(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        match (x.as_constant(), y.as_constant()) {
            (Some(a), Some(b)) => Ok(NativeValue::Constant(a + b)),
            _ => Ok(self
                .linear_combination(&[(F::ONE, *x), (F::ONE, *y)], F::ZERO)?
                .into()),
        }
    }

    /// Subtraction.
    fn sub(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        match (x.as_constant(), y.as_constant()) {
            (Some(a), Some(b)) => Ok(NativeValue::Constant(a - b)),
            _ => Ok(self
                .linear_combination(&[(F::ONE, *x), (-F::ONE, *y)], F::ZERO)?
                .into()),
        }
    }

    /// Multiplication by a constant.
    ///
    /// On the assigned path this seals the product into a fresh variable.
    fn mul_by_constant(
        &mut self,
        k: F,
        x: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        match x.as_constant() {
            Some(a) => Ok(NativeValue::Constant(k * a)),
            None => Ok(self.linear_combination(&[(k, *x)], F::ZERO)?.into()),
        }
    }

    /// Returns `1` if `x` is zero and `0` otherwise, as a
    /// boolean-constrained value.
    ///
    /// The assigned path witnesses the flag together with an inverse
    /// candidate and enforces `b * x = 0` and `x * inv = 1 - b`, which
    /// determines `b` completely.
    fn is_zero(&mut self, x: &NativeValue<F>) -> Result<NativeValue<F>, Error> {
        if let Some(a) = x.as_constant() {
            let bit = if a.is_zero_vartime() { F::ONE } else { F::ZERO };
            return Ok(NativeValue::Constant(bit));
        }

        let b = self.assign(x.value().map(|v| {
            if v.is_zero_vartime() {
                F::ONE
            } else {
                F::ZERO
            }
        }))?;
        let inv = self.assign(x.value().map(|v| v.invert().unwrap_or(F::ZERO)))?;

        let bx = self.mul(&b.into(), x)?;
        self.assert_equal(&bx.into(), &NativeValue::Constant(F::ZERO))?;

        let x_inv = self.mul(&inv.into(), x)?;
        let one_minus_b = self.linear_combination(&[(-F::ONE, b.into())], F::ONE)?;
        self.assert_equal(&x_inv.into(), &one_minus_b.into())?;

        Ok(b.into())
    }

    /// Returns `1` if `x = y` and `0` otherwise, as a boolean-constrained
    /// value.
    fn is_equal(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<NativeValue<F>, Error> {
        let diff = self.sub(x, y)?;
        self.is_zero(&diff)
    }
}

impl<F, B> ArithInstructions<F> for B
where
    F: PrimeField,
    B: CoreGateInstructions<F>,
{
}

#[cfg(test)]
mod tests {
    use ff::Field;

    use super::*;
    use crate::{types::Value, utils::mock_backend::MockBackend};

    type F = halo2curves::bn256::Fr;

    #[test]
    fn constant_operations_produce_no_gates() {
        let mut backend = MockBackend::<F>::new();
        let x = NativeValue::Constant(F::from(5));
        let y = NativeValue::Constant(F::from(7));

        assert_eq!(backend.add(&x, &y).unwrap().as_constant(), Some(F::from(12)));
        assert_eq!(backend.sub(&y, &x).unwrap().as_constant(), Some(F::from(2)));
        assert_eq!(
            backend.mul_by_constant(F::from(3), &x).unwrap().as_constant(),
            Some(F::from(15))
        );
        assert_eq!(backend.is_zero(&x).unwrap().as_constant(), Some(F::ZERO));
        assert_eq!(backend.is_equal(&x, &x).unwrap().as_constant(), Some(F::ONE));
        assert_eq!(backend.num_gates(), 0);
    }

    #[test]
    fn assigned_operations_are_satisfied() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend.assign(Value::known(F::from(5))).unwrap().into();
        let y: NativeValue<F> = backend.assign(Value::known(F::from(7))).unwrap().into();

        let sum = backend.add(&x, &y).unwrap();
        let diff = backend.sub(&y, &x).unwrap();
        let scaled = backend.mul_by_constant(F::from(3), &x).unwrap();

        assert_eq!(sum.value().into_option(), Some(F::from(12)));
        assert_eq!(diff.value().into_option(), Some(F::from(2)));
        assert_eq!(scaled.value().into_option(), Some(F::from(15)));
        backend.assert_satisfied();
    }

    #[test]
    fn is_zero_on_assigned_values() {
        let mut backend = MockBackend::<F>::new();
        let zero: NativeValue<F> = backend.assign(Value::known(F::ZERO)).unwrap().into();
        let nonzero: NativeValue<F> = backend.assign(Value::known(F::from(41))).unwrap().into();

        let b0 = backend.is_zero(&zero).unwrap();
        let b1 = backend.is_zero(&nonzero).unwrap();

        assert_eq!(b0.value().into_option(), Some(F::ONE));
        assert_eq!(b1.value().into_option(), Some(F::ZERO));
        backend.assert_satisfied();
    }

    #[test]
    fn is_equal_mixed_constant_and_assigned() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend.assign(Value::known(F::from(9))).unwrap().into();

        let eq = backend.is_equal(&x, &NativeValue::Constant(F::from(9))).unwrap();
        let ne = backend.is_equal(&x, &NativeValue::Constant(F::from(10))).unwrap();

        assert_eq!(eq.value().into_option(), Some(F::ONE));
        assert_eq!(ne.value().into_option(), Some(F::ZERO));
        backend.assert_satisfied();
    }
}
