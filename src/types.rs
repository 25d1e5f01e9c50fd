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

//! Types for circuit values: deferred witness values, assigned variables and
//! the constant-or-assigned native field element every gadget dispatches on.

use ff::PrimeField;

use crate::{error::Error, instructions::CoreGateInstructions};

/// A value that may only be known during witness generation.
///
/// During a compile-only pass (constraint counting, key derivation) every
/// witness is [`Value::unknown`] and the closures passed to [`Value::map`]
/// never run. During proving the same code runs with [`Value::known`] values
/// and the closures compute the actual witnesses. Gadget code must emit the
/// same gates in both passes, which holds as long as gate emission never
/// branches on the content of a `Value`.
#[derive(Clone, Copy, Debug)]
pub struct Value<V> {
    inner: Option<V>,
}

impl<V> Default for Value<V> {
    fn default() -> Self {
        Self::unknown()
    }
}

impl<V> Value<V> {
    /// A value absent in this pass.
    pub fn unknown() -> Self {
        Self { inner: None }
    }

    /// A concrete value, available to witness computations.
    pub fn known(value: V) -> Self {
        Self { inner: Some(value) }
    }

    /// Maps the value, if known. The closure does not run otherwise.
    pub fn map<W>(self, f: impl FnOnce(V) -> W) -> Value<W> {
        Value {
            inner: self.inner.map(f),
        }
    }

    /// Pairs two values; the result is known iff both inputs are.
    pub fn zip<W>(self, other: Value<W>) -> Value<(V, W)> {
        Value {
            inner: self.inner.zip(other.inner),
        }
    }

    /// Extracts the inner value.
    ///
    /// Intended for backend implementations, which need the concrete witness
    /// at assignment time. Gadget code must not branch on the result.
    pub fn into_option(self) -> Option<V> {
        self.inner
    }
}

impl<A, B> Value<(A, B)> {
    /// Splits a value of a pair into a pair of values.
    pub fn unzip(self) -> (Value<A>, Value<B>) {
        match self.inner {
            Some((a, b)) => (Value::known(a), Value::known(b)),
            None => (Value::unknown(), Value::unknown()),
        }
    }
}

/// Opaque handle to a circuit variable, minted by the backend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Var(usize);

impl Var {
    /// Creates a handle from a backend-chosen index.
    pub fn new(index: usize) -> Self {
        Self(index)
    }

    /// The backend-chosen index of this variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// An assigned native field element: a wire handle together with its value,
/// the latter known only during witness generation.
#[derive(Clone, Copy, Debug)]
pub struct AssignedNative<F: PrimeField> {
    var: Var,
    value: Value<F>,
}

impl<F: PrimeField> AssignedNative<F> {
    /// Creates an assigned value. Backends call this when allocating wires.
    pub fn new(var: Var, value: Value<F>) -> Self {
        Self { var, value }
    }

    /// The wire handle.
    pub fn var(&self) -> Var {
        self.var
    }

    /// The value carried by this wire in the current pass.
    pub fn value(&self) -> Value<F> {
        self.value
    }
}

/// A native field element that is either a compile-time constant or an
/// assigned circuit variable.
///
/// Every gadget dispatches on this tag: the constant arm folds the operation
/// with host arithmetic and produces no gates, the assigned arm emits
/// constraints. Both arms agree mathematically at every gadget boundary.
#[derive(Clone, Copy, Debug)]
pub enum NativeValue<F: PrimeField> {
    /// An integer known at compile time.
    Constant(F),
    /// A variable whose value exists only during witness generation.
    Assigned(AssignedNative<F>),
}

impl<F: PrimeField> NativeValue<F> {
    /// Whether this value is a compile-time constant.
    pub fn is_constant(&self) -> bool {
        matches!(self, NativeValue::Constant(_))
    }

    /// The constant content, if any.
    pub fn as_constant(&self) -> Option<F> {
        match self {
            NativeValue::Constant(c) => Some(*c),
            NativeValue::Assigned(_) => None,
        }
    }

    /// The value in the current pass: always known for constants.
    pub fn value(&self) -> Value<F> {
        match self {
            NativeValue::Constant(c) => Value::known(*c),
            NativeValue::Assigned(a) => a.value(),
        }
    }

    /// Canonicalizes this value into an assigned variable.
    ///
    /// Constants are assigned as fixed values, which produces one constraint;
    /// already-assigned values are returned as they are.
    pub fn to_assigned<B>(&self, backend: &mut B) -> Result<AssignedNative<F>, Error>
    where
        B: CoreGateInstructions<F>,
    {
        match self {
            NativeValue::Constant(c) => backend.assign_fixed(*c),
            NativeValue::Assigned(a) => Ok(*a),
        }
    }
}

impl<F: PrimeField> From<F> for NativeValue<F> {
    fn from(c: F) -> Self {
        NativeValue::Constant(c)
    }
}

impl<F: PrimeField> From<AssignedNative<F>> for NativeValue<F> {
    fn from(a: AssignedNative<F>) -> Self {
        NativeValue::Assigned(a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn value_map_runs_only_when_known() {
        let known = Value::known(3u64).map(|x| x + 1);
        assert_eq!(known.into_option(), Some(4));

        let unknown = Value::<u64>::unknown().map(|_| panic!("must not run"));
        assert!(unknown.into_option().is_none());
    }

    #[test]
    fn value_zip_and_unzip() {
        let pair = Value::known(1u64).zip(Value::known(2u64));
        let (a, b) = pair.unzip();
        assert_eq!(a.into_option(), Some(1));
        assert_eq!(b.into_option(), Some(2));

        let (a, b) = Value::known(1u64).zip(Value::<u64>::unknown()).unzip();
        assert!(a.into_option().is_none());
        assert!(b.into_option().is_none());
    }
}
