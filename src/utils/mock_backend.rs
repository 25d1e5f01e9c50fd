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

//! A mock backend for exercising gadgets without a proof system.
//!
//! The mock appends every instruction to an ordered gate list and can then
//! evaluate all recorded constraints against the witness values, playing
//! the role a mock prover plays for real circuits: gadget tests synthesize
//! against it and call [`MockBackend::assert_satisfied`], or inspect the
//! recorded gates directly. Running the same gadgets with
//! [`Value::unknown`] witnesses exercises the compile-only pass; the gate
//! sequence must not change.

use ff::PrimeField;
use num_bigint::BigUint;
use num_traits::One;
use thiserror::Error;

use crate::{
    error::Error,
    instructions::core_gates::{
        CoreGateInstructions, CRUMB_BITS, RANGE_CHECK0_CRUMB_OFFSETS,
        RANGE_CHECK0_SUBLIMB_OFFSETS, RANGE_CHECK1_FIRST_ROW, RANGE_CHECK1_SECOND_ROW_HEAD,
        RANGE_CHECK1_SECOND_ROW_TAIL, SUBLIMB_BITS,
    },
    types::{AssignedNative, NativeValue, Value, Var},
    utils::util::{big_to_fe, bit_slice, fe_to_big, pow2},
};

/// One recorded backend instruction.
#[derive(Clone, Debug)]
pub enum Gate<F: PrimeField> {
    /// A witness constrained to a constant.
    Fixed {
        /// The constrained wire.
        x: AssignedNative<F>,
        /// The constant it must equal.
        constant: F,
    },
    /// `output = constant + sum_i coeff_i * term_i`.
    LinearCombination {
        /// The weighted terms.
        terms: Vec<(F, NativeValue<F>)>,
        /// The additive constant.
        constant: F,
        /// The materialized result.
        output: AssignedNative<F>,
    },
    /// `output = x * y`.
    Mul {
        /// Left factor.
        x: NativeValue<F>,
        /// Right factor.
        y: NativeValue<F>,
        /// The materialized product.
        output: AssignedNative<F>,
    },
    /// `x = y`.
    Equal {
        /// Left side.
        x: NativeValue<F>,
        /// Right side.
        y: NativeValue<F>,
    },
    /// `x * (x - 1) = 0`.
    Boolean {
        /// The constrained wire.
        x: NativeValue<F>,
    },
    /// `output` is the low `16 * length_div_16` bits of `x`; only the
    /// bound on `output` is enforced.
    Truncate {
        /// Number of 16-bit chunks kept.
        length_div_16: usize,
        /// The truncated value.
        x: NativeValue<F>,
        /// The bounded output.
        output: AssignedNative<F>,
    },
    /// First range-check gate: `x` bound to twelve decomposition wires.
    RangeCheck0 {
        /// The decomposed value.
        x: NativeValue<F>,
        /// Six 12-bit sublimbs, highest first.
        high_sublimbs: [NativeValue<F>; 6],
        /// Eight 2-bit crumbs, highest first.
        crumbs: [NativeValue<F>; 8],
        /// Whether the following `range_check1` ties its combined-product
        /// wire to `x`.
        compact: bool,
    },
    /// Second range-check gate: `z` decomposed across two rows.
    RangeCheck1 {
        /// The decomposed value.
        z: NativeValue<F>,
        /// The combined-product wire.
        combined: NativeValue<F>,
        /// First-row wires.
        first_row: [NativeValue<F>; 13],
        /// Second-row wires, including the four borrowed sublimbs.
        second_row: [NativeValue<F>; 15],
    },
}

impl<F: PrimeField> Gate<F> {
    /// A short name identifying the gate kind, for comparing gate
    /// sequences across synthesis passes.
    pub fn name(&self) -> &'static str {
        match self {
            Gate::Fixed { .. } => "fixed",
            Gate::LinearCombination { .. } => "linear_combination",
            Gate::Mul { .. } => "mul",
            Gate::Equal { .. } => "equal",
            Gate::Boolean { .. } => "boolean",
            Gate::Truncate { .. } => "truncate",
            Gate::RangeCheck0 { .. } => "range_check0",
            Gate::RangeCheck1 { .. } => "range_check1",
        }
    }
}

/// A constraint violation reported by [`MockBackend::verify`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyFailure {
    /// A recorded constraint does not hold for the current witness.
    #[error("gate {index} ({gate}) is not satisfied: {reason}")]
    Unsatisfied {
        /// Position of the gate in the constraint list.
        index: usize,
        /// Gate kind.
        gate: &'static str,
        /// Human-readable description of the violation.
        reason: String,
    },
    /// A wire of the gate carries no value; the circuit was synthesized in
    /// a compile-only pass.
    #[error("gate {index} ({gate}) has an unknown witness")]
    UnknownWitness {
        /// Position of the gate in the constraint list.
        index: usize,
        /// Gate kind.
        gate: &'static str,
    },
}

/// A backend that records gates and evaluates them against the witness.
#[derive(Clone, Debug, Default)]
pub struct MockBackend<F: PrimeField> {
    num_vars: usize,
    gates: Vec<Gate<F>>,
}

impl<F: PrimeField> MockBackend<F> {
    /// Creates an empty backend.
    pub fn new() -> Self {
        Self {
            num_vars: 0,
            gates: Vec::new(),
        }
    }

    /// The recorded gates, in synthesis order. The order is part of the
    /// compiled circuit's identity.
    pub fn gates(&self) -> &[Gate<F>] {
        &self.gates
    }

    /// Number of recorded gates.
    pub fn num_gates(&self) -> usize {
        self.gates.len()
    }

    /// Number of allocated witnesses.
    pub fn num_witnesses(&self) -> usize {
        self.num_vars
    }

    fn next_var(&mut self) -> Var {
        let var = Var::new(self.num_vars);
        self.num_vars += 1;
        var
    }

    /// Evaluates every recorded constraint against the witness values.
    ///
    /// Returns all violations, in gate order. Wires with unknown values
    /// are reported as [`VerifyFailure::UnknownWitness`].
    pub fn verify(&self) -> Result<(), Vec<VerifyFailure>> {
        let mut failures = Vec::new();
        // The value of the last compact range_check0 row, consumed by the
        // range_check1 call that closes the block.
        let mut pending_compact: Option<F> = None;

        for (index, gate) in self.gates.iter().enumerate() {
            let check = self.eval_gate(index, gate, &mut pending_compact);
            failures.extend(check);
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(failures)
        }
    }

    /// Panics with the list of violations unless all constraints hold.
    pub fn assert_satisfied(&self) {
        if let Err(failures) = self.verify() {
            panic!("constraints are not satisfied: {failures:#?}");
        }
    }

    fn eval_gate(
        &self,
        index: usize,
        gate: &Gate<F>,
        pending_compact: &mut Option<F>,
    ) -> Vec<VerifyFailure> {
        let name = gate.name();
        let unknown = |_: &NativeValue<F>| vec![VerifyFailure::UnknownWitness { index, gate: name }];
        let unsatisfied = |reason: String| {
            vec![VerifyFailure::Unsatisfied {
                index,
                gate: name,
                reason,
            }]
        };

        match gate {
            Gate::Fixed { x, constant } => match x.value().into_option() {
                None => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                Some(v) if v == *constant => vec![],
                Some(v) => unsatisfied(format!("{v:?} != fixed {constant:?}")),
            },
            Gate::LinearCombination {
                terms,
                constant,
                output,
            } => {
                let mut acc = *constant;
                for (coeff, term) in terms {
                    match term.value().into_option() {
                        Some(v) => acc += *coeff * v,
                        None => return unknown(term),
                    }
                }
                match output.value().into_option() {
                    None => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                    Some(out) if out == acc => vec![],
                    Some(out) => unsatisfied(format!("{out:?} != combination {acc:?}")),
                }
            }
            Gate::Mul { x, y, output } => {
                match (
                    x.value().into_option(),
                    y.value().into_option(),
                    output.value().into_option(),
                ) {
                    (Some(a), Some(b), Some(out)) => {
                        if out == a * b {
                            vec![]
                        } else {
                            unsatisfied(format!("{out:?} != product of {a:?} and {b:?}"))
                        }
                    }
                    _ => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                }
            }
            Gate::Equal { x, y } => {
                match (x.value().into_option(), y.value().into_option()) {
                    (Some(a), Some(b)) => {
                        if a == b {
                            vec![]
                        } else {
                            unsatisfied(format!("{a:?} != {b:?}"))
                        }
                    }
                    _ => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                }
            }
            Gate::Boolean { x } => match x.value().into_option() {
                None => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                Some(v) if v == F::ZERO || v == F::ONE => vec![],
                Some(v) => unsatisfied(format!("{v:?} is not boolean")),
            },
            Gate::Truncate {
                length_div_16,
                x: _,
                output,
            } => match output.value().into_option() {
                None => vec![VerifyFailure::UnknownWitness { index, gate: name }],
                Some(out) => {
                    let bound = BigUint::one() << (16 * length_div_16);
                    if fe_to_big(out) < bound {
                        vec![]
                    } else {
                        unsatisfied(format!(
                            "truncation output exceeds {} bits",
                            16 * length_div_16
                        ))
                    }
                }
            },
            Gate::RangeCheck0 {
                x,
                high_sublimbs,
                crumbs,
                compact,
            } => {
                let mut failures = Vec::new();
                let Some(x_value) = x.value().into_option() else {
                    return unknown(x);
                };

                let mut acc = F::ZERO;
                for (wire, offset) in high_sublimbs.iter().zip(RANGE_CHECK0_SUBLIMB_OFFSETS) {
                    match wire.value().into_option() {
                        None => return unknown(wire),
                        Some(v) => {
                            if fe_to_big(v) >= (BigUint::one() << SUBLIMB_BITS) {
                                failures.extend(unsatisfied(format!(
                                    "sublimb at offset {offset} exceeds {SUBLIMB_BITS} bits"
                                )));
                            }
                            acc += v * pow2::<F>(offset);
                        }
                    }
                }
                for (wire, offset) in crumbs.iter().zip(RANGE_CHECK0_CRUMB_OFFSETS) {
                    match wire.value().into_option() {
                        None => return unknown(wire),
                        Some(v) => {
                            if fe_to_big(v) >= (BigUint::one() << CRUMB_BITS) {
                                failures.extend(unsatisfied(format!(
                                    "crumb at offset {offset} exceeds {CRUMB_BITS} bits"
                                )));
                            }
                            acc += v * pow2::<F>(offset);
                        }
                    }
                }
                if acc != x_value {
                    failures.extend(unsatisfied(
                        "decomposition does not recompose to the checked value".to_string(),
                    ));
                }

                *pending_compact = compact.then_some(x_value);
                failures
            }
            Gate::RangeCheck1 {
                z,
                combined,
                first_row,
                second_row,
            } => {
                let mut failures = Vec::new();
                let Some(z_value) = z.value().into_option() else {
                    return unknown(z);
                };

                let mut acc = F::ZERO;
                let mut add_limb = |wire: &NativeValue<F>,
                                    offset: usize,
                                    width: usize,
                                    failures: &mut Vec<VerifyFailure>|
                 -> Option<()> {
                    let v = wire.value().into_option()?;
                    if fe_to_big(v) >= (BigUint::one() << width) {
                        failures.extend(unsatisfied(format!(
                            "limb at offset {offset} exceeds {width} bits"
                        )));
                    }
                    acc += v * pow2::<F>(offset);
                    Some(())
                };

                for (wire, (offset, width)) in first_row.iter().zip(RANGE_CHECK1_FIRST_ROW) {
                    if add_limb(wire, offset, width, &mut failures).is_none() {
                        return unknown(wire);
                    }
                }
                for (wire, (offset, width)) in second_row[..3]
                    .iter()
                    .zip(RANGE_CHECK1_SECOND_ROW_HEAD)
                    .chain(second_row[7..].iter().zip(RANGE_CHECK1_SECOND_ROW_TAIL))
                {
                    if add_limb(wire, offset, width, &mut failures).is_none() {
                        return unknown(wire);
                    }
                }
                if acc != z_value {
                    failures.extend(unsatisfied(
                        "decomposition does not recompose to the checked value".to_string(),
                    ));
                }

                // Borrowed sublimb lookups, deferred from the two
                // range_check0 rows of the block.
                for wire in &second_row[3..7] {
                    match wire.value().into_option() {
                        None => return unknown(wire),
                        Some(v) => {
                            if fe_to_big(v) >= (BigUint::one() << SUBLIMB_BITS) {
                                failures.extend(unsatisfied(
                                    "borrowed sublimb exceeds 12 bits".to_string(),
                                ));
                            }
                        }
                    }
                }

                // Compact-mode product identity: combined = x + 2^88 * z.
                if let Some(x_value) = pending_compact.take() {
                    match combined.value().into_option() {
                        None => return unknown(combined),
                        Some(c) => {
                            let expected =
                                x_value + z_value * pow2::<F>(crate::instructions::multi_range_check::LIMB_BITS);
                            if c != expected {
                                failures.extend(unsatisfied(
                                    "combined-product wire does not match the compact pair"
                                        .to_string(),
                                ));
                            }
                        }
                    }
                }

                failures
            }
        }
    }
}

impl<F: PrimeField> CoreGateInstructions<F> for MockBackend<F> {
    fn assign(&mut self, value: Value<F>) -> Result<AssignedNative<F>, Error> {
        let var = self.next_var();
        Ok(AssignedNative::new(var, value))
    }

    fn assign_fixed(&mut self, constant: F) -> Result<AssignedNative<F>, Error> {
        let var = self.next_var();
        let assigned = AssignedNative::new(var, Value::known(constant));
        self.gates.push(Gate::Fixed {
            x: assigned,
            constant,
        });
        Ok(assigned)
    }

    fn linear_combination(
        &mut self,
        terms: &[(F, NativeValue<F>)],
        constant: F,
    ) -> Result<AssignedNative<F>, Error> {
        let mut value = Value::known(constant);
        for (coeff, term) in terms {
            let coeff = *coeff;
            value = value.zip(term.value()).map(|(acc, v)| acc + coeff * v);
        }
        let var = self.next_var();
        let output = AssignedNative::new(var, value);
        self.gates.push(Gate::LinearCombination {
            terms: terms.to_vec(),
            constant,
            output,
        });
        Ok(output)
    }

    fn mul(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<AssignedNative<F>, Error> {
        let value = x.value().zip(y.value()).map(|(a, b)| a * b);
        let var = self.next_var();
        let output = AssignedNative::new(var, value);
        self.gates.push(Gate::Mul {
            x: *x,
            y: *y,
            output,
        });
        Ok(output)
    }

    fn assert_equal(&mut self, x: &NativeValue<F>, y: &NativeValue<F>) -> Result<(), Error> {
        self.gates.push(Gate::Equal { x: *x, y: *y });
        Ok(())
    }

    fn assert_boolean(&mut self, x: &NativeValue<F>) -> Result<(), Error> {
        self.gates.push(Gate::Boolean { x: *x });
        Ok(())
    }

    fn truncate_to_bits16(
        &mut self,
        length_div_16: usize,
        x: &NativeValue<F>,
    ) -> Result<AssignedNative<F>, Error> {
        let value = x
            .value()
            .map(|v| big_to_fe(bit_slice(&fe_to_big(v), 0, 16 * length_div_16)));
        let var = self.next_var();
        let output = AssignedNative::new(var, value);
        self.gates.push(Gate::Truncate {
            length_div_16,
            x: *x,
            output,
        });
        Ok(output)
    }

    fn range_check0(
        &mut self,
        x: &NativeValue<F>,
        high_sublimbs: &[NativeValue<F>; 6],
        crumbs: &[NativeValue<F>; 8],
        compact: bool,
    ) -> Result<(), Error> {
        self.gates.push(Gate::RangeCheck0 {
            x: *x,
            high_sublimbs: *high_sublimbs,
            crumbs: *crumbs,
            compact,
        });
        Ok(())
    }

    fn range_check1(
        &mut self,
        z: &NativeValue<F>,
        combined: &NativeValue<F>,
        first_row: &[NativeValue<F>; 13],
        second_row: &[NativeValue<F>; 15],
    ) -> Result<(), Error> {
        self.gates.push(Gate::RangeCheck1 {
            z: *z,
            combined: *combined,
            first_row: *first_row,
            second_row: *second_row,
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use ff::Field;

    use super::*;
    use crate::{
        instructions::{DivisionInstructions, MultiRangeCheckInstructions, RangeCheckInstructions},
        utils::util::big_to_fe,
    };

    type F = halo2curves::bn256::Fr;

    #[test]
    fn unsatisfied_equality_is_reported() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend.assign(Value::known(F::ONE)).unwrap().into();
        backend
            .assert_equal(&x, &NativeValue::Constant(F::from(2)))
            .unwrap();
        let failures = backend.verify().unwrap_err();
        assert_eq!(failures.len(), 1);
        assert!(matches!(failures[0], VerifyFailure::Unsatisfied { index: 0, .. }));
    }

    #[test]
    fn unknown_witness_is_reported() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend.assign(Value::unknown()).unwrap().into();
        backend.assert_boolean(&x).unwrap();
        let failures = backend.verify().unwrap_err();
        assert!(matches!(failures[0], VerifyFailure::UnknownWitness { .. }));
    }

    /// The gate sequence of a synthesis pass must not depend on whether
    /// witness values are present.
    #[test]
    fn passes_emit_identical_gate_sequences() {
        let synthesize = |witness: Value<F>| {
            let mut backend = MockBackend::<F>::new();
            let x: NativeValue<F> = backend.assign(witness).unwrap().into();
            let values = [x, x, x];
            backend.multi_range_check(&values).unwrap();
            backend.range_check64(&x).unwrap();
            backend.div_mod_32(&x, 64).unwrap();
            backend
                .gates()
                .iter()
                .map(Gate::name)
                .collect::<Vec<_>>()
        };

        let compile_pass = synthesize(Value::unknown());
        let witness_pass = synthesize(Value::known(F::from(1234567)));
        assert_eq!(compile_pass, witness_pass);
    }

    #[test]
    fn verify_requires_witnesses() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend.assign(Value::unknown()).unwrap().into();
        backend.range_check32(&x).unwrap();
        assert!(backend.verify().is_err());
    }

    #[test]
    fn fixed_gate_checks_the_constant() {
        let mut backend = MockBackend::<F>::new();
        backend.assign_fixed(F::from(7)).unwrap();
        backend.assert_satisfied();
        assert_eq!(backend.num_gates(), 1);
        assert_eq!(backend.gates()[0].name(), "fixed");
    }

    #[test]
    fn gate_order_is_stable() {
        let mut backend = MockBackend::<F>::new();
        let x: NativeValue<F> = backend
            .assign(Value::known(big_to_fe(BigUint::from(77u8))))
            .unwrap()
            .into();
        backend.range_check64(&x).unwrap();
        backend.div_mod_32(&x, 64).unwrap();

        let names: Vec<_> = backend.gates().iter().map(Gate::name).collect();
        assert_eq!(
            names,
            vec![
                "range_check0",
                "truncate",
                "equal",
                "truncate",
                "equal",
                "linear_combination",
                "equal",
            ]
        );
    }
}
