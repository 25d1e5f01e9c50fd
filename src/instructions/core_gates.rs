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

//! Core gate instructions interface.
//!
//! This is the boundary between the gadget layer and a custom-gate proof
//! backend. Backends implement this trait; every gadget in this crate is
//! written against it and is passed the backend capability explicitly.
//!
//! The gadget layer owns the wire packing of the two range-check gates
//! (which limb goes on which wire, at which bit offset); the backend owns
//! their execution semantics. Gate calls are appended to one ordered
//! constraint list, and that order is part of the compiled circuit's
//! identity: two synthesis passes over the same gadgets must produce the
//! same gate sequence, whether or not witness values are present.
//!
//! ```text
//! Range-check gate wire structure (S is a 12-bit sublimb, C a 2-bit crumb):
//!
//!   range_check0(x, [s76 s64 s52 s40 s28 s16], [c14 c12 c10 c8 c6 c4 c2 c0])
//!       binds x to twelve sublimbs covering bits [0, 88), highest first.
//!       The two highest sublimbs (bit offsets 76 and 64) carry lookups
//!       deferred to an adjacent range_check1 row.
//!
//!   range_check1(z, zw, first_row[13], second_row[15])
//!       finishes an 88-bit decomposition of z across two rows:
//!       first row   (86,C) (74,S) (62,S) (50,S) (38,S)
//!                   (36,C) (34,C) (32,C) (30,C) (28,C) (26,C) (24,C) (22,C)
//!       second row  (20,C) (18,C) (16,C)
//!                   [x76] [x64] [y76] [y64]     <- borrowed sublimb lookups
//!                   (14,C) (12,C) (10,C) (8,C) (6,C) (4,C) (2,C) (0,C)
//!       zw is the combined-product wire: when the preceding range_check0
//!       row was issued in compact mode for a value x, the backend enforces
//!       zw = x + 2^88 * z, tying a compactly packed pair to its split.
//! ```
//!
//! The packing tables below are the single source of truth for this layout.
//! A backend with a different gate geometry can reinterpret them, and the
//! 88/64/32-bit constants used by the gadgets should be re-derived from the
//! target field's bit length rather than assumed to generalize.

use ff::PrimeField;

use crate::{
    error::Error,
    types::{AssignedNative, NativeValue, Value},
};

/// Bit width of a lookup sublimb.
pub const SUBLIMB_BITS: usize = 12;

/// Bit width of a crumb.
pub const CRUMB_BITS: usize = 2;

/// Bit offsets, highest first, of the six sublimb wires of
/// [`CoreGateInstructions::range_check0`].
pub const RANGE_CHECK0_SUBLIMB_OFFSETS: [usize; 6] = [76, 64, 52, 40, 28, 16];

/// Bit offsets, highest first, of the eight crumb wires of
/// [`CoreGateInstructions::range_check0`].
pub const RANGE_CHECK0_CRUMB_OFFSETS: [usize; 8] = [14, 12, 10, 8, 6, 4, 2, 0];

/// `(bit offset, width)` of the thirteen first-row wires of
/// [`CoreGateInstructions::range_check1`], highest first.
pub const RANGE_CHECK1_FIRST_ROW: [(usize, usize); 13] = [
    (86, 2),
    (74, 12),
    (62, 12),
    (50, 12),
    (38, 12),
    (36, 2),
    (34, 2),
    (32, 2),
    (30, 2),
    (28, 2),
    (26, 2),
    (24, 2),
    (22, 2),
];

/// `(bit offset, width)` of the second-row wires of the checked value that
/// precede the four borrowed sublimbs.
pub const RANGE_CHECK1_SECOND_ROW_HEAD: [(usize, usize); 3] = [(20, 2), (18, 2), (16, 2)];

/// `(bit offset, width)` of the second-row wires of the checked value that
/// follow the four borrowed sublimbs.
pub const RANGE_CHECK1_SECOND_ROW_TAIL: [(usize, usize); 8] = [
    (14, 2),
    (12, 2),
    (10, 2),
    (8, 2),
    (6, 2),
    (4, 2),
    (2, 2),
    (0, 2),
];

/// Position of the four borrowed sublimb wires within the second row of
/// [`CoreGateInstructions::range_check1`]: indices `3..7`, packed as
/// `[x76, x64, y76, y64]`.
pub const RANGE_CHECK1_BORROWED_RANGE: (usize, usize) = (3, 7);

/// The set of backend instructions the gadget layer is built on.
///
/// All methods are synchronous and append to the backend's ordered
/// constraint list. None of them inspects witness values when deciding what
/// to emit, so a compile-only pass (all witnesses [`Value::unknown`]) and a
/// proving pass produce identical gate sequences.
pub trait CoreGateInstructions<F>
where
    F: PrimeField,
{
    /// Allocates an unconstrained witness.
    ///
    /// The value is computed by the `Value` map chain handed in, which runs
    /// only during witness generation. Nothing constrains the result; the
    /// caller is responsible for binding it with gates.
    fn assign(&mut self, value: Value<F>) -> Result<AssignedNative<F>, Error>;

    /// Allocates a witness constrained to equal the given constant.
    fn assign_fixed(&mut self, constant: F) -> Result<AssignedNative<F>, Error>;

    /// Allocates several unconstrained witnesses.
    ///
    /// This is potentially more efficient than calling
    /// [`assign`](CoreGateInstructions::assign) multiple times.
    fn assign_many(&mut self, values: &[Value<F>]) -> Result<Vec<AssignedNative<F>>, Error> {
        values.iter().map(|v| self.assign(*v)).collect()
    }

    /// Returns a variable constrained to equal
    /// `constant + sum_i coeff_i * x_i`.
    ///
    /// Constant terms are folded into the gate constant by the backend.
    fn linear_combination(
        &mut self,
        terms: &[(F, NativeValue<F>)],
        constant: F,
    ) -> Result<AssignedNative<F>, Error>;

    /// Returns a variable constrained to equal `x * y`.
    fn mul(
        &mut self,
        x: &NativeValue<F>,
        y: &NativeValue<F>,
    ) -> Result<AssignedNative<F>, Error>;

    /// Enforces `x = y` as a field equation.
    fn assert_equal(&mut self, x: &NativeValue<F>, y: &NativeValue<F>) -> Result<(), Error>;

    /// Enforces `x * (x - 1) = 0`.
    fn assert_boolean(&mut self, x: &NativeValue<F>) -> Result<(), Error>;

    /// Returns the low `16 * length_div_16` bits of `x`'s canonical
    /// representation, with the high bits zeroed.
    ///
    /// The backend guarantees only that the *output* lies in
    /// `[0, 2^(16 * length_div_16))`; it proves no relation between the
    /// output and `x`. Callers combine it with
    /// [`assert_equal`](CoreGateInstructions::assert_equal) to obtain a
    /// range check on `x` itself.
    fn truncate_to_bits16(
        &mut self,
        length_div_16: usize,
        x: &NativeValue<F>,
    ) -> Result<AssignedNative<F>, Error>;

    /// Issues the first range-check gate, binding `x` to twelve
    /// decomposition wires in one row.
    ///
    /// `high_sublimbs` are packed per [`RANGE_CHECK0_SUBLIMB_OFFSETS`] and
    /// `crumbs` per [`RANGE_CHECK0_CRUMB_OFFSETS`]. With `compact` set, the
    /// following [`range_check1`](CoreGateInstructions::range_check1) call
    /// additionally ties its combined-product wire to `x`.
    fn range_check0(
        &mut self,
        x: &NativeValue<F>,
        high_sublimbs: &[NativeValue<F>; 6],
        crumbs: &[NativeValue<F>; 8],
        compact: bool,
    ) -> Result<(), Error>;

    /// Issues the second range-check gate, finishing the decomposition of
    /// `z` across two rows and carrying four borrowed sublimb lookups of
    /// neighboring values.
    ///
    /// `first_row` is packed per [`RANGE_CHECK1_FIRST_ROW`]; `second_row`
    /// interleaves [`RANGE_CHECK1_SECOND_ROW_HEAD`], the borrowed sublimbs
    /// at [`RANGE_CHECK1_BORROWED_RANGE`], and
    /// [`RANGE_CHECK1_SECOND_ROW_TAIL`]. `combined` is the combined-product
    /// wire described in the module documentation.
    fn range_check1(
        &mut self,
        z: &NativeValue<F>,
        combined: &NativeValue<F>,
        first_row: &[NativeValue<F>; 13],
        second_row: &[NativeValue<F>; 15],
    ) -> Result<(), Error>;
}
