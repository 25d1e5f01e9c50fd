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

//! Range-check and bounded-arithmetic gadgets over custom-gate backends.
//!
//! The gadgets prove, inside an arithmetic circuit over a large prime
//! field, that a field element's integer value lies within a bounded
//! range, and build modular-arithmetic primitives (division and addition
//! modulo a power of two) on top of that guarantee. Every claim is backed
//! by an algebraic identity that holds against any adversarial witness:
//! limbs are witnessed unconstrained, bounded by the backend's range-check
//! gates, and tied back to their parent value by a recomposition equation.
//!
//! The proof system is abstracted behind
//! [`CoreGateInstructions`](instructions::CoreGateInstructions); the
//! gadget traits are implemented for every backend through blanket
//! implementations. A [`MockBackend`](testing_utils) (behind the
//! `testing` feature) records the ordered gate list and evaluates
//! constraint satisfaction, for tests and for calibrating new backends.

#![deny(rustdoc::broken_intra_doc_links)]
#![deny(missing_debug_implementations)]
#![deny(missing_docs)]

pub mod instructions;
pub mod types;

mod error;
mod utils;

pub use error::Error;

/// Tools useful for testing and for backend implementors.
pub mod testing_utils {
    #[cfg(any(test, feature = "testing"))]
    pub use crate::utils::mock_backend::{Gate, MockBackend, VerifyFailure};
    pub use crate::utils::util::{big_to_fe, bit_slice, fe_to_big, modulus};
}
