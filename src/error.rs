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

//! Error type for the gadget layer.

use num_bigint::BigUint;
use thiserror::Error;

/// Errors raised while synthesizing gadgets.
///
/// Out-of-range *constants* are reported here, before any gate is produced.
/// Out-of-range *variables* are never reported by this layer: they surface
/// only as unsatisfied constraints in the backend, so that no information
/// about witness validity leaks outside the proof.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// A compile-time constant does not fit in the requested number of bits.
    #[error("{gadget}: expected a value of at most {bits} bits, got {value}")]
    OutOfRange {
        /// The gadget that rejected the constant.
        gadget: &'static str,
        /// The requested bound, in bits.
        bits: usize,
        /// The offending value, as a canonical integer.
        value: BigUint,
    },
    /// The backend failed to synthesize a requested constraint.
    #[error("backend synthesis failure: {0}")]
    Synthesis(&'static str),
}
