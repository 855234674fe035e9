// SPDX-License-Identifier: MIT OR Apache-2.0

//! Platform-specific code.

pub mod s1000;
