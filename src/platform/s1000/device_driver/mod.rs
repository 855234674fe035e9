// SPDX-License-Identifier: MIT OR Apache-2.0

//! Device drivers for the S1000 platform.

pub mod common;

mod cavs_intc;
mod dw_intc;

pub use {cavs_intc::CavsIntc, dw_intc::DwIntc};
