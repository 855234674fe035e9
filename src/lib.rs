// SPDX-License-Identifier: MIT OR Apache-2.0

//! SoC support layer for the Intel S1000 audio DSP.
//!
//! The DSP sees its interrupt sources through a multi-level controller
//! topology: the core architecture-level controller feeds four cAVS
//! aggregator blocks, and one of those child lines feeds a DesignWare
//! sub-controller. A single source is addressed by a composite
//! [`irq::IrqNumber`] that encodes its position in this hierarchy, and
//! [`irq::IrqRouter`] keeps the enable state of all levels consistent.
//!
//! Besides the routing core, the crate carries the init-time plumbing the
//! platform needs before any interrupt fires: resource-ownership and
//! power/clock bring-up, bootstrap-strap reference-clock detection, and
//! the firmware-ready record published to the host mailbox at boot
//! completion.

#![no_std]
#![allow(clippy::upper_case_acronyms)]

#[cfg(test)]
extern crate std;

pub mod drivers;
pub mod irq;
pub mod platform;
pub mod sync;
