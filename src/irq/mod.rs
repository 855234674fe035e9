// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cascaded interrupt routing.
//!
//! Interrupt sources on this platform sit behind up to three controller
//! levels: the architecture-level controller of the DSP core, a cAVS
//! aggregator block hanging off one core line, and optionally a DesignWare
//! sub-controller hanging off one aggregator child line. A source is
//! addressed by a single [`IrqNumber`] that packs its position at every
//! level, and [`IrqRouter`] translates enable/disable requests for such a
//! number into the right sequence of per-level mask operations.

use core::fmt;

pub mod cascade;
pub mod router;

pub use {
    cascade::{CascadeDescriptor, CascadeDirectory},
    router::IrqRouter,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Interrupt routing interfaces.
pub mod interface {

    /// Capability implemented by every cascaded interrupt controller.
    ///
    /// A controller fans one parent line out to up to 32 (or 64) child lines and owns the set of
    /// currently enabled children. Implementations may themselves be registered as a child of a
    /// controller one level up, which is how the third hierarchy tier is composed.
    pub trait NextLevelIrq {
        /// Unmask the given child line. Enabling an already-enabled child is a no-op.
        fn enable(&self, child: u8);

        /// Mask the given child line. Disabling an already-disabled child is a no-op.
        fn disable(&self, child: u8);

        /// `true` iff at least one child line is currently enabled.
        ///
        /// Must reflect the effect of every preceding `enable`/`disable` call. This is the sole
        /// signal the router uses to decide whether a disable propagates to the parent level.
        fn is_any_enabled(&self) -> bool;
    }

    /// The architecture-level mask primitive of the DSP core.
    ///
    /// On real hardware this pokes the core's interrupt-enable special register; it is supplied by
    /// the architecture layer and injected into the [`crate::irq::IrqRouter`].
    pub trait CoreIrqOps {
        /// Unconditionally unmask a core interrupt line.
        fn enable_line(&self, line: u8);

        /// Unconditionally mask a core interrupt line.
        fn disable_line(&self, line: u8);
    }
}

/// A composite interrupt number.
///
/// Packs the position of one interrupt source at every level of the controller hierarchy, using
/// the bit layout of the hardware ABI:
///
/// ```text
/// bits  0..8   core line
/// bits  8..16  second-level child number + 1, or 0 if the source is a plain core interrupt
/// bits 16..24  third-level child number + 1, or 0 if the source sits on the second level
/// ```
///
/// The +1 bias makes "level not present" representable without a separate flag, so the encoding
/// is total and unambiguous over the valid range. Field overflow is a caller programming error
/// and is only caught by debug assertions, matching the bit-packing discipline of the ABI.
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct IrqNumber(u32);

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

const LEVEL2_SHIFT: u32 = 8;
const LEVEL3_SHIFT: u32 = 16;
const FIELD_MASK: u32 = 0xff;

impl IrqNumber {
    /// A plain core interrupt, no cascade levels involved.
    pub const fn direct(core_line: u8) -> Self {
        Self(core_line as u32)
    }

    /// A source on a second-level controller cascaded into `core_line`.
    pub const fn cascaded(core_line: u8, child: u8) -> Self {
        debug_assert!(child < FIELD_MASK as u8);

        Self((core_line as u32) | ((child as u32 + 1) << LEVEL2_SHIFT))
    }

    /// A source on a third-level controller, cascaded into child line `child` of the second-level
    /// controller on `core_line`.
    pub const fn sub_cascaded(core_line: u8, child: u8, sub_child: u8) -> Self {
        debug_assert!(child < FIELD_MASK as u8);
        debug_assert!(sub_child < FIELD_MASK as u8);

        Self(
            (core_line as u32)
                | ((child as u32 + 1) << LEVEL2_SHIFT)
                | ((sub_child as u32 + 1) << LEVEL3_SHIFT),
        )
    }

    /// Reconstruct from the raw packed value.
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// The raw packed value.
    pub const fn into_raw(self) -> u32 {
        self.0
    }

    /// The interrupt line as seen by the architecture-level controller.
    pub const fn core_line(self) -> u8 {
        (self.0 & FIELD_MASK) as u8
    }

    /// The child line on the second-level controller, if the source sits below one.
    pub const fn cascade_child(self) -> Option<u8> {
        match (self.0 >> LEVEL2_SHIFT) & FIELD_MASK {
            0 => None,
            biased => Some((biased - 1) as u8),
        }
    }

    /// The child line on the third-level controller, if the source sits below one.
    pub const fn sub_child(self) -> Option<u8> {
        match (self.0 >> LEVEL3_SHIFT) & FIELD_MASK {
            0 => None,
            biased => Some((biased - 1) as u8),
        }
    }
}

impl fmt::Display for IrqNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.core_line())?;
        if let Some(child) = self.cascade_child() {
            write!(f, ":{}", child)?;
        }
        if let Some(sub_child) = self.sub_child() {
            write!(f, ":{}", sub_child)?;
        }
        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direct_numbers_round_trip() {
        for line in 0..=u8::MAX {
            let irq = IrqNumber::direct(line);
            assert_eq!(irq.core_line(), line);
            assert_eq!(irq.cascade_child(), None);
            assert_eq!(irq.sub_child(), None);
            assert_eq!(IrqNumber::from_raw(irq.into_raw()), irq);
        }
    }

    #[test]
    fn cascaded_numbers_round_trip() {
        for line in [0u8, 6, 10, 255] {
            for child in [0u8, 1, 31, 254] {
                let irq = IrqNumber::cascaded(line, child);
                assert_eq!(irq.core_line(), line);
                assert_eq!(irq.cascade_child(), Some(child));
                assert_eq!(irq.sub_child(), None);
                assert_eq!(IrqNumber::from_raw(irq.into_raw()), irq);
            }
        }
    }

    #[test]
    fn sub_cascaded_numbers_round_trip() {
        for child in 0..=254u8 {
            for sub_child in [0u8, 7, 63, 254] {
                let irq = IrqNumber::sub_cascaded(16, child, sub_child);
                assert_eq!(irq.core_line(), 16);
                assert_eq!(irq.cascade_child(), Some(child));
                assert_eq!(irq.sub_child(), Some(sub_child));
                assert_eq!(IrqNumber::from_raw(irq.into_raw()), irq);
            }
        }
    }

    #[test]
    fn packed_values_decode_unambiguously() {
        // Every in-range packed value re-encodes to itself through the accessors.
        for raw in [0x0000_0002u32, 0x0000_0410, 0x0008_040a, 0x00ff_ff06] {
            let irq = IrqNumber::from_raw(raw);
            let rebuilt = match (irq.cascade_child(), irq.sub_child()) {
                (None, None) => IrqNumber::direct(irq.core_line()),
                (Some(child), None) => IrqNumber::cascaded(irq.core_line(), child),
                (Some(child), Some(sub)) => {
                    IrqNumber::sub_cascaded(irq.core_line(), child, sub)
                }
                (None, Some(_)) => unreachable!("third level implies second level"),
            };
            assert_eq!(rebuilt.into_raw(), raw);
        }
    }

    #[test]
    fn display_shows_all_levels() {
        use std::format;

        assert_eq!(format!("{}", IrqNumber::direct(4)), "4");
        assert_eq!(format!("{}", IrqNumber::cascaded(10, 3)), "10:3");
        assert_eq!(format!("{}", IrqNumber::sub_cascaded(10, 7, 2)), "10:7:2");
    }
}
