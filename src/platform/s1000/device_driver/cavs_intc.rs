// SPDX-License-Identifier: MIT OR Apache-2.0

//! cAVS interrupt aggregator.
//!
//! Four instances of this block sit between the DSP core and the audio peripherals, each fanning
//! one core interrupt line out to up to 32 sources. Mask manipulation is write-1-to-set style:
//! `IL_MSD` masks (disables) the written children, `IL_MCD` unmasks them, `IL_MD` reads back the
//! currently masked set and `IL_SD` the raw status.

use {
    super::common::MMIODerefWrapper,
    crate::{
        drivers, irq,
        sync::{interface::Mutex, NullLock},
    },
    tock_registers::{
        interfaces::{Readable, Writeable},
        register_structs,
        registers::{ReadOnly, WriteOnly},
    },
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => IL_MSD: WriteOnly<u32>), // write 1: mask (disable) child
        (0x04 => IL_MCD: WriteOnly<u32>), // write 1: unmask (enable) child
        (0x08 => IL_MD: ReadOnly<u32>),   // currently masked children
        (0x0c => IL_SD: ReadOnly<u32>),   // raw status
        (0x10 => @END),
    }
}

type Registers = MMIODerefWrapper<RegisterBlock>;

struct CavsIntcInner {
    registers: Registers,

    // Mirror of the unmasked-children set. The block only exposes the masked set through `IL_MD`,
    // keeping the mirror here makes `is_any_enabled` a plain read with no MMIO round trip.
    enabled: u32,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of one cAVS aggregator instance.
pub struct CavsIntc {
    inner: NullLock<CavsIntcInner>,
    compatible: &'static str,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

impl CavsIntcInner {
    const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { Registers::new(mmio_base_addr) },
            enabled: 0,
        }
    }

    fn enable(&mut self, child: u8) {
        debug_assert!(child < 32);

        let bit = 1 << child;
        self.enabled |= bit;
        self.registers.IL_MCD.set(bit);
    }

    fn disable(&mut self, child: u8) {
        debug_assert!(child < 32);

        let bit = 1 << child;
        self.enabled &= !bit;
        self.registers.IL_MSD.set(bit);
    }

    fn mask_all(&mut self) {
        self.enabled = 0;
        self.registers.IL_MSD.set(u32::MAX);
    }

    fn pending(&self) -> u32 {
        self.registers.IL_SD.get() & !self.registers.IL_MD.get()
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl CavsIntc {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize, compatible: &'static str) -> Self {
        Self {
            inner: NullLock::new(unsafe { CavsIntcInner::new(mmio_base_addr) }),
            compatible,
        }
    }

    /// Bitmask of child lines that are both raised and unmasked.
    pub fn pending(&self) -> u32 {
        self.inner.lock(|inner| inner.pending())
    }
}

//--------------------------------------------------------------------------------------------------
// OS Interface Code
//--------------------------------------------------------------------------------------------------

impl irq::interface::NextLevelIrq for CavsIntc {
    fn enable(&self, child: u8) {
        self.inner.lock(|inner| inner.enable(child));
    }

    fn disable(&self, child: u8) {
        self.inner.lock(|inner| inner.disable(child));
    }

    fn is_any_enabled(&self) -> bool {
        self.inner.lock(|inner| inner.enabled != 0)
    }
}

impl drivers::interface::DeviceDriver for CavsIntc {
    fn compatible(&self) -> &'static str {
        self.compatible
    }

    unsafe fn init(&self) -> Result<(), &'static str> {
        // Start from a fully masked block; routing requests unmask selectively.
        self.inner.lock(|inner| inner.mask_all());

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use {super::*, crate::irq::interface::NextLevelIrq, drivers::interface::DeviceDriver};

    const MSD: usize = 0;
    const MCD: usize = 1;

    #[test]
    fn enable_and_disable_hit_the_mask_registers() {
        let mut reg = [0u32; 4];
        let intc = unsafe { CavsIntc::new(&mut reg as *mut _ as usize, "cavs-ictl-test") };

        intc.enable(3);
        assert_eq!(reg[MCD], 0b1000);
        assert!(intc.is_any_enabled());

        intc.disable(3);
        assert_eq!(reg[MSD], 0b1000);
        assert!(!intc.is_any_enabled());
    }

    #[test]
    fn enable_is_idempotent() {
        let mut reg = [0u32; 4];
        let intc = unsafe { CavsIntc::new(&mut reg as *mut _ as usize, "cavs-ictl-test") };

        intc.enable(5);
        intc.enable(5);
        intc.disable(5);

        assert!(!intc.is_any_enabled());
    }

    #[test]
    fn any_enabled_tracks_the_whole_child_set() {
        let mut reg = [0u32; 4];
        let intc = unsafe { CavsIntc::new(&mut reg as *mut _ as usize, "cavs-ictl-test") };

        intc.enable(0);
        intc.enable(31);
        intc.disable(0);
        assert!(intc.is_any_enabled());

        intc.disable(31);
        assert!(!intc.is_any_enabled());
    }

    #[test]
    fn pending_filters_masked_children() {
        let mut reg = [0u32; 4];
        let intc = unsafe { CavsIntc::new(&mut reg as *mut _ as usize, "cavs-ictl-test") };

        reg[2] = 0b0110; // children 1 and 2 masked
        reg[3] = 0b0111; // children 0..=2 raised

        assert_eq!(intc.pending(), 0b0001);
    }

    #[test]
    fn init_masks_everything() {
        let mut reg = [0u32; 4];
        let intc = unsafe { CavsIntc::new(&mut reg as *mut _ as usize, "cavs-ictl-test") };

        intc.enable(7);
        unsafe { intc.init().unwrap() };

        assert_eq!(reg[MSD], u32::MAX);
        assert!(!intc.is_any_enabled());
    }
}
