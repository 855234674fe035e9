// SPDX-License-Identifier: MIT OR Apache-2.0

//! DesignWare interrupt controller.
//!
//! A DW_apb_ictl instance cascaded into one child line of a cAVS aggregator, fanning out up to 64
//! further sources. Unlike the aggregator's write-1 mask ports, this block is programmed by
//! read-modify-write on the `INTEN`/`INTMASK` pair, so the enabled-children signal is read
//! straight back from `INTEN`.

use {
    super::common::MMIODerefWrapper,
    crate::{
        drivers, irq,
        sync::{interface::Mutex, NullLock},
    },
    tock_registers::{
        interfaces::{Readable, Writeable},
        register_structs,
        registers::{ReadOnly, ReadWrite},
    },
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_structs! {
    #[allow(non_snake_case)]
    RegisterBlock {
        (0x00 => INTEN_L: ReadWrite<u32>),
        (0x04 => INTEN_H: ReadWrite<u32>),
        (0x08 => INTMASK_L: ReadWrite<u32>),
        (0x0c => INTMASK_H: ReadWrite<u32>),
        (0x10 => __reserved_0), // INTFORCE, RAWSTATUS, STATUS, MASKSTATUS: unused
        (0x30 => FINALSTATUS_L: ReadOnly<u32>),
        (0x34 => FINALSTATUS_H: ReadOnly<u32>),
        (0x38 => @END),
    }
}

type Registers = MMIODerefWrapper<RegisterBlock>;

struct DwIntcInner {
    registers: Registers,
}

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Representation of the DesignWare interrupt controller.
pub struct DwIntc {
    inner: NullLock<DwIntcInner>,
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

impl DwIntcInner {
    const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { Registers::new(mmio_base_addr) },
        }
    }

    fn enable(&mut self, child: u8) {
        debug_assert!(child < 64);

        if child < 32 {
            let bit = 1u32 << child;
            self.registers.INTEN_L.set(self.registers.INTEN_L.get() | bit);
            self.registers
                .INTMASK_L
                .set(self.registers.INTMASK_L.get() & !bit);
        } else {
            let bit = 1u32 << (child - 32);
            self.registers.INTEN_H.set(self.registers.INTEN_H.get() | bit);
            self.registers
                .INTMASK_H
                .set(self.registers.INTMASK_H.get() & !bit);
        }
    }

    fn disable(&mut self, child: u8) {
        debug_assert!(child < 64);

        if child < 32 {
            let bit = 1u32 << child;
            self.registers
                .INTEN_L
                .set(self.registers.INTEN_L.get() & !bit);
            self.registers
                .INTMASK_L
                .set(self.registers.INTMASK_L.get() | bit);
        } else {
            let bit = 1u32 << (child - 32);
            self.registers
                .INTEN_H
                .set(self.registers.INTEN_H.get() & !bit);
            self.registers
                .INTMASK_H
                .set(self.registers.INTMASK_H.get() | bit);
        }
    }

    fn is_any_enabled(&self) -> bool {
        self.registers.INTEN_L.get() != 0 || self.registers.INTEN_H.get() != 0
    }

    fn mask_all(&mut self) {
        self.registers.INTEN_L.set(0);
        self.registers.INTEN_H.set(0);
        self.registers.INTMASK_L.set(u32::MAX);
        self.registers.INTMASK_H.set(u32::MAX);
    }

    fn pending(&self) -> u64 {
        let low = self.registers.FINALSTATUS_L.get() as u64;
        let high = self.registers.FINALSTATUS_H.get() as u64;

        (high << 32) | low
    }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl DwIntc {
    pub const COMPATIBLE: &'static str = "snps,dw-apb-ictl";

    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            inner: NullLock::new(unsafe { DwIntcInner::new(mmio_base_addr) }),
        }
    }

    /// Bitmask of child lines raised after enable and mask gating.
    pub fn pending(&self) -> u64 {
        self.inner.lock(|inner| inner.pending())
    }
}

//--------------------------------------------------------------------------------------------------
// OS Interface Code
//--------------------------------------------------------------------------------------------------

impl irq::interface::NextLevelIrq for DwIntc {
    fn enable(&self, child: u8) {
        self.inner.lock(|inner| inner.enable(child));
    }

    fn disable(&self, child: u8) {
        self.inner.lock(|inner| inner.disable(child));
    }

    fn is_any_enabled(&self) -> bool {
        self.inner.lock(|inner| inner.is_any_enabled())
    }
}

impl drivers::interface::DeviceDriver for DwIntc {
    fn compatible(&self) -> &'static str {
        Self::COMPATIBLE
    }

    unsafe fn init(&self) -> Result<(), &'static str> {
        self.inner.lock(|inner| inner.mask_all());

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
