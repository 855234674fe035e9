// SPDX-License-Identifier: MIT OR Apache-2.0

//! Resource ownership and power/clock bring-up.
//!
//! Before the firmware can drive audio, the DSP has to claim the shared blocks it co-owns with
//! the host (DMA controllers, I2S/DMIC IO, timestamp and M/N dividers), switch itself to the
//! fast clock and keep its power domains from gating.

use {
    super::device_driver::common::MMIODerefWrapper,
    tock_registers::{
        interfaces::{ReadWriteable, Readable, Writeable},
        register_bitfields, register_structs,
        registers::ReadWrite,
    },
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_bitfields! {
    u32,

    DMICLCTL [
        /// Set power active.
        SPA OFFSET(0) NUMBITS(1) [],
        /// Current power active, set by hardware once the domain is up.
        CPA OFFSET(8) NUMBITS(1) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    ResourceAllocRegisterBlock {
        (0x00 => LPGPDMACXO: [ReadWrite<u32>; NUM_LPGPDMAC]),
        (0x0c => DSPIOPO: ReadWrite<u32>),
        (0x10 => GENO: ReadWrite<u32>),
        (0x14 => @END),
    },

    #[allow(non_snake_case)]
    DspShimRegisterBlock {
        (0x00 => __reserved_0),
        (0x78 => CLKCTL: ReadWrite<u32>),
        (0x7c => __reserved_1), // CLKSTS
        (0x90 => PWRCTL: ReadWrite<u32>),
        (0x94 => __reserved_2), // PWRSTS
        (0x98 => @END),
    },

    #[allow(non_snake_case)]
    DmicShimRegisterBlock {
        (0x00 => DMICLCTL: ReadWrite<u32, DMICLCTL::Register>),
        (0x04 => @END),
    }
}

type ResourceAllocRegisters = MMIODerefWrapper<ResourceAllocRegisterBlock>;
type DspShimRegisters = MMIODerefWrapper<DspShimRegisterBlock>;
type DmicShimRegisters = MMIODerefWrapper<DmicShimRegisterBlock>;

// Ownership register encodings. Owner select sits in the top bits, the channel/interface select
// mask in the low bits.
const LPGPDMAC_OSEL_DSP: u32 = 0x3 << 29;
const LPGPDMAC_CHOSEL_ALL: u32 = 0xff;
const DSPIOP_I2S_OWNSEL_DSP: u32 = 0x3f << 8;
const DSPIOP_DMIC_OWNSEL_DSP: u32 = 0x1;
const GENO_MNDIV_OWNER_DSP: u32 = 0x1 << 1;
const GENO_TIMESTAMP_OWNER_DSP: u32 = 0x1 << 2;

// Clock and power control bits in the DSP shim.
const CLKCTL_REQ_FAST_CLK: u32 = 0x1 << 31;
const CLKCTL_OCS_FAST_CLK: u32 = 0x1 << 2;
const PWRCTL_DISABLE_PWR_GATING_DSP0: u32 = 0x1;
const PWRCTL_DISABLE_PWR_GATING_DSP1: u32 = 0x1 << 1;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Number of low-power GP DMA controllers whose ownership is claimed for the DSP.
pub const NUM_LPGPDMAC: usize = 3;

/// The resource-allocation block deciding host/DSP ownership of shared hardware.
pub struct ResourceAlloc {
    registers: ResourceAllocRegisters,
}

/// The DSP shim block carrying clock and power control.
pub struct DspShim {
    registers: DspShimRegisters,
}

/// The DMIC shim block carrying the DMIC power domain handshake.
pub struct DmicShim {
    registers: DmicShimRegisters,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl ResourceAlloc {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { ResourceAllocRegisters::new(mmio_base_addr) },
        }
    }

    /// Claim DSP ownership of the DMA controllers, the I2S and DMIC IO interfaces, and the
    /// timestamp and M/N divider blocks.
    pub fn set_resource_ownership(&self) {
        for index in 0..NUM_LPGPDMAC {
            self.registers.LPGPDMACXO[index].set(LPGPDMAC_OSEL_DSP | LPGPDMAC_CHOSEL_ALL);
        }

        self.registers
            .DSPIOPO
            .set(DSPIOP_I2S_OWNSEL_DSP | DSPIOP_DMIC_OWNSEL_DSP);

        self.registers
            .GENO
            .set(GENO_TIMESTAMP_OWNER_DSP | GENO_MNDIV_OWNER_DSP);
    }
}

impl DspShim {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { DspShimRegisters::new(mmio_base_addr) },
        }
    }

    /// Request the fast clock and disable power gating for both DSP cores.
    pub fn set_power_and_clock(&self) {
        self.registers
            .CLKCTL
            .set(self.registers.CLKCTL.get() | CLKCTL_REQ_FAST_CLK | CLKCTL_OCS_FAST_CLK);

        self.registers.PWRCTL.set(
            self.registers.PWRCTL.get()
                | PWRCTL_DISABLE_PWR_GATING_DSP0
                | PWRCTL_DISABLE_PWR_GATING_DSP1,
        );
    }

}

impl DmicShim {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { DmicShimRegisters::new(mmio_base_addr) },
        }
    }

    /// Power up the DMIC domain.
    ///
    /// Polls the current-power-active bit to completion; the handshake finishes in bounded
    /// hardware-defined time and is not cancellable.
    pub fn power_up(&self) {
        self.registers.DMICLCTL.modify(DMICLCTL::SPA::SET);

        while !self.registers.DMICLCTL.is_set(DMICLCTL::CPA) {
            core::hint::spin_loop();
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
