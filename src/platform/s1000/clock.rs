// SPDX-License-Identifier: MIT OR Apache-2.0

//! Reference-clock detection and audio clock outputs.
//!
//! The reference frequency the platform runs from is strapped at reset and latched into the
//! global-control block. It is read exactly once during bring-up and published process-wide;
//! everything else (MCLK outputs, M/N dividers) is derived from it.

use {
    super::device_driver::common::MMIODerefWrapper,
    core::num::NonZeroUsize,
    once_cell::race::OnceNonZeroUsize,
    tock_registers::{
        interfaces::{ReadWriteable, Readable, Writeable},
        register_bitfields, register_structs,
        registers::{ReadOnly, ReadWrite},
    },
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_bitfields! {
    u32,

    STRAPS [
        /// Reference clock selection latched from the bootstrap pins.
        REF_CLK_SEL OFFSET(0) NUMBITS(2) [
            F19p2 = 0b00,
            F24p576 = 0b01,
            F38p4 = 0b10
        ]
    ],

    GNA_POWER_CONTROL [
        /// Set power active.
        SPA OFFSET(0) NUMBITS(1) [],
        /// Current power active, set by hardware once the domain is up.
        CPA OFFSET(8) NUMBITS(1) [],
        /// Clock enable for the GNA block.
        CLK_EN OFFSET(16) NUMBITS(1) []
    ]
}

register_structs! {
    #[allow(non_snake_case)]
    GlobalRegisterBlock {
        (0x00 => STRAPS: ReadOnly<u32, STRAPS::Register>),
        (0x04 => GNA_POWER_CONTROL: ReadWrite<u32, GNA_POWER_CONTROL::Register>),
        (0x08 => @END),
    },

    #[allow(non_snake_case)]
    MclkRegisterBlock {
        (0x00 => MDIVCTRL: ReadWrite<u32>),
        (0x04 => MDIVR: [ReadWrite<u32>; NUM_MCLK_OUTPUTS]),
        (0x0c => @END),
    }
}

type GlobalRegisters = MMIODerefWrapper<GlobalRegisterBlock>;
type MclkRegisters = MMIODerefWrapper<MclkRegisterBlock>;

/// Set once during bootstrap read, immutable afterwards.
static REF_CLOCK_FREQ: OnceNonZeroUsize = OnceNonZeroUsize::new();

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

pub const NUM_MCLK_OUTPUTS: usize = 2;

/// Divider bypass: MCLK output frequency equals the reference clock frequency.
const MDIVR_DIVIDER_BYPASS: u32 = 0x0000_0001;

/// The global-control block: bootstrap straps and GNA power domain.
pub struct GlobalControl {
    registers: GlobalRegisters,
}

/// The MCLK divider control block.
pub struct MclkControl {
    registers: MclkRegisters,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The reference clock frequency in Hz, once the bootstrap read has published it.
pub fn ref_clock_freq() -> Option<u32> {
    REF_CLOCK_FREQ.get().map(|freq| freq.get() as u32)
}

/// Publish the reference clock frequency. The first publication wins; later calls are ignored.
pub fn publish_ref_clock(freq: u32) {
    if let Some(freq) = NonZeroUsize::new(freq as usize) {
        let _ = REF_CLOCK_FREQ.set(freq);
    }
}

impl GlobalControl {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { GlobalRegisters::new(mmio_base_addr) },
        }
    }

    /// Decode the strapped reference clock frequency in Hz.
    ///
    /// Unknown strap values fall back to 38.4 MHz, the only configuration all board revisions
    /// support.
    pub fn read_bootstraps(&self) -> u32 {
        match self.registers.STRAPS.read_as_enum(STRAPS::REF_CLK_SEL) {
            Some(STRAPS::REF_CLK_SEL::Value::F19p2) => 19_200_000,
            Some(STRAPS::REF_CLK_SEL::Value::F24p576) => 24_576_000,
            Some(STRAPS::REF_CLK_SEL::Value::F38p4) | None => 38_400_000,
        }
    }

    /// Power up the GNA block and hand it a clock.
    ///
    /// Polls the current-power-active bit to completion; the handshake finishes in bounded
    /// hardware-defined time and is not cancellable.
    pub fn power_up_gna(&self) {
        self.registers
            .GNA_POWER_CONTROL
            .modify(GNA_POWER_CONTROL::SPA::SET);

        while !self
            .registers
            .GNA_POWER_CONTROL
            .is_set(GNA_POWER_CONTROL::CPA)
        {
            core::hint::spin_loop();
        }

        self.registers
            .GNA_POWER_CONTROL
            .modify(GNA_POWER_CONTROL::CLK_EN::SET);
    }
}

impl MclkControl {
    /// Create an instance.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide a correct MMIO base address.
    pub const unsafe fn new(mmio_base_addr: usize) -> Self {
        Self {
            registers: unsafe { MclkRegisters::new(mmio_base_addr) },
        }
    }

    /// Route the reference clock to all MCLK outputs.
    ///
    /// Dividers go to bypass mode, so the output frequency equals the reference clock frequency.
    pub fn set_audio_mclk(&self) {
        for mclk in 0..NUM_MCLK_OUTPUTS {
            self.registers.MDIVR[mclk].set(MDIVR_DIVIDER_BYPASS);
            self.registers
                .MDIVCTRL
                .set(self.registers.MDIVCTRL.get() | (1 << mclk));
        }
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strap_values_decode_to_frequencies() {
        let mut reg = [0u32; 2];
        let global = unsafe { GlobalControl::new(&mut reg as *mut _ as usize) };

        reg[0] = 0b00;
        assert_eq!(global.read_bootstraps(), 19_200_000);

        reg[0] = 0b01;
        assert_eq!(global.read_bootstraps(), 24_576_000);

        reg[0] = 0b10;
        assert_eq!(global.read_bootstraps(), 38_400_000);

        // Reserved strap value falls back to 38.4 MHz.
        reg[0] = 0b11;
        assert_eq!(global.read_bootstraps(), 38_400_000);
    }

    #[test]
    fn ref_clock_publication_is_set_once() {
        publish_ref_clock(24_576_000);
        publish_ref_clock(19_200_000);

        assert_eq!(ref_clock_freq(), Some(24_576_000));
    }

    #[test]
    fn gna_power_up_sets_spa_and_clock() {
        let mut reg = [0u32; 2];
        let global = unsafe { GlobalControl::new(&mut reg as *mut _ as usize) };

        // Pretend the power domain is already reporting up, otherwise the CPA poll would spin.
        reg[1] = 1 << 8;

        global.power_up_gna();

        assert_eq!(reg[1], (1 << 16) | (1 << 8) | 1);
    }

    #[test]
    fn mclk_outputs_are_bypassed_and_enabled() {
        let mut reg = [0u32; 3];
        let mclk = unsafe { MclkControl::new(&mut reg as *mut _ as usize) };

        mclk.set_audio_mclk();

        assert_eq!(reg[1], MDIVR_DIVIDER_BYPASS);
        assert_eq!(reg[2], MDIVR_DIVIDER_BYPASS);
        assert_eq!(reg[0], 0b11);
    }
}
