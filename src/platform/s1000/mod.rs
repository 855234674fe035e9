// SPDX-License-Identifier: MIT OR Apache-2.0

//! Intel S1000 platform support.
//!
//! Wires the generic routing core to the concrete hardware: the four cAVS aggregators on their
//! core lines, the DesignWare controller cascaded behind aggregator 1, and the init-time
//! resource/power/clock bring-up recovered at boot.

pub mod clock;
pub mod device_driver;
pub mod ipc;
pub mod power;

use {
    crate::{
        drivers::{self, DeviceDriverDescriptor},
        irq::CascadeDescriptor,
    },
    core::sync::atomic::{AtomicBool, Ordering},
    device_driver::{CavsIntc, DwIntc},
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Physical memory map of the platform.
pub mod memory_map {
    pub mod mmio {
        pub const CAVS_INTC_0_BASE: usize = 0x0007_8800;
        pub const CAVS_INTC_1_BASE: usize = 0x0007_8810;
        pub const CAVS_INTC_2_BASE: usize = 0x0007_8820;
        pub const CAVS_INTC_3_BASE: usize = 0x0007_8830;
        pub const DW_INTC_BASE: usize = 0x0008_1800;

        pub const RESOURCE_ALLOC_BASE: usize = 0x0007_1a60;
        pub const GLOBAL_CONTROL_BASE: usize = 0x0007_1d10;
        pub const DMIC_SHIM_BASE: usize = 0x0007_1e80;
        pub const DSP_SHIM_BASE: usize = 0x0007_1f00;
        pub const MCLK_DIV_CTRL_BASE: usize = 0x0007_8c00;

        pub const IPC_HOST_BASE: usize = 0x0007_1e00;
        pub const MAILBOX_DSPBOX_BASE: usize = 0x0008_e000;
    }
}

/// Core lines the cAVS aggregators are cascaded into.
pub const CAVS_INTC_0_LINE: u8 = 6;
pub const CAVS_INTC_1_LINE: u8 = 10;
pub const CAVS_INTC_2_LINE: u8 = 13;
pub const CAVS_INTC_3_LINE: u8 = 16;

/// Child line of aggregator 1 the DesignWare controller is cascaded into.
pub const DW_INTC_LINE: u8 = 7;

/// Well-known interrupt sources of the platform.
pub mod irq_map {
    use {super::*, crate::irq::IrqNumber};

    pub const IPC_HOST: IrqNumber = IrqNumber::cascaded(CAVS_INTC_0_LINE, 7);
    pub const DMIC: IrqNumber = IrqNumber::cascaded(CAVS_INTC_1_LINE, 6);
    pub const GPDMA_CH0: IrqNumber = IrqNumber::sub_cascaded(CAVS_INTC_1_LINE, DW_INTC_LINE, 16);
    pub const GPDMA_CH1: IrqNumber = IrqNumber::sub_cascaded(CAVS_INTC_1_LINE, DW_INTC_LINE, 17);
}

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

static CAVS_INTC_0: CavsIntc =
    unsafe { CavsIntc::new(memory_map::mmio::CAVS_INTC_0_BASE, "intel,cavs-intc-0") };
static CAVS_INTC_1: CavsIntc =
    unsafe { CavsIntc::new(memory_map::mmio::CAVS_INTC_1_BASE, "intel,cavs-intc-1") };
static CAVS_INTC_2: CavsIntc =
    unsafe { CavsIntc::new(memory_map::mmio::CAVS_INTC_2_BASE, "intel,cavs-intc-2") };
static CAVS_INTC_3: CavsIntc =
    unsafe { CavsIntc::new(memory_map::mmio::CAVS_INTC_3_BASE, "intel,cavs-intc-3") };
static DW_INTC: DwIntc = unsafe { DwIntc::new(memory_map::mmio::DW_INTC_BASE) };

static RESOURCE_ALLOC: power::ResourceAlloc =
    unsafe { power::ResourceAlloc::new(memory_map::mmio::RESOURCE_ALLOC_BASE) };
static DSP_SHIM: power::DspShim = unsafe { power::DspShim::new(memory_map::mmio::DSP_SHIM_BASE) };
static DMIC_SHIM: power::DmicShim =
    unsafe { power::DmicShim::new(memory_map::mmio::DMIC_SHIM_BASE) };
static GLOBAL_CONTROL: clock::GlobalControl =
    unsafe { clock::GlobalControl::new(memory_map::mmio::GLOBAL_CONTROL_BASE) };
static MCLK_CONTROL: clock::MclkControl =
    unsafe { clock::MclkControl::new(memory_map::mmio::MCLK_DIV_CTRL_BASE) };

static MAILBOX: ipc::Mailbox = unsafe {
    ipc::Mailbox::new(
        memory_map::mmio::MAILBOX_DSPBOX_BASE,
        ipc::mailbox_map::DSPBOX_SIZE as usize,
        memory_map::mmio::IPC_HOST_BASE,
    )
};

/// The cascade topology: one registration per cascaded core line, the DesignWare controller as a
/// child of aggregator 1. Built once, never mutated.
static DW_CHILDREN: [CascadeDescriptor; 1] =
    [CascadeDescriptor::new(DW_INTC_LINE, Some(&DW_INTC))];

static CASCADES: [CascadeDescriptor; 4] = [
    CascadeDescriptor::new(CAVS_INTC_0_LINE, Some(&CAVS_INTC_0)),
    CascadeDescriptor::with_children(CAVS_INTC_1_LINE, Some(&CAVS_INTC_1), &DW_CHILDREN),
    CascadeDescriptor::new(CAVS_INTC_2_LINE, Some(&CAVS_INTC_2)),
    CascadeDescriptor::new(CAVS_INTC_3_LINE, Some(&CAVS_INTC_3)),
];

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

/// The platform's cascade topology, ready to be wrapped into a
/// [`crate::irq::CascadeDirectory`].
pub fn cascade_descriptors() -> &'static [CascadeDescriptor] {
    &CASCADES
}

/// Initialize the platform.
///
/// Reads the bootstrap straps, claims resource ownership, brings up power and clocks and
/// registers the interrupt-controller drivers. Idempotent at the call level: the second and
/// later calls fail without touching hardware.
///
/// # Safety
///
/// - Pokes live MMIO registers with system-wide impact; must run exactly once, early at boot.
pub unsafe fn init() -> Result<(), &'static str> {
    static INIT_DONE: AtomicBool = AtomicBool::new(false);
    if INIT_DONE.load(Ordering::Relaxed) {
        return Err("Init already done");
    }

    clock::publish_ref_clock(GLOBAL_CONTROL.read_bootstraps());
    if let Some(freq) = clock::ref_clock_freq() {
        log::info!("Reference clock frequency: {} Hz", freq);
    }

    RESOURCE_ALLOC.set_resource_ownership();
    DSP_SHIM.set_power_and_clock();
    DMIC_SHIM.power_up();
    GLOBAL_CONTROL.power_up_gna();
    MCLK_CONTROL.set_audio_mclk();

    register_intc_drivers();
    unsafe { drivers::driver_manager().init_drivers() };

    INIT_DONE.store(true, Ordering::Relaxed);
    Ok(())
}

/// Publish the firmware-ready record to the host.
///
/// # Safety
///
/// - Writes the live mailbox window and rings the host doorbell; must run after [`init`], once
///   the rest of boot has completed.
pub unsafe fn boot_complete() -> Result<(), ipc::IpcError> {
    ipc::boot_complete(&MAILBOX)
}

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

fn register_intc_drivers() {
    let manager = drivers::driver_manager();

    manager.register_driver(DeviceDriverDescriptor::new(&CAVS_INTC_0, None));
    manager.register_driver(DeviceDriverDescriptor::new(&CAVS_INTC_1, None));
    manager.register_driver(DeviceDriverDescriptor::new(&CAVS_INTC_2, None));
    manager.register_driver(DeviceDriverDescriptor::new(&CAVS_INTC_3, None));
    manager.register_driver(DeviceDriverDescriptor::new(&DW_INTC, None));
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use {super::*, crate::irq::CascadeDirectory};

    #[test]
    fn topology_is_a_valid_directory() {
        let directory = CascadeDirectory::new(cascade_descriptors()).unwrap();

        for line in [
            CAVS_INTC_0_LINE,
            CAVS_INTC_1_LINE,
            CAVS_INTC_2_LINE,
            CAVS_INTC_3_LINE,
        ] {
            assert!(directory.lookup(line).is_some());
        }

        // The DesignWare controller hangs off aggregator 1 only.
        assert!(directory
            .lookup(CAVS_INTC_1_LINE)
            .unwrap()
            .child(DW_INTC_LINE)
            .is_some());
        assert!(directory
            .lookup(CAVS_INTC_0_LINE)
            .unwrap()
            .child(DW_INTC_LINE)
            .is_none());
    }

    #[test]
    fn irq_map_addresses_match_the_topology() {
        assert_eq!(irq_map::DMIC.core_line(), CAVS_INTC_1_LINE);
        assert_eq!(irq_map::DMIC.cascade_child(), Some(6));
        assert_eq!(irq_map::DMIC.sub_child(), None);

        assert_eq!(irq_map::GPDMA_CH0.core_line(), CAVS_INTC_1_LINE);
        assert_eq!(irq_map::GPDMA_CH0.cascade_child(), Some(DW_INTC_LINE));
        assert_eq!(irq_map::GPDMA_CH0.sub_child(), Some(16));
    }
}
