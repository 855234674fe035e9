// SPDX-License-Identifier: MIT OR Apache-2.0

//! The firmware-ready IPC record.
//!
//! When boot completes, the firmware publishes a fixed-layout, byte-packed record into the
//! DSP-initiated mailbox window and rings the host doorbell. The field layout, the sizes and the
//! count and order of the region descriptors are a wire contract with the host driver and must be
//! reproduced byte for byte.

use {
    super::device_driver::common::MMIODerefWrapper,
    bitflags::bitflags,
    core::mem::size_of,
    snafu::Snafu,
    static_assertions::const_assert_eq,
    tock_registers::{interfaces::Writeable, register_structs, registers::ReadWrite},
};

//--------------------------------------------------------------------------------------------------
// Private Definitions
//--------------------------------------------------------------------------------------------------

register_structs! {
    #[allow(non_snake_case)]
    IpcRegisterBlock {
        (0x00 => __reserved_0), // DIPCT, DIPCTE: host-to-DSP direction, unused here
        (0x08 => DIPCI: ReadWrite<u32>),
        (0x0c => DIPCIE: ReadWrite<u32>),
        (0x10 => __reserved_1), // DIPCCTL
        (0x14 => @END),
    }
}

type IpcRegisters = MMIODerefWrapper<IpcRegisterBlock>;

const GLB_TYPE_SHIFT: u32 = 28;
const DIPCI_BUSY: u32 = 0x1 << 31;

const NUM_WINDOWS: usize = 7;

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Global message type of the firmware-ready command.
pub const FW_READY: u32 = 0x7 << GLB_TYPE_SHIFT;

/// Mailbox window geometry shared with the host driver.
pub mod mailbox_map {
    pub const SW_REG_SIZE: u32 = 0x1000;
    pub const DSPBOX_SIZE: u32 = 0x1000;
    pub const HOSTBOX_SIZE: u32 = 0x1000;
    pub const EXCEPTION_SIZE: u32 = 0x100;
    pub const EXCEPTION_OFFSET: u32 = 0x100;
    pub const DEBUG_SIZE: u32 = 0x100;
    pub const STREAM_SIZE: u32 = 0x1000;
    pub const STREAM_OFFSET: u32 = 0x200;
    pub const TRACE_SIZE: u32 = 0x2000;
}

/// Plain message header.
#[repr(C, packed)]
pub struct IpcHdr {
    pub size: u32,
}

/// Command message header.
#[repr(C, packed)]
pub struct IpcCmdHdr {
    pub size: u32,
    pub cmd: u32,
}

/// Firmware version block inside the ready record.
#[repr(C, packed)]
pub struct FwVersion {
    pub hdr: IpcHdr,
    pub major: u16,
    pub minor: u16,
    pub micro: u16,
    pub build: u16,
    pub date: [u8; 12],
    pub time: [u8; 10],
    pub tag: [u8; 6],
    pub abi_version: u32,
    pub reserved: [u32; 4],
}

/// The firmware-ready record, sent when boot has completed.
#[repr(C, packed)]
pub struct FwReady {
    pub hdr: IpcCmdHdr,
    /// DSP-initiated IPC mailbox.
    pub dspbox_offset: u32,
    /// Host-initiated IPC mailbox.
    pub hostbox_offset: u32,
    pub dspbox_size: u32,
    pub hostbox_size: u32,
    pub version: FwVersion,
    pub flags: u64,
    pub reserved: [u32; 4],
}

/// Extended-data kind following the ready record.
#[repr(u32)]
pub enum ExtDataType {
    DmaBuffer = 0,
    Window = 1,
}

/// Host-visible memory region kinds.
#[repr(u32)]
pub enum Region {
    Downbox = 0,
    Upbox = 1,
    Trace = 2,
    Debug = 3,
    Stream = 4,
    Regs = 5,
    Exception = 6,
}

bitflags! {
    /// Access permissions of one memory window region.
    pub struct WindowFlags: u32 {
        const READ = 0b01;
        const WRITE = 0b10;
    }
}

/// Extended-data header.
#[repr(C, packed)]
pub struct ExtDataHdr {
    pub hdr: IpcCmdHdr,
    pub ty: u32,
}

/// One region descriptor of the memory-window table.
#[repr(C, packed)]
pub struct WindowElem {
    pub hdr: IpcHdr,
    pub ty: u32,
    /// Host window the region maps into.
    pub id: u32,
    pub flags: u32,
    pub size: u32,
    /// Offset inside the host window; windows can be partitioned.
    pub offset: u32,
}

/// The memory-window table for IPC, trace and debug regions.
#[repr(C, packed)]
pub struct MemoryWindows {
    pub ext_hdr: ExtDataHdr,
    pub num_windows: u32,
    pub window: [WindowElem; NUM_WINDOWS],
}

// The wire contract: any layout drift is a build error.
const_assert_eq!(size_of::<IpcHdr>(), 4);
const_assert_eq!(size_of::<IpcCmdHdr>(), 8);
const_assert_eq!(size_of::<FwVersion>(), 60);
const_assert_eq!(size_of::<FwReady>(), 108);
const_assert_eq!(size_of::<WindowElem>(), 24);
const_assert_eq!(size_of::<MemoryWindows>(), 184);

/// Errors while publishing into the outbox window.
#[derive(Debug, Snafu)]
pub enum IpcError {
    /// The write would run past the end of the outbox window.
    #[snafu(display("write of {} bytes at offset {} exceeds the outbox window", len, offset))]
    OutOfBounds { offset: usize, len: usize },
}

/// The DSP-to-host outbox window plus the doorbell register pair.
pub struct Mailbox {
    outbox_base: usize,
    outbox_size: usize,
    registers: IpcRegisters,
}

//--------------------------------------------------------------------------------------------------
// Global instances
//--------------------------------------------------------------------------------------------------

/// The ready record published at boot completion.
pub static FW_READY_MSG: FwReady = FwReady {
    hdr: IpcCmdHdr {
        size: size_of::<FwReady>() as u32,
        cmd: FW_READY,
    },
    dspbox_offset: 0,
    hostbox_offset: 0,
    dspbox_size: mailbox_map::DSPBOX_SIZE,
    hostbox_size: mailbox_map::HOSTBOX_SIZE,
    version: FwVersion {
        hdr: IpcHdr {
            size: size_of::<FwVersion>() as u32,
        },
        major: 1,
        minor: 2,
        micro: 3,
        build: 0,
        date: [0; 12],
        time: [0; 10],
        tag: *b"1234\0\0",
        abi_version: 0x1234,
        reserved: [0; 4],
    },
    flags: 0,
    reserved: [0; 4],
};

/// The region-descriptor table following the ready record.
pub static SRAM_WINDOWS: MemoryWindows = MemoryWindows {
    ext_hdr: ExtDataHdr {
        hdr: IpcCmdHdr {
            size: size_of::<MemoryWindows>() as u32,
            cmd: FW_READY,
        },
        ty: ExtDataType::Window as u32,
    },
    num_windows: NUM_WINDOWS as u32,
    window: [
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Regs as u32,
            id: 0,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::SW_REG_SIZE,
            offset: 0,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Upbox as u32,
            id: 0,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::DSPBOX_SIZE,
            offset: mailbox_map::SW_REG_SIZE,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Downbox as u32,
            id: 1,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::HOSTBOX_SIZE,
            offset: 0,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Debug as u32,
            id: 2,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::EXCEPTION_SIZE + mailbox_map::DEBUG_SIZE,
            offset: 0,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Exception as u32,
            id: 2,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::EXCEPTION_SIZE,
            offset: mailbox_map::EXCEPTION_OFFSET,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Stream as u32,
            id: 2,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::STREAM_SIZE,
            offset: mailbox_map::STREAM_OFFSET,
        },
        WindowElem {
            hdr: IpcHdr {
                size: size_of::<WindowElem>() as u32,
            },
            ty: Region::Trace as u32,
            id: 3,
            flags: WindowFlags::empty().bits(),
            size: mailbox_map::TRACE_SIZE,
            offset: 0,
        },
    ],
};

//--------------------------------------------------------------------------------------------------
// Private Code
//--------------------------------------------------------------------------------------------------

/// View a packed record as its raw bytes.
///
/// Sound for the `#[repr(C, packed)]` types above: no padding, every byte initialized.
fn as_bytes<T>(value: &T) -> &[u8] {
    unsafe { core::slice::from_raw_parts((value as *const T).cast::<u8>(), size_of::<T>()) }
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl Mailbox {
    /// Create an instance over an outbox window and the IPC doorbell block.
    ///
    /// # Safety
    ///
    /// - The user must ensure to provide correct window and MMIO base addresses.
    pub const unsafe fn new(outbox_base: usize, outbox_size: usize, ipc_base_addr: usize) -> Self {
        Self {
            outbox_base,
            outbox_size,
            registers: unsafe { IpcRegisters::new(ipc_base_addr) },
        }
    }

    /// Copy raw bytes into the outbox window.
    pub fn write(&self, offset: usize, bytes: &[u8]) -> Result<(), IpcError> {
        let in_bounds = offset
            .checked_add(bytes.len())
            .map(|end| end <= self.outbox_size)
            .unwrap_or(false);
        if !in_bounds {
            return Err(IpcError::OutOfBounds {
                offset,
                len: bytes.len(),
            });
        }

        let base = self.outbox_base as *mut u8;
        for (i, byte) in bytes.iter().enumerate() {
            // Volatile, the host reads this memory behind the compiler's back.
            unsafe { base.add(offset + i).write_volatile(*byte) };
        }

        Ok(())
    }

    /// Ring the host doorbell for the given command.
    pub fn ring_doorbell(&self, cmd: u32) {
        self.registers.DIPCIE.set(0);
        self.registers.DIPCI.set(DIPCI_BUSY | cmd);
    }
}

/// Publish the firmware-ready record and the window table, then signal the host.
pub fn boot_complete(mailbox: &Mailbox) -> Result<(), IpcError> {
    mailbox.write(0, as_bytes(&FW_READY_MSG))?;
    mailbox.write(size_of::<FwReady>(), as_bytes(&SRAM_WINDOWS))?;

    mailbox.ring_doorbell(FW_READY);

    Ok(())
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn le_u32(bytes: &[u8]) -> u32 {
        u32::from_le_bytes(bytes[..4].try_into().unwrap())
    }

    #[test]
    fn boot_complete_publishes_record_and_windows() {
        let mut outbox = [0u8; 0x1000];
        let mut ipc_regs = [0u32; 5];
        let mailbox = unsafe {
            Mailbox::new(
                outbox.as_mut_ptr() as usize,
                outbox.len(),
                &mut ipc_regs as *mut _ as usize,
            )
        };

        boot_complete(&mailbox).unwrap();

        // Ready record at offset 0.
        assert_eq!(le_u32(&outbox[0..]), 108);
        assert_eq!(le_u32(&outbox[4..]), FW_READY);

        // Version block: tag sits behind the header, the four shorts, date and time.
        assert_eq!(&outbox[58..64], b"1234\0\0");

        // Window table immediately after the ready record.
        assert_eq!(le_u32(&outbox[108..]), 184);
        assert_eq!(le_u32(&outbox[112..]), FW_READY);
        assert_eq!(le_u32(&outbox[116..]), ExtDataType::Window as u32);
        assert_eq!(le_u32(&outbox[120..]), 7);

        // First descriptor: the software-register region in host window 0.
        assert_eq!(le_u32(&outbox[124..]), 24);
        assert_eq!(le_u32(&outbox[128..]), Region::Regs as u32);
        assert_eq!(le_u32(&outbox[132..]), 0);

        // Doorbell: DIPCIE cleared, then DIPCI with the busy bit.
        assert_eq!(ipc_regs[3], 0);
        assert_eq!(ipc_regs[2], (0x1 << 31) | FW_READY);
    }

    #[test]
    fn out_of_bounds_writes_are_rejected() {
        let mut outbox = [0u8; 64];
        let mut ipc_regs = [0u32; 5];
        let mailbox = unsafe {
            Mailbox::new(
                outbox.as_mut_ptr() as usize,
                outbox.len(),
                &mut ipc_regs as *mut _ as usize,
            )
        };

        let result = mailbox.write(60, &[0u8; 8]);
        assert!(matches!(
            result,
            Err(IpcError::OutOfBounds { offset: 60, len: 8 })
        ));

        // A too-small outbox publishes nothing.
        assert!(boot_complete(&mailbox).is_err());
        assert_eq!(ipc_regs[2], 0);
    }
}
