// SPDX-License-Identifier: MIT OR Apache-2.0

//! The cascade directory: which controller hangs off which line.

use {super::interface::NextLevelIrq, snafu::Snafu};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// One cascade registration: a controller fanning out the given parent line.
///
/// `controller` is `None` when the handle failed to resolve during init-time acquisition. The
/// registration is still part of the topology then; the router logs and drops requests for it
/// instead of treating the line as a plain interrupt.
///
/// `children` lists sub-controllers hanging off child lines of this controller, keyed by child
/// line. The structure is recursive, so a deeper hierarchy is wired the same way.
pub struct CascadeDescriptor {
    line: u8,
    controller: Option<&'static (dyn NextLevelIrq + Sync)>,
    children: &'static [CascadeDescriptor],
}

/// Errors while validating a cascade topology.
#[derive(Debug, Snafu)]
pub enum DirectoryError {
    /// Two registrations claim the same parent line on one level.
    #[snafu(display("more than one cascade registration for line {}", line))]
    DuplicateLine { line: u8 },
}

/// Maps a core interrupt line to the cascade controller responsible for it.
///
/// Built once at startup from the platform's static topology and injected into the
/// [`crate::irq::IrqRouter`]; never mutated afterwards. Lines without an entry are plain
/// interrupts handled by the architecture-level controller alone.
pub struct CascadeDirectory {
    entries: &'static [CascadeDescriptor],
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl CascadeDescriptor {
    /// A registration without sub-controllers.
    pub const fn new(line: u8, controller: Option<&'static (dyn NextLevelIrq + Sync)>) -> Self {
        Self {
            line,
            controller,
            children: &[],
        }
    }

    /// A registration whose controller itself cascades into further sub-controllers.
    pub const fn with_children(
        line: u8,
        controller: Option<&'static (dyn NextLevelIrq + Sync)>,
        children: &'static [CascadeDescriptor],
    ) -> Self {
        Self {
            line,
            controller,
            children,
        }
    }

    /// The parent line this controller fans out.
    pub const fn line(&self) -> u8 {
        self.line
    }

    /// The controller handle, if acquisition resolved it.
    pub fn controller(&self) -> Option<&'static (dyn NextLevelIrq + Sync)> {
        self.controller
    }

    /// The sub-controller registered on the given child line of this controller.
    pub fn child(&self, line: u8) -> Option<&CascadeDescriptor> {
        self.children.iter().find(|d| d.line == line)
    }
}

impl CascadeDirectory {
    /// Validate a topology and wrap it for lookup.
    ///
    /// At most one registration per line is allowed, on every level.
    pub fn new(entries: &'static [CascadeDescriptor]) -> Result<Self, DirectoryError> {
        Self::check_unique_lines(entries)?;

        Ok(Self { entries })
    }

    /// Look up the cascade controller registered for a core line.
    ///
    /// `None` means the line is a plain, non-cascaded interrupt.
    pub fn lookup(&self, core_line: u8) -> Option<&CascadeDescriptor> {
        self.entries.iter().find(|d| d.line == core_line)
    }

    fn check_unique_lines(entries: &[CascadeDescriptor]) -> Result<(), DirectoryError> {
        for (i, entry) in entries.iter().enumerate() {
            if entries[..i].iter().any(|d| d.line == entry.line) {
                return Err(DirectoryError::DuplicateLine { line: entry.line });
            }
            Self::check_unique_lines(entry.children)?;
        }

        Ok(())
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------
