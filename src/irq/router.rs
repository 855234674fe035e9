// SPDX-License-Identifier: MIT OR Apache-2.0

//! The routing orchestrator.

use super::{
    cascade::{CascadeDescriptor, CascadeDirectory},
    interface::{CoreIrqOps, NextLevelIrq},
    IrqNumber,
};

//--------------------------------------------------------------------------------------------------
// Public Definitions
//--------------------------------------------------------------------------------------------------

/// Drives the per-level mask operations behind a composite enable/disable request.
///
/// Enables walk the hierarchy top-down, the outer gate is opened before any inner cascade logic
/// is touched. Disables walk bottom-up and retire a parent line only once its controller reports
/// no enabled children left. Callers must serialize requests for the same composite number; the
/// router takes no lock of its own.
///
/// All failures are local: a registration whose handle did not resolve is logged and the request
/// is dropped with hardware untouched. Nothing is surfaced as a return value, enable/disable are
/// best-effort hardware configuration steps the caller could not meaningfully retry anyway.
pub struct IrqRouter<'a> {
    core: &'a (dyn CoreIrqOps + Sync),
    directory: &'a CascadeDirectory,
}

//--------------------------------------------------------------------------------------------------
// Public Code
//--------------------------------------------------------------------------------------------------

impl<'a> IrqRouter<'a> {
    /// Create a router over an injected topology and architecture-level primitive.
    pub const fn new(core: &'a (dyn CoreIrqOps + Sync), directory: &'a CascadeDirectory) -> Self {
        Self { core, directory }
    }

    /// Enable the interrupt source addressed by `irq` on every level of the hierarchy.
    pub fn request_enable(&self, irq: IrqNumber) {
        let line = irq.core_line();

        let Some(descriptor) = self.directory.lookup(line) else {
            // Plain interrupt, the core-level unmask is all there is to do.
            self.core.enable_line(line);
            return;
        };

        let Some(controller) = descriptor.controller() else {
            log::debug!("irq {}: cascade controller binding unresolved", irq);
            return;
        };

        let child = irq.cascade_child();

        // Resolve the whole chain before the first register write. A binding found unresolved
        // halfway down would otherwise leave outer levels enabled with nothing to retire them.
        let sub = match (child, irq.sub_child()) {
            (Some(child), Some(sub_child)) => {
                let Some(sub_controller) = self.resolve_sub(irq, descriptor, child) else {
                    return;
                };
                Some((sub_controller, sub_child))
            }
            _ => None,
        };

        // The outer gate must be open before the inner cascade logic is configured.
        self.core.enable_line(line);

        let Some(child) = child else {
            // The number addresses the aggregated line itself.
            return;
        };
        controller.enable(child);

        if let Some((sub_controller, sub_child)) = sub {
            sub_controller.enable(sub_child);
        }
    }

    /// Disable the interrupt source addressed by `irq`, retiring parent lines bottom-up as their
    /// controllers drain.
    pub fn request_disable(&self, irq: IrqNumber) {
        let line = irq.core_line();

        let Some(descriptor) = self.directory.lookup(line) else {
            // Plain interrupt.
            self.core.disable_line(line);
            return;
        };

        let Some(controller) = descriptor.controller() else {
            log::debug!("irq {}: cascade controller binding unresolved", irq);
            return;
        };

        let Some(child) = irq.cascade_child() else {
            self.core.disable_line(line);
            return;
        };

        if let Some(sub_child) = irq.sub_child() {
            let Some(sub_controller) = self.resolve_sub(irq, descriptor, child) else {
                return;
            };

            sub_controller.disable(sub_child);

            // Siblings on the sub-controller keep the whole chain up.
            if sub_controller.is_any_enabled() {
                return;
            }
        }

        controller.disable(child);

        if controller.is_any_enabled() {
            return;
        }

        self.core.disable_line(line);
    }

    /// Resolve the third-level controller behind child line `child`, logging the cases the
    /// request has to be dropped for.
    fn resolve_sub(
        &self,
        irq: IrqNumber,
        descriptor: &CascadeDescriptor,
        child: u8,
    ) -> Option<&'static (dyn NextLevelIrq + Sync)> {
        let Some(sub_descriptor) = descriptor.child(child) else {
            log::debug!("irq {}: no sub-controller registered on child line", irq);
            return None;
        };

        let controller = sub_descriptor.controller();
        if controller.is_none() {
            log::debug!("irq {}: sub-controller binding unresolved", irq);
        }

        controller
    }
}

//--------------------------------------------------------------------------------------------------
// Testing
//--------------------------------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use {
        super::*,
        core::sync::atomic::{AtomicU64, Ordering},
        std::{boxed::Box, sync::Mutex, vec::Vec},
    };

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        CoreEnable(u8),
        CoreDisable(u8),
        ChildEnable(&'static str, u8),
        ChildDisable(&'static str, u8),
    }

    struct EventLog(Mutex<Vec<Event>>);

    impl EventLog {
        fn record(&self, event: Event) {
            self.0.lock().unwrap().push(event);
        }

        fn events(&self) -> Vec<Event> {
            self.0.lock().unwrap().clone()
        }
    }

    struct RecordingCore {
        log: &'static EventLog,
    }

    impl CoreIrqOps for RecordingCore {
        fn enable_line(&self, line: u8) {
            self.log.record(Event::CoreEnable(line));
        }

        fn disable_line(&self, line: u8) {
            self.log.record(Event::CoreDisable(line));
        }
    }

    struct RecordingIntc {
        name: &'static str,
        enabled: AtomicU64,
        log: &'static EventLog,
    }

    impl RecordingIntc {
        fn new(name: &'static str, log: &'static EventLog) -> Self {
            Self {
                name,
                enabled: AtomicU64::new(0),
                log,
            }
        }
    }

    impl NextLevelIrq for RecordingIntc {
        fn enable(&self, child: u8) {
            self.enabled.fetch_or(1 << child, Ordering::Relaxed);
            self.log.record(Event::ChildEnable(self.name, child));
        }

        fn disable(&self, child: u8) {
            self.enabled.fetch_and(!(1 << child), Ordering::Relaxed);
            self.log.record(Event::ChildDisable(self.name, child));
        }

        fn is_any_enabled(&self) -> bool {
            self.enabled.load(Ordering::Relaxed) != 0
        }
    }

    struct Fixture {
        router: IrqRouter<'static>,
        log: &'static EventLog,
        mid: &'static RecordingIntc,
        sub: &'static RecordingIntc,
    }

    /// Core line 2 carries the mid-level controller; its child line 1 carries the sub-controller.
    fn three_level_fixture() -> Fixture {
        let log: &'static EventLog = Box::leak(Box::new(EventLog(Mutex::new(Vec::new()))));
        let mid: &'static RecordingIntc = Box::leak(Box::new(RecordingIntc::new("mid", log)));
        let sub: &'static RecordingIntc = Box::leak(Box::new(RecordingIntc::new("sub", log)));

        let children: &'static [CascadeDescriptor] =
            Box::leak(Box::new([CascadeDescriptor::new(1, Some(sub))]));
        let entries: &'static [CascadeDescriptor] = Box::leak(Box::new([
            CascadeDescriptor::with_children(2, Some(mid), children),
        ]));
        let directory: &'static CascadeDirectory =
            Box::leak(Box::new(CascadeDirectory::new(entries).unwrap()));
        let core: &'static RecordingCore = Box::leak(Box::new(RecordingCore { log }));

        Fixture {
            router: IrqRouter::new(core, directory),
            log,
            mid,
            sub,
        }
    }

    #[test]
    fn non_cascaded_passthrough() {
        let f = three_level_fixture();
        let irq = IrqNumber::direct(9);

        f.router.request_enable(irq);
        f.router.request_disable(irq);

        assert_eq!(
            f.log.events(),
            [Event::CoreEnable(9), Event::CoreDisable(9)]
        );
    }

    #[test]
    fn enable_opens_outer_gate_before_cascade() {
        let f = three_level_fixture();

        f.router.request_enable(IrqNumber::cascaded(2, 3));

        assert_eq!(
            f.log.events(),
            [Event::CoreEnable(2), Event::ChildEnable("mid", 3)]
        );
        assert!(f.mid.is_any_enabled());
    }

    #[test]
    fn three_level_enable_runs_top_down() {
        let f = three_level_fixture();

        f.router.request_enable(IrqNumber::sub_cascaded(2, 1, 5));

        assert_eq!(
            f.log.events(),
            [
                Event::CoreEnable(2),
                Event::ChildEnable("mid", 1),
                Event::ChildEnable("sub", 5),
            ]
        );
        assert!(f.sub.is_any_enabled());
    }

    #[test]
    fn disable_propagates_bottom_up_only_when_level_drains() {
        let f = three_level_fixture();
        let c1 = IrqNumber::cascaded(2, 3);
        let c2 = IrqNumber::cascaded(2, 4);

        f.router.request_enable(c1);
        f.router.request_enable(c2);

        f.router.request_disable(c1);

        // A sibling is still enabled on the mid level, the outer line must survive.
        assert!(f.mid.is_any_enabled());
        assert!(!f.log.events().contains(&Event::CoreDisable(2)));

        f.router.request_disable(c2);

        assert!(!f.mid.is_any_enabled());
        assert_eq!(f.log.events().last(), Some(&Event::CoreDisable(2)));
    }

    #[test]
    fn sub_level_sibling_blocks_all_upward_propagation() {
        let f = three_level_fixture();
        let s1 = IrqNumber::sub_cascaded(2, 1, 5);
        let s2 = IrqNumber::sub_cascaded(2, 1, 6);

        f.router.request_enable(s1);
        f.router.request_enable(s2);

        f.router.request_disable(s1);

        assert!(f.sub.is_any_enabled());
        // Neither the mid-level child nor the core line may be touched.
        assert!(!f.log.events().contains(&Event::ChildDisable("mid", 1)));
        assert!(!f.log.events().contains(&Event::CoreDisable(2)));

        f.router.request_disable(s2);

        // The sub-controller drained, so the disable walks all the way up.
        assert!(!f.sub.is_any_enabled());
        assert!(!f.mid.is_any_enabled());
        assert_eq!(
            f.log.events().last(),
            Some(&Event::CoreDisable(2))
        );
    }

    #[test]
    fn mid_level_sibling_stops_propagation_from_sub_level() {
        let f = three_level_fixture();
        let direct_mid = IrqNumber::cascaded(2, 3);
        let via_sub = IrqNumber::sub_cascaded(2, 1, 0);

        f.router.request_enable(direct_mid);
        f.router.request_enable(via_sub);

        f.router.request_disable(via_sub);

        // The sub-controller drained and its parent child line was retired, but the sibling on
        // the mid level keeps the core line up.
        assert!(!f.sub.is_any_enabled());
        assert!(f.log.events().contains(&Event::ChildDisable("mid", 1)));
        assert!(f.mid.is_any_enabled());
        assert!(!f.log.events().contains(&Event::CoreDisable(2)));
    }

    #[test]
    fn double_enable_needs_single_disable() {
        let f = three_level_fixture();
        let irq = IrqNumber::cascaded(2, 3);

        f.router.request_enable(irq);
        f.router.request_enable(irq);

        f.router.request_disable(irq);

        assert!(!f.mid.is_any_enabled());
        assert_eq!(f.log.events().last(), Some(&Event::CoreDisable(2)));
    }

    #[test]
    fn unresolved_binding_leaves_hardware_untouched() {
        let log: &'static EventLog = Box::leak(Box::new(EventLog(Mutex::new(Vec::new()))));
        let entries: &'static [CascadeDescriptor] =
            Box::leak(Box::new([CascadeDescriptor::new(2, None)]));
        let directory: &'static CascadeDirectory =
            Box::leak(Box::new(CascadeDirectory::new(entries).unwrap()));
        let core: &'static RecordingCore = Box::leak(Box::new(RecordingCore { log }));
        let router = IrqRouter::new(core, directory);

        router.request_enable(IrqNumber::cascaded(2, 3));
        router.request_disable(IrqNumber::cascaded(2, 3));

        assert!(log.events().is_empty());
    }

    #[test]
    fn unresolved_sub_binding_leaves_hardware_untouched_on_enable() {
        let log: &'static EventLog = Box::leak(Box::new(EventLog(Mutex::new(Vec::new()))));
        let mid: &'static RecordingIntc = Box::leak(Box::new(RecordingIntc::new("mid", log)));

        let children: &'static [CascadeDescriptor] =
            Box::leak(Box::new([CascadeDescriptor::new(1, None)]));
        let entries: &'static [CascadeDescriptor] = Box::leak(Box::new([
            CascadeDescriptor::with_children(2, Some(mid), children),
        ]));
        let directory: &'static CascadeDirectory =
            Box::leak(Box::new(CascadeDirectory::new(entries).unwrap()));
        let core: &'static RecordingCore = Box::leak(Box::new(RecordingCore { log }));
        let router = IrqRouter::new(core, directory);

        router.request_enable(IrqNumber::sub_cascaded(2, 1, 5));

        // Neither the core line nor the mid level may be left enabled behind a binding no
        // disable could ever reach.
        assert!(log.events().is_empty());
        assert!(!mid.is_any_enabled());
    }

    #[test]
    fn unresolved_sub_binding_leaves_hardware_untouched_on_disable() {
        let log: &'static EventLog = Box::leak(Box::new(EventLog(Mutex::new(Vec::new()))));
        let mid: &'static RecordingIntc = Box::leak(Box::new(RecordingIntc::new("mid", log)));

        let children: &'static [CascadeDescriptor] =
            Box::leak(Box::new([CascadeDescriptor::new(1, None)]));
        let entries: &'static [CascadeDescriptor] = Box::leak(Box::new([
            CascadeDescriptor::with_children(2, Some(mid), children),
        ]));
        let directory: &'static CascadeDirectory =
            Box::leak(Box::new(CascadeDirectory::new(entries).unwrap()));
        let core: &'static RecordingCore = Box::leak(Box::new(RecordingCore { log }));
        let router = IrqRouter::new(core, directory);

        router.request_disable(IrqNumber::sub_cascaded(2, 1, 5));

        assert!(log.events().is_empty());
    }

    #[test]
    fn end_to_end_two_level_scenario() {
        // Composite id (core line 2, child 3), no other children enabled anywhere.
        let f = three_level_fixture();
        let irq = IrqNumber::cascaded(2, 3);

        f.router.request_enable(irq);
        assert_eq!(
            f.log.events(),
            [Event::CoreEnable(2), Event::ChildEnable("mid", 3)]
        );

        f.router.request_disable(irq);
        assert_eq!(
            f.log.events()[2..],
            [Event::ChildDisable("mid", 3), Event::CoreDisable(2)]
        );
        assert!(!f.mid.is_any_enabled());
    }
}
