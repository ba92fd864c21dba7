//! Teleporter channel pairing.
//!
//! A teleporter is active when it is the only machine of its role (input or
//! output) on its channel. Activation is informational: routing always picks
//! the first matching output in machine order, active or not.

use crate::catalog::MachineKind;
use crate::id::MachineId;
use crate::machine::Machine;
use slotmap::SlotMap;
use std::collections::BTreeMap;

/// Recompute every teleporter's `active` flag.
pub fn refresh_activation(machines: &mut SlotMap<MachineId, Machine>) {
    let mut counts: BTreeMap<(MachineKind, u32), usize> = BTreeMap::new();
    for machine in machines.values() {
        if let Some(channel) = machine.teleporter().and_then(|t| t.channel) {
            *counts.entry((machine.kind, channel)).or_insert(0) += 1;
        }
    }
    for machine in machines.values_mut() {
        let kind = machine.kind;
        if let Some(t) = machine.teleporter_mut() {
            t.active = t
                .channel
                .is_some_and(|c| counts.get(&(kind, c)).copied() == Some(1));
        }
    }
}

/// First output in `order` listening on `channel`.
pub fn find_output(
    machines: &SlotMap<MachineId, Machine>,
    order: &[MachineId],
    channel: u32,
) -> Option<MachineId> {
    order.iter().copied().find(|&id| {
        machines.get(id).is_some_and(|m| {
            m.kind == MachineKind::TeleporterOutput
                && m.teleporter().and_then(|t| t.channel) == Some(channel)
        })
    })
}
