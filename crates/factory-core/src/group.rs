//! Visual stacking groups.
//!
//! When a material first reaches a roller center it either joins the group of
//! a neighbouring material or starts its own. Every member of a group gets a
//! small render offset from a table chosen by group size, so stacked materials
//! stay distinguishable. Groups are stored in an arena; materials hold an
//! optional [`GroupId`].

use crate::id::{GroupId, MaterialId};
use crate::material::Material;
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;

// ---------------------------------------------------------------------------
// Offset tables
// ---------------------------------------------------------------------------

pub const OFFSETS_1_TO_2: [(i8, i8); 2] = [(0, 0), (2, 0)];
pub const OFFSETS_3: [(i8, i8); 3] = [(-2, 0), (0, 2), (2, 0)];
pub const OFFSETS_4: [(i8, i8); 4] = [(-2, 2), (2, 2), (-2, -2), (2, -2)];
pub const OFFSETS_5_TO_9: [(i8, i8); 9] = [
    (0, 0),
    (2, 0),
    (-2, 0),
    (0, -2),
    (2, -2),
    (-2, -2),
    (0, 2),
    (2, 2),
    (-2, 2),
];

/// Slots past this index are never handed out.
pub const MAX_SLOT_SEARCH: u32 = 99;

/// Offset table for a group of `size` members.
pub fn offset_table(size: usize) -> &'static [(i8, i8)] {
    match size {
        0..=2 => &OFFSETS_1_TO_2,
        3 => &OFFSETS_3,
        4 => &OFFSETS_4,
        _ => &OFFSETS_5_TO_9,
    }
}

/// Offset for a slot. Slots wrap every nine positions, then into the table.
pub fn slot_offset(slot: u32, size: usize) -> (i8, i8) {
    let table = offset_table(size);
    table[(slot % 9) as usize % table.len()]
}

// ---------------------------------------------------------------------------
// Group arena
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    members: Vec<MaterialId>,
}

impl Group {
    pub fn members(&self) -> &[MaterialId] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct GroupArena {
    groups: SlotMap<GroupId, Group>,
}

impl GroupArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: GroupId) -> Option<&Group> {
        self.groups.get(id)
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    /// Start a singleton group for `material`.
    pub fn create(
        &mut self,
        material: MaterialId,
        materials: &mut SlotMap<MaterialId, Material>,
    ) -> Option<GroupId> {
        let m = materials.get_mut(material)?;
        let group = self.groups.insert(Group {
            members: vec![material],
        });
        m.group = Some(group);
        m.group_slot = Some(0);
        m.visual_offset = slot_offset(0, 1);
        Some(group)
    }

    /// Add `material` to an existing group and reshuffle every member's
    /// offset for the new size. Returns false if either side is gone.
    pub fn join(
        &mut self,
        group: GroupId,
        material: MaterialId,
        materials: &mut SlotMap<MaterialId, Material>,
    ) -> bool {
        let Some(g) = self.groups.get_mut(group) else {
            return false;
        };
        if !materials.contains_key(material) {
            return false;
        }

        let slot = free_slot(&g.members, materials);
        g.members.push(material);
        if let Some(m) = materials.get_mut(material) {
            m.group = Some(group);
            m.group_slot = slot;
        }

        let size = g.members.len();
        for &member in &g.members {
            if let Some(m) = materials.get_mut(member) {
                m.visual_offset = slot_offset(m.group_slot.unwrap_or(0), size);
            }
        }
        true
    }

    /// Drop a member. Siblings keep their slots; empty groups are discarded.
    pub fn remove_member(&mut self, group: GroupId, material: MaterialId) {
        let Some(g) = self.groups.get_mut(group) else {
            return;
        };
        g.members.retain(|&m| m != material);
        if g.members.is_empty() {
            self.groups.remove(group);
        }
    }
}

/// Lowest slot not taken by any current member.
fn free_slot(members: &[MaterialId], materials: &SlotMap<MaterialId, Material>) -> Option<u32> {
    (0..MAX_SLOT_SEARCH).find(|&slot| {
        !members
            .iter()
            .filter_map(|&id| materials.get(id))
            .any(|m| m.group_slot == Some(slot))
    })
}
