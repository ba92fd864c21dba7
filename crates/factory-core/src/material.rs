//! Material stacks travelling across the grid.

use crate::grid::{Orientation, Position};
use crate::id::{GroupId, ResourceId};
use serde::{Deserialize, Serialize};

/// Largest number of units a single stack can carry.
pub const MAX_STACK: u8 = 3;

/// A stack of 1 to [`MAX_STACK`] identical units moving one pixel per tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Material {
    pub resource: ResourceId,
    pub position: Position,
    pub orientation: Orientation,
    pub quantity: u8,
    /// Held by a robotic arm. Held materials neither move nor interact.
    pub picked_up: bool,
    pub group: Option<GroupId>,
    pub group_slot: Option<u32>,
    /// Render-only offset assigned by the grouping subsystem.
    pub visual_offset: (i8, i8),
}

impl Material {
    /// Quantity is clamped to `1..=MAX_STACK`.
    pub fn new(
        resource: ResourceId,
        position: Position,
        orientation: Orientation,
        quantity: u8,
    ) -> Self {
        Self {
            resource,
            position,
            orientation,
            quantity: quantity.clamp(1, MAX_STACK),
            picked_up: false,
            group: None,
            group_slot: None,
            visual_offset: (0, 0),
        }
    }

    /// Move one pixel along the travel direction. No-op while held.
    pub fn advance(&mut self) {
        if !self.picked_up {
            self.position = self.position.step(self.orientation, 1);
        }
    }

    pub fn is_at_tile_center(&self) -> bool {
        self.position.is_tile_center()
    }

    /// Split one unit off a multi-unit stack. Returns `None` for a single
    /// unit, which must be taken whole.
    pub fn split_one(&mut self) -> Option<Material> {
        if self.quantity <= 1 {
            return None;
        }
        self.quantity -= 1;
        Some(Material::new(self.resource, self.position, self.orientation, 1))
    }
}
