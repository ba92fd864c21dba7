//! Two-link robotic arm lookup tables.
//!
//! The arm is a planar two-link chain A-B-C with A at the machine center and
//! the held material at C. Link angles follow a fixed 48-frame profile (lift,
//! swing, lower) that is solved once for a downward-facing arm and then
//! mirrored/rotated for the other three orientations. Everything here runs
//! once at engine construction; the tick loop only indexes the tables.

use crate::grid::Orientation;

/// Frames in one pickup-to-dropoff swing.
pub const ARM_FRAMES: u32 = 48;

/// Length of each link, in pixels.
pub const LINK_LENGTH: f64 = 12.0;

/// Solved geometry for one frame. Offsets are relative to the arm's tile center.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ArmPose {
    pub b: (i32, i32),
    pub c: (i32, i32),
    /// Degrees in `0..360`.
    pub theta_ab: u32,
    pub theta_bc: u32,
    pub link_center_ab: (i32, i32),
    pub link_center_bc: (i32, i32),
}

/// Per-orientation, per-frame arm poses.
#[derive(Debug, Clone)]
pub struct ArmKinematics {
    poses: [[ArmPose; ARM_FRAMES as usize + 1]; 4],
}

impl Default for ArmKinematics {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmKinematics {
    pub fn new() -> Self {
        let mut poses = [[ArmPose::default(); ARM_FRAMES as usize + 1]; 4];
        for frame in 1..=ARM_FRAMES {
            let (theta_ab, theta_bc) = frame_angles(frame);
            let b = arc(theta_ab);
            let (bc_x, bc_y) = arc(theta_bc);
            let c = (b.0 + bc_x, b.1 + bc_y);

            for orientation in Orientation::ALL {
                let b = transform(orientation, b);
                let c = transform(orientation, c);
                let offset = angle_offset(orientation);
                poses[orientation.index()][frame as usize] = ArmPose {
                    b,
                    c,
                    theta_ab: normalize_degrees(theta_ab + offset),
                    theta_bc: normalize_degrees(theta_bc + offset),
                    link_center_ab: (b.0 / 2, b.1 / 2),
                    link_center_bc: ((b.0 + c.0) / 2, (b.1 + c.1) / 2),
                };
            }
        }
        Self { poses }
    }

    /// Pose for a frame; frames outside `1..=48` are clamped.
    pub fn pose(&self, orientation: Orientation, frame: u32) -> &ArmPose {
        let frame = frame.clamp(1, ARM_FRAMES) as usize;
        &self.poses[orientation.index()][frame]
    }

    /// Where the held material sits relative to the arm's center.
    pub fn held_offset(&self, orientation: Orientation, frame: u32) -> (i32, i32) {
        self.pose(orientation, frame).c
    }
}

/// Link angles (degrees) for the downward-facing profile.
fn frame_angles(frame: u32) -> (f64, f64) {
    let i = frame as f64;
    match frame {
        // lift
        0..=12 => (90.0 + 5.0 * i, 90.0 - 5.0 * i),
        // swing
        13..=36 => (150.0 + 7.5 * (i - 12.0), 30.0 + 7.5 * (i - 12.0)),
        // lower
        _ => (-30.0 - 5.0 * (i - 36.0), -150.0 + 5.0 * (i - 36.0)),
    }
}

/// Link end point, each axis truncated toward zero.
fn arc(theta_deg: f64) -> (i32, i32) {
    let rad = theta_deg.to_radians();
    (
        (LINK_LENGTH * rad.cos()).trunc() as i32,
        (LINK_LENGTH * rad.sin()).trunc() as i32,
    )
}

fn transform(orientation: Orientation, (x, y): (i32, i32)) -> (i32, i32) {
    match orientation {
        Orientation::Down => (x, y),
        Orientation::Up => (-x, -y),
        Orientation::Left => (y, -x),
        Orientation::Right => (-y, x),
    }
}

fn angle_offset(orientation: Orientation) -> f64 {
    match orientation {
        Orientation::Down => 0.0,
        Orientation::Right => 90.0,
        Orientation::Up => 180.0,
        Orientation::Left => 270.0,
    }
}

fn normalize_degrees(theta: f64) -> u32 {
    (theta.trunc() as i64).rem_euclid(360) as u32
}
