use crate::pmx::Names;
use crate::Vector3;
use bitflags::bitflags;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct BoneFlags: u16 {
        /// Destination is a bone index instead of an offset vector.
        const HAS_DESTINATION_BONE = 0x0001;
        const ROTATEABLE = 0x0002;
        const MOVABLE = 0x0004;
        const VISIBLE = 0x0008;
        const USER_HANDLEABLE = 0x0010;
        const HAS_CONSTRAINT = 0x0020;
        const LOCAL_INHERENT = 0x0080;
        const INHERENT_ORIENTATION = 0x0100;
        const INHERENT_TRANSLATION = 0x0200;
        const FIXED_AXIS = 0x0400;
        const LOCAL_AXES = 0x0800;
        const PHYSICS_AFTER_TRANSFORM = 0x1000;
        const EXTERNAL_PARENT = 0x2000;
    }
}

#[derive(Debug, Clone)]
pub enum BoneDestination {
    Bone(i32),
    Offset(Vector3),
}

#[derive(Debug, Clone)]
pub struct LocalAxes {
    pub x: Vector3,
    pub z: Vector3,
}

#[derive(Debug, Clone)]
pub struct Bone {
    pub name: Names,
    pub origin: Vector3,
    pub parent: i32, // -1 == none
    /// Evaluation pass this bone is updated in.
    pub stage: i32,
    pub flags: BoneFlags,
    pub destination: BoneDestination,
    pub inherent_parent: i32, // -1 == none
    pub inherent_coefficient: f32,
    pub fixed_axis: Option<Vector3>,
    pub local_axes: Option<LocalAxes>,
    pub external_parent: i32, // -1 == none
    pub constraint: Option<Constraint>,
}

impl Bone {
    pub fn is_rotateable(&self) -> bool {
        self.flags.contains(BoneFlags::ROTATEABLE)
    }

    pub fn is_movable(&self) -> bool {
        self.flags.contains(BoneFlags::MOVABLE)
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(BoneFlags::VISIBLE)
    }

    pub fn has_inherent_orientation(&self) -> bool {
        self.flags.contains(BoneFlags::INHERENT_ORIENTATION)
    }

    pub fn has_inherent_translation(&self) -> bool {
        self.flags.contains(BoneFlags::INHERENT_TRANSLATION)
    }

    pub fn is_affected_by_physics(&self) -> bool {
        self.flags.contains(BoneFlags::PHYSICS_AFTER_TRANSFORM)
    }
}

/// IK directive attached to a bone; the owning bone is the target the
/// effector is steered towards.
#[derive(Debug, Clone)]
pub struct Constraint {
    pub effector: i32, // -1 == none
    pub iterations: u32,
    /// Maximum rotation per joint per iteration, radians.
    pub angle_limit: f32,
    pub links: Vec<ConstraintJoint>,
}

#[derive(Debug, Clone)]
pub struct ConstraintJoint {
    pub bone: i32, // -1 == none
    pub limit: Option<AngleLimit>,
}

/// Per axis angle bounds in radians, lower <= upper.
#[derive(Debug, Clone)]
pub struct AngleLimit {
    pub lower: Vector3,
    pub upper: Vector3,
}
