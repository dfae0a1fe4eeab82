use crate::pmx::Names;
use crate::Vector3;
use num_enum::TryFromPrimitive;

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum ShapeKind {
    Sphere = 0,
    Box = 1,
    Capsule = 2,
}

/// How the rigid body and its bone drive each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum RigidBodyTransform {
    FromBone = 0,
    FromSimulation = 1,
    FromSimulationWithBoneOrientation = 2,
}

/// Collision body descriptor published to the physics collaborator.
#[derive(Debug, Clone)]
pub struct RigidBody {
    pub name: Names,
    pub bone: i32, // -1 == none
    pub collision_group: u8,
    pub collision_mask: u16,
    pub shape: ShapeKind,
    pub size: Vector3,
    pub origin: Vector3,
    /// Euler angles, radians.
    pub orientation: Vector3,
    pub mass: f32,
    pub linear_damping: f32,
    pub angular_damping: f32,
    pub restitution: f32,
    pub friction: f32,
    pub transform: RigidBodyTransform,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, TryFromPrimitive)]
#[repr(u8)]
pub enum JointKind {
    Spring6Dof = 0,
    /// PMX 2.1
    SixDof = 1,
    /// PMX 2.1
    PointToPoint = 2,
    /// PMX 2.1
    ConeTwist = 3,
    /// PMX 2.1
    Slider = 4,
    /// PMX 2.1
    Hinge = 5,
}

/// Constraint between two rigid bodies.
#[derive(Debug, Clone)]
pub struct PhysicsJoint {
    pub name: Names,
    pub kind: JointKind,
    pub body_a: i32, // -1 == none
    pub body_b: i32, // -1 == none
    pub origin: Vector3,
    pub orientation: Vector3,
    pub linear_lower: Vector3,
    pub linear_upper: Vector3,
    pub angular_lower: Vector3,
    pub angular_upper: Vector3,
    pub linear_stiffness: Vector3,
    pub angular_stiffness: Vector3,
}
