use crate::pmx::{Bone, Constraint, ConstraintJoint, Material, Model, PhysicsJoint, RigidBody, Texture, ToonReference};
use std::ops::Deref;

/// A handle couples an entity with the model containing it.
///
/// Keeping a reference to the model alongside the entity is required since
/// entities reference their neighbors by index into the model's arrays.
#[derive(Debug)]
pub struct Handle<'a, T> {
    model: &'a Model,
    data: &'a T,
}

impl<T> Clone for Handle<'_, T> {
    fn clone(&self) -> Self {
        Handle { ..*self }
    }
}

impl<'a, T> Handle<'a, T> {
    pub(crate) fn new(model: &'a Model, data: &'a T) -> Self {
        Handle { model, data }
    }

    pub fn model(&self) -> &'a Model {
        self.model
    }
}

impl<'a, T> AsRef<T> for Handle<'a, T> {
    fn as_ref(&self) -> &'a T {
        self.data
    }
}

impl<T> Deref for Handle<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.data
    }
}

impl<'a> Handle<'a, Bone> {
    pub fn parent(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.parent)
    }

    pub fn inherent_parent(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.inherent_parent)
    }

    pub fn external_parent(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.external_parent)
    }

    pub fn constraint(&self) -> Option<Handle<'a, Constraint>> {
        self.data
            .constraint
            .as_ref()
            .map(|constraint| Handle::new(self.model, constraint))
    }
}

impl<'a> Handle<'a, Constraint> {
    pub fn effector(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.effector)
    }

    pub fn links(&self) -> impl Iterator<Item = Handle<'a, ConstraintJoint>> + '_ {
        let model = self.model;
        self.data.links.iter().map(move |link| Handle::new(model, link))
    }
}

impl<'a> Handle<'a, ConstraintJoint> {
    pub fn bone(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.bone)
    }
}

impl<'a> Handle<'a, Material> {
    pub fn diffuse_texture(&self) -> Option<&'a Texture> {
        self.model.texture(self.data.diffuse_texture)
    }

    pub fn sphere_texture(&self) -> Option<&'a Texture> {
        self.model.texture(self.data.sphere_texture)
    }

    pub fn toon_texture(&self) -> Option<&'a Texture> {
        match self.data.toon {
            ToonReference::Texture(index) => self.model.texture(index),
            ToonReference::Shared(_) => None,
        }
    }
}

impl<'a> Handle<'a, RigidBody> {
    pub fn bone(&self) -> Option<Handle<'a, Bone>> {
        self.model.bone(self.data.bone)
    }
}

impl<'a> Handle<'a, PhysicsJoint> {
    pub fn body_a(&self) -> Option<Handle<'a, RigidBody>> {
        self.model.rigid_body(self.data.body_a)
    }

    pub fn body_b(&self) -> Option<Handle<'a, RigidBody>> {
        self.model.rigid_body(self.data.body_b)
    }
}
