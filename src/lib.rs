//! Parser and deformation pipeline for the MikuMikuDance model family.
//!
//! [`pmx::Model`] is the loaded, immutable model graph; [`Scene`] wraps a
//! model with its per frame state and runs the morph, bone and IK stages;
//! [`vmd::Vmd`] reads the companion motion container.
//!
//! ```no_run
//! use mmd::{Model, Scene};
//!
//! let data = std::fs::read("model.pmx")?;
//! let mut scene = Scene::new(Model::read(&data)?);
//! scene.set_morph_weight(0, 0.5);
//! scene.deform()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub use cgmath;

mod error;
mod handle;
mod reader;
mod shared;
mod text;

pub mod pmx;
pub mod scene;
pub mod vmd;

pub use error::{ModelError, TextError};
pub use handle::Handle;
pub use reader::{Cursor, IndexWidth};
pub use shared::{Quaternion, Vector2, Vector3, Vector4};
pub use text::TextCodec;

pub use pmx::Model;
pub use scene::Scene;
pub use vmd::Vmd;
