//! # Material System
//!
//! ```text
//! (rarity, quality, shaders) ──resolve──► MaterialDescriptor ──pack──► MaterialUniforms
//!                                               │
//!                         TextureSource ──► TextureRequest ──► TextureImage
//! ```
//!
//! The program is fixed at resolve time. Per frame only the `time` uniform
//! changes.

pub mod descriptor;
pub mod resolver;
pub mod shaders;
pub mod texture;

pub use descriptor::{
    BlendMode, MaterialDescriptor, MaterialUniforms, ShaderProgram, TextureFiltering, TextureRef,
    UniformValue,
};
pub use resolver::{filtering_for, program_for, resolve};
pub use shaders::MaterialShaders;
pub use texture::{
    MemoryTextureSource, PendingTextureSource, TextureImage, TextureLoad, TextureRequest,
    TextureResponder, TextureSource,
};
