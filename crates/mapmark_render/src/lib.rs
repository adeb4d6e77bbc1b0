//! Types shared between markers and whoever renders them.
//!
//! Nothing in here submits draw calls. Markers only produce matrices and hold on to meshes/textures,
//! a renderer reads them back every frame.
mod bounds;
mod mesh;
mod projection;
mod texture;
mod view;

pub use bounds::BoundingBox;
pub use mesh::{MeshVertex, StyledMesh, UNIT_QUAD};
pub use projection::MapProjection;
pub use texture::{Texture, TextureError};
pub use view::View;
