#![warn(missing_docs)]

//! Polygon CSG kernel for carve.
//!
//! Provides the [`Solid`] type and the [`Kernel`] handle used to build
//! primitives, subtract them, and tessellate the result.
//!
//! # Example
//!
//! ```
//! use carve_kernel::Solid;
//!
//! let cube = Solid::cube(1.0, 1.0, 1.0);
//! let ball = Solid::sphere(0.65, 16).translate(0.5, 0.5, 0.5);
//! let mesh = cube.difference(&ball).to_mesh();
//! assert!(mesh.num_triangles() > 12);
//! ```

pub mod csg;
pub mod error;
pub mod kernel;
pub mod math;
pub mod mesh;
pub mod primitives;
pub mod profile;
pub mod solid;

pub use csg::BooleanOp;
pub use error::{KernelError, Result};
pub use kernel::Kernel;
pub use math::{Point3, Vec3};
pub use mesh::TriangleMesh;
pub use profile::{KernelProfile, PayloadSource, PAYLOAD_NAME};
pub use solid::Solid;
