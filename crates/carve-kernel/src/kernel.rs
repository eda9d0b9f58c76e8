//! A loaded kernel instance.

use tracing::{debug, info};

use crate::csg::BooleanOp;
use crate::error::{KernelError, Result};
use crate::math::{Point3, Vec3};
use crate::mesh::TriangleMesh;
use crate::profile::{KernelProfile, PayloadSource};
use crate::solid::Solid;

/// Handle to a loaded kernel.
///
/// Construction reads and validates the kernel profile; afterwards the
/// handle is immutable and every operation is a pure function of its inputs.
#[derive(Debug, Clone)]
pub struct Kernel {
    profile: KernelProfile,
}

impl Kernel {
    /// Create a kernel from an already validated profile.
    pub fn new(profile: KernelProfile) -> Result<Self> {
        profile.validate()?;
        Ok(Self { profile })
    }

    /// Load the kernel payload from `source`.
    ///
    /// Completes without yielding: a `File` source is read with blocking IO.
    /// It is async so it can sit behind an async engine factory.
    pub async fn load(source: PayloadSource) -> Result<Self> {
        debug!(source = %source.describe(), "loading kernel payload");
        let profile = source.read_profile()?;
        let kernel = Self::new(profile)?;
        info!(
            source = %source.describe(),
            sphere_segments = profile.sphere_segments,
            "kernel ready"
        );
        Ok(kernel)
    }

    /// The profile this kernel was loaded with.
    pub fn profile(&self) -> &KernelProfile {
        &self.profile
    }

    /// Axis-aligned box with minimum corner `origin`.
    pub fn make_box(&self, origin: Point3, size: Vec3) -> Result<Solid> {
        if !size.iter().all(|s| s.is_finite() && *s > 0.0) {
            return Err(KernelError::InvalidInput(format!(
                "box dimensions must be positive, got ({}, {}, {})",
                size.x, size.y, size.z
            )));
        }
        Ok(Solid::cube(size.x, size.y, size.z).translate(origin.x, origin.y, origin.z))
    }

    /// Faceted sphere with vertices on the true sphere.
    pub fn make_sphere(&self, center: Point3, radius: f64) -> Result<Solid> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(KernelError::InvalidInput(format!(
                "sphere radius must be positive, got {radius}"
            )));
        }
        Ok(Solid::sphere(radius, self.profile.sphere_segments)
            .translate(center.x, center.y, center.z))
    }

    /// Boolean difference `a − b`.
    ///
    /// Fails with [`KernelError::Degenerate`] when the result is empty or
    /// its volume does not exceed the profile's `min_volume`.
    pub fn cut(&self, a: &Solid, b: &Solid) -> Result<Solid> {
        let result = a.boolean(b, BooleanOp::Difference, self.profile.epsilon);
        if result.is_empty() {
            return Err(KernelError::Degenerate("cut removed the whole solid".into()));
        }
        let volume = result.volume();
        if !(volume > self.profile.min_volume) {
            return Err(KernelError::Degenerate(format!(
                "cut volume {volume:e} is below {:e}",
                self.profile.min_volume
            )));
        }
        debug!(polygons = result.polygons().len(), volume, "cut complete");
        Ok(result)
    }

    /// Triangulate a solid for display or export.
    pub fn tessellate(&self, solid: &Solid) -> Result<TriangleMesh> {
        let mesh = solid.to_mesh();
        if mesh.is_empty() {
            return Err(KernelError::Degenerate("solid has no faces".into()));
        }
        Ok(mesh)
    }
}
