pub mod primitives;

use crate::geometry::{HitRecord, Ray, WorldBox};

/// Renderable object
pub trait Object {
    fn intersect(&self, ray: &Ray) -> Option<HitRecord>;
    fn bounding_box(&self) -> WorldBox;
}

/// Closest-hit over a homogeneous group of objects.
impl<O: Object> Object for Vec<O> {
    fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        self.iter()
            .filter_map(|object| object.intersect(ray))
            .min_by(|a, b| a.t.total_cmp(&b.t))
    }

    fn bounding_box(&self) -> WorldBox {
        self.iter()
            .map(|object| object.bounding_box())
            .reduce(|a, b| a.union(&b))
            .unwrap_or(WorldBox {
                min: crate::geometry::WorldPoint::origin(),
                max: crate::geometry::WorldPoint::origin(),
            })
    }
}

pub struct Scene<O: Object> {
    pub object: O,
}

impl<O: Object> Scene<O> {
    /// One-time preparation before workers start. The scene is read-only for
    /// the rest of the render.
    pub fn pre_process(&mut self) {
        let bounds = self.object.bounding_box();
        log::info!(
            "scene bounds: ({:.2}, {:.2}, {:.2}) - ({:.2}, {:.2}, {:.2})",
            bounds.min.x,
            bounds.min.y,
            bounds.min.z,
            bounds.max.x,
            bounds.max.y,
            bounds.max.z,
        );
    }
}
