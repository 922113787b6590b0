use nalgebra::Unit;

use crate::geometry::{EPSILON, FloatType, HitRecord, Ray, WorldBox, WorldPoint, WorldVector};

use super::Object;

pub struct Sphere {
    pub center: WorldPoint,
    pub radius: FloatType,
}

impl Object for Sphere {
    fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let oc = ray.origin - self.center;
        let b = oc.dot(&ray.direction);
        let c = oc.dot(&oc) - self.radius * self.radius;
        let discriminant = b * b - c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = -b - sqrt_disc;
        let t2 = -b + sqrt_disc;
        let t = if t1 > 0.0 {
            t1
        } else if t2 > 0.0 {
            t2
        } else {
            return None;
        };

        let point = ray.point_at(t);
        let normal = Unit::new_normalize(point - self.center);

        Some(HitRecord { t, point, normal })
    }

    fn bounding_box(&self) -> WorldBox {
        let r_vec = WorldVector::repeat(self.radius);
        WorldBox {
            min: self.center - r_vec,
            max: self.center + r_vec,
        }
    }
}

/// Infinite plane through `point` with the given surface normal.
pub struct Plane {
    pub point: WorldPoint,
    pub normal: Unit<WorldVector>,
}

impl Plane {
    /// Extent of the reported bounding box along each axis. The plane itself
    /// is unbounded.
    const BOUND: FloatType = 1e4;
}

impl Object for Plane {
    fn intersect(&self, ray: &Ray) -> Option<HitRecord> {
        let denominator = ray.direction.dot(&self.normal);
        if denominator.abs() < EPSILON {
            return None;
        }

        let t = (self.point - ray.origin).dot(&self.normal) / denominator;
        if t <= 0.0 {
            return None;
        }

        Some(HitRecord {
            t,
            point: ray.point_at(t),
            normal: self.normal,
        })
    }

    fn bounding_box(&self) -> WorldBox {
        WorldBox {
            min: self.point - WorldVector::repeat(Self::BOUND),
            max: self.point + WorldVector::repeat(Self::BOUND),
        }
    }
}
