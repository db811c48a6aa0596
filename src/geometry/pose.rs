//! Rigid camera poses tagged with their frame convention.
//!
//! The tracking library reports world-to-camera transforms (T_w2c) while the
//! mapping pipeline consumes camera-to-world transforms (T_c2w). The
//! convention is part of the type, so the only way to go from one to the
//! other is [`Pose::invert`].

use std::fmt;
use std::marker::PhantomData;

use nalgebra::{Matrix3, Matrix3x4, Matrix4, Vector3};

/// Frame convention of a [`Pose`].
pub trait Convention: fmt::Debug + Clone + Copy + PartialEq + Send + Sync + 'static {
    /// Convention obtained by inverting a pose of this convention.
    type Inverse: Convention<Inverse = Self>;
    /// Short label used in logs.
    const NAME: &'static str;
}

/// Maps world points into the camera frame (T_w2c).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorldToCamera;

/// Maps camera points into the world frame (T_c2w).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CameraToWorld;

impl Convention for WorldToCamera {
    type Inverse = CameraToWorld;
    const NAME: &'static str = "T_w2c";
}

impl Convention for CameraToWorld {
    type Inverse = WorldToCamera;
    const NAME: &'static str = "T_c2w";
}

/// 4x4 homogeneous rigid transform `[R | t; 0 0 0 1]`.
///
/// Construction does not check orthonormality of `R`; use
/// [`Pose::is_rigid`] where the source is untrusted.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose<C: Convention> {
    matrix: Matrix4<f64>,
    _convention: PhantomData<C>,
}

pub type WorldToCameraPose = Pose<WorldToCamera>;
pub type CameraToWorldPose = Pose<CameraToWorld>;

impl<C: Convention> Pose<C> {
    pub fn identity() -> Self {
        Self::from_matrix(Matrix4::identity())
    }

    /// Wrap a homogeneous matrix. The bottom row is forced to `(0, 0, 0, 1)`.
    pub fn from_matrix(mut matrix: Matrix4<f64>) -> Self {
        matrix.set_row(3, &nalgebra::RowVector4::new(0.0, 0.0, 0.0, 1.0));
        Self {
            matrix,
            _convention: PhantomData,
        }
    }

    pub fn from_rt(rotation: &Matrix3<f64>, translation: &Vector3<f64>) -> Self {
        let mut matrix = Matrix4::identity();
        matrix.fixed_view_mut::<3, 3>(0, 0).copy_from(rotation);
        matrix.fixed_view_mut::<3, 1>(0, 3).copy_from(translation);
        Self::from_matrix(matrix)
    }

    pub fn matrix(&self) -> &Matrix4<f64> {
        &self.matrix
    }

    pub fn rotation(&self) -> Matrix3<f64> {
        self.matrix.fixed_view::<3, 3>(0, 0).into_owned()
    }

    pub fn translation(&self) -> Vector3<f64> {
        self.matrix.fixed_view::<3, 1>(0, 3).into_owned()
    }

    /// Pose without the homogeneous row.
    pub fn to_3x4(&self) -> Matrix3x4<f64> {
        self.matrix.fixed_view::<3, 4>(0, 0).into_owned()
    }

    /// Inverse transform, carrying the opposite convention.
    pub fn invert(&self) -> Pose<C::Inverse> {
        Pose::from_matrix(invert_pose(&self.matrix))
    }

    /// True if the rotation block is orthonormal with determinant +1.
    pub fn is_rigid(&self, tolerance: f64) -> bool {
        let r = self.rotation();
        let should_be_identity = r.transpose() * r;
        (should_be_identity - Matrix3::identity()).amax() <= tolerance
            && (r.determinant() - 1.0).abs() <= tolerance
    }

    /// Same as [`Convention::NAME`] for this pose.
    pub fn convention(&self) -> &'static str {
        C::NAME
    }
}

/// Invert a rigid transform: `[R | t]^-1 = [R^T | -R^T t]`.
///
/// `R` must be orthonormal; the result is meaningless otherwise.
pub fn invert_pose(pose: &Matrix4<f64>) -> Matrix4<f64> {
    let r_t = pose.fixed_view::<3, 3>(0, 0).transpose();
    let t: Vector3<f64> = pose.fixed_view::<3, 1>(0, 3).into_owned();
    let t_inv = -(r_t * t);

    let mut inv = Matrix4::identity();
    inv.fixed_view_mut::<3, 3>(0, 0).copy_from(&r_t);
    inv.fixed_view_mut::<3, 1>(0, 3).copy_from(&t_inv);
    inv
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::{Rotation3, Unit};
    use rand::{Rng, SeedableRng};
    use rand::rngs::StdRng;

    fn random_pose(rng: &mut StdRng) -> WorldToCameraPose {
        let axis = Unit::new_normalize(Vector3::new(
            rng.gen_range(-1.0..1.0),
            rng.gen_range(-1.0..1.0),
            rng.gen_range(0.1..1.0),
        ));
        let angle = rng.gen_range(-std::f64::consts::PI..std::f64::consts::PI);
        let rotation = Rotation3::from_axis_angle(&axis, angle).into_inner();
        let translation = Vector3::new(
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
            rng.gen_range(-100.0..100.0),
        );
        Pose::from_rt(&rotation, &translation)
    }

    #[test]
    fn test_invert_identity() {
        let pose = WorldToCameraPose::identity();
        let inv = pose.invert();
        assert_eq!(*inv.matrix(), Matrix4::identity());
        assert_eq!(inv.convention(), "T_c2w");
    }

    #[test]
    fn test_double_inversion_is_identity_map() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..100 {
            let pose = random_pose(&mut rng);
            let back: WorldToCameraPose = pose.invert().invert();
            assert_relative_eq!(*back.matrix(), *pose.matrix(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inverse_composes_to_identity() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..50 {
            let pose = random_pose(&mut rng);
            let product = pose.matrix() * pose.invert().matrix();
            assert_relative_eq!(product, Matrix4::identity(), epsilon = 1e-9);
        }
    }

    #[test]
    fn test_inverse_maps_camera_center() {
        // Camera at (1, 2, 3) in the world, rotated 90 degrees about Z.
        let rotation = Rotation3::from_axis_angle(&Vector3::z_axis(), std::f64::consts::FRAC_PI_2)
            .into_inner();
        let center = Vector3::new(1.0, 2.0, 3.0);
        let t_c2w = CameraToWorldPose::from_rt(&rotation, &center);

        let t_w2c = t_c2w.invert();
        let camera_frame = t_w2c.rotation() * center + t_w2c.translation();
        assert_relative_eq!(camera_frame, Vector3::zeros(), epsilon = 1e-12);
        assert_relative_eq!(t_c2w.translation(), center, epsilon = 1e-12);
    }

    #[test]
    fn test_to_3x4_drops_homogeneous_row() {
        let pose = CameraToWorldPose::from_rt(&Matrix3::identity(), &Vector3::new(4.0, 5.0, 6.0));
        let block = pose.to_3x4();
        assert_eq!(block[(0, 3)], 4.0);
        assert_eq!(block[(2, 3)], 6.0);
        assert_eq!(block.fixed_view::<3, 3>(0, 0).into_owned(), Matrix3::identity());
    }

    #[test]
    fn test_is_rigid() {
        let mut rng = StdRng::seed_from_u64(3);
        assert!(random_pose(&mut rng).is_rigid(1e-9));

        let mut scaled = Matrix4::identity();
        scaled[(0, 0)] = 2.0;
        assert!(!WorldToCameraPose::from_matrix(scaled).is_rigid(1e-9));
    }
}
