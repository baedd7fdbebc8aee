//! Demo camera: a slow orbit around the ocean tile.

use glam::{Mat4, Vec3};

/// Center of the unit-square ocean tile in model space.
const TILE_CENTER: Vec3 = Vec3::new(0.5, 0.0, 0.5);

pub struct OrbitCamera {
    /// Distance from the tile center (world units)
    pub distance: f32,
    /// Eye height above the surface plane
    pub height: f32,
    /// Orbit speed (radians per second)
    pub angular_speed: f32,
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self {
            distance: 1.2,
            height: 0.6,
            angular_speed: 0.15,
        }
    }
}

impl OrbitCamera {
    /// Eye position at `time_s` seconds into the orbit.
    pub fn position(&self, time_s: f32) -> Vec3 {
        let angle = time_s * self.angular_speed;
        TILE_CENTER + Vec3::new(angle.cos() * self.distance, self.height, angle.sin() * self.distance)
    }

    /// View-projection matrix and eye position for `time_s`.
    pub fn view_proj(&self, time_s: f32, aspect_ratio: f32) -> (Mat4, Vec3) {
        let eye = self.position(time_s);
        let view = Mat4::look_at_rh(eye, TILE_CENTER, Vec3::Y);
        let proj = Mat4::perspective_rh(45.0_f32.to_radians(), aspect_ratio, 0.01, 100.0);
        (proj * view, eye)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_stays_above_surface() {
        let camera = OrbitCamera::default();
        for t in 0..100 {
            let eye = camera.position(t as f32 * 0.5);
            assert!(eye.y > 0.0);
        }
    }

    #[test]
    fn test_orbit_keeps_constant_distance() {
        let camera = OrbitCamera::default();
        let center = Vec3::new(0.5, camera.height, 0.5);
        for t in 0..50 {
            let eye = camera.position(t as f32 * 0.3);
            let d = (eye - center).length();
            assert!((d - camera.distance).abs() < 1e-4);
        }
    }

    #[test]
    fn test_view_proj_is_finite_and_nontrivial() {
        let camera = OrbitCamera::default();
        let (view_proj, eye) = camera.view_proj(1.0, 16.0 / 9.0);
        assert_ne!(view_proj, Mat4::IDENTITY);
        assert!(eye.x.is_finite() && eye.y.is_finite() && eye.z.is_finite());
        for col in view_proj.to_cols_array() {
            assert!(col.is_finite());
        }
    }
}
