//! Piecewise-linear interpolation over a small set of control points.

/// Interpolate `x` against control points `xs` (strictly increasing) and
/// values `ys`. Clamps to the first/last value outside the control range.
///
/// Linear scan; control point sets here are tiny (typically 4).
pub fn lin_interp(x: f32, xs: &[f32], ys: &[f32]) -> f32 {
    assert_eq!(xs.len(), ys.len(), "control point arrays must match");
    assert!(!xs.is_empty(), "control points must be non-empty");

    if x < xs[0] {
        return ys[0];
    }
    if x >= xs[xs.len() - 1] {
        return ys[ys.len() - 1];
    }

    for i in 0..xs.len() - 1 {
        if x >= xs[i] && x < xs[i + 1] {
            let t = (x - xs[i]) / (xs[i + 1] - xs[i]);
            return ys[i] + (ys[i + 1] - ys[i]) * t;
        }
    }

    // The clamps above cover everything outside [xs[0], xs[last]) and the
    // scan covers everything inside it.
    unreachable!("no interval contained x despite clamp checks");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    const FALLOFF_X: [f32; 4] = [-PI, -PI / 3.0, 7.0 * PI / 8.0, PI];
    const FALLOFF_Y: [f32; 4] = [1.0, 0.0, 0.0, 1.0];

    #[test]
    fn test_clamps_below_first_control_point() {
        assert_eq!(lin_interp(-100.0, &FALLOFF_X, &FALLOFF_Y), 1.0);
    }

    #[test]
    fn test_clamps_at_and_above_last_control_point() {
        assert_eq!(lin_interp(PI, &FALLOFF_X, &FALLOFF_Y), 1.0);
        assert_eq!(lin_interp(100.0, &FALLOFF_X, &FALLOFF_Y), 1.0);
    }

    #[test]
    fn test_exact_at_interior_control_points() {
        assert_eq!(lin_interp(-PI / 3.0, &FALLOFF_X, &FALLOFF_Y), 0.0);
        assert_eq!(lin_interp(7.0 * PI / 8.0, &FALLOFF_X, &FALLOFF_Y), 0.0);
    }

    #[test]
    fn test_wave_falloff_endpoints() {
        assert_eq!(lin_interp(-PI, &FALLOFF_X, &FALLOFF_Y), 1.0);
        assert_eq!(lin_interp(PI, &FALLOFF_X, &FALLOFF_Y), 1.0);
    }

    #[test]
    fn test_midpoint_of_segment() {
        let xs = [0.0, 2.0];
        let ys = [0.0, 10.0];
        assert_eq!(lin_interp(1.0, &xs, &ys), 5.0);
    }

    #[test]
    fn test_flat_interior_segment() {
        // Between -pi/3 and 7pi/8 the falloff curve is identically zero
        assert_eq!(lin_interp(0.0, &FALLOFF_X, &FALLOFF_Y), 0.0);
        assert_eq!(lin_interp(1.0, &FALLOFF_X, &FALLOFF_Y), 0.0);
    }

    #[test]
    #[should_panic]
    fn test_mismatched_control_arrays_panic() {
        lin_interp(0.0, &[0.0, 1.0], &[0.0]);
    }
}
