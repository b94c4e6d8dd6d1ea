//! Interpolation helpers:
//! - lerp_f32
//! - hermite (cubic Hermite segment value + derivative)
//! - ease_in_out (cubic-bezier timing, CSS `ease-in-out` control points)

/// Default cubic-bezier control points (x1, y1, x2, y2).
const EASE_IN_OUT: [f32; 4] = [0.42, 0.0, 0.58, 1.0];

/// Linear interpolation of scalars.
#[inline]
pub fn lerp_f32(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Cubic Hermite segment over an interval of width `width`.
///
/// `p0`/`p1` are end values, `m0`/`m1` end derivatives with respect to the
/// outer parameter (not `t`). Returns `(value, d value / d outer)`.
#[inline]
pub fn hermite(p0: f32, m0: f32, p1: f32, m1: f32, t: f32, width: f32) -> (f32, f32) {
    let t2 = t * t;
    let t3 = t2 * t;
    let h00 = 2.0 * t3 - 3.0 * t2 + 1.0;
    let h10 = t3 - 2.0 * t2 + t;
    let h01 = -2.0 * t3 + 3.0 * t2;
    let h11 = t3 - t2;
    let value = h00 * p0 + h10 * width * m0 + h01 * p1 + h11 * width * m1;

    let d00 = 6.0 * t2 - 6.0 * t;
    let d10 = 3.0 * t2 - 4.0 * t + 1.0;
    let d01 = -6.0 * t2 + 6.0 * t;
    let d11 = 3.0 * t2 - 2.0 * t;
    let dvalue_dt = d00 * p0 + d10 * width * m0 + d01 * p1 + d11 * width * m1;
    let derivative = if width > 0.0 { dvalue_dt / width } else { 0.0 };
    (value, derivative)
}

/// Cubic Bezier basis function
#[inline]
fn cubic_bezier(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    u * u * u * p0 + 3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t * p3
}

#[inline]
fn cubic_bezier_derivative(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let u = 1.0 - t;
    3.0 * u * u * (p1 - p0) + 6.0 * u * t * (p2 - p1) + 3.0 * t * t * (p3 - p2)
}

/// Invert the x bezier by bisection; x1/x2 in [0,1] keep x monotonic.
#[inline]
fn solve_bezier_x(t: f32, x1: f32, x2: f32) -> f32 {
    let mut lo = 0.0f32;
    let mut hi = 1.0f32;
    let mut mid = t;
    for _ in 0..24 {
        let x = cubic_bezier(0.0, x1, x2, 1.0, mid);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
        mid = 0.5 * (lo + hi);
    }
    mid
}

/// Eased progress for `t` in [0,1].
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let [x1, y1, x2, y2] = EASE_IN_OUT;
    let t = t.clamp(0.0, 1.0);
    let s = solve_bezier_x(t, x1, x2);
    cubic_bezier(0.0, y1, y2, 1.0, s)
}

/// Eased progress and its derivative with respect to `t`.
pub fn ease_in_out_with_derivative(t: f32) -> (f32, f32) {
    let [x1, y1, x2, y2] = EASE_IN_OUT;
    let t = t.clamp(0.0, 1.0);
    let s = solve_bezier_x(t, x1, x2);
    let eased = cubic_bezier(0.0, y1, y2, 1.0, s);
    let dx_ds = cubic_bezier_derivative(0.0, x1, x2, 1.0, s);
    let dy_ds = cubic_bezier_derivative(0.0, y1, y2, 1.0, s);
    let deriv = if dx_ds.abs() > 1e-6 {
        dy_ds / dx_ds
    } else {
        0.0
    };
    (eased, deriv)
}
