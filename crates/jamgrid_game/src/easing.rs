use jamgrid_data::math::Float;

/// Maps linear progress in `[0, 1]` to eased progress.
pub type Easing = fn(Float) -> Float;

#[inline]
pub fn linear(t: Float) -> Float {
    t
}

/// Used for camera and highlight transitions.
#[inline]
pub fn ease_in_out_cubic(t: Float) -> Float {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}
