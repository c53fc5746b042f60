pub type Float = f32;
pub type Int = i32;
pub type UInt = u32;

pub type Vec3 = vek::Vec3<Float>;

/// Linear interpolation of a single axis.
#[inline]
#[must_use]
pub fn lerp(from: Float, to: Float, t: Float) -> Float {
    from + (to - from) * t
}
