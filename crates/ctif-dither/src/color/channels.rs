//! Arithmetic on `[f32; 3]` colour triples.

/// Component-wise `a + b`.
#[inline]
pub(crate) fn add(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] + b[0], a[1] + b[1], a[2] + b[2]]
}

/// Component-wise `a - b`.
#[inline]
pub(crate) fn sub(a: [f32; 3], b: [f32; 3]) -> [f32; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

#[inline]
pub(crate) fn scale(a: [f32; 3], factor: f32) -> [f32; 3] {
    a.map(|c| c * factor)
}

/// Clamp every channel into `0.0..=255.0`.
#[inline]
pub(crate) fn clamp(a: [f32; 3]) -> [f32; 3] {
    a.map(|c| c.clamp(0.0, 255.0))
}
