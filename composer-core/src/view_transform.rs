use cgmath::prelude::*;

/// Smallest allowed scale. Zooming out stops here.
pub const MIN_SCALE: f32 = 0.1;
/// Scale factor of one wheel tick towards the viewer.
pub const ZOOM_IN_FACTOR: f32 = 1.1;
/// Scale factor of one wheel tick away from the viewer.
pub const ZOOM_OUT_FACTOR: f32 = 0.9;

/// Maps composite pixels to display space with a uniform scale and an offset.
/// The composite's top-left corner lands on `offset`.
///
/// Nothing here depends on the composite itself, so the view survives recomposites untouched.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ViewTransform {
    scale: f32,
    pub offset: cgmath::Vector2<f32>,
}
impl Default for ViewTransform {
    fn default() -> Self {
        Self {
            scale: 1.0,
            offset: cgmath::Vector2::zero(),
        }
    }
}

impl ViewTransform {
    #[must_use]
    pub fn scale(&self) -> f32 {
        self.scale
    }
    /// Scale about this center in viewspace such that the center remains in the same spot in the viewport after scaling.
    ///
    /// The factor is reduced as needed to keep the scale at or above [`MIN_SCALE`]. Returns the factor actually applied,
    /// which is `1.0` once the floor is reached.
    pub fn scale_about(&mut self, view_center: cgmath::Point2<f32>, scale_by: f32) -> f32 {
        if !scale_by.is_finite() || scale_by <= 0.0 {
            return 1.0;
        }
        // Land exactly on the floor, rather than a rounding error below it.
        let (new_scale, scale_by) = if self.scale * scale_by < MIN_SCALE {
            (MIN_SCALE, MIN_SCALE / self.scale)
        } else {
            (self.scale * scale_by, scale_by)
        };
        // vec from mouse to top-left
        let local_center = self.offset - view_center.to_vec();

        self.scale = new_scale;
        self.offset = view_center.to_vec() + local_center * scale_by;
        scale_by
    }
    /// One wheel tick of zooming in, anchored at the cursor.
    pub fn zoom_in(&mut self, cursor: cgmath::Point2<f32>) -> f32 {
        self.scale_about(cursor, ZOOM_IN_FACTOR)
    }
    /// One wheel tick of zooming out, anchored at the cursor.
    pub fn zoom_out(&mut self, cursor: cgmath::Point2<f32>) -> f32 {
        self.scale_about(cursor, ZOOM_OUT_FACTOR)
    }
    /// Pan by this displacement in viewspace. Unbounded.
    pub fn pan(&mut self, delta: cgmath::Vector2<f32>) {
        self.offset += delta;
    }
    /// Convert this point in composite space to view space
    #[must_use]
    pub fn project(&self, local_point: cgmath::Point2<f32>) -> cgmath::Point2<f32> {
        cgmath::Point2::from_vec(local_point.to_vec() * self.scale + self.offset)
    }
    /// Convert this point in view space to composite space
    #[must_use]
    pub fn unproject(&self, view_point: cgmath::Point2<f32>) -> cgmath::Point2<f32> {
        // Scale never drops below MIN_SCALE, always invertible.
        cgmath::Point2::from_vec((view_point.to_vec() - self.offset) / self.scale)
    }
    /// On-screen size of a composite of this pixel size.
    #[must_use]
    pub fn display_size(&self, width: u32, height: u32) -> cgmath::Vector2<f32> {
        cgmath::vec2(width as f32, height as f32) * self.scale
    }
}

impl From<ViewTransform> for cgmath::Matrix3<f32> {
    fn from(value: ViewTransform) -> Self {
        let s = value.scale;
        // Column-major, homogeneous 2D.
        #[rustfmt::skip]
        let matrix = cgmath::Matrix3::new(
            s, 0.0, 0.0,
            0.0, s, 0.0,
            value.offset.x, value.offset.y, 1.0,
        );
        matrix
    }
}
