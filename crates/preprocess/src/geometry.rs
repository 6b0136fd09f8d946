use crate::error::PreprocessError;

/// 2D affine map `[a b tx; c d ty]` taking `(x, y)` to
/// `(a*x + b*y + tx, c*x + d*y + ty)`.
///
/// Operations are post-concatenated: `t.post_scale(..)` applies the scale
/// after everything already in `t`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AffineTransform {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Default for AffineTransform {
    fn default() -> Self {
        Self::identity()
    }
}

impl AffineTransform {
    pub const fn identity() -> Self {
        Self {
            a: 1.0,
            b: 0.0,
            c: 0.0,
            d: 1.0,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn post_translate(mut self, dx: f32, dy: f32) -> Self {
        self.tx += dx;
        self.ty += dy;
        self
    }

    pub fn post_scale(mut self, sx: f32, sy: f32) -> Self {
        self.a *= sx;
        self.b *= sx;
        self.tx *= sx;
        self.c *= sy;
        self.d *= sy;
        self.ty *= sy;
        self
    }

    /// Rotate about the origin by a multiple of 90 degrees.
    pub fn post_rotate(self, degrees: i32) -> Result<Self, PreprocessError> {
        let (cos, sin) = quarter_turn(degrees)?;
        Ok(Self {
            a: cos * self.a - sin * self.c,
            b: cos * self.b - sin * self.d,
            tx: cos * self.tx - sin * self.ty,
            c: sin * self.a + cos * self.c,
            d: sin * self.b + cos * self.d,
            ty: sin * self.tx + cos * self.ty,
        })
    }

    #[inline]
    pub fn map_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse map, or `None` when the matrix is singular.
    pub fn invert(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let a = self.d / det;
        let b = -self.b / det;
        let c = -self.c / det;
        let d = self.a / det;

        Some(Self {
            a,
            b,
            c,
            d,
            tx: -(a * self.tx + b * self.ty),
            ty: -(c * self.tx + d * self.ty),
        })
    }

    /// True when there is no rotation or shear component.
    pub fn is_axis_aligned(&self) -> bool {
        self.b == 0.0 && self.c == 0.0
    }
}

/// Exact `(cos, sin)` for a multiple of 90 degrees.
fn quarter_turn(degrees: i32) -> Result<(f32, f32), PreprocessError> {
    if degrees % 90 != 0 {
        return Err(PreprocessError::InvalidRotation(degrees));
    }
    Ok(match (degrees / 90).rem_euclid(4) {
        0 => (1.0, 0.0),
        1 => (0.0, 1.0),
        2 => (-1.0, 0.0),
        _ => (0.0, -1.0),
    })
}

/// Build the transform taking a `src_width x src_height` frame into a
/// `dst_width x dst_height` frame.
///
/// With a non-zero rotation the source is rotated about its center and the
/// result is centered in the destination. With `maintain_aspect_ratio` the
/// larger of the two axis scales is used for both axes, so the destination is
/// completely filled and the overflowing axis is cropped.
pub fn build_transform(
    src_width: u32,
    src_height: u32,
    dst_width: u32,
    dst_height: u32,
    rotation_degrees: i32,
    maintain_aspect_ratio: bool,
) -> Result<AffineTransform, PreprocessError> {
    if src_width == 0 || src_height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: src_width,
            height: src_height,
        });
    }
    if dst_width == 0 || dst_height == 0 {
        return Err(PreprocessError::InvalidDimensions {
            width: dst_width,
            height: dst_height,
        });
    }

    let mut transform = AffineTransform::identity();

    if rotation_degrees != 0 {
        transform = transform
            .post_translate(-(src_width as f32) / 2.0, -(src_height as f32) / 2.0)
            .post_rotate(rotation_degrees)?;
    }

    let transpose = (rotation_degrees.unsigned_abs() + 90) % 180 == 0;
    let (in_width, in_height) = if transpose {
        (src_height, src_width)
    } else {
        (src_width, src_height)
    };

    if in_width != dst_width || in_height != dst_height {
        let scale_x = dst_width as f32 / in_width as f32;
        let scale_y = dst_height as f32 / in_height as f32;

        transform = if maintain_aspect_ratio {
            let scale = scale_x.max(scale_y);
            transform.post_scale(scale, scale)
        } else {
            transform.post_scale(scale_x, scale_y)
        };
    }

    if rotation_degrees != 0 {
        transform = transform.post_translate(dst_width as f32 / 2.0, dst_height as f32 / 2.0);
    }

    tracing::trace!(
        src_width,
        src_height,
        dst_width,
        dst_height,
        rotation_degrees,
        maintain_aspect_ratio,
        ?transform,
        "Built frame transform"
    );

    Ok(transform)
}
