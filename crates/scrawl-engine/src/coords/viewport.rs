use winit::dpi::PhysicalSize;

/// Drawable size in physical pixels.
///
/// Line widths, point sizes and anchored offsets are all pixel quantities; shaders
/// divide them by this size to reach NDC.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Viewport {
    #[inline]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    #[inline]
    pub fn is_valid(self) -> bool {
        self.width > 0.0 && self.height > 0.0 && self.width.is_finite() && self.height.is_finite()
    }

    /// `width / height`, or `1.0` for a degenerate viewport.
    pub fn aspect(self) -> f32 {
        if self.is_valid() {
            self.width / self.height
        } else {
            1.0
        }
    }

    pub fn as_array(self) -> [f32; 2] {
        [self.width, self.height]
    }
}

impl From<PhysicalSize<u32>> for Viewport {
    fn from(size: PhysicalSize<u32>) -> Self {
        Self::new(size.width as f32, size.height as f32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimized_window_is_invalid() {
        let v = Viewport::from(PhysicalSize::new(0u32, 720u32));
        assert!(!v.is_valid());
        assert_eq!(v.aspect(), 1.0);
    }

    #[test]
    fn physical_size_converts() {
        let v = Viewport::from(PhysicalSize::new(1280u32, 720u32));
        assert_eq!(v.as_array(), [1280.0, 720.0]);
        assert!((v.aspect() - 16.0 / 9.0).abs() < 1e-6);
    }
}
