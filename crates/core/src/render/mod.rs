//! Drawing surface abstraction used by image sequence scrubbers.

/// Width and height in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// A size with a zero or non-finite side cannot be drawn into.
    pub fn is_empty(&self) -> bool {
        let positive = |side: f64| side.is_finite() && side > 0.0;
        !(positive(self.width) && positive(self.height))
    }
}

/// Axis aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_size(size: Size) -> Self {
        Self::new(0.0, 0.0, size.width, size.height)
    }
}

/// A decoded (or decoding) still frame.
pub trait FrameImage {
    fn is_complete(&self) -> bool;

    fn natural_size(&self) -> Size;

    /// Complete and non-empty. Failed loads report complete with a zero size.
    fn is_drawable(&self) -> bool {
        self.is_complete() && self.natural_size().width > 0.0
    }
}

/// Canvas-like surface an image sequence is drawn onto.
///
/// Implementations own the backing store; the scrubber only issues sizing and
/// blit commands.
pub trait FrameCanvas {
    type Image: FrameImage;

    /// Size of the element's CSS box as laid out.
    fn bounding_size(&self) -> Size;

    /// Drawable client area in CSS pixels.
    fn client_size(&self) -> Size;

    fn device_pixel_ratio(&self) -> f64;

    /// Resizes the backing store. Resets any transform on the context.
    fn set_backing_size(&mut self, width: u32, height: u32);

    /// Sets an absolute uniform scale on the drawing context.
    fn set_scale(&mut self, factor: f64);

    fn clear(&mut self, area: Rect);

    fn draw_image(&mut self, image: &Self::Image, dest: Rect);
}

/// Backing store dimensions for a CSS box at the given pixel ratio.
pub fn backing_size(css: Size, device_pixel_ratio: f64) -> (u32, u32) {
    let ratio = effective_pixel_ratio(device_pixel_ratio);
    ((css.width * ratio) as u32, (css.height * ratio) as u32)
}

pub fn effective_pixel_ratio(device_pixel_ratio: f64) -> f64 {
    if device_pixel_ratio.is_finite() && device_pixel_ratio > 0.0 {
        device_pixel_ratio
    } else {
        1.0
    }
}

/// Destination rectangle that covers `surface` with `image`, preserving the
/// image's aspect ratio and centring the overflowing axis.
pub fn cover_fit(surface: Size, image: Size) -> Rect {
    if surface.is_empty() || image.is_empty() {
        return Rect::from_size(surface);
    }

    let surface_ratio = surface.width / surface.height;
    let image_ratio = image.width / image.height;

    if surface_ratio > image_ratio {
        let height = surface.width / image_ratio;
        Rect::new(0.0, (surface.height - height) / 2.0, surface.width, height)
    } else {
        let width = surface.height * image_ratio;
        Rect::new((surface.width - width) / 2.0, 0.0, width, surface.height)
    }
}

/// Clears `canvas` and draws `image` cover-fitted into its client area.
/// Does nothing while the canvas has no client area.
pub fn draw_cover<C: FrameCanvas>(canvas: &mut C, image: &C::Image) -> bool {
    let surface = canvas.client_size();
    if surface.is_empty() {
        return false;
    }

    let dest = cover_fit(surface, image.natural_size());
    canvas.clear(Rect::from_size(surface));
    canvas.draw_image(image, dest);
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_surface_stretches_width_and_centres_vertically() {
        let dest = cover_fit(Size::new(400.0, 100.0), Size::new(200.0, 100.0));
        assert_eq!(dest, Rect::new(0.0, -50.0, 400.0, 200.0));
    }

    #[test]
    fn tall_surface_stretches_height_and_centres_horizontally() {
        let dest = cover_fit(Size::new(100.0, 400.0), Size::new(100.0, 100.0));
        assert_eq!(dest, Rect::new(-150.0, 0.0, 400.0, 400.0));
    }

    #[test]
    fn matching_ratio_fills_exactly() {
        let dest = cover_fit(Size::new(320.0, 180.0), Size::new(1920.0, 1080.0));
        assert!((dest.width - 320.0).abs() < 1e-9);
        assert!((dest.height - 180.0).abs() < 1e-9);
        assert!(dest.x.abs() < 1e-9 && dest.y.abs() < 1e-9);
    }

    #[test]
    fn backing_store_scales_with_pixel_ratio() {
        assert_eq!(backing_size(Size::new(300.5, 150.0), 2.0), (601, 300));
        assert_eq!(backing_size(Size::new(300.0, 150.0), 0.0), (300, 150));
        assert_eq!(backing_size(Size::new(300.0, 150.0), f64::NAN), (300, 150));
    }
}
