//! Square RGB pixel buffer plus the raster primitives the renderer needs.
//!
//! All primitives take signed integer coordinates and clip silently at the
//! border, so geometry that runs off the inset (e.g. tracks behind the rider)
//! is simply cut.

use crate::config::Rgb;
use crate::glyphs::{glyph, GLYPH_ADVANCE, GLYPH_HEIGHT, GLYPH_WIDTH};
use image::RgbImage;
use std::path::Path;

/// Integer pixel coordinate, may lie outside the canvas.
pub type Px = (i64, i64);

/// Round a sub-pixel position to the nearest pixel.
pub fn to_px((x, y): (f64, f64)) -> Px {
    (x.round() as i64, y.round() as i64)
}

/// One rendered radar frame. Owned by exactly one render call.
#[derive(Clone, Debug, PartialEq)]
pub struct RadarCanvas {
    image: RgbImage,
}

impl RadarCanvas {
    /// A `size × size` canvas filled with `background`.
    pub fn new(size: u32, background: Rgb) -> Self {
        Self {
            image: RgbImage::from_pixel(size, size, image::Rgb(background)),
        }
    }

    pub fn size(&self) -> u32 {
        self.image.width()
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<Rgb> {
        self.image.get_pixel_checked(x, y).map(|p| p.0)
    }

    /// Row-major, 3 bytes per pixel, RGB order.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }

    /// Number of pixels with exactly this colour.
    pub fn count(&self, color: Rgb) -> usize {
        self.image.pixels().filter(|p| p.0 == color).count()
    }

    pub fn save_png(&self, path: &Path) -> image::ImageResult<()> {
        self.image.save_with_format(path, image::ImageFormat::Png)
    }

    // -----------------------------------------------------------------------
    // Raster primitives
    // -----------------------------------------------------------------------

    pub fn put(&mut self, (x, y): Px, color: Rgb) {
        let size = self.image.width() as i64;
        if (0..size).contains(&x) && (0..size).contains(&y) {
            self.image.put_pixel(x as u32, y as u32, image::Rgb(color));
        }
    }

    fn hline(&mut self, x0: i64, x1: i64, y: i64, color: Rgb) {
        let size = self.image.width() as i64;
        if !(0..size).contains(&y) {
            return;
        }
        for x in x0.max(0)..=x1.min(size - 1) {
            self.image.put_pixel(x as u32, y as u32, image::Rgb(color));
        }
    }

    /// Bresenham line, both endpoints inclusive.
    pub fn line(&mut self, from: Px, to: Px, color: Rgb) {
        let (mut x, mut y) = from;
        let dx = (to.0 - x).abs();
        let dy = -(to.1 - y).abs();
        let sx = if x < to.0 { 1 } else { -1 };
        let sy = if y < to.1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.put((x, y), color);
            if (x, y) == to {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    /// Midpoint circle outline.
    pub fn circle(&mut self, (cx, cy): Px, radius: i64, color: Rgb) {
        if radius < 0 || !self.outline_may_cross((cx, cy), radius) {
            return;
        }
        let mut x = radius;
        let mut y = 0;
        let mut err = 1 - radius;
        while x >= y {
            for (ox, oy) in [
                (x, y),
                (y, x),
                (-y, x),
                (-x, y),
                (-x, -y),
                (-y, -x),
                (y, -x),
                (x, -y),
            ] {
                self.put((cx + ox, cy + oy), color);
            }
            y += 1;
            if err < 0 {
                err += 2 * y + 1;
            } else {
                x -= 1;
                err += 2 * (y - x) + 1;
            }
        }
    }

    /// Filled disc: every pixel within `radius` of the centre.
    pub fn fill_circle(&mut self, (cx, cy): Px, radius: i64, color: Rgb) {
        if radius < 0 {
            return;
        }
        let size = self.image.width() as i128;
        let (cx, cy, r) = (cx as i128, cy as i128, radius as i128);
        // visible rows only
        let first = (cy - r).max(0);
        let last = (cy + r).min(size - 1);
        let r2 = r * r;
        for y in first..=last {
            let dy = y - cy;
            let half = ((r2 - dy * dy) as f64).sqrt().floor() as i128;
            let x0 = (cx - half).clamp(-1, size) as i64;
            let x1 = (cx + half).clamp(-1, size) as i64;
            self.hline(x0, x1, y as i64, color);
        }
    }

    /// False when an outline of `radius` around `c` cannot touch the canvas:
    /// the canvas lies wholly inside or wholly outside the ring.
    fn outline_may_cross(&self, (cx, cy): Px, radius: i64) -> bool {
        let max = self.image.width() as f64 - 1.0;
        let (cx, cy, r) = (cx as f64, cy as f64, radius as f64);
        let near_x = cx.clamp(0.0, max) - cx;
        let near_y = cy.clamp(0.0, max) - cy;
        let far_x = (cx - 0.0).abs().max((cx - max).abs());
        let far_y = (cy - 0.0).abs().max((cy - max).abs());
        let nearest = near_x.hypot(near_y);
        let farthest = far_x.hypot(far_y);
        nearest <= r + 1.0 && farthest >= r - 1.0
    }

    /// Filled triangle by edge functions over the clipped bounding box.
    pub fn fill_triangle(&mut self, a: Px, b: Px, c: Px, color: Rgb) {
        let size = self.image.width() as i64;
        let min_x = a.0.min(b.0).min(c.0).max(0);
        let max_x = a.0.max(b.0).max(c.0).min(size - 1);
        let min_y = a.1.min(b.1).min(c.1).max(0);
        let max_y = a.1.max(b.1).max(c.1).min(size - 1);

        let edge = |p: Px, q: Px, r: Px| {
            let (px, py) = (p.0 as i128, p.1 as i128);
            (q.0 as i128 - px) * (r.1 as i128 - py) - (q.1 as i128 - py) * (r.0 as i128 - px)
        };
        let area = edge(a, b, c);
        if area == 0 {
            self.line(a, b, color);
            self.line(b, c, color);
            return;
        }
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let p = (x, y);
                let (w0, w1, w2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
                let inside = if area > 0 {
                    w0 >= 0 && w1 >= 0 && w2 >= 0
                } else {
                    w0 <= 0 && w1 <= 0 && w2 <= 0
                };
                if inside {
                    self.image.put_pixel(x as u32, y as u32, image::Rgb(color));
                }
            }
        }
    }

    /// Draw `text` with its top-left corner at `origin`. Unknown characters
    /// leave a blank cell.
    pub fn text(&mut self, origin: Px, text: &str, color: Rgb) {
        let mut x0 = origin.0;
        for ch in text.chars() {
            if let Some(rows) = glyph(ch) {
                for (row, bits) in rows.iter().enumerate().take(GLYPH_HEIGHT as usize) {
                    for col in 0..GLYPH_WIDTH {
                        if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                            self.put((x0 + col, origin.1 + row as i64), color);
                        }
                    }
                }
            }
            x0 += GLYPH_ADVANCE;
        }
    }
}
