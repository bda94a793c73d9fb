//! Pixel grid abstraction for RGB LED matrices.
//!
//! [`PixelGrid`] is the surface a hardware driver has to expose; the
//! [`MemoryMatrix`] implementation keeps the frame in memory and stands in
//! for real hardware on machines without a HAT attached.

use thiserror::Error;

/// Errors reported by a pixel grid
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MatrixError {
    #[error("pixel ({x}, {y}) is outside the {width}x{height} matrix")]
    OutOfRange {
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    },
    #[error("brightness {0} is outside [0, 1]")]
    Brightness(f32),
}

/// An RGB pixel value
pub type Rgb = (u8, u8, u8);

/// A matrix of individually addressable RGB pixels.
///
/// Writes go to a frame buffer; [`PixelGrid::show`] pushes the buffer to the
/// LEDs.
pub trait PixelGrid {
    /// `(width, height)` in pixels
    fn shape(&self) -> (usize, usize);

    /// Set one pixel; `x < width` and `y < height` or the call fails
    fn set_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8) -> Result<(), MatrixError>;

    /// Set every pixel to one colour
    fn set_all(&mut self, r: u8, g: u8, b: u8) -> Result<(), MatrixError> {
        let (width, height) = self.shape();
        for x in 0..width {
            for y in 0..height {
                self.set_pixel(x, y, r, g, b)?;
            }
        }
        Ok(())
    }

    /// Turn every pixel off
    fn clear(&mut self) -> Result<(), MatrixError> {
        self.set_all(0, 0, 0)
    }

    /// Push the frame buffer to the LEDs
    fn show(&mut self) -> Result<(), MatrixError>;

    /// Scale all output; `brightness` must be within [0, 1]
    fn set_brightness(&mut self, brightness: f32) -> Result<(), MatrixError>;
}

/// In-memory pixel grid
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryMatrix {
    width: usize,
    height: usize,
    pixels: Vec<Rgb>,
    brightness: f32,
    frames_shown: usize,
}

impl MemoryMatrix {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![(0, 0, 0); width * height],
            brightness: 1.0,
            frames_shown: 0,
        }
    }

    /// Colour of one pixel in the frame buffer
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.index(x, y).map(|i| self.pixels[i])
    }

    pub fn brightness(&self) -> f32 {
        self.brightness
    }

    /// Number of times the buffer was shown
    pub fn frames_shown(&self) -> usize {
        self.frames_shown
    }

    fn index(&self, x: usize, y: usize) -> Option<usize> {
        (x < self.width && y < self.height).then(|| x * self.height + y)
    }
}

impl Default for MemoryMatrix {
    /// Unicorn HAT Mini geometry
    fn default() -> Self {
        Self::new(17, 7)
    }
}

impl PixelGrid for MemoryMatrix {
    fn shape(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn set_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8) -> Result<(), MatrixError> {
        let i = self.index(x, y).ok_or(MatrixError::OutOfRange {
            x,
            y,
            width: self.width,
            height: self.height,
        })?;
        self.pixels[i] = (r, g, b);
        Ok(())
    }

    fn set_all(&mut self, r: u8, g: u8, b: u8) -> Result<(), MatrixError> {
        self.pixels.fill((r, g, b));
        Ok(())
    }

    fn show(&mut self) -> Result<(), MatrixError> {
        self.frames_shown += 1;
        Ok(())
    }

    fn set_brightness(&mut self, brightness: f32) -> Result<(), MatrixError> {
        if !(0.0..=1.0).contains(&brightness) {
            return Err(MatrixError::Brightness(brightness));
        }
        self.brightness = brightness;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_pixel_bounds() {
        let mut matrix = MemoryMatrix::default();
        assert!(matrix.set_pixel(16, 6, 1, 2, 3).is_ok());
        assert_eq!(matrix.pixel(16, 6), Some((1, 2, 3)));

        assert_eq!(
            matrix.set_pixel(17, 0, 1, 2, 3),
            Err(MatrixError::OutOfRange {
                x: 17,
                y: 0,
                width: 17,
                height: 7
            })
        );
        assert!(matrix.set_pixel(0, 7, 1, 2, 3).is_err());
        assert_eq!(matrix.pixel(17, 0), None);
    }

    #[test]
    fn test_set_all_and_clear() {
        let mut matrix = MemoryMatrix::new(3, 2);
        matrix.set_all(9, 9, 9).unwrap();
        assert_eq!(matrix.pixel(2, 1), Some((9, 9, 9)));
        matrix.clear().unwrap();
        assert_eq!(matrix.pixel(2, 1), Some((0, 0, 0)));
    }

    /// Grid that claims more columns than it can address
    struct Lying(MemoryMatrix);

    impl PixelGrid for Lying {
        fn shape(&self) -> (usize, usize) {
            (self.0.shape().0 + 1, self.0.shape().1)
        }

        fn set_pixel(&mut self, x: usize, y: usize, r: u8, g: u8, b: u8) -> Result<(), MatrixError> {
            self.0.set_pixel(x, y, r, g, b)
        }

        fn show(&mut self) -> Result<(), MatrixError> {
            self.0.show()
        }

        fn set_brightness(&mut self, brightness: f32) -> Result<(), MatrixError> {
            self.0.set_brightness(brightness)
        }
    }

    #[test]
    fn test_default_set_all_reports_bad_shape() {
        let mut grid = Lying(MemoryMatrix::new(3, 2));
        assert_eq!(
            grid.set_all(1, 1, 1),
            Err(MatrixError::OutOfRange {
                x: 3,
                y: 0,
                width: 3,
                height: 2
            })
        );
        assert!(grid.clear().is_err());
    }

    #[test]
    fn test_brightness_range() {
        let mut matrix = MemoryMatrix::default();
        assert!(matrix.set_brightness(0.5).is_ok());
        assert_eq!(matrix.brightness(), 0.5);
        assert_eq!(matrix.set_brightness(1.5), Err(MatrixError::Brightness(1.5)));
        assert_eq!(matrix.brightness(), 0.5);
    }
}
