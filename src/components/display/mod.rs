mod matrix;

pub use matrix::{MatrixError, MemoryMatrix, PixelGrid, Rgb};

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::DisplayConfig;
use crate::error::{Error, HatResult};

/// How text is put on the matrix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextMode {
    #[default]
    Static,
    Scroll,
    Flash,
}

impl fmt::Display for TextMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TextMode::Static => "static",
            TextMode::Scroll => "scroll",
            TextMode::Flash => "flash",
        };
        f.write_str(name)
    }
}

impl FromStr for TextMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "static" => Ok(TextMode::Static),
            "scroll" => Ok(TextMode::Scroll),
            "flash" => Ok(TextMode::Flash),
            other => Err(Error::InvalidArgument(format!(
                "unknown text mode {:?}, expected static, scroll or flash",
                other
            ))),
        }
    }
}

/// LED matrix display with line helpers and a text slot
#[derive(Debug)]
pub struct Display<G: PixelGrid> {
    grid: G,
    text: String,
    font: Option<PathBuf>,
    time_to_live: u32,
}

impl<G: PixelGrid> Display<G> {
    pub fn new(grid: G) -> Self {
        let defaults = DisplayConfig::default();
        Self {
            grid,
            text: defaults.text,
            font: defaults.font,
            time_to_live: defaults.time_to_live,
        }
    }

    /// Wrap `grid` with the text, font and brightness from `config`
    pub fn from_config(mut grid: G, config: &DisplayConfig) -> HatResult<Self> {
        grid.set_brightness(config.brightness)?;
        Ok(Self {
            grid,
            text: config.text.clone(),
            font: config.font.clone(),
            time_to_live: config.time_to_live,
        })
    }

    pub fn grid(&self) -> &G {
        &self.grid
    }

    pub fn grid_mut(&mut self) -> &mut G {
        &mut self.grid
    }

    pub fn into_grid(self) -> G {
        self.grid
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn set_text(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    pub fn font(&self) -> Option<&Path> {
        self.font.as_deref()
    }

    pub fn time_to_live(&self) -> u32 {
        self.time_to_live
    }

    /// Light the line of pixels `(i, column)` for every `i` across the width
    pub fn set_column(&mut self, column: usize, r: u8, g: u8, b: u8) -> HatResult<()> {
        let (width, _) = self.grid.shape();
        for i in 0..width {
            self.grid.set_pixel(i, column, r, g, b)?;
        }
        Ok(())
    }

    /// Light the line of pixels `(row, i)` for every `i` across the height
    pub fn set_row(&mut self, row: usize, r: u8, g: u8, b: u8) -> HatResult<()> {
        let (_, height) = self.grid.shape();
        for i in 0..height {
            self.grid.set_pixel(row, i, r, g, b)?;
        }
        Ok(())
    }

    /// Render the stored text.
    ///
    /// No mode has a renderer yet, so every call returns
    /// [`Error::NotImplemented`] and leaves the frame buffer alone.
    pub fn display_text(&mut self, mode: TextMode) -> HatResult<()> {
        Err(Error::NotImplemented(format!(
            "{} text rendering of {:?}",
            mode, self.text
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_mode_parse() {
        assert_eq!("static".parse::<TextMode>().unwrap(), TextMode::Static);
        assert_eq!("scroll".parse::<TextMode>().unwrap(), TextMode::Scroll);
        assert_eq!("flash".parse::<TextMode>().unwrap(), TextMode::Flash);
        assert!("marquee".parse::<TextMode>().is_err());
        assert_eq!(TextMode::default(), TextMode::Static);
    }

    #[test]
    fn test_from_config_applies_brightness() {
        let config = DisplayConfig {
            brightness: 0.25,
            text: "standup".to_string(),
            ..DisplayConfig::default()
        };
        let display = Display::from_config(MemoryMatrix::default(), &config).unwrap();
        assert_eq!(display.grid().brightness(), 0.25);
        assert_eq!(display.text(), "standup");
        assert_eq!(display.time_to_live(), 20);
    }

    #[test]
    fn test_set_row_out_of_range() {
        let mut display = Display::new(MemoryMatrix::default());
        let err = display.set_row(17, 0, 0, 255).unwrap_err();
        assert!(matches!(err, Error::Display(MatrixError::OutOfRange { x: 17, .. })));
    }
}
