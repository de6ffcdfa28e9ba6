//! Arena-backed RGB framebuffer, one lock per scanline.

use std::io::{self, Write};
use std::sync::Mutex;

use prt_arena::{ArenaError, ArenaRegion, GlobalArena};

/// Bytes per pixel.
pub const CHANNELS: usize = 3;

/// `width × height` RGB pixels, rows carved separately from the arena so
/// workers writing different rows never contend.
#[derive(Debug)]
pub struct Framebuffer {
    width: u32,
    height: u32,
    rows: Vec<Mutex<ArenaRegion>>,
}

impl Framebuffer {
    /// Carve `height` zeroed scanlines out of `arena`.
    pub fn allocate(width: u32, height: u32, arena: &GlobalArena) -> Result<Self, ArenaError> {
        let row_bytes = width as usize * CHANNELS;
        let rows = (0..height)
            .map(|_| arena.allocate(row_bytes).map(Mutex::new))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            width,
            height,
            rows,
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Store one pixel.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is outside the image.
    pub fn put_pixel(&self, x: u32, y: u32, rgb: [u8; 3]) {
        assert!(x < self.width, "x {x} outside width {}", self.width);
        let mut row = self.rows[y as usize].lock().unwrap();
        let start = x as usize * CHANNELS;
        row.as_bytes_mut()[start..start + CHANNELS].copy_from_slice(&rgb);
    }

    /// Read back one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let row = self.rows[y as usize].lock().unwrap();
        let start = x as usize * CHANNELS;
        let mut rgb = [0u8; 3];
        rgb.copy_from_slice(&row.as_bytes()[start..start + CHANNELS]);
        rgb
    }

    /// Write every row, top to bottom, as raw RGB bytes.
    pub fn write_to<W: Write>(&self, out: &mut W) -> io::Result<()> {
        let row_bytes = self.width as usize * CHANNELS;
        for row in &self.rows {
            let row = row.lock().unwrap();
            out.write_all(&row.as_bytes()[..row_bytes])?;
        }
        Ok(())
    }
}
