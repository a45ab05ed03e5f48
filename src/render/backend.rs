use crate::foundation::core::{Canvas, Point, Rgba8};

/// A rendered frame as opaque RGBA8 pixels.
///
/// Rows are stored top row first. Fragment coordinates follow the GL viewport convention instead:
/// the origin is the bottom-left corner and pixel centers sit on half-integers, see
/// [`FrameRGBA::frag_coord`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
}

impl FrameRGBA {
    /// Allocate a frame filled with `fill`.
    pub fn new(canvas: Canvas, fill: Rgba8) -> Self {
        let mut f = Self {
            width: canvas.width,
            height: canvas.height,
            data: vec![0; canvas.pixel_count().saturating_mul(4)],
        };
        f.fill(fill);
        f
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: self.width,
            height: self.height,
        }
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        (self.width as usize) * 4
    }

    /// Reallocate for `canvas`. Returns `false` (and keeps the pixels) when the size is unchanged.
    pub fn resize(&mut self, canvas: Canvas) -> bool {
        if self.canvas() == canvas {
            return false;
        }
        self.width = canvas.width;
        self.height = canvas.height;
        self.data.clear();
        self.data.resize(canvas.pixel_count().saturating_mul(4), 0);
        true
    }

    /// Overwrite every pixel with `c`.
    pub fn fill(&mut self, c: Rgba8) {
        let px = c.to_array();
        for chunk in self.data.chunks_exact_mut(4) {
            chunk.copy_from_slice(&px);
        }
    }

    /// Pixel at column `col`, row `row` (row 0 is the top row).
    pub fn pixel(&self, col: u32, row: u32) -> Option<Rgba8> {
        if col >= self.width || row >= self.height {
            return None;
        }
        let i = (row as usize) * self.stride() + (col as usize) * 4;
        let b = &self.data[i..i + 4];
        Some(Rgba8::from([b[0], b[1], b[2], b[3]]))
    }

    /// Fragment coordinate of the center of pixel (`col`, `row`).
    pub fn frag_coord(&self, col: u32, row: u32) -> Point {
        frag_coord(self.height, col, row)
    }
}

/// Fragment coordinate of the center of pixel (`col`, `row`) in a target `height` rows tall.
pub fn frag_coord(height: u32, col: u32, row: u32) -> Point {
    Point::new(
        f64::from(col) + 0.5,
        f64::from(height) - f64::from(row) - 0.5,
    )
}
