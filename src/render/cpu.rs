use rayon::prelude::*;

use crate::foundation::core::Rgba8;
use crate::foundation::error::{StimError, StimResult};
use crate::render::backend::{FrameRGBA, frag_coord};
use crate::render::field::FieldProgram;
use crate::stimulus::params::AntiAliasMode;

/// Dispatch options for the CPU rasterizer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CpuRasterOpts {
    /// Shade rows on a rayon pool when `true`, on the calling thread otherwise.
    pub parallel: bool,
    /// Worker count for the pool. `None` uses rayon defaults.
    pub threads: Option<usize>,
}

impl Default for CpuRasterOpts {
    fn default() -> Self {
        Self {
            parallel: true,
            threads: None,
        }
    }
}

/// Evaluates a [`FieldProgram`] for every pixel of a frame.
///
/// Each row is an independent unit of work; the output does not depend on whether rows ran in
/// parallel.
pub struct CpuRasterizer {
    pool: Option<rayon::ThreadPool>,
}

impl std::fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRasterizer")
            .field("parallel", &self.pool.is_some())
            .field("threads", &self.threads())
            .finish()
    }
}

impl CpuRasterizer {
    pub fn new(opts: CpuRasterOpts) -> StimResult<Self> {
        let pool = if opts.parallel {
            Some(build_thread_pool(opts.threads)?)
        } else {
            None
        };
        Ok(Self { pool })
    }

    /// Worker threads in use (one when sequential).
    pub fn threads(&self) -> usize {
        self.pool
            .as_ref()
            .map(rayon::ThreadPool::current_num_threads)
            .unwrap_or(1)
    }

    pub fn clear(&self, frame: &mut FrameRGBA, color: Rgba8) {
        frame.fill(color);
    }

    /// Shade every pixel of `frame` with `program`.
    pub fn draw(&self, program: &FieldProgram, aa: AntiAliasMode, frame: &mut FrameRGBA) {
        let stride = frame.stride();
        let height = frame.height;
        if stride == 0 || height == 0 {
            return;
        }

        let shade = |(row, bytes): (usize, &mut [u8])| shade_row(program, aa, height, row, bytes);
        match &self.pool {
            Some(pool) => pool.install(|| {
                frame
                    .data
                    .par_chunks_mut(stride)
                    .enumerate()
                    .for_each(shade)
            }),
            None => frame.data.chunks_mut(stride).enumerate().for_each(shade),
        }
    }
}

fn shade_row(
    program: &FieldProgram,
    aa: AntiAliasMode,
    height: u32,
    row: usize,
    bytes: &mut [u8],
) {
    let row = row as u32;
    for (col, px) in bytes.chunks_exact_mut(4).enumerate() {
        let frag = frag_coord(height, col as u32, row);
        px.copy_from_slice(&program.shade(frag, aa).to_array());
    }
}

fn build_thread_pool(threads: Option<usize>) -> StimResult<rayon::ThreadPool> {
    if threads == Some(0) {
        return Err(StimError::validation("threads must be > 0 when provided"));
    }

    let mut builder =
        rayon::ThreadPoolBuilder::new().thread_name(|i| format!("gaborstim-raster-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| StimError::render(format!("failed to build rayon thread pool: {e}")))
}
