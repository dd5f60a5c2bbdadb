//! Optional plot output of sampled in-solid ray segments.
//!
//! Plain text, one segment per line: `x0 y0 z0  x1 y1 z1`. Workers
//! buffer segments during a pass; the controller writes them through
//! this single-owner sink after the pass barrier, so no worker ever
//! blocks on I/O inside the sampling loop.

use raygauge_math::Point3;
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

/// Single-threaded sink for sampled ray segments.
pub struct PlotWriter {
    out: BufWriter<Box<dyn Write + Send>>,
}

impl PlotWriter {
    /// Plot into any writer.
    pub fn new(writer: impl Write + Send + 'static) -> Self {
        Self {
            out: BufWriter::new(Box::new(writer)),
        }
    }

    /// Plot into a file, truncating it.
    pub fn from_path(path: impl AsRef<Path>) -> io::Result<Self> {
        Ok(Self::new(File::create(path)?))
    }

    /// Write one line segment.
    pub fn write_segment(&mut self, start: &Point3, end: &Point3) -> io::Result<()> {
        writeln!(
            self.out,
            "{} {} {}  {} {} {}",
            start.x, start.y, start.z, end.x, end.y, end.z
        )
    }

    /// Flush buffered output.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }
}

impl std::fmt::Debug for PlotWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlotWriter").finish_non_exhaustive()
    }
}
