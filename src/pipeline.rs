//! Pipeline driver: raw frames in, container bytes out.
//!
//! ```text
//! RawFrame ─▶ pixels ─▶ pad ─▶ DitherMode::apply ─▶ FrameEncoder ─▶ ContainerWriter
//! ```
//!
//! The palette is resolved once per stream: fixed and custom palettes when
//! the [`Pipeline`] is built, adaptive palettes from the first frame. Every
//! later frame must have the first frame's dimensions.

use std::io::{Cursor, Seek, Write};
use std::sync::Arc;

use ctif_dither::{DistanceMetric, DitherMode, DitherOptions, Palette, Rgb};
use rayon::prelude::*;

use crate::container::{ContainerWriter, FrameStorage, Header};
use crate::encoding::FrameEncoder;
use crate::error::{CtifError, Result};
use crate::models::{CellGeometry, Dimensions, EncodeConfig, Frame, RawFrame, SizeMismatch};

/// Encodes frame sequences according to an [`EncodeConfig`].
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: EncodeConfig,
    palette: Option<Arc<Palette>>,
}

impl Pipeline {
    /// Validate the cell geometry and resolve non-adaptive palettes.
    pub fn new(config: EncodeConfig) -> Result<Self> {
        let cell = config.cell;
        cell.check().map_err(|reason| CtifError::UnsupportedGeometry {
            width: cell.width(),
            height: cell.height(),
            cell,
            reason,
        })?;

        let palette = if config.palette.is_adaptive() {
            None
        } else {
            Some(Arc::new(config.palette.resolve(&[], config.metric)?))
        };

        Ok(Self { config, palette })
    }

    pub fn config(&self) -> &EncodeConfig {
        &self.config
    }

    /// Encode a whole sequence into an in-memory container.
    pub fn encode<I>(&self, frames: I) -> Result<Vec<u8>>
    where
        I: IntoIterator<Item = RawFrame>,
    {
        let mut frames = frames.into_iter();
        let first = frames.next().ok_or(CtifError::EmptyInputSequence)?;

        let mut session = self.begin(first, Cursor::new(Vec::new()))?;
        for frame in frames {
            session.push(frame)?;
        }
        Ok(session.finish()?.into_inner())
    }

    /// Start a streaming encode into `sink` with `first` as frame 0.
    ///
    /// The first failed [`push`](EncodeSession::push) aborts the session:
    /// later pushes and [`finish`](EncodeSession::finish) return
    /// [`CtifError::SessionAborted`]. [`abort`](EncodeSession::abort) hands
    /// back the sink, whose header still records zero frames.
    pub fn begin<W: Write + Seek>(&self, first: RawFrame, sink: W) -> Result<EncodeSession<W>> {
        let (plan, pixels) = self.plan_from_first(&first)?;
        let writer = ContainerWriter::begin(sink, &plan.header(), self.config.storage)?;

        tracing::info!(
            width = plan.layout.padded.width,
            height = plan.layout.padded.height,
            palette = plan.palette.len(),
            cell = %self.config.cell,
            storage = ?self.config.storage,
            "Starting encode"
        );

        let mut session = EncodeSession {
            plan,
            writer,
            next_index: 0,
            bytes_written: 0,
            failed: None,
        };
        let payload = session.plan.encode_pixels(pixels)?;
        session.append(&payload)?;
        Ok(session)
    }

    /// Encode a sequence with frames quantized in parallel.
    ///
    /// Output is identical to [`encode`](Self::encode). Each frame gets its
    /// own error accumulator; records are appended in source order.
    pub fn encode_parallel(&self, frames: &[RawFrame]) -> Result<Vec<u8>> {
        let first = frames.first().ok_or(CtifError::EmptyInputSequence)?;
        let (plan, _) = self.plan_from_first(first)?;

        let payloads: Vec<Result<Vec<u8>>> = frames
            .par_iter()
            .enumerate()
            .map(|(index, frame)| plan.encode_raw(index, frame))
            .collect();

        let mut writer = ContainerWriter::begin(Cursor::new(Vec::new()), &plan.header(), self.config.storage)?;
        for (index, payload) in payloads.into_iter().enumerate() {
            let payload = payload?;
            let storage = writer.append_frame(&payload)?;
            tracing::debug!(frame = index, bytes = payload.len(), storage = ?storage, "Encoded frame");
        }

        let bytes = writer.finalize()?.into_inner();
        tracing::info!(frames = frames.len(), bytes = bytes.len(), "Finished parallel encode");
        Ok(bytes)
    }

    /// Dither and cell-quantize a single frame against `palette`.
    pub fn quantize_frame(&self, raw: &RawFrame, palette: Arc<Palette>) -> Result<Frame> {
        let layout = Layout::new(raw.dimensions(), self.config.cell, self.config.on_size_mismatch)?;
        let plan = self.plan(layout, palette)?;
        let pixels = plan.check_raw(0, raw)?;
        plan.quantize_pixels(pixels)
    }

    /// Validate the first frame and fix the stream's palette and layout.
    fn plan_from_first(&self, first: &RawFrame) -> Result<(FramePlan, Vec<Rgb>)> {
        let layout = Layout::new(first.dimensions(), self.config.cell, self.config.on_size_mismatch)?;
        let pixels = first.pixels(0)?;

        let palette = match &self.palette {
            Some(palette) => Arc::clone(palette),
            None => {
                let Dimensions { width, height } = layout.source;
                let palette = self
                    .config
                    .palette
                    .resolve_frame(&pixels, width, height, self.config.metric)?;
                Arc::new(palette)
            }
        };

        if let Some(path) = &self.config.palette_export {
            std::fs::write(path, palette.to_rgb_bytes())?;
            tracing::info!(path = %path.display(), colors = palette.len(), "Exported palette");
        }

        Ok((self.plan(layout, palette)?, pixels))
    }

    fn plan(&self, layout: Layout, palette: Arc<Palette>) -> Result<FramePlan> {
        let metric = self.config.metric;
        let encoder = FrameEncoder::new(Arc::clone(&palette), self.config.cell)?.metric(metric);
        let fill = palette.color(palette.nearest_black(metric) as usize);

        Ok(FramePlan {
            layout,
            palette,
            encoder,
            dither: self.config.dither,
            metric,
            options: self.config.dither_options(),
            fill,
        })
    }
}

/// An encode in progress. Frames are appended as they arrive.
#[derive(Debug)]
pub struct EncodeSession<W: Write + Seek> {
    plan: FramePlan,
    writer: ContainerWriter<W>,
    next_index: usize,
    bytes_written: usize,
    failed: Option<usize>,
}

impl<W: Write + Seek> EncodeSession<W> {
    /// The palette every frame of this stream is quantized against.
    pub fn palette(&self) -> &Arc<Palette> {
        &self.plan.palette
    }

    pub fn frame_count(&self) -> usize {
        self.next_index
    }

    /// Quantize, encode and append the next frame.
    ///
    /// An error here aborts the session.
    pub fn push(&mut self, frame: RawFrame) -> Result<FrameStorage> {
        if let Some(index) = self.failed {
            return Err(CtifError::SessionAborted { index });
        }

        let index = self.next_index;
        let result = self
            .plan
            .encode_raw(index, &frame)
            .and_then(|payload| self.append(&payload));
        if let Err(err) = &result {
            tracing::warn!(frame = index, error = %err, "Frame failed, aborting encode");
            self.failed = Some(index);
        }
        result
    }

    fn append(&mut self, payload: &[u8]) -> Result<FrameStorage> {
        let storage = self.writer.append_frame(payload)?;
        tracing::debug!(
            frame = self.next_index,
            bytes = payload.len(),
            storage = ?storage,
            "Encoded frame"
        );
        self.next_index += 1;
        self.bytes_written += payload.len();
        Ok(storage)
    }

    /// Finalize the container and return the sink.
    pub fn finish(self) -> Result<W> {
        if let Some(index) = self.failed {
            return Err(CtifError::SessionAborted { index });
        }
        let frames = self.next_index;
        let payload_bytes = self.bytes_written;
        let sink = self.writer.finalize()?;
        tracing::info!(frames, payload_bytes, "Finished encode");
        Ok(sink)
    }

    /// Give up on the stream and return the sink unfinalized.
    pub fn abort(self) -> W {
        tracing::debug!(frames = self.next_index, failed = ?self.failed, "Encode abandoned");
        self.writer.into_inner()
    }
}

/// Source and padded frame dimensions.
#[derive(Debug, Clone, Copy)]
struct Layout {
    source: Dimensions,
    padded: Dimensions,
}

impl Layout {
    fn new(source: Dimensions, cell: CellGeometry, on_mismatch: SizeMismatch) -> Result<Self> {
        let unsupported = |reason: String| CtifError::UnsupportedGeometry {
            width: source.width,
            height: source.height,
            cell,
            reason,
        };

        if source.width == 0 || source.height == 0 {
            return Err(unsupported("frame has no pixels".to_string()));
        }

        let (cw, ch) = (cell.width(), cell.height());
        let padded = Dimensions::new(source.width.div_ceil(cw) * cw, source.height.div_ceil(ch) * ch);
        if padded != source && on_mismatch == SizeMismatch::Fail {
            return Err(unsupported(format!(
                "size is not a multiple of the {cw}x{ch} cell"
            )));
        }
        if padded.width > u16::MAX as usize || padded.height > u16::MAX as usize {
            return Err(unsupported(format!(
                "dimensions exceed {} pixels",
                u16::MAX
            )));
        }

        Ok(Self { source, padded })
    }

    /// Extend right and bottom edges with `fill` up to the padded size.
    fn pad(&self, pixels: Vec<Rgb>, fill: Rgb) -> Vec<Rgb> {
        if self.padded == self.source {
            return pixels;
        }
        let extra = self.padded.width - self.source.width;
        let mut out = Vec::with_capacity(self.padded.pixels());
        for row in pixels.chunks(self.source.width) {
            out.extend_from_slice(row);
            out.resize(out.len() + extra, fill);
        }
        out.resize(self.padded.pixels(), fill);
        out
    }
}

/// Everything needed to turn one raw frame into a payload. Shared
/// read-only between worker threads.
#[derive(Debug)]
struct FramePlan {
    layout: Layout,
    palette: Arc<Palette>,
    encoder: FrameEncoder,
    dither: DitherMode,
    metric: DistanceMetric,
    options: DitherOptions,
    fill: Rgb,
}

impl FramePlan {
    fn header(&self) -> Header {
        Header {
            width: self.layout.padded.width as u16,
            height: self.layout.padded.height as u16,
            geometry: self.encoder.geometry(),
            palette: Arc::clone(&self.palette),
        }
    }

    fn check_raw(&self, index: usize, raw: &RawFrame) -> Result<Vec<Rgb>> {
        if raw.dimensions() != self.layout.source {
            return Err(CtifError::FrameDimensionMismatch {
                index,
                expected: self.layout.source,
                actual: raw.dimensions(),
            });
        }
        raw.pixels(index)
    }

    fn encode_raw(&self, index: usize, raw: &RawFrame) -> Result<Vec<u8>> {
        let pixels = self.check_raw(index, raw)?;
        self.encode_pixels(pixels)
    }

    fn encode_pixels(&self, pixels: Vec<Rgb>) -> Result<Vec<u8>> {
        let frame = self.quantize_pixels(pixels)?;
        Ok(self.encoder.encode(&frame))
    }

    fn quantize_pixels(&self, pixels: Vec<Rgb>) -> Result<Frame> {
        let pixels = self.layout.pad(pixels, self.fill);
        let Dimensions { width, height } = self.layout.padded;
        let image = self
            .dither
            .apply(&pixels, width, height, &self.palette, self.metric, &self.options);
        self.encoder.quantize_cells(&image, &pixels)
    }
}
