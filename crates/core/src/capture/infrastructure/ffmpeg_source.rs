use crate::capture::domain::frame_source::{FrameSource, SourceInfo};
use crate::shared::frame::Frame;

/// Live frame supply via ffmpeg-next (libavformat + libavcodec).
///
/// Accepts anything libavformat can open — RTSP URLs, local capture
/// devices, plain files — and converts every decoded frame to RGB24.
pub struct FfmpegSource {
    uri: String,
    state: Option<OpenState>,
    frame_index: usize,
}

struct OpenState {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    scaler: ffmpeg_next::software::scaling::Context,
    stream_index: usize,
    width: u32,
    height: u32,
}

// Safety: FfmpegSource is only used from a single thread at a time.
// The raw pointers inside ffmpeg types are not shared across threads.
unsafe impl Send for FfmpegSource {}

impl FfmpegSource {
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            state: None,
            frame_index: 0,
        }
    }
}

impl FrameSource for FfmpegSource {
    fn open(&mut self) -> Result<SourceInfo, Box<dyn std::error::Error>> {
        ffmpeg_next::init()?;

        let ictx = ffmpeg_next::format::input(&self.uri)?;
        let stream = ictx
            .streams()
            .best(ffmpeg_next::media::Type::Video)
            .ok_or("no video stream in source")?;
        let stream_index = stream.index();

        let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())?;
        let decoder = codec_ctx.decoder().video()?;

        let rate = stream.rate();
        let fps = if rate.denominator() != 0 {
            rate.numerator() as f64 / rate.denominator() as f64
        } else {
            0.0
        };

        let width = decoder.width();
        let height = decoder.height();
        let scaler = ffmpeg_next::software::scaling::Context::get(
            decoder.format(),
            width,
            height,
            ffmpeg_next::format::Pixel::RGB24,
            width,
            height,
            ffmpeg_next::software::scaling::Flags::BILINEAR,
        )?;

        self.state = Some(OpenState {
            ictx,
            decoder,
            scaler,
            stream_index,
            width,
            height,
        });
        Ok(SourceInfo { width, height, fps })
    }

    fn read(&mut self) -> Result<Frame, Box<dyn std::error::Error>> {
        let state = self.state.as_mut().ok_or("source not opened")?;

        loop {
            if let Some(frame) = state.try_receive()? {
                let index = self.frame_index;
                self.frame_index += 1;
                return Ok(Frame::new(frame, state.width, state.height, index));
            }

            let Some((stream, packet)) = state.ictx.packets().next() else {
                // Drain the decoder, then report end of supply; the caller
                // retries with backoff like any other capture failure.
                state.decoder.send_eof().ok();
                if let Some(frame) = state.try_receive()? {
                    let index = self.frame_index;
                    self.frame_index += 1;
                    return Ok(Frame::new(frame, state.width, state.height, index));
                }
                return Err("frame source exhausted".into());
            };

            if stream.index() != state.stream_index {
                continue;
            }
            // A corrupt packet is not fatal; keep pulling.
            state.decoder.send_packet(&packet).ok();
        }
    }

    fn close(&mut self) {
        self.state = None;
    }
}

impl OpenState {
    /// Pulls one decoded frame as packed RGB24 bytes, if available.
    fn try_receive(&mut self) -> Result<Option<Vec<u8>>, Box<dyn std::error::Error>> {
        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        if self.decoder.receive_frame(&mut decoded).is_err() {
            return Ok(None);
        }

        let mut rgb = ffmpeg_next::util::frame::video::Video::empty();
        self.scaler.run(&decoded, &mut rgb)?;
        Ok(Some(strip_row_padding(&rgb, self.width, self.height)))
    }
}

/// ffmpeg rows may carry stride padding; pack them tightly.
fn strip_row_padding(
    rgb: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb.stride(0);
    let data = rgb.data(0);
    let w = width as usize;

    let mut pixels = Vec::with_capacity(w * height as usize * 3);
    for row in 0..height as usize {
        let start = row * stride;
        pixels.extend_from_slice(&data[start..start + w * 3]);
    }
    pixels
}
