use std::path::Path;

use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::{Decoder, DecoderOptions, CODEC_TYPE_NULL};
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::{FormatOptions, FormatReader};
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use super::stream::{Pull, SampleStream};
use crate::error::{Error, Result};

/// A file-backed [`SampleStream`] that decodes packets only when pulled.
pub struct DecodedStream {
    format: Box<dyn FormatReader>,
    decoder: Box<dyn Decoder>,
    track_id: u32,
    sample_rate: u32,
    channels: usize,
    total_frames: u64,
    pending: Vec<f32>,
    pending_pos: usize,
    finished: bool,
}

impl DecodedStream {
    pub fn open(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;

        let mss = MediaSourceStream::new(Box::new(file), Default::default());

        let mut hint = Hint::new();
        if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
            hint.with_extension(ext);
        }

        let probed = symphonia::default::get_probe().format(
            &hint,
            mss,
            &FormatOptions::default(),
            &MetadataOptions::default(),
        )?;

        let format = probed.format;

        let track = format
            .tracks()
            .iter()
            .find(|t| t.codec_params.codec != CODEC_TYPE_NULL)
            .ok_or_else(|| Error::Unsupported(format!("no audio track in {}", path.display())))?;

        let track_id = track.id;
        let channels = track.codec_params.channels.map_or(1, |c| c.count());
        let sample_rate = track
            .codec_params
            .sample_rate
            .ok_or_else(|| Error::Unsupported(format!("unknown sample rate in {}", path.display())))?;
        let total_frames = track.codec_params.n_frames.ok_or(Error::UnknownLength)?;

        let decoder = symphonia::default::get_codecs()
            .make(&track.codec_params, &DecoderOptions::default())?;

        log::info!(
            "Opened audio: {} frames, {}Hz, {} channel(s), {:.1}s",
            total_frames,
            sample_rate,
            channels,
            total_frames as f64 / sample_rate as f64
        );

        Ok(Self {
            format,
            decoder,
            track_id,
            sample_rate,
            channels,
            total_frames,
            pending: Vec::new(),
            pending_pos: 0,
            finished: false,
        })
    }

    /// Decode the next packet of our track into `pending`. Returns false at end of file.
    fn decode_next(&mut self) -> Result<bool> {
        loop {
            let packet = match self.format.next_packet() {
                Ok(packet) => packet,
                Err(SymphoniaError::IoError(ref e))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    self.finished = true;
                    return Ok(false);
                }
                Err(e) => return Err(e.into()),
            };

            if packet.track_id() != self.track_id {
                continue;
            }

            let decoded = match self.decoder.decode(&packet) {
                Ok(d) => d,
                Err(SymphoniaError::DecodeError(msg)) => {
                    log::warn!("Skipping undecodable packet: {}", msg);
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            let spec = *decoded.spec();
            if spec.channels.count() != self.channels {
                return Err(Error::Unsupported(format!(
                    "channel count changed from {} to {} mid-stream",
                    self.channels,
                    spec.channels.count()
                )));
            }

            let mut sample_buf = SampleBuffer::<f32>::new(decoded.frames() as u64, spec);
            sample_buf.copy_interleaved_ref(decoded);

            self.pending.clear();
            self.pending.extend_from_slice(sample_buf.samples());
            self.pending_pos = 0;
            return Ok(true);
        }
    }
}

impl SampleStream for DecodedStream {
    fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    fn channels(&self) -> usize {
        self.channels
    }

    fn total_frames(&self) -> u64 {
        self.total_frames
    }

    fn pull(&mut self, max_frames: usize, out: &mut Vec<f32>) -> Result<Pull> {
        out.clear();
        let wanted = max_frames * self.channels;

        while out.len() < wanted {
            if self.pending_pos == self.pending.len() {
                if self.finished || !self.decode_next()? {
                    break;
                }
                continue;
            }
            let take = (wanted - out.len()).min(self.pending.len() - self.pending_pos);
            out.extend_from_slice(&self.pending[self.pending_pos..self.pending_pos + take]);
            self.pending_pos += take;
        }

        let frames = out.len() / self.channels;
        Ok(Pull {
            frames,
            exhausted: frames < max_frames,
        })
    }
}
