//! WAV (RIFF/RIFX, linear PCM) decoding into [`Sound`].

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use pcmbus_riff::{ByteCursor, ByteOrder, Chunk};
use tracing::{debug, warn};

use crate::error::WavError;
use crate::sound::Sound;

const FORMAT_PCM: u16 = 0x0001;

/// Header fields of the `fmt` chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavFormat {
    pub format_code: u16,
    pub channels: u16,
    pub sample_rate: i32,
    pub byte_rate: i32,
    pub block_align: u16,
    pub bits_per_sample: u16,
}

impl WavFormat {
    /// Header fields are little-endian even inside a RIFX container.
    fn read(cursor: &mut ByteCursor) -> Result<Self, WavError> {
        cursor.seek(0)?;
        cursor.set_byte_order(ByteOrder::Little);
        let format_code = cursor.read_u16()?;
        if format_code != FORMAT_PCM {
            return Err(WavError::UnsupportedFormat(format_code));
        }
        let channels = cursor.read_u16()?;
        let sample_rate = cursor.read_i32()?;
        let byte_rate = cursor.read_i32()?;
        let block_align = cursor.read_u16()?;
        let bits_per_sample = cursor.read_u16()?;
        if bits_per_sample % 8 != 0 {
            return Err(WavError::UnusualEncoding { bits: bits_per_sample });
        }
        if channels == 0 || bits_per_sample == 0 {
            return Err(WavError::EmptyFrame { channels, bits: bits_per_sample });
        }
        if sample_rate <= 0 {
            return Err(WavError::InvalidSampleRate(sample_rate));
        }
        Ok(Self { format_code, channels, sample_rate, byte_rate, block_align, bits_per_sample })
    }

    pub fn bytes_per_sample(&self) -> usize {
        self.bits_per_sample as usize / 8
    }
}

/// Open `path` and decode it.
pub fn decode_file(path: impl AsRef<Path>) -> Result<Sound, WavError> {
    let path = path.as_ref();
    debug!("decoding {}", path.display());
    let file = File::open(path).map_err(pcmbus_riff::RiffError::from)?;
    decode_reader(BufReader::new(file))
}

/// Build the chunk tree from `reader`, release the reader, then decode.
pub fn decode_reader<R: Read>(mut reader: R) -> Result<Sound, WavError> {
    let root = Chunk::read(&mut reader)?;
    drop(reader);
    decode(&root)
}

/// Decode a parsed container. The root must be a list of type `WAVE`.
pub fn decode(root: &Chunk) -> Result<Sound, WavError> {
    let list = root.as_list().ok_or(WavError::NotWave)?;
    if !list.list_type().matches("WAVE") {
        return Err(WavError::NotWave);
    }

    let fmt_chunk = list.find("fmt").ok_or(WavError::MissingFormat)?;
    let data_chunk = list.find("data").ok_or(WavError::MissingData)?;

    let format = WavFormat::read(&mut fmt_chunk.data())?;
    let mut data = data_chunk.data();

    let width = format.bytes_per_sample();
    let channels = format.channels as usize;
    let frames = data.len() / (width * channels);
    debug!(
        channels,
        rate = format.sample_rate,
        bits = format.bits_per_sample,
        frames,
        "wav header"
    );
    if !(1..=4).contains(&width) {
        warn!("no decoding for {}-byte samples; substituting silence", width);
    }

    let mut samples = Vec::with_capacity(frames * channels);
    for _ in 0..frames * channels {
        samples.push(read_sample(width, &mut data)?);
    }

    Ok(Sound::new(format.sample_rate as u32, format.channels, samples)?)
}

/// Read one sample of `width` bytes and scale it to 16 bits.
fn read_sample(width: usize, data: &mut ByteCursor) -> Result<i16, WavError> {
    let value = match width {
        1 => ((data.read_u8()? as i32 - 128) * 256) as i16,
        2 => data.read_i16()?,
        3 => {
            let [a, b, c] = data.read_array::<3>()?;
            let (hi, mid, lo) = match data.byte_order() {
                ByteOrder::Big => (a, b, c),
                ByteOrder::Little => (c, b, a),
            };
            let mut v = (hi as i32) << 16 | (mid as i32) << 8 | lo as i32;
            if hi & 0x80 != 0 {
                v |= 0xFF00_0000u32 as i32;
            }
            (v / 256) as i16
        }
        4 => (data.read_i32()? >> 16) as i16,
        _ => {
            data.skip(width)?;
            0
        }
    };
    Ok(value)
}
