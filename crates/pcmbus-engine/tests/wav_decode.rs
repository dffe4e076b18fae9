use std::cell::Cell;
use std::io::{self, Read};
use std::rc::Rc;

use pcmbus_engine::wav::{decode, decode_reader};
use pcmbus_engine::{Sound, WavError};
use pcmbus_riff::Chunk;

#[derive(Clone, Copy)]
enum Order {
    Little,
    Big,
}

fn u32b(order: Order, v: u32) -> [u8; 4] {
    match order {
        Order::Little => v.to_le_bytes(),
        Order::Big => v.to_be_bytes(),
    }
}

fn chunk(order: Order, tag: &[u8; 4], body: &[u8]) -> Vec<u8> {
    let mut out = tag.to_vec();
    out.extend_from_slice(&u32b(order, body.len() as u32));
    out.extend_from_slice(body);
    if body.len() % 2 == 1 {
        out.push(0);
    }
    out
}

/// `fmt` fields are little-endian in both RIFF and RIFX files.
fn fmt_body(format: u16, channels: u16, rate: u32, bits: u16) -> Vec<u8> {
    let block_align = channels * (bits / 8);
    let mut b = Vec::new();
    b.extend_from_slice(&format.to_le_bytes());
    b.extend_from_slice(&channels.to_le_bytes());
    b.extend_from_slice(&rate.to_le_bytes());
    b.extend_from_slice(&(rate * block_align as u32).to_le_bytes());
    b.extend_from_slice(&block_align.to_le_bytes());
    b.extend_from_slice(&bits.to_le_bytes());
    b
}

fn container(order: Order, list_type: &[u8; 4], children: &[Vec<u8>]) -> Vec<u8> {
    let magic = match order {
        Order::Little => b"RIFF",
        Order::Big => b"RIFX",
    };
    let mut body = list_type.to_vec();
    for c in children {
        body.extend_from_slice(c);
    }
    chunk(order, magic, &body)
}

fn wav(order: Order, format: u16, channels: u16, rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
    container(
        order,
        b"WAVE",
        &[
            chunk(order, b"fmt ", &fmt_body(format, channels, rate, bits)),
            chunk(order, b"data", data),
        ],
    )
}

fn decode_bytes(bytes: Vec<u8>) -> Result<Sound, WavError> {
    decode_reader(&bytes[..])
}

fn single_sample(order: Order, bits: u16, raw: &[u8]) -> i16 {
    let sound = decode_bytes(wav(order, 1, 1, 8000, bits, raw)).unwrap();
    assert_eq!(sound.samples().len(), 1);
    sound.samples()[0]
}

#[test]
fn stereo_16_bit_end_to_end() {
    let mut data = Vec::new();
    for (l, r) in [(100i16, -100i16), (200, -200), (300, -300), (400, -400)] {
        data.extend_from_slice(&l.to_le_bytes());
        data.extend_from_slice(&r.to_le_bytes());
    }
    let sound = decode_bytes(wav(Order::Little, 1, 2, 44100, 16, &data)).unwrap();
    assert_eq!(sound.frequency(), 44100);
    assert_eq!(sound.channels(), 2);
    assert_eq!(sound.samples(), &[100, -100, 200, -200, 300, -300, 400, -400]);
    assert_eq!(sound.to_mono().samples(), &[0, 0, 0, 0]);
}

#[test]
fn non_pcm_format_is_rejected() {
    let err = decode_bytes(wav(Order::Little, 2, 1, 8000, 16, &[0, 0])).unwrap_err();
    assert!(matches!(err, WavError::UnsupportedFormat(2)));
    assert_eq!(err.to_string(), "unsupported sample format 0x2");

    let err = decode_bytes(wav(Order::Little, 0xFFFE, 1, 8000, 16, &[0, 0])).unwrap_err();
    assert_eq!(err.to_string(), "unsupported sample format 0xfffe");
}

#[test]
fn rifx_keeps_format_header_little_endian() {
    let order = Order::Big;
    let bytes = container(
        order,
        b"WAVE",
        &[
            chunk(order, b"fmt ", &fmt_body(1, 1, 8000, 16)),
            chunk(order, b"data", &(-12345i16).to_be_bytes()),
        ],
    );
    let sound = decode_bytes(bytes).unwrap();
    assert_eq!(sound.frequency(), 8000);
    assert_eq!(sound.channels(), 1);
    assert_eq!(sound.samples(), &[-12345]);
}

/// Reader that records when it is dropped.
struct Tracked<'a> {
    inner: &'a [u8],
    dropped: Rc<Cell<bool>>,
}

impl Read for Tracked<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.inner.read(buf)
    }
}

impl Drop for Tracked<'_> {
    fn drop(&mut self) {
        self.dropped.set(true);
    }
}

#[test]
fn reader_is_released_before_decoding() {
    let bytes = wav(Order::Little, 2, 1, 8000, 16, &[0, 0]);
    let dropped = Rc::new(Cell::new(false));
    let reader = Tracked { inner: &bytes, dropped: dropped.clone() };
    let err = decode_reader(reader).unwrap_err();
    assert!(matches!(err, WavError::UnsupportedFormat(2)));
    assert!(dropped.get());

    let bytes = wav(Order::Little, 1, 1, 8000, 16, &[1, 0]);
    let dropped = Rc::new(Cell::new(false));
    let sound = decode_reader(Tracked { inner: &bytes, dropped: dropped.clone() }).unwrap();
    assert_eq!(sound.samples(), &[1]);
    assert!(dropped.get());
}

#[test]
fn eight_bit_both_orders() {
    for order in [Order::Little, Order::Big] {
        assert_eq!(single_sample(order, 8, &[200]), (200 - 128) * 256);
        assert_eq!(single_sample(order, 8, &[128]), 0);
        assert_eq!(single_sample(order, 8, &[0]), i16::MIN);
    }
}

#[test]
fn sixteen_bit_is_exact_in_both_orders() {
    let v: i16 = -12345;
    assert_eq!(single_sample(Order::Little, 16, &v.to_le_bytes()), v);
    assert_eq!(single_sample(Order::Big, 16, &v.to_be_bytes()), v);
}

#[test]
fn twenty_four_bit_both_orders() {
    for v in [0x12_3456i32, -0x12_3456, 0x7F_FFFF, -0x80_0000, 255, -256] {
        let le = [v as u8, (v >> 8) as u8, (v >> 16) as u8];
        let be = [(v >> 16) as u8, (v >> 8) as u8, v as u8];
        let expected = (v >> 8) as i16;
        for (order, raw) in [(Order::Little, le), (Order::Big, be)] {
            let got = single_sample(order, 24, &raw);
            assert!((got as i32 - expected as i32).abs() <= 1, "{v:#x}: got {got}, expected {expected}");
        }
    }
}

#[test]
fn thirty_two_bit_both_orders() {
    for v in [0x1234_5678i32, -0x1234_5678, i32::MAX, i32::MIN] {
        let expected = (v >> 16) as i16;
        assert_eq!(single_sample(Order::Little, 32, &v.to_le_bytes()), expected);
        assert_eq!(single_sample(Order::Big, 32, &v.to_be_bytes()), expected);
    }
}

#[test]
fn partial_trailing_frame_is_dropped() {
    // two full stereo 16-bit frames plus three stray bytes
    let data = [1, 0, 2, 0, 3, 0, 4, 0, 9, 9, 9];
    let sound = decode_bytes(wav(Order::Little, 1, 2, 8000, 16, &data)).unwrap();
    assert_eq!(sound.samples(), &[1, 2, 3, 4]);
}

#[test]
fn wide_samples_decode_as_silence() {
    // 40-bit samples pass the header check but have no decoder
    let data = [0x7F; 10];
    let sound = decode_bytes(wav(Order::Little, 1, 1, 8000, 40, &data)).unwrap();
    assert_eq!(sound.samples(), &[0, 0]);
}

#[test]
fn odd_bit_depth_is_rejected() {
    let err = decode_bytes(wav(Order::Little, 1, 1, 8000, 12, &[0, 0])).unwrap_err();
    assert!(matches!(err, WavError::UnusualEncoding { bits: 12 }));
}

#[test]
fn zero_channels_is_rejected() {
    let err = decode_bytes(wav(Order::Little, 1, 0, 8000, 16, &[0, 0])).unwrap_err();
    assert!(matches!(err, WavError::EmptyFrame { channels: 0, .. }));
}

#[test]
fn missing_chunks_have_distinct_errors() {
    let order = Order::Little;
    let only_data = container(order, b"WAVE", &[chunk(order, b"data", &[0, 0])]);
    let err = decode_bytes(only_data).unwrap_err();
    assert!(matches!(err, WavError::MissingFormat));

    let only_fmt = container(order, b"WAVE", &[chunk(order, b"fmt ", &fmt_body(1, 1, 8000, 16))]);
    let err = decode_bytes(only_fmt).unwrap_err();
    assert!(matches!(err, WavError::MissingData));
    assert_ne!(WavError::MissingFormat.to_string(), WavError::MissingData.to_string());
}

#[test]
fn other_riff_types_are_not_wave() {
    let avi = container(Order::Little, b"AVI ", &[chunk(Order::Little, b"data", &[0, 0])]);
    assert!(matches!(decode_bytes(avi).unwrap_err(), WavError::NotWave));
}

#[test]
fn extra_chunks_are_skipped() {
    let order = Order::Little;
    let bytes = container(
        order,
        b"WAVE",
        &[
            chunk(order, b"fmt ", &fmt_body(1, 1, 22050, 16)),
            chunk(order, b"fact", &[1, 2, 3]),
            chunk(order, b"data", &7i16.to_le_bytes()),
        ],
    );
    let root = Chunk::parse(bytes).unwrap();
    let sound = decode(&root).unwrap();
    assert_eq!(sound.frequency(), 22050);
    assert_eq!(sound.samples(), &[7]);
}

#[test]
fn garbage_is_a_container_error() {
    let err = decode_bytes(b"not a wav file at all".to_vec()).unwrap_err();
    assert!(matches!(err, WavError::Riff(_)));
}
