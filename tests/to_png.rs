#![cfg(feature = "host")]
#![allow(missing_docs)]

use matrix_envoy::led_strip::{LedStrip, PixelStrip, rgbw};
use matrix_envoy::led2d::{GapMask, MatrixMap, Panel};
use matrix_envoy::to_png::{write_strip_png, write_strip_png_with_gamma};
use png::{BitDepth, ColorType, Decoder};
use std::error::Error;
use std::fs::File;
use std::path::Path;

// 4x2 grid; cell (1, 0) is wired but unused.
fn gapped_strip() -> LedStrip<8> {
    let gaps = GapMask::<8>::from_values([1, 0, 1, 1, 1, 1, 1, 1]);
    let map: MatrixMap<8> = MatrixMap::build(&[Panel::new(4, 2)], Some(&gaps), 8);
    let mut led_strip = LedStrip::new(map);
    led_strip.set_pixel_color_xy(0, 0, rgbw(255, 0, 0, 0));
    led_strip
}

struct Decoded {
    width: u32,
    height: u32,
    bytes: Vec<u8>,
}

impl Decoded {
    fn open(path: &Path) -> Result<Self, Box<dyn Error>> {
        let decoder = Decoder::new(File::open(path)?);
        let mut reader = decoder.read_info()?;
        let mut bytes = vec![0; reader.output_buffer_size()];
        let info = reader.next_frame(&mut bytes)?;
        assert_eq!(info.color_type, ColorType::Rgb);
        assert_eq!(info.bit_depth, BitDepth::Sixteen);
        bytes.truncate(info.buffer_size());
        Ok(Self {
            width: info.width,
            height: info.height,
            bytes,
        })
    }

    fn rgb(&self, x: u32, y: u32) -> [u16; 3] {
        let start = ((y * self.width + x) * 6) as usize;
        let channel = |offset: usize| {
            u16::from_be_bytes([self.bytes[start + offset], self.bytes[start + offset + 1]])
        };
        [channel(0), channel(2), channel(4)]
    }
}

#[test]
fn preview_draws_one_led_per_cell() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("previews").join("gapped.png");

    write_strip_png(&gapped_strip(), &path, 200)?;
    let decoded = Decoded::open(&path)?;

    // 42 px cells, 16 px border.
    assert_eq!((decoded.width, decoded.height), (200, 116));
    assert_eq!(decoded.rgb(36, 36), [0xFFFF, 0, 0]);
    assert_eq!(decoded.rgb(0, 0), [0, 0, 0]);
    // Center of the cell with no LED.
    assert_eq!(decoded.rgb(78, 36), [0, 0, 0]);
    Ok(())
}

#[test]
fn linear_preview_keeps_channel_ratio() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("linear.png");
    let mut led_strip = gapped_strip();
    led_strip.set_pixel_color_xy(0, 0, rgbw(0, 51, 0, 0));

    write_strip_png_with_gamma(&led_strip, &path, 200, 1.0)?;
    let decoded = Decoded::open(&path)?;

    assert_eq!(decoded.rgb(36, 36), [0, 13107, 0]);
    Ok(())
}

#[test]
fn too_small_target_is_an_error() -> Result<(), Box<dyn Error>> {
    let dir = tempfile::tempdir()?;

    assert!(write_strip_png(&gapped_strip(), dir.path().join("tiny.png"), 4).is_err());
    assert!(
        write_strip_png_with_gamma(&gapped_strip(), dir.path().join("bad.png"), 200, 0.0)
            .is_err()
    );
    Ok(())
}

#[test]
fn oversized_preview_is_an_error() -> Result<(), Box<dyn Error>> {
    const LEN: usize = 60_000;
    let dir = tempfile::tempdir()?;
    let path = dir.path().join("huge.png");

    // A 60000-wide strip at the largest target: the cell scan must not
    // overflow, and the image that fits u32 sides is still too big to buffer.
    let worker = std::thread::Builder::new()
        .stack_size(32 << 20)
        .spawn(move || {
            let led_strip = LedStrip::new(MatrixMap::<LEN>::strip(LEN as u16));
            write_strip_png(&led_strip, &path, u32::MAX).is_err()
        })?;
    assert!(worker.join().map_err(|_| "preview worker panicked")?);
    assert!(!dir.path().join("huge.png").exists());
    Ok(())
}
