#![cfg(feature = "host")]
//! PNG previews of a strip's logical grid, for visual checks on the host.
//!
//! Each logical cell is drawn as a round LED with a soft edge. Cells with no
//! LED behind them are drawn as a faint outline so gaps in a layout stay
//! visible.

use crate::led_strip::{LedStrip, PixelStrip, Rgbw};
use png::{BitDepth, ColorType, Encoder, ScaledFloat};
use std::error::Error;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

const PREVIEW_INVERSE_GAMMA: f32 = 2.2;
const UNMAPPED_OUTLINE: u16 = 0x0C00;

/// Render the logical grid of `led_strip` into a PNG file no larger than
/// `target_max_dimension` on either side.
///
/// # Errors
///
/// Fails if `target_max_dimension` is too small to draw one LED per cell or
/// the file cannot be written.
pub fn write_strip_png<const N: usize>(
    led_strip: &LedStrip<N>,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
) -> Result<(), Box<dyn Error>> {
    write_strip_png_with_gamma(
        led_strip,
        output_path,
        target_max_dimension,
        PREVIEW_INVERSE_GAMMA,
    )
}

/// Render the logical grid of `led_strip` into a PNG file with a custom
/// preview inverse gamma.
///
/// # Errors
///
/// See [`write_strip_png`]. Also fails if `preview_inverse_gamma` is not positive.
pub fn write_strip_png_with_gamma<const N: usize>(
    led_strip: &LedStrip<N>,
    output_path: impl AsRef<Path>,
    target_max_dimension: u32,
    preview_inverse_gamma: f32,
) -> Result<(), Box<dyn Error>> {
    if preview_inverse_gamma <= 0.0 {
        return Err("preview_inverse_gamma must be positive".into());
    }
    let output_path = output_path.as_ref();
    let columns = u32::from(led_strip.matrix_width());
    let rows = u32::from(led_strip.matrix_height());
    let cell_size = select_cell_size(columns, rows, target_max_dimension)?;

    let (width, height, pixels) = grid_pixels(
        columns,
        rows,
        |x, y| {
            let (x, y) = (u16::try_from(x).ok()?, u16::try_from(y).ok()?);
            led_strip
                .map()
                .physical_index(x, y)
                .map(|_| led_strip.pixel_color_xy(x, y))
        },
        cell_size,
        preview_inverse_gamma,
    )?;

    if let Some(parent) = output_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    let file = File::create(output_path)?;
    let mut encoder = Encoder::new(BufWriter::new(file), width, height);
    encoder.set_color(ColorType::Rgb);
    encoder.set_depth(BitDepth::Sixteen);
    encoder.set_source_gamma(ScaledFloat::new(1.0));
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;
    println!("wrote PNG to {}", output_path.display());
    Ok(())
}

fn select_cell_size(
    columns: u32,
    rows: u32,
    target_max_dimension: u32,
) -> Result<u32, Box<dyn Error>> {
    let fits = |cell_size: u32| {
        let led_radius = led_radius(cell_size);
        // None when the side does not fit in u32.
        let side = |cells: u32| cells.checked_mul(cell_size)?.checked_add(led_radius * 2);
        match (side(columns), side(rows)) {
            (Some(output_width), Some(output_height)) => {
                led_radius >= 3 && output_width.max(output_height) <= target_max_dimension
            }
            _ => false,
        }
    };
    let largest = target_max_dimension / columns.max(rows).max(1);
    (1..=largest)
        .rev()
        .find(|&cell_size| fits(cell_size))
        .ok_or_else(|| {
            format!("{target_max_dimension} px is too small for a {columns}x{rows} grid").into()
        })
}

const fn led_radius(cell_size: u32) -> u32 {
    let led_margin = if cell_size / 8 > 1 { cell_size / 8 } else { 1 };
    cell_size.saturating_sub(led_margin * 2) / 2
}

fn grid_pixels(
    columns: u32,
    rows: u32,
    cell_color: impl Fn(u32, u32) -> Option<Rgbw>,
    cell_size: u32,
    preview_inverse_gamma: f32,
) -> Result<(u32, u32, Vec<u8>), Box<dyn Error>> {
    let led_radius = led_radius(cell_size);
    let fade_width = (led_radius / 3).max(1);
    let border = led_radius;
    let width = columns * cell_size + border * 2;
    let height = rows * cell_size + border * 2;
    let byte_len = width
        .checked_mul(height)
        .and_then(|pixels| pixels.checked_mul(3 * 2))
        .ok_or_else(|| format!("a {width}x{height} preview does not fit in memory"))?;
    let mut bytes = vec![0u8; byte_len as usize];
    let center = (cell_size - 1) as i32 / 2;
    let led_radius_f = led_radius as f32;
    let inner_radius_f = (led_radius - fade_width) as f32;
    let radius_sq = (led_radius as i32) * (led_radius as i32);

    for row_index in 0..rows {
        for column_index in 0..columns {
            let color = cell_color(column_index, row_index);
            let cell_origin_x = column_index * cell_size;
            let cell_origin_y = row_index * cell_size;

            for local_y in 0..cell_size {
                let delta_y = local_y as i32 - center;
                for local_x in 0..cell_size {
                    let delta_x = local_x as i32 - center;
                    let distance_sq = delta_x * delta_x + delta_y * delta_y;
                    if distance_sq > radius_sq {
                        continue;
                    }
                    let distance = (distance_sq as f32).sqrt();
                    let channels = match color {
                        Some(color) => {
                            let intensity = if distance <= inner_radius_f {
                                1.0
                            } else {
                                let fade_span = led_radius_f - inner_radius_f;
                                (1.0 - (distance - inner_radius_f) / fade_span).max(0.0)
                            };
                            // White is previewed as added to each color channel.
                            let white = color.a.0;
                            [color.r, color.g, color.b].map(|channel| {
                                linear_to_u16(
                                    inverse_gamma_to_linear(
                                        channel.saturating_add(white),
                                        preview_inverse_gamma,
                                    ) * intensity,
                                )
                            })
                        }
                        None if distance > inner_radius_f => [UNMAPPED_OUTLINE; 3],
                        None => [0; 3],
                    };
                    let x = border + cell_origin_x + local_x;
                    let y = border + cell_origin_y + local_y;
                    let pixel_index = ((y * width + x) * 3 * 2) as usize;
                    for (offset, channel) in channels.into_iter().enumerate() {
                        bytes[pixel_index + offset * 2..pixel_index + offset * 2 + 2]
                            .copy_from_slice(&channel.to_be_bytes());
                    }
                }
            }
        }
    }

    Ok((width, height, bytes))
}

fn inverse_gamma_to_linear(channel: u8, preview_inverse_gamma: f32) -> f32 {
    let normalized = (channel as f32) / 255.0;
    normalized.powf(preview_inverse_gamma)
}

fn linear_to_u16(value: f32) -> u16 {
    let clamped = value.clamp(0.0, 1.0);
    (clamped * 65535.0).round() as u16
}
