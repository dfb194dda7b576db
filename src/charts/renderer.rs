//! Static Chart Renderer
//! Draws a grouped bar chart into a bitmap and encodes it as PNG.
//!
//! Layout: one slot per row, two bars per slot (first series left, second
//! right), all bars measured from a shared zero baseline. No text is drawn, so
//! no font stack is needed.

use super::plotter::ChartData;
use crate::config::ChartSettings;
use image::{DynamicImage, ImageFormat, RgbImage};
use log::debug;
use plotters::prelude::*;
use std::io::Cursor;
use thiserror::Error;

// Colors (RGB)
const BLUE: RGBColor = RGBColor(91, 155, 213); // First series
const ORANGE: RGBColor = RGBColor(237, 125, 49); // Second series
const GRAY: RGBColor = RGBColor(200, 200, 200); // Plot frame

const MARGIN: i32 = 20;
const MIN_SIZE: u32 = 2 * MARGIN as u32 + 10;

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Drawing failed: {0}")]
    Draw(String),
    #[error("Bitmap size mismatch")]
    Buffer,
    #[error("PNG encoding failed: {0}")]
    Encode(#[from] image::ImageError),
}

/// Pixel rectangle of one bar; `top <= bottom`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BarRect {
    pub series: usize,
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

pub struct StaticChartRenderer;

impl StaticChartRenderer {
    /// Vertical pixel position of the zero baseline.
    pub fn baseline(data: &ChartData, height: u32) -> i32 {
        let (lo, hi) = data.value_range();
        let plot_h = (height as i32 - 2 * MARGIN) as f64;
        let span = if hi > lo { hi - lo } else { 1.0 };
        MARGIN + (hi / span * plot_h).round() as i32
    }

    /// Bar rectangles for a canvas of the given size. Missing values get no bar.
    pub fn layout(data: &ChartData, width: u32, height: u32) -> Vec<BarRect> {
        if data.is_empty() {
            return Vec::new();
        }

        let (lo, hi) = data.value_range();
        let span = if hi > lo { hi - lo } else { 1.0 };
        let plot_w = (width as i32 - 2 * MARGIN) as f64;
        let plot_h = (height as i32 - 2 * MARGIN) as f64;
        let base = Self::baseline(data, height);

        let slot = plot_w / data.len() as f64;
        let bar_w = slot * 0.4;
        let pad = slot * 0.1;

        let mut bars = Vec::new();
        for (row, _) in data.index.iter().enumerate() {
            let slot_left = MARGIN as f64 + row as f64 * slot;

            for (series_idx, series) in data.series.iter().enumerate() {
                let Some(value) = series.values.get(row).copied().flatten() else {
                    continue;
                };
                if !value.is_finite() {
                    continue;
                }

                let left = slot_left + pad + series_idx as f64 * bar_w;
                let y = MARGIN + ((hi - value) / span * plot_h).round() as i32;

                bars.push(BarRect {
                    series: series_idx,
                    left: left.round() as i32,
                    top: y.min(base),
                    right: (left + bar_w).round() as i32,
                    bottom: y.max(base),
                });
            }
        }

        bars
    }

    /// Render the chart and return PNG bytes.
    pub fn render_png(data: &ChartData, settings: &ChartSettings) -> Result<Vec<u8>, ChartError> {
        let width = settings.width.max(MIN_SIZE);
        let height = settings.height.max(MIN_SIZE);
        let bars = Self::layout(data, width, height);
        let base = Self::baseline(data, height);

        let mut pixels = vec![0u8; width as usize * height as usize * 3];
        {
            let root = BitMapBackend::with_buffer(&mut pixels, (width, height)).into_drawing_area();
            root.fill(&WHITE).map_err(draw_error)?;

            let right = width as i32 - MARGIN;
            let bottom = height as i32 - MARGIN;
            root.draw(&Rectangle::new(
                [(MARGIN, MARGIN), (right, bottom)],
                GRAY.stroke_width(1),
            ))
            .map_err(draw_error)?;

            for bar in &bars {
                let color = if bar.series == 0 { BLUE } else { ORANGE };
                root.draw(&Rectangle::new(
                    [(bar.left, bar.top), (bar.right, bar.bottom)],
                    color.filled(),
                ))
                .map_err(draw_error)?;
            }

            root.draw(&PathElement::new(
                vec![(MARGIN, base), (right, base)],
                BLACK.stroke_width(1),
            ))
            .map_err(draw_error)?;

            root.present().map_err(draw_error)?;
        }

        let image = RgbImage::from_raw(width, height, pixels).ok_or(ChartError::Buffer)?;
        let mut png = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(image).write_to(&mut png, ImageFormat::Png)?;

        debug!("Rendered {} bars into {}x{} PNG", bars.len(), width, height);
        Ok(png.into_inner())
    }
}

fn draw_error<E: std::fmt::Display>(err: E) -> ChartError {
    ChartError::Draw(err.to_string())
}
