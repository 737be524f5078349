use std::path::Path;

use anyhow::Context;
use plotters::prelude::*;
use tv_denoise::{Image, SweepResult};

const PSNR_COLOR: RGBColor = RGBColor(0x58, 0x50, 0x8d);
const SSIM_COLOR: RGBColor = RGBColor(0xff, 0x63, 0x61);

const LABEL_STYLE: (&str, i32) = ("sans-serif", 24);
const TITLE_HEIGHT: u32 = 40;
/// Panels are scaled up so small images are still visible.
const MIN_PANEL_SIDE: usize = 256;

/// Clean, noisy and denoised images side by side.
pub fn save_comparison(
    clean: &Image,
    noisy: &Image,
    denoised: &Image,
    lambda: f64,
    output_path: &Path,
) -> anyhow::Result<()> {
    let (rows, cols) = clean.shape();
    let scale = MIN_PANEL_SIDE.div_ceil(rows.max(cols)).max(1);
    let panel_width = (cols * scale) as u32;
    let panel_height = (rows * scale) as u32;

    let root = BitMapBackend::new(output_path, (3 * panel_width, panel_height + TITLE_HEIGHT))
        .into_drawing_area();
    root.fill(&WHITE)?;
    let panels = root.split_evenly((1, 3));
    let titles = [
        "Original".to_owned(),
        "Noisy".to_owned(),
        format!("Denoised (lambda={lambda})"),
    ];
    for ((panel, title), image) in panels.iter().zip(titles).zip([clean, noisy, denoised]) {
        let panel = panel.titled(&title, LABEL_STYLE)?;
        draw_grayscale(&panel, image, scale)?;
    }

    root.present()?;
    println!("Comparison saved to {}", output_path.display());
    Ok(())
}

/// Paint each pixel as a `scale`x`scale` gray square.
fn draw_grayscale<DB: DrawingBackend>(
    area: &DrawingArea<DB, plotters::coord::Shift>,
    image: &Image,
    scale: usize,
) -> anyhow::Result<()>
where
    <DB as plotters::prelude::DrawingBackend>::ErrorType: 'static,
{
    let scale = scale as i32;
    for row in 0..image.rows() {
        for col in 0..image.cols() {
            let level = to_byte(image.get(row, col));
            let (x, y) = (col as i32 * scale, row as i32 * scale);
            area.draw(&Rectangle::new(
                [(x, y), (x + scale, y + scale)],
                RGBColor(level, level, level).filled(),
            ))?;
        }
    }
    Ok(())
}

/// PSNR (left axis) and SSIM (right axis) against lambda.
pub fn save_sweep_chart(sweep: &SweepResult, output_path: &Path) -> anyhow::Result<()> {
    if sweep.is_empty() {
        return Ok(());
    }
    let lambdas = sweep.lambdas();
    let x_range = padded_range(lambdas.iter().copied());
    let psnr_range = padded_range(sweep.entries.iter().map(|e| e.psnr));
    let ssim_range = padded_range(sweep.entries.iter().map(|e| e.ssim));

    let root = BitMapBackend::new(output_path, (1000, 700)).into_drawing_area();
    root.fill(&WHITE)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .right_y_label_area_size(70)
        .caption("Performance vs regularization", ("sans-serif", 36))
        .build_cartesian_2d(x_range.clone(), psnr_range)?
        .set_secondary_coord(x_range, ssim_range);

    chart
        .configure_mesh()
        .x_desc("lambda")
        .y_desc("PSNR (dB)")
        .label_style(LABEL_STYLE)
        .axis_desc_style(LABEL_STYLE)
        .draw()?;
    chart
        .configure_secondary_axes()
        .y_desc("SSIM")
        .label_style(LABEL_STYLE)
        .axis_desc_style(LABEL_STYLE)
        .draw()?;

    chart
        .draw_series(LineSeries::new(
            sweep
                .entries
                .iter()
                .filter(|e| e.psnr.is_finite())
                .map(|e| (e.lambda, e.psnr)),
            PSNR_COLOR.stroke_width(3),
        ))?
        .label("PSNR")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], PSNR_COLOR.stroke_width(3)));
    chart
        .draw_secondary_series(LineSeries::new(
            sweep.entries.iter().map(|e| (e.lambda, e.ssim)),
            SSIM_COLOR.stroke_width(3),
        ))?
        .label("SSIM")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], SSIM_COLOR.stroke_width(3)));

    chart
        .configure_series_labels()
        .label_font(LABEL_STYLE)
        .background_style(WHITE.mix(0.8))
        .border_style(BLACK)
        .draw()?;

    root.present()?;
    println!("Sweep chart saved to {}", output_path.display());
    Ok(())
}

/// Write the image as an 8-bit grayscale PNG.
pub fn save_grayscale(image: &Image, output_path: &Path) -> anyhow::Result<()> {
    let buffer = image::GrayImage::from_fn(image.cols() as u32, image.rows() as u32, |x, y| {
        image::Luma([to_byte(image.get(y as usize, x as usize))])
    });
    buffer
        .save(output_path)
        .with_context(|| format!("could not write {}", output_path.display()))?;
    println!("Denoised image saved to {}", output_path.display());
    Ok(())
}

/// Map [0, 1] onto 0..=255. Out-of-range values saturate.
fn to_byte(v: f64) -> u8 {
    libm::round(v * 255.0) as u8
}

/// Span of the finite values, with some room around them.
/// Never empty, even for a single value.
fn padded_range(values: impl Iterator<Item = f64>) -> std::ops::Range<f64> {
    let (lo, hi) = values
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (libm::fmin(lo, v), libm::fmax(hi, v))
        });
    if lo > hi {
        return 0.0..1.0;
    }
    let padding = libm::fmax((hi - lo) * 0.05, 1e-3);
    (lo - padding)..(hi + padding)
}
