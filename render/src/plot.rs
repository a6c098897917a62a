use crate::frame::PlotFrame;
use crate::style::{palette_color, PlotFormat, PlotStyle};
use crate::{RenderError, RenderResult};
use btagcore::selection::ScaleFactorCurve;
use log::info;
use plotters::coord::Shift;
use plotters::drawing::DrawingAreaErrorKind;
use plotters::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};

const DASH_ON: usize = 4;
const DASH_OFF: usize = 3;

/// Draws the curves into `<plot_dir>/<title>.<ext>` for every format and
/// returns the written paths.
pub fn render_comparison(
    title: &str,
    curves: &[ScaleFactorCurve],
    plot_dir: &Path,
    formats: &[PlotFormat],
    style: &PlotStyle,
) -> RenderResult<Vec<PathBuf>> {
    let frame = PlotFrame::from_curves(curves, style)?;
    fs::create_dir_all(plot_dir)?;

    let mut written = Vec::with_capacity(formats.len());
    for &format in formats {
        let path = plot_dir.join(format!("{}.{}", title, format.extension()));
        let size = (style.width, style.height);
        match format {
            PlotFormat::Png => draw_comparison(
                BitMapBackend::new(&path, size).into_drawing_area(),
                title,
                curves,
                &frame,
                style,
            )?,
            PlotFormat::Svg => draw_comparison(
                SVGBackend::new(&path, size).into_drawing_area(),
                title,
                curves,
                &frame,
                style,
            )?,
        }
        info!("wrote {}", path.display());
        written.push(path);
    }
    Ok(written)
}

fn drawing<E: std::error::Error + Send + Sync>(err: DrawingAreaErrorKind<E>) -> RenderError {
    RenderError::Drawing(err.to_string())
}

/// Legend goes on top for tight working points.
pub fn legend_position(title: &str) -> SeriesLabelPosition {
    if title.contains("_T_") {
        SeriesLabelPosition::UpperLeft
    } else {
        SeriesLabelPosition::LowerLeft
    }
}

pub fn legend_label(curve: &ScaleFactorCurve) -> String {
    curve.name().replace("_central", "")
}

/// Splits a sampled polyline into the visible pieces of a dashed line.
pub fn dashes(points: &[(f64, f64)], on: usize, off: usize) -> Vec<Vec<(f64, f64)>> {
    let step = (on + off).max(1);
    (0..points.len())
        .step_by(step)
        .filter_map(|start| {
            let end = (start + on + 1).min(points.len());
            (end - start >= 2).then(|| points[start..end].to_vec())
        })
        .collect()
}

fn draw_comparison<DB: DrawingBackend>(
    root: DrawingArea<DB, Shift>,
    title: &str,
    curves: &[ScaleFactorCurve],
    frame: &PlotFrame,
    style: &PlotStyle,
) -> RenderResult<()> {
    root.fill(&WHITE).map_err(drawing)?;

    let mut chart = ChartBuilder::on(&root)
        .margin(24)
        .x_label_area_size(60)
        .y_label_area_size(80)
        .build_cartesian_2d(
            (frame.x_min..frame.x_max).log_scale(),
            frame.y_min..frame.y_max,
        )
        .map_err(drawing)?;

    chart
        .configure_mesh()
        .x_desc("pT [GeV]")
        .y_desc("SF_b")
        .label_style(("sans-serif", 20))
        .axis_desc_style(("sans-serif", 26))
        .draw()
        .map_err(drawing)?;

    for curve in curves {
        let points = curve.function.sample(style.samples)?;
        if points.is_empty() {
            continue;
        }
        let color = palette_color(curve.color_index);

        if curve.is_central() {
            let line = color.stroke_width(style.central_width);
            chart
                .draw_series(LineSeries::new(points, line))
                .map_err(drawing)?
                .label(legend_label(curve))
                .legend(move |(x, y)| PathElement::new(vec![(x, y), (x + 24, y)], line));
        } else {
            let line = color.stroke_width(style.variation_width);
            chart
                .draw_series(
                    dashes(&points, DASH_ON, DASH_OFF)
                        .into_iter()
                        .map(|dash| PathElement::new(dash, line)),
                )
                .map_err(drawing)?;
        }
    }

    chart
        .configure_series_labels()
        .position(legend_position(title))
        .label_font(("sans-serif", 22))
        .background_style(WHITE.mix(0.8))
        .border_style(WHITE)
        .draw()
        .map_err(drawing)?;

    root.present().map_err(drawing)?;
    Ok(())
}
