//! SVG diagnostic plots for a processed sector.
//!
//! Three stacked panels share the time axis:
//! 1) normalized light curve
//! 2) flattened light curve
//! 3) residual (`flux - flat`)
//!
//! Eclipse-mask spans are shaded on every panel so it is easy to check that the
//! mask covers the eclipses and nothing else.

use std::fs;
use std::path::Path;

use plotters::prelude::*;

use crate::domain::{EclipseMask, LightCurve};
use crate::error::PipelineError;

const SIZE: (u32, u32) = (1200, 900);

/// Time ranges covered by contiguous runs of masked samples.
pub fn mask_spans(time: &[f64], mask: &EclipseMask) -> Vec<(f64, f64)> {
    let mut spans = Vec::new();
    let mut start: Option<usize> = None;
    for (i, &m) in mask.as_slice().iter().enumerate().take(time.len()) {
        match (m, start) {
            (true, None) => start = Some(i),
            (false, Some(s)) => {
                spans.push((time[s], time[i - 1]));
                start = None;
            }
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((time[s], time[time.len().min(mask.len()) - 1]));
    }
    spans
}

/// Finite min/max with a small margin; `None` when nothing is finite.
fn padded_bounds(values: &[f64]) -> Option<(f64, f64)> {
    let (lo, hi) = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
    if !lo.is_finite() {
        return None;
    }
    let pad = if hi > lo { 0.05 * (hi - lo) } else { lo.abs().max(1.0) * 1e-3 };
    Some((lo - pad, hi + pad))
}

/// Plot title, e.g. `TIC 12345 sector 019`.
pub fn plot_title(object: &str, sector: u32) -> String {
    format!("{object} sector {sector:03}")
}

/// Render the three-panel diagnostic plot to `path` (SVG).
pub fn render_diagnostic_plot(
    path: &Path,
    lc: &LightCurve,
    flat: &LightCurve,
    residual: &LightCurve,
    mask: &EclipseMask,
) -> Result<(), PipelineError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| PipelineError::io(dir, e))?;
    }
    draw(path, lc, flat, residual, mask).map_err(|e| PipelineError::Plot {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn draw(
    path: &Path,
    lc: &LightCurve,
    flat: &LightCurve,
    residual: &LightCurve,
    mask: &EclipseMask,
) -> Result<(), Box<dyn std::error::Error>> {
    let Some((x0, x1)) = padded_bounds(&lc.time) else {
        return Err(format!("sector {} has no finite time samples", lc.sector).into());
    };
    let spans = mask_spans(&lc.time, mask);

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&plot_title(&lc.object, lc.sector), ("sans-serif", 24))?;
    let panels = root.split_evenly((3, 1));

    let series = [
        (&lc.flux, "Normalized flux", BLUE),
        (&flat.flux, "Flattened flux", BLACK),
        (&residual.flux, "Residual flux", RED),
    ];
    let shade = RGBColor(211, 211, 211);

    for (area, (flux, label, color)) in panels.iter().zip(series) {
        let Some((y0, y1)) = padded_bounds(flux) else {
            continue;
        };
        let mut chart = ChartBuilder::on(area)
            .margin(8)
            .set_label_area_size(LabelAreaPosition::Left, 70)
            .set_label_area_size(LabelAreaPosition::Bottom, 35)
            .build_cartesian_2d(x0..x1, y0..y1)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .disable_y_mesh()
            .x_desc("Time [BTJD]")
            .y_desc(label)
            .x_labels(8)
            .y_labels(5)
            .y_label_formatter(&|v| format!("{v:.4}"))
            .draw()?;

        chart.draw_series(
            spans
                .iter()
                .map(|&(a, b)| Rectangle::new([(a, y0), (b, y1)], shade.filled())),
        )?;

        chart.draw_series(
            lc.time
                .iter()
                .zip(flux.iter())
                .filter(|(t, f)| t.is_finite() && f.is_finite())
                .map(|(&t, &f)| Circle::new((t, f), 1, color.filled())),
        )?;
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn curve(flux: Vec<f64>) -> LightCurve {
        let n = flux.len();
        LightCurve {
            object: "TIC 12345".to_string(),
            sector: 19,
            time: (0..n).map(|i| 1800.0 + i as f64 * 0.01).collect(),
            flux,
            flux_err: vec![1e-3; n],
        }
    }

    #[test]
    fn spans_cover_contiguous_runs() {
        let time = vec![0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let mask = EclipseMask(vec![false, true, true, false, true, true]);
        assert_eq!(mask_spans(&time, &mask), vec![(1.0, 2.0), (4.0, 5.0)]);
        assert!(mask_spans(&time, &EclipseMask::none(6)).is_empty());
    }

    #[test]
    fn title_pads_sector() {
        assert_eq!(plot_title("V* AN Cam", 7), "V* AN Cam sector 007");
    }

    #[test]
    fn renders_svg_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plots/TIC 12345/TIC 12345_019.svg");
        let lc = curve((0..200).map(|i| 1.0 + 0.001 * (i as f64 * 0.1).sin()).collect());
        let flat = curve(vec![1.0; 200]);
        let residual = curve(lc.flux.iter().map(|f| f - 1.0).collect());
        let mut m = vec![false; 200];
        m[50..60].iter_mut().for_each(|v| *v = true);

        render_diagnostic_plot(&path, &lc, &flat, &residual, &EclipseMask(m)).unwrap();
        let svg = fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("TIC 12345 sector 019"));
    }
}
