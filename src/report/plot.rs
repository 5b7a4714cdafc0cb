//! Scatter plot and correlation for score-versus-distance analysis.

use anyhow::{Context, Result};
use plotters::prelude::*;
use std::path::Path;

/// Pearson correlation coefficient. NaN when either series is constant or
/// fewer than two points are given.
pub fn pearson(xs: &[f64], ys: &[f64]) -> f64 {
    assert_eq!(xs.len(), ys.len());
    if xs.len() < 2 {
        return f64::NAN;
    }
    let n = xs.len() as f64;
    let mean_x = xs.iter().sum::<f64>() / n;
    let mean_y = ys.iter().sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        cov += (x - mean_x) * (y - mean_y);
        var_x += (x - mean_x).powi(2);
        var_y += (y - mean_y).powi(2);
    }
    cov / (var_x.sqrt() * var_y.sqrt())
}

fn axis_range(values: impl Iterator<Item = f64> + Clone) -> (f64, f64) {
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    let pad = ((max - min) * 0.05).max(0.01);
    (min - pad, max + pad)
}

/// Draw an LQIC-versus-RF scatter to a PNG file, one point per run.
pub fn scatter(points: &[(f64, f64)], title: &str, path: &Path) -> Result<()> {
    if points.is_empty() {
        anyhow::bail!("nothing to plot: no runs carry both a score and a distance");
    }

    let root = BitMapBackend::new(path, (900, 600)).into_drawing_area();
    root.fill(&WHITE).context("failed to fill plot background")?;

    let (x_min, x_max) = axis_range(points.iter().map(|(x, _)| *x));
    let (y_min, y_max) = axis_range(points.iter().map(|(_, y)| *y));

    let mut chart = ChartBuilder::on(&root)
        .caption(title, ("sans-serif", 24))
        .margin(12)
        .x_label_area_size(40)
        .y_label_area_size(60)
        .build_cartesian_2d(x_min..x_max, y_min..y_max)
        .context("failed to build chart axes")?;

    chart
        .configure_mesh()
        .x_desc("LQIC")
        .y_desc("normalized RF distance")
        .draw()
        .context("failed to draw chart mesh")?;

    chart
        .draw_series(
            points
                .iter()
                .map(|(x, y)| Circle::new((*x, *y), 4, BLUE.filled())),
        )
        .context("failed to draw scatter points")?;

    root.present()
        .with_context(|| format!("failed to write plot to {:?}", path))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pearson_of_linear_series_is_one() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        let ys = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&xs, &ys) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_anticorrelated_series_is_minus_one() {
        let xs = [1.0, 2.0, 3.0];
        let ys = [3.0, 2.0, 1.0];
        assert!((pearson(&xs, &ys) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_of_constant_series_is_nan() {
        let xs = [1.0, 1.0, 1.0];
        let ys = [1.0, 2.0, 3.0];
        assert!(pearson(&xs, &ys).is_nan());
    }

    #[test]
    fn scatter_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scatter.png");
        scatter(&[(1.0, 0.2), (2.0, 0.4), (3.0, 0.1)], "LQIC vs RF", &path).unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }
}
