//! PNG rendering of a computed inversion.
//!
//! Text (caption, axis descriptions, legend entries) is drawn only when
//! `plotters` is built with a font backend; the grid, curve and legend box are
//! always drawn.

use std::{
    fmt,
    fs,
    path::{ Path, PathBuf },
};
use plotters::prelude::*;
use crate::{
    error::{ Error, Result },
    simulation::Inversion,
};

/// Vertical plot range that fits any inversion curve with some margin.
pub const PLOT_YLIM: (f64, f64) = (-1.15, 1.15);

/// Image size in pixels.
pub const PLOT_SIZE: (u32, u32) = (1200, 800);

fn plot_err<E>(err: E) -> Error
where E: fmt::Display
{
    Error::Plot(err.to_string())
}

/// Render `inversion` against time as a line plot, written as a PNG to
/// `path`.
pub fn plot_png<P>(path: P, inversion: &Inversion) -> Result<()>
where P: AsRef<Path>
{
    let path = path.as_ref();
    let t_max = inversion.time().iter().copied().fold(0.0, f64::max);
    let t_max = if t_max > 0.0 { t_max } else { 1.0 };

    let root = BitMapBackend::new(path, PLOT_SIZE).into_drawing_area();
    root.fill(&WHITE).map_err(plot_err)?;
    let mut chart
        = ChartBuilder::on(&root)
        .caption("Atomic inversion", ("sans-serif", 30))
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(60)
        .build_cartesian_2d(0.0..t_max, PLOT_YLIM.0..PLOT_YLIM.1)
        .map_err(plot_err)?;
    chart.configure_mesh()
        .x_desc("t")
        .y_desc("W(t)")
        .draw()
        .map_err(plot_err)?;
    chart.draw_series(LineSeries::new(inversion.iter(), &BLUE))
        .map_err(plot_err)?
        .label("W(t)")
        .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], &BLUE));
    chart.configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(&WHITE.mix(0.8))
        .border_style(&BLACK)
        .draw()
        .map_err(plot_err)?;
    root.present().map_err(plot_err)?;
    Ok(())
}

/// Render `inversion` to `dir/label.png`, creating `dir` if needed, and return
/// the path written to.
pub fn save_png_file<P>(dir: P, label: &str, inversion: &Inversion)
    -> Result<PathBuf>
where P: AsRef<Path>
{
    let dir = dir.as_ref();
    fs::create_dir_all(dir)?;
    let path = dir.join(format!("{}.png", label));
    plot_png(&path, inversion)?;
    Ok(path)
}

#[cfg(test)]
mod test {
    use super::*;
    use ndarray as nd;

    const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

    #[test]
    fn ylim_bounds_inversion() {
        assert!(PLOT_YLIM.0 < -1.0 && PLOT_YLIM.1 > 1.0);
    }

    #[test]
    fn writes_png() {
        let dir = std::env::temp_dir()
            .join(format!("rabi-sim-plot-{}", std::process::id()));
        let time: nd::Array1<f64> = nd::Array1::linspace(0.0, 10.0, 501);
        let w = time.mapv(|t| -(2.0 * t).cos());
        let inv = Inversion::new(time, w);
        let path = save_png_file(&dir, "run", &inv).unwrap();
        assert_eq!(path, dir.join("run.png"));
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.len() > PNG_MAGIC.len());
        assert_eq!(bytes[..8], PNG_MAGIC);
        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn single_sample() {
        let dir = std::env::temp_dir()
            .join(format!("rabi-sim-plot-single-{}", std::process::id()));
        let inv = Inversion::new(nd::array![0.0], nd::array![-1.0]);
        let path = save_png_file(&dir, "point", &inv).unwrap();
        assert!(path.exists());
        fs::remove_dir_all(&dir).unwrap();
    }
}
