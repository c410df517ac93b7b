pub mod irradiance;
pub mod reference;
pub mod regression;
pub mod temperature;

use ndarray::Array1;

use regression::LinearFit;

/// One fitted metric: the line and the points it was fitted to.
#[derive(Clone, Debug)]
pub struct MetricFit {
    pub metric: String,
    pub fit: LinearFit,
    pub observed: Array1<f64>,
    pub predicted: Array1<f64>,
}

/// Everything a caller needs to plot a set of fits against a shared x-axis.
#[derive(Clone, Debug)]
pub struct FitReport {
    pub x_axis: String,
    pub x: Array1<f64>,
    pub metrics: Vec<MetricFit>,
}

pub use irradiance::{irradiance_correction, irradiance_fit};
pub use reference::reference_fit;
pub use temperature::temperature_correction;
