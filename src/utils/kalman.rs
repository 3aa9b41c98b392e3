use nalgebra::{SMatrix, SVector};

/// Kalman filter for the SORT box state `[xc, yc, scale, aspect, vx, vy, vscale]`
pub mod kalman_sort_box;

pub const DT: u64 = 1;

macro_rules! pretty_print {
    ($arr:expr) => {{
        let indent = 4;
        let prefix = " ".repeat(indent);
        let mut result_els = vec!["".to_string()];
        for i in 0..$arr.nrows() {
            let mut row_els = vec![];
            for j in 0..$arr.ncols() {
                row_els.push(format!("{:12.3}", $arr[(i, j)]));
            }
            let row_str = row_els.into_iter().collect::<Vec<_>>().join(" ");
            let row_str = format!("{}{}", prefix, row_str);
            result_els.push(row_str);
        }
        result_els.into_iter().collect::<Vec<_>>().join("\n")
    }};
}

/// Kalman filter current state (mean and covariance)
///
#[derive(Copy, Clone, Debug)]
pub struct KalmanState<const X: usize> {
    pub mean: SVector<f32, X>,
    pub covariance: SMatrix<f32, X, X>,
}

impl<const X: usize> KalmanState<X> {
    /// Every component of the mean and the covariance is a finite number
    ///
    pub fn is_finite(&self) -> bool {
        self.mean.iter().all(|v| v.is_finite()) && self.covariance.iter().all(|v| v.is_finite())
    }

    pub fn dump(&self) -> String {
        format!(
            "Mean={}\nCovariance={}",
            pretty_print!(self.mean.transpose()),
            pretty_print!(self.covariance)
        )
    }
}
