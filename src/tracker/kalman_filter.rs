//! Constant-velocity Kalman filter over box center and half-extents.
//!
//! The 8-dimensional state is `[cx, cy, hw, hh, vcx, vcy, vhw, vhh]`: the box
//! center, its half-width and half-height, and their per-frame velocities.
//! Measurements are the first four components. Noise is scaled by the box
//! height so large and small objects get comparable relative uncertainty.

use ndarray::{Array1, Array2};

const NDIM: usize = 4;

#[derive(Debug, Clone)]
pub struct KalmanFilter {
    motion_mat: Array2<f64>,
    update_mat: Array2<f64>,
    std_weight_position: f64,
    std_weight_velocity: f64,
}

impl Default for KalmanFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl KalmanFilter {
    pub fn new() -> Self {
        let mut motion_mat = Array2::eye(2 * NDIM);
        for i in 0..NDIM {
            motion_mat[[i, NDIM + i]] = 1.0;
        }

        let mut update_mat = Array2::zeros((NDIM, 2 * NDIM));
        for i in 0..NDIM {
            update_mat[[i, i]] = 1.0;
        }

        Self {
            motion_mat,
            update_mat,
            std_weight_position: 1.0 / 20.0,
            std_weight_velocity: 1.0 / 160.0,
        }
    }

    /// Create a state from an unassociated measurement, with zero velocity.
    pub fn initiate(&self, measurement: [f64; 4]) -> (Array1<f64>, Array2<f64>) {
        let measurement = clamp_extents(measurement);
        let mut mean = Array1::zeros(2 * NDIM);
        for i in 0..NDIM {
            mean[i] = measurement[i];
        }

        let s = noise_scale(measurement[3]);
        let pos = 2.0 * self.std_weight_position * s;
        let vel = 10.0 * self.std_weight_velocity * s;
        let cov = diagonal(&[pos, pos, pos, pos, vel, vel, vel, vel]);

        (mean, cov)
    }

    /// Project the state one frame forward. Uncertainty grows.
    pub fn predict(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let s = noise_scale(mean[3]);
        let pos = self.std_weight_position * s;
        let vel = self.std_weight_velocity * s;
        let motion_cov = diagonal(&[pos, pos, pos, pos, vel, vel, vel, vel]);

        let mut new_mean = self.motion_mat.dot(mean);
        new_mean[2] = new_mean[2].max(0.0);
        new_mean[3] = new_mean[3].max(0.0);
        let new_covariance = self.motion_mat.dot(covariance).dot(&self.motion_mat.t()) + motion_cov;

        (new_mean, new_covariance)
    }

    /// Project the state into measurement space.
    pub fn project(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
    ) -> (Array1<f64>, Array2<f64>) {
        let std = self.std_weight_position * noise_scale(mean[3]);
        let innovation_cov = diagonal(&[std; NDIM]);

        let mean_proj = self.update_mat.dot(mean);
        let covariance_proj =
            self.update_mat.dot(covariance).dot(&self.update_mat.t()) + innovation_cov;

        (mean_proj, covariance_proj)
    }

    /// Fold a measurement into the state. Uncertainty shrinks.
    ///
    /// Returns `None` when the innovation covariance is singular, which only
    /// happens once the state has already gone non-finite.
    pub fn update(
        &self,
        mean: &Array1<f64>,
        covariance: &Array2<f64>,
        measurement: [f64; 4],
    ) -> Option<(Array1<f64>, Array2<f64>)> {
        let (projected_mean, projected_cov) = self.project(mean, covariance);
        let innovation = Array1::from_vec(clamp_extents(measurement).to_vec()) - projected_mean;

        // K = P * H^T * S^-1, where H = [I 0]
        let s_inv = invert_4x4(&projected_cov)?;
        let pht = covariance.dot(&self.update_mat.t());
        let kalman_gain = pht.dot(&s_inv);

        let mut new_mean = mean + &kalman_gain.dot(&innovation);
        new_mean[2] = new_mean[2].max(0.0);
        new_mean[3] = new_mean[3].max(0.0);
        let new_covariance = covariance - &kalman_gain.dot(&projected_cov).dot(&kalman_gain.t());

        Some((new_mean, new_covariance))
    }
}

/// Invert a 4x4 matrix through nalgebra to stay clear of BLAS/LAPACK.
fn invert_4x4(m: &Array2<f64>) -> Option<Array2<f64>> {
    let nm = nalgebra::Matrix4::from_fn(|i, j| m[[i, j]]);
    let inv = nm.try_inverse()?;
    Some(Array2::from_shape_fn((NDIM, NDIM), |(i, j)| inv[(i, j)]))
}

fn diagonal(std: &[f64]) -> Array2<f64> {
    let mut cov = Array2::zeros((std.len(), std.len()));
    for (i, s) in std.iter().enumerate() {
        cov[[i, i]] = s * s;
    }
    cov
}

/// Degenerate boxes still need a non-zero noise floor.
#[inline]
fn noise_scale(half_height: f64) -> f64 {
    (2.0 * half_height).max(1.0)
}

#[inline]
fn clamp_extents(mut measurement: [f64; 4]) -> [f64; 4] {
    measurement[2] = measurement[2].max(0.0);
    measurement[3] = measurement[3].max(0.0);
    measurement
}
