//! 2-D projection of embedding vectors for visualization.
//!
//! A deterministic PCA via power iteration: center the data, find the top
//! two principal directions, and project every point onto them. The output
//! only feeds the scatter plot, so fidelity matters less than robustness;
//! anything degenerate (too few points, inconsistent dimensions, zero
//! variance) yields all-zero coordinates rather than an error.

use log::debug;

const MIN_POINTS: usize = 3;
const POWER_ITERATIONS: usize = 64;

/// Project `vectors` to two dimensions.
///
/// The result is index-aligned with the input. Failure is soft: a degenerate
/// input produces `(0.0, 0.0)` for every point.
pub fn project_2d(vectors: &[Vec<f32>]) -> Vec<(f32, f32)> {
    let zeros = vec![(0.0, 0.0); vectors.len()];

    let dim = match vectors.first() {
        Some(first) => first.len(),
        None => return zeros,
    };
    if vectors.len() < MIN_POINTS || dim == 0 {
        debug!("projection skipped: {} points, dim {dim}", vectors.len());
        return zeros;
    }
    if vectors.iter().any(|v| v.len() != dim) {
        debug!("projection skipped: inconsistent vector dimensions");
        return zeros;
    }

    // Center the data.
    let mut mean = vec![0.0f64; dim];
    for vector in vectors {
        for (m, &x) in mean.iter_mut().zip(vector) {
            *m += f64::from(x);
        }
    }
    for m in &mut mean {
        *m /= vectors.len() as f64;
    }

    let centered: Vec<Vec<f64>> = vectors
        .iter()
        .map(|v| {
            v.iter()
                .zip(&mean)
                .map(|(&x, &m)| f64::from(x) - m)
                .collect()
        })
        .collect();

    let Some(first_axis) = principal_direction(&centered, None) else {
        return zeros;
    };
    let second_axis = principal_direction(&centered, Some(&first_axis));

    centered
        .iter()
        .map(|row| {
            let x = dot(row, &first_axis) as f32;
            let y = second_axis
                .as_ref()
                .map(|axis| dot(row, axis) as f32)
                .unwrap_or(0.0);
            (x, y)
        })
        .collect()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn norm(v: &[f64]) -> f64 {
    dot(v, v).sqrt()
}

/// Dominant direction of the centered data by power iteration, optionally
/// deflating an already-found axis out of every step.
fn principal_direction(centered: &[Vec<f64>], deflate: Option<&[f64]>) -> Option<Vec<f64>> {
    let dim = centered.first()?.len();

    // Deterministic start: a fixed ramp rather than a random draw, so runs
    // are reproducible.
    let mut axis: Vec<f64> = (0..dim).map(|i| 1.0 + (i as f64) / (dim as f64)).collect();
    if let Some(prev) = deflate {
        orthogonalize(&mut axis, prev);
    }
    let len = norm(&axis);
    if len == 0.0 {
        return None;
    }
    for x in &mut axis {
        *x /= len;
    }

    for _ in 0..POWER_ITERATIONS {
        // axis <- Cov * axis, computed as sum_i row_i * (row_i . axis).
        let mut next = vec![0.0f64; dim];
        for row in centered {
            let projection = dot(row, &axis);
            for (n, &x) in next.iter_mut().zip(row) {
                *n += projection * x;
            }
        }

        if let Some(prev) = deflate {
            orthogonalize(&mut next, prev);
        }

        let len = norm(&next);
        if len < 1e-12 {
            return None;
        }
        for x in &mut next {
            *x /= len;
        }
        axis = next;
    }

    Some(axis)
}

fn orthogonalize(v: &mut [f64], against: &[f64]) {
    let projection = dot(v, against);
    for (x, &a) in v.iter_mut().zip(against) {
        *x -= projection * a;
    }
}
