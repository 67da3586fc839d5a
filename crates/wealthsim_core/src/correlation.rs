//! Dense correlation-matrix factorization.
//!
//! Correlated shocks are produced from independent standard normals via the
//! lower-triangular Cholesky factor L of the correlation matrix. A matrix
//! that is not positive semi-definite (a common artifact of hand-edited or
//! estimated correlations) is projected to the nearest PSD correlation
//! matrix before factoring instead of failing the run.

/// Smallest admissible eigenvalue / pivot when repairing a matrix.
const EIGEN_FLOOR: f64 = 1e-10;

/// Strict Cholesky factorization. Returns `None` when the matrix is not
/// positive definite (a non-positive pivot shows up on the diagonal).
#[must_use]
pub fn cholesky(matrix: &[Vec<f64>]) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    let mut l = vec![vec![0.0; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = 0.0;
            for k in 0..j {
                sum += l[i][k] * l[j][k];
            }

            if i == j {
                let pivot = matrix[i][i] - sum;
                if pivot <= EIGEN_FLOOR {
                    return None;
                }
                l[i][j] = pivot.sqrt();
            } else {
                l[i][j] = (matrix[i][j] - sum) / l[j][j];
            }
        }
    }

    Some(l)
}

/// Factor a correlation matrix, repairing it first if necessary.
///
/// Returns the lower-triangular factor and whether a PSD projection was
/// needed, so the caller can log the repair.
#[must_use]
pub fn factor_correlation(matrix: &[Vec<f64>]) -> (Vec<Vec<f64>>, bool) {
    if let Some(l) = cholesky(matrix) {
        return (l, false);
    }

    let repaired = nearest_psd(matrix);
    if let Some(l) = cholesky(&repaired) {
        return (l, true);
    }

    // Eigenvalue clipping can leave a pivot within rounding of zero; a
    // growing diagonal jitter always terminates.
    let n = matrix.len();
    let mut jitter = 1e-8;
    loop {
        let mut bumped = repaired.clone();
        for i in 0..n {
            bumped[i][i] += jitter;
        }
        if let Some(l) = cholesky(&bumped) {
            return (l, true);
        }
        jitter *= 10.0;
    }
}

/// Project a symmetric matrix to the nearest PSD correlation matrix:
/// clip negative eigenvalues to a small floor, reconstruct, and rescale
/// back to a unit diagonal.
#[must_use]
pub fn nearest_psd(matrix: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = matrix.len();

    // Symmetrize first; asymmetry at rounding level is common in inputs.
    let mut sym = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            sym[i][j] = 0.5 * (matrix[i][j] + matrix[j][i]);
        }
    }

    let (mut eigenvalues, vectors) = jacobi_eigen(&sym);
    for ev in &mut eigenvalues {
        if *ev < EIGEN_FLOOR {
            *ev = EIGEN_FLOOR;
        }
    }

    // Reconstruct V * diag(ev) * V^T.
    let mut rebuilt = vec![vec![0.0; n]; n];
    for i in 0..n {
        for j in 0..n {
            let mut sum = 0.0;
            for k in 0..n {
                sum += vectors[i][k] * eigenvalues[k] * vectors[j][k];
            }
            rebuilt[i][j] = sum;
        }
    }

    // Rescale to a correlation matrix (unit diagonal).
    let scales: Vec<f64> = (0..n).map(|i| rebuilt[i][i].max(EIGEN_FLOOR).sqrt()).collect();
    for i in 0..n {
        for j in 0..n {
            rebuilt[i][j] /= scales[i] * scales[j];
        }
        rebuilt[i][i] = 1.0;
    }

    rebuilt
}

/// Cyclic Jacobi eigen-decomposition of a symmetric matrix.
/// Returns (eigenvalues, column eigenvectors).
fn jacobi_eigen(matrix: &[Vec<f64>]) -> (Vec<f64>, Vec<Vec<f64>>) {
    let n = matrix.len();
    let mut a: Vec<Vec<f64>> = matrix.to_vec();
    let mut v = vec![vec![0.0; n]; n];
    for i in 0..n {
        v[i][i] = 1.0;
    }

    const MAX_SWEEPS: usize = 64;
    for _ in 0..MAX_SWEEPS {
        let mut off_diagonal = 0.0;
        for i in 0..n {
            for j in (i + 1)..n {
                off_diagonal += a[i][j] * a[i][j];
            }
        }
        if off_diagonal < 1e-22 {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                if a[p][q].abs() < 1e-15 {
                    continue;
                }

                let theta = (a[q][q] - a[p][p]) / (2.0 * a[p][q]);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let akp = a[k][p];
                    let akq = a[k][q];
                    a[k][p] = c * akp - s * akq;
                    a[k][q] = s * akp + c * akq;
                }
                for k in 0..n {
                    let apk = a[p][k];
                    let aqk = a[q][k];
                    a[p][k] = c * apk - s * aqk;
                    a[q][k] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let vkp = v[k][p];
                    let vkq = v[k][q];
                    v[k][p] = c * vkp - s * vkq;
                    v[k][q] = s * vkp + c * vkq;
                }
            }
        }
    }

    let eigenvalues = (0..n).map(|i| a[i][i]).collect();
    (eigenvalues, v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cholesky_identity() {
        let matrix = vec![vec![1.0, 0.0], vec![0.0, 1.0]];
        let l = cholesky(&matrix).unwrap();
        assert!((l[0][0] - 1.0).abs() < 1e-10);
        assert!((l[1][1] - 1.0).abs() < 1e-10);
        assert!(l[1][0].abs() < 1e-10);
    }

    #[test]
    fn cholesky_reconstructs_correlated_matrix() {
        let matrix = vec![vec![1.0, 0.5], vec![0.5, 1.0]];
        let l = cholesky(&matrix).unwrap();
        let m00 = l[0][0] * l[0][0];
        let m10 = l[1][0] * l[0][0];
        let m11 = l[1][0] * l[1][0] + l[1][1] * l[1][1];
        assert!((m00 - 1.0).abs() < 1e-10);
        assert!((m10 - 0.5).abs() < 1e-10);
        assert!((m11 - 1.0).abs() < 1e-10);
    }

    #[test]
    fn cholesky_rejects_indefinite_matrix() {
        // Three assets pairwise correlated at -0.9 cannot coexist.
        let matrix = vec![
            vec![1.0, -0.9, -0.9],
            vec![-0.9, 1.0, -0.9],
            vec![-0.9, -0.9, 1.0],
        ];
        assert!(cholesky(&matrix).is_none());
    }

    #[test]
    fn factor_repairs_indefinite_matrix() {
        let matrix = vec![
            vec![1.0, -0.9, -0.9],
            vec![-0.9, 1.0, -0.9],
            vec![-0.9, -0.9, 1.0],
        ];
        let (l, regularized) = factor_correlation(&matrix);
        assert!(regularized);
        // L L^T must be a valid correlation matrix: unit diagonal within
        // tolerance, all entries finite.
        let n = matrix.len();
        for i in 0..n {
            let mut diag = 0.0;
            for k in 0..n {
                assert!(l[i][k].is_finite());
                diag += l[i][k] * l[i][k];
            }
            assert!((diag - 1.0).abs() < 1e-6, "diagonal {i} was {diag}");
        }
    }

    #[test]
    fn nearest_psd_preserves_valid_matrix() {
        let matrix = vec![vec![1.0, 0.3], vec![0.3, 1.0]];
        let repaired = nearest_psd(&matrix);
        assert!((repaired[0][1] - 0.3).abs() < 1e-6);
        assert!((repaired[0][0] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn jacobi_finds_known_eigenvalues() {
        // Eigenvalues of [[2,1],[1,2]] are 1 and 3.
        let matrix = vec![vec![2.0, 1.0], vec![1.0, 2.0]];
        let (mut ev, _) = jacobi_eigen(&matrix);
        ev.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert!((ev[0] - 1.0).abs() < 1e-9);
        assert!((ev[1] - 3.0).abs() < 1e-9);
    }
}
