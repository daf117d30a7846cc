//! Dense linear-algebra helpers built on nalgebra decompositions.

use nalgebra::{DMatrix, DVector};

/// Pseudo-inverse and log pseudo-determinant of a symmetric matrix.
///
/// A single symmetric eigendecomposition serves both outputs. Eigenvalues
/// with `|λ| ≤ max|λ|·n·ε` are treated as zero and excluded from the
/// inverse and the determinant, so nearly singular input degrades into a
/// well-defined projection instead of an exploding inverse. The log
/// pseudo-determinant is `f64::NEG_INFINITY` if any retained eigenvalue is
/// not strictly positive.
pub fn pinvh(mat: &DMatrix<f64>) -> (DMatrix<f64>, f64) {
    assert!(mat.is_square(), "pinvh requires a square matrix");
    let n = mat.nrows();
    let eig = mat.clone().symmetric_eigen();
    let cutoff = eig
        .eigenvalues
        .iter()
        .fold(0.0_f64, |acc, &ev| acc.max(ev.abs()))
        * (n as f64)
        * f64::EPSILON;

    let mut inv = DMatrix::zeros(n, n);
    let mut ln_det = 0.0;
    let mut nonpos = false;
    for (i, &ev) in eig.eigenvalues.iter().enumerate() {
        if ev.abs() > cutoff {
            let q = eig.eigenvectors.column(i);
            inv += (q * q.transpose()).unscale(ev);
            if ev > 0.0 {
                ln_det += ev.ln();
            } else {
                nonpos = true;
            }
        }
    }
    if nonpos {
        ln_det = f64::NEG_INFINITY;
    }
    (inv, ln_det)
}

/// Pack the lower triangle of a square matrix, diagonal included, into a
/// vector row by row.
pub fn pack_tril(mat: &DMatrix<f64>) -> DVector<f64> {
    assert!(mat.is_square(), "pack_tril requires a square matrix");
    let p = mat.nrows();
    let mut flat = DVector::zeros(p * (p + 1) / 2);
    let mut k = 0;
    for i in 0..p {
        for j in 0..=i {
            flat[k] = mat[(i, j)];
            k += 1;
        }
    }
    flat
}

/// Rebuild a `p × p` lower-triangular matrix from its packed lower
/// triangle.
pub fn unpack_tril(flat: &DVector<f64>, p: usize) -> DMatrix<f64> {
    assert_eq!(
        flat.len(),
        p * (p + 1) / 2,
        "packed length does not match the triangle of the dimension"
    );
    let mut mat = DMatrix::zeros(p, p);
    let mut k = 0;
    for i in 0..p {
        for j in 0..=i {
            mat[(i, j)] = flat[k];
            k += 1;
        }
    }
    mat
}
