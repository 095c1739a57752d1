//! Dense linear solvers for the reduced DC susceptance system.

use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use faer::{prelude::*, solvers::PartialPivLu, Mat};

use pdv_core::PdvError;

/// Solves `A x = b` for a square, dense `A`.
pub trait LinearSystemBackend: Send + Sync {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>>;
}

fn check_square(matrix: &[Vec<f64>], rhs: &[f64]) -> Result<()> {
    let n = matrix.len();
    if rhs.len() != n {
        bail!("right-hand side has {} entries for a {n}x{n} system", rhs.len());
    }
    if let Some(row) = matrix.iter().position(|r| r.len() != n) {
        bail!("row {row} of a {n}x{n} system has {} entries", matrix[row].len());
    }
    Ok(())
}

/// Gauss-Jordan elimination with partial pivoting.
#[derive(Debug, Clone, Copy, Default)]
pub struct GaussSolver;

impl LinearSystemBackend for GaussSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>> {
        check_square(matrix, rhs)?;
        let n = matrix.len();
        let mut a = matrix.to_vec();
        let mut x = rhs.to_vec();

        for col in 0..n {
            let pivot = (col..n)
                .max_by(|&r, &s| a[r][col].abs().total_cmp(&a[s][col].abs()))
                .unwrap_or(col);
            a.swap(col, pivot);
            x.swap(col, pivot);

            let diag = a[col][col];
            if diag.abs() < 1e-12 {
                bail!("singular matrix (column {col}); is the network islanded?");
            }
            for value in &mut a[col][col..] {
                *value /= diag;
            }
            x[col] /= diag;

            let pivot_row = a[col][col..].to_vec();
            for row in (0..n).filter(|&r| r != col) {
                let factor = a[row][col];
                if factor == 0.0 {
                    continue;
                }
                for (target, p) in a[row][col..].iter_mut().zip(&pivot_row) {
                    *target -= factor * p;
                }
                x[row] -= factor * x[col];
            }
        }
        Ok(x)
    }
}

/// LU with partial pivoting from `faer`.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaerSolver;

impl LinearSystemBackend for FaerSolver {
    fn solve(&self, matrix: &[Vec<f64>], rhs: &[f64]) -> Result<Vec<f64>> {
        check_square(matrix, rhs)?;
        let n = matrix.len();
        if n == 0 {
            return Ok(Vec::new());
        }
        let a = Mat::from_fn(n, n, |i, j| matrix[i][j]);
        let b = Mat::from_fn(n, 1, |i, _| rhs[i]);
        let lu = PartialPivLu::new(a.as_ref());
        let x = lu.solve(&b);
        let solution: Vec<f64> = (0..n).map(|i| x.read(i, 0)).collect();
        if solution.iter().any(|v| !v.is_finite()) {
            return Err(anyhow!("singular matrix; is the network islanded?"));
        }
        Ok(solution)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SolverKind {
    #[default]
    Gauss,
    Faer,
}

impl SolverKind {
    pub fn build_solver(self) -> Arc<dyn LinearSystemBackend> {
        match self {
            SolverKind::Gauss => Arc::new(GaussSolver),
            SolverKind::Faer => Arc::new(FaerSolver),
        }
    }

    pub fn available() -> &'static [&'static str] {
        &["gauss", "faer"]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SolverKind::Gauss => "gauss",
            SolverKind::Faer => "faer",
        }
    }
}

impl FromStr for SolverKind {
    type Err = PdvError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        match input.trim().to_ascii_lowercase().as_str() {
            "gauss" | "default" => Ok(SolverKind::Gauss),
            "faer" => Ok(SolverKind::Faer),
            other => Err(PdvError::Config(format!(
                "unknown linear solver '{other}'; supported values: {}",
                Self::available().join(", ")
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: &[f64], b: &[f64]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-9)
    }

    #[test]
    fn solver_kind_parsing() {
        assert_eq!("gauss".parse::<SolverKind>().unwrap(), SolverKind::Gauss);
        assert_eq!("FAER".parse::<SolverKind>().unwrap(), SolverKind::Faer);
        let err = "cholesky".parse::<SolverKind>().unwrap_err();
        assert!(err.to_string().contains("cholesky"));
    }

    #[test]
    fn both_backends_agree_on_a_pivoting_system() {
        let matrix = vec![
            vec![0.0, 2.0, 1.0],
            vec![1.0, 1.0, 0.0],
            vec![3.0, 0.0, 1.0],
        ];
        let rhs = vec![5.0, 3.0, 4.0];
        let expected = vec![1.0, 2.0, 1.0];
        for kind in [SolverKind::Gauss, SolverKind::Faer] {
            let x = kind.build_solver().solve(&matrix, &rhs).unwrap();
            assert!(close(&x, &expected), "{}: {x:?}", kind.as_str());
        }
    }

    #[test]
    fn singular_system_is_an_error() {
        let matrix = vec![vec![1.0, 1.0], vec![1.0, 1.0]];
        assert!(GaussSolver.solve(&matrix, &[1.0, 2.0]).is_err());
    }

    #[test]
    fn mismatched_rhs_is_rejected() {
        let matrix = vec![vec![1.0]];
        assert!(FaerSolver.solve(&matrix, &[1.0, 2.0]).is_err());
        assert!(GaussSolver.solve(&matrix, &[]).is_err());
    }
}
