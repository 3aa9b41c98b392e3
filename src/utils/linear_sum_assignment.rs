use itertools::Itertools;
use log::debug;
use nalgebra::DMatrix;
use pathfinding::kuhn_munkres::kuhn_munkres_min;
use pathfinding::matrix::Matrix;

const F32_I64_MULT: f32 = 1_000_000.0;

/// Solver of the rectangular assignment problem.
///
/// The input is a `rows x columns` cost matrix where `f32::INFINITY` marks pairs that must never
/// be matched. The output lists accepted `(row, column)` pairs sorted by row; every row and every
/// column appears at most once and no pair with an infinite cost is ever returned.
///
pub trait AssignmentSolver: Send + Sync {
    fn solve(&self, costs: &DMatrix<f32>) -> Vec<(usize, usize)>;
}

/// Optimal solver based on the Kuhn-Munkres (Hungarian) algorithm, `O(n^3)`.
///
/// Finite costs are expected to be non-positive (negated affinities). The solver minimizes the
/// total cost of the accepted pairs; forbidden pairs take part in the optimization with zero
/// weight and are dropped from the result afterwards.
///
#[derive(Debug, Default, Clone, Copy)]
pub struct KuhnMunkresSolver;

impl AssignmentSolver for KuhnMunkresSolver {
    fn solve(&self, costs: &DMatrix<f32>) -> Vec<(usize, usize)> {
        let (rows, columns) = costs.shape();
        if rows == 0 || columns == 0 {
            return Vec::default();
        }

        if !costs.iter().any(|c| c.is_finite()) {
            debug!("All {}x{} pairs are gated out, nothing to assign", rows, columns);
            return Vec::default();
        }

        // the algorithm requires rows <= columns
        let transposed = rows > columns;
        let (n, m) = if transposed {
            (columns, rows)
        } else {
            (rows, columns)
        };

        let mut weights = Matrix::new(n, m, 0i64);
        for r in 0..n {
            for c in 0..m {
                let cost = if transposed {
                    costs[(c, r)]
                } else {
                    costs[(r, c)]
                };
                if cost.is_finite() {
                    weights[(r, c)] = (cost * F32_I64_MULT).round() as i64;
                }
            }
        }

        let (_, solution) = kuhn_munkres_min(&weights);

        solution
            .into_iter()
            .enumerate()
            .map(|(r, c)| if transposed { (c, r) } else { (r, c) })
            .filter(|&(r, c)| costs[(r, c)].is_finite())
            .sorted()
            .collect()
    }
}
