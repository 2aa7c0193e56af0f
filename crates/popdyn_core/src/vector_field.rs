//! Planar vector fields sampled on a square mesh.
//!
//! The mesh spans `[-x_max, x_max] x [-y_max, y_max]` with `samples` points
//! per axis. Storage is row-major: row `i` follows y, column `j` follows x,
//! and point `(i, j)` lives at flat index `i * samples + j`.

use crate::equation_engine::{compile_scalar_expression, VM};
use crate::error::{Error, Result};
use crate::traits::DynamicalSystem;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FieldGrid {
    pub x_max: f64,
    pub y_max: f64,
    pub samples: usize,
}

impl Default for FieldGrid {
    fn default() -> Self {
        Self {
            x_max: 5.0,
            y_max: 5.0,
            samples: 15,
        }
    }
}

impl FieldGrid {
    /// Upper bound on points per axis; the mesh holds the square of this.
    pub const MAX_SAMPLES: usize = 1000;

    pub fn validate(&self) -> Result<()> {
        if !self.x_max.is_finite() || !self.y_max.is_finite() {
            return Err(Error::invalid("Field extents must be finite."));
        }
        if self.x_max <= 0.0 || self.y_max <= 0.0 {
            return Err(Error::invalid("Field extents must be positive."));
        }
        if self.samples < 2 {
            return Err(Error::invalid("Each axis needs at least 2 samples."));
        }
        if self.samples > Self::MAX_SAMPLES {
            return Err(Error::invalid(format!(
                "At most {} samples per axis are supported, got {}.",
                Self::MAX_SAMPLES,
                self.samples
            )));
        }
        Ok(())
    }

    pub fn xs(&self) -> Vec<f64> {
        linspace(-self.x_max, self.x_max, self.samples)
    }

    pub fn ys(&self) -> Vec<f64> {
        linspace(-self.y_max, self.y_max, self.samples)
    }

    pub fn point_count(&self) -> usize {
        self.samples.saturating_mul(self.samples)
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + i as f64 * step })
                .collect()
        }
    }
}

/// Displacement vectors over a [`FieldGrid`] with their magnitude range.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VectorField {
    pub samples: usize,
    pub xs: Vec<f64>,
    pub ys: Vec<f64>,
    pub dx: Vec<f64>,
    pub dy: Vec<f64>,
    pub min_magnitude: f64,
    pub max_magnitude: f64,
}

impl VectorField {
    /// Assembles a field from already-evaluated components.
    pub fn from_components(grid: &FieldGrid, dx: Vec<f64>, dy: Vec<f64>) -> Result<Self> {
        grid.validate()?;
        let expected = grid.point_count();
        if dx.len() != expected || dy.len() != expected {
            return Err(Error::invalid(format!(
                "Field components must have {} values (got {} and {}).",
                expected,
                dx.len(),
                dy.len()
            )));
        }

        let mut min_magnitude = f64::INFINITY;
        let mut max_magnitude = 0.0f64;
        for (k, (u, v)) in dx.iter().zip(&dy).enumerate() {
            let magnitude = u.hypot(*v);
            if !magnitude.is_finite() {
                return Err(Error::invalid(format!(
                    "Field value at point {k} is not finite."
                )));
            }
            min_magnitude = min_magnitude.min(magnitude);
            max_magnitude = max_magnitude.max(magnitude);
        }

        Ok(Self {
            samples: grid.samples,
            xs: grid.xs(),
            ys: grid.ys(),
            dx,
            dy,
            min_magnitude,
            max_magnitude,
        })
    }

    pub fn point(&self, i: usize, j: usize) -> (f64, f64) {
        (self.xs[j], self.ys[i])
    }

    pub fn vector(&self, i: usize, j: usize) -> (f64, f64) {
        let k = i * self.samples + j;
        (self.dx[k], self.dy[k])
    }

    /// Iterates `((x, y), (dx, dy))` in storage order.
    pub fn arrows(&self) -> impl Iterator<Item = ((f64, f64), (f64, f64))> + '_ {
        (0..self.samples)
            .flat_map(move |i| (0..self.samples).map(move |j| (i, j)))
            .map(move |(i, j)| (self.point(i, j), self.vector(i, j)))
    }
}

/// Samples `f(x, y) -> (dx, dy)` over the grid.
pub fn sample_fn<F>(grid: &FieldGrid, mut f: F) -> Result<VectorField>
where
    F: FnMut(f64, f64) -> (f64, f64),
{
    grid.validate()?;
    let xs = grid.xs();
    let ys = grid.ys();
    let mut dx = Vec::with_capacity(grid.point_count());
    let mut dy = Vec::with_capacity(grid.point_count());
    for &y in &ys {
        for &x in &xs {
            let (u, v) = f(x, y);
            dx.push(u);
            dy.push(v);
        }
    }
    VectorField::from_components(grid, dx, dy)
}

/// Samples two expressions of `x` and `y`.
pub fn sample_expressions(grid: &FieldGrid, fx: &str, fy: &str) -> Result<VectorField> {
    let names = vec!["x".to_string(), "y".to_string()];
    let fx_code = compile_scalar_expression(fx, &names, &[])?;
    let fy_code = compile_scalar_expression(fy, &names, &[])?;
    let mut stack = Vec::with_capacity(32);
    sample_fn(grid, |x, y| {
        let u = VM::execute(&fx_code, &[x, y], &[], 0.0, &mut stack);
        let v = VM::execute(&fy_code, &[x, y], &[], 0.0, &mut stack);
        (u, v)
    })
    .map_err(|err| match err {
        Error::InvalidParameters(message) if message.contains("not finite") => {
            Error::Expression(format!("{message} Check the domain of `{fx}` and `{fy}`."))
        }
        other => other,
    })
}

/// Samples the right-hand side of a planar system at `t = 0`.
pub fn sample_system<S>(grid: &FieldGrid, system: &S) -> Result<VectorField>
where
    S: DynamicalSystem<f64>,
{
    if system.dimension() != 2 {
        return Err(Error::invalid(format!(
            "Vector fields need a 2D system (got dimension {}).",
            system.dimension()
        )));
    }
    let mut out = [0.0; 2];
    sample_fn(grid, |x, y| {
        system.apply(0.0, &[x, y], &mut out);
        (out[0], out[1])
    })
}

#[cfg(test)]
mod tests {
    use super::{linspace, sample_expressions, sample_fn, sample_system, FieldGrid, VectorField};
    use crate::equation_engine::EquationSystem;
    use crate::error::Error;
    use crate::models::Sir;

    fn grid(samples: usize) -> FieldGrid {
        FieldGrid {
            x_max: 2.0,
            y_max: 1.0,
            samples,
        }
    }

    #[test]
    fn linspace_includes_both_ends() {
        assert_eq!(linspace(-1.0, 1.0, 5), vec![-1.0, -0.5, 0.0, 0.5, 1.0]);
        assert_eq!(linspace(0.0, 1.0, 1), vec![0.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn meshgrid_layout_is_row_major_in_y() {
        let field = sample_fn(&grid(3), |x, y| (x, y)).expect("field");
        assert_eq!(field.point(0, 2), (2.0, -1.0));
        assert_eq!(field.vector(0, 2), (2.0, -1.0));
        assert_eq!(field.vector(2, 0), (-2.0, 1.0));
        assert_eq!(field.arrows().count(), 9);
        let ((x, y), (u, v)) = field.arrows().nth(5).expect("sixth arrow");
        assert_eq!((x, y), (u, v));
    }

    #[test]
    fn magnitude_range_covers_grid() {
        let field = sample_fn(&grid(3), |x, y| (x, y)).expect("field");
        assert_eq!(field.min_magnitude, 0.0);
        assert!((field.max_magnitude - 5.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn expressions_match_closure_sampling() {
        let grid = FieldGrid::default();
        let from_text = sample_expressions(&grid, "np.sin(x)", "cos(x) * y").expect("field");
        let direct = sample_fn(&grid, |x, y| (x.sin(), x.cos() * y)).expect("field");
        assert_eq!(from_text.dx, direct.dx);
        assert_eq!(from_text.dy, direct.dy);
        assert_eq!(from_text.max_magnitude, direct.max_magnitude);
    }

    #[test]
    fn constant_field_has_equal_extremes() {
        let field = sample_expressions(&grid(4), "3", "-4").expect("field");
        assert_eq!(field.min_magnitude, 5.0);
        assert_eq!(field.max_magnitude, 5.0);
    }

    #[test]
    fn rejects_bad_grids_and_components() {
        for bad in [
            FieldGrid {
                x_max: 0.0,
                y_max: 1.0,
                samples: 5,
            },
            FieldGrid {
                x_max: 1.0,
                y_max: f64::INFINITY,
                samples: 5,
            },
            grid(1),
            grid(FieldGrid::MAX_SAMPLES + 1),
            grid(70_000),
        ] {
            let err = sample_fn(&bad, |x, y| (x, y)).expect_err("invalid grid");
            assert!(matches!(err, Error::InvalidParameters(_)));
        }

        let err = VectorField::from_components(&grid(2), vec![0.0; 4], vec![0.0; 3])
            .expect_err("length mismatch");
        assert!(matches!(err, Error::InvalidParameters(_)));
    }

    #[test]
    fn non_finite_expression_values_are_reported() {
        // y = 0 lies on the grid when samples is odd.
        let err = sample_expressions(&grid(3), "1 / y", "x").expect_err("division by zero");
        assert!(matches!(err, Error::Expression(_)), "{err:?}");

        let err = sample_expressions(&grid(3), "log(x)", "x").expect_err("not whitelisted");
        assert!(matches!(err, Error::Expression(_)));
    }

    #[test]
    fn samples_planar_systems_only() {
        let system = EquationSystem::from_strings(
            &["-y", "x"],
            &["x".to_string(), "y".to_string()],
            &[],
            Vec::<f64>::new(),
        )
        .expect("system");
        let field = sample_system(&grid(3), &system).expect("field");
        assert_eq!(field.vector(0, 0), (1.0, -2.0));

        let sir = Sir {
            beta: 0.3,
            gamma: 0.1,
            population: 1000.0,
        };
        let err = sample_system(&grid(3), &sir).expect_err("3D system");
        assert!(matches!(err, Error::InvalidParameters(_)));
    }
}
