//! In-place affine transforms on vertex buffers
//!
//! Every operation works on any nalgebra matrix with mutable storage: the
//! `Nx3` vertex buffer of a mesh, a `DMatrix<f64>`, or a view into either.
//! Columns 0, 1 and 2 hold the x, y and z coordinates.
use std::fmt;
use std::str::FromStr;

use nalgebra::{storage::RawStorageMut, Dim, Matrix};
use tracing::trace;

use crate::error::{TransformError, TransformResult};

/// Coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn column(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn label(self) -> char {
        match self {
            Axis::X => 'x',
            Axis::Y => 'y',
            Axis::Z => 'z',
        }
    }
}

fn require_columns<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
    matrix: &Matrix<f64, R, C, S>,
    axis: Axis,
) -> TransformResult<()> {
    if matrix.ncols() <= axis.column() {
        return Err(TransformError::MissingAxis {
            axis: axis.label(),
            columns: matrix.ncols(),
        });
    }
    Ok(())
}

/// Add `amount` to the `axis` coordinate of every row.
pub fn translate<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
    matrix: &mut Matrix<f64, R, C, S>,
    axis: Axis,
    amount: f64,
) -> TransformResult<()> {
    require_columns(matrix, axis)?;
    trace!(axis = ?axis, amount, rows = matrix.nrows(), "translate");

    let column = axis.column();
    for row in 0..matrix.nrows() {
        matrix[(row, column)] += amount;
    }
    Ok(())
}

/// Rotate every row about `axis` by `angle` radians.
///
/// For the x and z axes the pair `(a, b)` = `(y, z)` or `(x, y)` becomes
/// `(a·cos + b·sin, −a·sin + b·cos)`. The y axis uses the opposite
/// cross-term sign: `(x, z)` becomes `(x·cos − z·sin, x·sin + z·cos)`.
pub fn rotate<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
    matrix: &mut Matrix<f64, R, C, S>,
    axis: Axis,
    angle: f64,
) -> TransformResult<()> {
    require_columns(matrix, Axis::Z)?;
    trace!(axis = ?axis, angle, rows = matrix.nrows(), "rotate");

    let (sin, cos) = angle.sin_cos();
    match axis {
        Axis::X => {
            for row in 0..matrix.nrows() {
                let y = matrix[(row, 1)];
                let z = matrix[(row, 2)];
                matrix[(row, 1)] = cos * y + sin * z;
                matrix[(row, 2)] = -sin * y + cos * z;
            }
        }
        Axis::Y => {
            for row in 0..matrix.nrows() {
                let x = matrix[(row, 0)];
                let z = matrix[(row, 2)];
                matrix[(row, 0)] = cos * x - sin * z;
                matrix[(row, 2)] = sin * x + cos * z;
            }
        }
        Axis::Z => {
            for row in 0..matrix.nrows() {
                let x = matrix[(row, 0)];
                let y = matrix[(row, 1)];
                matrix[(row, 0)] = cos * x + sin * y;
                matrix[(row, 1)] = -sin * x + cos * y;
            }
        }
    }
    Ok(())
}

// Per-axis shorthands for `translate` and `rotate`
macro_rules! axis_ops {
    ($($name:ident => $op:ident($axis:expr);)*) => {
        $(
            pub fn $name<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
                matrix: &mut Matrix<f64, R, C, S>,
                value: f64,
            ) -> TransformResult<()> {
                $op(matrix, $axis, value)
            }
        )*
    };
}

axis_ops! {
    translate_x => translate(Axis::X);
    translate_y => translate(Axis::Y);
    translate_z => translate(Axis::Z);
    rotate_x => rotate(Axis::X);
    rotate_y => rotate(Axis::Y);
    rotate_z => rotate(Axis::Z);
}

/// Multiply every element by `factor`, whatever the column count.
///
/// A zero factor is rejected and leaves the matrix untouched.
pub fn scale<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
    matrix: &mut Matrix<f64, R, C, S>,
    factor: f64,
) -> TransformResult<()> {
    if factor == 0.0 {
        return Err(TransformError::ZeroScale);
    }
    trace!(factor, rows = matrix.nrows(), columns = matrix.ncols(), "scale");

    for value in matrix.iter_mut() {
        *value *= factor;
    }
    Ok(())
}

/// One affine primitive, as passed around by front ends.
///
/// The textual form is `<op>=<value>` with `op` one of `tx`, `ty`, `tz`,
/// `rx`, `ry`, `rz` (radians) or `s`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AffineOp {
    Translate(Axis, f64),
    Rotate(Axis, f64),
    Scale(f64),
}

impl AffineOp {
    pub fn apply<R: Dim, C: Dim, S: RawStorageMut<f64, R, C>>(
        &self,
        matrix: &mut Matrix<f64, R, C, S>,
    ) -> TransformResult<()> {
        match *self {
            AffineOp::Translate(axis, amount) => translate(matrix, axis, amount),
            AffineOp::Rotate(axis, angle) => rotate(matrix, axis, angle),
            AffineOp::Scale(factor) => scale(matrix, factor),
        }
    }
}

impl FromStr for AffineOp {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || TransformError::InvalidOp(s.to_string());
        let (name, value) = s.split_once('=').ok_or_else(invalid)?;
        let value: f64 = value.trim().parse().map_err(|_| invalid())?;

        let op = match name.trim() {
            "tx" => AffineOp::Translate(Axis::X, value),
            "ty" => AffineOp::Translate(Axis::Y, value),
            "tz" => AffineOp::Translate(Axis::Z, value),
            "rx" => AffineOp::Rotate(Axis::X, value),
            "ry" => AffineOp::Rotate(Axis::Y, value),
            "rz" => AffineOp::Rotate(Axis::Z, value),
            "s" => AffineOp::Scale(value),
            _ => return Err(invalid()),
        };
        Ok(op)
    }
}

impl fmt::Display for AffineOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AffineOp::Translate(axis, value) => write!(f, "t{}={}", axis.label(), value),
            AffineOp::Rotate(axis, value) => write!(f, "r{}={}", axis.label(), value),
            AffineOp::Scale(value) => write!(f, "s={}", value),
        }
    }
}
