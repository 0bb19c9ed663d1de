//! Integer math primitives backing exercise generation: matrices, GCD and radix conversion.
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::constants::{MAX_RADIX, MIN_RADIX};

/// Errors raised when an operation's shape or radix preconditions are violated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NumericError {
    #[error("matrix rows must be non-empty and of equal length")]
    NotRectangular,
    #[error("dimension mismatch: {left_rows}x{left_cols} vs {right_rows}x{right_cols}")]
    DimensionMismatch {
        left_rows: usize,
        left_cols: usize,
        right_rows: usize,
        right_cols: usize,
    },
    #[error("determinant requires a square matrix of size {expected} (got {rows}x{cols})")]
    UnsupportedShape {
        expected: &'static str,
        rows: usize,
        cols: usize,
    },
    #[error("radix {0} is outside 2..=16")]
    UnsupportedRadix(u32),
    #[error("'{input}' is not a valid base-{radix} integer")]
    InvalidDigits { input: String, radix: u32 },
    #[error("{0} overflows a 64-bit integer")]
    Overflow(&'static str),
}

/// Rectangular integer matrix stored row-major.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<i64>>", into = "Vec<Vec<i64>>")]
pub struct Matrix {
    rows: Vec<Vec<i64>>,
}

impl Matrix {
    /// Build a matrix from rows, rejecting empty or ragged input.
    ///
    /// # Errors
    ///
    /// Returns [`NumericError::NotRectangular`] when there are no rows, a row is
    /// empty, or rows differ in length.
    pub fn new(rows: Vec<Vec<i64>>) -> Result<Self, NumericError> {
        let width = rows.first().map_or(0, Vec::len);
        if width == 0 || rows.iter().any(|row| row.len() != width) {
            return Err(NumericError::NotRectangular);
        }
        Ok(Self { rows })
    }

    /// Build a matrix by evaluating `cell(row, col)` for every position.
    ///
    /// Zero-sized dimensions are bumped to 1 so the result is always valid.
    pub fn from_fn(rows: usize, cols: usize, mut cell: impl FnMut(usize, usize) -> i64) -> Self {
        let (rows, cols) = (rows.max(1), cols.max(1));
        let data = (0..rows)
            .map(|r| (0..cols).map(|c| cell(r, c)).collect())
            .collect();
        Self { rows: data }
    }

    fn try_from_fn(
        rows: usize,
        cols: usize,
        mut cell: impl FnMut(usize, usize) -> Result<i64, NumericError>,
    ) -> Result<Self, NumericError> {
        let data = (0..rows)
            .map(|r| (0..cols).map(|c| cell(r, c)).collect())
            .collect::<Result<_, _>>()?;
        Self::new(data)
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn col_count(&self) -> usize {
        self.rows.first().map_or(0, Vec::len)
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<i64>] {
        &self.rows
    }

    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> Option<i64> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    #[must_use]
    pub fn is_square(&self) -> bool {
        self.row_count() == self.col_count()
    }

    /// Row-major iterator over every cell.
    pub fn cells(&self) -> impl Iterator<Item = i64> + '_ {
        self.rows.iter().flatten().copied()
    }

    /// Row-major values joined by commas, e.g. `1,2,3,4`.
    #[must_use]
    pub fn flattened(&self) -> String {
        self.cells()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",")
    }

    /// Compact bracketed form, e.g. `[[1,2],[3,4]]`.
    #[must_use]
    pub fn bracketed(&self) -> String {
        let rows: Vec<String> = self
            .rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = row.iter().map(ToString::to_string).collect();
                format!("[{}]", cells.join(","))
            })
            .collect();
        format!("[{}]", rows.join(","))
    }
}

impl TryFrom<Vec<Vec<i64>>> for Matrix {
    type Error = NumericError;

    fn try_from(rows: Vec<Vec<i64>>) -> Result<Self, Self::Error> {
        Self::new(rows)
    }
}

impl From<Matrix> for Vec<Vec<i64>> {
    fn from(matrix: Matrix) -> Self {
        matrix.rows
    }
}

impl std::fmt::Display for Matrix {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.bracketed())
    }
}

fn add(lhs: i64, rhs: i64, what: &'static str) -> Result<i64, NumericError> {
    lhs.checked_add(rhs).ok_or(NumericError::Overflow(what))
}

fn sub(lhs: i64, rhs: i64, what: &'static str) -> Result<i64, NumericError> {
    lhs.checked_sub(rhs).ok_or(NumericError::Overflow(what))
}

fn mul(lhs: i64, rhs: i64, what: &'static str) -> Result<i64, NumericError> {
    lhs.checked_mul(rhs).ok_or(NumericError::Overflow(what))
}

fn mismatch(a: &Matrix, b: &Matrix) -> NumericError {
    NumericError::DimensionMismatch {
        left_rows: a.row_count(),
        left_cols: a.col_count(),
        right_rows: b.row_count(),
        right_cols: b.col_count(),
    }
}

/// Element-wise sum of two equally sized matrices.
///
/// # Errors
///
/// Returns [`NumericError::DimensionMismatch`] when the shapes differ and
/// [`NumericError::Overflow`] when a cell sum leaves the `i64` range.
pub fn matrix_add(a: &Matrix, b: &Matrix) -> Result<Matrix, NumericError> {
    if a.row_count() != b.row_count() || a.col_count() != b.col_count() {
        return Err(mismatch(a, b));
    }
    Matrix::try_from_fn(a.row_count(), a.col_count(), |r, c| {
        add(a.rows[r][c], b.rows[r][c], "matrix sum")
    })
}

/// Standard matrix product `a × b`.
///
/// # Errors
///
/// Returns [`NumericError::DimensionMismatch`] unless `cols(a) == rows(b)`,
/// and [`NumericError::Overflow`] when a dot product leaves the `i64` range.
pub fn matrix_multiply(a: &Matrix, b: &Matrix) -> Result<Matrix, NumericError> {
    if a.col_count() != b.row_count() {
        return Err(mismatch(a, b));
    }
    let inner = a.col_count();
    Matrix::try_from_fn(a.row_count(), b.col_count(), |r, c| {
        (0..inner).try_fold(0_i64, |acc, k| {
            add(acc, mul(a.rows[r][k], b.rows[k][c], "matrix product")?, "matrix product")
        })
    })
}

#[must_use]
pub fn transpose(m: &Matrix) -> Matrix {
    Matrix::from_fn(m.col_count(), m.row_count(), |r, c| m.rows[c][r])
}

/// `m00*m11 - m01*m10`.
///
/// # Errors
///
/// Returns [`NumericError::UnsupportedShape`] unless `m` is 2×2, and
/// [`NumericError::Overflow`] when an intermediate product overflows.
pub fn determinant_2x2(m: &Matrix) -> Result<i64, NumericError> {
    require_square(m, 2, "2")?;
    let r = &m.rows;
    cross(r[0][0], r[1][1], r[0][1], r[1][0])
}

/// `a*d - b*c` without silent wrap-around.
fn cross(a: i64, d: i64, b: i64, c: i64) -> Result<i64, NumericError> {
    sub(mul(a, d, "determinant")?, mul(b, c, "determinant")?, "determinant")
}

/// Cofactor expansion along the first row.
///
/// # Errors
///
/// Returns [`NumericError::UnsupportedShape`] unless `m` is 3×3, and
/// [`NumericError::Overflow`] when an intermediate term overflows.
pub fn determinant_3x3(m: &Matrix) -> Result<i64, NumericError> {
    require_square(m, 3, "3")?;
    let r = &m.rows;
    let minor = |c0: usize, c1: usize| cross(r[1][c0], r[2][c1], r[1][c1], r[2][c0]);
    let first = mul(r[0][0], minor(1, 2)?, "determinant")?;
    let second = mul(r[0][1], minor(0, 2)?, "determinant")?;
    let third = mul(r[0][2], minor(0, 1)?, "determinant")?;
    add(sub(first, second, "determinant")?, third, "determinant")
}

/// Determinant of a 1×1, 2×2 or 3×3 matrix.
///
/// # Errors
///
/// Returns [`NumericError::UnsupportedShape`] for any other shape.
pub fn determinant(m: &Matrix) -> Result<i64, NumericError> {
    match (m.row_count(), m.col_count()) {
        (1, 1) => Ok(m.rows[0][0]),
        (2, 2) => determinant_2x2(m),
        (3, 3) => determinant_3x3(m),
        (rows, cols) => Err(NumericError::UnsupportedShape {
            expected: "1, 2 or 3",
            rows,
            cols,
        }),
    }
}

fn require_square(m: &Matrix, size: usize, label: &'static str) -> Result<(), NumericError> {
    if m.row_count() == size && m.col_count() == size {
        Ok(())
    } else {
        Err(NumericError::UnsupportedShape {
            expected: label,
            rows: m.row_count(),
            cols: m.col_count(),
        })
    }
}

/// Greatest common divisor by the iterative Euclidean algorithm on absolute values.
#[must_use]
pub fn gcd(a: i64, b: i64) -> u64 {
    let (mut a, mut b) = (a.unsigned_abs(), b.unsigned_abs());
    while b != 0 {
        let remainder = a % b;
        a = b;
        b = remainder;
    }
    a
}

fn check_radix(radix: u32) -> Result<(), NumericError> {
    if (MIN_RADIX..=MAX_RADIX).contains(&radix) {
        Ok(())
    } else {
        Err(NumericError::UnsupportedRadix(radix))
    }
}

fn digit_char(digit: u64, radix: u32) -> char {
    u32::try_from(digit)
        .ok()
        .and_then(|d| char::from_digit(d, radix))
        .map_or('?', |c| c.to_ascii_uppercase())
}

/// Render `n` in `radix` using uppercase digits; negative values keep a leading `-`.
///
/// # Errors
///
/// Returns [`NumericError::UnsupportedRadix`] outside `2..=16`.
pub fn convert_base(n: i64, radix: u32) -> Result<String, NumericError> {
    check_radix(radix)?;
    let base = u64::from(radix);
    let mut value = n.unsigned_abs();
    if value == 0 {
        return Ok("0".to_string());
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(digit_char(value % base, radix));
        value /= base;
    }
    if n < 0 {
        digits.push('-');
    }
    Ok(digits.into_iter().rev().collect())
}

/// Parse a (case-insensitive) integer literal written in `radix`.
///
/// # Errors
///
/// Returns [`NumericError::UnsupportedRadix`] or [`NumericError::InvalidDigits`].
pub fn parse_in_base(input: &str, radix: u32) -> Result<i64, NumericError> {
    check_radix(radix)?;
    let trimmed = input.trim();
    i64::from_str_radix(trimmed, radix).map_err(|_| NumericError::InvalidDigits {
        input: trimmed.to_string(),
        radix,
    })
}

const STEP_INVALID: &str = "Valeur invalide";
const STEP_ZERO: &str = "0 = 0";

/// Successive-division trace converting `n` into `radix`.
///
/// Each line reads `dividend ÷ base = quotient reste digit`; the last line is
/// `Résultat : digits`. Negative input or an unsupported radix yields a single
/// `Valeur invalide` entry and zero yields `0 = 0`.
#[must_use]
pub fn conversion_steps(n: i64, radix: u32) -> Vec<String> {
    if n < 0 || check_radix(radix).is_err() {
        return vec![STEP_INVALID.to_string()];
    }
    if n == 0 {
        return vec![STEP_ZERO.to_string()];
    }

    let base = u64::from(radix);
    let mut current = n.unsigned_abs();
    let mut steps = Vec::new();
    let mut digits = Vec::new();
    while current > 0 {
        let quotient = current / base;
        let digit = digit_char(current % base, radix);
        steps.push(format!("{current} ÷ {radix} = {quotient} reste {digit}"));
        digits.push(digit);
        current = quotient;
    }
    let result: String = digits.into_iter().rev().collect();
    steps.push(format!("Résultat : {result}"));
    steps
}

/// Parse `input` in `source_radix`, then trace its conversion into `target_radix`.
///
/// Unparseable input yields the single `Valeur invalide` entry.
#[must_use]
pub fn conversion_steps_from_str(input: &str, source_radix: u32, target_radix: u32) -> Vec<String> {
    match parse_in_base(input, source_radix) {
        Ok(value) => conversion_steps(value, target_radix),
        Err(_) => vec![STEP_INVALID.to_string()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn m(rows: &[&[i64]]) -> Matrix {
        Matrix::new(rows.iter().map(|r| r.to_vec()).collect()).unwrap()
    }

    #[test]
    fn matrix_rejects_ragged_and_empty_rows() {
        assert_eq!(Matrix::new(vec![]), Err(NumericError::NotRectangular));
        assert_eq!(Matrix::new(vec![vec![]]), Err(NumericError::NotRectangular));
        assert_eq!(
            Matrix::new(vec![vec![1, 2], vec![3]]),
            Err(NumericError::NotRectangular)
        );
    }

    #[test]
    fn add_sums_cells_and_checks_shape() {
        let a = m(&[&[1, 2], &[3, 4]]);
        let b = m(&[&[-1, 0], &[5, 5]]);
        assert_eq!(matrix_add(&a, &b).unwrap(), m(&[&[0, 2], &[8, 9]]));
        let c = m(&[&[1, 2, 3]]);
        assert!(matches!(
            matrix_add(&a, &c),
            Err(NumericError::DimensionMismatch { .. })
        ));
    }

    #[test]
    fn multiply_produces_dot_products_with_expected_shape() {
        let a = m(&[&[1, 2, 3], &[4, 5, 6]]);
        let b = m(&[&[7, 8], &[9, 10], &[11, 12]]);
        let product = matrix_multiply(&a, &b).unwrap();
        assert_eq!(product.row_count(), 2);
        assert_eq!(product.col_count(), 2);
        for r in 0..2 {
            for c in 0..2 {
                let dot: i64 = (0..3).map(|k| a.rows()[r][k] * b.rows()[k][c]).sum();
                assert_eq!(product.get(r, c), Some(dot));
            }
        }
        assert_eq!(product, m(&[&[58, 64], &[139, 154]]));
        assert!(matrix_multiply(&a, &a).is_err());
    }

    #[test]
    fn determinants_match_hand_computed_values() {
        assert_eq!(determinant_2x2(&m(&[&[2, 3], &[1, 4]])), Ok(5));
        let three = m(&[&[2, 0, 1], &[1, 3, 2], &[1, 1, 2]]);
        assert_eq!(determinant_3x3(&three), Ok(6));
        assert_eq!(determinant(&three), Ok(6));
        assert_eq!(determinant(&m(&[&[7]])), Ok(7));
        assert!(determinant_2x2(&three).is_err());
        assert!(determinant(&m(&[&[1, 2]])).is_err());
    }

    #[test]
    fn transpose_swaps_axes() {
        let a = m(&[&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!(transpose(&a), m(&[&[1, 4], &[2, 5], &[3, 6]]));
    }

    #[test]
    fn gcd_is_symmetric_and_handles_zero() {
        assert_eq!(gcd(48, 18), 6);
        assert_eq!(gcd(18, 48), 6);
        assert_eq!(gcd(-12, 0), 12);
        assert_eq!(gcd(0, -12), 12);
        assert_eq!(gcd(0, 0), 0);
        assert_eq!(gcd(i64::MIN, 0), 1u64 << 63);
        for a in -30..30 {
            for b in -30..30 {
                assert_eq!(gcd(a, b), gcd(b, a));
            }
        }
    }

    #[test]
    fn convert_base_round_trips_for_every_radix() {
        for radix in 2..=16 {
            for n in [0_i64, 1, 7, 10, 15, 16, 255, 4096, 65_535, 1_000_003] {
                let text = convert_base(n, radix).unwrap();
                assert_eq!(text, text.to_uppercase());
                assert_eq!(parse_in_base(&text, radix), Ok(n), "radix {radix} n {n}");
            }
        }
        assert_eq!(convert_base(255, 16).unwrap(), "FF");
        assert_eq!(convert_base(-5, 2).unwrap(), "-101");
        assert_eq!(convert_base(3, 1), Err(NumericError::UnsupportedRadix(1)));
        assert_eq!(convert_base(3, 17), Err(NumericError::UnsupportedRadix(17)));
    }

    #[test]
    fn parse_accepts_lowercase_and_rejects_junk() {
        assert_eq!(parse_in_base("ff", 16), Ok(255));
        assert_eq!(parse_in_base(" 1010 ", 2), Ok(10));
        assert!(matches!(
            parse_in_base("102", 2),
            Err(NumericError::InvalidDigits { .. })
        ));
    }

    #[test]
    fn conversion_steps_trace_successive_divisions() {
        let steps = conversion_steps(13, 2);
        assert_eq!(
            steps,
            vec![
                "13 ÷ 2 = 6 reste 1",
                "6 ÷ 2 = 3 reste 0",
                "3 ÷ 2 = 1 reste 1",
                "1 ÷ 2 = 0 reste 1",
                "Résultat : 1101",
            ]
        );
        assert_eq!(
            conversion_steps(255, 16),
            vec!["255 ÷ 16 = 15 reste F", "15 ÷ 16 = 0 reste F", "Résultat : FF"]
        );
    }

    #[test]
    fn conversion_steps_edge_cases() {
        assert_eq!(conversion_steps(0, 2), vec!["0 = 0"]);
        assert_eq!(conversion_steps(-4, 2), vec!["Valeur invalide"]);
        assert_eq!(conversion_steps_from_str("zz", 10, 2), vec!["Valeur invalide"]);
        assert_eq!(
            conversion_steps_from_str("A", 16, 2).last().map(String::as_str),
            Some("Résultat : 1010")
        );
    }

    #[test]
    fn matrix_renders_bracketed_and_flattened() {
        let a = m(&[&[1, -2], &[3, 4]]);
        assert_eq!(a.bracketed(), "[[1,-2],[3,4]]");
        assert_eq!(a.flattened(), "1,-2,3,4");
        assert_eq!(serde_json::to_string(&a).unwrap(), a.bracketed());
        let parsed: Matrix = serde_json::from_str("[[5,6],[7,8]]").unwrap();
        assert_eq!(parsed, m(&[&[5, 6], &[7, 8]]));
        assert!(serde_json::from_str::<Matrix>("[[1],[2,3]]").is_err());
    }

    #[test]
    fn overflow_is_reported_instead_of_wrapping() {
        let big = m(&[&[i64::MAX, 1], &[1, 1]]);
        assert_eq!(
            matrix_multiply(&big, &big),
            Err(NumericError::Overflow("matrix product"))
        );
        assert_eq!(matrix_add(&big, &big), Err(NumericError::Overflow("matrix sum")));
        assert_eq!(
            determinant_2x2(&m(&[&[i64::MAX, 2], &[2, i64::MAX]])),
            Err(NumericError::Overflow("determinant"))
        );
        let tall = m(&[&[i64::MAX, 0, 0], &[0, 2, 0], &[0, 0, 1]]);
        assert_eq!(determinant(&tall), Err(NumericError::Overflow("determinant")));

        let edge = m(&[&[i64::MAX, 0], &[0, 1]]);
        assert_eq!(determinant(&edge), Ok(i64::MAX));
        assert_eq!(matrix_multiply(&edge, &m(&[&[1, 0], &[0, 1]])), Ok(edge));
    }
}
