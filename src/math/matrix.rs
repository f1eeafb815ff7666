use rand::Rng;
use serde::{Serialize, Deserialize};
use std::ops::{Add, Sub, Mul, Range};

/// Dense row-major matrix. Columns of an activation or gradient matrix are
/// independent samples of a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix{
    pub rows: usize,
    pub cols: usize,
    pub data: Vec<Vec<f64>>
}

impl Matrix{
    pub fn zeros(rows: usize, cols: usize) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![0.0; cols]; rows]
        }
    }

    pub fn filled(rows: usize, cols: usize, value: f64) -> Matrix {
        Matrix{
            rows,
            cols,
            data: vec![vec![value; cols]; rows]
        }
    }

    /// Samples every entry from U(0, 1).
    pub fn uniform<R: Rng + ?Sized>(rows: usize, cols: usize, rng: &mut R) -> Matrix {
        let mut res = Matrix::zeros(rows, cols);

        for i in 0..rows {
            for j in 0..cols {
                res.data[i][j] = rng.gen::<f64>();
            }
        }

        res
    }

    /// Builds a matrix from rows. An empty outer vector gives a 0×0 matrix.
    pub fn from_data(data: Vec<Vec<f64>>) -> Matrix {
        Matrix {
            rows: data.len(),
            cols: data.first().map_or(0, |row| row.len()),
            data
        }
    }

    /// Builds a matrix from columns (one `Vec` per sample).
    pub fn from_columns(columns: &[Vec<f64>]) -> Matrix {
        let cols = columns.len();
        let rows = columns.first().map_or(0, |c| c.len());
        let mut res = Matrix::zeros(rows, cols);
        for (j, column) in columns.iter().enumerate() {
            for (i, &x) in column.iter().enumerate().take(rows) {
                res.data[i][j] = x;
            }
        }
        res
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row][col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row][col] = value;
    }

    pub fn transpose(&self) -> Matrix {
        let mut res = Matrix::zeros(self.cols, self.rows);

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] = self.data[j][i];
            }
        }

        res
    }

    pub fn map<F>(&self, functor: F) -> Matrix
    where
        F: Fn(f64) -> f64,
    {
        Matrix {
            rows: self.rows,
            cols: self.cols,
            data: self.data.iter()
                .map(|row| row.iter().map(|&x| functor(x)).collect())
                .collect(),
        }
    }

    pub fn scale(&self, factor: f64) -> Matrix {
        self.map(|x| x * factor)
    }

    /// Element-wise (Hadamard) product of two same-shape matrices.
    pub fn hadamard(&self, rhs: &Matrix) -> Matrix {
        assert_eq!(self.shape(), rhs.shape(), "Matrices are of incorrect sizes");
        let data = self.data.iter().zip(rhs.data.iter())
            .map(|(row_a, row_b)| {
                row_a.iter().zip(row_b.iter()).map(|(x, y)| x * y).collect()
            })
            .collect();
        Matrix { rows: self.rows, cols: self.cols, data }
    }

    /// Largest entry of the whole matrix; `-inf` when empty.
    /// Largest entry of column `col`.
    pub fn column_max(&self, col: usize) -> f64 {
        self.data.iter()
            .map(|row| row[col])
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn column(&self, col: usize) -> Vec<f64> {
        self.data.iter().map(|row| row[col]).collect()
    }

    /// Copy of the columns in `range` (a slice of a batch).
    pub fn columns(&self, range: Range<usize>) -> Matrix {
        let width = range.len();
        Matrix {
            rows: self.rows,
            cols: width,
            data: self.data.iter().map(|row| row[range.clone()].to_vec()).collect(),
        }
    }

    /// Copy with a row of ones appended (the always-on bias unit).
    pub fn with_ones_row(&self) -> Matrix {
        let mut res = self.clone();
        res.data.push(vec![1.0; self.cols]);
        res.rows += 1;
        res
    }

    /// Copy of the first `rows` rows.
    pub fn top_rows(&self, rows: usize) -> Matrix {
        Matrix {
            rows,
            cols: self.cols,
            data: self.data[..rows].to_vec(),
        }
    }

    /// Copy of the rectangular block `rows × cols`.
    pub fn block(&self, rows: Range<usize>, cols: Range<usize>) -> Matrix {
        Matrix {
            rows: rows.len(),
            cols: cols.len(),
            data: self.data[rows].iter().map(|row| row[cols.clone()].to_vec()).collect(),
        }
    }

    /// Overwrites the block starting at `(row, col)` with `src`.
    pub fn set_block(&mut self, row: usize, col: usize, src: &Matrix) {
        for i in 0..src.rows {
            self.data[row + i][col..col + src.cols].copy_from_slice(&src.data[i]);
        }
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().flat_map(|row| row.iter()).sum()
    }

    pub fn count_nonzero(&self) -> usize {
        self.data.iter().flat_map(|row| row.iter()).filter(|&&x| x != 0.0).count()
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Matrix { rows: 0, cols: 0, data: vec![] }
    }
}

impl Add for Matrix {
    type Output = Matrix;

    fn add(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self;

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] += rhs.data[i][j];
            }
        }

        res
    }
}

impl Sub for Matrix {
    type Output = Matrix;

    fn sub(self, rhs: Self) -> Self::Output {
        if self.rows != rhs.rows || self.cols != rhs.cols {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = self;

        for i in 0..res.rows {
            for j in 0..res.cols {
                res.data[i][j] -= rhs.data[i][j];
            }
        }

        res
    }
}

impl<'a> Mul<&'a Matrix> for &'a Matrix {
    type Output = Matrix;

    fn mul(self, rhs: &'a Matrix) -> Self::Output {
        if self.cols != rhs.rows {
            panic!("Matrices are of incorrect sizes")
        }

        let mut res = Matrix::zeros(self.rows, rhs.cols);

        for i in 0..self.rows {
            for k in 0..self.cols {
                let a = self.data[i][k];
                if a == 0.0 {
                    continue;
                }
                for j in 0..rhs.cols {
                    res.data[i][j] += a * rhs.data[k][j];
                }
            }
        }

        res
    }
}

impl Mul for Matrix {
    type Output = Matrix;

    fn mul(self, rhs: Self) -> Self::Output {
        &self * &rhs
    }
}
