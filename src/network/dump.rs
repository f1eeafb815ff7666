//! Plain-text dumps of weight and activation matrices for external
//! inspection. The engine never reads them back.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::info;

use crate::error::Result;
use crate::math::matrix::Matrix;
use crate::network::network::Network;

/// Writes `matrix` one row per line, entries tab-separated in `{:.18e}`.
pub fn write_tsv<W: Write>(matrix: &Matrix, mut writer: W) -> Result<()> {
    for row in &matrix.data {
        let line = row.iter().map(|x| format!("{x:.18e}")).collect::<Vec<_>>().join("\t");
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;
    Ok(())
}

/// Reads a table written by [`write_tsv`].
pub fn read_tsv(text: &str) -> std::result::Result<Matrix, std::num::ParseFloatError> {
    let data = text
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.split('\t').map(str::parse).collect())
        .collect::<std::result::Result<Vec<Vec<f64>>, _>>()?;
    Ok(Matrix::from_data(data))
}

fn write_file(path: &Path, matrix: &Matrix) -> Result<()> {
    let writer = BufWriter::new(File::create(path)?);
    write_tsv(matrix, writer)
}

impl Network {
    /// Writes `<layer>.tsv` into `dir` for every connected layer.
    pub fn dump_weights(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for layer in &self.layers {
            if let Some(w) = layer.weights() {
                let path = dir.as_ref().join(format!("{}.tsv", layer.name()));
                write_file(&path, w)?;
                written.push(path);
            }
        }
        info!(files = written.len(), dir = %dir.as_ref().display(), "dumped weights");
        Ok(written)
    }

    /// Writes `<layer>_y.tsv` into `dir` for every layer with a cached
    /// activation.
    pub fn dump_activations(&self, dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for layer in &self.layers {
            if let Some(y) = layer.activation() {
                let path = dir.as_ref().join(format!("{}_y.tsv", layer.name()));
                write_file(&path, y)?;
                written.push(path);
            }
        }
        info!(files = written.len(), dir = %dir.as_ref().display(), "dumped activations");
        Ok(written)
    }
}
