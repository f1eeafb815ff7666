//! Weight tying: regions of one weight matrix that must hold equal values.
//!
//! Sharing is enforced by the update rule, not by aliasing storage. Two forms
//! exist: rectangular [`TiedBlock`]s declared by the caller (shared
//! embeddings), and [`SharedGroup`]s of scattered positions produced by the
//! 2-D connectivity builder (convolution filters).

use serde::{Serialize, Deserialize};
use std::ops::Range;

use crate::math::matrix::Matrix;

/// A `rows × cols` block of a weight matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TiedBlock {
    pub rows: Range<usize>,
    pub cols: Range<usize>,
}

impl TiedBlock {
    pub fn new(rows: Range<usize>, cols: Range<usize>) -> TiedBlock {
        TiedBlock { rows, cols }
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.cols.len())
    }
}

/// Checks that `blocks` is a usable tie declaration for a matrix of `shape`.
pub fn validate_blocks(blocks: &[TiedBlock], shape: (usize, usize)) -> Result<(), String> {
    let first = blocks.first().ok_or("at least one block is required")?;
    for (k, block) in blocks.iter().enumerate() {
        if block.rows.start > block.rows.end || block.cols.start > block.cols.end {
            return Err(format!("block {k} has a reversed range"));
        }
        if block.rows.end > shape.0 || block.cols.end > shape.1 {
            return Err(format!(
                "block {k} ({:?}, {:?}) exceeds weight matrix {}x{}",
                block.rows, block.cols, shape.0, shape.1
            ));
        }
        if block.shape() != first.shape() {
            return Err(format!(
                "block {k} has shape {:?}, block 0 has {:?}",
                block.shape(),
                first.shape()
            ));
        }
    }
    Ok(())
}

/// Replaces every tied block of `delta` with the blocks' average.
///
/// Block 0 accumulates the sum of all blocks, then is divided by the block
/// count except on `bias_row` (the bias unit's row keeps the summed value),
/// then copied over every other block. Entries outside the blocks keep their
/// own delta and are never divided by the block count.
pub fn average_tied(delta: &mut Matrix, blocks: &[TiedBlock], bias_row: Option<usize>) {
    let Some(first) = blocks.first() else { return };
    let n = blocks.len() as f64;

    let mut acc = delta.block(first.rows.clone(), first.cols.clone());
    for block in &blocks[1..] {
        acc = acc + delta.block(block.rows.clone(), block.cols.clone());
    }
    for (i, row) in acc.data.iter_mut().enumerate() {
        if Some(first.rows.start + i) == bias_row {
            continue;
        }
        row.iter_mut().for_each(|x| *x /= n);
    }

    for block in blocks {
        delta.set_block(block.rows.start, block.cols.start, &acc);
    }
}

/// Copies block 0 of `weights` over every other block, so tied blocks start
/// out equal.
pub fn replicate_first(weights: &mut Matrix, blocks: &[TiedBlock]) {
    let Some(first) = blocks.first() else { return };
    let source = weights.block(first.rows.clone(), first.cols.clone());
    for block in &blocks[1..] {
        weights.set_block(block.rows.start, block.cols.start, &source);
    }
}

/// Weight positions `(row, col)` that share one value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedGroup(pub Vec<(usize, usize)>);

/// Replaces the delta at every position of each group with the group mean.
pub fn average_shared(delta: &mut Matrix, groups: &[SharedGroup]) {
    for SharedGroup(positions) in groups {
        if positions.len() < 2 {
            continue;
        }
        let mean = positions.iter().map(|&(i, j)| delta.data[i][j]).sum::<f64>()
            / positions.len() as f64;
        for &(i, j) in positions {
            delta.data[i][j] = mean;
        }
    }
}

/// Copies the first position's weight over the rest of its group.
pub fn equalize_shared(weights: &mut Matrix, groups: &[SharedGroup]) {
    for SharedGroup(positions) in groups {
        if let Some(&(i0, j0)) = positions.first() {
            let value = weights.data[i0][j0];
            for &(i, j) in &positions[1..] {
                weights.data[i][j] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_blocks() -> Vec<TiedBlock> {
        vec![TiedBlock::new(0..2, 0..1), TiedBlock::new(2..4, 1..2)]
    }

    #[test]
    fn rejects_mismatched_blocks() {
        let blocks = vec![TiedBlock::new(0..2, 0..1), TiedBlock::new(2..3, 1..2)];
        assert!(validate_blocks(&blocks, (4, 2)).is_err());
        assert!(validate_blocks(&two_blocks(), (3, 2)).is_err());
        assert!(validate_blocks(&[], (3, 2)).is_err());
        assert!(validate_blocks(&two_blocks(), (4, 2)).is_ok());
    }

    #[test]
    fn averages_and_replicates() {
        let mut delta = Matrix::from_data(vec![
            vec![1.0, 9.0],
            vec![2.0, 9.0],
            vec![9.0, 3.0],
            vec![9.0, 6.0],
        ]);
        average_tied(&mut delta, &two_blocks(), None);
        assert_eq!(delta.block(0..2, 0..1), Matrix::from_data(vec![vec![2.0], vec![4.0]]));
        assert_eq!(delta.block(2..4, 1..2), delta.block(0..2, 0..1));
        // Entries outside the blocks are untouched.
        assert_eq!(delta.get(0, 1), 9.0);
        assert_eq!(delta.get(3, 0), 9.0);
    }

    #[test]
    fn untied_entries_are_not_scaled() {
        let blocks = vec![TiedBlock::new(0..1, 0..1), TiedBlock::new(1..2, 1..2)];
        let mut delta = Matrix::from_data(vec![
            vec![2.0, 5.0],
            vec![7.0, 4.0],
            vec![8.0, 8.0],
        ]);
        average_tied(&mut delta, &blocks, Some(2));
        assert_eq!(
            delta,
            Matrix::from_data(vec![vec![3.0, 5.0], vec![7.0, 3.0], vec![8.0, 8.0]])
        );
    }

    #[test]
    fn bias_row_keeps_the_sum() {
        let blocks = vec![TiedBlock::new(0..2, 0..1), TiedBlock::new(0..2, 1..2)];
        let mut delta = Matrix::from_data(vec![vec![1.0, 3.0], vec![4.0, 6.0]]);
        average_tied(&mut delta, &blocks, Some(1));
        assert_eq!(delta, Matrix::from_data(vec![vec![2.0, 2.0], vec![10.0, 10.0]]));
    }

    #[test]
    fn shared_groups_average() {
        let mut delta = Matrix::from_data(vec![vec![1.0, 0.0], vec![0.0, 3.0]]);
        let groups = vec![SharedGroup(vec![(0, 0), (1, 1)])];
        average_shared(&mut delta, &groups);
        assert_eq!(delta.get(0, 0), 2.0);
        assert_eq!(delta.get(1, 1), 2.0);

        let mut weights = Matrix::from_data(vec![vec![5.0, 0.0], vec![0.0, 1.0]]);
        equalize_shared(&mut weights, &groups);
        assert_eq!(weights.get(1, 1), 5.0);
    }
}
