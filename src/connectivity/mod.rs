//! Connection masks between two adjacent layers.
//!
//! A mask has one row per source unit (plus a trailing bias row when the
//! target declares a bias) and one column per target unit. Entry `(i, j)` is
//! nonzero when source unit `i` may feed target unit `j`.

use std::ops::Range;

use crate::error::{NetError, Result};
use crate::layers::kind::LayerKind;
use crate::layers::layer::Layer;
use crate::math::matrix::Matrix;
use crate::tying::SharedGroup;

/// Geometry of a 2-D layer: `maps` grids of `rows × cols`, flattened
/// column-major within a map and map after map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
    pub maps: usize,
}

impl Grid {
    pub fn of(layer: &Layer) -> Grid {
        Grid {
            rows: layer.rows(),
            cols: layer.columns(),
            maps: layer.maps(),
        }
    }

    pub fn index(&self, map: usize, row: usize, col: usize) -> usize {
        map * self.rows * self.cols + row + col * self.rows
    }
}

/// Fresh mask for `from_units → to_units`, with the bias row appended when the
/// target has a bias.
pub fn empty_mask(from_units: usize, to_units: usize, bias: Option<f64>) -> Matrix {
    let mask = Matrix::zeros(from_units, to_units);
    match bias {
        Some(value) => {
            let mut mask = mask;
            mask.data.push(vec![value; to_units]);
            mask.rows += 1;
            mask
        }
        None => mask,
    }
}

/// Validates an optional half-open subset against `layer`, defaulting to all
/// of its units.
pub fn resolve_subset(layer: &Layer, subset: Option<Range<usize>>) -> Result<Range<usize>> {
    let units = layer.units();
    match subset {
        None => Ok(0..units),
        Some(range) => {
            if range.start > range.end || range.end > units {
                return Err(NetError::SubsetOutOfRange {
                    layer: layer.name().to_string(),
                    start: range.start,
                    end: range.end,
                    units,
                });
            }
            Ok(range)
        }
    }
}

/// Turns on every mask entry in `from × to`.
pub fn activate_block(mask: &mut Matrix, from: Range<usize>, to: Range<usize>) {
    for i in from {
        for j in to.clone() {
            mask.data[i][j] = 1.0;
        }
    }
}

/// Connects each target unit to the `side × side` window of source units at
/// `stride × (row, col)`.
///
/// A pooling target reads only the matching source map and has no shared
/// weights. A convolution target reads every source map; each target map
/// owns one filter, and every filter position is shared across all of the
/// map's offsets. The returned groups list those shared positions.
pub fn connect_windows(
    mask: &mut Matrix,
    source: Grid,
    target: Grid,
    target_layer: &Layer,
) -> Result<Vec<SharedGroup>> {
    let (stride, side) = match (target_layer.stride(), target_layer.feature_side()) {
        (Some(stride), Some(side)) if stride > 0 && side > 0 => (stride, side),
        _ => return Err(NetError::MissingGeometry(target_layer.name().to_string())),
    };

    let pooling = target_layer.kind() == LayerKind::AveragePool;
    if pooling && source.maps != target.maps {
        return Err(NetError::InvalidLayer {
            layer: target_layer.name().to_string(),
            reason: format!(
                "pooling over {} source maps needs {} maps, has {}",
                source.maps, source.maps, target.maps
            ),
        });
    }

    let filter_len = source.maps * side * side;
    let mut groups: Vec<Vec<(usize, usize)>> = if pooling {
        Vec::new()
    } else {
        vec![Vec::new(); target.maps * filter_len]
    };

    for tm in 0..target.maps {
        let source_maps = if pooling { tm..tm + 1 } else { 0..source.maps };
        for tc in 0..target.cols {
            for tr in 0..target.rows {
                let (oi, oj) = (tr * stride, tc * stride);
                if oi + side > source.rows || oj + side > source.cols {
                    return Err(NetError::WindowOutOfRange {
                        layer: target_layer.name().to_string(),
                        row: tr,
                        col: tc,
                    });
                }
                let to = target.index(tm, tr, tc);
                for sm in source_maps.clone() {
                    for dj in 0..side {
                        for di in 0..side {
                            let from = source.index(sm, oi + di, oj + dj);
                            mask.data[from][to] = 1.0;
                            if !pooling {
                                let slot = tm * filter_len + (sm * side + dj) * side + di;
                                groups[slot].push((from, to));
                            }
                        }
                    }
                }
            }
        }
    }

    Ok(groups.into_iter().map(SharedGroup).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layers::config::LayerConfig;

    fn grid_layer(name: &str, kind: LayerKind, rows: usize, cols: usize, maps: usize) -> Layer {
        Layer::new(LayerConfig {
            kind,
            rows,
            maps,
            stride: Some(2),
            feature_side: Some(2),
            ..LayerConfig::new(name, cols)
        })
        .unwrap()
    }

    #[test]
    fn column_major_indexing() {
        let g = Grid { rows: 3, cols: 2, maps: 2 };
        assert_eq!(g.index(0, 2, 0), 2);
        assert_eq!(g.index(0, 0, 1), 3);
        assert_eq!(g.index(1, 0, 0), 6);
    }

    #[test]
    fn bias_row_is_scaled() {
        let mask = empty_mask(2, 3, Some(0.5));
        assert_eq!(mask.shape(), (3, 3));
        assert_eq!(mask.data[2], vec![0.5; 3]);
        assert_eq!(empty_mask(2, 3, None).shape(), (2, 3));
    }

    #[test]
    fn pooling_windows_do_not_overlap() {
        let source = grid_layer("conv", LayerKind::Convolution, 4, 4, 1);
        let target = grid_layer("pool", LayerKind::AveragePool, 2, 2, 1);
        let mut mask = empty_mask(16, 4, None);
        let groups = connect_windows(&mut mask, Grid::of(&source), Grid::of(&target), &target).unwrap();
        assert!(groups.is_empty());
        for i in 0..16 {
            let row_sum: f64 = mask.data[i].iter().sum();
            assert_eq!(row_sum, 1.0, "source unit {i} feeds exactly one pool unit");
        }
        // Unit (1, 1) of the pool reads source rows 2..4 and columns 2..4.
        let sources: Vec<usize> = (0..16).filter(|&i| mask.get(i, 3) == 1.0).collect();
        assert_eq!(sources, vec![10, 11, 14, 15]);
    }

    #[test]
    fn convolution_shares_filter_positions() {
        let source = grid_layer("image", LayerKind::Input, 4, 4, 1);
        let target = grid_layer("conv", LayerKind::Convolution, 2, 2, 2);
        let mut mask = empty_mask(16, 8, None);
        let groups = connect_windows(&mut mask, Grid::of(&source), Grid::of(&target), &target).unwrap();
        // Two maps, one 2x2 filter each.
        assert_eq!(groups.len(), 8);
        assert!(groups.iter().all(|g| g.0.len() == 4));
        assert_eq!(mask.count_nonzero(), 8 * 4);
    }

    #[test]
    fn window_must_fit() {
        let source = grid_layer("image", LayerKind::Input, 3, 3, 1);
        let target = grid_layer("conv", LayerKind::Convolution, 2, 2, 1);
        let mut mask = empty_mask(9, 4, None);
        let err = connect_windows(&mut mask, Grid::of(&source), Grid::of(&target), &target);
        assert!(matches!(err, Err(NetError::WindowOutOfRange { .. })));
    }
}
