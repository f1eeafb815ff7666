// 2-D support covers valid windows only: no padding, and every window must
// fit inside the source grid.

use embednet::{LayerConfig, LayerId, LayerKind, Matrix, NetError, Network, NeuronType};

struct Stack {
    net: Network,
    image: LayerId,
    conv: LayerId,
    pool: LayerId,
    out: LayerId,
}

// image 5x5 -> conv 4x4 (2x2 filter, stride 1) -> pool 2x2 -> two softmax units
fn stack() -> Stack {
    let mut net = Network::with_seed(31);
    let image = net
        .add_layer(
            LayerConfig::new("image", 5)
                .kind(LayerKind::Input)
                .grid(5, 1, None, None)
                .learning_rate(0.5)
                .init_weight(0.5),
        )
        .unwrap();
    let conv = net
        .add_layer(LayerConfig::new("conv", 4).kind(LayerKind::Convolution).grid(4, 1, Some(1), Some(2)))
        .unwrap();
    let pool = net
        .add_layer(
            LayerConfig::new("pool", 2)
                .kind(LayerKind::AveragePool)
                .neuron(NeuronType::Linear)
                .grid(2, 1, Some(2), Some(2)),
        )
        .unwrap();
    let out = net
        .add_layer(
            LayerConfig::new("out", 2)
                .kind(LayerKind::Convolution)
                .neuron(NeuronType::Softmax)
                .grid(1, 1, Some(1), Some(1)),
        )
        .unwrap();
    net.connect(image, conv, None, None).unwrap();
    net.connect(conv, pool, None, None).unwrap();
    net.connect(pool, out, None, None).unwrap();
    Stack { net, image, conv, pool, out }
}

fn batch() -> (Matrix, Matrix) {
    let a: Vec<f64> = (0..25).map(|k| (k % 5) as f64 / 4.0).collect();
    let b: Vec<f64> = (0..25).map(|k| (k / 5) as f64 / 4.0).collect();
    let inputs = Matrix::from_columns(&[a, b]);
    let targets = Matrix::from_columns(&[vec![1.0, 0.0], vec![0.0, 1.0]]);
    (inputs, targets)
}

fn assert_groups_equal(net: &Network, id: LayerId) {
    let layer = net.layer(id).unwrap();
    let w = layer.weights().unwrap();
    for group in layer.shared_groups() {
        let (i0, j0) = group.0[0];
        for &(i, j) in &group.0 {
            assert_eq!(w.get(i, j), w.get(i0, j0));
        }
    }
}

#[test]
fn convolution_mask_and_filters() {
    let s = stack();
    let image = s.net.layer(s.image).unwrap();
    assert_eq!(image.weights().unwrap().shape(), (25, 16));
    assert_eq!(image.mask().unwrap().count_nonzero(), 16 * 4);
    assert_eq!(image.shared_groups().len(), 4);
    assert!(image.shared_groups().iter().all(|g| g.0.len() == 16));
    assert!(!image.is_frozen());
    assert_groups_equal(&s.net, s.image);
}

#[test]
fn pooling_weights_average_their_window() {
    let s = stack();
    let conv = s.net.layer(s.conv).unwrap();
    assert!(conv.is_frozen());
    let w = conv.weights().unwrap();
    for j in 0..4 {
        let column: f64 = (0..16).map(|i| w.get(i, j)).sum();
        assert!((column - 1.0).abs() < 1e-12);
    }
    assert!(s.net.layer(s.pool).unwrap().is_frozen());
}

#[test]
fn forward_and_backward_through_the_stack() {
    let mut s = stack();
    let (inputs, targets) = batch();
    let conv_before = s.net.layer(s.conv).unwrap().weights().unwrap().clone();
    let pool_before = s.net.layer(s.pool).unwrap().weights().unwrap().clone();
    let image_before = s.net.layer(s.image).unwrap().weights().unwrap().clone();

    s.net.forward(s.image, &inputs).unwrap();
    assert_eq!(s.net.layer(s.conv).unwrap().activation().unwrap().shape(), (16, 2));
    assert_eq!(s.net.layer(s.pool).unwrap().activation().unwrap().shape(), (4, 2));
    let y = s.net.layer(s.out).unwrap().activation().unwrap();
    assert_eq!(y.shape(), (2, 2));
    for col in 0..2 {
        assert!((y.column(col).iter().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    // The pool output is the mean of its conv window.
    let conv_y = s.net.layer(s.conv).unwrap().activation().unwrap().clone();
    let pool_y = s.net.layer(s.pool).unwrap().activation().unwrap();
    let window = [0, 1, 4, 5];
    let mean = window.iter().map(|&i| conv_y.get(i, 0)).sum::<f64>() / 4.0;
    assert!((pool_y.get(0, 0) - mean).abs() < 1e-12);

    s.net.backward(s.out, &targets).unwrap();
    assert_eq!(s.net.layer(s.conv).unwrap().weights().unwrap(), &conv_before);
    assert_eq!(s.net.layer(s.pool).unwrap().weights().unwrap(), &pool_before);
    assert_ne!(s.net.layer(s.image).unwrap().weights().unwrap(), &image_before);
    assert_groups_equal(&s.net, s.image);
    assert!(s.net.layer(s.out).unwrap().weights().is_none());
}

#[test]
fn windows_must_fit() {
    let mut net = Network::with_seed(1);
    let image = net
        .add_layer(LayerConfig::new("image", 4).kind(LayerKind::Input).grid(4, 1, None, None))
        .unwrap();
    let conv = net
        .add_layer(LayerConfig::new("conv", 4).kind(LayerKind::Convolution).grid(4, 1, Some(1), Some(2)))
        .unwrap();
    assert!(matches!(net.connect(image, conv, None, None), Err(NetError::WindowOutOfRange { .. })));
}

#[test]
fn pooling_keeps_map_count() {
    let mut net = Network::with_seed(1);
    let conv = net
        .add_layer(LayerConfig::new("conv", 4).kind(LayerKind::Convolution).grid(4, 2, Some(1), Some(1)))
        .unwrap();
    let pool = net
        .add_layer(LayerConfig::new("pool", 2).kind(LayerKind::AveragePool).grid(2, 1, Some(2), Some(2)))
        .unwrap();
    assert!(matches!(net.connect(conv, pool, None, None), Err(NetError::InvalidLayer { .. })));
}
