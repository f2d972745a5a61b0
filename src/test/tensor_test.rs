use super::*;
use approx::assert_relative_eq;

#[test]
fn flat_buffer_layout_is_width_fastest() {
    let mut t = Tensor::new(3, 2, 2);

    // Linear index = z * W * H + y * W + x
    t.set(1, 0, 1, 7.0);
    assert_eq!(t.as_slice()[1 * 3 * 2 + 0 * 3 + 1], 7.0);

    t.set(2, 1, 0, -1.5);
    assert_eq!(t.as_slice()[1 * 3 + 2], -1.5);

    assert_eq!(t.size(), TensorSize::new(3, 2, 2));
    assert_eq!(t.size().volume(), 12);
    assert_eq!(t.as_slice().len(), 12);
}

#[test]
fn accessors_get_set_add() {
    let mut t = Tensor::new(2, 2, 1);
    t.set(0, 1, 0, 3.0);
    assert_eq!(t.get(0, 1, 0), 3.0);
    t.add(0, 1, 0, -1.0);
    assert_eq!(t.get(0, 1, 0), 2.0);
    assert_eq!(t.get(1, 1, 0), 0.0);
}

#[test]
#[should_panic]
fn get_out_of_range_panics() {
    let t = Tensor::new(2, 2, 1);
    t.get(2, 0, 0);
}

#[test]
fn flat_loader_round_trips() {
    let data = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8];
    let t = Tensor::from_flat(8, 1, 1, &data);
    assert_eq!(t.as_slice(), &data);

    let mut u = Tensor::new(2, 2, 2);
    u.set_flat(&data);
    assert_eq!(u.get(0, 0, 0), 0.1);
    assert_eq!(u.get(1, 1, 0), 0.4);
    assert_eq!(u.get(0, 0, 1), 0.5);
    assert_eq!(u.get(1, 1, 1), 0.8);
}

#[test]
#[should_panic]
fn flat_loader_rejects_wrong_length() {
    let mut t = Tensor::new(2, 2, 1);
    t.set_flat(&[1.0, 2.0, 3.0]);
}

#[test]
fn nested_loader_reconciles_element_order() {
    // data[depth][row][col]
    let nested = vec![vec![
        vec![1.0, 2.0, 3.0],
        vec![4.0, 5.0, 6.0],
    ]];
    let t = Tensor::from_nested(&nested);

    assert_eq!(t.size(), TensorSize::new(3, 2, 1));
    assert_eq!(t.get(0, 0, 0), 1.0);
    assert_eq!(t.get(2, 0, 0), 3.0);
    assert_eq!(t.get(2, 1, 0), 6.0);
    // Nested rows land in width-fastest buffer order
    assert_eq!(t.as_slice(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);

    assert_eq!(t.to_nested(), nested);
}

#[test]
fn nested_loader_multi_channel() {
    let nested = vec![
        vec![vec![1.0, 2.0], vec![3.0, 4.0]],
        vec![vec![5.0, 6.0], vec![7.0, 8.0]],
    ];
    let t = Tensor::from_nested(&nested);
    assert_eq!(t.size(), TensorSize::new(2, 2, 2));
    assert_eq!(t.get(1, 0, 1), 6.0);
    assert_eq!(t.to_nested(), nested);
}

#[test]
fn mse_of_equal_shapes() {
    let a = Tensor::from_flat(2, 1, 1, &[1.0, 2.0]);
    let b = Tensor::from_flat(2, 1, 1, &[3.0, 4.0]);
    assert_relative_eq!(a.mse(&b).unwrap(), 4.0);
    assert_relative_eq!(a.mse(&a).unwrap(), 0.0);
}

#[test]
fn mse_rejects_shape_mismatch() {
    let a = Tensor::new(2, 1, 1);
    let b = Tensor::new(3, 1, 1);
    match a.mse(&b) {
        Err(NetworkError::ShapeMismatch(_)) => {}
        other => panic!("expected ShapeMismatch, got {:?}", other),
    }
}

#[test]
fn same_shape_predicate() {
    let a = Tensor::new(2, 3, 4);
    let b = Tensor::new(2, 3, 4);
    let c = Tensor::new(4, 3, 2);
    assert!(a.same_shape(&b));
    assert!(!a.same_shape(&c));
}

#[test]
fn subtraction_is_elementwise() {
    let a = Tensor::from_flat(2, 1, 1, &[5.0, 1.0]);
    let b = Tensor::from_flat(2, 1, 1, &[3.0, 4.0]);
    let d = &a - &b;
    assert_eq!(d.as_slice(), &[2.0, -3.0]);
}

#[test]
fn max_index_finds_largest_positive_element() {
    let t = Tensor::from_flat(4, 1, 1, &[0.1, 0.9, 0.3, 0.2]);
    assert_eq!(t.max_index(), 1);

    // No element above zero resolves to index 0
    let t = Tensor::from_flat(3, 1, 1, &[-1.0, -0.5, -2.0]);
    assert_eq!(t.max_index(), 0);
}
