use super::*;
use approx::assert_relative_eq;

#[test]
fn output_size_follows_stride_formula() {
    let mut rng = seeded_rng(42);
    // (floor((W-k)/s)+1, floor((H-k)/s)+1, filters)
    let conv = Convolution::new(4, 3, 2, TensorSize::new(7, 5, 3), &mut rng);
    assert_eq!(conv.input_size(), TensorSize::new(7, 5, 3));
    assert_eq!(conv.output_size(), TensorSize::new(3, 2, 4));
    assert_eq!(conv.param_count(), 4 * 3 * 3 * 3 + 4);

    let conv = Convolution::new(1, 2, 1, TensorSize::new(8, 3, 1), &mut rng);
    assert_eq!(conv.output_size(), TensorSize::new(7, 2, 1));
}

#[test]
fn forward_computes_windowed_dot_product_plus_bias() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 2, 1, TensorSize::new(3, 3, 1), &mut rng);
    conv.set_kernels(vec![Tensor::from_flat(2, 2, 1, &[1.0, 1.0, 1.0, 1.0])]);
    conv.set_biases(vec![0.5]);

    let input = Tensor::from_flat(
        3,
        3,
        1,
        &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0],
    );
    conv.forward(&input);

    // Window sums: 12, 16, 24, 28, each plus the bias
    assert_eq!(conv.output().as_slice(), &[12.5, 16.5, 24.5, 28.5]);

    // No parameter mutates during forward, repeated calls agree exactly
    let first = conv.output().clone();
    conv.forward(&input);
    assert_eq!(conv.output(), &first);
}

#[test]
fn forward_sums_across_input_channels() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 2, 1, TensorSize::new(2, 2, 2), &mut rng);
    conv.set_kernels(vec![Tensor::from_flat(2, 2, 2, &[1.0; 8])]);
    conv.set_biases(vec![0.0]);

    let input = Tensor::from_flat(2, 2, 2, &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0]);
    conv.forward(&input);

    assert_eq!(conv.output().as_slice(), &[36.0]);
}

#[test]
fn backward_accumulates_kernel_bias_and_input_gradients() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 1, 1, TensorSize::new(2, 2, 1), &mut rng);
    conv.set_kernels(vec![Tensor::from_flat(1, 1, 1, &[2.0])]);
    conv.set_biases(vec![0.5]);

    let input = Tensor::from_flat(2, 2, 1, &[1.0, 2.0, 3.0, 4.0]);
    conv.forward(&input);
    assert_eq!(conv.output().as_slice(), &[2.5, 4.5, 6.5, 8.5]);

    let next_grad = Tensor::from_flat(2, 2, 1, &[1.0, 1.0, 1.0, 1.0]);
    conv.backward(&next_grad);

    // dW = sum over positions of grad * input
    assert_relative_eq!(conv.kernel_gradients()[0].get(0, 0, 0), 10.0);
    // db = sum of output-position gradients
    assert_relative_eq!(conv.bias_gradients()[0], 4.0);
    // dInput = grad scattered back through the kernel weight
    assert_eq!(conv.gradients().as_slice(), &[2.0, 2.0, 2.0, 2.0]);
}

#[test]
fn update_applies_momentum_rule_and_resets_gradients() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 1, 1, TensorSize::new(2, 2, 1), &mut rng);
    conv.set_kernels(vec![Tensor::from_flat(1, 1, 1, &[2.0])]);
    conv.set_biases(vec![0.5]);
    conv.set_learning_params(LearningParams {
        learning_rate: 0.1,
        momentum: 0.0,
    });

    let input = Tensor::from_flat(2, 2, 1, &[1.0, 2.0, 3.0, 4.0]);
    conv.forward(&input);
    conv.backward(&Tensor::from_flat(2, 2, 1, &[1.0, 1.0, 1.0, 1.0]));
    conv.update_parameters();

    // w += -lr * dW, b += -lr * db
    assert_relative_eq!(conv.kernels()[0].get(0, 0, 0), 2.0 - 0.1 * 10.0);
    assert_relative_eq!(conv.biases()[0], 0.5 - 0.1 * 4.0);

    // Accumulators are cleared for the next pass
    assert_eq!(conv.kernel_gradients()[0].as_slice(), &[0.0]);
    assert_eq!(conv.bias_gradients()[0], 0.0);
}

#[test]
fn momentum_blends_previous_velocity() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 1, 1, TensorSize::new(1, 1, 1), &mut rng);
    conv.set_kernels(vec![Tensor::from_flat(1, 1, 1, &[1.0])]);
    conv.set_biases(vec![0.0]);
    conv.set_learning_params(LearningParams {
        learning_rate: 0.1,
        momentum: 0.5,
    });

    let input = Tensor::from_flat(1, 1, 1, &[1.0]);
    let grad = Tensor::from_flat(1, 1, 1, &[1.0]);

    // First step: v = -0.1, w = 0.9
    conv.forward(&input);
    conv.backward(&grad);
    conv.update_parameters();
    assert_relative_eq!(conv.kernels()[0].get(0, 0, 0), 0.9);

    // Second step: v = 0.5 * -0.1 - 0.1 = -0.15, w = 0.75
    conv.forward(&input);
    conv.backward(&grad);
    conv.update_parameters();
    assert_relative_eq!(conv.kernels()[0].get(0, 0, 0), 0.75);
}

#[test]
fn input_size_is_fixed_at_construction() {
    let mut rng = seeded_rng(42);
    let mut conv = Convolution::new(1, 2, 1, TensorSize::new(3, 3, 1), &mut rng);
    // A wrong-shaped feed must not change the reported geometry.
    conv.forward(&Tensor::new(4, 4, 1));
    assert_eq!(conv.input_size(), TensorSize::new(3, 3, 1));
    assert_eq!(conv.param_count(), 2 * 2 + 1);
}

#[test]
fn initialization_is_reproducible_from_a_seed() {
    let mut a = seeded_rng(7);
    let mut b = seeded_rng(7);
    let first = Convolution::new(2, 3, 1, TensorSize::new(5, 5, 2), &mut a);
    let second = Convolution::new(2, 3, 1, TensorSize::new(5, 5, 2), &mut b);

    for (x, y) in first.kernels().iter().zip(second.kernels()) {
        assert_eq!(x, y);
    }
    assert_eq!(first.biases(), second.biases());
}
