use super::*;
use approx::assert_relative_eq;

#[test]
fn relu_clamps_negatives_forward() {
    let mut relu = Activation::relu(TensorSize::new(4, 1, 1));
    relu.forward(&Tensor::from_flat(4, 1, 1, &[-2.0, 0.0, 0.5, 3.0]));
    assert_eq!(relu.output().as_slice(), &[0.0, 0.0, 0.5, 3.0]);
    assert_eq!(relu.input_size(), relu.output_size());
}

#[test]
fn relu_gates_the_incoming_gradient() {
    let mut relu = Activation::relu(TensorSize::new(3, 1, 1));
    relu.forward(&Tensor::from_flat(3, 1, 1, &[-1.0, 0.0, 2.0]));
    relu.backward(&Tensor::from_flat(3, 1, 1, &[10.0, 10.0, 10.0]));
    // x = 0 sits on the pass-through branch.
    assert_eq!(relu.gradients().as_slice(), &[0.0, 10.0, 10.0]);
}

#[test]
fn leaky_relu_forward_scales_negatives() {
    let mut leaky = Activation::leaky_relu(TensorSize::new(3, 1, 1), 0.01);
    leaky.forward(&Tensor::from_flat(3, 1, 1, &[-2.0, 0.0, 3.0]));
    assert_eq!(leaky.output().as_slice(), &[-0.02, 0.0, 3.0]);
}

#[test]
fn leaky_relu_backward_records_bare_alpha_on_the_negative_branch() {
    let mut leaky = Activation::leaky_relu(TensorSize::new(2, 1, 1), 0.01);
    leaky.forward(&Tensor::from_flat(2, 1, 1, &[-2.0, 3.0]));
    leaky.backward(&Tensor::from_flat(2, 1, 1, &[10.0, 4.0]));
    // Negative inputs emit alpha itself, independent of the incoming gradient.
    assert_eq!(leaky.gradients().as_slice(), &[0.01, 4.0]);
}

#[test]
fn sigmoid_forward_and_backward_at_zero() {
    let mut sig = Activation::sigmoid(TensorSize::new(1, 1, 1));
    sig.forward(&Tensor::from_flat(1, 1, 1, &[0.0]));
    assert_relative_eq!(sig.output().as_slice()[0], 0.5);

    sig.backward(&Tensor::from_flat(1, 1, 1, &[1.0]));
    // s(0) * (1 - s(0)) = 0.25
    assert_relative_eq!(sig.gradients().as_slice()[0], 0.25);
}

#[test]
fn tanh_forward_and_backward() {
    let mut tanh = Activation::tanh(TensorSize::new(2, 1, 1));
    tanh.forward(&Tensor::from_flat(2, 1, 1, &[0.0, 1.0]));
    assert_relative_eq!(tanh.output().as_slice()[0], 0.0);
    assert_relative_eq!(tanh.output().as_slice()[1], 1.0_f64.tanh());

    tanh.backward(&Tensor::from_flat(2, 1, 1, &[1.0, 2.0]));
    assert_relative_eq!(tanh.gradients().as_slice()[0], 1.0);
    let t = 1.0_f64.tanh();
    assert_relative_eq!(tanh.gradients().as_slice()[1], (1.0 - t * t) * 2.0);
}

#[test]
fn layer_type_names_the_function() {
    let size = TensorSize::new(1, 1, 1);
    assert_eq!(Activation::relu(size).layer_type(), "relu");
    assert_eq!(Activation::leaky_relu(size, 0.01).layer_type(), "leaky_relu");
    assert_eq!(Activation::sigmoid(size).layer_type(), "sigmoid");
    assert_eq!(Activation::tanh(size).layer_type(), "tanh");
}

#[test]
fn input_size_is_fixed_at_construction() {
    let mut relu = Activation::relu(TensorSize::new(2, 1, 1));
    relu.forward(&Tensor::from_flat(3, 1, 1, &[1.0, 2.0, 3.0]));
    assert_eq!(relu.input_size(), TensorSize::new(2, 1, 1));
    assert_eq!(relu.output_size(), TensorSize::new(2, 1, 1));
}

#[test]
fn no_parameters_and_no_op_update() {
    let mut relu = Activation::relu(TensorSize::new(2, 2, 1));
    assert_eq!(relu.param_count(), 0);
    assert!(matches!(relu.get_weights(), LayerWeight::Empty));

    relu.forward(&Tensor::from_flat(2, 2, 1, &[1.0, -1.0, 2.0, -2.0]));
    let before = relu.output().clone();
    relu.update_parameters();
    assert_eq!(relu.output(), &before);
}
