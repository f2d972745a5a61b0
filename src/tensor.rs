use crate::error::NetworkError;
use ndarray::Array3;
use serde::{Deserialize, Serialize};

/// Dimensions of a [`Tensor`]: width (`x`), height (`y`) and depth (`z`).
///
/// # Fields
///
/// - `x` - number of columns (width)
/// - `y` - number of rows (height)
/// - `z` - depth (number of channels)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TensorSize {
    pub x: usize,
    pub y: usize,
    pub z: usize,
}

impl TensorSize {
    /// Creates a new size descriptor.
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self { x, y, z }
    }

    /// Total number of elements a tensor of this size holds.
    pub fn volume(&self) -> usize {
        self.x * self.y * self.z
    }
}

impl std::fmt::Display for TensorSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Dense 3-D numeric buffer, the uniform value type flowing between layers.
///
/// Internally backed by an `ndarray::Array3<f64>` in `[depth, row, col]` axis order,
/// so the contiguous buffer is addressed as `z * width * height + y * width + x`
/// with the width axis varying fastest.
///
/// Tensors are value-like: cloning produces an independent buffer. Coordinate
/// accessors panic on out-of-range indices; index validity is the caller's
/// responsibility.
///
/// # Example
/// ```rust
/// use convnet::tensor::Tensor;
///
/// let mut t = Tensor::new(2, 1, 1);
/// t.set(0, 0, 0, 0.5);
/// t.set(1, 0, 0, -0.5);
/// assert_eq!(t.get(1, 0, 0), -0.5);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    data: Array3<f64>,
}

impl Tensor {
    /// Creates a zero-initialized tensor of the given width, height and depth.
    pub fn new(x: usize, y: usize, z: usize) -> Self {
        Self {
            data: Array3::zeros((z, y, x)),
        }
    }

    /// Creates a zero-initialized tensor from a size descriptor.
    pub fn zeros(size: TensorSize) -> Self {
        Self::new(size.x, size.y, size.z)
    }

    /// Creates a tensor from a flat slice laid out in buffer order
    /// (`z * width * height + y * width + x`).
    ///
    /// # Panics
    ///
    /// Panics if `data.len() != x * y * z`.
    pub fn from_flat(x: usize, y: usize, z: usize, data: &[f64]) -> Self {
        assert_eq!(
            data.len(),
            x * y * z,
            "flat data length {} does not match tensor volume {}",
            data.len(),
            x * y * z
        );
        Self {
            data: Array3::from_shape_vec((z, y, x), data.to_vec()).unwrap(),
        }
    }

    /// Creates a tensor from nested depth-major / row-major literal data
    /// (`data[depth][row][col]`).
    pub fn from_nested(data: &[Vec<Vec<f64>>]) -> Self {
        let z = data.len();
        let y = data[0].len();
        let x = data[0][0].len();
        let mut tensor = Tensor::new(x, y, z);
        tensor.set_nested(data);
        tensor
    }

    /// Returns the size descriptor of this tensor.
    pub fn size(&self) -> TensorSize {
        let (z, y, x) = self.data.dim();
        TensorSize { x, y, z }
    }

    /// Returns the element at `(x, y, z)`.
    pub fn get(&self, x: usize, y: usize, z: usize) -> f64 {
        self.data[[z, y, x]]
    }

    /// Sets the element at `(x, y, z)` to `value`.
    pub fn set(&mut self, x: usize, y: usize, z: usize, value: f64) {
        self.data[[z, y, x]] = value;
    }

    /// Adds `delta` to the element at `(x, y, z)`.
    pub fn add(&mut self, x: usize, y: usize, z: usize, delta: f64) {
        self.data[[z, y, x]] += delta;
    }

    /// Overwrites the whole buffer from a flat slice in buffer order.
    ///
    /// # Panics
    ///
    /// Panics if the slice length does not match the tensor volume.
    pub fn set_flat(&mut self, data: &[f64]) {
        let volume = self.size().volume();
        assert_eq!(
            data.len(),
            volume,
            "flat data length {} does not match tensor volume {}",
            data.len(),
            volume
        );
        self.as_mut_slice().copy_from_slice(data);
    }

    /// Overwrites the whole buffer from nested depth-major / row-major data
    /// (`data[depth][row][col]`), reconciling the element order with the
    /// width-fastest flat buffer.
    pub fn set_nested(&mut self, data: &[Vec<Vec<f64>>]) {
        let z = data.len();
        let y = data[0].len();
        let x = data[0][0].len();
        for i in 0..x {
            for j in 0..y {
                for k in 0..z {
                    self.set(i, j, k, data[k][j][i]);
                }
            }
        }
    }

    /// Returns the tensor contents as nested `[depth][row][col]` vectors, the
    /// inverse of [`Tensor::set_nested`].
    pub fn to_nested(&self) -> Vec<Vec<Vec<f64>>> {
        let size = self.size();
        let mut ret = Vec::with_capacity(size.z);
        for z in 0..size.z {
            let mut plane = Vec::with_capacity(size.y);
            for y in 0..size.y {
                let mut row = Vec::with_capacity(size.x);
                for x in 0..size.x {
                    row.push(self.get(x, y, z));
                }
                plane.push(row);
            }
            ret.push(plane);
        }
        ret
    }

    /// Returns `true` if both tensors have the same width, height and depth.
    pub fn same_shape(&self, other: &Tensor) -> bool {
        self.size() == other.size()
    }

    /// Mean of squared elementwise differences against `other`, the training
    /// loss signal.
    ///
    /// # Returns
    ///
    /// - `Ok(f64)` - the mean squared error
    /// - `Err(NetworkError::ShapeMismatch)` - if the tensors differ in shape
    pub fn mse(&self, other: &Tensor) -> Result<f64, NetworkError> {
        if !self.same_shape(other) {
            return Err(NetworkError::ShapeMismatch(format!(
                "cannot compute MSE between tensors of size {} and {}",
                self.size(),
                other.size()
            )));
        }
        let n = self.size().volume() as f64;
        let sum: f64 = self
            .as_slice()
            .iter()
            .zip(other.as_slice())
            .map(|(a, b)| (a - b) * (a - b))
            .sum();
        Ok(sum / n)
    }

    /// Flat index of the largest positive element; `0` if no element exceeds zero.
    pub fn max_index(&self) -> usize {
        let mut max_value = 0.0;
        let mut max_index = 0;
        for (i, &value) in self.as_slice().iter().enumerate() {
            if value > max_value {
                max_value = value;
                max_index = i;
            }
        }
        max_index
    }

    /// Flat view of the buffer in `z * W * H + y * W + x` order.
    pub fn as_slice(&self) -> &[f64] {
        self.data.as_slice().unwrap()
    }

    /// Mutable flat view of the buffer.
    pub fn as_mut_slice(&mut self) -> &mut [f64] {
        self.data.as_slice_mut().unwrap()
    }

    /// Resets every element to zero.
    pub fn fill_zero(&mut self) {
        self.data.fill(0.0);
    }
}

impl std::ops::Sub for &Tensor {
    type Output = Tensor;

    fn sub(self, rhs: &Tensor) -> Tensor {
        Tensor {
            data: &self.data - &rhs.data,
        }
    }
}

impl std::fmt::Display for Tensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let size = self.size();
        for z in 0..size.z {
            writeln!(f, "Dim: {}", z)?;
            for y in 0..size.y {
                for x in 0..size.x {
                    write!(f, "{:.15}\t", self.get(x, y, z))?;
                }
                writeln!(f)?;
            }
        }
        Ok(())
    }
}
