use crate::prelude::*;
use rand::SeedableRng;
use rand::rngs::StdRng;

mod activation_test;
mod convolution_test;
mod tensor_test;

fn seeded_rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}
