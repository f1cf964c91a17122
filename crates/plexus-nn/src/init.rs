use std::sync::Mutex;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use plexus_core::{Error, Result, Shape, Tensor};

// Initializers
//
// An initializer produces a tensor for a given shape. Layers consume these
// through the Initializer trait when they materialize their parameters, so
// test networks can pin exact starting weights while real networks draw
// random ones.

/// The initializer contract consumed by layers.
pub trait Initializer: Send + Sync {
    /// Registry tag of this initializer.
    fn name(&self) -> &'static str;

    /// Produce a tensor of the given shape.
    fn initialize(&self, shape: &Shape) -> Result<Tensor>;
}

/// All zeros.
pub struct Zeros;

impl Initializer for Zeros {
    fn name(&self) -> &'static str {
        "zeros"
    }

    fn initialize(&self, shape: &Shape) -> Result<Tensor> {
        Tensor::zeros(shape.clone())
    }
}

/// Every element set to one constant.
pub struct Constant(pub f64);

impl Initializer for Constant {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn initialize(&self, shape: &Shape) -> Result<Tensor> {
        Ok(Tensor::zeros(shape.clone())?.map(|_| self.0))
    }
}

/// Uniform draws from [low, high). Optionally seeded for reproducible runs;
/// the seeded generator is shared behind a mutex so repeated calls continue
/// the same stream.
pub struct RandomUniform {
    low: f64,
    high: f64,
    rng: Option<Mutex<StdRng>>,
}

impl RandomUniform {
    /// Unseeded uniform initializer over [low, high).
    pub fn new(low: f64, high: f64) -> Self {
        RandomUniform {
            low,
            high,
            rng: None,
        }
    }

    /// Seeded uniform initializer over [low, high).
    pub fn seeded(low: f64, high: f64, seed: u64) -> Self {
        RandomUniform {
            low,
            high,
            rng: Some(Mutex::new(StdRng::seed_from_u64(seed))),
        }
    }
}

impl Initializer for RandomUniform {
    fn name(&self) -> &'static str {
        "uniform"
    }

    fn initialize(&self, shape: &Shape) -> Result<Tensor> {
        let mut out = Tensor::zeros(shape.clone())?;
        match &self.rng {
            Some(rng) => {
                let mut rng = rng.lock().expect("rng lock poisoned");
                out.traverse_mut(|_, _| Some(rng.gen_range(self.low..self.high)));
            }
            None => {
                let mut rng = rand::thread_rng();
                out.traverse_mut(|_, _| Some(rng.gen_range(self.low..self.high)));
            }
        }
        Ok(out)
    }
}

/// A preset tensor, handed out as-is. The requested shape must match.
pub struct Fixed(pub Tensor);

impl Initializer for Fixed {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn initialize(&self, shape: &Shape) -> Result<Tensor> {
        if self.0.shape() != shape {
            return Err(Error::ShapeMismatch {
                op: "initialize".to_string(),
                lhs: shape.clone(),
                rhs: self.0.shape().clone(),
            });
        }
        Ok(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seeded_uniform_is_reproducible() -> Result<()> {
        let shape = Shape::from([2, 3]);
        let a = RandomUniform::seeded(-0.5, 0.5, 7).initialize(&shape)?;
        let b = RandomUniform::seeded(-0.5, 0.5, 7).initialize(&shape)?;
        assert!(a.equals(&b));
        assert!(a.data().iter().all(|v| (-0.5..0.5).contains(v)));
        Ok(())
    }

    #[test]
    fn fixed_rejects_other_shapes() {
        let preset = Tensor::from_slice(&[1.0, 2.0], 2).unwrap();
        let init = Fixed(preset);
        assert!(init.initialize(&Shape::from(3)).is_err());
    }
}
