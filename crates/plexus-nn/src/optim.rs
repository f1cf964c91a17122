use plexus_core::{Result, Tensor};

// Optimizers
//
// An optimizer maps (weights, gradient) to new weights. Layers call it once
// per batch with their averaged accumulated gradients.

/// The optimizer contract consumed by layers.
pub trait Optimizer: Send + Sync {
    /// Registry tag of this optimizer.
    fn name(&self) -> &'static str;

    /// Produce updated weights from the current weights and a gradient of
    /// the same shape.
    fn optimize(&self, weights: &Tensor, gradient: &Tensor) -> Result<Tensor>;
}

/// Plain gradient descent: w ← w − rate · ∇w.
pub struct GradientDescent {
    rate: f64,
}

impl GradientDescent {
    /// Create a gradient-descent optimizer with the given learning rate.
    pub fn new(rate: f64) -> Self {
        GradientDescent { rate }
    }

    /// The learning rate.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

impl Optimizer for GradientDescent {
    fn name(&self) -> &'static str {
        "gradient-descent"
    }

    fn optimize(&self, weights: &Tensor, gradient: &Tensor) -> Result<Tensor> {
        weights.sub(&gradient.mul(self.rate)?)
    }
}
