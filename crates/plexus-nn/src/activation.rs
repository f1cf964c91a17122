use plexus_core::{Result, Tensor};

// Activation functions
//
// An activation satisfies a small two-method contract: `calculate` maps the
// pre-activation (linear) tensor z to the activated tensor a, and
// `derivative` produces g'(a, z) for the backward pass. Both receive the
// activated AND the linear tensor because different activations want
// different inputs: sigmoid's derivative is cheapest from a, ReLU's needs z.
// The optional label exists for activations whose derivative simplifies
// against a specific loss.

/// The activation contract consumed by layers.
pub trait Activation: Send + Sync + std::fmt::Debug {
    /// Registry tag of this activation.
    fn name(&self) -> &'static str;

    /// Apply the activation elementwise to the linear output z.
    fn calculate(&self, linear: &Tensor) -> Result<Tensor>;

    /// The elementwise derivative g'(a, z).
    fn derivative(
        &self,
        activated: &Tensor,
        linear: &Tensor,
        label: Option<&Tensor>,
    ) -> Result<Tensor>;
}

/// Logistic sigmoid: 1 / (1 + e^(-z)).
#[derive(Debug)]
pub struct Sigmoid;

impl Activation for Sigmoid {
    fn name(&self) -> &'static str {
        "sigmoid"
    }

    fn calculate(&self, linear: &Tensor) -> Result<Tensor> {
        Ok(linear.map(|z| 1.0 / (1.0 + (-z).exp())))
    }

    fn derivative(&self, activated: &Tensor, _: &Tensor, _: Option<&Tensor>) -> Result<Tensor> {
        Ok(activated.map(|a| a * (1.0 - a)))
    }
}

/// Hyperbolic tangent.
#[derive(Debug)]
pub struct Tanh;

impl Activation for Tanh {
    fn name(&self) -> &'static str {
        "tanh"
    }

    fn calculate(&self, linear: &Tensor) -> Result<Tensor> {
        Ok(linear.tanh())
    }

    fn derivative(&self, activated: &Tensor, _: &Tensor, _: Option<&Tensor>) -> Result<Tensor> {
        Ok(activated.map(|a| 1.0 - a * a))
    }
}

/// Rectified linear unit: max(0, z).
#[derive(Debug)]
pub struct Relu;

impl Activation for Relu {
    fn name(&self) -> &'static str {
        "relu"
    }

    fn calculate(&self, linear: &Tensor) -> Result<Tensor> {
        Ok(linear.map(|z| z.max(0.0)))
    }

    fn derivative(&self, _: &Tensor, linear: &Tensor, _: Option<&Tensor>) -> Result<Tensor> {
        Ok(linear.map(|z| if z > 0.0 { 1.0 } else { 0.0 }))
    }
}

/// Identity: passes the linear output through unchanged.
#[derive(Debug)]
pub struct Identity;

impl Activation for Identity {
    fn name(&self) -> &'static str {
        "identity"
    }

    fn calculate(&self, linear: &Tensor) -> Result<Tensor> {
        Ok(linear.clone())
    }

    fn derivative(&self, _: &Tensor, linear: &Tensor, _: Option<&Tensor>) -> Result<Tensor> {
        Ok(linear.map(|_| 1.0))
    }
}
