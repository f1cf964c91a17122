use std::sync::Arc;

use plexus_core::{Error, Result};

use crate::activation::{Activation, Identity, Relu, Sigmoid, Tanh};
use crate::init::{Initializer, RandomUniform, Zeros};
use crate::loss::{CrossEntropy, Loss, MeanSquaredError, SquaredError};
use crate::optim::{GradientDescent, Optimizer};

// Registry — static tag → factory mapping
//
// Components are looked up by name at configuration time. The mapping is a
// compile-time `match`, not runtime reflection: an unknown tag fails naming
// the component kind and the tag.

/// Resolve an activation by tag.
pub fn activation(name: &str) -> Result<Arc<dyn Activation>> {
    match name {
        "sigmoid" => Ok(Arc::new(Sigmoid)),
        "tanh" => Ok(Arc::new(Tanh)),
        "relu" => Ok(Arc::new(Relu)),
        "identity" => Ok(Arc::new(Identity)),
        _ => Err(Error::UnknownComponent {
            kind: "activation".to_string(),
            name: name.to_string(),
        }),
    }
}

/// Resolve a loss by tag.
pub fn loss(name: &str) -> Result<Arc<dyn Loss>> {
    match name {
        "squared-error" => Ok(Arc::new(SquaredError)),
        "mse" => Ok(Arc::new(MeanSquaredError)),
        "cross-entropy" => Ok(Arc::new(CrossEntropy)),
        _ => Err(Error::UnknownComponent {
            kind: "loss".to_string(),
            name: name.to_string(),
        }),
    }
}

/// Resolve an initializer by tag. `uniform` draws from [-1, 1).
pub fn initializer(name: &str) -> Result<Arc<dyn Initializer>> {
    match name {
        "zeros" => Ok(Arc::new(Zeros)),
        "uniform" => Ok(Arc::new(RandomUniform::new(-1.0, 1.0))),
        _ => Err(Error::UnknownComponent {
            kind: "initializer".to_string(),
            name: name.to_string(),
        }),
    }
}

/// Resolve an optimizer by tag with a learning rate.
pub fn optimizer(name: &str, rate: f64) -> Result<Arc<dyn Optimizer>> {
    match name {
        "gradient-descent" => Ok(Arc::new(GradientDescent::new(rate))),
        _ => Err(Error::UnknownComponent {
            kind: "optimizer".to_string(),
            name: name.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_tags_resolve() {
        assert!(activation("sigmoid").is_ok());
        assert!(loss("squared-error").is_ok());
        assert!(initializer("uniform").is_ok());
        assert!(optimizer("gradient-descent", 0.5).is_ok());
    }

    #[test]
    fn unknown_tag_names_kind_and_tag() {
        let err = activation("swish-like").unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("activation") && msg.contains("swish-like"));
    }
}
