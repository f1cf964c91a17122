use plexus_core::{Result, Tensor};

// Loss functions
//
// A loss produces two things from (prediction, label): a scalar measuring
// the error, and a gradient tensor ∂L/∂ŷ shaped like the prediction. The
// gradient feeds the label-driven branch of a layer's backward pass.

/// The loss contract consumed by layers.
pub trait Loss: Send + Sync {
    /// Registry tag of this loss.
    fn name(&self) -> &'static str;

    /// The scalar loss L(ŷ, y).
    fn calculate(&self, prediction: &Tensor, label: &Tensor) -> Result<f64>;

    /// The gradient tensor ∂L/∂ŷ, shaped like the prediction.
    fn gradient(&self, prediction: &Tensor, label: &Tensor) -> Result<Tensor>;
}

/// Half sum of squared errors: ½ Σ (ŷ − y)². Its gradient is the plain
/// difference ŷ − y, which keeps the backward math free of stray factors.
pub struct SquaredError;

impl Loss for SquaredError {
    fn name(&self) -> &'static str {
        "squared-error"
    }

    fn calculate(&self, prediction: &Tensor, label: &Tensor) -> Result<f64> {
        Ok(0.5 * prediction.sub(label)?.sum_by(|d| d * d))
    }

    fn gradient(&self, prediction: &Tensor, label: &Tensor) -> Result<Tensor> {
        prediction.sub(label)
    }
}

/// Mean squared error: mean((ŷ − y)²), gradient 2(ŷ − y)/n.
pub struct MeanSquaredError;

impl Loss for MeanSquaredError {
    fn name(&self) -> &'static str {
        "mse"
    }

    fn calculate(&self, prediction: &Tensor, label: &Tensor) -> Result<f64> {
        Ok(prediction.sub(label)?.sum_by(|d| d * d) / prediction.elem_count() as f64)
    }

    fn gradient(&self, prediction: &Tensor, label: &Tensor) -> Result<Tensor> {
        let n = prediction.elem_count() as f64;
        prediction.sub(label)?.mul(2.0 / n)
    }
}

/// Cross-entropy against a probability prediction: −Σ y ln ŷ,
/// gradient −y/ŷ.
pub struct CrossEntropy;

impl Loss for CrossEntropy {
    fn name(&self) -> &'static str {
        "cross-entropy"
    }

    fn calculate(&self, prediction: &Tensor, label: &Tensor) -> Result<f64> {
        Ok(-label.mul(&prediction.log())?.sum())
    }

    fn gradient(&self, prediction: &Tensor, label: &Tensor) -> Result<Tensor> {
        Ok(label.div(prediction)?.neg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn squared_error_scalar_and_gradient() -> Result<()> {
        let pred = Tensor::from_slice(&[0.75, 0.77], 2)?;
        let label = Tensor::from_slice(&[0.01, 0.99], 2)?;

        let loss = SquaredError.calculate(&pred, &label)?;
        assert!((loss - 0.5 * (0.74_f64.powi(2) + 0.22_f64.powi(2))).abs() < 1e-12);

        let grad = SquaredError.gradient(&pred, &label)?;
        assert!((grad.data()[0] - 0.74).abs() < 1e-12);
        assert!((grad.data()[1] + 0.22).abs() < 1e-12);
        Ok(())
    }

    #[test]
    fn loss_shape_mismatch_fails() {
        let pred = Tensor::from_slice(&[0.5, 0.5], 2).unwrap();
        let label = Tensor::from_slice(&[1.0, 0.0, 0.0], 3).unwrap();
        assert!(SquaredError.calculate(&pred, &label).is_err());
    }
}
