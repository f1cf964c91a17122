use std::any::Any;
use std::sync::Arc;

use plexus_core::{Axis, Error, Matrix, Result, Shape, Tensor, Vector};
use plexus_graph::{shared, DeferredCollection, DeferredInputCollection, Entity, SharedCollection};

use crate::activation::{Activation, Sigmoid};
use crate::init::{Initializer, RandomUniform, Zeros};
use crate::layer::Phase;
use crate::loss::{Loss, SquaredError};
use crate::optim::{GradientDescent, Optimizer};

// Dense — fully-connected layer
//
// Forward:  linear = W·x + b,  activated = g(linear). Both are exposed as
// named outputs, with `activated` as the default.
//
// Backward error term δ (gradient of the loss w.r.t. this layer's linear
// output):
//
//   label branch  δ = L'(ŷ, y) ⊙ g'(a, z)       — the layer is bound
//                                                  directly to training
//                                                  labels
//   chain branch  δ = Σ (successor input-gradient segments) ⊙ g'(a, z)
//
// Each layer's backward pass computes Wᵗ·δ, the gradient w.r.t. its full
// input vector, and publishes one segment of it per forward producer,
// keyed by the producer's name. A parent then picks up exactly its own
// share of the concatenation from every successor, which keeps the chain
// rule correct when a successor merges several parents.
//
// The branch choice is a runtime check — "do I have a bound label?" — not
// a structural one, so the same layer definition works at any depth.
//
// Weight gradient = δ ⊗ xᵗ (outer product). Per-sample gradients
// accumulate; `apply_gradients` averages them and delegates one update to
// the pluggable optimizer: new_w = optimize(w, dW).

const LOCK: &str = "collection lock poisoned";

/// Forward output key for the pre-activation result.
pub const KEY_LINEAR: &str = "linear";
/// Forward output key (and default) for the activated result.
pub const KEY_ACTIVATED: &str = "activated";
/// Backward output key (and default) for the error term δ.
pub const KEY_DELTA: &str = "delta";
/// Backward output key for the layer's weight matrix, published alongside
/// the error term for inspection.
pub const KEY_WEIGHTS: &str = "weights";

/// Which bias-gradient formula the chain branch uses.
///
/// The original engine computes `sum(δ)` in the label branch but
/// `dot(bias, δ)` in the chain branch, which are not equivalent. `Legacy`
/// reproduces that behavior; `SumDelta` uses `sum(δ)` in both branches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BiasGradient {
    #[default]
    Legacy,
    SumDelta,
}

/// Configuration for a [`Dense`] layer.
#[derive(Clone)]
pub struct DenseConfig {
    pub name: String,
    pub inputs: usize,
    pub units: usize,
    pub activation: Arc<dyn Activation>,
    pub loss: Arc<dyn Loss>,
    pub optimizer: Arc<dyn Optimizer>,
    pub weight_init: Arc<dyn Initializer>,
    pub bias_init: Arc<dyn Initializer>,
    pub bias_gradient: BiasGradient,
}

impl DenseConfig {
    /// A sigmoid/squared-error/gradient-descent layer with uniform random
    /// weights and zero bias. Every part can be swapped with the
    /// builder-style methods.
    pub fn new(name: impl Into<String>, inputs: usize, units: usize) -> Self {
        DenseConfig {
            name: name.into(),
            inputs,
            units,
            activation: Arc::new(Sigmoid),
            loss: Arc::new(SquaredError),
            optimizer: Arc::new(GradientDescent::new(0.1)),
            weight_init: Arc::new(RandomUniform::new(-1.0, 1.0)),
            bias_init: Arc::new(Zeros),
            bias_gradient: BiasGradient::default(),
        }
    }

    pub fn with_activation(mut self, activation: Arc<dyn Activation>) -> Self {
        self.activation = activation;
        self
    }

    pub fn with_loss(mut self, loss: Arc<dyn Loss>) -> Self {
        self.loss = loss;
        self
    }

    pub fn with_optimizer(mut self, optimizer: Arc<dyn Optimizer>) -> Self {
        self.optimizer = optimizer;
        self
    }

    pub fn with_weight_init(mut self, init: Arc<dyn Initializer>) -> Self {
        self.weight_init = init;
        self
    }

    pub fn with_bias_init(mut self, init: Arc<dyn Initializer>) -> Self {
        self.bias_init = init;
        self
    }

    pub fn with_bias_gradient(mut self, mode: BiasGradient) -> Self {
        self.bias_gradient = mode;
        self
    }
}

/// A fully-connected layer with hand-written gradient rules.
pub struct Dense {
    config: DenseConfig,
    phase: Phase,
    weights: Option<Matrix>,
    bias: Option<Vector>,
    forward_in: DeferredInputCollection,
    backward_in: DeferredInputCollection,
    forward_out: SharedCollection,
    backward_out: SharedCollection,
    grad_weights: Option<Tensor>,
    grad_bias: f64,
    grad_samples: usize,
    last_loss: Option<f64>,
}

impl Dense {
    /// Create a layer in the Created phase.
    pub fn new(config: DenseConfig) -> Self {
        Dense {
            config,
            phase: Phase::Created,
            weights: None,
            bias: None,
            forward_in: DeferredInputCollection::new(),
            backward_in: DeferredInputCollection::new(),
            forward_out: shared(DeferredCollection::new()),
            backward_out: shared(DeferredCollection::new()),
            grad_weights: None,
            grad_bias: 0.0,
            grad_samples: 0,
            last_loss: None,
        }
    }

    /// The layer's configuration.
    pub fn config(&self) -> &DenseConfig {
        &self.config
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The weight matrix, once Initialized.
    pub fn weights(&self) -> Option<&Matrix> {
        self.weights.as_ref()
    }

    /// The bias vector, once Initialized.
    pub fn bias(&self) -> Option<&Vector> {
        self.bias.as_ref()
    }

    fn require_weights(&self) -> Result<&Matrix> {
        self.weights
            .as_ref()
            .ok_or_else(|| Error::msg(format!("dense '{}': weights not initialized", self.config.name)))
    }

    fn require_bias(&self) -> Result<&Vector> {
        self.bias
            .as_ref()
            .ok_or_else(|| Error::msg(format!("dense '{}': bias not initialized", self.config.name)))
    }

    /// Gather this layer's input vector: the default entry's value first,
    /// then every named producer's default output in name order, all
    /// concatenated into one flat vector.
    fn input_vector(&self) -> Result<Vector> {
        let mut gathered: Option<Tensor> = None;
        if let Some(view) = self.forward_in.default_entry() {
            let value = view.read().expect(LOCK).get_default()?;
            gathered = Some(value);
        }
        for name in self.forward_in.names() {
            let value = self.forward_in.get(name)?.read().expect(LOCK).get_default()?;
            gathered = Some(match gathered {
                Some(acc) => acc.concat(&value),
                None => value,
            });
        }
        let flat = gathered
            .ok_or_else(|| Error::msg(format!("dense '{}': no forward inputs bound", self.config.name)))?
            .flatten();
        Vector::from_tensor(flat)
    }

    /// The label tensor, when this layer is bound directly to training
    /// labels and they are currently set.
    fn bound_label(&self) -> Option<Tensor> {
        let view = self.backward_in.default_entry()?;
        let coll = view.read().expect(LOCK);
        coll.get_default().ok()
    }

    /// Chain-rule upstream gradient: the sum over successors of this
    /// layer's segment of their input gradient.
    ///
    /// A successor always sizes the segment to this layer's output, even
    /// when it merges several parents. A successor that never published a
    /// segment surfaces as a key-not-found error here; there is no default
    /// to fall back to.
    fn upstream_gradient(&self) -> Result<Tensor> {
        let mut acc: Option<Tensor> = None;
        for name in self.backward_in.names() {
            let view = self.backward_in.get(name)?;
            let coll = view.read().expect(LOCK);
            let contribution = coll.get(&self.config.name)?;
            acc = Some(match acc {
                Some(sum) => sum.add(&contribution)?,
                None => contribution,
            });
        }
        acc.ok_or_else(|| {
            Error::msg(format!(
                "dense '{}': no labels bound and no successor gradients",
                self.config.name
            ))
        })
    }
}

impl Entity for Dense {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn accepts_input(&self) -> bool {
        true
    }

    fn produces_output(&self) -> bool {
        true
    }

    /// Declare every deferred slot this layer owns. Shapes come from the
    /// layer's own configuration, never from another layer's compile step.
    fn compile(&mut self) -> Result<()> {
        self.phase.expect(&self.config.name, Phase::Created)?;
        let units = self.config.units;
        {
            let mut out = self.forward_out.write().expect(LOCK);
            out.declare(KEY_LINEAR, units)?;
            out.declare_default(KEY_ACTIVATED, units)?;
        }
        {
            let mut out = self.backward_out.write().expect(LOCK);
            out.declare_default(KEY_DELTA, units)?;
            out.declare(KEY_WEIGHTS, (units, self.config.inputs))?;
        }
        self.phase = Phase::Compiled;
        Ok(())
    }

    /// Materialize weights [units, inputs] and bias [units] through the
    /// configured initializers, and declare one backward gradient segment
    /// per forward producer. Producer output shapes only exist once the
    /// whole graph has compiled, which is why the segments are not
    /// declared in `compile`.
    fn initialize(&mut self) -> Result<()> {
        self.phase.expect(&self.config.name, Phase::Compiled)?;
        let w_shape = Shape::from((self.config.units, self.config.inputs));
        self.weights = Some(Matrix::from_tensor(self.config.weight_init.initialize(&w_shape)?)?);
        let b_shape = Shape::from(self.config.units);
        self.bias = Some(Vector::from_tensor(self.config.bias_init.initialize(&b_shape)?)?);
        for name in self.forward_in.names() {
            let width = {
                let view = self.forward_in.get(name)?;
                let coll = view.read().expect(LOCK);
                let key = coll.default_key().ok_or(Error::MissingDefault)?;
                coll.shape_of(key)?.elem_count()
            };
            self.backward_out.write().expect(LOCK).declare(name, width)?;
        }
        self.phase = Phase::Initialized;
        Ok(())
    }

    fn forward(&mut self) -> Result<()> {
        self.phase.expect(&self.config.name, Phase::Initialized)?;
        let x = self.input_vector()?;
        let linear = self
            .require_weights()?
            .vecmul(&x)?
            .into_tensor()
            .add(self.require_bias()?.tensor())?;
        let activated = self.config.activation.calculate(&linear)?;

        let mut out = self.forward_out.write().expect(LOCK);
        out.set(KEY_LINEAR, linear)?;
        out.set_default(activated)?;
        Ok(())
    }

    fn backward(&mut self) -> Result<()> {
        self.phase.expect(&self.config.name, Phase::Initialized)?;
        let (activated, linear) = {
            let out = self.forward_out.read().expect(LOCK);
            (out.get(KEY_ACTIVATED)?, out.get(KEY_LINEAR)?)
        };

        // Runtime branch: a bound label beats the chain rule.
        let (delta, bias_grad) = match self.bound_label() {
            Some(label) => {
                self.last_loss = Some(self.config.loss.calculate(&activated, &label)?);
                let loss_grad = self.config.loss.gradient(&activated, &label)?;
                let act_grad =
                    self.config
                        .activation
                        .derivative(&activated, &linear, Some(&label))?;
                let delta = loss_grad.mul(&act_grad)?;
                let bias_grad = delta.sum();
                (delta, bias_grad)
            }
            None => {
                let upstream = self.upstream_gradient()?;
                let act_grad = self.config.activation.derivative(&activated, &linear, None)?;
                let delta = upstream.mul(&act_grad)?;
                let bias_grad = match self.config.bias_gradient {
                    BiasGradient::Legacy => {
                        self.require_bias()?.dot(&Vector::from_tensor(delta.clone())?)?
                    }
                    BiasGradient::SumDelta => delta.sum(),
                };
                (delta, bias_grad)
            }
        };

        // dW = δ ⊗ xᵗ, accumulated across the batch.
        let x = self.input_vector()?;
        let (units, inputs) = (self.config.units, self.config.inputs);
        let outer = Vector::from_tensor(delta.clone())?
            .expand_to_matrix(units, inputs, Axis::Column)?
            .mul(x.expand_to_matrix(units, inputs, Axis::Row)?.tensor())?;
        self.grad_weights = Some(match self.grad_weights.take() {
            Some(acc) => acc.add(&outer)?,
            None => outer,
        });
        self.grad_bias += bias_grad;
        self.grad_samples += 1;

        // Gradient w.r.t. this layer's full input vector, carved into one
        // segment per producer in the same order `input_vector` gathers
        // them: default entry first, then named producers in name order.
        let input_grad = self
            .require_weights()?
            .transpose()
            .vecmul(&Vector::from_tensor(delta.clone())?)?;
        let flat = input_grad.tensor().data();
        let mut offset = 0;
        if let Some(view) = self.forward_in.default_entry() {
            offset += view.read().expect(LOCK).get_default()?.elem_count();
        }
        let mut out = self.backward_out.write().expect(LOCK);
        out.set(KEY_WEIGHTS, self.require_weights()?.tensor().clone())?;
        for name in self.forward_in.names() {
            let width = self
                .forward_in
                .get(name)?
                .read()
                .expect(LOCK)
                .get_default()?
                .elem_count();
            let segment = Tensor::from_slice(&flat[offset..offset + width], width)?;
            out.set(name, segment)?;
            offset += width;
        }
        out.set_default(delta)?;
        Ok(())
    }

    fn forward_output(&self) -> SharedCollection {
        self.forward_out.clone()
    }

    fn backward_output(&self) -> SharedCollection {
        self.backward_out.clone()
    }

    fn set_forward_inputs(&mut self, inputs: DeferredInputCollection) {
        self.forward_in = inputs;
    }

    fn set_backward_inputs(&mut self, inputs: DeferredInputCollection) {
        self.backward_in = inputs;
    }

    fn forward_inputs(&self) -> &DeferredInputCollection {
        &self.forward_in
    }

    fn backward_inputs(&self) -> &DeferredInputCollection {
        &self.backward_in
    }

    /// Average the accumulated per-sample gradients and run exactly one
    /// optimizer sweep. A layer that saw no samples is left untouched.
    fn apply_gradients(&mut self) -> Result<()> {
        if self.grad_samples == 0 {
            return Ok(());
        }
        let n = self.grad_samples as f64;
        if let Some(acc) = self.grad_weights.take() {
            let averaged = acc.div(n)?;
            let current = self.require_weights()?.tensor().clone();
            let updated = self.config.optimizer.optimize(&current, &averaged)?;
            self.weights = Some(Matrix::from_tensor(updated)?);
        }
        let bias_avg = self.grad_bias / n;
        let current = self.require_bias()?.tensor().clone();
        let bias_gradient = current.map(|_| bias_avg);
        let updated = self.config.optimizer.optimize(&current, &bias_gradient)?;
        self.bias = Some(Vector::from_tensor(updated)?);
        self.grad_bias = 0.0;
        self.grad_samples = 0;
        Ok(())
    }

    /// Unbind every output value between samples; declared shapes and
    /// accumulated gradients survive.
    fn reset(&mut self) -> Result<()> {
        self.forward_out.write().expect(LOCK).unset_all();
        self.backward_out.write().expect(LOCK).unset_all();
        Ok(())
    }

    fn last_loss(&self) -> Option<f64> {
        self.last_loss
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
