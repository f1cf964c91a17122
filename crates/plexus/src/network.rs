use plexus_core::{Error, Result, Tensor};
use plexus_data::Feed;
use plexus_graph::{
    shared, DeferredCollection, Entity, Graph, GraphProcessor, NodeId, NodeQuery, SharedCollection,
};

// Network — the high-level training facade
//
// A Network owns the layer graph plus the two graph-level collections the
// connector hands to boundary nodes: the input collection (samples go in
// here) and the expected collection (labels go in here). Wiring and
// scheduling stay the graph machinery's job.
//
// Mini-batch fitting is strictly sequential: each sample's full
// forward + backward + accumulate cycle completes before the next begins,
// and exactly one optimizer sweep runs per batch, over the averaged
// accumulated gradients.

const LOCK: &str = "collection lock poisoned";

/// Key of the network-level sample slot.
pub const KEY_INPUT: &str = "input";
/// Key of the network-level label slot.
pub const KEY_EXPECTED: &str = "expected";

/// Options for a training run.
#[derive(Debug, Clone)]
pub struct FitOptions {
    /// Number of passes over the feed.
    pub epochs: usize,
    /// Samples per optimizer sweep.
    pub batch_size: usize,
}

impl Default for FitOptions {
    fn default() -> Self {
        FitOptions {
            epochs: 1,
            batch_size: 1,
        }
    }
}

/// Log for a single training epoch.
#[derive(Debug, Clone)]
pub struct EpochLog {
    /// Epoch number (0-indexed).
    pub epoch: usize,
    /// Mean loss over the epoch's samples.
    pub loss: f64,
}

/// Summary of a full training run.
#[derive(Debug, Clone)]
pub struct FitReport {
    /// Per-epoch logs.
    pub epochs: Vec<EpochLog>,
    /// Mean loss of the final epoch.
    pub final_loss: f64,
}

impl std::fmt::Display for FitReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Training complete ({} epochs)", self.epochs.len())?;
        for log in &self.epochs {
            writeln!(f, "  epoch {}: loss = {:.6}", log.epoch, log.loss)?;
        }
        write!(f, "  final loss: {:.6}", self.final_loss)
    }
}

/// A layer graph with its network-level sample and label collections.
pub struct Network {
    graph: Graph,
    input: SharedCollection,
    expected: SharedCollection,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create an empty network.
    pub fn new() -> Self {
        Network {
            graph: Graph::new(),
            input: shared(DeferredCollection::new()),
            expected: shared(DeferredCollection::new()),
        }
    }

    /// Register a layer, linked under the given parent layers.
    pub fn add(&mut self, layer: impl Entity + 'static, parents: &[&str]) -> Result<NodeId> {
        let parents: Vec<NodeQuery> = parents.iter().map(|&p| NodeQuery::from(p)).collect();
        self.graph.add(Box::new(layer), &parents)
    }

    /// The underlying graph.
    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// The underlying graph, mutably.
    pub fn graph_mut(&mut self) -> &mut Graph {
        &mut self.graph
    }

    /// Downcast a named layer to its concrete type.
    pub fn layer<T: 'static>(&self, name: &str) -> Result<&T> {
        let id = self.graph.find(name)?;
        self.graph
            .node(id)?
            .entity()
            .as_any()
            .downcast_ref::<T>()
            .ok_or_else(|| Error::msg(format!("entity '{name}' is not the requested layer type")))
    }

    /// Declare the network-level sample/label slots, install them as the
    /// graph feeds' default entries, and compile the graph.
    pub fn compile(&mut self, input_len: usize, label_len: usize) -> Result<()> {
        self.input
            .write()
            .expect(LOCK)
            .declare_default(KEY_INPUT, input_len)?;
        self.expected
            .write()
            .expect(LOCK)
            .declare_default(KEY_EXPECTED, label_len)?;
        self.graph.forward_feed_mut()?.set_default(self.input.clone())?;
        self.graph.backward_feed_mut()?.set_default(self.expected.clone())?;
        self.graph.compile()
    }

    /// Initialize every layer's parameters.
    pub fn init(&mut self) -> Result<()> {
        for id in self.graph.ids() {
            self.graph.node_mut(id)?.entity_mut().initialize()?;
        }
        Ok(())
    }

    /// Run one forward pass over a single sample and return the sink
    /// layer's default output.
    pub fn predict(&mut self, sample: &Tensor) -> Result<Tensor> {
        self.input.write().expect(LOCK).set_default(sample.clone())?;
        GraphProcessor::new(&mut self.graph).process_forward()?;
        let output = self.sink_output()?;
        self.clear_bindings()?;
        Ok(output)
    }

    /// Train on a feed: strictly sequential samples, one optimizer sweep
    /// per batch over the averaged accumulated gradients.
    pub fn fit(&mut self, feed: &mut dyn Feed, options: &FitOptions) -> Result<FitReport> {
        let mut epochs = Vec::with_capacity(options.epochs);
        for epoch in 0..options.epochs {
            feed.seek(0);
            let mut losses = Vec::new();
            while feed.has_more() {
                let mut in_batch = 0;
                while in_batch < options.batch_size && feed.has_more() {
                    let item = feed.next()?;
                    self.input.write().expect(LOCK).set_default(item.sample)?;
                    self.expected.write().expect(LOCK).set_default(item.label)?;
                    GraphProcessor::new(&mut self.graph).process_forward()?;
                    GraphProcessor::new(&mut self.graph).process_backward()?;
                    if let Some(loss) = self.sink_loss()? {
                        losses.push(loss);
                    }
                    self.clear_bindings()?;
                    in_batch += 1;
                }
                for id in self.graph.ids() {
                    self.graph.node_mut(id)?.entity_mut().apply_gradients()?;
                }
            }
            let loss = if losses.is_empty() {
                0.0
            } else {
                losses.iter().sum::<f64>() / losses.len() as f64
            };
            epochs.push(EpochLog { epoch, loss });
        }
        let final_loss = epochs.last().map(|l| l.loss).unwrap_or(0.0);
        Ok(FitReport { epochs, final_loss })
    }

    /// The first sink's default forward output.
    fn sink_output(&self) -> Result<Tensor> {
        let sink = self
            .graph
            .sinks()
            .into_iter()
            .next()
            .ok_or_else(|| Error::msg("network has no sink node"))?;
        let view = self.graph.node(sink)?.entity().forward_output();
        let output = view.read().expect(LOCK).get_default()?;
        Ok(output)
    }

    /// The mean of the sink layers' recorded losses, if any recorded one.
    fn sink_loss(&self) -> Result<Option<f64>> {
        let mut losses = Vec::new();
        for id in self.graph.sinks() {
            if let Some(loss) = self.graph.node(id)?.entity().last_loss() {
                losses.push(loss);
            }
        }
        if losses.is_empty() {
            return Ok(None);
        }
        Ok(Some(losses.iter().sum::<f64>() / losses.len() as f64))
    }

    /// Unbind the network-level slots and every layer's outputs, keeping
    /// declared shapes and accumulated gradients.
    fn clear_bindings(&mut self) -> Result<()> {
        self.input.write().expect(LOCK).unset_all();
        self.expected.write().expect(LOCK).unset_all();
        for id in self.graph.ids() {
            self.graph.node_mut(id)?.entity_mut().reset()?;
        }
        Ok(())
    }
}
