use std::any::Any;
use std::sync::{Arc, Mutex};

use plexus_core::{Error, Result, Tensor};
use plexus_graph::{
    shared, DeferredCollection, DeferredInputCollection, Entity, Graph, GraphProcessor, GraphState,
    NodeId, SharedCollection,
};

// A minimal pass-through entity: forward/backward just record the call and
// bind a unit output, which is enough to drive the connector and scheduler.
struct Stage {
    name: String,
    accepts: bool,
    produces: bool,
    log: Arc<Mutex<Vec<String>>>,
    forward_in: DeferredInputCollection,
    backward_in: DeferredInputCollection,
    forward_out: SharedCollection,
    backward_out: SharedCollection,
}

impl Stage {
    fn new(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        Stage {
            name: name.to_string(),
            accepts: true,
            produces: true,
            log,
            forward_in: DeferredInputCollection::new(),
            backward_in: DeferredInputCollection::new(),
            forward_out: shared(DeferredCollection::new()),
            backward_out: shared(DeferredCollection::new()),
        }
    }

    fn internal(name: &str, log: Arc<Mutex<Vec<String>>>) -> Self {
        let mut stage = Self::new(name, log);
        stage.accepts = false;
        stage.produces = false;
        stage
    }
}

impl Entity for Stage {
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts_input(&self) -> bool {
        self.accepts
    }

    fn produces_output(&self) -> bool {
        self.produces
    }

    fn compile(&mut self) -> Result<()> {
        self.forward_out.write().unwrap().declare_default("out", 1)?;
        self.backward_out.write().unwrap().declare_default("grad", 1)?;
        Ok(())
    }

    fn initialize(&mut self) -> Result<()> {
        Ok(())
    }

    fn forward(&mut self) -> Result<()> {
        self.log.lock().unwrap().push(format!("fwd:{}", self.name));
        self.forward_out
            .write()
            .unwrap()
            .set_default(Tensor::zeros(1)?)?;
        Ok(())
    }

    fn backward(&mut self) -> Result<()> {
        self.log.lock().unwrap().push(format!("bwd:{}", self.name));
        self.backward_out
            .write()
            .unwrap()
            .set_default(Tensor::zeros(1)?)?;
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

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn stage(graph: &mut Graph, name: &str, log: &Arc<Mutex<Vec<String>>>) -> Result<NodeId> {
    graph.add(Box::new(Stage::new(name, log.clone())), &[])
}

/// A collection holding one bound unit value, ready to serve as a feed
/// default.
fn bound_feed() -> Result<SharedCollection> {
    let mut coll = DeferredCollection::new();
    coll.declare_default("value", 1)?;
    coll.set_default(Tensor::zeros(1)?)?;
    Ok(shared(coll))
}

fn wave_names(graph: &Graph, waves: &[Vec<NodeId>]) -> Vec<Vec<String>> {
    waves
        .iter()
        .map(|wave| {
            wave.iter()
                .map(|&id| graph.node(id).unwrap().name().to_string())
                .collect()
        })
        .collect()
}

#[test]
fn add_find_and_duplicate_names() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    assert!(graph.is_empty());

    let a = stage(&mut graph, "a", &log)?;
    let b = graph.add(Box::new(Stage::new("b", log.clone())), &["a".into()])?;
    assert_eq!(graph.len(), 2);
    assert_eq!(graph.find("a")?, a);
    assert_eq!(graph.find(1usize)?, b);
    assert_eq!(graph.find(b)?, b);
    assert!(matches!(
        graph.find("ghost"),
        Err(Error::UnknownEntity { .. })
    ));

    // adding under an unknown parent fails
    assert!(graph
        .add(Box::new(Stage::new("c", log.clone())), &["ghost".into()])
        .is_err());

    // names are unique per graph
    assert!(matches!(
        graph.add(Box::new(Stage::new("a", log.clone())), &[]),
        Err(Error::DuplicateEntity { .. })
    ));
    Ok(())
}

#[test]
fn link_is_idempotent_and_unlink_repairs() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;

    graph.link(a, b)?;
    graph.link(a, b)?; // no duplicate edge
    assert_eq!(graph.node(a)?.outputs(), &[b]);
    assert_eq!(graph.node(b)?.inputs(), &[a]);

    graph.unlink(a, b)?;
    assert!(graph.node(a)?.outputs().is_empty());
    assert!(graph.node(b)?.inputs().is_empty());
    assert!(matches!(graph.unlink(a, b), Err(Error::MissingEdge { .. })));
    Ok(())
}

#[test]
fn cycles_are_rejected_at_link_time() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    let d = stage(&mut graph, "d", &log)?;

    assert!(matches!(graph.link(a, a), Err(Error::CircularGraph { .. })));

    graph.link(a, b)?;
    assert!(matches!(graph.link(b, a), Err(Error::CircularGraph { .. })));

    graph.link(b, c)?;
    assert!(matches!(graph.link(c, a), Err(Error::CircularGraph { .. })));

    // a sibling branch into the middle of the chain is fine
    graph.link(d, b)?;
    assert_eq!(graph.sources(), vec![a, d]);
    assert_eq!(graph.sinks(), vec![c]);
    Ok(())
}

#[test]
fn remove_detaches_every_edge() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    graph.link(a, b)?;
    graph.link(b, c)?;

    let removed = graph.remove(b)?;
    assert_eq!(removed.name(), "b");
    assert_eq!(graph.len(), 2);
    assert!(graph.node(a)?.outputs().is_empty());
    assert!(graph.node(c)?.inputs().is_empty());
    assert!(matches!(graph.node(b), Err(Error::UnknownEntity { .. })));
    Ok(())
}

#[test]
fn compile_locks_all_structural_mutation() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;

    assert_eq!(graph.state(), GraphState::Created);
    graph.compile()?;
    assert_eq!(graph.state(), GraphState::Compiled);

    assert!(matches!(
        graph.add(Box::new(Stage::new("c", log.clone())), &[]),
        Err(Error::GraphLocked { .. })
    ));
    assert!(matches!(graph.link(a, b), Err(Error::GraphLocked { .. })));
    assert!(matches!(graph.unlink(a, b), Err(Error::GraphLocked { .. })));
    assert!(matches!(graph.remove(a), Err(Error::GraphLocked { .. })));
    assert!(matches!(
        graph.forward_feed_mut(),
        Err(Error::GraphLocked { .. })
    ));
    assert!(matches!(graph.compile(), Err(Error::GraphLocked { .. })));
    Ok(())
}

#[test]
fn verify_rejects_isolated_nodes() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    stage(&mut graph, "loner", &log)?;
    graph.link(a, b)?;

    assert!(matches!(graph.compile(), Err(Error::Disconnected { .. })));
    Ok(())
}

#[test]
fn verify_checks_boundary_capabilities() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));

    // source that does not accept graph input
    let mut graph = Graph::new();
    let a = graph.add(Box::new(Stage::internal("a", log.clone())), &[])?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;
    assert!(matches!(graph.compile(), Err(Error::UnfedSource { .. })));

    // sink that does not produce graph output
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = graph.add(Box::new(Stage::internal("b", log.clone())), &[])?;
    graph.link(a, b)?;
    assert!(matches!(
        graph.compile(),
        Err(Error::UnterminatedSink { .. })
    ));
    Ok(())
}

#[test]
fn name_matched_feed_entry_binds_as_node_default() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;
    graph.forward_feed_mut()?.insert("a", bound_feed()?)?;
    graph.compile()?;

    let a_inputs = graph.node(a)?.entity().forward_inputs();
    assert!(a_inputs.has_default());
    assert_eq!(a_inputs.len(), 0);

    let b_inputs = graph.node(b)?.entity().forward_inputs();
    assert!(!b_inputs.has_default());
    assert_eq!(b_inputs.names(), vec!["a"]);
    Ok(())
}

#[test]
fn graph_default_feed_is_consumed_exactly_once() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));

    // two unfed sources compete for the single default entry
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    graph.link(a, c)?;
    graph.link(b, c)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;
    assert!(matches!(
        graph.compile(),
        Err(Error::DefaultFeedConflict { .. })
    ));

    // a declared default that no node can consume is also an error
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;
    graph.forward_feed_mut()?.insert("a", bound_feed()?)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;
    assert!(matches!(
        graph.compile(),
        Err(Error::UnconsumedDefault { .. })
    ));
    Ok(())
}

#[test]
fn populated_feed_must_cover_every_boundary_node() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;

    // the feed names only the sink, so the source is left with nothing to
    // read; that must surface at compile time, not at forward time
    graph.forward_feed_mut()?.insert("b", bound_feed()?)?;
    assert!(matches!(
        graph.compile(),
        Err(Error::UnfedBoundary { .. })
    ));
    Ok(())
}

#[test]
fn forward_waves_follow_data_readiness() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    graph.link(a, b)?;
    graph.link(b, c)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;
    graph.compile()?;

    let waves = GraphProcessor::new(&mut graph).process_forward()?;
    assert_eq!(
        wave_names(&graph, &waves),
        vec![vec!["a"], vec!["b"], vec!["c"]]
    );
    assert_eq!(
        log.lock().unwrap().as_slice(),
        &["fwd:a", "fwd:b", "fwd:c"]
    );
    Ok(())
}

#[test]
fn independent_nodes_share_a_wave() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    let d = stage(&mut graph, "d", &log)?;
    graph.link(a, b)?;
    graph.link(a, c)?;
    graph.link(b, d)?;
    graph.link(c, d)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;
    graph.compile()?;

    let waves = GraphProcessor::new(&mut graph).process_forward()?;
    assert_eq!(
        wave_names(&graph, &waves),
        vec![vec!["a"], vec!["b", "c"], vec!["d"]]
    );
    Ok(())
}

#[test]
fn backward_waves_run_in_reverse() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    let c = stage(&mut graph, "c", &log)?;
    graph.link(a, b)?;
    graph.link(b, c)?;
    graph.forward_feed_mut()?.set_default(bound_feed()?)?;
    graph.backward_feed_mut()?.set_default(bound_feed()?)?;
    graph.compile()?;

    GraphProcessor::new(&mut graph).process_forward()?;
    let waves = GraphProcessor::new(&mut graph).process_backward()?;
    assert_eq!(
        wave_names(&graph, &waves),
        vec![vec!["c"], vec!["b"], vec!["a"]]
    );
    Ok(())
}

#[test]
fn stuck_schedule_is_a_deterministic_error() -> Result<()> {
    let log = Arc::new(Mutex::new(Vec::new()));
    let mut graph = Graph::new();
    let a = stage(&mut graph, "a", &log)?;
    let b = stage(&mut graph, "b", &log)?;
    graph.link(a, b)?;

    // declared but never bound: the source can never become ready
    let mut coll = DeferredCollection::new();
    coll.declare_default("value", 1)?;
    graph.forward_feed_mut()?.set_default(shared(coll))?;
    graph.compile()?;

    let result = GraphProcessor::new(&mut graph).process_forward();
    assert!(matches!(
        result,
        Err(Error::UnresolvableSchedule { remaining: 2 })
    ));
    assert!(log.lock().unwrap().is_empty());
    Ok(())
}
