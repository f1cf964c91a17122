use plexus_core::{Error, Result, Shape, Tensor};
use plexus_graph::{shared, DeferredCollection, DeferredInputCollection, DeferredValue};

#[test]
fn value_walks_the_three_states() -> Result<()> {
    let mut slot = DeferredValue::new();
    assert!(!slot.is_declared());
    assert!(!slot.is_set());
    assert!(matches!(slot.get("x"), Err(Error::NotDeclared { .. })));

    slot.declare("x", Shape::from(2))?;
    assert!(slot.is_declared());
    assert!(!slot.is_set());
    assert!(matches!(slot.get("x"), Err(Error::NotSet { .. })));

    slot.set("x", Tensor::from_slice(&[1.0, 2.0], 2)?)?;
    assert!(slot.is_set());
    assert_eq!(slot.get("x")?.data(), &[1.0, 2.0]);

    // unset drops the value but keeps the declared shape
    slot.unset();
    assert!(slot.is_declared());
    assert!(!slot.is_set());
    assert!(matches!(slot.get("x"), Err(Error::NotSet { .. })));
    assert_eq!(slot.shape().map(Shape::dims), Some(&[2][..]));
    Ok(())
}

#[test]
fn value_declare_is_one_shot() -> Result<()> {
    let mut slot = DeferredValue::new();
    slot.declare("x", Shape::from(2))?;
    assert!(matches!(
        slot.declare("x", Shape::from(3)),
        Err(Error::AlreadyDeclared { .. })
    ));
    Ok(())
}

#[test]
fn value_rejects_shape_disagreement() -> Result<()> {
    let mut slot = DeferredValue::new();
    assert!(matches!(
        slot.set("x", Tensor::zeros(2)?),
        Err(Error::NotDeclared { .. })
    ));

    slot.declare("x", Shape::from(2))?;
    assert!(matches!(
        slot.set("x", Tensor::zeros(3)?),
        Err(Error::InvalidValue { .. })
    ));
    Ok(())
}

#[test]
fn value_rebinds_after_unset() -> Result<()> {
    let mut slot = DeferredValue::new();
    slot.declare("x", Shape::from(1))?;
    for i in 0..3 {
        slot.set("x", Tensor::from_slice(&[i as f64], 1)?)?;
        assert_eq!(slot.get("x")?.data(), &[i as f64]);
        slot.unset();
    }
    Ok(())
}

#[test]
fn collection_default_key_routing() -> Result<()> {
    let mut coll = DeferredCollection::new();
    assert!(matches!(
        coll.set_default(Tensor::zeros(1)?),
        Err(Error::MissingDefault)
    ));

    coll.declare("aux", 3)?;
    coll.declare_default("main", 2)?;
    assert_eq!(coll.default_key(), Some("main"));

    // a second default designation fails
    assert!(matches!(
        coll.declare_default("other", 1),
        Err(Error::AlreadyDeclared { .. })
    ));

    coll.set_default(Tensor::from_slice(&[1.0, 2.0], 2)?)?;
    assert_eq!(coll.get_default()?.data(), &[1.0, 2.0]);
    assert_eq!(coll.get("main")?.data(), &[1.0, 2.0]);
    Ok(())
}

#[test]
fn collection_set_and_unset_cycle() -> Result<()> {
    let mut coll = DeferredCollection::new();
    coll.declare_default("out", 2)?;
    coll.declare("hidden", 2)?;
    assert!(!coll.are_all_set());
    assert!(coll.are_all_declared());

    coll.set("out", Tensor::zeros(2)?)?;
    assert!(!coll.are_all_set());
    coll.set("hidden", Tensor::zeros(2)?)?;
    assert!(coll.are_all_set());

    coll.unset("out")?;
    assert!(!coll.is_set("out"));
    assert!(coll.is_set("hidden"));

    coll.unset_all();
    assert!(!coll.are_all_set());
    assert!(coll.are_all_declared());
    Ok(())
}

#[test]
fn collection_lookup_errors_name_the_key() -> Result<()> {
    let mut coll = DeferredCollection::new();
    coll.declare("a", 1)?;
    assert!(matches!(
        coll.set("missing", Tensor::zeros(1)?),
        Err(Error::NotDeclared { .. })
    ));
    assert!(matches!(coll.get("missing"), Err(Error::KeyNotFound { .. })));
    assert!(matches!(
        coll.declare("a", 1),
        Err(Error::AlreadyDeclared { .. })
    ));
    Ok(())
}

#[test]
fn collection_keys_are_sorted() -> Result<()> {
    let mut coll = DeferredCollection::new();
    coll.declare("zeta", 1)?;
    coll.declare("alpha", 1)?;
    coll.declare("mid", 1)?;
    assert_eq!(coll.keys(), vec!["alpha", "mid", "zeta"]);
    Ok(())
}

#[test]
fn collection_assign_remaps_the_peer_default() -> Result<()> {
    let mut source = DeferredCollection::new();
    source.declare_default("theirs", 2)?;
    source.declare("extra", 1)?;
    source.set_default(Tensor::from_slice(&[1.0, 2.0], 2)?)?;
    // "extra" stays unbound and must be skipped

    let mut target = DeferredCollection::new();
    target.declare_default("mine", 2)?;
    target.declare("extra", 1)?;
    target.assign(&source)?;

    assert_eq!(target.get("mine")?.data(), &[1.0, 2.0]);
    assert!(!target.is_set("extra"));
    Ok(())
}

#[test]
fn input_collection_default_binds_once() -> Result<()> {
    let mut inputs = DeferredInputCollection::new();
    assert!(inputs.is_empty());

    let view = shared(DeferredCollection::new());
    inputs.set_default(view.clone())?;
    assert!(inputs.has_default());
    assert!(matches!(
        inputs.set_default(view),
        Err(Error::DuplicateKey { .. })
    ));
    Ok(())
}

#[test]
fn input_collection_named_entries() -> Result<()> {
    let mut inputs = DeferredInputCollection::new();
    let a = shared(DeferredCollection::new());
    let b = shared(DeferredCollection::new());

    inputs.insert("b", b)?;
    inputs.insert("a", a.clone())?;
    assert!(matches!(
        inputs.insert("a", a),
        Err(Error::DuplicateKey { .. })
    ));

    assert_eq!(inputs.names(), vec!["a", "b"]);
    assert_eq!(inputs.len(), 2);
    assert!(inputs.get("a").is_ok());
    assert!(matches!(inputs.get("c"), Err(Error::KeyNotFound { .. })));
    Ok(())
}

#[test]
fn input_collection_get_or_default_falls_back() -> Result<()> {
    let mut inputs = DeferredInputCollection::new();
    let named = shared(DeferredCollection::new());
    let fallback = shared(DeferredCollection::new());
    inputs.insert("known", named)?;

    assert!(matches!(
        inputs.get_or_default("unknown"),
        Err(Error::KeyNotFound { .. })
    ));
    inputs.set_default(fallback.clone())?;
    let resolved = inputs.get_or_default("unknown")?;
    assert!(std::sync::Arc::ptr_eq(resolved, &fallback));
    Ok(())
}

#[test]
fn input_collection_merge_and_filter() -> Result<()> {
    let mut base = DeferredInputCollection::new();
    base.insert("a", shared(DeferredCollection::new()))?;

    let mut incoming = DeferredInputCollection::new();
    incoming.insert("b", shared(DeferredCollection::new()))?;
    incoming.set_default(shared(DeferredCollection::new()))?;

    // incoming default lands under an override name
    base.merge(&incoming, Some("feed"), false)?;
    assert_eq!(base.names(), vec!["a", "b", "feed"]);
    assert!(!base.has_default());

    // duplicate without force fails, with force overwrites
    assert!(base.merge(&incoming, Some("feed"), false).is_err());
    base.merge(&incoming, Some("feed"), true)?;

    let projected = base.filter(&["a", "feed"], false)?;
    assert_eq!(projected.names(), vec!["a", "feed"]);
    assert!(matches!(
        base.filter(&["ghost"], false),
        Err(Error::KeyNotFound { .. })
    ));
    assert!(base.filter(&["ghost"], true)?.is_empty());
    Ok(())
}

#[test]
fn input_collection_readiness_spans_all_views() -> Result<()> {
    let producer = {
        let mut coll = DeferredCollection::new();
        coll.declare_default("out", 1)?;
        shared(coll)
    };
    let feed = {
        let mut coll = DeferredCollection::new();
        coll.declare_default("input", 1)?;
        shared(coll)
    };

    let mut inputs = DeferredInputCollection::new();
    inputs.insert("producer", producer.clone())?;
    inputs.set_default(feed.clone())?;
    assert!(inputs.are_all_declared());
    assert!(!inputs.are_all_set());

    feed.write().unwrap().set_default(Tensor::zeros(1)?)?;
    assert!(!inputs.are_all_set());
    producer.write().unwrap().set_default(Tensor::zeros(1)?)?;
    assert!(inputs.are_all_set());
    Ok(())
}
