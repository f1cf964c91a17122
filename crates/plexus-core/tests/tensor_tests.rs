use plexus_core::{Error, Result, Tensor};

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn clone_mints_a_fresh_identity() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0], 3)?;
    let b = a.clone();
    assert_ne!(a.id(), b.id());
    assert!(a.equals(&b));
    Ok(())
}

#[test]
fn scalar_add_zero_is_identity() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, -2.5, 7.0, 0.0], [2, 2])?;
    let b = a.add(0.0)?;
    assert!(a.equals(&b));
    assert_ne!(a.id(), b.id());
    Ok(())
}

#[test]
fn elementwise_arithmetic() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], [2, 2])?;
    let b = Tensor::from_slice(&[4.0, 3.0, 2.0, 1.0], [2, 2])?;

    assert_eq!(a.add(&b)?.data(), &[5.0, 5.0, 5.0, 5.0]);
    assert_eq!(a.sub(&b)?.data(), &[-3.0, -1.0, 1.0, 3.0]);
    assert_eq!(a.mul(&b)?.data(), &[4.0, 6.0, 6.0, 4.0]);
    assert_eq!(a.div(&b)?.data(), &[0.25, 2.0 / 3.0, 1.5, 4.0]);
    assert_eq!(a.mul(2.0)?.data(), &[2.0, 4.0, 6.0, 8.0]);
    Ok(())
}

#[test]
fn elementwise_shape_mismatch_fails() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], [2, 2])?;
    let b = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], 4)?;
    assert!(matches!(a.add(&b), Err(Error::ShapeMismatch { .. })));
    Ok(())
}

#[test]
fn from_slice_count_must_match_shape() {
    let result = Tensor::from_slice(&[1.0, 2.0, 3.0], [2, 2]);
    assert!(matches!(result, Err(Error::ElementCountMismatch { .. })));
}

#[test]
fn zero_sized_dimensions_are_rejected() {
    assert!(matches!(
        Tensor::zeros([2, 0, 3]),
        Err(Error::MalformedShape { .. })
    ));
}

#[test]
fn nested_construction_infers_shape() -> Result<()> {
    let t = Tensor::from_nested(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]])?;
    assert_eq!(t.dims(), &[2, 3]);
    assert_eq!(t.data(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    Ok(())
}

#[test]
fn ragged_nested_construction_fails() {
    let result = Tensor::from_nested(vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]);
    assert!(matches!(result, Err(Error::RaggedData { .. })));
}

#[test]
fn positional_get_and_set() -> Result<()> {
    let mut t = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3])?;
    assert!(approx_eq(t.get(&[0, 0])?, 1.0));
    assert!(approx_eq(t.get(&[1, 2])?, 6.0));

    t.set(&[1, 0], 40.0)?;
    assert!(approx_eq(t.get(&[1, 0])?, 40.0));

    assert!(matches!(
        t.get(&[0, 3]),
        Err(Error::IndexOutOfBounds { .. })
    ));
    assert!(matches!(t.get(&[0]), Err(Error::PositionLength { .. })));
    Ok(())
}

#[test]
fn concat_flattens_both_operands() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0], [2, 4])?;
    let b = Tensor::from_slice(&[9.0, 10.0, 11.0, 12.0, 13.0, 14.0], [3, 2])?;
    let joined = a.concat(&b);
    assert_eq!(joined.rank(), 1);
    assert_eq!(joined.elem_count(), 14);
    let expected: Vec<f64> = (1..=14).map(|i| i as f64).collect();
    assert_eq!(joined.data(), expected.as_slice());
    Ok(())
}

#[test]
fn reductions() -> Result<()> {
    let t = Tensor::from_slice(&[3.0, -1.0, 4.0, 2.0], 4)?;
    assert!(approx_eq(t.sum(), 8.0));
    assert!(approx_eq(t.mean(), 2.0));
    assert!(approx_eq(t.min(), -1.0));
    assert!(approx_eq(t.max(), 4.0));
    assert_eq!(t.argmin()?, 1);
    assert_eq!(t.argmax()?, 2);
    assert!(approx_eq(t.sum_by(|v| v * v), 9.0 + 1.0 + 16.0 + 4.0));
    Ok(())
}

#[test]
fn argmax_requires_flat_rank() -> Result<()> {
    let t = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0], [2, 2])?;
    assert!(matches!(t.argmax(), Err(Error::RankMismatch { .. })));
    Ok(())
}

#[test]
fn normalize_handles_the_zero_vector() -> Result<()> {
    let t = Tensor::from_slice(&[3.0, 4.0], 2)?;
    let unit = t.normalize();
    assert!(approx_eq(unit.data()[0], 0.6));
    assert!(approx_eq(unit.data()[1], 0.8));

    let zero = Tensor::zeros(3)?;
    assert!(zero.normalize().equals(&zero));
    Ok(())
}

#[test]
fn map_and_clamp() -> Result<()> {
    let t = Tensor::from_slice(&[-2.0, 0.5, 3.0], 3)?;
    assert_eq!(t.map(|v| v * 10.0).data(), &[-20.0, 5.0, 30.0]);
    assert_eq!(t.clamp(-1.0, 1.0).data(), &[-1.0, 0.5, 1.0]);
    Ok(())
}

#[test]
fn iterate_zips_lockstep_elements() -> Result<()> {
    let a = Tensor::from_slice(&[1.0, 2.0], 2)?;
    let b = Tensor::from_slice(&[10.0, 20.0], 2)?;
    let c = Tensor::from_slice(&[100.0, 200.0], 2)?;
    let out = Tensor::iterate(&[&a, &b, &c], |vs| vs.iter().sum())?;
    assert_eq!(out.data(), &[111.0, 222.0]);
    Ok(())
}

#[test]
fn flatten_keeps_data_order() -> Result<()> {
    let t = Tensor::from_slice(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], [2, 3])?;
    let flat = t.flatten();
    assert_eq!(flat.dims(), &[6]);
    assert_eq!(flat.data(), t.data());
    Ok(())
}
