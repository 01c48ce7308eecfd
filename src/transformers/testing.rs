//! Reference evaluator for equivalence tests
//!
//! Interprets a function over `ndarray` values. Only used by tests; the
//! library itself never executes graphs.

use ndarray::{ArrayD, Ix2, IxDyn};
use rustc_hash::FxHashMap;

use crate::graph::{Function, NodeId, Op};

/// Evaluate every result of `function` for the given parameter values
pub(crate) fn evaluate(function: &Function, inputs: &[ArrayD<f64>]) -> Vec<ArrayD<f64>> {
    let graph = function.graph();
    let mut values: FxHashMap<NodeId, ArrayD<f64>> = FxHashMap::default();

    for node in function.ordered_ops().unwrap() {
        let entry = graph.get(node).unwrap();
        let arg = |i: usize| &values[&entry.arguments[i]];

        let value = match &entry.op {
            Op::Parameter => {
                let position = function
                    .parameters()
                    .iter()
                    .position(|&p| p == node)
                    .unwrap();
                inputs[position].clone()
            }
            Op::Result => arg(0).clone(),
            Op::Reshape { input_order } => {
                arg(0)
                    .clone()
                    .permuted_axes(IxDyn(input_order))
                    .as_standard_layout()
                    .into_owned()
                    .into_shape_with_order(entry.shape.clone())
                    .unwrap()
            }
            Op::Dot => {
                let lhs = arg(0).clone().into_dimensionality::<Ix2>().unwrap();
                let rhs = arg(1).clone().into_dimensionality::<Ix2>().unwrap();
                lhs.dot(&rhs).into_dyn()
            }
            Op::Add => arg(0) + arg(1),
            Op::Multiply => arg(0) * arg(1),
            Op::Negative => arg(0).mapv(|v| -v),
            Op::Relu => arg(0).mapv(|v| v.max(0.0)),
        };
        assert_eq!(value.shape(), entry.shape.as_slice(), "shape of {}", entry.name);
        values.insert(node, value);
    }

    function
        .results()
        .iter()
        .map(|result| values[result].clone())
        .collect()
}

/// Deterministic test input of the given shape
pub(crate) fn ramp(shape: &[usize], offset: f64) -> ArrayD<f64> {
    let mut counter = offset;
    ArrayD::from_shape_simple_fn(IxDyn(shape), || {
        counter += 1.0;
        counter * 0.5 - 3.0
    })
}
