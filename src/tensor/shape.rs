//! Shape and axis order utilities
//!
//! A reshape carries an input axis order: its argument is first transposed by
//! that order, then reinterpreted row-major as the output shape. The helpers
//! here implement the permutation algebra the reshape passes rely on.

/// Ordered dimension sizes
pub type Shape = Vec<usize>;

/// Ordered permutation of axis indices
pub type AxisVector = Vec<usize>;

/// Calculate total number of elements from shape
pub fn numel(shape: &[usize]) -> usize {
    shape.iter().product()
}

/// Identity permutation `[0, 1, ..., rank - 1]`
pub fn default_order(rank: usize) -> AxisVector {
    (0..rank).collect()
}

/// Check if an order is the identity permutation for its length
pub fn is_default_order(order: &[usize]) -> bool {
    order.iter().enumerate().all(|(i, &axis)| axis == i)
}

/// Check if `order` is a permutation of `0..rank`
pub fn is_permutation(order: &[usize], rank: usize) -> bool {
    if order.len() != rank {
        return false;
    }
    let mut seen = vec![false; rank];
    for &axis in order {
        if axis >= rank || seen[axis] {
            return false;
        }
        seen[axis] = true;
    }
    true
}

/// Apply a permutation: `out[i] = input[order[i]]`
///
/// Returns `None` if the lengths differ or an index is out of range.
pub fn apply_permutation<T: Copy>(input: &[T], order: &[usize]) -> Option<Vec<T>> {
    if input.len() != order.len() {
        return None;
    }
    order.iter().map(|&axis| input.get(axis).copied()).collect()
}

/// Inverse of a permutation, `None` if `order` is not a permutation
pub fn inverse_permutation(order: &[usize]) -> Option<AxisVector> {
    if !is_permutation(order, order.len()) {
        return None;
    }
    let mut inverse = vec![0; order.len()];
    for (i, &axis) in order.iter().enumerate() {
        inverse[axis] = i;
    }
    Some(inverse)
}

/// Compose two axis orders of the same rank
///
/// Applies `first` to the default order, then `second` to the result. The
/// composition is the default order exactly when the two orders undo each
/// other.
pub fn compose_orders(first: &[usize], second: &[usize]) -> Option<AxisVector> {
    let start = default_order(first.len());
    let after_first = apply_permutation(&start, first)?;
    apply_permutation(&after_first, second)
}

/// Shape of `shape` after its axes are reordered by `order`
pub fn permuted_shape(shape: &[usize], order: &[usize]) -> Option<Shape> {
    apply_permutation(shape, order)
}

/// Swap the dimensions of a rank-2 shape
pub fn transposed_2d(shape: &[usize]) -> Option<Shape> {
    match shape {
        [rows, cols] => Some(vec![*cols, *rows]),
        _ => None,
    }
}
