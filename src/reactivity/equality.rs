// ============================================================================
// spark-entities - Equality Functions
// Change detection for cells and selectors
// ============================================================================
//
// Entity collections are shared through `Rc`, so most selectors compare by
// reference: a buffer the adapter did not replace is the same allocation.
// ============================================================================

use std::rc::Rc;

// =============================================================================
// STRICT EQUALITY
// =============================================================================

/// Strict equality using PartialEq.
///
/// # Example
/// ```
/// use spark_entities::reactivity::equality::equals;
///
/// assert!(equals(&42, &42));
/// assert!(!equals(&42, &43));
/// ```
pub fn equals<T: PartialEq>(a: &T, b: &T) -> bool {
    a == b
}

/// Never equal - every recomputation counts as a change.
pub fn never_equals<T>(_a: &T, _b: &T) -> bool {
    false
}

/// Always equal - the first computed value is never replaced.
pub fn always_equals<T>(_a: &T, _b: &T) -> bool {
    true
}

// =============================================================================
// REFERENCE EQUALITY
// =============================================================================

/// Same allocation.
///
/// # Example
/// ```
/// use spark_entities::reactivity::equality::rc_ptr_equals;
/// use std::rc::Rc;
///
/// let a = Rc::new(vec![1]);
/// assert!(rc_ptr_equals(&a, &a.clone()));
/// assert!(!rc_ptr_equals(&a, &Rc::new(vec![1])));
/// ```
pub fn rc_ptr_equals<T: ?Sized>(a: &Rc<T>, b: &Rc<T>) -> bool {
    Rc::ptr_eq(a, b)
}

/// Same length and the same allocation at every position.
///
/// The equality for `all()`-style selectors: a rebuilt list holding the same
/// entities counts as unchanged.
pub fn ptr_equals_slice<T>(a: &Vec<Rc<T>>, b: &Vec<Rc<T>>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| Rc::ptr_eq(x, y))
}

// =============================================================================
// SHALLOW EQUALITY
// =============================================================================

/// Element-wise PartialEq, one level deep.
pub fn shallow_equals_slice<T: PartialEq>(a: &Vec<T>, b: &Vec<T>) -> bool {
    a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x == y)
}

// =============================================================================
// TESTS
// =============================================================================
