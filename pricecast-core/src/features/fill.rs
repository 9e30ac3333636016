//! Carry-forward of the last known value across an ordered sequence.

/// Replace every `None` with the closest earlier `Some`, in place.
///
/// Leading `None`s have nothing to carry and stay `None`.
pub fn forward_fill<T: Copy>(values: &mut [Option<T>]) {
    let mut last = None;
    for slot in values.iter_mut() {
        match slot {
            Some(v) => last = Some(*v),
            None => *slot = last,
        }
    }
}

/// Owned variant of [`forward_fill`].
pub fn forward_filled<T: Copy>(values: &[Option<T>]) -> Vec<Option<T>> {
    let mut out = values.to_vec();
    forward_fill(&mut out);
    out
}

/// Treat NaN as a missing value.
pub fn nan_as_none(v: Option<f64>) -> Option<f64> {
    v.filter(|x| !x.is_nan())
}
