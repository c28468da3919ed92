//! Change-detecting producer filter
//!
//! Wraps a producer so a [`crate::Poller`] only sees *changes*: the first
//! value observed is emitted, repeats of the last emitted value are
//! suppressed, and an absent underlying value always surfaces as "nothing
//! produced". Use this when the underlying source keeps answering with the
//! same data and only transitions matter (a config file's parsed contents, a
//! job status, a sensor reading).

use tracing::debug;

/// Wrap `producer` into a producer that yields only changed values.
///
/// The filter keeps a clone of the last emitted value for comparison, so the
/// value type must be `PartialEq + Clone`. An underlying `None` passes
/// through without clearing that memory: a value interrupted by gaps and
/// then repeated is still considered unchanged.
///
/// # Examples
///
/// ```rust
/// use breakwater_patterns::value_changed;
///
/// let mut answers = vec![Some(1), Some(1), Some(2)].into_iter();
/// let mut filtered = value_changed(move || answers.next().flatten());
///
/// assert_eq!(filtered(), Some(1)); // first value always surfaces
/// assert_eq!(filtered(), None); // unchanged, suppressed
/// assert_eq!(filtered(), Some(2)); // changed, surfaces again
/// ```
pub fn value_changed<T, P>(mut producer: P) -> impl FnMut() -> Option<T>
where
    T: PartialEq + Clone,
    P: FnMut() -> Option<T>,
{
    let mut previous: Option<T> = None;
    move || {
        let current = producer()?;
        if previous.as_ref() == Some(&current) {
            return None;
        }
        debug!("polled value changed, emitting");
        previous = Some(current.clone());
        Some(current)
    }
}
