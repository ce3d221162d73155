/// Outcome of a derived metric for one poll cycle.
///
/// Callers decide how to display each empty variant; none of them is a fault.
#[derive(Debug, Clone, PartialEq)]
pub enum Reading<T> {
    Value(T),
    /// Not enough data to compute the metric (few samples, zero denominator, unknown instrument).
    Insufficient,
    /// The remote source failed this cycle; the next poll retries.
    Unavailable,
}

impl<T> Reading<T> {
    pub fn value(&self) -> Option<&T> {
        match self {
            Self::Value(v) => Some(v),
            _ => None,
        }
    }
}
