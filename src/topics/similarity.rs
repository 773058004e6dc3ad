use crate::topics::signals::SignalSet;

/// Jaccard coefficient |A ∩ B| / |A ∪ B| in [0.0, 1.0].
/// Defined as 0.0 when either set is empty (including both).
pub fn jaccard(a: &SignalSet, b: &SignalSet) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let inter = a.intersection(b).count();
    let union = a.len() + b.len() - inter;
    inter as f64 / union as f64
}
