//! Softmax and related functions on logit slices
//!
//! All functions use the max-subtraction trick: the largest logit is shifted to
//! zero before exponentiation, so the largest term is exactly 1 and no term can
//! overflow.

/// Largest value in `values`, or negative infinity for an empty slice.
pub fn max_value(values: &[f64]) -> f64 {
    values.iter().copied().fold(f64::NEG_INFINITY, f64::max)
}

/// Probabilities and log-probabilities of one logit vector.
///
/// Both vectors are computed from the same shifted exponentials, so
/// `log_probabilities[i]` is finite for any finite logits even when
/// `probabilities[i]` underflows to zero.
///
/// # Arguments
/// * `logits` - Unnormalized class scores
///
/// # Returns
/// `(probabilities, log_probabilities)`, both of length `logits.len()`
pub fn softmax_with_log(logits: &[f64]) -> (Vec<f64>, Vec<f64>) {
    if logits.is_empty() {
        return (Vec::new(), Vec::new());
    }

    let max = max_value(logits);

    let mut probabilities = Vec::with_capacity(logits.len());
    let mut sum = 0.0f64;
    for &logit in logits {
        let e = (logit - max).exp();
        sum += e;
        probabilities.push(e);
    }

    // sum >= 1.0 because the argmax term contributes exp(0)
    let log_sum = sum.ln();
    let log_probabilities = logits.iter().map(|&logit| (logit - max) - log_sum).collect();

    for p in probabilities.iter_mut() {
        *p /= sum;
    }

    (probabilities, log_probabilities)
}

/// Softmax of `logits`.
pub fn softmax(logits: &[f64]) -> Vec<f64> {
    softmax_with_log(logits).0
}

/// Natural log of the softmax of `logits`.
pub fn log_softmax(logits: &[f64]) -> Vec<f64> {
    softmax_with_log(logits).1
}

/// Index of the largest value. Ties resolve to the lowest index.
pub fn argmax(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, &value) in values.iter().enumerate() {
        match best {
            Some((_, current)) if value <= current => {}
            _ => best = Some((i, value)),
        }
    }
    best.map(|(i, _)| i)
}
