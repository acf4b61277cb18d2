//! Base decision from the classifier's probability vector

use moodify_common::EmotionLabel;

/// Shannon entropy (natural log) of a probability vector
///
/// The vector is normalised to sum 1 first. Zero entries contribute nothing.
/// A vector whose sum is not positive and finite has entropy 0.
pub fn shannon_entropy(probabilities: &[f64]) -> f64 {
    let total: f64 = probabilities.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return 0.0;
    }

    probabilities
        .iter()
        .map(|p| p / total)
        .filter(|p| *p > 0.0)
        .map(|p| -p * p.ln())
        .sum()
}

/// Index of the largest probability; the first one wins on ties
pub fn argmax(probabilities: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &p) in probabilities.iter().enumerate() {
        match best {
            Some((_, best_p)) if p <= best_p => {}
            _ => best = Some((index, p)),
        }
    }
    best.map(|(index, _)| index)
}

/// Uncertain vectors decide `neutral`, otherwise the arg-max label
///
/// `labels` and `probabilities` must have the same non-zero length.
pub fn base_decision(
    labels: &[EmotionLabel],
    probabilities: &[f64],
    entropy_threshold: f64,
) -> (EmotionLabel, f64) {
    let entropy = shannon_entropy(probabilities);
    if entropy > entropy_threshold {
        return (EmotionLabel::Neutral, entropy);
    }

    let label = argmax(probabilities)
        .and_then(|index| labels.get(index))
        .cloned()
        .unwrap_or_default();
    (label, entropy)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels() -> Vec<EmotionLabel> {
        ["neutral", "calm", "happy", "sad", "angry", "fearful", "disgust", "surprise"]
            .into_iter()
            .map(EmotionLabel::from)
            .collect()
    }

    #[test]
    fn test_uniform_entropy_is_ln_n() {
        let probs = vec![0.125; 8];
        let entropy = shannon_entropy(&probs);
        assert!((entropy - 8f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_one_hot_entropy_is_zero() {
        let mut probs = vec![0.0; 8];
        probs[3] = 1.0;
        assert_eq!(shannon_entropy(&probs), 0.0);
    }

    #[test]
    fn test_entropy_normalises_unscaled_vector() {
        let scaled = shannon_entropy(&[2.0, 2.0]);
        assert!((scaled - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_degenerate_vector_has_zero_entropy() {
        assert_eq!(shannon_entropy(&[0.0, 0.0]), 0.0);
        assert_eq!(shannon_entropy(&[]), 0.0);
    }

    #[test]
    fn test_argmax_first_wins_on_tie() {
        assert_eq!(argmax(&[0.1, 0.4, 0.4, 0.1]), Some(1));
        assert_eq!(argmax(&[]), None);
    }

    #[test]
    fn test_high_entropy_decides_neutral() {
        // ln(8) ~ 2.08 > 1.5
        let (label, entropy) = base_decision(&labels(), &[0.125; 8], 1.5);
        assert_eq!(label, EmotionLabel::Neutral);
        assert!(entropy > 1.5);
    }

    #[test]
    fn test_confident_vector_decides_argmax() {
        let probs = [0.02, 0.02, 0.02, 0.85, 0.03, 0.02, 0.02, 0.02];
        let (label, entropy) = base_decision(&labels(), &probs, 1.5);
        assert_eq!(label, EmotionLabel::Sad);
        assert!(entropy < 1.5);
    }
}
