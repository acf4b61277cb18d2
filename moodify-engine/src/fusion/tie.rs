// Tie Policy - Score comparison used to detect fusion ties
//
// Ties are detected with exact floating-point equality. Scores that are equal
// on paper but differ after rounding (e.g. 0.1 * 3.0 vs 0.3) do NOT tie and
// are decided by the strict comparison instead. This is observable behavior;
// a tolerance-based policy changes fusion output and must be opted into by
// supplying a different `TiePolicy`.

/// Decides whether two weighted scores count as a tie
pub trait TiePolicy: Send + Sync {
    fn is_tie(&self, face_score: f64, voice_score: f64) -> bool;
}

/// Bitwise `==` comparison (the shipped policy)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExactTie;

impl TiePolicy for ExactTie {
    #[allow(clippy::float_cmp)]
    fn is_tie(&self, face_score: f64, voice_score: f64) -> bool {
        face_score == voice_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_equality_ties() {
        assert!(ExactTie.is_tie(0.24, 0.24));
        // Multiplication is commutative in IEEE 754
        assert!(ExactTie.is_tie(0.4 * 0.6, 0.6 * 0.4));
    }

    #[test]
    fn test_round_off_does_not_tie() {
        let a = 0.1 * 3.0;
        let b = 0.3;
        assert_ne!(a, b);
        assert!(!ExactTie.is_tie(a, b));
    }

    #[test]
    fn test_nan_never_ties() {
        assert!(!ExactTie.is_tie(f64::NAN, f64::NAN));
    }
}
