//! Decider port - discovery query が動画を返すかどうかの判定
//!
//! 乱数による分岐をそのまま埋め込まず、差し替え可能な戦略にする。
//! テストでは FixedDecider で分岐を固定する。

use rand::Rng;

/// Decider は query から「動画を返すか」を決める
///
/// # 設計原則
/// - 副作用なし（artifact の追加などは DiscoveryTrigger が行う）
pub trait Decider: Send + Sync {
    fn returns_video(&self, query: &str) -> bool;
}

/// 一定確率で動画を返す
#[derive(Debug, Clone, Copy)]
pub struct ProbabilisticDecider {
    probability: f64,
}

impl ProbabilisticDecider {
    /// `probability` is clamped to `[0, 1]`; NaN counts as 0.
    pub fn new(probability: f64) -> Self {
        let probability = if probability.is_nan() {
            0.0
        } else {
            probability.clamp(0.0, 1.0)
        };
        Self { probability }
    }

    pub fn probability(&self) -> f64 {
        self.probability
    }
}

impl Default for ProbabilisticDecider {
    fn default() -> Self {
        Self::new(0.6)
    }
}

impl Decider for ProbabilisticDecider {
    fn returns_video(&self, _query: &str) -> bool {
        rand::thread_rng().gen_bool(self.probability)
    }
}

/// 常に同じ答えを返す
#[derive(Debug, Clone, Copy)]
pub struct FixedDecider(pub bool);

impl Decider for FixedDecider {
    fn returns_video(&self, _query: &str) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn probability_is_clamped() {
        assert_eq!(ProbabilisticDecider::new(1.7).probability(), 1.0);
        assert_eq!(ProbabilisticDecider::new(-0.2).probability(), 0.0);
        assert_eq!(ProbabilisticDecider::new(f64::NAN).probability(), 0.0);
    }

    #[test]
    fn extreme_probabilities_are_deterministic() {
        let always = ProbabilisticDecider::new(1.0);
        let never = ProbabilisticDecider::new(0.0);
        for _ in 0..32 {
            assert!(always.returns_video("q"));
            assert!(!never.returns_video("q"));
        }
    }

    #[test]
    fn fixed_decider_forces_branch() {
        assert!(FixedDecider(true).returns_video("anything"));
        assert!(!FixedDecider(false).returns_video("anything"));
    }
}
