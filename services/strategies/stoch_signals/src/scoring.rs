//! Confidence score for an accepted candidate

use signal_config::DecisionConfig;

use crate::indicators::StochRsi;

/// Indicator context the score is computed from
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreInputs {
    pub stoch: StochRsi,
    pub rsi: f64,
    pub ema_fast: Option<f64>,
    pub ema_slow: Option<f64>,
    pub near_line: bool,
    pub atr: Option<f64>,
}

/// Weighted blend of K/D agreement, RSI extremity, EMA alignment, trend-line
/// proximity and volatility adequacy, clamped to [0, 1].
pub fn confidence(inputs: &ScoreInputs, config: &DecisionConfig) -> f64 {
    let weights = &config.weights;

    let kd_agreement = 1.0 - ((inputs.stoch.k - inputs.stoch.d).abs() / 100.0).min(1.0);
    let rsi_extreme = ((inputs.rsi - 50.0).abs() / 50.0).min(1.0);
    let ema_alignment = match (inputs.ema_fast, inputs.ema_slow) {
        (Some(fast), Some(slow)) if fast != slow => 1.0,
        _ => 0.5,
    };
    let proximity = if inputs.near_line { 1.0 } else { 0.0 };
    let volatility = match inputs.atr {
        Some(atr) if config.atr_score_span > 0.0 => {
            ((atr - config.atr_score_floor) / config.atr_score_span).clamp(0.0, 1.0)
        }
        Some(_) => 0.0,
        None => 0.5,
    };

    let score = kd_agreement * weights.kd_agreement
        + rsi_extreme * weights.rsi_extreme
        + ema_alignment * weights.ema_alignment
        + proximity * weights.proximity
        + volatility * weights.volatility;

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs() -> ScoreInputs {
        ScoreInputs {
            stoch: StochRsi { k: 0.0, d: 0.0 },
            rsi: 0.0,
            ema_fast: Some(1.0),
            ema_slow: None,
            near_line: true,
            atr: Some(0.0005),
        }
    }

    #[test]
    fn test_extreme_oversold_near_support() {
        let score = confidence(&inputs(), &DecisionConfig::default());
        // 0.30 + 0.20 + 0.5 * 0.10 + 0.20 + 0.8 * 0.20
        assert!((score - 0.91).abs() < 1e-9);
    }

    #[test]
    fn test_neutral_context_scores_low() {
        let neutral = ScoreInputs {
            stoch: StochRsi { k: 100.0, d: 0.0 },
            rsi: 50.0,
            ema_fast: Some(1.0),
            ema_slow: Some(1.0),
            near_line: false,
            atr: Some(0.00005),
        };
        let score = confidence(&neutral, &DecisionConfig::default());
        assert!((score - 0.05).abs() < 1e-9);
    }

    #[test]
    fn test_missing_atr_scores_half() {
        let mut missing = inputs();
        missing.atr = None;
        let score = confidence(&missing, &DecisionConfig::default());
        assert!((score - 0.85).abs() < 1e-9);
    }
}
