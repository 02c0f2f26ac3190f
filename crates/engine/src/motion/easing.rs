use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

/// Easing curves as pure functions of `(elapsed, begin, delta, total)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Easing {
    #[default]
    Linear,
    #[serde(alias = "ease_in_quad")]
    EaseInQuad,
    #[serde(alias = "ease_out_quad")]
    EaseOutQuad,
    #[serde(alias = "ease_in_out_quad")]
    EaseInOutQuad,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown easing '{0}'")]
pub struct EasingParseError(pub String);

impl Easing {
    pub const ALL: [Easing; 4] = [
        Easing::Linear,
        Easing::EaseInQuad,
        Easing::EaseOutQuad,
        Easing::EaseInOutQuad,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::EaseInQuad => "easeInQuad",
            Self::EaseOutQuad => "easeOutQuad",
            Self::EaseInOutQuad => "easeInOutQuad",
        }
    }

    /// Value at frame `t` of `d` for a property going from `b` to `b + c`.
    pub fn apply(self, t: f32, b: f32, c: f32, d: f32) -> f32 {
        if d <= 0.0 {
            return b + c;
        }
        match self {
            Self::Linear => c * t / d + b,
            Self::EaseInQuad => {
                let t = t / d;
                c * t * t + b
            }
            Self::EaseOutQuad => {
                let t = t / d;
                -c * t * (t - 2.0) + b
            }
            Self::EaseInOutQuad => {
                let t = t / (d / 2.0);
                if t < 1.0 {
                    c / 2.0 * t * t + b
                } else {
                    let t = t - 1.0;
                    -c / 2.0 * (t * (t - 2.0) - 1.0) + b
                }
            }
        }
    }
}

impl FromStr for Easing {
    type Err = EasingParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim() {
            "linear" => Ok(Self::Linear),
            "easeInQuad" | "ease_in_quad" => Ok(Self::EaseInQuad),
            "easeOutQuad" | "ease_out_quad" => Ok(Self::EaseOutQuad),
            "easeInOutQuad" | "ease_in_out_quad" => Ok(Self::EaseInOutQuad),
            other => Err(EasingParseError(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_curve_starts_at_begin_and_ends_at_target() {
        for easing in Easing::ALL {
            assert_eq!(easing.apply(0.0, 10.0, 90.0, 30.0), 10.0, "{}", easing.name());
            let end = easing.apply(30.0, 10.0, 90.0, 30.0);
            assert!((end - 100.0).abs() < 0.0001, "{} ended at {end}", easing.name());
        }
    }

    #[test]
    fn curves_have_expected_midpoints() {
        assert_eq!(Easing::Linear.apply(15.0, 0.0, 100.0, 30.0), 50.0);
        assert_eq!(Easing::EaseInQuad.apply(15.0, 0.0, 100.0, 30.0), 25.0);
        assert_eq!(Easing::EaseOutQuad.apply(15.0, 0.0, 100.0, 30.0), 75.0);
        assert_eq!(Easing::EaseInOutQuad.apply(15.0, 0.0, 100.0, 30.0), 50.0);
        assert!(Easing::EaseInOutQuad.apply(5.0, 0.0, 100.0, 30.0) < 50.0 / 3.0);
    }

    #[test]
    fn zero_duration_jumps_to_target() {
        assert_eq!(Easing::EaseOutQuad.apply(0.0, 4.0, 6.0, 0.0), 10.0);
    }

    #[test]
    fn parses_camel_and_snake_names() {
        for easing in Easing::ALL {
            assert_eq!(easing.name().parse::<Easing>(), Ok(easing));
        }
        assert_eq!("ease_in_out_quad".parse::<Easing>(), Ok(Easing::EaseInOutQuad));
        assert_eq!(
            "bounce".parse::<Easing>(),
            Err(EasingParseError("bounce".to_string()))
        );
        assert_eq!(Easing::default(), Easing::Linear);
    }
}
