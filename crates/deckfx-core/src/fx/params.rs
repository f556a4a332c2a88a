//! Per-band parameter tables
//!
//! One table per effect kind, mapping Low/Mid/Hi to concrete node
//! parameters. The values encode sound-design intent tuned by ear; the
//! structural constraints are what matter for correctness: Low stays
//! subtle and lower-frequency, Hi is more aggressive and brighter, and the
//! dry level never increases from Low to Hi for time-based effects.
//!
//! Tempo-synced kinds (Echo, Roll, Bubble, Delay) have their `delay_secs`
//! replaced with the current beat duration by the chain before building;
//! the table value is only a fallback shape.

use crate::graph::FilterShape;

use super::{Band, EffectKind};

/// Concrete node parameters for one (kind, band) cell
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BandParams {
    /// Primary delay time in seconds (overridden by the beat duration for
    /// tempo-synced kinds)
    pub delay_secs: f64,
    /// Feedback gain (0.0..1.0)
    pub feedback: f64,
    /// Filter response type, where the topology carries a filter
    pub filter_shape: FilterShape,
    /// Filter center/cutoff frequency in Hz
    pub filter_hz: f64,
    /// Filter Q
    pub filter_q: f64,
    /// LFO rate in Hz, where the topology carries an oscillator
    pub lfo_hz: f64,
    /// LFO modulation depth (seconds for delay targets, Hz for frequency
    /// targets, unitless for gain targets)
    pub lfo_depth: f64,
    /// Wet path level
    pub wet: f64,
    /// Dry path level
    pub dry: f64,
}

impl BandParams {
    fn base() -> Self {
        Self {
            delay_secs: 0.0,
            feedback: 0.0,
            filter_shape: FilterShape::Lowpass,
            filter_hz: 0.0,
            filter_q: 0.707,
            lfo_hz: 0.0,
            lfo_depth: 0.0,
            wet: 0.5,
            dry: 0.5,
        }
    }
}

/// Look up the parameter cell for a (kind, band) pair
pub fn band_params(kind: EffectKind, band: Band) -> BandParams {
    let b = BandParams::base();
    match kind {
        EffectKind::Filter => match band {
            Band::Low => BandParams {
                filter_shape: FilterShape::Lowpass,
                filter_hz: 300.0,
                filter_q: 0.9,
                wet: 1.0,
                dry: 0.0,
                ..b
            },
            Band::Mid => BandParams {
                filter_shape: FilterShape::Bandpass,
                filter_hz: 1200.0,
                filter_q: 1.2,
                wet: 1.0,
                dry: 0.0,
                ..b
            },
            Band::Hi => BandParams {
                filter_shape: FilterShape::Highpass,
                filter_hz: 3800.0,
                filter_q: 1.6,
                wet: 1.0,
                dry: 0.0,
                ..b
            },
        },
        EffectKind::Flanger => match band {
            Band::Low => BandParams {
                delay_secs: 0.004,
                feedback: 0.3,
                lfo_hz: 0.15,
                lfo_depth: 0.0015,
                wet: 0.4,
                dry: 0.8,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.006,
                feedback: 0.45,
                lfo_hz: 0.3,
                lfo_depth: 0.0025,
                wet: 0.5,
                dry: 0.7,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.009,
                feedback: 0.6,
                lfo_hz: 0.5,
                lfo_depth: 0.004,
                wet: 0.6,
                dry: 0.6,
                ..b
            },
        },
        EffectKind::Phaser => match band {
            Band::Low => BandParams {
                filter_shape: FilterShape::Allpass,
                filter_hz: 350.0,
                filter_q: 0.6,
                feedback: 0.25,
                lfo_hz: 0.2,
                lfo_depth: 180.0,
                wet: 0.45,
                dry: 0.8,
                ..b
            },
            Band::Mid => BandParams {
                filter_shape: FilterShape::Allpass,
                filter_hz: 700.0,
                filter_q: 0.8,
                feedback: 0.4,
                lfo_hz: 0.45,
                lfo_depth: 350.0,
                wet: 0.55,
                dry: 0.7,
                ..b
            },
            Band::Hi => BandParams {
                filter_shape: FilterShape::Allpass,
                filter_hz: 1100.0,
                filter_q: 1.0,
                feedback: 0.55,
                lfo_hz: 0.8,
                lfo_depth: 600.0,
                wet: 0.65,
                dry: 0.6,
                ..b
            },
        },
        EffectKind::Reverb => match band {
            Band::Low => BandParams {
                delay_secs: 0.041,
                feedback: 0.35,
                wet: 0.3,
                dry: 0.9,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.047,
                feedback: 0.5,
                wet: 0.45,
                dry: 0.75,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.053,
                feedback: 0.65,
                wet: 0.6,
                dry: 0.6,
                ..b
            },
        },
        EffectKind::PingPong => match band {
            Band::Low => BandParams {
                delay_secs: 0.18,
                feedback: 0.3,
                wet: 0.35,
                dry: 0.85,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.25,
                feedback: 0.42,
                wet: 0.5,
                dry: 0.7,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.33,
                feedback: 0.55,
                wet: 0.6,
                dry: 0.55,
                ..b
            },
        },
        EffectKind::Echo => match band {
            Band::Low => BandParams {
                delay_secs: 0.25,
                feedback: 0.3,
                filter_shape: FilterShape::Lowpass,
                filter_hz: 2500.0,
                wet: 0.4,
                dry: 0.9,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.25,
                feedback: 0.45,
                filter_shape: FilterShape::Lowpass,
                filter_hz: 3500.0,
                wet: 0.5,
                dry: 0.7,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.25,
                feedback: 0.6,
                filter_shape: FilterShape::Lowpass,
                filter_hz: 5000.0,
                wet: 0.65,
                dry: 0.5,
                ..b
            },
        },
        EffectKind::Roll => match band {
            Band::Low => BandParams {
                delay_secs: 0.125,
                feedback: 0.55,
                wet: 0.5,
                dry: 0.7,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.125,
                feedback: 0.7,
                wet: 0.65,
                dry: 0.5,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.125,
                feedback: 0.85,
                wet: 0.8,
                dry: 0.3,
                ..b
            },
        },
        EffectKind::Helix => match band {
            Band::Low => BandParams {
                delay_secs: 0.3,
                feedback: 0.5,
                lfo_hz: 0.08,
                lfo_depth: 0.2,
                wet: 0.45,
                dry: 0.75,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.3,
                feedback: 0.62,
                lfo_hz: 0.12,
                lfo_depth: 0.3,
                wet: 0.55,
                dry: 0.6,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.3,
                feedback: 0.75,
                lfo_hz: 0.2,
                lfo_depth: 0.45,
                wet: 0.7,
                dry: 0.45,
                ..b
            },
        },
        EffectKind::Bubble => match band {
            Band::Low => BandParams {
                delay_secs: 0.125,
                feedback: 0.35,
                filter_shape: FilterShape::Bandpass,
                filter_hz: 400.0,
                filter_q: 2.0,
                lfo_hz: 0.8,
                lfo_depth: 150.0,
                wet: 0.5,
                dry: 0.8,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.125,
                feedback: 0.45,
                filter_shape: FilterShape::Bandpass,
                filter_hz: 900.0,
                filter_q: 3.0,
                lfo_hz: 1.6,
                lfo_depth: 400.0,
                wet: 0.6,
                dry: 0.65,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.125,
                feedback: 0.55,
                filter_shape: FilterShape::Bandpass,
                filter_hz: 1800.0,
                filter_q: 4.0,
                lfo_hz: 2.8,
                lfo_depth: 900.0,
                wet: 0.7,
                dry: 0.5,
                ..b
            },
        },
        EffectKind::Delay => match band {
            Band::Low => BandParams {
                delay_secs: 0.375,
                feedback: 0.3,
                wet: 0.35,
                dry: 0.9,
                ..b
            },
            Band::Mid => BandParams {
                delay_secs: 0.375,
                feedback: 0.42,
                wet: 0.45,
                dry: 0.75,
                ..b
            },
            Band::Hi => BandParams {
                delay_secs: 0.375,
                feedback: 0.55,
                wet: 0.55,
                dry: 0.6,
                ..b
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Kinds whose topology carries a delay line
    const TIME_BASED: [EffectKind; 8] = [
        EffectKind::Flanger,
        EffectKind::Reverb,
        EffectKind::PingPong,
        EffectKind::Echo,
        EffectKind::Roll,
        EffectKind::Helix,
        EffectKind::Bubble,
        EffectKind::Delay,
    ];

    #[test]
    fn test_dry_level_monotonic_for_time_based() {
        for kind in TIME_BASED {
            let low = band_params(kind, Band::Low).dry;
            let mid = band_params(kind, Band::Mid).dry;
            let hi = band_params(kind, Band::Hi).dry;
            assert!(
                low >= mid && mid >= hi,
                "{:?}: dry must not increase Low->Hi ({} {} {})",
                kind,
                low,
                mid,
                hi
            );
        }
    }

    #[test]
    fn test_hi_band_is_more_aggressive() {
        for kind in TIME_BASED {
            let low = band_params(kind, Band::Low);
            let hi = band_params(kind, Band::Hi);
            assert!(hi.feedback >= low.feedback, "{:?}: feedback", kind);
            assert!(hi.wet >= low.wet, "{:?}: wet", kind);
        }
    }

    #[test]
    fn test_filter_bands_sweep_upward() {
        let low = band_params(EffectKind::Filter, Band::Low);
        let mid = band_params(EffectKind::Filter, Band::Mid);
        let hi = band_params(EffectKind::Filter, Band::Hi);

        assert_eq!(low.filter_shape, FilterShape::Lowpass);
        assert_eq!(mid.filter_shape, FilterShape::Bandpass);
        assert_eq!(hi.filter_shape, FilterShape::Highpass);
        assert!(low.filter_hz < mid.filter_hz && mid.filter_hz < hi.filter_hz);
    }

    #[test]
    fn test_feedback_stays_stable() {
        for kind in EffectKind::ALL {
            for band in Band::ALL {
                let p = band_params(kind, band);
                assert!(
                    (0.0..1.0).contains(&p.feedback),
                    "{:?}/{:?}: feedback {} would run away",
                    kind,
                    band,
                    p.feedback
                );
            }
        }
    }
}
