//! Effect system - kinds, bands, parameter tables and the FX chain
//!
//! An effect is selected as a `(kind, band)` pair. The pair is only
//! sonically active when both halves are present; an armed-but-unconfigured
//! selection (kind without band) stays in bypass and is never silently
//! upgraded to a default band.

pub mod chain;
pub mod params;
pub mod topology;

pub use chain::FxChain;
pub use params::BandParams;
pub use topology::Topology;

/// Effect kinds available on the effect strip
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectKind {
    Filter,
    Flanger,
    Phaser,
    Reverb,
    PingPong,
    Echo,
    Roll,
    Helix,
    Bubble,
    Delay,
}

impl EffectKind {
    /// All kinds in display order
    pub const ALL: [EffectKind; 10] = [
        EffectKind::Filter,
        EffectKind::Flanger,
        EffectKind::Phaser,
        EffectKind::Reverb,
        EffectKind::PingPong,
        EffectKind::Echo,
        EffectKind::Roll,
        EffectKind::Helix,
        EffectKind::Bubble,
        EffectKind::Delay,
    ];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            EffectKind::Filter => "Filter",
            EffectKind::Flanger => "Flanger",
            EffectKind::Phaser => "Phaser",
            EffectKind::Reverb => "Reverb",
            EffectKind::PingPong => "Ping Pong",
            EffectKind::Echo => "Echo",
            EffectKind::Roll => "Roll",
            EffectKind::Helix => "Helix",
            EffectKind::Bubble => "Bubble",
            EffectKind::Delay => "Delay",
        }
    }

    /// Whether this kind derives its primary delay time from the tempo model
    pub fn is_tempo_synced(&self) -> bool {
        matches!(
            self,
            EffectKind::Echo | EffectKind::Roll | EffectKind::Bubble | EffectKind::Delay
        )
    }
}

/// Frequency-band configuration for the active effect
///
/// Low is the subtle, low-frequency-centric variant; Hi the aggressive,
/// high-frequency one. Band selection picks a column of the per-kind
/// parameter table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    Low,
    Mid,
    Hi,
}

impl Band {
    /// All bands in display order
    pub const ALL: [Band; 3] = [Band::Low, Band::Mid, Band::Hi];

    /// Display name
    pub fn name(&self) -> &'static str {
        match self {
            Band::Low => "Low",
            Band::Mid => "Mid",
            Band::Hi => "Hi",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tempo_synced_kinds() {
        let synced: Vec<EffectKind> = EffectKind::ALL
            .into_iter()
            .filter(|k| k.is_tempo_synced())
            .collect();
        assert_eq!(
            synced,
            vec![
                EffectKind::Echo,
                EffectKind::Roll,
                EffectKind::Bubble,
                EffectKind::Delay
            ]
        );
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = EffectKind::ALL.iter().map(|k| k.name()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), EffectKind::ALL.len());
    }
}
