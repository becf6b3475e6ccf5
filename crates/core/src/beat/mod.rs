use crate::BeatConfig;

/// Beat envelope state. The whole detector is the pure [`BeatState::step`]
/// transition so the onset/decay law can be exercised without a live audio
/// source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BeatState {
    /// Decaying beat intensity in [0,1].
    pub value: f32,
    /// Adaptive onset threshold. Rises on onsets, relaxes toward the floor.
    pub cutoff: f32,
    /// Seconds left in the post-onset hold window.
    pub hold: f32,
}

impl BeatState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advances the envelope by `dt` seconds given this tick's low-band
    /// level.
    ///
    /// The value always decays first. An onset (lows above both the adaptive
    /// cutoff and the fixed floor) spikes the value, lifts the cutoff above
    /// the triggering level and opens the hold window. While the window is
    /// open the cutoff is frozen so one sustained bass hit does not read as
    /// a run of onsets; afterwards the cutoff relaxes linearly toward the
    /// floor so quieter beats stay detectable.
    #[must_use]
    pub fn step(self, lows: f32, dt: f32, config: &BeatConfig) -> Self {
        let dt = dt.max(0.0);
        let mut next = self;
        next.value = (next.value - dt * config.falloff).max(0.0);

        if lows > next.cutoff && lows > config.min_level {
            next.value = (lows * config.overshoot).clamp(0.0, 1.0);
            next.cutoff = lows * config.cutoff_margin;
            next.hold = config.hold_time;
        } else if next.hold > 0.0 {
            next.hold -= dt;
        } else {
            next.cutoff = (next.cutoff - dt * config.decay).max(config.min_level);
        }

        next
    }
}
