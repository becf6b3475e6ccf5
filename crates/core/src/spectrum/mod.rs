use serde::{Deserialize, Serialize};

/// Frequency boundaries (Hz) separating the five analysis bands.
const BASS_END_HZ: f32 = 120.0;
const LOW_END_HZ: f32 = 200.0;
const MID_END_HZ: f32 = 2000.0;
const HIGH_END_HZ: f32 = 6000.0;

/// One magnitude-spectrum snapshot handed to the band analyzer. Magnitudes
/// are byte values (0–255), one per frequency bin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpectrumFrame {
    pub magnitudes: Vec<u8>,
    pub sample_rate: u32,
    pub fft_size: usize,
}

impl SpectrumFrame {
    pub fn new(magnitudes: Vec<u8>, sample_rate: u32, fft_size: usize) -> Self {
        Self {
            magnitudes,
            sample_rate,
            fft_size,
        }
    }

    pub fn bin_count(&self) -> usize {
        self.magnitudes.len()
    }

    /// Width of one FFT bin in Hz.
    pub fn bin_hz(&self) -> f32 {
        if self.fft_size == 0 {
            0.0
        } else {
            self.sample_rate as f32 / self.fft_size as f32
        }
    }
}

/// Normalized [0,1] energies of the five frequency bands plus the overall
/// spectrum mean. Recomputed from scratch every tick; carries no history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct BandEnergies {
    pub energy: f32,
    pub bass: f32,
    pub lows: f32,
    pub mids: f32,
    pub highs: f32,
    pub treble: f32,
}

/// Exclusive upper bin indices of the bass/low/mid/high ranges. Treble is
/// everything from `high_end` up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BandEdges {
    pub bass_end: usize,
    pub low_end: usize,
    pub mid_end: usize,
    pub high_end: usize,
}

/// Converts the fixed Hz boundaries into bin indices. Each edge is forced at
/// least one bin past the previous one so no range is empty or inverted, and
/// every edge is clamped to the last available bin.
pub fn band_edges(bin_count: usize, sample_rate: u32, fft_size: usize) -> BandEdges {
    let bin_hz = if fft_size == 0 {
        0.0
    } else {
        sample_rate as f32 / fft_size as f32
    };

    let to_bin = |hz: f32| -> usize {
        if bin_hz > 0.0 {
            (hz / bin_hz).floor() as usize
        } else {
            0
        }
    };

    let cap = bin_count.saturating_sub(1);
    let bass_end = to_bin(BASS_END_HZ).max(2).min(cap);
    let low_end = to_bin(LOW_END_HZ).max(bass_end + 1).min(cap);
    let mid_end = to_bin(MID_END_HZ).max(low_end + 1).min(cap);
    let high_end = to_bin(HIGH_END_HZ).max(mid_end + 1).min(cap);

    BandEdges {
        bass_end,
        low_end,
        mid_end,
        high_end,
    }
}

/// Splits a spectrum into the five contiguous bands and averages each one,
/// normalized so a fully saturated range reads 1.0. Overall energy is the
/// mean of all bins. Returns zeros for an empty spectrum.
pub fn analyze(frame: &SpectrumFrame) -> BandEnergies {
    let bins = &frame.magnitudes;
    if bins.is_empty() {
        return BandEnergies::default();
    }

    let edges = band_edges(bins.len(), frame.sample_rate, frame.fft_size);

    let mut total = 0u32;
    let mut bass_total = 0u32;
    let mut low_total = 0u32;
    let mut mid_total = 0u32;
    let mut high_total = 0u32;
    let mut treble_total = 0u32;

    for (i, &value) in bins.iter().enumerate() {
        let value = value as u32;
        total += value;
        if i < edges.bass_end {
            bass_total += value;
        } else if i < edges.low_end {
            low_total += value;
        } else if i < edges.mid_end {
            mid_total += value;
        } else if i < edges.high_end {
            high_total += value;
        } else {
            treble_total += value;
        }
    }

    let normalize = |sum: u32, span: usize| -> f32 {
        sum as f32 / (span.max(1) as f32 * 255.0)
    };

    BandEnergies {
        energy: normalize(total, bins.len()),
        bass: normalize(bass_total, edges.bass_end),
        lows: normalize(low_total, edges.low_end - edges.bass_end),
        mids: normalize(mid_total, edges.mid_end - edges.low_end),
        highs: normalize(high_total, edges.high_end - edges.mid_end),
        treble: normalize(treble_total, bins.len().saturating_sub(edges.high_end)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(magnitudes: Vec<u8>) -> SpectrumFrame {
        SpectrumFrame::new(magnitudes, 44_100, 2048)
    }

    #[test]
    fn edges_are_strictly_increasing_and_in_range() {
        for &(bins, rate, fft) in &[
            (1025usize, 44_100u32, 2048usize),
            (513, 48_000, 1024),
            (1025, 8_000, 2048),
            (64, 96_000, 128),
        ] {
            let e = band_edges(bins, rate, fft);
            assert!(e.bass_end < e.low_end, "{bins}/{rate}");
            assert!(e.low_end < e.mid_end, "{bins}/{rate}");
            assert!(e.mid_end < e.high_end, "{bins}/{rate}");
            assert!(e.high_end <= bins - 1, "{bins}/{rate}");
        }
    }

    #[test]
    fn low_sample_rates_still_produce_valid_edges() {
        // At 8 kHz / 2048 bins the Hz boundaries collapse onto nearby bins;
        // the +1 forcing must keep them distinct.
        let e = band_edges(1025, 8_000, 2048);
        assert!(e.bass_end >= 2);
        assert!(e.low_end > e.bass_end);
    }

    #[test]
    fn saturated_spectrum_reads_full_scale() {
        let energies = analyze(&frame(vec![255; 1025]));
        assert!((energies.energy - 1.0).abs() < 1e-6);
        assert!((energies.bass - 1.0).abs() < 1e-6);
        assert!((energies.lows - 1.0).abs() < 1e-6);
        assert!((energies.mids - 1.0).abs() < 1e-6);
        assert!((energies.highs - 1.0).abs() < 1e-6);
        assert!((energies.treble - 1.0).abs() < 1e-6);
    }

    #[test]
    fn empty_spectrum_degrades_to_zeros() {
        let energies = analyze(&frame(Vec::new()));
        assert_eq!(energies, BandEnergies::default());
    }

    #[test]
    fn low_heavy_spectrum_separates_bands() {
        let edges = band_edges(1025, 44_100, 2048);
        let mut magnitudes = vec![10u8; 1025];
        for value in magnitudes.iter_mut().take(edges.low_end) {
            *value = 250;
        }
        let energies = analyze(&frame(magnitudes));
        assert!(energies.bass > 0.9);
        assert!(energies.lows > 0.9);
        assert!(energies.mids < 0.1);
        assert!(energies.treble < 0.1);
    }
}
