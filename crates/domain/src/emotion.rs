//! Emotion readings and the per-session rolling accumulator.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Readings kept in the sliding window.
const WINDOW_CAPACITY: usize = 8;

/// Readings needed before the accumulator considers itself warmed up.
const MIN_READINGS: usize = 3;

/// Intensity delta from the baseline that counts as a spike.
const SPIKE_DELTA: i16 = 4;

/// First-third vs last-third average delta that counts as a trend.
const TREND_THRESHOLD: f32 = 1.5;

/// Primary emotion category produced by the classifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Emotion {
    Engaged,
    Bored,
    Confused,
    Amused,
    Tense,
    Surprised,
    Neutral,
}

impl Emotion {
    /// Wire/branch-table spelling of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Engaged => "engaged",
            Self::Bored => "bored",
            Self::Confused => "confused",
            Self::Amused => "amused",
            Self::Tense => "tense",
            Self::Surprised => "surprised",
            Self::Neutral => "neutral",
        }
    }
}

/// Where the viewer is looking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attention {
    Screen,
    Away,
    Uncertain,
}

/// Intensity direction over the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trend {
    Rising,
    Falling,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rising => "rising",
            Self::Falling => "falling",
            Self::Stable => "stable",
        }
    }
}

/// One classified webcam sample. Immutable value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionReading {
    pub primary_emotion: Emotion,
    /// 1-10.
    pub intensity: u8,
    pub attention: Attention,
    /// 0.0-1.0.
    pub confidence: f32,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl EmotionReading {
    pub fn new(primary_emotion: Emotion, intensity: u8, attention: Attention, confidence: f32) -> Self {
        Self {
            primary_emotion,
            intensity,
            attention,
            confidence,
            timestamp: Utc::now(),
        }
    }

    /// Safe default substituted when classification fails.
    pub fn neutral() -> Self {
        Self::new(Emotion::Neutral, 5, Attention::Uncertain, 0.0)
    }

    /// Range check for readings arriving from outside the classifier.
    pub fn is_valid(&self) -> bool {
        (1..=10).contains(&self.intensity) && (0.0..=1.0).contains(&self.confidence)
    }
}

/// Statistical summary of the current window. Recomputed on demand,
/// never stored independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmotionSummary {
    pub dominant_emotion: Emotion,
    pub trend: Trend,
    pub intensity_avg: f32,
    /// Fraction of the window with attention on the screen.
    pub attention_score: f32,
    /// Sample standard deviation of intensity.
    pub volatility: f32,
    pub reading_count: usize,
}

impl EmotionSummary {
    /// Summary reported before any reading has arrived, so callers never
    /// branch on emptiness.
    pub fn neutral() -> Self {
        Self {
            dominant_emotion: Emotion::Neutral,
            trend: Trend::Stable,
            intensity_avg: 5.0,
            attention_score: 0.0,
            volatility: 0.0,
            reading_count: 0,
        }
    }
}

/// Bounded rolling window of readings for one session.
///
/// The first reading ever becomes the session baseline and is kept even
/// after the window slides past it.
#[derive(Debug, Clone, Default)]
pub struct EmotionAccumulator {
    history: VecDeque<EmotionReading>,
    baseline: Option<EmotionReading>,
}

impl EmotionAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, reading: EmotionReading) {
        if self.baseline.is_none() {
            self.baseline = Some(reading.clone());
        }
        self.history.push_back(reading);
        if self.history.len() > WINDOW_CAPACITY {
            self.history.pop_front();
        }
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    pub fn baseline(&self) -> Option<&EmotionReading> {
        self.baseline.as_ref()
    }

    pub fn readings(&self) -> impl Iterator<Item = &EmotionReading> {
        self.history.iter()
    }

    /// Pure summary over the current window.
    pub fn summarize(&self) -> EmotionSummary {
        if self.history.is_empty() {
            return EmotionSummary::neutral();
        }

        let mut counts: HashMap<Emotion, usize> = HashMap::new();
        for reading in &self.history {
            *counts.entry(reading.primary_emotion).or_insert(0) += 1;
        }
        // First occurrence wins ties so the result is deterministic.
        let mut dominant = Emotion::Neutral;
        let mut dominant_count = 0;
        for reading in &self.history {
            let count = counts.get(&reading.primary_emotion).copied().unwrap_or(0);
            if count > dominant_count {
                dominant = reading.primary_emotion;
                dominant_count = count;
            }
        }

        let intensities: Vec<f32> = self.history.iter().map(|r| f32::from(r.intensity)).collect();
        let count = intensities.len();
        let intensity_avg = intensities.iter().sum::<f32>() / count as f32;

        let trend = if count >= 2 * MIN_READINGS {
            let first_avg = intensities[..MIN_READINGS].iter().sum::<f32>() / MIN_READINGS as f32;
            let last_avg =
                intensities[count - MIN_READINGS..].iter().sum::<f32>() / MIN_READINGS as f32;
            let delta = last_avg - first_avg;
            if delta > TREND_THRESHOLD {
                Trend::Rising
            } else if delta < -TREND_THRESHOLD {
                Trend::Falling
            } else {
                Trend::Stable
            }
        } else {
            Trend::Stable
        };

        let on_screen = self
            .history
            .iter()
            .filter(|r| r.attention == Attention::Screen)
            .count();
        let attention_score = on_screen as f32 / count as f32;

        let volatility = if count > 1 {
            let variance = intensities
                .iter()
                .map(|i| (i - intensity_avg).powi(2))
                .sum::<f32>()
                / (count - 1) as f32;
            variance.sqrt()
        } else {
            0.0
        };

        EmotionSummary {
            dominant_emotion: dominant,
            trend,
            intensity_avg,
            attention_score,
            volatility,
            reading_count: count,
        }
    }

    /// Whether enough signal has accumulated to act on.
    ///
    /// Conditions are checked in order and short-circuit: three identical
    /// recent emotions, an intensity spike away from the baseline, low
    /// attention, and finally the bare warm-up threshold. The last condition
    /// makes this true from the third reading onward.
    pub fn should_trigger(&self) -> bool {
        if self.history.len() < MIN_READINGS {
            return false;
        }

        let recent: Vec<&EmotionReading> =
            self.history.iter().rev().take(MIN_READINGS).collect();

        if recent
            .iter()
            .all(|r| r.primary_emotion == recent[0].primary_emotion)
        {
            return true;
        }

        if let Some(baseline) = &self.baseline {
            let base = i16::from(baseline.intensity);
            if recent
                .iter()
                .any(|r| (i16::from(r.intensity) - base).abs() > SPIKE_DELTA)
            {
                return true;
            }
        }

        if self.summarize().attention_score < 0.5 {
            return true;
        }

        // Minimum data threshold reached.
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reading(emotion: Emotion, intensity: u8, attention: Attention) -> EmotionReading {
        EmotionReading::new(emotion, intensity, attention, 0.9)
    }

    #[test]
    fn window_never_exceeds_capacity() {
        let mut acc = EmotionAccumulator::new();
        for i in 0..40 {
            acc.add(reading(Emotion::Engaged, 1 + (i % 10) as u8, Attention::Screen));
            assert!(acc.len() <= WINDOW_CAPACITY);
        }
        assert_eq!(acc.len(), WINDOW_CAPACITY);
    }

    #[test]
    fn baseline_survives_window_slide() {
        let mut acc = EmotionAccumulator::new();
        acc.add(reading(Emotion::Bored, 2, Attention::Away));
        for _ in 0..20 {
            acc.add(reading(Emotion::Engaged, 8, Attention::Screen));
        }
        let baseline = acc.baseline().expect("baseline set by first reading");
        assert_eq!(baseline.primary_emotion, Emotion::Bored);
        assert_eq!(baseline.intensity, 2);
    }

    #[test]
    fn empty_summary_is_neutral_default() {
        let acc = EmotionAccumulator::new();
        let summary = acc.summarize();
        assert_eq!(summary, EmotionSummary::neutral());
        assert_eq!(summary.intensity_avg, 5.0);
        assert_eq!(summary.reading_count, 0);
    }

    #[test]
    fn dominant_emotion_is_window_mode() {
        let mut acc = EmotionAccumulator::new();
        acc.add(reading(Emotion::Tense, 5, Attention::Screen));
        acc.add(reading(Emotion::Amused, 5, Attention::Screen));
        acc.add(reading(Emotion::Tense, 6, Attention::Screen));
        assert_eq!(acc.summarize().dominant_emotion, Emotion::Tense);
    }

    #[test]
    fn trend_requires_six_readings() {
        let mut acc = EmotionAccumulator::new();
        for intensity in [2, 2, 2, 8, 8] {
            acc.add(reading(Emotion::Engaged, intensity, Attention::Screen));
        }
        assert_eq!(acc.summarize().trend, Trend::Stable);

        acc.add(reading(Emotion::Engaged, 8, Attention::Screen));
        assert_eq!(acc.summarize().trend, Trend::Rising);
    }

    #[test]
    fn trend_falls_when_intensity_drops() {
        let mut acc = EmotionAccumulator::new();
        for intensity in [9, 9, 9, 3, 3, 3] {
            acc.add(reading(Emotion::Bored, intensity, Attention::Screen));
        }
        assert_eq!(acc.summarize().trend, Trend::Falling);
    }

    #[test]
    fn attention_score_counts_screen_fraction() {
        let mut acc = EmotionAccumulator::new();
        acc.add(reading(Emotion::Neutral, 5, Attention::Screen));
        acc.add(reading(Emotion::Neutral, 5, Attention::Away));
        acc.add(reading(Emotion::Neutral, 5, Attention::Screen));
        acc.add(reading(Emotion::Neutral, 5, Attention::Uncertain));
        assert_eq!(acc.summarize().attention_score, 0.5);
    }

    #[test]
    fn volatility_zero_for_single_sample() {
        let mut acc = EmotionAccumulator::new();
        acc.add(reading(Emotion::Neutral, 7, Attention::Screen));
        assert_eq!(acc.summarize().volatility, 0.0);
    }

    #[test]
    fn should_not_trigger_before_three_readings() {
        let mut acc = EmotionAccumulator::new();
        assert!(!acc.should_trigger());
        acc.add(reading(Emotion::Engaged, 5, Attention::Screen));
        assert!(!acc.should_trigger());
        acc.add(reading(Emotion::Engaged, 5, Attention::Screen));
        assert!(!acc.should_trigger());
    }

    #[test]
    fn triggers_on_three_identical_recent_emotions() {
        let mut acc = EmotionAccumulator::new();
        for _ in 0..3 {
            acc.add(reading(Emotion::Surprised, 5, Attention::Screen));
        }
        assert!(acc.should_trigger());
    }

    #[test]
    fn triggers_from_third_reading_onward() {
        // Mixed emotions, calm intensity, full attention: only the warm-up
        // fallback applies, and it fires.
        let mut acc = EmotionAccumulator::new();
        acc.add(reading(Emotion::Engaged, 5, Attention::Screen));
        acc.add(reading(Emotion::Bored, 5, Attention::Screen));
        acc.add(reading(Emotion::Amused, 5, Attention::Screen));
        assert!(acc.should_trigger());
    }

    #[test]
    fn neutral_fallback_reading_is_valid() {
        assert!(EmotionReading::neutral().is_valid());
    }

    #[test]
    fn out_of_range_readings_are_invalid() {
        let mut r = EmotionReading::neutral();
        r.intensity = 0;
        assert!(!r.is_valid());
        r.intensity = 11;
        assert!(!r.is_valid());
        r.intensity = 5;
        r.confidence = 1.5;
        assert!(!r.is_valid());
    }
}
