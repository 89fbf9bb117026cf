//! Threshold-based color bucketing for links.

use crate::api::SankeyLink;
use crate::filters::heat;
use crate::theme;
use egui::Color32;
use thiserror::Error;

/// Largest integer an f64 holds exactly; used as the open top bucket bound.
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

/// p50 latency thresholds in milliseconds.
pub const LATENCY_INTERVALS: [f64; 5] = [400.0, 600.0, 800.0, 1200.0, MAX_SAFE_INTEGER];

/// Percent-miserable thresholds.
pub const MISERY_INTERVALS: [f64; 5] = [0.1, 0.5, 1.0, 2.0, MAX_SAFE_INTEGER];

pub const LATENCY_METRIC: &str = "p50";
pub const MISERY_METRIC: &str = "percent_miserable";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ColorScaleError {
    #[error("color palette is empty")]
    EmptyPalette,

    #[error("{intervals} intervals for {palette} palette colors")]
    LengthMismatch { intervals: usize, palette: usize },

    #[error("interval {index} is not greater than the one before it")]
    NotIncreasing { index: usize },
}

/// Anything that exposes named numeric metrics.
pub trait MetricSource {
    fn metric(&self, key: &str) -> Option<f64>;
}

impl MetricSource for SankeyLink {
    fn metric(&self, key: &str) -> Option<f64> {
        SankeyLink::metric(self, key)
    }
}

/// Maps a record's metric onto a palette via ordered upper bounds.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorScale {
    intervals: Vec<f64>,
    palette: Vec<Color32>,
    metric: String,
}

impl ColorScale {
    pub fn new(
        intervals: Vec<f64>,
        palette: Vec<Color32>,
        metric: impl Into<String>,
    ) -> Result<Self, ColorScaleError> {
        if palette.is_empty() {
            return Err(ColorScaleError::EmptyPalette);
        }
        if intervals.len() != palette.len() {
            return Err(ColorScaleError::LengthMismatch {
                intervals: intervals.len(),
                palette: palette.len(),
            });
        }
        if let Some(index) = (1..intervals.len()).find(|&i| !(intervals[i] > intervals[i - 1])) {
            return Err(ColorScaleError::NotIncreasing { index });
        }

        Ok(Self {
            intervals,
            palette,
            metric: metric.into(),
        })
    }

    /// Latency scale over the chart palette.
    pub fn latency() -> Result<Self, ColorScaleError> {
        Self::new(
            LATENCY_INTERVALS.to_vec(),
            theme::chart_palette().to_vec(),
            LATENCY_METRIC,
        )
    }

    /// Misery scale over the chart palette.
    pub fn misery() -> Result<Self, ColorScaleError> {
        Self::new(
            MISERY_INTERVALS.to_vec(),
            theme::chart_palette().to_vec(),
            MISERY_METRIC,
        )
    }

    /// Every record gets `color`. A single open bucket is always valid.
    pub fn uniform(color: Color32, metric: impl Into<String>) -> Self {
        Self {
            intervals: vec![MAX_SAFE_INTEGER],
            palette: vec![color],
            metric: metric.into(),
        }
    }

    /// Index of the first bucket whose bound exceeds `value`.
    pub fn bucket(&self, value: f64) -> usize {
        self.intervals
            .iter()
            .position(|&bound| value < bound)
            .unwrap_or(self.palette.len() - 1)
    }

    pub fn color_for_value(&self, value: f64) -> Color32 {
        self.palette[self.bucket(value)]
    }

    /// Color for a record. A missing metric lands in the outermost bucket.
    pub fn color_for<R: MetricSource + ?Sized>(&self, record: &R) -> Color32 {
        match record.metric(&self.metric) {
            Some(value) => self.color_for_value(value),
            None => self.palette[self.palette.len() - 1],
        }
    }
}

/// The latency and misery scales, validated once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatScales {
    latency: ColorScale,
    misery: ColorScale,
}

impl HeatScales {
    pub fn new() -> Result<Self, ColorScaleError> {
        Ok(Self {
            latency: ColorScale::latency()?,
            misery: ColorScale::misery()?,
        })
    }

    /// Build the scales, or color everything `fallback` if they are invalid.
    pub fn load_or(fallback: Color32) -> Self {
        Self::new().unwrap_or_else(|e| {
            tracing::error!("Invalid heat color scale: {}, links drawn uncolored", e);
            Self {
                latency: ColorScale::uniform(fallback, LATENCY_METRIC),
                misery: ColorScale::uniform(fallback, MISERY_METRIC),
            }
        })
    }

    /// Scale for the selected heat metric.
    pub fn for_heat(&self, heat_value: &str) -> &ColorScale {
        if heat_value == heat::MISERY {
            &self.misery
        } else {
            &self.latency
        }
    }
}
