pub mod hover;
pub mod mapper;

use exchange::adapter::ErrorKind;
use exchange::{Price, Sample, Source, Timeframe};

use chrono::DateTime;

pub use hover::nearest_index;
pub use mapper::{CoordinateMapper, Viewport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
}

impl Trend {
    /// A zero delta counts as `Up`
    pub fn from_delta(delta: Price) -> Self {
        if delta.is_negative() {
            Trend::Down
        } else {
            Trend::Up
        }
    }
}

/// Ordered samples of one (source, timeframe) pair. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    source: Source,
    timeframe: Timeframe,
    samples: Box<[Sample]>,
    trend: Trend,
}

impl Series {
    /// `None` for an empty fetch, which the chart reports as no data
    pub fn new(source: Source, timeframe: Timeframe, mut samples: Vec<Sample>) -> Option<Self> {
        if !samples.is_sorted_by_key(|s| s.time) {
            samples.sort_by_key(|s| s.time);
        }

        let first = samples.first()?.price;
        let last = samples.last()?.price;

        Some(Self {
            source,
            timeframe,
            samples: samples.into_boxed_slice(),
            trend: Trend::from_delta(last - first),
        })
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn trend(&self) -> Trend {
        self.trend
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// (min, max) of the raw prices
    pub fn price_range(&self) -> Option<(Price, Price)> {
        let min = self.samples.iter().map(|s| s.price).min()?;
        let max = self.samples.iter().map(|s| s.price).max()?;
        Some((min, max))
    }
}

/// Sample under the pointer, only meaningful for the series it was computed against
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HoverPoint {
    pub index: usize,
    pub time: u64,
    pub price: Price,
    pub formatted_date: String,
}

/// `M/D/YYYY` in UTC
pub fn format_date(time_ms: u64) -> String {
    i64::try_from(time_ms)
        .ok()
        .and_then(DateTime::from_timestamp_millis)
        .map(|dt| dt.format("%-m/%-d/%Y").to_string())
        .unwrap_or_default()
}

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Empty,
    Ready(Series),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Idle,
    Loading,
    NoData,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Committed {
    Ready,
    NoData,
}

/// Everything a line chart knows about what it shows.
///
/// Any change to the series bumps `revision` and clears the hover, the
/// renderer draws from scratch every time.
#[derive(Debug, Clone)]
pub struct ChartState {
    source: Source,
    timeframe: Timeframe,
    phase: Phase,
    status: Status,
    revision: u64,
    hover: Option<HoverPoint>,
    blink_on: bool,
}

impl ChartState {
    pub fn new(source: Source, timeframe: Timeframe) -> Self {
        Self {
            source,
            timeframe,
            phase: Phase::Empty,
            status: Status::Idle,
            revision: 0,
            hover: None,
            blink_on: true,
        }
    }

    pub fn source(&self) -> &Source {
        &self.source
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn is_current(&self, source: &Source, timeframe: Timeframe) -> bool {
        self.source == *source && self.timeframe == timeframe
    }

    /// Returns whether anything changed. A new context drops the series
    /// and the hover, nothing of the old one may be shown under it.
    pub fn set_context(&mut self, source: Source, timeframe: Timeframe) -> bool {
        if self.is_current(&source, timeframe) {
            return false;
        }
        self.source = source;
        self.timeframe = timeframe;

        self.phase = Phase::Empty;
        self.status = Status::Idle;
        self.hover = None;
        self.revision = self.revision.wrapping_add(1);
        true
    }

    pub fn begin_load(&mut self) {
        self.status = Status::Loading;
    }

    pub fn commit(&mut self, samples: Vec<Sample>) -> Committed {
        self.hover = None;
        self.revision = self.revision.wrapping_add(1);
        self.blink_on = true;

        match Series::new(self.source.clone(), self.timeframe, samples) {
            Some(series) => {
                self.phase = Phase::Ready(series);
                self.status = Status::Idle;
                Committed::Ready
            }
            None => {
                self.phase = Phase::Empty;
                self.status = Status::NoData;
                Committed::NoData
            }
        }
    }

    /// A missing symbol empties the chart, anything else keeps what was there
    pub fn fail(&mut self, kind: ErrorKind) -> Status {
        match kind {
            ErrorKind::NotFound => {
                self.hover = None;
                self.revision = self.revision.wrapping_add(1);
                self.phase = Phase::Empty;
                self.status = Status::NoData;
            }
            ErrorKind::Transient | ErrorKind::Rejected => {
                self.status = Status::Failed;
            }
        }
        self.status
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn series(&self) -> Option<&Series> {
        match &self.phase {
            Phase::Ready(series) => Some(series),
            Phase::Empty => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.phase, Phase::Ready(_))
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn hover(&self) -> Option<&HoverPoint> {
        self.hover.as_ref()
    }

    /// Pointer moved to `x` within a surface `width` wide
    pub fn hover_at(&mut self, x: f32, width: f32) -> Option<HoverPoint> {
        let series = self
            .series()
            .filter(|series| self.is_current(series.source(), series.timeframe()))?;
        let point = hover::hover_point(series, x, width)?;
        self.hover = Some(point.clone());
        Some(point)
    }

    /// Returns whether a hover was present
    pub fn clear_hover(&mut self) -> bool {
        self.hover.take().is_some()
    }

    pub fn toggle_blink(&mut self) {
        self.blink_on = !self.blink_on;
    }

    pub fn blink_visible(&self) -> bool {
        self.blink_on
    }
}
