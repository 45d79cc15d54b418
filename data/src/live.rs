//! Keeps a single value display consistent with the live feed and the chart hover.

use crate::chart::Trend;

use chrono::{DateTime, Utc};
use exchange::{Price, Source};

/// Consecutive failed polls before the display is flagged as delayed
pub const DEGRADED_AFTER: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveValue {
    pub current: Price,
    pub reference_open: Price,
    pub polled_at: DateTime<Utc>,
}

impl LiveValue {
    /// `prices` ascending; the first one is the session open
    pub fn from_prices(prices: &[Price], polled_at: DateTime<Utc>) -> Option<Self> {
        Some(Self {
            current: *prices.last()?,
            reference_open: *prices.first()?,
            polled_at,
        })
    }

    pub fn delta(&self) -> Price {
        self.current - self.reference_open
    }

    /// Fractional change since the open, `None` when the open is zero
    pub fn delta_pct(&self) -> Option<f64> {
        if self.reference_open.is_zero() {
            return None;
        }
        Some(self.delta().to_f64() / self.reference_open.to_f64())
    }

    pub fn trend(&self) -> Trend {
        Trend::from_delta(self.delta())
    }
}

/// What the display shows right now, highest priority first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Displayed {
    Historical(Price),
    Live(Price),
    Initial(Price),
    Unavailable,
}

impl Displayed {
    pub fn price(self) -> Option<Price> {
        match self {
            Displayed::Historical(p) | Displayed::Live(p) | Displayed::Initial(p) => Some(p),
            Displayed::Unavailable => None,
        }
    }

    pub fn is_historical(self) -> bool {
        matches!(self, Displayed::Historical(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Updated,
    /// Updated, and the display is no longer delayed
    Recovered,
    Failed,
    /// Failed, and this failure made the display delayed
    Degraded,
}

impl PollOutcome {
    pub fn degraded_transition(self) -> Option<bool> {
        match self {
            PollOutcome::Recovered => Some(false),
            PollOutcome::Degraded => Some(true),
            PollOutcome::Updated | PollOutcome::Failed => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEnd {
    /// Back to the last live value, no network needed
    Revert,
    /// Nothing was ever polled, ask the feed again
    Refetch,
}

#[derive(Debug, Clone)]
pub struct Synchronizer {
    feed: Source,
    initial: Option<Price>,
    live: Option<LiveValue>,
    hovered: Option<Price>,
    failures: u32,
    degraded: bool,
}

impl Synchronizer {
    pub fn new(feed: Source, initial: Option<Price>) -> Self {
        Self {
            feed,
            initial,
            live: None,
            hovered: None,
            failures: 0,
            degraded: false,
        }
    }

    pub fn feed(&self) -> &Source {
        &self.feed
    }

    /// Returns whether the feed changed; a new feed starts from scratch
    pub fn set_feed(&mut self, feed: Source) -> bool {
        if self.feed == feed {
            return false;
        }
        self.feed = feed;
        self.reset();
        true
    }

    /// Forgets everything learned from the current feed
    pub fn reset(&mut self) {
        self.live = None;
        self.failures = 0;
        self.degraded = false;
    }

    pub fn set_initial(&mut self, initial: Option<Price>) {
        self.initial = initial;
    }

    pub fn on_success(&mut self, prices: &[Price], now: DateTime<Utc>) -> PollOutcome {
        let Some(live) = LiveValue::from_prices(prices, now) else {
            log::warn!("Live feed {} returned no prices", self.feed);
            return self.on_failure();
        };

        self.live = Some(live);
        self.failures = 0;

        if std::mem::replace(&mut self.degraded, false) {
            log::info!("Live feed {} recovered", self.feed);
            PollOutcome::Recovered
        } else {
            PollOutcome::Updated
        }
    }

    /// Leaves the last live value untouched
    pub fn on_failure(&mut self) -> PollOutcome {
        self.failures = self.failures.saturating_add(1);

        if !self.degraded && self.failures >= DEGRADED_AFTER {
            self.degraded = true;
            log::warn!(
                "Live feed {} failed {} times in a row",
                self.feed,
                self.failures
            );
            PollOutcome::Degraded
        } else {
            PollOutcome::Failed
        }
    }

    /// `None` while a hover is active, otherwise how to get back to live data
    pub fn set_hover(&mut self, hovered: Option<Price>) -> Option<HoverEnd> {
        let was_hovering = self.hovered.is_some();
        self.hovered = hovered;

        if self.hovered.is_some() || !was_hovering {
            return None;
        }

        if self.live.is_some() {
            Some(HoverEnd::Revert)
        } else {
            Some(HoverEnd::Refetch)
        }
    }

    pub fn displayed(&self) -> Displayed {
        if let Some(price) = self.hovered {
            Displayed::Historical(price)
        } else if let Some(live) = &self.live {
            Displayed::Live(live.current)
        } else if let Some(price) = self.initial {
            Displayed::Initial(price)
        } else {
            Displayed::Unavailable
        }
    }

    pub fn live(&self) -> Option<&LiveValue> {
        self.live.as_ref()
    }

    pub fn is_hovering(&self) -> bool {
        self.hovered.is_some()
    }

    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chart::ChartState;
    use crate::request::{Disposition, RequestLifecycle, Stream};
    use exchange::{Sample, Symbol, Timeframe};

    fn prices(values: &[f64]) -> Vec<Price> {
        values.iter().map(|v| Price::from_f64(*v)).collect()
    }

    fn feed() -> Source {
        Source::Symbol(Symbol::new("AAPL").expect("valid symbol"))
    }

    #[test]
    fn derives_daily_change() {
        let live = LiveValue::from_prices(&prices(&[200.0, 190.0, 202.0]), Utc::now())
            .expect("non-empty");
        assert_eq!(live.current, Price::from_f64(202.0));
        assert_eq!(live.delta(), Price::from_f64(2.0));
        assert_eq!(live.delta_pct(), Some(0.01));
        assert_eq!(live.trend(), Trend::Up);

        let flat_open = LiveValue::from_prices(&prices(&[0.0, 5.0]), Utc::now()).expect("non-empty");
        assert_eq!(flat_open.delta_pct(), None);

        let unchanged = LiveValue::from_prices(&prices(&[5.0]), Utc::now()).expect("non-empty");
        assert_eq!(unchanged.trend(), Trend::Up);
    }

    #[test]
    fn hover_keeps_priority_over_a_completing_poll() {
        let mut sync = Synchronizer::new(feed(), Some(Price::from_f64(1.0)));
        assert_eq!(sync.displayed(), Displayed::Initial(Price::from_f64(1.0)));

        sync.on_success(&prices(&[100.0, 105.0]), Utc::now());
        assert_eq!(sync.set_hover(Some(Price::from_f64(90.0))), None);

        sync.on_success(&prices(&[100.0, 107.0]), Utc::now());
        assert_eq!(sync.live().map(|l| l.current), Some(Price::from_f64(107.0)));
        assert_eq!(sync.displayed(), Displayed::Historical(Price::from_f64(90.0)));

        assert_eq!(sync.set_hover(None), Some(HoverEnd::Revert));
        assert_eq!(sync.displayed(), Displayed::Live(Price::from_f64(107.0)));
    }

    #[test]
    fn hover_end_refetches_only_without_live_value() {
        let mut sync = Synchronizer::new(feed(), None);
        assert_eq!(sync.set_hover(None), None);

        sync.set_hover(Some(Price::from_f64(3.0)));
        assert_eq!(sync.set_hover(None), Some(HoverEnd::Refetch));
        assert_eq!(sync.displayed(), Displayed::Unavailable);
    }

    #[test]
    fn three_failures_degrade_until_next_success() {
        let mut sync = Synchronizer::new(feed(), None);
        sync.on_success(&prices(&[10.0, 11.0]), Utc::now());

        assert_eq!(sync.on_failure(), PollOutcome::Failed);
        assert_eq!(sync.on_success(&[], Utc::now()), PollOutcome::Failed);
        assert!(!sync.is_degraded());

        assert_eq!(sync.on_failure(), PollOutcome::Degraded);
        assert!(sync.is_degraded());
        assert_eq!(sync.on_failure(), PollOutcome::Failed);
        assert_eq!(sync.displayed(), Displayed::Live(Price::from_f64(11.0)));

        let outcome = sync.on_success(&prices(&[10.0, 12.0]), Utc::now());
        assert_eq!(outcome, PollOutcome::Recovered);
        assert_eq!(outcome.degraded_transition(), Some(false));
        assert_eq!(sync.failures(), 0);
    }

    #[test]
    fn feed_change_starts_over() {
        let mut sync = Synchronizer::new(Source::Portfolio, None);
        sync.on_success(&prices(&[1.0, 2.0]), Utc::now());

        assert!(!sync.set_feed(Source::Portfolio));
        assert!(sync.set_feed(feed()));
        assert!(sync.live().is_none());
    }

    #[test]
    fn hover_scenario_reverts_to_live_value() {
        let mut chart = ChartState::new(feed(), Timeframe::All);
        let mut sync = Synchronizer::new(feed(), None);
        let mut requests: RequestLifecycle<()> = RequestLifecycle::new();

        let history = requests.begin(Stream::History);
        let poll = requests.begin(Stream::LivePoll);

        assert_eq!(requests.resolve(&poll), Disposition::Commit);
        sync.on_success(&prices(&[95.0, 101.0]), Utc::now());

        assert_eq!(requests.resolve(&history), Disposition::Commit);
        chart.commit(vec![
            Sample::new(1_000, Price::from_f64(100.0)),
            Sample::new(2_000, Price::from_f64(110.0)),
            Sample::new(3_000, Price::from_f64(90.0)),
        ]);

        // pointer over the last sample
        let hovered = chart.hover_at(400.0, 400.0);
        assert_eq!(hovered.as_ref().map(|h| h.price), Some(Price::from_f64(90.0)));
        sync.set_hover(hovered.map(|h| h.price));
        assert_eq!(sync.displayed(), Displayed::Historical(Price::from_f64(90.0)));

        // pointer leaves
        assert!(chart.clear_hover());
        assert_eq!(sync.set_hover(None), Some(HoverEnd::Revert));
        assert_eq!(sync.displayed(), Displayed::Live(Price::from_f64(101.0)));
    }
}
