//! Current value display: live quote, daily change and hovered history.

use crate::style;

use data::chart::Trend;
use data::live::{HoverEnd, LiveValue, PollOutcome, Synchronizer};
use data::request::{Disposition, RequestLifecycle, RequestToken, Stream};
use data::util::format_with_separators;
use exchange::adapter::AdapterError;
use exchange::{Price, ProxyClient, Source};

use iced::widget::{column, container, row, text};
use iced::{Alignment, Element, Subscription, Task, task};
use std::time::Duration;

#[derive(Debug, Clone)]
pub enum Message {
    Tick,
    Polled {
        token: RequestToken,
        feed: Source,
        result: Result<Vec<Price>, AdapterError>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Degraded(bool),
}

pub struct ValuePanel {
    sync: Synchronizer,
    requests: RequestLifecycle<task::Handle>,
    poll_interval: Duration,
}

impl ValuePanel {
    pub fn new(feed: Source, initial: Option<Price>, poll_interval: Duration) -> Self {
        Self {
            sync: Synchronizer::new(feed, initial),
            requests: RequestLifecycle::new(),
            poll_interval,
        }
    }

    /// Cancels any outstanding poll and issues a new one
    pub fn poll(&mut self, client: &ProxyClient) -> Task<Message> {
        let token = self.requests.begin(Stream::LivePoll);
        let feed = self.sync.feed().clone();

        let fetch = {
            let client = client.clone();
            let feed = feed.clone();
            async move { client.fetch_live(&feed).await }
        };

        let (task, handle) =
            Task::perform(fetch, move |result| Message::Polled { token, feed, result })
                .abortable();

        self.requests.attach(&token, handle.abort_on_drop());
        task
    }

    pub fn set_feed(&mut self, feed: Source, client: &ProxyClient) -> Task<Message> {
        if self.sync.set_feed(feed) {
            self.poll(client)
        } else {
            Task::none()
        }
    }

    /// The credential changed under the current feed
    pub fn restart(&mut self, client: &ProxyClient) -> Task<Message> {
        self.sync.reset();
        self.poll(client)
    }

    pub fn set_initial(&mut self, initial: Option<Price>) {
        self.sync.set_initial(initial);
    }

    pub fn set_hover(&mut self, hovered: Option<Price>, client: &ProxyClient) -> Task<Message> {
        match self.sync.set_hover(hovered) {
            Some(HoverEnd::Refetch) if !self.requests.is_in_flight(Stream::LivePoll) => {
                self.poll(client)
            }
            Some(HoverEnd::Refetch | HoverEnd::Revert) | None => Task::none(),
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.sync.is_degraded()
    }

    pub fn update(
        &mut self,
        message: Message,
        client: &ProxyClient,
    ) -> (Task<Message>, Option<Action>) {
        match message {
            Message::Tick => (self.poll(client), None),
            Message::Polled {
                token,
                feed,
                result,
            } => {
                if self.requests.resolve(&token) != Disposition::Commit || feed != *self.sync.feed()
                {
                    return (Task::none(), None);
                }

                let outcome = match result {
                    Ok(prices) => self.sync.on_success(&prices, chrono::Utc::now()),
                    Err(err) => {
                        log::warn!("Live poll for {feed} failed: {err}");
                        self.sync.on_failure()
                    }
                };

                (Task::none(), degraded_action(outcome))
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let displayed = self.sync.displayed();

        let price = text(displayed.price().map_or_else(|| "--".to_string(), format_usd))
            .size(style::PRICE_TEXT_SIZE);

        let mut headline = row![price].spacing(8).align_y(Alignment::Center);
        if displayed.is_historical() {
            headline = headline.push(text("(Historical)").style(style::muted_text));
        }
        if self.requests.is_in_flight(Stream::LivePoll) {
            headline = headline.push(
                text("…")
                    .size(style::NOTE_TEXT_SIZE)
                    .style(style::muted_text),
            );
        }

        let mut content = column![headline].spacing(2);

        if !self.sync.is_hovering()
            && let Some(live) = self.sync.live()
        {
            content = content.push(
                text(format_change(live))
                    .size(style::NOTE_TEXT_SIZE)
                    .style(style::trend_text(live.trend())),
            );
        }

        if self.sync.is_degraded() {
            content = content.push(
                text("Live data delayed")
                    .size(style::NOTE_TEXT_SIZE)
                    .style(style::warning_text),
            );
        }

        container(content)
            .padding(8)
            .style(style::panel_container)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        iced::time::every(self.poll_interval).map(|_| Message::Tick)
    }

    #[cfg(test)]
    fn displayed(&self) -> data::live::Displayed {
        self.sync.displayed()
    }

    #[cfg(test)]
    pub(super) fn begin_poll(&mut self) -> RequestToken {
        self.requests.begin(Stream::LivePoll)
    }
}

fn degraded_action(outcome: PollOutcome) -> Option<Action> {
    outcome.degraded_transition().map(Action::Degraded)
}

/// `$1,234.56`
pub fn format_usd(price: Price) -> String {
    let formatted = format_with_separators(price.to_f64(), 2);
    match formatted.strip_prefix('-') {
        Some(magnitude) => format!("-${magnitude}"),
        None => format!("${formatted}"),
    }
}

/// `+12.34 (+1.00%) Today`
pub fn format_change(live: &LiveValue) -> String {
    let delta = live.delta();
    let sign = match live.trend() {
        Trend::Up => "+",
        Trend::Down => "-",
    };
    let magnitude = format_with_separators(delta.to_f64().abs(), 2);

    match live.delta_pct() {
        Some(pct) => format!("{sign}{magnitude} ({sign}{:.2}%) Today", (pct * 100.0).abs()),
        None => format!("{sign}{magnitude} Today"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use data::live::Displayed;
    use exchange::Symbol;

    fn feed(s: &str) -> Source {
        Source::Symbol(Symbol::new(s).expect("valid symbol"))
    }

    fn prices(values: &[f64]) -> Vec<Price> {
        values.iter().map(|v| Price::from_f64(*v)).collect()
    }

    #[test]
    fn formats_currency_and_change() {
        assert_eq!(format_usd(Price::from_f64(1234.56)), "$1,234.56");
        assert_eq!(format_usd(Price::from_f64(-5.0)), "-$5.00");
        assert_eq!(format_usd(Price::from_f64(-0.001)), "$0.00");

        let up = LiveValue::from_prices(&prices(&[1234.0, 1246.34]), Utc::now()).expect("live");
        assert_eq!(format_change(&up), "+12.34 (+1.00%) Today");

        let down = LiveValue::from_prices(&prices(&[200.0, 190.0]), Utc::now()).expect("live");
        assert_eq!(format_change(&down), "-10.00 (-5.00%) Today");

        let from_zero = LiveValue::from_prices(&prices(&[0.0, 3.0]), Utc::now()).expect("live");
        assert_eq!(format_change(&from_zero), "+3.00 Today");
    }

    #[test]
    fn stale_poll_is_ignored() {
        let client = ProxyClient::default();
        let mut panel = ValuePanel::new(feed("AAPL"), None, Duration::from_secs(60));

        let old = panel.requests.begin(Stream::LivePoll);
        let current = panel.requests.begin(Stream::LivePoll);

        let (_, action) = panel.update(
            Message::Polled {
                token: old,
                feed: feed("AAPL"),
                result: Ok(prices(&[1.0, 2.0])),
            },
            &client,
        );
        assert_eq!(action, None);
        assert_eq!(panel.displayed(), Displayed::Unavailable);

        panel.update(
            Message::Polled {
                token: current,
                feed: feed("AAPL"),
                result: Ok(prices(&[1.0, 3.0])),
            },
            &client,
        );
        assert_eq!(panel.displayed(), Displayed::Live(Price::from_f64(3.0)));
    }

    #[test]
    fn reports_degraded_transitions() {
        let client = ProxyClient::default();
        let mut panel = ValuePanel::new(feed("AAPL"), None, Duration::from_secs(60));

        let mut actions = vec![];
        for _ in 0..3 {
            let token = panel.requests.begin(Stream::LivePoll);
            let (_, action) = panel.update(
                Message::Polled {
                    token,
                    feed: feed("AAPL"),
                    result: Err(AdapterError::Timeout),
                },
                &client,
            );
            actions.push(action);
        }
        assert_eq!(actions, vec![None, None, Some(Action::Degraded(true))]);
        assert!(panel.is_degraded());

        let token = panel.requests.begin(Stream::LivePoll);
        let (_, action) = panel.update(
            Message::Polled {
                token,
                feed: feed("AAPL"),
                result: Ok(prices(&[1.0])),
            },
            &client,
        );
        assert_eq!(action, Some(Action::Degraded(false)));
    }

    #[test]
    fn hover_end_reverts_without_a_request() {
        let client = ProxyClient::default();
        let mut panel = ValuePanel::new(feed("AAPL"), None, Duration::from_secs(60));

        let token = panel.requests.begin(Stream::LivePoll);
        panel.update(
            Message::Polled {
                token,
                feed: feed("AAPL"),
                result: Ok(prices(&[100.0, 101.0])),
            },
            &client,
        );

        let _ = panel.set_hover(Some(Price::from_f64(90.0)), &client);
        assert_eq!(panel.displayed(), Displayed::Historical(Price::from_f64(90.0)));

        let _ = panel.set_hover(None, &client);
        assert!(!panel.requests.is_in_flight(Stream::LivePoll));
        assert_eq!(panel.displayed(), Displayed::Live(Price::from_f64(101.0)));
    }

    #[test]
    fn polls_resolving_after_teardown_change_nothing() {
        let client = ProxyClient::default();
        let mut panel = ValuePanel::new(
            feed("AAPL"),
            Some(Price::from_f64(5.0)),
            Duration::from_secs(60),
        );

        let token = panel.requests.begin(Stream::LivePoll);
        panel.requests.cancel_all();

        for result in [Ok(prices(&[1.0, 2.0])), Err(AdapterError::Timeout)] {
            let (_, action) = panel.update(
                Message::Polled {
                    token,
                    feed: feed("AAPL"),
                    result,
                },
                &client,
            );
            assert_eq!(action, None);
        }

        assert_eq!(panel.displayed(), Displayed::Initial(Price::from_f64(5.0)));
        assert_eq!(panel.sync.failures(), 0);
        assert!(!panel.is_degraded());
        assert!(!panel.requests.is_in_flight(Stream::LivePoll));
    }
}
