use crate::style;
use crate::widget::chart::{Event, LineChart};

use data::chart::{ChartState, Committed, HoverPoint, Status};
use data::request::{Disposition, RequestLifecycle, RequestToken, Stream};
use exchange::adapter::AdapterError;
use exchange::{Price, ProxyClient, Sample, Source, Timeframe};

use iced::widget::{canvas, center, column, container, text};
use iced::{Element, Length, Subscription, Task, task};
use std::time::Duration;

const BLINK_INTERVAL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone)]
pub enum Message {
    Fetched {
        token: RequestToken,
        source: Source,
        timeframe: Timeframe,
        result: Result<Vec<Sample>, AdapterError>,
    },
    Pointer(Event),
    Blink,
}

/// What the host needs to hear about, synchronously from `update`
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Hover(Option<HoverPoint>),
    Loaded { last: Price, cleared_hover: bool },
    NoData { source: Source, cleared_hover: bool },
    Failed(AdapterError),
}

pub struct Chart {
    state: ChartState,
    requests: RequestLifecycle<task::Handle>,
}

impl Chart {
    pub fn new(source: Source, timeframe: Timeframe) -> Self {
        Self {
            state: ChartState::new(source, timeframe),
            requests: RequestLifecycle::new(),
        }
    }

    pub fn source(&self) -> &Source {
        self.state.source()
    }

    pub fn timeframe(&self) -> Timeframe {
        self.state.timeframe()
    }

    /// Fetches the series for the current source and timeframe,
    /// superseding any fetch still running
    pub fn load(&mut self, client: &ProxyClient) -> Task<Message> {
        let token = self.requests.begin(Stream::History);
        self.state.begin_load();

        let source = self.state.source().clone();
        let timeframe = self.state.timeframe();
        log::debug!("Fetching {timeframe} history for {source}");

        let fetch = {
            let client = client.clone();
            let source = source.clone();
            async move { client.fetch_history(&source, timeframe).await }
        };

        let (task, handle) = Task::perform(fetch, move |result| Message::Fetched {
            token,
            source,
            timeframe,
            result,
        })
        .abortable();

        self.requests.attach(&token, handle.abort_on_drop());
        task
    }

    pub fn set_source(
        &mut self,
        source: Source,
        client: &ProxyClient,
    ) -> (Task<Message>, Option<Action>) {
        let timeframe = self.state.timeframe();
        self.switch_to(source, timeframe, client)
    }

    pub fn set_timeframe(
        &mut self,
        timeframe: Timeframe,
        client: &ProxyClient,
    ) -> (Task<Message>, Option<Action>) {
        let source = self.state.source().clone();
        self.switch_to(source, timeframe, client)
    }

    /// Re-selecting the current context retries a failed load
    fn switch_to(
        &mut self,
        source: Source,
        timeframe: Timeframe,
        client: &ProxyClient,
    ) -> (Task<Message>, Option<Action>) {
        let was_hovering = self.state.hover().is_some();

        if self.state.set_context(source, timeframe) {
            let action = was_hovering.then_some(Action::Hover(None));
            (self.load(client), action)
        } else if self.state.status() == Status::Failed {
            log::debug!("Retrying {timeframe} history for {}", self.state.source());
            (self.load(client), None)
        } else {
            (Task::none(), None)
        }
    }

    pub fn update(&mut self, message: Message) -> Option<Action> {
        match message {
            Message::Fetched {
                token,
                source,
                timeframe,
                result,
            } => {
                if self.requests.resolve(&token) != Disposition::Commit {
                    return None;
                }
                if !self.state.is_current(&source, timeframe) {
                    log::debug!("Discarding {timeframe} history for {source}, context moved on");
                    return None;
                }

                let cleared_hover = self.state.hover().is_some();

                match result {
                    Ok(samples) => match self.state.commit(samples) {
                        Committed::Ready => {
                            let last = self.state.series().and_then(|s| s.last())?.price;
                            Some(Action::Loaded {
                                last,
                                cleared_hover,
                            })
                        }
                        Committed::NoData => {
                            log::info!("No {timeframe} history for {source}");
                            Some(Action::NoData {
                                source,
                                cleared_hover,
                            })
                        }
                    },
                    Err(err) => {
                        log::warn!("Failed to fetch {timeframe} history for {source}: {err}");
                        match self.state.fail(err.kind()) {
                            Status::NoData => Some(Action::NoData {
                                source,
                                cleared_hover,
                            }),
                            _ => Some(Action::Failed(err)),
                        }
                    }
                }
            }
            Message::Pointer(Event::Moved { x, width }) => {
                self.state.hover_at(x, width).map(|point| Action::Hover(Some(point)))
            }
            Message::Pointer(Event::Left) => {
                self.state.clear_hover().then_some(Action::Hover(None))
            }
            Message::Blink => {
                self.state.toggle_blink();
                None
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let status = match self.state.status() {
            Status::Idle => None,
            Status::Loading => Some("Loading…".to_string()),
            Status::NoData => Some(format!("No data for {}", self.state.source())),
            Status::Failed => {
                Some("Failed to load chart data. Please try again later.".to_string())
            }
        };

        if !self.state.is_ready() {
            return center(text(status.unwrap_or_default()).style(style::muted_text)).into();
        }

        let surface: Element<'_, Event> = canvas(LineChart::new(&self.state))
            .width(Length::Fill)
            .height(Length::Fill)
            .into();

        let mut content = column![].spacing(4);
        if let Some(status) = status {
            content = content.push(
                container(text(status).size(style::NOTE_TEXT_SIZE).style(style::muted_text))
                    .padding([0, 10]),
            );
        }

        content.push(surface.map(Message::Pointer)).into()
    }

    /// The endpoint marker blinks only while there's a series to draw
    pub fn subscription(&self) -> Subscription<Message> {
        if self.state.is_ready() {
            iced::time::every(BLINK_INTERVAL).map(|_| Message::Blink)
        } else {
            Subscription::none()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::Symbol;

    fn symbol(s: &str) -> Source {
        Source::Symbol(Symbol::new(s).expect("valid symbol"))
    }

    fn samples(prices: &[f64]) -> Vec<Sample> {
        prices
            .iter()
            .enumerate()
            .map(|(i, p)| Sample::new(1_700_000_000_000 + i as u64 * 86_400_000, Price::from_f64(*p)))
            .collect()
    }

    fn fetched(token: RequestToken, source: Source, prices: &[f64]) -> Message {
        Message::Fetched {
            token,
            source,
            timeframe: Timeframe::All,
            result: Ok(samples(prices)),
        }
    }

    #[test]
    fn only_the_latest_symbol_commits() {
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);

        let first = chart.requests.begin(Stream::History);
        chart.state.set_context(symbol("MSFT"), Timeframe::All);
        let second = chart.requests.begin(Stream::History);

        let loaded = chart.update(fetched(second, symbol("MSFT"), &[1.0, 2.0]));
        assert!(matches!(loaded, Some(Action::Loaded { .. })));

        assert_eq!(chart.update(fetched(first, symbol("AAPL"), &[9.0])), None);
        assert_eq!(chart.state.series().map(|s| s.source()), Some(&symbol("MSFT")));
    }

    #[test]
    fn hover_follows_the_pointer_and_clears_on_leave() {
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);
        let token = chart.requests.begin(Stream::History);
        chart.update(fetched(token, symbol("AAPL"), &[100.0, 110.0, 90.0]));

        let action = chart.update(Message::Pointer(Event::Moved { x: 300.0, width: 300.0 }));
        let Some(Action::Hover(Some(point))) = action else {
            panic!("expected a hover point, got {action:?}");
        };
        assert_eq!(point.price, Price::from_f64(90.0));

        assert_eq!(
            chart.update(Message::Pointer(Event::Left)),
            Some(Action::Hover(None))
        );
        assert_eq!(chart.update(Message::Pointer(Event::Left)), None);
    }

    #[test]
    fn replacement_reports_cleared_hover() {
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);
        let token = chart.requests.begin(Stream::History);
        chart.update(fetched(token, symbol("AAPL"), &[1.0, 2.0, 3.0]));
        chart.update(Message::Pointer(Event::Moved { x: 0.0, width: 100.0 }));

        let token = chart.requests.begin(Stream::History);
        let action = chart.update(fetched(token, symbol("AAPL"), &[]));
        assert_eq!(
            action,
            Some(Action::NoData {
                source: symbol("AAPL"),
                cleared_hover: true
            })
        );
        assert_eq!(chart.state.status(), Status::NoData);
    }

    #[test]
    fn switching_source_ends_the_hover() {
        let client = ProxyClient::default();
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);
        let token = chart.requests.begin(Stream::History);
        chart.update(fetched(token, symbol("AAPL"), &[100.0, 110.0, 90.0]));
        chart.update(Message::Pointer(Event::Moved { x: 300.0, width: 300.0 }));

        let (_, action) = chart.set_source(symbol("MSFT"), &client);
        assert_eq!(action, Some(Action::Hover(None)));
        assert!(chart.state.series().is_none());
        assert_eq!(
            chart.update(Message::Pointer(Event::Moved { x: 300.0, width: 300.0 })),
            None
        );
        assert_eq!(chart.state.status(), Status::Loading);
    }

    #[test]
    fn reselecting_after_a_failure_retries() {
        let client = ProxyClient::default();
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);

        let _ = chart.set_source(symbol("AAPL"), &client);
        assert!(!chart.requests.is_in_flight(Stream::History));

        let token = chart.requests.begin(Stream::History);
        chart.update(Message::Fetched {
            token,
            source: symbol("AAPL"),
            timeframe: Timeframe::All,
            result: Err(AdapterError::Timeout),
        });
        assert_eq!(chart.state.status(), Status::Failed);

        let _ = chart.set_timeframe(Timeframe::All, &client);
        assert!(chart.requests.is_in_flight(Stream::History));
        assert_eq!(chart.state.status(), Status::Loading);
    }

    #[test]
    fn late_result_after_teardown_is_dropped() {
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);
        let token = chart.requests.begin(Stream::History);
        chart.update(fetched(token, symbol("AAPL"), &[1.0, 2.0]));
        let revision = chart.state.revision();

        let token = chart.requests.begin(Stream::History);
        chart.requests.cancel_all();

        assert_eq!(chart.update(fetched(token, symbol("AAPL"), &[5.0, 6.0])), None);
        assert!(chart.state.is_ready());
        assert_eq!(chart.state.revision(), revision);
        assert_eq!(
            chart.state.series().and_then(|s| s.last()).map(|s| s.price),
            Some(Price::from_f64(2.0))
        );

        let token = chart.requests.begin(Stream::History);
        chart.requests.cancel_all();
        let late_error = chart.update(Message::Fetched {
            token,
            source: symbol("AAPL"),
            timeframe: Timeframe::All,
            result: Err(AdapterError::NotFound("/day/AAPL".into())),
        });
        assert_eq!(late_error, None);
        assert!(chart.state.is_ready());
    }

    #[test]
    fn not_found_is_no_data_and_transient_keeps_series() {
        let mut chart = Chart::new(symbol("AAPL"), Timeframe::All);
        let token = chart.requests.begin(Stream::History);
        chart.update(fetched(token, symbol("AAPL"), &[1.0, 2.0]));

        let token = chart.requests.begin(Stream::History);
        let action = chart.update(Message::Fetched {
            token,
            source: symbol("AAPL"),
            timeframe: Timeframe::All,
            result: Err(AdapterError::Timeout),
        });
        assert_eq!(action, Some(Action::Failed(AdapterError::Timeout)));
        assert!(chart.state.is_ready());

        let token = chart.requests.begin(Stream::History);
        let action = chart.update(Message::Fetched {
            token,
            source: symbol("AAPL"),
            timeframe: Timeframe::All,
            result: Err(AdapterError::NotFound("/day/AAPL".into())),
        });
        assert!(matches!(action, Some(Action::NoData { .. })));
        assert!(!chart.state.is_ready());
    }
}
