pub mod panel;

use crate::chart::{self, Chart};
use crate::screen::DashboardError;
use crate::style;
use panel::ValuePanel;

use data::config::{PollInterval, credential_from_env};
use data::{RecentSymbols, State};
use exchange::{ErrorKind, ProxyClient, Source, Symbol, Timeframe};

use iced::widget::{button, column, row, text, text_input};
use iced::{Alignment, Element, Length, Subscription, Task};

#[derive(Debug, Clone)]
pub enum Message {
    Chart(chart::Message),
    Panel(panel::Message),
    SourceSelected(Source),
    SymbolInput(String),
    SymbolSubmitted,
    TimeframeSelected(Timeframe),
    ReloadCredential,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    SaveState,
}

/// Hosts one chart and the value display that follows it
pub struct Dashboard {
    chart: Chart,
    panel: ValuePanel,
    client: ProxyClient,
    recent: RecentSymbols,
    poll_interval: PollInterval,
    symbol_input: String,
    notice: Option<DashboardError>,
    live_delayed: bool,
}

impl Dashboard {
    pub fn new(state: &State, client: ProxyClient) -> (Self, Task<Message>) {
        let source = state.last_source.clone();

        let mut dashboard = Self {
            chart: Chart::new(source.clone(), state.timeframe),
            panel: ValuePanel::new(source, None, state.poll_interval.as_duration()),
            client,
            recent: state.recent_symbols.clone(),
            poll_interval: state.poll_interval,
            symbol_input: String::new(),
            notice: None,
            live_delayed: false,
        };

        let load_chart = dashboard.chart.load(&dashboard.client).map(Message::Chart);
        let first_poll = dashboard.panel.poll(&dashboard.client).map(Message::Panel);

        (dashboard, Task::batch([load_chart, first_poll]))
    }

    pub fn source(&self) -> &Source {
        self.chart.source()
    }

    pub fn is_live_delayed(&self) -> bool {
        self.live_delayed
    }

    pub fn to_state(&self) -> State {
        State::from_parts(
            self.chart.source().clone(),
            self.chart.timeframe(),
            self.recent.clone(),
            Some(self.client.base_url().to_string()),
            self.poll_interval,
        )
    }

    pub fn update(&mut self, message: Message) -> (Task<Message>, Option<Action>) {
        match message {
            Message::Chart(msg) => {
                let Some(action) = self.chart.update(msg) else {
                    return (Task::none(), None);
                };
                (self.on_chart_action(action), None)
            }
            Message::Panel(msg) => {
                let (task, action) = self.panel.update(msg, &self.client);
                if let Some(panel::Action::Degraded(degraded)) = action {
                    log::info!("Live data for {} delayed: {degraded}", self.chart.source());
                    self.live_delayed = degraded;
                }
                (task.map(Message::Panel), None)
            }
            Message::SourceSelected(source) => (self.open(source), Some(Action::SaveState)),
            Message::SymbolInput(input) => {
                self.symbol_input = input;
                self.notice = None;
                (Task::none(), None)
            }
            Message::SymbolSubmitted => match Symbol::new(&self.symbol_input) {
                Some(symbol) => {
                    self.symbol_input.clear();
                    (self.open(Source::Symbol(symbol)), Some(Action::SaveState))
                }
                None => {
                    let err = DashboardError::InvalidSymbol(self.symbol_input.trim().to_string());
                    log::debug!("{err}");
                    self.notice = Some(err);
                    (Task::none(), None)
                }
            },
            Message::TimeframeSelected(timeframe) => {
                let (task, action) = self.chart.set_timeframe(timeframe, &self.client);
                let hover_end = action.map_or_else(Task::none, |action| self.on_chart_action(action));
                (
                    Task::batch([task.map(Message::Chart), hover_end]),
                    Some(Action::SaveState),
                )
            }
            Message::ReloadCredential => (self.reload_credential(), None),
        }
    }

    fn on_chart_action(&mut self, action: chart::Action) -> Task<Message> {
        match action {
            chart::Action::Hover(point) => self
                .panel
                .set_hover(point.map(|p| p.price), &self.client)
                .map(Message::Panel),
            chart::Action::Loaded {
                last,
                cleared_hover,
            } => {
                self.notice = None;
                self.panel.set_initial(Some(last));
                self.clear_panel_hover(cleared_hover)
            }
            chart::Action::NoData {
                source,
                cleared_hover,
            } => {
                log::info!("Chart has no data for {source}");
                self.panel.set_initial(None);
                self.clear_panel_hover(cleared_hover)
            }
            chart::Action::Failed(err) => {
                if err.kind() == ErrorKind::Rejected {
                    self.notice = Some(DashboardError::Fetch(err.to_string()));
                }
                Task::none()
            }
        }
    }

    fn clear_panel_hover(&mut self, cleared_hover: bool) -> Task<Message> {
        if cleared_hover {
            self.panel.set_hover(None, &self.client).map(Message::Panel)
        } else {
            Task::none()
        }
    }

    fn open(&mut self, source: Source) -> Task<Message> {
        if let Source::Symbol(symbol) = &source {
            self.recent.push(symbol.clone());
        }
        self.notice = None;

        let (load_chart, chart_action) = self.chart.set_source(source.clone(), &self.client);
        let hover_end = chart_action.map_or_else(Task::none, |action| self.on_chart_action(action));
        let switch_feed = self.panel.set_feed(source, &self.client);
        self.live_delayed = self.panel.is_degraded();

        Task::batch([
            load_chart.map(Message::Chart),
            hover_end,
            switch_feed.map(Message::Panel),
        ])
    }

    /// Re-reads the profile store; the live feed and a portfolio chart start over
    fn reload_credential(&mut self) -> Task<Message> {
        let credential = credential_from_env();
        if credential.is_none() {
            log::warn!("No credential found in the profile store");
        }

        self.client = self.client.clone().with_credential(credential);
        self.notice = None;

        let restart_feed = self.panel.restart(&self.client).map(Message::Panel);
        self.live_delayed = false;
        let reload_chart = if self.chart.source().needs_credential() {
            self.chart.load(&self.client).map(Message::Chart)
        } else {
            Task::none()
        };

        Task::batch([restart_feed, reload_chart])
    }

    pub fn view(&self) -> Element<'_, Message> {
        let current = self.chart.source();

        let portfolio_btn = button(text("Portfolio"))
            .style(move |theme, status| {
                style::tab_button(theme, status, *current == Source::Portfolio)
            })
            .on_press(Message::SourceSelected(Source::Portfolio));

        let symbol_input = text_input("Symbol, e.g. AAPL", &self.symbol_input)
            .on_input(Message::SymbolInput)
            .on_submit(Message::SymbolSubmitted)
            .width(Length::Fixed(180.0));

        let mut recent_row = row![].spacing(4).align_y(Alignment::Center);
        for symbol in self.recent.iter().rev() {
            let is_selected = current.symbol() == Some(symbol);
            recent_row = recent_row.push(
                button(text(symbol.to_string()).size(style::NOTE_TEXT_SIZE))
                    .style(move |theme, status| style::tab_button(theme, status, is_selected))
                    .on_press(Message::SourceSelected(Source::Symbol(symbol.clone()))),
            );
        }

        let open_btn = button(text("Open")).on_press(Message::SymbolSubmitted);

        let mut top_bar = row![portfolio_btn, symbol_input, open_btn]
            .spacing(8)
            .align_y(Alignment::Center);

        if current.needs_credential() || self.notice.is_some() {
            top_bar = top_bar.push(
                button(text("Reload credentials").size(style::NOTE_TEXT_SIZE))
                    .style(button::secondary)
                    .on_press(Message::ReloadCredential),
            );
        }

        let selected_tf = self.chart.timeframe();
        let timeframes = Timeframe::ALL.into_iter().fold(
            row![].spacing(4).align_y(Alignment::Center),
            |tf_row, tf| {
                tf_row.push(
                    button(text(tf.to_string()).size(style::NOTE_TEXT_SIZE))
                        .style(move |theme, status| {
                            style::tab_button(theme, status, tf == selected_tf)
                        })
                        .on_press(Message::TimeframeSelected(tf)),
                )
            },
        );

        let mut content = column![top_bar, recent_row].spacing(8);

        if let Some(notice) = &self.notice {
            content = content.push(
                text(notice.to_string())
                    .size(style::NOTE_TEXT_SIZE)
                    .style(style::warning_text),
            );
        }

        content
            .push(self.panel.view().map(Message::Panel))
            .push(self.chart.view().map(Message::Chart))
            .push(timeframes)
            .into()
    }

    pub fn subscription(&self) -> Subscription<Message> {
        Subscription::batch([
            self.chart.subscription().map(Message::Chart),
            self.panel.subscription().map(Message::Panel),
        ])
    }
}
