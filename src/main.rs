#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod chart;
mod logger;
mod screen;
mod style;
mod widget;

use screen::dashboard::{self, Dashboard};

use iced::widget::container;
use iced::{Element, Subscription, Task};

fn main() -> iced::Result {
    if let Err(err) = logger::setup(cfg!(debug_assertions)) {
        eprintln!("Failed to initialize logger: {err}");
    }

    std::panic::set_hook(Box::new(|info| {
        let location = info.location().map_or_else(
            || "unknown location".to_string(),
            |loc| format!("{}:{}:{}", loc.file(), loc.line(), loc.column()),
        );
        let msg = if let Some(s) = info.payload().downcast_ref::<&str>() {
            s.to_string()
        } else if let Some(s) = info.payload().downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        log::error!("PANIC at {location}: {msg}");
        eprintln!("PANIC at {location}: {msg}");
    }));

    iced::application(Tickline::new, Tickline::update, Tickline::view)
        .settings(iced::Settings {
            antialiasing: true,
            default_text_size: iced::Pixels(13.0),
            ..Default::default()
        })
        .window_size(iced::Size::new(960.0, 640.0))
        .title(Tickline::title)
        .theme(Tickline::theme)
        .subscription(Tickline::subscription)
        .run()
}

struct Tickline {
    dashboard: Dashboard,
}

#[derive(Debug, Clone)]
enum Message {
    Dashboard(dashboard::Message),
}

impl Tickline {
    fn new() -> (Self, Task<Message>) {
        let saved_state = load_saved_state();

        let proxy_url = data::config::resolve_proxy_url(saved_state.proxy_url.as_deref());
        let client =
            exchange::ProxyClient::new(&proxy_url, data::config::credential_from_env());
        log::info!(
            "Using quote proxy at {} ({} credential)",
            client.base_url(),
            if client.has_credential() { "with" } else { "without" }
        );

        let (dashboard, launch) = Dashboard::new(&saved_state, client);

        (Self { dashboard }, launch.map(Message::Dashboard))
    }

    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Dashboard(msg) => {
                let (task, action) = self.dashboard.update(msg);

                if let Some(dashboard::Action::SaveState) = action {
                    self.save_state_to_disk();
                }

                task.map(Message::Dashboard)
            }
        }
    }

    fn view(&self) -> Element<'_, Message> {
        container(self.dashboard.view().map(Message::Dashboard))
            .padding(12)
            .into()
    }

    fn title(&self) -> String {
        if self.dashboard.is_live_delayed() {
            format!("Tickline [{}] (live data delayed)", self.dashboard.source())
        } else {
            format!("Tickline [{}]", self.dashboard.source())
        }
    }

    fn theme(&self) -> iced::Theme {
        iced::Theme::Dark
    }

    fn subscription(&self) -> Subscription<Message> {
        self.dashboard.subscription().map(Message::Dashboard)
    }

    fn save_state_to_disk(&self) {
        let state = self.dashboard.to_state();

        match serde_json::to_string(&state) {
            Ok(state_str) => {
                let file_name = data::SAVED_STATE_PATH;
                if let Err(e) = data::write_json_to_file(&state_str, file_name) {
                    log::error!("Failed to write state to file: {}", e);
                } else {
                    log::debug!("Persisted state to {file_name}");
                }
            }
            Err(e) => log::error!("Failed to serialize state: {}", e),
        }
    }
}

fn load_saved_state() -> data::State {
    match data::read_from_file(data::SAVED_STATE_PATH) {
        Ok(state) => state.normalized(),
        Err(data::InternalError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No saved state found, starting with defaults");
            data::State::default()
        }
        Err(e) => {
            log::error!("Failed to load saved state: {e}");
            data::State::default()
        }
    }
}
