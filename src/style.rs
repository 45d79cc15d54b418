use data::Trend;

use iced::theme::palette::Extended;
use iced::widget::canvas::{LineDash, Stroke};
use iced::widget::{button, container, text};
use iced::{Border, Color, Theme};

pub const PRICE_TEXT_SIZE: f32 = 28.0;
pub const NOTE_TEXT_SIZE: f32 = 12.0;

pub fn trend_color(palette: &Extended, trend: Trend) -> Color {
    match trend {
        Trend::Up => palette.success.base.color,
        Trend::Down => palette.danger.base.color,
    }
}

pub fn trend_text(trend: Trend) -> impl Fn(&Theme) -> text::Style {
    move |theme: &Theme| text::Style {
        color: Some(trend_color(theme.extended_palette(), trend)),
    }
}

pub fn muted_text(theme: &Theme) -> text::Style {
    text::Style {
        color: Some(theme.extended_palette().background.strong.color),
    }
}

pub fn warning_text(theme: &Theme) -> text::Style {
    text::Style {
        color: Some(theme.extended_palette().danger.weak.color),
    }
}

pub fn baseline_stroke(palette: &Extended) -> Stroke<'static> {
    Stroke {
        width: 1.0,
        line_dash: LineDash {
            segments: &[4.0, 4.0],
            offset: 0,
        },
        ..Default::default()
    }
    .with_color(palette.background.strong.color.scale_alpha(0.6))
}

pub fn crosshair_stroke(palette: &Extended) -> Stroke<'static> {
    Stroke::default()
        .with_color(palette.background.base.text.scale_alpha(0.4))
        .with_width(1.0)
}

/// Selected entries of a button row
pub fn tab_button(theme: &Theme, status: button::Status, is_selected: bool) -> button::Style {
    if is_selected {
        button::primary(theme, status)
    } else {
        button::text(theme, status)
    }
}

pub fn panel_container(theme: &Theme) -> container::Style {
    let palette = theme.extended_palette();

    container::Style {
        background: Some(palette.background.weak.color.scale_alpha(0.3).into()),
        border: Border {
            radius: 4.0.into(),
            width: 1.0,
            color: palette.background.strong.color.scale_alpha(0.4),
        },
        ..Default::default()
    }
}
