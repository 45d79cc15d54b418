use crate::style;

use data::chart::{ChartState, CoordinateMapper, Viewport};

use iced::widget::canvas::{self, Path};
use iced::{Alignment, Point, Rectangle, Renderer, Size, Theme, mouse};

const LINE_WIDTH: f32 = 2.0;
const MARKER_RADIUS: f32 = 4.0;
const HOVER_DOT_RADIUS: f32 = 5.0;

const TAG_TEXT_SIZE: f32 = 11.0;
const TAG_HEIGHT: f32 = TAG_TEXT_SIZE + 6.0;
const CHAR_W: f32 = TAG_TEXT_SIZE * 0.64;

/// Pointer activity over the chart surface, `x` relative to its left edge
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Event {
    Moved { x: f32, width: f32 },
    Left,
}

/// Line chart of a single series. Everything is drawn from scratch on each
/// pass, nothing is cached between frames.
pub struct LineChart<'a> {
    state: &'a ChartState,
}

impl<'a> LineChart<'a> {
    pub fn new(state: &'a ChartState) -> Self {
        Self { state }
    }

    fn fill_hover(&self, frame: &mut canvas::Frame, mapper: &CoordinateMapper, theme: &Theme) {
        let Some(hover) = self.state.hover() else {
            return;
        };
        let palette = theme.extended_palette();
        let vp = mapper.viewport();

        let x = mapper.x(hover.index);
        let y = mapper.plot_y(hover.price);

        frame.stroke(
            &Path::line(Point::new(x, vp.top()), Point::new(x, vp.bottom())),
            style::crosshair_stroke(palette),
        );

        let dot_color = self
            .state
            .series()
            .map_or(palette.primary.base.color, |series| {
                style::trend_color(palette, series.trend())
            });
        frame.fill(&Path::circle(Point::new(x, y), HOVER_DOT_RADIUS), dot_color);

        let label_w = hover.formatted_date.len() as f32 * CHAR_W + 12.0;
        let label_x = x.clamp(label_w * 0.5, (vp.width - label_w * 0.5).max(label_w * 0.5));
        let label_y = (vp.top() - TAG_HEIGHT * 0.5).max(TAG_HEIGHT * 0.5);

        frame.fill_rectangle(
            Point::new(label_x - label_w * 0.5, label_y - TAG_HEIGHT * 0.5),
            Size::new(label_w, TAG_HEIGHT),
            palette.secondary.base.color,
        );
        frame.fill_text(canvas::Text {
            content: hover.formatted_date.clone(),
            position: Point::new(label_x, label_y),
            color: palette.secondary.base.text,
            size: TAG_TEXT_SIZE.into(),
            align_x: Alignment::Center.into(),
            align_y: Alignment::Center.into(),
            ..Default::default()
        });
    }
}

impl canvas::Program<Event> for LineChart<'_> {
    /// Whether the pointer was over the surface on the last event
    type State = bool;

    fn update(
        &self,
        hovering: &mut Self::State,
        event: &iced::Event,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> Option<canvas::Action<Event>> {
        let iced::Event::Mouse(event) = event else {
            return None;
        };

        match event {
            mouse::Event::CursorLeft => {
                if std::mem::replace(hovering, false) {
                    return Some(canvas::Action::publish(Event::Left));
                }
                None
            }
            mouse::Event::CursorMoved { .. } => match cursor.position_in(bounds) {
                Some(position) => {
                    *hovering = true;
                    Some(canvas::Action::publish(Event::Moved {
                        x: position.x,
                        width: bounds.width,
                    }))
                }
                None if std::mem::replace(hovering, false) => {
                    Some(canvas::Action::publish(Event::Left))
                }
                None => None,
            },
            _ => None,
        }
    }

    fn draw(
        &self,
        _hovering: &Self::State,
        renderer: &Renderer,
        theme: &Theme,
        bounds: Rectangle,
        _cursor: mouse::Cursor,
    ) -> Vec<canvas::Geometry> {
        let Some(series) = self.state.series() else {
            return vec![];
        };
        let Some(mapper) = CoordinateMapper::new(series, Viewport::new(bounds.width, bounds.height))
        else {
            return vec![];
        };

        let mut frame = canvas::Frame::new(renderer, bounds.size());
        let palette = theme.extended_palette();
        let vp = mapper.viewport();
        let color = style::trend_color(palette, series.trend());

        frame.stroke(
            &Path::line(
                Point::new(vp.left(), vp.bottom()),
                Point::new(vp.right(), vp.bottom()),
            ),
            style::baseline_stroke(palette),
        );

        if !mapper.is_single() {
            let line = Path::new(|builder| {
                for (i, (x, y)) in mapper.points(series).enumerate() {
                    if i == 0 {
                        builder.move_to(Point::new(x, y));
                    } else {
                        builder.line_to(Point::new(x, y));
                    }
                }
            });
            frame.stroke(
                &line,
                canvas::Stroke::default()
                    .with_color(color)
                    .with_width(LINE_WIDTH),
            );
        }

        if self.state.blink_visible()
            && let Some(last) = series.last()
        {
            let end = Point::new(mapper.x(series.len() - 1), mapper.plot_y(last.price));
            frame.fill(&Path::circle(end, MARKER_RADIUS), color);
        }

        self.fill_hover(&mut frame, &mapper, theme);

        vec![frame.into_geometry()]
    }

    fn mouse_interaction(
        &self,
        _hovering: &Self::State,
        bounds: Rectangle,
        cursor: mouse::Cursor,
    ) -> mouse::Interaction {
        if self.state.is_ready() && cursor.is_over(bounds) {
            mouse::Interaction::Crosshair
        } else {
            mouse::Interaction::default()
        }
    }
}
