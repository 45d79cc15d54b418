//! Index/price to pixel mapping for a single line series.

use super::Series;
use exchange::Price;

pub const DEFAULT_PADDING_LEFT: f32 = 10.0;
pub const DEFAULT_PADDING_RIGHT: f32 = 20.0;
pub const DEFAULT_PADDING_TOP: f32 = 20.0;
pub const DEFAULT_PADDING_BOTTOM: f32 = 20.0;

/// Headroom added below the lowest and above the highest price
const RANGE_MARGIN: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
    pub padding_left: f32,
    pub padding_right: f32,
    pub padding_top: f32,
    pub padding_bottom: f32,
}

impl Viewport {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            padding_left: DEFAULT_PADDING_LEFT,
            padding_right: DEFAULT_PADDING_RIGHT,
            padding_top: DEFAULT_PADDING_TOP,
            padding_bottom: DEFAULT_PADDING_BOTTOM,
        }
    }

    pub fn chart_width(&self) -> f32 {
        (self.width - self.padding_left - self.padding_right).max(0.0)
    }

    pub fn chart_height(&self) -> f32 {
        (self.height - self.padding_top - self.padding_bottom).max(0.0)
    }

    pub fn left(&self) -> f32 {
        self.padding_left
    }

    pub fn right(&self) -> f32 {
        self.padding_left + self.chart_width()
    }

    pub fn top(&self) -> f32 {
        self.padding_top
    }

    pub fn bottom(&self) -> f32 {
        self.padding_top + self.chart_height()
    }

    pub fn mid_y(&self) -> f32 {
        self.padding_top + self.chart_height() / 2.0
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CoordinateMapper {
    viewport: Viewport,
    len: usize,
    min: f64,
    max: f64,
}

impl CoordinateMapper {
    pub fn new(series: &Series, viewport: Viewport) -> Option<Self> {
        let (low, high) = series.price_range()?;
        let (low, high) = (low.to_f64(), high.to_f64());

        Some(Self {
            viewport,
            len: series.len(),
            min: low - low.abs() * RANGE_MARGIN,
            max: high + high.abs() * RANGE_MARGIN,
        })
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// A lone sample has no line, only the endpoint marker
    pub fn is_single(&self) -> bool {
        self.len == 1
    }

    /// Every price identical, including an all-zero series
    pub fn is_flat(&self) -> bool {
        self.max == self.min
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }

    pub fn x(&self, index: usize) -> f32 {
        let vp = &self.viewport;
        if self.len <= 1 {
            return vp.right();
        }

        let ratio = index.min(self.len - 1) as f32 / (self.len - 1) as f32;
        vp.padding_left + ratio * vp.chart_width()
    }

    pub fn y(&self, price: Price) -> f32 {
        let vp = &self.viewport;
        let range = if self.is_flat() {
            1.0
        } else {
            self.max - self.min
        };

        let ratio = ((price.to_f64() - self.min) / range) as f32;
        vp.padding_top + vp.chart_height() - ratio * vp.chart_height()
    }

    /// `y` as drawn: a flat series sits on the mid-line
    pub fn plot_y(&self, price: Price) -> f32 {
        if self.is_flat() {
            self.viewport.mid_y()
        } else {
            self.y(price)
        }
    }

    pub fn points<'a>(&'a self, series: &'a Series) -> impl Iterator<Item = (f32, f32)> + 'a {
        series
            .samples()
            .iter()
            .enumerate()
            .map(|(i, s)| (self.x(i), self.plot_y(s.price)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange::{Sample, Source, Symbol, Timeframe};

    fn series(prices: &[f64]) -> Series {
        let samples = prices
            .iter()
            .enumerate()
            .map(|(i, p)| Sample::new(i as u64 * 1_000, Price::from_f64(*p)))
            .collect();
        let source = Source::Symbol(Symbol::new("AAPL").expect("valid symbol"));
        Series::new(source, Timeframe::All, samples).expect("non-empty series")
    }

    #[test]
    fn x_spans_the_chart_area() {
        let vp = Viewport::new(400.0, 200.0);
        let s = series(&[100.0, 110.0, 90.0, 95.0]);
        let mapper = CoordinateMapper::new(&s, vp).expect("mapper");

        assert_eq!(mapper.x(0), vp.padding_left);
        assert_eq!(mapper.x(s.len() - 1), vp.padding_left + vp.chart_width());
        assert!((1..s.len()).all(|i| mapper.x(i) > mapper.x(i - 1)));
    }

    #[test]
    fn y_stays_inside_the_band() {
        let vp = Viewport::new(300.0, 150.0);
        let s = series(&[100.0, 110.0, 90.0]);
        let mapper = CoordinateMapper::new(&s, vp).expect("mapper");

        for sample in s.samples() {
            let offset = mapper.y(sample.price) - vp.padding_top;
            assert!((0.0..=vp.chart_height()).contains(&offset), "offset {offset}");
        }
        for p in [mapper.min(), mapper.max()] {
            let offset = mapper.y(Price::from_f64(p)) - vp.padding_top;
            assert!(offset >= -0.01 && offset <= vp.chart_height() + 0.01);
        }
        assert!(mapper.y(Price::from_f64(110.0)) < mapper.y(Price::from_f64(90.0)));
    }

    #[test]
    fn single_sample_sits_on_the_right_edge() {
        let vp = Viewport::new(200.0, 100.0);
        let s = series(&[42.0]);
        let mapper = CoordinateMapper::new(&s, vp).expect("mapper");

        assert!(mapper.is_single());
        assert_eq!(mapper.x(0), vp.right());
    }

    #[test]
    fn all_zero_series_is_flat_and_centered() {
        let vp = Viewport::new(200.0, 100.0);
        let s = series(&[0.0, 0.0, 0.0]);
        let mapper = CoordinateMapper::new(&s, vp).expect("mapper");

        assert!(mapper.is_flat());
        assert!(mapper.y(Price::default()).is_finite());
        assert_eq!(mapper.plot_y(Price::default()), vp.mid_y());
    }

    #[test]
    fn tiny_surface_clamps_to_zero() {
        let vp = Viewport::new(5.0, 5.0);
        assert_eq!(vp.chart_width(), 0.0);
        assert_eq!(vp.chart_height(), 0.0);

        let s = series(&[1.0, 2.0]);
        let mapper = CoordinateMapper::new(&s, vp).expect("mapper");
        assert_eq!(mapper.x(1), vp.padding_left);
        assert_eq!(mapper.y(Price::from_f64(2.0)), vp.padding_top);
    }
}
