use super::{HoverPoint, Series, format_date};

/// Nearest sample index for a pointer at `x` on a surface `container_width` wide.
///
/// Out-of-bounds pointers clamp to the first or last sample. A degenerate
/// width or a non-finite `x` maps to the first sample.
pub fn nearest_index(x: f32, container_width: f32, len: usize) -> Option<usize> {
    let last = len.checked_sub(1)?;

    if !x.is_finite() || !container_width.is_finite() || container_width <= 0.0 {
        return Some(0);
    }

    let ratio = (x / container_width).clamp(0.0, 1.0);
    let index = (ratio * last as f32).round() as usize;
    Some(index.min(last))
}

pub fn hover_point(series: &Series, x: f32, container_width: f32) -> Option<HoverPoint> {
    let index = nearest_index(x, container_width, series.len())?;
    let sample = series.samples().get(index)?;

    Some(HoverPoint {
        index,
        time: sample.time,
        price: sample.price,
        formatted_date: format_date(sample.time),
    })
}
