use crate::foundation::{
    core::{Point, Rect},
    error::{FocalError, FocalResult},
};

/// Axis-aligned grid lines covering a world rectangle.
///
/// Lines sit at integer multiples of `spacing` in absolute world coordinates, so panning never
/// shifts them relative to the content.
#[derive(Clone, Debug, PartialEq)]
pub struct GridLines {
    /// Distance between neighbouring lines.
    pub spacing: f64,
    /// World x of every vertical line, ascending.
    pub vertical: Vec<f64>,
    /// World y of every horizontal line, ascending.
    pub horizontal: Vec<f64>,
    /// Rectangle spanned by the outermost lines; contains the requested rectangle.
    pub extent: Rect,
}

impl GridLines {
    /// Line segments in world space, vertical lines first.
    pub fn segments(&self) -> impl Iterator<Item = (Point, Point)> + '_ {
        let e = self.extent;
        let v = self
            .vertical
            .iter()
            .map(move |&x| (Point::new(x, e.y0), Point::new(x, e.y1)));
        let h = self
            .horizontal
            .iter()
            .map(move |&y| (Point::new(e.x0, y), Point::new(e.x1, y)));
        v.chain(h)
    }
}

/// Generate grid lines covering `visible` (world units) at the given `spacing`.
///
/// Fails when the request would produce more than `max_lines` lines on either axis (a zoomed-out
/// view with a fine grid); callers typically coarsen the spacing and retry.
pub fn grid_lines(visible: Rect, spacing: f64, max_lines: usize) -> FocalResult<GridLines> {
    if !(spacing.is_finite() && spacing > 0.0) {
        return Err(FocalError::validation("grid spacing must be finite and > 0"));
    }
    let r = visible.abs();
    if !(r.x0.is_finite() && r.y0.is_finite() && r.x1.is_finite() && r.y1.is_finite()) {
        return Err(FocalError::validation("grid rectangle must be finite"));
    }

    let (vertical, x0, x1) = axis_lines(r.x0, r.x1, spacing, max_lines)?;
    let (horizontal, y0, y1) = axis_lines(r.y0, r.y1, spacing, max_lines)?;

    Ok(GridLines {
        spacing,
        vertical,
        horizontal,
        extent: Rect::new(x0, y0, x1, y1),
    })
}

fn axis_lines(lo: f64, hi: f64, spacing: f64, max_lines: usize) -> FocalResult<(Vec<f64>, f64, f64)> {
    let first = (lo / spacing).floor();
    let last = (hi / spacing).ceil();
    let count = last - first + 1.0;
    if count > max_lines as f64 {
        return Err(FocalError::validation(format!(
            "grid would need {count} lines per axis (limit {max_lines})"
        )));
    }
    let (first, last) = (first as i64, last as i64);
    let lines: Vec<f64> = (first..=last).map(|k| k as f64 * spacing).collect();
    Ok((lines, first as f64 * spacing, last as f64 * spacing))
}

#[cfg(test)]
#[path = "../../tests/unit/viewport/grid.rs"]
mod tests;
