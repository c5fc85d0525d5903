//! Coordinate transforms and axis-aligned rectangle tests.
//!
//! World coordinates are diagram units; screen coordinates are viewport
//! pixels. The mapping is `screen = (world - pan) * zoom`.

use crate::view::CanvasViewState;
use kurbo::{Point, Rect, Vec2};

/// Convert a world point to screen coordinates.
pub fn world_to_screen(point: Point, view: &CanvasViewState) -> Point {
    Point::new(
        (point.x - view.pan.x) * view.zoom,
        (point.y - view.pan.y) * view.zoom,
    )
}

/// Convert a screen point to world coordinates.
pub fn screen_to_world(point: Point, view: &CanvasViewState) -> Point {
    Point::new(
        point.x / view.zoom + view.pan.x,
        point.y / view.zoom + view.pan.y,
    )
}

/// Inclusive AABB overlap. Touching edges count as intersecting.
pub fn rect_intersects(a: Rect, b: Rect) -> bool {
    a.x0 <= b.x1 && a.x1 >= b.x0 && a.y0 <= b.y1 && a.y1 >= b.y0
}

/// Point-in-rect, expressed as an intersection with a zero-size rect.
pub fn rect_contains_point(rect: Rect, point: Point) -> bool {
    rect_intersects(rect, Rect::from_points(point, point))
}

/// Build a rect from two corners given in any order.
pub fn rect_from_corners(a: Point, b: Point) -> Rect {
    Rect::new(a.x.min(b.x), a.y.min(b.y), a.x.max(b.x), a.y.max(b.y))
}

/// Snap a point to the nearest grid intersection.
pub fn snap_to_grid(point: Point, grid_size: f64) -> Point {
    if grid_size <= 0.0 {
        return point;
    }
    Point::new(
        (point.x / grid_size).round() * grid_size,
        (point.y / grid_size).round() * grid_size,
    )
}

/// Clamp a point into the non-negative quadrant of the canvas.
pub fn clamp_non_negative(point: Point) -> Point {
    Point::new(point.x.max(0.0), point.y.max(0.0))
}

/// Clamp a delta shared by a group of origins so that none of them moves to
/// a negative coordinate. Origins already below zero may not move further
/// out, but are not pulled back in.
pub fn clamp_group_delta(origins: impl IntoIterator<Item = Point>, delta: Vec2) -> Vec2 {
    let (min_x, min_y) = origins
        .into_iter()
        .fold((f64::INFINITY, f64::INFINITY), |(x, y), p| (x.min(p.x), y.min(p.y)));
    if !min_x.is_finite() {
        return delta;
    }
    Vec2::new(delta.x.max(-min_x.max(0.0)), delta.y.max(-min_y.max(0.0)))
}

/// Union of a set of rects, or `None` if the set is empty.
pub fn bounds_union(rects: impl IntoIterator<Item = Rect>) -> Option<Rect> {
    rects.into_iter().fold(None, |acc, r| {
        Some(match acc {
            Some(u) => u.union(r),
            None => r,
        })
    })
}
