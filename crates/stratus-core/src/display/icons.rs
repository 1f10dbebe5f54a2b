//! Weather condition icons drawn from primitives
//!
//! Every icon fits the square `top_left .. top_left + size`. Shapes are
//! black on the white page; partly-cloudy knocks a white halo out of the
//! sun or moon behind the cloud.

use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Circle, Line, PrimitiveStyle, Rectangle, Triangle};

use crate::forecast::ConditionCategory;

/// Unit vectors for the eight sun rays, every 45 degrees
const RAY_DIRECTIONS: [(f32, f32); 8] = [
    (1.0, 0.0),
    (0.7071, 0.7071),
    (0.0, 1.0),
    (-0.7071, 0.7071),
    (-1.0, 0.0),
    (-0.7071, -0.7071),
    (0.0, -1.0),
    (0.7071, -0.7071),
];

fn fill(color: Gray4) -> PrimitiveStyle<Gray4> {
    PrimitiveStyle::with_fill(color)
}

fn stroke(width: u32) -> PrimitiveStyle<Gray4> {
    PrimitiveStyle::with_stroke(Gray4::BLACK, width)
}

fn scale(size: u32, factor: f32) -> u32 {
    (size as f32 * factor) as u32
}

/// Filled disc of `radius` around `center`
fn disc<D>(display: &mut D, center: Point, radius: u32, color: Gray4) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    Circle::with_center(center, radius * 2 + 1)
        .into_styled(fill(color))
        .draw(display)
}

/// Icon for a provider condition code. Unknown codes draw nothing.
pub fn draw_condition<D>(
    display: &mut D,
    top_left: Point,
    size: u32,
    code: u16,
    night: bool,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    match ConditionCategory::from_code(code) {
        ConditionCategory::Thunderstorm => thunder(display, top_left, size),
        ConditionCategory::Drizzle | ConditionCategory::Rain => rain(display, top_left, size),
        ConditionCategory::Snow => snow(display, top_left, size),
        ConditionCategory::Atmosphere => fog(display, top_left, size),
        ConditionCategory::Clear if night => moon(display, top_left, size),
        ConditionCategory::Clear => sun(display, top_left, size),
        ConditionCategory::PartlyCloudy => partly_cloudy(display, top_left, size, night),
        ConditionCategory::Clouds => cloud(display, top_left, size),
        ConditionCategory::Unknown => Ok(()),
    }
}

fn center_of(top_left: Point, size: u32) -> Point {
    top_left + Point::new(size as i32 / 2, size as i32 / 2)
}

fn sun<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let center = center_of(top_left, size);
    let radius = size / 4;
    disc(display, center, radius, Gray4::BLACK)?;

    let inner = (radius + 2) as f32;
    let outer = scale(size, 0.4) as f32;
    for (dx, dy) in RAY_DIRECTIONS {
        let from = center + Point::new((dx * inner) as i32, (dy * inner) as i32);
        let to = center + Point::new((dx * outer) as i32, (dy * outer) as i32);
        Line::new(from, to).into_styled(stroke(2)).draw(display)?;
    }
    Ok(())
}

fn moon<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let center = center_of(top_left, size);
    let radius = size / 3;
    disc(display, center, radius, Gray4::BLACK)?;

    let bite = center + Point::new(scale(radius, 0.6) as i32, -(scale(radius, 0.3) as i32));
    disc(display, bite, scale(radius, 0.85), Gray4::WHITE)
}

/// Three overlapping discs on a flat base, optionally with a white halo
fn cloud_shape<D>(display: &mut D, top_left: Point, size: u32, halo: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let center = center_of(top_left, size);
    let r = (size / 5).max(1);
    let ri = r as i32;
    let left = center + Point::new(-ri, ri / 2);
    let top = center + Point::new(0, -ri / 3);
    let right = center + Point::new(ri, ri / 2);
    let big = scale(r, 1.3);

    if halo > 0 {
        disc(display, left, r + halo, Gray4::WHITE)?;
        disc(display, top, big + halo, Gray4::WHITE)?;
        disc(display, right, r + halo, Gray4::WHITE)?;
    }

    disc(display, left, r, Gray4::BLACK)?;
    disc(display, top, big, Gray4::BLACK)?;
    disc(display, right, r, Gray4::BLACK)?;
    Rectangle::new(left, Size::new(r * 2, r))
        .into_styled(fill(Gray4::BLACK))
        .draw(display)
}

fn cloud<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    cloud_shape(display, top_left, size, 0)
}

/// Smaller cloud raised toward the top, leaving room for precipitation
fn upper_cloud<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let lifted = top_left + Point::new(0, -(size as i32 / 6));
    cloud_shape(display, lifted, scale(size, 0.8), 0)
}

fn rain<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    upper_cloud(display, top_left, size)?;

    let s = size as i32;
    let drop_y = top_left.y + s / 2;
    let cx = top_left.x + s / 2;
    for i in -1..=1 {
        let dx = cx + i * s / 5;
        Line::new(Point::new(dx, drop_y), Point::new(dx - 4, drop_y + s / 4))
            .into_styled(stroke(2))
            .draw(display)?;
    }
    Ok(())
}

fn snow<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    upper_cloud(display, top_left, size)?;

    let s = size as i32;
    let flake_y = top_left.y + s / 2;
    let cx = top_left.x + s / 2;
    let dot = (size / 15).max(1);
    for i in -1..=1 {
        let x = cx + i * s / 5;
        disc(display, Point::new(x, flake_y + 3), dot, Gray4::BLACK)?;
        disc(display, Point::new(x - 3, flake_y + s / 4), dot, Gray4::BLACK)?;
    }
    Ok(())
}

fn thunder<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    upper_cloud(display, top_left, size)?;

    let bolt = center_of(top_left, size);
    let (bx, by) = (bolt.x, bolt.y);
    Triangle::new(
        Point::new(bx, by),
        Point::new(bx - 8, by + 12),
        Point::new(bx + 4, by + 10),
    )
    .into_styled(fill(Gray4::BLACK))
    .draw(display)?;
    Triangle::new(
        Point::new(bx - 4, by + 8),
        Point::new(bx - 10, by + 22),
        Point::new(bx + 2, by + 14),
    )
    .into_styled(fill(Gray4::BLACK))
    .draw(display)
}

fn fog<D>(display: &mut D, top_left: Point, size: u32) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let s = size as i32;
    let spacing = s / 5;
    let inset_near = s / 10;
    let inset_far = s / 4;
    for i in 0..4 {
        let (start, end) = if i % 2 == 0 {
            (inset_near, s - inset_far)
        } else {
            (inset_far, s - inset_near)
        };
        let y = top_left.y + s / 3 + i * spacing;
        Line::new(
            Point::new(top_left.x + start, y),
            Point::new(top_left.x + end, y),
        )
        .into_styled(stroke(2))
        .draw(display)?;
    }
    Ok(())
}

fn partly_cloudy<D>(display: &mut D, top_left: Point, size: u32, night: bool) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let behind = top_left + Point::new(0, -(size as i32 / 8));
    let small = scale(size, 0.6);
    if night {
        moon(display, behind, small)?;
    } else {
        sun(display, behind, small)?;
    }

    let front = top_left + Point::new(size as i32 / 4, size as i32 / 4);
    cloud_shape(display, front, scale(size, 0.7), 3)
}
