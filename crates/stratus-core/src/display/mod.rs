//! Page rendering
//!
//! Pages draw black-on-white into a `Gray4` target, normally the
//! [`FrameBuffer`]. [`DisplayManager`] owns the buffer and the panel and is
//! the board-independent [`Presenter`](crate::cycle::Presenter).

use embedded_graphics::mono_font::{MonoFont, MonoTextStyle};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::text::{Alignment, Baseline, Text, TextStyleBuilder};

pub mod format;
pub mod framebuffer;
pub mod icons;
pub mod manager;
pub mod status_page;
pub mod weather_page;

pub use framebuffer::FrameBuffer;
pub use manager::{DisplayError, DisplayManager};
pub use status_page::{ErrorPage, StatusPage};
pub use weather_page::{PageLayout, WeatherPage};

/// Page size of the reference e-paper panel (portrait)
pub const PAGE_WIDTH_PX: u32 = 540;
pub const PAGE_HEIGHT_PX: u32 = 960;

pub const BACKGROUND: Gray4 = Gray4::WHITE;
pub const FOREGROUND: Gray4 = Gray4::BLACK;
/// Row dividers
pub const LIGHT_GRAY: Gray4 = Gray4::new(11);

/// Draw one line of text with its top edge at `position.y`.
pub(crate) fn draw_text<D>(
    display: &mut D,
    text: &str,
    position: Point,
    font: &MonoFont<'_>,
    alignment: Alignment,
) -> Result<(), D::Error>
where
    D: DrawTarget<Color = Gray4>,
{
    let style = TextStyleBuilder::new()
        .alignment(alignment)
        .baseline(Baseline::Top)
        .build();
    Text::with_text_style(text, position, MonoTextStyle::new(font, FOREGROUND), style)
        .draw(display)?;
    Ok(())
}

/// Characters of `font` that fit in `width` pixels
pub(crate) fn chars_that_fit(font: &MonoFont<'_>, width: u32) -> usize {
    let advance = font.character_size.width + font.character_spacing;
    (width / advance.max(1)) as usize
}
