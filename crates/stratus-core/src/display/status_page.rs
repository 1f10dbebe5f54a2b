//! Status and error pages
//!
//! Both show centered text on a cleared page: the status page a single
//! progress line, the error page a title, the failure and the retry delay.

use core::fmt::Write;

use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::text::Alignment;

use super::format::Line;
use super::{BACKGROUND, chars_that_fit, draw_text};

const LINE_HEIGHT_PX: i32 = 20;

/// Single centered progress message such as "Fetching weather..."
pub struct StatusPage<'a> {
    message: &'a str,
}

impl<'a> StatusPage<'a> {
    pub const fn new(message: &'a str) -> Self {
        Self { message }
    }

    pub fn draw<D: DrawTarget<Color = Gray4>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(BACKGROUND)?;
        let center = display.bounding_box().center();
        draw_text(
            display,
            self.message,
            center - Point::new(0, LINE_HEIGHT_PX / 2),
            &FONT_10X20,
            Alignment::Center,
        )
    }
}

/// Error screen shown before a retry sleep
pub struct ErrorPage<'a> {
    message: &'a str,
    retry_secs: u32,
}

impl<'a> ErrorPage<'a> {
    pub const fn new(message: &'a str, retry_secs: u32) -> Self {
        Self { message, retry_secs }
    }

    /// "Will retry in 5 minutes", or seconds below a minute
    pub fn retry_line(&self) -> Line {
        let mut line = Line::new();
        let _ = match self.retry_secs {
            s if s < 60 => write!(line, "Will retry in {} seconds", s),
            60..=119 => write!(line, "Will retry in 1 minute"),
            s => write!(line, "Will retry in {} minutes", s / 60),
        };
        line
    }

    pub fn draw<D: DrawTarget<Color = Gray4>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(BACKGROUND)?;
        let bounds = display.bounding_box();
        let center = bounds.center();

        draw_text(
            display,
            "Error",
            center - Point::new(0, LINE_HEIGHT_PX * 3),
            &FONT_10X20,
            Alignment::Center,
        )?;

        // Long provider messages drop to the small font
        let font = if self.message.chars().count() <= chars_that_fit(&FONT_10X20, bounds.size.width) {
            &FONT_10X20
        } else {
            &FONT_6X10
        };
        draw_text(
            display,
            self.message,
            center - Point::new(0, LINE_HEIGHT_PX / 2),
            font,
            Alignment::Center,
        )?;

        draw_text(
            display,
            &self.retry_line(),
            center + Point::new(0, LINE_HEIGHT_PX * 2),
            &FONT_10X20,
            Alignment::Center,
        )
    }
}
