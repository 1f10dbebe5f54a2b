//! Display manager
//!
//! Owns the panel and a full-screen [`FrameBuffer`]. Every page is drawn into
//! the buffer first; only the changed rectangle is pushed to the panel,
//! converted by a board-supplied color mapping.

use core::fmt::Debug;

use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use log::{debug, error};
use thiserror_no_std::Error;

use super::{ErrorPage, FrameBuffer, StatusPage, WeatherPage};
use crate::cycle::{Presenter, WeatherView};

/// Panel write failure. The driver's own error is logged, not carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DisplayError {
    #[error("Panel write failed")]
    Panel,
}

/// Board-independent presenter over any `DrawTarget` panel
pub struct DisplayManager<D, F>
where
    D: DrawTarget,
    F: Fn(Gray4) -> D::Color,
{
    panel: D,
    framebuffer: FrameBuffer,
    to_panel: F,
}

impl<D, F> DisplayManager<D, F>
where
    D: DrawTarget,
    D::Error: Debug,
    F: Fn(Gray4) -> D::Color,
{
    /// Wrap `panel`, sizing the framebuffer to its bounding box.
    pub fn new(panel: D, to_panel: F) -> Self {
        let size = panel.bounding_box().size;
        debug!("Display manager for {}x{} panel", size.width, size.height);
        Self {
            panel,
            framebuffer: FrameBuffer::new(size),
            to_panel,
        }
    }

    pub fn panel(&self) -> &D {
        &self.panel
    }

    pub fn panel_mut(&mut self) -> &mut D {
        &mut self.panel
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn into_panel(self) -> D {
        self.panel
    }

    fn flush(&mut self) -> Result<(), DisplayError> {
        self.framebuffer
            .flush(&mut self.panel, &self.to_panel)
            .map_err(|e| {
                error!("Panel write failed: {:?}", e);
                DisplayError::Panel
            })
    }
}

impl<D, F> Presenter for DisplayManager<D, F>
where
    D: DrawTarget,
    D::Error: Debug,
    F: Fn(Gray4) -> D::Color,
{
    type Error = DisplayError;

    fn show_status(&mut self, message: &str) -> Result<(), Self::Error> {
        let Ok(()) = StatusPage::new(message).draw(&mut self.framebuffer);
        self.flush()
    }

    fn show_weather(&mut self, view: &WeatherView<'_>) -> Result<(), Self::Error> {
        let Ok(()) = WeatherPage::new(view).draw(&mut self.framebuffer);
        self.flush()
    }

    fn show_error(&mut self, message: &str, retry_secs: u32) -> Result<(), Self::Error> {
        let Ok(()) = ErrorPage::new(message, retry_secs).draw(&mut self.framebuffer);
        self.flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec::Vec;
    use embedded_graphics::pixelcolor::{BinaryColor, Rgb565};
    use embedded_graphics::primitives::Rectangle;

    use crate::clock::ClockState;
    use crate::config::{ForecastLimits, Units};
    use crate::forecast::{CurrentConditions, ForecastAggregator, Sample, WeatherReport};
    use crate::time::TimeZone;

    /// Panel that records writes and can be told to fail
    struct Panel<C> {
        size: Size,
        writes: Vec<Rectangle>,
        pixels: usize,
        fail: bool,
        last: Option<C>,
    }

    impl<C> Panel<C> {
        fn new(size: Size) -> Self {
            Self {
                size,
                writes: Vec::new(),
                pixels: 0,
                fail: false,
                last: None,
            }
        }
    }

    impl<C> OriginDimensions for Panel<C> {
        fn size(&self) -> Size {
            self.size
        }
    }

    #[derive(Debug)]
    struct Busy;

    impl<C: PixelColor> DrawTarget for Panel<C> {
        type Color = C;
        type Error = Busy;

        fn draw_iter<I>(&mut self, _pixels: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Pixel<Self::Color>>,
        {
            Ok(())
        }

        fn fill_contiguous<I>(&mut self, area: &Rectangle, colors: I) -> Result<(), Self::Error>
        where
            I: IntoIterator<Item = Self::Color>,
        {
            if self.fail {
                return Err(Busy);
            }
            self.writes.push(*area);
            for c in colors {
                self.pixels += 1;
                self.last = Some(c);
            }
            Ok(())
        }
    }

    fn to_binary(c: Gray4) -> BinaryColor {
        if c.luma() < 8 { BinaryColor::On } else { BinaryColor::Off }
    }

    #[test]
    fn test_status_flushes_only_text_region() {
        let mut manager = DisplayManager::new(Panel::<BinaryColor>::new(Size::new(320, 240)), to_binary);
        manager.show_status("Connecting WiFi...").unwrap();

        let panel = manager.panel();
        assert_eq!(panel.writes.len(), 1);
        let area = panel.writes[0];
        assert!(area.size.width < 320 && area.size.height <= 20);
        assert_eq!(panel.pixels, (area.size.width * area.size.height) as usize);
        assert_eq!(manager.framebuffer().dirty_area(), None);
    }

    #[test]
    fn test_repeated_page_sends_nothing() {
        let mut manager = DisplayManager::new(Panel::<BinaryColor>::new(Size::new(320, 240)), to_binary);
        manager.show_error("No route", 300).unwrap();
        manager.show_error("No route", 300).unwrap();
        assert_eq!(manager.panel().writes.len(), 1);
    }

    #[test]
    fn test_panel_failure_keeps_region_dirty() {
        let mut manager = DisplayManager::new(Panel::<BinaryColor>::new(Size::new(320, 240)), to_binary);
        manager.panel_mut().fail = true;
        assert_eq!(manager.show_status("Starting..."), Err(DisplayError::Panel));
        assert!(manager.framebuffer().dirty_area().is_some());

        manager.panel_mut().fail = false;
        manager.show_status("Starting...").unwrap();
        assert_eq!(manager.panel().writes.len(), 1);
        assert_eq!(manager.framebuffer().dirty_area(), None);
    }

    #[test]
    fn test_weather_page_maps_colors() {
        let report = WeatherReport {
            current: CurrentConditions::default(),
            forecast: ForecastAggregator::new(ForecastLimits::default(), TimeZone::UTC)
                .aggregate(Vec::<Sample>::new()),
        };
        let view = WeatherView {
            report: &report,
            location: "Nowhere",
            units: Units::Metric,
            zone: TimeZone::UTC,
            clock: ClockState::Unsynced,
            next_update_hour: Some(6),
            hourly_display: 5,
            daily_display: 7,
        };
        let mut manager =
            DisplayManager::new(Panel::<Rgb565>::new(Size::new(540, 960)), |c: Gray4| {
                let l = c.luma();
                Rgb565::new(l * 2, l * 4, l * 2)
            });
        manager.show_weather(&view).unwrap();

        let panel = manager.into_panel();
        assert_eq!(panel.writes.len(), 1);
        assert!(panel.last.is_some());
    }
}
