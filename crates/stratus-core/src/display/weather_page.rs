//! Weather page
//!
//! Five horizontal bands, top to bottom:
//!
//! | Band    | Contents                                                   |
//! |---------|------------------------------------------------------------|
//! | header  | location (centered), local time (right)                    |
//! | current | icon, temperature, description, feels-like/humidity/wind   |
//! | hourly  | first N hourly entries as columns: hour, icon, temperature |
//! | daily   | one row per day: weekday, icon, description, pop, hi/lo    |
//! | footer  | update date/time and next scheduled refresh                |
//!
//! Band heights scale with the target, so the same page renders on the
//! 540x960 e-paper panel and on smaller landscape LCDs.

use core::fmt::Write;

use embedded_graphics::mono_font::MonoFont;
use embedded_graphics::mono_font::iso_8859_1::{FONT_6X10, FONT_10X20};
use embedded_graphics::pixelcolor::Gray4;
use embedded_graphics::prelude::*;
use embedded_graphics::primitives::{Line as Segment, PrimitiveStyle, Rectangle};
use embedded_graphics::text::Alignment;

use super::format::{self, Line, round};
use super::{BACKGROUND, FOREGROUND, LIGHT_GRAY, chars_that_fit, draw_text, icons};
use crate::clock::ClockState;
use crate::cycle::WeatherView;
use crate::forecast::{CurrentConditions, DailySummary, HourlySummary};

const MARGIN_PX: i32 = 8;
const HEADER_HEIGHT_PX: u32 = 32;
const FOOTER_HEIGHT_PX: u32 = 22;
const SMALL_LINE_PX: i32 = 12;
const LARGE_LINE_PX: i32 = 22;
/// Daily rows only show precipitation above this percent
const POP_DISPLAY_THRESHOLD: u8 = 20;
const DESCRIPTION_CHARS: usize = 10;

/// Vertical bands for a page of the given size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageLayout {
    pub header: Rectangle,
    pub current: Rectangle,
    pub hourly: Rectangle,
    pub daily: Rectangle,
    pub footer: Rectangle,
}

impl PageLayout {
    pub fn for_size(size: Size) -> Self {
        let width = size.width;
        let body_top = HEADER_HEIGHT_PX;
        let footer_top = size.height.saturating_sub(FOOTER_HEIGHT_PX).max(body_top);
        let body = footer_top - body_top;
        let current_h = body * 35 / 100;
        let hourly_h = body * 27 / 100;
        let daily_h = body - current_h - hourly_h;

        let band = |top: u32, height: u32| {
            Rectangle::new(Point::new(0, top as i32), Size::new(width, height))
        };
        Self {
            header: band(0, HEADER_HEIGHT_PX.min(size.height)),
            current: band(body_top, current_h),
            hourly: band(body_top + current_h, hourly_h),
            daily: band(body_top + current_h + hourly_h, daily_h),
            footer: band(footer_top, size.height.saturating_sub(footer_top)),
        }
    }

    /// Small displays use the small font where large text would not fit
    fn compact(&self) -> bool {
        self.hourly.size.height < 100
    }
}

/// Renders a [`WeatherView`] onto any `Gray4` target
pub struct WeatherPage<'v, 'a> {
    view: &'v WeatherView<'a>,
}

impl<'v, 'a> WeatherPage<'v, 'a> {
    pub const fn new(view: &'v WeatherView<'a>) -> Self {
        Self { view }
    }

    pub fn draw<D: DrawTarget<Color = Gray4>>(&self, display: &mut D) -> Result<(), D::Error> {
        display.clear(BACKGROUND)?;
        let layout = PageLayout::for_size(display.bounding_box().size);

        self.draw_header(display, &layout)?;
        self.draw_current(display, &layout)?;
        self.draw_hourly(display, &layout)?;
        self.draw_daily(display, &layout)?;
        self.draw_footer(display, &layout)
    }

    fn large_font(layout: &PageLayout) -> &'static MonoFont<'static> {
        if layout.compact() { &FONT_6X10 } else { &FONT_10X20 }
    }

    fn degrees(&self, value: f32) -> heapless::String<12> {
        let mut out = heapless::String::new();
        let _ = write!(out, "{}\u{b0}", round(value));
        out
    }

    fn draw_header<D: DrawTarget<Color = Gray4>>(
        &self,
        display: &mut D,
        layout: &PageLayout,
    ) -> Result<(), D::Error> {
        let band = layout.header;
        let width = band.size.width as i32;

        draw_text(
            display,
            self.view.location,
            Point::new(width / 2, 6),
            &FONT_10X20,
            Alignment::Center,
        )?;

        if let ClockState::Synced { local, .. } = self.view.clock {
            draw_text(
                display,
                &format::clock_label(&local),
                Point::new(width - MARGIN_PX, 11),
                &FONT_6X10,
                Alignment::Right,
            )?;
        }

        let y = band.top_left.y + band.size.height as i32 - 3;
        rule(display, 0, width, y, FOREGROUND)
    }

    fn draw_current<D: DrawTarget<Color = Gray4>>(
        &self,
        display: &mut D,
        layout: &PageLayout,
    ) -> Result<(), D::Error> {
        let band = layout.current;
        let current: &CurrentConditions = &self.view.report.current;
        let icon_size = (band.size.height.saturating_sub(16))
            .min(band.size.width / 3)
            .min(110)
            .max(8);
        let top = band.top_left.y + 8;

        icons::draw_condition(
            display,
            Point::new(MARGIN_PX, top),
            icon_size,
            current.condition_code,
            current.is_night_at(current.timestamp),
        )?;

        let text_x = MARGIN_PX * 3 + icon_size as i32;
        let text_width = (band.size.width as i32 - text_x - MARGIN_PX).max(0) as u32;
        let large = Self::large_font(layout);
        let large_line = if layout.compact() { SMALL_LINE_PX } else { LARGE_LINE_PX };
        let mut y = top;

        let mut temp = Line::new();
        let _ = write!(
            temp,
            "{}{}",
            round(current.temperature),
            self.view.units.temperature_suffix()
        );
        draw_text(display, &temp, Point::new(text_x, y), large, Alignment::Left)?;
        y += large_line;

        let description = format::capitalize_first(&current.condition_text);
        let description = format::ellipsize(&description, chars_that_fit(large, text_width));
        draw_text(display, &description, Point::new(text_x, y), large, Alignment::Left)?;
        y += large_line + 2;

        let mut details = Line::new();
        let _ = write!(
            details,
            "Feels {}  {}%  {} {} {}",
            self.degrees(current.feels_like),
            current.humidity,
            round(current.wind_speed),
            self.view.units.wind_suffix(),
            current.wind_compass()
        );
        draw_text(display, &details, Point::new(text_x, y), &FONT_6X10, Alignment::Left)?;
        y += SMALL_LINE_PX;

        if current.sunrise != 0 && current.sunset != 0 {
            let rise = self.view.zone.to_local(current.sunrise);
            let set = self.view.zone.to_local(current.sunset);
            let mut sun = Line::new();
            let _ = write!(
                sun,
                "Sunrise {}  Sunset {}",
                format::clock_label(&rise),
                format::clock_label(&set)
            );
            draw_text(display, &sun, Point::new(text_x, y), &FONT_6X10, Alignment::Left)?;
            y += SMALL_LINE_PX;
        }

        if current.pressure != 0 {
            let mut pressure = Line::new();
            let _ = write!(pressure, "{} hPa", current.pressure);
            draw_text(display, &pressure, Point::new(text_x, y), &FONT_6X10, Alignment::Left)?;
        }

        let y = band.top_left.y + band.size.height as i32 - 4;
        rule(display, MARGIN_PX, band.size.width as i32 - MARGIN_PX, y, FOREGROUND)
    }

    fn draw_hourly<D: DrawTarget<Color = Gray4>>(
        &self,
        display: &mut D,
        layout: &PageLayout,
    ) -> Result<(), D::Error> {
        let hourly: &[HourlySummary] = &self.view.report.forecast.hourly;
        let count = hourly.len().min(self.view.hourly_display);
        if count == 0 {
            return Ok(());
        }

        let band = layout.hourly;
        draw_text(
            display,
            "HOURLY",
            band.top_left + Point::new(MARGIN_PX, 2),
            &FONT_6X10,
            Alignment::Left,
        )?;

        let large = Self::large_font(layout);
        let large_line = if layout.compact() { SMALL_LINE_PX } else { LARGE_LINE_PX };
        let column_width = band.size.width / count as u32;
        let label_y = band.top_left.y + 2 + SMALL_LINE_PX;
        let icon_y = label_y + SMALL_LINE_PX;
        let icon_size = (band.size.height as i32 - (icon_y - band.top_left.y) - large_line - 6)
            .min(column_width as i32 - 8)
            .clamp(4, 72) as u32;

        for (i, entry) in hourly.iter().take(count).enumerate() {
            let center_x = (i as u32 * column_width + column_width / 2) as i32;
            let hour = self.view.zone.to_local(entry.timestamp).time.hour;

            draw_text(
                display,
                &format::hour_label(hour),
                Point::new(center_x, label_y),
                &FONT_6X10,
                Alignment::Center,
            )?;
            icons::draw_condition(
                display,
                Point::new(center_x - icon_size as i32 / 2, icon_y),
                icon_size,
                entry.condition_code,
                false,
            )?;
            draw_text(
                display,
                &self.degrees(entry.temperature),
                Point::new(center_x, icon_y + icon_size as i32 + 2),
                large,
                Alignment::Center,
            )?;
        }

        let y = band.top_left.y + band.size.height as i32 - 4;
        rule(display, MARGIN_PX, band.size.width as i32 - MARGIN_PX, y, FOREGROUND)
    }

    fn draw_daily<D: DrawTarget<Color = Gray4>>(
        &self,
        display: &mut D,
        layout: &PageLayout,
    ) -> Result<(), D::Error> {
        let daily: &[DailySummary] = &self.view.report.forecast.daily;
        let count = daily.len().min(self.view.daily_display);
        if count == 0 {
            return Ok(());
        }

        let band = layout.daily;
        let width = band.size.width as i32;
        draw_text(
            display,
            "DAILY",
            band.top_left + Point::new(MARGIN_PX, 2),
            &FONT_6X10,
            Alignment::Left,
        )?;

        let large = Self::large_font(layout);
        let rows_top = band.top_left.y + 2 + SMALL_LINE_PX + 2;
        let row_height = ((band.top_left.y + band.size.height as i32 - rows_top) / count as i32).max(1);
        let icon_size = (row_height - 4).clamp(4, 36) as u32;
        let day_width = 4 * (large.character_size.width + large.character_spacing) as i32;
        let icon_x = MARGIN_PX + day_width;
        let description_x = icon_x + icon_size as i32 + MARGIN_PX;
        let pop_x = width * 62 / 100;

        for (i, day) in daily.iter().take(count).enumerate() {
            let row_y = rows_top + i as i32 * row_height;
            let text_y = row_y + (row_height - large.character_size.height as i32) / 2;
            let small_y = row_y + (row_height - FONT_6X10.character_size.height as i32) / 2;

            draw_text(
                display,
                format::weekday_name(day.day_timestamp, &self.view.zone),
                Point::new(MARGIN_PX, text_y),
                large,
                Alignment::Left,
            )?;
            icons::draw_condition(
                display,
                Point::new(icon_x, row_y + (row_height - icon_size as i32) / 2),
                icon_size,
                day.condition_code,
                false,
            )?;

            let description = format::capitalize_first(&day.condition_text);
            draw_text(
                display,
                &format::ellipsize(&description, DESCRIPTION_CHARS),
                Point::new(description_x, small_y),
                &FONT_6X10,
                Alignment::Left,
            )?;

            if day.precipitation_probability_max > POP_DISPLAY_THRESHOLD {
                let mut pop = heapless::String::<8>::new();
                let _ = write!(pop, "{}%", day.precipitation_probability_max);
                draw_text(display, &pop, Point::new(pop_x, small_y), &FONT_6X10, Alignment::Left)?;
            }

            let mut high_low = heapless::String::<24>::new();
            let _ = write!(
                high_low,
                "{}/{}",
                self.degrees(day.temperature_max),
                self.degrees(day.temperature_min)
            );
            draw_text(
                display,
                &high_low,
                Point::new(width - MARGIN_PX, text_y),
                large,
                Alignment::Right,
            )?;

            if i + 1 < count {
                let y = row_y + row_height - 2;
                rule(display, MARGIN_PX * 2, width - MARGIN_PX * 2, y, LIGHT_GRAY)?;
            }
        }
        Ok(())
    }

    fn draw_footer<D: DrawTarget<Color = Gray4>>(
        &self,
        display: &mut D,
        layout: &PageLayout,
    ) -> Result<(), D::Error> {
        let band = layout.footer;
        let width = band.size.width as i32;
        rule(display, 0, width, band.top_left.y, FOREGROUND)?;

        let mut line = Line::new();
        if let ClockState::Synced { local, .. } = self.view.clock {
            let _ = write!(
                line,
                "Updated {} {}",
                format::date_label(&local),
                format::clock_label(&local)
            );
        }
        if let Some(hour) = self.view.next_update_hour {
            if !line.is_empty() {
                let _ = line.push_str("  ");
            }
            let _ = write!(line, "Next {}", format::hour_label(hour));
        }

        draw_text(
            display,
            &line,
            Point::new(width / 2, band.top_left.y + 6),
            &FONT_6X10,
            Alignment::Center,
        )
    }
}

/// One-pixel horizontal rule from `x0` to `x1`
fn rule<D: DrawTarget<Color = Gray4>>(
    display: &mut D,
    x0: i32,
    x1: i32,
    y: i32,
    color: Gray4,
) -> Result<(), D::Error> {
    Segment::new(Point::new(x0, y), Point::new(x1, y))
        .into_styled(PrimitiveStyle::with_stroke(color, 1))
        .draw(display)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ForecastLimits, Units};
    use crate::display::{FrameBuffer, PAGE_HEIGHT_PX, PAGE_WIDTH_PX};
    use crate::forecast::{ForecastAggregator, Sample, WeatherReport, label};
    use crate::time::{CivilDate, TimeOfDay, TimeZone, Timestamp, timestamp_from_utc};
    use alloc::vec::Vec;

    fn ts(day: u8, hour: u8) -> Timestamp {
        timestamp_from_utc(
            CivilDate {
                year: 2024,
                month: 3,
                day,
            },
            TimeOfDay::new(hour, 0, 0),
        )
    }

    fn report(samples: usize) -> WeatherReport {
        let stream: Vec<Sample> = (0..samples)
            .map(|i| Sample {
                timestamp: ts(10, 0) + i as i64 * 3 * 3600,
                temperature: 40.0 + (i % 8) as f32,
                humidity: 50,
                precipitation_probability: 0.35,
                condition_code: [800, 500, 803, 601][i % 4],
                condition_text: label("light rain"),
            })
            .collect();
        WeatherReport {
            current: CurrentConditions {
                timestamp: ts(10, 18),
                temperature: 52.4,
                feels_like: 47.0,
                humidity: 48,
                pressure: 1018,
                wind_speed: 6.9,
                wind_direction: 250,
                sunrise: ts(10, 13),
                sunset: ts(11, 1),
                condition_code: 801,
                condition_text: label("few clouds"),
                ..Default::default()
            },
            forecast: ForecastAggregator::new(ForecastLimits::default(), TimeZone::UTC).aggregate(stream),
        }
    }

    fn view(report: &WeatherReport) -> WeatherView<'_> {
        WeatherView {
            report,
            location: "Longmont, CO",
            units: Units::Imperial,
            zone: TimeZone::UTC,
            clock: ClockState::at(ts(10, 18), &TimeZone::UTC),
            next_update_hour: Some(0),
            hourly_display: 5,
            daily_display: 7,
        }
    }

    fn ink(fb: &FrameBuffer, area: Rectangle) -> usize {
        area.points().filter(|p| fb.pixel(*p) == Some(Gray4::BLACK)).count()
    }

    #[test]
    fn test_layout_bands_tile_the_page() {
        let layout = PageLayout::for_size(Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
        assert_eq!(layout.header.top_left.y, 0);
        assert_eq!(
            layout.current.top_left.y,
            layout.header.size.height as i32
        );
        assert_eq!(
            layout.hourly.top_left.y,
            layout.current.top_left.y + layout.current.size.height as i32
        );
        assert_eq!(
            layout.daily.top_left.y + layout.daily.size.height as i32,
            layout.footer.top_left.y
        );
        assert_eq!(
            layout.footer.top_left.y + layout.footer.size.height as i32,
            PAGE_HEIGHT_PX as i32
        );
        assert!(!layout.compact());
        assert!(PageLayout::for_size(Size::new(320, 240)).compact());
    }

    #[test]
    fn test_every_band_gets_ink() {
        let report = report(40);
        let view = view(&report);
        let mut fb = FrameBuffer::new(Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
        let Ok(()) = WeatherPage::new(&view).draw(&mut fb);

        let layout = PageLayout::for_size(fb.size());
        assert!(ink(&fb, layout.header) > 0);
        assert!(ink(&fb, layout.current) > 0);
        assert!(ink(&fb, layout.hourly) > 0);
        assert!(ink(&fb, layout.daily) > 0);
        assert!(ink(&fb, layout.footer) > 0);
    }

    #[test]
    fn test_empty_forecast_leaves_bands_blank() {
        let mut report = report(0);
        report.current.condition_code = 0;
        let view = view(&report);
        let mut fb = FrameBuffer::new(Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
        let Ok(()) = WeatherPage::new(&view).draw(&mut fb);

        let layout = PageLayout::for_size(fb.size());
        // Only the band's own separator rule may be inked
        let hourly_inner = Rectangle::new(
            layout.hourly.top_left,
            layout.hourly.size - Size::new(0, 6),
        );
        assert_eq!(ink(&fb, hourly_inner), 0);
        assert_eq!(ink(&fb, layout.daily), 0);
    }

    #[test]
    fn test_hourly_respects_display_count() {
        let report = report(12);
        let mut few = view(&report);
        few.hourly_display = 2;
        let mut fb = FrameBuffer::new(Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
        let Ok(()) = WeatherPage::new(&few).draw(&mut fb);

        let layout = PageLayout::for_size(fb.size());
        // Two columns of 270px: nothing is drawn in the far right sliver of
        // the hourly band except the separator rule
        let sliver = Rectangle::new(
            layout.hourly.top_left + Point::new(470, 0),
            Size::new(62, layout.hourly.size.height - 6),
        );
        assert_eq!(ink(&fb, sliver), 0);
    }

    #[test]
    fn test_small_landscape_panel_renders() {
        let report = report(40);
        let view = view(&report);
        let mut fb = FrameBuffer::new(Size::new(320, 240));
        let Ok(()) = WeatherPage::new(&view).draw(&mut fb);
        assert!(fb.dirty_area().is_some());
    }

    #[test]
    fn test_unsynced_clock_omits_time_text() {
        let report = report(8);
        let mut unsynced = view(&report);
        unsynced.clock = ClockState::Unsynced;
        unsynced.next_update_hour = None;
        let mut fb = FrameBuffer::new(Size::new(PAGE_WIDTH_PX, PAGE_HEIGHT_PX));
        let Ok(()) = WeatherPage::new(&unsynced).draw(&mut fb);

        let layout = PageLayout::for_size(fb.size());
        let footer_text = Rectangle::new(
            layout.footer.top_left + Point::new(0, 2),
            layout.footer.size - Size::new(0, 2),
        );
        assert_eq!(ink(&fb, footer_text), 0);
    }
}
