//! Text helpers for the weather page

use core::fmt::Write;

use crate::forecast::{LABEL_CAPACITY, Label};
use crate::time::{LocalDateTime, Timestamp, TimeZone};

/// Scratch string for one line of page text
pub type Line = heapless::String<64>;

/// Round half away from zero; `f32::round` needs `std`.
pub fn round(value: f32) -> i32 {
    if value >= 0.0 {
        (value + 0.5) as i32
    } else {
        (value - 0.5) as i32
    }
}

/// Three-letter weekday of `ts` in `zone`, e.g. "Mon"
pub fn weekday_name(ts: Timestamp, zone: &TimeZone) -> &'static str {
    zone.to_local(ts).weekday.short_name()
}

const fn twelve_hour(hour: u8) -> (u8, &'static str) {
    let suffix = if hour >= 12 { "PM" } else { "AM" };
    match hour % 12 {
        0 => (12, suffix),
        h => (h, suffix),
    }
}

/// Compact hour label such as "3PM" or "12AM"
pub fn hour_label(hour: u8) -> heapless::String<4> {
    let (h, suffix) = twelve_hour(hour);
    let mut out = heapless::String::new();
    let _ = write!(out, "{}{}", h, suffix);
    out
}

/// Clock time such as "2:05 PM"
pub fn clock_label(local: &LocalDateTime) -> heapless::String<8> {
    let (h, suffix) = twelve_hour(local.time.hour);
    let mut out = heapless::String::new();
    let _ = write!(out, "{}:{:02} {}", h, local.time.minute, suffix);
    out
}

/// Date such as "Mon Jan 5"
pub fn date_label(local: &LocalDateTime) -> heapless::String<12> {
    let mut out = heapless::String::new();
    let _ = write!(
        out,
        "{} {} {}",
        local.weekday.short_name(),
        local.date.month_name(),
        local.date.day
    );
    out
}

/// Copy of `text` with its first character upper-cased (ASCII only).
pub fn capitalize_first(text: &str) -> Label {
    let mut out = Label::new();
    let mut chars = text.chars();
    if let Some(first) = chars.next() {
        let _ = out.push(first.to_ascii_uppercase());
    }
    for c in chars {
        if out.push(c).is_err() {
            break;
        }
    }
    out
}

/// Shorten to at most `max_chars`, marking the cut with "..".
pub fn ellipsize(text: &str, max_chars: usize) -> Label {
    let mut out = Label::new();
    if text.chars().count() <= max_chars {
        for c in text.chars().take(LABEL_CAPACITY) {
            if out.push(c).is_err() {
                break;
            }
        }
        return out;
    }
    for c in text.chars().take(max_chars.saturating_sub(2)) {
        if out.push(c).is_err() {
            break;
        }
    }
    let _ = out.push_str("..");
    out
}
