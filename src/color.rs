//! Color tokens: parsing and straight-alpha "over" compositing.
//!
//! A token is an opaque string. The empty string is the transparent sentinel;
//! anything that does not parse as `#rgb`, `#rrggbb`, `rgb(...)` or
//! `rgba(...)` is treated as fully transparent rather than rejected.

use std::collections::{HashMap, VecDeque};
use std::sync::{Mutex, OnceLock};

/// The transparent sentinel.
pub const TRANSPARENT: &str = "";

/// Maximum number of parsed tokens kept in the process-wide cache.
pub const COLOR_CACHE_CAPACITY: usize = 1000;

/// Parsed channels. Alpha is straight (not premultiplied) in `[0, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f64,
}

impl Rgba {
    pub const CLEAR: Rgba = Rgba { r: 0, g: 0, b: 0, a: 0.0 };

    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }
}

/// True for the empty sentinel.
#[inline]
pub fn is_transparent(token: &str) -> bool {
    token.is_empty()
}

// ============================================================================
// PARSE CACHE
// ============================================================================

/// Bounded parse cache. Eviction is FIFO by insertion, not LRU: a hit does not
/// refresh an entry's position.
pub struct ColorCache {
    entries: HashMap<String, Rgba>,
    order: VecDeque<String>,
    capacity: usize,
}

impl ColorCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: HashMap::new(),
            order: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    pub fn get_or_parse(&mut self, token: &str) -> Rgba {
        if token.is_empty() {
            return Rgba::CLEAR;
        }
        if let Some(hit) = self.entries.get(token) {
            return *hit;
        }
        let parsed = parse_uncached(token);
        if self.entries.len() >= self.capacity
            && let Some(oldest) = self.order.pop_front()
        {
            self.entries.remove(&oldest);
        }
        self.entries.insert(token.to_string(), parsed);
        self.order.push_back(token.to_string());
        parsed
    }

    pub fn contains(&self, token: &str) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }
}

static CACHE: OnceLock<Mutex<ColorCache>> = OnceLock::new();

fn cache() -> &'static Mutex<ColorCache> {
    CACHE.get_or_init(|| Mutex::new(ColorCache::new(COLOR_CACHE_CAPACITY)))
}

/// Parse a token through the shared cache. Never fails.
pub fn parse(token: &str) -> Rgba {
    if token.is_empty() {
        return Rgba::CLEAR;
    }
    match cache().lock() {
        Ok(mut guard) => guard.get_or_parse(token),
        // A poisoned cache is still a valid cache; parsing is pure anyway.
        Err(_) => parse_uncached(token),
    }
}

/// Drop every cached parse.
pub fn clear_cache() {
    if let Ok(mut guard) = cache().lock() {
        guard.clear();
    }
}

fn parse_uncached(token: &str) -> Rgba {
    parse_hex(token)
        .or_else(|| parse_functional(token))
        .unwrap_or(Rgba::CLEAR)
}

fn parse_hex(token: &str) -> Option<Rgba> {
    let digits = token.strip_prefix('#')?;
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&digits[i..i + 1], 16).ok();
    match digits.len() {
        6 => Some(Rgba::opaque(
            u8::from_str_radix(&digits[0..2], 16).ok()?,
            u8::from_str_radix(&digits[2..4], 16).ok()?,
            u8::from_str_radix(&digits[4..6], 16).ok()?,
        )),
        3 => {
            let (r, g, b) = (nibble(0)?, nibble(1)?, nibble(2)?);
            Some(Rgba::opaque(r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

/// `rgb(R,G,B)` / `rgba(R,G,B[,A])` with optional whitespace after commas only.
fn parse_functional(token: &str) -> Option<Rgba> {
    let body = token
        .strip_prefix("rgba(")
        .or_else(|| token.strip_prefix("rgb("))?
        .strip_suffix(')')?;

    let parts: Vec<&str> = body.split(',').collect();
    if parts.len() != 3 && parts.len() != 4 {
        return None;
    }

    let channel = |raw: &str, leading_ws: bool| -> Option<u8> {
        let raw = if leading_ws { raw.trim_start() } else { raw };
        if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        // Over-long digit runs saturate instead of failing.
        Some(raw.parse::<u32>().unwrap_or(u32::MAX).min(255) as u8)
    };

    let r = channel(parts[0], false)?;
    let g = channel(parts[1], true)?;
    let b = channel(parts[2], true)?;
    let a = match parts.get(3) {
        Some(raw) => {
            let raw = raw.trim_start();
            if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit() || b == b'.') {
                return None;
            }
            let value: f64 = raw.parse().ok()?;
            value.clamp(0.0, 1.0)
        }
        None => 1.0,
    };
    Some(Rgba { r, g, b, a })
}

// ============================================================================
// FORMATTING
// ============================================================================

/// `#RRGGBB`, uppercase.
pub fn rgb_to_hex(r: u8, g: u8, b: u8) -> String {
    format!("#{:02X}{:02X}{:02X}", r, g, b)
}

/// `rgba(r, g, b, a)` with the alpha printed as its shortest round-trip decimal.
pub fn format_rgba(r: u8, g: u8, b: u8, a: f64) -> String {
    format!("rgba({}, {}, {}, {})", r, g, b, a)
}

// ============================================================================
// COMPOSITING
// ============================================================================

/// Porter–Duff "over" with straight alpha. `top_opacity` scales the top
/// token's own alpha. Channels are rounded individually after dividing by the
/// output alpha.
pub fn composite(top: &str, bottom: &str, top_opacity: f64) -> String {
    let top = parse(top);
    let bottom = parse(bottom);
    composite_rgba(top, bottom, top_opacity)
}

pub fn composite_rgba(top: Rgba, bottom: Rgba, top_opacity: f64) -> String {
    let top_a = top.a * top_opacity;

    if top_a >= 1.0 {
        return format_rgba(top.r, top.g, top.b, 1.0);
    }

    let out_a = top_a + bottom.a * (1.0 - top_a);
    if out_a == 0.0 {
        return TRANSPARENT.to_string();
    }

    let mix = |t: u8, b: u8| -> u8 {
        let v = (t as f64 * top_a + b as f64 * bottom.a * (1.0 - top_a)) / out_a;
        js_round(v).clamp(0.0, 255.0) as u8
    };

    format_rgba(
        mix(top.r, bottom.r),
        mix(top.g, bottom.g),
        mix(top.b, bottom.b),
        out_a,
    )
}

/// Round half up (towards +inf), matching how the pixel data was authored.
#[inline]
pub(crate) fn js_round(v: f64) -> f64 {
    (v + 0.5).floor()
}
