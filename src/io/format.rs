// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Number and color text forms used by the interchange file

/// Six decimal places, never `-0.000000`
pub fn format_value(value: f64) -> String {
    let text = format!("{:.6}", value);
    match text.strip_prefix('-') {
        Some(rest) if rest.bytes().all(|b| b == b'0' || b == b'.') => rest.to_string(),
        _ => text,
    }
}

/// Two decimal places, as used for fixed header and property values
pub fn format_short(value: f64) -> String {
    format!("{:.2}", value)
}

/// Shortest round-trip form with at least one decimal, e.g. `20.0`, `-5.5`
pub fn format_temperature(value: f64) -> String {
    format!("{:?}", value)
}

/// Parse `0xRRGGBB` into unit RGB components
pub fn parse_rgb_hex(text: &str) -> Option<[f32; 3]> {
    let hex = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('#'))?;
    if hex.len() != 6 {
        return None;
    }
    let value = u32::from_str_radix(hex, 16).ok()?;
    let channel = |shift: u32| ((value >> shift) & 0xFF) as f32 / 255.0;
    Some([channel(16), channel(8), channel(0)])
}
