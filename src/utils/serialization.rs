// Canonical text encoding used for block hashes and transaction signatures.
// The format is written out by hand so the bytes that get hashed never depend
// on how a serde backend chooses to lay things out.

use std::fmt::Write as _;

/// Types with a single, stable text form that both the hashing and the
/// verifying side reproduce byte for byte.
pub trait CanonicalEncode {
    fn write_canonical(&self, out: &mut String);

    fn canonical_string(&self) -> String {
        let mut out = String::new();
        self.write_canonical(&mut out);
        out
    }

    fn canonical_bytes(&self) -> Vec<u8> {
        self.canonical_string().into_bytes()
    }
}

/// Writes `value` as a JSON string literal.
pub fn write_json_string(out: &mut String, value: &str) {
    out.push('"');
    for ch in value.chars() {
        match ch {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => {
                let _ = write!(out, "\\u{:04x}", c as u32);
            }
            c => out.push(c),
        }
    }
    out.push('"');
}

/// Shortest decimal form that round-trips, always with a fractional part or
/// exponent (`1.0`, `0.25`, `1e21`).
pub fn format_amount(value: f64) -> String {
    format!("{value:?}")
}

/// Writes `"key":` for the next object member.
pub fn write_key(out: &mut String, key: &str) {
    write_json_string(out, key);
    out.push(':');
}
