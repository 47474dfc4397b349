//! Alpha-5 catalog numbers.
//!
//! Catalog numbers from 100000 through 339999 do not fit the five TLE columns, so the
//! leading two digits are replaced by a letter: A=10 .. Z=33, skipping I and O.

use crate::errors::{malformed, Result};

pub const MAX_ALPHA5: u32 = 339_999;

/// Encode a catalog number into its five-column form.
pub fn to_alpha5(n: u32) -> Result<String> {
    if n < 100_000 {
        return Ok(format!("{n:05}"));
    }
    if n > MAX_ALPHA5 {
        return Err(malformed!("catalog number {n} exceeds {MAX_ALPHA5} ('Z9999')"));
    }

    let mut code = (n / 10_000) as u8 + b'A' - 10;
    if code >= b'I' {
        code += 1;
    }
    if code >= b'O' {
        code += 1;
    }
    Ok(format!("{}{:04}", code as char, n % 10_000))
}

/// Decode a five-column catalog number, plain digits or Alpha-5.
pub fn from_alpha5(s: &str) -> Result<u32> {
    let s = s.trim();
    let Some(first) = s.chars().next() else {
        return Err(malformed!("empty catalog number"));
    };

    if !first.is_ascii_alphabetic() {
        return s.parse::<u32>().map_err(|e| malformed!("catalog number '{s}': {e}"));
    }

    let c = first.to_ascii_uppercase();
    if c == 'I' || c == 'O' {
        return Err(malformed!("catalog number '{s}' uses reserved letter {c}"));
    }
    let mut n = (c as u8 - b'A') as u32 + 10;
    if c > 'I' {
        n -= 1;
    }
    if c > 'O' {
        n -= 1;
    }

    let rest = &s[1..];
    if rest.len() != 4 || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return Err(malformed!("catalog number '{s}' is not a valid Alpha-5 number"));
    }
    let suffix: u32 = rest.parse().map_err(|e| malformed!("catalog number '{s}': {e}"))?;

    Ok(n * 10_000 + suffix)
}
