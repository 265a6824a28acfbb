use crate::error::CovmobError;
use log::error;

/// Longest quadkey that fits the `u32` tile coordinates.
pub const MAX_QUADKEY_LENGTH: usize = 32;

/// Result of a best-effort quadkey decode.
///
/// `x`/`y` hold the bits of every valid digit; `invalid` lists each rejected
/// digit so callers can decide whether the partial result is usable.
#[derive(Debug, Clone, PartialEq)]
pub struct QuadkeyDecode {
    pub x: u32,
    pub y: u32,
    pub invalid: Vec<CovmobError>,
}

impl QuadkeyDecode {
    pub fn is_valid(&self) -> bool {
        self.invalid.is_empty()
    }

    pub fn coordinates(&self) -> (u32, u32) {
        (self.x, self.y)
    }
}

/// Decodes a quadkey into tile grid coordinates, continuing past bad digits.
///
/// Digits are read most significant first: `0` sets nothing, `1` the x bit,
/// `2` the y bit and `3` both. A digit outside `0..=3` is logged and recorded
/// in [`QuadkeyDecode::invalid`], the remaining digits are still applied.
/// Digits beyond [`MAX_QUADKEY_LENGTH`] are reported the same way.
///
/// # Example
/// ```
/// use covmob_rs::quadkey_to_tile_coordinates;
///
/// assert_eq!(quadkey_to_tile_coordinates("13").coordinates(), (3, 1));
/// assert_eq!(quadkey_to_tile_coordinates("").coordinates(), (0, 0));
///
/// let partial = quadkey_to_tile_coordinates("1x3");
/// assert!(!partial.is_valid());
/// assert_eq!(partial.coordinates(), (5, 1));
/// ```
pub fn quadkey_to_tile_coordinates(quadkey: &str) -> QuadkeyDecode {
    let digits: Vec<char> = quadkey.chars().collect();
    let level = digits.len().min(MAX_QUADKEY_LENGTH);
    let mut decoded = QuadkeyDecode {
        x: 0,
        y: 0,
        invalid: Vec::new(),
    };

    for (position, &digit) in digits.iter().enumerate() {
        if position >= MAX_QUADKEY_LENGTH {
            let err = CovmobError::InvalidQuadkeyDigit {
                quadkey: quadkey.to_string(),
                position,
                digit,
            };
            error!("{} (quadkey longer than {} digits)", err, MAX_QUADKEY_LENGTH);
            decoded.invalid.push(err);
            continue;
        }

        let mask = 1u32 << (level - position - 1);
        match digit {
            '0' => {}
            '1' => decoded.x |= mask,
            '2' => decoded.y |= mask,
            '3' => {
                decoded.x |= mask;
                decoded.y |= mask;
            }
            _ => {
                let err = CovmobError::InvalidQuadkeyDigit {
                    quadkey: quadkey.to_string(),
                    position,
                    digit,
                };
                error!("{}", err);
                decoded.invalid.push(err);
            }
        }
    }

    decoded
}

/// Strict variant of [`quadkey_to_tile_coordinates`]: fails on the first invalid digit.
pub fn decode_quadkey(quadkey: &str) -> Result<(u32, u32), CovmobError> {
    let decoded = quadkey_to_tile_coordinates(quadkey);
    match decoded.invalid.into_iter().next() {
        Some(err) => Err(err),
        None => Ok((decoded.x, decoded.y)),
    }
}

/// Encodes tile grid coordinates as a quadkey of length `zoom`.
///
/// Only the lowest `zoom` bits of `x` and `y` are used.
pub fn tile_coordinates_to_quadkey(x: u32, y: u32, zoom: u8) -> Result<String, CovmobError> {
    if zoom as usize > MAX_QUADKEY_LENGTH {
        return Err(CovmobError::InvalidZoomLevel(zoom));
    }

    let mut quadkey = String::with_capacity(zoom as usize);
    for i in (1..=zoom as u32).rev() {
        let mask = 1u32 << (i - 1);
        let mut digit = b'0';
        if x & mask != 0 {
            digit += 1;
        }
        if y & mask != 0 {
            digit += 2;
        }
        quadkey.push(digit as char);
    }
    Ok(quadkey)
}

/// Quadkey of the enclosing tile one zoom level up, `None` at the root.
pub fn parent_quadkey(quadkey: &str) -> Option<&str> {
    if quadkey.is_empty() {
        return None;
    }
    let cut = quadkey.char_indices().last().map(|(i, _)| i)?;
    Some(&quadkey[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_digits() {
        assert_eq!(quadkey_to_tile_coordinates("0").coordinates(), (0, 0));
        assert_eq!(quadkey_to_tile_coordinates("1").coordinates(), (1, 0));
        assert_eq!(quadkey_to_tile_coordinates("2").coordinates(), (0, 1));
        assert_eq!(quadkey_to_tile_coordinates("3").coordinates(), (1, 1));
    }

    #[test]
    fn test_two_digits_match_bit_masks() {
        // '1' sets bit 1 of x, '3' sets bit 0 of x and y
        let expected_x = 0b10 | 0b01;
        let expected_y = 0b01;
        assert_eq!(
            quadkey_to_tile_coordinates("13").coordinates(),
            (expected_x, expected_y)
        );
    }

    #[test]
    fn test_empty_quadkey() {
        let decoded = quadkey_to_tile_coordinates("");
        assert_eq!(decoded.coordinates(), (0, 0));
        assert!(decoded.is_valid());
    }

    #[test]
    fn test_known_bing_tile() {
        // Reference value from the Bing Maps tile system docs
        assert_eq!(quadkey_to_tile_coordinates("213").coordinates(), (3, 5));
    }

    #[test]
    fn test_invalid_digit_is_reported_but_processing_continues() {
        let decoded = quadkey_to_tile_coordinates("3a1");
        assert_eq!(decoded.coordinates(), (0b101, 0b100));
        assert_eq!(decoded.invalid.len(), 1);
        assert!(matches!(
            decoded.invalid[0],
            CovmobError::InvalidQuadkeyDigit {
                position: 1,
                digit: 'a',
                ..
            }
        ));
    }

    #[test]
    fn test_strict_decode() -> Result<(), CovmobError> {
        assert_eq!(decode_quadkey("120")?, (4, 2));
        assert!(decode_quadkey("124").is_err());
        Ok(())
    }

    #[test]
    fn test_encode_decode() -> Result<(), CovmobError> {
        for quadkey in ["0", "3", "120", "1202102332221212", "0313"] {
            let (x, y) = decode_quadkey(quadkey)?;
            let encoded = tile_coordinates_to_quadkey(x, y, quadkey.len() as u8)?;
            assert_eq!(encoded, quadkey);
        }
        assert_eq!(tile_coordinates_to_quadkey(0, 0, 0)?, "");
        Ok(())
    }

    #[test]
    fn test_overlong_quadkey_is_truncated() {
        let quadkey = "1".repeat(MAX_QUADKEY_LENGTH + 2);
        let decoded = quadkey_to_tile_coordinates(&quadkey);
        assert_eq!(decoded.x, u32::MAX);
        assert_eq!(decoded.invalid.len(), 2);
    }

    #[test]
    fn test_parent_quadkey() {
        assert_eq!(parent_quadkey("1202"), Some("120"));
        assert_eq!(parent_quadkey("3"), Some(""));
        assert_eq!(parent_quadkey(""), None);
    }
}
