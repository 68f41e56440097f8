//! UTCTime and GeneralizedTime.
//!
//! This is a private module. Its public items are re-exported by the parent.
//!
//! Both types are encoded as a restricted character string containing the
//! date and time in a fixed textual format. We convert them into a
//! `DateTime<Utc>` from the chrono crate.

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone, Utc};
use crate::decode::ContentError;
use crate::mode::Mode;


//------------ UTCTime -------------------------------------------------------

/// The default latest year a two-digit UTCTime year is mapped to.
///
/// Two digit years from 50 to 99 become 1950 to 1999, years from 00 to 49
/// become 2000 to 2049.
pub const DEFAULT_TWO_DIGIT_YEAR_MAX: u16 = 2049;

/// Parses the content of a UTCTime value.
///
/// The format is `YYMMDDhhmm[ss]` followed by either `Z` or a UTC offset
/// `+hhmm` or `-hhmm`. In CER and DER, the seconds must be present and the
/// time zone must be `Z`.
///
/// The two digit year is mapped into the century that ends with
/// `two_digit_year_max`.
pub fn parse_utc_time(
    content: &[u8], two_digit_year_max: u16, mode: Mode
) -> Result<DateTime<Utc>, ContentError> {
    let mut parser = Parser::new(content);
    let yy = parser.digits(2)?;
    let year = {
        let max = i32::from(two_digit_year_max);
        let candidate = max - max.rem_euclid(100) + yy as i32;
        if candidate > max { candidate - 100 } else { candidate }
    };
    let month = parser.digits(2)?;
    let day = parser.digits(2)?;
    let hour = parser.digits(2)?;
    let minute = parser.digits(2)?;
    let second = if parser.peek_digit() {
        Some(parser.digits(2)?)
    }
    else {
        None
    };
    let offset = parser.zone()?;
    parser.check_end()?;

    if mode.is_restricted() && (second.is_none() || offset != Some(0)) {
        return Err(ContentError::from_static(
            "UTCTime in CER/DER must contain seconds and end in Z"
        ))
    }
    let Some(offset) = offset else {
        return Err(ContentError::from_static("missing time zone in UTCTime"))
    };
    make_time(year, month, day, hour, minute, second.unwrap_or(0), 0, offset)
}


//------------ GeneralizedTime -----------------------------------------------

/// Parses the content of a GeneralizedTime value.
///
/// The format is `YYYYMMDDhh[mm[ss[.f+]]]` followed by either `Z` or a UTC
/// offset. Local time without any time zone information is not supported.
///
/// In CER and DER, minutes and seconds must be present, the time zone must
/// be `Z`, and a fraction must use a full stop and must not end in a zero.
/// If `disallow_fractions` is true, a fraction is an error in any mode.
pub fn parse_generalized_time(
    content: &[u8], disallow_fractions: bool, mode: Mode
) -> Result<DateTime<Utc>, ContentError> {
    let mut parser = Parser::new(content);
    let year = parser.digits(4)? as i32;
    let month = parser.digits(2)?;
    let day = parser.digits(2)?;
    let hour = parser.digits(2)?;
    let minute = if parser.peek_digit() { Some(parser.digits(2)?) } else { None };
    let second = match minute {
        Some(_) if parser.peek_digit() => Some(parser.digits(2)?),
        _ => None,
    };
    let fraction = parser.fraction()?;
    let offset = parser.zone()?;
    parser.check_end()?;

    if let Some(ref fraction) = fraction {
        if disallow_fractions {
            return Err(ContentError::from_static(
                "fractional seconds not allowed"
            ))
        }
        if second.is_none() {
            return Err(ContentError::from_static(
                "fractions of hours or minutes are not supported"
            ))
        }
        if mode.is_restricted() && (
            fraction.comma || fraction.digits.last() == Some(&b'0')
        ) {
            return Err(ContentError::from_static(
                "invalid fraction in CER/DER GeneralizedTime"
            ))
        }
    }
    if mode.is_restricted() && (second.is_none() || offset != Some(0)) {
        return Err(ContentError::from_static(
            "GeneralizedTime in CER/DER must contain seconds and end in Z"
        ))
    }
    let Some(offset) = offset else {
        return Err(ContentError::from_static(
            "local time in GeneralizedTime not supported"
        ))
    };
    let nanos = match fraction {
        Some(fraction) => fraction.nanos()?,
        None => 0,
    };
    make_time(
        year, month, day, hour, minute.unwrap_or(0), second.unwrap_or(0),
        nanos, offset
    )
}


//------------ Helpers -------------------------------------------------------

/// Assembles the components into a UTC time.
///
/// The offset is in minutes east of UTC.
#[allow(clippy::too_many_arguments)]
fn make_time(
    year: i32, month: u32, day: u32,
    hour: u32, minute: u32, second: u32, nanos: u32,
    offset: i32,
) -> Result<DateTime<Utc>, ContentError> {
    let naive = NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|date| date.and_hms_nano_opt(hour, minute, second, nanos))
        .ok_or(ContentError::from_static("invalid date or time"))?;
    let offset = FixedOffset::east_opt(offset * 60)
        .ok_or(ContentError::from_static("invalid time zone offset"))?;
    match offset.from_local_datetime(&naive).single() {
        Some(res) => Ok(res.with_timezone(&Utc)),
        None => Err(ContentError::from_static("invalid date or time")),
    }
}

/// A simple cursor over the octets of a time value.
struct Parser<'a> {
    data: &'a [u8],
}

/// The fractional part of a GeneralizedTime.
struct Fraction<'a> {
    digits: &'a [u8],
    comma: bool,
}

impl<'a> Fraction<'a> {
    fn nanos(&self) -> Result<u32, ContentError> {
        if self.digits.len() > 9 {
            return Err(ContentError::from_static(
                "fraction beyond nanoseconds not supported"
            ))
        }
        let mut res = 0u32;
        for i in 0..9 {
            let digit = self.digits.get(i).map(|x| x - b'0').unwrap_or(0);
            res = res * 10 + u32::from(digit);
        }
        Ok(res)
    }
}

impl<'a> Parser<'a> {
    fn new(data: &'a [u8]) -> Self {
        Parser { data }
    }

    fn peek_digit(&self) -> bool {
        self.data.first().map(u8::is_ascii_digit).unwrap_or(false)
    }

    fn digits(&mut self, len: usize) -> Result<u32, ContentError> {
        let Some(digits) = self.data.get(..len) else {
            return Err(ContentError::from_static("invalid time value"))
        };
        if !digits.iter().all(u8::is_ascii_digit) {
            return Err(ContentError::from_static("invalid time value"))
        }
        self.data = &self.data[len..];
        Ok(digits.iter().fold(0, |res, &x| res * 10 + u32::from(x - b'0')))
    }

    fn fraction(&mut self) -> Result<Option<Fraction<'a>>, ContentError> {
        let comma = match self.data.first() {
            Some(b'.') => false,
            Some(b',') => true,
            _ => return Ok(None)
        };
        let rest = &self.data[1..];
        let len = rest.iter().take_while(|x| x.is_ascii_digit()).count();
        if len == 0 {
            return Err(ContentError::from_static("empty fraction"))
        }
        self.data = &rest[len..];
        Ok(Some(Fraction { digits: &rest[..len], comma }))
    }

    /// Parses the time zone.
    ///
    /// Returns the offset in minutes or `None` if there is none.
    fn zone(&mut self) -> Result<Option<i32>, ContentError> {
        let sign = match self.data.first() {
            Some(b'Z') => {
                self.data = &self.data[1..];
                return Ok(Some(0))
            }
            Some(b'+') => 1,
            Some(b'-') => -1,
            _ => return Ok(None)
        };
        self.data = &self.data[1..];
        let hours = self.digits(2)?;
        let minutes = self.digits(2)?;
        if hours > 23 || minutes > 59 {
            return Err(ContentError::from_static("invalid time zone offset"))
        }
        Ok(Some(sign * (hours * 60 + minutes) as i32))
    }

    fn check_end(&self) -> Result<(), ContentError> {
        if self.data.is_empty() {
            Ok(())
        }
        else {
            Err(ContentError::from_static("trailing data in time value"))
        }
    }
}


//============ Tests =========================================================

#[cfg(test)]
mod test {
    use super::*;
    use chrono::Timelike;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn generalized_time() {
        assert_eq!(
            parse_generalized_time(b"20180806203305Z", true, Mode::Der),
            Ok(utc(2018, 8, 6, 20, 33, 5))
        );
        assert_eq!(
            parse_generalized_time(b"201808062033+0130", false, Mode::Ber),
            Ok(utc(2018, 8, 6, 19, 3, 0))
        );
        assert!(parse_generalized_time(b"201808062033Z", false, Mode::Der)
            .is_err());
        assert!(parse_generalized_time(b"20180806203305", false, Mode::Ber)
            .is_err());
        assert!(parse_generalized_time(b"20181306203305Z", false, Mode::Ber)
            .is_err());
        assert!(parse_generalized_time(b"20180806203305Zx", false, Mode::Ber)
            .is_err());
    }

    #[test]
    fn fractions() {
        let time = parse_generalized_time(
            b"20180806203305.125Z", false, Mode::Der
        ).unwrap();
        assert_eq!(time.nanosecond(), 125_000_000);
        assert!(parse_generalized_time(b"20180806203305.125Z", true, Mode::Ber)
            .is_err());
        assert!(parse_generalized_time(b"20180806203305.120Z", false, Mode::Der)
            .is_err());
        assert!(parse_generalized_time(b"20180806203305,12Z", false, Mode::Der)
            .is_err());
        assert!(parse_generalized_time(b"20180806203305,12Z", false, Mode::Ber)
            .is_ok());
        assert!(parse_generalized_time(b"20180806203305.Z", false, Mode::Ber)
            .is_err());
    }

    #[test]
    fn utc_time() {
        assert_eq!(
            parse_utc_time(b"180806203305Z", 2049, Mode::Der),
            Ok(utc(2018, 8, 6, 20, 33, 5))
        );
        assert_eq!(
            parse_utc_time(b"500806203305Z", 2049, Mode::Der),
            Ok(utc(1950, 8, 6, 20, 33, 5))
        );
        assert_eq!(
            parse_utc_time(b"490806203305Z", 2049, Mode::Der),
            Ok(utc(2049, 8, 6, 20, 33, 5))
        );
        assert_eq!(
            parse_utc_time(b"500806203305Z", 2099, Mode::Der),
            Ok(utc(2050, 8, 6, 20, 33, 5))
        );
        assert_eq!(
            parse_utc_time(b"1808062033-0100", 2049, Mode::Ber),
            Ok(utc(2018, 8, 6, 21, 33, 0))
        );
        assert!(parse_utc_time(b"1808062033Z", 2049, Mode::Der).is_err());
        assert!(parse_utc_time(b"180806203305", 2049, Mode::Ber).is_err());
        assert!(parse_utc_time(b"180806203360Z", 2049, Mode::Ber).is_err());
    }
}
