use chrono_tz::{Tz, TZ_VARIANTS};

/// Converts a string containing a Haystack time zone name into the
/// matching `Tz` variant from the chrono_tz crate.
///
/// The name may be a full IANA name (`America/New_York`) or the short
/// Haystack form, which is the last segment of the IANA name
/// (`New_York`). Returns `None` when no zone matches.
pub fn time_zone_by_name<T>(s: T) -> Option<Tz>
where
    T: AsRef<str>,
{
    let matching_tz = TZ_VARIANTS.iter().find(|tz| {
        let full_name = tz.name();
        full_name == s.as_ref() || short_name(tz) == s.as_ref()
    });
    matching_tz.copied()
}

/// Return the short Haystack name for a time zone: the last segment of
/// its IANA name, for example `New_York` for `America/New_York`.
pub fn short_name(tz: &Tz) -> &'static str {
    tz.name()
        .rsplit('/')
        .next()
        .expect("rsplit always yields at least one segment")
}

/// Return the time zone denoted by a bare UTC offset, used when a zinc
/// DateTime literal carries no zone name. Zero maps to UTC and whole
/// hours map to the `Etc/GMT∓h` zones (POSIX sign convention, so an
/// offset of +10:00 is `Etc/GMT-10`). Anything else normalizes to UTC.
pub fn time_zone_for_offset(offset_seconds: i32) -> Tz {
    if offset_seconds == 0 || offset_seconds % 3600 != 0 {
        return Tz::UTC;
    }
    let hours = offset_seconds / 3600;
    let name = if hours > 0 {
        format!("Etc/GMT-{}", hours)
    } else {
        format!("Etc/GMT+{}", -hours)
    };
    name.parse().unwrap_or(Tz::UTC)
}

#[cfg(test)]
mod test {
    use super::{short_name, time_zone_by_name, time_zone_for_offset};
    use chrono_tz::Tz;

    #[test]
    fn short_name_match_works() {
        let tz = time_zone_by_name("Sydney").unwrap();
        assert_eq!(tz, Tz::Australia__Sydney);
        let tz = time_zone_by_name("New_York").unwrap();
        assert_eq!(tz, Tz::America__New_York);
    }

    #[test]
    fn full_name_match_works() {
        let tz = time_zone_by_name("Australia/Sydney").unwrap();
        assert_eq!(tz, Tz::Australia__Sydney);
    }

    #[test]
    fn utc_matches() {
        assert_eq!(time_zone_by_name("UTC").unwrap(), Tz::UTC);
    }

    #[test]
    fn unknown_name_is_none() {
        assert!(time_zone_by_name("Not_A_Zone").is_none());
    }

    #[test]
    fn short_names() {
        assert_eq!(short_name(&Tz::America__New_York), "New_York");
        assert_eq!(short_name(&Tz::UTC), "UTC");
        assert_eq!(short_name(&Tz::America__Indiana__Indianapolis), "Indianapolis");
    }

    #[test]
    fn offsets_map_to_gmt_zones() {
        assert_eq!(time_zone_for_offset(0), Tz::UTC);
        assert_eq!(time_zone_for_offset(10 * 3600), Tz::Etc__GMTMinus10);
        assert_eq!(time_zone_for_offset(-5 * 3600), Tz::Etc__GMTPlus5);
        // Fractional-hour offsets normalize to UTC.
        assert_eq!(time_zone_for_offset(5 * 3600 + 1800), Tz::UTC);
    }

    #[test]
    fn gmt_zone_round_trips_through_short_name() {
        let tz = time_zone_for_offset(10 * 3600);
        assert_eq!(short_name(&tz), "GMT-10");
        assert_eq!(time_zone_by_name("GMT-10").unwrap(), tz);
    }
}
