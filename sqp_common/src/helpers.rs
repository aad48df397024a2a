use std::str::FromStr;

/// Parse a boolean flag from a string value, or return the given default value otherwise.
pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let value = match value {
        Some(v) => v,
        None => return default,
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Parse an optional setting. Missing and blank values are `Ok(None)`, so callers can tell "not set" from "set to
/// garbage" and log accordingly.
pub fn parse_setting<T: FromStr>(value: Option<String>) -> Result<Option<T>, T::Err> {
    match value.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => s.parse::<T>().map(Some),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn boolean_flags() {
        assert!(parse_boolean_flag(Some(" Yes ".into()), false));
        assert!(!parse_boolean_flag(Some("off".into()), true));
        assert!(parse_boolean_flag(Some("maybe".into()), true));
        assert!(!parse_boolean_flag(None, false));
    }

    #[test]
    fn settings() {
        assert_eq!(parse_setting::<u16>(Some("8080".into())), Ok(Some(8080)));
        assert_eq!(parse_setting::<u16>(Some("  ".into())), Ok(None));
        assert_eq!(parse_setting::<u16>(None), Ok(None));
        assert!(parse_setting::<u16>(Some("eighty".into())).is_err());
        assert!(parse_setting::<u16>(Some("-1".into())).is_err());
    }
}
