//! Parsing and canonical formatting of elapsed process time

use process_usage::process_time::{ProcessTime, SECONDS_PER_DAY};

fn canonical(text: &str) -> String {
    ProcessTime::parse(text).unwrap().to_string()
}

#[test]
fn test_time_without_days() {
    assert_eq!(canonical("10:23:04"), "10:23:04");
}

#[test]
fn test_time_with_days() {
    let time = ProcessTime::parse("2-43:23:04").unwrap();
    assert_eq!(time.as_seconds(), 3 * SECONDS_PER_DAY + 19 * 3600 + 23 * 60 + 4);
    assert_eq!(time.to_string(), "3 days, 19:23:04");
}

#[test]
fn test_time_without_days_over_24_hours() {
    assert_eq!(canonical("43:23:04"), "1 day, 19:23:04");
}

#[test]
fn test_day_prefix_and_hours_are_additive() {
    // the day prefix does not bound the hours field, both are summed
    let time = ProcessTime::parse("1-124:12:32").unwrap();
    assert_eq!(
        time,
        ProcessTime::from_components(1, 124, 12, 32).unwrap()
    );
    assert_eq!(time.to_string(), "6 days, 4:12:32");

    let time = ProcessTime::parse("124:12:32").unwrap();
    assert_eq!(
        time,
        ProcessTime::from_components(0, 124, 12, 32).unwrap()
    );
}

#[test]
fn test_ps_dot_separator() {
    assert_eq!(canonical("0:01.17"), "0:01:17");
    assert_eq!(canonical("12-1:05.09"), "12 days, 1:05:09");
}

#[test]
fn test_round_trip_below_one_day() {
    for text in ["0:00:00", "0:00:59", "1:02:03", "9:59:59", "23:59:59", "007:00:00"] {
        let time = ProcessTime::parse(text).unwrap();
        let expected = if text == "007:00:00" { "7:00:00" } else { text };
        assert_eq!(time.to_string(), expected, "round trip of {text}");
    }
}

#[test]
fn test_canonical_form_is_accepted() {
    for text in ["1 day, 19:23:04", "3 days, 19:23:04", "10 days, 0:00:01"] {
        assert_eq!(canonical(text), text);
    }
}

#[test]
fn test_invalid_inputs() {
    for text in [
        "abc",
        "",
        "12:3:04",
        "1234:00:00",
        "10:23",
        "-1:00:00",
        "a-10:00:00",
        "10:23:04 ",
        " 10:23:04",
        "10:23,04",
        "1 day 19:23:04",
    ] {
        let err = ProcessTime::parse(text).unwrap_err();
        assert_eq!(err.text, text);
        assert_eq!(err.pid, None);
    }
}

#[test]
fn test_day_overflow_is_a_parse_error() {
    assert!(ProcessTime::parse("999999999999999999999-00:00:00").is_err());
    assert!(ProcessTime::parse("999999999999999-00:00:00").is_err());
}

#[test]
fn test_from_std_duration_truncates() {
    let time = ProcessTime::from(std::time::Duration::from_millis(90_999));
    assert_eq!(time.as_seconds(), 90);
    assert_eq!(time.to_string(), "0:01:30");
}

#[test]
fn test_serde() {
    let time: ProcessTime = serde_json::from_str("\"2-43:23:04\"").unwrap();
    assert_eq!(
        serde_json::to_string(&time).unwrap(),
        "\"3 days, 19:23:04\""
    );
    assert!(serde_json::from_str::<ProcessTime>("\"nope\"").is_err());
}
