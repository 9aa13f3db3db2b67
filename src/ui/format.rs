use chrono::{DateTime, Duration, Local, TimeZone, Utc};

/// Label shown under a message: clock time for the last day, the weekday for
/// the last week, otherwise month and day.
pub fn format_time(sent: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    format_time_in(sent, now, &Local)
}

pub fn format_time_in<Tz: TimeZone>(
    sent: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    tz: &Tz,
) -> String
where
    Tz::Offset: std::fmt::Display,
{
    let Some(sent) = sent else {
        return String::new();
    };
    let age = now.signed_duration_since(sent);
    let local = sent.with_timezone(tz);

    if age < Duration::hours(24) {
        local.format("%H:%M").to_string()
    } else if age < Duration::days(7) {
        local.format("%a").to_string()
    } else {
        local.format("%b %-d").to_string()
    }
}

/// Upper-cased first letter of a name, for the avatar chip.
pub fn initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}
