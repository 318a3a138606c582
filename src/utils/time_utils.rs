use chrono::{DateTime, Local, SecondsFormat, Utc};

// Everything is stored as unix timestamps (seconds) in the
// database, which is what SQLite fits into naturally. The API
// speaks RFC 3339 though.
const DATE_FORMAT_USCOMPACT: &'static str = "%Y-%m-%d";

pub enum DateFormat {
  Rfc3339,
  USCompact,
}

pub fn timestamp_to_date_string(timestamp: i64, format: DateFormat) -> String {
  // Out of range timestamps are silently replaced by the epoch,
  // they can't come out of our own database anyway.
  let d = DateTime::<Utc>::from_timestamp(timestamp, 0)
    .unwrap_or_default();
  match format {
    DateFormat::Rfc3339 => d.to_rfc3339_opts(SecondsFormat::Secs, true),
    DateFormat::USCompact => d.format(DATE_FORMAT_USCOMPACT).to_string()
  }
}

pub fn timestamp_to_rfc3339(timestamp: i64) -> String {
  timestamp_to_date_string(timestamp, DateFormat::Rfc3339)
}

pub fn current_timestamp() -> i64 {
  Local::now().timestamp()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn timestamp_formats_as_rfc3339_utc() {
    let timestamp: i64 = 1615150740;
    assert_eq!("2021-03-07T20:59:00Z", timestamp_to_rfc3339(timestamp));
  }

  #[test]
  fn timestamp_formats_as_us_compact() {
    let result = timestamp_to_date_string(1615150740, DateFormat::USCompact);
    assert_eq!("2021-03-07", result);
  }
}
