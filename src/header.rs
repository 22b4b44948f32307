use chrono::{DateTime, FixedOffset};
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::Level;

use crate::stamp::{append_stamp, StampFlags};

/// Formats the `<timestamp> <level> ` prefix of a rendered line.
///
/// The level column adapts to the widest label this instance has seen so
/// far, so columns stay aligned once a longer label shows up. The width
/// cache is an atomic owned by the header; concurrent renders race to
/// extend it safely and the observed width never shrinks.
#[derive(Debug)]
pub struct Header {
    flags: StampFlags,
    level_width: AtomicUsize,
}

impl Header {
    pub fn new(flags: StampFlags) -> Self {
        Header {
            flags,
            level_width: AtomicUsize::new(0),
        }
    }

    /// Append `<stamp> <padded level> ` to `buf`.
    pub fn append(&self, buf: &mut String, time: &DateTime<FixedOffset>, level: Level) {
        append_stamp(buf, time, self.flags);
        buf.push(' ');
        let label = level.as_str();
        let width = self
            .level_width
            .fetch_max(label.len(), Ordering::Relaxed)
            .max(label.len());
        buf.push_str(label);
        for _ in label.len()..width {
            buf.push(' ');
        }
        buf.push(' ');
    }
}

impl Default for Header {
    fn default() -> Self {
        Header::new(StampFlags::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn at() -> DateTime<FixedOffset> {
        Utc.with_ymd_and_hms(2023, 5, 4, 20, 30, 40)
            .unwrap()
            .fixed_offset()
    }

    #[test]
    fn default_header_is_stamp_space_level_space() {
        let header = Header::default();
        let mut buf = String::new();
        header.append(&mut buf, &at(), Level::INFO);
        assert_eq!(buf, "May 04 20:30:40 INFO ");
    }

    #[test]
    fn level_column_widens_and_stays_wide() {
        let header = Header::new(StampFlags::empty());
        let mut buf = String::new();
        header.append(&mut buf, &at(), Level::INFO);
        assert_eq!(buf, "20:30:40 INFO ");

        buf.clear();
        header.append(&mut buf, &at(), Level::ERROR);
        assert_eq!(buf, "20:30:40 ERROR ");

        buf.clear();
        header.append(&mut buf, &at(), Level::INFO);
        assert_eq!(buf, "20:30:40 INFO  ", "padded to the widest label seen");
    }
}
