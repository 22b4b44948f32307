use chrono::SecondsFormat;
use std::fmt::Write;

use crate::error::RenderError;
use crate::record::Value;
use crate::stamp::{append_stamp, StampFlags};

/// How `Value::Time` attributes are rendered inline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeStyle {
    /// RFC 3339 with as many fractional digits as the value carries,
    /// `2023-05-04T20:30:40Z` for a whole second in UTC.
    #[default]
    Rfc3339,
    /// The compact header stamp under the given flags.
    Stamp(StampFlags),
}

/// Renders one [`Value`] by kind into a text buffer.
///
/// Strings are written raw without quoting or escaping, scalars in their
/// canonical `Display` form, groups recursively as `[k1=v1 k2=v2]`. Only an
/// opaque value whose [`crate::record::MarshalText`] capability fails can
/// make rendering fail.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueFormatter {
    pub time_style: TimeStyle,
}

impl ValueFormatter {
    pub fn append_value(&self, buf: &mut String, value: &Value) -> Result<(), RenderError> {
        match value {
            Value::Str(s) => buf.push_str(s),
            Value::Int(i) => {
                let _ = write!(buf, "{i}");
            }
            Value::Float(f) => {
                let _ = write!(buf, "{f}");
            }
            Value::Bool(b) => buf.push_str(if *b { "true" } else { "false" }),
            Value::Time(t) => match self.time_style {
                TimeStyle::Rfc3339 => {
                    buf.push_str(&t.to_rfc3339_opts(SecondsFormat::AutoSi, true))
                }
                TimeStyle::Stamp(flags) => append_stamp(buf, t, flags),
            },
            Value::Group(members) => {
                buf.push('[');
                for (i, attr) in members.iter().enumerate() {
                    if i > 0 {
                        buf.push(' ');
                    }
                    buf.push_str(&attr.key);
                    buf.push('=');
                    self.append_value(buf, &attr.value)?;
                }
                buf.push(']');
            }
            Value::Other(m) => {
                let text = m.marshal_text().map_err(RenderError::Marshal)?;
                buf.push_str(&text);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Attr, MarshalText};
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn render(fmt: &ValueFormatter, value: &Value) -> String {
        let mut buf = String::new();
        fmt.append_value(&mut buf, value).unwrap();
        buf
    }

    #[test]
    fn renders_scalars_in_canonical_form() {
        let fmt = ValueFormatter::default();
        assert_eq!(render(&fmt, &Value::Str("no \"escaping\"".into())), "no \"escaping\"");
        assert_eq!(render(&fmt, &Value::Int(-4711)), "-4711");
        assert_eq!(render(&fmt, &Value::Float(3.14159)), "3.14159");
        assert_eq!(render(&fmt, &Value::Bool(false)), "false");
    }

    #[test]
    fn renders_nested_groups_space_separated() {
        let fmt = ValueFormatter::default();
        let group = Value::Group(vec![
            Attr::new("foo", true),
            Attr::new("nested", vec![Attr::new("bar", 4711)]),
            Attr::new("baz", 3.14159),
        ]);
        assert_eq!(render(&fmt, &group), "[foo=true nested=[bar=4711] baz=3.14159]");
    }

    #[test]
    fn time_style_picks_the_rendering() {
        let t = Utc.with_ymd_and_hms(2023, 5, 4, 20, 30, 40).unwrap();
        let rfc = ValueFormatter::default();
        assert_eq!(render(&rfc, &t.into()), "2023-05-04T20:30:40Z");
        let stamp = ValueFormatter {
            time_style: TimeStyle::Stamp(StampFlags::DATE | StampFlags::YEAR),
        };
        assert_eq!(render(&stamp, &t.into()), "2023 May 04 20:30:40");
    }

    #[derive(Debug)]
    struct Opaque;

    impl MarshalText for Opaque {}

    #[derive(Debug)]
    struct Broken;

    impl MarshalText for Broken {
        fn marshal_text(&self) -> Result<String, Box<dyn std::error::Error + Send + Sync>> {
            Err("no text form".into())
        }
    }

    #[test]
    fn opaque_values_default_to_their_debug_form() {
        let fmt = ValueFormatter::default();
        assert_eq!(render(&fmt, &Value::Other(Box::new(Opaque))), "Opaque");
    }

    #[test]
    fn marshal_failure_propagates() {
        let fmt = ValueFormatter::default();
        let mut buf = String::new();
        let err = fmt
            .append_value(&mut buf, &Value::Other(Box::new(Broken)))
            .unwrap_err();
        assert!(matches!(err, RenderError::Marshal(_)));
    }
}
