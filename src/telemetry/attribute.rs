//! Key-value attributes attached to metrics, spans and span events.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

/// Attribute value.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(Arc<str>),
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{v}"),
            AttrValue::Int(v) => write!(f, "{v}"),
            AttrValue::Str(v) => write!(f, "{v:?}"),
        }
    }
}

/// A named attribute.
///
/// ```
/// use funcy::telemetry::{AttrValue, KeyValue};
///
/// let kv = KeyValue::bool("error", true);
/// assert_eq!(kv.key, "error");
/// assert_eq!(kv.value, AttrValue::Bool(true));
/// ```
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyValue {
    pub key: Cow<'static, str>,
    pub value: AttrValue,
}

impl KeyValue {
    pub fn bool(key: impl Into<Cow<'static, str>>, value: bool) -> Self {
        Self {
            key: key.into(),
            value: AttrValue::Bool(value),
        }
    }

    pub fn int(key: impl Into<Cow<'static, str>>, value: i64) -> Self {
        Self {
            key: key.into(),
            value: AttrValue::Int(value),
        }
    }

    pub fn string(key: impl Into<Cow<'static, str>>, value: impl Into<Arc<str>>) -> Self {
        Self {
            key: key.into(),
            value: AttrValue::Str(value.into()),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.key, self.value)
    }
}

/// Renders attributes as `k1=v1 k2=v2` for log fields.
pub(crate) fn render(attrs: &[KeyValue]) -> String {
    attrs
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Returns the value of `key` in `attrs`, if present.
pub fn find<'a>(attrs: &'a [KeyValue], key: &str) -> Option<&'a AttrValue> {
    attrs.iter().find(|kv| kv.key == key).map(|kv| &kv.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_quotes_strings_only() {
        let attrs = [
            KeyValue::int("num", 3),
            KeyValue::bool("error", false),
            KeyValue::string("routine.name", "worker"),
        ];
        assert_eq!(render(&attrs), r#"num=3 error=false routine.name="worker""#);
        assert_eq!(find(&attrs, "num"), Some(&AttrValue::Int(3)));
        assert_eq!(find(&attrs, "missing"), None);
    }
}
