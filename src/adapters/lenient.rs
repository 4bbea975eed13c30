use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::debug;

//NOTE: Optional provider fields of the wrong type read as absent instead of failing the whole record

pub(crate) fn integer<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    let parsed = match &value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None
    };

    if parsed.is_none() && !value.is_null() {
        debug!("Ignoring non-integer value [{value}]");
    }

    Ok(parsed)
}

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    let parsed = match &value {
        Value::Bool(flag) => Some(*flag),
        Value::Number(number) => number.as_i64().and_then(|number| match number {
            0 => Some(false),
            1 => Some(true),
            _ => None
        }),
        Value::String(text) => match text.trim().to_lowercase().as_str() {
            "true" | "1" | "sim" | "s" | "yes" | "y" => Some(true),
            "false" | "0" | "nao" | "não" | "n" | "no" => Some(false),
            _ => None
        },
        _ => None
    };

    if parsed.is_none() && !value.is_null() {
        debug!("Ignoring non-boolean value [{value}]");
    }

    Ok(parsed)
}

/// Accepts numbers and booleans as text, for identifiers some providers send unquoted.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;

    let parsed = match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => None,
        other => {
            debug!("Ignoring non-text value [{other}]");
            None
        }
    };

    Ok(parsed)
}
