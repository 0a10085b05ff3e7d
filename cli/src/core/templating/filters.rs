//! Text transforms registered on every blueprint's Tera instance.
//!
//! Case conversions split their input into words on any non-alphanumeric
//! character and on lower-to-upper transitions, so `my-app`, `my_app`,
//! `MyApp` and `myApp` all convert the same way.
//!
//! `default_if_empty` replaces a blank string, an empty list or `null`.
//! For a variable that was never set at all, use Tera's own `default`
//! filter, which is the only filter allowed on undefined values.

use std::collections::HashMap;
use tera::{Tera, Value};

pub fn register(tera: &mut Tera) {
    tera.register_filter("snake_case", snake_case);
    tera.register_filter("kebab_case", kebab_case);
    tera.register_filter("camel_case", camel_case);
    tera.register_filter("pascal_case", pascal_case);
    tera.register_filter("default_if_empty", default_if_empty);
}

fn words(input: &str) -> Vec<String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut prev: Option<char> = None;

    for c in input.chars() {
        if !c.is_alphanumeric() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev = None;
            continue;
        }
        if let Some(p) = prev {
            if c.is_uppercase() && (p.is_lowercase() || p.is_ascii_digit()) && !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
        prev = Some(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

pub fn to_snake_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

pub fn to_kebab_case(input: &str) -> String {
    words(input)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("-")
}

pub fn to_camel_case(input: &str) -> String {
    words(input)
        .iter()
        .enumerate()
        .map(|(i, w)| if i == 0 { w.to_lowercase() } else { capitalize(w) })
        .collect()
}

pub fn to_pascal_case(input: &str) -> String {
    words(input).iter().map(|w| capitalize(w)).collect()
}

fn text<'a>(filter: &str, value: &'a Value) -> tera::Result<&'a str> {
    value.as_str().ok_or_else(|| {
        tera::Error::msg(format!(
            "Filter `{}` was used on a value that is not a string: {}",
            filter, value
        ))
    })
}

fn snake_case(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_snake_case(text("snake_case", value)?)))
}

fn kebab_case(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_kebab_case(text("kebab_case", value)?)))
}

fn camel_case(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_camel_case(text("camel_case", value)?)))
}

fn pascal_case(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    Ok(Value::String(to_pascal_case(text("pascal_case", value)?)))
}

fn default_if_empty(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let fallback = args.get("value").ok_or_else(|| {
        tera::Error::msg("Filter `default_if_empty` expected an arg called `value`")
    })?;
    let empty = match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    Ok(if empty { fallback.clone() } else { value.clone() })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_case_conversions() {
        assert_eq!(to_snake_case("my-awesome-app"), "my_awesome_app");
        assert_eq!(to_snake_case("MyService"), "my_service");
        assert_eq!(to_kebab_case("user_profile Api"), "user-profile-api");
        assert_eq!(to_camel_case("my-awesome-app"), "myAwesomeApp");
        assert_eq!(to_camel_case("UserID"), "userId");
        assert_eq!(to_pascal_case("user_id"), "UserId");
        assert_eq!(to_pascal_case("order2Go"), "Order2Go");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn test_default_if_empty() {
        let mut args = HashMap::new();
        args.insert("value".to_string(), json!("fallback"));

        assert_eq!(default_if_empty(&json!(""), &args).unwrap(), json!("fallback"));
        assert_eq!(default_if_empty(&json!("  "), &args).unwrap(), json!("fallback"));
        assert_eq!(default_if_empty(&json!([]), &args).unwrap(), json!("fallback"));
        assert_eq!(default_if_empty(&json!("set"), &args).unwrap(), json!("set"));
        assert_eq!(default_if_empty(&json!(false), &args).unwrap(), json!(false));
        assert!(default_if_empty(&json!(""), &HashMap::new()).is_err());
    }

    #[test]
    fn test_case_filter_rejects_non_strings() {
        assert!(snake_case(&json!(42), &HashMap::new()).is_err());
    }
}
