//! Query parameter binding.
//!
//! ClickHouse binds `{name:Type}` placeholders server-side from `param_<name>`
//! form fields whose values are written in the server's literal syntax.
//! A top-level string is sent as-is because the declared type already tells
//! the server how to read it; anything nested inside a tuple, map or array has
//! to be self-delimiting, so nested strings are quoted.

use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{self, Display, Write as _};

/// A value that can be bound to a named query parameter.
///
/// # Examples
///
/// ```rust
/// use clickhouse_link::{bind, ParamValue};
///
/// assert_eq!(bind(&ParamValue::from((1, 2, 3)), false), "(1, 2, 3)");
/// assert_eq!(bind(&ParamValue::from(vec!["a", "b"]), false), "['a', 'b']");
/// assert_eq!(bind(&ParamValue::from("plain"), false), "plain");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(String),
    /// Fixed-arity heterogeneous sequence, written as `(a, b)`
    Tuple(Vec<ParamValue>),
    /// Key/value pairs in caller order, written as `{k:v}`
    Map(Vec<(ParamValue, ParamValue)>),
    /// Homogeneous sequence, written as `[a, b]`
    Array(Vec<ParamValue>),
    /// Pre-rendered scalar emitted verbatim at any depth
    Other(String),
}

impl ParamValue {
    /// Wrap any displayable scalar (dates, decimals, UUIDs...) as a raw literal.
    pub fn display(value: impl Display) -> Self {
        Self::Other(value.to_string())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }
}

/// Render `value` as a ClickHouse literal.
///
/// `quote_strings` controls only how *this* value is written when it is a
/// string; every nested element is always bound with quoting enabled.
/// Nulls, booleans and numbers are never quoted.
pub fn bind(value: &ParamValue, quote_strings: bool) -> String {
    let mut out = String::new();
    write_literal(&mut out, value, quote_strings);
    out
}

fn write_literal(out: &mut String, value: &ParamValue, quote_strings: bool) {
    match value {
        ParamValue::Null => out.push_str("NULL"),
        ParamValue::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        ParamValue::Int(i) => {
            let _ = write!(out, "{}", i);
        }
        ParamValue::UInt(u) => {
            let _ = write!(out, "{}", u);
        }
        ParamValue::Float(f) => write_float(out, *f),
        ParamValue::String(s) if quote_strings => write_quoted(out, s),
        ParamValue::String(s) => out.push_str(s),
        ParamValue::Tuple(items) => write_sequence(out, '(', ')', items),
        ParamValue::Array(items) => write_sequence(out, '[', ']', items),
        ParamValue::Map(pairs) => {
            out.push('{');
            for (i, (key, val)) in pairs.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_literal(out, key, true);
                out.push(':');
                write_literal(out, val, true);
            }
            out.push('}');
        }
        ParamValue::Other(raw) => out.push_str(raw),
    }
}

fn write_sequence(out: &mut String, open: char, close: char, items: &[ParamValue]) {
    out.push(open);
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        write_literal(out, item, true);
    }
    out.push(close);
}

fn write_float(out: &mut String, f: f64) {
    if f.is_nan() {
        out.push_str("nan");
    } else if f.is_infinite() {
        out.push_str(if f > 0.0 { "inf" } else { "-inf" });
    } else {
        let _ = write!(out, "{}", f);
    }
}

fn write_quoted(out: &mut String, s: &str) {
    out.push('\'');
    for c in s.chars() {
        if c == '\\' || c == '\'' {
            out.push('\\');
        }
        out.push(c);
    }
    out.push('\'');
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bind(self, false))
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                Self::Int(value as i64)
            }
        })*
    };
}

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(impl From<$t> for ParamValue {
            fn from(value: $t) -> Self {
                Self::UInt(value as u64)
            }
        })*
    };
}

impl_from_signed!(i8, i16, i32, i64, isize);
impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for ParamValue {
    fn from(value: f32) -> Self {
        // widen through the shortest decimal form so 0.1f32 binds as 0.1
        Self::Float(
            value
                .to_string()
                .parse()
                .unwrap_or_else(|_| f64::from(value)),
        )
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

impl From<&String> for ParamValue {
    fn from(value: &String) -> Self {
        Self::String(value.clone())
    }
}

impl<T: Into<ParamValue>> From<Option<T>> for ParamValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<ParamValue>> From<Vec<T>> for ParamValue {
    fn from(value: Vec<T>) -> Self {
        Self::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ParamValue> + Clone> From<&[T]> for ParamValue {
    fn from(value: &[T]) -> Self {
        Self::Array(value.iter().cloned().map(Into::into).collect())
    }
}

impl<K: Into<ParamValue>, V: Into<ParamValue>> From<BTreeMap<K, V>> for ParamValue {
    fn from(value: BTreeMap<K, V>) -> Self {
        Self::Map(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K: Into<ParamValue>, V: Into<ParamValue>, S> From<HashMap<K, V, S>> for ParamValue {
    fn from(value: HashMap<K, V, S>) -> Self {
        Self::Map(value.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

macro_rules! impl_from_tuple {
    ($($name:ident),+) => {
        impl<$($name: Into<ParamValue>),+> From<($($name,)+)> for ParamValue {
            #[allow(non_snake_case)]
            fn from(($($name,)+): ($($name,)+)) -> Self {
                Self::Tuple(vec![$($name.into()),+])
            }
        }
    };
}

impl_from_tuple!(A);
impl_from_tuple!(A, B);
impl_from_tuple!(A, B, C);
impl_from_tuple!(A, B, C, D);
impl_from_tuple!(A, B, C, D, E);
impl_from_tuple!(A, B, C, D, E, F);

impl From<JsonValue> for ParamValue {
    fn from(value: JsonValue) -> Self {
        match value {
            JsonValue::Null => Self::Null,
            JsonValue::Bool(b) => Self::Bool(b),
            JsonValue::Number(n) => {
                if let Some(u) = n.as_u64() {
                    Self::UInt(u)
                } else if let Some(i) = n.as_i64() {
                    Self::Int(i)
                } else {
                    Self::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            JsonValue::String(s) => Self::String(s),
            JsonValue::Array(items) => Self::Array(items.into_iter().map(Into::into).collect()),
            JsonValue::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (Self::String(k), v.into()))
                    .collect(),
            ),
        }
    }
}

/// Named parameters for a query, kept in insertion order.
///
/// Names are unique: inserting an existing name replaces its value in place.
///
/// ```rust
/// use clickhouse_link::QueryParams;
///
/// let params = QueryParams::new().with("i", 10).with("s", "10");
/// let fields: Vec<_> = params.form_fields().collect();
/// assert_eq!(fields[0], ("param_i".to_string(), "10".to_string()));
/// assert_eq!(fields[1], ("param_s".to_string(), "10".to_string()));
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryParams {
    entries: Vec<(String, ParamValue)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`QueryParams::insert`]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.insert(name, value);
        self
    }

    /// Set a parameter, returning the previous value bound to `name`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<ParamValue>,
    ) -> Option<ParamValue> {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => Some(std::mem::replace(existing, value)),
            None => {
                self.entries.push((name, value));
                None
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    /// `param_<name>` form fields with top-level (unquoted) literals.
    pub fn form_fields(&self) -> impl Iterator<Item = (String, String)> + '_ {
        self.entries
            .iter()
            .map(|(name, value)| (format!("param_{}", name), bind(value, false)))
    }
}

impl<K: Into<String>, V: Into<ParamValue>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            params.insert(name, value);
        }
        params
    }
}

impl<K: Into<String>, V: Into<ParamValue>, const N: usize> From<[(K, V); N]> for QueryParams {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_scalars_are_never_quoted() {
        assert_eq!(bind(&ParamValue::Null, false), "NULL");
        assert_eq!(bind(&ParamValue::Null, true), "NULL");
        assert_eq!(bind(&true.into(), true), "true");
        assert_eq!(bind(&false.into(), false), "false");
        assert_eq!(bind(&(-42i32).into(), true), "-42");
        assert_eq!(bind(&u64::MAX.into(), true), "18446744073709551615");
        assert_eq!(bind(&1.5f64.into(), true), "1.5");
    }

    #[test]
    fn test_non_finite_floats() {
        assert_eq!(bind(&f64::NAN.into(), false), "nan");
        assert_eq!(bind(&f64::INFINITY.into(), false), "inf");
        assert_eq!(bind(&f64::NEG_INFINITY.into(), false), "-inf");
    }

    #[test]
    fn test_f32_binds_shortest_decimal() {
        assert_eq!(bind(&0.1f32.into(), false), "0.1");
        assert_eq!(bind(&ParamValue::from(vec![1.5f32, -2.25f32]), false), "[1.5, -2.25]");
        assert_eq!(bind(&f32::NAN.into(), false), "nan");
        assert_eq!(bind(&f32::NEG_INFINITY.into(), false), "-inf");
    }

    #[test]
    fn test_string_quoting_depends_on_depth() {
        let value = ParamValue::from("abc");
        assert_eq!(bind(&value, false), "abc");
        assert_eq!(bind(&value, true), "'abc'");
        assert_eq!(bind(&ParamValue::from(("abc",)), false), "('abc')");
    }

    #[test]
    fn test_top_level_string_is_verbatim() {
        let value = ParamValue::from("it's a \\ test");
        assert_eq!(bind(&value, false), "it's a \\ test");
    }

    #[test]
    fn test_nested_string_escapes_quote_and_backslash() {
        let value = ParamValue::from(vec!["it's", "a\\b"]);
        assert_eq!(bind(&value, false), r"['it\'s', 'a\\b']");
    }

    #[test]
    fn test_tuple() {
        assert_eq!(bind(&(1, 2, 3).into(), false), "(1, 2, 3)");
        assert_eq!(bind(&("a", "b").into(), false), "('a', 'b')");
        assert_eq!(bind(&(1, "x", None::<i32>, true).into(), false), "(1, 'x', NULL, true)");
    }

    #[test]
    fn test_map_keeps_caller_order() {
        let value = ParamValue::Map(vec![
            ("b".into(), 2.into()),
            ("a".into(), 1.into()),
        ]);
        assert_eq!(bind(&value, false), "{'b':2, 'a':1}");

        let mut sorted = BTreeMap::new();
        sorted.insert("a", 1);
        assert_eq!(bind(&sorted.into(), false), "{'a':1}");
    }

    #[test]
    fn test_array_and_nesting() {
        let value = ParamValue::from(vec![vec![1, 2], vec![]]);
        assert_eq!(bind(&value, false), "[[1, 2], []]");

        let value = ParamValue::Array(vec![
            ParamValue::from(("k", vec![1.5])),
            ParamValue::Null,
        ]);
        assert_eq!(bind(&value, false), "[('k', [1.5]), NULL]");

        let mut inner = BTreeMap::new();
        inner.insert("x", vec!["y"]);
        assert_eq!(bind(&inner.into(), false), "{'x':['y']}");
    }

    #[test]
    fn test_empty_compounds() {
        assert_eq!(bind(&ParamValue::Tuple(vec![]), false), "()");
        assert_eq!(bind(&ParamValue::Map(vec![]), false), "{}");
        assert_eq!(bind(&ParamValue::Array(vec![]), false), "[]");
    }

    #[test]
    fn test_other_is_emitted_verbatim_at_any_depth() {
        let value = ParamValue::display("toDate('2024-01-01')");
        assert_eq!(bind(&value, false), "toDate('2024-01-01')");
        assert_eq!(bind(&ParamValue::Array(vec![value]), false), "[toDate('2024-01-01')]");
    }

    #[test]
    fn test_option_and_slice_conversions() {
        assert!(ParamValue::from(None::<String>).is_null());
        assert_eq!(ParamValue::from(Some(5u8)), ParamValue::UInt(5));
        let slice: &[i16] = &[1, 2];
        assert_eq!(bind(&slice.into(), false), "[1, 2]");
    }

    #[test]
    fn test_json_conversion() {
        let value = ParamValue::from(json!({"a": [1, -2, 0.5], "b": null, "c": "s"}));
        assert_eq!(bind(&value, false), "{'a':[1, -2, 0.5], 'b':NULL, 'c':'s'}");
        assert_eq!(bind(&json!("top").into(), false), "top");
    }

    #[test]
    fn test_query_params_replace_in_place() {
        let mut params = QueryParams::from([("a", 1), ("b", 2)]);
        let previous = params.insert("a", 3);

        assert_eq!(previous, Some(ParamValue::Int(1)));
        assert_eq!(params.len(), 2);
        let names: Vec<_> = params.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(params.get("a"), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn test_form_fields_bind_unquoted() {
        let params = QueryParams::new()
            .with("expected", ("a", "b"))
            .with("s", "10")
            .with("n", None::<i64>);
        let fields: Vec<_> = params.form_fields().collect();
        assert_eq!(
            fields,
            vec![
                ("param_expected".to_string(), "('a', 'b')".to_string()),
                ("param_s".to_string(), "10".to_string()),
                ("param_n".to_string(), "NULL".to_string()),
            ]
        );
    }
}
