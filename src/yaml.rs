use std::hash::{Hash, Hasher};
use std::ops::Index;

use serde::de::{MapAccess, SeqAccess, Visitor};
use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::linked_hash_map::LinkedHashMap;

/// A resolved YAML value.
///
/// - `Real` keeps the source spelling and parses to `f64` lazily.
/// - `Hash` is insertion-ordered.
/// - `BadValue` is returned for invalid indexing and for values that cannot
///   be represented (for example a cyclic alias resolved into a value).
#[derive(Clone, PartialEq, PartialOrd, Debug, Eq, Ord)]
pub enum Yaml {
    Real(String),
    Integer(i64),
    String(String),
    Boolean(bool),
    Array(Vec<Yaml>),
    Hash(LinkedHashMap<Yaml, Yaml>),
    Null,
    BadValue,
}

impl Hash for Yaml {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Yaml::Real(s) => {
                0.hash(state);
                s.hash(state);
            }
            Yaml::Integer(i) => {
                1.hash(state);
                i.hash(state);
            }
            Yaml::String(s) => {
                2.hash(state);
                s.hash(state);
            }
            Yaml::Boolean(b) => {
                3.hash(state);
                b.hash(state);
            }
            Yaml::Array(a) => {
                4.hash(state);
                a.hash(state);
            }
            Yaml::Hash(h) => {
                5.hash(state);
                for (k, v) in h.iter() {
                    k.hash(state);
                    v.hash(state);
                }
            }
            Yaml::Null => 6.hash(state),
            Yaml::BadValue => 7.hash(state),
        }
    }
}

/// Returned by indexing misses so `doc["unknown"]` stays graceful.
static BAD_VALUE: Yaml = Yaml::BadValue;

impl Yaml {
    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Yaml::Boolean(b) => Some(b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Yaml::Integer(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Yaml::Real(ref s) => parse_f64(s),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match *self {
            Yaml::String(ref s) => Some(s),
            _ => None,
        }
    }

    pub fn as_vec(&self) -> Option<&[Yaml]> {
        match *self {
            Yaml::Array(ref v) => Some(v),
            _ => None,
        }
    }

    pub fn as_vec_mut(&mut self) -> Option<&mut Vec<Yaml>> {
        match *self {
            Yaml::Array(ref mut v) => Some(v),
            _ => None,
        }
    }

    pub fn as_hash(&self) -> Option<&LinkedHashMap<Yaml, Yaml>> {
        match *self {
            Yaml::Hash(ref h) => Some(h),
            _ => None,
        }
    }

    pub fn as_hash_mut(&mut self) -> Option<&mut LinkedHashMap<Yaml, Yaml>> {
        match *self {
            Yaml::Hash(ref mut h) => Some(h),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(*self, Yaml::Null)
    }

    pub fn is_badvalue(&self) -> bool {
        matches!(*self, Yaml::BadValue)
    }

    /// Resolve a plain scalar with the YAML 1.2 core schema.
    pub fn from_scalar(value: &str) -> Yaml {
        resolve_scalar(value, false)
    }
}

/// Core-schema resolution for a plain, untagged scalar.
///
/// `strict_integer` rejects underscore-separated digit runs, keeping only
/// decimal, `0x` and `0o` forms.
pub(crate) fn resolve_scalar(value: &str, strict_integer: bool) -> Yaml {
    match value {
        "" | "~" | "null" | "Null" | "NULL" => return Yaml::Null,
        "true" | "True" | "TRUE" => return Yaml::Boolean(true),
        "false" | "False" | "FALSE" => return Yaml::Boolean(false),
        _ => {}
    }
    if let Some(i) = parse_int(value, strict_integer) {
        return Yaml::Integer(i);
    }
    if parse_f64(value).is_some() {
        return Yaml::Real(value.to_owned());
    }
    Yaml::String(value.to_owned())
}

fn parse_int(value: &str, strict: bool) -> Option<i64> {
    let (sign, body) = match value.as_bytes().first()? {
        b'+' => (1, &value[1..]),
        b'-' => (-1, &value[1..]),
        _ => (1, value),
    };
    if body.is_empty() {
        return None;
    }
    if let Some(hex) = body.strip_prefix("0x") {
        return i64::from_str_radix(hex, 16).ok().map(|i| sign * i);
    }
    if let Some(oct) = body.strip_prefix("0o") {
        return i64::from_str_radix(oct, 8).ok().map(|i| sign * i);
    }
    if !strict && body.contains('_') && !body.starts_with('_') && !body.ends_with('_') {
        let digits: String = body.chars().filter(|c| *c != '_').collect();
        if digits.bytes().all(|b| b.is_ascii_digit()) {
            return digits.parse::<i64>().ok().map(|i| sign * i);
        }
        return None;
    }
    if body.bytes().all(|b| b.is_ascii_digit()) {
        return body.parse::<i64>().ok().map(|i| sign * i);
    }
    None
}

/// Parse a float, accepting only the core-schema spellings of the
/// non-finite values.
pub(crate) fn parse_f64(value: &str) -> Option<f64> {
    match value {
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => return Some(f64::INFINITY),
        "-.inf" | "-.Inf" | "-.INF" => return Some(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return Some(f64::NAN),
        _ => {}
    }
    // `f64::from_str` accepts "inf"/"nan" spellings YAML does not.
    let body = value.strip_prefix(['+', '-']).unwrap_or(value);
    if body.is_empty() || !body.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
        return None;
    }
    if !body
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return None;
    }
    value.parse::<f64>().ok()
}

impl Index<&str> for Yaml {
    type Output = Yaml;

    fn index(&self, key: &str) -> &Yaml {
        match self.as_hash() {
            Some(h) => {
                let wanted = Yaml::String(key.to_owned());
                h.get(&wanted).unwrap_or(&BAD_VALUE)
            }
            None => &BAD_VALUE,
        }
    }
}

impl Index<usize> for Yaml {
    type Output = Yaml;

    fn index(&self, index: usize) -> &Yaml {
        match self.as_vec() {
            Some(v) => v.get(index).unwrap_or(&BAD_VALUE),
            None => &BAD_VALUE,
        }
    }
}

impl Serialize for Yaml {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Yaml::Real(s) => match parse_f64(s) {
                Some(f) => serializer.serialize_f64(f),
                None => serializer.serialize_str(s),
            },
            Yaml::Integer(i) => serializer.serialize_i64(*i),
            Yaml::String(s) => serializer.serialize_str(s),
            Yaml::Boolean(b) => serializer.serialize_bool(*b),
            Yaml::Array(a) => {
                let mut seq = serializer.serialize_seq(Some(a.len()))?;
                for item in a {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Yaml::Hash(h) => {
                let mut map = serializer.serialize_map(Some(h.len()))?;
                for (k, v) in h.iter() {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
            Yaml::Null | Yaml::BadValue => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Yaml {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct YamlVisitor;

        impl<'de> Visitor<'de> for YamlVisitor {
            type Value = Yaml;

            fn expecting(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str("any YAML value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Yaml, E> {
                Ok(Yaml::Boolean(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Yaml, E> {
                Ok(Yaml::Integer(v))
            }

            fn visit_u64<E: serde::de::Error>(self, v: u64) -> Result<Yaml, E> {
                i64::try_from(v)
                    .map(Yaml::Integer)
                    .map_err(|_| E::custom("integer out of range"))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Yaml, E> {
                Ok(Yaml::Real(v.to_string()))
            }

            fn visit_str<E>(self, v: &str) -> Result<Yaml, E> {
                Ok(Yaml::String(v.to_owned()))
            }

            fn visit_unit<E>(self) -> Result<Yaml, E> {
                Ok(Yaml::Null)
            }

            fn visit_none<E>(self) -> Result<Yaml, E> {
                Ok(Yaml::Null)
            }

            fn visit_some<D: Deserializer<'de>>(self, d: D) -> Result<Yaml, D::Error> {
                Yaml::deserialize(d)
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Yaml, A::Error> {
                let mut items = Vec::new();
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Yaml::Array(items))
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Yaml, A::Error> {
                let mut map = LinkedHashMap::new();
                while let Some((k, v)) = access.next_entry()? {
                    map.insert(k, v);
                }
                Ok(Yaml::Hash(map))
            }
        }

        deserializer.deserialize_any(YamlVisitor)
    }
}
