use std::sync::OnceLock;

use regex::Regex;
use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::parse::error::Result;
use crate::parse::Error;

/// One `{key=value, key=value}` object from the portal, in source order.
///
/// Keys are whatever the portal sent; there is no fixed schema.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    fields: Vec<(String, String)>,
}

impl Record {
    /// Parses a single fragment. Braces and trailing commas around it are optional.
    ///
    /// A key is a run of ASCII letters followed by `=`, either at the start
    /// of the fragment or right after a `, ` separator. Everything up to the
    /// next key (or the end) is the value, so values may contain spaces,
    /// commas and `=` as long as they never contain `, <letters>=`.
    pub fn from_fragment(fragment: &str) -> Result<Self> {
        static KEY_RE: OnceLock<Regex> = OnceLock::new();
        let re =
            KEY_RE.get_or_init(|| Regex::new(r"(?:^|, )([A-Za-z]+)=").expect("regex should be valid"));

        let body = fragment.trim_matches(|c| matches!(c, '{' | '}' | ','));
        if body.is_empty() {
            return Ok(Self::default());
        }

        // (key, start of the separator, end of the `=`)
        let keys: Vec<(&str, usize, usize)> = re
            .captures_iter(body)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.get(1)?;
                Some((name.as_str(), whole.start(), whole.end()))
            })
            .collect();

        match keys.first() {
            None => {
                return Err(Error::malformed_fragment_error(&format!(
                    "no `key=` token in {fragment:?}"
                )))
            }
            Some((_, start, _)) if *start != 0 => {
                return Err(Error::malformed_fragment_error(&format!(
                    "unexpected text before the first key in {fragment:?}"
                )))
            }
            Some(_) => {}
        }

        let mut record = Self::default();
        for (i, &(name, _, value_start)) in keys.iter().enumerate() {
            let value_end = keys.get(i + 1).map_or(body.len(), |next| next.1);
            record.insert(name, &body[value_start..value_end]);
        }
        Ok(record)
    }

    /// Splits an attribute value holding `{..},{..}` into records, keeping order.
    pub fn all_from_value(value: &str) -> Result<Vec<Self>> {
        static FRAGMENT_RE: OnceLock<Regex> = OnceLock::new();
        let re = FRAGMENT_RE.get_or_init(|| Regex::new(r"\{.*?\},?").expect("regex should be valid"));
        re.find_iter(value)
            .map(|m| {
                log::trace!("parsing fragment {:?}", m.as_str());
                Self::from_fragment(m.as_str())
            })
            .collect()
    }

    // repeated keys keep their first position, last value wins
    fn insert(&mut self, key: &str, value: &str) {
        if let Some(slot) = self.fields.iter_mut().find(|(k, _)| k == key) {
            value.clone_into(&mut slot.1);
        } else {
            self.fields.push((key.to_owned(), value.to_owned()));
        }
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    #[cfg(test)]
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(k, _)| k.as_str())
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_fragment() {
        let record = Record::from_fragment("{surname=Rossi, zip=00100}").unwrap();
        assert_eq!(record.len(), 2);
        assert_eq!(record.get("surname"), Some("Rossi"));
        assert_eq!(record.get("zip"), Some("00100"));
    }

    #[test]
    fn test_keeps_source_order() {
        let record = Record::from_fragment("{zip=00100, surname=Rossi, asl=RM1}").unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), ["zip", "surname", "asl"]);
    }

    #[test]
    fn test_key_inside_longer_key() {
        // `name` is a suffix of `surname` and must not split it
        let record = Record::from_fragment("{surname=ROSSI, name=MARIO}").unwrap();
        assert_eq!(record.get("surname"), Some("ROSSI"));
        assert_eq!(record.get("name"), Some("MARIO"));
        assert_eq!(record.len(), 2);
    }

    #[test]
    fn test_values_with_separators() {
        let record =
            Record::from_fragment("{address=VIA APPIA NUOVA, 12, notes=a=b,}").unwrap();
        assert_eq!(record.get("address"), Some("VIA APPIA NUOVA, 12"));
        assert_eq!(record.get("notes"), Some("a=b"));
    }

    #[test]
    fn test_empty_values() {
        let record = Record::from_fragment("{phone=, zip=00100}").unwrap();
        assert_eq!(record.get("phone"), Some(""));
        assert_eq!(record.get("zip"), Some("00100"));
    }

    #[test]
    fn test_repeated_key() {
        let record = Record::from_fragment("{a=1, b=2, a=3}").unwrap();
        assert_eq!(record.keys().collect::<Vec<_>>(), ["a", "b"]);
        assert_eq!(record.get("a"), Some("3"));
    }

    #[test]
    fn test_empty_fragment() {
        assert_eq!(Record::from_fragment("{}").unwrap(), Record::default());
        assert_eq!(Record::from_fragment("{},").unwrap().len(), 0);
    }

    #[test]
    fn test_malformed_fragment() {
        let err = Record::from_fragment("{garbage}").unwrap_err();
        assert!(matches!(err, Error::MalformedFragment(_)));
        let err = Record::from_fragment("{oops a=1}").unwrap_err();
        assert!(matches!(err, Error::MalformedFragment(_)));
    }

    #[test]
    fn test_all_from_value() {
        let records = Record::all_from_value("{a=1},{a=2}").unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("a"), Some("1"));
        assert_eq!(records[1].get("a"), Some("2"));
    }

    #[test]
    fn test_all_from_empty_value() {
        assert!(Record::all_from_value("").unwrap().is_empty());
        assert!(Record::all_from_value("[]").unwrap().is_empty());
    }

    #[test]
    fn test_serialize_keeps_order() {
        let record = Record::from_fragment("{zip=00100, surname=Rossi}").unwrap();
        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"zip":"00100","surname":"Rossi"}"#
        );
        let yaml = serde_yaml::to_string(&record).unwrap();
        let back: serde_yaml::Mapping = serde_yaml::from_str(&yaml).unwrap();
        let keys: Vec<_> = back.keys().filter_map(serde_yaml::Value::as_str).collect();
        assert_eq!(keys, ["zip", "surname"]);
        assert_eq!(back.get("zip").and_then(serde_yaml::Value::as_str), Some("00100"));
    }
}
