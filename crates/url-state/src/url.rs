// crates/url-state/src/url.rs
//! Application URL model

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where state parameters are stored inside a URL
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateLocation {
    /// Query string inside the fragment: `/app#/route?_a=(...)`
    #[default]
    HashQuery,
    /// Regular query string: `/app?_a=(...)#/route`
    Query,
}

/// Escaped characters that stay readable in query values
///
/// Mirrors the characters `encodeURIComponent` leaves alone plus the
/// extra ones query strings tolerate, so rison stays legible in the URL.
const READABLE: [(&str, &str); 10] = [
    ("%21", "!"),
    ("%2A", "*"),
    ("%27", "'"),
    ("%28", "("),
    ("%29", ")"),
    ("%40", "@"),
    ("%3A", ":"),
    ("%24", "$"),
    ("%2C", ","),
    ("%3B", ";"),
];

/// Percent-encodes a query key or value, keeping rison punctuation readable
pub fn encode_query_value(value: &str) -> String {
    let mut encoded = urlencoding::encode(value).into_owned();
    for (escaped, plain) in READABLE {
        encoded = encoded.replace(escaped, plain);
    }
    encoded
}

fn decode_query_value(value: &str) -> String {
    let spaced = value.replace('+', " ");
    match urlencoding::decode(&spaced) {
        Ok(decoded) => decoded.into_owned(),
        Err(_) => spaced,
    }
}

fn parse_query(query: &str) -> Vec<(String, String)> {
    query
        .split('&')
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once('=') {
            Some((key, value)) => (decode_query_value(key), decode_query_value(value)),
            None => (decode_query_value(pair), String::new()),
        })
        .collect()
}

fn format_query(params: &[(String, String)]) -> String {
    params
        .iter()
        .map(|(key, value)| format!("{}={}", encode_query_value(key), encode_query_value(value)))
        .collect::<Vec<_>>()
        .join("&")
}

/// A URL split into the parts state sync cares about
///
/// Parameter order is preserved, so formatting a parsed URL without
/// changes yields an equivalent URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppUrl {
    base: String,
    query: Vec<(String, String)>,
    hash_path: Option<String>,
    hash_query: Vec<(String, String)>,
}

impl AppUrl {
    /// Parses a URL string; any string is accepted
    pub fn parse(raw: &str) -> Self {
        let (before_hash, fragment) = match raw.split_once('#') {
            Some((before, fragment)) => (before, Some(fragment)),
            None => (raw, None),
        };

        let (base, query) = match before_hash.split_once('?') {
            Some((base, query)) => (base, parse_query(query)),
            None => (before_hash, Vec::new()),
        };

        let (hash_path, hash_query) = match fragment {
            Some(fragment) => match fragment.split_once('?') {
                Some((path, query)) => (Some(path.to_string()), parse_query(query)),
                None => (Some(fragment.to_string()), Vec::new()),
            },
            None => (None, Vec::new()),
        };

        Self {
            base: base.to_string(),
            query,
            hash_path,
            hash_query,
        }
    }

    /// Everything before the query string and fragment
    pub fn base(&self) -> &str {
        &self.base
    }

    /// Fragment path (without `#` and query), if the URL has a fragment
    pub fn hash_path(&self) -> Option<&str> {
        self.hash_path.as_deref()
    }

    /// Returns a decoded parameter value
    pub fn param(&self, location: StateLocation, key: &str) -> Option<&str> {
        self.params(location)
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Sets a parameter, replacing an existing one in place
    pub fn set_param(&mut self, location: StateLocation, key: &str, value: &str) {
        if location == StateLocation::HashQuery && self.hash_path.is_none() {
            self.hash_path = Some(String::new());
        }

        let params = self.params_mut(location);
        match params.iter().position(|(k, _)| k == key) {
            Some(index) => {
                params[index].1 = value.to_string();
                let mut seen = false;
                params.retain(|(k, _)| {
                    if k != key {
                        return true;
                    }
                    let keep = !seen;
                    seen = true;
                    keep
                });
            }
            None => params.push((key.to_string(), value.to_string())),
        }
    }

    /// Removes every occurrence of a parameter; returns true if one existed
    pub fn remove_param(&mut self, location: StateLocation, key: &str) -> bool {
        let params = self.params_mut(location);
        let before = params.len();
        params.retain(|(k, _)| k != key);
        params.len() != before
    }

    /// Parameter names in order of appearance
    pub fn param_keys(&self, location: StateLocation) -> Vec<&str> {
        self.params(location).iter().map(|(k, _)| k.as_str()).collect()
    }

    fn params(&self, location: StateLocation) -> &Vec<(String, String)> {
        match location {
            StateLocation::HashQuery => &self.hash_query,
            StateLocation::Query => &self.query,
        }
    }

    fn params_mut(&mut self, location: StateLocation) -> &mut Vec<(String, String)> {
        match location {
            StateLocation::HashQuery => &mut self.hash_query,
            StateLocation::Query => &mut self.query,
        }
    }
}

impl fmt::Display for AppUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.base)?;

        if !self.query.is_empty() {
            write!(f, "?{}", format_query(&self.query))?;
        }

        if self.hash_path.is_some() || !self.hash_query.is_empty() {
            write!(f, "#{}", self.hash_path.as_deref().unwrap_or_default())?;
            if !self.hash_query.is_empty() {
                write!(f, "?{}", format_query(&self.hash_query))?;
            }
        }

        Ok(())
    }
}
