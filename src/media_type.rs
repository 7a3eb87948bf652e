//! Media type value: `type/subtype` plus an ordered parameter map.
//!
//! Parsing is delegated to the `mime` crate; rendering is done here because a
//! [`mime::Mime`] cannot be assembled from parts. Rendering followed by
//! [`MediaType::parse`] reproduces the type and the parameters.
//!
//! `mime` has no quoted-pair or empty-value support, so stored parameter
//! values are kept within what it can read back: never empty, no `"`, no
//! control characters. Backslashes are escaped on render and unescaped on parse.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Errors produced when parsing a media type string.
#[derive(Debug, Error)]
pub enum MediaTypeError {
    #[error("invalid media type {input:?}: {source}")]
    Invalid {
        input: String,
        #[source]
        source: mime::FromStrError,
    },
    #[error("invalid media type {0:?}: expected type/subtype only")]
    Malformed(String),
}

/// A well-formed media type. The type and subtype are lower-case and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MediaType {
    type_: String,
    subtype: String,
    parameters: BTreeMap<String, String>,
}

impl MediaType {
    /// Build a media type without parameters from its two parts.
    pub fn new(type_: &str, subtype: &str) -> Result<Self, MediaTypeError> {
        let input = format!("{type_}/{subtype}");
        let parsed = Self::parse(&input)?;
        if !parsed.parameters.is_empty() {
            return Err(MediaTypeError::Malformed(input));
        }
        Ok(parsed)
    }

    /// Parts must already be valid `mime` type and subtype names.
    pub(crate) fn from_parts(type_: &str, subtype: &str) -> Self {
        debug_assert!(!type_.is_empty() && !subtype.is_empty());
        Self {
            type_: type_.to_ascii_lowercase(),
            subtype: subtype.to_ascii_lowercase(),
            parameters: BTreeMap::new(),
        }
    }

    /// `application/octet-stream`: the type of content that could not be identified.
    #[must_use]
    pub fn octet_stream() -> Self {
        Self::from_parts("application", "octet-stream")
    }

    /// Parse `type/subtype; key=value; ...`.
    pub fn parse(input: &str) -> Result<Self, MediaTypeError> {
        let parsed: mime::Mime = input.parse().map_err(|source| MediaTypeError::Invalid {
            input: input.to_owned(),
            source,
        })?;
        Ok(Self::from(&parsed))
    }

    /// Return a copy with `name` set to `value`, replacing any previous value.
    ///
    /// An empty value leaves the parameter unset; `"` becomes `'` and control
    /// characters become spaces.
    #[must_use]
    pub fn with_parameter(mut self, name: &str, value: &str) -> Self {
        self.set_parameter(name, value);
        self
    }

    pub(crate) fn set_parameter(&mut self, name: &str, value: &str) {
        if value.is_empty() {
            return;
        }
        let value = value
            .chars()
            .map(|c| match c {
                '"' => '\'',
                c if c.is_control() => ' ',
                c => c,
            })
            .collect();
        self.parameters.insert(name.to_ascii_lowercase(), value);
    }

    #[must_use]
    pub fn type_(&self) -> &str {
        &self.type_
    }

    #[must_use]
    pub fn subtype(&self) -> &str {
        &self.subtype
    }

    /// `type/subtype` without parameters.
    #[must_use]
    pub fn essence(&self) -> String {
        format!("{}/{}", self.type_, self.subtype)
    }

    /// Value of a parameter. Names are case-insensitive.
    #[must_use]
    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn parameters(&self) -> &BTreeMap<String, String> {
        &self.parameters
    }
}

impl Default for MediaType {
    fn default() -> Self {
        Self::octet_stream()
    }
}

impl From<&mime::Mime> for MediaType {
    fn from(m: &mime::Mime) -> Self {
        // essence_str keeps any structured-syntax suffix (e.g. svg+xml).
        let (type_, subtype) = m
            .essence_str()
            .split_once('/')
            .unwrap_or((m.type_().as_str(), m.subtype().as_str()));
        let mut media_type = Self::from_parts(type_, subtype);
        for (name, value) in m.params() {
            media_type.set_parameter(name.as_str(), &unescape(value.as_str()));
        }
        media_type
    }
}

/// Undo quoted-pair escaping. `mime` hands quoted values back verbatim, and a
/// `\` can only appear in a quoted value.
fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(escaped) => out.push(escaped),
                None => out.push(c),
            }
        } else {
            out.push(c);
        }
    }
    out
}

impl FromStr for MediaType {
    type Err = MediaTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.type_, self.subtype)?;
        for (name, value) in &self.parameters {
            write!(f, "; {name}=")?;
            if is_token(value) {
                f.write_str(value)?;
            } else {
                write_quoted(f, value)?;
            }
        }
        Ok(())
    }
}

/// RFC 2045 token: non-empty, no controls, spaces or tspecials.
fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value.bytes().all(|b| {
            b.is_ascii_graphic() && !b"()<>@,;:\\\"/[]?=".contains(&b)
        })
}

fn write_quoted(f: &mut fmt::Formatter<'_>, value: &str) -> fmt::Result {
    f.write_str("\"")?;
    for c in value.chars() {
        if c == '\\' {
            f.write_str("\\")?;
        }
        write!(f, "{c}")?;
    }
    f.write_str("\"")
}

#[cfg(feature = "serde")]
impl serde::Serialize for MediaType {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for MediaType {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Self::parse(&s).map_err(serde::de::Error::custom)
    }
}
