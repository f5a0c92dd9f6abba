//! Route pattern compilation.
//!
//! # Responsibilities
//! - Split a route string into positional segments
//! - Recognize `{name}` / `{name:tag}` placeholders
//! - Match a split request path against the compiled segments
//!
//! # Design Decisions
//! - Compilation is total: every string is a valid pattern
//! - The tag is whatever follows the first `:`; unknown tags mean `str`
//! - Matching is all-or-nothing; no partial or wildcard suffix matches

use crate::routing::converter::{Converter, PathParams};
use crate::routing::split_path;

/// One `/`-delimited component of a route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Must equal the path component exactly.
    Literal(String),
    /// Captures the path component through a converter.
    Param { name: String, converter: Converter },
}

impl Segment {
    fn parse(part: &str) -> Self {
        let placeholder = part
            .strip_prefix('{')
            .and_then(|rest| rest.strip_suffix('}'));

        match placeholder {
            Some(inner) => {
                let (name, converter) = match inner.split_once(':') {
                    Some((name, tag)) => (name, Converter::from_tag(tag)),
                    None => (inner, Converter::Str),
                };
                Segment::Param {
                    name: name.to_string(),
                    converter,
                }
            }
            None => Segment::Literal(part.to_string()),
        }
    }
}

/// A compiled route pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathPattern {
    source: String,
    segments: Vec<Segment>,
}

impl PathPattern {
    /// Compile a route string such as `/user/{user_id:int}/posts/{slug}`.
    pub fn compile(path: &str) -> Self {
        let segments = split_path(path).into_iter().map(Segment::parse).collect();
        Self {
            source: path.to_string(),
            segments,
        }
    }

    /// The route string this pattern was compiled from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Names and converters of the placeholders, in order.
    pub fn params(&self) -> impl Iterator<Item = (&str, Converter)> {
        self.segments.iter().filter_map(|s| match s {
            Segment::Param { name, converter } => Some((name.as_str(), *converter)),
            Segment::Literal(_) => None,
        })
    }

    /// Match already-split path components.
    ///
    /// Returns `None` on a count mismatch, a literal mismatch, or a converter
    /// rejecting its component.
    pub fn match_components(&self, components: &[&str]) -> Option<PathParams> {
        if components.len() != self.segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (segment, component) in self.segments.iter().zip(components) {
            match segment {
                Segment::Literal(expected) => {
                    if expected != component {
                        return None;
                    }
                }
                Segment::Param { name, converter } => {
                    let value = converter.parse(component).ok()?;
                    params.push(name, value);
                }
            }
        }
        Some(params)
    }
}
