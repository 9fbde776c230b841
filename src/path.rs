//! Error paths through values and schemas.
//!
//! This module provides [`JsonPath`] and [`PathSegment`]. A path records where
//! in the validated value an error occurred, plus the schema keywords the
//! validator passed through on the way (`allOf[1]`, `then`, `items`, ...).
//! Keyword segments are kept for programmatic consumers and dropped when
//! errors are folded into the nested form-error object.

use std::fmt::{self, Display};

/// A schema keyword traversed while validating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SchemaKeyword {
    /// The `i`-th entry of `allOf`.
    AllOf(usize),
    /// The `then` branch of a conditional.
    Then,
    /// The `else` branch of a conditional.
    Else,
    /// `items`, followed by the item index.
    Items,
    /// `prefixItems`, followed by the item index.
    PrefixItems,
    /// `contains`, followed by the item index.
    Contains,
}

impl Display for SchemaKeyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaKeyword::AllOf(i) => write!(f, "allOf[{}]", i),
            SchemaKeyword::Then => write!(f, "then"),
            SchemaKeyword::Else => write!(f, "else"),
            SchemaKeyword::Items => write!(f, "items"),
            SchemaKeyword::PrefixItems => write!(f, "prefixItems"),
            SchemaKeyword::Contains => write!(f, "contains"),
        }
    }
}

/// A segment of a path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    /// An object property (e.g., `user`, `email`)
    Field(String),
    /// An array index (e.g., `[0]`, `[42]`)
    Index(usize),
    /// A schema keyword the validator descended through.
    Keyword(SchemaKeyword),
}

impl PathSegment {
    /// Creates a new field segment.
    pub fn field(name: impl Into<String>) -> Self {
        PathSegment::Field(name.into())
    }

    /// Creates a new index segment.
    pub fn index(idx: usize) -> Self {
        PathSegment::Index(idx)
    }

    /// Returns true for segments that address the value rather than the schema.
    pub fn is_value_segment(&self) -> bool {
        !matches!(self, PathSegment::Keyword(_))
    }
}

/// A path to a value in a nested JSON-like structure.
///
/// # Example
///
/// ```rust
/// use formschema::{JsonPath, SchemaKeyword};
///
/// let path = JsonPath::root()
///     .push_keyword(SchemaKeyword::AllOf(0))
///     .push_field("pets")
///     .push_keyword(SchemaKeyword::Items)
///     .push_index(2)
///     .push_field("name");
///
/// assert_eq!(path.to_string(), "allOf[0].pets.items[2].name");
/// assert_eq!(path.value_path().to_string(), "pets[2].name");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct JsonPath {
    segments: Vec<PathSegment>,
}

impl JsonPath {
    /// Creates an empty path representing the root value.
    pub fn root() -> Self {
        Self::default()
    }

    /// Creates a path from a single field segment.
    pub fn from_field(name: impl Into<String>) -> Self {
        Self {
            segments: vec![PathSegment::Field(name.into())],
        }
    }

    /// Returns a new path with a field segment appended.
    pub fn push_field(&self, name: impl Into<String>) -> Self {
        self.push(PathSegment::Field(name.into()))
    }

    /// Returns a new path with an index segment appended.
    pub fn push_index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    /// Returns a new path with a schema keyword segment appended.
    pub fn push_keyword(&self, keyword: SchemaKeyword) -> Self {
        self.push(PathSegment::Keyword(keyword))
    }

    fn push(&self, segment: PathSegment) -> Self {
        let mut segments = Vec::with_capacity(self.segments.len() + 1);
        segments.extend_from_slice(&self.segments);
        segments.push(segment);
        Self { segments }
    }

    /// Returns true if this is the root path (no segments).
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns the number of segments in this path.
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Returns true if this path has no segments.
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Returns an iterator over the path segments.
    pub fn segments(&self) -> impl Iterator<Item = &PathSegment> {
        self.segments.iter()
    }

    /// Returns the path with every schema keyword segment removed.
    pub fn value_path(&self) -> Self {
        Self {
            segments: self
                .segments
                .iter()
                .filter(|s| s.is_value_segment())
                .cloned()
                .collect(),
        }
    }

    /// Returns the last segment, or None if this is root.
    pub fn last(&self) -> Option<&PathSegment> {
        self.segments.last()
    }
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                PathSegment::Field(name) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSegment::Keyword(keyword) => {
                    if i > 0 {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", keyword)?;
                }
                PathSegment::Index(idx) => write!(f, "[{}]", idx)?,
            }
        }
        Ok(())
    }
}
