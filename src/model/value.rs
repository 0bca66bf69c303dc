use indexmap::IndexMap;

/// In-memory language asset tree.
///
/// A `Scalar(None)` is an absent value and is never handed to a transform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NestedValue {
    Mapping(Mapping),
    Sequence(Vec<NestedValue>),
    Scalar(Option<String>),
}

impl NestedValue {
    pub fn text(s: impl Into<String>) -> Self {
        NestedValue::Scalar(Some(s.into()))
    }

    pub fn null() -> Self {
        NestedValue::Scalar(None)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            NestedValue::Scalar(Some(s)) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&Mapping> {
        match self {
            NestedValue::Mapping(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_sequence(&self) -> Option<&[NestedValue]> {
        match self {
            NestedValue::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// Looks up a key when this value is a mapping.
    pub fn get(&self, key: &str) -> Option<&NestedValue> {
        self.as_mapping().and_then(|m| m.get(key))
    }
}

impl From<&str> for NestedValue {
    fn from(s: &str) -> Self {
        NestedValue::text(s)
    }
}

impl From<Mapping> for NestedValue {
    fn from(m: Mapping) -> Self {
        NestedValue::Mapping(m)
    }
}

impl From<Vec<NestedValue>> for NestedValue {
    fn from(items: Vec<NestedValue>) -> Self {
        NestedValue::Sequence(items)
    }
}

/// Insertion-ordered mapping with unique keys. Equality is order-sensitive.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    entries: IndexMap<String, NestedValue>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(n: usize) -> Self {
        Self {
            entries: IndexMap::with_capacity(n),
        }
    }

    /// Inserts a value. An existing key keeps its position and gets the new
    /// value, which is returned in place of the old one.
    pub fn insert(&mut self, key: impl Into<String>, value: NestedValue) -> Option<NestedValue> {
        self.entries.insert(key.into(), value)
    }

    pub fn get(&self, key: &str) -> Option<&NestedValue> {
        self.entries.get(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &NestedValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl PartialEq for Mapping {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl Eq for Mapping {}

impl<K: Into<String>> FromIterator<(K, NestedValue)> for Mapping {
    fn from_iter<I: IntoIterator<Item = (K, NestedValue)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}
