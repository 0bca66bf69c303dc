use serde::Serialize;

/// Ordered `key=value` pairs of a mod's module info file.
///
/// Keys may repeat; repeated `FullDescription` lines form one multi-line field.
#[derive(Debug, Serialize, Clone, Default, PartialEq, Eq)]
pub struct MetadataRecord {
    pairs: Vec<(String, String)>,
}

impl MetadataRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.pairs.push((key.into(), value.into()));
    }

    pub fn pairs(&self) -> &[(String, String)] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    /// All values stored under `key`, in file order.
    pub fn values<'s, 'k>(&'s self, key: &'k str) -> impl Iterator<Item = &'s str> + 'k
    where
        's: 'k,
    {
        self.pairs
            .iter()
            .filter(move |(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for MetadataRecord {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl IntoIterator for MetadataRecord {
    type Item = (String, String);
    type IntoIter = std::vec::IntoIter<(String, String)>;

    fn into_iter(self) -> Self::IntoIter {
        self.pairs.into_iter()
    }
}
