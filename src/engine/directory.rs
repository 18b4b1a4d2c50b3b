use std::collections::{BTreeMap, HashMap};

/// The in-memory mapping of contact keys to phone numbers.
///
/// Entries are iterated in the order their keys were first inserted. Overwriting the phone of an
/// existing key keeps its position, removing a key and adding it again moves it to the end.
#[derive(Debug, Default, Clone)]
pub struct Directory {
    // sequence number handed to the next new key
    next_seq: u64,

    // maps keys to their insertion sequence number
    index: HashMap<String, u64>,

    // (key, phone) entries ordered by insertion sequence
    entries: BTreeMap<u64, (String, String)>,
}

impl Directory {
    /// creates an empty `Directory`
    pub fn new() -> Self {
        Directory::default()
    }

    /// sets the phone of `key`, returning the previous phone if the key already existed
    pub fn insert(&mut self, key: String, phone: String) -> Option<String> {
        if let Some(seq) = self.index.get(&key) {
            return self
                .entries
                .get_mut(seq)
                .map(|(_, old)| std::mem::replace(old, phone));
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        self.index.insert(key.clone(), seq);
        self.entries.insert(seq, (key, phone));
        None
    }

    /// returns the phone of `key`, if present
    pub fn get(&self, key: &str) -> Option<&str> {
        self.index
            .get(key)
            .and_then(|seq| self.entries.get(seq))
            .map(|(_, phone)| phone.as_str())
    }

    /// returns true if `key` is in the directory
    pub fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// removes `key`, returning the phone it had
    pub fn remove(&mut self, key: &str) -> Option<String> {
        let seq = self.index.remove(key)?;
        self.entries.remove(&seq).map(|(_, phone)| phone)
    }

    /// number of contacts in the directory
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// returns true if the directory holds no contacts
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// iterates over `(key, phone)` pairs in directory order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .values()
            .map(|(key, phone)| (key.as_str(), phone.as_str()))
    }
}

impl FromIterator<(String, String)> for Directory {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut directory = Directory::new();
        for (key, phone) in iter {
            directory.insert(key, phone);
        }
        directory
    }
}
