use smartstring::alias::String;
use std::collections::HashMap;
use std::slice::Iter;

/// Interns symbol names in first-seen order.
#[derive(Default, Debug)]
pub struct Symtab {
    map: HashMap<String, usize>,
    vec: Vec<String>,
}

impl Symtab {
    pub fn new() -> Self {
        Self {
            map: HashMap::new(),
            vec: Vec::new(),
        }
    }

    /// Returns the index of `sym`, inserting it if needed, and whether it was new.
    pub fn add(&mut self, sym: &str) -> (usize, bool) {
        if let Some(&idx) = self.map.get(sym) {
            return (idx, false);
        }
        let idx = self.vec.len();
        let owned = String::from(sym);
        self.vec.push(owned.clone());
        self.map.insert(owned, idx);
        (idx, true)
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.map.get(sym).copied()
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.vec.get(idx).map(|x| x.as_str())
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.vec.iter()
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }
}
