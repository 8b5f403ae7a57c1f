use smartstring::alias::String;
use std::collections::HashMap;
use std::slice::Iter;

/// Interns symbol names, handing out dense indices in first-seen order.
#[derive(Default, Debug, Clone)]
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

    /// Returns the index of `sym`, inserting it first if it is new.
    pub fn add(&mut self, sym: &str) -> usize {
        if let Some(&idx) = self.map.get(sym) {
            return idx;
        }
        let idx = self.vec.len();
        let owned = String::from(sym);
        self.vec.push(owned.clone());
        self.map.insert(owned, idx);
        idx
    }

    pub fn iter(&self) -> Iter<'_, String> {
        self.vec.iter()
    }

    pub fn idx(&self, sym: &str) -> Option<usize> {
        self.map.get(sym).copied()
    }

    pub fn sym(&self, idx: usize) -> Option<&str> {
        self.vec.get(idx).map(|x| x.as_str())
    }

    pub fn len(&self) -> usize {
        self.vec.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vec.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::Symtab;

    #[test]
    fn new_is_empty() {
        let st = Symtab::new();
        assert!(st.is_empty());
        assert_eq!(st.idx("anything"), None);
        assert_eq!(st.sym(0), None);
    }

    #[test]
    fn add_and_retrieve() {
        let mut st = Symtab::new();
        assert_eq!(st.add("Sums"), 0);
        assert_eq!(st.add("Products"), 1);
        assert_eq!(st.idx("Products"), Some(1));
        assert_eq!(st.sym(0), Some("Sums"));
        assert_eq!(st.len(), 2);
    }

    #[test]
    fn duplicate_add_returns_same_index() {
        let mut st = Symtab::new();
        let first = st.add("plus");
        let second = st.add("plus");
        assert_eq!(first, second);
        assert_eq!(st.len(), 1);
        assert_eq!(st.sym(1), None);
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut st = Symtab::new();
        for name in ["c", "a", "b", "a"] {
            st.add(name);
        }
        let names: Vec<&str> = st.iter().map(|s| s.as_str()).collect();
        assert_eq!(names, ["c", "a", "b"]);
    }
}
