//! Fixed-capacity code sequences.
//!
//! A `Code` is the compressed representation of one symbol: a short run of
//! small integers drawn from the recoder's code space.

use std::fmt;
use std::hash::{Hash, Hasher};

/// Maximum number of elements in a single code.
pub const MAX_CODE_LEN: usize = 9;

/// A short, fixed-capacity sequence of code values.
///
/// Equality and hashing only look at the first `len` elements, so a code
/// that was truncated compares equal to one built directly at that length.
#[derive(Clone, Copy, Default)]
pub struct Code {
    self_normalized: bool,
    len: u8,
    values: [u32; MAX_CODE_LEN],
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a code from a slice. Returns `None` if the slice is longer than
    /// `MAX_CODE_LEN`.
    pub fn from_slice(values: &[u32]) -> Option<Self> {
        if values.len() > MAX_CODE_LEN {
            return None;
        }
        let mut code = Self::new();
        for (i, &v) in values.iter().enumerate() {
            code.set(i, v);
        }
        Some(code)
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn self_normalized(&self) -> bool {
        self.self_normalized
    }

    pub fn set_self_normalized(&mut self, value: bool) {
        self.self_normalized = value;
    }

    /// Set element `index`, extending the length to cover it.
    ///
    /// # Panics
    /// If `index >= MAX_CODE_LEN`.
    pub fn set(&mut self, index: usize, value: u32) {
        self.values[index] = value;
        if self.len() <= index {
            self.len = (index + 1) as u8;
        }
    }

    /// Append a value. Returns `false` if the code is already full.
    pub fn push(&mut self, value: u32) -> bool {
        if self.len() >= MAX_CODE_LEN {
            return false;
        }
        let index = self.len();
        self.set(index, value);
        true
    }

    /// Shorten to `len` elements. No-op if already shorter.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len() {
            self.len = len as u8;
        }
    }

    pub fn get(&self, index: usize) -> Option<u32> {
        self.as_slice().get(index).copied()
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.values[..self.len()]
    }

    /// The final element, if any.
    pub fn last(&self) -> Option<u32> {
        self.as_slice().last().copied()
    }

    /// A copy truncated to `len` elements.
    pub fn prefix(&self, len: usize) -> Code {
        let mut p = *self;
        p.truncate(len);
        p.self_normalized = false;
        p
    }
}

impl PartialEq for Code {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Code {}

impl Hash for Code {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state);
    }
}

impl fmt::Debug for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Code{:?}", self.as_slice())
    }
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self.as_slice().iter().map(|v| v.to_string()).collect();
        write!(f, "{}", parts.join(","))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_set_extends_length() {
        let mut code = Code::new();
        code.set(2, 7);
        assert_eq!(code.len(), 3);
        assert_eq!(code.as_slice(), &[0, 0, 7]);
    }

    #[test]
    fn test_truncated_equals_direct() {
        let full = Code::from_slice(&[3, 4, 5]).unwrap();
        let direct = Code::from_slice(&[3, 4]).unwrap();
        assert_eq!(full.prefix(2), direct);
        assert_ne!(full, direct);

        let mut map = HashMap::new();
        map.insert(direct, 1);
        assert_eq!(map.get(&full.prefix(2)), Some(&1));
    }

    #[test]
    fn test_self_normalized_ignored_by_eq() {
        let mut a = Code::from_slice(&[1]).unwrap();
        let b = Code::from_slice(&[1]).unwrap();
        a.set_self_normalized(true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_push_full() {
        let mut code = Code::from_slice(&[1; MAX_CODE_LEN]).unwrap();
        assert!(!code.push(2));
        assert!(Code::from_slice(&[0; MAX_CODE_LEN + 1]).is_none());
    }

    #[test]
    fn test_display() {
        let code = Code::from_slice(&[10, 2, 33]).unwrap();
        assert_eq!(code.to_string(), "10,2,33");
        assert_eq!(Code::new().to_string(), "");
    }
}
