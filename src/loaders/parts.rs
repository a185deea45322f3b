use std::collections::HashMap;

use glam::Mat4;

use crate::error::AssetError;

/// Named node of a loaded model
#[derive(Debug, Clone)]
pub struct Part {
    pub name: String,
    /// Node index within the source document
    pub node: usize,
    /// Transform relative to the model root
    pub transform: Mat4,
}

/// Named sub-parts of a model, resolved once at load time.
///
/// Groups are keyed by a case-sensitive substring pattern and keep parts
/// in document traversal order.
#[derive(Debug, Clone, Default)]
pub struct PartRegistry {
    parts: Vec<Part>,
    groups: HashMap<String, Vec<usize>>,
}

impl PartRegistry {
    pub fn new(parts: Vec<Part>) -> Self {
        Self {
            parts,
            groups: HashMap::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn get(&self, name: &str) -> Option<&Part> {
        self.parts.iter().find(|part| part.name == name)
    }

    /// Resolve `pattern` and store the result as a group.
    /// Returns the number of matching parts.
    pub fn register_group(&mut self, pattern: &str) -> usize {
        let indices: Vec<usize> = self
            .parts
            .iter()
            .enumerate()
            .filter(|(_, part)| part.name.contains(pattern))
            .map(|(i, _)| i)
            .collect();
        let count = indices.len();
        self.groups.insert(pattern.to_string(), indices);
        count
    }

    /// Parts of a registered group. Empty for unknown patterns or groups with no match.
    pub fn group(&self, pattern: &str) -> impl Iterator<Item = &Part> + '_ {
        self.groups
            .get(pattern)
            .map(|indices| indices.as_slice())
            .unwrap_or(&[])
            .iter()
            .map(move |&i| &self.parts[i])
    }

    /// Parts whose name contains `pattern`. No match is not an error.
    pub fn matching(&self, pattern: &str) -> Vec<&Part> {
        self.parts
            .iter()
            .filter(|part| part.name.contains(pattern))
            .collect()
    }

    /// Like [`matching`](Self::matching), but an empty result is an error
    pub fn require(&self, pattern: &str) -> Result<Vec<&Part>, AssetError> {
        let found = self.matching(pattern);
        if found.is_empty() {
            return Err(AssetError::MissingPart {
                pattern: pattern.to_string(),
            });
        }
        Ok(found)
    }
}
