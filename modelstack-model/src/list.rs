//! Ordered keyed collection used for every child collection in the tree.

use crate::error::{ModelError, ModelResult};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

/// An element that carries its own key.
pub trait Identified {
    fn model_id(&self) -> &str;
}

impl<T: Identified + ?Sized> Identified for Arc<T> {
    fn model_id(&self) -> &str {
        (**self).model_id()
    }
}

/// An element that can be frozen together with the list holding it.
pub trait Sealable {
    fn seal(&mut self);
    fn is_sealed(&self) -> bool;
}

/// Map from identifier to element plus the insertion order of the elements.
///
/// Re-inserting an existing key replaces the element at its current
/// position, so overriding an inherited entry never reorders the list.
/// Once sealed, every mutating call returns [`ModelError::Sealed`].
#[derive(Debug, Clone, PartialEq)]
pub struct ModelList<T> {
    keys: Vec<String>,
    items: Vec<T>,
    index: HashMap<String, usize>,
    sealed: bool,
}

impl<T> Default for ModelList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> ModelList<T> {
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            items: Vec::new(),
            index: HashMap::new(),
            sealed: false,
        }
    }

    fn check_sealed(&self) -> ModelResult<()> {
        if self.sealed {
            return Err(ModelError::Sealed(format!("model list of {} items", self.items.len())));
        }
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .keys
            .iter()
            .enumerate()
            .map(|(position, key)| (key.clone(), position))
            .collect();
    }

    /// Inserts an element under an explicit key.
    ///
    /// Returns the replaced element when the key was already present.
    pub fn insert_keyed(&mut self, key: impl Into<String>, item: T) -> ModelResult<Option<T>> {
        self.check_sealed()?;
        let key = key.into();
        match self.index.get(&key) {
            Some(&position) => Ok(Some(std::mem::replace(&mut self.items[position], item))),
            None => {
                self.index.insert(key.clone(), self.items.len());
                self.keys.push(key);
                self.items.push(item);
                Ok(None)
            }
        }
    }

    /// Inserts an element keyed by `mapper(&item)`.
    pub fn insert_with<F>(&mut self, item: T, mapper: F) -> ModelResult<Option<T>>
    where
        F: FnOnce(&T) -> String,
    {
        let key = mapper(&item);
        self.insert_keyed(key, item)
    }

    pub fn remove(&mut self, id: &str) -> ModelResult<Option<T>> {
        self.check_sealed()?;
        let Some(position) = self.index.remove(id) else {
            return Ok(None);
        };
        self.keys.remove(position);
        let item = self.items.remove(position);
        self.reindex();
        Ok(Some(item))
    }

    pub fn get_model(&self, id: &str) -> Option<&T> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Mutable access to an element. Sealing freezes the list, not the
    /// elements; sealable elements guard themselves.
    pub fn get_model_mut(&mut self, id: &str) -> Option<&mut T> {
        match self.index.get(id) {
            Some(&position) => Some(&mut self.items[position]),
            None => None,
        }
    }

    pub fn has_model(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// The live ordered sequence of elements.
    pub fn models(&self) -> &[T] {
        &self.items
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &T)> {
        self.keys.iter().map(String::as_str).zip(self.items.iter())
    }

    pub fn size(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Reorders the elements. Keys travel with their elements.
    pub fn sort_by<F>(&mut self, mut compare: F) -> ModelResult<()>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        self.check_sealed()?;
        let mut pairs: Vec<(String, T)> = self.keys.drain(..).zip(self.items.drain(..)).collect();
        pairs.sort_by(|a, b| compare(&a.1, &b.1));
        (self.keys, self.items) = pairs.into_iter().unzip();
        self.reindex();
        Ok(())
    }

    /// Freezes the list.
    pub fn seal(&mut self) {
        self.sealed = true;
    }
}

impl<T: Identified> ModelList<T> {
    /// Inserts an element keyed by its own identifier.
    pub fn insert(&mut self, item: T) -> ModelResult<Option<T>> {
        let key = item.model_id().to_string();
        self.insert_keyed(key, item)
    }
}

impl<T: Clone> ModelList<T> {
    /// Replaces the content with a shallow copy of `other`.
    ///
    /// For handle and `Arc` elements the copy shares the underlying models.
    pub fn copy_from(&mut self, other: &ModelList<T>) -> ModelResult<()> {
        self.check_sealed()?;
        self.keys = other.keys.clone();
        self.items = other.items.clone();
        self.index = other.index.clone();
        Ok(())
    }

    /// A shallow copy that is not sealed, regardless of `self`.
    pub fn unsealed_copy(&self) -> Self {
        Self {
            keys: self.keys.clone(),
            items: self.items.clone(),
            index: self.index.clone(),
            sealed: false,
        }
    }
}

impl<T: Sealable> ModelList<T> {
    /// Seals every element, then the list.
    pub fn seal_deep(&mut self) {
        for item in &mut self.items {
            item.seal();
        }
        self.sealed = true;
    }
}

impl<'a, T> IntoIterator for &'a ModelList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
