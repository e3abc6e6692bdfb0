//! Ordered component collection shared by the managers.

use crate::component::{Component, Role};
use std::fmt;
use std::ops::{Index, IndexMut};

/// Boxed component, as stored by managers.
pub type BoxedComponent<T> = Box<dyn Component<T>>;

/// Components in registration order.
pub struct ComponentList<T> {
    items: Vec<BoxedComponent<T>>,
}

impl<T> ComponentList<T> {
    pub fn new() -> Self {
        Self { items: Vec::new() }
    }

    /// Append a component.
    pub fn add(&mut self, component: impl Component<T> + 'static) {
        self.items.push(Box::new(component));
    }

    pub fn add_boxed(&mut self, component: BoxedComponent<T>) {
        self.items.push(component);
    }

    /// Insert a component at `index`, shifting later ones back. An index past
    /// the end appends.
    pub fn insert(&mut self, index: usize, component: BoxedComponent<T>) {
        let index = index.min(self.items.len());
        self.items.insert(index, component);
    }

    /// Swap the component at `index` for `component`, returning the old one.
    pub fn replace(&mut self, index: usize, component: BoxedComponent<T>) -> Option<BoxedComponent<T>> {
        let slot = self.items.get_mut(index)?;
        Some(std::mem::replace(slot, component))
    }

    pub fn remove(&mut self, index: usize) -> Option<BoxedComponent<T>> {
        (index < self.items.len()).then(|| self.items.remove(index))
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&dyn Component<T>> {
        self.items.get(index).map(|c| &**c)
    }

    pub fn iter(&self) -> impl Iterator<Item = &BoxedComponent<T>> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut BoxedComponent<T>> {
        self.items.iter_mut()
    }

    pub fn names(&self) -> Vec<String> {
        self.items.iter().map(|c| c.name().to_string()).collect()
    }

    pub fn roles(&self) -> Vec<Role> {
        self.items.iter().map(|c| c.role()).collect()
    }
}

impl<T> Default for ComponentList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<BoxedComponent<T>> for ComponentList<T> {
    fn extend<I: IntoIterator<Item = BoxedComponent<T>>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl<T> FromIterator<BoxedComponent<T>> for ComponentList<T> {
    fn from_iter<I: IntoIterator<Item = BoxedComponent<T>>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl<T> Index<usize> for ComponentList<T> {
    type Output = BoxedComponent<T>;

    fn index(&self, index: usize) -> &Self::Output {
        &self.items[index]
    }
}

impl<T> IndexMut<usize> for ComponentList<T> {
    fn index_mut(&mut self, index: usize) -> &mut Self::Output {
        &mut self.items[index]
    }
}

impl<T> fmt::Display for ComponentList<T> {
    /// `[name, name]`, or nothing at all when empty.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.items.is_empty() {
            return Ok(());
        }
        write!(f, "[{}]", self.names().join(", "))
    }
}

impl<T> fmt::Debug for ComponentList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.items.iter().map(|c| (c.name(), c.role())))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Stage;

    fn stage(name: &str) -> BoxedComponent<i32> {
        Box::new(Stage::process_fn(name, |x: &i32| Ok(*x)))
    }

    #[test]
    fn test_add_and_display() {
        let mut list = ComponentList::new();
        assert_eq!(list.to_string(), "");
        list.add_boxed(stage("a"));
        list.add(Stage::handle_fn("b", |x: &i32| Ok(*x)));
        assert_eq!(list.to_string(), "[a, b]");
        assert_eq!(list.roles(), vec![Role::Processor, Role::Handler]);
    }

    #[test]
    fn test_insert_and_extend() {
        let mut list: ComponentList<i32> = [stage("a"), stage("c")].into_iter().collect();
        list.insert(1, stage("b"));
        list.insert(99, stage("d"));
        list.extend([stage("e")]);
        assert_eq!(list.names(), vec!["a", "b", "c", "d", "e"]);
    }

    #[test]
    fn test_replace_and_remove() {
        let mut list: ComponentList<i32> = [stage("a"), stage("b")].into_iter().collect();
        let old = list.replace(0, stage("z")).unwrap();
        assert_eq!(old.name(), "a");
        assert!(list.replace(5, stage("y")).is_none());
        assert_eq!(list.remove(1).map(|c| c.name().to_string()).as_deref(), Some("b"));
        assert!(list.remove(1).is_none());
        assert_eq!(list[0].name(), "z");
    }
}
