//! Scope frames for the tree-walking runtime. An `Environment` is a mutable
//! name→value map plus an optional link to its enclosing frame; closures
//! keep frames alive by holding `Rc` handles to them.

use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

#[derive(Clone)]
pub struct Environment<'a> {
    values: HashMap<String, Value<'a>>,
    pub enclosing: Option<Rc<RefCell<Environment<'a>>>>,
}

impl<'a> Environment<'a> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: Rc<RefCell<Environment<'a>>>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Bind a name in *this* frame, shadowing any outer binding.
    pub fn define(&mut self, name: &str, value: Value<'a>) {
        self.values.insert(name.to_string(), value);
    }

    /// Look a name up, walking outward through enclosing frames.
    pub fn get(&self, name: &str) -> Option<Value<'a>> {
        if let Some(value) = self.values.get(name) {
            Some(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name)
        } else {
            None
        }
    }

    /// Overwrite an existing binding, walking outward through enclosing
    /// frames. Returns `false` when the name is bound nowhere on the chain.
    pub fn assign(&mut self, name: &str, value: Value<'a>) -> bool {
        if self.values.contains_key(name) {
            self.values.insert(name.to_string(), value);
            true
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value)
        } else {
            false
        }
    }

    /// Read at exactly `distance` hops up the chain. No searching: the
    /// resolver already proved where the binding lives.
    pub fn get_at(&self, distance: usize, name: &str) -> Option<Value<'a>> {
        if distance == 0 {
            return self.values.get(name).cloned();
        }

        match &self.enclosing {
            Some(parent) => parent.borrow().get_at(distance - 1, name),
            None => None,
        }
    }

    /// Write at exactly `distance` hops up the chain. Returns `false` when
    /// the target frame has no such binding.
    pub fn assign_at(&mut self, distance: usize, name: &str, value: Value<'a>) -> bool {
        if distance == 0 {
            if self.values.contains_key(name) {
                self.values.insert(name.to_string(), value);
                return true;
            }

            return false;
        }

        match &self.enclosing {
            Some(parent) => parent.borrow_mut().assign_at(distance - 1, name, value),
            None => false,
        }
    }
}

impl<'a> Default for Environment<'a> {
    fn default() -> Self {
        Self::new()
    }
}
