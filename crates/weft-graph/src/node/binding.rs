//! Node input bindings.

use std::collections::BTreeMap;

use derive_more::From;
use weft_core::literal::Literal;

use crate::promise::Promise;

/// Value bound to one node input.
#[derive(Debug, Clone, PartialEq, From)]
pub enum BindingData {
    /// A static literal.
    Scalar(Literal),
    /// An output of an upstream node.
    Promise(Promise),
    Collection(Vec<BindingData>),
    Map(BTreeMap<String, BindingData>),
}

impl BindingData {
    /// Visits every promise, depth first in declaration order.
    pub fn promises(&self) -> Vec<&Promise> {
        let mut promises = Vec::new();
        self.collect_promises(&mut promises);
        promises
    }

    fn collect_promises<'a>(&'a self, out: &mut Vec<&'a Promise>) {
        match self {
            Self::Scalar(_) => {}
            Self::Promise(promise) => out.push(promise),
            Self::Collection(items) => items.iter().for_each(|item| item.collect_promises(out)),
            Self::Map(items) => items.values().for_each(|item| item.collect_promises(out)),
        }
    }
}

/// A named node input and its value.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub var: String,
    pub binding: BindingData,
}

impl Binding {
    pub fn new(var: impl Into<String>, binding: impl Into<BindingData>) -> Self {
        Self {
            var: var.into(),
            binding: binding.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::NodeHandle;

    #[test]
    fn nested_promises_are_found() {
        let a = Promise::new(NodeHandle::new(0), "o0");
        let b = Promise::new(NodeHandle::new(1), "o0");
        let data = BindingData::Collection(vec![
            Literal::primitive(1_i64).into(),
            a.clone().into(),
            BindingData::Map(BTreeMap::from([("k".to_owned(), b.clone().into())])),
        ]);
        assert_eq!(data.promises(), vec![&a, &b]);
    }
}
