//! Parsed-expression cache, shared by the elements that render the same
//! source and released with them.

use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use crate::dom::NodeId;
use crate::expr::Expr;

#[derive(Debug)]
struct Entry {
    expr: Rc<Expr>,
    users: HashSet<NodeId>,
}

/// Parsed expressions keyed by rewritten source.
///
/// Every entry remembers the nodes that evaluated it; an entry is dropped
/// once its last user is released, so loop items with churning keys do not
/// accumulate sources.
#[derive(Debug, Default)]
pub struct ExpressionCache {
    entries: HashMap<String, Entry>,
    by_node: HashMap<NodeId, HashSet<String>>,
}

impl ExpressionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// The parsed form of `source` for `node`, parsing on a miss.
    pub fn get_or_parse<E>(
        &mut self,
        node: NodeId,
        source: &str,
        parse: impl FnOnce(&str) -> Result<Expr, E>,
    ) -> Result<Rc<Expr>, E> {
        let expr = match self.entries.get_mut(source) {
            Some(entry) => {
                entry.users.insert(node);
                Rc::clone(&entry.expr)
            }
            None => {
                let expr = Rc::new(parse(source)?);
                self.entries.insert(
                    source.to_owned(),
                    Entry {
                        expr: Rc::clone(&expr),
                        users: HashSet::from([node]),
                    },
                );
                expr
            }
        };
        self.by_node.entry(node).or_default().insert(source.to_owned());
        Ok(expr)
    }

    /// Forget `node`, dropping the entries nobody else uses.
    pub fn release(&mut self, node: NodeId) {
        let Some(sources) = self.by_node.remove(&node) else {
            return;
        };
        for source in sources {
            if let Some(entry) = self.entries.get_mut(&source) {
                entry.users.remove(&node);
                if entry.users.is_empty() {
                    self.entries.remove(&source);
                }
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.by_node.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expr;
    use slotmap::SlotMap;

    fn nodes(n: usize) -> Vec<NodeId> {
        let mut map: SlotMap<NodeId, ()> = SlotMap::with_key();
        (0..n).map(|_| map.insert(())).collect()
    }

    #[test]
    fn shared_sources_parse_once() {
        let ids = nodes(2);
        let mut cache = ExpressionCache::new();
        let a = cache.get_or_parse(ids[0], "x + 1", expr::parse).unwrap();
        let b = cache
            .get_or_parse(ids[1], "x + 1", |_| -> Result<Expr, ()> { panic!("parsed twice") })
            .unwrap();
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn entries_live_until_the_last_user_goes() {
        let ids = nodes(2);
        let mut cache = ExpressionCache::new();
        cache.get_or_parse(ids[0], "x", expr::parse).unwrap();
        cache.get_or_parse(ids[1], "x", expr::parse).unwrap();
        cache.get_or_parse(ids[1], "y", expr::parse).unwrap();

        cache.release(ids[0]);
        assert_eq!(cache.len(), 2);
        cache.release(ids[1]);
        assert_eq!(cache.len(), 0);
        cache.release(ids[1]);
    }

    #[test]
    fn parse_errors_are_not_cached() {
        let ids = nodes(1);
        let mut cache = ExpressionCache::new();
        assert!(cache.get_or_parse(ids[0], "(", expr::parse).is_err());
        assert_eq!(cache.len(), 0);
    }
}
