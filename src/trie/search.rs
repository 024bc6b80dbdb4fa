use core::ops::Bound;
use std::sync::Arc;

use tracing::{trace, warn};

use super::TrieNode;
use crate::{
    interest::{ChildSelector, Interest, TrustDelegate},
    name::Component,
    store::{ContentGetter, ContentObject},
};

// What the interest allows us to do at one node, decided from its depth alone
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum Screen {
    // Nothing in or below this node can match
    Prune,
    // Our own content is too short, descendants may still match
    ChildrenOnly,
    Full,
}

// A single search of the trie below the node that spells out the interest name.
//
// Depths are counted from the root, the prefix node sits at `prefix_depth`. Content
//  stored at depth `d` has `d - prefix_depth + 1` suffix components once the implicit
//  digest is counted, which lets us skip whole subtrees without calling the getter.
pub(super) struct Search<'a, G: ?Sized, T: ?Sized> {
    interest: &'a Interest,
    getter: &'a G,
    trust: &'a T,
    prefix_depth: usize,
}

impl<'a, G: ?Sized, T: TrustDelegate + ?Sized> Search<'a, G, T> {
    pub(super) fn new(interest: &'a Interest, getter: &'a G, trust: &'a T) -> Self {
        Self {
            interest,
            getter,
            trust,
            prefix_depth: interest.name.component_count(),
        }
    }

    pub(super) fn run<R>(&self, prefix_node: &Arc<TrieNode<R>>) -> Option<ContentObject>
    where
        R: Clone,
        G: ContentGetter<R>,
    {
        match self.interest.child_selector {
            ChildSelector::Leftmost => self.leftmost(prefix_node, self.prefix_depth),
            ChildSelector::Rightmost => self.rightmost(prefix_node),
        }
    }

    // Refs are tried in insertion order whatever the child selector says
    pub(super) fn first_match<R>(&self, refs: &[R]) -> Option<ContentObject>
    where
        G: ContentGetter<R>,
    {
        for content_ref in refs.iter() {
            let Some(object) = self.getter.resolve(content_ref) else {
                warn!(prefix = %self.interest.name, "stored reference no longer resolves");
                continue;
            };
            if self.interest.matches_object_with(&object, self.trust) {
                return Some(object);
            }
            trace!(name = %object.name, "candidate rejected");
        }
        None
    }

    fn suffix_len(&self, depth: usize) -> usize {
        depth - self.prefix_depth + 1
    }

    fn screen<R>(&self, node: &Arc<TrieNode<R>>, depth: usize) -> Screen {
        let suffix_len = self.suffix_len(depth);
        if self
            .interest
            .max_suffix_components
            .is_some_and(|max| suffix_len > max)
        {
            return Screen::Prune;
        }

        if depth == self.prefix_depth + 1 {
            if let (Some(exclude), Some(component)) = (&self.interest.exclude, node.component()) {
                if exclude.matches(component) {
                    trace!(%component, "branch excluded");
                    return Screen::Prune;
                }
            }
        }

        if self
            .interest
            .min_suffix_components
            .is_some_and(|min| suffix_len < min)
        {
            return Screen::ChildrenOnly;
        }
        Screen::Full
    }

    // Children would exceed the maximum suffix length
    fn children_too_deep(&self, depth: usize) -> bool {
        self.interest
            .max_suffix_components
            .is_some_and(|max| self.suffix_len(depth) >= max)
    }

    // The exclude only applies directly below the prefix
    fn lower_bound(&self, depth: usize) -> Bound<&Component> {
        match &self.interest.exclude {
            Some(exclude) if depth == self.prefix_depth => exclude.lower_bound(),
            _ => Bound::Unbounded,
        }
    }

    // Own content first, then the subtrees in ascending component order
    fn leftmost<R>(&self, node: &Arc<TrieNode<R>>, depth: usize) -> Option<ContentObject>
    where
        R: Clone,
        G: ContentGetter<R>,
    {
        let screen = self.screen(node, depth);
        if screen == Screen::Prune {
            return None;
        }

        let (refs, children) = node.snapshot();
        if screen == Screen::Full {
            if let Some(object) = self.first_match(&refs) {
                return Some(object);
            }
        }
        if self.children_too_deep(depth) {
            return None;
        }

        children
            .range(self.lower_bound(depth), Bound::Unbounded)
            .find_map(|child| self.leftmost(child, depth + 1))
    }

    // Only the choice of branch below the prefix is made right to left. Inside the
    //  chosen branch the search is leftmost, and the prefix node's own content, the
    //  shortest possible match, comes last.
    fn rightmost<R>(&self, node: &Arc<TrieNode<R>>) -> Option<ContentObject>
    where
        R: Clone,
        G: ContentGetter<R>,
    {
        let depth = self.prefix_depth;
        let screen = self.screen(node, depth);
        if screen == Screen::Prune {
            return None;
        }

        let (refs, children) = node.snapshot();
        if !self.children_too_deep(depth) {
            let upper = match &self.interest.exclude {
                Some(exclude) => exclude.upper_bound(),
                None => Bound::Unbounded,
            };
            let found = children
                .range(Bound::Unbounded, upper)
                .rev()
                .find_map(|child| self.leftmost(child, depth + 1));
            if found.is_some() {
                return found;
            }
        }

        if screen == Screen::Full {
            return self.first_match(&refs);
        }
        None
    }
}
