mod search;

use core::fmt;
use core::ops::{Bound, RangeBounds};
use std::{
    collections::{btree_map, BTreeMap},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::debug;

use crate::{
    interest::{Interest, KeyDigestTrust, TrustDelegate},
    name::{Component, Name},
    store::{ContentGetter, ContentObject, ContentRef},
    timestamp::Timestamp,
};

use search::Search;

// The in-memory index of a repository: a prefix trie over name components whose
//  nodes hold opaque references to the objects stored under exactly that name.
//
// Nodes are created on insert and never removed. Each node has its own lock and
//  nothing ever holds two of them at once. Readers copy what they need out of a node
//  (its refs, an `Arc` to its children) and release the lock before descending or
//  calling out to a getter, so lookups never block behind I/O done elsewhere.
pub struct NameTrie<R = ContentRef> {
    root: Arc<TrieNode<R>>,
}

// Child names of a prefix and the time they were last extended
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ChildListing {
    pub prefix: Name,
    pub names: Vec<Component>,
    pub timestamp: Timestamp,
}

#[derive(Debug, PartialEq, Eq)]
pub struct Insertion {
    // False when identical content was already present under the name
    pub inserted: bool,
    // Listings for prefixes whose enumerators were waiting for a new child.
    //  The caller delivers these, the trie never calls out while inserting.
    pub notices: Vec<ChildListing>,
}

impl<R> Default for NameTrie<R> {
    fn default() -> Self {
        Self {
            root: Arc::new(TrieNode::new(None, Timestamp::ZERO)),
        }
    }
}

impl<R: Clone + PartialEq> NameTrie<R> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert<G>(
        &self,
        name: &Name,
        content_ref: R,
        timestamp: Timestamp,
        getter: &G,
    ) -> Insertion
    where
        G: ContentGetter<R> + ?Sized,
    {
        let mut notices = Vec::new();
        let mut node = Arc::clone(&self.root);

        for (depth, component) in name.components().enumerate() {
            let (child, listing) = node.child_or_insert(component, timestamp);
            if let Some((names, timestamp)) = listing {
                notices.push(ChildListing {
                    prefix: name.prefix(depth),
                    names,
                    timestamp,
                });
            }
            node = child;
        }

        let inserted = node.add_ref(content_ref, getter);
        debug!(%name, inserted, notices = notices.len(), "insert");
        Insertion { inserted, notices }
    }

    // A missing node anywhere along the path means there is nothing, no fallback
    pub fn lookup_exact(&self, name: &Name) -> Vec<R> {
        match self.find_node(name) {
            Some(node) => node.state.lock().refs.clone(),
            None => Vec::new(),
        }
    }

    pub fn match_content(&self, name: &Name) -> bool {
        self.find_node(name)
            .is_some_and(|node| !node.state.lock().refs.is_empty())
    }

    pub fn get<G>(&self, interest: &Interest, getter: &G) -> Option<ContentObject>
    where
        G: ContentGetter<R> + ?Sized,
    {
        self.get_with(interest, getter, &KeyDigestTrust)
    }

    pub fn get_with<G, T>(&self, interest: &Interest, getter: &G, trust: &T) -> Option<ContentObject>
    where
        G: ContentGetter<R> + ?Sized,
        T: TrustDelegate + ?Sized,
    {
        let search = Search::new(interest, getter, trust);

        if !interest.pins_digest() {
            if let Some(node) = self.find_node(&interest.name) {
                return search.run(&node);
            }
        }

        // We store names without their digest, so a name that ends in one can only
        //  be answered by an object stored at the parent
        let parent = interest.name.dropping_last_component()?;
        match self.find_node(&parent) {
            Some(node) => {
                let refs = node.state.lock().refs.clone();
                search.first_match(&refs)
            }
            None => {
                debug!(name = %interest.name, "no such prefix");
                None
            }
        }
    }

    // Answers immediately if children were added after `since`. Otherwise flags the
    //  prefix, so that the next insert of a child produces a notice, and returns `None`.
    pub fn names_with_prefix(&self, prefix: &Name, since: Option<Timestamp>) -> Option<ChildListing> {
        let Some(node) = self.find_node(prefix) else {
            debug!(%prefix, "enumeration of unknown prefix");
            return None;
        };

        let listing = {
            let mut state = node.state.lock();
            match since {
                Some(since) if state.timestamp <= since => {
                    state.interest_flag = true;
                    None
                }
                _ => {
                    state.notified_since_insert = true;
                    Some(ChildListing {
                        prefix: prefix.clone(),
                        names: state.children.names(),
                        timestamp: state.timestamp,
                    })
                }
            }
        };

        if listing.is_none() {
            debug!(%prefix, ?since, "nothing new, flagged for notification");
        }
        listing
    }

    // Number of stored references
    pub fn len(&self) -> usize {
        fn count<R: Clone>(node: &Arc<TrieNode<R>>) -> usize {
            let (refs, children) = node.snapshot();
            let below: usize = children
                .range(Bound::Unbounded, Bound::Unbounded)
                .map(count)
                .sum();
            refs.len() + below
        }
        count(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn dump<W: fmt::Write>(&self, out: &mut W) -> fmt::Result {
        self.root.dump(out, 0)
    }

    fn find_node(&self, name: &Name) -> Option<Arc<TrieNode<R>>> {
        let mut node = Arc::clone(&self.root);
        for component in name.components() {
            node = node.child(component)?;
        }
        Some(node)
    }
}

pub(crate) struct TrieNode<R> {
    // None only for the root
    component: Option<Component>,
    state: Mutex<NodeState<R>>,
}

struct NodeState<R> {
    children: Children<R>,
    refs: Vec<R>,
    timestamp: Timestamp,
    // An enumerator is waiting for our next child
    interest_flag: bool,
    // The current child listing has been handed out
    notified_since_insert: bool,
}

impl<R> TrieNode<R> {
    fn new(component: Option<Component>, timestamp: Timestamp) -> Self {
        Self {
            component,
            state: Mutex::new(NodeState {
                children: Children::Empty,
                refs: Vec::new(),
                timestamp,
                interest_flag: false,
                notified_since_insert: false,
            }),
        }
    }

    pub(crate) fn component(&self) -> Option<&Component> {
        self.component.as_ref()
    }

    fn child(&self, component: &Component) -> Option<Arc<TrieNode<R>>> {
        self.state.lock().children.get(component).cloned()
    }

    // Also returns the fresh child listing when an enumerator was waiting on us
    fn child_or_insert(
        &self,
        component: &Component,
        timestamp: Timestamp,
    ) -> (Arc<TrieNode<R>>, Option<(Vec<Component>, Timestamp)>) {
        let mut state = self.state.lock();
        if let Some(child) = state.children.get(component) {
            return (Arc::clone(child), None);
        }

        let child = Arc::new(TrieNode::new(Some(component.clone()), timestamp));
        state.children.insert(component.clone(), Arc::clone(&child));

        // Once an enumerator holds our timestamp it has to move forward, even for
        //  an out-of-order insert, or that enumerator would never see this child
        let observed = state.notified_since_insert || state.interest_flag;
        if timestamp > state.timestamp {
            state.timestamp = timestamp;
        } else if observed {
            state.timestamp = state.timestamp.adding(1);
        }

        let listing = if state.interest_flag {
            state.interest_flag = false;
            state.notified_since_insert = true;
            Some((state.children.names(), state.timestamp))
        } else {
            state.notified_since_insert = false;
            None
        };
        (child, listing)
    }
}

impl<R: Clone> TrieNode<R> {
    pub(crate) fn snapshot(&self) -> (Vec<R>, Children<R>) {
        let state = self.state.lock();
        (state.refs.clone(), state.children.clone())
    }

    fn dump<W: fmt::Write>(&self, out: &mut W, depth: usize) -> fmt::Result {
        let (refs, children, timestamp, flagged) = {
            let state = self.state.lock();
            (
                state.refs.len(),
                state.children.clone(),
                state.timestamp,
                state.interest_flag,
            )
        };

        match &self.component {
            Some(component) => write!(out, "{:indent$}{}", "", component, indent = depth * 2)?,
            None => out.write_str("/")?,
        }
        write!(out, " refs={} ts={}", refs, timestamp.ms_since_1970)?;
        if flagged {
            out.write_str(" flagged")?;
        }
        out.write_char('\n')?;

        for child in children.range(Bound::Unbounded, Bound::Unbounded) {
            child.dump(out, depth + 1)?;
        }
        Ok(())
    }
}

impl<R: Clone + PartialEq> TrieNode<R> {
    // Rejects content equal to what is already stored here. The getter is only
    //  called with the lock released, so we re-check whatever was appended meanwhile.
    fn add_ref<G>(&self, content_ref: R, getter: &G) -> bool
    where
        G: ContentGetter<R> + ?Sized,
    {
        let mut checked = 0;
        let mut incoming: Option<Option<ContentObject>> = None;
        loop {
            let pending = {
                let mut state = self.state.lock();
                if state.refs.len() == checked {
                    state.refs.push(content_ref);
                    return true;
                }
                state.refs[checked..].to_vec()
            };

            for existing in pending.iter() {
                if *existing == content_ref {
                    return false;
                }
                let resolved = incoming.get_or_insert_with(|| getter.resolve(&content_ref));
                if let Some(object) = resolved.as_ref() {
                    if getter.resolve(existing).as_ref() == Some(object) {
                        return false;
                    }
                }
            }
            checked += pending.len();
        }
    }
}

// Most nodes have a single child, so we only pay for a map once there are two
pub(crate) enum Children<R> {
    Empty,
    One(Component, Arc<TrieNode<R>>),
    Many(Arc<BTreeMap<Component, Arc<TrieNode<R>>>>),
}

impl<R> Clone for Children<R> {
    fn clone(&self) -> Self {
        match self {
            Children::Empty => Children::Empty,
            Children::One(key, child) => Children::One(key.clone(), Arc::clone(child)),
            Children::Many(map) => Children::Many(Arc::clone(map)),
        }
    }
}

impl<R> Children<R> {
    fn get(&self, component: &Component) -> Option<&Arc<TrieNode<R>>> {
        match self {
            Children::Empty => None,
            Children::One(key, child) => (key == component).then_some(child),
            Children::Many(map) => map.get(component),
        }
    }

    fn insert(&mut self, key: Component, child: Arc<TrieNode<R>>) {
        match core::mem::replace(self, Children::Empty) {
            Children::Empty => *self = Children::One(key, child),
            Children::One(existing_key, existing) => {
                let mut map = BTreeMap::new();
                map.insert(existing_key, existing);
                map.insert(key, child);
                *self = Children::Many(Arc::new(map));
            }
            // Searches may still be walking the old map, in which case we copy it
            Children::Many(mut map) => {
                Arc::make_mut(&mut map).insert(key, child);
                *self = Children::Many(map);
            }
        }
    }

    fn names(&self) -> Vec<Component> {
        match self {
            Children::Empty => Vec::new(),
            Children::One(key, _) => vec![key.clone()],
            Children::Many(map) => map.keys().cloned().collect(),
        }
    }

    // Children between the bounds in ascending order, `.rev()` walks them descending
    pub(crate) fn range<'a>(
        &'a self,
        lower: Bound<&Component>,
        upper: Bound<&Component>,
    ) -> ChildRange<'a, R> {
        match self {
            Children::Empty => ChildRange::One(None),
            Children::One(key, child) => {
                ChildRange::One((lower, upper).contains(key).then_some(child))
            }
            Children::Many(map) => ChildRange::Many(map.range::<Component, _>((lower, upper))),
        }
    }
}

pub(crate) enum ChildRange<'a, R> {
    One(Option<&'a Arc<TrieNode<R>>>),
    Many(btree_map::Range<'a, Component, Arc<TrieNode<R>>>),
}

impl<'a, R> Iterator for ChildRange<'a, R> {
    type Item = &'a Arc<TrieNode<R>>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            ChildRange::One(child) => child.take(),
            ChildRange::Many(range) => range.next().map(|(_, child)| child),
        }
    }
}

impl<'a, R> DoubleEndedIterator for ChildRange<'a, R> {
    fn next_back(&mut self) -> Option<Self::Item> {
        match self {
            ChildRange::One(child) => child.take(),
            ChildRange::Many(range) => range.next_back().map(|(_, child)| child),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        exclude::{ExcludeSpec, Filler},
        interest::{PublisherConstraint, PublisherDigest},
        store::MemoryStore,
    };
    use proptest::prelude::*;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    fn put(trie: &NameTrie, store: &MemoryStore, uri: &str, ms: u64) -> Insertion {
        let object = ContentObject::new(name(uri), uri.as_bytes().to_vec());
        let content_ref = store.append(object);
        trie.insert(&name(uri), content_ref, Timestamp::from_ms(ms), store)
    }

    fn found(trie: &NameTrie, store: &MemoryStore, interest: &Interest) -> Option<String> {
        trie.get(interest, store).map(|object| object.name.to_string())
    }

    fn populated(uris: &[&str]) -> (NameTrie, MemoryStore) {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        for (i, uri) in uris.iter().enumerate() {
            assert!(put(&trie, &store, uri, i as u64 + 1).inserted);
        }
        (trie, store)
    }

    #[test]
    fn test_child_selector() {
        let (trie, store) = populated(&["/a/2", "/a/3", "/a/1"]);
        let interest = Interest::new(name("/a"));
        assert_eq!(found(&trie, &store, &interest).as_deref(), Some("/a/1"));
        assert_eq!(
            found(&trie, &store, &interest.rightmost()).as_deref(),
            Some("/a/3")
        );
    }

    #[test]
    fn test_rightmost_is_leftmost_inside_the_chosen_branch() {
        let (trie, store) = populated(&["/a/2/x", "/a/2/y", "/a/1", "/a"]);
        let interest = Interest::new(name("/a")).rightmost();
        assert_eq!(found(&trie, &store, &interest).as_deref(), Some("/a/2/x"));

        // The prefix's own content is the last resort
        let interest = interest.with_exclude(ExcludeSpec::from_components([
            Component::from("1"),
            Component::from("2"),
        ]));
        assert_eq!(found(&trie, &store, &interest).as_deref(), Some("/a"));
    }

    #[test]
    fn test_next_and_last_of_a_prefix() {
        let (trie, store) = populated(&["/x/aaa", "/x/bbb", "/x/ccc"]);
        let next = Interest::next(&name("/x"), None);
        assert_eq!(found(&trie, &store, &next).as_deref(), Some("/x/aaa"));
        let last = Interest::last(&name("/x"), None);
        assert_eq!(found(&trie, &store, &last).as_deref(), Some("/x/ccc"));
    }

    #[test]
    fn test_sibling_navigation() {
        let (trie, store) = populated(&["/x/aaa", "/x/bbb", "/x/ccc", "/x/ddd"]);
        let next = Interest::next(&name("/x/ccc"), Some(1));
        assert_eq!(found(&trie, &store, &next).as_deref(), Some("/x/ddd"));

        let previous = Interest::previous(&name("/x/ccc"), Some(1));
        assert_eq!(found(&trie, &store, &previous).as_deref(), Some("/x/bbb"));

        let last = Interest::last(&name("/x/zzz"), Some(1));
        assert_eq!(found(&trie, &store, &last).as_deref(), Some("/x/ddd"));
        assert_eq!(found(&trie, &store, &Interest::next(&name("/x/ddd"), Some(1))), None);

        // With the whole name as prefix the object itself is the leftmost match
        let itself = Interest::next(&name("/x/ccc"), None);
        assert_eq!(found(&trie, &store, &itself).as_deref(), Some("/x/ccc"));
    }

    #[test]
    fn test_next_skips_omitted_siblings() {
        let (trie, store) = populated(&["/x/aaa", "/x/bbb", "/x/ccc", "/x/ddd"]);
        let omissions = || [Component::from("bbb"), Component::from("ccc")];

        // Anchored at the last omission, so aaa lies behind the boundary
        let next = Interest::next_excluding(&name("/x/ccc"), Some(1), omissions());
        assert_eq!(found(&trie, &store, &next).as_deref(), Some("/x/ddd"));

        // A bare exclude has no anchor and starts from the left
        let plain = Interest::exclude(name("/x"), omissions());
        assert_eq!(found(&trie, &store, &plain).as_deref(), Some("/x/aaa"));

        let previous = Interest::previous_excluding(&name("/x/ddd"), Some(1), omissions());
        assert_eq!(found(&trie, &store, &previous).as_deref(), Some("/x/aaa"));
    }

    #[test]
    fn test_exclude_everything() {
        let (trie, store) = populated(&["/x", "/x/a", "/x/b"]);
        let exclude = ExcludeSpec::new(vec![Filler::Any]).unwrap();
        let interest = Interest::new(name("/x")).with_exclude(exclude);
        assert_eq!(found(&trie, &store, &interest), None);
        assert_eq!(found(&trie, &store, &interest.rightmost()), None);
    }

    #[test]
    fn test_suffix_bounds() {
        let (trie, store) = populated(&["/a", "/a/b", "/a/b/c"]);
        let interest = Interest::new(name("/a"));
        assert_eq!(found(&trie, &store, &interest).as_deref(), Some("/a"));

        let longer = interest.clone().with_min_suffix_components(2);
        assert_eq!(found(&trie, &store, &longer).as_deref(), Some("/a/b"));

        let longest = interest
            .clone()
            .with_min_suffix_components(3)
            .with_max_suffix_components(3);
        assert_eq!(found(&trie, &store, &longest).as_deref(), Some("/a/b/c"));

        let impossible = interest.with_min_suffix_components(4);
        assert_eq!(found(&trie, &store, &impossible), None);
    }

    #[test]
    fn test_missing_prefix() {
        let (trie, store) = populated(&["/a/b"]);
        assert_eq!(found(&trie, &store, &Interest::new(name("/a/c"))), None);
        assert_eq!(found(&trie, &store, &Interest::new(name("/b"))), None);
        assert_eq!(found(&trie, &store, &Interest::new(Name::new())).as_deref(), Some("/a/b"));
    }

    #[test]
    fn test_exact_digest() {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        let wanted = ContentObject::new(name("/a/b"), b"wanted".to_vec());
        let other = ContentObject::new(name("/a/b"), b"other".to_vec());
        for object in [other.clone(), wanted.clone()] {
            let content_ref = store.append(object.clone());
            trie.insert(&object.name, content_ref, Timestamp::from_ms(1), &store);
        }

        let pinned = Interest::new(wanted.full_name()).with_max_suffix_components(0);
        assert_eq!(trie.get(&pinned, &store), Some(wanted.clone()));

        // A spelled out digest works without the bound as well
        let spelled = Interest::new(wanted.full_name());
        assert_eq!(trie.get(&spelled, &store), Some(wanted.clone()));

        let unknown = Interest::new(name("/a/b").with_digest(&[0; 32])).with_max_suffix_components(0);
        assert_eq!(trie.get(&unknown, &store), None);

        // Without a digest the first stored object wins
        assert_eq!(trie.get(&Interest::new(name("/a/b")), &store), Some(other));
    }

    #[test]
    fn test_publisher_filter() {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        let key = PublisherDigest([9; 32]);
        let unsigned = ContentObject::new(name("/p/1"), b"1".to_vec());
        let signed = ContentObject::new(name("/p/2"), b"2".to_vec()).with_publisher(key);
        for object in [unsigned, signed.clone()] {
            let content_ref = store.append(object.clone());
            trie.insert(&object.name, content_ref, Timestamp::from_ms(1), &store);
        }

        let interest = Interest::new(name("/p")).with_publisher(PublisherConstraint::key(key));
        assert_eq!(trie.get(&interest, &store), Some(signed));
    }

    #[test]
    fn test_duplicates_are_rejected() {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        let object = ContentObject::new(name("/d"), b"same".to_vec());

        let first = store.append(object.clone());
        assert!(trie.insert(&object.name, first, Timestamp::from_ms(1), &store).inserted);
        assert!(!trie.insert(&object.name, first, Timestamp::from_ms(2), &store).inserted);

        // Another copy of identical content in the log
        let second = store.append(object.clone());
        assert!(!trie.insert(&object.name, second, Timestamp::from_ms(3), &store).inserted);

        let changed = store.append(ContentObject::new(name("/d"), b"changed".to_vec()));
        assert!(trie.insert(&object.name, changed, Timestamp::from_ms(4), &store).inserted);
        assert_eq!(trie.lookup_exact(&name("/d")), vec![first, changed]);
        assert_eq!(trie.len(), 2);
    }

    #[test]
    fn test_unresolvable_refs_are_skipped() {
        let (trie, store) = populated(&["/a/1", "/a/2"]);
        assert!(store.evict(ContentRef(0)).is_some());
        let interest = Interest::new(name("/a"));
        assert_eq!(found(&trie, &store, &interest).as_deref(), Some("/a/2"));
        assert!(trie.match_content(&name("/a/1")));
    }

    #[test]
    fn test_exact_lookup() {
        let (trie, _store) = populated(&["/a/b", "/a/b/c"]);
        assert_eq!(trie.lookup_exact(&name("/a/b")), vec![ContentRef(0)]);
        assert!(trie.lookup_exact(&name("/a")).is_empty());
        assert!(trie.lookup_exact(&name("/a/x")).is_empty());
        assert!(trie.match_content(&name("/a/b/c")));
        assert!(!trie.match_content(&name("/a")));
        assert_eq!(trie.len(), 2);
        assert!(NameTrie::<ContentRef>::new().is_empty());
    }

    #[test]
    fn test_children_grow_from_one_to_many() {
        let (trie, store) = populated(&["/a/m"]);
        let names = |trie: &NameTrie| trie.names_with_prefix(&name("/a"), None).unwrap().names;
        assert_eq!(names(&trie), vec![Component::from("m")]);
        let node = trie.find_node(&name("/a")).unwrap();
        assert!(matches!(node.snapshot().1, Children::One(..)));

        put(&trie, &store, "/a/z", 5);
        put(&trie, &store, "/a/b", 6);
        assert_eq!(
            names(&trie),
            ["b", "m", "z"].into_iter().map(Component::from).collect::<Vec<_>>()
        );
        assert!(matches!(node.snapshot().1, Children::Many(map) if map.len() == 3));
    }

    #[test]
    fn test_enumeration_flag_and_notice() {
        let (trie, store) = populated(&["/a/b"]);
        let first = trie.names_with_prefix(&name("/a"), None).unwrap();
        assert_eq!(first.timestamp, Timestamp::from_ms(1));

        // Nothing new since the listing above
        assert_eq!(trie.names_with_prefix(&name("/a"), Some(first.timestamp)), None);
        assert_eq!(trie.names_with_prefix(&name("/nope"), None), None);

        let insertion = put(&trie, &store, "/a/c/deep", 20);
        assert_eq!(
            insertion.notices,
            vec![ChildListing {
                prefix: name("/a"),
                names: vec![Component::from("b"), Component::from("c")],
                timestamp: Timestamp::from_ms(20),
            }]
        );

        // Flag cleared by the notice
        assert!(put(&trie, &store, "/a/d", 30).notices.is_empty());
        let again = trie.names_with_prefix(&name("/a"), Some(first.timestamp)).unwrap();
        assert_eq!(again.names.len(), 3);
        assert_eq!(again.timestamp, Timestamp::from_ms(30));
    }

    #[test]
    fn test_root_enumeration() {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        assert_eq!(trie.names_with_prefix(&Name::new(), Some(Timestamp::ZERO)), None);
        let insertion = put(&trie, &store, "/x", 5);
        assert_eq!(insertion.notices.len(), 1);
        assert_eq!(insertion.notices[0].prefix, Name::new());
        assert_eq!(insertion.notices[0].names, vec![Component::from("x")]);
    }

    #[test]
    fn test_timestamp_advances_for_late_inserts() {
        let (trie, store) = populated(&["/a/b"]);
        put(&trie, &store, "/a/c", 100);
        let seen = trie.names_with_prefix(&name("/a"), None).unwrap();
        assert_eq!(seen.timestamp, Timestamp::from_ms(100));

        put(&trie, &store, "/a/d", 50);
        let after = trie.names_with_prefix(&name("/a"), Some(seen.timestamp)).unwrap();
        assert!(after.timestamp > seen.timestamp);
        assert_eq!(after.names.len(), 3);
    }

    #[test]
    fn test_dump() {
        let (trie, _store) = populated(&["/a/b", "/a/c"]);
        assert_eq!(trie.names_with_prefix(&name("/a/b"), Some(Timestamp::from_ms(10))), None);
        let mut out = String::new();
        trie.dump(&mut out).unwrap();
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("/ refs=0"));
        assert!(lines[1].starts_with("  a refs=0"));
        assert!(lines[2].starts_with("    b refs=1"));
        assert!(lines[2].ends_with("flagged"));
        assert!(lines[3].starts_with("    c refs=1"));
    }

    #[test]
    fn test_concurrent_inserts_and_searches() {
        let trie = NameTrie::new();
        let store = MemoryStore::new();
        std::thread::scope(|scope| {
            for t in 0..8 {
                let (trie, store) = (&trie, &store);
                scope.spawn(move || {
                    for i in 0..50 {
                        let uri = format!("/shared/{}/{}", i % 5, t * 100 + i);
                        put(trie, store, &uri, i);
                    }
                });
            }
            for _ in 0..2 {
                let (trie, store) = (&trie, &store);
                scope.spawn(move || {
                    for _ in 0..100 {
                        if let Some(object) = trie.get(&Interest::new(name("/shared")), store) {
                            assert!(name("/shared").is_prefix_of(&object.name));
                        }
                    }
                });
            }
        });

        assert_eq!(trie.len(), 400);
        let listing = trie.names_with_prefix(&name("/shared"), None).unwrap();
        assert_eq!(listing.names.len(), 5);
        for t in 0..8 {
            let uri = format!("/shared/3/{}", t * 100 + 3);
            assert!(trie.match_content(&name(&uri)), "{uri}");
        }
    }

    fn component_strategy() -> impl Strategy<Value = String> {
        prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(str::to_string)
    }

    fn name_strategy() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(component_strategy(), 0..4)
    }

    proptest! {
        #[test]
        fn test_results_satisfy_the_interest(
            names in prop::collection::vec(name_strategy(), 1..20),
            prefix in name_strategy(),
            min in prop::option::of(0usize..4),
            max in prop::option::of(0usize..4),
            excluded in prop::collection::vec(component_strategy(), 0..3),
            rightmost in any::<bool>(),
        ) {
            let trie = NameTrie::new();
            let store = MemoryStore::new();
            for (i, components) in names.iter().enumerate() {
                let object = ContentObject::new(
                    Name::from_components(components.iter().map(String::as_str)),
                    vec![i as u8],
                );
                let content_ref = store.append(object.clone());
                trie.insert(&object.name, content_ref, Timestamp::from_ms(i as u64), &store);
            }

            let mut interest = Interest::exclude(
                Name::from_components(prefix.iter().map(String::as_str)),
                excluded.iter().map(|c| Component::from(c.as_str())),
            );
            interest.min_suffix_components = min;
            interest.max_suffix_components = max;
            if rightmost {
                interest = interest.rightmost();
            }

            let result = trie.get(&interest, &store);
            if let Some(object) = &result {
                prop_assert!(interest.name.is_prefix_of(&object.full_name()));
                prop_assert!(interest.matches_object(object));
            } else {
                // Nothing was missed
                for i in 0..names.len() {
                    let object = store.resolve(&ContentRef(i as u64)).unwrap();
                    prop_assert!(!interest.matches_object(&object));
                }
            }
        }
    }
}
