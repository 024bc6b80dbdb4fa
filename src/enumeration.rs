use core::ops::Bound;
use std::sync::Arc;

use tracing::debug;

use crate::{
    config::EnumerationConfig,
    exclude::ExcludeSpec,
    interest::Interest,
    name::{Component, Name},
    store::{ContentGetter, ContentRef},
    timestamp::{Clock, MonotonicClock, Timestamp},
    trie::{ChildListing, NameTrie},
};

// Receives the child listing of a prefix that an earlier request found unchanged,
//  as soon as that prefix gains a child. Delivery is up to the implementation.
pub trait NotificationSink {
    fn notify(&self, prefix: &Name, children: &[Component], timestamp: Timestamp);
}

impl<F> NotificationSink for F
where
    F: Fn(&Name, &[Component], Timestamp),
{
    fn notify(&self, prefix: &Name, children: &[Component], timestamp: Timestamp) {
        self(prefix, children, timestamp)
    }
}

// "Which children does `prefix` have, if that changed after `since`"
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationRequest {
    pub prefix: Name,
    pub since: Option<Timestamp>,
}

impl EnumerationRequest {
    pub fn new(prefix: Name, since: Option<Timestamp>) -> Self {
        Self { prefix, since }
    }

    // Requests are named <prefix>/<marker>. An enumerator that has seen a response
    //  excludes every version up to and including the one it saw.
    pub fn from_interest(interest: &Interest, config: &EnumerationConfig) -> Option<Self> {
        if interest.name.last_component()? != &config.marker {
            return None;
        }
        let prefix = interest.name.dropping_last_component()?;
        let since = interest
            .exclude
            .as_ref()
            .and_then(|exclude| match exclude.lower_bound() {
                Bound::Excluded(component) => component.as_version(),
                _ => None,
            });
        Some(Self { prefix, since })
    }

    pub fn to_interest(&self, config: &EnumerationConfig) -> Interest {
        let interest = Interest::new(self.prefix.adding_component(config.marker.clone()));
        match self.since {
            Some(since) => interest.with_exclude(ExcludeSpec::up_to(Component::version(since))),
            None => interest,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationResponse {
    pub prefix: Name,
    pub names: Vec<Component>,
    pub timestamp: Timestamp,
    // Some child names were left out to respect `max_children`
    pub truncated: bool,
}

impl EnumerationResponse {
    fn from_listing(listing: ChildListing, config: &EnumerationConfig) -> Self {
        let ChildListing {
            prefix,
            mut names,
            timestamp,
        } = listing;
        let truncated = config.max_children.is_some_and(|max| names.len() > max);
        if let Some(max) = config.max_children {
            names.truncate(max);
        }
        Self {
            prefix,
            names,
            timestamp,
            truncated,
        }
    }

    pub fn name(&self, config: &EnumerationConfig) -> Name {
        self.prefix
            .adding_component(config.marker.clone())
            .adding_component(Component::version(self.timestamp))
    }
}

// Answers enumeration requests from a shared trie. Requests that find nothing new
//  leave a flag on the prefix, and the insert that next adds a child below it pushes
//  the new listing to the sink.
pub struct NameEnumerationResponder<S, C = MonotonicClock, R = ContentRef> {
    trie: Arc<NameTrie<R>>,
    sink: S,
    clock: C,
    config: EnumerationConfig,
}

impl<S, C, R> NameEnumerationResponder<S, C, R>
where
    S: NotificationSink,
    C: Clock,
    R: Clone + PartialEq,
{
    pub fn new(trie: Arc<NameTrie<R>>, sink: S, clock: C) -> Self {
        Self::with_config(trie, sink, clock, EnumerationConfig::default())
    }

    pub fn with_config(trie: Arc<NameTrie<R>>, sink: S, clock: C, config: EnumerationConfig) -> Self {
        Self {
            trie,
            sink,
            clock,
            config,
        }
    }

    pub fn trie(&self) -> &Arc<NameTrie<R>> {
        &self.trie
    }

    pub fn config(&self) -> &EnumerationConfig {
        &self.config
    }

    pub fn insert<G>(&self, name: &Name, content_ref: R, getter: &G) -> bool
    where
        G: ContentGetter<R> + ?Sized,
    {
        self.insert_at(name, content_ref, self.clock.now(), getter)
    }

    pub fn insert_at<G>(&self, name: &Name, content_ref: R, timestamp: Timestamp, getter: &G) -> bool
    where
        G: ContentGetter<R> + ?Sized,
    {
        let insertion = self.trie.insert(name, content_ref, timestamp, getter);
        // No trie lock is held anymore
        for notice in insertion.notices.iter() {
            debug!(prefix = %notice.prefix, children = notice.names.len(), "pushing child listing");
            self.sink.notify(&notice.prefix, &notice.names, notice.timestamp);
        }
        insertion.inserted
    }

    pub fn names_with_prefix(&self, request: &EnumerationRequest) -> Option<EnumerationResponse> {
        self.trie
            .names_with_prefix(&request.prefix, request.since)
            .map(|listing| EnumerationResponse::from_listing(listing, &self.config))
    }

    // `None` both for Interests that are not enumeration requests and for requests
    //  that have to wait for a push
    pub fn handle_interest(&self, interest: &Interest) -> Option<EnumerationResponse> {
        let request = EnumerationRequest::from_interest(interest, &self.config)?;
        self.names_with_prefix(&request)
    }
}
