use tracing::trace;

use crate::{
    exclude::ExcludeSpec,
    name::{Component, Name},
    store::ContentObject,
};

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PublisherDigest(pub [u8; 32]);

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PublisherKind {
    Key,
    Certificate,
    IssuerKey,
    IssuerCertificate,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PublisherConstraint {
    pub kind: PublisherKind,
    pub digest: PublisherDigest,
}

impl PublisherConstraint {
    pub fn key(digest: PublisherDigest) -> Self {
        Self {
            kind: PublisherKind::Key,
            digest,
        }
    }
}

// Trust evaluation lives outside of matching, we only ask the question
pub trait TrustDelegate {
    fn satisfies(&self, constraint: &PublisherConstraint, candidate: &PublisherDigest) -> bool;
}

// Accepts exactly the publisher key named by a key constraint.
//  Certificate and issuer constraints need a real trust store to be evaluated.
#[derive(Copy, Clone, Debug, Default)]
pub struct KeyDigestTrust;

impl TrustDelegate for KeyDigestTrust {
    fn satisfies(&self, constraint: &PublisherConstraint, candidate: &PublisherDigest) -> bool {
        match constraint.kind {
            PublisherKind::Key => constraint.digest == *candidate,
            _ => false,
        }
    }
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum ChildSelector {
    #[default]
    Leftmost,
    Rightmost,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Interest {
    pub name: Name,
    pub min_suffix_components: Option<usize>,
    pub max_suffix_components: Option<usize>,
    pub publisher: Option<PublisherConstraint>,
    pub exclude: Option<ExcludeSpec>,
    pub child_selector: ChildSelector,

    // Carried along for the surrounding protocol, matching ignores them
    pub scope: Option<u8>,
    pub nonce: Option<[u8; 4]>,
}

impl Interest {
    pub fn new(name: Name) -> Self {
        Self {
            name,
            min_suffix_components: None,
            max_suffix_components: None,
            publisher: None,
            exclude: None,
            child_selector: ChildSelector::Leftmost,
            scope: None,
            nonce: None,
        }
    }

    // Without a prefix count these cover the whole name, so `next(/x)` is the leftmost
    //  content under /x. With `Some(count)` the component at `count` anchors the search:
    //  `next` then wants a sibling after it and `previous` one before it.
    pub fn next(name: &Name, prefix_count: Option<usize>) -> Self {
        Self::next_excluding(name, prefix_count, [])
    }

    pub fn previous(name: &Name, prefix_count: Option<usize>) -> Self {
        Self::previous_excluding(name, prefix_count, [])
    }

    // `next` that also skips the omitted siblings
    pub fn next_excluding<I>(name: &Name, prefix_count: Option<usize>, omissions: I) -> Self
    where
        I: IntoIterator<Item = Component>,
    {
        let (prefix, anchor) = Self::split(name, prefix_count);
        let mut exclude = ExcludeSpec::from_components(omissions);
        if let Some(anchor) = anchor {
            exclude.exclude_up_to(anchor);
        }
        Interest::new(prefix).with_nonempty_exclude(exclude)
    }

    pub fn previous_excluding<I>(name: &Name, prefix_count: Option<usize>, omissions: I) -> Self
    where
        I: IntoIterator<Item = Component>,
    {
        let (prefix, anchor) = Self::split(name, prefix_count);
        let mut exclude = ExcludeSpec::from_components(omissions);
        if let Some(anchor) = anchor {
            exclude.exclude_from(anchor);
        }
        Interest::new(prefix).rightmost().with_nonempty_exclude(exclude)
    }

    // The rightmost content under the first `prefix_count` components of `name`
    pub fn last(name: &Name, prefix_count: Option<usize>) -> Self {
        let (prefix, _) = Self::split(name, prefix_count);
        Interest::new(prefix).rightmost()
    }

    pub fn exclude<I>(name: Name, omissions: I) -> Self
    where
        I: IntoIterator<Item = Component>,
    {
        Interest::new(name).with_exclude(ExcludeSpec::from_components(omissions))
    }

    fn split(name: &Name, prefix_count: Option<usize>) -> (Name, Option<Component>) {
        let count = prefix_count.unwrap_or(name.component_count());
        // Silently truncating would shift every depth the search relies on
        assert!(
            count <= name.component_count(),
            "prefix count {count} exceeds the {} components of {name}",
            name.component_count()
        );
        (name.prefix(count), name.component(count).cloned())
    }

    fn with_nonempty_exclude(self, exclude: ExcludeSpec) -> Self {
        if exclude.is_empty() {
            self
        } else {
            self.with_exclude(exclude)
        }
    }

    pub fn rightmost(mut self) -> Self {
        self.child_selector = ChildSelector::Rightmost;
        self
    }

    pub fn leftmost(mut self) -> Self {
        self.child_selector = ChildSelector::Leftmost;
        self
    }

    pub fn with_min_suffix_components(mut self, min: usize) -> Self {
        self.min_suffix_components = Some(min);
        self
    }

    pub fn with_max_suffix_components(mut self, max: usize) -> Self {
        self.max_suffix_components = Some(max);
        self
    }

    pub fn with_publisher(mut self, publisher: PublisherConstraint) -> Self {
        self.publisher = Some(publisher);
        self
    }

    pub fn with_exclude(mut self, exclude: ExcludeSpec) -> Self {
        self.exclude = Some(exclude);
        self
    }

    pub fn with_scope(mut self, scope: u8) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_nonce(mut self, nonce: [u8; 4]) -> Self {
        self.nonce = Some(nonce);
        self
    }

    // The last component of our name is the digest of the one object we want
    pub fn pins_digest(&self) -> bool {
        self.max_suffix_components == Some(0) && !self.name.is_empty()
    }

    pub fn matches(
        &self,
        name: &Name,
        digest_included: bool,
        publisher: Option<&PublisherDigest>,
    ) -> bool {
        self.matches_with(name, digest_included, publisher, &KeyDigestTrust)
    }

    pub fn matches_with<T: TrustDelegate + ?Sized>(
        &self,
        name: &Name,
        digest_included: bool,
        publisher: Option<&PublisherDigest>,
        trust: &T,
    ) -> bool {
        if !self.name.is_prefix_of(name) {
            return false;
        }

        // The implicit digest counts as one more component when it is not spelled out
        let suffix_len =
            name.component_count() - self.name.component_count() + usize::from(!digest_included);
        if self.max_suffix_components.is_some_and(|max| suffix_len > max) {
            trace!(%name, suffix_len, "too many suffix components");
            return false;
        }
        if self.min_suffix_components.is_some_and(|min| suffix_len < min) {
            trace!(%name, suffix_len, "too few suffix components");
            return false;
        }

        if let Some(exclude) = &self.exclude {
            if let Some(branch) = name.component(self.name.component_count()) {
                if exclude.matches(branch) {
                    trace!(%name, "excluded");
                    return false;
                }
            }
        }

        if let Some(constraint) = &self.publisher {
            match publisher {
                Some(candidate) if trust.satisfies(constraint, candidate) => {}
                _ => {
                    trace!(%name, "publisher constraint not satisfied");
                    return false;
                }
            }
        }

        true
    }

    pub fn matches_object(&self, object: &ContentObject) -> bool {
        self.matches_object_with(object, &KeyDigestTrust)
    }

    // Objects are stored without their digest. We only need the digest when our name
    //  reaches the end of the object's name: then either we pin the digest ourselves,
    //  or the digest is the branch component the exclude has to look at.
    pub fn matches_object_with<T: TrustDelegate + ?Sized>(
        &self,
        object: &ContentObject,
        trust: &T,
    ) -> bool {
        let publisher = object.publisher.as_ref();
        if self.name.component_count() >= object.name.component_count() {
            self.matches_with(&object.full_name(), true, publisher, trust)
        } else {
            self.matches_with(&object.name, false, publisher, trust)
        }
    }
}
