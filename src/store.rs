use parking_lot::RwLock;

use crate::{
    hash::{Hasher, Sha256Hasher},
    interest::PublisherDigest,
    name::Name,
};

// The index only ever holds opaque references to stored objects. Whatever owns the
//  actual bytes (an append-only log, usually) resolves them on demand.

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContentObject {
    // Without the implicit digest component
    pub name: Name,
    pub publisher: Option<PublisherDigest>,
    pub content: Vec<u8>,
}

impl ContentObject {
    pub fn new(name: Name, content: Vec<u8>) -> Self {
        Self {
            name,
            publisher: None,
            content,
        }
    }

    pub fn with_publisher(mut self, publisher: PublisherDigest) -> Self {
        self.publisher = Some(publisher);
        self
    }

    // Every part is length-prefixed so different splits of the same bytes differ
    pub fn digest(&self) -> [u8; 32] {
        let mut hasher = Sha256Hasher::new();
        hasher.update(&(self.name.component_count() as u64).to_be_bytes());
        for component in self.name.components() {
            hasher.update(&(component.len() as u64).to_be_bytes());
            hasher.update(component.bytes());
        }
        match &self.publisher {
            Some(publisher) => {
                hasher.update(&[1]);
                hasher.update(&publisher.0);
            }
            None => hasher.update(&[0]),
        }
        hasher.update(&(self.content.len() as u64).to_be_bytes());
        hasher.update(&self.content);
        hasher.finalize_reset().0
    }

    pub fn full_name(&self) -> Name {
        self.name.with_digest(&self.digest())
    }
}

pub trait ContentGetter<R> {
    // `None` when the object has since been evicted or cannot be read
    fn resolve(&self, content_ref: &R) -> Option<ContentObject>;
}

impl<R, F> ContentGetter<R> for F
where
    F: Fn(&R) -> Option<ContentObject>,
{
    fn resolve(&self, content_ref: &R) -> Option<ContentObject> {
        self(content_ref)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ContentRef(pub u64);

// Append-only in-memory log of objects. References are log positions.
#[derive(Default)]
pub struct MemoryStore {
    objects: RwLock<Vec<Option<ContentObject>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&self, object: ContentObject) -> ContentRef {
        let mut objects = self.objects.write();
        objects.push(Some(object));
        ContentRef(objects.len() as u64 - 1)
    }

    // The reference stays valid but resolves to nothing afterwards
    pub fn evict(&self, content_ref: ContentRef) -> Option<ContentObject> {
        let mut objects = self.objects.write();
        objects.get_mut(content_ref.0 as usize).and_then(Option::take)
    }

    pub fn len(&self) -> usize {
        self.objects.read().iter().filter(|o| o.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ContentGetter<ContentRef> for MemoryStore {
    fn resolve(&self, content_ref: &ContentRef) -> Option<ContentObject> {
        self.objects
            .read()
            .get(content_ref.0 as usize)
            .cloned()
            .flatten()
    }
}
