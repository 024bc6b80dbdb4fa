use core::fmt;

use crate::{
    error::{Error, Result},
    timestamp::Timestamp,
};

// A single opaque name component. Ordering is plain byte-wise lexicographic,
//  which is also the order in which siblings are kept inside the trie.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Component {
    bytes: Box<[u8]>,
}

const VERSION_MARKER: u8 = 0xFD;

impl Component {
    pub fn new(bytes: &[u8]) -> Self {
        Self {
            bytes: Box::from(bytes),
        }
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    // The marker byte followed by the big-endian milliseconds. Fixed width, so that
    //  byte-wise component order is also chronological order.
    pub fn version(timestamp: Timestamp) -> Self {
        let mut bytes = Vec::with_capacity(9);
        bytes.push(VERSION_MARKER);
        bytes.extend_from_slice(&timestamp.ms_since_1970.to_be_bytes());
        Self {
            bytes: bytes.into_boxed_slice(),
        }
    }

    pub fn as_version(&self) -> Option<Timestamp> {
        let (marker, rest) = self.bytes.split_first()?;
        if *marker != VERSION_MARKER || rest.len() > 8 {
            return None;
        }
        let ms = rest.iter().fold(0u64, |acc, b| (acc << 8) | *b as u64);
        Some(Timestamp::from_ms(ms))
    }
}

impl From<&[u8]> for Component {
    fn from(value: &[u8]) -> Self {
        Component::new(value)
    }
}

impl From<Vec<u8>> for Component {
    fn from(value: Vec<u8>) -> Self {
        Self {
            bytes: value.into_boxed_slice(),
        }
    }
}

impl From<&str> for Component {
    fn from(value: &str) -> Self {
        Component::new(value.as_bytes())
    }
}

impl AsRef<[u8]> for Component {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Components made only of dots would read as relative paths
        if self.bytes.iter().all(|b| *b == b'.') {
            f.write_str("...")?;
        }
        for b in self.bytes.iter() {
            if b.is_ascii_alphanumeric() || matches!(b, b'-' | b'.' | b'_' | b'~') {
                write!(f, "{}", *b as char)?;
            } else {
                write!(f, "%{:02X}", b)?;
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Component({})", self)
    }
}

// A hierarchical name. The derived ordering compares components in order and
//  then by length, so a name always sorts before its extensions.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Name {
    components: Vec<Component>,
}

impl Name {
    pub fn new() -> Self {
        Self {
            components: Vec::new(),
        }
    }

    pub fn from_components<I, C>(components: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Component>,
    {
        Self {
            components: components.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_uri(uri: &str) -> Result<Self> {
        let invalid = |reason| Error::InvalidUri {
            uri: uri.to_string(),
            reason,
        };

        let path = uri.strip_prefix("ccnx:").unwrap_or(uri);
        let path = path.strip_prefix('/').ok_or_else(|| invalid("must start with '/'"))?;
        let path = path.strip_suffix('/').unwrap_or(path);

        let mut components = Vec::new();
        if path.is_empty() {
            return Ok(Self { components });
        }

        for segment in path.split('/') {
            if segment.is_empty() {
                return Err(invalid("empty component"));
            }
            let mut bytes = Vec::with_capacity(segment.len());
            let mut raw = segment.bytes();
            while let Some(b) = raw.next() {
                if b == b'%' {
                    let hi = raw.next().and_then(hex_value);
                    let lo = raw.next().and_then(hex_value);
                    match (hi, lo) {
                        (Some(hi), Some(lo)) => bytes.push((hi << 4) | lo),
                        _ => return Err(invalid("bad percent escape")),
                    }
                } else {
                    bytes.push(b);
                }
            }
            if bytes.iter().all(|b| *b == b'.') {
                // "." and ".." have no meaning in a name, "..." escapes the dots
                if bytes.len() < 3 {
                    return Err(invalid("relative component"));
                }
                bytes.drain(..3);
            }
            components.push(Component::from(bytes));
        }

        Ok(Self { components })
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn components(&self) -> impl DoubleEndedIterator<Item = &Component> + ExactSizeIterator {
        self.components.iter()
    }

    pub fn component(&self, index: usize) -> Option<&Component> {
        self.components.get(index)
    }

    pub fn last_component(&self) -> Option<&Component> {
        self.components.last()
    }

    // Length-bounded component comparison, not a byte substring test
    pub fn is_prefix_of(&self, other: &Name) -> bool {
        self.components.len() <= other.components.len()
            && self
                .components
                .iter()
                .zip(other.components.iter())
                .all(|(a, b)| a == b)
    }

    pub fn prefix(&self, count: usize) -> Name {
        let count = count.min(self.components.len());
        Name {
            components: self.components[..count].to_vec(),
        }
    }

    pub fn dropping_last_component(&self) -> Option<Name> {
        if self.components.is_empty() {
            return None;
        }
        Some(self.prefix(self.components.len() - 1))
    }

    pub fn adding_component(&self, component: impl Into<Component>) -> Name {
        let mut components = Vec::with_capacity(self.components.len() + 1);
        components.extend_from_slice(&self.components);
        components.push(component.into());
        Name { components }
    }

    pub fn with_digest(&self, digest: &[u8; 32]) -> Name {
        self.adding_component(Component::new(digest))
    }
}

fn hex_value(b: u8) -> Option<u8> {
    match b {
        b'0'..=b'9' => Some(b - b'0'),
        b'a'..=b'f' => Some(b - b'a' + 10),
        b'A'..=b'F' => Some(b - b'A' + 10),
        _ => None,
    }
}

impl fmt::Display for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.components.is_empty() {
            return f.write_str("/");
        }
        for c in self.components.iter() {
            write!(f, "/{}", c)?;
        }
        Ok(())
    }
}

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({})", self)
    }
}

impl core::str::FromStr for Name {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Name::from_uri(s)
    }
}
