use crate::name::Component;

// Command marker that identifies name enumeration requests: %C1.E.be
pub const DEFAULT_ENUMERATION_MARKER: &[u8] = &[0xC1, b'.', b'E', b'.', b'b', b'e'];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnumerationConfig {
    // Requests are named <prefix>/<marker>, responses <prefix>/<marker>/<version>
    pub marker: Component,
    // Caps how many child names a single response carries, the rest is dropped
    //  and the response is marked as truncated
    pub max_children: Option<usize>,
}

impl Default for EnumerationConfig {
    fn default() -> Self {
        Self {
            marker: Component::new(DEFAULT_ENUMERATION_MARKER),
            max_children: None,
        }
    }
}
