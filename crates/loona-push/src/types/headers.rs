//! Types for HTTP/2 header blocks

use std::fmt;

use bytes::Bytes;
use http::{Method, StatusCode};
use smallvec::SmallVec;

/// An already-decompressed HTTP/2 header block: pseudo-headers and regular
/// headers in the order the peer sent them. Duplicates are kept.
#[derive(Default, Clone, PartialEq, Eq)]
pub struct HeaderList {
    headers: SmallVec<[Header; 16]>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Header {
    pub name: Bytes,
    pub value: Bytes,
}

impl Header {
    pub fn new(name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Pseudo-headers start with a colon, e.g. `:method`
    pub fn is_pseudo(&self) -> bool {
        self.name.first() == Some(&b':')
    }
}

impl fmt::Debug for Header {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {}",
            String::from_utf8_lossy(&self.name),
            String::from_utf8_lossy(&self.value)
        )
    }
}

impl HeaderList {
    pub fn new() -> Self {
        Default::default()
    }

    /// Append a new header. Does not replace anything.
    pub fn push(&mut self, header: Header) {
        self.headers.push(header);
    }

    /// Builder-style [HeaderList::push]
    pub fn with(mut self, name: impl Into<Bytes>, value: impl Into<Bytes>) -> Self {
        self.push(Header::new(name, value));
        self
    }

    pub fn len(&self) -> usize {
        self.headers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.headers.is_empty()
    }

    /// First value for `name`. HTTP/2 field names are lowercase on the wire,
    /// but we compare case-insensitively anyway.
    pub fn get(&self, name: impl AsRef<[u8]>) -> Option<&Bytes> {
        let name = name.as_ref();
        self.headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| &h.value)
    }

    /// Every value for `name`, in order
    pub fn get_all<'a>(&'a self, name: &'a [u8]) -> impl Iterator<Item = &'a Bytes> + 'a {
        self.headers
            .iter()
            .filter(move |h| h.name.eq_ignore_ascii_case(name))
            .map(|h| &h.value)
    }

    /// Returns true if we have this key/value combination
    pub fn has_kv(&self, k: impl AsRef<[u8]>, v: impl AsRef<[u8]>) -> bool {
        let k = k.as_ref();
        let v = v.as_ref();

        self.headers
            .iter()
            .any(|h| h.name.eq_ignore_ascii_case(k) && h.value.eq_ignore_ascii_case(v))
    }

    /// The `:method` pseudo-header, if present and valid
    pub fn method(&self) -> Option<Method> {
        self.get(":method")
            .and_then(|v| Method::from_bytes(v).ok())
    }

    pub fn scheme(&self) -> Option<&str> {
        self.get_str(":scheme")
    }

    pub fn authority(&self) -> Option<&str> {
        self.get_str(":authority")
    }

    pub fn path(&self) -> Option<&str> {
        self.get_str(":path")
    }

    /// The `:status` pseudo-header, if present and a valid status code
    pub fn status(&self) -> Option<StatusCode> {
        self.get(":status")
            .and_then(|v| StatusCode::from_bytes(v).ok())
    }

    /// A promised request must carry `:method`, `:scheme`, `:authority` and
    /// `:path`, cf. <https://httpwg.org/specs/rfc9113.html#PushRequests>
    pub fn has_request_pseudo_headers(&self) -> bool {
        self.method().is_some()
            && self.scheme().is_some()
            && self.authority().is_some()
            && self.path().is_some()
    }

    fn get_str(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|v| std::str::from_utf8(v).ok())
    }
}

impl fmt::Debug for HeaderList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.headers.iter()).finish()
    }
}

impl<'a> IntoIterator for &'a HeaderList {
    type Item = &'a Header;
    type IntoIter = std::slice::Iter<'a, Header>;

    fn into_iter(self) -> Self::IntoIter {
        self.headers.iter()
    }
}

impl FromIterator<Header> for HeaderList {
    fn from_iter<I: IntoIterator<Item = Header>>(iter: I) -> Self {
        Self {
            headers: iter.into_iter().collect(),
        }
    }
}

impl<N, V> FromIterator<(N, V)> for HeaderList
where
    N: Into<Bytes>,
    V: Into<Bytes>,
{
    fn from_iter<I: IntoIterator<Item = (N, V)>>(iter: I) -> Self {
        iter.into_iter().map(|(n, v)| Header::new(n, v)).collect()
    }
}
