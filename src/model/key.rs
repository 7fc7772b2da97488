//! Hierarchical entity keys
//!
//! A key is a path of `(kind, id)` pairs from a root entity down to the
//! entity itself. The websafe form joins the pairs as `Kind:id/Kind:id`;
//! `%` and `/` inside ids are written as `%25` and `%2F`, so every key has
//! exactly one websafe form and every websafe form decodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::errors::{ModelError, ModelResult};

/// Entity kinds known to the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    Profile,
    Conference,
    Session,
    Speaker,
}

impl Kind {
    /// Returns the kind name used in websafe keys
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Profile => "Profile",
            Kind::Conference => "Conference",
            Kind::Session => "Session",
            Kind::Speaker => "Speaker",
        }
    }

    /// Parses a kind name
    pub fn parse(name: &str) -> Option<Self> {
        match name {
            "Profile" => Some(Kind::Profile),
            "Conference" => Some(Kind::Conference),
            "Session" => Some(Kind::Session),
            "Speaker" => Some(Kind::Speaker),
            _ => None,
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Key of a stored entity, including its ancestor path
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntityKey {
    path: Vec<(Kind, String)>,
}

impl EntityKey {
    /// Creates a root key (no parent)
    pub fn root(kind: Kind, id: impl Into<String>) -> Self {
        Self {
            path: vec![(kind, id.into())],
        }
    }

    /// Creates a key nested under this one
    pub fn child(&self, kind: Kind, id: impl Into<String>) -> Self {
        let mut path = self.path.clone();
        path.push((kind, id.into()));
        Self { path }
    }

    /// Kind of the entity this key names
    pub fn kind(&self) -> Kind {
        self.last().0
    }

    /// Id of the entity this key names
    pub fn id(&self) -> &str {
        &self.last().1
    }

    /// Parent key, if any
    pub fn parent(&self) -> Option<EntityKey> {
        if self.path.len() < 2 {
            return None;
        }
        Some(Self {
            path: self.path[..self.path.len() - 1].to_vec(),
        })
    }

    /// True if `ancestor` is this key or one of its ancestors
    pub fn has_ancestor(&self, ancestor: &EntityKey) -> bool {
        self.path.starts_with(&ancestor.path)
    }

    /// Returns the websafe string form
    pub fn encode(&self) -> String {
        self.path
            .iter()
            .map(|(kind, id)| format!("{}:{}", kind, escape_id(id)))
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Parses a websafe key string
    pub fn decode(websafe: &str) -> ModelResult<Self> {
        let mut path = Vec::new();
        for segment in websafe.split('/') {
            let (kind, id) = segment
                .split_once(':')
                .ok_or_else(|| ModelError::InvalidKey(websafe.to_string()))?;
            let kind = Kind::parse(kind).ok_or_else(|| ModelError::InvalidKey(websafe.to_string()))?;
            if id.is_empty() {
                return Err(ModelError::InvalidKey(websafe.to_string()));
            }
            let id = unescape_id(id).ok_or_else(|| ModelError::InvalidKey(websafe.to_string()))?;
            path.push((kind, id));
        }
        Ok(Self { path })
    }

    fn last(&self) -> &(Kind, String) {
        // decode() and the constructors never build an empty path
        &self.path[self.path.len() - 1]
    }
}

fn escape_id(id: &str) -> String {
    id.replace('%', "%25").replace('/', "%2F")
}

/// Reverses `escape_id`; `None` on an escape it never produces
fn unescape_id(raw: &str) -> Option<String> {
    let mut out = String::with_capacity(raw.len());
    let mut rest = raw;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos..pos + 3)?;
        match escape {
            "%25" => out.push('%'),
            "%2F" | "%2f" => out.push('/'),
            _ => return None,
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    Some(out)
}

impl fmt::Display for EntityKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl TryFrom<String> for EntityKey {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::decode(&value)
    }
}

impl From<EntityKey> for String {
    fn from(key: EntityKey) -> Self {
        key.encode()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode() {
        let conf = EntityKey::root(Kind::Profile, "alice@example.com").child(Kind::Conference, "c1");
        let sess = conf.child(Kind::Session, "s1");

        assert_eq!(sess.encode(), "Profile:alice@example.com/Conference:c1/Session:s1");
        assert_eq!(EntityKey::decode(&sess.encode()).unwrap(), sess);
        assert_eq!(sess.kind(), Kind::Session);
        assert_eq!(sess.id(), "s1");
        assert_eq!(sess.parent(), Some(conf));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(EntityKey::decode("").is_err());
        assert!(EntityKey::decode("Conference").is_err());
        assert!(EntityKey::decode("Widget:1").is_err());
        assert!(EntityKey::decode("Conference:").is_err());
        assert!(EntityKey::decode("Profile:a%").is_err());
        assert!(EntityKey::decode("Profile:a%41").is_err());
    }

    #[test]
    fn test_ids_with_separators_round_trip() {
        let ids = ["team/alice", "a/Conference:c1", "100%", "%2F", "x:y", "/", "%%//"];
        for id in ids {
            let key = EntityKey::root(Kind::Profile, id).child(Kind::Conference, "c1");
            let back = EntityKey::decode(&key.encode()).unwrap();
            assert_eq!(back, key, "id {:?}", id);
            assert_eq!(back.parent().unwrap().id(), id);
        }
    }

    #[test]
    fn test_distinct_keys_encode_distinctly() {
        let nested = EntityKey::root(Kind::Profile, "a").child(Kind::Conference, "c1");
        let flat = EntityKey::root(Kind::Profile, "a/Conference:c1");
        assert_ne!(nested.encode(), flat.encode());

        let escaped = EntityKey::root(Kind::Profile, "%2F");
        let slash = EntityKey::root(Kind::Profile, "/");
        assert_ne!(escaped.encode(), slash.encode());
    }

    #[test]
    fn test_ancestry() {
        let profile = EntityKey::root(Kind::Profile, "bob");
        let conf = profile.child(Kind::Conference, "c1");
        let other = EntityKey::root(Kind::Profile, "carol").child(Kind::Conference, "c1");

        assert!(conf.has_ancestor(&profile));
        assert!(conf.has_ancestor(&conf));
        assert!(!other.has_ancestor(&profile));
        assert!(!profile.has_ancestor(&conf));
    }

    #[test]
    fn test_serde_as_string() {
        let key = EntityKey::root(Kind::Speaker, "sp1");
        let json = serde_json::to_value(&key).unwrap();
        assert_eq!(json, serde_json::json!("Speaker:sp1"));

        let back: EntityKey = serde_json::from_value(json).unwrap();
        assert_eq!(back, key);
    }
}
