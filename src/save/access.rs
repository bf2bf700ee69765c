//! Access control for protected namespaces.

use std::fmt;

use indexmap::IndexMap;
use smol_str::SmolStr;

use crate::config::EngineConfig;

/// A principal and the secret it presents.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    user: SmolStr,
    secret: String,
}

impl Credentials {
    pub fn new(user: impl Into<SmolStr>, secret: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            secret: secret.into(),
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("user", &self.user)
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Decides whether a save into a namespace is allowed.
pub trait AccessControl: Send + Sync {
    /// Whether saves into `namespace` need credentials at all.
    fn is_protected(&self, namespace: &str) -> bool;

    /// Whether `credentials` may write into `namespace`. Absent credentials
    /// are denied for every protected namespace.
    fn verify(&self, namespace: &str, credentials: Option<&Credentials>) -> bool;
}

/// Grants access to protected namespaces by exact credential match.
///
/// A protected base covers every namespace below it, so protecting
/// `http://example.org/hotel` also protects `http://example.org/hotel/v2`.
#[derive(Clone, Debug, Default)]
pub struct NamespaceAccessList {
    protected: IndexMap<String, Vec<Credentials>>,
}

impl NamespaceAccessList {
    pub fn new() -> Self {
        Self::default()
    }

    /// Protect every namespace in `namespaces`, with no grants yet.
    pub fn protecting<I, S>(namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::new();
        for ns in namespaces {
            list.protect(ns);
        }
        list
    }

    /// The protected namespaces of `config`, with no grants yet.
    pub fn from_config(config: &EngineConfig) -> Self {
        Self::protecting(config.protected_namespaces.iter().cloned())
    }

    pub fn protect(&mut self, namespace: impl Into<String>) -> &mut Self {
        let namespace = namespace.into();
        let namespace = namespace.trim_end_matches('/').to_string();
        self.protected.entry(namespace).or_default();
        self
    }

    /// Allow `credentials` into `namespace`, protecting it if needed.
    pub fn grant(&mut self, namespace: impl Into<String>, credentials: Credentials) -> &mut Self {
        let namespace = namespace.into();
        let namespace = namespace.trim_end_matches('/').to_string();
        self.protected.entry(namespace).or_default().push(credentials);
        self
    }

    fn rules_for(&self, namespace: &str) -> impl Iterator<Item = &Vec<Credentials>> {
        self.protected
            .iter()
            .filter(move |(base, _)| covers(base, namespace))
            .map(|(_, grants)| grants)
    }
}

fn covers(base: &str, namespace: &str) -> bool {
    namespace
        .strip_prefix(base)
        .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
}

impl AccessControl for NamespaceAccessList {
    fn is_protected(&self, namespace: &str) -> bool {
        self.rules_for(namespace).next().is_some()
    }

    fn verify(&self, namespace: &str, credentials: Option<&Credentials>) -> bool {
        let mut rules = self.rules_for(namespace).peekable();
        if rules.peek().is_none() {
            return true;
        }
        let Some(credentials) = credentials else {
            return false;
        };
        // Every covering rule must admit the caller.
        rules.all(|grants| grants.contains(credentials))
    }
}
