//! Qualified identifier parsing.
//!
//! A qualified name has the shape `Node:owner.table`. The node prefix ends
//! at the first `:`, and the owner is everything before the last `.`.

/// A decomposed `Node:owner.table` identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QualifiedName {
    /// Connection or node prefix before `:`.
    pub node: Option<String>,
    /// Schema or owner before the last `.`.
    pub owner: Option<String>,
    /// Object name after the last `.`.
    pub base: String,
}

impl QualifiedName {
    /// Parses a qualified name. Returns `None` for blank input.
    #[must_use]
    pub fn parse(full_name: &str) -> Option<Self> {
        let full_name = full_name.trim();
        if full_name.is_empty() {
            return None;
        }
        let (node, name) = match full_name.split_once(':') {
            Some((node, name)) => (non_blank(node), name),
            None => (None, full_name),
        };
        let (owner, base) = match name.rsplit_once('.') {
            Some((owner, base)) => (non_blank(owner), base),
            None => (None, name),
        };
        Some(Self {
            node,
            owner,
            base: base.trim().to_string(),
        })
    }

    /// The name without its node prefix: `owner.table` or `table`.
    #[must_use]
    pub fn name(&self) -> String {
        match &self.owner {
            Some(owner) => format!("{owner}.{}", self.base),
            None => self.base.clone(),
        }
    }
}

fn non_blank(s: &str) -> Option<String> {
    let s = s.trim();
    (!s.is_empty()).then(|| s.to_string())
}

/// `Node:owner.table` to `owner.table`.
#[must_use]
pub fn full_name_to_name(full_name: &str) -> Option<String> {
    QualifiedName::parse(full_name).map(|q| q.name())
}

/// `Node:owner.table` to `table`.
#[must_use]
pub fn full_name_to_base_name(full_name: &str) -> Option<String> {
    QualifiedName::parse(full_name).map(|q| q.base)
}

/// `Node:owner.table` to `owner`.
#[must_use]
pub fn full_name_to_owner_name(full_name: &str) -> Option<String> {
    QualifiedName::parse(full_name).and_then(|q| q.owner)
}

/// `Node:owner.table` to `Node`.
#[must_use]
pub fn full_name_to_node_name(full_name: &str) -> Option<String> {
    QualifiedName::parse(full_name).and_then(|q| q.node)
}

/// Strips identifier quoting (`"x"`, `[x]` or `` `x` ``) from a base name.
#[must_use]
pub fn base_name_to_name(base_name: &str) -> Option<String> {
    let name = base_name.trim();
    if name.is_empty() {
        return None;
    }
    let unquoted = [('"', '"'), ('[', ']'), ('`', '`')]
        .iter()
        .find_map(|&(open, close)| {
            name.strip_prefix(open)
                .and_then(|rest| rest.strip_suffix(close))
        })
        .unwrap_or(name);
    Some(unquoted.to_string())
}
