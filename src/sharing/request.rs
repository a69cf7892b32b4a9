use std::collections::BTreeSet;

use super::Denial;

/// The sharing scope a caller asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetScope {
    Private,
    Public,
    /// Grant access to these users. Never empty.
    Shared(BTreeSet<String>),
}

/// A shape-validated share request.
///
/// Construction rejects a request that asks for a public scope and a user
/// list at the same time, so the gate never sees a conflated target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    target: TargetScope,
}

impl TransitionRequest {
    pub fn new(user_ids: Vec<String>, public: bool) -> Result<Self, Denial> {
        let user_ids = normalize_user_ids(user_ids)?;

        let target = match (public, user_ids.is_empty()) {
            (true, false) => {
                return Err(Denial::MalformedRequest(
                    "a saved query cannot be public and shared with users at the same time"
                        .to_string(),
                ))
            }
            (true, true) => TargetScope::Public,
            (false, true) => TargetScope::Private,
            (false, false) => TargetScope::Shared(user_ids),
        };

        Ok(Self { target })
    }

    pub fn target(&self) -> &TargetScope {
        &self.target
    }

    /// True when the request names `user_id` as a grantee.
    pub fn names_user(&self, user_id: &str) -> bool {
        matches!(&self.target, TargetScope::Shared(ids) if ids.contains(user_id))
    }
}

#[cfg(test)]
impl TransitionRequest {
    pub fn private() -> Self {
        Self {
            target: TargetScope::Private,
        }
    }

    pub fn public() -> Self {
        Self {
            target: TargetScope::Public,
        }
    }
}

/// A validated request to revoke grants from specific users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnshareRequest {
    user_ids: BTreeSet<String>,
}

impl UnshareRequest {
    pub fn new(user_ids: Vec<String>) -> Result<Self, Denial> {
        let user_ids = normalize_user_ids(user_ids)?;
        if user_ids.is_empty() {
            return Err(Denial::MalformedRequest(
                "at least one user id is required".to_string(),
            ));
        }
        Ok(Self { user_ids })
    }

    pub fn user_ids(&self) -> &BTreeSet<String> {
        &self.user_ids
    }

    /// True when the request revokes exactly the grant of `user_id` and nothing else.
    pub fn is_only(&self, user_id: &str) -> bool {
        self.user_ids.len() == 1 && self.user_ids.contains(user_id)
    }
}

fn normalize_user_ids(user_ids: Vec<String>) -> Result<BTreeSet<String>, Denial> {
    let mut out = BTreeSet::new();
    for raw in user_ids {
        let id = raw.trim();
        if id.is_empty() {
            return Err(Denial::MalformedRequest(
                "user ids must not be empty".to_string(),
            ));
        }
        out.insert(id.to_string());
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn empty_non_public_request_targets_private() {
        let req = TransitionRequest::new(Vec::new(), false).unwrap();
        assert_eq!(req.target(), &TargetScope::Private);
    }

    #[test]
    fn shorthand_constructors_match_parsed_requests() {
        assert_eq!(
            TransitionRequest::new(Vec::new(), false).unwrap(),
            TransitionRequest::private()
        );
        assert_eq!(
            TransitionRequest::new(Vec::new(), true).unwrap(),
            TransitionRequest::public()
        );
    }

    #[test]
    fn public_request_with_users_is_malformed() {
        let res = TransitionRequest::new(ids(&["u1"]), true);
        assert!(matches!(res, Err(Denial::MalformedRequest(_))));
    }

    #[test]
    fn duplicate_and_padded_ids_collapse() {
        let req = TransitionRequest::new(ids(&["u1", " u1 ", "u2"]), false).unwrap();
        match req.target() {
            TargetScope::Shared(set) => {
                assert_eq!(set.len(), 2);
                assert!(set.contains("u1"));
                assert!(set.contains("u2"));
            }
            other => panic!("expected Shared, got: {:?}", other),
        }
    }

    #[test]
    fn blank_user_id_is_malformed() {
        assert!(matches!(
            TransitionRequest::new(ids(&["u1", "  "]), false),
            Err(Denial::MalformedRequest(_))
        ));
        assert!(matches!(
            UnshareRequest::new(ids(&[""])),
            Err(Denial::MalformedRequest(_))
        ));
    }

    #[test]
    fn unshare_requires_at_least_one_user() {
        assert!(matches!(
            UnshareRequest::new(Vec::new()),
            Err(Denial::MalformedRequest(_))
        ));
    }

    #[test]
    fn unshare_is_only_self() {
        let req = UnshareRequest::new(ids(&["me", "me"])).unwrap();
        assert!(req.is_only("me"));

        let req = UnshareRequest::new(ids(&["me", "other"])).unwrap();
        assert!(!req.is_only("me"));
    }
}
