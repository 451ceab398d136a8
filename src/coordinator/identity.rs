//! Acting-user to version-control identity resolution

use anyhow::{bail, Result};
use std::collections::HashMap;

use crate::models::attempt::Signature;

/// Maps an acting user to the author/committer record used on merge commits.
pub trait IdentityResolver {
    fn signature_for(&self, user: &str) -> Result<Signature>;
}

/// Resolver backed by the config's `users` map.
///
/// An acting user already formatted as `Name <email>` resolves without an
/// entry; anything else must be present in the map.
#[derive(Debug, Clone, Default)]
pub struct ConfigIdentityResolver {
    users: HashMap<String, Signature>,
}

impl ConfigIdentityResolver {
    pub fn new(users: HashMap<String, Signature>) -> Self {
        Self { users }
    }
}

impl IdentityResolver for ConfigIdentityResolver {
    fn signature_for(&self, user: &str) -> Result<Signature> {
        if let Some(signature) = self.users.get(user) {
            return Ok(signature.clone());
        }

        if let Some(signature) = Signature::parse(user) {
            return Ok(signature);
        }

        bail!("No version-control identity for user '{user}'");
    }
}
