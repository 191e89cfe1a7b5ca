//! Named solids, with cut heights encoded in the requested name.
//!
//! A request such as `pmt_solid_-5` asks for solid `pmt_solid` cut at
//! `z = -5`. A request without digits returns a copy of the named solid.

use std::collections::HashMap;

use crate::csg::{CsgStore, NodeId};
use crate::error::Result;
use crate::operations::clone::DeepClone;
use crate::operations::zcut::{ZCut, ZCutOutcome, ZCutParams};

/// Signed integers written in `name`, in order.
///
/// Scanning left to right, an optional sign followed by digits is read as
/// one integer and scanning resumes right after it, so `a12-4b` holds `12`
/// and `-4`. A sign not followed by a digit is skipped. Values beyond the
/// range of `i64` saturate.
#[must_use]
pub fn integers_in(name: &str) -> Vec<i64> {
    numeric_groups(name).into_iter().map(|(_, n)| n).collect()
}

fn numeric_groups(name: &str) -> Vec<(usize, i64)> {
    let mut groups = Vec::new();
    let mut pos = 0;
    while let Some(c) = name[pos..].chars().next() {
        match leading_integer(&name[pos..]) {
            Some((len, n)) => {
                groups.push((pos, n));
                pos += len;
            }
            None => pos += c.len_utf8(),
        }
    }
    groups
}

/// Reads a signed integer at the start of `s`, returning its length and value.
fn leading_integer(s: &str) -> Option<(usize, i64)> {
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    let digits = unsigned.find(|c: char| !c.is_ascii_digit()).unwrap_or(unsigned.len());
    if digits == 0 {
        return None;
    }
    let len = s.len() - unsigned.len() + digits;
    let saturated = if s.starts_with('-') { i64::MIN } else { i64::MAX };
    Some((len, s[..len].parse().unwrap_or(saturated)))
}

/// Splits a request into the base solid name and an optional cut height.
///
/// The base is the text before the first integer, with trailing `_` removed.
#[must_use]
pub fn parse_request(name: &str) -> (&str, Option<i64>) {
    match numeric_groups(name).first() {
        Some(&(start, z_cut)) => (name[..start].trim_end_matches('_'), Some(z_cut)),
        None => (name, None),
    }
}

/// A store of named solids.
#[derive(Debug, Default)]
pub struct SolidLibrary {
    store: CsgStore,
    solids: HashMap<String, NodeId>,
    prefix: Option<String>,
    params: ZCutParams,
}

impl SolidLibrary {
    /// Creates an empty library.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Strips `prefix` from requested names before lookup.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = Some(prefix.into());
        self
    }

    /// Parameters used for every cut.
    #[must_use]
    pub fn with_params(mut self, params: ZCutParams) -> Self {
        self.params = params;
        self
    }

    /// The store holding every registered solid.
    #[must_use]
    pub fn store(&self) -> &CsgStore {
        &self.store
    }

    /// Mutable store, for building solids to register.
    pub fn store_mut(&mut self) -> &mut CsgStore {
        &mut self.store
    }

    /// Registers the tree rooted at `root` under `name`.
    pub fn insert(&mut self, name: impl Into<String>, root: NodeId) {
        self.solids.insert(name.into(), root);
    }

    /// Registered names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.solids.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    fn strip_prefix<'n>(&self, name: &'n str) -> &'n str {
        self.prefix
            .as_deref()
            .and_then(|p| name.strip_prefix(p))
            .unwrap_or(name)
    }

    /// Looks up a solid by name, after prefix stripping.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<NodeId> {
        let key = self.strip_prefix(name);
        let found = self.solids.get(key).copied();
        if found.is_none() {
            tracing::warn!(name, key, known = self.solids.len(), "solid not found");
        }
        found
    }

    /// Builds the solid described by `request`.
    ///
    /// When the request contains an integer, the first one is a cut height
    /// applied to the base solid named before it. Otherwise the named solid
    /// is copied as is. Returns `None` when the solid is unknown.
    ///
    /// # Errors
    ///
    /// Returns an error if the solid cannot be cloned or cut.
    #[allow(clippy::cast_precision_loss)]
    pub fn solid(&self, request: &str) -> Result<Option<ZCutOutcome>> {
        let (base, z_cut) = parse_request(self.strip_prefix(request));
        let Some(root) = self.get(base) else {
            return Ok(None);
        };
        let outcome = match z_cut {
            Some(z_cut) => {
                tracing::info!(request, base, z_cut, "cutting named solid");
                ZCut::new(root, z_cut as f64)
                    .with_params(self.params)
                    .execute(&self.store)?
            }
            None => ZCutOutcome::Cut(DeepClone::new(root).execute(&self.store)?),
        };
        Ok(Some(outcome))
    }
}
