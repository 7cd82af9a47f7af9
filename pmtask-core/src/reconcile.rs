//! Generic reconciliation of a source collection against a destination.
//!
//! A stage supplies a [`Strategy`] (pure identity, key, and equality rules)
//! and a [`Capabilities`] value holding the remote mutations the entity kind
//! actually supports. [`reconcile`] matches records by identity, never by
//! position, and issues the minimal set of create, update, and delete calls:
//!
//! | source record              | update supported    | update unsupported          |
//! |----------------------------|---------------------|-----------------------------|
//! | matched, equal             | claim, no call      | claim, no call              |
//! | matched, different         | claim, `update`     | `create`, old stays orphan  |
//! | unmatched                  | `create`            | `create`                    |
//!
//! Destination records left unclaimed are deleted when the kind supports
//! deletion and left in place otherwise. Every source record that ends up
//! with a destination key gets an [`IdentityMapEntry`].
//!
//! [`match_only`] is the read-only variant for reference data the remote API
//! cannot mutate: it only records identity-map entries.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::AddAssign;

use crate::identity_map::{IdentityMap, IdentityMapEntry};
use crate::types::EntityKind;

// ---------------------------------------------------------------------------
// 1. Strategy traits
// ---------------------------------------------------------------------------

/// Identity and primary-key extraction for one entity kind.
pub trait Keyed<T: ?Sized> {
    /// Cross-system natural key, e.g. a name or a parent-scoped name.
    fn identity(&self, record: &T) -> String;

    /// System-local unique id rendered as text.
    fn primary_key(&self, record: &T) -> String;
}

/// Full comparison rules for one entity kind.
pub trait Strategy<T: ?Sized>: Keyed<T> {
    /// Equality over exactly the fields create/update can write.
    fn equals(&self, src: &T, dest: &T) -> bool;
}

// ---------------------------------------------------------------------------
// 2. Capabilities
// ---------------------------------------------------------------------------

/// Creates a destination record from a source record.
///
/// Returns the new destination key, or `None` when nothing was created.
pub type CreateFn<'a, T, E> = Box<dyn FnMut(&T, &IdentityMap) -> Result<Option<String>, E> + 'a>;

/// Overwrites a destination record (second argument) from a source record.
pub type UpdateFn<'a, T, E> = Box<dyn FnMut(&T, &T, &IdentityMap) -> Result<(), E> + 'a>;

/// Removes (or retires) an orphaned destination record.
pub type DeleteFn<'a, T, E> = Box<dyn FnMut(&T) -> Result<(), E> + 'a>;

/// The remote mutations an entity kind supports.
///
/// Each variant carries exactly the operations it allows, so the engine's
/// branches are checked exhaustively.
pub enum Capabilities<'a, T, E> {
    CreateOnly {
        create: CreateFn<'a, T, E>,
    },
    CreateUpdate {
        create: CreateFn<'a, T, E>,
        update: UpdateFn<'a, T, E>,
    },
    CreateDelete {
        create: CreateFn<'a, T, E>,
        delete: DeleteFn<'a, T, E>,
    },
    CreateUpdateDelete {
        create: CreateFn<'a, T, E>,
        update: UpdateFn<'a, T, E>,
        delete: DeleteFn<'a, T, E>,
    },
}

impl<'a, T, E> Capabilities<'a, T, E> {
    pub fn create_only<C>(create: C) -> Self
    where
        C: FnMut(&T, &IdentityMap) -> Result<Option<String>, E> + 'a,
    {
        Self::CreateOnly {
            create: Box::new(create),
        }
    }

    pub fn create_update<C, U>(create: C, update: U) -> Self
    where
        C: FnMut(&T, &IdentityMap) -> Result<Option<String>, E> + 'a,
        U: FnMut(&T, &T, &IdentityMap) -> Result<(), E> + 'a,
    {
        Self::CreateUpdate {
            create: Box::new(create),
            update: Box::new(update),
        }
    }

    pub fn create_delete<C, D>(create: C, delete: D) -> Self
    where
        C: FnMut(&T, &IdentityMap) -> Result<Option<String>, E> + 'a,
        D: FnMut(&T) -> Result<(), E> + 'a,
    {
        Self::CreateDelete {
            create: Box::new(create),
            delete: Box::new(delete),
        }
    }

    pub fn full<C, U, D>(create: C, update: U, delete: D) -> Self
    where
        C: FnMut(&T, &IdentityMap) -> Result<Option<String>, E> + 'a,
        U: FnMut(&T, &T, &IdentityMap) -> Result<(), E> + 'a,
        D: FnMut(&T) -> Result<(), E> + 'a,
    {
        Self::CreateUpdateDelete {
            create: Box::new(create),
            update: Box::new(update),
            delete: Box::new(delete),
        }
    }

    /// Short label used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::CreateOnly { .. } => "create-only",
            Self::CreateUpdate { .. } => "create/update",
            Self::CreateDelete { .. } => "create/delete",
            Self::CreateUpdateDelete { .. } => "create/update/delete",
        }
    }

    fn create(&mut self, src: &T, map: &IdentityMap) -> Result<Option<String>, E> {
        match self {
            Self::CreateOnly { create }
            | Self::CreateUpdate { create, .. }
            | Self::CreateDelete { create, .. }
            | Self::CreateUpdateDelete { create, .. } => create(src, map),
        }
    }
}

// ---------------------------------------------------------------------------
// 3. SyncResult
// ---------------------------------------------------------------------------

/// Counts of remote mutations issued by one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncResult {
    pub creates: usize,
    pub updates: usize,
    pub deletes: usize,
}

impl SyncResult {
    pub fn new(creates: usize, updates: usize, deletes: usize) -> Self {
        Self {
            creates,
            updates,
            deletes,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.creates + self.updates + self.deletes == 0
    }
}

impl AddAssign for SyncResult {
    fn add_assign(&mut self, rhs: Self) {
        self.creates += rhs.creates;
        self.updates += rhs.updates;
        self.deletes += rhs.deletes;
    }
}

impl fmt::Display for SyncResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str("No changes.");
        }
        let parts: Vec<String> = [
            ("Created", self.creates),
            ("Updated", self.updates),
            ("Deleted", self.deletes),
        ]
        .iter()
        .filter(|(_, n)| *n > 0)
        .map(|(verb, n)| format!("{verb} {n}"))
        .collect();
        write!(f, "{}.", parts.join(", "))
    }
}

// ---------------------------------------------------------------------------
// 4. reconcile
// ---------------------------------------------------------------------------

/// Converge `dest` toward `src` for one entity kind.
///
/// Any error from a capability aborts the stage immediately; mutations
/// already issued are not rolled back.
pub fn reconcile<T, E>(
    kind: EntityKind,
    src: &[T],
    dest: &[T],
    map: &mut IdentityMap,
    strategy: &dyn Strategy<T>,
    mut capabilities: Capabilities<'_, T, E>,
) -> Result<SyncResult, E> {
    let mut result = SyncResult::default();
    let dest_by_identity = index_by_identity(kind, dest, strategy);
    let mut keys_to_delete: HashSet<String> =
        dest.iter().map(|d| strategy.primary_key(d)).collect();

    tracing::debug!(
        "reconciling {} {kind} record(s) against {} ({})",
        src.len(),
        dest.len(),
        capabilities.label()
    );

    for item in src {
        let identity = strategy.identity(item);
        let primary_key = strategy.primary_key(item);

        let new_key = match dest_by_identity.get(identity.as_str()) {
            Some(&matching) => {
                let matching_key = strategy.primary_key(matching);
                if strategy.equals(item, matching) {
                    keys_to_delete.remove(&matching_key);
                    Some(matching_key)
                } else {
                    match &mut capabilities {
                        Capabilities::CreateUpdate { update, .. }
                        | Capabilities::CreateUpdateDelete { update, .. } => {
                            keys_to_delete.remove(&matching_key);
                            update(item, matching, &*map)?;
                            result.updates += 1;
                            Some(matching_key)
                        }
                        Capabilities::CreateOnly { create }
                        | Capabilities::CreateDelete { create, .. } => {
                            // The stale record keeps its delete candidacy.
                            let created = create(item, &*map)?;
                            result.creates += 1;
                            created
                        }
                    }
                }
            }
            None => {
                let created = capabilities.create(item, &*map)?;
                if created.is_some() {
                    result.creates += 1;
                }
                created
            }
        };

        if let Some(new_key) = new_key {
            map.add_item(IdentityMapEntry::new(kind, identity, primary_key, new_key));
        }
    }

    match &mut capabilities {
        Capabilities::CreateDelete { delete, .. }
        | Capabilities::CreateUpdateDelete { delete, .. } => {
            for record in dest {
                if keys_to_delete.remove(&strategy.primary_key(record)) {
                    delete(record)?;
                    result.deletes += 1;
                }
            }
        }
        Capabilities::CreateOnly { .. } | Capabilities::CreateUpdate { .. } => {
            if !keys_to_delete.is_empty() {
                tracing::debug!(
                    "{} unmatched {kind} record(s) left in place",
                    keys_to_delete.len()
                );
            }
        }
    }

    Ok(result)
}

// ---------------------------------------------------------------------------
// 5. match_only
// ---------------------------------------------------------------------------

/// Record identity-map entries for reference data without touching `dest`.
///
/// Returns the number of source records that found a match.
pub fn match_only<T>(
    kind: EntityKind,
    src: &[T],
    dest: &[T],
    map: &mut IdentityMap,
    keys: &dyn Keyed<T>,
) -> usize {
    let dest_by_identity = index_by_identity(kind, dest, keys);
    let mut matched = 0;
    for item in src {
        let identity = keys.identity(item);
        if let Some(&matching) = dest_by_identity.get(identity.as_str()) {
            let new_key = keys.primary_key(matching);
            map.add_item(IdentityMapEntry::new(
                kind,
                identity,
                keys.primary_key(item),
                new_key,
            ));
            matched += 1;
        } else {
            tracing::debug!("no destination {kind} named '{identity}'");
        }
    }
    matched
}

/// Destination lookup by identity. On a duplicate identity the later record
/// wins, and a warning names the collision.
fn index_by_identity<'d, T, K>(kind: EntityKind, dest: &'d [T], keys: &K) -> HashMap<String, &'d T>
where
    K: Keyed<T> + ?Sized,
{
    let mut by_identity = HashMap::with_capacity(dest.len());
    for record in dest {
        let identity = keys.identity(record);
        if let Some(previous) = by_identity.insert(identity.clone(), record) {
            tracing::warn!(
                "duplicate destination {kind} identity '{identity}': {} replaces {}",
                keys.primary_key(record),
                keys.primary_key(previous)
            );
        }
    }
    by_identity
}
