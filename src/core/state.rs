// =============================================================================
// STATE — L'automate d'état des lignes
// =============================================================================
//
// Chaque ligne du cache porte un état. Les mutations en mode tamponné ne
// touchent JAMAIS la base : elles changent l'état (et le contenu) de la
// ligne, et c'est la synchronisation qui traduit les états en SQL.
//
//                  update                         update
//   NotChanged ───────────────▶ Updated ◀──────────────┐
//       │  ▲                       │ └──────────────────┘
//       │  │ undelete              │ delete : REFUSÉ
//       │  │                       ▼
//       │  └──────────────── (reste Updated)
//       │ delete
//       ▼
//    Deleted ── update : ignoré, reste Deleted
//
//    Added ── update : reste Added (le contenu continue de fusionner)
//          ── delete : REFUSÉ
//
// Une ligne Updated ou Added ne peut pas être supprimée avant d'avoir été
// synchronisée : sinon son UPDATE / INSERT serait perdu sans avoir jamais
// été appliqué. La seule marche arrière possible est Deleted → NotChanged.
//
// =============================================================================

use std::collections::BTreeMap;
use std::fmt;

use tracing::debug;

use super::typeside::RowKey;
use crate::error::{TableError, TableResult};

/// État d'une ligne du cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RowState {
    NotChanged,
    Updated,
    Added,
    Deleted,
}

impl fmt::Display for RowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowState::NotChanged => write!(f, "NotChanged"),
            RowState::Updated => write!(f, "Updated"),
            RowState::Added => write!(f, "Added"),
            RowState::Deleted => write!(f, "Deleted"),
        }
    }
}

/// Mutation demandée sur une ligne existante.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Update,
    Delete,
    Undelete,
}

impl RowState {
    /// Transition de l'automate.
    ///
    /// Retourne le nouvel état, ou None si la mutation est refusée
    /// (la ligne ne change ni d'état ni de contenu).
    pub fn next(self, mutation: Mutation) -> Option<RowState> {
        use Mutation::*;
        use RowState::*;
        match (self, mutation) {
            (NotChanged, Update) => Some(Updated),
            (Updated, Update) => Some(Updated),
            (Added, Update) => Some(Added),
            (Deleted, Update) => None,

            (NotChanged, Delete) => Some(Deleted),
            (Updated, Delete) | (Added, Delete) | (Deleted, Delete) => None,

            (Deleted, Undelete) => Some(NotChanged),
            (_, Undelete) => None,
        }
    }
}

/// Compteurs des changements en attente de synchronisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingChanges {
    pub updated: usize,
    pub added: usize,
    pub deleted: usize,
}

impl PendingChanges {
    pub fn is_empty(&self) -> bool {
        self.updated == 0 && self.added == 0 && self.deleted == 0
    }
}

/// Table des états, indexée par identité.
///
/// Même espace de clés que la collection de lignes du cache : c'est au
/// cache de maintenir cet invariant.
#[derive(Debug, Clone, Default)]
pub struct RowStateTracker {
    states: BTreeMap<RowKey, RowState>,
}

impl RowStateTracker {
    pub fn new() -> Self {
        RowStateTracker { states: BTreeMap::new() }
    }

    /// Réinitialise : toutes les clés données repartent en NotChanged.
    pub fn reset<'a, I>(&mut self, keys: I)
    where
        I: IntoIterator<Item = &'a RowKey>,
    {
        self.states = keys
            .into_iter()
            .map(|k| (k.clone(), RowState::NotChanged))
            .collect();
    }

    /// Marque une ligne fraîchement ajoutée (écrase un état existant).
    pub fn mark_added(&mut self, key: RowKey) {
        debug!(key = %key, "row marked Added");
        self.states.insert(key, RowState::Added);
    }

    pub fn state(&self, key: &RowKey) -> Option<RowState> {
        self.states.get(key).copied()
    }

    /// Applique une mutation.
    ///
    /// Ok(Some(état)) si la transition a eu lieu, Ok(None) si elle a été
    /// refusée ; NoSuchRow si la clé est inconnue.
    pub fn apply(&mut self, key: &RowKey, mutation: Mutation) -> TableResult<Option<RowState>> {
        let state = self
            .states
            .get_mut(key)
            .ok_or_else(|| TableError::NoSuchRow(key.clone()))?;
        let next = state.next(mutation);
        if let Some(new_state) = next {
            debug!(key = %key, from = %state, to = %new_state, ?mutation, "row state transition");
            *state = new_state;
        }
        Ok(next)
    }

    /// Clés dans un état donné, dans l'ordre des identités.
    pub fn keys_in(&self, wanted: RowState) -> Vec<RowKey> {
        self.states
            .iter()
            .filter(|(_, s)| **s == wanted)
            .map(|(k, _)| k.clone())
            .collect()
    }

    pub fn pending(&self) -> PendingChanges {
        let mut pending = PendingChanges::default();
        for state in self.states.values() {
            match state {
                RowState::Updated => pending.updated += 1,
                RowState::Added => pending.added += 1,
                RowState::Deleted => pending.deleted += 1,
                RowState::NotChanged => {}
            }
        }
        pending
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_update_transitions() {
        assert_eq!(RowState::NotChanged.next(Mutation::Update), Some(RowState::Updated));
        assert_eq!(RowState::Updated.next(Mutation::Update), Some(RowState::Updated));
        assert_eq!(RowState::Added.next(Mutation::Update), Some(RowState::Added));
        assert_eq!(RowState::Deleted.next(Mutation::Update), None);
    }

    #[test]
    fn test_delete_transitions() {
        assert_eq!(RowState::NotChanged.next(Mutation::Delete), Some(RowState::Deleted));
        assert_eq!(RowState::Updated.next(Mutation::Delete), None);
        assert_eq!(RowState::Added.next(Mutation::Delete), None);
        assert_eq!(RowState::Deleted.next(Mutation::Delete), None);
    }

    #[test]
    fn test_undelete_only_from_deleted() {
        assert_eq!(RowState::Deleted.next(Mutation::Undelete), Some(RowState::NotChanged));
        for s in [RowState::NotChanged, RowState::Updated, RowState::Added] {
            assert_eq!(s.next(Mutation::Undelete), None);
        }
    }

    #[test]
    fn test_tracker() {
        let keys = [RowKey::Int(1), RowKey::Int(2), RowKey::Int(3)];
        let mut tracker = RowStateTracker::new();
        tracker.reset(keys.iter());
        assert_eq!(tracker.len(), 3);
        assert!(tracker.pending().is_empty());

        tracker.apply(&RowKey::Int(1), Mutation::Update).unwrap();
        tracker.apply(&RowKey::Int(2), Mutation::Delete).unwrap();
        tracker.mark_added(RowKey::Int(4));

        // Refusé : la ligne 1 est Updated
        assert_eq!(tracker.apply(&RowKey::Int(1), Mutation::Delete).unwrap(), None);
        assert_eq!(tracker.state(&RowKey::Int(1)), Some(RowState::Updated));

        assert_eq!(
            tracker.pending(),
            PendingChanges { updated: 1, added: 1, deleted: 1 }
        );
        assert_eq!(tracker.keys_in(RowState::Deleted), vec![RowKey::Int(2)]);

        assert!(matches!(
            tracker.apply(&RowKey::Int(99), Mutation::Update),
            Err(TableError::NoSuchRow(RowKey::Int(99)))
        ));
    }
}
