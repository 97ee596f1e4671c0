// =============================================================================
// TABLE — L'accès à une table : tamponné ou direct
// =============================================================================
//
// Deux implémentations d'une même capacité, TableAccess :
//
//   ┌────────────────────┐        ┌────────────────────┐
//   │ TableCache         │        │ DirectTable        │
//   │ (mode tamponné)    │        │ (mode direct)      │
//   │                    │        │                    │
//   │ lignes en mémoire  │        │ aucune ligne gardée│
//   │ + états            │        │ 1 appel = 1 SQL    │
//   │ SQL à la synchro   │        │ + commit           │
//   └─────────┬──────────┘        └─────────┬──────────┘
//             │                             │
//             └────────── BackingStore ─────┘
//
// Le choix se fait à la construction (open_table), jamais par un drapeau
// testé dans chaque méthode.
//
// Les deux partagent la même validation des champs (ValueCodec) et le même
// compilateur de prédicats : une recherche a la même sémantique en mémoire
// et en SQL.
//
// =============================================================================

pub mod buffered;
pub mod direct;

use std::fmt;

use tracing::info;

use crate::backend::sql::codec::ValueCodec;
use crate::backend::BackingStore;
use crate::config::{AccessMode, TableConfig};
use crate::core::instance::{Field, Row};
use crate::core::query::SearchRequest;
use crate::core::schema::ColumnCatalog;
use crate::core::typeside::{RowKey, ValueKind};
use crate::error::{TableError, TableResult};

pub use self::buffered::TableCache;
pub use self::direct::DirectTable;

/// Bilan d'une synchronisation : nombre de statements exécutés par sorte.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub updated: usize,
    pub inserted: usize,
    pub deleted: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.updated + self.inserted + self.deleted
    }
}

impl fmt::Display for SyncReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} updated, {} inserted, {} deleted",
            self.updated, self.inserted, self.deleted
        )
    }
}

/// Bilan d'une écriture par lot en mode direct.
///
/// Un statement en échec n'arrête pas le lot : son erreur est rangée dans
/// `errors` et les suivants sont tout de même exécutés.
#[derive(Debug, Default)]
pub struct BatchReport {
    /// Statements exécutés avec succès
    pub applied: usize,
    /// Lignes ignorées (identité déjà présente sans écrasement, ou rien à changer)
    pub skipped: usize,
    pub errors: Vec<TableError>,
}

impl BatchReport {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for BatchReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} applied, {} skipped, {} failed",
            self.applied,
            self.skipped,
            self.errors.len()
        )
    }
}

/// Capacité commune aux deux modes.
pub trait TableAccess {
    /// Mode de l'implémentation.
    fn mode(&self) -> AccessMode;

    fn catalog(&self) -> &ColumnCatalog;

    /// Lignes correspondant à la recherche (hors lignes supprimées).
    fn search(&mut self, request: &SearchRequest) -> TableResult<Vec<Row>>;

    /// Fusionne des champs dans une ligne existante.
    ///
    /// Un champ `Null` ne se traduit pas de la même façon selon le mode :
    /// - tamponné : la valeur est effacée du cache, et l'UPDATE émis au
    ///   `synchronize` omet la colonne (la base garde son ancienne valeur) ;
    /// - direct : l'UPDATE écrit `SET colonne = NULL`.
    fn update(&mut self, key: &RowKey, fields: &[Field]) -> TableResult<()>;

    /// Ajoute une ligne et renvoie son identité.
    ///
    /// Sans identité (ni `key`, ni champ d'identité), la colonne d'identité
    /// doit être entière : l'identité vaut alors max + 1.
    fn add(&mut self, fields: &[Field], key: Option<RowKey>) -> TableResult<RowKey>;

    /// Supprime une ligne, ou annule sa suppression si `undo`.
    fn delete(&mut self, key: &RowKey, undo: bool) -> TableResult<()>;

    /// Écrit les changements en attente dans la base.
    fn synchronize(&mut self) -> TableResult<SyncReport>;
}

/// Ouvre une table dans le mode de la configuration.
pub fn open_table<S>(config: &TableConfig, store: S) -> TableResult<Box<dyn TableAccess>>
where
    S: BackingStore + 'static,
{
    info!(table = %config.table, mode = %config.mode, dialect = ?config.dialect, "opening table");
    let dialect = config.dialect.build();
    Ok(match config.mode {
        AccessMode::Buffered => Box::new(TableCache::open(&config.table, dialect, store)?),
        AccessMode::Direct => Box::new(DirectTable::open(&config.table, dialect, store)?),
    })
}

// ─── Validation partagée ─────────────────────────────────────────────────────

/// Valide tous les champs d'une mutation, avant toute modification.
///
/// Chaque colonne doit exister, avoir un type natif mappé, et la valeur doit
/// être de la bonne sorte (ou NULL).
pub(crate) fn validate_fields(
    catalog: &ColumnCatalog,
    codec: ValueCodec<'_>,
    fields: &[Field],
) -> TableResult<()> {
    if fields.is_empty() {
        return Err(TableError::InvalidInput("no fields given".into()));
    }
    for (name, value) in fields {
        let column = catalog.lookup(name)?;
        codec.kind_of(column)?;
        codec.validate(column, value)?;
    }
    Ok(())
}

/// Refuse toute écriture de la colonne d'identité.
pub(crate) fn reject_identity(catalog: &ColumnCatalog, fields: &[Field]) -> TableResult<()> {
    match fields.iter().find(|(name, _)| catalog.is_identity(name)) {
        Some((name, _)) => Err(TableError::InvalidInput(format!(
            "identity column '{}' cannot be updated",
            name
        ))),
        None => Ok(()),
    }
}

/// Identité explicite d'un ajout : paramètre `key` ou champ d'identité.
///
/// Les champs doivent déjà avoir été validés.
pub(crate) fn explicit_key(
    catalog: &ColumnCatalog,
    codec: ValueCodec<'_>,
    fields: &[Field],
    key: Option<RowKey>,
) -> TableResult<Option<RowKey>> {
    let identity = catalog.identity();

    let from_fields = match fields.iter().find(|(name, _)| *name == identity.name) {
        Some((_, value)) if !value.is_null() => Some(RowKey::from_value(value).ok_or_else(|| {
            TableError::InvalidInput(format!("{} cannot identify a row", value))
        })?),
        _ => None,
    };

    if let Some(k) = &key {
        let expected = codec.kind_of(identity)?;
        if k.kind() != expected {
            return Err(TableError::TypeMismatch {
                column: identity.name.clone(),
                expected,
                found: k.kind(),
            });
        }
    }

    match (key, from_fields) {
        (Some(k), Some(f)) if k != f => Err(TableError::InvalidInput(format!(
            "identity given twice: {} and {}",
            k, f
        ))),
        (Some(k), _) => Ok(Some(k)),
        (None, f) => Ok(f),
    }
}

/// Identité suivante (max + 1), pour une colonne d'identité entière.
pub(crate) fn next_key(
    catalog: &ColumnCatalog,
    codec: ValueCodec<'_>,
    max: Option<i64>,
) -> TableResult<RowKey> {
    let identity = catalog.identity();
    if codec.kind_of(identity)? != ValueKind::Integer {
        return Err(TableError::InvalidInput(format!(
            "identity column '{}' is not numeric: an identity must be given",
            identity.name
        )));
    }
    let next = match max {
        Some(m) => m
            .checked_add(1)
            .ok_or_else(|| TableError::InvalidInput("identity space exhausted".into()))?,
        None => 1,
    };
    Ok(RowKey::Int(next))
}
