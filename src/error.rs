// =============================================================================
// ERROR — Les erreurs du moteur
// =============================================================================
//
// Toute validation a lieu AVANT la moindre mutation ou exécution SQL :
// une erreur de validation laisse l'état intact (tout ou rien par appel).
//
// Les échecs du backing store (réseau, contrainte violée...) remontent tels
// quels, enveloppés dans TableError::Store.
//
// =============================================================================

use thiserror::Error;

use crate::backend::StoreError;
use crate::config::AccessMode;
use crate::core::schema::NativeType;
use crate::core::typeside::{RowKey, ValueKind};

/// Erreur du moteur de table.
#[derive(Debug, Error)]
pub enum TableError {
    /// Table sans colonnes, ou catalogue incohérent.
    #[error("schema error: {0}")]
    Schema(String),

    /// Colonne absente du catalogue.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// La sorte de la valeur ne correspond pas à celle de la colonne.
    #[error("type mismatch on column '{column}': expected {expected}, found {found}")]
    TypeMismatch {
        column: String,
        expected: ValueKind,
        found: ValueKind,
    },

    /// Aucune ligne avec cette identité dans le cache.
    #[error("no row with identity {0}")]
    NoSuchRow(RowKey),

    /// Mode direct : l'identité ne désigne pas exactement une ligne.
    #[error("identity {key} matches {count} rows")]
    NonUniqueIdentity { key: RowKey, count: usize },

    /// Type natif sans équivalent côté Rust.
    #[error("column '{column}' has native type {native} with no value mapping")]
    UndefinedType { column: String, native: NativeType },

    /// Entrée de recherche ou de mutation mal formée.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Opération appelée dans le mauvais mode.
    #[error("{operation} is not available in {mode} mode")]
    Mode {
        operation: &'static str,
        mode: AccessMode,
    },

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// Synchronisation interrompue : les `applied` premiers statements ont
    /// été exécutés et ne sont pas annulés.
    #[error("synchronize stopped after {applied} of {total} statements: {source}")]
    PartialSync {
        applied: usize,
        total: usize,
        #[source]
        source: StoreError,
    },

    #[error("configuration error: {0}")]
    Config(String),
}

/// Résultat des opérations du moteur.
pub type TableResult<T> = Result<T, TableError>;
