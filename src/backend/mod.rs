// =============================================================================
// BACKEND — Le backing store et les statements qu'on lui envoie
// =============================================================================
//
// Le moteur ne connaît pas le protocole réseau de la base. Il consomme une
// capacité opaque, le trait BackingStore, réduite à trois opérations :
//
//   execute(sql)              → lignes résultat (vide pour UPDATE/INSERT/DELETE)
//   commit()                  → valide la transaction implicite du driver
//   describe_columns(table)   → métadonnées brutes des colonnes
//
// Les timeouts, la reconnexion et le pooling sont l'affaire de
// l'implémentation du store, jamais du moteur.
//
// Le sous-module sql traduit les structures du cœur en texte SQL, selon
// un dialecte (Access/ODBC ou MySQL).
//
// =============================================================================

pub mod sql;

use std::fmt;

use thiserror::Error;

use crate::core::schema::RawColumn;
use crate::core::typeside::{RowKey, Value};

/// Erreur remontée par le backing store.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("execution of `{sql}` failed: {reason}")]
    Execute { sql: String, reason: String },

    #[error("commit failed: {0}")]
    Commit(String),

    #[error("cannot describe table '{table}': {reason}")]
    Describe { table: String, reason: String },
}

/// Une ligne renvoyée par le store : paires (colonne, valeur) dans l'ordre
/// du SELECT.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StoreRecord {
    fields: Vec<(String, Value)>,
}

impl StoreRecord {
    pub fn new() -> Self {
        StoreRecord { fields: Vec::new() }
    }

    /// Ajoute un champ (style builder).
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn push(&mut self, name: &str, value: Value) {
        self.fields.push((name.to_string(), value));
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Première valeur de la ligne (pour les agrégats type MAX / COUNT).
    pub fn first(&self) -> Option<&Value> {
        self.fields.first().map(|(_, v)| v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// Capacité minimale attendue du backing store.
pub trait BackingStore {
    /// Exécute un statement SQL et renvoie les lignes produites.
    fn execute(&mut self, sql: &str) -> Result<Vec<StoreRecord>, StoreError>;

    /// Valide les statements exécutés depuis le dernier commit.
    fn commit(&mut self) -> Result<(), StoreError>;

    /// Métadonnées brutes des colonnes d'une table, dans l'ordre des ordinaux.
    fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, StoreError>;
}

impl<S: BackingStore + ?Sized> BackingStore for &mut S {
    fn execute(&mut self, sql: &str) -> Result<Vec<StoreRecord>, StoreError> {
        (**self).execute(sql)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, StoreError> {
        (**self).describe_columns(table)
    }
}

impl<S: BackingStore + ?Sized> BackingStore for Box<S> {
    fn execute(&mut self, sql: &str) -> Result<Vec<StoreRecord>, StoreError> {
        (**self).execute(sql)
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        (**self).commit()
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, StoreError> {
        (**self).describe_columns(table)
    }
}

/// Nature d'un statement généré.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Update,
    Insert,
    Delete,
}

/// Un statement SQL généré par le moteur.
///
/// `key` désigne la ligne ciblée pour UPDATE / INSERT / DELETE.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub kind: StatementKind,
    pub key: Option<RowKey>,
    pub sql: String,
}

impl Statement {
    pub fn new(kind: StatementKind, key: Option<RowKey>, sql: String) -> Self {
        Statement { kind, key, sql }
    }
}

impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.sql)
    }
}
