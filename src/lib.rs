// =============================================================================
// TABLESYNC — Unité de travail sur une table SQL, en Rust
// =============================================================================
//
// tablesync tient en mémoire le miroir d'une table (Access/ODBC ou MySQL),
// suit l'état de chaque ligne (NotChanged, Updated, Added, Deleted) et
// traduit les changements en SQL typé au moment de la synchronisation.
// Un mode direct expose le même contrat en allant à la base à chaque appel.
//
// Architecture :
//   core/     → Le cœur pur : valeurs, catalogue, lignes, états, prédicats
//   backend/  → Le backing store et la traduction en SQL (dialectes, codec)
//   table/    → Les deux modes d'accès (TableCache, DirectTable)
//   config    → Configuration TOML d'une table
//   error     → Les erreurs du moteur
//
// Concepts fondamentaux :
//   ColumnCatalog  = les colonnes de la table, l'identité en tête
//   ValueCodec     = type natif → sorte Rust + rendu en littéral SQL
//   Predicate      = une recherche compilée, évaluable en SQL ou en mémoire
//   RowState       = l'automate qui décide du SQL à la synchronisation
//
// =============================================================================

pub mod core;
pub mod backend;
pub mod table;
pub mod config;
pub mod error;

pub use crate::config::{AccessMode, DialectKind, TableConfig};
pub use crate::error::{TableError, TableResult};
pub use crate::table::{
    open_table, BatchReport, DirectTable, SyncReport, TableAccess, TableCache,
};
