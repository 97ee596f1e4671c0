// =============================================================================
// CORE — Le cœur du moteur de table
// =============================================================================
//
// Ce module regroupe la logique pure :
// pas de SQL, pas de réseau, uniquement des valeurs, des lignes et leurs
// états.
//
// Architecture :
//   typeside  → les valeurs (Integer, Decimal, Text, Date...) et les identités
//   schema    → le catalogue des colonnes et leurs types natifs
//   instance  → les lignes en mémoire
//   state     → l'automate d'état des lignes
//   query     → les recherches et leur évaluation en mémoire
//
// =============================================================================

pub mod typeside;
pub mod schema;
pub mod instance;
pub mod state;
pub mod query;
