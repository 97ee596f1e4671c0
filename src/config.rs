// =============================================================================
// CONFIG — Configuration d'une table
// =============================================================================
//
// Fichier TOML minimal :
//
//   table   = "Scores"
//   dialect = "access"     # access | mysql        (défaut : access)
//   mode    = "buffered"   # buffered | direct     (défaut : buffered)
//
// Le mode est choisi UNE fois, à la construction (open_table) : aucune
// méthode ne teste de drapeau de mode.
//
// =============================================================================

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::backend::sql::{AccessDialect, MySqlDialect, SqlDialect};
use crate::error::{TableError, TableResult};

/// Profil de dialecte SQL.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DialectKind {
    #[default]
    Access,
    #[serde(alias = "my_sql")]
    MySql,
}

impl DialectKind {
    pub fn build(&self) -> Box<dyn SqlDialect> {
        match self {
            DialectKind::Access => Box::new(AccessDialect),
            DialectKind::MySql => Box::new(MySqlDialect),
        }
    }
}

/// Mode d'accès à la table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessMode {
    /// Cache en mémoire, écriture à la synchronisation
    #[default]
    Buffered,
    /// Chaque appel fait l'aller-retour avec la base
    Direct,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Buffered => write!(f, "buffered"),
            AccessMode::Direct => write!(f, "direct"),
        }
    }
}

/// Configuration d'une table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Nom de la table dans la base.
    pub table: String,

    #[serde(default)]
    pub dialect: DialectKind,

    #[serde(default)]
    pub mode: AccessMode,
}

impl TableConfig {
    pub fn new(table: &str) -> Self {
        TableConfig {
            table: table.to_string(),
            dialect: DialectKind::default(),
            mode: AccessMode::default(),
        }
    }

    pub fn dialect(mut self, dialect: DialectKind) -> Self {
        self.dialect = dialect;
        self
    }

    pub fn mode(mut self, mode: AccessMode) -> Self {
        self.mode = mode;
        self
    }

    /// Lit une configuration depuis un texte TOML.
    pub fn from_toml_str(text: &str) -> TableResult<Self> {
        let config: TableConfig =
            toml::from_str(text).map_err(|e| TableError::Config(e.to_string()))?;
        if config.table.trim().is_empty() {
            return Err(TableError::Config("table name is empty".into()));
        }
        Ok(config)
    }

    /// Lit une configuration depuis un fichier TOML.
    pub fn load(path: &Path) -> TableResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| TableError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    pub fn to_toml_string(&self) -> TableResult<String> {
        toml::to_string_pretty(self).map_err(|e| TableError::Config(e.to_string()))
    }
}
