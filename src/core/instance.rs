// =============================================================================
// INSTANCE — Les lignes en mémoire
// =============================================================================
//
// Une Row est le miroir d'une ligne de la table :
//   - une identité (RowKey), tirée de la colonne d'identité, immuable ;
//   - une map colonne → valeur (la colonne d'identité y figure aussi).
//
// Une colonne absente de la map vaut NULL.
//
// =============================================================================

use std::collections::HashMap;

use super::schema::ColumnCatalog;
use super::typeside::{RowKey, Value};
use crate::backend::StoreRecord;
use crate::error::{TableError, TableResult};

static NULL: Value = Value::Null;

/// Un champ d'une requête de mutation ou de recherche : (colonne, valeur).
pub type Field = (String, Value);

/// Raccourci pour construire un champ.
pub fn field(name: &str, value: impl Into<Value>) -> Field {
    (name.to_string(), value.into())
}

/// Une ligne de la table.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    key: RowKey,
    values: HashMap<String, Value>,
}

impl Row {
    /// Crée une ligne ; la valeur d'identité est rangée sous `identity_column`.
    pub fn new(key: RowKey, identity_column: &str) -> Self {
        let mut values = HashMap::new();
        values.insert(identity_column.to_string(), key.to_value());
        Row { key, values }
    }

    /// Décode une ligne renvoyée par le store.
    ///
    /// Les champs inconnus du catalogue sont ignorés, les colonnes absentes
    /// valent NULL. La colonne d'identité doit porter un entier ou un texte.
    pub fn from_record(catalog: &ColumnCatalog, record: &StoreRecord) -> TableResult<Self> {
        let identity = catalog.identity();
        let key = record
            .get(&identity.name)
            .and_then(RowKey::from_value)
            .ok_or_else(|| {
                TableError::InvalidInput(format!(
                    "record has no usable identity in column '{}'",
                    identity.name
                ))
            })?;

        let mut row = Row::new(key, &identity.name);
        for column in catalog.columns().iter().skip(1) {
            if let Some(value) = record.get(&column.name) {
                if !value.is_null() {
                    row.values.insert(column.name.clone(), value.clone());
                }
            }
        }
        Ok(row)
    }

    pub fn key(&self) -> &RowKey {
        &self.key
    }

    /// Valeur d'une colonne (NULL si absente).
    pub fn get(&self, column: &str) -> &Value {
        self.values.get(column).unwrap_or(&NULL)
    }

    /// Fusionne des champs dans la ligne. Un champ NULL efface la valeur.
    pub fn merge(&mut self, fields: &[Field]) {
        for (name, value) in fields {
            if value.is_null() {
                self.values.remove(name);
            } else {
                self.values.insert(name.clone(), value.clone());
            }
        }
    }

    /// Paires (colonne, valeur) non NULL, dans un ordre quelconque.
    pub fn values(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(n, v)| (n.as_str(), v))
    }
}
