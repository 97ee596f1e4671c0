// =============================================================================
// SCHEMA — Le catalogue typé des colonnes d'une table
// =============================================================================
//
// Le driver décrit une table par des tuples bruts (nom, nom de type, NULL ?).
// On les transforme en un ColumnCatalog :
//
//   ordinal │ nom    │ type natif
//   ────────┼────────┼────────────
//         0 │ ID     │ COUNTER      ← colonne d'identité (par convention)
//         1 │ Name   │ VARCHAR
//         2 │ Score  │ DOUBLE
//
// Le catalogue est immuable une fois chargé : un rafraîchissement du schéma
// le remplace en bloc.
//
// =============================================================================

use std::collections::HashMap;
use std::fmt;

use crate::error::{TableError, TableResult};

/// Type natif d'une colonne, tel que le moteur le nomme.
///
/// Union des étiquettes Access/ODBC et MySQL : chaque dialecte n'en
/// reconnaît qu'une partie, et décide dans sa table de codec lesquelles
/// ont un équivalent côté Rust.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum NativeType {
    // ─── Access / ODBC ───
    Counter,
    Long,
    Short,
    Byte,
    Single,
    Currency,
    LongChar,
    YesNo,
    Guid,
    Hyperlink,
    LongBinary,
    // ─── Communs ───
    Double,
    Decimal,
    VarChar,
    DateTime,
    // ─── MySQL ───
    TinyInt,
    SmallInt,
    MediumInt,
    Int,
    BigInt,
    Serial,
    Year,
    Bit,
    Float,
    Real,
    Boolean,
    Date,
    Timestamp,
    Time,
    Char,
    TinyText,
    Text,
    MediumText,
    LongText,
    Binary,
    VarBinary,
    TinyBlob,
    Blob,
    MediumBlob,
    LongBlob,
    Enum,
    Set,
    Json,
    Geometry,
    /// Étiquette inconnue du dialecte, conservée telle quelle
    Other(String),
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            NativeType::Counter => "COUNTER",
            NativeType::Long => "LONG",
            NativeType::Short => "SHORT",
            NativeType::Byte => "BYTE",
            NativeType::Single => "SINGLE",
            NativeType::Currency => "CURRENCY",
            NativeType::LongChar => "LONGCHAR",
            NativeType::YesNo => "YESNO",
            NativeType::Guid => "GUID",
            NativeType::Hyperlink => "HYPERLINK",
            NativeType::LongBinary => "LONGBINARY",
            NativeType::Double => "DOUBLE",
            NativeType::Decimal => "DECIMAL",
            NativeType::VarChar => "VARCHAR",
            NativeType::DateTime => "DATETIME",
            NativeType::TinyInt => "TINYINT",
            NativeType::SmallInt => "SMALLINT",
            NativeType::MediumInt => "MEDIUMINT",
            NativeType::Int => "INT",
            NativeType::BigInt => "BIGINT",
            NativeType::Serial => "SERIAL",
            NativeType::Year => "YEAR",
            NativeType::Bit => "BIT",
            NativeType::Float => "FLOAT",
            NativeType::Real => "REAL",
            NativeType::Boolean => "BOOLEAN",
            NativeType::Date => "DATE",
            NativeType::Timestamp => "TIMESTAMP",
            NativeType::Time => "TIME",
            NativeType::Char => "CHAR",
            NativeType::TinyText => "TINYTEXT",
            NativeType::Text => "TEXT",
            NativeType::MediumText => "MEDIUMTEXT",
            NativeType::LongText => "LONGTEXT",
            NativeType::Binary => "BINARY",
            NativeType::VarBinary => "VARBINARY",
            NativeType::TinyBlob => "TINYBLOB",
            NativeType::Blob => "BLOB",
            NativeType::MediumBlob => "MEDIUMBLOB",
            NativeType::LongBlob => "LONGBLOB",
            NativeType::Enum => "ENUM",
            NativeType::Set => "SET",
            NativeType::Json => "JSON",
            NativeType::Geometry => "GEOMETRY",
            NativeType::Other(name) => return write!(f, "{}", name),
        };
        write!(f, "{}", name)
    }
}

/// Métadonnée brute d'une colonne, telle que renvoyée par le driver.
#[derive(Debug, Clone, PartialEq)]
pub struct RawColumn {
    pub name: String,
    /// Nom du type côté moteur ("COUNTER", "varchar(40)", "tinyint(1)"...)
    pub type_name: String,
    pub nullable: bool,
}

impl RawColumn {
    pub fn new(name: &str, type_name: &str) -> Self {
        RawColumn {
            name: name.to_string(),
            type_name: type_name.to_string(),
            nullable: true,
        }
    }

    /// Colonne déclarée NOT NULL.
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }
}

/// Une colonne du catalogue.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub name: String,
    pub native: NativeType,
    pub ordinal: usize,
    /// Faux pour une colonne NOT NULL : un INSERT y écrit la valeur par
    /// défaut de sa sorte plutôt que de l'omettre.
    pub nullable: bool,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} : {}", self.name, self.native)
    }
}

/// Catalogue ordonné des colonnes d'une table.
///
/// Invariants :
/// - au moins une colonne ;
/// - noms uniques ;
/// - la colonne d'ordinal 0 est la colonne d'identité.
#[derive(Debug, Clone)]
pub struct ColumnCatalog {
    columns: Vec<Column>,
    by_name: HashMap<String, usize>,
}

impl ColumnCatalog {
    /// Construit le catalogue depuis les métadonnées du driver.
    ///
    /// `parse_type` traduit le nom de type brut en NativeType (c'est le
    /// dialecte qui sait lire ses propres noms de types).
    pub fn load<F>(raw: &[RawColumn], parse_type: F) -> TableResult<Self>
    where
        F: Fn(&str) -> NativeType,
    {
        if raw.is_empty() {
            return Err(TableError::Schema("table has no columns".into()));
        }

        let mut columns = Vec::with_capacity(raw.len());
        let mut by_name = HashMap::with_capacity(raw.len());
        for (ordinal, rc) in raw.iter().enumerate() {
            if by_name.insert(rc.name.clone(), ordinal).is_some() {
                return Err(TableError::Schema(format!(
                    "duplicate column name '{}'",
                    rc.name
                )));
            }
            columns.push(Column {
                name: rc.name.clone(),
                native: parse_type(&rc.type_name),
                ordinal,
                nullable: rc.nullable,
            });
        }

        Ok(ColumnCatalog { columns, by_name })
    }

    /// Recherche une colonne par nom.
    pub fn lookup(&self, name: &str) -> TableResult<&Column> {
        self.by_name
            .get(name)
            .map(|&i| &self.columns[i])
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(name)
    }

    /// La colonne d'identité (ordinal 0).
    pub fn identity(&self) -> &Column {
        &self.columns[0]
    }

    pub fn is_identity(&self, name: &str) -> bool {
        self.identity().name == name
    }

    /// Colonnes dans l'ordre des ordinaux.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

impl fmt::Display for ColumnCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cols: Vec<String> = self.columns.iter().map(|c| c.to_string()).collect();
        write!(f, "{{ {} }}", cols.join(", "))
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    fn parse(name: &str) -> NativeType {
        match name {
            "COUNTER" => NativeType::Counter,
            "VARCHAR" => NativeType::VarChar,
            "DOUBLE" => NativeType::Double,
            other => NativeType::Other(other.to_string()),
        }
    }

    fn scores_raw() -> Vec<RawColumn> {
        vec![
            RawColumn::new("ID", "COUNTER"),
            RawColumn::new("Name", "VARCHAR"),
            RawColumn::new("Score", "DOUBLE"),
        ]
    }

    #[test]
    fn test_load_catalog() {
        let catalog = ColumnCatalog::load(&scores_raw(), parse).unwrap();
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.identity().name, "ID");
        assert_eq!(catalog.identity().native, NativeType::Counter);
        assert_eq!(catalog.lookup("Score").unwrap().ordinal, 2);
        assert!(catalog.is_identity("ID"));
        assert!(!catalog.is_identity("Name"));
    }

    #[test]
    fn test_empty_table_is_schema_error() {
        let err = ColumnCatalog::load(&[], parse).unwrap_err();
        assert!(matches!(err, TableError::Schema(_)));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let mut raw = scores_raw();
        raw.push(RawColumn::new("Name", "VARCHAR"));
        assert!(matches!(
            ColumnCatalog::load(&raw, parse),
            Err(TableError::Schema(_))
        ));
    }

    #[test]
    fn test_unknown_column() {
        let catalog = ColumnCatalog::load(&scores_raw(), parse).unwrap();
        match catalog.lookup("Nope") {
            Err(TableError::UnknownColumn(name)) => assert_eq!(name, "Nope"),
            other => panic!("attendu UnknownColumn, obtenu {:?}", other),
        }
    }

    #[test]
    fn test_display() {
        let catalog = ColumnCatalog::load(&scores_raw(), parse).unwrap();
        assert_eq!(catalog.to_string(), "{ ID : COUNTER, Name : VARCHAR, Score : DOUBLE }");
    }
}
