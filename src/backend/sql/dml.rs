// =============================================================================
// DML — Génération des statements SELECT / UPDATE / INSERT / DELETE
// =============================================================================
//
// Un statement par ligne affectée, toujours adressée par son identité :
//
//   UPDATE [Scores] SET [Name] = 'Bob', [Score] = 4.5 WHERE [ID] = 2;
//   INSERT INTO [Scores] ([ID], [Name], [Score]) VALUES (2, 'Bob', 4.5);
//   DELETE FROM [Scores] WHERE [ID] = 2;
//
// Règles de construction (à partir d'une Row du cache) :
//   - UPDATE : colonnes non NULL, hors identité ;
//   - INSERT : identité + toutes les colonnes non NULL ; une colonne
//     NOT NULL sans valeur reçoit la valeur par défaut de sa sorte
//     (0, '', faux, 1970-01-01...) ;
//   - DELETE : identité seule.
// Colonnes dans l'ordre du catalogue ; celles dont le type natif n'a pas
// d'équivalent sont sautées (aucune valeur n'a pu y être écrite).
//
// =============================================================================

use crate::backend::sql::codec::ValueCodec;
use crate::backend::sql::SqlDialect;
use crate::backend::{Statement, StatementKind};
use crate::core::instance::{Field, Row};
use crate::core::schema::ColumnCatalog;
use crate::core::typeside::RowKey;
use crate::error::TableResult;

/// Générateur de statements pour une table.
pub struct DmlBuilder<'a> {
    table: &'a str,
    catalog: &'a ColumnCatalog,
    codec: ValueCodec<'a>,
}

impl<'a> DmlBuilder<'a> {
    pub fn new(table: &'a str, catalog: &'a ColumnCatalog, dialect: &'a dyn SqlDialect) -> Self {
        DmlBuilder {
            table,
            catalog,
            codec: ValueCodec::new(dialect),
        }
    }

    fn quote(&self, name: &str) -> String {
        self.codec.dialect().quote_identifier(name)
    }

    fn key_condition(&self, key: &RowKey) -> TableResult<String> {
        Ok(format!(
            "{} = {}",
            self.quote(&self.catalog.identity().name),
            self.codec.key_literal(self.catalog, key)?
        ))
    }

    // ─── SELECT ──────────────────────────────────────────────────────────

    pub fn select_all(&self) -> Statement {
        Statement::new(
            StatementKind::Select,
            None,
            format!("SELECT * FROM {};", self.quote(self.table)),
        )
    }

    /// SELECT avec une clause WHERE déjà rendue.
    pub fn select_where(&self, condition: &str) -> Statement {
        Statement::new(
            StatementKind::Select,
            None,
            format!("SELECT * FROM {} WHERE {};", self.quote(self.table), condition),
        )
    }

    pub fn select_by_key(&self, key: &RowKey) -> TableResult<Statement> {
        let condition = self.key_condition(key)?;
        Ok(Statement::new(
            StatementKind::Select,
            Some(key.clone()),
            format!("SELECT * FROM {} WHERE {};", self.quote(self.table), condition),
        ))
    }

    pub fn select_max_key(&self) -> Statement {
        Statement::new(
            StatementKind::Select,
            None,
            format!(
                "SELECT MAX({}) FROM {};",
                self.quote(&self.catalog.identity().name),
                self.quote(self.table)
            ),
        )
    }

    /// COUNT(*) sur la table, ou sur une identité.
    pub fn count(&self, key: Option<&RowKey>) -> TableResult<Statement> {
        let table = self.quote(self.table);
        let sql = match key {
            Some(k) => format!("SELECT COUNT(*) FROM {} WHERE {};", table, self.key_condition(k)?),
            None => format!("SELECT COUNT(*) FROM {};", table),
        };
        Ok(Statement::new(StatementKind::Select, key.cloned(), sql))
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// UPDATE d'une ligne du cache. None si elle n'a rien à écrire.
    pub fn update(&self, row: &Row) -> TableResult<Option<Statement>> {
        let fields: Vec<Field> = self
            .catalog
            .columns()
            .iter()
            .skip(1)
            .filter(|c| self.codec.is_mapped(c))
            .map(|c| (c.name.clone(), row.get(&c.name).clone()))
            .filter(|(_, v)| !v.is_null())
            .collect();
        if fields.is_empty() {
            return Ok(None);
        }
        self.update_fields(row.key(), &fields).map(Some)
    }

    /// UPDATE explicite : les champs sont écrits tels quels (NULL compris).
    pub fn update_fields(&self, key: &RowKey, fields: &[Field]) -> TableResult<Statement> {
        let mut sets = Vec::with_capacity(fields.len());
        for (name, value) in fields {
            let column = self.catalog.lookup(name)?;
            sets.push(format!(
                "{} = {}",
                self.quote(&column.name),
                self.codec.to_literal(column, value)?
            ));
        }
        let sql = format!(
            "UPDATE {} SET {} WHERE {};",
            self.quote(self.table),
            sets.join(", "),
            self.key_condition(key)?
        );
        Ok(Statement::new(StatementKind::Update, Some(key.clone()), sql))
    }

    pub fn insert(&self, row: &Row) -> TableResult<Statement> {
        let mut names = Vec::new();
        let mut literals = Vec::new();
        for (i, column) in self.catalog.columns().iter().enumerate() {
            // L'identité est toujours écrite
            if i > 0 && !self.codec.is_mapped(column) {
                continue;
            }
            let value = row.get(&column.name);
            let literal = if i > 0 && value.is_null() {
                if column.nullable {
                    continue;
                }
                let default = self.codec.kind_of(column)?.default_value();
                self.codec.to_literal(column, &default)?
            } else {
                self.codec.to_literal(column, value)?
            };
            names.push(self.quote(&column.name));
            literals.push(literal);
        }
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({});",
            self.quote(self.table),
            names.join(", "),
            literals.join(", ")
        );
        Ok(Statement::new(StatementKind::Insert, Some(row.key().clone()), sql))
    }

    pub fn delete(&self, key: &RowKey) -> TableResult<Statement> {
        let sql = format!(
            "DELETE FROM {} WHERE {};",
            self.quote(self.table),
            self.key_condition(key)?
        );
        Ok(Statement::new(StatementKind::Delete, Some(key.clone()), sql))
    }
}
