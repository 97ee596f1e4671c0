// =============================================================================
// DIRECT — Accès direct à la table (aucun cache)
// =============================================================================
//
// Chaque appel exécute son SQL immédiatement puis valide (commit) avant de
// rendre la main. Pas d'états de ligne : l'identité est résolue dans la base
// à chaque fois, et doit désigner EXACTEMENT une ligne.
//
//   update(k) : SELECT ... WHERE id = k  →  0 ligne  : NoSuchRow
//                                           n > 1    : NonUniqueIdentity
//                                           1 ligne  : UPDATE + commit
//
// Sans équivalent ici : synchronize et l'annulation de suppression.
//
// Écritures par lot (upsert_rows, delete_rows) : un statement par ligne,
// un seul commit à la fin. Une erreur d'exécution n'arrête pas le lot,
// elle est rangée dans le BatchReport.
//
// =============================================================================

use tracing::{debug, info, warn};

use super::{
    explicit_key, next_key, reject_identity, validate_fields, BatchReport, SyncReport,
    TableAccess,
};
use crate::backend::sql::codec::ValueCodec;
use crate::backend::sql::dml::DmlBuilder;
use crate::backend::sql::planner::PredicateCompiler;
use crate::backend::sql::SqlDialect;
use crate::backend::{BackingStore, Statement, StoreError, StoreRecord};
use crate::config::AccessMode;
use crate::core::instance::{Field, Row};
use crate::core::query::SearchRequest;
use crate::core::schema::ColumnCatalog;
use crate::core::typeside::{RowKey, Value};
use crate::error::{TableError, TableResult};

/// Adaptateur de table en mode direct.
pub struct DirectTable<S: BackingStore> {
    table: String,
    dialect: Box<dyn SqlDialect>,
    store: S,
    catalog: ColumnCatalog,
}

impl<S: BackingStore> DirectTable<S> {
    pub fn open(table: &str, dialect: Box<dyn SqlDialect>, mut store: S) -> TableResult<Self> {
        let raw = store.describe_columns(table)?;
        let catalog = ColumnCatalog::load(&raw, |t| dialect.parse_native_type(t))?;
        info!(table, columns = catalog.len(), "direct table opened");
        Ok(DirectTable {
            table: table.to_string(),
            dialect,
            store,
            catalog,
        })
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    fn codec(&self) -> ValueCodec<'_> {
        ValueCodec::new(self.dialect.as_ref())
    }

    fn dml(&self) -> DmlBuilder<'_> {
        DmlBuilder::new(&self.table, &self.catalog, self.dialect.as_ref())
    }

    fn run(&mut self, stmt: &Statement) -> TableResult<Vec<StoreRecord>> {
        debug!(sql = %stmt, "direct");
        Ok(self.store.execute(&stmt.sql)?)
    }

    /// Exécute une mutation et la valide aussitôt.
    fn run_and_commit(&mut self, stmt: &Statement) -> TableResult<()> {
        self.run(stmt)?;
        self.store.commit()?;
        Ok(())
    }

    /// Ligne désignée par l'identité : exactement une, sinon erreur.
    pub fn get(&mut self, key: &RowKey) -> TableResult<Row> {
        let select = self.dml().select_by_key(key)?;
        let records = self.run(&select)?;
        match records.len() {
            0 => Err(TableError::NoSuchRow(key.clone())),
            1 => Row::from_record(&self.catalog, &records[0]),
            count => Err(TableError::NonUniqueIdentity { key: key.clone(), count }),
        }
    }

    /// Nombre de lignes de la table, ou portant une identité.
    pub fn count(&mut self, key: Option<&RowKey>) -> TableResult<usize> {
        let stmt = self.dml().count(key)?;
        let records = self.run(&stmt)?;
        match records.first().and_then(|r| r.first()) {
            Some(Value::Integer(n)) if *n >= 0 => Ok(*n as usize),
            other => Err(TableError::Store(StoreError::Execute {
                sql: stmt.sql.clone(),
                reason: format!("COUNT returned {:?}", other),
            })),
        }
    }

    fn max_key(&mut self) -> TableResult<Option<i64>> {
        let stmt = self.dml().select_max_key();
        let records = self.run(&stmt)?;
        match records.first().and_then(|r| r.first()) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::Integer(i)) => Ok(Some(*i)),
            Some(other) => Err(TableError::Store(StoreError::Execute {
                sql: stmt.sql.clone(),
                reason: format!("MAX returned {}", other),
            })),
        }
    }

    fn search_rows(&mut self, request: &SearchRequest) -> TableResult<Vec<Row>> {
        let select = {
            let compiler = PredicateCompiler::new(&self.catalog, self.dialect.as_ref());
            let predicate = compiler.compile(request)?;
            let condition = compiler.render_where(&predicate)?;
            self.dml().select_where(&condition)
        };
        let records = self.run(&select)?;
        records
            .iter()
            .map(|r| Row::from_record(&self.catalog, r))
            .collect()
    }

    fn update_row(&mut self, key: &RowKey, fields: &[Field]) -> TableResult<()> {
        validate_fields(&self.catalog, self.codec(), fields)?;
        reject_identity(&self.catalog, fields)?;
        self.get(key)?;
        let stmt = self.dml().update_fields(key, fields)?;
        self.run_and_commit(&stmt)
    }

    fn add_row(&mut self, fields: &[Field], key: Option<RowKey>) -> TableResult<RowKey> {
        validate_fields(&self.catalog, self.codec(), fields)?;
        let explicit = explicit_key(&self.catalog, self.codec(), fields, key)?;
        let key = match explicit {
            // L'identité ne doit pas déjà exister
            Some(k) => {
                let count = self.count(Some(&k))?;
                if count > 0 {
                    return Err(TableError::NonUniqueIdentity { key: k, count });
                }
                k
            }
            None => {
                let max = self.max_key()?;
                next_key(&self.catalog, self.codec(), max)?
            }
        };

        let stmt = self.dml().insert(&self.build_row(key.clone(), fields))?;
        self.run_and_commit(&stmt)?;
        Ok(key)
    }

    /// Ligne à insérer : l'identité plus les autres champs.
    fn build_row(&self, key: RowKey, fields: &[Field]) -> Row {
        let identity = &self.catalog.identity().name;
        let mut row = Row::new(key, identity);
        let payload: Vec<Field> = fields
            .iter()
            .filter(|(name, _)| name != identity)
            .cloned()
            .collect();
        row.merge(&payload);
        row
    }

    fn delete_row(&mut self, key: &RowKey, undo: bool) -> TableResult<()> {
        if undo {
            return Err(TableError::Mode {
                operation: "undelete",
                mode: AccessMode::Direct,
            });
        }
        self.get(key)?;
        let stmt = self.dml().delete(key)?;
        self.run_and_commit(&stmt)
    }
}

// ─── Écritures par lot ───────────────────────────────────────────────────────

impl<S: BackingStore> DirectTable<S> {
    /// Insère ou met à jour un lot de lignes, chacune portant son identité.
    ///
    /// Identité absente de la table : INSERT. Identité présente : si
    /// `overwrite`, UPDATE des champs non NULL qui diffèrent de la base ;
    /// sinon la ligne est ignorée. Tous les champs sont validés avant le
    /// premier SQL.
    pub fn upsert_rows(&mut self, rows: &[Vec<Field>], overwrite: bool) -> TableResult<BatchReport> {
        let mut keyed = Vec::with_capacity(rows.len());
        for fields in rows {
            validate_fields(&self.catalog, self.codec(), fields)?;
            let key = explicit_key(&self.catalog, self.codec(), fields, None)?.ok_or_else(|| {
                TableError::InvalidInput(format!(
                    "batch row has no '{}' value",
                    self.catalog.identity().name
                ))
            })?;
            keyed.push((key, fields));
        }

        let mut report = BatchReport::default();
        for (key, fields) in keyed {
            match self.upsert_one(&key, fields, overwrite) {
                Ok(true) => report.applied += 1,
                Ok(false) => report.skipped += 1,
                Err(e) => {
                    warn!(table = %self.table, key = %key, error = %e, "batch row failed");
                    report.errors.push(e);
                }
            }
        }
        self.finish_batch(report)
    }

    /// Une ligne du lot. Ok(false) : rien n'a été écrit.
    fn upsert_one(&mut self, key: &RowKey, fields: &[Field], overwrite: bool) -> TableResult<bool> {
        if self.count(Some(key))? == 0 {
            let stmt = self.dml().insert(&self.build_row(key.clone(), fields))?;
            self.run(&stmt)?;
            return Ok(true);
        }
        if !overwrite {
            debug!(key = %key, "identity already present, batch row skipped");
            return Ok(false);
        }

        let existing = self.get(key)?;
        let changed: Vec<Field> = fields
            .iter()
            .filter(|(name, value)| {
                !self.catalog.is_identity(name) && !value.is_null() && existing.get(name) != value
            })
            .cloned()
            .collect();
        if changed.is_empty() {
            return Ok(false);
        }
        let stmt = self.dml().update_fields(key, &changed)?;
        self.run(&stmt)?;
        Ok(true)
    }

    /// Supprime un lot d'identités. L'existence des lignes n'est pas
    /// vérifiée : un DELETE exécuté sans erreur compte comme appliqué.
    pub fn delete_rows(&mut self, keys: &[RowKey]) -> TableResult<BatchReport> {
        let statements = keys
            .iter()
            .map(|k| self.dml().delete(k))
            .collect::<TableResult<Vec<_>>>()?;

        let mut report = BatchReport::default();
        for stmt in &statements {
            match self.run(stmt) {
                Ok(_) => report.applied += 1,
                Err(e) => {
                    warn!(table = %self.table, sql = %stmt, error = %e, "batch delete failed");
                    report.errors.push(e);
                }
            }
        }
        self.finish_batch(report)
    }

    /// Commit unique du lot, seulement si quelque chose a été écrit.
    fn finish_batch(&mut self, mut report: BatchReport) -> TableResult<BatchReport> {
        if report.applied > 0 {
            if let Err(e) = self.store.commit() {
                report.errors.push(e.into());
            }
        }
        info!(table = %self.table, %report, "batch written");
        Ok(report)
    }
}

impl<S: BackingStore> TableAccess for DirectTable<S> {
    fn mode(&self) -> AccessMode {
        AccessMode::Direct
    }

    fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    fn search(&mut self, request: &SearchRequest) -> TableResult<Vec<Row>> {
        self.search_rows(request)
    }

    fn update(&mut self, key: &RowKey, fields: &[Field]) -> TableResult<()> {
        self.update_row(key, fields)
    }

    fn add(&mut self, fields: &[Field], key: Option<RowKey>) -> TableResult<RowKey> {
        self.add_row(fields, key)
    }

    fn delete(&mut self, key: &RowKey, undo: bool) -> TableResult<()> {
        self.delete_row(key, undo)
    }

    fn synchronize(&mut self) -> TableResult<SyncReport> {
        Err(TableError::Mode {
            operation: "synchronize",
            mode: AccessMode::Direct,
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sql::AccessDialect;
    use crate::core::instance::field;
    use crate::core::schema::RawColumn;

    /// Store qui répond toujours la même chose au SELECT.
    struct EchoStore {
        answer: Vec<StoreRecord>,
        executed: Vec<String>,
        commits: usize,
    }

    impl BackingStore for EchoStore {
        fn execute(&mut self, sql: &str) -> Result<Vec<StoreRecord>, StoreError> {
            self.executed.push(sql.to_string());
            if sql.starts_with("SELECT") {
                Ok(self.answer.clone())
            } else {
                Ok(Vec::new())
            }
        }

        fn commit(&mut self) -> Result<(), StoreError> {
            self.commits += 1;
            Ok(())
        }

        fn describe_columns(&mut self, _table: &str) -> Result<Vec<RawColumn>, StoreError> {
            Ok(vec![RawColumn::new("ID", "LONG"), RawColumn::new("Name", "VARCHAR")])
        }
    }

    fn table(answer: Vec<StoreRecord>) -> DirectTable<EchoStore> {
        let store = EchoStore { answer, executed: Vec::new(), commits: 0 };
        DirectTable::open("People", Box::new(AccessDialect), store).unwrap()
    }

    fn ann() -> StoreRecord {
        StoreRecord::new().with("ID", 1i64).with("Name", "Ann")
    }

    #[test]
    fn test_update_requires_exactly_one_row() {
        let mut none = table(vec![]);
        assert!(matches!(
            none.update_row(&RowKey::Int(1), &[field("Name", "x")]),
            Err(TableError::NoSuchRow(_))
        ));

        let mut twice = table(vec![ann(), ann()]);
        assert!(matches!(
            twice.update_row(&RowKey::Int(1), &[field("Name", "x")]),
            Err(TableError::NonUniqueIdentity { count: 2, .. })
        ));
        assert_eq!(twice.store.commits, 0);

        let mut once = table(vec![ann()]);
        once.update_row(&RowKey::Int(1), &[field("Name", "Anna")]).unwrap();
        assert_eq!(
            once.store.executed.last().unwrap(),
            "UPDATE [People] SET [Name] = 'Anna' WHERE [ID] = 1;"
        );
        assert_eq!(once.store.commits, 1);
    }

    #[test]
    fn test_undelete_and_synchronize_are_mode_errors() {
        let mut t = table(vec![ann()]);
        assert!(matches!(
            t.delete_row(&RowKey::Int(1), true),
            Err(TableError::Mode { operation: "undelete", .. })
        ));
        assert!(matches!(
            t.synchronize(),
            Err(TableError::Mode { operation: "synchronize", .. })
        ));
    }

    #[test]
    fn test_search_renders_where() {
        let mut t = table(vec![ann()]);
        let rows = t.search_rows(&SearchRequest::new(vec![field("Name", "A*")])).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(
            t.store.executed.last().unwrap(),
            "SELECT * FROM [People] WHERE [Name] LIKE 'A%';"
        );
    }
}
