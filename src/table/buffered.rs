// =============================================================================
// BUFFERED — Le cache de table (mode tamponné)
// =============================================================================
//
// Le cache possède :
//   rows    : identité → Row
//   tracker : identité → RowState      (même espace de clés que rows)
//
// Cycle de vie :
//
//   open ──▶ reload ──▶ [update | add | delete]* ──▶ synchronize ──▶ reload
//              │                                          │
//              └── toutes les lignes NotChanged            └── UPDATE, puis
//                                                              INSERT, puis
//                                                              DELETE, commit
//
// Les mutations ne touchent JAMAIS la base. La lecture canonique
// (get_copy, search) exclut les lignes Deleted ; get(identité) les voit.
//
// =============================================================================

use std::collections::BTreeMap;

use tracing::{debug, info, warn};

use super::{explicit_key, next_key, reject_identity, validate_fields, SyncReport, TableAccess};
use crate::backend::sql::codec::ValueCodec;
use crate::backend::sql::dml::DmlBuilder;
use crate::backend::sql::planner::PredicateCompiler;
use crate::backend::sql::SqlDialect;
use crate::backend::{BackingStore, Statement, StatementKind, StoreRecord};
use crate::config::AccessMode;
use crate::core::instance::{Field, Row};
use crate::core::query::SearchRequest;
use crate::core::schema::ColumnCatalog;
use crate::core::state::{Mutation, PendingChanges, RowState, RowStateTracker};
use crate::core::typeside::RowKey;
use crate::error::{TableError, TableResult};

/// Miroir en mémoire d'une table, avec suivi d'état par ligne.
pub struct TableCache<S: BackingStore> {
    table: String,
    dialect: Box<dyn SqlDialect>,
    store: S,
    catalog: ColumnCatalog,
    rows: BTreeMap<RowKey, Row>,
    tracker: RowStateTracker,
}

impl<S: BackingStore> TableCache<S> {
    /// Lit le catalogue de la table puis charge toutes ses lignes.
    pub fn open(table: &str, dialect: Box<dyn SqlDialect>, mut store: S) -> TableResult<Self> {
        let raw = store.describe_columns(table)?;
        let catalog = ColumnCatalog::load(&raw, |t| dialect.parse_native_type(t))?;
        let mut cache = TableCache {
            table: table.to_string(),
            dialect,
            store,
            catalog,
            rows: BTreeMap::new(),
            tracker: RowStateTracker::new(),
        };
        cache.reload()?;
        Ok(cache)
    }

    /// Remplace le catalogue et toutes les lignes ; chaque ligne repart
    /// NotChanged. Rien n'est modifié si un enregistrement est illisible.
    pub fn load(&mut self, catalog: ColumnCatalog, records: &[StoreRecord]) -> TableResult<()> {
        let mut rows = BTreeMap::new();
        for record in records {
            let row = Row::from_record(&catalog, record)?;
            if rows.contains_key(row.key()) {
                warn!(table = %self.table, key = %row.key(), "duplicate identity in loaded rows, keeping the last one");
            }
            rows.insert(row.key().clone(), row);
        }

        self.tracker.reset(rows.keys());
        self.rows = rows;
        self.catalog = catalog;
        info!(table = %self.table, rows = self.rows.len(), "table loaded");
        Ok(())
    }

    /// Recharge toutes les lignes depuis la base (catalogue inchangé).
    pub fn reload(&mut self) -> TableResult<()> {
        let select = DmlBuilder::new(&self.table, &self.catalog, self.dialect.as_ref()).select_all();
        debug!(sql = %select, "reload");
        let records = self.store.execute(&select.sql)?;
        let catalog = self.catalog.clone();
        self.load(catalog, &records)
    }

    /// Relit le catalogue de la base puis recharge les lignes.
    pub fn refresh_schema(&mut self) -> TableResult<()> {
        let raw = self.store.describe_columns(&self.table)?;
        let catalog = ColumnCatalog::load(&raw, |t| self.dialect.parse_native_type(t))?;
        let select = DmlBuilder::new(&self.table, &catalog, self.dialect.as_ref()).select_all();
        let records = self.store.execute(&select.sql)?;
        self.load(catalog, &records)
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    /// Ligne par identité, quel que soit son état (Deleted compris).
    pub fn get(&self, key: &RowKey) -> Option<&Row> {
        self.rows.get(key)
    }

    /// Lecture canonique : toutes les lignes non supprimées.
    pub fn get_copy(&self) -> Vec<&Row> {
        self.rows
            .values()
            .filter(|r| self.tracker.state(r.key()) != Some(RowState::Deleted))
            .collect()
    }

    pub fn state(&self, key: &RowKey) -> Option<RowState> {
        self.tracker.state(key)
    }

    pub fn pending(&self) -> PendingChanges {
        self.tracker.pending()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn codec(&self) -> ValueCodec<'_> {
        ValueCodec::new(self.dialect.as_ref())
    }

    // ─── Recherche ───────────────────────────────────────────────────────

    /// Recherche sur la lecture canonique, sans SQL.
    pub fn view(&self, request: &SearchRequest) -> TableResult<Vec<&Row>> {
        let predicate =
            PredicateCompiler::new(&self.catalog, self.dialect.as_ref()).compile(request)?;
        Ok(predicate.filter(self.get_copy()))
    }

    /// Recherche dans le résultat d'une recherche précédente.
    ///
    /// Permet de combiner AND et OR : chaque passe a son combinateur.
    pub fn search_within<'r, I>(&self, source: I, request: &SearchRequest) -> TableResult<Vec<&'r Row>>
    where
        I: IntoIterator<Item = &'r Row>,
    {
        let source: Vec<&'r Row> = source.into_iter().collect();
        if source.is_empty() {
            return Err(TableError::InvalidInput("search source is empty".into()));
        }
        let predicate =
            PredicateCompiler::new(&self.catalog, self.dialect.as_ref()).compile(request)?;
        Ok(predicate.filter(source))
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    fn update_row(&mut self, key: &RowKey, fields: &[Field]) -> TableResult<()> {
        validate_fields(&self.catalog, self.codec(), fields)?;
        reject_identity(&self.catalog, fields)?;
        if !self.rows.contains_key(key) {
            return Err(TableError::NoSuchRow(key.clone()));
        }

        match self.tracker.apply(key, Mutation::Update)? {
            Some(_) => {
                if let Some(row) = self.rows.get_mut(key) {
                    row.merge(fields);
                }
            }
            None => warn!(table = %self.table, key = %key, "update ignored: row is deleted"),
        }
        Ok(())
    }

    fn add_row(&mut self, fields: &[Field], key: Option<RowKey>) -> TableResult<RowKey> {
        let codec = self.codec();
        validate_fields(&self.catalog, codec, fields)?;
        let key = match explicit_key(&self.catalog, codec, fields, key)? {
            Some(k) => k,
            None => {
                let max = self
                    .rows
                    .keys()
                    .filter_map(|k| match k {
                        RowKey::Int(i) => Some(*i),
                        RowKey::Text(_) => None,
                    })
                    .max();
                next_key(&self.catalog, codec, max)?
            }
        };

        let identity = self.catalog.identity().name.clone();
        let mut row = Row::new(key.clone(), &identity);
        let payload: Vec<Field> = fields
            .iter()
            .filter(|(name, _)| *name != identity)
            .cloned()
            .collect();
        row.merge(&payload);

        if self.rows.insert(key.clone(), row).is_some() {
            debug!(table = %self.table, key = %key, "add overwrites an existing row");
        }
        self.tracker.mark_added(key.clone());
        Ok(key)
    }

    fn delete_row(&mut self, key: &RowKey, undo: bool) -> TableResult<()> {
        if !self.rows.contains_key(key) {
            return Err(TableError::NoSuchRow(key.clone()));
        }
        let mutation = if undo { Mutation::Undelete } else { Mutation::Delete };
        if self.tracker.apply(key, mutation)?.is_none() {
            warn!(
                table = %self.table,
                key = %key,
                state = ?self.tracker.state(key),
                ?mutation,
                "transition refused, row left as is"
            );
        }
        Ok(())
    }

    // ─── Synchronisation ─────────────────────────────────────────────────

    /// Statements de la synchronisation : UPDATE, puis INSERT, puis DELETE,
    /// chacun dans l'ordre des identités.
    pub fn pending_statements(&self) -> TableResult<Vec<Statement>> {
        let dml = DmlBuilder::new(&self.table, &self.catalog, self.dialect.as_ref());
        let mut statements = Vec::new();

        for key in self.tracker.keys_in(RowState::Updated) {
            let row = self.rows.get(&key).ok_or_else(|| TableError::NoSuchRow(key.clone()))?;
            match dml.update(row)? {
                Some(stmt) => statements.push(stmt),
                None => warn!(table = %self.table, key = %key, "updated row has nothing to write, skipped"),
            }
        }
        for key in self.tracker.keys_in(RowState::Added) {
            let row = self.rows.get(&key).ok_or_else(|| TableError::NoSuchRow(key.clone()))?;
            statements.push(dml.insert(row)?);
        }
        for key in self.tracker.keys_in(RowState::Deleted) {
            statements.push(dml.delete(&key)?);
        }
        Ok(statements)
    }

    fn flush(&mut self) -> TableResult<SyncReport> {
        let statements = self.pending_statements()?;
        let total = statements.len();
        let mut report = SyncReport::default();

        for (applied, stmt) in statements.iter().enumerate() {
            debug!(sql = %stmt, "synchronize");
            if let Err(source) = self.store.execute(&stmt.sql) {
                warn!(table = %self.table, applied, total, error = %source, "synchronize interrupted");
                return Err(TableError::PartialSync { applied, total, source });
            }
            match stmt.kind {
                StatementKind::Update => report.updated += 1,
                StatementKind::Insert => report.inserted += 1,
                StatementKind::Delete => report.deleted += 1,
                StatementKind::Select => {}
            }
        }

        self.store.commit()?;
        self.reload()?;
        info!(table = %self.table, %report, "table synchronized");
        Ok(report)
    }
}

impl<S: BackingStore> TableAccess for TableCache<S> {
    fn mode(&self) -> AccessMode {
        AccessMode::Buffered
    }

    fn catalog(&self) -> &ColumnCatalog {
        &self.catalog
    }

    fn search(&mut self, request: &SearchRequest) -> TableResult<Vec<Row>> {
        Ok(self.view(request)?.into_iter().cloned().collect())
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
        self.flush()
    }
}
