// =============================================================================
// Store d'enregistrement partagé par les tests d'intégration
// =============================================================================
//
// RecordingStore journalise chaque SQL exécuté et sert :
//   - les réponses programmées (script), dans l'ordre, aux SELECT ;
//   - à défaut, le contenu courant de la table (set_rows).
//
// Il ne parse pas le SQL : c'est au test de fixer ce que la base contient
// après une écriture.
//
// =============================================================================

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tablesync::backend::{BackingStore, StoreError, StoreRecord};
use tablesync::core::schema::RawColumn;
use tablesync::core::typeside::Value;

#[derive(Default)]
struct Inner {
    columns: Vec<RawColumn>,
    rows: Vec<StoreRecord>,
    script: VecDeque<Vec<StoreRecord>>,
    executed: Vec<String>,
    commits: usize,
    fail_on: Option<String>,
}

/// Store factice ; les clones partagent le même état.
#[derive(Clone, Default)]
pub struct RecordingStore {
    inner: Rc<RefCell<Inner>>,
}

impl RecordingStore {
    pub fn new(columns: Vec<RawColumn>, rows: Vec<StoreRecord>) -> Self {
        let store = RecordingStore::default();
        {
            let mut inner = store.inner.borrow_mut();
            inner.columns = columns;
            inner.rows = rows;
        }
        store
    }

    /// Table Scores (ID, Name, Score) contenant Ann.
    pub fn scores() -> Self {
        RecordingStore::new(scores_columns(), vec![score(1, "Ann", 3.5)])
    }

    pub fn set_rows(&self, rows: Vec<StoreRecord>) {
        self.inner.borrow_mut().rows = rows;
    }

    pub fn set_columns(&self, columns: Vec<RawColumn>) {
        self.inner.borrow_mut().columns = columns;
    }

    /// Réponse du prochain SELECT.
    pub fn script(&self, answer: Vec<StoreRecord>) {
        self.inner.borrow_mut().script.push_back(answer);
    }

    /// Fait échouer tout statement contenant `fragment`.
    pub fn fail_on(&self, fragment: &str) {
        self.inner.borrow_mut().fail_on = Some(fragment.to_string());
    }

    pub fn executed(&self) -> Vec<String> {
        self.inner.borrow().executed.clone()
    }

    /// Statements exécutés hors SELECT.
    pub fn mutations(&self) -> Vec<String> {
        self.executed()
            .into_iter()
            .filter(|s| !s.starts_with("SELECT"))
            .collect()
    }

    pub fn commits(&self) -> usize {
        self.inner.borrow().commits
    }

    pub fn clear_log(&self) {
        self.inner.borrow_mut().executed.clear();
    }
}

impl BackingStore for RecordingStore {
    fn execute(&mut self, sql: &str) -> Result<Vec<StoreRecord>, StoreError> {
        let mut inner = self.inner.borrow_mut();
        if let Some(fragment) = &inner.fail_on {
            if sql.contains(fragment.as_str()) {
                return Err(StoreError::Execute {
                    sql: sql.to_string(),
                    reason: "constraint violation".into(),
                });
            }
        }
        inner.executed.push(sql.to_string());
        if !sql.starts_with("SELECT") {
            return Ok(Vec::new());
        }
        let scripted = inner.script.pop_front();
        Ok(scripted.unwrap_or_else(|| inner.rows.clone()))
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.inner.borrow_mut().commits += 1;
        Ok(())
    }

    fn describe_columns(&mut self, table: &str) -> Result<Vec<RawColumn>, StoreError> {
        let inner = self.inner.borrow();
        if inner.columns.is_empty() {
            return Err(StoreError::Describe {
                table: table.to_string(),
                reason: "no such table".into(),
            });
        }
        Ok(inner.columns.clone())
    }
}

pub fn scores_columns() -> Vec<RawColumn> {
    vec![
        RawColumn::new("ID", "COUNTER"),
        RawColumn::new("Name", "VARCHAR"),
        RawColumn::new("Score", "DOUBLE"),
    ]
}

pub fn score(id: i64, name: &str, score: f64) -> StoreRecord {
    StoreRecord::new().with("ID", id).with("Name", name).with("Score", score)
}

/// Réponse d'agrégat à une seule valeur (MAX, COUNT).
pub fn scalar(value: impl Into<Value>) -> Vec<StoreRecord> {
    vec![StoreRecord::new().with("value", value)]
}
