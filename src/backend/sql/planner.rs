// =============================================================================
// SQL PLANNER — Compilation des recherches en prédicats et en WHERE
// =============================================================================
//
// Étape 1 : compile(SearchRequest) → Predicate
//   Chaque champ est résolu contre le catalogue puis traduit en terme :
//
//   ┌──────────────────────────────────────────────────────────────────┐
//   │ 1. colonne inconnue                 → UnknownColumnError         │
//   │ 2. type natif sans équivalent       → UndefinedTypeError         │
//   │ 3. colonne texte + valeur avec '*'  → LIKE (quel que soit kind) │
//   │ 4. Exact                            → = valeur  (ou IS NULL)     │
//   │ 5. StartsWith/EndsWith/Contains     → colonne non texte : ignoré │
//   │ 6. <, <=, >, >=                     → colonne non numérique :    │
//   │                                       ignoré                    │
//   │ sinon, sorte incompatible           → TypeMismatchError          │
//   └──────────────────────────────────────────────────────────────────┘
//
//   Attention : un terme ignoré ne contribue RIEN au prédicat, sans erreur.
//   Si tous les termes sont ignorés, le prédicat ne sélectionne rien.
//
// Étape 2 : render_where(Predicate) → texte SQL
//   SELECT * FROM [Scores] WHERE [Name] LIKE 'A%' AND [Score] >= 3.5
//
// =============================================================================

use tracing::debug;

use crate::backend::sql::codec::ValueCodec;
use crate::backend::sql::SqlDialect;
use crate::core::query::{
    has_wildcard, translate_wildcards, Predicate, SearchKind, SearchRequest, Term, TermOp,
};
use crate::core::schema::{Column, ColumnCatalog};
use crate::core::typeside::{Value, ValueKind};
use crate::error::{TableError, TableResult};

/// Compilateur de prédicats pour une table.
pub struct PredicateCompiler<'a> {
    catalog: &'a ColumnCatalog,
    codec: ValueCodec<'a>,
}

impl<'a> PredicateCompiler<'a> {
    pub fn new(catalog: &'a ColumnCatalog, dialect: &'a dyn SqlDialect) -> Self {
        PredicateCompiler {
            catalog,
            codec: ValueCodec::new(dialect),
        }
    }

    /// Compile une recherche. Aucune erreur ⇒ tous les champs ont été
    /// validés (termes retenus ou ignorés).
    pub fn compile(&self, request: &SearchRequest) -> TableResult<Predicate> {
        if request.fields.is_empty() {
            return Err(TableError::InvalidInput("search has no fields".into()));
        }

        let mut terms = Vec::with_capacity(request.fields.len());
        for (name, value) in &request.fields {
            let column = self.catalog.lookup(name)?;
            let kind = self.codec.kind_of(column)?;
            match self.compile_term(column, kind, value, request.kind)? {
                Some(op) => terms.push(Term { column: column.name.clone(), op }),
                None => debug!(
                    column = %column.name,
                    search = ?request.kind,
                    "search term dropped: comparison does not apply to column type"
                ),
            }
        }

        Ok(Predicate::new(terms, request.combinator)
            .fold_case(self.codec.dialect().case_insensitive()))
    }

    fn compile_term(
        &self,
        column: &Column,
        kind: ValueKind,
        value: &Value,
        search: SearchKind,
    ) -> TableResult<Option<TermOp>> {
        // Le joker l'emporte sur le type de comparaison demandé
        if kind.is_text() {
            if let Value::Text(s) = value {
                if has_wildcard(s) {
                    return Ok(Some(TermOp::Like(translate_wildcards(s))));
                }
            }
        }

        if search == SearchKind::Exact {
            if value.is_null() {
                return Ok(Some(TermOp::IsNull));
            }
            self.codec.validate(column, value)?;
            return Ok(Some(TermOp::Eq(value.clone())));
        }

        if search.is_text_match() {
            if !kind.is_text() {
                return Ok(None);
            }
            let text = match value {
                Value::Text(s) => s.clone(),
                other => return Err(mismatch(column, kind, other)),
            };
            return Ok(Some(match search {
                SearchKind::StartsWith => TermOp::StartsWith(text),
                SearchKind::EndsWith => TermOp::EndsWith(text),
                _ => TermOp::Contains(text),
            }));
        }

        match search.ordering() {
            Some(op) => {
                if !kind.is_numeric() {
                    return Ok(None);
                }
                match value.kind() {
                    Some(k) if k.is_numeric() => Ok(Some(TermOp::Compare(op, value.clone()))),
                    _ => Err(mismatch(column, kind, value)),
                }
            }
            None => Ok(None),
        }
    }

    /// Rend un prédicat en clause WHERE (sans le mot-clé WHERE).
    pub fn render_where(&self, predicate: &Predicate) -> TableResult<String> {
        if predicate.is_empty() {
            return Ok("1 = 0".to_string());
        }

        let dialect = self.codec.dialect();
        let mut parts = Vec::with_capacity(predicate.terms.len());
        for term in &predicate.terms {
            let column = self.catalog.lookup(&term.column)?;
            let col = dialect.quote_identifier(&column.name);
            let like = |pattern: String| format!("{} LIKE '{}'", col, dialect.escape_text(&pattern));
            let part = match &term.op {
                TermOp::Eq(v) => format!("{} = {}", col, self.codec.to_literal(column, v)?),
                TermOp::IsNull => format!("{} IS NULL", col),
                TermOp::Like(pattern) => like(pattern.clone()),
                TermOp::StartsWith(s) => like(format!("{}%", dialect.escape_like(s))),
                TermOp::EndsWith(s) => like(format!("%{}", dialect.escape_like(s))),
                TermOp::Contains(s) => like(format!("%{}%", dialect.escape_like(s))),
                TermOp::Compare(op, v) => format!("{} {} {}", col, op, numeric_literal(column, v)?),
            };
            parts.push(part);
        }

        Ok(parts.join(&format!(" {} ", predicate.combinator)))
    }
}

/// Littéral d'une borne numérique : rendu selon la sorte de la VALEUR,
/// puisque Integer, Float et Decimal se comparent entre eux.
fn numeric_literal(column: &Column, value: &Value) -> TableResult<String> {
    match value {
        Value::Integer(i) => Ok(i.to_string()),
        Value::Float(f) if f.is_finite() => Ok(f.to_string()),
        Value::Decimal(d) => Ok(d.to_string()),
        other => Err(TableError::InvalidInput(format!(
            "value {} cannot bound column '{}'",
            other, column.name
        ))),
    }
}

fn mismatch(column: &Column, expected: ValueKind, value: &Value) -> TableError {
    match value.kind() {
        Some(found) => TableError::TypeMismatch {
            column: column.name.clone(),
            expected,
            found,
        },
        None => TableError::InvalidInput(format!(
            "NULL cannot be used with this comparison on column '{}'",
            column.name
        )),
    }
}
