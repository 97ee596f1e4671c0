// =============================================================================
// QUERY — L'algèbre de recherche et son évaluation en mémoire
// =============================================================================
//
// Une recherche est un triplet :
//   champs      : [(colonne, valeur)]     (ordonné)
//   kind        : Exact | StartsWith | EndsWith | Contains
//                 | LessThan | LessOrEqual | GreaterThan | GreaterOrEqual
//   combinator  : AND | OR                (le même pour tous les champs)
//
// Elle est COMPILÉE (backend::sql::planner) en un Predicate : une liste de
// termes déjà résolus contre le catalogue. Le même Predicate sert :
//   - à produire la clause WHERE (mode direct),
//   - à filtrer les lignes en mémoire (mode tamponné).
// Les deux chemins ont donc par construction la même sémantique.
//
// Casse : les collations par défaut d'Access et de MySQL comparent '=' et
// LIKE sans tenir compte de la casse. Le Predicate porte ce réglage
// (fold_case, fixé par le dialecte à la compilation) pour que le filtre
// en mémoire trouve "Ann" quand on cherche "ann", comme le ferait le SQL.
//
// Pour mélanger AND et OR, on recherche dans le résultat d'une recherche
// précédente.
//
// =============================================================================

use std::borrow::Cow;
use std::cmp::Ordering;
use std::fmt;

use super::instance::{Field, Row};
use super::typeside::Value;

/// Marqueur de joker côté appelant.
pub const WILDCARD: char = '*';

/// Type de comparaison demandé.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchKind {
    Exact,
    StartsWith,
    EndsWith,
    Contains,
    LessThan,
    LessOrEqual,
    GreaterThan,
    GreaterOrEqual,
}

impl SearchKind {
    pub fn is_text_match(&self) -> bool {
        matches!(self, SearchKind::StartsWith | SearchKind::EndsWith | SearchKind::Contains)
    }

    /// Opérateur d'ordre correspondant, s'il y en a un.
    pub fn ordering(&self) -> Option<CompOp> {
        match self {
            SearchKind::LessThan => Some(CompOp::Lt),
            SearchKind::LessOrEqual => Some(CompOp::Le),
            SearchKind::GreaterThan => Some(CompOp::Gt),
            SearchKind::GreaterOrEqual => Some(CompOp::Ge),
            _ => None,
        }
    }
}

/// Combinaison des termes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    And,
    Or,
}

impl fmt::Display for Combinator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Combinator::And => write!(f, "AND"),
            Combinator::Or => write!(f, "OR"),
        }
    }
}

/// Une requête de recherche.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub fields: Vec<Field>,
    pub kind: SearchKind,
    pub combinator: Combinator,
}

impl SearchRequest {
    /// Recherche exacte, termes combinés par AND.
    pub fn new(fields: Vec<Field>) -> Self {
        SearchRequest {
            fields,
            kind: SearchKind::Exact,
            combinator: Combinator::And,
        }
    }

    pub fn kind(mut self, kind: SearchKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn combinator(mut self, combinator: Combinator) -> Self {
        self.combinator = combinator;
        self
    }
}

/// Opérateur d'ordre
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompOp {
    Lt,  // <
    Le,  // <=
    Gt,  // >
    Ge,  // >=
}

impl CompOp {
    fn holds(&self, ord: Ordering) -> bool {
        match self {
            CompOp::Lt => ord == Ordering::Less,
            CompOp::Le => ord != Ordering::Greater,
            CompOp::Gt => ord == Ordering::Greater,
            CompOp::Ge => ord != Ordering::Less,
        }
    }
}

impl fmt::Display for CompOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompOp::Lt => write!(f, "<"),
            CompOp::Le => write!(f, "<="),
            CompOp::Gt => write!(f, ">"),
            CompOp::Ge => write!(f, ">="),
        }
    }
}

/// Opération d'un terme compilé.
#[derive(Debug, Clone, PartialEq)]
pub enum TermOp {
    /// colonne = valeur
    Eq(Value),
    /// colonne IS NULL
    IsNull,
    /// colonne LIKE motif ('%' et '_' sont des jokers)
    Like(String),
    /// Préfixe / suffixe / sous-chaîne littéraux
    StartsWith(String),
    EndsWith(String),
    Contains(String),
    /// colonne <op> valeur numérique
    Compare(CompOp, Value),
}

/// Un terme : une restriction sur une colonne.
#[derive(Debug, Clone, PartialEq)]
pub struct Term {
    pub column: String,
    pub op: TermOp,
}

impl Term {
    /// Évalue le terme sur une ligne.
    ///
    /// Avec `fold_case`, les comparaisons de texte (=, LIKE, préfixe,
    /// suffixe, sous-chaîne) ignorent la casse.
    pub fn matches(&self, row: &Row, fold_case: bool) -> bool {
        let value = row.get(&self.column);
        let text = |t: &str| fold(t, fold_case).into_owned();
        match &self.op {
            TermOp::IsNull => value.is_null(),
            TermOp::Eq(Value::Text(expected)) => value
                .as_text()
                .is_some_and(|t| fold(t, fold_case) == fold(expected, fold_case)),
            // NULL = x n'est jamais vrai
            TermOp::Eq(expected) => !value.is_null() && value == expected,
            TermOp::Like(pattern) => value
                .as_text()
                .is_some_and(|t| like_matches(&text(t), &text(pattern))),
            TermOp::StartsWith(s) => value.as_text().is_some_and(|t| text(t).starts_with(&text(s))),
            TermOp::EndsWith(s) => value.as_text().is_some_and(|t| text(t).ends_with(&text(s))),
            TermOp::Contains(s) => value.as_text().is_some_and(|t| text(t).contains(&text(s))),
            TermOp::Compare(op, bound) => value
                .compare_numeric(bound)
                .is_some_and(|ord| op.holds(ord)),
        }
    }
}

fn fold(text: &str, fold_case: bool) -> Cow<'_, str> {
    if fold_case {
        Cow::Owned(text.to_lowercase())
    } else {
        Cow::Borrowed(text)
    }
}

/// Prédicat compilé : termes valides + combinateur unique.
///
/// Un prédicat sans aucun terme (tous abandonnés à la compilation) ne
/// sélectionne aucune ligne.
#[derive(Debug, Clone, PartialEq)]
pub struct Predicate {
    pub terms: Vec<Term>,
    pub combinator: Combinator,
    /// Comparaisons de texte insensibles à la casse
    pub fold_case: bool,
}

impl Predicate {
    /// Prédicat sensible à la casse.
    pub fn new(terms: Vec<Term>, combinator: Combinator) -> Self {
        Predicate { terms, combinator, fold_case: false }
    }

    pub fn fold_case(mut self, fold_case: bool) -> Self {
        self.fold_case = fold_case;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn matches(&self, row: &Row) -> bool {
        if self.terms.is_empty() {
            return false;
        }
        match self.combinator {
            Combinator::And => self.terms.iter().all(|t| t.matches(row, self.fold_case)),
            Combinator::Or => self.terms.iter().any(|t| t.matches(row, self.fold_case)),
        }
    }

    /// Filtre des lignes (vue non propriétaire).
    pub fn filter<'a, I>(&self, rows: I) -> Vec<&'a Row>
    where
        I: IntoIterator<Item = &'a Row>,
    {
        rows.into_iter().filter(|r| self.matches(r)).collect()
    }
}

/// Le texte contient-il le joker `*` ?
pub fn has_wildcard(text: &str) -> bool {
    text.contains(WILDCARD)
}

/// Traduit les jokers de l'appelant (`*`) en jokers SQL (`%`).
pub fn translate_wildcards(text: &str) -> String {
    text.chars()
        .map(|c| if c == WILDCARD { '%' } else { c })
        .collect()
}

/// Évalue `text LIKE pattern` ('%' = suite quelconque, '_' = un caractère).
///
/// Sensible à la casse : replier les deux côtés avant l'appel pour une
/// comparaison insensible.
pub fn like_matches(text: &str, pattern: &str) -> bool {
    let t: Vec<char> = text.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    let (mut ti, mut pi) = (0usize, 0usize);
    // Position du dernier '%' vu et position du texte à ce moment
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '_' || p[pi] == t[ti]) && p[pi] != '%' {
            ti += 1;
            pi += 1;
        } else if pi < p.len() && p[pi] == '%' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }
    p[pi..].iter().all(|&c| c == '%')
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::instance::field;
    use crate::core::typeside::RowKey;

    fn row(id: i64, name: &str, score: f64) -> Row {
        let mut r = Row::new(RowKey::Int(id), "ID");
        r.merge(&[field("Name", name), field("Score", score)]);
        r
    }

    #[test]
    fn test_translate_wildcards() {
        assert_eq!(translate_wildcards("A*C"), "A%C");
        assert_eq!(translate_wildcards("**"), "%%");
        assert_eq!(translate_wildcards("plain"), "plain");
        assert!(has_wildcard("A*"));
        assert!(!has_wildcard("A"));
    }

    #[test]
    fn test_like_matches() {
        assert!(like_matches("Ann", "A%"));
        assert!(like_matches("ABC", "A%C"));
        assert!(like_matches("AC", "A%C"));
        assert!(!like_matches("ABD", "A%C"));
        assert!(like_matches("Bart", "_art"));
        assert!(!like_matches("art", "_art"));
        assert!(like_matches("", "%"));
        assert!(like_matches("abcabc", "%bc%bc"));
        assert!(!like_matches("ann", "A%"));
    }

    #[test]
    fn test_term_matching() {
        let r = row(1, "Ann", 3.5);
        let t = |op| Term { column: "Name".into(), op };
        assert!(t(TermOp::Eq(Value::text("Ann"))).matches(&r, false));
        assert!(t(TermOp::StartsWith("An".into())).matches(&r, false));
        assert!(t(TermOp::EndsWith("nn".into())).matches(&r, false));
        assert!(t(TermOp::Contains("n".into())).matches(&r, false));
        assert!(!t(TermOp::IsNull).matches(&r, false));

        let score = |op, v: f64| Term { column: "Score".into(), op: TermOp::Compare(op, Value::Float(v)) };
        assert!(score(CompOp::Lt, 4.0).matches(&r, false));
        assert!(score(CompOp::Le, 3.5).matches(&r, false));
        assert!(!score(CompOp::Gt, 3.5).matches(&r, false));
        assert!(score(CompOp::Ge, 3.5).matches(&r, false));

        let missing = Term { column: "Other".into(), op: TermOp::Eq(Value::Integer(1)) };
        assert!(!missing.matches(&r, false));
    }

    #[test]
    fn test_case_folding() {
        let r = row(1, "Ann", 3.5);
        let t = |op| Term { column: "Name".into(), op };
        let lower = t(TermOp::Eq(Value::text("ann")));
        assert!(!lower.matches(&r, false));
        assert!(lower.matches(&r, true));
        assert!(t(TermOp::StartsWith("AN".into())).matches(&r, true));
        assert!(t(TermOp::EndsWith("NN".into())).matches(&r, true));
        assert!(t(TermOp::Contains("nN".into())).matches(&r, true));
        assert!(t(TermOp::Like("a%".into())).matches(&r, true));
        assert!(!t(TermOp::Like("a%".into())).matches(&r, false));

        let rows = vec![row(1, "Ann", 3.5), row(2, "Bart", 4.0)];
        let p = Predicate::new(vec![lower], Combinator::And);
        assert!(p.filter(&rows).is_empty());
        let keys: Vec<_> = p.fold_case(true).filter(&rows).iter().map(|r| r.key().clone()).collect();
        assert_eq!(keys, vec![RowKey::Int(1)]);
    }

    #[test]
    fn test_predicate_combinators() {
        let rows = vec![row(1, "Ann", 3.5), row(2, "Bart", 4.0), row(3, "Cy", 1.0)];
        let terms = vec![
            Term { column: "Name".into(), op: TermOp::StartsWith("B".into()) },
            Term { column: "Score".into(), op: TermOp::Compare(CompOp::Lt, Value::Float(2.0)) },
        ];
        let or = Predicate::new(terms.clone(), Combinator::Or);
        let keys: Vec<_> = or.filter(&rows).iter().map(|r| r.key().clone()).collect();
        assert_eq!(keys, vec![RowKey::Int(2), RowKey::Int(3)]);

        let and = Predicate::new(terms, Combinator::And);
        assert!(and.filter(&rows).is_empty());
    }

    #[test]
    fn test_empty_predicate_matches_nothing() {
        let rows = vec![row(1, "Ann", 3.5)];
        let p = Predicate::new(vec![], Combinator::And).fold_case(true);
        assert!(p.filter(&rows).is_empty());
    }
}
