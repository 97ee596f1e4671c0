// =============================================================================
// TYPESIDE — Le domaine des valeurs côté Rust
// =============================================================================
//
// Une base de données parle en types NATIFS (CURRENCY, YESNO, VARCHAR(40)...).
// Côté Rust, on ne manipule qu'un petit nombre de SORTES de valeurs :
//
//   ValueKind  →  Integer, Float, Decimal, Text, Boolean,
//                 Date, DateTime, Time, Binary
//
// La correspondance native → sorte est la responsabilité du codec
// (backend::sql::codec). Ici on ne définit que les valeurs elles-mêmes,
// et l'identité d'une ligne (RowKey).
//
// NULL n'est PAS une sorte : c'est un marqueur explicite d'absence,
// valide pour n'importe quelle colonne.
//
// =============================================================================

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Sorte d'une valeur côté Rust.
///
/// Chaque type natif mappé du moteur correspond à exactement une sorte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Entier signé 64 bits (→ INTEGER, LONG, COUNTER, BIGINT...)
    Integer,
    /// Flottant 64 bits (→ DOUBLE, SINGLE, FLOAT...)
    Float,
    /// Décimal à virgule fixe (→ CURRENCY, DECIMAL MySQL)
    Decimal,
    /// Texte (→ VARCHAR, LONGCHAR, GUID...)
    Text,
    /// Booléen (→ YESNO, BIT, tinyint(1))
    Boolean,
    Date,
    DateTime,
    Time,
    /// Octets bruts (→ LONGBINARY, BLOB...)
    Binary,
}

impl ValueKind {
    /// Sortes sur lesquelles les comparaisons d'ordre ont un sens.
    pub fn is_numeric(&self) -> bool {
        matches!(self, ValueKind::Integer | ValueKind::Float | ValueKind::Decimal)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ValueKind::Text)
    }

    /// Valeur « vide » de la sorte : ce qu'on écrit dans une colonne
    /// NOT NULL laissée sans valeur.
    pub fn default_value(&self) -> Value {
        match self {
            ValueKind::Integer => Value::Integer(0),
            ValueKind::Float => Value::Float(0.0),
            ValueKind::Decimal => Value::Decimal(Decimal::new(0, 0)),
            ValueKind::Text => Value::Text(String::new()),
            ValueKind::Boolean => Value::Boolean(false),
            ValueKind::Date => Value::Date(NaiveDate::default()),
            ValueKind::DateTime => Value::DateTime(NaiveDateTime::default()),
            ValueKind::Time => Value::Time(NaiveTime::default()),
            ValueKind::Binary => Value::Binary(Vec::new()),
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Integer => "Integer",
            ValueKind::Float => "Float",
            ValueKind::Decimal => "Decimal",
            ValueKind::Text => "Text",
            ValueKind::Boolean => "Boolean",
            ValueKind::Date => "Date",
            ValueKind::DateTime => "DateTime",
            ValueKind::Time => "Time",
            ValueKind::Binary => "Binary",
        };
        write!(f, "{}", name)
    }
}

// ─── Decimal ─────────────────────────────────────────────────────────────────

/// Décimal à virgule fixe : `units / 10^scale`.
///
/// `Decimal::new(450, 2)` vaut 4.50. Deux décimaux d'échelles différentes
/// mais de même valeur sont égaux (4.5 == 4.50).
#[derive(Debug, Clone, Copy)]
pub struct Decimal {
    units: i128,
    scale: u8,
}

impl Decimal {
    /// Échelle maximale acceptée par `parse` (38 chiffres tiennent dans un i128).
    pub const MAX_SCALE: u8 = 38;

    pub fn new(units: i128, scale: u8) -> Self {
        Decimal { units, scale }
    }

    pub fn units(&self) -> i128 {
        self.units
    }

    pub fn scale(&self) -> u8 {
        self.scale
    }

    /// Parse un littéral décimal ("12", "-3.25", ".5").
    ///
    /// Plus de `MAX_SCALE` chiffres après la virgule : None.
    pub fn parse(text: &str) -> Option<Self> {
        let text = text.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (int_part, frac_part) = match digits.split_once('.') {
            Some((i, f)) => (i, f),
            None => (digits, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return None;
        }
        if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
            return None;
        }
        let scale = u8::try_from(frac_part.len()).ok()?;
        if scale > Self::MAX_SCALE {
            return None;
        }
        let mut units: i128 = 0;
        for c in int_part.chars().chain(frac_part.chars()) {
            units = units.checked_mul(10)?.checked_add(i128::from(c as u8 - b'0'))?;
        }
        Some(Decimal::new(if negative { -units } else { units }, scale))
    }

    pub fn to_f64(&self) -> f64 {
        self.units as f64 / 10f64.powi(i32::from(self.scale))
    }

    /// Ramène les unités à une échelle plus grande (None en cas de débordement).
    fn rescaled(&self, scale: u8) -> Option<i128> {
        let factor = 10i128.checked_pow(u32::from(scale - self.scale))?;
        self.units.checked_mul(factor)
    }
}

impl PartialEq for Decimal {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Decimal {}

impl PartialOrd for Decimal {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Decimal {
    fn cmp(&self, other: &Self) -> Ordering {
        let scale = self.scale.max(other.scale);
        match (self.rescaled(scale), other.rescaled(scale)) {
            (Some(a), Some(b)) => a.cmp(&b),
            // Débordement : on retombe sur une comparaison approchée
            _ => self
                .to_f64()
                .partial_cmp(&other.to_f64())
                .unwrap_or(Ordering::Equal),
        }
    }
}

impl fmt::Display for Decimal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let sign = if self.units < 0 { "-" } else { "" };
        let digits = self.units.unsigned_abs().to_string();
        let scale = usize::from(self.scale);
        if scale == 0 {
            return write!(f, "{}{}", sign, digits);
        }
        // Rendu à partir des chiffres
        let padded = format!("{:0>width$}", digits, width = scale + 1);
        let (int_part, frac_part) = padded.split_at(padded.len() - scale);
        write!(f, "{}{}.{}", sign, int_part, frac_part)
    }
}

// ─── Value ───────────────────────────────────────────────────────────────────

/// Une valeur de cellule.
///
/// `Null` est le marqueur « pas de valeur » : jamais coercé vers une autre
/// sorte, toujours accepté quelle que soit la colonne.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Boolean(bool),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    Time(NaiveTime),
    Binary(Vec<u8>),
}

impl Value {
    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }

    /// Sorte de la valeur (None pour Null).
    pub fn kind(&self) -> Option<ValueKind> {
        match self {
            Value::Null => None,
            Value::Integer(_) => Some(ValueKind::Integer),
            Value::Float(_) => Some(ValueKind::Float),
            Value::Decimal(_) => Some(ValueKind::Decimal),
            Value::Text(_) => Some(ValueKind::Text),
            Value::Boolean(_) => Some(ValueKind::Boolean),
            Value::Date(_) => Some(ValueKind::Date),
            Value::DateTime(_) => Some(ValueKind::DateTime),
            Value::Time(_) => Some(ValueKind::Time),
            Value::Binary(_) => Some(ValueKind::Binary),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Comparaison d'ordre entre deux valeurs numériques, éventuellement
    /// de sortes différentes (Integer contre Decimal, etc.).
    ///
    /// Retourne None si l'une des deux valeurs n'est pas numérique.
    pub fn compare_numeric(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
            (Value::Integer(a), Value::Decimal(b)) => Some(Decimal::new(i128::from(*a), 0).cmp(b)),
            (Value::Decimal(a), Value::Integer(b)) => Some(a.cmp(&Decimal::new(i128::from(*b), 0))),
            _ => {
                let a = self.numeric_as_f64()?;
                let b = other.numeric_as_f64()?;
                a.partial_cmp(&b)
            }
        }
    }

    fn numeric_as_f64(&self) -> Option<f64> {
        match self {
            Value::Integer(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Decimal(d) => Some(d.to_f64()),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "NULL"),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) => write!(f, "\"{}\"", s),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Time(t) => write!(f, "{}", t),
            Value::Binary(bytes) => write!(f, "0x{}", hex::encode(bytes)),
        }
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Integer(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Boolean(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Text(v.to_string())
    }
}

impl From<Decimal> for Value {
    fn from(v: Decimal) -> Self {
        Value::Decimal(v)
    }
}

// ─── RowKey ──────────────────────────────────────────────────────────────────

/// Identité d'une ligne : la valeur de la colonne d'identité.
///
/// Variant fermé : une table a des identités entières OU textuelles,
/// jamais un mélange. L'ordre est défini par variant (numérique pour Int,
/// lexicographique pour Text).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RowKey {
    Int(i64),
    Text(String),
}

impl RowKey {
    /// Construit une identité depuis une valeur de cellule.
    pub fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Integer(i) => Some(RowKey::Int(*i)),
            Value::Text(s) => Some(RowKey::Text(s.clone())),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            RowKey::Int(i) => Value::Integer(*i),
            RowKey::Text(s) => Value::Text(s.clone()),
        }
    }

    pub fn kind(&self) -> ValueKind {
        match self {
            RowKey::Int(_) => ValueKind::Integer,
            RowKey::Text(_) => ValueKind::Text,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Int(i) => write!(f, "{}", i),
            RowKey::Text(s) => write!(f, "'{}'", s),
        }
    }
}

impl From<i64> for RowKey {
    fn from(v: i64) -> Self {
        RowKey::Int(v)
    }
}

impl From<&str> for RowKey {
    fn from(v: &str) -> Self {
        RowKey::Text(v.to_string())
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_kinds() {
        assert_eq!(Value::Integer(1).kind(), Some(ValueKind::Integer));
        assert_eq!(Value::text("a").kind(), Some(ValueKind::Text));
        assert_eq!(Value::Null.kind(), None);
        assert!(ValueKind::Decimal.is_numeric());
        assert!(!ValueKind::Text.is_numeric());
    }

    #[test]
    fn test_default_values() {
        assert_eq!(ValueKind::Integer.default_value(), Value::Integer(0));
        assert_eq!(ValueKind::Text.default_value(), Value::text(""));
        assert_eq!(
            ValueKind::Date.default_value(),
            Value::Date(NaiveDate::from_ymd_opt(1970, 1, 1).unwrap())
        );
        assert_eq!(ValueKind::Time.default_value().to_string(), "00:00:00");
        // La valeur par défaut est toujours de la sorte demandée
        for kind in [ValueKind::Float, ValueKind::Decimal, ValueKind::Boolean, ValueKind::Binary] {
            assert_eq!(kind.default_value().kind(), Some(kind));
        }
    }

    #[test]
    fn test_decimal_parse_and_display() {
        let d = Decimal::parse("-12.050").unwrap();
        assert_eq!(d.units(), -12050);
        assert_eq!(d.scale(), 3);
        assert_eq!(d.to_string(), "-12.050");
        assert_eq!(Decimal::parse(".5").unwrap().to_string(), "0.5");
        assert_eq!(Decimal::new(-5, 2).to_string(), "-0.05");
        assert!(Decimal::parse("1.2.3").is_none());
        assert!(Decimal::parse("abc").is_none());
        assert!(Decimal::parse("").is_none());
    }

    #[test]
    fn test_decimal_large_scale() {
        // 40 chiffres après la virgule : refusé au parse
        let long = format!("0.{}1", "0".repeat(39));
        assert!(Decimal::parse(&long).is_none());

        let max = format!("0.{}1", "0".repeat(37));
        assert_eq!(Decimal::parse(&max).unwrap().scale(), Decimal::MAX_SCALE);

        // Construit à la main, l'affichage ne déborde pas
        assert_eq!(Decimal::new(1, 40).to_string(), format!("0.{}1", "0".repeat(39)));
        assert_eq!(Decimal::new(-123, 40).to_string(), format!("-0.{}123", "0".repeat(37)));
        assert_eq!(
            Decimal::new(i128::MIN, 2).to_string(),
            "-1701411834604692317316873037158841057.28"
        );
    }

    #[test]
    fn test_decimal_equality_ignores_scale() {
        assert_eq!(Decimal::new(45, 1), Decimal::new(450, 2));
        assert!(Decimal::new(449, 2) < Decimal::new(45, 1));
    }

    #[test]
    fn test_numeric_cross_compare() {
        let five = Value::Integer(5);
        assert_eq!(five.compare_numeric(&Value::Float(5.5)), Some(Ordering::Less));
        assert_eq!(
            five.compare_numeric(&Value::Decimal(Decimal::new(500, 2))),
            Some(Ordering::Equal)
        );
        assert_eq!(five.compare_numeric(&Value::text("5")), None);
    }

    #[test]
    fn test_row_key_roundtrip_and_order() {
        assert_eq!(RowKey::from_value(&Value::Integer(3)), Some(RowKey::Int(3)));
        assert_eq!(RowKey::from_value(&Value::Float(3.0)), None);
        assert!(RowKey::Int(2) < RowKey::Int(10));
        assert!(RowKey::from("b") > RowKey::from("a"));
        assert_eq!(RowKey::Text("x".into()).to_value(), Value::text("x"));
    }
}
