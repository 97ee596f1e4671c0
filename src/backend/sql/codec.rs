// =============================================================================
// CODEC — Correspondance type natif ↔ valeur Rust
// =============================================================================
//
// Une SEULE table par dialecte fait foi :
//
//   type natif  →  { sorte Rust, rendu en littéral SQL }
//
// La validation en découle : une valeur est valide pour une colonne si sa
// sorte est celle de l'entrée de table (ou si elle est NULL).
//
// Ajouter un type natif = ajouter une ligne de table, pas une branche de
// plus dans une cascade de `if`.
//
// Rendus :
//   Integer / Float / Decimal  →  non quotés              42   4.5   12.50
//   Text                       →  'entre apostrophes'     'O''Hara'
//   Boolean                    →  1 / 0
//   Date                       →  'YYYY/MM/DD'  (Access)  'YYYY-MM-DD' (MySQL)
//   DateTime                   →  'YYYY/MM/DD HH:MM:SS'   (idem selon dialecte)
//   Time                       →  'HH:MM:SS'
//   Binary                     →  0x0A1B...
//   NULL                       →  NULL
//
// =============================================================================

use crate::backend::sql::SqlDialect;
use crate::core::schema::{Column, ColumnCatalog, NativeType};
use crate::core::typeside::{RowKey, Value, ValueKind};
use crate::error::{TableError, TableResult};

/// Rend une valeur en littéral SQL. None si la valeur n'est pas rendable
/// (mauvaise sorte, flottant non fini...).
pub type Renderer = fn(&Value, &dyn SqlDialect) -> Option<String>;

/// Une ligne de la table de codec.
pub struct CodecEntry {
    pub native: NativeType,
    pub kind: ValueKind,
    pub render: Renderer,
}

const fn mapped(native: NativeType, kind: ValueKind, render: Renderer) -> CodecEntry {
    CodecEntry { native, kind, render }
}

// ─── Rendus ──────────────────────────────────────────────────────────────────

pub fn render_integer(value: &Value, _: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Integer(i) => Some(i.to_string()),
        _ => None,
    }
}

pub fn render_float(value: &Value, _: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Float(f) if f.is_finite() => Some(f.to_string()),
        _ => None,
    }
}

pub fn render_decimal(value: &Value, _: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Decimal(d) => Some(d.to_string()),
        _ => None,
    }
}

pub fn render_text(value: &Value, dialect: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Text(s) => Some(format!("'{}'", dialect.escape_text(s))),
        _ => None,
    }
}

pub fn render_boolean(value: &Value, _: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Boolean(true) => Some("1".to_string()),
        Value::Boolean(false) => Some("0".to_string()),
        _ => None,
    }
}

pub fn render_date(value: &Value, dialect: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Date(d) => Some(format!("'{}'", d.format(dialect.date_format()))),
        _ => None,
    }
}

pub fn render_datetime(value: &Value, dialect: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::DateTime(dt) => Some(format!("'{}'", dt.format(dialect.datetime_format()))),
        _ => None,
    }
}

pub fn render_time(value: &Value, dialect: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Time(t) => Some(format!("'{}'", t.format(dialect.time_format()))),
        _ => None,
    }
}

pub fn render_binary(value: &Value, _: &dyn SqlDialect) -> Option<String> {
    match value {
        Value::Binary(bytes) => Some(format!("0x{}", hex::encode_upper(bytes))),
        _ => None,
    }
}

// ─── Tables ──────────────────────────────────────────────────────────────────

/// Access/ODBC. DECIMAL et HYPERLINK n'ont pas d'équivalent.
pub static ACCESS_CODECS: &[CodecEntry] = &[
    mapped(NativeType::Counter, ValueKind::Integer, render_integer),
    mapped(NativeType::Long, ValueKind::Integer, render_integer),
    mapped(NativeType::Short, ValueKind::Integer, render_integer),
    mapped(NativeType::Byte, ValueKind::Integer, render_integer),
    mapped(NativeType::Single, ValueKind::Float, render_float),
    mapped(NativeType::Double, ValueKind::Float, render_float),
    mapped(NativeType::Currency, ValueKind::Decimal, render_decimal),
    mapped(NativeType::VarChar, ValueKind::Text, render_text),
    mapped(NativeType::LongChar, ValueKind::Text, render_text),
    mapped(NativeType::Guid, ValueKind::Text, render_text),
    mapped(NativeType::YesNo, ValueKind::Boolean, render_boolean),
    mapped(NativeType::DateTime, ValueKind::DateTime, render_datetime),
    mapped(NativeType::LongBinary, ValueKind::Binary, render_binary),
];

/// MySQL. ENUM, SET, JSON et les types géométriques n'ont pas d'équivalent.
pub static MYSQL_CODECS: &[CodecEntry] = &[
    mapped(NativeType::TinyInt, ValueKind::Integer, render_integer),
    mapped(NativeType::SmallInt, ValueKind::Integer, render_integer),
    mapped(NativeType::MediumInt, ValueKind::Integer, render_integer),
    mapped(NativeType::Int, ValueKind::Integer, render_integer),
    mapped(NativeType::BigInt, ValueKind::Integer, render_integer),
    mapped(NativeType::Serial, ValueKind::Integer, render_integer),
    mapped(NativeType::Year, ValueKind::Integer, render_integer),
    mapped(NativeType::Bit, ValueKind::Integer, render_integer),
    mapped(NativeType::Decimal, ValueKind::Decimal, render_decimal),
    mapped(NativeType::Float, ValueKind::Float, render_float),
    mapped(NativeType::Double, ValueKind::Float, render_float),
    mapped(NativeType::Real, ValueKind::Float, render_float),
    mapped(NativeType::Boolean, ValueKind::Boolean, render_boolean),
    mapped(NativeType::Date, ValueKind::Date, render_date),
    mapped(NativeType::DateTime, ValueKind::DateTime, render_datetime),
    mapped(NativeType::Timestamp, ValueKind::DateTime, render_datetime),
    mapped(NativeType::Time, ValueKind::Time, render_time),
    mapped(NativeType::Char, ValueKind::Text, render_text),
    mapped(NativeType::VarChar, ValueKind::Text, render_text),
    mapped(NativeType::TinyText, ValueKind::Text, render_text),
    mapped(NativeType::Text, ValueKind::Text, render_text),
    mapped(NativeType::MediumText, ValueKind::Text, render_text),
    mapped(NativeType::LongText, ValueKind::Text, render_text),
    mapped(NativeType::Binary, ValueKind::Binary, render_binary),
    mapped(NativeType::VarBinary, ValueKind::Binary, render_binary),
    mapped(NativeType::TinyBlob, ValueKind::Binary, render_binary),
    mapped(NativeType::Blob, ValueKind::Binary, render_binary),
    mapped(NativeType::MediumBlob, ValueKind::Binary, render_binary),
    mapped(NativeType::LongBlob, ValueKind::Binary, render_binary),
];

// ─── ValueCodec ──────────────────────────────────────────────────────────────

/// Codec d'un dialecte : validation et rendu des valeurs par colonne.
#[derive(Clone, Copy)]
pub struct ValueCodec<'d> {
    dialect: &'d dyn SqlDialect,
}

impl<'d> ValueCodec<'d> {
    pub fn new(dialect: &'d dyn SqlDialect) -> Self {
        ValueCodec { dialect }
    }

    pub fn dialect(&self) -> &'d dyn SqlDialect {
        self.dialect
    }

    /// Entrée de table pour le type natif de la colonne.
    pub fn entry(&self, column: &Column) -> TableResult<&'static CodecEntry> {
        self.dialect
            .codec_table()
            .iter()
            .find(|e| e.native == column.native)
            .ok_or_else(|| TableError::UndefinedType {
                column: column.name.clone(),
                native: column.native.clone(),
            })
    }

    /// Sorte Rust de la colonne.
    pub fn kind_of(&self, column: &Column) -> TableResult<ValueKind> {
        self.entry(column).map(|e| e.kind)
    }

    pub fn is_mapped(&self, column: &Column) -> bool {
        self.entry(column).is_ok()
    }

    /// Vérifie qu'une valeur peut être écrite dans la colonne.
    ///
    /// NULL est toujours valide ; sinon la sorte doit être exactement celle
    /// de la table de codec.
    pub fn validate(&self, column: &Column, value: &Value) -> TableResult<()> {
        let Some(found) = value.kind() else {
            return Ok(());
        };
        let expected = self.kind_of(column)?;
        if found != expected {
            return Err(TableError::TypeMismatch {
                column: column.name.clone(),
                expected,
                found,
            });
        }
        Ok(())
    }

    /// Rend la valeur en littéral SQL pour la colonne.
    pub fn to_literal(&self, column: &Column, value: &Value) -> TableResult<String> {
        let entry = self.entry(column)?;
        if value.is_null() {
            return Ok("NULL".to_string());
        }
        self.validate(column, value)?;
        (entry.render)(value, self.dialect).ok_or_else(|| {
            TableError::InvalidInput(format!(
                "value {} cannot be written to column '{}'",
                value, column.name
            ))
        })
    }

    /// Littéral de l'identité d'une ligne (non quoté si entier, quoté si texte).
    pub fn key_literal(&self, catalog: &ColumnCatalog, key: &RowKey) -> TableResult<String> {
        self.to_literal(catalog.identity(), &key.to_value())
    }
}

// =============================================================================
// TESTS
// =============================================================================
#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::sql::{AccessDialect, MySqlDialect};
    use crate::core::schema::RawColumn;
    use crate::core::typeside::Decimal;
    use chrono::{NaiveDate, NaiveTime};

    fn column(name: &str, native: NativeType) -> Column {
        Column { name: name.into(), native, ordinal: 1, nullable: true }
    }

    #[test]
    fn test_validate_matches_kind() {
        let codec = ValueCodec::new(&AccessDialect);
        let price = column("Price", NativeType::Currency);
        assert!(codec.validate(&price, &Value::Decimal(Decimal::new(1250, 2))).is_ok());
        match codec.validate(&price, &Value::Float(12.5)) {
            Err(TableError::TypeMismatch { expected, found, .. }) => {
                assert_eq!(expected, ValueKind::Decimal);
                assert_eq!(found, ValueKind::Float);
            }
            other => panic!("attendu TypeMismatch, obtenu {:?}", other),
        }
        let flag = column("Active", NativeType::YesNo);
        assert!(codec.validate(&flag, &Value::Boolean(true)).is_ok());
        assert!(codec.validate(&flag, &Value::Integer(1)).is_err());
    }

    #[test]
    fn test_null_always_valid() {
        let codec = ValueCodec::new(&AccessDialect);
        assert!(codec.validate(&column("Link", NativeType::Hyperlink), &Value::Null).is_ok());
        assert!(codec.validate(&column("Name", NativeType::VarChar), &Value::Null).is_ok());
        assert_eq!(
            codec.to_literal(&column("Name", NativeType::VarChar), &Value::Null).unwrap(),
            "NULL"
        );
    }

    #[test]
    fn test_unmapped_types_rejected() {
        let codec = ValueCodec::new(&AccessDialect);
        let dec = column("Amount", NativeType::Decimal);
        assert!(matches!(
            codec.to_literal(&dec, &Value::Decimal(Decimal::new(1, 0))),
            Err(TableError::UndefinedType { .. })
        ));
        let link = column("Link", NativeType::Hyperlink);
        assert!(matches!(
            codec.validate(&link, &Value::text("http://x")),
            Err(TableError::UndefinedType { .. })
        ));
        // Le même DECIMAL est mappé côté MySQL
        let mysql = ValueCodec::new(&MySqlDialect);
        assert_eq!(
            mysql.to_literal(&dec, &Value::Decimal(Decimal::new(1250, 2))).unwrap(),
            "12.50"
        );
    }

    #[test]
    fn test_access_literals() {
        let codec = ValueCodec::new(&AccessDialect);
        assert_eq!(codec.to_literal(&column("N", NativeType::Long), &Value::Integer(42)).unwrap(), "42");
        assert_eq!(codec.to_literal(&column("S", NativeType::Double), &Value::Float(4.5)).unwrap(), "4.5");
        assert_eq!(
            codec.to_literal(&column("T", NativeType::VarChar), &Value::text("O'Hara")).unwrap(),
            "'O''Hara'"
        );
        assert_eq!(codec.to_literal(&column("B", NativeType::YesNo), &Value::Boolean(false)).unwrap(), "0");
        let dt = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(7, 5, 0).unwrap();
        assert_eq!(
            codec.to_literal(&column("D", NativeType::DateTime), &Value::DateTime(dt)).unwrap(),
            "'2024/03/09 07:05:00'"
        );
        assert_eq!(
            codec.to_literal(&column("G", NativeType::Guid), &Value::text("{AB-12}")).unwrap(),
            "'{AB-12}'"
        );
        assert_eq!(
            codec.to_literal(&column("O", NativeType::LongBinary), &Value::Binary(vec![0x0a, 0xff])).unwrap(),
            "0x0AFF"
        );
    }

    #[test]
    fn test_date_and_time_renderers() {
        let date = Value::Date(NaiveDate::from_ymd_opt(2023, 12, 1).unwrap());
        assert_eq!(render_date(&date, &AccessDialect).unwrap(), "'2023/12/01'");
        assert_eq!(render_date(&date, &MySqlDialect).unwrap(), "'2023-12-01'");
        let time = Value::Time(NaiveTime::from_hms_opt(23, 59, 1).unwrap());
        assert_eq!(render_time(&time, &AccessDialect).unwrap(), "'23:59:01'");
        assert_eq!(render_time(&Value::Integer(1), &AccessDialect), None);
    }

    #[test]
    fn test_mysql_text_escapes_backslash() {
        let codec = ValueCodec::new(&MySqlDialect);
        assert_eq!(
            codec.to_literal(&column("T", NativeType::VarChar), &Value::text("C:\\tmp")).unwrap(),
            "'C:\\\\tmp'"
        );
    }

    #[test]
    fn test_non_finite_float_is_invalid_input() {
        let codec = ValueCodec::new(&AccessDialect);
        assert!(matches!(
            codec.to_literal(&column("S", NativeType::Double), &Value::Float(f64::NAN)),
            Err(TableError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_currency_literal_with_long_fraction() {
        let codec = ValueCodec::new(&AccessDialect);
        let price = column("Price", NativeType::Currency);
        let tiny = Value::Decimal(Decimal::new(1, 40));
        assert_eq!(
            codec.to_literal(&price, &tiny).unwrap(),
            format!("0.{}1", "0".repeat(39))
        );
    }

    #[test]
    fn test_key_literal() {
        let raw = vec![RawColumn::new("ID", "GUID"), RawColumn::new("Name", "VARCHAR")];
        let catalog = ColumnCatalog::load(&raw, |t| AccessDialect.parse_native_type(t)).unwrap();
        let codec = ValueCodec::new(&AccessDialect);
        assert_eq!(codec.key_literal(&catalog, &RowKey::from("k1")).unwrap(), "'k1'");
    }
}
