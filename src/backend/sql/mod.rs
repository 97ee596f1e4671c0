// =============================================================================
// BACKEND SQL — Dialectes et génération de SQL
// =============================================================================
//
// Ce module traduit :
//   Value     → littéral SQL          (codec)
//   Recherche → clause WHERE          (planner)
//   Row       → UPDATE/INSERT/DELETE  (dml)
//
// Le trait SqlDialect porte les différences entre les moteurs :
//   - Access/ODBC : identifiants [entre crochets], dates 'YYYY/MM/DD'
//   - MySQL       : identifiants `entre backticks`, dates 'YYYY-MM-DD',
//                   backslash = caractère d'échappement
//
// Le state machine et le compilateur de prédicats sont les mêmes pour
// les deux dialectes : seuls les types natifs et le rendu changent.
//
// =============================================================================

pub mod codec;
pub mod dml;
pub mod planner;

use crate::core::schema::NativeType;
use self::codec::{CodecEntry, ACCESS_CODECS, MYSQL_CODECS};

/// Dialecte SQL : ce qui change d'un moteur à l'autre.
pub trait SqlDialect {
    /// Nom du dialecte
    fn dialect_name(&self) -> String;

    /// Quote un identifiant (table, colonne)
    fn quote_identifier(&self, name: &str) -> String;

    /// Traduit un nom de type brut (métadonnée du driver) en NativeType
    fn parse_native_type(&self, type_name: &str) -> NativeType;

    /// Table de correspondance type natif → sorte Rust + rendu.
    /// Un type natif absent de la table n'a pas d'équivalent.
    fn codec_table(&self) -> &'static [CodecEntry];

    /// Format chrono d'une date
    fn date_format(&self) -> &'static str;

    /// Format chrono d'une date-heure
    fn datetime_format(&self) -> &'static str;

    /// Format chrono d'une heure
    fn time_format(&self) -> &'static str {
        "%H:%M:%S"
    }

    /// Échappe un texte destiné à un littéral entre apostrophes
    fn escape_text(&self, text: &str) -> String {
        text.replace('\'', "''")
    }

    /// Neutralise les métacaractères de LIKE ('%', '_') d'un texte
    fn escape_like(&self, text: &str) -> String;

    /// La collation par défaut compare-t-elle '=' et LIKE sans la casse ?
    /// Vrai pour Access et pour les collations `_ci` de MySQL.
    fn case_insensitive(&self) -> bool {
        true
    }
}

// ─── Access / ODBC ───────────────────────────────────────────────────────────
//
// Noms de types tels que les remonte le driver ODBC Access, plus les
// synonymes de l'interface Access (LONG, SHORT, MEMO, YESNO...).
//

pub struct AccessDialect;

impl SqlDialect for AccessDialect {
    fn dialect_name(&self) -> String {
        "Access".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("[{}]", name.replace(']', "]]"))
    }

    fn parse_native_type(&self, type_name: &str) -> NativeType {
        let upper = type_name.trim().to_ascii_uppercase();
        let base = upper.split('(').next().unwrap_or("").trim();
        match base {
            "COUNTER" | "AUTOINCREMENT" => NativeType::Counter,
            "INTEGER" | "LONG" => NativeType::Long,
            "SMALLINT" | "SHORT" => NativeType::Short,
            "BYTE" => NativeType::Byte,
            "REAL" | "SINGLE" => NativeType::Single,
            "DOUBLE" | "FLOAT" => NativeType::Double,
            "CURRENCY" | "MONEY" => NativeType::Currency,
            "DECIMAL" | "NUMERIC" => NativeType::Decimal,
            "VARCHAR" | "TEXT" | "CHAR" => NativeType::VarChar,
            "LONGCHAR" | "MEMO" => NativeType::LongChar,
            "BIT" | "YESNO" => NativeType::YesNo,
            "DATETIME" | "DATE" | "TIME" => NativeType::DateTime,
            "GUID" => NativeType::Guid,
            "HYPERLINK" => NativeType::Hyperlink,
            "LONGBINARY" | "OLEOBJECT" | "BINARY" | "VARBINARY" => NativeType::LongBinary,
            _ => NativeType::Other(upper),
        }
    }

    fn codec_table(&self) -> &'static [CodecEntry] {
        ACCESS_CODECS
    }

    fn date_format(&self) -> &'static str {
        "%Y/%m/%d"
    }

    fn datetime_format(&self) -> &'static str {
        "%Y/%m/%d %H:%M:%S"
    }

    fn escape_like(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '[' => out.push_str("[[]"),
                '%' => out.push_str("[%]"),
                '_' => out.push_str("[_]"),
                other => out.push(other),
            }
        }
        out
    }
}

// ─── MySQL ───────────────────────────────────────────────────────────────────
//
// Les types viennent de `SHOW COLUMNS` : "int(11) unsigned", "varchar(40)",
// "tinyint(1)", "decimal(10,2)"...
//
// Particularités :
//   - tinyint(1) est le BOOLEAN de MySQL
//   - le backslash échappe dans les littéraux : il faut le doubler
//

pub struct MySqlDialect;

impl SqlDialect for MySqlDialect {
    fn dialect_name(&self) -> String {
        "MySQL".to_string()
    }

    fn quote_identifier(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn parse_native_type(&self, type_name: &str) -> NativeType {
        let lower = type_name.trim().to_ascii_lowercase();
        if lower.starts_with("tinyint(1)") {
            return NativeType::Boolean;
        }
        let base = lower
            .split(|c: char| c == '(' || c.is_whitespace())
            .next()
            .unwrap_or("");
        match base {
            "tinyint" => NativeType::TinyInt,
            "smallint" => NativeType::SmallInt,
            "mediumint" => NativeType::MediumInt,
            "int" | "integer" => NativeType::Int,
            "bigint" => NativeType::BigInt,
            "serial" => NativeType::Serial,
            "year" => NativeType::Year,
            "bit" => NativeType::Bit,
            "decimal" | "numeric" | "dec" | "fixed" => NativeType::Decimal,
            "float" => NativeType::Float,
            "double" => NativeType::Double,
            "real" => NativeType::Real,
            "bool" | "boolean" => NativeType::Boolean,
            "date" => NativeType::Date,
            "datetime" => NativeType::DateTime,
            "timestamp" => NativeType::Timestamp,
            "time" => NativeType::Time,
            "char" => NativeType::Char,
            "varchar" => NativeType::VarChar,
            "tinytext" => NativeType::TinyText,
            "text" => NativeType::Text,
            "mediumtext" => NativeType::MediumText,
            "longtext" => NativeType::LongText,
            "binary" => NativeType::Binary,
            "varbinary" => NativeType::VarBinary,
            "tinyblob" => NativeType::TinyBlob,
            "blob" => NativeType::Blob,
            "mediumblob" => NativeType::MediumBlob,
            "longblob" => NativeType::LongBlob,
            "enum" => NativeType::Enum,
            "set" => NativeType::Set,
            "json" => NativeType::Json,
            "geometry" | "point" | "linestring" | "polygon" | "multipoint"
            | "multilinestring" | "multipolygon" | "geometrycollection" => NativeType::Geometry,
            _ => NativeType::Other(lower.to_ascii_uppercase()),
        }
    }

    fn codec_table(&self) -> &'static [CodecEntry] {
        MYSQL_CODECS
    }

    fn date_format(&self) -> &'static str {
        "%Y-%m-%d"
    }

    fn datetime_format(&self) -> &'static str {
        "%Y-%m-%d %H:%M:%S"
    }

    fn escape_text(&self, text: &str) -> String {
        text.replace('\\', "\\\\").replace('\'', "''")
    }

    fn escape_like(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            match c {
                '\\' => out.push_str("\\\\"),
                '%' => out.push_str("\\%"),
                '_' => out.push_str("\\_"),
                other => out.push(other),
            }
        }
        out
    }
}
