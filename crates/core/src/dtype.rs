//! Engine element types.
//!
//! Codes follow the engine's `TF_DataType` header. Code 0 is reserved for
//! "invalid" and never maps to a variant.

/// Element type of a tensor as understood by the engine.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    Float,
    Double,
    Int32,
    Uint8,
    Int16,
    Int8,
    String,
    Complex64,
    Int64,
    Bool,
    Qint8,
    Quint8,
    Qint32,
    Bfloat16,
    Qint16,
    Quint16,
    Uint16,
    Complex128,
    Half,
    Resource,
    Variant,
    Uint32,
    Uint64,
}

/// Engine names, indexed by code. Index 0 is reserved.
const NAMES: [&str; 24] = [
    "",
    "FLOAT",
    "DOUBLE",
    "INT32",
    "UINT8",
    "INT16",
    "INT8",
    "STRING",
    "COMPLEX64",
    "INT64",
    "BOOL",
    "QINT8",
    "QUINT8",
    "QINT32",
    "BFLOAT16",
    "QINT16",
    "QUINT16",
    "UINT16",
    "COMPLEX128",
    "HALF",
    "RESOURCE",
    "VARIANT",
    "UINT32",
    "UINT64",
];

const ALL: [DataType; 23] = [
    DataType::Float,
    DataType::Double,
    DataType::Int32,
    DataType::Uint8,
    DataType::Int16,
    DataType::Int8,
    DataType::String,
    DataType::Complex64,
    DataType::Int64,
    DataType::Bool,
    DataType::Qint8,
    DataType::Quint8,
    DataType::Qint32,
    DataType::Bfloat16,
    DataType::Qint16,
    DataType::Quint16,
    DataType::Uint16,
    DataType::Complex128,
    DataType::Half,
    DataType::Resource,
    DataType::Variant,
    DataType::Uint32,
    DataType::Uint64,
];

impl DataType {
    /// Numeric code used by the engine's C API.
    pub fn code(self) -> i64 {
        match self {
            DataType::Float => 1,
            DataType::Double => 2,
            DataType::Int32 => 3,
            DataType::Uint8 => 4,
            DataType::Int16 => 5,
            DataType::Int8 => 6,
            DataType::String => 7,
            DataType::Complex64 => 8,
            DataType::Int64 => 9,
            DataType::Bool => 10,
            DataType::Qint8 => 11,
            DataType::Quint8 => 12,
            DataType::Qint32 => 13,
            DataType::Bfloat16 => 14,
            DataType::Qint16 => 15,
            DataType::Quint16 => 16,
            DataType::Uint16 => 17,
            DataType::Complex128 => 18,
            DataType::Half => 19,
            DataType::Resource => 20,
            DataType::Variant => 21,
            DataType::Uint32 => 22,
            DataType::Uint64 => 23,
        }
    }

    /// Upper-case engine name, e.g. `FLOAT`.
    pub fn name(self) -> &'static str {
        NAMES[self.code() as usize]
    }

    /// Look up a type by its numeric code.
    pub fn from_code(code: i64) -> Option<Self> {
        ALL.iter().copied().find(|dt| dt.code() == code)
    }

    /// Resolve a registry enum identifier such as `DT_FLOAT` or `DT_INT32_REF`.
    ///
    /// `DT_COMPLEX` is accepted as the legacy alias of `DT_COMPLEX64`.
    pub fn from_proto_name(name: &str) -> Option<Self> {
        let bare = name.strip_prefix("DT_")?;
        let bare = bare.strip_suffix("_REF").unwrap_or(bare);
        if bare == "COMPLEX" {
            return Some(DataType::Complex64);
        }
        ALL.iter().copied().find(|dt| dt.name() == bare)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn codes_match_header() {
        assert_eq!(DataType::Float.code(), 1);
        assert_eq!(DataType::Complex64.code(), 8);
        assert_eq!(DataType::Int64.code(), 9);
        assert_eq!(DataType::Uint64.code(), 23);
        for dt in ALL {
            assert_eq!(DataType::from_code(dt.code()), Some(dt));
        }
    }

    #[test]
    fn reserved_code_is_invalid() {
        assert_eq!(DataType::from_code(0), None);
        assert_eq!(DataType::from_code(24), None);
    }

    #[test]
    fn proto_names() {
        assert_eq!(DataType::from_proto_name("DT_FLOAT"), Some(DataType::Float));
        assert_eq!(DataType::from_proto_name("DT_INT32_REF"), Some(DataType::Int32));
        assert_eq!(
            DataType::from_proto_name("DT_COMPLEX"),
            Some(DataType::Complex64)
        );
        assert_eq!(DataType::from_proto_name("FLOAT"), None);
        assert_eq!(DataType::from_proto_name("DT_FLOAT8_E5M2"), None);
    }

    #[test]
    fn names() {
        assert_eq!(DataType::Int64.name(), "INT64");
        assert_eq!(DataType::Bfloat16.name(), "BFLOAT16");
    }
}
