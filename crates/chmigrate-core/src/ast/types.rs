//! ClickHouse-dialect data type grammar.

/// A field of a `Tuple(...)` or `Nested(...)` type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeField {
    pub name: Option<String>,
    pub data_type: DataType,
}

/// A variant of an `Enum8`/`Enum16` type.
#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub label: String,
    pub value: i16,
}

/// ClickHouse column data types.
#[derive(Debug, Clone, PartialEq)]
pub enum DataType {
    Int8,
    Int16,
    Int32,
    Int64,
    Int128,
    Int256,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    UInt128,
    UInt256,
    Float32,
    Float64,
    Bool,
    String,
    FixedString(u32),
    Uuid,
    Date,
    Date32,
    /// `DateTime` or `DateTime(timezone)`.
    DateTime(Option<String>),
    /// `DateTime64(precision[, timezone])`.
    DateTime64(u8, Option<String>),
    Decimal {
        precision: u16,
        scale: u16,
    },
    Ipv4,
    Ipv6,
    Array(Box<DataType>),
    Tuple(Vec<TypeField>),
    Map(Box<DataType>, Box<DataType>),
    Nullable(Box<DataType>),
    LowCardinality(Box<DataType>),
    Enum8(Vec<EnumVariant>),
    Enum16(Vec<EnumVariant>),
    /// `Nested(field1 T1, field2 T2, ...)` — flattened into dotted `Array(..)`
    /// columns at comparison time (§3.2, §9); the original form is kept here
    /// so emission can reproduce it verbatim.
    Nested(Vec<TypeField>),
    /// Any type this grammar does not model explicitly, kept verbatim so
    /// round-trip emission never loses information.
    Custom(String),
}

impl DataType {
    /// Renders the type back into ClickHouse type syntax.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Int8 => "Int8".to_string(),
            Self::Int16 => "Int16".to_string(),
            Self::Int32 => "Int32".to_string(),
            Self::Int64 => "Int64".to_string(),
            Self::Int128 => "Int128".to_string(),
            Self::Int256 => "Int256".to_string(),
            Self::UInt8 => "UInt8".to_string(),
            Self::UInt16 => "UInt16".to_string(),
            Self::UInt32 => "UInt32".to_string(),
            Self::UInt64 => "UInt64".to_string(),
            Self::UInt128 => "UInt128".to_string(),
            Self::UInt256 => "UInt256".to_string(),
            Self::Float32 => "Float32".to_string(),
            Self::Float64 => "Float64".to_string(),
            Self::Bool => "Bool".to_string(),
            Self::String => "String".to_string(),
            Self::FixedString(n) => format!("FixedString({n})"),
            Self::Uuid => "UUID".to_string(),
            Self::Date => "Date".to_string(),
            Self::Date32 => "Date32".to_string(),
            Self::DateTime(None) => "DateTime".to_string(),
            Self::DateTime(Some(tz)) => format!("DateTime('{tz}')"),
            Self::DateTime64(p, None) => format!("DateTime64({p})"),
            Self::DateTime64(p, Some(tz)) => format!("DateTime64({p}, '{tz}')"),
            Self::Decimal { precision, scale } => format!("Decimal({precision}, {scale})"),
            Self::Ipv4 => "IPv4".to_string(),
            Self::Ipv6 => "IPv6".to_string(),
            Self::Array(inner) => format!("Array({})", inner.to_sql()),
            Self::Tuple(fields) => format!("Tuple({})", fields_to_sql(fields)),
            Self::Map(k, v) => format!("Map({}, {})", k.to_sql(), v.to_sql()),
            Self::Nullable(inner) => format!("Nullable({})", inner.to_sql()),
            Self::LowCardinality(inner) => format!("LowCardinality({})", inner.to_sql()),
            Self::Enum8(variants) => format!("Enum8({})", variants_to_sql(variants)),
            Self::Enum16(variants) => format!("Enum16({})", variants_to_sql(variants)),
            Self::Nested(fields) => format!("Nested({})", fields_to_sql(fields)),
            Self::Custom(raw) => raw.clone(),
        }
    }

    /// True for the integer/float/decimal family; used by the flattener
    /// and a couple of validator shortcuts.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        matches!(
            self,
            Self::Int8
                | Self::Int16
                | Self::Int32
                | Self::Int64
                | Self::Int128
                | Self::Int256
                | Self::UInt8
                | Self::UInt16
                | Self::UInt32
                | Self::UInt64
                | Self::UInt128
                | Self::UInt256
                | Self::Float32
                | Self::Float64
                | Self::Decimal { .. }
        )
    }
}

fn fields_to_sql(fields: &[TypeField]) -> String {
    fields
        .iter()
        .map(|f| match &f.name {
            Some(name) => format!("{name} {}", f.data_type.to_sql()),
            None => f.data_type.to_sql(),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn variants_to_sql(variants: &[EnumVariant]) -> String {
    variants
        .iter()
        .map(|v| format!("'{}' = {}", v.label.replace('\'', "''"), v.value))
        .collect::<Vec<_>>()
        .join(", ")
}

impl std::fmt::Display for DataType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_sql())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nested_renders_its_fields() {
        let ty = DataType::Nested(vec![
            TypeField { name: Some("key".into()), data_type: DataType::String },
            TypeField { name: Some("value".into()), data_type: DataType::UInt64 },
        ]);
        assert_eq!(ty.to_sql(), "Nested(key String, value UInt64)");
    }

    #[test]
    fn array_of_nullable() {
        let ty = DataType::Array(Box::new(DataType::Nullable(Box::new(DataType::Int32))));
        assert_eq!(ty.to_sql(), "Array(Nullable(Int32))");
    }
}
