//! Typed description of the two input tables.
//!
//! Each logical field maps to a list of accepted header aliases, a default
//! used when the column is absent, and a flag saying whether absence is a
//! hard error. Headers are resolved once per table into a [`ColumnMap`].
use crate::error::SchemaError;
use crate::types::RawTable;
use once_cell::sync::Lazy;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    Quantity,
    OrderAmount,
    SaleAmount,
    ReturnAmount,
    ReturnQuantity,
    CostAmount,
    Counterparty,
    Product,
    Timestamp,
}

impl Field {
    pub const ALL: [Field; 9] = [
        Field::Quantity,
        Field::OrderAmount,
        Field::SaleAmount,
        Field::ReturnAmount,
        Field::ReturnQuantity,
        Field::CostAmount,
        Field::Counterparty,
        Field::Product,
        Field::Timestamp,
    ];

    /// Name used in config files and error messages.
    pub fn name(self) -> &'static str {
        match self {
            Field::Quantity => "quantity",
            Field::OrderAmount => "order_amount",
            Field::SaleAmount => "sale_amount",
            Field::ReturnAmount => "return_amount",
            Field::ReturnQuantity => "return_quantity",
            Field::CostAmount => "cost_amount",
            Field::Counterparty => "counterparty",
            Field::Product => "product",
            Field::Timestamp => "timestamp",
        }
    }

    pub fn from_name(name: &str) -> Option<Field> {
        Field::ALL.into_iter().find(|f| f.name() == name)
    }

    fn default_aliases(self) -> &'static [&'static str] {
        match self {
            Field::Quantity => &["Количество", "quantity", "qty"],
            Field::OrderAmount => &["Сумма", "Сумма заказа", "amount", "order_amount"],
            Field::SaleAmount => &["Продажная сумма", "Сумма продажи", "sale_amount", "sales_amount"],
            Field::ReturnAmount => &["Возврат сумма", "Сумма возврата", "return_amount"],
            Field::ReturnQuantity => &["Возврат количество", "Количество возврата", "return_quantity"],
            Field::CostAmount => &["Себестоимость", "cost_amount", "cost"],
            Field::Counterparty => &["Контрагент", "client", "counterparty"],
            Field::Product => &["Номенклатура", "product"],
            Field::Timestamp => &["Период", "date", "timestamp"],
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldSpec {
    pub field: Field,
    pub aliases: Vec<String>,
    pub default: f64,
    pub required: bool,
}

impl FieldSpec {
    fn optional(field: Field) -> Self {
        FieldSpec {
            field,
            aliases: field.default_aliases().iter().map(|s| s.to_string()).collect(),
            default: 0.0,
            required: false,
        }
    }

    fn required(field: Field) -> Self {
        FieldSpec {
            required: true,
            ..FieldSpec::optional(field)
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub table: &'static str,
    pub fields: Vec<FieldSpec>,
}

pub static ORDER_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    table: "orders",
    fields: vec![
        FieldSpec::optional(Field::Quantity),
        FieldSpec::optional(Field::OrderAmount),
        FieldSpec::required(Field::Counterparty),
        FieldSpec::required(Field::Product),
        FieldSpec::required(Field::Timestamp),
    ],
});

pub static SALE_SCHEMA: Lazy<Schema> = Lazy::new(|| Schema {
    table: "sales",
    fields: vec![
        FieldSpec::optional(Field::Quantity),
        FieldSpec::optional(Field::SaleAmount),
        FieldSpec::optional(Field::ReturnAmount),
        FieldSpec::optional(Field::ReturnQuantity),
        FieldSpec::optional(Field::CostAmount),
        FieldSpec::required(Field::Counterparty),
        FieldSpec::required(Field::Product),
        FieldSpec::required(Field::Timestamp),
    ],
});

impl Schema {
    /// Copy of this schema with alias lists replaced for the given fields.
    pub fn with_aliases(&self, overrides: &BTreeMap<Field, Vec<String>>) -> Schema {
        let fields = self
            .fields
            .iter()
            .map(|spec| match overrides.get(&spec.field) {
                Some(aliases) => FieldSpec {
                    aliases: aliases.clone(),
                    ..spec.clone()
                },
                None => spec.clone(),
            })
            .collect();
        Schema {
            table: self.table,
            fields,
        }
    }

    pub fn spec(&self, field: Field) -> Option<&FieldSpec> {
        self.fields.iter().find(|s| s.field == field)
    }

    /// Match table headers against the alias lists.
    ///
    /// Matching is trimmed and case-insensitive; the first header that
    /// matches any alias wins. A required field with no match is an error.
    pub fn resolve(&self, table: &RawTable) -> Result<ColumnMap, SchemaError> {
        let headers: Vec<String> = table
            .headers
            .iter()
            .map(|h| h.trim().to_lowercase())
            .collect();
        let mut columns = BTreeMap::new();
        for spec in &self.fields {
            let found = headers.iter().position(|h| {
                spec.aliases
                    .iter()
                    .any(|alias| alias.trim().to_lowercase() == *h)
            });
            match found {
                Some(idx) => {
                    columns.insert(spec.field, idx);
                }
                None if spec.required => {
                    return Err(SchemaError::MissingColumn {
                        table: self.table,
                        field: spec.field.name(),
                        aliases: spec.aliases.join(", "),
                    });
                }
                None => {
                    tracing::debug!(
                        table = self.table,
                        field = spec.field.name(),
                        default = spec.default,
                        "column absent, using default"
                    );
                }
            }
        }
        Ok(ColumnMap { columns })
    }
}

/// Resolved header positions for one table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    columns: BTreeMap<Field, usize>,
}

impl ColumnMap {
    pub fn index(&self, field: Field) -> Option<usize> {
        self.columns.get(&field).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(headers: &[&str]) -> RawTable {
        RawTable::new(headers.iter().map(|h| h.to_string()).collect(), vec![])
    }

    #[test]
    fn resolves_source_headers() {
        let t = table(&["Период", "Контрагент", "Номенклатура", "Количество"]);
        let map = ORDER_SCHEMA.resolve(&t).unwrap();
        assert_eq!(map.index(Field::Timestamp), Some(0));
        assert_eq!(map.index(Field::Counterparty), Some(1));
        assert_eq!(map.index(Field::Product), Some(2));
        assert_eq!(map.index(Field::Quantity), Some(3));
        assert_eq!(map.index(Field::OrderAmount), None);
    }

    #[test]
    fn matching_ignores_case_and_padding() {
        let t = table(&[" DATE ", "Client", "PRODUCT"]);
        let map = ORDER_SCHEMA.resolve(&t).unwrap();
        assert_eq!(map.index(Field::Timestamp), Some(0));
        assert_eq!(map.index(Field::Counterparty), Some(1));
        assert_eq!(map.index(Field::Product), Some(2));
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let t = table(&["Контрагент", "Номенклатура", "Количество"]);
        let err = ORDER_SCHEMA.resolve(&t).unwrap_err();
        let SchemaError::MissingColumn { table, field, .. } = err;
        assert_eq!(table, "orders");
        assert_eq!(field, "timestamp");
    }

    #[test]
    fn alias_overrides_replace_defaults() {
        let mut overrides = BTreeMap::new();
        overrides.insert(Field::Product, vec!["SKU".to_string()]);
        let schema = SALE_SCHEMA.with_aliases(&overrides);
        let t = table(&["sku", "Контрагент", "Период"]);
        let map = schema.resolve(&t).unwrap();
        assert_eq!(map.index(Field::Product), Some(0));

        let t = table(&["Номенклатура", "Контрагент", "Период"]);
        assert!(schema.resolve(&t).is_err());
    }

    #[test]
    fn field_names_round_trip() {
        for f in Field::ALL {
            assert_eq!(Field::from_name(f.name()), Some(f));
        }
        assert_eq!(Field::from_name("nope"), None);
    }
}
