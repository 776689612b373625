//! Searchable-field schema for the remote post index
//!
//! The backend indexes a fixed set of filterable fields. Each field has a
//! value type, and the value type alone decides which comparison operators a
//! filter rule may use. The table is static configuration; nothing here
//! mutates at runtime.

/// Value type of a searchable field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Numeric,
    Date,
    Text,
}

impl ValueType {
    /// Legal operators for this value type.
    ///
    /// Numeric and date fields take range bounds; text fields only support
    /// exact match. `Is` is never offered for numeric/date fields.
    pub fn operators(self) -> &'static [Operator] {
        match self {
            ValueType::Numeric | ValueType::Date => &[Operator::Gte, Operator::Lte],
            ValueType::Text => &[Operator::Is],
        }
    }

    /// Placeholder text for the value input affordance
    pub fn input_hint(self) -> &'static str {
        match self {
            ValueType::Numeric => "number",
            ValueType::Date => "MM-DD-YYYY",
            ValueType::Text => "text",
        }
    }
}

/// Comparison operator accepted by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gte,
    Lte,
    Is,
}

impl Operator {
    /// Human-readable label, phrased per value type
    pub fn label(self, value_type: ValueType) -> &'static str {
        match (self, value_type) {
            (Operator::Gte, ValueType::Date) => "is on or after",
            (Operator::Lte, ValueType::Date) => "is on or before",
            (Operator::Gte, _) => "is greater than or equal to",
            (Operator::Lte, _) => "is less than or equal to",
            (Operator::Is, _) => "is exactly",
        }
    }

    /// Key this operator writes in the serialized filter payload.
    ///
    /// The mapping is fixed by the backend contract: `gte` -> `min`,
    /// `lte` -> `max`, `is` -> `is`.
    pub fn filter_key(self) -> &'static str {
        match self {
            Operator::Gte => "min",
            Operator::Lte => "max",
            Operator::Is => "is",
        }
    }

    /// Parse the wire name of an operator (used by the CLI filter syntax)
    pub fn parse(s: &str) -> Option<Operator> {
        match s {
            "gte" => Some(Operator::Gte),
            "lte" => Some(Operator::Lte),
            "is" => Some(Operator::Is),
            _ => None,
        }
    }
}

/// One searchable field of the remote index
#[derive(Debug, Clone, Copy)]
pub struct FieldDescriptor {
    /// Field name as indexed by the backend
    pub id: &'static str,
    /// Label shown in the rule builder
    pub label: &'static str,
    pub value_type: ValueType,
}

/// The advanced-search field table, in display order
pub const FIELDS: &[FieldDescriptor] = &[
    FieldDescriptor {
        id: "num_likes",
        label: "Likes",
        value_type: ValueType::Numeric,
    },
    FieldDescriptor {
        id: "num_comments",
        label: "Comments",
        value_type: ValueType::Numeric,
    },
    FieldDescriptor {
        id: "num_shares",
        label: "Shares",
        value_type: ValueType::Numeric,
    },
    FieldDescriptor {
        id: "num_reactions",
        label: "Reactions",
        value_type: ValueType::Numeric,
    },
    FieldDescriptor {
        id: "status_published",
        label: "Date Published",
        value_type: ValueType::Date,
    },
    FieldDescriptor {
        id: "status_type",
        label: "Post Type",
        value_type: ValueType::Text,
    },
];

/// Look up a field by position in the table.
///
/// Rules address fields by index, so an out-of-range index is a bug in the
/// caller, not user input; this panics rather than returning an error.
pub fn field(index: usize) -> &'static FieldDescriptor {
    &FIELDS[index]
}

/// Find a field by its indexed name (CLI filter syntax)
pub fn field_by_id(id: &str) -> Option<(usize, &'static FieldDescriptor)> {
    FIELDS.iter().enumerate().find(|(_, f)| f.id == id)
}
