//! Filter rule builder and search request assembly
//!
//! A [`RuleSet`] is the ordered collection of filter rows the user edits in
//! the console. Rules are addressed through stable [`RuleId`] handles so UI
//! bindings survive removals. Serializing the set folds every rule with a
//! non-blank value into the [`FilterSet`] payload the backend expects.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::schema::{self, FieldDescriptor, Operator};

/// Stable handle for one rule row
pub type RuleId = u64;

/// One row of the rule builder
#[derive(Debug, Clone)]
pub struct FilterRule {
    id: RuleId,
    field_index: usize,
    operator: Operator,
    value: String,
}

impl FilterRule {
    pub fn id(&self) -> RuleId {
        self.id
    }

    pub fn field_index(&self) -> usize {
        self.field_index
    }

    pub fn field(&self) -> &'static FieldDescriptor {
        schema::field(self.field_index)
    }

    pub fn operator(&self) -> Operator {
        self.operator
    }

    pub fn value(&self) -> &str {
        &self.value
    }
}

/// Constraints accumulated for a single field
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FieldFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is: Option<String>,
}

impl FieldFilter {
    fn set(&mut self, operator: Operator, value: String) {
        match operator {
            Operator::Gte => self.min = Some(value),
            Operator::Lte => self.max = Some(value),
            Operator::Is => self.is = Some(value),
        }
    }
}

/// Serialized filter payload: field id -> accumulated constraints
pub type FilterSet = BTreeMap<String, FieldFilter>;

/// Dynamic, ordered collection of filter rules
#[derive(Debug, Default)]
pub struct RuleSet {
    rules: Vec<FilterRule>,
    next_id: RuleId,
}

impl RuleSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a new rule bound to the first schema field, its first legal
    /// operator, and an empty value. Returns the rule's stable handle.
    pub fn add_rule(&mut self) -> RuleId {
        let id = self.next_id;
        self.next_id += 1;
        let field = schema::field(0);
        self.rules.push(FilterRule {
            id,
            field_index: 0,
            operator: field.value_type.operators()[0],
            value: String::new(),
        });
        id
    }

    /// Remove a rule; no-op if the handle no longer resolves
    pub fn remove_rule(&mut self, id: RuleId) {
        self.rules.retain(|r| r.id != id);
    }

    /// Reassign a rule's field.
    ///
    /// The operator is always reset to the first legal operator of the new
    /// field's type. A rule must never be left holding an operator its value
    /// type does not offer, so this reset happens on every field change, not
    /// only when the type differs.
    pub fn set_field(&mut self, id: RuleId, field_index: usize) {
        let field = schema::field(field_index);
        if let Some(rule) = self.rule_mut(id) {
            rule.field_index = field_index;
            rule.operator = field.value_type.operators()[0];
        }
    }

    /// Change a rule's operator, rejecting one the field's type does not offer
    pub fn set_operator(&mut self, id: RuleId, operator: Operator) -> Result<()> {
        let Some(rule) = self.rule_mut(id) else {
            return Ok(());
        };
        let legal = rule.field().value_type.operators();
        if !legal.contains(&operator) {
            return Err(Error::InvalidRequest(format!(
                "operator {:?} is not valid for field {}",
                operator,
                rule.field().id
            )));
        }
        rule.operator = operator;
        Ok(())
    }

    pub fn set_value(&mut self, id: RuleId, value: impl Into<String>) {
        if let Some(rule) = self.rule_mut(id) {
            rule.value = value.into();
        }
    }

    pub fn rules(&self) -> &[FilterRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn clear(&mut self) {
        self.rules.clear();
    }

    /// Fold all rules with a non-blank value into a [`FilterSet`].
    ///
    /// Rules are applied in builder order, so when two rules write the same
    /// key of the same field the later rule wins. Last write wins per key,
    /// not per field: a `gte` and an `lte` on the same field coexist.
    pub fn serialize_non_empty(&self) -> FilterSet {
        let mut filters = FilterSet::new();
        for rule in &self.rules {
            let value = rule.value.trim();
            if value.is_empty() {
                continue;
            }
            filters
                .entry(rule.field().id.to_string())
                .or_default()
                .set(rule.operator, value.to_string());
        }
        filters
    }

    fn rule_mut(&mut self, id: RuleId) -> Option<&mut FilterRule> {
        self.rules.iter_mut().find(|r| r.id == id)
    }
}

/// One search request, in exactly one of the three query shapes
#[derive(Debug, Clone, PartialEq)]
pub enum SearchRequest {
    /// Free-text query
    Plain { query: String },
    /// Structured query: filters plus optional free text
    Filtered { query: String, filters: FilterSet },
    /// More-like-this query seeded by a cached record
    Similar { id: String, subject: String },
}

impl SearchRequest {
    /// Assemble a request from the search input and the serialized rules.
    ///
    /// Any non-empty rule forces structured mode; otherwise non-blank text
    /// becomes a plain query. Returns `None` when there is nothing to ask.
    pub fn from_input(query: &str, filters: FilterSet) -> Option<SearchRequest> {
        let query = query.trim().to_string();
        if !filters.is_empty() {
            Some(SearchRequest::Filtered { query, filters })
        } else if !query.is_empty() {
            Some(SearchRequest::Plain { query })
        } else {
            None
        }
    }

    /// Build a similarity request seeded by `id`. The subject is the seed's
    /// display title when the caller has one cached.
    pub fn similar(id: impl Into<String>, title: Option<&str>) -> SearchRequest {
        let id = id.into();
        let subject = match title {
            Some(title) => title.to_string(),
            None => format!("post {id}"),
        };
        SearchRequest::Similar { id, subject }
    }

    /// Human-readable subject for the loading indicator. Display only; the
    /// wire payload always carries the raw query text.
    pub fn subject(&self) -> &str {
        match self {
            SearchRequest::Plain { query } => query,
            SearchRequest::Filtered { query, .. } => {
                if query.is_empty() {
                    "Advanced Filter Search"
                } else {
                    query
                }
            }
            SearchRequest::Similar { subject, .. } => subject,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Operator;

    fn rule_for(set: &mut RuleSet, field_id: &str, operator: Operator, value: &str) -> RuleId {
        let (index, _) = crate::schema::field_by_id(field_id).unwrap();
        let id = set.add_rule();
        set.set_field(id, index);
        set.set_operator(id, operator).unwrap();
        set.set_value(id, value);
        id
    }

    #[test]
    fn range_bounds_fold_into_one_field_entry() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "10");
        rule_for(&mut set, "num_likes", Operator::Lte, "50");

        let filters = set.serialize_non_empty();
        assert_eq!(filters.len(), 1);
        let entry = &filters["num_likes"];
        assert_eq!(entry.min.as_deref(), Some("10"));
        assert_eq!(entry.max.as_deref(), Some("50"));
        assert!(entry.is.is_none());
    }

    #[test]
    fn later_rule_wins_on_same_key() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "10");
        rule_for(&mut set, "num_likes", Operator::Gte, "25");

        let filters = set.serialize_non_empty();
        assert_eq!(filters["num_likes"].min.as_deref(), Some("25"));
    }

    #[test]
    fn blank_values_are_skipped() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "   ");
        rule_for(&mut set, "status_type", Operator::Is, "video");

        let filters = set.serialize_non_empty();
        assert!(!filters.contains_key("num_likes"));
        assert_eq!(filters["status_type"].is.as_deref(), Some("video"));
    }

    #[test]
    fn values_are_trimmed_on_serialization() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "status_type", Operator::Is, "  link ");
        let filters = set.serialize_non_empty();
        assert_eq!(filters["status_type"].is.as_deref(), Some("link"));
    }

    #[test]
    fn field_change_resets_operator_to_first_legal() {
        let mut set = RuleSet::new();
        let id = set.add_rule();
        // default field is numeric; Lte is legal there
        set.set_operator(id, Operator::Lte).unwrap();

        let (text_index, _) = crate::schema::field_by_id("status_type").unwrap();
        set.set_field(id, text_index);
        assert_eq!(set.rules()[0].operator(), Operator::Is);

        // and Is is now the only legal choice
        assert!(set.set_operator(id, Operator::Gte).is_err());
    }

    #[test]
    fn remove_rule_is_idempotent() {
        let mut set = RuleSet::new();
        let id = set.add_rule();
        set.remove_rule(id);
        set.remove_rule(id);
        assert!(set.is_empty());
    }

    #[test]
    fn filter_set_serializes_without_absent_keys() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "10");
        let json = serde_json::to_value(set.serialize_non_empty()).unwrap();
        assert_eq!(json, serde_json::json!({ "num_likes": { "min": "10" } }));
    }

    #[test]
    fn assembler_picks_exactly_one_mode() {
        assert_eq!(
            SearchRequest::from_input("rust", FilterSet::new()),
            Some(SearchRequest::Plain {
                query: "rust".to_string()
            })
        );

        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "10");
        let filters = set.serialize_non_empty();
        match SearchRequest::from_input("", filters).unwrap() {
            SearchRequest::Filtered { query, filters } => {
                assert!(query.is_empty());
                assert!(filters.contains_key("num_likes"));
            }
            other => panic!("expected filtered request, got {other:?}"),
        }

        assert_eq!(SearchRequest::from_input("   ", FilterSet::new()), None);
    }

    #[test]
    fn filtered_subject_falls_back_for_display_only() {
        let mut set = RuleSet::new();
        rule_for(&mut set, "num_likes", Operator::Gte, "10");
        let request = SearchRequest::from_input("", set.serialize_non_empty()).unwrap();
        assert_eq!(request.subject(), "Advanced Filter Search");
        // the wire query stays blank
        match request {
            SearchRequest::Filtered { query, .. } => assert!(query.is_empty()),
            _ => unreachable!(),
        }
    }

    #[test]
    fn similar_subject_prefers_cached_title() {
        let request = SearchRequest::similar("42", Some("Post X"));
        assert_eq!(request.subject(), "Post X");
        let request = SearchRequest::similar("42", None);
        assert_eq!(request.subject(), "post 42");
    }
}
