//! Document backend: criteria -> predicates over JSON documents
//!
//! Missing attributes read as `null`. Comparisons against `null`, or between
//! values of different JSON types, are false, the way SQL treats unknowns;
//! only `is_null` matches them.

use super::criteria::{FieldFilter, FilterNode, FilterValue, Operator, Scalar};
use super::error::ConfigurationError;
use super::fields::FieldRegistry;
use super::sort::{Direction, Nulls, SortDirective};
use super::QueryCompiler;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::cmp::Ordering;

/// A model stored as a JSON document in a named collection.
pub trait DocumentModel: Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the documents live in
    const COLLECTION: &'static str;

    /// Top-level attributes addressable from criteria and sort directives
    const FIELDS: &'static [&'static str];

    /// Attribute holding the document identifier
    const ID_FIELD: &'static str = "id";
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Comparison {
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
}

#[derive(Debug, Clone)]
enum Predicate {
    Compare {
        field: &'static str,
        op: Comparison,
        value: Value,
    },
    Pattern {
        field: &'static str,
        regex: Regex,
    },
    Membership {
        field: &'static str,
        values: Vec<Value>,
        negated: bool,
    },
    IsNull {
        field: &'static str,
    },
    All(Vec<Predicate>),
    Any(Vec<Predicate>),
}

impl Predicate {
    fn matches(&self, doc: &Value) -> bool {
        match self {
            Self::Compare { field, op, value } => {
                let Some(ordering) = compare_values(attr(doc, field), value) else {
                    return false;
                };
                match op {
                    Comparison::Eq => ordering == Ordering::Equal,
                    Comparison::Ne => ordering != Ordering::Equal,
                    Comparison::Lt => ordering == Ordering::Less,
                    Comparison::Lte => ordering != Ordering::Greater,
                    Comparison::Gt => ordering == Ordering::Greater,
                    Comparison::Gte => ordering != Ordering::Less,
                }
            }
            Self::Pattern { field, regex } => match attr(doc, field) {
                Value::String(s) => regex.is_match(s),
                _ => false,
            },
            Self::Membership {
                field,
                values,
                negated,
            } => {
                let actual = attr(doc, field);
                if actual.is_null() {
                    return false;
                }
                let found = values
                    .iter()
                    .any(|v| compare_values(actual, v) == Some(Ordering::Equal));
                found != *negated
            }
            Self::IsNull { field } => attr(doc, field).is_null(),
            Self::All(children) => children.iter().all(|p| p.matches(doc)),
            Self::Any(children) => children.iter().any(|p| p.matches(doc)),
        }
    }
}

#[derive(Debug, Clone)]
struct SortKey {
    field: &'static str,
    direction: Direction,
    nulls: Nulls,
}

/// Compiled, not yet executed, document query.
///
/// Successive `apply_filters` calls are AND-ed; successive `apply_sort`
/// calls append lower-priority keys.
#[derive(Debug, Clone, Default)]
pub struct DocumentQuery {
    predicates: Vec<Predicate>,
    ordering: Vec<SortKey>,
}

impl DocumentQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_filtered(&self) -> bool {
        !self.predicates.is_empty()
    }

    pub fn is_sorted(&self) -> bool {
        !self.ordering.is_empty()
    }

    /// Whether a document satisfies every compiled predicate.
    pub fn matches(&self, doc: &Value) -> bool {
        self.predicates.iter().all(|p| p.matches(doc))
    }

    /// Order two documents by the compiled sort keys.
    ///
    /// Returns `Equal` when unsorted so a stable sort keeps storage order.
    pub fn compare(&self, a: &Value, b: &Value) -> Ordering {
        for key in &self.ordering {
            let (x, y) = (attr(a, key.field), attr(b, key.field));
            let nulls_first = key.nulls == Nulls::First;
            let ordering = match (x.is_null(), y.is_null()) {
                (true, true) => Ordering::Equal,
                (true, false) if nulls_first => Ordering::Less,
                (true, false) => Ordering::Greater,
                (false, true) if nulls_first => Ordering::Greater,
                (false, true) => Ordering::Less,
                (false, false) => {
                    let ordering = compare_values(x, y)
                        .unwrap_or_else(|| type_rank(x).cmp(&type_rank(y)));
                    match key.direction {
                        Direction::Asc => ordering,
                        Direction::Desc => ordering.reverse(),
                    }
                }
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }

    /// Stable sort of documents by the compiled keys.
    pub fn sort(&self, docs: &mut [Value]) {
        if self.is_sorted() {
            docs.sort_by(|a, b| self.compare(a, b));
        }
    }
}

/// Compiler for one document model.
#[derive(Debug, Clone)]
pub struct DocumentCompiler {
    fields: FieldRegistry<&'static str>,
}

impl DocumentCompiler {
    pub fn new(collection: &str, fields: &'static [&'static str]) -> Self {
        Self {
            fields: FieldRegistry::new(collection, fields.iter().map(|f| (*f, *f))),
        }
    }

    pub fn for_model<M: DocumentModel>() -> Self {
        Self::new(M::COLLECTION, M::FIELDS)
    }

    pub fn fields(&self) -> &FieldRegistry<&'static str> {
        &self.fields
    }

    fn predicate(&self, node: &FilterNode) -> Result<Predicate, ConfigurationError> {
        match node {
            FilterNode::Leaf(leaf) => self.leaf(leaf),
            FilterNode::And(children) => self.children(children, "and").map(Predicate::All),
            FilterNode::Or(children) => self.children(children, "or").map(Predicate::Any),
        }
    }

    fn children(
        &self,
        children: &[FilterNode],
        combinator: &'static str,
    ) -> Result<Vec<Predicate>, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::EmptyComposite(combinator));
        }
        children.iter().map(|c| self.predicate(c)).collect()
    }

    fn leaf(&self, leaf: &FieldFilter) -> Result<Predicate, ConfigurationError> {
        let field = self.fields.resolve(leaf.field())?;

        let compare = |op: Comparison, value: &Scalar| Predicate::Compare {
            field,
            op,
            value: value.to_json(),
        };

        let predicate = match (leaf.op(), leaf.value()) {
            (Operator::Eq, FilterValue::Scalar(v)) => compare(Comparison::Eq, v),
            (Operator::Ne, FilterValue::Scalar(v)) => compare(Comparison::Ne, v),
            (Operator::Lt, FilterValue::Scalar(v)) => compare(Comparison::Lt, v),
            (Operator::Lte, FilterValue::Scalar(v)) => compare(Comparison::Lte, v),
            (Operator::Gt, FilterValue::Scalar(v)) => compare(Comparison::Gt, v),
            (Operator::Gte, FilterValue::Scalar(v)) => compare(Comparison::Gte, v),
            (Operator::Like, FilterValue::Scalar(Scalar::Text(pattern))) => Predicate::Pattern {
                field,
                regex: like_regex(pattern, false)?,
            },
            (Operator::ILike, FilterValue::Scalar(Scalar::Text(pattern))) => Predicate::Pattern {
                field,
                regex: like_regex(pattern, true)?,
            },
            (Operator::In, FilterValue::List(items)) => Predicate::Membership {
                field,
                values: items.iter().map(Scalar::to_json).collect(),
                negated: false,
            },
            (Operator::NotIn, FilterValue::List(items)) => Predicate::Membership {
                field,
                values: items.iter().map(Scalar::to_json).collect(),
                negated: true,
            },
            (Operator::IsNull, _) => Predicate::IsNull { field },
            (op, _) => {
                return Err(ConfigurationError::ValueShape {
                    field: leaf.field().to_string(),
                    op,
                    expected: op.shape(),
                })
            }
        };

        Ok(predicate)
    }
}

impl QueryCompiler for DocumentCompiler {
    type Query = DocumentQuery;

    fn apply_filters(
        &self,
        mut query: DocumentQuery,
        criteria: &FilterNode,
    ) -> Result<DocumentQuery, ConfigurationError> {
        query.predicates.push(self.predicate(criteria)?);
        Ok(query)
    }

    fn apply_sort(
        &self,
        mut query: DocumentQuery,
        directives: &[SortDirective],
    ) -> Result<DocumentQuery, ConfigurationError> {
        for directive in directives {
            let field = self.fields.resolve(&directive.field)?;
            // Nulls sort as the smallest value unless placed explicitly
            let nulls = directive.nulls.unwrap_or(match directive.direction {
                Direction::Asc => Nulls::First,
                Direction::Desc => Nulls::Last,
            });
            query.ordering.push(SortKey {
                field,
                direction: directive.direction,
                nulls,
            });
        }
        Ok(query)
    }
}

fn attr<'a>(doc: &'a Value, field: &str) -> &'a Value {
    doc.get(field).unwrap_or(&Value::Null)
}

/// Ordering between two JSON values of the same type; `None` otherwise.
fn compare_values(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => match (a.as_i64(), b.as_i64()) {
            (Some(a), Some(b)) => Some(a.cmp(&b)),
            _ => a.as_f64()?.partial_cmp(&b.as_f64()?),
        },
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Tie-break between mismatched types when sorting
fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Object(_) => 3,
        Value::Array(_) => 4,
        Value::Bool(_) => 5,
    }
}

/// Translate a SQL LIKE pattern into an anchored regex.
fn like_regex(pattern: &str, case_insensitive: bool) -> Result<Regex, ConfigurationError> {
    let mut source = String::with_capacity(pattern.len() + 8);
    source.push_str(if case_insensitive { "(?is)^" } else { "(?s)^" });
    let mut buf = [0u8; 4];
    for ch in pattern.chars() {
        match ch {
            '%' => source.push_str(".*"),
            '_' => source.push('.'),
            other => source.push_str(&regex::escape(other.encode_utf8(&mut buf))),
        }
    }
    source.push('$');

    Regex::new(&source).map_err(|e| {
        ConfigurationError::MalformedCriteria(format!("invalid pattern '{pattern}': {e}"))
    })
}
