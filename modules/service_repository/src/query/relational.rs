//! SeaORM backend: criteria -> `Condition`, directives -> `ORDER BY`

use super::criteria::{FieldFilter, FilterNode, FilterValue, Operator, Scalar};
use super::error::ConfigurationError;
use super::fields::FieldRegistry;
use super::sort::{Direction, Nulls, SortDirective};
use super::QueryCompiler;
use sea_orm::sea_query::{BinOper, Expr, Func, IntoColumnRef, NullOrdering, SimpleExpr};
use sea_orm::{
    ColumnTrait, Condition, DbBackend, EntityTrait, IdenStatic, Iterable, Order, QueryFilter,
    QueryOrder, Select,
};

/// Compiler for one SeaORM entity.
///
/// Every column declared on the entity is addressable by its column name.
/// The backend picks the SQL for pattern operators: SQLite's `LIKE` ignores
/// ASCII case, so `like` compiles to `GLOB` there.
#[derive(Debug, Clone)]
pub struct RelationalCompiler<E: EntityTrait> {
    fields: FieldRegistry<E::Column>,
    backend: DbBackend,
}

impl<E: EntityTrait> Default for RelationalCompiler<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: EntityTrait> RelationalCompiler<E> {
    /// Compiler emitting Postgres pattern SQL
    pub fn new() -> Self {
        Self::for_backend(DbBackend::Postgres)
    }

    pub fn for_backend(backend: DbBackend) -> Self {
        let fields = FieldRegistry::new(
            E::default().table_name(),
            E::Column::iter().map(|column| (column.as_str().to_owned(), column)),
        );
        Self { fields, backend }
    }

    pub fn backend(&self) -> DbBackend {
        self.backend
    }

    pub fn fields(&self) -> &FieldRegistry<E::Column> {
        &self.fields
    }

    /// Compile a criteria tree into a SeaORM condition.
    pub fn condition(&self, node: &FilterNode) -> Result<Condition, ConfigurationError> {
        match node {
            FilterNode::Leaf(leaf) => Ok(Condition::all().add(self.leaf_expr(leaf)?)),
            FilterNode::And(children) => self.combine(Condition::all(), children, "and"),
            FilterNode::Or(children) => self.combine(Condition::any(), children, "or"),
        }
    }

    /// Filter any SeaORM query that accepts conditions (select, update, delete).
    pub fn filter<Q: QueryFilter>(
        &self,
        query: Q,
        criteria: &FilterNode,
    ) -> Result<Q, ConfigurationError> {
        Ok(query.filter(self.condition(criteria)?))
    }

    /// Append one ordering clause per directive, in list order.
    pub fn order<Q: QueryOrder>(
        &self,
        mut query: Q,
        directives: &[SortDirective],
    ) -> Result<Q, ConfigurationError> {
        for directive in directives {
            let column = self.fields.resolve(&directive.field)?;
            let order = match directive.direction {
                Direction::Asc => Order::Asc,
                Direction::Desc => Order::Desc,
            };
            query = match directive.nulls {
                None => query.order_by(column, order),
                Some(Nulls::First) => query.order_by_with_nulls(column, order, NullOrdering::First),
                Some(Nulls::Last) => query.order_by_with_nulls(column, order, NullOrdering::Last),
            };
        }
        Ok(query)
    }

    fn combine(
        &self,
        mut condition: Condition,
        children: &[FilterNode],
        combinator: &'static str,
    ) -> Result<Condition, ConfigurationError> {
        if children.is_empty() {
            return Err(ConfigurationError::EmptyComposite(combinator));
        }
        for child in children {
            condition = match child {
                FilterNode::Leaf(leaf) => condition.add(self.leaf_expr(leaf)?),
                composite => condition.add(self.condition(composite)?),
            };
        }
        Ok(condition)
    }

    fn leaf_expr(&self, leaf: &FieldFilter) -> Result<SimpleExpr, ConfigurationError> {
        let column = self.fields.resolve(leaf.field())?;

        let expr = match (leaf.op(), leaf.value()) {
            (Operator::Eq, FilterValue::Scalar(v)) => column.eq(to_value(v)),
            (Operator::Ne, FilterValue::Scalar(v)) => column.ne(to_value(v)),
            (Operator::Lt, FilterValue::Scalar(v)) => column.lt(to_value(v)),
            (Operator::Lte, FilterValue::Scalar(v)) => column.lte(to_value(v)),
            (Operator::Gt, FilterValue::Scalar(v)) => column.gt(to_value(v)),
            (Operator::Gte, FilterValue::Scalar(v)) => column.gte(to_value(v)),
            (Operator::Like, FilterValue::Scalar(Scalar::Text(pattern))) => match self.backend {
                DbBackend::Sqlite => Expr::col(column.as_column_ref().into_column_ref())
                    .binary(BinOper::Custom("GLOB"), like_to_glob(pattern)),
                _ => column.like(pattern.as_str()),
            },
            // no ILIKE outside Postgres; SQLite's LOWER() only folds ASCII
            (Operator::ILike, FilterValue::Scalar(Scalar::Text(pattern))) => {
                let pattern = match self.backend {
                    DbBackend::Sqlite => pattern.to_ascii_lowercase(),
                    _ => pattern.to_lowercase(),
                };
                Expr::expr(Func::lower(SimpleExpr::Column(
                    column.as_column_ref().into_column_ref(),
                )))
                .like(pattern)
            }
            (Operator::In, FilterValue::List(items)) => column.is_in(items.iter().map(to_value)),
            (Operator::NotIn, FilterValue::List(items)) => {
                column.is_not_in(items.iter().map(to_value))
            }
            (Operator::IsNull, _) => column.is_null(),
            (op, _) => {
                return Err(ConfigurationError::ValueShape {
                    field: leaf.field().to_string(),
                    op,
                    expected: op.shape(),
                })
            }
        };

        Ok(expr)
    }
}

impl<E: EntityTrait> QueryCompiler for RelationalCompiler<E> {
    type Query = Select<E>;

    fn apply_filters(
        &self,
        query: Select<E>,
        criteria: &FilterNode,
    ) -> Result<Select<E>, ConfigurationError> {
        self.filter(query, criteria)
    }

    fn apply_sort(
        &self,
        query: Select<E>,
        directives: &[SortDirective],
    ) -> Result<Select<E>, ConfigurationError> {
        self.order(query, directives)
    }
}

/// Translate a LIKE pattern to a GLOB pattern, escaping GLOB metacharacters.
fn like_to_glob(pattern: &str) -> String {
    let mut glob = String::with_capacity(pattern.len());
    for c in pattern.chars() {
        match c {
            '%' => glob.push('*'),
            '_' => glob.push('?'),
            '*' | '?' | '[' => {
                glob.push('[');
                glob.push(c);
                glob.push(']');
            }
            c => glob.push(c),
        }
    }
    glob
}

fn to_value(scalar: &Scalar) -> sea_orm::Value {
    match scalar {
        Scalar::Bool(b) => (*b).into(),
        Scalar::Int(i) => (*i).into(),
        Scalar::Float(f) => (*f).into(),
        Scalar::Text(s) => s.clone().into(),
    }
}
