use std::ops::ControlFlow;

use serde::Serialize;
use sqlparser::ast::{
    Expr, Join, JoinConstraint, JoinOperator, ObjectName, Query, Select, SetExpr, TableFactor,
    TableWithJoins, Values, Visit, Visitor,
};
use strum::IntoDiscriminant;
use strum_macros::EnumDiscriminants;

/// Table and column names found in joins, in visiting order, duplicates kept.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct JoinNames {
    pub table_names: Vec<String>,
    pub column_names: Vec<String>,
}

impl JoinNames {
    pub fn extend(&mut self, other: JoinNames) {
        self.table_names.extend(other.table_names);
        self.column_names.extend(other.column_names);
    }

    pub fn is_empty(&self) -> bool {
        self.table_names.is_empty() && self.column_names.is_empty()
    }
}

/// Row source of a FROM clause or of the right side of a join.
#[derive(Debug, Clone, Copy, EnumDiscriminants)]
#[strum_discriminants(name(FromItemKind), derive(strum_macros::Display))]
pub enum FromItem<'a> {
    PlainTable(&'a ObjectName),
    SubSelect(&'a Query),
    SubJoin(&'a TableWithJoins),
    LateralSubSelect(&'a Query),
    ValuesList(&'a Values),
    TableFunction(&'a TableFactor),
}

impl<'a> From<&'a TableFactor> for FromItem<'a> {
    fn from(factor: &'a TableFactor) -> Self {
        match factor {
            TableFactor::Table { name, .. } => FromItem::PlainTable(name),
            TableFactor::Derived {
                lateral: true,
                subquery,
                ..
            } => FromItem::LateralSubSelect(subquery),
            TableFactor::Derived { subquery, .. } => match subquery.body.as_ref() {
                SetExpr::Values(values) => FromItem::ValuesList(values),
                _ => FromItem::SubSelect(subquery),
            },
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => FromItem::SubJoin(table_with_joins),
            other => FromItem::TableFunction(other),
        }
    }
}

fn on_expression(join: &Join) -> Option<&Expr> {
    let constraint = match &join.join_operator {
        JoinOperator::Join(constraint)
        | JoinOperator::Inner(constraint)
        | JoinOperator::Left(constraint)
        | JoinOperator::LeftOuter(constraint)
        | JoinOperator::Right(constraint)
        | JoinOperator::RightOuter(constraint)
        | JoinOperator::FullOuter(constraint)
        | JoinOperator::Semi(constraint)
        | JoinOperator::LeftSemi(constraint)
        | JoinOperator::RightSemi(constraint)
        | JoinOperator::Anti(constraint)
        | JoinOperator::LeftAnti(constraint)
        | JoinOperator::RightAnti(constraint)
        | JoinOperator::StraightJoin(constraint)
        | JoinOperator::AsOf { constraint, .. } => constraint,
        JoinOperator::CrossJoin { .. }
        | JoinOperator::CrossApply { .. }
        | JoinOperator::OuterApply { .. } => return None,
    };
    match constraint {
        JoinConstraint::On(expr) => Some(expr),
        _ => None,
    }
}

/// Collects column references of an expression, wherever they are nested.
/// Subqueries are not descended into.
#[derive(Debug, Default)]
struct ColumnCollector {
    column_names: Vec<String>,
    query_depth: usize,
}

impl ColumnCollector {
    fn collect(&mut self, expr: &Expr) {
        let _ = expr.visit(self);
    }
}

impl Visitor for ColumnCollector {
    type Break = ();

    fn pre_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.query_depth += 1;
        ControlFlow::Continue(())
    }

    fn post_visit_query(&mut self, _query: &Query) -> ControlFlow<Self::Break> {
        self.query_depth -= 1;
        ControlFlow::Continue(())
    }

    fn pre_visit_expr(&mut self, expr: &Expr) -> ControlFlow<Self::Break> {
        if self.query_depth > 0 {
            return ControlFlow::Continue(());
        }
        match expr {
            Expr::Identifier(ident) => self.column_names.push(ident.value.clone()),
            Expr::CompoundIdentifier(parts) => {
                if let Some(column) = parts.last() {
                    self.column_names.push(column.value.clone());
                }
            }
            _ => {}
        }
        ControlFlow::Continue(())
    }
}

struct FromItemVisitor<'e> {
    table_names: Vec<String>,
    columns: &'e mut ColumnCollector,
}

impl FromItemVisitor<'_> {
    fn visit(&mut self, item: FromItem<'_>) {
        match item {
            FromItem::PlainTable(name) => self.table_names.push(name.to_string()),
            FromItem::SubJoin(table_with_joins) => {
                for join in &table_with_joins.joins {
                    self.visit(FromItem::from(&join.relation));
                    if let Some(on) = on_expression(join) {
                        self.columns.collect(on);
                    }
                }
            }
            FromItem::SubSelect(_)
            | FromItem::LateralSubSelect(_)
            | FromItem::ValuesList(_)
            | FromItem::TableFunction(_) => {
                log::trace!("Ignoring {} from-item.", item.discriminant());
            }
        }
    }
}

/// Collects the tables of every FROM clause and join, and the columns of every
/// join condition, of the given SELECTs.
///
/// Subqueries are not descended into: only the tables and join conditions that
/// are direct parts of each SELECT are visited.
pub fn extract_joins(selects: &[Select]) -> JoinNames {
    let mut columns = ColumnCollector::default();
    let mut from_items = FromItemVisitor {
        table_names: vec![],
        columns: &mut columns,
    };

    for select in selects {
        for table_with_joins in &select.from {
            from_items.visit(FromItem::from(&table_with_joins.relation));
            for join in &table_with_joins.joins {
                if let Some(on) = on_expression(join) {
                    from_items.columns.collect(on);
                }
                from_items.visit(FromItem::from(&join.relation));
            }
        }
    }

    let table_names = from_items.table_names;
    JoinNames {
        table_names,
        column_names: columns.column_names,
    }
}
