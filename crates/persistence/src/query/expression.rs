//! Query expressions and the boolean query they are combined into.

use serde_json::{Value, json};

/// The value side of an expression.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprValue {
    /// One value, compiled to `term` (or `fuzzy`).
    Scalar(Value),
    /// Any of several values, compiled to `terms`.
    Set(Vec<Value>),
}

/// How a scalar value is matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchMode {
    #[default]
    Exact,
    Fuzzy,
}

/// One filter clause over a document path.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryExpression {
    path: String,
    value: ExprValue,
    match_mode: MatchMode,
    negate: bool,
}

impl QueryExpression {
    /// Exact match on a single value.
    pub fn term(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: ExprValue::Scalar(value.into()),
            match_mode: MatchMode::Exact,
            negate: false,
        }
    }

    /// Exact match on any of `values`.
    pub fn terms<I, V>(path: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self {
            path: path.into(),
            value: ExprValue::Set(values.into_iter().map(Into::into).collect()),
            match_mode: MatchMode::Exact,
            negate: false,
        }
    }

    /// Approximate string match. Only scalar strings can be fuzzy.
    pub fn fuzzy(path: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            value: ExprValue::Scalar(Value::String(value.into())),
            match_mode: MatchMode::Fuzzy,
            negate: false,
        }
    }

    /// Inverts the expression: documents matching it are excluded.
    pub fn negated(mut self) -> Self {
        self.negate = !self.negate;
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn value(&self) -> &ExprValue {
        &self.value
    }

    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    pub fn is_negated(&self) -> bool {
        self.negate
    }

    /// Renders the clause, ignoring `negate`; placement in `must` or
    /// `must_not` is the caller's concern.
    pub fn to_clause(&self) -> Value {
        match (&self.value, self.match_mode) {
            (ExprValue::Set(values), _) => json!({ "terms": { self.path.as_str(): values } }),
            (ExprValue::Scalar(value), MatchMode::Fuzzy) => {
                json!({ "fuzzy": { self.path.as_str(): { "value": value } } })
            }
            (ExprValue::Scalar(value), MatchMode::Exact) => {
                json!({ "term": { self.path.as_str(): value } })
            }
        }
    }
}

/// A flat conjunction of clauses.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoolQuery {
    must: Vec<Value>,
    must_not: Vec<Value>,
}

impl BoolQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an expression to `must` or `must_not` according to its negation.
    pub fn push(&mut self, expr: &QueryExpression) {
        if expr.is_negated() {
            self.must_not.push(expr.to_clause());
        } else {
            self.must.push(expr.to_clause());
        }
    }

    pub fn extend<'a, I>(&mut self, exprs: I)
    where
        I: IntoIterator<Item = &'a QueryExpression>,
    {
        for expr in exprs {
            self.push(expr);
        }
    }

    pub fn must(&self) -> &[Value] {
        &self.must
    }

    pub fn must_not(&self) -> &[Value] {
        &self.must_not
    }

    pub fn to_value(&self) -> Value {
        json!({ "bool": { "must": self.must, "must_not": self.must_not } })
    }
}

impl<'a> FromIterator<&'a QueryExpression> for BoolQuery {
    fn from_iter<I: IntoIterator<Item = &'a QueryExpression>>(iter: I) -> Self {
        let mut query = BoolQuery::new();
        query.extend(iter);
        query
    }
}
