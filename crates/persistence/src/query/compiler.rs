//! List query compiler.
//!
//! Translates [`ListOptions`] into an Elasticsearch Query DSL document:
//!
//! ```json
//! {"size": 500, "from": 0, "query": {"bool": {"must": [...], "must_not": [...]}}}
//! ```

use serde_json::{Value, json};
use tracing::debug;

use crate::error::{StorageResult, ValidationError};
use crate::types::{
    CLUSTER_NAME_ANNOTATION, DEFAULT_PAGE_SIZE, FUZZY_NAME_LABEL, GroupVersionResource,
    LabelSelector, ListOptions, SelectorOperator, parse_continue_token,
};

use super::expression::{BoolQuery, QueryExpression};

/// Fields accepted in `order_by`.
pub const SUPPORTED_ORDER_FIELDS: [&str; 5] =
    ["cluster", "namespace", "name", "created_at", "resource_version"];

/// Path of the cluster annotation inside a stored document.
pub fn cluster_path() -> String {
    format!("object.metadata.annotations.{CLUSTER_NAME_ANNOTATION}")
}

pub(crate) const OWNER_UID_PATH: &str = "object.metadata.ownerReferences.uid";
pub(crate) const UID_PATH: &str = "object.metadata.uid";
const LABELS_PATH: &str = "object.metadata.labels";
const CREATION_TIMESTAMP_PATH: &str = "object.metadata.creationTimestamp";

/// A query document plus the pagination it was compiled with.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    body: Value,
    offset: u64,
    size: u32,
}

impl CompiledQuery {
    /// The backend query document.
    pub fn body(&self) -> &Value {
        &self.body
    }

    pub fn into_body(self) -> Value {
        self.body
    }

    /// Offset of the first hit, decoded from the continuation token.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Requested page size.
    pub fn size(&self) -> u32 {
        self.size
    }
}

/// Compiles list requests for one resource kind.
#[derive(Debug, Clone)]
pub struct ListQueryCompiler<'a> {
    identity: &'a GroupVersionResource,
    storage_name: &'a str,
}

impl<'a> ListQueryCompiler<'a> {
    pub fn new(identity: &'a GroupVersionResource) -> Self {
        Self {
            identity,
            storage_name: "elasticsearch",
        }
    }

    /// Sets the storage name reported when a field selector is rejected.
    pub fn with_storage_name(mut self, storage_name: &'a str) -> Self {
        self.storage_name = storage_name;
        self
    }

    /// Compiles `opts` into a query document.
    ///
    /// `owner_ids` is the resolved owner set; it is only used when `opts`
    /// carries an owner filter scoped to exactly one cluster.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::UnsupportedListField` for field selectors
    /// through list-typed fields and `ValidationError::InvalidContinueToken`
    /// for a malformed continuation token.
    pub fn compile(&self, owner_ids: &[String], opts: &ListOptions) -> StorageResult<CompiledQuery> {
        let size = opts.page_limit().unwrap_or(DEFAULT_PAGE_SIZE);
        let offset = parse_continue_token(opts.continue_token.as_deref())?;
        self.check_order_by(opts);

        if let (Some(since), Some(before)) = (opts.since, opts.before) {
            let body = json!({
                "size": size,
                "from": offset,
                "query": {
                    "range": {
                        CREATION_TIMESTAMP_PATH: {
                            "gte": since.timestamp(),
                            "lte": before.timestamp(),
                            "format": "epoch_second"
                        }
                    }
                }
            });
            return Ok(CompiledQuery { body, offset, size });
        }

        let exprs = self.expressions(owner_ids, opts)?;
        let query: BoolQuery = exprs.iter().collect();

        Ok(CompiledQuery {
            body: json!({
                "size": size,
                "from": offset,
                "query": query.to_value(),
            }),
            offset,
            size,
        })
    }

    /// Builds the expression list, one per non-empty filter dimension.
    pub fn expressions(
        &self,
        owner_ids: &[String],
        opts: &ListOptions,
    ) -> StorageResult<Vec<QueryExpression>> {
        let mut exprs = Vec::new();

        if !opts.cluster_names.is_empty() {
            exprs.push(QueryExpression::terms(cluster_path(), opts.cluster_names.iter().cloned()));
        }
        if !opts.namespaces.is_empty() {
            exprs.push(QueryExpression::terms("namespace", opts.namespaces.iter().cloned()));
        }
        if !opts.names.is_empty() {
            exprs.push(QueryExpression::terms("name", opts.names.iter().cloned()));
        }

        if let Some(selector) = &opts.label_selector {
            label_expressions(selector, &mut exprs);
        }

        if let Some(extra) = &opts.extra_label_selector {
            for req in extra.requirements() {
                if req.key() != FUZZY_NAME_LABEL {
                    continue;
                }
                for name in req.values() {
                    exprs.push(QueryExpression::fuzzy("name", name.trim()));
                }
            }
        }

        if let Some(selector) = &opts.field_selector {
            for req in selector.requirements() {
                if req.path().has_list() {
                    return Err(ValidationError::UnsupportedListField {
                        path: req.path().to_string(),
                        storage: self.storage_name.to_string(),
                    }
                    .into());
                }
                let path = std::iter::once("object")
                    .chain(req.path().segments().iter().map(|s| s.name()))
                    .collect::<Vec<_>>()
                    .join(".");
                if let Some(expr) = requirement_expression(path, req.operator(), req.values()) {
                    exprs.push(expr);
                }
            }
        }

        if opts.owner_scope().is_some() {
            exprs.push(QueryExpression::terms(OWNER_UID_PATH, owner_ids.iter().cloned()));
        }

        exprs.push(QueryExpression::term("group", self.identity.group.as_str()));
        exprs.push(QueryExpression::term("version", self.identity.version.as_str()));
        exprs.push(QueryExpression::term("resource", self.identity.resource.as_str()));

        Ok(exprs)
    }

    fn check_order_by(&self, opts: &ListOptions) {
        for order in &opts.order_by {
            if !SUPPORTED_ORDER_FIELDS.contains(&order.field.as_str()) {
                debug!(field = %order.field, "Ignoring unsupported order field");
            }
        }
    }
}

fn label_expressions(selector: &LabelSelector, exprs: &mut Vec<QueryExpression>) {
    for req in selector.requirements() {
        let path = format!("{LABELS_PATH}.{}", req.key());
        if let Some(expr) = requirement_expression(path, req.operator(), req.values()) {
            exprs.push(expr);
        }
    }
}

/// Translates one selector requirement. Existence operators have no clause.
fn requirement_expression(
    path: String,
    operator: SelectorOperator,
    values: Vec<String>,
) -> Option<QueryExpression> {
    match operator {
        SelectorOperator::Equals | SelectorOperator::DoubleEquals => {
            values.into_iter().next().map(|v| QueryExpression::term(path, v))
        }
        SelectorOperator::NotEquals => values
            .into_iter()
            .next()
            .map(|v| QueryExpression::term(path, v).negated()),
        SelectorOperator::In => Some(QueryExpression::terms(path, values)),
        SelectorOperator::NotIn => Some(QueryExpression::terms(path, values).negated()),
        SelectorOperator::Exists | SelectorOperator::DoesNotExist => {
            debug!(path = %path, operator = %operator, "Existence requirements are not filtered");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FieldSelector, OrderBy, Requirement};
    use chrono::{TimeZone, Utc};

    fn deployments() -> GroupVersionResource {
        GroupVersionResource::new("apps", "v1", "deployments")
    }

    fn identity_clauses() -> Vec<Value> {
        vec![
            json!({"term": {"group": "apps"}}),
            json!({"term": {"version": "v1"}}),
            json!({"term": {"resource": "deployments"}}),
        ]
    }

    #[test]
    fn test_empty_options() {
        let gvr = deployments();
        let compiled = ListQueryCompiler::new(&gvr)
            .compile(&[], &ListOptions::new())
            .unwrap();
        assert_eq!(
            compiled.body(),
            &json!({
                "size": 500,
                "from": 0,
                "query": {"bool": {"must": identity_clauses(), "must_not": []}}
            })
        );
        assert_eq!(compiled.size(), DEFAULT_PAGE_SIZE);
        assert_eq!(compiled.offset(), 0);
    }

    #[test]
    fn test_zero_limit_uses_default_page() {
        let compiled = ListQueryCompiler::new(&deployments())
            .compile(&[], &ListOptions::new().with_limit(0))
            .unwrap();
        assert_eq!(compiled.size(), DEFAULT_PAGE_SIZE);
    }

    #[test]
    fn test_label_selector_example() {
        let gvr = deployments();
        let opts = ListOptions::new()
            .with_clusters(["c1"])
            .with_label_selector(LabelSelector::parse("tier=front").unwrap())
            .with_limit(10);
        let compiled = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap();
        let mut must = vec![
            json!({"terms": {cluster_path(): ["c1"]}}),
            json!({"term": {"object.metadata.labels.tier": "front"}}),
        ];
        must.extend(identity_clauses());
        assert_eq!(
            compiled.body(),
            &json!({
                "size": 10,
                "from": 0,
                "query": {"bool": {"must": must, "must_not": []}}
            })
        );
    }

    #[test]
    fn test_multi_valued_filters_are_single_terms() {
        let gvr = deployments();
        let opts = ListOptions::new()
            .with_namespaces(["a", "b"])
            .with_names(["x", "y", "z"]);
        let exprs = ListQueryCompiler::new(&gvr).expressions(&[], &opts).unwrap();
        assert_eq!(exprs.len(), 5);
        assert_eq!(exprs[0].to_clause(), json!({"terms": {"namespace": ["a", "b"]}}));
        assert_eq!(exprs[1].to_clause(), json!({"terms": {"name": ["x", "y", "z"]}}));
    }

    #[test]
    fn test_label_operators() {
        let gvr = deployments();
        let opts = ListOptions::new().with_label_selector(
            LabelSelector::parse("a!=1,b in (2,3),c notin (4),d,!e").unwrap(),
        );
        let compiled = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap();
        let query = &compiled.body()["query"]["bool"];
        assert_eq!(
            query["must"][0],
            json!({"terms": {"object.metadata.labels.b": ["2", "3"]}})
        );
        assert_eq!(
            query["must_not"],
            json!([
                {"term": {"object.metadata.labels.a": "1"}},
                {"terms": {"object.metadata.labels.c": ["4"]}}
            ])
        );
        // exists / does-not-exist contribute nothing
        assert_eq!(query["must"].as_array().unwrap().len(), 4);
    }

    #[test]
    fn test_fuzzy_name() {
        let gvr = deployments();
        let extra = LabelSelector::default()
            .with(Requirement::new(FUZZY_NAME_LABEL, SelectorOperator::In, [" ngin "]).unwrap())
            .with(Requirement::new("other/key", SelectorOperator::Equals, ["x"]).unwrap());
        let opts = ListOptions::new().with_extra_label_selector(extra);
        let exprs = ListQueryCompiler::new(&gvr).expressions(&[], &opts).unwrap();
        assert_eq!(exprs[0], QueryExpression::fuzzy("name", "ngin"));
        assert_eq!(exprs.len(), 4);
    }

    #[test]
    fn test_field_selector_path() {
        let gvr = deployments();
        let opts = ListOptions::new()
            .with_field_selector(FieldSelector::parse("status.phase!=Running").unwrap());
        let compiled = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap();
        assert_eq!(
            compiled.body()["query"]["bool"]["must_not"],
            json!([{"term": {"object.status.phase": "Running"}}])
        );
    }

    #[test]
    fn test_list_field_selector_rejected() {
        let gvr = deployments();
        let opts = ListOptions::new()
            .with_field_selector(FieldSelector::parse("spec.containers[].image=nginx").unwrap());
        let err = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap_err();
        assert!(err.is_invalid_argument());
        assert!(err.to_string().contains("spec.containers[].image"));
    }

    #[test]
    fn test_time_range_short_circuits() {
        let gvr = deployments();
        let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let before = Utc.with_ymd_and_hms(2024, 1, 2, 0, 0, 0).unwrap();
        let opts = ListOptions::new()
            .with_clusters(["c1"])
            .with_label_selector(LabelSelector::parse("tier=front").unwrap())
            .with_created_between(since, before)
            .with_limit(20)
            .with_continue_token("40");
        let compiled = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap();
        assert_eq!(
            compiled.body(),
            &json!({
                "size": 20,
                "from": 40,
                "query": {"range": {"object.metadata.creationTimestamp": {
                    "gte": 1704067200,
                    "lte": 1704153600,
                    "format": "epoch_second"
                }}}
            })
        );
    }

    #[test]
    fn test_owner_filter_requires_single_cluster() {
        let gvr = deployments();
        let owners = vec!["uid-b".to_string()];

        let opts = ListOptions::new().with_clusters(["c1"]).with_owner_uid("uid-a", 1);
        let compiled = ListQueryCompiler::new(&gvr).compile(&owners, &opts).unwrap();
        assert_eq!(
            compiled.body()["query"]["bool"]["must"][1],
            json!({"terms": {OWNER_UID_PATH: ["uid-b"]}})
        );

        let opts = ListOptions::new()
            .with_clusters(["c1", "c2"])
            .with_owner_uid("uid-a", 1);
        let exprs = ListQueryCompiler::new(&gvr).expressions(&owners, &opts).unwrap();
        assert!(exprs.iter().all(|e| e.path() != OWNER_UID_PATH));
    }

    #[test]
    fn test_owner_filter_with_empty_resolution_matches_nothing() {
        let gvr = deployments();
        let opts = ListOptions::new().with_clusters(["c1"]).with_owner_uid("uid-a", 2);
        let exprs = ListQueryCompiler::new(&gvr).expressions(&[], &opts).unwrap();
        assert!(
            exprs
                .iter()
                .any(|e| e.to_clause() == json!({"terms": {OWNER_UID_PATH: []}}))
        );
    }

    #[test]
    fn test_malformed_continue_token() {
        let gvr = deployments();
        let opts = ListOptions::new().with_continue_token("next");
        let err = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap_err();
        assert!(err.is_invalid_argument());
    }

    #[test]
    fn test_order_by_emits_no_sort() {
        let gvr = deployments();
        let opts = ListOptions::new()
            .with_order_by(OrderBy::desc("created_at"))
            .with_order_by(OrderBy::asc("color"));
        let compiled = ListQueryCompiler::new(&gvr).compile(&[], &opts).unwrap();
        assert!(compiled.body().get("sort").is_none());
    }
}
