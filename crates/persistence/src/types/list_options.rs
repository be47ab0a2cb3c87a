//! List request options.

use chrono::{DateTime, Utc};

use super::resource::GroupResource;
use super::selector::{FieldSelector, LabelSelector};

/// Extra-selector key that turns on fuzzy matching of the object name.
pub const FUZZY_NAME_LABEL: &str = "internalstorage.kubedex.io/fuzzy-name";

/// Ordering hint for list results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub desc: bool,
}

impl OrderBy {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: false,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            desc: true,
        }
    }
}

/// Declarative list request.
///
/// Every filter dimension is optional; an empty `Vec` or `None` means "no
/// constraint". Owner filtering only applies when exactly one cluster is
/// requested.
#[derive(Debug, Clone)]
pub struct ListOptions {
    pub cluster_names: Vec<String>,
    pub namespaces: Vec<String>,
    pub names: Vec<String>,

    pub label_selector: Option<LabelSelector>,
    /// Adapter pseudo-labels such as [`FUZZY_NAME_LABEL`].
    pub extra_label_selector: Option<LabelSelector>,
    pub field_selector: Option<FieldSelector>,

    /// Lower creation-time bound; only honoured together with `before`.
    pub since: Option<DateTime<Utc>>,
    /// Upper creation-time bound; only honoured together with `since`.
    pub before: Option<DateTime<Utc>>,

    pub owner_uid: Option<String>,
    pub owner_name: Option<String>,
    pub owner_group_resource: Option<GroupResource>,
    /// Number of ownership generations to walk below the owner.
    pub owner_seniority: u32,

    pub order_by: Vec<OrderBy>,

    /// Page size; `None` or 0 means "no limit" and falls back to the default page.
    pub limit: Option<u32>,
    /// Offset token returned by a previous page.
    pub continue_token: Option<String>,
    /// Whether the caller wants a continuation token back.
    pub with_continue: bool,
}

impl Default for ListOptions {
    fn default() -> Self {
        Self {
            cluster_names: Vec::new(),
            namespaces: Vec::new(),
            names: Vec::new(),
            label_selector: None,
            extra_label_selector: None,
            field_selector: None,
            since: None,
            before: None,
            owner_uid: None,
            owner_name: None,
            owner_group_resource: None,
            owner_seniority: 0,
            order_by: Vec::new(),
            limit: None,
            continue_token: None,
            with_continue: true,
        }
    }
}

impl ListOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_clusters<I, S>(mut self, clusters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cluster_names = clusters.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_namespaces<I, S>(mut self, namespaces: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_label_selector(mut self, selector: LabelSelector) -> Self {
        self.label_selector = Some(selector);
        self
    }

    pub fn with_extra_label_selector(mut self, selector: LabelSelector) -> Self {
        self.extra_label_selector = Some(selector);
        self
    }

    pub fn with_field_selector(mut self, selector: FieldSelector) -> Self {
        self.field_selector = Some(selector);
        self
    }

    pub fn with_created_between(mut self, since: DateTime<Utc>, before: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self.before = Some(before);
        self
    }

    pub fn with_owner_uid(mut self, uid: impl Into<String>, seniority: u32) -> Self {
        self.owner_uid = Some(uid.into());
        self.owner_seniority = seniority;
        self
    }

    pub fn with_owner_name(
        mut self,
        name: impl Into<String>,
        group_resource: Option<GroupResource>,
        seniority: u32,
    ) -> Self {
        self.owner_name = Some(name.into());
        self.owner_group_resource = group_resource;
        self.owner_seniority = seniority;
        self
    }

    pub fn with_order_by(mut self, order: OrderBy) -> Self {
        self.order_by.push(order);
        self
    }

    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_continue_token(mut self, token: impl Into<String>) -> Self {
        self.continue_token = Some(token.into());
        self
    }

    /// Returns the effective page size; a zero limit means "no limit".
    pub fn page_limit(&self) -> Option<u32> {
        self.limit.filter(|&limit| limit > 0)
    }

    /// Returns true when both creation-time bounds are set.
    pub fn has_time_range(&self) -> bool {
        self.since.is_some() && self.before.is_some()
    }

    /// Returns the single requested cluster when owner filtering applies.
    pub fn owner_scope(&self) -> Option<&str> {
        let has_owner = self.owner_uid.as_deref().is_some_and(|s| !s.is_empty())
            || self.owner_name.as_deref().is_some_and(|s| !s.is_empty());
        match self.cluster_names.as_slice() {
            [cluster] if has_owner => Some(cluster.as_str()),
            _ => None,
        }
    }
}
