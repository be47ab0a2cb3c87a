//! Core types for the persistence layer.
//!
//! This module provides the fundamental types used throughout the persistence layer:
//!
//! - [`ResourceDocument`] - The document stored for each origin object
//! - [`GroupResource`], [`GroupVersionResource`] - Resource kind identity
//! - [`ListOptions`] - Declarative list request
//! - [`LabelSelector`], [`FieldSelector`] - Selector requirements
//! - [`ListPage`] - One page of results with its continuation state
//!
//! # Examples
//!
//! ## Building a List Request
//!
//! ```
//! use kubedex_persistence::types::{LabelSelector, ListOptions};
//!
//! let opts = ListOptions::new()
//!     .with_clusters(["cluster-1"])
//!     .with_namespaces(["default", "kube-system"])
//!     .with_label_selector(LabelSelector::parse("tier=front,env notin (dev)").unwrap())
//!     .with_limit(50);
//!
//! assert_eq!(opts.namespaces.len(), 2);
//! assert_eq!(opts.label_selector.unwrap().requirements().len(), 2);
//! ```
//!
//! ## Pagination
//!
//! ```
//! use kubedex_persistence::types::{ListPage, parse_continue_token};
//!
//! let page = ListPage::from_search(vec!["a", "b"], 0, Some(2), true, 5);
//! assert_eq!(page.continue_token.as_deref(), Some("2"));
//! assert_eq!(parse_continue_token(page.continue_token.as_deref()).unwrap(), 2);
//! ```

mod list_options;
mod pagination;
mod resource;
mod selector;

pub use list_options::{FUZZY_NAME_LABEL, ListOptions, OrderBy};
pub use pagination::{DEFAULT_PAGE_SIZE, ListPage, parse_continue_token};
pub use resource::{
    CLUSTER_NAME_ANNOTATION, GroupResource, GroupVersionResource, ObjectMeta, ResourceDocument,
    stamp_cluster,
};
pub use selector::{
    FieldPath, FieldRequirement, FieldSegment, FieldSelector, LabelSelector, Requirement,
    SelectorOperator,
};
