//! Catalog records for portal and geodatabase inventories.
//!
//! These are the flat objects the report builders walk: portal users, groups
//! and items fetched over REST, plus relationship classes and attribute
//! domains read from a staging store's catalog side tables. They live only
//! for the duration of a report run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A portal member account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalUser {
    /// Login name.
    pub username: String,

    /// Display name.
    pub full_name: String,

    /// Contact email, when the account carries one.
    pub email: Option<String>,

    /// Portal role (administrator, publisher, user, or a custom role id).
    pub role: String,

    /// Last successful login, when the account has ever logged in.
    pub last_login: Option<DateTime<Utc>>,

    /// Whether the account is disabled.
    pub disabled: bool,
}

/// A portal group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalGroup {
    /// Group id.
    pub id: String,

    /// Group title.
    pub title: String,

    /// Owning username.
    pub owner: String,

    /// Member count as reported by the portal.
    pub member_count: u64,
}

/// A portal content item (web map, layer, app, ...).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalItem {
    /// Item id.
    pub id: String,

    /// Item title.
    pub title: String,

    /// Item type string.
    pub item_type: String,

    /// Owning username.
    pub owner: String,

    /// Service or app URL, for items that have one.
    pub url: Option<String>,

    /// Lifetime view count.
    pub num_views: u64,
}

/// A geodatabase relationship class.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationshipClass {
    /// Relationship class name.
    pub name: String,

    /// Origin table.
    pub origin: String,

    /// Destination table.
    pub destination: String,

    /// Cardinality (one-to-one, one-to-many, many-to-many).
    pub cardinality: String,

    /// Whether the relationship carries its own attributes.
    pub is_attributed: bool,

    /// Label reading origin -> destination.
    pub forward_label: String,

    /// Label reading destination -> origin.
    pub backward_label: String,
}

/// A geodatabase attribute domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDomain {
    /// Domain name.
    pub name: String,

    /// Field type the domain constrains.
    pub field_type: String,

    /// Domain kind (coded value or range).
    pub domain_type: String,

    /// Free-text description, when the author wrote one.
    pub description: Option<String>,
}

/// One field's use of a domain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainUsage {
    /// Dataset (feature class or table) name.
    pub dataset: String,

    /// Field name.
    pub field: String,

    /// Domain name the field references.
    pub domain: String,
}

/// Domains no field references, sorted by name.
///
/// Orphans accumulate as layers are dropped over the years; the domains
/// inventory flags them for cleanup.
#[must_use]
pub fn orphan_domains(domains: &[AttributeDomain], usage: &[DomainUsage]) -> Vec<AttributeDomain> {
    let used: BTreeSet<&str> = usage.iter().map(|u| u.domain.as_str()).collect();
    let mut orphans: Vec<AttributeDomain> = domains
        .iter()
        .filter(|d| !used.contains(d.name.as_str()))
        .cloned()
        .collect();
    orphans.sort_by(|a, b| a.name.cmp(&b.name));
    orphans
}
