//! Web portal REST client.
//!
//! Synchronous client for the county's portal and its hosting server admin
//! API: token-based sign-in, content inventory (users, groups, items), item
//! cloning with dependency discovery, and service restarts.
//!
//! The portal reports failures in-band: an HTTP 200 whose body is
//! `{"error": {"code": ..., "message": ...}}`. Every response goes through
//! the same envelope check before being parsed into its real shape.

use crate::catalog::{PortalGroup, PortalItem, PortalUser};
use crate::config::PortalConfig;
use crate::error::{Result, SpreadError};
use crate::store::acquire_lock;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info};

/// Results fetched per page from paged endpoints.
const PAGE_SIZE: i64 = 100;

/// Minutes of validity requested for each token.
const TOKEN_LIFETIME_MINUTES: i64 = 60;

/// Seconds before expiry at which a cached token is refreshed.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// One dependency edge of a portal item.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemDependency {
    pub dependency_type: String,
    #[serde(default)]
    pub id: Option<String>,
}

/// One service hosted on the server the portal federates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInfo {
    pub service_name: String,
    #[serde(rename = "type")]
    pub service_type: String,
    #[serde(default)]
    pub folder_name: Option<String>,
}

impl ServiceInfo {
    /// Admin path of the service, `Folder/Name.Type` or `Name.Type`.
    #[must_use]
    pub fn path(&self) -> String {
        match &self.folder_name {
            Some(folder) => format!("{}/{}.{}", folder, self.service_name, self.service_type),
            None => format!("{}.{}", self.service_name, self.service_type),
        }
    }
}

struct CachedToken {
    value: String,
    expires_at: DateTime<Utc>,
}

/// Portal REST client.
pub struct PortalClient {
    base_url: String,
    admin_url: Option<String>,
    username: String,
    password: String,
    client: reqwest::blocking::Client,
    token: Mutex<Option<CachedToken>>,
}

impl PortalClient {
    /// Build a client from configuration, resolving the password.
    pub fn new(config: &PortalConfig) -> Result<Self> {
        let password = config.resolve_password()?;
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .build()?;

        Ok(Self {
            base_url: config.url.trim_end_matches('/').to_string(),
            admin_url: config
                .admin_url
                .as_ref()
                .map(|u| u.trim_end_matches('/').to_string()),
            username: config.username.clone(),
            password,
            client,
            token: Mutex::new(None),
        })
    }

    /// Anonymous reachability probe. Returns the portal's version string.
    pub fn ping(&self) -> Result<String> {
        let response = self
            .client
            .get(self.rest_url(""))
            .query(&[("f", "json")])
            .send()?;
        let info: serde_json::Value = parse_portal_json(response)?;
        let version = info
            .get("currentVersion")
            .map(json_to_display)
            .unwrap_or_else(|| "unknown".to_string());
        Ok(version)
    }

    /// List every portal user.
    pub fn list_users(&self) -> Result<Vec<PortalUser>> {
        let mut users = Vec::new();
        let mut start: i64 = 1;
        loop {
            let start_s = start.to_string();
            let num_s = PAGE_SIZE.to_string();
            let page: UserPage = self.get_json(
                "portals/self/users",
                &[("start", &start_s), ("num", &num_s)],
            )?;
            let empty = page.users.is_empty();
            users.extend(page.users.into_iter().map(PortalUser::from));
            match next_page_start(start, page.next_start, empty) {
                Some(next) => start = next,
                None => break,
            }
        }
        info!("Listed {} portal users", users.len());
        Ok(users)
    }

    /// List every group visible to the signed-in account.
    ///
    /// `member_count` is zero here; fill it from [`Self::group_members`].
    pub fn list_groups(&self) -> Result<Vec<PortalGroup>> {
        let mut groups = Vec::new();
        let mut start: i64 = 1;
        loop {
            let start_s = start.to_string();
            let num_s = PAGE_SIZE.to_string();
            let page: GroupPage = self.get_json(
                "community/groups",
                &[("q", "*"), ("start", &start_s), ("num", &num_s)],
            )?;
            let empty = page.results.is_empty();
            groups.extend(page.results.into_iter().map(PortalGroup::from));
            match next_page_start(start, page.next_start, empty) {
                Some(next) => start = next,
                None => break,
            }
        }
        info!("Listed {} portal groups", groups.len());
        Ok(groups)
    }

    /// Usernames belonging to a group: admins first, then members.
    pub fn group_members(&self, group_id: &str) -> Result<Vec<String>> {
        let page: GroupUsers =
            self.get_json(&format!("community/groups/{}/users", group_id), &[])?;
        Ok(merge_members(page.admins, page.users))
    }

    /// Search portal items. `query` uses the portal's search syntax.
    pub fn search_items(&self, query: &str) -> Result<Vec<PortalItem>> {
        let mut items = Vec::new();
        let mut start: i64 = 1;
        loop {
            let start_s = start.to_string();
            let num_s = PAGE_SIZE.to_string();
            let page: SearchPage = self.get_json(
                "search",
                &[("q", query), ("start", &start_s), ("num", &num_s)],
            )?;
            let empty = page.results.is_empty();
            items.extend(page.results.into_iter().map(PortalItem::from));
            match next_page_start(start, page.next_start, empty) {
                Some(next) => start = next,
                None => break,
            }
        }
        info!("Search '{}' matched {} items", query, items.len());
        Ok(items)
    }

    /// Items the given item depends on (layers behind a map, maps behind an
    /// app, ...).
    pub fn item_dependencies(&self, item_id: &str) -> Result<Vec<ItemDependency>> {
        let page: DependencyList =
            self.get_json(&format!("content/items/{}/dependencies", item_id), &[])?;
        Ok(page.list)
    }

    /// Copy an item into the signed-in account, carrying its description
    /// and data payload. Returns the new item id.
    pub fn clone_item(&self, item_id: &str, folder: Option<&str>) -> Result<String> {
        let desc: serde_json::Value =
            self.get_json(&format!("content/items/{}", item_id), &[])?;

        let item_type = desc
            .get("type")
            .and_then(|t| t.as_str())
            .ok_or_else(|| {
                SpreadError::portal_api(0, format!("item {} has no type", item_id))
            })?
            .to_string();
        let title = desc
            .get("title")
            .and_then(|t| t.as_str())
            .unwrap_or(item_id)
            .to_string();
        let tags = desc
            .get("tags")
            .and_then(|t| t.as_array())
            .map(|arr| {
                arr.iter()
                    .filter_map(|v| v.as_str())
                    .collect::<Vec<_>>()
                    .join(",")
            })
            .unwrap_or_default();
        let snippet = desc
            .get("snippet")
            .and_then(|s| s.as_str())
            .unwrap_or_default()
            .to_string();
        let url = desc
            .get("url")
            .and_then(|u| u.as_str())
            .unwrap_or_default()
            .to_string();

        // Not every item carries a data resource; a portal error here means
        // "none", not a failed clone.
        let data = match self.get_text(&format!("content/items/{}/data", item_id)) {
            Ok(text) => Some(text),
            Err(SpreadError::PortalApi { .. }) => None,
            Err(e) => return Err(e),
        };

        let path = match folder {
            Some(folder) => format!("content/users/{}/{}/addItem", self.username, folder),
            None => format!("content/users/{}/addItem", self.username),
        };

        let mut form: Vec<(&str, String)> = vec![
            ("title", title.clone()),
            ("type", item_type),
            ("tags", tags),
            ("snippet", snippet),
        ];
        if !url.is_empty() {
            form.push(("url", url));
        }
        if let Some(text) = data {
            form.push(("text", text));
        }

        let added: AddItemResponse = self.post_form(&path, &form)?;
        if !added.success {
            return Err(SpreadError::portal_api(
                0,
                format!("addItem for '{}' reported failure", title),
            ));
        }
        info!("Cloned item {} -> {}", item_id, added.id);
        Ok(added.id)
    }

    /// List services on the federated server, root folder and subfolders.
    pub fn list_services(&self) -> Result<Vec<ServiceInfo>> {
        let root: ServicesPage = self.get_admin_json("services", &[])?;
        let mut services = root.services;
        for folder in &root.folders {
            let page: ServicesPage =
                self.get_admin_json(&format!("services/{}", folder), &[])?;
            services.extend(page.services.into_iter().map(|mut s| {
                s.folder_name.get_or_insert_with(|| folder.clone());
                s
            }));
        }
        Ok(services)
    }

    /// Stop then start one service. `service` is its admin path, for example
    /// `Roads.MapServer` or `Public/Trails.FeatureServer`.
    pub fn restart_service(&self, service: &str) -> Result<()> {
        info!("Restarting service {}", service);
        self.service_action(service, "stop")?;
        self.service_action(service, "start")?;
        Ok(())
    }

    fn service_action(&self, service: &str, action: &str) -> Result<()> {
        let path = format!("services/{}/{}", service, action);
        let status: StatusResponse = self.post_admin_form(&path, &[])?;
        if !status.status.eq_ignore_ascii_case("success") {
            return Err(SpreadError::portal_api(
                0,
                format!("{} of service {} returned '{}'", action, service, status.status),
            ));
        }
        debug!("service {} {} ok", service, action);
        Ok(())
    }

    /// Get a token for the configured account, reusing a cached one until
    /// shortly before it expires.
    fn token(&self) -> Result<String> {
        let mut guard = acquire_lock(&self.token);
        if let Some(tok) = guard.as_ref() {
            let margin = ChronoDuration::seconds(TOKEN_REFRESH_MARGIN_SECS);
            if tok.expires_at - margin > Utc::now() {
                return Ok(tok.value.clone());
            }
        }

        debug!("requesting portal token for {}", self.username);
        let expiration = TOKEN_LIFETIME_MINUTES.to_string();
        let response = self
            .client
            .post(self.rest_url("generateToken"))
            .form(&[
                ("username", self.username.as_str()),
                ("password", self.password.as_str()),
                ("client", "referer"),
                ("referer", self.base_url.as_str()),
                ("expiration", expiration.as_str()),
                ("f", "json"),
            ])
            .send()?;
        let parsed: TokenResponse = parse_portal_json(response)?;

        let expires_at = DateTime::from_timestamp_millis(parsed.expires).unwrap_or_else(|| {
            Utc::now() + ChronoDuration::minutes(TOKEN_LIFETIME_MINUTES)
        });
        let value = parsed.token.clone();
        *guard = Some(CachedToken {
            value: parsed.token,
            expires_at,
        });
        Ok(value)
    }

    fn rest_url(&self, path: &str) -> String {
        if path.is_empty() {
            format!("{}/sharing/rest", self.base_url)
        } else {
            format!("{}/sharing/rest/{}", self.base_url, path)
        }
    }

    fn admin_base(&self) -> Result<&str> {
        self.admin_url.as_deref().ok_or_else(|| {
            SpreadError::Config(
                "portal admin_url is required for service operations".to_string(),
            )
        })
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let token = self.token()?;
        let mut query: Vec<(&str, &str)> = vec![("f", "json"), ("token", &token)];
        query.extend_from_slice(params);
        let response = self.client.get(self.rest_url(path)).query(&query).send()?;
        parse_portal_json(response)
    }

    fn get_text(&self, path: &str) -> Result<String> {
        let token = self.token()?;
        let response = self
            .client
            .get(self.rest_url(path))
            .query(&[("f", "json"), ("token", token.as_str())])
            .send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(SpreadError::portal_api(
                i64::from(status.as_u16()),
                format!("HTTP {}: {}", status, clip_body(&body)),
            ));
        }
        reject_error_envelope(&body)?;
        Ok(body)
    }

    fn post_form<T: DeserializeOwned>(&self, path: &str, form: &[(&str, String)]) -> Result<T> {
        let token = self.token()?;
        let mut fields: Vec<(&str, String)> = vec![("f", "json".to_string()), ("token", token)];
        fields.extend(form.iter().map(|(k, v)| (*k, v.clone())));
        let response = self
            .client
            .post(self.rest_url(path))
            .form(&fields)
            .send()?;
        parse_portal_json(response)
    }

    fn get_admin_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T> {
        let base = self.admin_base()?.to_string();
        let token = self.token()?;
        let mut query: Vec<(&str, &str)> = vec![("f", "json"), ("token", &token)];
        query.extend_from_slice(params);
        let response = self
            .client
            .get(format!("{}/{}", base, path))
            .query(&query)
            .send()?;
        parse_portal_json(response)
    }

    fn post_admin_form<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, String)],
    ) -> Result<T> {
        let base = self.admin_base()?.to_string();
        let token = self.token()?;
        let mut fields: Vec<(&str, String)> = vec![("f", "json".to_string()), ("token", token)];
        fields.extend(form.iter().map(|(k, v)| (*k, v.clone())));
        let response = self
            .client
            .post(format!("{}/{}", base, path))
            .form(&fields)
            .send()?;
        parse_portal_json(response)
    }
}

/// Check HTTP status, then the in-band error envelope, then parse.
fn parse_portal_json<T: DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status();
    let body = response.text()?;
    if !status.is_success() {
        return Err(SpreadError::portal_api(
            i64::from(status.as_u16()),
            format!("HTTP {}: {}", status, clip_body(&body)),
        ));
    }
    parse_portal_body(&body)
}

fn parse_portal_body<T: DeserializeOwned>(body: &str) -> Result<T> {
    let value: serde_json::Value = serde_json::from_str(body)?;
    if let Some(err) = envelope_error(&value) {
        return Err(err);
    }
    Ok(serde_json::from_value(value)?)
}

fn envelope_error(value: &serde_json::Value) -> Option<SpreadError> {
    let envelope = value.get("error")?;
    let code = envelope.get("code").and_then(|c| c.as_i64()).unwrap_or(0);
    let message = envelope
        .get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("unknown portal error")
        .to_string();
    Some(SpreadError::PortalApi { code, message })
}

/// A non-JSON body passes; the data resource of an item can be anything.
fn reject_error_envelope(body: &str) -> Result<()> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        if let Some(err) = envelope_error(&value) {
            return Err(err);
        }
    }
    Ok(())
}

/// Where the next page starts, or `None` when paging is done. A server that
/// echoes a `nextStart` at or before the current one would page forever;
/// that counts as done too.
fn next_page_start(start: i64, next_start: i64, empty: bool) -> Option<i64> {
    if empty || next_start <= start {
        None
    } else {
        Some(next_start)
    }
}

/// Combine a group's admin and member lists, admins first, no duplicates.
fn merge_members(admins: Vec<String>, users: Vec<String>) -> Vec<String> {
    let mut members = admins;
    for user in users {
        if !members.contains(&user) {
            members.push(user);
        }
    }
    members
}

fn clip_body(body: &str) -> String {
    if body.len() > 200 {
        body.chars().take(200).collect()
    } else {
        body.to_string()
    }
}

fn json_to_display(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    token: String,
    expires: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UserPage {
    #[serde(default)]
    users: Vec<WireUser>,
    #[serde(default = "default_next_start")]
    next_start: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireUser {
    username: String,
    #[serde(default)]
    full_name: String,
    #[serde(default)]
    email: Option<String>,
    #[serde(default)]
    role: String,
    /// Epoch milliseconds; the portal sends -1 for "never".
    #[serde(default = "default_last_login")]
    last_login: i64,
    #[serde(default)]
    disabled: bool,
}

impl From<WireUser> for PortalUser {
    fn from(u: WireUser) -> Self {
        PortalUser {
            username: u.username,
            full_name: u.full_name,
            email: u.email,
            role: u.role,
            last_login: (u.last_login > 0)
                .then(|| DateTime::from_timestamp_millis(u.last_login))
                .flatten(),
            disabled: u.disabled,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroupPage {
    #[serde(default)]
    results: Vec<WireGroup>,
    #[serde(default = "default_next_start")]
    next_start: i64,
}

#[derive(Debug, Deserialize)]
struct WireGroup {
    id: String,
    title: String,
    owner: String,
}

impl From<WireGroup> for PortalGroup {
    fn from(g: WireGroup) -> Self {
        PortalGroup {
            id: g.id,
            title: g.title,
            owner: g.owner,
            member_count: 0,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GroupUsers {
    #[serde(default)]
    admins: Vec<String>,
    #[serde(default)]
    users: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchPage {
    #[serde(default)]
    results: Vec<WireItem>,
    #[serde(default = "default_next_start")]
    next_start: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireItem {
    id: String,
    #[serde(default)]
    title: String,
    #[serde(rename = "type")]
    item_type: String,
    #[serde(default)]
    owner: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    num_views: u64,
}

impl From<WireItem> for PortalItem {
    fn from(it: WireItem) -> Self {
        PortalItem {
            id: it.id,
            title: it.title,
            item_type: it.item_type,
            owner: it.owner,
            url: it.url,
            num_views: it.num_views,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DependencyList {
    #[serde(default)]
    list: Vec<ItemDependency>,
}

#[derive(Debug, Deserialize)]
struct AddItemResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    id: String,
}

#[derive(Debug, Deserialize)]
struct ServicesPage {
    #[serde(default)]
    services: Vec<ServiceInfo>,
    #[serde(default)]
    folders: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    #[serde(default)]
    status: String,
}

fn default_next_start() -> i64 {
    -1
}

fn default_last_login() -> i64 {
    -1
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> PortalClient {
        let config = PortalConfig {
            url: "https://maps.example.gov/portal/".to_string(),
            username: "gis_admin".to_string(),
            password: Some("secret".to_string()),
            password_env: None,
            admin_url: Some("https://maps.example.gov/server/admin".to_string()),
            timeout_secs: 30,
        };
        PortalClient::new(&config).unwrap()
    }

    #[test]
    fn test_rest_url_strips_trailing_slash() {
        let c = client();
        assert_eq!(
            c.rest_url("portals/self/users"),
            "https://maps.example.gov/portal/sharing/rest/portals/self/users"
        );
        assert_eq!(c.rest_url(""), "https://maps.example.gov/portal/sharing/rest");
    }

    #[test]
    fn test_error_envelope_is_rejected() {
        let body = r#"{"error": {"code": 498, "message": "Invalid token.", "details": []}}"#;
        let err = parse_portal_body::<serde_json::Value>(body).unwrap_err();
        match err {
            SpreadError::PortalApi { code, message } => {
                assert_eq!(code, 498);
                assert_eq!(message, "Invalid token.");
            }
            other => panic!("expected portal api error, got {:?}", other),
        }
    }

    #[test]
    fn test_user_page_parses_and_converts() {
        let body = r#"{
            "total": 2,
            "start": 1,
            "nextStart": -1,
            "users": [
                {"username": "alice", "fullName": "Alice Jones", "email": "alice@example.gov",
                 "role": "org_admin", "lastLogin": 1714060800000, "disabled": false},
                {"username": "svc_viewer", "fullName": "Viewer Account",
                 "role": "org_user", "lastLogin": -1, "disabled": true}
            ]
        }"#;
        let page: UserPage = parse_portal_body(body).unwrap();
        assert_eq!(page.next_start, -1);

        let users: Vec<PortalUser> = page.users.into_iter().map(PortalUser::from).collect();
        assert_eq!(users[0].email.as_deref(), Some("alice@example.gov"));
        assert!(users[0].last_login.is_some());
        // Never signed in, no email: the sentinel cases for the report.
        assert!(users[1].email.is_none());
        assert!(users[1].last_login.is_none());
        assert!(users[1].disabled);
    }

    #[test]
    fn test_search_page_parses_items() {
        let body = r#"{
            "nextStart": 101,
            "results": [
                {"id": "abc123", "title": "Trail Map", "type": "Web Map",
                 "owner": "gis_admin", "numViews": 42}
            ]
        }"#;
        let page: SearchPage = parse_portal_body(body).unwrap();
        assert_eq!(page.next_start, 101);
        let item = PortalItem::from(page.results.into_iter().next().unwrap());
        assert_eq!(item.item_type, "Web Map");
        assert_eq!(item.num_views, 42);
        assert!(item.url.is_none());
    }

    #[test]
    fn test_dependency_list_parses() {
        let body = r#"{"total": 1, "list": [{"dependencyType": "id", "id": "def456"}]}"#;
        let deps: DependencyList = parse_portal_body(body).unwrap();
        assert_eq!(deps.list.len(), 1);
        assert_eq!(deps.list[0].id.as_deref(), Some("def456"));
    }

    #[test]
    fn test_service_path_with_and_without_folder() {
        let root = ServiceInfo {
            service_name: "Roads".to_string(),
            service_type: "MapServer".to_string(),
            folder_name: None,
        };
        assert_eq!(root.path(), "Roads.MapServer");

        let foldered = ServiceInfo {
            service_name: "Trails".to_string(),
            service_type: "FeatureServer".to_string(),
            folder_name: Some("Public".to_string()),
        };
        assert_eq!(foldered.path(), "Public/Trails.FeatureServer");
    }

    #[test]
    fn test_services_page_parses() {
        let body = r#"{
            "folders": ["Public", "System"],
            "services": [{"serviceName": "Roads", "type": "MapServer"}]
        }"#;
        let page: ServicesPage = parse_portal_body(body).unwrap();
        assert_eq!(page.folders, vec!["Public", "System"]);
        assert_eq!(page.services[0].service_name, "Roads");
    }

    #[test]
    fn test_add_item_response() {
        let ok: AddItemResponse =
            parse_portal_body(r#"{"success": true, "id": "new789"}"#).unwrap();
        assert!(ok.success);
        assert_eq!(ok.id, "new789");
    }

    #[test]
    fn test_next_page_start_requires_forward_progress() {
        assert_eq!(next_page_start(1, 101, false), Some(101));
        // The portal signals the last page with nextStart -1.
        assert_eq!(next_page_start(101, -1, false), None);
        // A server stuck echoing the same page must not loop.
        assert_eq!(next_page_start(101, 101, false), None);
        assert_eq!(next_page_start(101, 51, false), None);
        // An empty page ends paging whatever nextStart claims.
        assert_eq!(next_page_start(1, 101, true), None);
    }

    #[test]
    fn test_group_users_combines_without_duplicates() {
        let body = r#"{"owner": "gis_admin", "admins": ["gis_admin"], "users": ["alice", "gis_admin"]}"#;
        let parsed: GroupUsers = parse_portal_body(body).unwrap();
        let members = merge_members(parsed.admins, parsed.users);
        assert_eq!(members, vec!["gis_admin", "alice"]);
    }

    #[test]
    fn test_http_error_body_is_clipped() {
        let long = "x".repeat(500);
        assert_eq!(clip_body(&long).len(), 200);
        assert_eq!(clip_body("short"), "short");
    }
}
