//! Inventory report building and export.
//!
//! A report is a [`Workbook`] of named sheets built from catalog objects by
//! an attribute extractor. Extraction runs object by object: a missing
//! optional attribute renders as the configured sentinel (`N/A` by default)
//! and an object whose extraction fails is logged and skipped, so one bad
//! record never sinks the report. Writing the workbook out is the opposite:
//! any export error aborts, a half-written report is worse than none.
//!
//! Workbooks export as a date-stamped directory of CSV files, one per
//! sheet, and render as fixed-width text for console preview.

use crate::catalog::{
    orphan_domains, AttributeDomain, DomainUsage, PortalGroup, PortalItem, PortalUser,
    RelationshipClass,
};
use crate::error::Result;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Widths wider than this stop growing during auto-fit.
const MAX_COL_WIDTH: usize = 80;

/// One worksheet: a header row plus data rows, with auto-fitted widths.
#[derive(Debug, Clone)]
pub struct Sheet {
    pub name: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// Counted in chars, the unit format padding uses, not bytes.
    col_widths: Vec<usize>,
}

impl Sheet {
    pub fn new(name: impl Into<String>, headers: &[&str]) -> Self {
        Self {
            name: name.into(),
            headers: headers.iter().map(|h| (*h).to_string()).collect(),
            rows: Vec::new(),
            col_widths: headers
                .iter()
                .map(|h| h.chars().count().min(MAX_COL_WIDTH))
                .collect(),
        }
    }

    /// Append a row, growing column widths to fit.
    pub fn push_row(&mut self, row: Vec<String>) {
        for (i, cell) in row.iter().enumerate() {
            if i < self.col_widths.len() {
                self.col_widths[i] = self.col_widths[i]
                    .max(cell.chars().count())
                    .min(MAX_COL_WIDTH);
            }
        }
        self.rows.push(row);
    }

    #[must_use]
    pub fn col_widths(&self) -> &[usize] {
        &self.col_widths
    }
}

/// An ordered collection of sheets with a title and creation stamp.
#[derive(Debug, Clone)]
pub struct Workbook {
    pub title: String,
    pub created_at: DateTime<Utc>,
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            created_at: Utc::now(),
            sheets: Vec::new(),
        }
    }

    pub fn add_sheet(&mut self, sheet: Sheet) {
        self.sheets.push(sheet);
    }

    /// Write the workbook as a date-stamped directory of CSV files.
    ///
    /// The directory is `<out_dir>/<title>_<YYYYMMDD_HHMMSS>/` with one
    /// `NN_<sheet>.csv` per sheet. Any I/O or encoding error aborts the
    /// export.
    pub fn write_csv(&self, out_dir: &Path) -> Result<PathBuf> {
        let dir = out_dir.join(format!(
            "{}_{}",
            sanitize_name(&self.title),
            self.created_at.format("%Y%m%d_%H%M%S")
        ));
        std::fs::create_dir_all(&dir)?;

        for (i, sheet) in self.sheets.iter().enumerate() {
            let file = dir.join(format!("{:02}_{}.csv", i + 1, sanitize_name(&sheet.name)));
            debug!("writing sheet '{}' to {:?}", sheet.name, file);
            let mut writer = csv::WriterBuilder::new().from_path(&file)?;
            writer.write_record(&sheet.headers)?;
            for row in &sheet.rows {
                writer.write_record(row)?;
            }
            writer.flush()?;
        }
        Ok(dir)
    }

    /// Render every sheet as a fixed-width text table.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for sheet in &self.sheets {
            let _ = writeln!(out, "== {} ==", sheet.name);
            let widths = &sheet.col_widths;
            let header: Vec<String> = sheet
                .headers
                .iter()
                .zip(widths)
                .map(|(h, w)| format!("{:<1$}", clip(h, *w), *w))
                .collect();
            let _ = writeln!(out, "{}", header.join("  ").trim_end());
            let rule: Vec<String> = widths.iter().map(|w| "-".repeat(*w)).collect();
            let _ = writeln!(out, "{}", rule.join("  "));
            for row in &sheet.rows {
                let cells: Vec<String> = row
                    .iter()
                    .zip(widths)
                    .map(|(c, w)| format!("{:<1$}", clip(c, *w), *w))
                    .collect();
                let _ = writeln!(out, "{}", cells.join("  ").trim_end());
            }
            out.push('\n');
        }
        out
    }
}

/// Build one sheet from catalog objects.
///
/// The extractor returns one optional value per header; `None` renders as
/// the sentinel. An object whose extraction errors is logged and skipped,
/// the rest of the sheet still builds.
pub fn build_sheet<T, F>(
    name: &str,
    headers: &[&str],
    objects: &[T],
    sentinel: &str,
    extractor: F,
) -> Sheet
where
    F: Fn(&T) -> Result<Vec<Option<String>>>,
{
    let mut sheet = Sheet::new(name, headers);
    for (i, object) in objects.iter().enumerate() {
        match extractor(object) {
            Ok(values) => {
                let row = values
                    .into_iter()
                    .map(|v| v.unwrap_or_else(|| sentinel.to_string()))
                    .collect();
                sheet.push_row(row);
            }
            Err(e) => {
                warn!("sheet '{}': skipping object {}: {}", name, i, e);
            }
        }
    }
    sheet
}

/// Portal user inventory.
pub fn users_workbook(users: &[PortalUser], sentinel: &str) -> Workbook {
    let mut wb = Workbook::new("portal_users");
    wb.add_sheet(build_sheet(
        "Users",
        &[
            "username",
            "full_name",
            "email",
            "role",
            "last_login",
            "disabled",
        ],
        users,
        sentinel,
        |u| {
            Ok(vec![
                Some(u.username.clone()),
                Some(u.full_name.clone()),
                u.email.clone(),
                Some(u.role.clone()),
                u.last_login.map(|t| t.format("%Y-%m-%d %H:%M").to_string()),
                Some(u.disabled.to_string()),
            ])
        },
    ));
    wb
}

/// Portal group inventory: an overview sheet plus one membership sheet per
/// group. A group with no members still gets its sheet.
pub fn groups_workbook(
    groups: &[PortalGroup],
    members: &BTreeMap<String, Vec<String>>,
    sentinel: &str,
) -> Workbook {
    let mut wb = Workbook::new("portal_groups");
    wb.add_sheet(build_sheet(
        "Overview",
        &["id", "title", "owner", "member_count"],
        groups,
        sentinel,
        |g| {
            Ok(vec![
                Some(g.id.clone()),
                Some(g.title.clone()),
                Some(g.owner.clone()),
                Some(g.member_count.to_string()),
            ])
        },
    ));

    for group in groups {
        let mut sheet = Sheet::new(group.title.clone(), &["member"]);
        if let Some(names) = members.get(&group.id) {
            for name in names {
                sheet.push_row(vec![name.clone()]);
            }
        }
        wb.add_sheet(sheet);
    }
    wb
}

/// Portal item inventory.
pub fn items_workbook(items: &[PortalItem], sentinel: &str) -> Workbook {
    let mut wb = Workbook::new("portal_items");
    wb.add_sheet(build_sheet(
        "Items",
        &["id", "title", "type", "owner", "url", "views"],
        items,
        sentinel,
        |it| {
            Ok(vec![
                Some(it.id.clone()),
                Some(it.title.clone()),
                Some(it.item_type.clone()),
                Some(it.owner.clone()),
                it.url.clone(),
                Some(it.num_views.to_string()),
            ])
        },
    ));
    wb
}

/// Relationship class inventory for one tier.
pub fn relationship_classes_workbook(
    classes: &[RelationshipClass],
    sentinel: &str,
) -> Workbook {
    let mut wb = Workbook::new("relationship_classes");
    wb.add_sheet(build_sheet(
        "Relationship Classes",
        &[
            "name",
            "origin",
            "destination",
            "cardinality",
            "attributed",
            "forward_label",
            "backward_label",
        ],
        classes,
        sentinel,
        |rc| {
            Ok(vec![
                Some(rc.name.clone()),
                Some(rc.origin.clone()),
                Some(rc.destination.clone()),
                Some(rc.cardinality.clone()),
                Some(rc.is_attributed.to_string()),
                Some(rc.forward_label.clone()),
                Some(rc.backward_label.clone()),
            ])
        },
    ));
    wb
}

/// Attribute domain inventory: all domains, where they are used, and the
/// orphans no field references.
pub fn domains_workbook(
    domains: &[AttributeDomain],
    usage: &[DomainUsage],
    sentinel: &str,
) -> Workbook {
    let mut wb = Workbook::new("attribute_domains");
    wb.add_sheet(build_sheet(
        "Domains",
        &["name", "field_type", "domain_type", "description"],
        domains,
        sentinel,
        |d| {
            Ok(vec![
                Some(d.name.clone()),
                Some(d.field_type.clone()),
                Some(d.domain_type.clone()),
                d.description.clone(),
            ])
        },
    ));
    wb.add_sheet(build_sheet(
        "Domain Usage",
        &["dataset", "field", "domain"],
        usage,
        sentinel,
        |u| {
            Ok(vec![
                Some(u.dataset.clone()),
                Some(u.field.clone()),
                Some(u.domain.clone()),
            ])
        },
    ));

    let orphans = orphan_domains(domains, usage);
    wb.add_sheet(build_sheet(
        "Orphan Domains",
        &["name", "domain_type"],
        &orphans,
        sentinel,
        |d| Ok(vec![Some(d.name.clone()), Some(d.domain_type.clone())]),
    ));
    wb
}

/// Make a title or sheet name safe for a file name.
fn sanitize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() || c == '-' {
            out.push(c.to_ascii_lowercase());
        } else if !out.ends_with('_') {
            out.push('_');
        }
    }
    out.trim_matches('_').to_string()
}

fn clip(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        s.to_string()
    } else {
        s.chars().take(width).collect()
    }
}
