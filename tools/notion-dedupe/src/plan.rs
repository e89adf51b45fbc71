//! Pure planning: which pages need their primary flag changed.
//!
//! Planning is separated from execution; a database already in its
//! canonical state plans zero updates, which makes the whole job
//! idempotent.

use std::collections::HashMap;

use crate::notion::Page;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedUpdate {
    pub page_id: String,
    pub primary: bool,
}

#[derive(Debug)]
pub struct Plan {
    /// Distinct non-empty uids seen.
    pub examined_uids: usize,
    pub updates: Vec<PlannedUpdate>,
}

/// Group pages by uid and keep the newest row of each group as the
/// single primary. `pages` must be sorted created-time descending (the
/// query guarantees this), so the first row of a group is the newest.
pub fn plan_updates(pages: &[Page], uid_prop: &str, primary_prop: &str) -> Plan {
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<&Page>> = HashMap::new();
    for page in pages {
        let uid = page.uid(uid_prop);
        if uid.is_empty() {
            continue;
        }
        let group = groups.entry(uid.clone()).or_default();
        if group.is_empty() {
            order.push(uid);
        }
        group.push(page);
    }

    let mut updates = Vec::new();
    for uid in &order {
        let group = &groups[uid];
        if group.len() <= 1 {
            continue;
        }

        let newest = group[0];
        if !newest.is_primary(primary_prop) {
            updates.push(PlannedUpdate {
                page_id: newest.id.clone(),
                primary: true,
            });
        }
        for older in &group[1..] {
            if older.is_primary(primary_prop) {
                updates.push(PlannedUpdate {
                    page_id: older.id.clone(),
                    primary: false,
                });
            }
        }
    }

    Plan {
        examined_uids: groups.len(),
        updates,
    }
}
