//! Deduplication and field-merge engine.
//!
//! Records representing the same person arrive under different identifiers,
//! so merging runs twice: once grouping by full name, then grouping the
//! result by resolved email. Each pass keeps the most recent record of a
//! group as the survivor, backfills its empty fields from older members, and
//! unions the multi-valued industry field.
//!
//! The pass order (name first, then email) and the 7-field backfill list are
//! canonical; swapping either changes results.

use crate::error::{MergeError, MergeResult};
use crate::models::contact::{is_blank, ContactRecord};
use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Merge duplicate contact records into one canonical record per identity.
///
/// Runs the full-name pass, then the email pass. Records with an unparsable
/// create date abort the stage: recency ordering depends on every date being
/// comparable, and silently dropping a record would break completeness.
pub fn merge_duplicates(records: Vec<ContactRecord>) -> MergeResult<Vec<ContactRecord>> {
    let records = merge_by_key(records, full_name_key)?;
    merge_by_key(records, email_key)
}

/// Identity key for the full-name pass.
///
/// Both names absent yields the empty-string key, which collapses all
/// unnamed records into one group. Accepted upstream quirk.
pub fn full_name_key(record: &ContactRecord) -> Option<String> {
    Some(record.full_name_key())
}

/// Identity key for the email pass.
///
/// Records without a resolved email return `None` and are never merged with
/// each other.
pub fn email_key(record: &ContactRecord) -> Option<String> {
    record.email.clone().filter(|email| !email.is_empty())
}

/// Grouping key: shared keys merge, `None` keys isolate by position.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum GroupKey {
    Shared(String),
    Singleton(usize),
}

/// One merge pass over `records` grouped by `key_fn`.
///
/// Records are stably sorted by create date descending, grouped in order of
/// first appearance after the sort, and each group is collapsed into its
/// most recent member with older members backfilling empty fields. Survivors
/// come back in first-appearance order, not re-sorted.
pub fn merge_by_key<F>(records: Vec<ContactRecord>, key_fn: F) -> MergeResult<Vec<ContactRecord>>
where
    F: Fn(&ContactRecord) -> Option<String>,
{
    let mut dated = records
        .into_iter()
        .map(|record| Ok((sort_date(&record)?, record)))
        .collect::<MergeResult<Vec<(NaiveDate, ContactRecord)>>>()?;

    // Stable: original relative order is the tie-break among equal dates
    dated.sort_by(|a, b| b.0.cmp(&a.0));

    let mut order: Vec<GroupKey> = Vec::new();
    let mut groups: HashMap<GroupKey, Vec<ContactRecord>> = HashMap::new();

    for (index, (_, record)) in dated.into_iter().enumerate() {
        let key = match key_fn(&record) {
            Some(key) => GroupKey::Shared(key),
            None => GroupKey::Singleton(index),
        };
        if !groups.contains_key(&key) {
            order.push(key.clone());
        }
        groups.entry(key).or_default().push(record);
    }

    Ok(order
        .into_iter()
        .filter_map(|key| groups.remove(&key))
        .map(merge_group)
        .collect())
}

/// Sort key for a record's create date.
///
/// An absent date sorts as 1900-01-01; the sentinel never leaks into the
/// record itself. A present but unparsable date is a fatal input error.
fn sort_date(record: &ContactRecord) -> MergeResult<NaiveDate> {
    match record.create_date.as_deref() {
        None | Some("") => Ok(missing_date_sentinel()),
        Some(date) => NaiveDate::parse_from_str(date, DATE_FORMAT)
            .map_err(|_| MergeError::InvalidDate(date.to_string())),
    }
}

fn missing_date_sentinel() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 1).expect("1900-01-01 is a valid date")
}

/// Collapse one duplicate group (already in recency-descending order) into
/// its survivor.
fn merge_group(group: Vec<ContactRecord>) -> ContactRecord {
    let mut members = group.into_iter();
    let mut survivor = match members.next() {
        Some(record) => record,
        None => return ContactRecord::default(),
    };

    let mut industries: BTreeSet<String> = survivor.industry_segments().into_iter().collect();

    for member in members {
        backfill(&mut survivor, &member);
        // Industries accumulate from every member, not just copy-on-empty
        industries.extend(member.industry_segments());
    }

    survivor.industry = Some(joined_industries(&industries));
    survivor
}

/// Copy each backfillable field from an older member into the survivor when
/// the survivor's value is absent/empty. Once filled, never overwritten.
///
/// Phone, country and city are deliberately excluded: they are resolved
/// per-survivor after merging.
fn backfill(survivor: &mut ContactRecord, member: &ContactRecord) {
    fill(&mut survivor.external_id, &member.external_id);
    fill(&mut survivor.first_name, &member.first_name);
    fill(&mut survivor.last_name, &member.last_name);
    fill(&mut survivor.email, &member.email);
    fill(&mut survivor.address, &member.address);
    fill(&mut survivor.industry, &member.industry);
    fill(&mut survivor.create_date, &member.create_date);
}

fn fill(target: &mut Option<String>, source: &Option<String>) {
    if is_blank(target) && !is_blank(source) {
        *target = source.clone();
    }
}

/// Join the sorted industry union with `;`, prefixed with a leading `;`.
/// Downstream consumers rely on the leading separator.
fn joined_industries(industries: &BTreeSet<String>) -> String {
    let joined = industries
        .iter()
        .cloned()
        .collect::<Vec<String>>()
        .join(";");
    format!(";{}", joined)
}
