use std::collections::BTreeMap;

use serde::Serialize;

use super::counts::{group_key, GroupKey};
use crate::data::model::{Field, NumericField, Record};

/// Arithmetic mean of `Result` per distinct combination of `fields`.
///
/// Missing scores are ignored; a group with no scores has no entry.
pub fn group_means(records: &[Record], fields: &[Field]) -> BTreeMap<GroupKey, f64> {
    mean_by(records, fields, NumericField::Result)
}

fn mean_by(records: &[Record], fields: &[Field], value: NumericField) -> BTreeMap<GroupKey, f64> {
    let mut sums: BTreeMap<GroupKey, (f64, usize)> = BTreeMap::new();
    for rec in records {
        if let Some(v) = value.get(rec) {
            let entry = sums.entry(group_key(rec, fields)).or_default();
            entry.0 += v;
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(key, (sum, n))| (key, sum / n as f64))
        .collect()
}

/// Sub-group of a partition with its mean value.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedGroup {
    pub name: String,
    pub mean: f64,
}

/// Best and worst sub-group within one partition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupExtremes {
    pub partition: String,
    pub top: RankedGroup,
    pub bottom: RankedGroup,
}

/// For each value of `partition`, the `inner` group with the highest and
/// lowest mean `value`.
///
/// Means are visited in `(partition, inner)` order, so on equal means the
/// inner group that sorts first wins both for top and bottom.
pub fn top_bottom_by_group(
    records: &[Record],
    partition: Field,
    inner: Field,
    value: NumericField,
) -> Vec<GroupExtremes> {
    let means = mean_by(records, &[partition, inner], value);

    let mut out: Vec<GroupExtremes> = Vec::new();
    for (key, mean) in means {
        let [part, name]: [String; 2] = match key.try_into() {
            Ok(pair) => pair,
            Err(_) => continue,
        };
        let candidate = RankedGroup { name, mean };
        match out.last_mut() {
            Some(ext) if ext.partition == part => {
                if candidate.mean > ext.top.mean {
                    ext.top = candidate.clone();
                }
                if candidate.mean < ext.bottom.mean {
                    ext.bottom = candidate;
                }
            }
            _ => out.push(GroupExtremes {
                partition: part,
                top: candidate.clone(),
                bottom: candidate,
            }),
        }
    }
    out
}
