//! Version string helpers.
//!
//! Matching is byte-exact, so nothing here interprets version semantics
//! beyond what is needed to normalize detector output and to sort the index.

use std::cmp::Ordering;

/// Drop a PEP 440 local label: `"2.1.0+cu121"` -> `"2.1.0"`.
pub fn strip_local_version(version: &str) -> &str {
    version.split('+').next().unwrap_or(version)
}

/// Remove every character that is not an ASCII digit or a `.`.
///
/// Detectors report CUDA as `"12.1"`, `"V12.1"` or `"12.1\n"`; the index
/// only ever contains digits and dots.
pub fn normalize_cuda(version: &str) -> String {
    version
        .chars()
        .filter(|c| c.is_ascii_digit() || *c == '.')
        .collect()
}

/// Order two dotted version strings segment by segment.
///
/// Numeric segments compare numerically (`3.9.0` < `3.10.0`) at any length,
/// and sort before non-numeric ones, which compare lexically. Two strings
/// only compare `Equal` when they are identical, so sorting with this is
/// independent of input order.
pub fn compare_dotted(a: &str, b: &str) -> Ordering {
    let mut left = a.split('.');
    let mut right = b.split('.');

    loop {
        match (left.next(), right.next()) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Less,
            (Some(_), None) => return Ordering::Greater,
            (Some(l), Some(r)) => {
                let ord = compare_segment(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
        }
    }
}

fn is_numeric(segment: &str) -> bool {
    !segment.is_empty() && segment.bytes().all(|b| b.is_ascii_digit())
}

/// Digit runs compare by magnitude without parsing, so arbitrarily long
/// segments stay ordered; leading zeros only break ties.
fn compare_segment(l: &str, r: &str) -> Ordering {
    match (is_numeric(l), is_numeric(r)) {
        (true, true) => {
            let lt = l.trim_start_matches('0');
            let rt = r.trim_start_matches('0');
            lt.len()
                .cmp(&rt.len())
                .then_with(|| lt.cmp(rt))
                .then_with(|| l.cmp(r))
        }
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => l.cmp(r),
    }
}
