//! Line-level diff between two published revisions.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffOp {
    Added,
    Removed,
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffLine {
    pub op: DiffOp,
    pub content: String,
}

impl DiffLine {
    fn new(op: DiffOp, content: &str) -> Self {
        Self {
            op,
            content: content.to_string(),
        }
    }
}

/// Largest LCS table, in cells, built for the region between the common
/// prefix and suffix. Bigger regions are reported as one replaced block.
pub const MAX_TABLE_CELLS: usize = 4_000_000;

/// Compute a line diff from `old` to `new`.
///
/// The common prefix and suffix are matched directly; the lines between them
/// are aligned with a longest-common-subsequence table when it fits in
/// [`MAX_TABLE_CELLS`], and otherwise emitted as all removals then all
/// additions. Removals are emitted before additions when a line is replaced.
pub fn diff_lines(old: &str, new: &str) -> Vec<DiffLine> {
    let a: Vec<&str> = old.lines().collect();
    let b: Vec<&str> = new.lines().collect();

    let prefix = a.iter().zip(&b).take_while(|(x, y)| x == y).count();
    let suffix = a[prefix..]
        .iter()
        .rev()
        .zip(b[prefix..].iter().rev())
        .take_while(|(x, y)| x == y)
        .count();
    let (mid_a, mid_b) = (&a[prefix..a.len() - suffix], &b[prefix..b.len() - suffix]);

    let mut out = Vec::with_capacity(a.len().max(b.len()));
    out.extend(a[..prefix].iter().map(|l| DiffLine::new(DiffOp::Unchanged, l)));
    if (mid_a.len() + 1).saturating_mul(mid_b.len() + 1) <= MAX_TABLE_CELLS {
        align(mid_a, mid_b, &mut out);
    } else {
        out.extend(mid_a.iter().map(|l| DiffLine::new(DiffOp::Removed, l)));
        out.extend(mid_b.iter().map(|l| DiffLine::new(DiffOp::Added, l)));
    }
    out.extend(a[a.len() - suffix..].iter().map(|l| DiffLine::new(DiffOp::Unchanged, l)));
    out
}

fn align(a: &[&str], b: &[&str], out: &mut Vec<DiffLine>) {
    // table[i * width + j] = LCS length of a[i..] and b[j..]
    let width = b.len() + 1;
    let mut table = vec![0u32; (a.len() + 1) * width];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            table[i * width + j] = if a[i] == b[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }

    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i] == b[j] {
            out.push(DiffLine::new(DiffOp::Unchanged, a[i]));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            out.push(DiffLine::new(DiffOp::Removed, a[i]));
            i += 1;
        } else {
            out.push(DiffLine::new(DiffOp::Added, b[j]));
            j += 1;
        }
    }
    out.extend(a[i..].iter().map(|l| DiffLine::new(DiffOp::Removed, l)));
    out.extend(b[j..].iter().map(|l| DiffLine::new(DiffOp::Added, l)));
}
