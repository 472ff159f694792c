use std::cmp::Ordering;

use super::{DuplicateGroup, FileEntry};
use crate::scanner::types::CleanableItem;

/// Keeper first: newest modification time, ties broken by the smaller path
fn keeper_order(a: &FileEntry, b: &FileEntry) -> Ordering {
    b.modified.cmp(&a.modified).then_with(|| a.path.cmp(&b.path))
}

/// Split a group into its keeper and the copies that can be removed.
///
/// Every returned item is named `"<file> (duplicate of <keeper path>)"`.
/// Groups with fewer than two files yield nothing.
pub fn resolve_group(group: &DuplicateGroup) -> Vec<CleanableItem> {
    if group.files.len() < 2 {
        return Vec::new();
    }

    let mut members: Vec<&FileEntry> = group.files.iter().collect();
    members.sort_by(|a, b| keeper_order(a, b));
    let keeper = members[0];

    members[1..]
        .iter()
        .map(|copy| {
            let item = CleanableItem::new(copy.path.clone(), copy.size, false, copy.modified);
            let name = format!("{} (duplicate of {})", item.name, keeper.path.display());
            item.with_name(name)
        })
        .collect()
}

/// Resolve every group, largest items first, then by path
pub fn resolve_all(groups: &[DuplicateGroup]) -> Vec<CleanableItem> {
    let mut items: Vec<CleanableItem> = groups.iter().flat_map(resolve_group).collect();
    items.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));
    items
}
