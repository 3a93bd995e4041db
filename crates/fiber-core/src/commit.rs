use log::{trace, warn};

use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::host::{HostAdapter, HostError};
use crate::props::diff_props;

/// Effect-tagged fibers handled by one commit.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CommitSummary {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.placements + self.updates + self.deletions
    }
}

/// Applies the finished tree at `root` to `host`.
///
/// Every fiber in `deletions` is detached first, then the tree is walked
/// depth-first applying placements and updates. The walk is iterative and
/// runs to completion; a host error stops it and leaves the host partially
/// mutated.
pub(crate) fn commit_root<H: HostAdapter + ?Sized>(
    tree: &FiberTree,
    root: FiberId,
    deletions: &[FiberId],
    host: &mut H,
    event_prefix: &str,
) -> Result<CommitSummary, HostError> {
    let mut summary = CommitSummary::default();

    for &id in deletions {
        commit_deletion(tree, id, host)?;
        summary.deletions += 1;
    }

    for id in tree.descendants(root) {
        let Some(fiber) = tree.get(id) else {
            continue;
        };
        match (fiber.effect_tag, fiber.host_node) {
            (EffectTag::Placement, Some(node)) => {
                let Some(parent) = tree.host_parent(id) else {
                    warn!("commit: placed fiber {id:?} has no host parent");
                    continue;
                };
                trace!("commit: append #{node} to #{parent}");
                host.append_child(parent, node)?;
                summary.placements += 1;
            }
            (EffectTag::Placement, None) => summary.placements += 1,
            (EffectTag::Update, Some(node)) => {
                let previous = fiber.alternate.and_then(|alternate| tree.get(alternate));
                if let Some(previous) = previous {
                    let patch = diff_props(&previous.props, &fiber.props, event_prefix);
                    if !patch.is_empty() {
                        trace!("commit: {} prop changes on #{node}", patch.len());
                        patch.apply(host, node)?;
                    }
                }
                summary.updates += 1;
            }
            (EffectTag::Update, None) => summary.updates += 1,
            (EffectTag::Deletion | EffectTag::None, _) => {}
        }
    }

    Ok(summary)
}

// A fiber without its own host node (a component) is removed through the
// first host-bearing fiber below it.
fn commit_deletion<H: HostAdapter + ?Sized>(
    tree: &FiberTree,
    id: FiberId,
    host: &mut H,
) -> Result<(), HostError> {
    let Some(parent) = tree.host_parent(id) else {
        warn!("commit: deleted fiber {id:?} has no host parent");
        return Ok(());
    };
    match tree.first_host_node(id) {
        Some(node) => {
            trace!("commit: remove #{node} from #{parent}");
            host.remove_child(parent, node)
        }
        None => Ok(()),
    }
}
