use std::collections::BTreeMap;

use anyhow::{bail, Context};
use tracing::trace;

use super::{Offset, Op, PENDING};

/// A jump instruction whose target waits for a label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchSite {
	pub instruction: Offset,
}

/// A branch target that may be jumped to before its position is known.
///
/// Jumps to an unresolved label are emitted with a placeholder target and
/// remembered as patch sites. Resolving the label rewrites every one of them
/// and later jumps get the final offset directly. A label resolves once.
#[derive(Debug)]
pub enum Label {
	Unresolved { patch_sites: Vec<PatchSite> },
	Resolved { offset: Offset },
}

impl Default for Label {
	fn default() -> Self { Self::Unresolved { patch_sites: vec![] } }
}

impl Label {
	pub fn new() -> Self { Self::default() }

	pub fn is_resolved(&self) -> bool { matches!(self, Self::Resolved { .. }) }

	/// Whether some emitted jump still waits for this label.
	pub fn has_pending(&self) -> bool { matches!(self, Self::Unresolved { patch_sites } if !patch_sites.is_empty()) }

	pub fn offset(&self) -> Option<Offset> {
		match self {
			Self::Resolved { offset } => Some(*offset),
			Self::Unresolved { .. } => None,
		}
	}

	/// Target to encode in the jump being emitted at `instruction`.
	pub(crate) fn reference(&mut self, instruction: Offset) -> Offset {
		match self {
			Self::Resolved { offset } => *offset,
			Self::Unresolved { patch_sites } => {
				patch_sites.push(PatchSite { instruction });
				PENDING
			}
		}
	}

	/// Fix the label at `offset` and patch the jumps waiting for it.
	pub(crate) fn resolve(&mut self, offset: Offset, code: &mut [Op]) -> anyhow::Result<()> {
		match std::mem::replace(self, Self::Resolved { offset }) {
			Self::Resolved { offset: previous } => bail!("label resolved twice, at {previous} and {offset}"),
			Self::Unresolved { patch_sites } => {
				trace!(offset, sites = patch_sites.len(), "resolve label");
				for site in patch_sites {
					let target = code
						.get_mut(site.instruction)
						.and_then(Op::target_mut)
						.with_context(|| format!("no jump to patch at {}", site.instruction))?;
					*target = offset;
				}
				Ok(())
			}
		}
	}
}

/// The `goto` labels of one function.
#[derive(Debug, Default)]
pub struct NamedLabels {
	labels: BTreeMap<String, Label>,
}

impl NamedLabels {
	pub fn is_defined(&self, name: &str) -> bool { self.labels.get(name).is_some_and(Label::is_resolved) }

	pub(crate) fn define(&mut self, name: &str, offset: Offset, code: &mut [Op]) -> anyhow::Result<()> {
		self.labels.entry(name.to_string()).or_default().resolve(offset, code)
	}

	pub(crate) fn reference(&mut self, name: &str, instruction: Offset) -> Offset {
		self.labels.entry(name.to_string()).or_default().reference(instruction)
	}

	/// Labels jumped to but never defined, in name order.
	pub fn undefined(&self) -> Vec<&str> {
		self.labels.iter().filter(|(_, label)| !label.is_resolved()).map(|(name, _)| name.as_str()).collect()
	}
}
