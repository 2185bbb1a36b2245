use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::diagnostics::{DiagnosticKind, Diagnostics};
use crate::domain::{EntityField, split_ids};
use crate::entity::Entity;

pub const PARENT_FILE_DELIMITERS: [char; 2] = [',', ';'];

/// Primary parents per file, aligned with the file positions passed to
/// [`LineageResolver::resolve_all`].
#[derive(Debug, Clone, Default)]
pub struct ResolvedLineage {
    pub primary_parents: Vec<Vec<usize>>,
    pub diagnostics: Diagnostics,
}

struct Frame {
    node: usize,
    depth: usize,
    // shallowest depth of an on-path file this subtree points back to
    low: usize,
    parents: Vec<usize>,
    next: usize,
    roots: Vec<usize>,
    seen: HashSet<usize>,
}

impl Frame {
    fn absorb(&mut self, roots: &[usize]) {
        for &root in roots {
            if self.seen.insert(root) {
                self.roots.push(root);
            }
        }
    }
}

/// Resolves files to their rootmost ancestors over the parent-file graph.
///
/// Positions index into the entity slice the resolver was built over. Files
/// with declared parents are resolved at most once; files without parents
/// are their own primary parent and are never cached.
///
/// Inside a parent cycle only the file the traversal entered the cycle
/// through is cached, since the other members saw a partial root set. They
/// are resolved again on their own, so every file gets the roots of
/// everything reachable from it whatever the resolution order.
pub struct LineageResolver<'a> {
    entities: &'a [Entity],
    by_file_id: HashMap<&'a str, usize>,
    resolved: HashMap<usize, Vec<usize>>,
    reported_cycles: HashSet<(usize, usize)>,
    diagnostics: Diagnostics,
}

impl<'a> LineageResolver<'a> {
    pub fn new(entities: &'a [Entity], files: &[usize]) -> Self {
        let by_file_id = files
            .iter()
            .filter_map(|&pos| entities[pos].data_file_id().map(|id| (id, pos)))
            .collect();
        Self {
            entities,
            by_file_id,
            resolved: HashMap::new(),
            reported_cycles: HashSet::new(),
            diagnostics: Diagnostics::default(),
        }
    }

    pub fn resolve_all(mut self, files: &[usize]) -> ResolvedLineage {
        let primary_parents = files
            .iter()
            .map(|&file| self.primary_parents(file))
            .collect();
        ResolvedLineage {
            primary_parents,
            diagnostics: self.diagnostics,
        }
    }

    /// Number of files whose lineage has been computed and cached.
    pub fn cached_len(&self) -> usize {
        self.resolved.len()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    pub fn primary_parents(&mut self, file: usize) -> Vec<usize> {
        if let Some(cached) = self.resolved.get(&file) {
            return cached.clone();
        }
        if !self.declares_parents(file) {
            return vec![file];
        }

        // file -> depth on the current path
        let mut visiting = HashMap::from([(file, 0)]);
        let mut stack = vec![self.open_frame(file, 0)];
        let mut result = Vec::new();
        while let Some(top) = stack.last_mut() {
            let Some(parent) = top.parents.get(top.next).copied() else {
                let Some(done) = stack.pop() else { break };
                visiting.remove(&done.node);
                if let Some(child) = stack.last_mut() {
                    child.absorb(&done.roots);
                    child.low = child.low.min(done.low);
                }
                if done.low >= done.depth {
                    self.resolved.insert(done.node, done.roots.clone());
                }
                if stack.is_empty() {
                    result = done.roots;
                }
                continue;
            };
            top.next += 1;

            if let Some(cached) = self.resolved.get(&parent) {
                top.absorb(cached);
            } else if !self.declares_parents(parent) {
                top.absorb(&[parent]);
            } else if let Some(&depth) = visiting.get(&parent) {
                top.low = top.low.min(depth);
                let child = top.node;
                self.record_cycle(child, parent);
            } else {
                let depth = top.depth + 1;
                visiting.insert(parent, depth);
                let frame = self.open_frame(parent, depth);
                stack.push(frame);
            }
        }

        result
    }

    fn declares_parents(&self, file: usize) -> bool {
        self.entities[file]
            .text(EntityField::ParentDataFileId)
            .is_some()
    }

    fn open_frame(&mut self, file: usize, depth: usize) -> Frame {
        let entities = self.entities;
        let entity = &entities[file];
        let declared = entity.text(EntityField::ParentDataFileId).unwrap_or_default();
        let mut parents = Vec::new();
        for id in split_ids(declared, &PARENT_FILE_DELIMITERS) {
            match self.by_file_id.get(id) {
                Some(&pos) => parents.push(pos),
                None => self.diagnostics.push(
                    DiagnosticKind::MissingParentFile,
                    entity.data_file_id().unwrap_or_default(),
                    id,
                ),
            }
        }
        Frame {
            node: file,
            depth,
            low: depth,
            parents,
            next: 0,
            roots: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn record_cycle(&mut self, child: usize, parent: usize) {
        if !self.reported_cycles.insert((child, parent)) {
            return;
        }
        let entities = self.entities;
        let child_id = entities[child].data_file_id().unwrap_or_default();
        let parent_id = entities[parent].data_file_id().unwrap_or_default();
        warn!(
            file = child_id,
            parent = parent_id,
            "parent file reference closes a cycle; branch ignored"
        );
        self.diagnostics
            .push(DiagnosticKind::LineageCycle, child_id, parent_id);
    }
}
