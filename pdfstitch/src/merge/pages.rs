//! Page tree walking and object import for one source.
//!
//! Importing happens in two steps. [`stage_objects`] converts every object
//! the source's pages reach into this crate's object model. [`StagedSource::register_into`]
//! then renumbers and registers them in the target document, which cannot
//! fail on source content, so a broken source never leaves objects behind.

use std::collections::{HashMap, HashSet, VecDeque};

use tracing::{debug, warn};

use crate::document::Document;
use crate::error::Result;
use crate::io::reader::SourceDocument;
use crate::object::{Dictionary, ObjectBody, ObjectNumber, Value};

/// Attributes a page inherits from its ancestors.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Page trees deeper than this are treated as malformed.
const MAX_TREE_DEPTH: usize = 64;

/// Leaf pages of a source, in document order.
#[derive(Debug, Clone, Default)]
pub struct PageTree {
    /// Source object number and flattened dictionary of each page.
    pub pages: Vec<(ObjectNumber, Dictionary)>,
    /// Intermediate `/Pages` nodes, which are replaced by the target's node.
    pub nodes: HashSet<ObjectNumber>,
}

impl PageTree {
    /// Number of leaf pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Follow trailer, Catalog and `/Pages` and enumerate every leaf page.
///
/// Inheritable attributes are copied onto each page and `/Parent` is
/// dropped, since the merged tree is flat.
pub fn read_page_tree(source: &SourceDocument) -> Result<PageTree> {
    let catalog_number = source.catalog()?;
    let catalog = source
        .dictionary(catalog_number)
        .ok_or_else(|| source.malformed(format!("catalog object {catalog_number} is missing")))?;
    let root = catalog
        .get_reference(b"Pages")
        .ok_or_else(|| source.malformed("catalog has no /Pages reference"))?;

    let mut walker = TreeWalker {
        tree: PageTree::default(),
        visited: HashSet::new(),
    };
    walker.walk(source, root, &Dictionary::new(), 0)?;
    debug!(
        "{}: {} pages under {} page tree nodes",
        source.path().display(),
        walker.tree.pages.len(),
        walker.tree.nodes.len()
    );
    Ok(walker.tree)
}

struct TreeWalker {
    tree: PageTree,
    visited: HashSet<ObjectNumber>,
}

impl TreeWalker {
    fn walk(
        &mut self,
        source: &SourceDocument,
        node: ObjectNumber,
        inherited: &Dictionary,
        depth: usize,
    ) -> Result<()> {
        let is_root = depth == 0;
        if depth > MAX_TREE_DEPTH {
            return Err(source.malformed("page tree is nested too deeply"));
        }
        if !self.visited.insert(node) {
            warn!("{}: page tree visits object {node} twice, skipping", source.path().display());
            return Ok(());
        }

        let Some(mut dict) = source.dictionary(node) else {
            if is_root {
                return Err(source.malformed(format!("page tree root {node} is missing")));
            }
            warn!("{}: page tree node {node} is missing, skipping", source.path().display());
            return Ok(());
        };

        let is_tree_node =
            dict.has_type(b"Pages") || (!dict.has_type(b"Page") && dict.contains_key(b"Kids"));
        if !is_tree_node {
            for key in INHERITABLE {
                if !dict.contains_key(key)
                    && let Some(value) = inherited.get(key)
                {
                    dict.set(key, value.clone());
                }
            }
            if !dict.contains_key(b"MediaBox") {
                warn!("{}: page {node} has no MediaBox, using Letter", source.path().display());
                dict.set("MediaBox", vec![Value::Integer(0), Value::Integer(0), Value::Integer(612), Value::Integer(792)]);
            }
            dict.remove(b"Parent");
            dict.set("Type", Value::name("Page"));
            self.tree.pages.push((node, dict));
            return Ok(());
        }

        self.tree.nodes.insert(node);
        let mut inherited = inherited.clone();
        for key in INHERITABLE {
            if let Some(value) = dict.get(key) {
                inherited.set(key, value.clone());
            }
        }

        let kids = match dict.get(b"Kids") {
            Some(kids) => source.resolve(kids)?,
            None => Value::Null,
        };
        let Value::Array(kids) = kids else {
            if is_root {
                return Err(source.malformed("page tree root has no /Kids array"));
            }
            warn!("{}: page tree node {node} has no /Kids, skipping", source.path().display());
            return Ok(());
        };

        for kid in kids {
            match kid {
                Value::Reference(kid) => self.walk(source, kid, &inherited, depth + 1)?,
                other => warn!(
                    "{}: ignoring non-reference kid {other:?} of node {node}",
                    source.path().display()
                ),
            }
        }
        Ok(())
    }
}

/// Objects of one source, loaded and ready to be registered.
#[derive(Debug, Clone)]
pub struct StagedSource {
    pages: Vec<ObjectNumber>,
    objects: Vec<(ObjectNumber, ObjectBody)>,
    nodes: HashSet<ObjectNumber>,
    missing: usize,
}

impl StagedSource {
    /// Number of pages that will be imported.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Number of objects that will be registered.
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    /// References to objects absent from the source; they import as `null`.
    pub fn missing_count(&self) -> usize {
        self.missing
    }

    /// Register every staged object in `document` under fresh numbers and
    /// append the pages, in source order, to its page tree.
    ///
    /// Returns the new page numbers.
    pub fn register_into(self, document: &mut Document) -> Result<Vec<ObjectNumber>> {
        let target_pages = document.pages_root();
        let base = document.store().next_number();
        let renumbered: HashMap<ObjectNumber, ObjectNumber> = self
            .objects
            .iter()
            .zip(base..)
            .map(|((old, _), new)| (*old, new))
            .collect();

        let nodes = &self.nodes;
        let remap = |old: ObjectNumber| {
            if nodes.contains(&old) {
                Value::Reference(target_pages)
            } else {
                renumbered
                    .get(&old)
                    .map_or(Value::Null, |new| Value::Reference(*new))
            }
        };

        let store = document.store_mut();
        for (_, mut body) in self.objects {
            renumber_body(&mut body, &remap);
            store.register(body);
        }

        let pages: Vec<ObjectNumber> = self
            .pages
            .iter()
            .filter_map(|old| renumbered.get(old).copied())
            .collect();
        document.add_pages(pages.iter().copied())?;
        Ok(pages)
    }
}

/// Load every object reachable from the pages of `tree`.
///
/// Page dictionaries come first, in page order, followed by the objects they
/// reach in breadth-first order.
pub fn stage_objects(source: &SourceDocument, tree: PageTree) -> Result<StagedSource> {
    let mut seen: HashSet<ObjectNumber> = tree.pages.iter().map(|(number, _)| *number).collect();
    let mut queue = VecDeque::new();
    let mut objects = Vec::new();
    let mut pages = Vec::with_capacity(tree.pages.len());

    for (number, dict) in tree.pages {
        let body = ObjectBody::Dictionary(dict);
        collect_references(&body, &mut queue);
        pages.push(number);
        objects.push((number, body));
    }

    let mut missing = 0;
    while let Some(number) = queue.pop_front() {
        if tree.nodes.contains(&number) || !seen.insert(number) {
            continue;
        }
        match source.object(number) {
            Some(body) => {
                collect_references(&body, &mut queue);
                objects.push((number, body));
            }
            None => missing += 1,
        }
    }

    if missing > 0 {
        warn!(
            "{}: {missing} referenced object(s) missing, imported as null",
            source.path().display()
        );
    }

    Ok(StagedSource {
        pages,
        objects,
        nodes: tree.nodes,
        missing,
    })
}

fn collect_references(body: &ObjectBody, out: &mut VecDeque<ObjectNumber>) {
    match body {
        ObjectBody::Dictionary(dict) => dict.iter().for_each(|(_, v)| value_references(v, out)),
        ObjectBody::Array(items) => items.iter().for_each(|v| value_references(v, out)),
        ObjectBody::Stream(stream) => stream
            .dict()
            .iter()
            .for_each(|(_, v)| value_references(v, out)),
        ObjectBody::Reference(number) => out.push_back(*number),
        ObjectBody::Primitive(value) => value_references(value, out),
    }
}

fn value_references(value: &Value, out: &mut VecDeque<ObjectNumber>) {
    match value {
        Value::Reference(number) => out.push_back(*number),
        Value::Array(items) => items.iter().for_each(|v| value_references(v, out)),
        Value::Dictionary(dict) => dict.iter().for_each(|(_, v)| value_references(v, out)),
        _ => {}
    }
}

fn renumber_body(body: &mut ObjectBody, remap: &impl Fn(ObjectNumber) -> Value) {
    match body {
        ObjectBody::Dictionary(dict) => dict.values_mut().for_each(|v| renumber_value(v, remap)),
        ObjectBody::Array(items) => items.iter_mut().for_each(|v| renumber_value(v, remap)),
        ObjectBody::Stream(stream) => {
            stream.update_dict(|dict| dict.values_mut().for_each(|v| renumber_value(v, remap)));
        }
        ObjectBody::Reference(number) => *body = ObjectBody::from(remap(*number)),
        ObjectBody::Primitive(value) => renumber_value(value, remap),
    }
}

fn renumber_value(value: &mut Value, remap: &impl Fn(ObjectNumber) -> Value) {
    match value {
        Value::Reference(number) => *value = remap(*number),
        Value::Array(items) => items.iter_mut().for_each(|v| renumber_value(v, remap)),
        Value::Dictionary(dict) => dict.values_mut().for_each(|v| renumber_value(v, remap)),
        _ => {}
    }
}
