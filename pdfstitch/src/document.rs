//! An output document under construction.

use crate::builder::ContentBuilder;
use crate::config::Metadata;
use crate::error::{PdfStitchError, Result};
use crate::io::serializer::{self, SerializedDocument};
use crate::object::{ObjectBody, ObjectNumber, ObjectStore, Value};

/// A document being assembled: an object store plus the catalog, the single
/// flat `/Pages` node and the ordered list of pages hanging off it.
///
/// The `/Pages` node is always object 1 and the catalog object 2. Every page
/// added through [`add_page`](Self::add_page) has its `/Parent` pointed at
/// the `/Pages` node, and `/Kids` and `/Count` are rewritten to match.
#[derive(Debug, Clone)]
pub struct Document {
    store: ObjectStore,
    catalog: ObjectNumber,
    pages: ObjectNumber,
    page_list: Vec<ObjectNumber>,
    info: Option<ObjectNumber>,
}

impl Document {
    /// Create an empty document with a catalog and an empty page tree.
    pub fn new() -> Self {
        let mut store = ObjectStore::new();
        let mut builder = ContentBuilder::new(&mut store);
        let pages = builder.new_pages_node(&[]);
        let catalog = builder.new_catalog(pages);

        Self {
            store,
            catalog,
            pages,
            page_list: Vec::new(),
            info: None,
        }
    }

    /// Builder registering into this document's store.
    pub fn builder(&mut self) -> ContentBuilder<'_> {
        ContentBuilder::new(&mut self.store)
    }

    /// Objects of the document.
    pub fn store(&self) -> &ObjectStore {
        &self.store
    }

    /// Mutable access for callers importing foreign objects.
    pub fn store_mut(&mut self) -> &mut ObjectStore {
        &mut self.store
    }

    /// Catalog object number.
    pub fn catalog(&self) -> ObjectNumber {
        self.catalog
    }

    /// The `/Pages` node every page hangs off.
    pub fn pages_root(&self) -> ObjectNumber {
        self.pages
    }

    /// Page object numbers in document order.
    pub fn page_list(&self) -> &[ObjectNumber] {
        &self.page_list
    }

    /// Number of pages.
    pub fn page_count(&self) -> usize {
        self.page_list.len()
    }

    /// Document information dictionary, if metadata was set.
    pub fn info(&self) -> Option<ObjectNumber> {
        self.info
    }

    /// Append a registered `/Page` object to the page tree.
    pub fn add_page(&mut self, page: ObjectNumber) -> Result<()> {
        self.add_pages([page])
    }

    /// Append several pages, preserving their order.
    ///
    /// # Errors
    ///
    /// Fails with `ObjectNotFound` for unregistered numbers and with `Other`
    /// if an object is not a page dictionary. Nothing is appended on error.
    pub fn add_pages(&mut self, pages: impl IntoIterator<Item = ObjectNumber>) -> Result<()> {
        let mut patched = Vec::new();
        for page in pages {
            let mut dict = match self.store.get(page)? {
                ObjectBody::Dictionary(dict) if dict.has_type(b"Page") => dict.clone(),
                _ => {
                    return Err(PdfStitchError::other(format!(
                        "object {page} is not a page dictionary"
                    )));
                }
            };
            dict.set("Parent", Value::Reference(self.pages));
            patched.push((page, dict));
        }

        for (page, dict) in patched {
            self.store.replace(page, dict)?;
            self.page_list.push(page);
        }
        self.store
            .replace(self.pages, ContentBuilder::pages_node(&self.page_list))
    }

    /// Register an information dictionary and reference it from the trailer.
    ///
    /// Empty metadata leaves the document without `/Info`.
    pub fn set_info(&mut self, metadata: &Metadata) {
        if metadata.is_empty() {
            return;
        }
        let info = self.builder().new_info(metadata);
        self.info = Some(info);
    }

    /// Serialize to PDF bytes, returning the xref entries alongside.
    pub fn serialize(&self) -> Result<SerializedDocument> {
        serializer::serialize(&self.store, self.catalog, self.info)
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}
