// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// PDF reader — load, inspect, and edit existing PDF documents using the
// `lopdf` crate: page copying between documents, rotation, metadata removal,
// text stamping, text extraction, and serialisation.

use std::collections::HashMap;
use std::io::{BufWriter, Write};

use falzwerk_core::error::{FalzwerkError, Result};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument, warn};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Descriptive fields of the document information dictionary.
pub const METADATA_KEYS: [&str; 6] = ["Title", "Author", "Subject", "Keywords", "Producer", "Creator"];

/// US Letter in points, used when a page has no usable MediaBox.
const DEFAULT_PAGE_SIZE: (f32, f32) = (612.0, 792.0);

/// Guard against cyclic /Parent chains in damaged files.
const MAX_TREE_DEPTH: usize = 64;

/// Write-buffer bytes reserved per object in a serialisation batch.
const BATCH_BYTES_PER_OBJECT: usize = 512;

const STAMP_FONT: &str = "FzStampFont";
const STAMP_GSTATE: &str = "FzStampGs";

/// Text drawn on top of a page's existing content.
#[derive(Debug, Clone, Copy)]
pub struct TextStamp<'a> {
    pub text: &'a str,
    /// Baseline origin in points from the bottom-left corner.
    pub x: f32,
    pub y: f32,
    pub font_size: f32,
    /// Fill colour as a grey level (0 = black, 1 = white).
    pub gray: f32,
    /// Fill opacity (0 = invisible, 1 = opaque).
    pub opacity: f32,
}

/// Reads and manipulates PDF files.
///
/// Wraps `lopdf::Document`. Every edit happens on the in-memory document;
/// nothing is written until [`PdfReader::to_bytes`] is called.
pub struct PdfReader {
    document: Document,
}

impl PdfReader {
    // -- Construction ---------------------------------------------------------

    /// Create a reader from raw PDF bytes already in memory.
    #[instrument(skip_all, fields(bytes_len = data.len()))]
    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        let document = Document::load_mem(data).map_err(|err| {
            FalzwerkError::Decode(format!("not a readable PDF: {err}"))
        })?;

        debug!(pages = document.get_pages().len(), "PDF loaded from bytes");

        Ok(Self { document })
    }

    /// A new document with an empty page tree.
    pub fn empty() -> Self {
        let mut document = Document::with_version("1.7");

        let mut pages = Dictionary::new();
        pages.set("Type", Object::Name(b"Pages".to_vec()));
        pages.set("Kids", Object::Array(Vec::new()));
        pages.set("Count", Object::Integer(0));
        let pages_id = document.add_object(Object::Dictionary(pages));

        let mut catalog = Dictionary::new();
        catalog.set("Type", Object::Name(b"Catalog".to_vec()));
        catalog.set("Pages", Object::Reference(pages_id));
        let catalog_id = document.add_object(Object::Dictionary(catalog));

        document.trailer.set("Root", Object::Reference(catalog_id));

        Self { document }
    }

    // -- Inspection -----------------------------------------------------------

    /// Number of pages in the document.
    pub fn page_count(&self) -> usize {
        self.document.get_pages().len()
    }

    /// Width and height of a page (0-indexed) in points.
    pub fn page_size(&self, index: usize) -> Result<(f32, f32)> {
        let page_id = self.page_id(index)?;
        Ok(media_box_size(&self.document, page_id).unwrap_or(DEFAULT_PAGE_SIZE))
    }

    /// Effective /Rotate of a page (0-indexed), including inherited values.
    pub fn page_rotation(&self, index: usize) -> Result<i64> {
        let page_id = self.page_id(index)?;
        Ok(inherited_rotation(&self.document, page_id))
    }

    /// Decoded content stream bytes of a page (0-indexed).
    pub fn page_content(&self, index: usize) -> Result<Vec<u8>> {
        let page_id = self.page_id(index)?;
        self.document.get_page_content(page_id).map_err(|err| {
            FalzwerkError::PdfError(format!("cannot read content of page {}: {err}", index + 1))
        })
    }

    /// A field of the document information dictionary, if set.
    pub fn metadata_field(&self, key: &str) -> Option<String> {
        let info = match self.document.trailer.get(b"Info").ok()? {
            Object::Reference(id) => self.document.get_object(*id).ok()?,
            inline => inline,
        };
        match info.as_dict().ok()?.get(key.as_bytes()).ok()? {
            Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).into_owned()),
            _ => None,
        }
    }

    /// Text of every page in order. Fragments within a page are joined with
    /// single spaces; pages without extractable text give an empty string.
    #[instrument(skip(self))]
    pub fn page_texts(&self) -> Vec<String> {
        self.document
            .get_pages()
            .keys()
            .map(|&number| match self.document.extract_text(&[number]) {
                Ok(text) => text
                    .lines()
                    .map(str::trim)
                    .filter(|fragment| !fragment.is_empty())
                    .collect::<Vec<_>>()
                    .join(" "),
                Err(err) => {
                    warn!(page = number, %err, "No extractable text");
                    String::new()
                }
            })
            .collect()
    }

    // -- Page copying ---------------------------------------------------------

    /// Append copies of `source`'s pages (0-indexed) to this document, in the
    /// order given. Indices may repeat.
    #[instrument(skip_all, fields(pages = indices.len()))]
    pub fn append_pages_from(&mut self, source: &PdfReader, indices: &[usize]) -> Result<()> {
        let source_pages = source.page_ids();
        let pages_root = self.pages_root()?;
        let mut importer = PageImporter::new(&source.document);

        for &index in indices {
            let page_id = *source_pages.get(index).ok_or_else(|| {
                FalzwerkError::PdfError(format!(
                    "page {} out of range (document has {} pages)",
                    index + 1,
                    source_pages.len()
                ))
            })?;
            let copied = importer.import_page(&mut self.document, page_id, pages_root)?;
            self.attach_page(pages_root, copied)?;
        }

        debug!(total_pages = self.page_count(), "Pages appended");
        Ok(())
    }

    /// Append copies of every page of `source`, in order.
    pub fn append_all_pages_from(&mut self, source: &PdfReader) -> Result<()> {
        let indices: Vec<usize> = (0..source.page_count()).collect();
        self.append_pages_from(source, &indices)
    }

    // -- Editing --------------------------------------------------------------

    /// Rotate every page clockwise by `degrees` (a multiple of 90), on top of
    /// any rotation already present.
    #[instrument(skip(self))]
    pub fn rotate_all(&mut self, degrees: i32) -> Result<()> {
        if degrees % 90 != 0 {
            return Err(FalzwerkError::Validation(format!(
                "rotation must be a multiple of 90, got {degrees}"
            )));
        }

        for page_id in self.page_ids() {
            let existing = inherited_rotation(&self.document, page_id);
            let rotation = (existing + i64::from(degrees)).rem_euclid(360);

            self.page_dict_mut(page_id)?
                .set("Rotate", Object::Integer(rotation));
        }

        info!(pages = self.page_count(), degrees, "Pages rotated");
        Ok(())
    }

    /// Set a field of the document information dictionary, creating the
    /// dictionary if needed.
    pub fn set_metadata_field(&mut self, key: &str, value: &str) {
        if self.info_dict_mut().is_none() {
            let info_id = self.document.add_object(Object::Dictionary(Dictionary::new()));
            self.document.trailer.set("Info", Object::Reference(info_id));
        }
        if let Some(info) = self.info_dict_mut() {
            info.set(key, Object::string_literal(value));
        }
    }

    /// Remove the descriptive metadata fields and drop objects nothing refers
    /// to any more. Returns the number of fields removed.
    #[instrument(skip(self))]
    pub fn strip_metadata(&mut self) -> usize {
        let removed = match self.info_dict_mut() {
            Some(info) => METADATA_KEYS
                .iter()
                .filter(|key| info.remove(key.as_bytes()).is_some())
                .count(),
            None => 0,
        };

        let pruned = self.document.prune_objects().len();
        debug!(removed, pruned, "Metadata stripped");
        removed
    }

    /// Draw `stamp` over the existing content of a page (0-indexed).
    ///
    /// The page's own content is wrapped in a save/restore pair so its
    /// graphics state cannot leak into the stamp.
    pub fn stamp_text(&mut self, index: usize, stamp: &TextStamp<'_>) -> Result<()> {
        let page_id = self.page_id(index)?;

        let mut font = Dictionary::new();
        font.set("Type", Object::Name(b"Font".to_vec()));
        font.set("Subtype", Object::Name(b"Type1".to_vec()));
        font.set("BaseFont", Object::Name(b"Helvetica".to_vec()));
        font.set("Encoding", Object::Name(b"WinAnsiEncoding".to_vec()));
        let font_id = self.document.add_object(Object::Dictionary(font));

        let mut gstate = Dictionary::new();
        gstate.set("Type", Object::Name(b"ExtGState".to_vec()));
        gstate.set("ca", real(stamp.opacity));
        gstate.set("CA", real(stamp.opacity));
        let gstate_id = self.document.add_object(Object::Dictionary(gstate));

        self.add_page_resource(page_id, b"Font", STAMP_FONT, Object::Reference(font_id))?;
        self.add_page_resource(page_id, b"ExtGState", STAMP_GSTATE, Object::Reference(gstate_id))?;

        let content = Content {
            operations: vec![
                Operation::new("Q", vec![]),
                Operation::new("q", vec![]),
                Operation::new("gs", vec![Object::Name(STAMP_GSTATE.as_bytes().to_vec())]),
                Operation::new(
                    "rg",
                    vec![real(stamp.gray), real(stamp.gray), real(stamp.gray)],
                ),
                Operation::new("BT", vec![]),
                Operation::new(
                    "Tf",
                    vec![Object::Name(STAMP_FONT.as_bytes().to_vec()), real(stamp.font_size)],
                ),
                Operation::new("Td", vec![real(stamp.x), real(stamp.y)]),
                Operation::new("Tj", vec![Object::string_literal(latin1(stamp.text))]),
                Operation::new("ET", vec![]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content.encode().map_err(|err| {
            FalzwerkError::PdfError(format!("failed to encode stamp content: {err}"))
        })?;

        let save_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
        let stamp_id = self.document.add_object(Stream::new(Dictionary::new(), encoded));

        let mut contents = match self.page_dict(page_id)?.get(b"Contents") {
            Ok(Object::Reference(id)) => match self.document.get_object(*id) {
                Ok(Object::Array(items)) => items.clone(),
                _ => vec![Object::Reference(*id)],
            },
            Ok(Object::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        contents.insert(0, Object::Reference(save_id));
        contents.push(Object::Reference(stamp_id));

        self.page_dict_mut(page_id)?
            .set("Contents", Object::Array(contents));

        Ok(())
    }

    // -- Output ---------------------------------------------------------------

    /// Serialise the document.
    pub fn to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        self.document.save_to(&mut output).map_err(|err| {
            FalzwerkError::PdfError(format!("failed to serialise PDF: {err}"))
        })?;
        debug!(output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    /// Serialise the document, flushing output in batches sized for
    /// `objects_per_batch` objects.
    pub fn to_bytes_batched(&mut self, objects_per_batch: usize) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        {
            let capacity = objects_per_batch.max(1) * BATCH_BYTES_PER_OBJECT;
            let mut writer = BufWriter::with_capacity(capacity, &mut output);
            self.document.save_to(&mut writer).map_err(|err| {
                FalzwerkError::PdfError(format!("failed to serialise PDF: {err}"))
            })?;
            writer.flush()?;
        }
        debug!(objects_per_batch, output_bytes = output.len(), "PDF serialised");
        Ok(output)
    }

    // -- Helpers --------------------------------------------------------------

    /// Page object IDs in page order.
    fn page_ids(&self) -> Vec<ObjectId> {
        self.document.get_pages().into_values().collect()
    }

    fn page_id(&self, index: usize) -> Result<ObjectId> {
        let pages = self.page_ids();
        pages.get(index).copied().ok_or_else(|| {
            FalzwerkError::PdfError(format!(
                "page {} out of range (document has {} pages)",
                index + 1,
                pages.len()
            ))
        })
    }

    fn page_dict(&self, page_id: ObjectId) -> Result<&Dictionary> {
        self.document
            .get_object(page_id)
            .and_then(|object| object.as_dict())
            .map_err(|err| FalzwerkError::PdfError(format!("cannot read page {page_id:?}: {err}")))
    }

    fn page_dict_mut(&mut self, page_id: ObjectId) -> Result<&mut Dictionary> {
        self.document
            .get_object_mut(page_id)
            .and_then(|object| object.as_dict_mut())
            .map_err(|err| FalzwerkError::PdfError(format!("cannot edit page {page_id:?}: {err}")))
    }

    /// Object ID of this document's root /Pages node.
    fn pages_root(&self) -> Result<ObjectId> {
        self.document
            .catalog()
            .and_then(|catalog| catalog.get(b"Pages"))
            .and_then(|pages| pages.as_reference())
            .map_err(|err| FalzwerkError::PdfError(format!("no page tree: {err}")))
    }

    /// Add `page_id` as the last kid of the root page tree node.
    fn attach_page(&mut self, pages_root: ObjectId, page_id: ObjectId) -> Result<()> {
        let pages = self
            .document
            .get_object_mut(pages_root)
            .and_then(|object| object.as_dict_mut())
            .map_err(|err| FalzwerkError::PdfError(format!("cannot edit page tree: {err}")))?;

        match pages.get_mut(b"Kids") {
            Ok(Object::Array(kids)) => kids.push(Object::Reference(page_id)),
            _ => pages.set("Kids", Object::Array(vec![Object::Reference(page_id)])),
        }
        let count = pages
            .get(b"Count")
            .and_then(|count| count.as_i64())
            .unwrap_or(0);
        pages.set("Count", Object::Integer(count + 1));

        Ok(())
    }

    fn info_dict_mut(&mut self) -> Option<&mut Dictionary> {
        let info_id = match self.document.trailer.get(b"Info") {
            Ok(Object::Reference(id)) => Some(*id),
            Ok(Object::Dictionary(_)) => None,
            _ => return None,
        };
        match info_id {
            Some(id) => self.document.get_object_mut(id).ok()?.as_dict_mut().ok(),
            None => self.document.trailer.get_mut(b"Info").ok()?.as_dict_mut().ok(),
        }
    }

    /// Register `value` under `name` in the `category` sub-dictionary
    /// (/Font, /ExtGState, ...) of a page's resources.
    ///
    /// Inherited resources are pinned onto the page first. Shared resource
    /// dictionaries are edited in place, so siblings see the new name too.
    fn add_page_resource(
        &mut self,
        page_id: ObjectId,
        category: &[u8],
        name: &str,
        value: Object,
    ) -> Result<()> {
        let (resources_id, mut resources) =
            match inherited_attribute(&self.document, page_id, b"Resources") {
                Some(Object::Reference(id)) => (Some(id), self.owned_dict(id)),
                Some(Object::Dictionary(dict)) => (None, dict),
                _ => (None, Dictionary::new()),
            };

        let (category_id, mut entries) = match resources.get(category) {
            Ok(Object::Reference(id)) => (Some(*id), self.owned_dict(*id)),
            Ok(Object::Dictionary(dict)) => (None, dict.clone()),
            _ => (None, Dictionary::new()),
        };
        entries.set(name, value);

        match category_id {
            Some(id) => {
                self.document.objects.insert(id, Object::Dictionary(entries));
            }
            None => resources.set(category.to_vec(), Object::Dictionary(entries)),
        }

        match resources_id {
            Some(id) => {
                self.document.objects.insert(id, Object::Dictionary(resources));
                self.page_dict_mut(page_id)?
                    .set("Resources", Object::Reference(id));
            }
            None => {
                self.page_dict_mut(page_id)?
                    .set("Resources", Object::Dictionary(resources));
            }
        }

        Ok(())
    }

    fn owned_dict(&self, id: ObjectId) -> Dictionary {
        self.document
            .get_object(id)
            .and_then(|object| object.as_dict())
            .cloned()
            .unwrap_or_else(|_| Dictionary::new())
    }
}

/// Copies pages, and every object they reference, from one document into
/// another. Objects referenced from several places are copied once.
struct PageImporter<'a> {
    source: &'a Document,
    /// Source object ID -> target object ID.
    imported: HashMap<ObjectId, ObjectId>,
}

impl<'a> PageImporter<'a> {
    fn new(source: &'a Document) -> Self {
        Self {
            source,
            imported: HashMap::new(),
        }
    }

    /// Copy one page object into `target`, parented to `parent_id`.
    ///
    /// Each call creates a fresh page object, so the same source page can be
    /// imported more than once; the resources behind it are shared.
    fn import_page(
        &mut self,
        target: &mut Document,
        page_id: ObjectId,
        parent_id: ObjectId,
    ) -> Result<ObjectId> {
        let page = self
            .source
            .get_object(page_id)
            .and_then(|object| object.as_dict())
            .map_err(|err| {
                FalzwerkError::PdfError(format!("cannot read page object {page_id:?}: {err}"))
            })?;

        let new_id = target.new_object_id();
        self.imported.insert(page_id, new_id);

        let mut copy = self.clone_dictionary(target, page);

        // The copy loses its ancestors, so materialise what it inherited.
        for key in INHERITABLE_KEYS {
            if copy.has(key) {
                continue;
            }
            if let Some(value) = inherited_attribute(self.source, page_id, key) {
                let value = self.clone_object(target, &value);
                copy.set(key.to_vec(), value);
            }
        }
        copy.set("Parent", Object::Reference(parent_id));

        target.objects.insert(new_id, Object::Dictionary(copy));
        Ok(new_id)
    }

    /// Clone a dictionary, skipping /Parent back-references.
    fn clone_dictionary(&mut self, target: &mut Document, dict: &Dictionary) -> Dictionary {
        let mut copy = Dictionary::new();
        for (key, value) in dict.iter() {
            if key == b"Parent" {
                continue;
            }
            let value = self.clone_object(target, value);
            copy.set(key.clone(), value);
        }
        copy
    }

    fn clone_object(&mut self, target: &mut Document, object: &Object) -> Object {
        match object {
            Object::Dictionary(dict) => Object::Dictionary(self.clone_dictionary(target, dict)),
            Object::Array(items) => Object::Array(
                items
                    .iter()
                    .map(|item| self.clone_object(target, item))
                    .collect(),
            ),
            Object::Stream(stream) => {
                let mut copy = stream.clone();
                copy.dict = self.clone_dictionary(target, &stream.dict);
                Object::Stream(copy)
            }
            Object::Reference(source_id) => {
                if let Some(target_id) = self.imported.get(source_id) {
                    return Object::Reference(*target_id);
                }
                match self.source.get_object(*source_id) {
                    Ok(referenced) => {
                        // Reserve the ID first so cycles resolve to it.
                        let target_id = target.new_object_id();
                        self.imported.insert(*source_id, target_id);
                        let copy = self.clone_object(target, referenced);
                        target.objects.insert(target_id, copy);
                        Object::Reference(target_id)
                    }
                    Err(err) => {
                        warn!(?source_id, %err, "Cannot resolve reference, using Null");
                        Object::Null
                    }
                }
            }
            other => other.clone(),
        }
    }
}

/// Look up `key` on a page, falling back to its ancestors.
fn inherited_attribute(document: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let dict = document.get_object(current).ok()?.as_dict().ok()?;
        if let Ok(value) = dict.get(key) {
            return Some(value.clone());
        }
        current = dict.get(b"Parent").ok()?.as_reference().ok()?;
    }
    None
}

fn media_box_size(document: &Document, page_id: ObjectId) -> Option<(f32, f32)> {
    let media_box = inherited_attribute(document, page_id, b"MediaBox")?;
    let Object::Array(values) = resolve(document, &media_box) else {
        return None;
    };
    let numbers: Vec<f32> = values
        .iter()
        .filter_map(|value| as_number(resolve(document, value)))
        .collect();
    match numbers.as_slice() {
        [x0, y0, x1, y1] => Some(((x1 - x0).abs(), (y1 - y0).abs())),
        _ => None,
    }
}

fn inherited_rotation(document: &Document, page_id: ObjectId) -> i64 {
    inherited_attribute(document, page_id, b"Rotate")
        .and_then(|value| resolve(document, &value).as_i64().ok())
        .unwrap_or(0)
}

fn resolve<'a>(document: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => document.get_object(*id).unwrap_or(object),
        other => other,
    }
}

fn as_number(object: &Object) -> Option<f32> {
    match object {
        Object::Integer(value) => Some(*value as f32),
        Object::Real(value) => Some(*value as f32),
        _ => None,
    }
}

fn real(value: f32) -> Object {
    Object::Real(value.into())
}

/// Encode text for a WinAnsi-encoded standard font; characters outside
/// Latin-1 become `?`.
fn latin1(text: &str) -> Vec<u8> {
    text.chars()
        .map(|c| u8::try_from(u32::from(c)).unwrap_or(b'?'))
        .collect()
}
