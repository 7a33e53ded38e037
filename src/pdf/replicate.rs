use lopdf::{dictionary, Dictionary, Document, Object, ObjectId};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Page attributes a page may inherit from its ancestors in the page tree
const INHERITABLE_KEYS: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against `Parent` cycles in malformed files
const MAX_TREE_DEPTH: usize = 64;

#[derive(Debug, Clone)]
pub struct ReplicateOptions {
    pub input: PathBuf,
    pub output: PathBuf,
    /// 1-indexed
    pub page: u32,
    pub copies: u32,
}

/// Copy of a page dictionary with inherited attributes pulled down from its
/// ancestors, detached from its old parent.
fn standalone_page(doc: &Document, page_id: ObjectId) -> Result<Dictionary> {
    let mut page = doc.get_dictionary(page_id)?.clone();
    let mut parent = page.get(b"Parent").and_then(Object::as_reference).ok();
    let mut depth = 0;

    while let Some(parent_id) = parent {
        if depth >= MAX_TREE_DEPTH {
            tracing::warn!(?page_id, "page tree too deep, stopped resolving inherited attributes");
            break;
        }
        let node = doc.get_dictionary(parent_id)?;
        for key in INHERITABLE_KEYS {
            if !page.has(key) {
                if let Ok(value) = node.get(key) {
                    page.set(key.to_vec(), value.clone());
                }
            }
        }
        parent = node.get(b"Parent").and_then(Object::as_reference).ok();
        depth += 1;
    }

    page.remove(b"Parent");
    Ok(page)
}

/// Replace the page tree of `doc` with `copies` copies of page `page`.
///
/// All copies share the source page's content streams and resources. Objects
/// only reachable from the old tree are dropped.
pub fn repeat_page(doc: &mut Document, page: u32, copies: u32) -> Result<()> {
    if copies == 0 {
        return Err(Error::InvalidArgument(
            "Number of copies must be at least 1".to_string(),
        ));
    }

    let pages = doc.get_pages();
    let total = pages.len() as u32;
    let page_id = *pages
        .get(&page)
        .ok_or(Error::PageOutOfRange { page, total })?;

    let template = standalone_page(doc, page_id)?;
    tracing::debug!(page, total, copies, ?page_id, "replicating page");

    let pages_id = doc.new_object_id();
    let kids: Vec<Object> = (0..copies)
        .map(|_| {
            let mut copy = template.clone();
            copy.set("Parent", pages_id);
            Object::Reference(doc.add_object(copy))
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => copies as i64,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let pruned = doc.prune_objects();
    tracing::debug!(pruned = pruned.len(), "dropped unreachable objects");
    Ok(())
}

/// Load `options.input`, repeat the chosen page and write `options.output`.
/// Nothing is written when the page number is out of range.
pub fn replicate_page(options: &ReplicateOptions) -> Result<usize> {
    let mut doc = Document::load(&options.input)?;
    repeat_page(&mut doc, options.page, options.copies)?;
    doc.save(&options.output)?;
    Ok(doc.get_pages().len())
}
