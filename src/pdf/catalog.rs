//! Document-structure reads with lopdf
//!
//! Everything reachable from the trailer and the catalog that PDFium does
//! not expose through its high-level API: the raw /Info dictionary, the XMP
//! stream, the outline tree, the /PageLabels number tree and the named
//! destinations (/Names /Dests name tree plus the legacy /Dests dictionary).

use crate::error::Result;
use crate::pdf::document::{Destination, OutlineItem, PdfMetaData};
use lopdf::{Dictionary, Document, Object, ObjectId};
use std::collections::{BTreeMap, HashMap, HashSet};

/// Depth limit for outline, name and number trees (guards reference cycles)
const MAX_TREE_DEPTH: usize = 64;

/// Parse the document structure from raw bytes.
pub fn load(data: &[u8]) -> Result<Document> {
    Ok(Document::load_mem(data)?)
}

/// Resolve an indirect reference, returning the referenced object.
fn resolve<'a>(doc: &'a Document, obj: &'a Object) -> &'a Object {
    match obj {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(obj),
        _ => obj,
    }
}

fn resolve_dict<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a Dictionary> {
    resolve(doc, obj).as_dict().ok()
}

fn dict_entry<'a>(doc: &'a Document, dict: &'a Dictionary, key: &[u8]) -> Option<&'a Object> {
    dict.get(key).ok().map(|obj| resolve(doc, obj))
}

/// PDFDocEncoding code points 0x18..=0x1F (spacing diacritics)
const PDF_DOC_DIACRITICS: [u16; 8] = [
    0x02d8, 0x02c7, 0x02c6, 0x02d9, 0x02dd, 0x02db, 0x02da, 0x02dc,
];

/// PDFDocEncoding code points 0x80..=0x9F (0 marks an undefined code)
const PDF_DOC_HIGH: [u16; 32] = [
    0x2022, 0x2020, 0x2021, 0x2026, 0x2014, 0x2013, 0x0192, 0x2044, 0x2039, 0x203a, 0x2212,
    0x2030, 0x201e, 0x201c, 0x201d, 0x2018, 0x2019, 0x201a, 0x2122, 0xfb01, 0xfb02, 0x0141,
    0x0152, 0x0160, 0x0178, 0x017d, 0x0131, 0x0142, 0x0153, 0x0161, 0x017e, 0x0000,
];

/// Map one PDFDocEncoding byte to its character.
fn pdf_doc_char(byte: u8) -> char {
    let code = match byte {
        0x18..=0x1F => PDF_DOC_DIACRITICS[(byte - 0x18) as usize],
        0x80..=0x9F => PDF_DOC_HIGH[(byte - 0x80) as usize],
        0xA0 => 0x20ac,
        0x7F | 0xAD => 0,
        _ => byte as u16,
    };
    match code {
        0 if byte != 0 => char::REPLACEMENT_CHARACTER,
        code => char::from_u32(code as u32).unwrap_or(char::REPLACEMENT_CHARACTER),
    }
}

/// Decode a PDF text string: UTF-16BE with BOM, else UTF-8, else PDFDocEncoding.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if bytes.len() >= 2 && bytes[0] == 0xFE && bytes[1] == 0xFF {
        let units: Vec<u16> = bytes[2..]
            .chunks(2)
            .filter_map(|c| {
                if c.len() == 2 {
                    Some(u16::from_be_bytes([c[0], c[1]]))
                } else {
                    None
                }
            })
            .collect();
        String::from_utf16_lossy(&units)
    } else {
        match std::str::from_utf8(bytes) {
            Ok(s) => s.to_string(),
            Err(_) => bytes.iter().map(|&b| pdf_doc_char(b)).collect(),
        }
    }
}

fn text_of(obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(decode_pdf_string(bytes)),
        Object::Name(name) => Some(String::from_utf8_lossy(name).into_owned()),
        _ => None,
    }
}

fn number_of(obj: &Object) -> Option<f64> {
    match obj {
        Object::Integer(i) => Some(*i as f64),
        Object::Real(f) => Some((*f).into()),
        _ => None,
    }
}

fn page_numbers_by_id(doc: &Document) -> HashMap<ObjectId, u32> {
    doc.get_pages()
        .into_iter()
        .map(|(number, id)| (id, number))
        .collect()
}

// ============================================================================
// Metadata
// ============================================================================

/// Read the /Info dictionary and the catalog's XMP stream.
pub fn metadata(doc: &Document) -> Result<PdfMetaData> {
    let mut info = BTreeMap::new();

    if let Some(info_dict) = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| resolve_dict(doc, obj))
    {
        for (key, value) in info_dict.iter() {
            let value = match resolve(doc, value) {
                Object::Integer(i) => Some(i.to_string()),
                Object::Real(f) => Some(f.to_string()),
                Object::Boolean(b) => Some(b.to_string()),
                other => text_of(other),
            };
            match value {
                Some(v) => {
                    info.insert(String::from_utf8_lossy(key).into_owned(), v);
                }
                None => tracing::warn!(
                    key = %String::from_utf8_lossy(key),
                    "Skipping non-text /Info entry"
                ),
            }
        }
    }

    let catalog = doc.catalog()?;
    let metadata = match dict_entry(doc, catalog, b"Metadata") {
        Some(Object::Stream(stream)) => {
            let bytes = stream
                .decompressed_content()
                .unwrap_or_else(|_| stream.content.clone());
            Some(String::from_utf8_lossy(&bytes).into_owned())
        }
        _ => None,
    };

    Ok(PdfMetaData { info, metadata })
}

// ============================================================================
// Destinations
// ============================================================================

/// Parse an explicit destination array `[page, /Kind, args...]`.
fn parse_dest_array(
    doc: &Document,
    arr: &[Object],
    pages: &HashMap<ObjectId, u32>,
) -> Option<Destination> {
    let first = arr.first()?;
    let page = match first {
        Object::Reference(id) => pages.get(id).copied(),
        // Remote destinations carry a 0-based page index
        Object::Integer(index) if *index >= 0 => Some(*index as u32 + 1),
        _ => None,
    };

    let kind = arr
        .get(1)
        .map(|obj| resolve(doc, obj))
        .and_then(text_of)
        .unwrap_or_else(|| "Fit".to_string());

    let args = arr
        .iter()
        .skip(2)
        .map(|obj| number_of(resolve(doc, obj)))
        .collect();

    Some(Destination { page, kind, args })
}

/// Parse a destination value: an array, or a dictionary with a /D entry.
fn parse_dest_value(
    doc: &Document,
    value: &Object,
    pages: &HashMap<ObjectId, u32>,
) -> Option<Destination> {
    match resolve(doc, value) {
        Object::Array(arr) => parse_dest_array(doc, arr, pages),
        Object::Dictionary(dict) => match dict_entry(doc, dict, b"D") {
            Some(Object::Array(arr)) => parse_dest_array(doc, arr, pages),
            _ => None,
        },
        _ => None,
    }
}

fn collect_name_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    pages: &HashMap<ObjectId, u32>,
    out: &mut BTreeMap<String, Destination>,
) {
    if depth >= MAX_TREE_DEPTH {
        return;
    }

    if let Some(Object::Array(names)) = dict_entry(doc, node, b"Names") {
        for pair in names.chunks(2) {
            let [key, value] = pair else { break };
            let Some(name) = text_of(resolve(doc, key)) else {
                continue;
            };
            match parse_dest_value(doc, value, pages) {
                Some(dest) => {
                    out.entry(name).or_insert(dest);
                }
                None => tracing::warn!(name = %name, "Skipping unparsable named destination"),
            }
        }
    }

    if let Some(Object::Array(kids)) = dict_entry(doc, node, b"Kids") {
        for kid in kids {
            if let Object::Reference(id) = kid {
                if !visited.insert(*id) {
                    continue;
                }
            }
            if let Some(kid_dict) = resolve_dict(doc, kid) {
                collect_name_tree(doc, kid_dict, depth + 1, visited, pages, out);
            }
        }
    }
}

/// Collect all named destinations, sorted by name.
///
/// Entries of the /Names /Dests name tree take precedence over entries of
/// the legacy catalog /Dests dictionary with the same name.
pub fn destinations(doc: &Document) -> Result<BTreeMap<String, Destination>> {
    let catalog = doc.catalog()?;
    let pages = page_numbers_by_id(doc);
    let mut dests = BTreeMap::new();

    if let Some(tree) = dict_entry(doc, catalog, b"Names")
        .and_then(|names| names.as_dict().ok())
        .and_then(|names| dict_entry(doc, names, b"Dests"))
        .and_then(|tree| tree.as_dict().ok())
    {
        let mut visited = HashSet::new();
        collect_name_tree(doc, tree, 0, &mut visited, &pages, &mut dests);
    }

    if let Some(Object::Dictionary(legacy)) = dict_entry(doc, catalog, b"Dests") {
        for (key, value) in legacy.iter() {
            let name = String::from_utf8_lossy(key).into_owned();
            if dests.contains_key(&name) {
                continue;
            }
            if let Some(dest) = parse_dest_value(doc, value, &pages) {
                dests.insert(name, dest);
            }
        }
    }

    Ok(dests)
}

// ============================================================================
// Outline
// ============================================================================

struct OutlineContext<'a> {
    doc: &'a Document,
    pages: HashMap<ObjectId, u32>,
    named: BTreeMap<String, Destination>,
    visited: HashSet<ObjectId>,
}

impl OutlineContext<'_> {
    fn resolve_dest(&self, dest: &Object) -> Option<Destination> {
        match resolve(self.doc, dest) {
            Object::Array(arr) => parse_dest_array(self.doc, arr, &self.pages),
            other => text_of(other).and_then(|name| self.named.get(&name).cloned()),
        }
    }

    fn walk(&mut self, first: ObjectId, depth: usize) -> Vec<OutlineItem> {
        let doc = self.doc;
        let mut items = Vec::new();
        if depth >= MAX_TREE_DEPTH {
            return items;
        }

        let mut current = Some(first);
        while let Some(node_id) = current {
            if !self.visited.insert(node_id) {
                break;
            }
            let Some(node) = doc.get_object(node_id).ok().and_then(|o| o.as_dict().ok())
            else {
                break;
            };

            let title = dict_entry(doc, node, b"Title")
                .and_then(text_of)
                .unwrap_or_default();

            let mut dest = node.get(b"Dest").ok().and_then(|d| self.resolve_dest(d));
            let mut url = None;
            if let Some(action) = dict_entry(doc, node, b"A").and_then(|a| a.as_dict().ok())
            {
                match dict_entry(doc, action, b"S").and_then(text_of).as_deref() {
                    Some("GoTo") if dest.is_none() => {
                        dest = action.get(b"D").ok().and_then(|d| self.resolve_dest(d));
                    }
                    Some("URI") => {
                        url = dict_entry(doc, action, b"URI").and_then(text_of);
                    }
                    _ => {}
                }
            }

            let flags = match dict_entry(doc, node, b"F") {
                Some(Object::Integer(f)) => *f,
                _ => 0,
            };

            let children = match node.get(b"First") {
                Ok(Object::Reference(child)) => self.walk(*child, depth + 1),
                _ => Vec::new(),
            };

            items.push(OutlineItem {
                title,
                dest,
                url,
                italic: flags & 1 != 0,
                bold: flags & 2 != 0,
                items: children,
            });

            current = match node.get(b"Next") {
                Ok(Object::Reference(next)) => Some(*next),
                _ => None,
            };
        }

        items
    }
}

/// Read the outline tree; `None` when the document has no outline items.
pub fn outline(doc: &Document) -> Result<Option<Vec<OutlineItem>>> {
    let catalog = doc.catalog()?;

    let first = match dict_entry(doc, catalog, b"Outlines")
        .and_then(|o| o.as_dict().ok())
        .and_then(|outlines| outlines.get(b"First").ok())
    {
        Some(Object::Reference(id)) => *id,
        _ => return Ok(None),
    };

    let mut ctx = OutlineContext {
        doc,
        pages: page_numbers_by_id(doc),
        named: destinations(doc)?,
        visited: HashSet::new(),
    };
    let items = ctx.walk(first, 0);

    Ok(if items.is_empty() { None } else { Some(items) })
}

// ============================================================================
// Page labels
// ============================================================================

/// Numbering style of a page-label range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LabelStyle {
    Decimal,
    UpperRoman,
    LowerRoman,
    UpperLetters,
    LowerLetters,
    None,
}

#[derive(Debug, Clone)]
struct LabelRange {
    start_index: u32,
    style: LabelStyle,
    prefix: String,
    first_number: u64,
}

fn collect_number_tree(
    doc: &Document,
    node: &Dictionary,
    depth: usize,
    visited: &mut HashSet<ObjectId>,
    out: &mut Vec<LabelRange>,
) {
    if depth >= MAX_TREE_DEPTH {
        return;
    }

    if let Some(Object::Array(nums)) = dict_entry(doc, node, b"Nums") {
        for pair in nums.chunks(2) {
            let [key, value] = pair else { break };
            let Object::Integer(start) = resolve(doc, key) else {
                continue;
            };
            let Some(label) = resolve_dict(doc, value) else {
                continue;
            };
            if *start < 0 {
                continue;
            }

            let style = match dict_entry(doc, label, b"S").and_then(text_of).as_deref() {
                Some("D") => LabelStyle::Decimal,
                Some("R") => LabelStyle::UpperRoman,
                Some("r") => LabelStyle::LowerRoman,
                Some("A") => LabelStyle::UpperLetters,
                Some("a") => LabelStyle::LowerLetters,
                _ => LabelStyle::None,
            };
            let prefix = dict_entry(doc, label, b"P")
                .and_then(text_of)
                .unwrap_or_default();
            let first_number = match dict_entry(doc, label, b"St") {
                Some(Object::Integer(st)) if *st >= 1 => *st as u64,
                _ => 1,
            };

            out.push(LabelRange {
                start_index: *start as u32,
                style,
                prefix,
                first_number,
            });
        }
    }

    if let Some(Object::Array(kids)) = dict_entry(doc, node, b"Kids") {
        for kid in kids {
            if let Object::Reference(id) = kid {
                if !visited.insert(*id) {
                    continue;
                }
            }
            if let Some(kid_dict) = resolve_dict(doc, kid) {
                collect_number_tree(doc, kid_dict, depth + 1, visited, out);
            }
        }
    }
}

/// Largest number written in roman numerals; larger ones fall back to decimal
const MAX_ROMAN: u64 = 3999;

/// Longest letter label (`n` up to 26 * this); larger ones fall back to decimal
const MAX_LETTER_REPEAT: u64 = 64;

fn to_roman(mut n: u64) -> String {
    const NUMERALS: [(u64, &str); 13] = [
        (1000, "M"),
        (900, "CM"),
        (500, "D"),
        (400, "CD"),
        (100, "C"),
        (90, "XC"),
        (50, "L"),
        (40, "XL"),
        (10, "X"),
        (9, "IX"),
        (5, "V"),
        (4, "IV"),
        (1, "I"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// A..Z, then AA..ZZ, then AAA..ZZZ, ...
fn to_letters(n: u64) -> String {
    if n == 0 {
        return String::new();
    }
    let letter = (b'A' + ((n - 1) % 26) as u8) as char;
    let count = ((n - 1) / 26 + 1) as usize;
    std::iter::repeat(letter).take(count).collect()
}

fn format_label(range: &LabelRange, page_index: u32) -> String {
    let offset = u64::from(page_index.saturating_sub(range.start_index));
    let n = range.first_number.saturating_add(offset);
    let number = match range.style {
        LabelStyle::Decimal => n.to_string(),
        LabelStyle::UpperRoman | LabelStyle::LowerRoman if n > MAX_ROMAN => n.to_string(),
        LabelStyle::UpperLetters | LabelStyle::LowerLetters if n > 26 * MAX_LETTER_REPEAT => {
            n.to_string()
        }
        LabelStyle::UpperRoman => to_roman(n),
        LabelStyle::LowerRoman => to_roman(n).to_lowercase(),
        LabelStyle::UpperLetters => to_letters(n),
        LabelStyle::LowerLetters => to_letters(n).to_lowercase(),
        LabelStyle::None => String::new(),
    };
    format!("{}{}", range.prefix, number)
}

/// Compute one label per page; `None` when the document defines no labels.
///
/// Pages before the first labelled range get their 1-based number.
pub fn page_labels(doc: &Document, num_pages: u32) -> Result<Option<Vec<String>>> {
    let catalog = doc.catalog()?;

    let Some(tree) = dict_entry(doc, catalog, b"PageLabels").and_then(|t| t.as_dict().ok())
    else {
        return Ok(None);
    };

    let mut ranges = Vec::new();
    let mut visited = HashSet::new();
    collect_number_tree(doc, tree, 0, &mut visited, &mut ranges);
    if ranges.is_empty() {
        return Ok(None);
    }
    ranges.sort_by_key(|r| r.start_index);

    let labels = (0..num_pages)
        .map(|index| {
            ranges
                .iter()
                .rev()
                .find(|r| r.start_index <= index)
                .map(|r| format_label(r, index))
                .unwrap_or_else(|| (index + 1).to_string())
        })
        .collect();

    Ok(Some(labels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::{dictionary, StringFormat};

    /// Build a document with `page_count` empty pages; `extend` may add
    /// entries to the catalog before it is stored.
    fn build_doc(
        page_count: usize,
        extend: impl FnOnce(&mut Document, &[ObjectId], &mut Dictionary),
    ) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id: ObjectId = doc.new_object_id();

        let mut page_ids = Vec::new();
        for _ in 0..page_count {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            page_ids.push(page_id);
        }

        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => page_ids.iter().map(|id| Object::Reference(*id)).collect::<Vec<_>>(),
                "Count" => page_count as i64,
            }),
        );

        let mut catalog = dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        };
        extend(&mut doc, &page_ids, &mut catalog);
        let catalog_id = doc.add_object(catalog);
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn text(s: &str) -> Object {
        Object::String(s.as_bytes().to_vec(), StringFormat::Literal)
    }

    #[test]
    fn test_page_labels_absent() {
        let doc = build_doc(2, |_, _, _| {});
        assert_eq!(page_labels(&doc, 2).unwrap(), None);
    }

    #[test]
    fn test_page_labels_roman_then_decimal() {
        let doc = build_doc(6, |_, _, catalog| {
            catalog.set(
                "PageLabels",
                dictionary! {
                    "Nums" => vec![
                        0.into(), Object::Dictionary(dictionary! { "S" => "r" }),
                        3.into(), Object::Dictionary(dictionary! { "S" => "D", "St" => 1 }),
                        5.into(), Object::Dictionary(dictionary! { "S" => "A", "P" => text("App-") }),
                    ],
                },
            );
        });

        let labels = page_labels(&doc, 6).unwrap().unwrap();
        assert_eq!(labels, vec!["i", "ii", "iii", "1", "2", "App-A"]);
    }

    #[test]
    fn test_page_labels_prefix_only_and_start() {
        let doc = build_doc(3, |_, _, catalog| {
            catalog.set(
                "PageLabels",
                dictionary! {
                    "Nums" => vec![
                        0.into(), Object::Dictionary(dictionary! { "P" => text("Cover") }),
                        1.into(), Object::Dictionary(dictionary! { "S" => "D", "St" => 10 }),
                    ],
                },
            );
        });

        let labels = page_labels(&doc, 3).unwrap().unwrap();
        assert_eq!(labels, vec!["Cover", "10", "11"]);
    }

    #[test]
    fn test_letters_and_roman_formatting() {
        assert_eq!(to_letters(1), "A");
        assert_eq!(to_letters(26), "Z");
        assert_eq!(to_letters(27), "AA");
        assert_eq!(to_letters(53), "AAA");
        assert_eq!(to_roman(1994), "MCMXCIV");
        assert_eq!(to_roman(4), "IV");
    }

    #[test]
    fn test_page_labels_with_huge_start_number() {
        let doc = build_doc(2, |_, _, catalog| {
            catalog.set(
                "PageLabels",
                dictionary! {
                    "Nums" => vec![
                        0.into(), Object::Dictionary(dictionary! { "S" => "D", "St" => 4294967295_i64 }),
                    ],
                },
            );
        });

        let labels = page_labels(&doc, 2).unwrap().unwrap();
        assert_eq!(labels, vec!["4294967295", "4294967296"]);
    }

    #[test]
    fn test_page_labels_huge_roman_and_letters_fall_back_to_decimal() {
        let doc = build_doc(2, |_, _, catalog| {
            catalog.set(
                "PageLabels",
                dictionary! {
                    "Nums" => vec![
                        0.into(), Object::Dictionary(dictionary! { "S" => "R", "St" => 3999 }),
                        1.into(), Object::Dictionary(dictionary! { "S" => "a", "St" => i64::MAX }),
                    ],
                },
            );
        });

        let labels = page_labels(&doc, 2).unwrap().unwrap();
        assert_eq!(labels, vec!["MMMCMXCIX".to_string(), i64::MAX.to_string()]);
    }

    #[test]
    fn test_decode_pdf_doc_encoding() {
        assert_eq!(decode_pdf_string(b"caf\xe9"), "caf\u{e9}");
        assert_eq!(
            decode_pdf_string(&[0x80, b' ', 0x84, b' ', 0x93]),
            "\u{2022} \u{2014} \u{fb01}"
        );
        assert_eq!(decode_pdf_string(&[0x18, 0x1F, 0xA0]), "\u{2d8}\u{2dc}\u{20ac}");
        assert_eq!(decode_pdf_string(&[0x9F, 0xE9]), "\u{fffd}\u{e9}");
        assert_eq!(decode_pdf_string("Stra\u{df}e".as_bytes()), "Stra\u{df}e");
    }

    #[test]
    fn test_named_destinations_from_name_tree_and_legacy_dict() {
        let doc = build_doc(3, |doc, pages, catalog| {
            let intro = Object::Array(vec![
                Object::Reference(pages[1]),
                "XYZ".into(),
                0.into(),
                Object::Real(700.0),
                Object::Null,
            ]);
            let tree = doc.add_object(dictionary! {
                "Names" => vec![text("intro"), intro],
            });
            catalog.set("Names", dictionary! { "Dests" => tree });
            catalog.set(
                "Dests",
                dictionary! {
                    "legacy" => Object::Dictionary(dictionary! {
                        "D" => vec![Object::Reference(pages[2]), "Fit".into()],
                    }),
                    "intro" => vec![Object::Reference(pages[0]), "Fit".into()],
                },
            );
        });

        let dests = destinations(&doc).unwrap();
        assert_eq!(dests.len(), 2);

        let intro = &dests["intro"];
        assert_eq!(intro.page, Some(2));
        assert_eq!(intro.kind, "XYZ");
        assert_eq!(intro.args, vec![Some(0.0), Some(700.0), None]);

        let legacy = &dests["legacy"];
        assert_eq!(legacy.page, Some(3));
        assert_eq!(legacy.kind, "Fit");
        assert!(legacy.args.is_empty());
    }

    #[test]
    fn test_outline_tree_with_named_and_uri_targets() {
        let doc = build_doc(2, |doc, pages, catalog| {
            let outlines_id = doc.new_object_id();
            let first_id = doc.new_object_id();
            let second_id = doc.new_object_id();
            let child_id = doc.new_object_id();

            let tree = doc.add_object(dictionary! {
                "Names" => vec![text("ch2"), Object::Array(vec![Object::Reference(pages[1]), "Fit".into()])],
            });
            catalog.set("Names", dictionary! { "Dests" => tree });

            doc.objects.insert(
                child_id,
                Object::Dictionary(dictionary! {
                    "Title" => text("Section 1.1"),
                    "Parent" => first_id,
                    "Dest" => vec![Object::Reference(pages[0]), "FitH".into(), 500.into()],
                }),
            );
            doc.objects.insert(
                first_id,
                Object::Dictionary(dictionary! {
                    "Title" => text("Chapter 1"),
                    "Parent" => outlines_id,
                    "Next" => second_id,
                    "First" => child_id,
                    "F" => 2,
                    "A" => dictionary! { "S" => "GoTo", "D" => text("ch2") },
                }),
            );
            doc.objects.insert(
                second_id,
                Object::Dictionary(dictionary! {
                    "Title" => text("Website"),
                    "Parent" => outlines_id,
                    "A" => dictionary! { "S" => "URI", "URI" => text("https://example.com") },
                }),
            );
            doc.objects.insert(
                outlines_id,
                Object::Dictionary(dictionary! {
                    "Type" => "Outlines",
                    "First" => first_id,
                    "Last" => second_id,
                }),
            );
            catalog.set("Outlines", outlines_id);
        });

        let items = outline(&doc).unwrap().unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0].title, "Chapter 1");
        assert!(items[0].bold);
        assert!(!items[0].italic);
        assert_eq!(items[0].dest.as_ref().and_then(|d| d.page), Some(2));
        assert_eq!(items[0].items.len(), 1);
        assert_eq!(items[0].items[0].title, "Section 1.1");
        assert_eq!(
            items[0].items[0].dest.as_ref().map(|d| d.args.clone()),
            Some(vec![Some(500.0)])
        );

        assert_eq!(items[1].url.as_deref(), Some("https://example.com"));
        assert!(items[1].dest.is_none());
    }

    #[test]
    fn test_outline_absent() {
        let doc = build_doc(1, |_, _, _| {});
        assert_eq!(outline(&doc).unwrap(), None);
    }

    #[test]
    fn test_metadata_info_dictionary() {
        let mut doc = build_doc(1, |_, _, _| {});
        let utf16_title: Vec<u8> = [0xFE, 0xFF]
            .into_iter()
            .chain("Été".encode_utf16().flat_map(|u| u.to_be_bytes()))
            .collect();
        let info = doc.add_object(dictionary! {
            "Title" => Object::String(utf16_title, StringFormat::Hexadecimal),
            "Author" => text("Jane Doe"),
            "Trapped" => "False",
            "Pages" => 1,
        });
        doc.trailer.set("Info", info);

        let meta = metadata(&doc).unwrap();
        assert_eq!(meta.info["Title"], "Été");
        assert_eq!(meta.info["Author"], "Jane Doe");
        assert_eq!(meta.info["Trapped"], "False");
        assert_eq!(meta.info["Pages"], "1");
        assert_eq!(meta.metadata, None);
    }

    #[test]
    fn test_load_rejects_garbage() {
        assert!(load(b"not a pdf").is_err());
    }
}
