// src/crawl/document.rs
// =============================================================================
// One fetched catalog page, parsed.
//
// Two jobs:
// 1. links(): pull out everything the rewriting subtasks need (images, nav
//    anchors, detail links, sidebar categories, pagination) as plain data
// 2. render(): write the page back out as HTML, with some anchors' href
//    replaced
//
// scraper's tree is read-only, so instead of editing it in place the
// subtasks return HrefEdits ("element #42 gets href X") and render() swaps
// them in while serializing.
//
// We use the `scraper` crate for parsing and CSS selectors, and html5ever's
// serializer (the same one scraper uses for Html::html()) for output.
//
// Rust concepts:
// - Lifetimes: ElementRef<'a> borrows from the parsed document
// - Iterators: filter_map / filter chains over child nodes
// - Trait impls: we implement html5ever's Serialize for our own type
// =============================================================================

use ego_tree::iter::Edge;
use ego_tree::NodeId;
use html5ever::serialize::{serialize, Serialize, SerializeOpts, Serializer, TraversalScope};
use html5ever::{LocalName, Namespace, QualName};
use scraper::{ElementRef, Html, Node, Selector};
use std::collections::{HashMap, HashSet};
use std::io;

const HTML_NAMESPACE: &str = "http://www.w3.org/1999/xhtml";

// An <a> element the rewriter may change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Anchor {
    /// Identifies the element inside this document
    pub node: NodeId,
    /// Link text, whitespace trimmed
    pub text: String,
    /// href exactly as written in the page
    pub href: String,
}

// "Give element `node` this href when writing the page out"
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HrefEdit {
    pub node: NodeId,
    pub href: String,
}

// Everything the rewriting subtasks read from a page
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    /// src of every <img>
    pub images: Vec<String>,
    /// Anchors whose text is "next" or "previous"
    pub nav: Vec<Anchor>,
    /// Anchors whose text is "Home"
    pub home: Vec<Anchor>,
    /// First link inside each div.image_container (book detail pages)
    pub details: Vec<String>,
    /// Category links from the sidebar, in page order, no duplicates
    pub categories: Vec<String>,
    /// href of the "next" pagination link, if any
    pub next_page: Option<String>,
    /// N from the "Page 1 of N" label, if any
    pub page_count: Option<u32>,
}

pub struct PageDocument {
    html: Html,
}

impl PageDocument {
    pub fn parse(html: &str) -> Self {
        Self {
            html: Html::parse_document(html),
        }
    }

    pub fn links(&self) -> PageLinks {
        PageLinks {
            images: self.image_sources(),
            nav: self.anchors_where(|text| text == "next" || text == "previous"),
            home: self.anchors_where(|text| text == "Home"),
            details: self.detail_hrefs(),
            categories: self.sidebar_hrefs(),
            next_page: self.next_page_href(),
            page_count: self.page_count(),
        }
    }

    // Serializes the document, applying `edits` to the matching anchors
    pub fn render(&self, edits: &[HrefEdit]) -> io::Result<String> {
        let rewritten = Rewritten {
            html: &self.html,
            hrefs: edits.iter().map(|edit| (edit.node, edit.href.as_str())).collect(),
        };

        let mut out = Vec::new();
        serialize(&mut out, &rewritten, SerializeOpts::default())?;
        String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }

    fn image_sources(&self) -> Vec<String> {
        self.html
            .select(&selector("img[src]"))
            .filter_map(|img| img.value().attr("src"))
            .filter(|src| !src.trim().is_empty())
            .map(str::to_string)
            .collect()
    }

    // Anchors with an href whose trimmed text passes `keep`
    fn anchors_where(&self, keep: impl Fn(&str) -> bool) -> Vec<Anchor> {
        self.html
            .select(&selector("a[href]"))
            .filter_map(|a| {
                let text = a.text().collect::<String>().trim().to_string();
                if !keep(&text) {
                    return None;
                }
                let href = a.value().attr("href")?.to_string();
                Some(Anchor {
                    node: a.id(),
                    text,
                    href,
                })
            })
            .collect()
    }

    fn detail_hrefs(&self) -> Vec<String> {
        let link = selector("a[href]");
        self.html
            .select(&selector("div.image_container"))
            .filter_map(|container| container.select(&link).next())
            .filter_map(|a| a.value().attr("href"))
            .map(str::to_string)
            .collect()
    }

    // Walks the two-level category list in the sidebar:
    //
    //   div.side_categories
    //     ul
    //       li  <a>Books</a>          <- level one
    //         ul
    //           li  <a>Travel</a>     <- level two
    //
    // Only direct children are followed, so a list nested any deeper is
    // never picked up, and each <li> contributes only its own anchor.
    fn sidebar_hrefs(&self) -> Vec<String> {
        let mut hrefs = Vec::new();

        for sidebar in self.html.select(&selector("div.side_categories")) {
            for list in child_elements(sidebar, "ul") {
                for item in child_elements(list, "li") {
                    hrefs.extend(own_anchor_href(item));

                    for sub_list in child_elements(item, "ul") {
                        for sub_item in child_elements(sub_list, "li") {
                            hrefs.extend(own_anchor_href(sub_item));
                        }
                    }
                }
            }
        }

        let mut seen = HashSet::new();
        hrefs.retain(|href| seen.insert(href.clone()));
        hrefs
    }

    fn next_page_href(&self) -> Option<String> {
        self.html
            .select(&selector("li.next > a[href]"))
            .next()
            .and_then(|a| a.value().attr("href"))
            .map(str::to_string)
    }

    fn page_count(&self) -> Option<u32> {
        let label = self.html.select(&selector("li.current")).next()?;
        trailing_number(&label.text().collect::<String>())
    }
}

// Every selector in this module is a string literal we know is valid CSS,
// so a parse failure here is a programmer error.
fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("selector literal must be valid CSS")
}

fn child_elements<'a>(
    parent: ElementRef<'a>,
    tag: &'static str,
) -> impl Iterator<Item = ElementRef<'a>> + 'a {
    parent
        .children()
        .filter_map(ElementRef::wrap)
        .filter(move |child| child.value().name() == tag)
}

// href of the <a> that is a direct child of `item`
fn own_anchor_href(item: ElementRef<'_>) -> Option<String> {
    child_elements(item, "a")
        .next()
        .and_then(|a| a.value().attr("href"))
        .filter(|href| !href.trim().is_empty())
        .map(str::to_string)
}

// "Page 1 of 50" -> Some(50)
fn trailing_number(text: &str) -> Option<u32> {
    text.split(|c: char| !c.is_ascii_digit())
        .filter(|digits| !digits.is_empty())
        .last()?
        .parse()
        .ok()
}

// The document plus the hrefs to substitute, ready for html5ever
struct Rewritten<'a> {
    html: &'a Html,
    hrefs: HashMap<NodeId, &'a str>,
}

impl Serialize for Rewritten<'_> {
    fn serialize<S>(&self, serializer: &mut S, _scope: TraversalScope) -> io::Result<()>
    where
        S: Serializer,
    {
        for edge in self.html.tree.root().traverse() {
            match edge {
                Edge::Open(node) => match node.value() {
                    Node::Doctype(doctype) => serializer.write_doctype(doctype.name())?,
                    Node::Comment(comment) => serializer.write_comment(comment)?,
                    Node::Text(text) => serializer.write_text(text)?,
                    Node::Element(element) => {
                        let new_href = self.hrefs.get(&node.id()).copied();
                        let attrs: Vec<(QualName, &str)> = element
                            .attrs()
                            .map(|(name, value)| match new_href {
                                Some(href) if name == "href" => (attribute_name(name), href),
                                _ => (attribute_name(name), value),
                            })
                            .collect();

                        serializer.start_elem(
                            element_name(element.name()),
                            attrs.iter().map(|(name, value)| (name, *value)),
                        )?;
                    }
                    _ => {}
                },
                Edge::Close(node) => {
                    if let Node::Element(element) = node.value() {
                        serializer.end_elem(element_name(element.name()))?;
                    }
                }
            }
        }

        Ok(())
    }
}

fn element_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(HTML_NAMESPACE), LocalName::from(local))
}

fn attribute_name(local: &str) -> QualName {
    QualName::new(None, Namespace::from(""), LocalName::from(local))
}

// -----------------------------------------------------------------------------
// BEGINNER NOTES:
//
// 1. What is ElementRef::wrap?
//    - children() yields every child node: elements, text, comments
//    - wrap() returns Some(ElementRef) only for elements
//    - Used with filter_map it throws the other node kinds away
//
// 2. Why doesn't render() take &mut self?
//    - The edits are applied on the way out, the tree itself never changes
//    - So the same document could be rendered twice with different edits
//
// 3. What is traverse() and Edge?
//    - A depth-first walk that reports each node twice: Open when entering,
//      Close when leaving
//    - That maps directly onto writing "<tag ...>" and "</tag>"
//
// 4. Why collect the attributes into a Vec first?
//    - start_elem() wants references to QualNames
//    - The QualNames are built on the fly, so something has to own them
//      while the serializer borrows them
// -----------------------------------------------------------------------------
