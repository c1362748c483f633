//! Script and stylesheet references in a fetched document

use lazy_static::lazy_static;
use scraper::{Html, Selector};

use crate::artifact::ArtifactKind;

lazy_static! {
    // Hardcoded and syntactically valid; a parse failure is a bug in the string.
    static ref ASSET_SELECTOR: Selector =
        Selector::parse("script[src], link[href]")
            .expect("BUG: hardcoded selector 'script[src], link[href]' is invalid");
}

/// An external asset referenced by the document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetReference {
    /// Attribute value as written, not yet resolved
    pub href: String,
    pub kind: ArtifactKind,
}

/// Collect `<script src>` and `<link rel=stylesheet href>` references in
/// document order.
///
/// Inline scripts, `<link>` elements without a `stylesheet` rel token and
/// empty attributes are ignored. Only this one document is examined; linked
/// pages are never followed.
#[must_use]
pub fn extract_asset_references(html: &str) -> Vec<AssetReference> {
    let document = Html::parse_document(html);
    let mut references = Vec::new();

    for element in document.select(&ASSET_SELECTOR) {
        let value = element.value();
        let reference = match value.name() {
            "script" => value.attr("src").map(|src| (src, ArtifactKind::Js)),
            "link" if is_stylesheet(value.attr("rel")) => {
                value.attr("href").map(|href| (href, ArtifactKind::Css))
            }
            _ => None,
        };

        if let Some((href, kind)) = reference {
            let href = href.trim();
            if !href.is_empty() {
                references.push(AssetReference {
                    href: href.to_string(),
                    kind,
                });
            }
        }
    }

    references
}

fn is_stylesheet(rel: Option<&str>) -> bool {
    rel.is_some_and(|rel| {
        rel.split_ascii_whitespace()
            .any(|token| token.eq_ignore_ascii_case("stylesheet"))
    })
}
