use html5ever::parse_document;
use html5ever::serialize::{SerializeOpts, serialize};
use html5ever::tendril::TendrilSink;
use markup5ever_rcdom::{Handle, NodeData, RcDom, SerializableHandle};
use once_cell::sync::Lazy;
use std::collections::HashSet;
use thiserror::Error;

/// Line width handed to the markdown renderer.
pub const TEXT_WIDTH: usize = 80;

/// Pages nested deeper than this are rejected rather than rendered.
pub const MAX_DOM_DEPTH: usize = 1024;

/// Elements that never carry page content.
static DENYLIST: Lazy<HashSet<&'static str>> =
    Lazy::new(|| HashSet::from(["nav", "footer", "aside", "script", "style", "form"]));

#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("could not parse page markup: {0}")]
    Parse(#[source] std::io::Error),
    #[error("could not serialize cleaned markup: {0}")]
    Serialize(#[source] std::io::Error),
    #[error("cleaned markup is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("page markup is nested deeper than {0} elements")]
    TooDeep(usize),
    #[error("could not convert markup to text: {0}")]
    Convert(#[from] html2text::Error),
}

/// Converts one page of raw markup into text.
pub trait TextExtractor: Send + Sync {
    fn extract(&self, html: &str) -> Result<String, ExtractError>;
}

/// Strips non-content elements and renders the rest as markdown.
#[derive(Debug, Default, Clone, Copy)]
pub struct ContentExtractor;

impl ContentExtractor {
    pub fn get_dom(html: &str) -> Result<RcDom, ExtractError> {
        parse_document(RcDom::default(), Default::default())
            .from_utf8()
            .read_from(&mut std::io::Cursor::new(html))
            .map_err(ExtractError::Parse)
    }

    pub fn is_denylisted(handle: &Handle) -> bool {
        match &handle.data {
            NodeData::Element { name, .. } => DENYLIST.contains(&*name.local),
            _ => false,
        }
    }

    /// Detaches every denylisted element, with its whole subtree, below `handle`.
    ///
    /// Walks with an explicit stack so hostile nesting cannot exhaust the
    /// thread stack. Fails once the walk goes past `max_depth`.
    pub fn strip_denylisted(handle: &Handle, max_depth: usize) -> Result<(), ExtractError> {
        let mut stack = vec![(handle.clone(), 0usize)];
        while let Some((node, depth)) = stack.pop() {
            if depth > max_depth {
                return Err(ExtractError::TooDeep(max_depth));
            }
            node.children
                .borrow_mut()
                .retain(|child| !Self::is_denylisted(child));
            for child in node.children.borrow().iter() {
                stack.push((child.clone(), depth + 1));
            }

            // <template> keeps its children in a separate fragment.
            if let NodeData::Element {
                template_contents, ..
            } = &node.data
            {
                if let Some(contents) = template_contents.borrow().as_ref() {
                    stack.push((contents.clone(), depth + 1));
                }
            }
        }
        Ok(())
    }

    pub fn serialize_dom(dom: &RcDom) -> Result<String, ExtractError> {
        let mut bytes = Vec::new();
        let document: SerializableHandle = dom.document.clone().into();
        serialize(&mut bytes, &document, SerializeOpts::default())
            .map_err(ExtractError::Serialize)?;
        Ok(String::from_utf8(bytes)?)
    }

    /// Parses, strips and serializes. The result is the markup that gets
    /// converted to text.
    pub fn clean(&self, html: &str) -> Result<String, ExtractError> {
        let dom = Self::get_dom(html)?;
        Self::strip_denylisted(&dom.document, MAX_DOM_DEPTH)?;
        Self::serialize_dom(&dom)
    }
}

impl TextExtractor for ContentExtractor {
    fn extract(&self, html: &str) -> Result<String, ExtractError> {
        let cleaned = self.clean(html)?;
        let text = html2text::from_read(cleaned.as_bytes(), TEXT_WIDTH)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_removes_denylisted_elements() {
        let html = r#"<html><head><style>body { color: red; }</style><script>alert('x')</script></head>
            <body>
            <nav><a href="/">Home</a></nav>
            <aside>Related posts</aside>
            <h1>Hello World</h1>
            <p>This is a test</p>
            <form><input name="q"></form>
            <footer>Copyright</footer>
            </body></html>"#;
        let cleaned = ContentExtractor.clean(html).unwrap();
        for tag in ["<nav", "<aside", "<script", "<style", "<form", "<footer"] {
            assert!(!cleaned.contains(tag), "{tag} survived: {cleaned}");
        }
        assert!(cleaned.contains("<h1>Hello World</h1>"));
        assert!(cleaned.contains("<p>This is a test</p>"));
    }

    #[test]
    fn test_clean_removes_nested_denylisted_elements() {
        let html = "<div><section><p>keep</p><div><nav>menu</nav></div></section></div>";
        let cleaned = ContentExtractor.clean(html).unwrap();
        assert!(cleaned.contains("keep"));
        assert!(!cleaned.contains("menu"));
    }

    #[test]
    fn test_extract_produces_readable_text() {
        let html = r#"<html><head><title>Weather</title></head><body>
            <h1>Forecast</h1>
            <p>Sunny with a high of 25 degrees.</p>
            <script>var tracking = true;</script>
            <footer>All rights reserved</footer>
            </body></html>"#;
        let text = ContentExtractor.extract(html).unwrap();
        assert!(text.contains("Forecast"));
        assert!(text.contains("Sunny with a high of 25 degrees."));
        assert!(!text.contains("tracking"));
        assert!(!text.contains("All rights reserved"));
    }

    #[test]
    fn test_extract_keeps_link_text() {
        let html = r#"<p>Read the <a href="https://example.com/docs">documentation</a> first.</p>"#;
        let text = ContentExtractor.extract(html).unwrap();
        assert!(text.contains("documentation"));
    }

    #[test]
    fn test_malformed_markup_does_not_fail() {
        let inputs = [
            "",
            "plain text, no tags",
            "<div><p>unclosed",
            "<<<>>></p></div></body>",
            "<html><body><nav>only navigation",
            "<scr<script>ipt>x</script>",
        ];
        for html in inputs {
            assert!(ContentExtractor.extract(html).is_ok(), "failed on {html:?}");
        }
    }

    fn nested_divs(depth: usize) -> String {
        format!("{}x{}", "<div>".repeat(depth), "</div>".repeat(depth))
    }

    /// Runs `f` on a thread with the same 2 MiB stack `spawn_blocking` uses.
    fn on_small_stack<T: Send + 'static>(f: impl FnOnce() -> T + Send + 'static) -> T {
        std::thread::Builder::new()
            .stack_size(2 * 1024 * 1024)
            .spawn(f)
            .unwrap()
            .join()
            .unwrap()
    }

    #[test]
    fn test_deeply_nested_markup_is_rejected_without_overflow() {
        let html = nested_divs(100_000);
        let res = on_small_stack(move || ContentExtractor.extract(&html));
        assert!(matches!(res, Err(ExtractError::TooDeep(MAX_DOM_DEPTH))), "got {res:?}");
    }

    #[test]
    fn test_strip_walks_deep_trees_iteratively() {
        let html = nested_divs(100_000);
        let res = on_small_stack(move || {
            let dom = ContentExtractor::get_dom(&html).unwrap();
            ContentExtractor::strip_denylisted(&dom.document, usize::MAX).is_ok()
        });
        assert!(res);
    }

    #[test]
    fn test_moderate_nesting_is_still_extracted() {
        let html = format!("<nav>menu</nav>{}", nested_divs(200));
        let text = ContentExtractor.extract(&html).unwrap();
        assert!(text.contains('x'));
        assert!(!text.contains("menu"));
    }

    #[test]
    fn test_unclosed_denylisted_element_swallows_rest() {
        let cleaned = ContentExtractor
            .clean("<body><p>before</p><aside>side<p>inside</p>")
            .unwrap();
        assert!(cleaned.contains("before"));
        assert!(!cleaned.contains("inside"));
    }
}
