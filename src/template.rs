//! Markup templates for the intermediate notes document.
//!
//! Rendering is a pure function of the markup format, the display width and
//! the ordered image list. The same inputs always give byte-identical text,
//! and there is no process-wide template state to initialise.
//!
//! Both templates produce a two-column table: the slide image on the left,
//! an empty cell for notes on the right, one row per slide in the order the
//! images are given.

use crate::config::{DisplayWidth, MarkupFormat};
use std::fmt::Write as _;
use std::path::Path;

/// Header of the Markdown pipe table.
pub const MARKDOWN_HEADER: &str = "| Slide | Notes |\n| --- | --- |\n";

/// Opening of the HTML page, up to and including `<table>`.
pub const HTML_HEAD: &str = r#"<!DOCTYPE html>
<html>
	<head>
		<meta charset="utf-8">
		<title>Presentation Notes</title>
	</head>
	<body>
		<table>
"#;

/// Closing of the HTML page.
pub const HTML_TAIL: &str = r#"		</table>
	</body>
</html>
"#;

/// Render the notes table for `images` in the given markup format.
pub fn render<P: AsRef<Path>>(format: MarkupFormat, width: DisplayWidth, images: &[P]) -> String {
    match format {
        MarkupFormat::Markdown => render_markdown(width, images),
        MarkupFormat::Html => render_html(width, images),
    }
}

fn render_markdown<P: AsRef<Path>>(width: DisplayWidth, images: &[P]) -> String {
    let mut out = String::with_capacity(MARKDOWN_HEADER.len() + images.len() * 64);
    out.push_str(MARKDOWN_HEADER);
    for image in images {
        let target = markdown_link_target(&image.as_ref().to_string_lossy());
        let _ = writeln!(out, "| ![]({target}){{ width={width} }} |  |");
    }
    out.push('\n');
    out
}

fn render_html<P: AsRef<Path>>(width: DisplayWidth, images: &[P]) -> String {
    let img_width = match width {
        DisplayWidth::Percent(p) => format!("{p}%"),
        DisplayWidth::Pixels(px) => px.to_string(),
    };
    let mut out = String::with_capacity(HTML_HEAD.len() + HTML_TAIL.len() + images.len() * 96);
    out.push_str(HTML_HEAD);
    for image in images {
        let src = escape_html(&image.as_ref().to_string_lossy());
        let _ = write!(
            out,
            "\t\t\t<tr>\n\
             \t\t\t\t<td width=\"50%\"><img src=\"{src}\" width=\"{img_width}\" /></td>\n\
             \t\t\t\t<td></td>\n\
             \t\t\t</tr>\n"
        );
    }
    out.push_str(HTML_TAIL);
    out
}

/// Paths with spaces or parentheses would end a Markdown link early;
/// pandoc accepts them inside `<…>`. A `|` would split the table cell, so it
/// is backslash-escaped along with backslashes themselves.
fn markdown_link_target(path: &str) -> String {
    let path = path.replace('\\', "\\\\").replace('|', "\\|");
    if path
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '(' | ')' | '<' | '>'))
    {
        let escaped = path.replace('<', "%3C").replace('>', "%3E");
        format!("<{escaped}>")
    } else {
        path
    }
}

fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
