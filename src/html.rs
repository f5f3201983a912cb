//! Fluent HTML output sink.
//!
//! A thin set of nested-scope writers over any [`io::Write`]: a document
//! opens a table, a table opens rows, a row opens cells, and each scope takes
//! a content-generating closure invoked synchronously before the closing tag
//! goes out. CSS classes and column spans are staged on the parent writer and
//! consumed by the next opened element. Plain text is always escaped; raw
//! writes are for pre-rendered fragments (markdown, links).

use std::io;

use crate::error::{Error, Result};

/// Attributes staged for the next opened element.
#[derive(Default)]
struct Attributes {
    class: Option<String>,
    column_span: Option<usize>,
}

impl Attributes {
    /// Render the staged attributes and reset them.
    fn take(&mut self) -> String {
        let mut rendered = String::new();
        if let Some(class) = self.class.take() {
            rendered.push_str(" class=\"");
            rendered.push_str(&html_escape::encode_double_quoted_attribute(&class));
            rendered.push('"');
        }
        if let Some(span) = self.column_span.take() {
            rendered.push_str(&format!(" colspan=\"{span}\""));
        }
        rendered
    }
}

/// Writes a complete HTML document to an underlying stream, once.
pub struct DocumentWriter<W: io::Write> {
    out: W,
    title: String,
    document_written: bool,
}

impl<W: io::Write> DocumentWriter<W> {
    pub fn new(title: impl Into<String>, out: W) -> Self {
        Self {
            out,
            title: title.into(),
            document_written: false,
        }
    }

    /// Create the document. May only be called once per writer instance.
    pub fn document<F>(&mut self, stylesheet: &str, generate: F) -> Result<()>
    where
        F: FnOnce(&mut ContentWriter<'_, W>) -> Result<()>,
    {
        if self.document_written {
            return Err(Error::DocumentAlreadyWritten);
        }
        self.document_written = true;

        write!(
            self.out,
            "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>{}</style>\n</head>\n<body>",
            html_escape::encode_text(&self.title),
            stylesheet,
        )?;
        generate(&mut ContentWriter {
            out: &mut self.out,
            pending: Attributes::default(),
        })?;
        write!(self.out, "</body>\n</html>\n")?;
        Ok(())
    }
}

/// Writes flow content: headings, text, raw fragments, tables.
pub struct ContentWriter<'a, W: io::Write> {
    out: &'a mut W,
    pending: Attributes,
}

impl<W: io::Write> ContentWriter<'_, W> {
    /// Stage a CSS class for the next opened element.
    pub fn class(&mut self, class: &str) {
        self.pending.class = Some(class.to_string());
    }

    /// Write a heading of the given depth.
    pub fn h(&mut self, depth: u8, text: &str) -> Result<()> {
        let attributes = self.pending.take();
        write!(
            self.out,
            "<h{depth}{attributes}>{}</h{depth}>",
            html_escape::encode_text(text)
        )?;
        Ok(())
    }

    /// Write plain text, with HTML special characters escaped.
    pub fn text(&mut self, text: &str) -> Result<()> {
        write!(self.out, "{}", html_escape::encode_text(text))?;
        Ok(())
    }

    /// Write a raw, pre-rendered HTML fragment verbatim.
    pub fn write_raw(&mut self, fragment: &str) -> Result<()> {
        write!(self.out, "{fragment}")?;
        Ok(())
    }

    /// Create a table.
    pub fn table<F>(&mut self, generate: F) -> Result<()>
    where
        F: FnOnce(&mut TableWriter<'_, W>) -> Result<()>,
    {
        let attributes = self.pending.take();
        write!(self.out, "<table{attributes}>")?;
        generate(&mut TableWriter {
            out: &mut *self.out,
            pending: Attributes::default(),
        })?;
        write!(self.out, "</table>")?;
        Ok(())
    }
}

/// Writes rows into an open table.
pub struct TableWriter<'a, W: io::Write> {
    out: &'a mut W,
    pending: Attributes,
}

impl<W: io::Write> TableWriter<'_, W> {
    /// Stage a CSS class for the next row.
    pub fn class(&mut self, class: &str) {
        self.pending.class = Some(class.to_string());
    }

    /// Create a table row.
    pub fn row<F>(&mut self, generate: F) -> Result<()>
    where
        F: FnOnce(&mut RowWriter<'_, W>) -> Result<()>,
    {
        let attributes = self.pending.take();
        write!(self.out, "<tr{attributes}>")?;
        generate(&mut RowWriter {
            out: &mut *self.out,
            pending: Attributes::default(),
        })?;
        write!(self.out, "</tr>")?;
        Ok(())
    }
}

/// Writes cells into an open table row.
pub struct RowWriter<'a, W: io::Write> {
    out: &'a mut W,
    pending: Attributes,
}

impl<W: io::Write> RowWriter<'_, W> {
    /// Stage a CSS class for the next cell.
    pub fn class(&mut self, class: &str) {
        self.pending.class = Some(class.to_string());
    }

    /// Stage a column span for the next cell.
    pub fn column_span(&mut self, count: usize) {
        self.pending.column_span = Some(count);
    }

    /// Create a table cell.
    pub fn cell<F>(&mut self, generate: F) -> Result<()>
    where
        F: FnOnce(&mut ContentWriter<'_, W>) -> Result<()>,
    {
        let attributes = self.pending.take();
        write!(self.out, "<td{attributes}>")?;
        generate(&mut ContentWriter {
            out: &mut *self.out,
            pending: Attributes::default(),
        })?;
        write!(self.out, "</td>")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render<F>(generate: F) -> String
    where
        F: FnOnce(&mut DocumentWriter<&mut Vec<u8>>) -> Result<()>,
    {
        let mut buffer = Vec::new();
        let mut writer = DocumentWriter::new("Test", &mut buffer);
        generate(&mut writer).expect("rendering should succeed");
        String::from_utf8(buffer).expect("output should be UTF-8")
    }

    #[test]
    fn writes_nested_document_structure() {
        let output = render(|doc| {
            doc.document("", |content| {
                content.h(1, "Features")?;
                content.table(|table| {
                    table.row(|row| {
                        row.cell(|cell| cell.text("hello"))
                    })
                })
            })
        });
        assert!(output.starts_with("<!DOCTYPE html>"));
        assert!(output.contains("<h1>Features</h1>"));
        assert!(output.contains("<table><tr><td>hello</td></tr></table>"));
        assert!(output.ends_with("</body>\n</html>\n"));
    }

    #[test]
    fn rejects_a_second_document() {
        let mut buffer = Vec::new();
        let mut writer = DocumentWriter::new("Test", &mut buffer);
        writer.document("", |_| Ok(())).expect("first document");
        assert!(matches!(
            writer.document("", |_| Ok(())),
            Err(Error::DocumentAlreadyWritten)
        ));
    }

    #[test]
    fn escapes_text_but_not_raw_fragments() {
        let output = render(|doc| {
            doc.document("", |content| {
                content.text("a < b & c")?;
                content.write_raw("<em>kept</em>")
            })
        });
        assert!(output.contains("a &lt; b &amp; c"));
        assert!(output.contains("<em>kept</em>"));
    }

    #[test]
    fn staged_attributes_are_consumed_by_the_next_element_only() {
        let output = render(|doc| {
            doc.document("", |content| {
                content.table(|table| {
                    table.class("heading");
                    table.row(|row| {
                        row.column_span(3);
                        row.class("wide");
                        row.cell(|cell| cell.text("spanned"))?;
                        row.cell(|cell| cell.text("plain"))
                    })?;
                    table.row(|row| row.cell(|cell| cell.text("second")))
                })
            })
        });
        assert!(output.contains("<tr class=\"heading\">"));
        assert!(output.contains("<td class=\"wide\" colspan=\"3\">spanned</td>"));
        assert!(output.contains("<td>plain</td>"));
        assert!(output.contains("<tr><td>second</td></tr>"));
    }

    #[test]
    fn escapes_attribute_values() {
        let output = render(|doc| {
            doc.document("", |content| {
                content.table(|table| {
                    table.class("a\"b");
                    table.row(|_| Ok(()))
                })
            })
        });
        assert!(output.contains("class=\"a&quot;b\""));
    }
}
