//! Incremental JSON text rendering from canonical events.

use tracing::debug;

use crate::traversal::{traverse, Event, EventSink, Path};
use crate::value::{quote, CanonicalValue};

/// Formatting options for [`JsonEmitter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonProps {
    /// Spaces per nesting level; `0` renders minified JSON.
    pub indent: usize,
    /// Line break written before indented members.
    pub newline: String,
}

impl Default for JsonProps {
    fn default() -> Self {
        Self {
            indent: 0,
            newline: "\n".to_string(),
        }
    }
}

impl JsonProps {
    /// Minified output.
    pub fn compact() -> Self {
        Self::default()
    }

    /// `indent` spaces per level with `\n` line breaks.
    pub fn indented(indent: usize) -> Self {
        Self {
            indent,
            ..Self::default()
        }
    }

    /// Replaces the line break sequence.
    pub fn with_newline(mut self, newline: impl Into<String>) -> Self {
        self.newline = newline.into();
        self
    }
}

/// Destination for rendered text fragments.
pub trait TextSink {
    /// Appends one fragment.
    fn write_text(&mut self, text: &str);
}

impl TextSink for String {
    fn write_text(&mut self, text: &str) {
        self.push_str(text);
    }
}

impl<T: TextSink + ?Sized> TextSink for &mut T {
    fn write_text(&mut self, text: &str) {
        (**self).write_text(text)
    }
}

#[derive(Debug, Default)]
struct Frame {
    separator: &'static str,
    members: usize,
}

/// Streaming JSON writer.
///
/// Keeps one frame per open container plus the pending `"name":` prefix of
/// the next member; nothing of the value itself is buffered.
#[derive(Debug)]
pub struct JsonEmitter<O: TextSink> {
    output: O,
    indent: String,
    next_line: String,
    root: Frame,
    open: Vec<Frame>,
    attribute: Option<String>,
}

impl<O: TextSink> JsonEmitter<O> {
    /// Creates an emitter writing into `output`.
    pub fn new(output: O, props: &JsonProps) -> Self {
        let next_line = if props.indent > 0 {
            props.newline.clone()
        } else {
            String::new()
        };
        Self {
            output,
            indent: " ".repeat(props.indent),
            next_line,
            root: Frame::default(),
            open: Vec::new(),
            attribute: None,
        }
    }

    /// Returns the output sink.
    pub fn into_output(self) -> O {
        self.output
    }

    fn current(&mut self) -> &mut Frame {
        self.open.last_mut().unwrap_or(&mut self.root)
    }

    fn line_break(&self, depth: usize) -> String {
        if self.next_line.is_empty() {
            return String::new();
        }
        format!("{}{}", self.next_line, self.indent.repeat(depth))
    }

    /// Separator, line break and attribute prefix for the next member.
    fn member_prefix(&mut self) -> String {
        let depth = self.open.len();
        let attribute = self.attribute.take();
        let frame = self.current();
        // Object members were counted by their attribute.
        if attribute.is_none() {
            frame.members += 1;
        }
        let separator = std::mem::replace(&mut frame.separator, ",");
        let mut prefix = String::from(separator);
        if depth > 0 {
            prefix.push_str(&self.line_break(depth));
        }
        if let Some(attribute) = attribute {
            prefix.push_str(&attribute);
        }
        prefix
    }

    fn open_container(&mut self, bracket: &str) {
        let mut text = self.member_prefix();
        text.push_str(bracket);
        self.output.write_text(&text);
        self.open.push(Frame::default());
    }

    fn close_container(&mut self, bracket: &str) {
        let Some(frame) = self.open.pop() else {
            debug!(bracket, "close without matching open; ignored");
            return;
        };
        let mut text = if frame.members > 0 {
            self.line_break(self.open.len())
        } else {
            String::new()
        };
        text.push_str(bracket);
        self.output.write_text(&text);
    }
}

impl<O: TextSink> EventSink for JsonEmitter<O> {
    fn append(&mut self, event: &Event<'_>, _path: &Path) {
        match event {
            Event::ArrayStart => self.open_container("["),
            Event::ObjectStart => self.open_container("{"),
            Event::ArrayEnd => self.close_container("]"),
            Event::ObjectEnd => self.close_container("}"),
            Event::Value(leaf) => {
                let mut text = self.member_prefix();
                text.push_str(&leaf.json_text());
                self.output.write_text(&text);
            }
            Event::Attribute(name) => {
                self.current().members += 1;
                let space = if self.indent.is_empty() { "" } else { " " };
                self.attribute = Some(format!("{}:{}", quote(name), space));
            }
        }
    }
}

/// Renders `value` as canonical JSON text.
pub fn to_json(value: &CanonicalValue, props: &JsonProps) -> String {
    let mut emitter = JsonEmitter::new(String::new(), props);
    traverse(value, &mut emitter);
    emitter.into_output()
}
