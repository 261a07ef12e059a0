use crate::source::Location;

/// Structural signals from the parser, in emission order.
///
/// Start/end pairs nest strictly; the event stream between a
/// `DocumentStart` and its `DocumentEnd` describes one document tree.
#[derive(Clone, PartialEq, Debug)]
pub enum Event {
    StreamStart,
    StreamEnd,
    DocumentStart {
        version: Option<(u32, u32)>,
        tag_directives: Vec<(String, String)>,
        implicit: bool,
    },
    DocumentEnd {
        implicit: bool,
    },
    Alias {
        anchor: String,
    },
    Scalar {
        value: String,
        style: ScalarStyle,
        anchor: Option<String>,
        tag: Option<String>,
        plain_implicit: bool,
        quoted_implicit: bool,
    },
    SequenceStart {
        anchor: Option<String>,
        tag: Option<String>,
        style: CollectionStyle,
    },
    SequenceEnd,
    MappingStart {
        anchor: Option<String>,
        tag: Option<String>,
        style: CollectionStyle,
    },
    MappingEnd,
    /// A comment record; only delivered when comment collection is enabled.
    Comment(Comment),
}

impl Event {
    /// Content events open a pending document; framing events do not.
    pub(crate) fn is_content(&self) -> bool {
        matches!(
            self,
            Event::Alias { .. }
                | Event::Scalar { .. }
                | Event::SequenceStart { .. }
                | Event::MappingStart { .. }
        )
    }
}

/// How a scalar was written in the source.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum ScalarStyle {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
    Folded,
}

/// How a collection was written in the source.
#[derive(Clone, Copy, PartialEq, Debug, Eq)]
pub enum CollectionStyle {
    Block,
    Flow,
}

/// A `# …` comment with its span and placement.
///
/// `inline` is true when the `#` shares its line with node content to its
/// left. `text` keeps the leading `#` so emitting it back is verbatim.
#[derive(Clone, PartialEq, Debug)]
pub struct Comment {
    pub location: Location,
    pub text: String,
    pub inline: bool,
}

/// A consumer of parser events. The parser hands every event over exactly
/// once, together with its source location.
pub trait EventReceiver {
    fn on_event(&mut self, event: Event, location: Location);
}
