//! XDF container support
//!
//! Lab Streaming Layer recordings are stored as XDF files: a magic `XDF:`
//! followed by a sequence of length-prefixed chunks. Stream metadata lives in
//! XML (stream header and footer chunks), sample data in binary samples chunks.
//!
//! - [`reader`] parses a file into [`XdfFile`] / [`XdfStream`] records
//! - [`writer`] produces XDF files (synthetic recordings and test fixtures)

pub mod reader;
pub mod writer;

use ndarray::Array2;
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

pub use reader::{read_xdf, read_xdf_bytes};

/// File magic at offset 0 of every XDF file
pub const MAGIC: &[u8; 4] = b"XDF:";

/// Largest `channel_count` a stream header may declare
pub const MAX_CHANNEL_COUNT: usize = 1 << 20;

/// Chunk tags defined by the XDF format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ChunkTag {
    FileHeader = 1,
    StreamHeader = 2,
    Samples = 3,
    ClockOffset = 4,
    Boundary = 5,
    StreamFooter = 6,
}

impl ChunkTag {
    pub fn from_u16(tag: u16) -> Option<Self> {
        match tag {
            1 => Some(ChunkTag::FileHeader),
            2 => Some(ChunkTag::StreamHeader),
            3 => Some(ChunkTag::Samples),
            4 => Some(ChunkTag::ClockOffset),
            5 => Some(ChunkTag::Boundary),
            6 => Some(ChunkTag::StreamFooter),
            _ => None,
        }
    }
}

/// Errors raised while decoding an XDF container
#[derive(Debug, Error)]
pub enum XdfError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not an XDF file (magic bytes {0:?})")]
    BadMagic(Vec<u8>),

    #[error("invalid length width {width} at byte {offset}")]
    InvalidLengthWidth { width: u8, offset: usize },

    #[error("unexpected end of data at byte {offset} (needed {needed} more bytes)")]
    UnexpectedEof { offset: usize, needed: usize },

    #[error("chunk of length {length} at byte {offset} is too short")]
    ShortChunk { length: u64, offset: usize },

    #[error("unsupported channel format '{0}'")]
    UnknownChannelFormat(String),

    #[error("stream {stream_id}: {reason}")]
    InvalidStreamHeader { stream_id: u32, reason: String },

    #[error("chunk references stream {0} which has no header")]
    UnknownStream(u32),

    #[error("invalid timestamp width {0} (expected 0 or 8)")]
    InvalidTimestampWidth(u8),

    #[error("string value is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("XML document has no root element")]
    EmptyXml,

    #[error("sample matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

pub type Result<T> = std::result::Result<T, XdfError>;

/// Value format of a stream's channels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelFormat {
    Float32,
    Double64,
    String,
    Int8,
    Int16,
    Int32,
    Int64,
}

impl ChannelFormat {
    pub fn parse(format: &str) -> Option<Self> {
        match format.trim() {
            "float32" => Some(ChannelFormat::Float32),
            "double64" => Some(ChannelFormat::Double64),
            "string" => Some(ChannelFormat::String),
            "int8" => Some(ChannelFormat::Int8),
            "int16" => Some(ChannelFormat::Int16),
            "int32" => Some(ChannelFormat::Int32),
            "int64" => Some(ChannelFormat::Int64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelFormat::Float32 => "float32",
            ChannelFormat::Double64 => "double64",
            ChannelFormat::String => "string",
            ChannelFormat::Int8 => "int8",
            ChannelFormat::Int16 => "int16",
            ChannelFormat::Int32 => "int32",
            ChannelFormat::Int64 => "int64",
        }
    }

    /// Bytes per value on disk, `None` for variable-length strings
    pub fn value_size(&self) -> Option<usize> {
        match self {
            ChannelFormat::Float32 => Some(4),
            ChannelFormat::Double64 => Some(8),
            ChannelFormat::Int8 => Some(1),
            ChannelFormat::Int16 => Some(2),
            ChannelFormat::Int32 => Some(4),
            ChannelFormat::Int64 => Some(8),
            ChannelFormat::String => None,
        }
    }

    pub fn is_integer(&self) -> bool {
        matches!(
            self,
            ChannelFormat::Int8 | ChannelFormat::Int16 | ChannelFormat::Int32 | ChannelFormat::Int64
        )
    }

    /// Render a floating-point value the way it is stored in this format.
    ///
    /// Integral floats keep a trailing `.0`, `float32` values are printed at
    /// single precision and NaN becomes an empty cell. Integer formats are
    /// held as [`TimeSeries::Integer`] and never pass through here.
    pub fn format_value(&self, value: f64) -> String {
        if value.is_nan() {
            return String::new();
        }
        let text = match self {
            ChannelFormat::Float32 => format!("{}", value as f32),
            _ => format!("{}", value),
        };
        if value.is_finite() && !text.contains(['.', 'e', 'E']) {
            format!("{}.0", text)
        } else {
            text
        }
    }
}

/// Sample matrix of a stream, rows are samples and columns are channels.
///
/// Integer formats keep their exact values; `int64` does not fit in an `f64`.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeSeries {
    Numeric(Array2<f64>),
    Integer(Array2<i64>),
    Text(Array2<String>),
}

impl TimeSeries {
    pub fn nrows(&self) -> usize {
        match self {
            TimeSeries::Numeric(a) => a.nrows(),
            TimeSeries::Integer(a) => a.nrows(),
            TimeSeries::Text(a) => a.nrows(),
        }
    }

    pub fn ncols(&self) -> usize {
        match self {
            TimeSeries::Numeric(a) => a.ncols(),
            TimeSeries::Integer(a) => a.ncols(),
            TimeSeries::Text(a) => a.ncols(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nrows() == 0
    }

    /// Render one cell for tabular output
    pub fn cell(&self, row: usize, col: usize, format: ChannelFormat) -> String {
        match self {
            TimeSeries::Numeric(a) => format.format_value(a[[row, col]]),
            TimeSeries::Integer(a) => a[[row, col]].to_string(),
            TimeSeries::Text(a) => a[[row, col]].clone(),
        }
    }

    /// One channel as floats for plotting, `None` for text or a missing column
    pub fn float_column(&self, col: usize) -> Option<Vec<f64>> {
        match self {
            TimeSeries::Numeric(a) if col < a.ncols() => Some(a.column(col).to_vec()),
            TimeSeries::Integer(a) if col < a.ncols() => Some(a.column(col).iter().map(|&v| v as f64).collect()),
            _ => None,
        }
    }
}

/// Stream metadata parsed from a stream header chunk
#[derive(Debug, Clone, Serialize)]
pub struct StreamInfo {
    pub name: Option<String>,
    pub stream_type: Option<String>,
    pub channel_count: usize,
    pub nominal_srate: f64,
    pub channel_format: ChannelFormat,
    pub source_id: Option<String>,
    pub hostname: Option<String>,
    pub uid: Option<String>,
    /// The header's `<desc>` element as a JSON tree (see [`xml_to_json`])
    pub desc: Value,
}

impl StreamInfo {
    /// Build stream info from the JSON tree of a `<info>` stream header
    pub fn from_header(stream_id: u32, header: &Value) -> Result<Self> {
        let channel_count = first_text(header, "channel_count")
            .ok_or_else(|| XdfError::InvalidStreamHeader {
                stream_id,
                reason: "missing channel_count".to_string(),
            })?
            .trim()
            .parse::<usize>()
            .map_err(|e| XdfError::InvalidStreamHeader {
                stream_id,
                reason: format!("invalid channel_count: {}", e),
            })?;
        if channel_count > MAX_CHANNEL_COUNT {
            return Err(XdfError::InvalidStreamHeader {
                stream_id,
                reason: format!("channel_count {} exceeds {}", channel_count, MAX_CHANNEL_COUNT),
            });
        }

        let format_text = first_text(header, "channel_format").unwrap_or("float32");
        let channel_format = ChannelFormat::parse(format_text)
            .ok_or_else(|| XdfError::UnknownChannelFormat(format_text.to_string()))?;

        let nominal_srate = first_text(header, "nominal_srate")
            .and_then(|s| s.trim().parse::<f64>().ok())
            .unwrap_or(0.0);

        Ok(Self {
            name: first_text(header, "name").map(str::to_string),
            stream_type: first_text(header, "type").map(str::to_string),
            channel_count,
            nominal_srate,
            channel_format,
            source_id: first_text(header, "source_id").map(str::to_string),
            hostname: first_text(header, "hostname").map(str::to_string),
            uid: first_text(header, "uid").map(str::to_string),
            desc: first_child(header, "desc").cloned().unwrap_or(Value::Null),
        })
    }

    pub fn is_irregular(&self) -> bool {
        self.nominal_srate <= 0.0
    }

    /// Channel labels declared under `desc/channels/channel/label`.
    ///
    /// Returns `None` when the header has no channel descriptors at all;
    /// otherwise one entry per `<channel>` element, `None` where the element
    /// carries no label.
    pub fn channel_labels(&self) -> Option<Vec<Option<String>>> {
        let channels = first_child(&self.desc, "channels")?;
        let entries = channels.get("channel")?.as_array()?;
        Some(
            entries
                .iter()
                .map(|ch| first_text(ch, "label").map(str::to_string))
                .collect(),
        )
    }
}

/// Clock offset measurement attached to a stream
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockOffset {
    pub collection_time: f64,
    pub offset: f64,
}

/// One decoded stream of an XDF file
#[derive(Debug, Clone)]
pub struct XdfStream {
    pub stream_id: u32,
    pub info: StreamInfo,
    pub footer: Value,
    pub time_series: TimeSeries,
    pub time_stamps: Vec<f64>,
    pub clock_offsets: Vec<ClockOffset>,
}

impl XdfStream {
    pub fn sample_count(&self) -> usize {
        self.time_stamps.len()
    }
}

/// A decoded XDF file
#[derive(Debug, Clone, Default)]
pub struct XdfFile {
    pub header: Value,
    pub streams: Vec<XdfStream>,
}

/// First child element named `key` of a JSON-converted XML element
pub fn first_child<'a>(node: &'a Value, key: &str) -> Option<&'a Value> {
    node.get(key)?.as_array()?.first()
}

/// Text of the first child element named `key`, if it is a non-empty leaf
pub fn first_text<'a>(node: &'a Value, key: &str) -> Option<&'a str> {
    first_child(node, key)?
        .as_str()
        .filter(|s| !s.is_empty())
}

struct XmlNode {
    name: String,
    children: Map<String, Value>,
    text: String,
}

impl XmlNode {
    fn new(name: String) -> Self {
        Self {
            name,
            children: Map::new(),
            text: String::new(),
        }
    }

    fn into_value(self) -> Value {
        if !self.children.is_empty() {
            Value::Object(self.children)
        } else {
            let text = self.text.trim();
            if text.is_empty() {
                Value::Null
            } else {
                Value::String(text.to_string())
            }
        }
    }
}

fn push_child(children: &mut Map<String, Value>, name: String, value: Value) {
    match children.get_mut(&name) {
        Some(Value::Array(list)) => list.push(value),
        _ => {
            children.insert(name, Value::Array(vec![value]));
        }
    }
}

/// Convert an XML document to a JSON tree using quick-xml.
///
/// Every child element becomes a list under its tag name (repeated elements
/// such as `<channel>` append to the same list), leaf elements become
/// strings and empty leaves `null`. Returns the root tag and its value.
pub fn xml_to_json(xml: &str) -> Result<(String, Value)> {
    use quick_xml::Reader;
    use quick_xml::events::Event;

    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<(String, Value)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                stack.push(XmlNode::new(name));
            }
            Event::Empty(e) => {
                let name = String::from_utf8_lossy(e.name().as_ref()).to_string();
                match stack.last_mut() {
                    Some(parent) => push_child(&mut parent.children, name, Value::Null),
                    None => root = Some((name, Value::Null)),
                }
            }
            Event::Text(e) => {
                if let Some(node) = stack.last_mut() {
                    match e.unescape() {
                        Ok(text) => node.text.push_str(&text),
                        Err(err) => {
                            tracing::warn!("Error unescaping XML text: {}", err);
                            node.text.push_str(&String::from_utf8_lossy(&e));
                        }
                    }
                }
            }
            Event::CData(e) => {
                if let Some(node) = stack.last_mut() {
                    node.text.push_str(&String::from_utf8_lossy(&e));
                }
            }
            Event::End(_) => {
                if let Some(node) = stack.pop() {
                    let name = node.name.clone();
                    let value = node.into_value();
                    match stack.last_mut() {
                        Some(parent) => push_child(&mut parent.children, name, value),
                        None => root = Some((name, value)),
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    root.ok_or(XdfError::EmptyXml)
}
