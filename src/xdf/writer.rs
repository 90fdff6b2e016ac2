use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use super::{ChannelFormat, ChunkTag, MAGIC};

/// Sample values of one chunk, flattened row by row (samples x channels)
#[derive(Debug, Clone)]
pub enum SampleData {
    Float32(Vec<f32>),
    Float64(Vec<f64>),
    Int64(Vec<i64>),
    Int32(Vec<i32>),
    Int16(Vec<i16>),
    Int8(Vec<i8>),
    String(Vec<String>),
}

impl SampleData {
    pub fn len(&self) -> usize {
        match self {
            SampleData::Float32(v) => v.len(),
            SampleData::Float64(v) => v.len(),
            SampleData::Int64(v) => v.len(),
            SampleData::Int32(v) => v.len(),
            SampleData::Int16(v) => v.len(),
            SampleData::Int8(v) => v.len(),
            SampleData::String(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channel_format(&self) -> ChannelFormat {
        match self {
            SampleData::Float32(_) => ChannelFormat::Float32,
            SampleData::Float64(_) => ChannelFormat::Double64,
            SampleData::Int64(_) => ChannelFormat::Int64,
            SampleData::Int32(_) => ChannelFormat::Int32,
            SampleData::Int16(_) => ChannelFormat::Int16,
            SampleData::Int8(_) => ChannelFormat::Int8,
            SampleData::String(_) => ChannelFormat::String,
        }
    }

    fn write_value(&self, index: usize, out: &mut Vec<u8>) {
        match self {
            SampleData::Float32(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::Float64(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::Int64(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::Int32(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::Int16(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::Int8(v) => out.extend_from_slice(&v[index].to_le_bytes()),
            SampleData::String(v) => {
                let bytes = v[index].as_bytes();
                write_varlen(out, bytes.len() as u64);
                out.extend_from_slice(bytes);
            }
        }
    }
}

/// Stream description written into a stream header chunk
#[derive(Debug, Clone)]
pub struct StreamHeader {
    pub name: Option<String>,
    pub stream_type: Option<String>,
    pub channel_count: usize,
    pub nominal_srate: f64,
    pub channel_format: ChannelFormat,
    pub source_id: String,
    pub hostname: Option<String>,
    pub uid: Option<String>,
    /// `None`: no `<channels>` element. `Some`: one `<channel>` per entry,
    /// with a `<label>` only where the entry is `Some`.
    pub channel_labels: Option<Vec<Option<String>>>,
}

impl StreamHeader {
    pub fn new(
        name: &str,
        stream_type: &str,
        channel_count: usize,
        nominal_srate: f64,
        channel_format: ChannelFormat,
    ) -> Self {
        Self {
            name: Some(name.to_string()),
            stream_type: Some(stream_type.to_string()),
            channel_count,
            nominal_srate,
            channel_format,
            source_id: format!("{}_{}", name, stream_type),
            hostname: None,
            uid: None,
            channel_labels: None,
        }
    }

    pub fn with_labels<S: AsRef<str>>(mut self, labels: &[S]) -> Self {
        self.channel_labels = Some(
            labels
                .iter()
                .map(|l| Some(l.as_ref().to_string()))
                .collect(),
        );
        self
    }

    pub fn to_xml(&self) -> String {
        let mut xml = String::from("<?xml version=\"1.0\"?><info>");
        if let Some(name) = &self.name {
            xml.push_str(&format!("<name>{}</name>", escape(name)));
        }
        if let Some(stream_type) = &self.stream_type {
            xml.push_str(&format!("<type>{}</type>", escape(stream_type)));
        }
        xml.push_str(&format!("<channel_count>{}</channel_count>", self.channel_count));
        xml.push_str(&format!("<nominal_srate>{}</nominal_srate>", self.nominal_srate));
        xml.push_str(&format!(
            "<channel_format>{}</channel_format>",
            self.channel_format.as_str()
        ));
        xml.push_str(&format!("<source_id>{}</source_id>", escape(&self.source_id)));
        if let Some(hostname) = &self.hostname {
            xml.push_str(&format!("<hostname>{}</hostname>", escape(hostname)));
        }
        if let Some(uid) = &self.uid {
            xml.push_str(&format!("<uid>{}</uid>", escape(uid)));
        }
        match &self.channel_labels {
            Some(labels) => {
                xml.push_str("<desc><channels>");
                for label in labels {
                    match label {
                        Some(label) => xml.push_str(&format!(
                            "<channel><label>{}</label></channel>",
                            escape(label)
                        )),
                        None => xml.push_str("<channel><unit>microvolts</unit></channel>"),
                    }
                }
                xml.push_str("</channels></desc>");
            }
            None => xml.push_str("<desc />"),
        }
        xml.push_str("</info>");
        xml
    }
}

fn escape(text: &str) -> String {
    quick_xml::escape::escape(text).into_owned()
}

fn write_varlen(out: &mut Vec<u8>, value: u64) {
    if value <= u8::MAX as u64 {
        out.push(1);
        out.push(value as u8);
    } else if value <= u32::MAX as u64 {
        out.push(4);
        out.extend_from_slice(&(value as u32).to_le_bytes());
    } else {
        out.push(8);
        out.extend_from_slice(&value.to_le_bytes());
    }
}

/// Sequential XDF file writer.
///
/// Chunks are written in call order; the caller is responsible for writing a
/// stream header before samples, clock offsets or the footer of that stream.
pub struct XdfWriter<W: Write> {
    out: W,
    bytes_written: u64,
}

impl XdfWriter<BufWriter<File>> {
    /// Create a file and write the magic and file header chunk
    pub fn create<P: AsRef<Path>>(path: P) -> std::io::Result<Self> {
        let file = File::create(path)?;
        Self::new(BufWriter::new(file))
    }
}

impl<W: Write> XdfWriter<W> {
    pub fn new(mut out: W) -> std::io::Result<Self> {
        out.write_all(MAGIC)?;
        let mut writer = Self {
            out,
            bytes_written: MAGIC.len() as u64,
        };
        let header = format!(
            "<?xml version=\"1.0\"?><info><version>1.0</version><datetime>{}</datetime></info>",
            chrono::Utc::now().to_rfc3339()
        );
        writer.write_chunk(ChunkTag::FileHeader, header.as_bytes())?;
        Ok(writer)
    }

    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    fn write_chunk(&mut self, tag: ChunkTag, content: &[u8]) -> std::io::Result<()> {
        let mut frame = Vec::with_capacity(content.len() + 11);
        write_varlen(&mut frame, content.len() as u64 + 2);
        frame.extend_from_slice(&(tag as u16).to_le_bytes());
        frame.extend_from_slice(content);
        self.out.write_all(&frame)?;
        self.bytes_written += frame.len() as u64;
        Ok(())
    }

    pub fn write_stream_header(&mut self, stream_id: u32, header: &StreamHeader) -> std::io::Result<()> {
        let mut content = stream_id.to_le_bytes().to_vec();
        content.extend_from_slice(header.to_xml().as_bytes());
        self.write_chunk(ChunkTag::StreamHeader, &content)
    }

    /// Write one samples chunk.
    ///
    /// `data` holds `timestamps.len() * channel_count` values row by row. A
    /// `None` timestamp is omitted from the file and reconstructed by readers
    /// from the nominal rate.
    pub fn write_samples(
        &mut self,
        stream_id: u32,
        channel_count: usize,
        timestamps: &[Option<f64>],
        data: &SampleData,
    ) -> std::io::Result<()> {
        if data.len() != timestamps.len() * channel_count {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!(
                    "{} values do not fill {} samples of {} channels",
                    data.len(),
                    timestamps.len(),
                    channel_count
                ),
            ));
        }

        let mut content = stream_id.to_le_bytes().to_vec();
        write_varlen(&mut content, timestamps.len() as u64);
        for (row, timestamp) in timestamps.iter().enumerate() {
            match timestamp {
                Some(ts) => {
                    content.push(8);
                    content.extend_from_slice(&ts.to_le_bytes());
                }
                None => content.push(0),
            }
            for col in 0..channel_count {
                data.write_value(row * channel_count + col, &mut content);
            }
        }
        self.write_chunk(ChunkTag::Samples, &content)
    }

    pub fn write_clock_offset(
        &mut self,
        stream_id: u32,
        collection_time: f64,
        offset: f64,
    ) -> std::io::Result<()> {
        let mut content = stream_id.to_le_bytes().to_vec();
        content.extend_from_slice(&collection_time.to_le_bytes());
        content.extend_from_slice(&offset.to_le_bytes());
        self.write_chunk(ChunkTag::ClockOffset, &content)
    }

    pub fn write_boundary(&mut self) -> std::io::Result<()> {
        const BOUNDARY_UUID: [u8; 16] = [
            0x43, 0xA5, 0x46, 0xDC, 0xCB, 0xF5, 0x41, 0x0F, 0xB3, 0x0E, 0xD5, 0x46, 0x73, 0x83,
            0xCB, 0xE4,
        ];
        self.write_chunk(ChunkTag::Boundary, &BOUNDARY_UUID)
    }

    pub fn write_stream_footer(
        &mut self,
        stream_id: u32,
        first_timestamp: f64,
        last_timestamp: f64,
        sample_count: usize,
    ) -> std::io::Result<()> {
        let xml = format!(
            "<?xml version=\"1.0\"?><info><first_timestamp>{}</first_timestamp>\
             <last_timestamp>{}</last_timestamp><sample_count>{}</sample_count></info>",
            first_timestamp, last_timestamp, sample_count
        );
        let mut content = stream_id.to_le_bytes().to_vec();
        content.extend_from_slice(xml.as_bytes());
        self.write_chunk(ChunkTag::StreamFooter, &content)
    }

    /// Flush and hand back the underlying writer
    pub fn finish(mut self) -> std::io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
