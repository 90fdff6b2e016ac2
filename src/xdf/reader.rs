use ndarray::Array2;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::{
    ChannelFormat, ChunkTag, ClockOffset, MAGIC, Result, StreamInfo, TimeSeries, XdfError,
    XdfFile, XdfStream, xml_to_json,
};

/// Little-endian cursor over the raw file bytes
struct ByteCursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(XdfError::UnexpectedEof {
                offset: self.pos,
                needed: n - self.remaining(),
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    fn u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.array()?))
    }

    fn u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.array()?))
    }

    /// Variable-length integer: a width byte (1, 4 or 8) followed by the value
    fn varlen(&mut self) -> Result<u64> {
        let offset = self.pos;
        match self.u8()? {
            1 => Ok(self.u8()? as u64),
            4 => Ok(self.u32()? as u64),
            8 => self.u64(),
            width => Err(XdfError::InvalidLengthWidth { width, offset }),
        }
    }

    fn float(&mut self, format: ChannelFormat) -> Result<f64> {
        Ok(match format {
            ChannelFormat::Float32 => f32::from_le_bytes(self.array()?) as f64,
            ChannelFormat::Double64 => self.f64()?,
            other => return Err(XdfError::UnknownChannelFormat(other.as_str().to_string())),
        })
    }

    fn integer(&mut self, format: ChannelFormat) -> Result<i64> {
        Ok(match format {
            ChannelFormat::Int8 => i8::from_le_bytes(self.array()?) as i64,
            ChannelFormat::Int16 => i16::from_le_bytes(self.array()?) as i64,
            ChannelFormat::Int32 => i32::from_le_bytes(self.array()?) as i64,
            ChannelFormat::Int64 => i64::from_le_bytes(self.array()?),
            other => return Err(XdfError::UnknownChannelFormat(other.as_str().to_string())),
        })
    }

    fn string(&mut self) -> Result<String> {
        let len = self.varlen()? as usize;
        Ok(String::from_utf8(self.take(len)?.to_vec())?)
    }
}

enum SampleBuffer {
    Numeric(Vec<f64>),
    Integer(Vec<i64>),
    Text(Vec<String>),
}

/// Per-stream accumulation state while chunks are read
struct StreamBuilder {
    stream_id: u32,
    info: StreamInfo,
    footer: Value,
    values: SampleBuffer,
    time_stamps: Vec<f64>,
    clock_offsets: Vec<ClockOffset>,
    last_timestamp: f64,
    sample_interval: f64,
}

impl StreamBuilder {
    fn new(stream_id: u32, info: StreamInfo) -> Self {
        let values = match info.channel_format {
            ChannelFormat::String => SampleBuffer::Text(Vec::new()),
            format if format.is_integer() => SampleBuffer::Integer(Vec::new()),
            _ => SampleBuffer::Numeric(Vec::new()),
        };
        let sample_interval = if info.nominal_srate > 0.0 {
            1.0 / info.nominal_srate
        } else {
            0.0
        };
        Self {
            stream_id,
            info,
            footer: Value::Null,
            values,
            time_stamps: Vec::new(),
            clock_offsets: Vec::new(),
            last_timestamp: 0.0,
            sample_interval,
        }
    }

    fn read_samples(&mut self, cursor: &mut ByteCursor) -> Result<()> {
        let count = cursor.varlen()?;
        let channels = self.info.channel_count;
        let format = self.info.channel_format;

        for _ in 0..count {
            let timestamp = match cursor.u8()? {
                0 => self.last_timestamp + self.sample_interval,
                8 => cursor.f64()?,
                width => return Err(XdfError::InvalidTimestampWidth(width)),
            };
            self.last_timestamp = timestamp;
            self.time_stamps.push(timestamp);

            match &mut self.values {
                SampleBuffer::Numeric(values) => {
                    for _ in 0..channels {
                        values.push(cursor.float(format)?);
                    }
                }
                SampleBuffer::Integer(values) => {
                    for _ in 0..channels {
                        values.push(cursor.integer(format)?);
                    }
                }
                SampleBuffer::Text(values) => {
                    for _ in 0..channels {
                        values.push(cursor.string()?);
                    }
                }
            }
        }
        Ok(())
    }

    fn finish(self) -> Result<XdfStream> {
        let rows = self.time_stamps.len();
        let channels = self.info.channel_count;
        let time_series = match self.values {
            SampleBuffer::Numeric(values) => {
                TimeSeries::Numeric(Array2::from_shape_vec((rows, channels), values)?)
            }
            SampleBuffer::Integer(values) => {
                TimeSeries::Integer(Array2::from_shape_vec((rows, channels), values)?)
            }
            SampleBuffer::Text(values) => {
                TimeSeries::Text(Array2::from_shape_vec((rows, channels), values)?)
            }
        };

        Ok(XdfStream {
            stream_id: self.stream_id,
            info: self.info,
            footer: self.footer,
            time_series,
            time_stamps: self.time_stamps,
            clock_offsets: self.clock_offsets,
        })
    }
}

/// Read and decode an XDF file from disk
pub fn read_xdf<P: AsRef<Path>>(path: P) -> Result<XdfFile> {
    let bytes = std::fs::read(path.as_ref())?;
    read_xdf_bytes(&bytes)
}

/// Decode an XDF file held in memory.
///
/// Streams are returned in the order their headers appear. Timestamps are the
/// raw recorded values; see [`crate::sync`] for clock correction and
/// dejittering.
pub fn read_xdf_bytes(bytes: &[u8]) -> Result<XdfFile> {
    let mut cursor = ByteCursor::new(bytes);

    let magic = cursor
        .take(MAGIC.len())
        .map_err(|_| XdfError::BadMagic(bytes.to_vec()))?;
    if magic != &MAGIC[..] {
        return Err(XdfError::BadMagic(magic.to_vec()));
    }

    let mut header = Value::Null;
    let mut order: Vec<u32> = Vec::new();
    let mut builders: HashMap<u32, StreamBuilder> = HashMap::new();

    while cursor.remaining() > 0 {
        let chunk_start = cursor.pos;
        let length = match cursor.varlen() {
            Ok(length) => length,
            Err(XdfError::UnexpectedEof { .. }) => {
                tracing::warn!("File truncated inside chunk header at byte {}", chunk_start);
                break;
            }
            Err(e) => return Err(e),
        };
        if length < 2 {
            return Err(XdfError::ShortChunk {
                length,
                offset: chunk_start,
            });
        }
        if (cursor.remaining() as u64) < length {
            tracing::warn!(
                "File truncated: chunk at byte {} declares {} bytes, only {} remain",
                chunk_start,
                length,
                cursor.remaining()
            );
            break;
        }

        let tag = cursor.u16()?;
        let content = cursor.take(length as usize - 2)?;
        let mut chunk = ByteCursor::new(content);

        match ChunkTag::from_u16(tag) {
            Some(ChunkTag::FileHeader) => {
                let xml = String::from_utf8(content.to_vec())?;
                header = xml_to_json(&xml)?.1;
            }
            Some(ChunkTag::StreamHeader) => {
                let stream_id = chunk.u32()?;
                let xml = String::from_utf8(chunk.take(chunk.remaining())?.to_vec())?;
                let (_, info_json) = xml_to_json(&xml)?;
                let info = StreamInfo::from_header(stream_id, &info_json)?;
                tracing::debug!(
                    "Stream header {}: {:?} ({} channels, {})",
                    stream_id,
                    info.name,
                    info.channel_count,
                    info.channel_format.as_str()
                );
                if builders.insert(stream_id, StreamBuilder::new(stream_id, info)).is_none() {
                    order.push(stream_id);
                }
            }
            Some(ChunkTag::Samples) => {
                let stream_id = chunk.u32()?;
                let builder = builders
                    .get_mut(&stream_id)
                    .ok_or(XdfError::UnknownStream(stream_id))?;
                builder.read_samples(&mut chunk)?;
            }
            Some(ChunkTag::ClockOffset) => {
                let stream_id = chunk.u32()?;
                let collection_time = chunk.f64()?;
                let offset = chunk.f64()?;
                builders
                    .get_mut(&stream_id)
                    .ok_or(XdfError::UnknownStream(stream_id))?
                    .clock_offsets
                    .push(ClockOffset {
                        collection_time,
                        offset,
                    });
            }
            Some(ChunkTag::StreamFooter) => {
                let stream_id = chunk.u32()?;
                let xml = String::from_utf8(chunk.take(chunk.remaining())?.to_vec())?;
                let footer = xml_to_json(&xml)?.1;
                if let Some(builder) = builders.get_mut(&stream_id) {
                    builder.footer = footer;
                } else {
                    tracing::warn!("Footer for unknown stream {} ignored", stream_id);
                }
            }
            Some(ChunkTag::Boundary) => {}
            None => {
                tracing::debug!("Skipping chunk with unknown tag {} at byte {}", tag, chunk_start);
            }
        }
    }

    let mut streams = Vec::with_capacity(order.len());
    for stream_id in order {
        if let Some(builder) = builders.remove(&stream_id) {
            streams.push(builder.finish()?);
        }
    }

    Ok(XdfFile { header, streams })
}
