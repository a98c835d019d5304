//! Streaming record reader for MWX XML payloads
//!
//! A payload is a single root element whose direct children are the records.
//! Each record carries its data as attributes; text, comments and anything
//! nested below a record are skipped.

use crate::data::record::{Attribute, Record};
use crate::error::StreamError;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::QName;
use quick_xml::Reader;
use tracing::trace;

pub struct PayloadReader<'a> {
    reader: Reader<&'a [u8]>,
    payload: String,
    root_name: String,
    records_read: usize,
    finished: bool,
}

impl<'a> PayloadReader<'a> {
    /// Position a reader on the payload's root element
    pub fn open(payload: &str, bytes: &'a [u8]) -> Result<Self, StreamError> {
        let mut reader = Reader::from_reader(bytes);

        loop {
            let event = reader.read_event().map_err(|e| StreamError::Xml {
                payload: payload.to_string(),
                reason: format!("{} at byte {}", e, reader.buffer_position()),
            })?;

            match event {
                Event::Start(root) => {
                    return Ok(Self {
                        root_name: element_name(&root),
                        reader,
                        payload: payload.to_string(),
                        records_read: 0,
                        finished: false,
                    });
                }
                Event::Empty(root) => {
                    return Ok(Self {
                        root_name: element_name(&root),
                        reader,
                        payload: payload.to_string(),
                        records_read: 0,
                        finished: true,
                    });
                }
                Event::Eof => {
                    return Err(StreamError::Xml {
                        payload: payload.to_string(),
                        reason: "document has no root element".to_string(),
                    });
                }
                Event::End(_) => {
                    return Err(StreamError::Xml {
                        payload: payload.to_string(),
                        reason: "closing tag before any root element".to_string(),
                    });
                }
                _ => continue,
            }
        }
    }

    /// Name of the root element; used as the table name
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    pub fn records_read(&self) -> usize {
        self.records_read
    }

    fn xml_error(&mut self, reason: String) -> StreamError {
        self.finished = true;
        StreamError::Xml {
            payload: self.payload.clone(),
            reason: format!("{} at byte {}", reason, self.reader.buffer_position()),
        }
    }

    fn record_from(&mut self, element: &BytesStart<'_>) -> Result<Record, StreamError> {
        let mut record = Record::new(element_name(element));

        for attr in element.attributes() {
            let attr = attr.map_err(|e| self.xml_error(e.to_string()))?;
            // Namespace declarations are not record data
            if attr.key.as_namespace_binding().is_some() {
                continue;
            }
            let value = attr
                .decode_and_unescape_value(self.reader.decoder())
                .map_err(|e| self.xml_error(e.to_string()))?;
            record.attributes.push(Attribute::new(
                String::from_utf8_lossy(attr.key.as_ref()).into_owned(),
                value.into_owned(),
            ));
        }

        self.records_read += 1;
        Ok(record)
    }
}

impl Iterator for PayloadReader<'_> {
    type Item = Result<Record, StreamError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        loop {
            let event = match self.reader.read_event() {
                Ok(event) => event,
                Err(e) => return Some(Err(self.xml_error(e.to_string()))),
            };

            match event {
                Event::Empty(element) => return Some(self.record_from(&element)),
                Event::Start(element) => {
                    let record = self.record_from(&element);
                    let name = element.name().as_ref().to_vec();
                    trace!(target: "xml_records", "skipping children of record {}", self.records_read);
                    if let Err(e) = self.reader.read_to_end(QName(&name)) {
                        return Some(Err(self.xml_error(e.to_string())));
                    }
                    return Some(record);
                }
                Event::End(_) => {
                    self.finished = true;
                    return None;
                }
                Event::Eof => {
                    return Some(Err(
                        self.xml_error(format!("root element <{}> is not closed", self.root_name))
                    ));
                }
                _ => continue,
            }
        }
    }
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}
