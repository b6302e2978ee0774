//! Descriptor decoding.
//!
//! Descriptors are self-describing `tag`, `length`, `payload` records carried in
//! descriptor loops of PSI/SI tables.
//!
//! Reference: ETSI EN 300 468, section 6.
mod cursor;
mod error;

use serde::Serialize;

pub use cursor::{CharSetString, Cursor};
pub use error::{Error, Result};

/// Descriptor tags with a dedicated decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    NetworkName,
    ServiceList,
    ShortEvent,
    ExtendedEvent,
    Component,
    Other(u8),
}

impl Tag {
    pub const NETWORK_NAME: u8 = 0x40;
    pub const SERVICE_LIST: u8 = 0x41;
    pub const SHORT_EVENT: u8 = 0x4d;
    pub const EXTENDED_EVENT: u8 = 0x4e;
    pub const COMPONENT: u8 = 0x50;

    #[must_use]
    pub fn value(self) -> u8 {
        match self {
            Tag::NetworkName => Self::NETWORK_NAME,
            Tag::ServiceList => Self::SERVICE_LIST,
            Tag::ShortEvent => Self::SHORT_EVENT,
            Tag::ExtendedEvent => Self::EXTENDED_EVENT,
            Tag::Component => Self::COMPONENT,
            Tag::Other(tag) => tag,
        }
    }
}

impl From<u8> for Tag {
    fn from(tag: u8) -> Self {
        match tag {
            Self::NETWORK_NAME => Tag::NetworkName,
            Self::SERVICE_LIST => Tag::ServiceList,
            Self::SHORT_EVENT => Tag::ShortEvent,
            Self::EXTENDED_EVENT => Tag::ExtendedEvent,
            Self::COMPONENT => Tag::Component,
            other => Tag::Other(other),
        }
    }
}

/// Raw descriptor borrowed from its enclosing table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Descriptor<'a> {
    pub tag: u8,
    /// Payload, exactly the declared length
    pub data: &'a [u8],
}

impl Descriptor<'_> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// See [decode].
    pub fn decode(&self) -> Result<DecodedDescriptor> {
        decode(self.tag, self.data)
    }
}

/// Iterates the descriptors of a descriptor loop.
///
/// A descriptor whose declared length runs past the end of the loop is provided as
/// an error and ends iteration, since no later descriptor boundary can be trusted.
pub struct Descriptors<'a> {
    dat: &'a [u8],
    offset: usize,
    done: bool,
}

impl<'a> Descriptors<'a> {
    #[must_use]
    pub fn new(dat: &'a [u8]) -> Self {
        Descriptors {
            dat,
            offset: 0,
            done: false,
        }
    }
}

impl<'a> Iterator for Descriptors<'a> {
    type Item = Result<Descriptor<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.dat.len() {
            return None;
        }
        let rest = &self.dat[self.offset..];
        let tag = rest[0];
        if rest.len() < 2 {
            self.done = true;
            return Some(Err(Error::Truncated {
                tag,
                offset: self.offset,
                wanted: 2,
                available: rest.len(),
            }));
        }
        let length = usize::from(rest[1]);
        if rest.len() - 2 < length {
            self.done = true;
            return Some(Err(Error::LoopOverrun {
                tag,
                offset: self.offset,
                length,
                available: rest.len() - 2,
            }));
        }
        self.offset += 2 + length;
        Some(Ok(Descriptor {
            tag,
            data: &rest[2..2 + length],
        }))
    }
}

/// Stream content type of a component descriptor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamContent {
    Mpeg2Video,
    MpegAudio,
    DvbSubtitles,
    Ac3Audio,
    H264Video,
    HeAacAudio,
    DtsAudio,
    DvbSrmData,
    HevcVideo,
    Reserved(u8),
    UserDefined(u8),
}

impl From<u8> for StreamContent {
    fn from(value: u8) -> Self {
        match value & 0xf {
            0x1 => Self::Mpeg2Video,
            0x2 => Self::MpegAudio,
            0x3 => Self::DvbSubtitles,
            0x4 => Self::Ac3Audio,
            0x5 => Self::H264Video,
            0x6 => Self::HeAacAudio,
            0x7 => Self::DtsAudio,
            0x8 => Self::DvbSrmData,
            0x9 => Self::HevcVideo,
            x @ 0xc..=0xf => Self::UserDefined(x),
            x => Self::Reserved(x),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ShortEvent {
    pub language: String,
    pub name: CharSetString,
    pub text: CharSetString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedEventItem {
    pub description: CharSetString,
    pub value: CharSetString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtendedEvent {
    pub descriptor_number: u8,
    pub last_descriptor_number: u8,
    pub language: String,
    pub items: Vec<ExtendedEventItem>,
    pub text: CharSetString,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Component {
    pub stream_content: StreamContent,
    pub stream_content_ext: u8,
    pub component_type: u8,
    pub component_tag: u8,
    pub language: String,
    pub text: CharSetString,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServiceEntry {
    pub service_id: u16,
    pub service_type: u8,
}

/// A decoded descriptor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DecodedDescriptor {
    NetworkName { name: CharSetString },
    ServiceList { services: Vec<ServiceEntry> },
    ShortEvent(ShortEvent),
    ExtendedEvent(ExtendedEvent),
    Component(Component),
    /// Any tag without a dedicated decoder. The payload is not interpreted.
    Unknown { tag: u8, length: usize },
}

impl DecodedDescriptor {
    #[must_use]
    pub fn tag(&self) -> u8 {
        match self {
            Self::NetworkName { .. } => Tag::NETWORK_NAME,
            Self::ServiceList { .. } => Tag::SERVICE_LIST,
            Self::ShortEvent(_) => Tag::SHORT_EVENT,
            Self::ExtendedEvent(_) => Tag::EXTENDED_EVENT,
            Self::Component(_) => Tag::COMPONENT,
            Self::Unknown { tag, .. } => *tag,
        }
    }
}

/// Decode a descriptor `payload` according to `tag`.
///
/// `payload` must be exactly the declared descriptor length; no read ever goes past
/// its end.
///
/// # Example
/// ```
/// use tsmeta::descriptor::{decode, DecodedDescriptor};
///
/// let payload = b"eng\x03\x00Hi\x01\x00";
/// match decode(0x4d, payload).unwrap() {
///     DecodedDescriptor::ShortEvent(ev) => {
///         assert_eq!(ev.language, "eng");
///         assert_eq!(ev.name.text, "Hi");
///         assert_eq!(ev.text.text, "");
///     }
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
///
/// # Errors
/// [Error] if the payload is too short for the fields its tag requires.
pub fn decode(tag: u8, payload: &[u8]) -> Result<DecodedDescriptor> {
    let mut cur = Cursor::new(tag, payload);
    match Tag::from(tag) {
        Tag::NetworkName => Ok(DecodedDescriptor::NetworkName {
            name: cur.read_charset_string(payload.len())?,
        }),
        Tag::ServiceList => decode_service_list(&mut cur),
        Tag::ShortEvent => decode_short_event(&mut cur),
        Tag::ExtendedEvent => decode_extended_event(&mut cur),
        Tag::Component => decode_component(&mut cur),
        Tag::Other(tag) => Ok(DecodedDescriptor::Unknown {
            tag,
            length: payload.len(),
        }),
    }
}

fn decode_service_list(cur: &mut Cursor) -> Result<DecodedDescriptor> {
    let mut services = Vec::with_capacity(cur.len() / 3);
    while cur.remaining() > 0 {
        services.push(ServiceEntry {
            service_id: cur.read_u16()?,
            service_type: cur.read_u8()?,
        });
    }
    Ok(DecodedDescriptor::ServiceList { services })
}

fn decode_short_event(cur: &mut Cursor) -> Result<DecodedDescriptor> {
    Ok(DecodedDescriptor::ShortEvent(ShortEvent {
        language: cur.read_fixed_string(3)?,
        name: cur.read_prefixed_charset_string()?,
        text: cur.read_prefixed_charset_string()?,
    }))
}

fn decode_extended_event(cur: &mut Cursor) -> Result<DecodedDescriptor> {
    let tag = Tag::EXTENDED_EVENT;
    let (descriptor_number, last_descriptor_number) = cur.read_nibbles()?;
    let language = cur.read_fixed_string(3)?;
    let items_len = usize::from(cur.read_u8()?);

    let start = cur.position();
    let end = start + items_len;
    let mut region = cur.split(items_len)?;

    // a read hitting the end of the region is an item crossing it
    let overrun = |err: Error| match err {
        Error::Truncated { offset, .. } => Error::ItemsOverrun {
            tag,
            offset: start + offset,
            end,
        },
        other => other,
    };
    let mut items = Vec::new();
    while region.remaining() > 0 {
        let description = region.read_prefixed_charset_string().map_err(overrun)?;
        let value = region.read_prefixed_charset_string().map_err(overrun)?;
        items.push(ExtendedEventItem { description, value });
    }

    Ok(DecodedDescriptor::ExtendedEvent(ExtendedEvent {
        descriptor_number,
        last_descriptor_number,
        language,
        items,
        text: cur.read_prefixed_charset_string()?,
    }))
}

fn decode_component(cur: &mut Cursor) -> Result<DecodedDescriptor> {
    let (stream_content_ext, stream_content) = cur.read_nibbles()?;
    let component_type = cur.read_u8()?;
    let component_tag = cur.read_u8()?;
    let language = cur.read_fixed_string(3)?;

    let consumed = cur.position();
    let text_len = cur
        .len()
        .checked_sub(consumed)
        .ok_or(Error::LengthUnderflow {
            tag: Tag::COMPONENT,
            length: cur.len(),
            consumed,
        })?;

    Ok(DecodedDescriptor::Component(Component {
        stream_content: StreamContent::from(stream_content),
        stream_content_ext,
        component_type,
        component_tag,
        language,
        text: cur.read_charset_string(text_len)?,
    }))
}
