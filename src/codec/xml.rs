use std::fmt;

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use crate::broker::Message;
use crate::utils::error::{DecodeError, EncodingError};

/// Root element name used when none is configured.
pub const DEFAULT_ROOT: &str = "message";

/// The wire form of a message as it sits in a topic queue.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EncodedMessage(String);

impl EncodedMessage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EncodedMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EncodedMessage {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[derive(Debug, Clone)]
pub struct XmlCodec {
    root: String,
}

impl Default for XmlCodec {
    fn default() -> Self {
        Self {
            root: DEFAULT_ROOT.to_string(),
        }
    }
}

impl XmlCodec {
    /// Create a codec writing `root` as the document element.
    pub fn new(root: impl Into<String>) -> Result<Self, EncodingError> {
        let root = root.into();
        validate_name(&root)?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// Encode `message`. Every field is validated before the document is
    /// returned, so a failure leaves nothing half-written behind.
    pub fn encode(&self, message: &Message) -> Result<EncodedMessage, EncodingError> {
        let mut writer = Writer::new(Vec::new());
        writer.write_event(Event::Start(BytesStart::new(self.root.as_str())))?;

        for (name, value) in message.iter() {
            validate_name(name)?;
            validate_text(name, value)?;

            writer.write_event(Event::Start(BytesStart::new(name)))?;
            if !value.is_empty() {
                writer.write_event(Event::Text(BytesText::new(value)))?;
            }
            writer.write_event(Event::End(BytesEnd::new(name)))?;
        }

        writer.write_event(Event::End(BytesEnd::new(self.root.as_str())))?;
        Ok(EncodedMessage(String::from_utf8(writer.into_inner())?))
    }

    /// Decode a wire document back into a message.
    ///
    /// Accepts both `<field></field>` and `<field/>` for empty values. CDATA
    /// sections inside a field are taken verbatim.
    pub fn decode(&self, wire: &str) -> Result<Message, DecodeError> {
        let mut reader = Reader::from_str(wire);
        let mut message = Message::new();
        let mut seen_root = false;
        let mut depth = 0usize;
        let mut field: Option<(String, String)> = None;

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    let name = std::str::from_utf8(start.name().as_ref())?.to_owned();
                    match depth {
                        0 => {
                            self.check_root(&name, seen_root)?;
                            seen_root = true;
                        }
                        1 => field = Some((name, String::new())),
                        _ => return Err(nested(field)),
                    }
                    depth += 1;
                }
                Event::Empty(empty) => {
                    let name = std::str::from_utf8(empty.name().as_ref())?.to_owned();
                    match depth {
                        0 => {
                            self.check_root(&name, seen_root)?;
                            seen_root = true;
                        }
                        1 => message.insert(name, ""),
                        _ => return Err(nested(field)),
                    }
                }
                Event::Text(text) => {
                    let text = text.unescape()?;
                    match field.as_mut() {
                        Some((_, value)) if depth == 2 => value.push_str(&text),
                        _ if text.trim().is_empty() => {}
                        _ => {
                            return Err(DecodeError::StrayText {
                                text: text.into_owned(),
                            });
                        }
                    }
                }
                Event::CData(cdata) => {
                    let text = std::str::from_utf8(&cdata)?;
                    match field.as_mut() {
                        Some((_, value)) if depth == 2 => value.push_str(text),
                        _ if text.trim().is_empty() => {}
                        _ => {
                            return Err(DecodeError::StrayText {
                                text: text.to_string(),
                            });
                        }
                    }
                }
                Event::End(_) => {
                    depth = depth.saturating_sub(1);
                    if depth == 1 {
                        if let Some((name, value)) = field.take() {
                            message.insert(name, value);
                        }
                    }
                }
                Event::Eof => break,
                // declarations, comments, processing instructions
                _ => {}
            }
        }

        if !seen_root {
            return Err(DecodeError::MissingRoot);
        }
        if depth > 0 {
            let element = match field {
                Some((name, _)) => name,
                None => self.root.clone(),
            };
            return Err(DecodeError::Unclosed { element });
        }
        Ok(message)
    }

    fn check_root(&self, name: &str, seen_root: bool) -> Result<(), DecodeError> {
        if seen_root || name != self.root {
            return Err(DecodeError::UnexpectedRoot {
                expected: self.root.clone(),
                found: name.to_string(),
            });
        }
        Ok(())
    }
}

fn nested(field: Option<(String, String)>) -> DecodeError {
    DecodeError::NestedField {
        field: field.map(|(name, _)| name).unwrap_or_default(),
    }
}

/// Element names start with a letter or `_` and continue with letters,
/// digits, `-`, `_` or `.`. Colons are refused since they would introduce
/// namespace prefixes.
fn validate_name(name: &str) -> Result<(), EncodingError> {
    let mut chars = name.chars();
    let valid_start = chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');
    let valid_rest = chars.all(|c| c.is_alphanumeric() || matches!(c, '-' | '_' | '.'));

    if valid_start && valid_rest {
        Ok(())
    } else {
        Err(EncodingError::InvalidElementName {
            name: name.to_string(),
        })
    }
}

fn validate_text(field: &str, value: &str) -> Result<(), EncodingError> {
    match value.chars().find(|&c| !is_xml_char(c)) {
        Some(character) => Err(EncodingError::InvalidCharacter {
            field: field.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c, '\t' | '\n' | '\r') || (c >= ' ' && c != '\u{FFFE}' && c != '\u{FFFF}')
}
