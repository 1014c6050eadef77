//! DNS message parsing and construction.

use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

const HEADER_LEN: usize = 12;
const MAX_LABEL_LEN: usize = 63;
const MAX_NAME_LEN: usize = 255;
/// Upper bound on compression pointers followed while decoding one name.
const MAX_POINTER_HOPS: usize = 32;

/// Class IN.
pub const CLASS_IN: u16 = 1;

const FLAG_QR: u16 = 0x8000;
const FLAG_TC: u16 = 0x0200;
const FLAG_RD: u16 = 0x0100;

pub const RCODE_NOERROR: u8 = 0;
pub const RCODE_SERVFAIL: u8 = 2;
pub const RCODE_NXDOMAIN: u8 = 3;
pub const RCODE_REFUSED: u8 = 5;

/// Record types this crate queries for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordType {
    A,
    Aaaa,
}

impl RecordType {
    pub fn code(self) -> u16 {
        match self {
            RecordType::A => 1,
            RecordType::Aaaa => 28,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordType::A => "A",
            RecordType::Aaaa => "AAAA",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a name cannot be put on the wire.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NameError {
    #[error("label `{0}` is longer than 63 octets")]
    LabelTooLong(String),
    #[error("name is longer than 255 octets")]
    NameTooLong,
    #[error("empty label in `{0}`")]
    EmptyLabel(String),
    #[error("`{0}` has no ASCII (IDNA) form")]
    NotAscii(String),
}

/// A parsed DNS query.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub domain: String,
    pub qtype: u16,
    pub qclass: u16,
}

impl DnsQuery {
    /// Build a recursive IN query for `domain`.
    ///
    /// A single trailing dot is accepted; the empty name (or ".") queries the root.
    /// Internationalized names are sent in their IDNA (punycode) form.
    pub fn new(id: u16, domain: &str, rtype: RecordType) -> Result<Self, NameError> {
        let domain = to_ascii(domain.strip_suffix('.').unwrap_or(domain))?;
        validate_name(&domain)?;

        Ok(Self {
            id,
            domain,
            qtype: rtype.code(),
            qclass: CLASS_IN,
        })
    }

    /// Parse a DNS query from raw bytes.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN + 1 {
            return None;
        }

        let id = u16::from_be_bytes([data[0], data[1]]);
        let (domain, pos) = read_name(data, HEADER_LEN)?;

        // Parse QTYPE and QCLASS
        if pos + 4 > data.len() {
            return None;
        }
        let qtype = u16::from_be_bytes([data[pos], data[pos + 1]]);
        let qclass = u16::from_be_bytes([data[pos + 2], data[pos + 3]]);

        Some(Self {
            id,
            domain,
            qtype,
            qclass,
        })
    }

    /// Encode the query to wire format bytes (RD set, one question).
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(HEADER_LEN + self.domain.len() + 6);

        data.extend_from_slice(&self.id.to_be_bytes());
        data.extend_from_slice(&FLAG_RD.to_be_bytes());
        data.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // ANCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // ARCOUNT

        encode_domain(&mut data, &self.domain);
        data.extend_from_slice(&self.qtype.to_be_bytes());
        data.extend_from_slice(&self.qclass.to_be_bytes());

        data
    }
}

/// A DNS response.
#[derive(Debug, Clone)]
pub struct DnsResponse {
    pub id: u16,
    pub flags: u16,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsRecord>,
}

/// A DNS question section entry.
#[derive(Debug, Clone)]
pub struct DnsQuestion {
    pub domain: String,
    pub qtype: u16,
    pub qclass: u16,
}

/// A DNS resource record.
#[derive(Debug, Clone)]
pub struct DnsRecord {
    pub name: String,
    pub rtype: u16,
    pub class: u16,
    pub ttl: u32,
    pub rdata: Vec<u8>,
}

impl DnsRecord {
    /// Text form of an A or AAAA record's address.
    ///
    /// Returns `None` for other types or malformed RDATA.
    pub fn address_text(&self) -> Option<String> {
        match (self.rtype, self.rdata.len()) {
            (1, 4) => {
                let octets: [u8; 4] = self.rdata[..].try_into().ok()?;
                Some(Ipv4Addr::from(octets).to_string())
            }
            (28, 16) => {
                let octets: [u8; 16] = self.rdata[..].try_into().ok()?;
                Some(Ipv6Addr::from(octets).to_string())
            }
            _ => None,
        }
    }
}

impl DnsResponse {
    /// Create an empty response to `query` carrying the given RCODE.
    pub fn reply_to(query: &DnsQuery, rcode: u8) -> Self {
        Self {
            id: query.id,
            flags: FLAG_QR | FLAG_RD | 0x0080 | u16::from(rcode & 0x0F),
            questions: vec![DnsQuestion {
                domain: query.domain.clone(),
                qtype: query.qtype,
                qclass: query.qclass,
            }],
            answers: Vec::new(),
        }
    }

    /// Parse a response from wire format.
    ///
    /// The authority and additional sections are not decoded.
    pub fn parse(data: &[u8]) -> Option<Self> {
        if data.len() < HEADER_LEN {
            return None;
        }

        let id = u16::from_be_bytes([data[0], data[1]]);
        let flags = u16::from_be_bytes([data[2], data[3]]);
        let qdcount = u16::from_be_bytes([data[4], data[5]]) as usize;
        let ancount = u16::from_be_bytes([data[6], data[7]]) as usize;

        if flags & FLAG_QR == 0 {
            return None;
        }

        let mut pos = HEADER_LEN;
        let mut questions = Vec::with_capacity(qdcount);

        for _ in 0..qdcount {
            let (domain, next) = read_name(data, pos)?;
            if next + 4 > data.len() {
                return None;
            }
            questions.push(DnsQuestion {
                domain,
                qtype: u16::from_be_bytes([data[next], data[next + 1]]),
                qclass: u16::from_be_bytes([data[next + 2], data[next + 3]]),
            });
            pos = next + 4;
        }

        let mut answers = Vec::with_capacity(ancount);

        for _ in 0..ancount {
            let (name, next) = read_name(data, pos)?;
            if next + 10 > data.len() {
                return None;
            }
            let rtype = u16::from_be_bytes([data[next], data[next + 1]]);
            let class = u16::from_be_bytes([data[next + 2], data[next + 3]]);
            let ttl = u32::from_be_bytes([
                data[next + 4],
                data[next + 5],
                data[next + 6],
                data[next + 7],
            ]);
            let rdlength = u16::from_be_bytes([data[next + 8], data[next + 9]]) as usize;
            let start = next + 10;
            if start + rdlength > data.len() {
                return None;
            }
            answers.push(DnsRecord {
                name,
                rtype,
                class,
                ttl,
                rdata: data[start..start + rdlength].to_vec(),
            });
            pos = start + rdlength;
        }

        Some(Self {
            id,
            flags,
            questions,
            answers,
        })
    }

    pub fn rcode(&self) -> u8 {
        (self.flags & 0x000F) as u8
    }

    pub fn is_truncated(&self) -> bool {
        self.flags & FLAG_TC != 0
    }

    /// Mark the response as truncated.
    pub fn set_truncated(&mut self) {
        self.flags |= FLAG_TC;
    }

    /// Whether this is the reply to `query`: same ID and same question.
    pub fn answers_question(&self, query: &DnsQuery) -> bool {
        self.id == query.id
            && self.questions.first().is_some_and(|q| {
                q.qtype == query.qtype
                    && q.qclass == query.qclass
                    && q.domain.eq_ignore_ascii_case(&query.domain)
            })
    }

    /// Addresses of the given type, in the order they appear in the answer section.
    ///
    /// Records of any other type (CNAME links and the like) are skipped.
    pub fn addresses(&self, rtype: RecordType) -> Vec<String> {
        self.answers
            .iter()
            .filter(|a| a.rtype == rtype.code() && a.class == CLASS_IN)
            .filter_map(DnsRecord::address_text)
            .collect()
    }

    /// Encode the response to wire format bytes.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(512);

        // Header
        data.extend_from_slice(&self.id.to_be_bytes());
        data.extend_from_slice(&self.flags.to_be_bytes());
        data.extend_from_slice(&(self.questions.len() as u16).to_be_bytes());
        data.extend_from_slice(&(self.answers.len() as u16).to_be_bytes());
        data.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
        data.extend_from_slice(&[0x00, 0x00]); // ARCOUNT

        // Questions
        for q in &self.questions {
            encode_domain(&mut data, &q.domain);
            data.extend_from_slice(&q.qtype.to_be_bytes());
            data.extend_from_slice(&q.qclass.to_be_bytes());
        }

        // Answers
        for a in &self.answers {
            // Use compression pointer if this is the first question's domain
            if !self.questions.is_empty() && a.name == self.questions[0].domain {
                data.extend_from_slice(&[0xC0, 0x0C]); // Pointer to offset 12
            } else {
                encode_domain(&mut data, &a.name);
            }
            data.extend_from_slice(&a.rtype.to_be_bytes());
            data.extend_from_slice(&a.class.to_be_bytes());
            data.extend_from_slice(&a.ttl.to_be_bytes());
            data.extend_from_slice(&(a.rdata.len() as u16).to_be_bytes());
            data.extend_from_slice(&a.rdata);
        }

        data
    }
}

fn validate_name(domain: &str) -> Result<(), NameError> {
    if domain.is_empty() {
        return Ok(());
    }
    // Wire length: one length octet per label, the label bytes, and the root octet.
    if domain.len() + 2 > MAX_NAME_LEN {
        return Err(NameError::NameTooLong);
    }
    for label in domain.split('.') {
        if label.is_empty() {
            return Err(NameError::EmptyLabel(domain.to_string()));
        }
        if label.len() > MAX_LABEL_LEN {
            return Err(NameError::LabelTooLong(label.to_string()));
        }
    }
    Ok(())
}

fn to_ascii(domain: &str) -> Result<String, NameError> {
    if domain.is_ascii() {
        return Ok(domain.to_string());
    }
    idna::domain_to_ascii(domain).map_err(|_| NameError::NotAscii(domain.to_string()))
}

fn encode_domain(buf: &mut Vec<u8>, domain: &str) {
    if !domain.is_empty() {
        for label in domain.split('.') {
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
    }
    buf.push(0);
}

/// Decode a possibly compressed name starting at `pos`.
///
/// Returns the dotted name (no trailing dot) and the offset just past the name
/// as it appears at `pos`.
fn read_name(data: &[u8], mut pos: usize) -> Option<(String, usize)> {
    let mut labels: Vec<String> = Vec::new();
    let mut end = None;
    let mut hops = 0;

    loop {
        let len = *data.get(pos)? as usize;
        if len == 0 {
            pos += 1;
            break;
        }
        if len & 0xC0 == 0xC0 {
            let low = *data.get(pos + 1)? as usize;
            if end.is_none() {
                end = Some(pos + 2);
            }
            hops += 1;
            if hops > MAX_POINTER_HOPS {
                return None;
            }
            pos = ((len & 0x3F) << 8) | low;
            continue;
        }
        if len > MAX_LABEL_LEN {
            return None;
        }
        pos += 1;
        let label = data.get(pos..pos + len)?;
        labels.push(String::from_utf8_lossy(label).into_owned());
        pos += len;
    }

    Some((labels.join(".").to_lowercase(), end.unwrap_or(pos)))
}
