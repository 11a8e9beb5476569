//! Minimal FITS reader: header cards and HDU boundaries

use thiserror::Error;

/// FITS files are sequences of 2880-byte blocks
pub const BLOCK_SIZE: usize = 2880;

/// Each header card is one 80-byte ASCII record
pub const CARD_SIZE: usize = 80;

const PRIMARY_MAGIC: &[u8] = b"SIMPLE  =";

#[derive(Debug, Error)]
pub enum FitsError {
    #[error("FITS data truncated: HDU {hdu} needs {needed} bytes at offset {offset}")]
    Truncated {
        hdu: usize,
        offset: usize,
        needed: usize,
    },

    #[error("Header of HDU {hdu} has no END card")]
    MissingEnd { hdu: usize },

    #[error("Header of HDU {hdu} is missing required keyword {keyword}")]
    MissingKeyword { hdu: usize, keyword: String },

    #[error("Header of HDU {hdu} has invalid {keyword} value '{value}'")]
    InvalidKeyword {
        hdu: usize,
        keyword: String,
        value: String,
    },

    #[error("First header is not a SIMPLE primary header")]
    NotPrimary,
}

/// Value field of a header card
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    Logical(bool),
    Integer(i64),
    Text(String),
    /// Anything else (floats, complex values), kept as written
    Other(String),
}

impl CardValue {
    fn parse(field: &str) -> Self {
        let field = field.trim_start();
        if let Some(quoted) = field.strip_prefix('\'') {
            return CardValue::Text(parse_quoted(quoted));
        }

        let value = field.split('/').next().unwrap_or_default().trim();
        match value {
            "T" => CardValue::Logical(true),
            "F" => CardValue::Logical(false),
            _ => match value.parse::<i64>() {
                Ok(n) => CardValue::Integer(n),
                Err(_) => CardValue::Other(value.to_string()),
            },
        }
    }
}

/// Body of a quoted string after the opening quote; `''` is an escaped quote
fn parse_quoted(body: &str) -> String {
    let mut text = String::new();
    let mut chars = body.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\'' {
            if chars.peek() == Some(&'\'') {
                chars.next();
                text.push('\'');
                continue;
            }
            break;
        }
        text.push(c);
    }
    text.trim_end().to_string()
}

#[derive(Debug, Clone, PartialEq)]
pub struct Card {
    pub keyword: String,
    pub value: Option<CardValue>,
}

impl Card {
    fn parse(record: &[u8]) -> Self {
        let record = String::from_utf8_lossy(record);
        let keyword = record.get(..8).unwrap_or(&record).trim_end().to_string();
        let value = match record.get(8..10) {
            Some("= ") => record.get(10..).map(CardValue::parse),
            _ => None,
        };
        Self { keyword, value }
    }
}

/// Header cards of one HDU, in file order, without the END card
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Header {
    cards: Vec<Card>,
}

impl Header {
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Value of the first card with `keyword`
    pub fn get(&self, keyword: &str) -> Option<&CardValue> {
        self.cards
            .iter()
            .find(|card| card.keyword == keyword)
            .and_then(|card| card.value.as_ref())
    }

    pub fn integer(&self, keyword: &str) -> Option<i64> {
        match self.get(keyword)? {
            CardValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn text(&self, keyword: &str) -> Option<&str> {
        match self.get(keyword)? {
            CardValue::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn logical(&self, keyword: &str) -> Option<bool> {
        match self.get(keyword)? {
            CardValue::Logical(b) => Some(*b),
            _ => None,
        }
    }
}

/// One header/data unit
#[derive(Debug, Clone)]
pub struct Hdu<'a> {
    pub index: usize,
    pub header: Header,
    /// Data bytes without the block padding
    pub data: &'a [u8],
}

impl Hdu<'_> {
    /// `EXTNAME`, if the header has one
    pub fn name(&self) -> Option<&str> {
        self.header.text("EXTNAME")
    }

    /// `EXTVER`, defaulting to 1
    pub fn version(&self) -> i64 {
        self.header.integer("EXTVER").unwrap_or(1)
    }

    pub fn is_primary(&self) -> bool {
        self.index == 0
    }
}

/// True if `bytes` starts with a FITS primary header
pub fn is_fits(bytes: &[u8]) -> bool {
    bytes.starts_with(PRIMARY_MAGIC)
}

/// Split a FITS file into its HDUs
pub fn parse_hdus(bytes: &[u8]) -> Result<Vec<Hdu<'_>>, FitsError> {
    if !is_fits(bytes) {
        return Err(FitsError::NotPrimary);
    }

    let mut hdus = Vec::new();
    let mut offset = 0;
    while offset < bytes.len() {
        let index = hdus.len();
        let (header, header_len) = read_header(bytes, offset, index)?;
        offset += header_len;

        let data_len = data_size(&header, index)?;
        let data = offset
            .checked_add(data_len)
            .and_then(|end| bytes.get(offset..end))
            .ok_or(FitsError::Truncated {
                hdu: index,
                offset,
                needed: data_len,
            })?;
        offset += padded(data_len);

        hdus.push(Hdu {
            index,
            header,
            data,
        });
    }
    Ok(hdus)
}

/// Extension HDU whose `EXTNAME` equals `name`, ignoring case
pub fn find_extension<'h, 'a>(hdus: &'h [Hdu<'a>], name: &str) -> Option<&'h Hdu<'a>> {
    hdus.iter()
        .filter(|hdu| !hdu.is_primary())
        .find(|hdu| hdu.name().is_some_and(|n| n.eq_ignore_ascii_case(name)))
}

fn read_header(bytes: &[u8], start: usize, hdu: usize) -> Result<(Header, usize), FitsError> {
    let mut cards = Vec::new();
    let mut offset = start;
    loop {
        let block = bytes
            .get(offset..offset + BLOCK_SIZE)
            .ok_or(FitsError::MissingEnd { hdu })?;
        offset += BLOCK_SIZE;

        for record in block.chunks_exact(CARD_SIZE) {
            let card = Card::parse(record);
            if card.keyword == "END" {
                return Ok((Header { cards }, offset - start));
            }
            if !card.keyword.is_empty() {
                cards.push(card);
            }
        }
    }
}

fn required_integer(header: &Header, hdu: usize, keyword: &str) -> Result<i64, FitsError> {
    match header.get(keyword) {
        Some(CardValue::Integer(n)) => Ok(*n),
        Some(other) => Err(FitsError::InvalidKeyword {
            hdu,
            keyword: keyword.to_string(),
            value: format!("{other:?}"),
        }),
        None => Err(FitsError::MissingKeyword {
            hdu,
            keyword: keyword.to_string(),
        }),
    }
}

fn non_negative(value: i64, hdu: usize, keyword: &str) -> Result<usize, FitsError> {
    usize::try_from(value).map_err(|_| FitsError::InvalidKeyword {
        hdu,
        keyword: keyword.to_string(),
        value: value.to_string(),
    })
}

/// Size in bytes of the data following `header`
fn data_size(header: &Header, hdu: usize) -> Result<usize, FitsError> {
    if hdu == 0 && header.logical("SIMPLE") != Some(true) {
        return Err(FitsError::NotPrimary);
    }
    if hdu > 0 && header.text("XTENSION").is_none() {
        return Err(FitsError::MissingKeyword {
            hdu,
            keyword: "XTENSION".to_string(),
        });
    }

    let bitpix = required_integer(header, hdu, "BITPIX")?;
    if !matches!(bitpix, 8 | 16 | 32 | 64 | -32 | -64) {
        return Err(FitsError::InvalidKeyword {
            hdu,
            keyword: "BITPIX".to_string(),
            value: bitpix.to_string(),
        });
    }
    let naxis = non_negative(required_integer(header, hdu, "NAXIS")?, hdu, "NAXIS")?;
    if naxis == 0 {
        return Ok(0);
    }

    let mut elements: usize = 1;
    for axis in 1..=naxis {
        let keyword = format!("NAXIS{axis}");
        let length = non_negative(required_integer(header, hdu, &keyword)?, hdu, &keyword)?;
        elements = elements.saturating_mul(length);
    }
    let pcount = non_negative(header.integer("PCOUNT").unwrap_or(0), hdu, "PCOUNT")?;
    let gcount = non_negative(header.integer("GCOUNT").unwrap_or(1), hdu, "GCOUNT")?;

    let bytes_per_element = bitpix.unsigned_abs() as usize / 8;
    Ok(bytes_per_element
        .saturating_mul(gcount)
        .saturating_mul(elements.saturating_add(pcount)))
}

fn padded(len: usize) -> usize {
    len.div_ceil(BLOCK_SIZE) * BLOCK_SIZE
}
