//! ASDF-in-FITS fixture builder

const BLOCK_SIZE: usize = 2880;
const CARD_SIZE: usize = 80;

/// One 80-column header card
fn card(keyword: &str, value: &str) -> String {
    format!("{keyword:<8}= {value:>20}")
}

fn text(value: &str) -> String {
    format!("'{:<8}'", value.replace('\'', "''"))
}

fn pad(bytes: &mut Vec<u8>, fill: u8) {
    let len = bytes.len().div_ceil(BLOCK_SIZE) * BLOCK_SIZE;
    bytes.resize(len, fill);
}

fn header(cards: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for card in cards.iter().map(String::as_str).chain(["END"]) {
        let mut record = card.as_bytes().to_vec();
        record.resize(CARD_SIZE, b' ');
        bytes.extend_from_slice(&record);
    }
    pad(&mut bytes, b' ');
    bytes
}

/// Builds a FITS file with an empty primary HDU and byte-image extensions
#[derive(Debug, Default)]
pub struct FitsBuilder {
    extensions: Vec<(String, i64, Vec<u8>)>,
}

impl FitsBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an IMAGE extension holding `data` as a one-axis byte array
    pub fn image(mut self, name: &str, version: i64, data: &[u8]) -> Self {
        self.extensions
            .push((name.to_string(), version, data.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut bytes = header(&[
            card("SIMPLE", "T"),
            card("BITPIX", "8"),
            card("NAXIS", "0"),
            card("EXTEND", "T"),
        ]);

        for (name, version, data) in &self.extensions {
            bytes.extend(header(&[
                card("XTENSION", &text("IMAGE")),
                card("BITPIX", "8"),
                card("NAXIS", "1"),
                card("NAXIS1", &data.len().to_string()),
                card("PCOUNT", "0"),
                card("GCOUNT", "1"),
                card("EXTNAME", &text(name)),
                card("EXTVER", &version.to_string()),
            ]));
            let mut unit = data.clone();
            pad(&mut unit, 0);
            bytes.extend(unit);
        }
        bytes
    }
}

/// FITS file whose `ASDF` extension holds `document`, followed by `images`
pub fn asdf_in_fits(document: &[u8], images: &[(&str, i64, &[u8])]) -> Vec<u8> {
    images
        .iter()
        .fold(
            FitsBuilder::new().image("ASDF", 1, document),
            |builder, (name, version, data)| builder.image(name, *version, data),
        )
        .build()
}
