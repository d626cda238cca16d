//! Column layout of the pricing sheet.
//!
//! Every column the tool reads from or writes to is named here once; formula
//! templates and cell writes derive their A1 letters from this table.

/// Row holding the column headers. Data starts on the row below.
pub const HEADER_ROW: u32 = 1;
pub const FIRST_DATA_ROW: u32 = HEADER_ROW + 1;

/// Largest column index an xlsx worksheet accepts (XFD).
pub const MAX_COLUMN: u32 = 16_384;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    /// Purchase cost (F).
    Cost,
    /// Target margin as a fraction (G).
    Margin,
    /// First competitor price column (J).
    CompetitorFirst,
    /// Last competitor price column (S).
    CompetitorLast,
    /// Price currently on the shelf (T).
    CurrentPrice,
    /// Price proposed by the automator (U).
    AutomatorPrice,
    /// Price proposed by the optimizer (W).
    OptimizerPrice,
    BaseMarginPrice,
    CompPrice,
    ManualPrice,
    Decision,
    NewPrice,
}

impl Field {
    /// Columns written by the configurator, in sheet order.
    pub const OUTPUTS: [Field; 5] = [
        Field::BaseMarginPrice,
        Field::CompPrice,
        Field::ManualPrice,
        Field::Decision,
        Field::NewPrice,
    ];

    /// 1-based column index.
    pub fn index(self) -> u32 {
        match self {
            Field::Cost => 6,
            Field::Margin => 7,
            Field::CompetitorFirst => 10,
            Field::CompetitorLast => 19,
            Field::CurrentPrice => 20,
            Field::AutomatorPrice => 21,
            Field::OptimizerPrice => 23,
            Field::BaseMarginPrice => 25,
            Field::CompPrice => 26,
            Field::ManualPrice => 27,
            Field::Decision => 28,
            Field::NewPrice => 29,
        }
    }

    pub fn letter(self) -> String {
        column_letter(self.index())
    }

    /// A1 reference of this field on `row`, e.g. `F2`.
    pub fn cell(self, row: u32) -> String {
        format!("{}{}", self.letter(), row)
    }

    /// Header label for the output columns.
    pub fn header(self) -> Option<&'static str> {
        match self {
            Field::BaseMarginPrice => Some("base_margin_price"),
            Field::CompPrice => Some("comp_price"),
            Field::ManualPrice => Some("manual_price"),
            Field::Decision => Some("decision"),
            Field::NewPrice => Some("new_price"),
            _ => None,
        }
    }
}

/// Convert a 1-based column index to letters (1 = A, 27 = AA).
pub fn column_letter(index: u32) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(b'A' + rem as u8);
        n = (n - 1) / 26;
    }
    letters.reverse();
    String::from_utf8(letters).unwrap_or_default()
}

/// Convert column letters to a 1-based index. Returns `None` for anything
/// that is not a valid xlsx column.
pub fn column_index(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }

    let mut index: u32 = 0;
    for c in letters.chars() {
        let c = c.to_ascii_uppercase();
        if !c.is_ascii_uppercase() {
            return None;
        }
        index = index * 26 + (c as u32 - 'A' as u32 + 1);
    }

    (index <= MAX_COLUMN).then_some(index)
}

/// Parse A1 notation (e.g. "A1", "AB10", "$AC$2") into (col, row).
pub fn parse_a1(cell: &str) -> Option<(u32, u32)> {
    let cell = cell.trim().replace('$', "");
    let col_end = cell.find(|c: char| c.is_ascii_digit())?;
    let col = column_index(&cell[..col_end])?;
    let row: u32 = cell[col_end..].parse().ok()?;
    (row > 0).then_some((col, row))
}

/// Sheet name as it must appear in a formula reference.
pub fn quote_sheet_name(name: &str) -> String {
    let plain = name
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && name.chars().all(|c| c.is_alphanumeric() || c == '_' || c == '.');

    if plain && !looks_like_reference(name) {
        name.to_string()
    } else {
        format!("'{}'", name.replace('\'', "''"))
    }
}

/// Names a formula parser would read as a cell reference or a literal.
fn looks_like_reference(name: &str) -> bool {
    if parse_a1(name).is_some() {
        return true;
    }
    if name.eq_ignore_ascii_case("true") || name.eq_ignore_ascii_case("false") {
        return true;
    }

    // R1C1 notation: R, C, RC, R2, C3, R2C3
    let upper = name.to_ascii_uppercase();
    let digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    match upper.strip_prefix('R') {
        Some(rest) => match rest.split_once('C') {
            Some((row, col)) => digits(row) && digits(col),
            None => digits(rest),
        },
        None => upper.strip_prefix('C').is_some_and(digits),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_columns_are_y_through_ac() {
        let letters: Vec<String> = Field::OUTPUTS.iter().map(|f| f.letter()).collect();
        assert_eq!(letters, ["Y", "Z", "AA", "AB", "AC"]);
        assert!(Field::OUTPUTS.iter().all(|f| f.header().is_some()));
    }

    #[test]
    fn test_column_letter() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(29), "AC");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
        assert_eq!(column_letter(MAX_COLUMN), "XFD");
    }

    #[test]
    fn test_column_index_inverts_letter() {
        for index in 1..=MAX_COLUMN {
            assert_eq!(column_index(&column_letter(index)), Some(index));
        }
        assert_eq!(column_index("ab"), Some(28));
        assert_eq!(column_index("XFE"), None);
        assert_eq!(column_index(""), None);
        assert_eq!(column_index("A1"), None);
    }

    #[test]
    fn test_parse_a1() {
        assert_eq!(parse_a1("A1"), Some((1, 1)));
        assert_eq!(parse_a1("ab10"), Some((28, 10)));
        assert_eq!(parse_a1("$AC$2"), Some((29, 2)));
        assert_eq!(parse_a1("AB"), None);
        assert_eq!(parse_a1("A0"), None);
        assert_eq!(parse_a1("12"), None);
    }

    #[test]
    fn test_quote_sheet_name() {
        assert_eq!(quote_sheet_name("price_rounding"), "price_rounding");
        assert_eq!(quote_sheet_name("price rounding"), "'price rounding'");
        assert_eq!(quote_sheet_name("2024"), "'2024'");
        assert_eq!(quote_sheet_name("O'Neil"), "'O''Neil'");
    }

    #[test]
    fn test_quote_reference_like_sheet_names() {
        for name in ["A1", "xfd10", "TRUE", "false", "R", "C", "RC", "R1C1", "r12", "C7"] {
            assert_eq!(quote_sheet_name(name), format!("'{}'", name), "{name}");
        }
        for name in ["Rates", "Cost", "RC_table", "prices2024", "R1C1x"] {
            assert_eq!(quote_sheet_name(name), name, "{name}");
        }
    }
}
