// Prefix to DXCC Entity mapping - built-in subset
// Source: ITU Radio Regulations and ARRL prefix assignments
//
// Rows with a date window model historical reassignments. The Y2-Y9 block
// belonged to the German Democratic Republic until reunification on
// 1990-10-03 and to the Federal Republic of Germany afterwards.

/// A static prefix row
#[derive(Debug, Clone)]
pub struct PrefixRow {
    /// The prefix pattern (e.g., "W", "VE", "JA")
    pub prefix: &'static str,
    /// ADIF entity number
    pub adif: u16,
    /// Primary prefix of the entity
    pub primary: bool,
    /// Window start (YYYY-MM-DD, inclusive)
    pub from: Option<&'static str>,
    /// Window end (YYYY-MM-DD, exclusive)
    pub to: Option<&'static str>,
}

const fn p(prefix: &'static str, adif: u16) -> PrefixRow {
    PrefixRow { prefix, adif, primary: false, from: None, to: None }
}

const fn primary(prefix: &'static str, adif: u16) -> PrefixRow {
    PrefixRow { prefix, adif, primary: true, from: None, to: None }
}

const fn until(prefix: &'static str, adif: u16, to: &'static str) -> PrefixRow {
    PrefixRow { prefix, adif, primary: false, from: None, to: Some(to) }
}

const fn since(prefix: &'static str, adif: u16, from: &'static str) -> PrefixRow {
    PrefixRow { prefix, adif, primary: false, from: Some(from), to: None }
}

const REUNIFICATION: &str = "1990-10-03";

pub const PREFIX_ROWS: &[PrefixRow] = &[
    // =========================================================================
    // NORTH AMERICA
    // =========================================================================
    // United States (ITU: A, K, N, W)
    primary("K", 291), p("W", 291), p("N", 291),
    p("AA", 291), p("AB", 291), p("AC", 291), p("AD", 291), p("AE", 291),
    p("AF", 291), p("AG", 291), p("AI", 291), p("AJ", 291), p("AK", 291),
    primary("KL", 6), p("AL", 6), p("NL", 6), p("WL", 6),
    primary("KH6", 110), p("KH7", 110), p("AH6", 110), p("NH6", 110), p("WH6", 110),
    primary("KP4", 202), p("KP3", 202), p("NP4", 202), p("WP4", 202),
    primary("KP2", 285), p("NP2", 285), p("WP2", 285),
    primary("KG4", 105),
    // Canada
    primary("VE", 1), p("VA", 1), p("VO", 1), p("VY", 1), p("CY", 1), p("XJ", 1),
    // Mexico, Cuba
    primary("XE", 50), p("XF", 50), p("4A", 50), p("6D", 50),
    primary("CM", 70), p("CO", 70), p("T4", 70),

    // =========================================================================
    // EUROPE
    // =========================================================================
    // United Kingdom and Crown dependencies
    primary("G", 223), p("M", 223), p("2E", 223),
    primary("GM", 265), p("MM", 265), p("2M", 265),
    primary("GW", 294), p("MW", 294), p("2W", 294),
    primary("GI", 279), p("MI", 279), p("2I", 279),
    primary("GD", 114), p("MD", 114), p("2D", 114),
    primary("GJ", 122), p("MJ", 122), p("2J", 122),
    primary("GU", 106), p("MU", 106), p("2U", 106),
    primary("EI", 245), p("EJ", 245),
    primary("F", 227),
    // Germany (ITU: DA-DR), Y2-Y9 after reunification
    p("DA", 230), p("DB", 230), p("DC", 230), p("DD", 230), p("DF", 230),
    p("DG", 230), p("DH", 230), p("DJ", 230), p("DK", 230), primary("DL", 230),
    p("DM", 230), p("DN", 230), p("DO", 230), p("DP", 230), p("DQ", 230), p("DR", 230),
    since("Y2", 230, REUNIFICATION), since("Y3", 230, REUNIFICATION),
    since("Y4", 230, REUNIFICATION), since("Y5", 230, REUNIFICATION),
    since("Y6", 230, REUNIFICATION), since("Y7", 230, REUNIFICATION),
    since("Y8", 230, REUNIFICATION), since("Y9", 230, REUNIFICATION),
    // German Democratic Republic (deleted)
    until("Y2", 229, REUNIFICATION), until("Y3", 229, REUNIFICATION),
    until("Y4", 229, REUNIFICATION), until("Y5", 229, REUNIFICATION),
    until("Y6", 229, REUNIFICATION), until("Y7", 229, REUNIFICATION),
    until("Y8", 229, REUNIFICATION), until("Y9", 229, REUNIFICATION),
    // Italy
    primary("I", 248), primary("IS", 225), p("IM0", 225),
    // Spain and islands
    primary("EA", 281), p("EB", 281), p("EC", 281), p("ED", 281), p("EE", 281),
    p("EF", 281), p("EG", 281), p("EH", 281),
    primary("EA6", 21), p("EB6", 21), p("EC6", 21), p("ED6", 21),
    primary("EA8", 29), p("EB8", 29), p("EC8", 29), p("ED8", 29),
    primary("EA9", 32), p("EB9", 32), p("EC9", 32), p("ED9", 32),
    // Portugal and islands
    primary("CT", 272), p("CQ", 272), p("CR", 272), p("CS", 272),
    primary("CT3", 256), p("CQ3", 256), p("CR3", 256), p("CS3", 256),
    primary("CU", 149),
    // Benelux, Alpine
    primary("PA", 263), p("PB", 263), p("PC", 263), p("PD", 263), p("PE", 263),
    p("PF", 263), p("PG", 263), p("PH", 263), p("PI", 263),
    primary("ON", 209), p("OO", 209), p("OP", 209), p("OQ", 209), p("OR", 209),
    p("OS", 209), p("OT", 209),
    primary("LX", 254),
    primary("HB", 287), p("HE", 287), primary("HB0", 251), p("HE0", 251),
    primary("OE", 206),
    // Central and Eastern Europe
    primary("SP", 269), p("SN", 269), p("SO", 269), p("SQ", 269), p("SR", 269), p("3Z", 269),
    primary("OK", 503), p("OL", 503),
    primary("OM", 504),
    primary("HA", 239), p("HG", 239),
    primary("YO", 275), p("YP", 275), p("YQ", 275), p("YR", 275),
    primary("LZ", 212),
    primary("SV", 236), p("SW", 236), p("SX", 236), p("SY", 236), p("SZ", 236), p("J4", 236),
    primary("SV9", 40), p("SW9", 40), p("SX9", 40), p("SY9", 40), p("SZ9", 40), p("J49", 40),
    primary("UA", 54), p("R", 54), p("U", 54),
    primary("UA9", 15), p("UA0", 15), p("RA9", 15), p("RA0", 15), p("R9", 15), p("R0", 15),
    p("UI9", 15), p("UI0", 15),
    primary("UR", 288), p("US", 288), p("UT", 288), p("UU", 288), p("UX", 288),
    p("UY", 288), p("EM", 288), p("EN", 288), p("EO", 288),
    // Scandinavia
    primary("SM", 284), p("SA", 284), p("SK", 284), p("7S", 284), p("8S", 284),
    primary("LA", 266), p("LB", 266), p("LN", 266),
    primary("OH", 224), p("OF", 224), p("OG", 224),
    primary("OZ", 221), p("OU", 221), p("5P", 221),
    primary("TF", 242),

    // =========================================================================
    // ASIA
    // =========================================================================
    primary("TA", 390), p("TB", 390), p("TC", 390), p("YM", 390),
    primary("JA", 339), p("JE", 339), p("JF", 339), p("JG", 339), p("JH", 339),
    p("JI", 339), p("JJ", 339), p("JK", 339), p("JL", 339), p("JM", 339),
    p("JN", 339), p("JO", 339), p("JP", 339), p("JQ", 339), p("JR", 339),
    p("JS", 339), p("7J", 339), p("7K", 339), p("7L", 339), p("7M", 339),
    p("7N", 339), p("8J", 339),
    primary("BY", 318), p("BA", 318), p("BD", 318), p("BG", 318), p("BH", 318),
    p("BI", 318), p("BT", 318),
    primary("HL", 137), p("DS", 137), p("DT", 137), p("6K", 137), p("6L", 137),
    primary("BV", 386), p("BM", 386), p("BN", 386), p("BX", 386),
    primary("VU", 324), p("AT", 324), p("AU", 324), p("8T", 324),

    // =========================================================================
    // OCEANIA, SOUTH AMERICA, AFRICA, ANTARCTICA
    // =========================================================================
    primary("VK", 150), p("AX", 150), p("VH", 150), p("VI", 150), p("VJ", 150),
    primary("ZL", 170), p("ZK", 170), p("ZM", 170),
    primary("PY", 108), p("PP", 108), p("PQ", 108), p("PR", 108), p("PS", 108),
    p("PT", 108), p("PU", 108), p("PV", 108), p("PW", 108), p("PX", 108),
    p("ZV", 108), p("ZW", 108), p("ZX", 108), p("ZY", 108), p("ZZ", 108),
    primary("LU", 100), p("AY", 100), p("AZ", 100), p("LO", 100), p("LP", 100),
    p("LQ", 100), p("LR", 100), p("LS", 100), p("LT", 100), p("LV", 100), p("LW", 100),
    primary("CE", 112), p("CA", 112), p("CB", 112), p("CC", 112), p("CD", 112),
    p("XQ", 112), p("XR", 112), p("3G", 112),
    primary("OA", 136), p("OB", 136), p("OC", 136), p("4T", 136),
    primary("HK", 116), p("HJ", 116), p("5J", 116), p("5K", 116),
    primary("YV", 148), p("YW", 148), p("YX", 148), p("YY", 148), p("4M", 148),
    primary("ZS", 462), p("ZR", 462), p("ZT", 462), p("ZU", 462),
    primary("SU", 478), p("SS", 478), p("6A", 478),
    primary("CE9", 13), p("KC4", 13), p("VP8", 13),
];

/// Calls that break their prefix's rule
pub struct ExceptionRow {
    pub call: &'static str,
    pub adif: u16,
    /// Covers every call starting with `call`
    pub prefix: bool,
}

pub const EXCEPTION_ROWS: &[ExceptionRow] = &[
    // US stations in Antarctica keep a K-block call
    ExceptionRow { call: "KC4AAA", adif: 13, prefix: false },
    ExceptionRow { call: "KC4AAC", adif: 13, prefix: false },
    // McMurdo, Byrd, Siple...
    ExceptionRow { call: "KC4US", adif: 13, prefix: true },
    // KC4 outside the Antarctic allocation is a regular US call
    ExceptionRow { call: "KC4ABC", adif: 291, prefix: false },
];

/// Get all prefixes for a given entity
pub fn prefixes_for_adif(adif: u16) -> Vec<&'static str> {
    PREFIX_ROWS
        .iter()
        .filter(|row| row.adif == adif)
        .map(|row| row.prefix)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::dxcc::row_by_adif;

    #[test]
    fn test_rows_reference_known_entities() {
        for row in PREFIX_ROWS {
            assert!(row_by_adif(row.adif).is_some(), "{} -> unknown ADIF {}", row.prefix, row.adif);
        }
        for row in EXCEPTION_ROWS {
            assert!(row_by_adif(row.adif).is_some(), "{} -> unknown ADIF {}", row.call, row.adif);
        }
    }

    #[test]
    fn test_one_primary_per_entity() {
        for entity in crate::reference::dxcc::ENTITY_ROWS {
            let primaries = PREFIX_ROWS.iter().filter(|r| r.adif == entity.adif && r.primary).count();
            assert!(primaries <= 1, "{} has {} primary prefixes", entity.name, primaries);
        }
    }

    #[test]
    fn test_prefixes_for_germany() {
        let prefixes = prefixes_for_adif(230);
        assert!(prefixes.contains(&"DL"));
        assert!(prefixes.contains(&"Y2"));
    }
}
