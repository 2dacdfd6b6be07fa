// DXCC Entity List - built-in subset
// Source: ARRL DXCC List (https://www.arrl.org/country-lists-prefixes)
//
// Names follow the country-files.com spelling so the CTY.DAT adapter can map
// entity names to ADIF numbers without an external mapping file.
//
// Fields:
// - adif: ARRL DXCC entity number
// - name: Entity name
// - prefix: Primary prefix
// - continent: Two-letter continent code (NA, SA, EU, AF, AS, OC, AN)
// - cq_zone / itu_zone
// - lat / lon: Degrees, north and east positive
// - deleted: Entity no longer counts for new contacts
// - valid_to: Date the entity ceased to exist (YYYY-MM-DD)

/// Static entity row
#[derive(Debug, Clone)]
pub struct EntityRow {
    pub adif: u16,
    pub name: &'static str,
    pub prefix: &'static str,
    pub continent: &'static str,
    pub cq_zone: u8,
    pub itu_zone: u8,
    pub lat: f64,
    pub lon: f64,
    pub deleted: bool,
    pub valid_to: Option<&'static str>,
}

const fn row(
    adif: u16,
    name: &'static str,
    prefix: &'static str,
    continent: &'static str,
    cq_zone: u8,
    itu_zone: u8,
    lat: f64,
    lon: f64,
) -> EntityRow {
    EntityRow { adif, name, prefix, continent, cq_zone, itu_zone, lat, lon, deleted: false, valid_to: None }
}

pub const ENTITY_ROWS: &[EntityRow] = &[
    // =========================================================================
    // NORTH AMERICA (NA)
    // =========================================================================
    row(1, "Canada", "VE", "NA", 5, 9, 44.35, -78.75),
    row(6, "Alaska", "KL", "NA", 1, 1, 61.40, -148.87),
    row(110, "Hawaii", "KH6", "OC", 31, 61, 21.12, -157.48),
    row(291, "United States", "K", "NA", 5, 8, 37.53, -91.67),
    row(202, "Puerto Rico", "KP4", "NA", 8, 11, 18.18, -66.55),
    row(285, "US Virgin Islands", "KP2", "NA", 8, 11, 17.73, -64.80),
    row(105, "Guantanamo Bay", "KG4", "NA", 8, 11, 19.90, -75.15),
    row(50, "Mexico", "XE", "NA", 6, 10, 21.32, -100.23),
    row(70, "Cuba", "CM", "NA", 8, 11, 21.50, -80.00),

    // =========================================================================
    // EUROPE (EU)
    // =========================================================================
    row(223, "England", "G", "EU", 14, 27, 52.77, -1.47),
    row(265, "Scotland", "GM", "EU", 14, 27, 56.82, -4.18),
    row(294, "Wales", "GW", "EU", 14, 27, 52.28, -3.73),
    row(279, "Northern Ireland", "GI", "EU", 14, 27, 54.73, -6.68),
    row(114, "Isle of Man", "GD", "EU", 14, 27, 54.20, -4.53),
    row(122, "Jersey", "GJ", "EU", 14, 27, 49.22, -2.18),
    row(106, "Guernsey", "GU", "EU", 14, 27, 49.45, -2.58),
    row(245, "Ireland", "EI", "EU", 14, 27, 53.13, -8.02),
    row(227, "France", "F", "EU", 14, 27, 46.00, 2.00),
    row(230, "Fed. Rep. of Germany", "DL", "EU", 14, 28, 51.00, 10.00),
    EntityRow {
        adif: 229,
        name: "German Dem. Rep.",
        prefix: "Y2",
        continent: "EU",
        cq_zone: 14,
        itu_zone: 28,
        lat: 52.50,
        lon: 13.40,
        deleted: true,
        valid_to: Some("1990-10-03"),
    },
    row(248, "Italy", "I", "EU", 15, 28, 42.82, 12.58),
    row(225, "Sardinia", "IS", "EU", 15, 28, 40.15, 9.27),
    row(281, "Spain", "EA", "EU", 14, 37, 40.37, -4.88),
    row(21, "Balearic Islands", "EA6", "EU", 14, 37, 39.60, 2.95),
    row(29, "Canary Islands", "EA8", "AF", 33, 36, 28.32, -15.85),
    row(32, "Ceuta & Melilla", "EA9", "AF", 33, 37, 35.90, -5.27),
    row(272, "Portugal", "CT", "EU", 14, 37, 39.50, -8.00),
    row(256, "Madeira Islands", "CT3", "AF", 33, 36, 32.75, -16.95),
    row(149, "Azores", "CU", "EU", 14, 36, 38.70, -27.23),
    row(263, "Netherlands", "PA", "EU", 14, 27, 52.28, 5.47),
    row(209, "Belgium", "ON", "EU", 14, 27, 50.70, 4.85),
    row(254, "Luxembourg", "LX", "EU", 14, 27, 50.00, 6.00),
    row(287, "Switzerland", "HB", "EU", 14, 28, 46.87, 8.12),
    row(251, "Liechtenstein", "HB0", "EU", 14, 28, 47.13, 9.57),
    row(206, "Austria", "OE", "EU", 15, 28, 47.33, 13.33),
    row(269, "Poland", "SP", "EU", 15, 28, 52.28, 18.67),
    row(503, "Czech Republic", "OK", "EU", 15, 28, 50.00, 16.00),
    row(504, "Slovak Republic", "OM", "EU", 15, 28, 49.00, 20.00),
    row(239, "Hungary", "HA", "EU", 15, 28, 47.12, 19.28),
    row(275, "Romania", "YO", "EU", 20, 28, 45.78, 24.70),
    row(212, "Bulgaria", "LZ", "EU", 20, 28, 42.83, 25.08),
    row(236, "Greece", "SV", "EU", 20, 28, 39.78, 21.78),
    row(40, "Crete", "SV9", "EU", 20, 28, 35.23, 24.78),
    row(54, "European Russia", "UA", "EU", 16, 29, 53.65, 41.37),
    row(288, "Ukraine", "UR", "EU", 16, 29, 50.00, 30.00),
    row(284, "Sweden", "SM", "EU", 14, 18, 61.20, 14.57),
    row(266, "Norway", "LA", "EU", 14, 18, 61.00, 9.00),
    row(224, "Finland", "OH", "EU", 15, 18, 63.78, 27.08),
    row(221, "Denmark", "OZ", "EU", 14, 18, 56.00, 10.00),
    row(242, "Iceland", "TF", "EU", 40, 17, 64.80, -18.73),

    // =========================================================================
    // ASIA (AS)
    // =========================================================================
    row(15, "Asiatic Russia", "UA9", "AS", 17, 30, 55.88, 84.08),
    row(390, "Asiatic Turkey", "TA", "AS", 20, 39, 39.18, 35.65),
    row(339, "Japan", "JA", "AS", 25, 45, 36.40, 138.38),
    row(318, "China", "BY", "AS", 24, 44, 36.00, 102.00),
    row(137, "Republic of Korea", "HL", "AS", 25, 44, 36.23, 127.90),
    row(386, "Taiwan", "BV", "AS", 24, 44, 23.72, 120.88),
    row(324, "India", "VU", "AS", 22, 41, 22.50, 77.58),

    // =========================================================================
    // OCEANIA (OC), SOUTH AMERICA (SA), AFRICA (AF), ANTARCTICA (AN)
    // =========================================================================
    row(150, "Australia", "VK", "OC", 30, 55, -23.70, 132.33),
    row(170, "New Zealand", "ZL", "OC", 32, 60, -41.83, 173.27),
    row(108, "Brazil", "PY", "SA", 11, 15, -10.00, -53.00),
    row(100, "Argentina", "LU", "SA", 13, 14, -34.80, -65.92),
    row(112, "Chile", "CE", "SA", 12, 14, -30.00, -71.00),
    row(136, "Peru", "OA", "SA", 10, 12, -10.00, -76.00),
    row(116, "Colombia", "HK", "SA", 9, 12, 5.00, -74.00),
    row(148, "Venezuela", "YV", "SA", 9, 12, 8.00, -66.00),
    row(462, "South Africa", "ZS", "AF", 38, 57, -29.07, 22.63),
    row(478, "Egypt", "SU", "AF", 34, 38, 26.28, 28.60),
    row(13, "Antarctica", "CE9", "AN", 13, 74, -90.00, 0.00),
];

/// Get an entity row by ADIF number
pub fn row_by_adif(adif: u16) -> Option<&'static EntityRow> {
    ENTITY_ROWS.iter().find(|e| e.adif == adif)
}

/// Get an entity row by name (case-insensitive)
pub fn row_by_name(name: &str) -> Option<&'static EntityRow> {
    let name = name.trim();
    ENTITY_ROWS.iter().find(|e| e.name.eq_ignore_ascii_case(name))
}
