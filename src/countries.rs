use crate::error::{LoadError, LoadResult};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Country {
    pub alpha_2: String,
    #[serde(default)]
    pub alpha_3: String,
    pub name: String,
}

impl Country {
    pub fn new(alpha_2: &str, alpha_3: &str, name: &str) -> Self {
        Self {
            alpha_2: alpha_2.to_string(),
            alpha_3: alpha_3.to_string(),
            name: name.to_string(),
        }
    }

    /// Flag emoji built from the two regional indicator symbols of the alpha-2 code.
    pub fn flag(&self) -> Option<String> {
        let code = self.alpha_2.as_bytes();
        if code.len() != 2 || !code.iter().all(u8::is_ascii_uppercase) {
            return None;
        }
        code.iter()
            .map(|&c| char::from_u32(0x1F1E6 + u32::from(c - b'A')))
            .collect()
    }
}

/// Reference set of canonical country names.
///
/// `countries` must always yield the same order, the fuzzy scan relies on it
/// to break ties.
pub trait CountryLookup {
    fn get_by_name(&self, name: &str) -> Option<&Country>;
    fn countries(&self) -> &[Country];
}

#[derive(Debug, Clone)]
pub struct CountryTable {
    countries: Vec<Country>,
    by_name: HashMap<String, usize>,
}

impl CountryTable {
    pub fn from_countries(countries: Vec<Country>) -> Self {
        let mut by_name = HashMap::with_capacity(countries.len());
        for (index, country) in countries.iter().enumerate() {
            // first entry wins on duplicate names
            by_name.entry(country.name.clone()).or_insert(index);
        }
        Self { countries, by_name }
    }

    /// The ISO 3166-1 country list compiled into the binary.
    pub fn embedded() -> Self {
        Self::from_countries(
            ISO_3166_COUNTRIES
                .iter()
                .map(|(alpha_2, alpha_3, name)| Country::new(alpha_2, alpha_3, name))
                .collect(),
        )
    }

    /// Load a reference list from a CSV file with `alpha_2` and `name` columns.
    pub fn from_csv_file(file_path: &str) -> LoadResult<Self> {
        let content = fs::read_to_string(file_path).map_err(|e| LoadError::io(file_path, e))?;
        Self::from_csv_content(&content, file_path)
    }

    pub fn from_csv_content(content: &str, source: &str) -> LoadResult<Self> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(content.as_bytes());

        let mut countries = Vec::new();
        for row in reader.deserialize::<Country>() {
            let country = row.map_err(|e| LoadError::reference(source, e.to_string()))?;
            if country.name.is_empty() {
                return Err(LoadError::reference(source, "country with an empty name"));
            }
            countries.push(country);
        }

        if countries.is_empty() {
            return Err(LoadError::reference(source, "no countries found"));
        }

        Ok(Self::from_countries(countries))
    }

    pub fn len(&self) -> usize {
        self.countries.len()
    }
}

impl CountryLookup for CountryTable {
    fn get_by_name(&self, name: &str) -> Option<&Country> {
        self.by_name.get(name).map(|&index| &self.countries[index])
    }

    fn countries(&self) -> &[Country] {
        &self.countries
    }
}

const ISO_3166_COUNTRIES: [(&str, &str, &str); 249] = [
    ("AW", "ABW", "Aruba"),
    ("AF", "AFG", "Afghanistan"),
    ("AO", "AGO", "Angola"),
    ("AI", "AIA", "Anguilla"),
    ("AX", "ALA", "Åland Islands"),
    ("AL", "ALB", "Albania"),
    ("AD", "AND", "Andorra"),
    ("AE", "ARE", "United Arab Emirates"),
    ("AR", "ARG", "Argentina"),
    ("AM", "ARM", "Armenia"),
    ("AS", "ASM", "American Samoa"),
    ("AQ", "ATA", "Antarctica"),
    ("TF", "ATF", "French Southern Territories"),
    ("AG", "ATG", "Antigua and Barbuda"),
    ("AU", "AUS", "Australia"),
    ("AT", "AUT", "Austria"),
    ("AZ", "AZE", "Azerbaijan"),
    ("BI", "BDI", "Burundi"),
    ("BE", "BEL", "Belgium"),
    ("BJ", "BEN", "Benin"),
    ("BQ", "BES", "Bonaire, Sint Eustatius and Saba"),
    ("BF", "BFA", "Burkina Faso"),
    ("BD", "BGD", "Bangladesh"),
    ("BG", "BGR", "Bulgaria"),
    ("BH", "BHR", "Bahrain"),
    ("BS", "BHS", "Bahamas"),
    ("BA", "BIH", "Bosnia and Herzegovina"),
    ("BL", "BLM", "Saint Barthélemy"),
    ("BY", "BLR", "Belarus"),
    ("BZ", "BLZ", "Belize"),
    ("BM", "BMU", "Bermuda"),
    ("BO", "BOL", "Bolivia, Plurinational State of"),
    ("BR", "BRA", "Brazil"),
    ("BB", "BRB", "Barbados"),
    ("BN", "BRN", "Brunei Darussalam"),
    ("BT", "BTN", "Bhutan"),
    ("BV", "BVT", "Bouvet Island"),
    ("BW", "BWA", "Botswana"),
    ("CF", "CAF", "Central African Republic"),
    ("CA", "CAN", "Canada"),
    ("CC", "CCK", "Cocos (Keeling) Islands"),
    ("CH", "CHE", "Switzerland"),
    ("CL", "CHL", "Chile"),
    ("CN", "CHN", "China"),
    ("CI", "CIV", "Côte d'Ivoire"),
    ("CM", "CMR", "Cameroon"),
    ("CD", "COD", "Congo, The Democratic Republic of the"),
    ("CG", "COG", "Congo"),
    ("CK", "COK", "Cook Islands"),
    ("CO", "COL", "Colombia"),
    ("KM", "COM", "Comoros"),
    ("CV", "CPV", "Cabo Verde"),
    ("CR", "CRI", "Costa Rica"),
    ("CU", "CUB", "Cuba"),
    ("CW", "CUW", "Curaçao"),
    ("CX", "CXR", "Christmas Island"),
    ("KY", "CYM", "Cayman Islands"),
    ("CY", "CYP", "Cyprus"),
    ("CZ", "CZE", "Czechia"),
    ("DE", "DEU", "Germany"),
    ("DJ", "DJI", "Djibouti"),
    ("DM", "DMA", "Dominica"),
    ("DK", "DNK", "Denmark"),
    ("DO", "DOM", "Dominican Republic"),
    ("DZ", "DZA", "Algeria"),
    ("EC", "ECU", "Ecuador"),
    ("EG", "EGY", "Egypt"),
    ("ER", "ERI", "Eritrea"),
    ("EH", "ESH", "Western Sahara"),
    ("ES", "ESP", "Spain"),
    ("EE", "EST", "Estonia"),
    ("ET", "ETH", "Ethiopia"),
    ("FI", "FIN", "Finland"),
    ("FJ", "FJI", "Fiji"),
    ("FK", "FLK", "Falkland Islands (Malvinas)"),
    ("FR", "FRA", "France"),
    ("FO", "FRO", "Faroe Islands"),
    ("FM", "FSM", "Micronesia, Federated States of"),
    ("GA", "GAB", "Gabon"),
    ("GB", "GBR", "United Kingdom"),
    ("GE", "GEO", "Georgia"),
    ("GG", "GGY", "Guernsey"),
    ("GH", "GHA", "Ghana"),
    ("GI", "GIB", "Gibraltar"),
    ("GN", "GIN", "Guinea"),
    ("GP", "GLP", "Guadeloupe"),
    ("GM", "GMB", "Gambia"),
    ("GW", "GNB", "Guinea-Bissau"),
    ("GQ", "GNQ", "Equatorial Guinea"),
    ("GR", "GRC", "Greece"),
    ("GD", "GRD", "Grenada"),
    ("GL", "GRL", "Greenland"),
    ("GT", "GTM", "Guatemala"),
    ("GF", "GUF", "French Guiana"),
    ("GU", "GUM", "Guam"),
    ("GY", "GUY", "Guyana"),
    ("HK", "HKG", "Hong Kong"),
    ("HM", "HMD", "Heard Island and McDonald Islands"),
    ("HN", "HND", "Honduras"),
    ("HR", "HRV", "Croatia"),
    ("HT", "HTI", "Haiti"),
    ("HU", "HUN", "Hungary"),
    ("ID", "IDN", "Indonesia"),
    ("IM", "IMN", "Isle of Man"),
    ("IN", "IND", "India"),
    ("IO", "IOT", "British Indian Ocean Territory"),
    ("IE", "IRL", "Ireland"),
    ("IR", "IRN", "Iran, Islamic Republic of"),
    ("IQ", "IRQ", "Iraq"),
    ("IS", "ISL", "Iceland"),
    ("IL", "ISR", "Israel"),
    ("IT", "ITA", "Italy"),
    ("JM", "JAM", "Jamaica"),
    ("JE", "JEY", "Jersey"),
    ("JO", "JOR", "Jordan"),
    ("JP", "JPN", "Japan"),
    ("KZ", "KAZ", "Kazakhstan"),
    ("KE", "KEN", "Kenya"),
    ("KG", "KGZ", "Kyrgyzstan"),
    ("KH", "KHM", "Cambodia"),
    ("KI", "KIR", "Kiribati"),
    ("KN", "KNA", "Saint Kitts and Nevis"),
    ("KR", "KOR", "Korea, Republic of"),
    ("KW", "KWT", "Kuwait"),
    ("LA", "LAO", "Lao People's Democratic Republic"),
    ("LB", "LBN", "Lebanon"),
    ("LR", "LBR", "Liberia"),
    ("LY", "LBY", "Libya"),
    ("LC", "LCA", "Saint Lucia"),
    ("LI", "LIE", "Liechtenstein"),
    ("LK", "LKA", "Sri Lanka"),
    ("LS", "LSO", "Lesotho"),
    ("LT", "LTU", "Lithuania"),
    ("LU", "LUX", "Luxembourg"),
    ("LV", "LVA", "Latvia"),
    ("MO", "MAC", "Macao"),
    ("MF", "MAF", "Saint Martin (French part)"),
    ("MA", "MAR", "Morocco"),
    ("MC", "MCO", "Monaco"),
    ("MD", "MDA", "Moldova, Republic of"),
    ("MG", "MDG", "Madagascar"),
    ("MV", "MDV", "Maldives"),
    ("MX", "MEX", "Mexico"),
    ("MH", "MHL", "Marshall Islands"),
    ("MK", "MKD", "North Macedonia"),
    ("ML", "MLI", "Mali"),
    ("MT", "MLT", "Malta"),
    ("MM", "MMR", "Myanmar"),
    ("ME", "MNE", "Montenegro"),
    ("MN", "MNG", "Mongolia"),
    ("MP", "MNP", "Northern Mariana Islands"),
    ("MZ", "MOZ", "Mozambique"),
    ("MR", "MRT", "Mauritania"),
    ("MS", "MSR", "Montserrat"),
    ("MQ", "MTQ", "Martinique"),
    ("MU", "MUS", "Mauritius"),
    ("MW", "MWI", "Malawi"),
    ("MY", "MYS", "Malaysia"),
    ("YT", "MYT", "Mayotte"),
    ("NA", "NAM", "Namibia"),
    ("NC", "NCL", "New Caledonia"),
    ("NE", "NER", "Niger"),
    ("NF", "NFK", "Norfolk Island"),
    ("NG", "NGA", "Nigeria"),
    ("NI", "NIC", "Nicaragua"),
    ("NU", "NIU", "Niue"),
    ("NL", "NLD", "Netherlands"),
    ("NO", "NOR", "Norway"),
    ("NP", "NPL", "Nepal"),
    ("NR", "NRU", "Nauru"),
    ("NZ", "NZL", "New Zealand"),
    ("OM", "OMN", "Oman"),
    ("PK", "PAK", "Pakistan"),
    ("PA", "PAN", "Panama"),
    ("PN", "PCN", "Pitcairn"),
    ("PE", "PER", "Peru"),
    ("PH", "PHL", "Philippines"),
    ("PW", "PLW", "Palau"),
    ("PG", "PNG", "Papua New Guinea"),
    ("PL", "POL", "Poland"),
    ("PR", "PRI", "Puerto Rico"),
    ("KP", "PRK", "Korea, Democratic People's Republic of"),
    ("PT", "PRT", "Portugal"),
    ("PY", "PRY", "Paraguay"),
    ("PS", "PSE", "Palestine, State of"),
    ("PF", "PYF", "French Polynesia"),
    ("QA", "QAT", "Qatar"),
    ("RE", "REU", "Réunion"),
    ("RO", "ROU", "Romania"),
    ("RU", "RUS", "Russian Federation"),
    ("RW", "RWA", "Rwanda"),
    ("SA", "SAU", "Saudi Arabia"),
    ("SD", "SDN", "Sudan"),
    ("SN", "SEN", "Senegal"),
    ("SG", "SGP", "Singapore"),
    ("GS", "SGS", "South Georgia and the South Sandwich Islands"),
    ("SH", "SHN", "Saint Helena, Ascension and Tristan da Cunha"),
    ("SJ", "SJM", "Svalbard and Jan Mayen"),
    ("SB", "SLB", "Solomon Islands"),
    ("SL", "SLE", "Sierra Leone"),
    ("SV", "SLV", "El Salvador"),
    ("SM", "SMR", "San Marino"),
    ("SO", "SOM", "Somalia"),
    ("PM", "SPM", "Saint Pierre and Miquelon"),
    ("RS", "SRB", "Serbia"),
    ("SS", "SSD", "South Sudan"),
    ("ST", "STP", "Sao Tome and Principe"),
    ("SR", "SUR", "Suriname"),
    ("SK", "SVK", "Slovakia"),
    ("SI", "SVN", "Slovenia"),
    ("SE", "SWE", "Sweden"),
    ("SZ", "SWZ", "Eswatini"),
    ("SX", "SXM", "Sint Maarten (Dutch part)"),
    ("SC", "SYC", "Seychelles"),
    ("SY", "SYR", "Syrian Arab Republic"),
    ("TC", "TCA", "Turks and Caicos Islands"),
    ("TD", "TCD", "Chad"),
    ("TG", "TGO", "Togo"),
    ("TH", "THA", "Thailand"),
    ("TJ", "TJK", "Tajikistan"),
    ("TK", "TKL", "Tokelau"),
    ("TM", "TKM", "Turkmenistan"),
    ("TL", "TLS", "Timor-Leste"),
    ("TO", "TON", "Tonga"),
    ("TT", "TTO", "Trinidad and Tobago"),
    ("TN", "TUN", "Tunisia"),
    ("TR", "TUR", "Türkiye"),
    ("TV", "TUV", "Tuvalu"),
    ("TW", "TWN", "Taiwan, Province of China"),
    ("TZ", "TZA", "Tanzania, United Republic of"),
    ("UG", "UGA", "Uganda"),
    ("UA", "UKR", "Ukraine"),
    ("UM", "UMI", "United States Minor Outlying Islands"),
    ("UY", "URY", "Uruguay"),
    ("US", "USA", "United States"),
    ("UZ", "UZB", "Uzbekistan"),
    ("VA", "VAT", "Holy See (Vatican City State)"),
    ("VC", "VCT", "Saint Vincent and the Grenadines"),
    ("VE", "VEN", "Venezuela, Bolivarian Republic of"),
    ("VG", "VGB", "Virgin Islands, British"),
    ("VI", "VIR", "Virgin Islands, U.S."),
    ("VN", "VNM", "Viet Nam"),
    ("VU", "VUT", "Vanuatu"),
    ("WF", "WLF", "Wallis and Futuna"),
    ("WS", "WSM", "Samoa"),
    ("YE", "YEM", "Yemen"),
    ("ZA", "ZAF", "South Africa"),
    ("ZM", "ZMB", "Zambia"),
    ("ZW", "ZWE", "Zimbabwe"),
];
