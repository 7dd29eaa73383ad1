//! Static city/province to region lookup for Philippine addresses.

/// `(lowercase city or province, region)`.
static CITY_REGIONS: &[(&str, &str)] = &[
    // NCR
    ("manila", "NCR"),
    ("quezon city", "NCR"),
    ("makati", "NCR"),
    ("pasig", "NCR"),
    ("taguig", "NCR"),
    ("mandaluyong", "NCR"),
    ("pasay", "NCR"),
    ("parañaque", "NCR"),
    ("paranaque", "NCR"),
    ("caloocan", "NCR"),
    ("marikina", "NCR"),
    ("muntinlupa", "NCR"),
    ("las piñas", "NCR"),
    ("las pinas", "NCR"),
    ("valenzuela", "NCR"),
    ("malabon", "NCR"),
    ("navotas", "NCR"),
    ("san juan", "NCR"),
    ("metro manila", "NCR"),
    // CALABARZON
    ("batangas", "CALABARZON"),
    ("batangas city", "CALABARZON"),
    ("lipa", "CALABARZON"),
    ("lipa city", "CALABARZON"),
    ("tanauan", "CALABARZON"),
    ("santo tomas", "CALABARZON"),
    ("lucena", "CALABARZON"),
    ("calamba", "CALABARZON"),
    ("santa rosa", "CALABARZON"),
    ("biñan", "CALABARZON"),
    ("binan", "CALABARZON"),
    ("san pablo", "CALABARZON"),
    ("san pedro", "CALABARZON"),
    ("cabuyao", "CALABARZON"),
    ("los baños", "CALABARZON"),
    ("los banos", "CALABARZON"),
    ("antipolo", "CALABARZON"),
    ("cainta", "CALABARZON"),
    ("cavite", "CALABARZON"),
    ("dasmariñas", "CALABARZON"),
    ("dasmarinas", "CALABARZON"),
    ("bacoor", "CALABARZON"),
    ("imus", "CALABARZON"),
    ("tagaytay", "CALABARZON"),
    ("laguna", "CALABARZON"),
    ("quezon", "CALABARZON"),
    // Central Luzon
    ("angeles", "Central Luzon"),
    ("pampanga", "Central Luzon"),
    ("olongapo", "Central Luzon"),
    ("malolos", "Central Luzon"),
    ("meycauayan", "Central Luzon"),
    ("bulacan", "Central Luzon"),
    ("cabanatuan", "Central Luzon"),
    ("tarlac", "Central Luzon"),
    ("balanga", "Central Luzon"),
    // MIMAROPA
    ("calapan", "MIMAROPA"),
    ("puerto princesa", "MIMAROPA"),
    // Bicol
    ("naga", "Bicol"),
    ("legazpi", "Bicol"),
    // Western Visayas
    ("iloilo", "Western Visayas"),
    ("iloilo city", "Western Visayas"),
    ("bacolod", "Western Visayas"),
    ("roxas city", "Western Visayas"),
    // Central Visayas
    ("cebu", "Central Visayas"),
    ("cebu city", "Central Visayas"),
    ("mandaue", "Central Visayas"),
    ("tagbilaran", "Central Visayas"),
    ("dumaguete", "Central Visayas"),
    // Northern Mindanao
    ("cagayan de oro", "Northern Mindanao"),
    ("iligan", "Northern Mindanao"),
    // Davao
    ("davao", "Davao Region"),
    ("davao city", "Davao Region"),
    ("tagum", "Davao Region"),
    ("panabo", "Davao Region"),
    ("digos", "Davao Region"),
];

/// Longest city name in words.
const MAX_CITY_WORDS: usize = 3;

/// Region for an exact (case-insensitive) city or province name.
pub fn region_for_city(city: &str) -> Option<&'static str> {
    let needle = city.trim().to_lowercase();
    CITY_REGIONS
        .iter()
        .find(|(name, _)| *name == needle)
        .map(|(_, region)| *region)
}

pub fn is_known_city(name: &str) -> bool {
    region_for_city(name).is_some()
}

/// Detect the region of a free-form address.
///
/// Addresses usually end with city and province, so words are scanned from
/// the end, preferring the longest city name at each position.
pub fn detect_region(address: &str) -> Option<&'static str> {
    let lower = address.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    for end in (1..=words.len()).rev() {
        for len in (1..=MAX_CITY_WORDS.min(end)).rev() {
            let candidate = words[end - len..end].join(" ");
            if let Some(region) = region_for_city(&candidate) {
                return Some(region);
            }
        }
    }
    None
}
