//! Human-readable address formatting and heuristic parsing.

use crate::geocode::place::PlaceAddress;

/// Builds a delivery-style address line from structured components.
///
/// Component order: house number + street, locality, state or province,
/// postal code, country. The country is omitted when it matches the
/// application's home country, and the administrative county is never
/// included; both make domestic delivery addresses look non-standard.
/// Falls back to the provider's full display string when no structured
/// components exist.
pub fn format_address(
    address: Option<&PlaceAddress>,
    display_name: &str,
    home_country: &str,
) -> String {
    let Some(addr) = address else {
        return display_name.to_string();
    };

    let mut components: Vec<String> = Vec::new();

    match (addr.house_number.as_deref(), addr.road.as_deref()) {
        (Some(number), Some(road)) => components.push(format!("{} {}", number, road)),
        (None, Some(road)) => components.push(road.to_string()),
        (Some(number), None) => components.push(number.to_string()),
        (None, None) => {}
    }

    let locality = addr
        .city
        .as_deref()
        .or(addr.town.as_deref())
        .or(addr.village.as_deref())
        .or(addr.municipality.as_deref());
    if let Some(locality) = locality {
        components.push(locality.to_string());
    }

    if let Some(region) = addr.state.as_deref().or(addr.province.as_deref()) {
        components.push(region.to_string());
    }

    if let Some(postcode) = &addr.postcode {
        components.push(postcode.clone());
    }

    if let Some(country) = &addr.country {
        if country != home_country {
            components.push(country.clone());
        }
    }

    if components.is_empty() {
        display_name.to_string()
    } else {
        components.join(", ")
    }
}

/// City, state and postal code pulled back out of a formatted address
/// line. Used by checkout forms that need structured fields from a
/// selected place.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressComponents {
    pub city: String,
    pub state: String,
    pub postal_code: String,
}

/// Finds a 5-digit or 5+4 ZIP code in `part`, returning the code and the
/// remainder with the code removed.
fn split_zip(part: &str) -> Option<(String, String)> {
    let bytes = part.as_bytes();
    let mut start = None;
    for (i, _) in part.char_indices() {
        if bytes[i].is_ascii_digit() {
            let digits = part[i..]
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .count();
            if digits >= 5 {
                start = Some(i);
                break;
            }
        }
    }
    let i = start?;

    let mut end = i + 5;
    let rest = &part[end..];
    if let Some(tail) = rest.strip_prefix('-') {
        let extra = tail.chars().take_while(|c| c.is_ascii_digit()).count();
        if extra == 4 {
            end += 5;
        }
    }

    let zip = part[i..end].to_string();
    let remainder = format!("{}{}", &part[..i], &part[end..]);
    Some((zip, remainder.trim().to_string()))
}

fn trim_commas(value: &str) -> String {
    value.trim_matches(|c: char| c == ',' || c.is_whitespace()).to_string()
}

/// Heuristically parses a one-line address into city, state and postal
/// code. Handles the common shapes: `Street, City, State ZIP`,
/// `City, State ZIP`, `City, State` and a bare locality.
pub fn parse_address_components(address: &str) -> AddressComponents {
    let parts: Vec<&str> = address.split(',').map(str::trim).collect();

    let mut city = String::new();
    let mut state = String::new();
    let mut postal_code = String::new();

    match parts.len() {
        0 => {}
        1 => {
            let single = parts[0];
            let trailing_code = single
                .rsplit_once(' ')
                .filter(|(_, last)| {
                    (2..=3).contains(&last.len())
                        && last.chars().all(|c| c.is_ascii_uppercase())
                });
            if let Some((rest, code)) = trailing_code {
                state = code.to_string();
                city = rest.trim().to_string();
            } else if let Some((zip, rest)) = split_zip(single) {
                postal_code = zip;
                city = rest;
            } else {
                city = single.to_string();
            }
        }
        _ => {
            let last = parts[parts.len() - 1];
            let second_last = parts[parts.len() - 2];

            if let Some((zip, rest)) = split_zip(last) {
                postal_code = zip;
                state = rest;
            } else {
                state = last.to_string();
            }
            city = second_last.to_string();
        }
    }

    AddressComponents {
        city: trim_commas(&city),
        state: trim_commas(&state),
        postal_code: trim_commas(&postal_code),
    }
}
