//! Polyline5: signed varint deltas (base 32, offset 63) over latitude
//! then longitude accumulators in 1e-5 degrees.

/// Decodes into `[lon, lat]` pairs, the order route geometry is emitted in.
pub fn decode(encoded: &str) -> Vec<[f64; 2]> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat = 0_i64;
    let mut lon = 0_i64;

    while index < bytes.len() {
        let Some(delta_lat) = decode_value(bytes, &mut index) else {
            break;
        };
        lat += delta_lat;

        let Some(delta_lon) = decode_value(bytes, &mut index) else {
            break;
        };
        lon += delta_lon;

        points.push([lon as f64 / 1e5, lat as f64 / 1e5]);
    }

    points
}

fn decode_value(bytes: &[u8], index: &mut usize) -> Option<i64> {
    let mut result = 0_i64;
    let mut shift = 0;

    loop {
        if *index >= bytes.len() {
            return None;
        }

        let chunk = (bytes[*index] as i64) - 63;
        *index += 1;

        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Some(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}

pub fn encode(points: &[[f64; 2]]) -> String {
    let mut encoded = String::new();
    let mut prev_lat = 0_i64;
    let mut prev_lon = 0_i64;

    for &[lon, lat] in points {
        let lat_e5 = (lat * 1e5).round() as i64;
        let lon_e5 = (lon * 1e5).round() as i64;

        encode_value(lat_e5 - prev_lat, &mut encoded);
        encode_value(lon_e5 - prev_lon, &mut encoded);

        prev_lat = lat_e5;
        prev_lon = lon_e5;
    }

    encoded
}

fn encode_value(value: i64, output: &mut String) {
    let mut value = if value < 0 { !(value << 1) } else { value << 1 };

    while value >= 0x20 {
        output.push((((value & 0x1f) | 0x20) as u8 + 63) as char);
        value >>= 5;
    }

    output.push((value as u8 + 63) as char);
}
