//! WKT helpers for shapefile `.prj` sidecars.

use super::projection::parse_utm_epsg;

const GCS_WGS84: &str = r#"GEOGCS["GCS_WGS_1984",DATUM["D_WGS_1984",SPHEROID["WGS_1984",6378137.0,298.257223563]],PRIMEM["Greenwich",0.0],UNIT["Degree",0.0174532925199433]]"#;

/// ESRI-flavoured WKT for the EPSG codes geobatch can reproject.
pub fn esri_wkt(epsg: u32) -> Option<String> {
    if epsg == 4326 {
        return Some(GCS_WGS84.to_string());
    }

    if epsg == 3857 {
        return Some(format!(
            concat!(
                r#"PROJCS["WGS_1984_Web_Mercator_Auxiliary_Sphere",{gcs},"#,
                r#"PROJECTION["Mercator_Auxiliary_Sphere"],PARAMETER["False_Easting",0.0],"#,
                r#"PARAMETER["False_Northing",0.0],PARAMETER["Central_Meridian",0.0],"#,
                r#"PARAMETER["Standard_Parallel_1",0.0],PARAMETER["Auxiliary_Sphere_Type",0.0],"#,
                r#"UNIT["Meter",1.0]]"#
            ),
            gcs = GCS_WGS84
        ));
    }

    let (zone, north) = parse_utm_epsg(epsg)?;
    let hemisphere = if north { 'N' } else { 'S' };
    let false_northing = if north { 0.0 } else { 10_000_000.0 };
    let central_meridian = (zone as f64 - 1.0) * 6.0 - 180.0 + 3.0;

    Some(format!(
        concat!(
            r#"PROJCS["WGS_1984_UTM_Zone_{zone}{hemi}",{gcs},"#,
            r#"PROJECTION["Transverse_Mercator"],PARAMETER["False_Easting",500000.0],"#,
            r#"PARAMETER["False_Northing",{north_offset:.1}],PARAMETER["Central_Meridian",{cm:.1}],"#,
            r#"PARAMETER["Scale_Factor",0.9996],PARAMETER["Latitude_Of_Origin",0.0],"#,
            r#"UNIT["Meter",1.0]]"#
        ),
        zone = zone,
        hemi = hemisphere,
        gcs = GCS_WGS84,
        north_offset = false_northing,
        cm = central_meridian,
    ))
}

/// Recover an EPSG code from WKT.
///
/// Looks at the outermost `AUTHORITY["EPSG","..."]` clause first (the last
/// one in WKT1), then falls back to well-known ESRI/OGC names.
pub fn epsg_from_wkt(wkt: &str) -> Option<u32> {
    if let Some(code) = last_epsg_authority(wkt) {
        return Some(code);
    }

    let name = wkt_name(wkt)?;
    let normalized = name.to_ascii_uppercase().replace([' ', '/'], "_");

    if let Some(zone_part) = normalized
        .split("UTM_ZONE_")
        .nth(1)
    {
        let digits: String = zone_part.chars().take_while(|c| c.is_ascii_digit()).collect();
        let hemi = zone_part[digits.len()..].chars().next()?;
        let zone: u32 = digits.parse().ok()?;
        if !(1..=60).contains(&zone) {
            return None;
        }
        return match hemi {
            'N' => Some(32600 + zone),
            'S' => Some(32700 + zone),
            _ => None,
        };
    }

    if normalized.contains("WEB_MERCATOR") || normalized.contains("PSEUDO-MERCATOR") {
        return Some(3857);
    }

    let top = wkt.trim_start();
    if top.starts_with("GEOGCS") && (normalized.contains("WGS_1984") || normalized.contains("WGS_84")) {
        return Some(4326);
    }

    None
}

fn last_epsg_authority(wkt: &str) -> Option<u32> {
    let upper = wkt.to_ascii_uppercase();
    let idx = upper.rfind("AUTHORITY[\"EPSG\"")?;
    let rest = &wkt[idx..];
    let close = rest.find(']')?;
    rest[..close]
        .split(',')
        .nth(1)?
        .trim()
        .trim_matches('"')
        .parse()
        .ok()
}

/// The quoted name of the top-level WKT node
fn wkt_name(wkt: &str) -> Option<&str> {
    let start = wkt.find('"')? + 1;
    let len = wkt[start..].find('"')?;
    Some(&wkt[start..start + len])
}
