//! Lat/lon projection onto a sphere and great-circle style arcs between
//! markers. Pure functions; the TUI globe view and `cb globe` consume them.

use serde::Serialize;

use crate::model::geo::{GeoError, GeoMarker};

/// Arcs are never sampled coarser than this
pub const MIN_ARC_SEGMENTS: usize = 64;

pub const DEFAULT_ARC_LIFT: f64 = 1.15;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Vec3 { x, y, z }
    }

    pub fn length(self) -> f64 {
        self.dot(self).sqrt()
    }

    pub fn dot(self, o: Vec3) -> f64 {
        self.x * o.x + self.y * o.y + self.z * o.z
    }

    pub fn cross(self, o: Vec3) -> Vec3 {
        Vec3::new(
            self.y * o.z - self.z * o.y,
            self.z * o.x - self.x * o.z,
            self.x * o.y - self.y * o.x,
        )
    }

    pub fn add(self, o: Vec3) -> Vec3 {
        Vec3::new(self.x + o.x, self.y + o.y, self.z + o.z)
    }

    pub fn scale(self, k: f64) -> Vec3 {
        Vec3::new(self.x * k, self.y * k, self.z * k)
    }

    /// Unit vector in the same direction; the zero vector stays zero
    pub fn normalize(self) -> Vec3 {
        let len = self.length();
        if len == 0.0 { self } else { self.scale(1.0 / len) }
    }
}

/// Point on a sphere of radius `r` for a latitude/longitude in degrees.
///
/// `phi` is the polar angle from +Y and `theta` the azimuth offset by 180°,
/// so (0, 0) lands on +X and the north pole on +Y.
pub fn project(lat: f64, lon: f64, r: f64) -> Vec3 {
    let phi = (90.0 - lat).to_radians();
    let theta = (lon + 180.0).to_radians();
    Vec3::new(
        -r * phi.sin() * theta.cos(),
        r * phi.cos(),
        r * phi.sin() * theta.sin(),
    )
}

/// Quadratic Bézier from `a` to `b`, with the control point lifted above
/// the surface by `lift` times `|a|`. Returns `max(segments, 64) + 1` points;
/// the first is `a` and the last is `b`.
pub fn arc(a: Vec3, b: Vec3, segments: usize, lift: f64) -> Vec<Vec3> {
    let n = segments.max(MIN_ARC_SEGMENTS);
    let control = midpoint_direction(a, b).scale(a.length() * lift);
    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            let u = 1.0 - t;
            a.scale(u * u)
                .add(control.scale(2.0 * u * t))
                .add(b.scale(t * t))
        })
        .collect()
}

/// Spherical linear interpolation from `a` to `b`, `segments + 1` points
/// (at least two). Stays on the sphere of radius `|a|` when `|a| == |b|`.
pub fn slerp_arc(a: Vec3, b: Vec3, segments: usize) -> Vec<Vec3> {
    let n = segments.max(1);
    let (ua, ub) = (a.normalize(), b.normalize());
    let cos_omega = ua.dot(ub).clamp(-1.0, 1.0);
    let omega = cos_omega.acos();
    let sin_omega = omega.sin();

    (0..=n)
        .map(|i| {
            let t = i as f64 / n as f64;
            if i == 0 {
                return a;
            }
            if i == n {
                return b;
            }
            if sin_omega.abs() < 1e-9 {
                if cos_omega > 0.0 {
                    return a;
                }
                // Antipodal: swing through any perpendicular
                let normal = perpendicular(ua).scale(a.length());
                let angle = std::f64::consts::PI * t;
                return a.scale(angle.cos()).add(normal.scale(angle.sin()));
            }
            let ka = ((1.0 - t) * omega).sin() / sin_omega;
            let kb = (t * omega).sin() / sin_omega;
            a.scale(ka).add(b.scale(kb))
        })
        .collect()
}

/// Direction of the arc's apex. For antipodal endpoints the chord midpoint
/// is the origin, so fall back to a direction perpendicular to `a`.
fn midpoint_direction(a: Vec3, b: Vec3) -> Vec3 {
    let mid = a.add(b).scale(0.5);
    if mid.length() <= 1e-9 * a.length().max(1.0) {
        perpendicular(a.normalize())
    } else {
        mid.normalize()
    }
}

/// Some unit vector perpendicular to `v`
fn perpendicular(v: Vec3) -> Vec3 {
    let (ax, ay, az) = (v.x.abs(), v.y.abs(), v.z.abs());
    let axis = if ax <= ay && ax <= az {
        Vec3::new(1.0, 0.0, 0.0)
    } else if ay <= az {
        Vec3::new(0.0, 1.0, 0.0)
    } else {
        Vec3::new(0.0, 0.0, 1.0)
    };
    v.cross(axis).normalize()
}

/// One arc in a star layout
#[derive(Debug, Clone, Serialize)]
pub struct StarArc {
    pub from: String,
    pub to: String,
    pub points: Vec<Vec3>,
}

/// Arcs from the primary marker to each other marker.
///
/// The primary is the marker whose ID matches `primary`, or the first marker
/// when no ID is given. `n` markers yield `n - 1` arcs; fewer than two yield
/// none.
pub fn star_arcs(
    markers: &[GeoMarker],
    primary: Option<&str>,
    radius: f64,
    segments: usize,
    lift: f64,
) -> Result<Vec<StarArc>, GeoError> {
    let hub = match primary {
        Some(id) => markers
            .iter()
            .position(|m| m.id.as_deref() == Some(id))
            .ok_or_else(|| GeoError::UnknownMarker(id.to_string()))?,
        None => 0,
    };
    let Some(center) = markers.get(hub) else {
        return Ok(Vec::new());
    };
    let from = project(center.lat, center.lon, radius);

    Ok(markers
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != hub)
        .map(|(_, m)| StarArc {
            from: center.display_name(),
            to: m.display_name(),
            points: arc(from, project(m.lat, m.lon, radius), segments, lift),
        })
        .collect())
}

/// Rotate a sphere point for display: `yaw` about +Y, then `pitch` about +X
/// (radians).
pub fn view_transform(p: Vec3, yaw: f64, pitch: f64) -> Vec3 {
    let (sy, cy) = yaw.sin_cos();
    let x = p.x * cy + p.z * sy;
    let z = -p.x * sy + p.z * cy;

    let (sp, cp) = pitch.sin_cos();
    let y = p.y * cp - z * sp;
    let z = p.y * sp + z * cp;
    Vec3::new(x, y, z)
}

/// Screen `(x, y)` of a rotated point, or `None` if it is on the far side
pub fn orthographic(p: Vec3) -> Option<(f64, f64)> {
    (p.z >= 0.0).then_some((p.x, p.y))
}
