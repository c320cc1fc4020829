//! Feature styles and the traffic/incident colour classifications.

use std::fmt;

/// Default colour of a visible route line.
pub const ROUTE_COLOR: &str = "#3B82F6";

/// Fully transparent colour.
pub const TRANSPARENT: &str = "rgba(0,0,0,0)";

/// Stroke/fill description for one feature.
#[derive(Debug, Clone, PartialEq)]
pub struct Style {
    /// Stroke (lines) or fill (points, circles) colour.
    pub color: String,
    /// Stroke width or point radius in pixels.
    pub width: f32,
    /// 0.0 (invisible) to 1.0.
    pub opacity: f32,
}

impl Style {
    pub fn new(color: impl Into<String>, width: f32, opacity: f32) -> Self {
        Self {
            color: color.into(),
            width,
            opacity,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.opacity > 0.0
    }

    pub fn position_marker() -> Self {
        Self::new("#2563EB", 8.0, 1.0)
    }

    pub fn accuracy_circle() -> Self {
        Self::new("#2563EB", 1.0, 0.15)
    }

    pub fn origin_marker() -> Self {
        Self::new("#16A34A", 10.0, 1.0)
    }

    pub fn destination_marker() -> Self {
        Self::new("#DC2626", 10.0, 1.0)
    }

    /// Base route line. Invisible when coloured traffic segments carry the
    /// visible representation.
    pub fn route_line(color: Option<&str>, visible: bool) -> Self {
        if visible {
            Self::new(color.unwrap_or(ROUTE_COLOR), 5.0, 0.9)
        } else {
            Self::new(TRANSPARENT, 5.0, 0.0)
        }
    }

    pub fn traffic_segment(color: &str) -> Self {
        Self::new(color, 6.0, 1.0)
    }

    pub fn incident(severity: Severity) -> Self {
        Self::new(severity.color(), 9.0, 1.0)
    }
}

/// Congestion class of a traffic segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrafficStatus {
    Light,
    Moderate,
    Heavy,
}

impl TrafficStatus {
    /// Decode a segment `status` value.
    ///
    /// `closed` roads render as heavy; anything unrecognised renders as light.
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "moderate" => TrafficStatus::Moderate,
            "heavy" | "closed" => TrafficStatus::Heavy,
            _ => TrafficStatus::Light,
        }
    }

    /// Colour used when the segment does not carry one.
    pub fn default_color(&self) -> &'static str {
        match self {
            TrafficStatus::Light => "#00FF00",
            TrafficStatus::Moderate => "#FFFF00",
            TrafficStatus::Heavy => "#FF0000",
        }
    }
}

impl fmt::Display for TrafficStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TrafficStatus::Light => "light",
            TrafficStatus::Moderate => "moderate",
            TrafficStatus::Heavy => "heavy",
        };
        f.write_str(label)
    }
}

/// Incident severity, ordered low to critical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    /// Decode a severity label (case-insensitive).
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "LOW" | "MINOR" => Some(Severity::Low),
            "MODERATE" | "MEDIUM" => Some(Severity::Moderate),
            "HIGH" | "MAJOR" => Some(Severity::High),
            "CRITICAL" | "SEVERE" => Some(Severity::Critical),
            _ => None,
        }
    }

    /// Decode a delay magnitude (0 = low ... 3 and above = critical).
    pub fn from_magnitude(magnitude: u64) -> Self {
        match magnitude {
            0 => Severity::Low,
            1 => Severity::Moderate,
            2 => Severity::High,
            _ => Severity::Critical,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Severity::Low => "#10B981",
            Severity::Moderate => "#FBBF24",
            Severity::High => "#F97316",
            Severity::Critical => "#DC2626",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Severity::Low => "LOW",
            Severity::Moderate => "MODERATE",
            Severity::High => "HIGH",
            Severity::Critical => "CRITICAL",
        };
        f.write_str(label)
    }
}
