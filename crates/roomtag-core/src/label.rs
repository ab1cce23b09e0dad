//! The closed set of listing-photo labels and the classification result.
//!
//! The remote model answers with one of 20 wire strings. Nineteen name a
//! real-estate category; the twentieth, `false`, means the picture is not a
//! real-estate image at all. That sentinel is modelled as the absence of a
//! label rather than as a category of its own.

use crate::error::ClassifyError;
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Wire value the model uses for "not a real-estate image".
pub const NOT_REAL_ESTATE: &str = "false";

/// A real-estate photo category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RoomLabel {
    Bathroom,
    Bedroom,
    LivingRoom,
    ExteriorView,
    Kitchen,
    Garden,
    PlotArea,
    Room,
    SwimmingPool,
    Gym,
    Parking,
    MapLocation,
    Balcony,
    FloorPlan,
    FurnishedAmenities,
    BuildingLobby,
    TeamArea,
    Staircase,
    MasterPlan,
}

impl RoomLabel {
    /// All categories, in the order they are offered to the model.
    pub const ALL: [RoomLabel; 19] = [
        RoomLabel::Bathroom,
        RoomLabel::Bedroom,
        RoomLabel::LivingRoom,
        RoomLabel::ExteriorView,
        RoomLabel::Kitchen,
        RoomLabel::Garden,
        RoomLabel::PlotArea,
        RoomLabel::Room,
        RoomLabel::SwimmingPool,
        RoomLabel::Gym,
        RoomLabel::Parking,
        RoomLabel::MapLocation,
        RoomLabel::Balcony,
        RoomLabel::FloorPlan,
        RoomLabel::FurnishedAmenities,
        RoomLabel::BuildingLobby,
        RoomLabel::TeamArea,
        RoomLabel::Staircase,
        RoomLabel::MasterPlan,
    ];

    /// The wire string the model emits for this category.
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomLabel::Bathroom => "Bathroom",
            RoomLabel::Bedroom => "Bedroom",
            RoomLabel::LivingRoom => "Living Room",
            RoomLabel::ExteriorView => "Exterior View",
            RoomLabel::Kitchen => "Kitchen",
            RoomLabel::Garden => "Garden",
            RoomLabel::PlotArea => "Plot Area",
            RoomLabel::Room => "Room",
            RoomLabel::SwimmingPool => "Swimming Pool",
            RoomLabel::Gym => "Gym",
            RoomLabel::Parking => "Parking",
            RoomLabel::MapLocation => "Map Location",
            RoomLabel::Balcony => "Balcony",
            RoomLabel::FloorPlan => "Floor Plan",
            RoomLabel::FurnishedAmenities => "Furnished Amenities",
            RoomLabel::BuildingLobby => "Building Lobby",
            RoomLabel::TeamArea => "Team Area",
            RoomLabel::Staircase => "Staircase",
            RoomLabel::MasterPlan => "Master Plan",
        }
    }
}

impl fmt::Display for RoomLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomLabel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoomLabel::ALL
            .iter()
            .copied()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| format!("unknown label '{s}'"))
    }
}

/// Every value the response schema allows, sentinel last.
pub fn schema_enum() -> Vec<&'static str> {
    RoomLabel::ALL
        .iter()
        .map(RoomLabel::as_str)
        .chain(std::iter::once(NOT_REAL_ESTATE))
        .collect()
}

/// Outcome of classifying one image.
///
/// Serializes to its wire string, so `{"classification": c}` keeps the
/// response shape callers already rely on (`"false"` for no category).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Classification {
    label: Option<RoomLabel>,
}

impl Classification {
    pub fn real_estate(label: RoomLabel) -> Self {
        Self { label: Some(label) }
    }

    pub fn not_real_estate() -> Self {
        Self { label: None }
    }

    /// The category, or `None` if the image is not a real-estate photo.
    pub fn label(&self) -> Option<RoomLabel> {
        self.label
    }

    pub fn is_real_estate(&self) -> bool {
        self.label.is_some()
    }

    pub fn as_wire_str(&self) -> &'static str {
        self.label.map_or(NOT_REAL_ESTATE, |l| l.as_str())
    }

    /// Map a wire string from the model to a classification.
    pub fn from_wire(value: &str) -> Result<Self, ClassifyError> {
        if value == NOT_REAL_ESTATE {
            return Ok(Self::not_real_estate());
        }
        value
            .parse::<RoomLabel>()
            .map(Self::real_estate)
            .map_err(|message| ClassifyError::Parse { message })
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire_str())
    }
}

impl Serialize for Classification {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_wire_str())
    }
}

/// JSON envelope the model is constrained to produce.
#[derive(Debug, Deserialize)]
struct Envelope {
    classification: String,
}

/// Parse the concatenated model reply (`{"classification": "..."}`).
pub fn parse_reply(text: &str) -> Result<Classification, ClassifyError> {
    let envelope: Envelope = serde_json::from_str(text.trim()).map_err(|e| ClassifyError::Parse {
        message: format!("{e} in reply {text:?}"),
    })?;
    Classification::from_wire(&envelope.classification)
}
