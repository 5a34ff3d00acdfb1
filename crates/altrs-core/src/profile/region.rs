// Altrs Screen Regions
// Named areas of the screen, in coordinates normalised to 0..1

use strum_macros::{Display, EnumString};

use crate::ids::ItemId;
use crate::item::Named;
use crate::window::{Point, Rect};

/// Outline of a region inside its bounding rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum RegionShape {
    #[default]
    Rectangle,
    Ellipse,
}

/// A screen region the mouse source reports Inside/Outside events for
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenRegion {
    pub id: ItemId,
    pub name: String,
    /// Bounds as fractions of the screen
    pub rect: Rect,
    pub shape: RegionShape,
}

impl ScreenRegion {
    pub fn new(id: ItemId, name: impl Into<String>, rect: Rect, shape: RegionShape) -> Self {
        Self {
            id,
            name: name.into(),
            rect,
            shape,
        }
    }

    /// Test a normalised point
    pub fn contains(&self, point: &Point) -> bool {
        match self.shape {
            RegionShape::Rectangle => self.rect.contains_point(point),
            RegionShape::Ellipse => self.rect.ellipse_contains_point(point),
        }
    }

    /// Bounds are non-empty and lie within the unit square
    pub fn is_valid(&self) -> bool {
        let r = &self.rect;
        !r.is_empty() && r.left >= 0.0 && r.top >= 0.0 && r.right() <= 1.0 && r.bottom() <= 1.0
    }
}

impl Named for ScreenRegion {
    fn id(&self) -> ItemId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn set_name(&mut self, name: String) {
        self.name = name;
    }
}
