//! Vision object table.
//!
//! The host's vision pipeline reports detected objects with `O:id,x,y`; a
//! `V:id` pick resolves the id through [`ObjectResolver`]. Ids follow the
//! detection naming used on the host, e.g. `red_circle_camera_x_0`.

use scara_common::config::{VisionConfig, WorkspaceBounds};
use scara_common::consts::{MAX_OBJECT_ID_LEN, MAX_VISION_OBJECTS};
use scara_common::protocol::ObjectId;
use tracing::debug;

use crate::error::VisionError;

/// Maps an object id to a workspace XY coordinate [mm].
pub trait ObjectResolver {
    fn resolve(&self, id: &str) -> Option<(f64, f64)>;
}

/// Validate an object id: 1–32 characters of `[A-Za-z0-9_-]`.
pub fn object_id(text: &str) -> Result<ObjectId, &'static str> {
    if text.is_empty() {
        return Err("missing object id");
    }
    if text.len() > MAX_OBJECT_ID_LEN {
        return Err("object id too long");
    }
    if !text
        .bytes()
        .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err("invalid object id");
    }
    ObjectId::try_from(text).map_err(|_| "object id too long")
}

/// Fixed-capacity id → coordinate table.
#[derive(Debug, Clone, Default)]
pub struct ObjectTable {
    entries: heapless::Vec<(ObjectId, (f64, f64)), MAX_VISION_OBJECTS>,
    fallback: Option<(f64, f64)>,
}

impl ObjectTable {
    /// Empty table with an optional placeholder coordinate for unknown ids.
    pub fn new(fallback: Option<(f64, f64)>) -> Self {
        Self {
            entries: heapless::Vec::new(),
            fallback,
        }
    }

    /// Seed from the `[vision]` configuration section.
    pub fn from_config(config: &VisionConfig, bounds: &WorkspaceBounds) -> Result<Self, VisionError> {
        let mut table = Self::new(config.fallback.map(|[x, y]| (x, y)));
        for obj in &config.objects {
            let id = object_id(&obj.id).map_err(|reason| VisionError::InvalidId {
                id: obj.id.clone(),
                reason,
            })?;
            if !bounds.contains_xy(obj.x, obj.y) {
                return Err(VisionError::OutOfBounds(obj.id.clone()));
            }
            table.insert(id, obj.x, obj.y)?;
        }
        Ok(table)
    }

    /// Insert or update an entry. A full table evicts nothing.
    pub fn insert(&mut self, id: ObjectId, x: f64, y: f64) -> Result<(), VisionError> {
        if let Some(entry) = self.entries.iter_mut().find(|(known, _)| *known == id) {
            entry.1 = (x, y);
            debug!(id = id.as_str(), x, y, "vision object updated");
            return Ok(());
        }
        debug!(id = id.as_str(), x, y, "vision object added");
        self.entries
            .push((id, (x, y)))
            .map_err(|_| VisionError::TableFull)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ObjectResolver for ObjectTable {
    fn resolve(&self, id: &str) -> Option<(f64, f64)> {
        self.entries
            .iter()
            .find(|(known, _)| known.as_str() == id)
            .map(|(_, xy)| *xy)
            .or(self.fallback)
    }
}
